//! Command implementations

pub mod classifiers;
pub mod config;
pub mod report;
pub mod run;
