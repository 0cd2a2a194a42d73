//! Process runner
//!
//! Spawns backend programs, captures their output and records resource
//! usage into timing artifacts.

mod process;
mod timing;
mod workspace;

pub use process::{
    ProgramInvocation, ProgramOutput, absolute_path, locate_executable, run_program,
};
pub use timing::ResourceUsage;
pub use workspace::RunDirectory;
