//! Classifier registry
//!
//! Maps classifier names to driver instances. The registry is built from the
//! configuration at startup, validated before any job runs and read-only
//! afterwards.

use std::collections::BTreeMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::debug;

use crate::config::BenchConfig;
use crate::drivers::{BalsaDriver, ClassifierDriver, PythonScriptDriver, RangerDriver};
use crate::error::{BenchError, BenchResult};
use crate::formats::DataFormat;

static GLOBAL_REGISTRY: OnceCell<ClassifierRegistry> = OnceCell::new();

/// Placeholder factory for one driver kind
pub type DefaultConfigFn = fn(&mut BenchConfig);

/// Driver kinds known to the harness with their default-config factories
pub const DRIVER_KINDS: &[(&str, DefaultConfigFn)] = &[
    ("balsa", BalsaDriver::add_default_config),
    ("lightgbm", PythonScriptDriver::add_default_lightgbm_config),
    ("sklearn", PythonScriptDriver::add_default_sklearn_config),
    ("ranger", RangerDriver::add_default_config),
];

/// A driver bound to a classifier name
#[derive(Clone)]
pub struct RegisteredClassifier {
    pub name: String,
    pub data_format: DataFormat,
    pub driver: Arc<dyn ClassifierDriver>,
}

impl std::fmt::Debug for RegisteredClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredClassifier")
            .field("name", &self.name)
            .field("driver", &self.driver.driver_name())
            .field("data_format", &self.data_format)
            .finish()
    }
}

/// Registry of configured classifiers
#[derive(Debug, Clone, Default)]
pub struct ClassifierRegistry {
    classifiers: BTreeMap<String, RegisteredClassifier>,
}

impl ClassifierRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from every classifier entry of a configuration
    pub fn from_config(config: &BenchConfig) -> BenchResult<Self> {
        let mut registry = Self::new();
        for (name, classifier) in &config.classifiers {
            registry.register(name, classifier.build()?)?;
        }
        Ok(registry)
    }

    /// Register a driver under `name`
    ///
    /// The data format is queried once here and reused for every job.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        driver: Arc<dyn ClassifierDriver>,
    ) -> BenchResult<()> {
        let name = name.into();
        if self.classifiers.contains_key(&name) {
            return Err(BenchError::InvalidConfig(format!(
                "classifier '{}' is registered twice",
                name
            )));
        }

        debug!(
            "Registered classifier {} (driver {}, format {})",
            name,
            driver.driver_name(),
            driver.data_format()
        );
        self.classifiers.insert(
            name.clone(),
            RegisteredClassifier {
                name,
                data_format: driver.data_format(),
                driver,
            },
        );
        Ok(())
    }

    /// Check that every registered backend can be invoked
    pub fn validate(&self) -> BenchResult<()> {
        for classifier in self.classifiers.values() {
            classifier.driver.validate()?;
            debug!("Validated classifier {}", classifier.name);
        }
        Ok(())
    }

    /// Look up a classifier by name
    pub fn get(&self, name: &str) -> BenchResult<&RegisteredClassifier> {
        self.classifiers
            .get(name)
            .ok_or_else(|| BenchError::UnknownClassifier(name.to_string()))
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.classifiers.keys().map(String::as_str).collect()
    }

    /// Iterate over registered classifiers in name order
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredClassifier> {
        self.classifiers.values()
    }

    pub fn len(&self) -> usize {
        self.classifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classifiers.is_empty()
    }

    /// Install as the process-wide registry
    ///
    /// Fails if a registry was already installed.
    pub fn install(self) -> BenchResult<&'static ClassifierRegistry> {
        GLOBAL_REGISTRY.set(self).map_err(|_| {
            BenchError::InvalidConfig("classifier registry already installed".to_string())
        })?;
        Self::global()
    }

    /// The process-wide registry, if installed
    pub fn global() -> BenchResult<&'static ClassifierRegistry> {
        GLOBAL_REGISTRY.get().ok_or_else(|| {
            BenchError::InvalidConfig("classifier registry not installed".to_string())
        })
    }
}
