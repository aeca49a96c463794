//! Suite registry - module id to suite provider
//!
//! Stands in for importing `<namespace>.<module>.tests` by name: a module is
//! loadable only if a provider was registered for it at startup.

use crate::resolver::NAMESPACE;
use crate::suite::TestSuite;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Function building a module's complete test suite
pub type SuiteProvider = Arc<dyn Fn() -> TestSuite + Send + Sync>;

/// Why a suite name could not be loaded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("no registered module provides '{name}'")]
    ModuleNotFound { name: String },

    #[error("module '{module}' has no tests matching '{name}'")]
    NoMatchingTests { name: String, module: String },
}

/// A registered module
#[derive(Clone)]
struct ModuleEntry {
    version: String,
    provider: SuiteProvider,
}

/// Explicit mapping from module id to its suite provider and version
pub struct SuiteRegistry {
    namespace: String,
    modules: HashMap<String, ModuleEntry>,
}

impl Default for SuiteRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SuiteRegistry {
    /// Empty registry for the `obspy` namespace
    pub fn new() -> Self {
        Self::with_namespace(NAMESPACE)
    }

    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            modules: HashMap::new(),
        }
    }

    /// Register (or replace) the provider for `module`
    pub fn register<F>(
        &mut self,
        module: impl Into<String>,
        version: impl Into<String>,
        provider: F,
    ) -> &mut Self
    where
        F: Fn() -> TestSuite + Send + Sync + 'static,
    {
        let module = module.into();
        tracing::debug!(module = %module, "registering test suite provider");
        self.modules.insert(
            module,
            ModuleEntry {
                version: version.into(),
                provider: Arc::new(provider),
            },
        );
        self
    }

    pub fn contains(&self, module: &str) -> bool {
        self.modules.contains_key(module)
    }

    /// Version string of a registered module
    pub fn version(&self, module: &str) -> Option<&str> {
        self.modules.get(module).map(|entry| entry.version.as_str())
    }

    /// Registered module ids, sorted
    pub fn modules(&self) -> Vec<&str> {
        let mut modules: Vec<_> = self.modules.keys().map(String::as_str).collect();
        modules.sort_unstable();
        modules
    }

    /// Load the tests named by a dotted path
    ///
    /// `<ns>.<module>`, `<ns>.<module>.tests` and `<ns>.<module>.tests.suite`
    /// select the whole module suite; deeper paths select a test file, a test
    /// class or a single test method.
    pub fn load(&self, name: &str) -> Result<TestSuite, LoadError> {
        let not_found = || LoadError::ModuleNotFound {
            name: name.to_string(),
        };

        let mut segments = name.split('.');
        if segments.next() != Some(self.namespace.as_str()) {
            return Err(not_found());
        }
        let module = segments
            .next()
            .filter(|m| !m.is_empty())
            .ok_or_else(not_found)?;
        let entry = self.modules.get(module).ok_or_else(not_found)?;

        let suite = (entry.provider)();
        let rest: Vec<&str> = segments.collect();

        match rest.as_slice() {
            [] | ["tests"] | ["tests", "suite"] => Ok(suite),
            _ => {
                let selected = suite.select(name);
                if selected.is_empty() {
                    Err(LoadError::NoMatchingTests {
                        name: name.to_string(),
                        module: module.to_string(),
                    })
                } else {
                    Ok(selected)
                }
            }
        }
    }
}
