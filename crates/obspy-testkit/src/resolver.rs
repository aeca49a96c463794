//! Suite resolution - module references to one aggregated suite

use crate::registry::{LoadError, SuiteRegistry};
use crate::suite::TestSuite;
use colored::*;

/// Package namespace every suite lives under
pub const NAMESPACE: &str = "obspy";

/// Modules run when no reference is given; also the known shortcuts
pub const DEFAULT_MODULES: [&str; 10] = [
    "core", "gse2", "mseed", "sac", "wav", "signal", "imaging", "xseed", "seisan", "sh",
];

/// Every module whose version goes into a report
pub const ALL_MODULES: [&str; 13] = [
    "core", "gse2", "mseed", "sac", "wav", "signal", "imaging", "xseed", "seisan", "sh",
    "fissures", "arclink", "seishub",
];

/// Canonical lookup name for a module shortcut
pub fn canonical_name(module: &str) -> String {
    format!("{}.{}.tests.suite", NAMESPACE, module)
}

/// Expand references into lookup names
///
/// No references means every default module. Known shortcuts are expanded,
/// anything else is taken as an already qualified name.
pub fn resolve_names<S: AsRef<str>>(references: &[S]) -> Vec<String> {
    if references.is_empty() {
        return DEFAULT_MODULES.iter().map(|m| canonical_name(m)).collect();
    }

    references
        .iter()
        .map(|reference| reference.as_ref())
        .map(|reference| {
            if DEFAULT_MODULES.contains(&reference) {
                canonical_name(reference)
            } else {
                reference.to_string()
            }
        })
        .collect()
}

/// A name that could not be loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub name: String,
    pub error: LoadError,
}

/// Outcome of resolving a list of references
#[derive(Debug, Default)]
pub struct Resolution {
    /// Lookup names in the order they were attempted
    pub names: Vec<String>,
    /// Union of every suite that loaded
    pub suite: TestSuite,
    /// Names that were skipped
    pub failures: Vec<LoadFailure>,
}

/// Resolves module references against a registry
pub struct SuiteResolver<'a> {
    registry: &'a SuiteRegistry,
    quiet: bool,
}

impl<'a> SuiteResolver<'a> {
    pub fn new(registry: &'a SuiteRegistry) -> Self {
        Self {
            registry,
            quiet: false,
        }
    }

    /// Suppress the diagnostic printed for names that fail to load
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Build one suite from the given references
    ///
    /// A name that fails to load is skipped; the others still load.
    pub fn resolve<S: AsRef<str>>(&self, references: &[S]) -> Resolution {
        let names = resolve_names(references);
        let mut suite = TestSuite::new();
        let mut failures = Vec::new();

        for name in &names {
            match self.registry.load(name) {
                Ok(loaded) => {
                    tracing::debug!(name = %name, tests = loaded.len(), "loaded test suite");
                    suite.extend(loaded);
                }
                Err(error) => {
                    tracing::debug!(name = %name, error = %error, "skipping test suite");
                    if !self.quiet {
                        eprintln!(
                            "{} {}",
                            "Cannot import test suite for module".yellow(),
                            name
                        );
                    }
                    failures.push(LoadFailure {
                        name: name.clone(),
                        error,
                    });
                }
            }
        }

        Resolution {
            names,
            suite,
            failures,
        }
    }
}
