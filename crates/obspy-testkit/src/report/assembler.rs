//! Report assembly

use super::probe::{DependencyProbe, PlatformAttribute, PlatformProbe, DEPENDENCIES};
use super::record::ReportRecord;
use crate::registry::SuiteRegistry;
use crate::resolver::ALL_MODULES;
use crate::runner::TestRunResult;
use chrono::Local;
use std::collections::BTreeMap;

/// Collects versions, platform attributes and outcomes into a [`ReportRecord`]
pub struct ReportAssembler<'a> {
    registry: &'a SuiteRegistry,
    platform: &'a dyn PlatformProbe,
    dependencies: &'a dyn DependencyProbe,
}

impl<'a> ReportAssembler<'a> {
    pub fn new(
        registry: &'a SuiteRegistry,
        platform: &'a dyn PlatformProbe,
        dependencies: &'a dyn DependencyProbe,
    ) -> Self {
        Self {
            registry,
            platform,
            dependencies,
        }
    }

    /// Build the record for a finished run
    pub fn assemble(&self, result: &TestRunResult) -> ReportRecord {
        ReportRecord {
            timestamp: Local::now(),
            obspy: self.module_versions(),
            dependencies: self.dependency_versions(),
            platform: self.platform_attributes(),
            errors: result.errors().into_iter().collect(),
            failures: result.failures().into_iter().collect(),
        }
    }

    fn module_versions(&self) -> BTreeMap<String, String> {
        ALL_MODULES
            .iter()
            .map(|module| {
                let version = self.registry.version(module).unwrap_or_default();
                (module.to_string(), version.to_string())
            })
            .collect()
    }

    fn dependency_versions(&self) -> BTreeMap<String, String> {
        DEPENDENCIES
            .iter()
            .map(|dependency| {
                let version = self
                    .dependencies
                    .version(dependency)
                    .unwrap_or_else(|error| {
                        tracing::debug!(dependency = dependency.name, %error, "version lookup failed");
                        String::new()
                    });
                (dependency.name.to_string(), version)
            })
            .collect()
    }

    fn platform_attributes(&self) -> BTreeMap<String, String> {
        PlatformAttribute::ALL
            .iter()
            .map(|attribute| {
                let value = match self.platform.query(*attribute) {
                    Ok(parts) => parts.into_iter().next().unwrap_or_default(),
                    Err(error) => {
                        tracing::debug!(attribute = attribute.key(), %error, "platform lookup failed");
                        String::new()
                    }
                };
                (attribute.key().to_string(), value)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::probe::{Dependency, ProbeError};
    use crate::runner::TextTestRunner;
    use crate::suite::{CaseError, TestSuite};
    use pretty_assertions::assert_eq;

    struct FailingProbe;

    impl PlatformProbe for FailingProbe {
        fn query(&self, attribute: PlatformAttribute) -> Result<Vec<String>, ProbeError> {
            Err(ProbeError::Unsupported(attribute.key()))
        }
    }

    impl DependencyProbe for FailingProbe {
        fn version(&self, _dependency: &Dependency) -> Result<String, ProbeError> {
            Err(ProbeError::EmptyOutput("python3".to_string()))
        }
    }

    struct FixedProbe;

    impl PlatformProbe for FixedProbe {
        fn query(&self, attribute: PlatformAttribute) -> Result<Vec<String>, ProbeError> {
            match attribute {
                PlatformAttribute::Architecture => {
                    Ok(vec!["64bit".to_string(), "ELF".to_string()])
                }
                PlatformAttribute::Processor => Ok(Vec::new()),
                other => Ok(vec![format!("{}-value", other.key())]),
            }
        }
    }

    impl DependencyProbe for FixedProbe {
        fn version(&self, dependency: &Dependency) -> Result<String, ProbeError> {
            match dependency.name {
                "scipy" => Err(ProbeError::EmptyOutput("python3".to_string())),
                name => Ok(format!("{}-1.0", name)),
            }
        }
    }

    fn registry() -> SuiteRegistry {
        let mut registry = SuiteRegistry::new();
        registry.register("core", "0.2.1", || {
            TestSuite::new()
                .with_case("obspy.core.tests.test_a.ACase.test_ok", || Ok(()))
                .with_case("obspy.core.tests.test_a.ACase.test_bad", || {
                    Err(CaseError::failure("2 != 3"))
                })
                .with_case("obspy.core.tests.test_a.ACase.test_broken", || {
                    Err(CaseError::error("no such file"))
                })
        });
        registry
    }

    fn run(registry: &SuiteRegistry) -> TestRunResult {
        let suite = registry.load("obspy.core.tests.suite").unwrap();
        TextTestRunner::new().run(&suite)
    }

    #[test]
    fn test_every_lookup_failing_still_yields_every_key() {
        let registry = SuiteRegistry::new();
        let record = ReportAssembler::new(&registry, &FailingProbe, &FailingProbe)
            .assemble(&TestRunResult::default());

        assert_eq!(record.obspy.len(), ALL_MODULES.len());
        assert!(record.obspy.values().all(String::is_empty));
        assert_eq!(record.dependencies.len(), DEPENDENCIES.len());
        assert!(record.dependencies.values().all(String::is_empty));
        assert_eq!(record.platform.len(), PlatformAttribute::ALL.len());
        assert!(record.platform.values().all(String::is_empty));
        assert!(record.errors.is_empty());
        assert!(record.failures.is_empty());
    }

    #[test]
    fn test_versions_and_platform() {
        let registry = registry();
        let record =
            ReportAssembler::new(&registry, &FixedProbe, &FixedProbe).assemble(&run(&registry));

        assert_eq!(record.obspy["core"], "0.2.1");
        assert_eq!(record.obspy["seishub"], "");
        assert_eq!(record.dependencies["numpy"], "numpy-1.0");
        assert_eq!(record.dependencies["_omnipy"], "_omnipy-1.0");
        assert_eq!(record.dependencies["scipy"], "");
        // Multi-part answers keep only the first part
        assert_eq!(record.platform["architecture"], "64bit");
        assert_eq!(record.platform["processor"], "");
        assert_eq!(record.platform["node"], "node-value");
    }

    #[test]
    fn test_errors_and_failures_stay_separate() {
        let registry = registry();
        let record =
            ReportAssembler::new(&registry, &FixedProbe, &FixedProbe).assemble(&run(&registry));

        assert_eq!(record.errors.len(), 1);
        assert_eq!(
            record.errors["test_broken (obspy.core.tests.test_a.ACase)"],
            "no such file"
        );
        assert_eq!(record.failures.len(), 1);
        assert_eq!(
            record.failures["test_bad (obspy.core.tests.test_a.ACase)"],
            "2 != 3"
        );
    }
}
