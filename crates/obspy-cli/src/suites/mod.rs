//! Test suites compiled into the launcher
//!
//! Only modules registered here can be loaded; every other default module is
//! reported as not importable and skipped.

mod runtests;

use obspy_testkit::SuiteRegistry;

/// Registry with every built-in module suite
pub fn registry() -> SuiteRegistry {
    let mut registry = SuiteRegistry::new();
    registry.register("core", runtests::VERSION, runtests::suite);
    registry
}
