//! Test runner infrastructure for ObsPy
//!
//! Every ObsPy module ships a `tests` package whose `suite` collects all of its
//! test cases. This crate replaces import-by-name with an explicit
//! [`SuiteRegistry`]: each module registers a provider returning its
//! [`TestSuite`] together with its version string.
//!
//! The pieces follow the usual pipeline:
//! - [`SuiteResolver`] turns module shortcuts or dotted test names into one
//!   aggregated suite, skipping names that cannot be loaded
//! - [`TextTestRunner`] executes the suite and [`ConsoleReporter`] prints it
//! - [`report`] assembles environment metadata plus outcomes and hands the
//!   record to a [`report::ReportSink`]
//!
//! [`run_tests`] (or the [`TestProgram`] builder) wires all of it together
//! for a console run.

pub mod program;
pub mod registry;
pub mod report;
pub mod reporter;
pub mod resolver;
pub mod runner;
pub mod suite;

pub use program::{run_tests, ReportTarget, TestProgram};
pub use registry::{LoadError, SuiteRegistry};
pub use reporter::ConsoleReporter;
pub use resolver::{
    canonical_name, resolve_names, Resolution, SuiteResolver, ALL_MODULES, DEFAULT_MODULES,
    NAMESPACE,
};
pub use runner::{TestResult, TestRun, TestRunResult, TextTestRunner};
pub use suite::{CaseError, CaseResult, TestCase, TestSuite};

/// Output level shared by the resolver, runner and reporter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// Only the final summary and failure details
    Quiet,
    /// One progress glyph per test
    #[default]
    Normal,
    /// One line per test
    Verbose,
}

impl Verbosity {
    /// Pick the level from the command-line switches; verbose wins
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else if quiet {
            Verbosity::Quiet
        } else {
            Verbosity::Normal
        }
    }

    pub fn is_quiet(self) -> bool {
        self == Verbosity::Quiet
    }
}
