//! One-call test run: resolve, run, print, report

use crate::registry::SuiteRegistry;
use crate::report::{self, DependencyProbe, PlatformProbe, ReportAssembler, ReportSink};
use crate::reporter::ConsoleReporter;
use crate::resolver::SuiteResolver;
use crate::runner::{TestRunResult, TextTestRunner};
use crate::Verbosity;

/// Where a run's report goes and how its metadata is looked up
#[derive(Clone, Copy)]
pub struct ReportTarget<'a> {
    pub sink: &'a dyn ReportSink,
    pub platform: &'a dyn PlatformProbe,
    pub dependencies: &'a dyn DependencyProbe,
}

/// A configured console test run
///
/// ```no_run
/// use obspy_testkit::{SuiteRegistry, TestProgram, Verbosity};
///
/// let registry = SuiteRegistry::new();
/// let result = TestProgram::new(&registry)
///     .with_verbosity(Verbosity::Verbose)
///     .run(&["core", "obspy.mseed.tests.test_libmseed"]);
/// println!("{}", result.was_successful());
/// ```
pub struct TestProgram<'a> {
    registry: &'a SuiteRegistry,
    verbosity: Verbosity,
    fail_fast: bool,
    report: Option<ReportTarget<'a>>,
}

impl<'a> TestProgram<'a> {
    pub fn new(registry: &'a SuiteRegistry) -> Self {
        Self {
            registry,
            verbosity: Verbosity::default(),
            fail_fast: false,
            report: None,
        }
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Send a report after the run
    pub fn with_report(mut self, target: Option<ReportTarget<'a>>) -> Self {
        self.report = target;
        self
    }

    /// Run the tests named by `references` (all default modules when empty)
    ///
    /// A failed report delivery is printed and otherwise ignored.
    pub fn run<S: AsRef<str>>(&self, references: &[S]) -> TestRunResult {
        let resolution = SuiteResolver::new(self.registry)
            .with_quiet(self.verbosity.is_quiet())
            .resolve(references);

        let reporter = ConsoleReporter::new(self.verbosity);
        let result = TextTestRunner::new()
            .with_fail_fast(self.fail_fast)
            .run_with_progress(&resolution.suite, |run| reporter.progress(run));
        reporter.summarize(&result);

        if let Some(target) = self.report {
            let record = ReportAssembler::new(self.registry, target.platform, target.dependencies)
                .assemble(&result);
            report::send_report(target.sink, result.was_successful(), &record);
        }

        result
    }
}

/// Resolve, run and summarize `references`, then optionally report
pub fn run_tests<S: AsRef<str>>(
    registry: &SuiteRegistry,
    references: &[S],
    verbosity: Verbosity,
    report: Option<ReportTarget<'_>>,
) -> TestRunResult {
    TestProgram::new(registry)
        .with_verbosity(verbosity)
        .with_report(report)
        .run(references)
}
