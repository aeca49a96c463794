//! Test runner - execute an aggregated suite

use crate::suite::{CaseError, TestCase, TestSuite};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;
use std::time::{Duration, Instant};

/// Result of running a single test
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestResult {
    /// Test passed successfully
    Pass { duration: Duration },
    /// An expectation did not hold (assertion, panic)
    Fail { message: String, duration: Duration },
    /// The test could not run to completion
    Error { message: String, duration: Duration },
}

impl TestResult {
    /// Check if this result is a pass
    pub fn is_pass(&self) -> bool {
        matches!(self, TestResult::Pass { .. })
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, TestResult::Fail { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, TestResult::Error { .. })
    }

    /// Get the duration of this test
    pub fn duration(&self) -> Duration {
        match self {
            TestResult::Pass { duration } => *duration,
            TestResult::Fail { duration, .. } => *duration,
            TestResult::Error { duration, .. } => *duration,
        }
    }

    /// Failure or error text, if any
    pub fn message(&self) -> Option<&str> {
        match self {
            TestResult::Pass { .. } => None,
            TestResult::Fail { message, .. } | TestResult::Error { message, .. } => Some(message),
        }
    }
}

/// A completed test run
#[derive(Debug, Clone)]
pub struct TestRun {
    /// The test that was run
    pub test: TestCase,
    /// Result of running the test
    pub result: TestResult,
}

/// Aggregated result of running a suite
#[derive(Debug, Clone, Default)]
pub struct TestRunResult {
    pub runs: Vec<TestRun>,
    /// Wall-clock time for the whole suite
    pub duration: Duration,
}

impl TestRunResult {
    pub fn tests_run(&self) -> usize {
        self.runs.len()
    }

    /// True when nothing failed and nothing errored
    pub fn was_successful(&self) -> bool {
        self.runs.iter().all(|r| r.result.is_pass())
    }

    /// `(test description, error text)` for every errored test
    pub fn errors(&self) -> Vec<(String, String)> {
        self.collect(TestResult::is_error)
    }

    /// `(test description, failure text)` for every failed test
    pub fn failures(&self) -> Vec<(String, String)> {
        self.collect(TestResult::is_fail)
    }

    pub fn passed(&self) -> usize {
        self.runs.iter().filter(|r| r.result.is_pass()).count()
    }

    fn collect(&self, keep: fn(&TestResult) -> bool) -> Vec<(String, String)> {
        self.runs
            .iter()
            .filter(|r| keep(&r.result))
            .map(|r| {
                (
                    r.test.describe(),
                    r.result.message().unwrap_or_default().to_string(),
                )
            })
            .collect()
    }
}

static INSTALL_PANIC_HOOK: Once = Once::new();

thread_local! {
    static CAPTURING: Cell<bool> = const { Cell::new(false) };
    static PANIC_LOCATION: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Install a process-wide hook that records the panic location instead of
/// printing it while the current thread is running test bodies. Other
/// threads keep the previous hook.
fn install_panic_hook() {
    INSTALL_PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if CAPTURING.with(Cell::get) {
                let location = info
                    .location()
                    .map(|l| format!("{}:{}", l.file(), l.line()));
                PANIC_LOCATION.with(|slot| *slot.borrow_mut() = location);
            } else {
                previous(info);
            }
        }));
    });
}

/// Sequential test runner
#[derive(Debug, Default)]
pub struct TextTestRunner {
    /// Stop after the first failure or error
    fail_fast: bool,
}

impl TextTestRunner {
    /// Create a new test runner with default settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Run all tests in the suite
    pub fn run(&self, suite: &TestSuite) -> TestRunResult {
        self.run_with_progress(suite, |_| {})
    }

    /// Run all tests, calling `on_result` after each one
    pub fn run_with_progress<F>(&self, suite: &TestSuite, mut on_result: F) -> TestRunResult
    where
        F: FnMut(&TestRun),
    {
        let start = Instant::now();
        let mut runs = Vec::with_capacity(suite.len());

        install_panic_hook();
        CAPTURING.with(|capturing| capturing.set(true));

        for test in suite {
            let run = self.run_single_test(test);
            tracing::trace!(test = %run.test.id(), passed = run.result.is_pass(), "test finished");
            on_result(&run);
            let stop = self.fail_fast && !run.result.is_pass();
            runs.push(run);
            if stop {
                break;
            }
        }

        CAPTURING.with(|capturing| capturing.set(false));

        TestRunResult {
            runs,
            duration: start.elapsed(),
        }
    }

    /// Run a single test
    fn run_single_test(&self, test: &TestCase) -> TestRun {
        let start = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| test.call()));
        let duration = start.elapsed();

        let result = match outcome {
            Ok(Ok(())) => TestResult::Pass { duration },
            Ok(Err(CaseError::Failure(message))) => TestResult::Fail { message, duration },
            Ok(Err(CaseError::Error(message))) => TestResult::Error { message, duration },
            Err(payload) => TestResult::Fail {
                message: panic_message(payload.as_ref()),
                duration,
            },
        };

        TestRun {
            test: test.clone(),
            result,
        }
    }
}

/// Render a panic payload plus the location recorded by the hook
fn panic_message(payload: &(dyn Any + Send)) -> String {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "test panicked".to_string()
    };

    match PANIC_LOCATION.with(|slot| slot.borrow_mut().take()) {
        Some(location) => format!("panicked at {}:\n{}", location, message),
        None => message,
    }
}
