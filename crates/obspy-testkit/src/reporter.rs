//! Test reporter - display test results

use crate::runner::{TestResult, TestRun, TestRunResult};
use crate::Verbosity;
use colored::*;
use std::io::{self, Write};

const SEPARATOR_WIDTH: usize = 70;

/// Console reporter with output configuration
pub struct ConsoleReporter {
    verbosity: Verbosity,
    /// Disable colored output
    no_color: bool,
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new(Verbosity::Normal)
    }
}

impl ConsoleReporter {
    /// Create a new test reporter
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            no_color: false,
        }
    }

    /// Disable colored output
    pub fn with_no_color(mut self, no_color: bool) -> Self {
        self.no_color = no_color;
        self
    }

    /// Print the progress line or glyph for one finished test
    pub fn progress(&self, run: &TestRun) {
        let mut stdout = io::stdout();
        let _ = self.write_progress(&mut stdout, run);
        let _ = stdout.flush();
    }

    /// Print failure details and the closing summary
    pub fn summarize(&self, result: &TestRunResult) {
        let _ = self.write_summary(&mut io::stdout(), result);
    }

    /// Write the progress output for one test
    pub fn write_progress<W: Write>(&self, out: &mut W, run: &TestRun) -> io::Result<()> {
        self.with_color_override(|| match self.verbosity {
            Verbosity::Quiet => Ok(()),
            Verbosity::Normal => write!(out, "{}", glyph(&run.result)),
            Verbosity::Verbose => writeln!(out, "{} ... {}", run.test, status_word(&run.result)),
        })
    }

    /// Write failure details followed by the summary block
    pub fn write_summary<W: Write>(&self, out: &mut W, result: &TestRunResult) -> io::Result<()> {
        self.with_color_override(|| {
            // Progress dots need a newline before anything else
            if self.verbosity == Verbosity::Normal && !result.runs.is_empty() {
                writeln!(out)?;
            }

            self.write_details(out, result, "ERROR", TestResult::is_error)?;
            self.write_details(out, result, "FAIL", TestResult::is_fail)?;

            writeln!(out, "{}", "-".repeat(SEPARATOR_WIDTH))?;
            let tests_run = result.tests_run();
            writeln!(
                out,
                "Ran {} test{} in {:.3}s",
                tests_run,
                if tests_run == 1 { "" } else { "s" },
                result.duration.as_secs_f64()
            )?;
            writeln!(out)?;

            if result.was_successful() {
                writeln!(out, "{}", "OK".green().bold())
            } else {
                let mut parts = Vec::new();
                let failures = result.runs.iter().filter(|r| r.result.is_fail()).count();
                let errors = result.runs.iter().filter(|r| r.result.is_error()).count();
                if failures > 0 {
                    parts.push(format!("failures={}", failures));
                }
                if errors > 0 {
                    parts.push(format!("errors={}", errors));
                }
                writeln!(
                    out,
                    "{}",
                    format!("FAILED ({})", parts.join(", ")).red().bold()
                )
            }
        })
    }

    fn write_details<W: Write>(
        &self,
        out: &mut W,
        result: &TestRunResult,
        label: &str,
        keep: fn(&TestResult) -> bool,
    ) -> io::Result<()> {
        for run in result.runs.iter().filter(|r| keep(&r.result)) {
            writeln!(out, "{}", "=".repeat(SEPARATOR_WIDTH))?;
            writeln!(out, "{}: {}", label.red().bold(), run.test)?;
            writeln!(out, "{}", "-".repeat(SEPARATOR_WIDTH))?;
            for line in run.result.message().unwrap_or_default().lines() {
                writeln!(out, "{}", line.dimmed())?;
            }
            writeln!(out)?;
        }
        Ok(())
    }

    fn with_color_override<T>(&self, f: impl FnOnce() -> T) -> T {
        if self.no_color {
            colored::control::set_override(false);
        }
        let value = f();
        // Reset color override
        if self.no_color {
            colored::control::unset_override();
        }
        value
    }
}

fn glyph(result: &TestResult) -> ColoredString {
    match result {
        TestResult::Pass { .. } => ".".green(),
        TestResult::Fail { .. } => "F".red().bold(),
        TestResult::Error { .. } => "E".yellow().bold(),
    }
}

fn status_word(result: &TestResult) -> ColoredString {
    match result {
        TestResult::Pass { duration } if duration.as_secs() >= 1 => {
            format!("ok ({:.2?})", duration).green()
        }
        TestResult::Pass { .. } => "ok".green(),
        TestResult::Fail { .. } => "FAIL".red().bold(),
        TestResult::Error { .. } => "ERROR".yellow().bold(),
    }
}
