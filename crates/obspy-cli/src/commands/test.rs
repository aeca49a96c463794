//! Test command - resolve, run and optionally report

use anyhow::Result;
use colored::*;
use obspy_config::Config as Settings;
use obspy_testkit::report::{HostProbe, ReportAssembler, ReportSink, XmlRpcSink};
use obspy_testkit::{
    ReportTarget, Resolution, SuiteRegistry, SuiteResolver, TestProgram, TestResult,
    TestRunResult, TextTestRunner, Verbosity,
};
use serde_json::{json, Value};

/// Arguments for the test command
#[derive(Debug, Clone, Default)]
pub struct TestArgs {
    /// Module shortcuts or dotted names; empty means the default modules
    pub modules: Vec<String>,
    pub verbosity: Verbosity,
    /// Send a report after the run
    pub report: bool,
    /// Disable colored output
    pub no_color: bool,
    /// Output in JSON format
    pub json: bool,
    /// Print the selected tests instead of running them
    pub list: bool,
    /// Stop at the first failure or error
    pub failfast: bool,
}

/// What happened to the report, for the JSON summary
#[derive(Debug)]
struct Delivery {
    endpoint: String,
    error: Option<String>,
}

/// Run the test command
///
/// Returns whether the run was successful. Report delivery does not affect
/// the returned value.
pub fn run(args: &TestArgs, registry: &SuiteRegistry, settings: &Settings) -> Result<bool> {
    if args.no_color {
        colored::control::set_override(false);
    }

    let successful = if args.list {
        let resolution = SuiteResolver::new(registry)
            .with_quiet(args.verbosity.is_quiet())
            .resolve(args.modules.as_slice());
        list_tests(&resolution, args.json);
        true
    } else if args.json {
        run_json(args, registry, settings)
    } else {
        let host = host_metadata(settings);
        let sink = report_sink(settings);
        let target = ReportTarget {
            sink: &sink,
            platform: &host,
            dependencies: &host,
        };
        // Color is already overridden for the whole command
        TestProgram::new(registry)
            .with_verbosity(args.verbosity)
            .with_fail_fast(args.failfast)
            .with_report(args.report.then_some(target))
            .run(args.modules.as_slice())
            .was_successful()
    };

    reset_color(args.no_color);
    Ok(successful)
}

/// Run silently and print a JSON summary, report outcome included
fn run_json(args: &TestArgs, registry: &SuiteRegistry, settings: &Settings) -> bool {
    let resolution = SuiteResolver::new(registry)
        .with_quiet(args.verbosity.is_quiet())
        .resolve(args.modules.as_slice());
    let result = TextTestRunner::new()
        .with_fail_fast(args.failfast)
        .run(&resolution.suite);

    let delivery = args.report.then(|| deliver(registry, settings, &result));
    println!("{}", summary_json(&resolution, &result, delivery.as_ref()));
    result.was_successful()
}

fn reset_color(no_color: bool) {
    if no_color {
        colored::control::unset_override();
    }
}

fn list_tests(resolution: &Resolution, as_json: bool) {
    if as_json {
        let ids: Vec<&str> = resolution.suite.iter().map(|t| t.id()).collect();
        let skipped: Vec<&str> = resolution.failures.iter().map(|f| f.name.as_str()).collect();
        println!("{}", json!({ "tests": ids, "skipped": skipped }));
        return;
    }

    for test in resolution.suite.iter() {
        println!("{}", test.id());
    }
    println!(
        "{}",
        format!(
            "{} test{}",
            resolution.suite.len(),
            if resolution.suite.len() == 1 { "" } else { "s" }
        )
        .dimmed()
    );
}

/// Host lookups share the report's time limit
fn host_metadata(settings: &Settings) -> HostProbe {
    HostProbe::new(settings.python()).with_timeout(settings.report_timeout())
}

fn report_sink(settings: &Settings) -> XmlRpcSink {
    XmlRpcSink::new(settings.report_url()).with_timeout(settings.report_timeout())
}

/// Assemble and submit without printing; stdout carries the JSON summary
fn deliver(registry: &SuiteRegistry, settings: &Settings, result: &TestRunResult) -> Delivery {
    let host = host_metadata(settings);
    let record = ReportAssembler::new(registry, &host, &host).assemble(result);
    let sink = report_sink(settings);

    let error = match sink.submit(result.was_successful(), &record) {
        Ok(()) => None,
        Err(e) => {
            tracing::warn!(endpoint = sink.endpoint(), error = %e, "report delivery failed");
            Some(e.to_string())
        }
    };
    Delivery {
        endpoint: sink.endpoint().to_string(),
        error,
    }
}

fn outcome(result: &TestResult) -> &'static str {
    match result {
        TestResult::Pass { .. } => "ok",
        TestResult::Fail { .. } => "fail",
        TestResult::Error { .. } => "error",
    }
}

fn summary_json(
    resolution: &Resolution,
    result: &TestRunResult,
    delivery: Option<&Delivery>,
) -> Value {
    let results: Vec<_> = result
        .runs
        .iter()
        .map(|r| {
            json!({
                "id": r.test.id(),
                "test": r.test.describe(),
                "outcome": outcome(&r.result),
                "message": r.result.message(),
                "duration_ms": r.result.duration().as_millis(),
            })
        })
        .collect();

    let skipped: Vec<_> = resolution
        .failures
        .iter()
        .map(|f| json!({ "name": f.name, "reason": f.error.to_string() }))
        .collect();

    let report = delivery.map(|d| {
        json!({
            "endpoint": d.endpoint,
            "sent": d.error.is_none(),
            "error": d.error,
        })
    });

    json!({
        "tests": result.tests_run(),
        "passed": result.passed(),
        "failures": result.runs.iter().filter(|r| r.result.is_fail()).count(),
        "errors": result.runs.iter().filter(|r| r.result.is_error()).count(),
        "successful": result.was_successful(),
        "duration_ms": result.duration.as_millis(),
        "skipped": skipped,
        "results": results,
        "report": report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use obspy_config::{EnvironmentConfig, ReportConfig, RuntestsConfig};
    use obspy_testkit::{CaseError, TestSuite};
    use pretty_assertions::assert_eq;
    use std::net::TcpListener;
    use std::path::PathBuf;
    use std::time::Duration;

    fn registry(failing: bool) -> SuiteRegistry {
        let mut registry = SuiteRegistry::new();
        registry.register("sac", "0.1.0", move || {
            TestSuite::new()
                .with_case("obspy.sac.tests.test_core.CoreTestCase.test_read", || Ok(()))
                .with_case("obspy.sac.tests.test_core.CoreTestCase.test_write", move || {
                    if failing {
                        Err(CaseError::failure("header mismatch"))
                    } else {
                        Ok(())
                    }
                })
        });
        registry
    }

    /// Settings pointing the report at a port nobody listens on
    fn unreachable_settings() -> Settings {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        Settings {
            settings: RuntestsConfig {
                report: Some(ReportConfig {
                    url: Some(format!("http://127.0.0.1:{}/", port)),
                    timeout_secs: Some(2),
                    enabled: None,
                }),
                environment: Some(EnvironmentConfig {
                    python: Some(PathBuf::from("/nonexistent/python3")),
                }),
            },
            config_path: None,
        }
    }

    fn args(modules: &[&str]) -> TestArgs {
        TestArgs {
            modules: modules.iter().map(|m| m.to_string()).collect(),
            verbosity: Verbosity::Quiet,
            no_color: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_successful_run() {
        let ok = run(&args(&["sac"]), &registry(false), &Settings::default()).unwrap();
        assert!(ok);
    }

    #[test]
    fn test_failing_run() {
        let ok = run(&args(&["sac"]), &registry(true), &Settings::default()).unwrap();
        assert!(!ok);
    }

    #[test]
    fn test_unloadable_module_does_not_fail_run() {
        let ok = run(
            &args(&["obspy.nothere.tests.suite", "sac"]),
            &registry(false),
            &Settings::default(),
        )
        .unwrap();
        assert!(ok);
    }

    #[test]
    fn test_failed_report_keeps_outcome() {
        let settings = unreachable_settings();

        let mut passing = args(&["sac"]);
        passing.report = true;
        assert!(run(&passing, &registry(false), &settings).unwrap());

        let mut failing = args(&["sac"]);
        failing.report = true;
        failing.json = true;
        assert!(!run(&failing, &registry(true), &settings).unwrap());
    }

    #[test]
    fn test_failfast_still_reports_failure() {
        let mut failfast = args(&["sac"]);
        failfast.failfast = true;
        assert!(!run(&failfast, &registry(true), &Settings::default()).unwrap());
    }

    #[test]
    fn test_report_timeout_bounds_host_commands() {
        let settings = unreachable_settings();
        assert_eq!(host_metadata(&settings).timeout(), Duration::from_secs(2));
        assert_eq!(report_sink(&settings).timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_list_does_not_run() {
        let mut list = args(&["sac"]);
        list.list = true;
        // The failing test is listed, not executed
        assert!(run(&list, &registry(true), &Settings::default()).unwrap());
    }

    #[test]
    fn test_summary_json() {
        let registry = registry(true);
        let resolution = SuiteResolver::new(&registry)
            .with_quiet(true)
            .resolve(&["sac", "obspy.gone"]);
        let result = TextTestRunner::new().run(&resolution.suite);
        let delivery = Delivery {
            endpoint: "http://localhost:8000/".to_string(),
            error: Some("connection refused".to_string()),
        };

        let summary = summary_json(&resolution, &result, Some(&delivery));

        assert_eq!(summary["tests"], 2);
        assert_eq!(summary["passed"], 1);
        assert_eq!(summary["failures"], 1);
        assert_eq!(summary["errors"], 0);
        assert_eq!(summary["successful"], false);
        assert_eq!(summary["skipped"][0]["name"], "obspy.gone");
        assert_eq!(summary["results"][1]["outcome"], "fail");
        assert_eq!(
            summary["results"][1]["test"],
            "test_write (obspy.sac.tests.test_core.CoreTestCase)"
        );
        assert_eq!(summary["results"][1]["message"], "header mismatch");
        assert_eq!(summary["report"]["sent"], false);
    }

    #[test]
    fn test_summary_json_without_report() {
        let summary = summary_json(&Resolution::default(), &TestRunResult::default(), None);
        assert_eq!(summary["tests"], 0);
        assert_eq!(summary["successful"], true);
        assert!(summary["report"].is_null());
    }
}
