//! `obspy.core.tests.test_runtests`: self-checks of the launcher

use obspy_testkit::report::xmlrpc::{self, ResponseError};
use obspy_testkit::report::{
    Dependency, DependencyProbe, HostProbe, PlatformAttribute, PlatformProbe, ProbeError,
    ReportAssembler, INFO_KEYS, OUTCOME_KEYS,
};
use obspy_testkit::suite::check;
use obspy_testkit::{
    canonical_name, resolve_names, CaseError, SuiteRegistry, SuiteResolver, TestCase, TestRunResult,
    TestSuite, DEFAULT_MODULES,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const PREFIX: &str = "obspy.core.tests.test_runtests";

pub fn suite() -> TestSuite {
    let cases: [(&str, fn() -> obspy_testkit::CaseResult); 11] = [
        ("ResolverTestCase.test_empty_input_expands_defaults", empty_input_expands_defaults),
        ("ResolverTestCase.test_shortcut_is_expanded", shortcut_is_expanded),
        ("ResolverTestCase.test_qualified_name_passes_through", qualified_name_passes_through),
        ("ResolverTestCase.test_unloadable_name_is_skipped", unloadable_name_is_skipped),
        ("SuiteTestCase.test_describe", describe),
        ("SuiteTestCase.test_select_is_segment_aware", select_is_segment_aware),
        ("ReportTestCase.test_escape_markup", escape_markup),
        ("ReportTestCase.test_fault_is_rejected", fault_is_rejected),
        ("ReportTestCase.test_record_keys", record_keys),
        ("ReportTestCase.test_architecture", architecture),
        ("ConfigTestCase.test_default_endpoint", default_endpoint),
    ];

    cases
        .into_iter()
        .map(|(name, body)| TestCase::new(format!("{}.{}", PREFIX, name), body))
        .collect()
}

fn empty_input_expands_defaults() -> obspy_testkit::CaseResult {
    let names = resolve_names::<&str>(&[]);
    check(names.len() == DEFAULT_MODULES.len(), "one name per default module")?;
    for (name, module) in names.iter().zip(DEFAULT_MODULES) {
        check(
            *name == canonical_name(module),
            format!("{} != {}", name, canonical_name(module)),
        )?;
    }
    Ok(())
}

fn shortcut_is_expanded() -> obspy_testkit::CaseResult {
    let names = resolve_names(&["mseed"]);
    check(
        names == ["obspy.mseed.tests.suite"],
        format!("{:?}", names),
    )
}

fn qualified_name_passes_through() -> obspy_testkit::CaseResult {
    let name = "obspy.core.tests.test_stats.StatsTestCase";
    let names = resolve_names(&[name]);
    check(names == [name], format!("{:?}", names))
}

fn unloadable_name_is_skipped() -> obspy_testkit::CaseResult {
    let mut registry = SuiteRegistry::new();
    registry.register("sac", "0.0.0", || {
        TestSuite::new().with_case("obspy.sac.tests.test_core.CoreTestCase.test_read", || Ok(()))
    });

    let resolution = SuiteResolver::new(&registry)
        .with_quiet(true)
        .resolve(&["gse2", "sac"]);
    check(resolution.failures.len() == 1, "gse2 is not registered")?;
    check(resolution.suite.len() == 1, "sac still loads")
}

fn describe() -> obspy_testkit::CaseResult {
    let case = TestCase::new("obspy.core.tests.test_stats.StatsTestCase.test_init", || Ok(()));
    check(
        case.describe() == "test_init (obspy.core.tests.test_stats.StatsTestCase)",
        case.describe(),
    )
}

fn select_is_segment_aware() -> obspy_testkit::CaseResult {
    let suite = TestSuite::new()
        .with_case("obspy.core.tests.test_utc.UTCTestCase.test_a", || Ok(()))
        .with_case("obspy.core.tests.test_utcdatetime.UTCTestCase.test_a", || Ok(()));
    check(
        suite.select("obspy.core.tests.test_utc").len() == 1,
        "prefix must stop at a dot",
    )
}

fn escape_markup() -> obspy_testkit::CaseResult {
    let escaped = xmlrpc::escape("<a & b>");
    check(escaped == "&lt;a &amp; b&gt;", escaped.into_owned())
}

fn fault_is_rejected() -> obspy_testkit::CaseResult {
    let body = "<methodResponse><fault><value><struct>\
                <member><name>faultCode</name><value><int>2</int></value></member>\
                <member><name>faultString</name><value><string>nope</string></value></member>\
                </struct></value></fault></methodResponse>";
    match xmlrpc::check_response(body) {
        Err(ResponseError::Fault(fault)) => check(
            fault.code == 2 && fault.message == "nope",
            format!("{:?}", fault),
        ),
        other => Err(CaseError::failure(format!("expected a fault, got {:?}", other))),
    }
}

struct Unavailable;

impl PlatformProbe for Unavailable {
    fn query(&self, attribute: PlatformAttribute) -> Result<Vec<String>, ProbeError> {
        Err(ProbeError::Unsupported(attribute.key()))
    }
}

impl DependencyProbe for Unavailable {
    fn version(&self, dependency: &Dependency) -> Result<String, ProbeError> {
        Err(ProbeError::EmptyOutput(dependency.name.to_string()))
    }
}

fn record_keys() -> obspy_testkit::CaseResult {
    let registry = SuiteRegistry::new();
    let record = ReportAssembler::new(&registry, &Unavailable, &Unavailable)
        .assemble(&TestRunResult::default());

    let json = serde_json::to_value(&record)?;
    for key in INFO_KEYS.iter().chain(OUTCOME_KEYS.iter()) {
        check(json.get(key).is_some(), format!("missing {}", key))?;
    }
    check(
        record.platform.values().all(String::is_empty),
        "failed lookups must be empty strings",
    )
}

fn architecture() -> obspy_testkit::CaseResult {
    let parts = HostProbe::new("python3")
        .query(PlatformAttribute::Architecture)
        .map_err(|e| CaseError::error(e.to_string()))?;
    let first = parts.first().map(String::as_str).unwrap_or_default();
    check(first.ends_with("bit"), format!("unexpected architecture {:?}", parts))
}

fn default_endpoint() -> obspy_testkit::CaseResult {
    let settings = obspy_config::Config::default();
    check(
        settings.report_url() == obspy_config::DEFAULT_REPORT_URL,
        settings.report_url().to_string(),
    )?;
    check(
        settings.report_timeout().as_secs() == obspy_config::DEFAULT_REPORT_TIMEOUT_SECS,
        "default timeout",
    )
}
