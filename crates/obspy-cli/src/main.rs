use anyhow::{Context, Result};
use clap::Parser;
use obspy_config::{ConfigLoader, ReportConfig};
use obspy_testkit::Verbosity;
use std::path::PathBuf;

mod commands;
mod config;
mod logging;
mod suites;

/// Run the ObsPy test suites and optionally report the outcome.
///
/// Without module arguments every default module is tested. A module can be
/// given by its shortcut (`core`, `mseed`, ...) or by a dotted name selecting
/// a suite, a test file, a test class or a single test method.
///
/// EXAMPLES:
///     obspy-runtests                          Test all default modules
///     obspy-runtests mseed sac                Test two modules
///     obspy-runtests -v obspy.core.tests.test_runtests.ResolverTestCase
///     obspy-runtests -r                       Test and send a report
///
/// ENVIRONMENT VARIABLES:
///     OBSPY_REPORT_TEST     Set to always send a report
///     OBSPY_REPORT_URL      Report server endpoint
///     OBSPY_REPORT_TIMEOUT  Report call timeout in seconds
///     OBSPY_PYTHON          Interpreter used to probe dependency versions
///     OBSPY_LOG             Tracing filter, e.g. 'debug'
///     NO_COLOR              Set to disable colored output
#[derive(Parser, Debug)]
#[command(name = "obspy-runtests")]
#[command(version)]
struct Cli {
    /// Print one line per test
    #[arg(short, long)]
    verbose: bool,

    /// Print only the summary
    #[arg(short, long)]
    quiet: bool,

    /// Send a test report to the report server
    #[arg(short, long)]
    report: bool,

    /// Report server endpoint
    #[arg(long, value_name = "URL")]
    report_url: Option<String>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,

    /// List the selected tests without running them
    #[arg(long)]
    list: bool,

    /// Stop at the first failure or error
    #[arg(short, long)]
    failfast: bool,

    /// Use this runtests.toml instead of searching for one
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Module shortcuts or dotted test names
    #[arg(value_name = "MODULE")]
    modules: Vec<String>,
}

fn main() -> Result<()> {
    logging::init_tracing();

    let cli = Cli::parse();
    let cli_config = config::Config::from_env();

    let mut loader = ConfigLoader::new();
    let mut settings = match &cli.config {
        Some(path) => loader
            .load_from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => loader
            .load_from_directory(&std::env::current_dir()?)
            .context("failed to load runtests.toml")?,
    };

    // Command-line flag overrides file and environment
    if let Some(url) = cli.report_url {
        settings
            .settings
            .report
            .get_or_insert_with(ReportConfig::default)
            .url = Some(url);
        settings.settings.validate().context("invalid --report-url")?;
    }

    let args = commands::test::TestArgs {
        modules: cli.modules,
        verbosity: Verbosity::from_flags(cli.verbose, cli.quiet),
        report: cli.report || cli_config.force_report || settings.report_enabled(),
        no_color: cli.no_color || cli_config.no_color,
        json: cli.json || cli_config.default_json,
        list: cli.list,
        failfast: cli.failfast,
    };

    let registry = suites::registry();
    let successful = commands::test::run(&args, &registry, &settings)?;

    // Report delivery never influences this
    if !successful {
        std::process::exit(1);
    }

    Ok(())
}
