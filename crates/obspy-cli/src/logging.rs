//! Developer tracing
//!
//! The subscriber is only installed when `OBSPY_LOG` (or `RUST_LOG`) is set.
//! `OBSPY_LOG_FORMAT=json` switches to one JSON object per event.
//!
//! ```bash
//! OBSPY_LOG=debug obspy-runtests mseed
//! OBSPY_LOG=obspy_testkit::report=debug OBSPY_LOG_FORMAT=json obspy-runtests -r
//! ```

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter, Registry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// `OBSPY_LOG` wins over `RUST_LOG`
fn build_filter() -> EnvFilter {
    match std::env::var("OBSPY_LOG") {
        Ok(value) => EnvFilter::builder().parse_lossy(value),
        Err(_) => EnvFilter::from_default_env(),
    }
}

/// Install the global subscriber, writing to stderr
pub fn init_tracing() {
    if std::env::var_os("OBSPY_LOG").is_none() && std::env::var_os("RUST_LOG").is_none() {
        return;
    }

    let filter = build_filter();
    let format = LogFormat::parse(&std::env::var("OBSPY_LOG_FORMAT").unwrap_or_default());

    // try_init: a second subscriber (e.g. under a test harness) is not an error
    match format {
        LogFormat::Json => {
            let json_layer = fmt::layer().json().with_writer(std::io::stderr);
            let _ = Registry::default().with(filter).with(json_layer).try_init();
        }
        LogFormat::Text => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::parse("tree"), LogFormat::Text);
        assert_eq!(LogFormat::parse(""), LogFormat::Text);
    }
}
