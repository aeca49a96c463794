//! Run reports
//!
//! A report bundles module and dependency versions, platform attributes and
//! the outcome of a run. [`ReportAssembler`] builds it from probes,
//! [`ReportSink`] delivers it, and [`send_report`] wraps delivery so that a
//! failure is only ever printed.

pub mod assembler;
pub mod delivery;
pub mod probe;
pub mod record;
pub mod xmlrpc;

pub use assembler::ReportAssembler;
pub use delivery::{DeliveryError, ReportSink, XmlRpcSink, REPORT_METHOD};
pub use probe::{
    Dependency, DependencyProbe, HostProbe, PlatformAttribute, PlatformProbe, ProbeError,
    VersionQuery, DEPENDENCIES,
};
pub use record::{ReportRecord, INFO_KEYS, OUTCOME_KEYS};

use colored::*;

/// Deliver a report, printing the outcome
///
/// Returns whether the server accepted it. The run's own success is never
/// derived from this.
pub fn send_report(sink: &dyn ReportSink, success: bool, record: &ReportRecord) -> bool {
    match sink.submit(success, record) {
        Ok(()) => {
            println!("Test report has been sent to {}.", sink.endpoint());
            true
        }
        Err(e) => {
            tracing::warn!(endpoint = sink.endpoint(), error = %e, "report delivery failed");
            eprintln!(
                "{} Could not send a test report to {}: {}",
                "Error:".red().bold(),
                sink.endpoint(),
                e
            );
            false
        }
    }
}
