//! The report record sent after a run

use super::xmlrpc::Value;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::BTreeMap;

/// Informational keys present in every record
pub const INFO_KEYS: [&str; 4] = ["timestamp", "obspy", "dependencies", "platform"];

/// Outcome keys present in every record
pub const OUTCOME_KEYS: [&str; 2] = ["errors", "failures"];

/// Environment, versions and outcome of one run
///
/// Lookups that failed are kept as empty strings so every expected key is
/// present regardless of the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRecord {
    /// Local time the record was assembled
    pub timestamp: DateTime<Local>,
    /// ObsPy module versions, keyed by module id
    pub obspy: BTreeMap<String, String>,
    /// Third-party dependency versions
    pub dependencies: BTreeMap<String, String>,
    /// Platform and interpreter attributes
    pub platform: BTreeMap<String, String>,
    /// Errored test description to error text
    pub errors: BTreeMap<String, String>,
    /// Failed test description to failure text
    pub failures: BTreeMap<String, String>,
}

impl ReportRecord {
    /// The record as the XML-RPC struct passed to `report`
    pub fn to_xmlrpc(&self) -> Value {
        let mut members = BTreeMap::new();
        members.insert(
            "timestamp".to_string(),
            Value::DateTime(self.timestamp.naive_local()),
        );
        members.insert("obspy".to_string(), Value::from(&self.obspy));
        members.insert("dependencies".to_string(), Value::from(&self.dependencies));
        members.insert("platform".to_string(), Value::from(&self.platform));
        members.insert("errors".to_string(), Value::from(&self.errors));
        members.insert("failures".to_string(), Value::from(&self.failures));
        Value::Struct(members)
    }
}
