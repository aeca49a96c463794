//! Report delivery over XML-RPC

use super::record::ReportRecord;
use super::xmlrpc::{self, ResponseError, Value};
use std::time::Duration;
use thiserror::Error;

/// Remote procedure invoked with `(success, record)`
pub const REPORT_METHOD: &str = "report";

/// Why a report did not reach the server
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("failed to create HTTP client: {0}")]
    Client(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection error: {0}")]
    Connect(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("server answered with HTTP {status}")]
    Http { status: u16 },

    #[error("server fault {code}: {message}")]
    Fault { code: i32, message: String },

    #[error("server response is not an XML-RPC method response")]
    MalformedResponse,
}

/// Destination for a finished report
pub trait ReportSink {
    /// Where reports go, for user-facing messages
    fn endpoint(&self) -> &str;

    /// Deliver `record` along with the overall success flag
    fn submit(&self, success: bool, record: &ReportRecord) -> Result<(), DeliveryError>;
}

/// Calls `report(success, record)` on an XML-RPC server
#[derive(Debug, Clone)]
pub struct XmlRpcSink {
    endpoint: String,
    timeout: Duration,
}

impl XmlRpcSink {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Bound the whole request, connect included
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl ReportSink for XmlRpcSink {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn submit(&self, success: bool, record: &ReportRecord) -> Result<(), DeliveryError> {
        let body =
            xmlrpc::encode_method_call(REPORT_METHOD, &[Value::from(success), record.to_xmlrpc()]);

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.timeout)
            .build()
            .map_err(|e| DeliveryError::Client(e.to_string()))?;

        tracing::debug!(endpoint = %self.endpoint, bytes = body.len(), "sending report");

        let response = client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "text/xml")
            .body(body)
            .send()
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Http {
                status: status.as_u16(),
            });
        }

        let text = response.text().map_err(|e| self.classify(e))?;
        xmlrpc::check_response(&text).map_err(|e| match e {
            ResponseError::Fault(fault) => DeliveryError::Fault {
                code: fault.code,
                message: fault.message,
            },
            ResponseError::Malformed => DeliveryError::MalformedResponse,
        })
    }
}

impl XmlRpcSink {
    fn classify(&self, error: reqwest::Error) -> DeliveryError {
        if error.is_timeout() {
            DeliveryError::Timeout(self.timeout)
        } else if error.is_connect() {
            DeliveryError::Connect(error.to_string())
        } else {
            DeliveryError::Network(error.to_string())
        }
    }
}
