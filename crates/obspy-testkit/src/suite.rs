//! Test cases and aggregated suites

use std::fmt;
use std::sync::Arc;

/// Outcome of a test body
pub type CaseResult = Result<(), CaseError>;

/// Shared, callable test body
pub type CaseBody = Arc<dyn Fn() -> CaseResult + Send + Sync>;

/// Why a test body did not pass
///
/// A failure is a broken expectation; an error is anything else going wrong
/// while the test ran. Any `std::error::Error` converts into an error, so
/// bodies can use `?` freely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseError {
    Failure(String),
    Error(String),
}

impl CaseError {
    /// Build an assertion-style failure
    pub fn failure(message: impl Into<String>) -> Self {
        CaseError::Failure(message.into())
    }

    /// Build an unexpected error
    pub fn error(message: impl Into<String>) -> Self {
        CaseError::Error(message.into())
    }

    pub fn message(&self) -> &str {
        match self {
            CaseError::Failure(message) | CaseError::Error(message) => message,
        }
    }
}

impl fmt::Display for CaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseError::Failure(message) => write!(f, "failure: {}", message),
            CaseError::Error(message) => write!(f, "error: {}", message),
        }
    }
}

impl<E> From<E> for CaseError
where
    E: std::error::Error,
{
    fn from(error: E) -> Self {
        CaseError::Error(error.to_string())
    }
}

/// Fail the current test unless `condition` holds
pub fn check(condition: bool, message: impl Into<String>) -> CaseResult {
    if condition {
        Ok(())
    } else {
        Err(CaseError::failure(message))
    }
}

/// A single test method
///
/// The id is the fully qualified dotted path, e.g.
/// `obspy.core.tests.test_stats.StatsTestCase.test_init`.
#[derive(Clone)]
pub struct TestCase {
    id: String,
    body: CaseBody,
}

impl TestCase {
    pub fn new<F>(id: impl Into<String>, body: F) -> Self
    where
        F: Fn() -> CaseResult + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            body: Arc::new(body),
        }
    }

    /// Fully qualified dotted id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Last path segment (the test method)
    pub fn method_name(&self) -> &str {
        self.id.rsplit_once('.').map_or(self.id.as_str(), |(_, method)| method)
    }

    /// Everything before the method (module path plus test class)
    pub fn class_path(&self) -> &str {
        self.id.rsplit_once('.').map_or("", |(class, _)| class)
    }

    /// Textual identifier used in summaries and reports: `method (class.path)`
    pub fn describe(&self) -> String {
        format!("{} ({})", self.method_name(), self.class_path())
    }

    /// Whether `path` names this test or one of its enclosing packages/classes
    pub fn matches_path(&self, path: &str) -> bool {
        match self.id.strip_prefix(path) {
            Some(rest) => rest.is_empty() || rest.starts_with('.'),
            None => false,
        }
    }

    /// Execute the body
    pub fn call(&self) -> CaseResult {
        (self.body)()
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase").field("id", &self.id).finish()
    }
}

impl fmt::Display for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// An ordered, runnable collection of test cases
#[derive(Debug, Clone, Default)]
pub struct TestSuite {
    tests: Vec<TestCase>,
}

impl TestSuite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one test case
    pub fn push(&mut self, test: TestCase) {
        self.tests.push(test);
    }

    /// Builder-style [`TestSuite::push`]
    pub fn with_case<F>(mut self, id: impl Into<String>, body: F) -> Self
    where
        F: Fn() -> CaseResult + Send + Sync + 'static,
    {
        self.push(TestCase::new(id, body));
        self
    }

    /// Append every test of `other`, keeping encounter order
    pub fn extend(&mut self, other: TestSuite) {
        self.tests.extend(other.tests);
    }

    /// Sub-suite of the tests selected by a dotted path
    pub fn select(&self, path: &str) -> TestSuite {
        self.tests
            .iter()
            .filter(|t| t.matches_path(path))
            .cloned()
            .collect()
    }

    pub fn tests(&self) -> &[TestCase] {
        &self.tests
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TestCase> {
        self.tests.iter()
    }

    /// Check if suite has any tests
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Get count of tests
    pub fn len(&self) -> usize {
        self.tests.len()
    }
}

impl FromIterator<TestCase> for TestSuite {
    fn from_iter<I: IntoIterator<Item = TestCase>>(iter: I) -> Self {
        Self {
            tests: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a TestSuite {
    type Item = &'a TestCase;
    type IntoIter = std::slice::Iter<'a, TestCase>;

    fn into_iter(self) -> Self::IntoIter {
        self.tests.iter()
    }
}
