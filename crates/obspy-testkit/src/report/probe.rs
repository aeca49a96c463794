//! Host introspection for the report
//!
//! Every lookup can fail independently; callers record a failure as an empty
//! string rather than aborting.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Poll interval while waiting for a probe command
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A failed metadata lookup
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Status {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("{0} produced no output")]
    EmptyOutput(String),

    #[error("{program} did not finish within {timeout:?}")]
    TimedOut { program: String, timeout: Duration },

    #[error("{0} is not available on this platform")]
    Unsupported(&'static str),
}

/// How a dependency reports its version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionQuery {
    /// Read a module attribute, e.g. `__version__`
    Attribute(&'static str),
    /// Call a module-level function, e.g. `coreVersion()`
    Capability(&'static str),
}

/// A third-party dependency whose version goes into the report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency {
    pub name: &'static str,
    pub query: VersionQuery,
}

/// Dependencies listed in every report
pub const DEPENDENCIES: [Dependency; 5] = [
    Dependency {
        name: "numpy",
        query: VersionQuery::Attribute("__version__"),
    },
    Dependency {
        name: "scipy",
        query: VersionQuery::Attribute("__version__"),
    },
    Dependency {
        name: "matplotlib",
        query: VersionQuery::Attribute("__version__"),
    },
    Dependency {
        name: "lxml.etree",
        query: VersionQuery::Attribute("__version__"),
    },
    Dependency {
        name: "_omnipy",
        query: VersionQuery::Capability("coreVersion"),
    },
];

/// Platform attributes listed in every report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformAttribute {
    System,
    Node,
    Release,
    Version,
    Machine,
    Processor,
    PythonVersion,
    PythonImplementation,
    PythonCompiler,
    Architecture,
}

impl PlatformAttribute {
    pub const ALL: [PlatformAttribute; 10] = [
        PlatformAttribute::System,
        PlatformAttribute::Node,
        PlatformAttribute::Release,
        PlatformAttribute::Version,
        PlatformAttribute::Machine,
        PlatformAttribute::Processor,
        PlatformAttribute::PythonVersion,
        PlatformAttribute::PythonImplementation,
        PlatformAttribute::PythonCompiler,
        PlatformAttribute::Architecture,
    ];

    /// Key used in the report's platform map
    pub fn key(self) -> &'static str {
        match self {
            PlatformAttribute::System => "system",
            PlatformAttribute::Node => "node",
            PlatformAttribute::Release => "release",
            PlatformAttribute::Version => "version",
            PlatformAttribute::Machine => "machine",
            PlatformAttribute::Processor => "processor",
            PlatformAttribute::PythonVersion => "python_version",
            PlatformAttribute::PythonImplementation => "python_implementation",
            PlatformAttribute::PythonCompiler => "python_compiler",
            PlatformAttribute::Architecture => "architecture",
        }
    }

    /// `uname` flag answering this attribute
    fn uname_flag(self) -> Option<&'static str> {
        match self {
            PlatformAttribute::System => Some("-s"),
            PlatformAttribute::Node => Some("-n"),
            PlatformAttribute::Release => Some("-r"),
            PlatformAttribute::Version => Some("-v"),
            PlatformAttribute::Machine => Some("-m"),
            PlatformAttribute::Processor => Some("-p"),
            _ => None,
        }
    }

    /// Python `platform` function answering this attribute
    fn python_function(self) -> Option<&'static str> {
        match self {
            PlatformAttribute::PythonVersion => Some("python_version"),
            PlatformAttribute::PythonImplementation => Some("python_implementation"),
            PlatformAttribute::PythonCompiler => Some("python_compiler"),
            _ => None,
        }
    }
}

/// Answers platform queries
///
/// A query may return several parts (e.g. bit width and linkage for the
/// architecture); the report keeps the first.
pub trait PlatformProbe {
    fn query(&self, attribute: PlatformAttribute) -> Result<Vec<String>, ProbeError>;
}

/// Answers dependency version queries
pub trait DependencyProbe {
    fn version(&self, dependency: &Dependency) -> Result<String, ProbeError>;
}

/// Probes the real host: `uname` for the operating system and a Python
/// interpreter for the interpreter and dependency fields
///
/// Every command is killed once it runs longer than the probe timeout.
#[derive(Debug, Clone)]
pub struct HostProbe {
    python: PathBuf,
    timeout: Duration,
}

impl HostProbe {
    pub fn new(python: impl Into<PathBuf>) -> Self {
        Self {
            python: python.into(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Bound each probe command
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn python(&self) -> &Path {
        &self.python
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn run_python(&self, code: &str) -> Result<String, ProbeError> {
        run_command(Command::new(&self.python).arg("-c").arg(code), self.timeout)
    }
}

impl PlatformProbe for HostProbe {
    fn query(&self, attribute: PlatformAttribute) -> Result<Vec<String>, ProbeError> {
        if attribute == PlatformAttribute::Architecture {
            return Ok(architecture());
        }

        if let Some(function) = attribute.python_function() {
            let code = format!("import platform; print(platform.{}())", function);
            return self.run_python(&code).map(|out| vec![out]);
        }

        match attribute.uname_flag() {
            Some(flag) if cfg!(unix) => {
                let out = run_command(Command::new("uname").arg(flag), self.timeout)?;
                known_value(out, flag).map(|out| vec![out])
            }
            _ => Err(ProbeError::Unsupported(attribute.key())),
        }
    }
}

impl DependencyProbe for HostProbe {
    fn version(&self, dependency: &Dependency) -> Result<String, ProbeError> {
        let accessor = match dependency.query {
            VersionQuery::Attribute(attribute) => format!("m.{}", attribute),
            VersionQuery::Capability(function) => format!("m.{}()", function),
        };
        let code = format!(
            "import importlib; m = importlib.import_module('{}'); print({})",
            dependency.name, accessor
        );
        self.run_python(&code)
    }
}

/// Pointer width and binary format of this build
fn architecture() -> Vec<String> {
    let bits = format!("{}bit", usize::BITS);
    let linkage = match std::env::consts::OS {
        "linux" | "freebsd" | "netbsd" | "openbsd" | "dragonfly" | "android" => "ELF",
        "macos" | "ios" => "Mach-O",
        "windows" => "WindowsPE",
        _ => "",
    };
    vec![bits, linkage.to_string()]
}

/// `uname` answers `unknown` for fields it cannot determine
fn known_value(value: String, flag: &str) -> Result<String, ProbeError> {
    if value.trim() == "unknown" {
        Err(ProbeError::EmptyOutput(format!("uname {}", flag)))
    } else {
        Ok(value)
    }
}

/// Run a command and return its trimmed stdout, killing it after `timeout`
fn run_command(command: &mut Command, timeout: Duration) -> Result<String, ProbeError> {
    let program = command.get_program().to_string_lossy().into_owned();
    let spawn_error = |source| ProbeError::Spawn {
        program: program.clone(),
        source,
    };

    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(spawn_error)?;

    let deadline = Instant::now() + timeout;
    loop {
        if child.try_wait().map_err(spawn_error)?.is_some() {
            break;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ProbeError::TimedOut { program, timeout });
        }
        thread::sleep(POLL_INTERVAL);
    }

    let output = child.wait_with_output().map_err(spawn_error)?;

    if !output.status.success() {
        return Err(ProbeError::Status {
            program,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if stdout.is_empty() {
        return Err(ProbeError::EmptyOutput(program));
    }
    Ok(stdout)
}
