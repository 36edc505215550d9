//! Source descriptors and the resolver that vets them.

use std::fs::File;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::RejectionReason;

/// `scheme://host[:port][/path]` with the scheme limited to http, https and ftp.
static ADDRESS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<scheme>https?|ftp)://(?P<host>[a-zA-Z0-9.-]+)(?::[0-9]{1,5})?(?:/\S*)?$")
        .expect("address pattern compiles")
});

/// What the operator asked to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceDescriptor {
    FilePath(PathBuf),
    EndpointAddress(String),
}

impl SourceDescriptor {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        SourceDescriptor::FilePath(path.into())
    }

    pub fn address(address: impl Into<String>) -> Self {
        SourceDescriptor::EndpointAddress(address.into())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
    Ftp,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
            Scheme::Ftp => "ftp",
        }
    }
}

/// An address that passed validation. Only the resolver builds these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    address: String,
    scheme: Scheme,
    host: String,
}

impl Endpoint {
    pub fn as_str(&self) -> &str {
        &self.address
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

/// A descriptor the resolver accepted; immutable from here on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidSource {
    File(PathBuf),
    Endpoint(Endpoint),
}

impl ValidSource {
    /// Short human label, used for layer names and logs.
    pub fn label(&self) -> String {
        match self {
            ValidSource::File(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            ValidSource::Endpoint(endpoint) => endpoint.address.clone(),
        }
    }
}

impl std::fmt::Display for ValidSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidSource::File(path) => write!(f, "file {}", path.display()),
            ValidSource::Endpoint(endpoint) => write!(f, "{}", endpoint.address),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceResolver {
    default_address: String,
}

impl SourceResolver {
    pub fn new(default_address: impl Into<String>) -> Self {
        Self {
            default_address: default_address.into(),
        }
    }

    pub fn default_address(&self) -> &str {
        &self.default_address
    }

    /// Checks a descriptor without side effects.
    ///
    /// File paths are checked with blocking filesystem calls; async callers
    /// should run this on the blocking pool.
    pub fn validate(&self, descriptor: &SourceDescriptor) -> Result<ValidSource, RejectionReason> {
        match descriptor {
            SourceDescriptor::FilePath(path) => validate_file(path).map(ValidSource::File),
            SourceDescriptor::EndpointAddress(raw) => {
                self.validate_address(raw).map(ValidSource::Endpoint)
            }
        }
    }

    /// An empty (or all-whitespace) address means the default address.
    pub fn validate_address(&self, raw: &str) -> Result<Endpoint, RejectionReason> {
        let trimmed = raw.trim();
        let address = if trimmed.is_empty() {
            self.default_address.trim()
        } else {
            trimmed
        };
        parse_endpoint(address)
    }
}

fn parse_endpoint(address: &str) -> Result<Endpoint, RejectionReason> {
    let malformed = || RejectionReason::MalformedAddress(address.to_string());
    let caps = ADDRESS_PATTERN.captures(address).ok_or_else(malformed)?;

    let scheme = match &caps["scheme"] {
        "http" => Scheme::Http,
        "https" => Scheme::Https,
        _ => Scheme::Ftp,
    };
    let host = &caps["host"];
    if !is_valid_host(host) {
        return Err(malformed());
    }

    Ok(Endpoint {
        address: address.to_string(),
        scheme,
        host: host.to_ascii_lowercase(),
    })
}

fn is_valid_host(host: &str) -> bool {
    host.split('.')
        .all(|label| !label.is_empty() && !label.starts_with('-') && !label.ends_with('-'))
}

fn validate_file(path: &Path) -> Result<PathBuf, RejectionReason> {
    let unreadable = |reason: String| RejectionReason::UnreadableFile {
        path: path.to_path_buf(),
        reason,
    };

    let meta = std::fs::metadata(path).map_err(|e| unreadable(e.to_string()))?;
    if !meta.is_file() {
        return Err(unreadable("not a regular file".to_string()));
    }
    File::open(path).map_err(|e| unreadable(e.to_string()))?;
    Ok(path.to_path_buf())
}
