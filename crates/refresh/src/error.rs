//! Error taxonomy for the overlay controller.
//!
//! Every error here is recoverable: the controller reports it and keeps the
//! previous source, interval and layer.

use std::path::PathBuf;

use formats::geojson::OverlayFormatError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    IoFailure,
    ParseFailure,
}

/// Why the source resolver refused a descriptor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    #[error("malformed address: {0:?}")]
    MalformedAddress(String),

    #[error("unreadable file {}: {reason}", path.display())]
    UnreadableFile { path: PathBuf, reason: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("failed to read {}: {reason}", path.display())]
    File { path: PathBuf, reason: String },

    #[error("request to {address} failed: {reason}")]
    Unreachable { address: String, reason: String },

    #[error("{address} answered with HTTP {status}")]
    HttpStatus { address: String, status: u16 },

    #[error("{address} is larger than {limit} bytes")]
    TooLarge { address: String, limit: u64 },

    #[error("fetching {scheme}:// addresses is not supported")]
    UnsupportedScheme { scheme: String },

    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error(transparent)]
    Format(#[from] OverlayFormatError),

    #[error("parser task failed: {0}")]
    Task(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    #[error(transparent)]
    Rejected(#[from] RejectionReason),

    #[error("refresh interval cannot be negative (got {0})")]
    NegativeInterval(i64),

    #[error("refresh interval is not an integer: {0:?}")]
    NonIntegerInterval(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl RefreshError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RefreshError::Rejected(RejectionReason::MalformedAddress(_))
            | RefreshError::NegativeInterval(_)
            | RefreshError::NonIntegerInterval(_) => ErrorKind::InvalidInput,
            RefreshError::Rejected(RejectionReason::UnreadableFile { .. })
            | RefreshError::Fetch(_) => ErrorKind::IoFailure,
            RefreshError::Parse(_) => ErrorKind::ParseFailure,
        }
    }

    /// Text for the operator-facing error dialog.
    pub fn user_message(&self) -> String {
        match self {
            RefreshError::Rejected(RejectionReason::MalformedAddress(_)) => {
                "Invalid URL. Please provide a valid URL".to_string()
            }
            RefreshError::Rejected(RejectionReason::UnreadableFile { path, .. }) => {
                format!("Invalid file: {}", path.display())
            }
            RefreshError::NegativeInterval(_) => {
                "The refresh rate cannot be negative. Enter 0 to stop refreshing.".to_string()
            }
            RefreshError::NonIntegerInterval(_) => {
                "Please enter a valid integer value for the refresh rate.".to_string()
            }
            RefreshError::Fetch(e) => format!("Could not load the overlay: {e}"),
            RefreshError::Parse(e) => format!("The overlay data could not be read: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, FetchError, ParseError, RefreshError, RejectionReason};
    use formats::geojson::OverlayFormatError;

    #[test]
    fn kinds_follow_taxonomy() {
        let malformed: RefreshError = RejectionReason::MalformedAddress("x".into()).into();
        let unreadable: RefreshError = RejectionReason::UnreadableFile {
            path: "missing.json".into(),
            reason: "not found".into(),
        }
        .into();
        let fetch: RefreshError = FetchError::HttpStatus {
            address: "https://example.org".into(),
            status: 503,
        }
        .into();
        let parse: RefreshError =
            ParseError::from(OverlayFormatError::InvalidJson("eof".into())).into();

        assert_eq!(malformed.kind(), ErrorKind::InvalidInput);
        assert_eq!(RefreshError::NegativeInterval(-3).kind(), ErrorKind::InvalidInput);
        assert_eq!(
            RefreshError::NonIntegerInterval("ten".into()).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(unreadable.kind(), ErrorKind::IoFailure);
        assert_eq!(fetch.kind(), ErrorKind::IoFailure);
        assert_eq!(parse.kind(), ErrorKind::ParseFailure);
    }

    #[test]
    fn messages_are_operator_friendly() {
        let err: RefreshError = RejectionReason::MalformedAddress("htp:/x".into()).into();
        assert_eq!(err.user_message(), "Invalid URL. Please provide a valid URL");
        assert_eq!(
            RefreshError::NonIntegerInterval("5s".into()).user_message(),
            "Please enter a valid integer value for the refresh rate."
        );
        assert_eq!(
            RefreshError::Fetch(FetchError::UnsupportedScheme {
                scheme: "ftp".into()
            })
            .to_string(),
            "fetching ftp:// addresses is not supported"
        );
    }
}
