// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for cupslink.

use thiserror::Error;

/// Top-level error type for all cupslink operations.
#[derive(Debug, Error)]
pub enum CupsError {
    // -- Codec errors (never retried) --
    #[error("unsupported IPP operation: {0}")]
    UnsupportedOperation(String),

    #[error("malformed IPP response: {0}")]
    MalformedResponse(String),

    #[error("attribute '{name}' is {len} bytes, exceeding the 65535-byte limit")]
    AttributeTooLong { name: String, len: usize },

    // -- Transport errors --
    #[error("{}", transport_message(*status, message))]
    TransportFailure {
        /// HTTP status of the final attempt, if a response was received.
        status: Option<u16>,
        message: String,
    },

    #[error("CUPS version unavailable (IPP: {ipp}; HTTP: {http})")]
    VersionUnavailable { ipp: String, http: String },

    // -- Configuration --
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn transport_message(status: Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("transport failure (HTTP {code}): {message}"),
        None => format!("transport failure: {message}"),
    }
}

impl CupsError {
    /// Transport failure without an HTTP status (connect/IO errors).
    pub fn transport(message: impl Into<String>) -> Self {
        Self::TransportFailure {
            status: None,
            message: message.into(),
        }
    }

    /// The connect or exchange deadline expired.
    pub fn timeout() -> Self {
        Self::transport("timeout")
    }

    /// A response arrived but with a non-200 status.
    pub fn http_status(status: u16, body: &[u8]) -> Self {
        let message = if body.is_empty() {
            format!("status code {status}")
        } else {
            String::from_utf8_lossy(body).into_owned()
        };
        Self::TransportFailure {
            status: Some(status),
            message,
        }
    }

    /// HTTP status carried by a transport failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::TransportFailure { status, .. } => *status,
            _ => None,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CupsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_is_plain() {
        assert_eq!(CupsError::timeout().to_string(), "transport failure: timeout");
    }

    #[test]
    fn http_status_prefers_body() {
        let err = CupsError::http_status(403, b"Forbidden");
        assert_eq!(err.status(), Some(403));
        assert!(err.to_string().contains("Forbidden"));

        let err = CupsError::http_status(500, b"");
        assert!(err.to_string().contains("status code 500"));
    }

    #[test]
    fn version_unavailable_mentions_both_causes() {
        let err = CupsError::VersionUnavailable {
            ipp: "unsupported IPP operation: get-version".into(),
            http: "no version in body".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("get-version"));
        assert!(msg.contains("no version in body"));
    }
}
