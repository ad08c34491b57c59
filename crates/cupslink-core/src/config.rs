// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Client configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CupsError, Result};

/// Settings for a single CUPS client instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// CUPS server host name or address.
    pub host: String,
    /// CUPS server port (default 631).
    pub port: u16,
    /// Connect and request/response deadline in milliseconds.
    pub timeout_ms: u64,
    /// Optional Basic-auth user.
    pub username: Option<String>,
    /// Optional Basic-auth password.
    pub password: Option<String>,
    /// Value sent as `requesting-user-name`. Falls back to the OS user.
    pub requesting_user_name: Option<String>,
    /// `job-name` used when the caller does not supply one.
    pub default_job_name: String,
    /// Perform the web-interface login to obtain an `org.cups.sid` cookie
    /// whenever credentials are applied.
    pub session_login: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 631,
            timeout_ms: 5_000,
            username: None,
            password: None,
            requesting_user_name: None,
            default_job_name: "cupslink job".into(),
            session_login: true,
        }
    }
}

impl ClientConfig {
    /// Configuration for `host:port` with every other field defaulted.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Attach a credential pair.
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Override the network deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Load and validate a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that could never reach a server.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(CupsError::InvalidConfig("host must not be empty".into()));
        }
        if self.port == 0 {
            return Err(CupsError::InvalidConfig("port must not be zero".into()));
        }
        if self.timeout_ms == 0 {
            return Err(CupsError::InvalidConfig("timeout_ms must not be zero".into()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// `host:port` authority used for connecting and the `Host` header.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Name reported in `requesting-user-name`.
    pub fn requesting_user(&self) -> String {
        self.requesting_user_name
            .clone()
            .or_else(|| std::env::var("USER").ok())
            .or_else(|| std::env::var("USERNAME").ok())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "anonymous".into())
    }

    /// Whether both halves of the credential pair are present and non-empty.
    pub fn has_credentials(&self) -> bool {
        matches!(
            (&self.username, &self.password),
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty()
        )
    }
}
