// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// CUPS client facade.
//
// Composes the encoder, decoder, session manager and transport into the
// operations a caller needs:
//   - Print-Job               POST /printers/{printer}
//   - CUPS-Get-Printers       POST /
//   - Get-Jobs                POST /printers/{printer}
//   - Get-Printer-Attributes  POST /printers/{printer}
//   - server version          POST /admin/ (IPP), falling back to GET /

use bytes::Bytes;
use http::StatusCode;
use tracing::{debug, error, info, instrument, warn};

use cupslink_core::config::ClientConfig;
use cupslink_core::error::{CupsError, Result};
use cupslink_core::types::{IppResponse, Operation};

use crate::decoder::parse_response;
use crate::encoder::{RequestAttributes, build_request};
use crate::escape;
use crate::session::{Authenticator, Session};
use crate::transport::{HttpCall, HttpResponse, HyperTransport, Transport};

/// Operation name the version probe asks for.  It has no operation-id, so the
/// probe always ends in `UnsupportedOperation` and the HTTP fallback runs.
pub const GET_VERSION_OPERATION: &str = "get-version";

/// Attribute holding the packed server version.
pub const PRINTER_VERSION_ATTRIBUTE: &str = "printer-version";

/// Bytes of body kept by [`CupsClient::debug_auth`].
const DEBUG_BODY_EXCERPT: usize = 500;

/// Outcome of an unauthenticated-looking probe of `/admin`.
#[derive(Debug, Clone)]
pub struct AuthProbe {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body_excerpt: String,
}

/// Client for one CUPS server.
///
/// All operations take `&mut self` and run one at a time.  The underlying
/// connection is released by [`disconnect`](Self::disconnect) or when the
/// client is dropped.
pub struct CupsClient<T: Transport = HyperTransport> {
    config: ClientConfig,
    transport: T,
    auth: Authenticator,
}

impl CupsClient<HyperTransport> {
    /// Create a client for the configured server.  No connection is opened
    /// until the first operation.
    ///
    /// Configured credentials go out as Basic auth from the first request.
    /// The `org.cups.sid` login runs on the first 401, or up front through
    /// [`login`](CupsClient::login).
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = HyperTransport::new(config.authority(), config.timeout());
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> CupsClient<T> {
    /// Create a client over an arbitrary transport.
    ///
    /// Configured credentials are applied for Basic auth straight away; the
    /// session cookie is obtained on the first 401 or by calling
    /// [`set_credentials`](Self::set_credentials).
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        let mut auth = Authenticator::new(config.session_login);
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            auth.set_credentials(username, password);
        }
        Self {
            config,
            transport,
            auth,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        self.auth.session()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Apply credentials and perform the web-interface login.
    pub async fn set_credentials(&mut self, username: &str, password: &str) {
        self.auth
            .apply_credentials(&mut self.transport, username, password)
            .await;
    }

    /// Run the web-interface login with the configured credentials.
    ///
    /// Does nothing when the configuration carries no credentials.  A failed
    /// login is logged and leaves Basic auth in place.
    pub async fn login(&mut self) {
        let (Some(username), Some(password)) =
            (self.config.username.clone(), self.config.password.clone())
        else {
            return;
        };
        self.set_credentials(&username, &password).await;
    }

    /// Drop credentials; later requests carry neither Authorization nor Cookie.
    pub fn clear_credentials(&mut self) {
        self.auth.clear_credentials();
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    pub fn disconnect(&mut self) {
        self.transport.close();
    }

    // -----------------------------------------------------------------------
    // Request composition
    // -----------------------------------------------------------------------

    /// Standard operation attributes sent ahead of any caller options.
    pub fn operation_attributes(&self, printer: Option<&str>, job_name: Option<&str>) -> RequestAttributes {
        let mut attrs = RequestAttributes::new();
        attrs
            .insert("attributes-charset", "utf-8")
            .insert("attributes-natural-language", "en")
            .insert(
                "printer-uri",
                format!(
                    "ipp://{}:{}/printers/{}",
                    self.config.host,
                    self.config.port,
                    printer.unwrap_or_default()
                ),
            )
            .insert("requesting-user-name", self.config.requesting_user())
            .insert(
                "job-name",
                job_name.unwrap_or(&self.config.default_job_name).to_string(),
            );
        attrs
    }

    /// Encode a full request: operation attributes, options, then `data`.
    pub fn build_ipp_request(
        &self,
        operation: &str,
        printer: Option<&str>,
        job_name: Option<&str>,
        data: Option<&[u8]>,
        options: &RequestAttributes,
    ) -> Result<Vec<u8>> {
        let mut attrs = self.operation_attributes(printer, job_name);
        attrs.append(options);
        build_request(operation, &attrs, data)
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Submit `data` to `printer` as a Print-Job.
    #[instrument(skip(self, data, options), fields(bytes = data.len()))]
    pub async fn print_job(
        &mut self,
        printer: &str,
        data: &[u8],
        job_name: Option<&str>,
        options: &RequestAttributes,
    ) -> Result<IppResponse> {
        let body = self.build_ipp_request(
            Operation::PrintJob.name(),
            Some(printer),
            job_name,
            Some(data),
            options,
        )?;
        let path = printer_path(printer);

        info!(path = %path, "sending Print-Job");
        let response = self.post_ipp(&path, body).await?;
        debug!(status = response.status_code, "Print-Job answered");
        Ok(response)
    }

    /// List the printers known to the server.
    #[instrument(skip(self))]
    pub async fn get_printers(&mut self) -> Result<IppResponse> {
        let body = self.build_ipp_request(
            Operation::GetPrinters.name(),
            None,
            None,
            None,
            &RequestAttributes::new(),
        )?;

        match self.post_ipp("/", body).await {
            Ok(response) => {
                debug!(groups = response.groups.len(), "received printer list");
                Ok(response)
            }
            Err(e @ CupsError::TransportFailure { status: Some(_), .. }) => {
                error!(error = %e, "CUPS-Get-Printers failed");
                if let Err(probe_err) = self.debug_auth().await {
                    debug!(error = %probe_err, "auth probe failed");
                }
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Jobs queued on `printer`.
    #[instrument(skip(self))]
    pub async fn get_jobs(&mut self, printer: &str) -> Result<IppResponse> {
        let body = self.build_ipp_request(
            Operation::GetJobs.name(),
            Some(printer),
            None,
            None,
            &RequestAttributes::new(),
        )?;
        self.post_ipp(&printer_path(printer), body).await
    }

    /// Capabilities and state of `printer`.
    #[instrument(skip(self))]
    pub async fn get_printer_attributes(&mut self, printer: &str) -> Result<IppResponse> {
        let body = self.build_ipp_request(
            Operation::GetPrinterAttributes.name(),
            Some(printer),
            None,
            None,
            &RequestAttributes::new(),
        )?;
        self.post_ipp(&printer_path(printer), body).await
    }

    /// Server version, trying IPP first and the HTML front page second.
    #[instrument(skip(self))]
    pub async fn get_version(&mut self) -> Result<String> {
        let ipp_err = match self.get_version_ipp().await {
            Ok(version) => return Ok(version),
            Err(e) => e,
        };
        debug!(error = %ipp_err, "IPP version probe failed, falling back to HTTP");

        match self.get_version_http().await {
            Ok(version) => Ok(version),
            Err(http_err) => {
                warn!(ipp = %ipp_err, http = %http_err, "both version probes failed");
                Err(CupsError::VersionUnavailable {
                    ipp: ipp_err.to_string(),
                    http: http_err.to_string(),
                })
            }
        }
    }

    /// Version from the `printer-version` attribute of an IPP answer.
    pub async fn get_version_ipp(&mut self) -> Result<String> {
        let body = self.build_ipp_request(
            GET_VERSION_OPERATION,
            None,
            None,
            None,
            &RequestAttributes::new(),
        )?;
        let response = self.post_ipp("/admin/", body).await?;

        let value = response.find(PRINTER_VERSION_ATTRIBUTE).ok_or_else(|| {
            CupsError::MalformedResponse(format!("no {PRINTER_VERSION_ATTRIBUTE} in response"))
        })?;
        let packed = value.as_integer().ok_or_else(|| {
            CupsError::MalformedResponse(format!(
                "{PRINTER_VERSION_ATTRIBUTE} is not an integer: {value}"
            ))
        })?;
        Ok(format_version(packed as u32))
    }

    /// Version scraped from the `CUPS/x.y.z` banner of the front page.
    pub async fn get_version_http(&mut self) -> Result<String> {
        let body = self.exchange(HttpCall::get("/")).await?;
        let text = String::from_utf8_lossy(&body);
        find_version_in_body(&text)
            .map(str::to_string)
            .ok_or_else(|| CupsError::MalformedResponse("no CUPS version in HTTP response".into()))
    }

    /// Fetch `/admin` once and report what the server says about our
    /// credentials.  A 401 here is reported, never retried.
    pub async fn debug_auth(&mut self) -> Result<AuthProbe> {
        let mut call = HttpCall::get("/admin");
        self.auth.session().decorate(&mut call.headers);
        let response = self.transport.send(call).await?;
        let probe = auth_probe(&response);
        debug!(
            status = probe.status,
            headers = ?probe.headers,
            body = %probe.body_excerpt,
            "auth probe"
        );
        Ok(probe)
    }

    // -----------------------------------------------------------------------
    // Plumbing
    // -----------------------------------------------------------------------

    async fn post_ipp(&mut self, path: &str, body: Vec<u8>) -> Result<IppResponse> {
        let bytes = self.exchange(HttpCall::ipp_post(path, body)).await?;
        parse_response(&bytes)
    }

    /// Send through the session layer and require HTTP 200.
    async fn exchange(&mut self, call: HttpCall) -> Result<Bytes> {
        let response = self.auth.send(&mut self.transport, call).await?;
        if response.status() != StatusCode::OK {
            let status = response.status().as_u16();
            warn!(status, "unexpected HTTP status");
            return Err(CupsError::http_status(status, response.body()));
        }
        Ok(response.into_body())
    }
}

impl<T: Transport> Drop for CupsClient<T> {
    fn drop(&mut self) {
        self.transport.close();
    }
}

/// `/printers/{printer}` with the name percent-encoded.
pub fn printer_path(printer: &str) -> String {
    format!("/printers/{}", escape::path_segment(printer))
}

/// Render a packed `0x00MMmmpp` version as `MM.mm.pp`.
pub fn format_version(packed: u32) -> String {
    let major = (packed >> 16) & 0xFF;
    let minor = (packed >> 8) & 0xFF;
    let patch = packed & 0xFF;
    format!("{major}.{minor}.{patch}")
}

/// First `CUPS/<digits and dots>` in `body`, matched case-insensitively.
pub fn find_version_in_body(body: &str) -> Option<&str> {
    const MARKER: &str = "cups/";
    // ASCII lowercasing keeps byte offsets aligned with `body`.
    let lower = body.to_ascii_lowercase();
    let mut from = 0;
    while let Some(found) = lower[from..].find(MARKER) {
        let start = from + found + MARKER.len();
        let len = body.as_bytes()[start..]
            .iter()
            .take_while(|b| b.is_ascii_digit() || **b == b'.')
            .count();
        if len > 0 {
            return Some(&body[start..start + len]);
        }
        from = start;
    }
    None
}

fn auth_probe(response: &HttpResponse) -> AuthProbe {
    let headers = response
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    let body = response.body();
    let excerpt = &body[..body.len().min(DEBUG_BODY_EXCERPT)];
    AuthProbe {
        status: response.status().as_u16(),
        headers,
        body_excerpt: String::from_utf8_lossy(excerpt).into_owned(),
    }
}
