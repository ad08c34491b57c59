// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP transport for IPP.
//
// The client talks to the server through the `Transport` trait so tests can
// script responses.  `HyperTransport` is the production implementation: it
// owns at most one keep-alive HTTP/1.1 connection to the configured
// `host:port`, reconnects lazily, and aborts the connection task whenever the
// connection is dropped (explicit close, error, timeout, or drop of the
// transport itself).

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_TYPE, HOST};
use http::{HeaderMap, HeaderValue, Method, Request, Response};
use http_body_util::{BodyExt, Full};
use hyper::client::conn::http1::{self, SendRequest};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use cupslink_core::error::{CupsError, Result};

/// MIME type of IPP request and response bodies.
pub const IPP_MIME: &str = "application/ipp";

/// MIME type of the web-interface login form.
pub const FORM_MIME: &str = "application/x-www-form-urlencoded";

/// Fully buffered HTTP response.
pub type HttpResponse = Response<Bytes>;

/// A transport-agnostic HTTP request.  Cheap to clone so the auth layer can
/// replay it after re-authenticating.
#[derive(Debug, Clone)]
pub struct HttpCall {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HttpCall {
    /// POST of an IPP message.
    pub fn ipp_post(path: impl Into<String>, body: impl Into<Bytes>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(IPP_MIME));
        headers.insert(ACCEPT, HeaderValue::from_static(IPP_MIME));
        Self {
            method: Method::POST,
            path: path.into(),
            headers,
            body: body.into(),
        }
    }

    /// POST of a urlencoded form.
    pub fn form_post(path: impl Into<String>, body: impl Into<Bytes>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_MIME));
        Self {
            method: Method::POST,
            path: path.into(),
            headers,
            body: body.into(),
        }
    }

    /// Plain GET.
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    fn into_request(self, authority: &str) -> Result<Request<Full<Bytes>>> {
        let mut request = Request::new(Full::new(self.body));
        *request.method_mut() = self.method;
        *request.uri_mut() = self
            .path
            .parse()
            .map_err(|e| CupsError::transport(format!("invalid request path '{}': {e}", self.path)))?;
        *request.headers_mut() = self.headers;
        let host = HeaderValue::from_str(authority)
            .map_err(|e| CupsError::transport(format!("invalid host '{authority}': {e}")))?;
        request.headers_mut().insert(HOST, host);
        Ok(request)
    }
}

/// Something that can carry an HTTP exchange to a CUPS server.
///
/// Implementations are used by one client at a time and never concurrently.
pub trait Transport: Send {
    /// Send one request and buffer the full response.
    fn send(&mut self, call: HttpCall) -> impl Future<Output = Result<HttpResponse>> + Send;

    /// Release the underlying connection, if any.
    fn close(&mut self);

    fn is_connected(&self) -> bool;
}

/// An open HTTP/1.1 connection.  Dropping it stops the connection task,
/// which closes the socket.
struct Connection {
    sender: SendRequest<Full<Bytes>>,
    driver: JoinHandle<()>,
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

/// hyper-based transport bound to a single `host:port`.
pub struct HyperTransport {
    authority: String,
    timeout: Duration,
    connection: Option<Connection>,
}

impl HyperTransport {
    pub fn new(authority: impl Into<String>, timeout: Duration) -> Self {
        Self {
            authority: authority.into(),
            timeout,
            connection: None,
        }
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    async fn connect(&self) -> Result<Connection> {
        let stream = tokio::time::timeout(self.timeout, TcpStream::connect(self.authority.as_str()))
            .await
            .map_err(|_| CupsError::timeout())?
            .map_err(|e| CupsError::transport(format!("connect {}: {e}", self.authority)))?;

        let (sender, conn) = tokio::time::timeout(self.timeout, http1::handshake(TokioIo::new(stream)))
            .await
            .map_err(|_| CupsError::timeout())?
            .map_err(|e| CupsError::transport(format!("HTTP handshake with {}: {e}", self.authority)))?;

        let authority = self.authority.clone();
        let driver = tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!(authority = %authority, error = %e, "connection closed with error");
            }
        });

        debug!(authority = %self.authority, "connected");
        Ok(Connection { sender, driver })
    }

    async fn exchange(&mut self, request: Request<Full<Bytes>>) -> Result<HttpResponse> {
        if self.connection.as_ref().is_none_or(|c| c.sender.is_closed()) {
            self.connection = Some(self.connect().await?);
        }
        let Some(conn) = self.connection.as_mut() else {
            return Err(CupsError::transport("connection unavailable"));
        };

        let work = async {
            conn.sender
                .ready()
                .await
                .map_err(|e| CupsError::transport(format!("connection not ready: {e}")))?;
            let response = conn
                .sender
                .send_request(request)
                .await
                .map_err(|e| CupsError::transport(format!("request failed: {e}")))?;
            let (parts, body) = response.into_parts();
            let body = body
                .collect()
                .await
                .map_err(|e| CupsError::transport(format!("reading response body: {e}")))?
                .to_bytes();
            Ok(Response::from_parts(parts, body))
        };

        tokio::time::timeout(self.timeout, work)
            .await
            .map_err(|_| CupsError::timeout())?
    }
}

impl Transport for HyperTransport {
    async fn send(&mut self, call: HttpCall) -> Result<HttpResponse> {
        let method = call.method.clone();
        let path = call.path.clone();
        let request = call.into_request(&self.authority)?;

        match self.exchange(request).await {
            Ok(response) => {
                debug!(%method, path = %path, status = response.status().as_u16(), "HTTP exchange complete");
                Ok(response)
            }
            Err(e) => {
                warn!(%method, path = %path, error = %e, "HTTP exchange failed");
                self.close();
                Err(e)
            }
        }
    }

    fn close(&mut self) {
        if self.connection.take().is_some() {
            debug!(authority = %self.authority, "connection released");
        }
    }

    fn is_connected(&self) -> bool {
        self.connection.as_ref().is_some_and(|c| !c.sender.is_closed())
    }
}

impl Drop for HyperTransport {
    fn drop(&mut self) {
        self.close();
    }
}
