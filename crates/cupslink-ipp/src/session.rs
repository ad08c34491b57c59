// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Session and authentication handling.
//
// CUPS accepts either HTTP Basic credentials (RFC 7617) or the `org.cups.sid`
// cookie issued by its web-interface login.  Once credentials are applied,
// both are attached to every request.  A 401 answer triggers exactly one
// re-application of the credentials and exactly one replay of the request.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use http::header::{AUTHORIZATION, COOKIE, SET_COOKIE};
use http::{HeaderMap, HeaderValue, StatusCode};
use tracing::{debug, info, warn};

use cupslink_core::error::Result;

use crate::escape;
use crate::transport::{HttpCall, HttpResponse, Transport};

/// Path of the web-interface login form.
pub const LOGIN_PATH: &str = "/admin";

/// Name of the session cookie issued by the CUPS web interface.
pub const SESSION_COOKIE: &str = "org.cups.sid";

/// Credential state of one client.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub username: Option<String>,
    pub password: Option<String>,
    pub session_cookie: Option<String>,
    authorization: Option<String>,
}

impl Session {
    /// Store a credential pair and derive the Basic authorization value.
    ///
    /// An empty username or password leaves the session unauthenticated.
    pub fn apply_credentials(&mut self, username: &str, password: &str) {
        self.username = Some(username.to_string());
        self.password = Some(password.to_string());
        self.authorization = if username.is_empty() || password.is_empty() {
            None
        } else {
            Some(basic_auth(username, password))
        };
    }

    /// Forget credentials and any session cookie.
    pub fn clear_credentials(&mut self) {
        *self = Self::default();
    }

    pub fn has_credentials(&self) -> bool {
        self.authorization.is_some()
    }

    /// Value of the `Authorization` header, when credentials are set.
    pub fn authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }

    /// Value of the `Cookie` header, when a session cookie is held.
    pub fn cookie_header(&self) -> Option<String> {
        self.session_cookie
            .as_deref()
            .map(|cookie| format!("{SESSION_COOKIE}={cookie}"))
    }

    /// Attach the authorization and cookie headers to an outgoing request.
    pub fn decorate(&self, headers: &mut HeaderMap) {
        headers.remove(AUTHORIZATION);
        headers.remove(COOKIE);

        let Some(authorization) = self.authorization() else {
            return;
        };
        match HeaderValue::from_str(authorization) {
            Ok(value) => {
                headers.insert(AUTHORIZATION, value);
            }
            Err(e) => warn!(error = %e, "authorization value is not a valid header"),
        }

        if let Some(cookie) = self.cookie_header() {
            match HeaderValue::from_str(&cookie) {
                Ok(value) => {
                    headers.insert(COOKIE, value);
                }
                Err(e) => warn!(error = %e, "session cookie is not a valid header"),
            }
        }
    }

    /// The web-interface login request for the current credentials.
    pub fn login_call(&self) -> Option<HttpCall> {
        let (Some(username), Some(password)) = (&self.username, &self.password) else {
            return None;
        };
        let body = escape::form_body(&[
            (SESSION_COOKIE, "1"),
            ("OP", "login"),
            ("USERID", username.as_str()),
            ("PASSWD", password.as_str()),
        ]);
        let mut call = HttpCall::form_post(LOGIN_PATH, body);
        if let Some(authorization) = self.authorization() {
            if let Ok(value) = HeaderValue::from_str(authorization) {
                call.headers.insert(AUTHORIZATION, value);
            }
        }
        Some(call)
    }
}

/// `Basic base64(username:password)`
pub fn basic_auth(username: &str, password: &str) -> String {
    format!("Basic {}", BASE64.encode(format!("{username}:{password}")))
}

/// Pull the `org.cups.sid` value out of the `Set-Cookie` headers.
pub fn extract_session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|cookie| {
            let pair = cookie.split(';').next()?;
            let (name, value) = pair.split_once('=')?;
            (name.trim() == SESSION_COOKIE).then(|| value.trim().to_string())
        })
        .filter(|value| !value.is_empty())
}

/// Owns the client's `Session` and routes every request through it.
#[derive(Debug, Clone)]
pub struct Authenticator {
    session: Session,
    /// Whether applying credentials also performs the web-interface login.
    session_login: bool,
}

impl Authenticator {
    pub fn new(session_login: bool) -> Self {
        Self {
            session: Session::default(),
            session_login,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Store credentials without touching the network.
    pub fn set_credentials(&mut self, username: &str, password: &str) {
        self.session.apply_credentials(username, password);
        self.session.session_cookie = None;
    }

    pub fn clear_credentials(&mut self) {
        self.session.clear_credentials();
    }

    /// Store credentials and, if enabled, log in to obtain a session cookie.
    ///
    /// A failed login is logged and leaves the session with Basic auth only.
    pub async fn apply_credentials<T: Transport>(
        &mut self,
        transport: &mut T,
        username: &str,
        password: &str,
    ) {
        self.set_credentials(username, password);
        if !self.session_login || !self.session.has_credentials() {
            return;
        }
        let Some(call) = self.session.login_call() else {
            return;
        };

        match transport.send(call).await {
            Ok(response) => {
                self.session.session_cookie = extract_session_cookie(response.headers());
                debug!(
                    status = response.status().as_u16(),
                    cookie = self.session.session_cookie.is_some(),
                    "web-interface login finished"
                );
            }
            Err(e) => warn!(error = %e, "web-interface login failed, continuing with Basic auth"),
        }
    }

    /// Send `call` with session headers, re-authenticating once on 401.
    ///
    /// The response is returned whatever its status; callers decide which
    /// statuses are failures.
    pub async fn send<T: Transport>(&mut self, transport: &mut T, call: HttpCall) -> Result<HttpResponse> {
        let mut first = call.clone();
        self.session.decorate(&mut first.headers);
        let response = transport.send(first).await?;

        if response.status() != StatusCode::UNAUTHORIZED || !self.session.has_credentials() {
            return Ok(response);
        }

        let (Some(username), Some(password)) =
            (self.session.username.clone(), self.session.password.clone())
        else {
            return Ok(response);
        };

        info!(path = %call.path, "server answered 401, re-applying credentials");
        self.apply_credentials(transport, &username, &password).await;

        let mut retry = call;
        self.session.decorate(&mut retry.headers);
        transport.send(retry).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_auth_matches_rfc7617_example() {
        assert_eq!(
            basic_auth("Aladdin", "open sesame"),
            "Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ=="
        );
    }

    #[test]
    fn decorate_adds_both_headers() {
        let mut session = Session::default();
        session.apply_credentials("admin", "secret");
        session.session_cookie = Some("abc123".into());

        let mut headers = HeaderMap::new();
        session.decorate(&mut headers);
        assert_eq!(headers[AUTHORIZATION], basic_auth("admin", "secret").as_str());
        assert_eq!(headers[COOKIE], "org.cups.sid=abc123");
    }

    #[test]
    fn cleared_session_strips_headers() {
        let mut session = Session::default();
        session.apply_credentials("admin", "secret");
        session.session_cookie = Some("abc123".into());
        session.clear_credentials();

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic stale"));
        headers.insert(COOKIE, HeaderValue::from_static("org.cups.sid=stale"));
        session.decorate(&mut headers);
        assert!(headers.get(AUTHORIZATION).is_none());
        assert!(headers.get(COOKIE).is_none());
        assert!(session.username.is_none());
    }

    #[test]
    fn empty_password_is_not_authenticated() {
        let mut session = Session::default();
        session.apply_credentials("admin", "");
        assert!(!session.has_credentials());
        assert!(session.authorization().is_none());
    }

    #[test]
    fn login_call_posts_form_fields() {
        let mut session = Session::default();
        session.apply_credentials("lp admin", "p&w");
        let call = session.login_call().unwrap();
        assert_eq!(call.path, LOGIN_PATH);
        assert_eq!(
            &call.body[..],
            b"org.cups.sid=1&OP=login&USERID=lp+admin&PASSWD=p%26w"
        );
        assert!(call.headers.contains_key(AUTHORIZATION));
    }

    #[test]
    fn extracts_session_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("lang=en; path=/"));
        headers.append(
            SET_COOKIE,
            HeaderValue::from_static("org.cups.sid=5f2e9a; path=/; httponly"),
        );
        assert_eq!(extract_session_cookie(&headers).as_deref(), Some("5f2e9a"));
    }

    #[test]
    fn missing_session_cookie_is_none() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("org.cups.sid=; path=/"));
        assert!(extract_session_cookie(&headers).is_none());
        assert!(extract_session_cookie(&HeaderMap::new()).is_none());
    }
}
