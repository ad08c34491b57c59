// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// cupslink IPP: hand-rolled IPP/1.1 request encoder and response decoder,
// Basic/cookie session handling with a single 401 retry, and the CUPS client
// facade built on top of them.

pub mod client;
pub mod decoder;
pub mod encoder;
pub mod escape;
pub mod session;
pub mod transport;
pub mod value;

pub use client::{CupsClient, format_version};
pub use decoder::parse_response;
pub use encoder::{IppRequest, RequestAttributes, build_request};
pub use session::{Authenticator, Session};
pub use transport::{HttpCall, HyperTransport, Transport};
pub use value::decode_value;
