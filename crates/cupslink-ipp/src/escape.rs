// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Percent-encoding for request paths and login form bodies (RFC 3986 SS2).

use std::fmt::Write;

fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~')
}

fn encode(input: &str, space_as_plus: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        if is_unreserved(byte) {
            out.push(byte as char);
        } else if byte == b' ' && space_as_plus {
            out.push('+');
        } else {
            // Writing to a String cannot fail.
            let _ = write!(out, "%{byte:02X}");
        }
    }
    out
}

/// Encode one path segment, e.g. a printer name in `/printers/{name}`.
pub fn path_segment(input: &str) -> String {
    encode(input, false)
}

/// Encode `application/x-www-form-urlencoded` key/value pairs.
pub fn form_body(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(key, value)| format!("{}={}", encode(key, true), encode(value, true)))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_segment_keeps_unreserved() {
        assert_eq!(path_segment("HP_LaserJet-4.0~x"), "HP_LaserJet-4.0~x");
    }

    #[test]
    fn path_segment_escapes_everything_else() {
        assert_eq!(path_segment("Front Desk/2"), "Front%20Desk%2F2");
        assert_eq!(path_segment("Büro"), "B%C3%BCro");
    }

    #[test]
    fn form_body_uses_plus_for_space() {
        let body = form_body(&[("OP", "login"), ("PASSWD", "a b&c")]);
        assert_eq!(body, "OP=login&PASSWD=a+b%26c");
    }
}
