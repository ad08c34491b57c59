// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// IPP response decoder.
//
// ```text
// version-number:  2 bytes (major, minor)
// status-code:     2 bytes (big-endian u16)
// request-id:      4 bytes (big-endian u32)
// entries:         repeated until 0x03 or end of buffer
//   0x04 [2B len][group name]                       switches current group
//   tag  [2B len][name][2B len][value]              attribute
// end-of-attributes-tag: 1 byte (0x03)
// data: remainder
// ```

use tracing::trace;

use cupslink_core::error::{CupsError, Result};
use cupslink_core::types::{IPP_HEADER_LEN, IppResponse, TAG_BEGIN_GROUP, TAG_END_OF_ATTRIBUTES};

use crate::value::decode_value;

/// Bounds-checked cursor over a response body.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(CupsError::MalformedResponse(format!(
                "truncated {what}: need {len} bytes at offset {}, {} left",
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn u8(&mut self, what: &str) -> Result<u8> {
        Ok(self.take(1, what)?[0])
    }

    fn u16(&mut self, what: &str) -> Result<u16> {
        let b = self.take(2, what)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self, what: &str) -> Result<u32> {
        let b = self.take(4, what)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// `[2B len][bytes]`
    fn prefixed(&mut self, what: &str) -> Result<&'a [u8]> {
        let len = self.u16(what)? as usize;
        self.take(len, what)
    }
}

/// Parse a raw IPP response body.
pub fn parse_response(data: &[u8]) -> Result<IppResponse> {
    if data.len() < IPP_HEADER_LEN {
        return Err(CupsError::MalformedResponse(format!(
            "IPP response too short: {} bytes (minimum {IPP_HEADER_LEN})",
            data.len()
        )));
    }

    let mut reader = Reader::new(data);
    let mut response = IppResponse {
        version_major: reader.u8("version")?,
        version_minor: reader.u8("version")?,
        status_code: reader.u16("status-code")?,
        request_id: reader.u32("request-id")?,
        groups: Vec::new(),
        payload: None,
    };

    let mut current_group: Option<String> = None;

    while reader.remaining() > 0 {
        let tag = reader.u8("tag")?;

        if tag == TAG_END_OF_ATTRIBUTES {
            break;
        }

        if tag == TAG_BEGIN_GROUP {
            let name = reader.prefixed("group name")?;
            current_group = Some(String::from_utf8_lossy(name).into_owned());
            continue;
        }

        let name = String::from_utf8_lossy(reader.prefixed("attribute name")?).into_owned();
        let raw = reader.prefixed("attribute value")?;
        let value = decode_value(tag, raw)?;

        trace!(tag, name = %name, group = ?current_group, "decoded attribute");
        response
            .group_mut(current_group.as_deref())
            .attributes
            .insert(name, value);
    }

    if reader.remaining() > 0 {
        response.payload = Some(data[reader.pos..].to_vec());
    }

    Ok(response)
}
