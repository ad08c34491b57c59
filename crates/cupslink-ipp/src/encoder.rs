// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// IPP request encoder.
//
// Produces the binary request body described in RFC 8010 SS3.1:
//
// ```text
// version-number:  2 bytes (major, minor)         always 1.1
// operation-id:    2 bytes (big-endian u16)
// request-id:      4 bytes (big-endian u32)       drawn from 1..=65535
// attributes:      repeated
//   value-tag:     1 byte                         always 0x47
//   name-length:   2 bytes (big-endian u16)
//   name:          name-length bytes
//   value-length:  2 bytes (big-endian u16)
//   value:         value-length bytes
// end-of-attributes-tag: 1 byte (0x03)
// document-data:   remainder (optional)
// ```

use rand::Rng;
use tracing::trace;

use cupslink_core::error::{CupsError, Result};
use cupslink_core::types::{
    IPP_VERSION_MAJOR, IPP_VERSION_MINOR, Operation, REQUEST_ATTRIBUTE_TAG, TAG_END_OF_ATTRIBUTES,
};

/// Largest name or value a 16-bit length prefix can describe.
pub const MAX_FIELD_LEN: usize = u16::MAX as usize;

/// Ordered, possibly multi-valued request attributes.
///
/// Each value of a multi-valued entry is written as its own attribute
/// carrying the full name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestAttributes {
    entries: Vec<(String, Vec<String>)>,
}

impl RequestAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a single-valued attribute, replacing any values already under
    /// `name` while keeping its position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let value: String = value.into();
        self.insert_many(name, [value])
    }

    /// Set a multi-valued attribute.
    pub fn insert_many<I, S>(&mut self, name: impl Into<String>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = values,
            None => self.entries.push((name, values)),
        }
        self
    }

    /// Append every entry of `other` after ours, without merging names.
    pub fn append(&mut self, other: &RequestAttributes) -> &mut Self {
        self.entries.extend(other.entries.iter().cloned());
        self
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, values)| values.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<K, V> FromIterator<(K, V)> for RequestAttributes
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut attrs = Self::new();
        for (name, value) in iter {
            attrs.insert(name, value);
        }
        attrs
    }
}

/// An IPP request ready to be serialized.
#[derive(Debug, Clone)]
pub struct IppRequest {
    pub version_major: u8,
    pub version_minor: u8,
    pub operation: Operation,
    pub request_id: u32,
    pub attributes: RequestAttributes,
    pub payload: Option<Vec<u8>>,
}

impl IppRequest {
    /// Resolve `operation_name` and assign a fresh request-id.
    ///
    /// Fails with `UnsupportedOperation` for names missing from the
    /// operation table.
    pub fn new(
        operation_name: &str,
        attributes: RequestAttributes,
        payload: Option<Vec<u8>>,
    ) -> Result<Self> {
        let operation = Operation::from_name(operation_name)?;
        Ok(Self {
            version_major: IPP_VERSION_MAJOR,
            version_minor: IPP_VERSION_MINOR,
            operation,
            request_id: next_request_id(),
            attributes,
            payload,
        })
    }

    /// Serialize to the wire format.
    pub fn encode(&self) -> Result<Vec<u8>> {
        check_lengths(&self.attributes)?;

        let payload_len = self.payload.as_ref().map_or(0, Vec::len);
        let mut buf = Vec::with_capacity(256 + payload_len);
        buf.push(self.version_major);
        buf.push(self.version_minor);
        buf.extend_from_slice(&self.operation.code().to_be_bytes());
        buf.extend_from_slice(&self.request_id.to_be_bytes());

        for (name, values) in self.attributes.iter() {
            for value in values {
                write_attr(&mut buf, REQUEST_ATTRIBUTE_TAG, name, value.as_bytes());
            }
        }

        buf.push(TAG_END_OF_ATTRIBUTES);

        if let Some(payload) = &self.payload {
            buf.extend_from_slice(payload);
        }

        trace!(
            operation = %self.operation,
            request_id = self.request_id,
            bytes = buf.len(),
            "encoded IPP request"
        );
        Ok(buf)
    }
}

/// Build the request bytes for `operation_name` in one step.
pub fn build_request(
    operation_name: &str,
    attributes: &RequestAttributes,
    payload: Option<&[u8]>,
) -> Result<Vec<u8>> {
    IppRequest::new(operation_name, attributes.clone(), payload.map(<[u8]>::to_vec))?.encode()
}

/// request-id values stay within 16 bits even though the field is 32 bits
/// wide.
pub fn next_request_id() -> u32 {
    rand::thread_rng().gen_range(1..=MAX_FIELD_LEN as u32)
}

fn check_lengths(attributes: &RequestAttributes) -> Result<()> {
    for (name, values) in attributes.iter() {
        let longest_value = values.iter().map(String::len).max().unwrap_or(0);
        let len = name.len().max(longest_value);
        if len > MAX_FIELD_LEN {
            return Err(CupsError::AttributeTooLong {
                name: name.to_string(),
                len,
            });
        }
    }
    Ok(())
}

/// Write a raw attribute (value-tag, name, value bytes).
fn write_attr(buf: &mut Vec<u8>, value_tag: u8, name: &str, value: &[u8]) {
    buf.push(value_tag);
    buf.extend_from_slice(&(name.len() as u16).to_be_bytes());
    buf.extend_from_slice(name.as_bytes());
    buf.extend_from_slice(&(value.len() as u16).to_be_bytes());
    buf.extend_from_slice(value);
}
