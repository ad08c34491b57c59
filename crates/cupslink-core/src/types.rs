// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// IPP protocol types shared by the codec and the client facade.

use std::collections::HashMap;
use std::fmt;

use crate::error::{CupsError, Result};

// ---------------------------------------------------------------------------
// Wire constants (RFC 8010 SS3)
// ---------------------------------------------------------------------------

/// IPP version 1.1 major byte.
pub const IPP_VERSION_MAJOR: u8 = 0x01;

/// IPP version 1.1 minor byte.
pub const IPP_VERSION_MINOR: u8 = 0x01;

/// End-of-attributes-tag -- terminates the attribute section.
pub const TAG_END_OF_ATTRIBUTES: u8 = 0x03;

/// Group marker. CUPS responses are read as `[0x04][2B len][group name]`.
pub const TAG_BEGIN_GROUP: u8 = 0x04;

pub const VALUE_TAG_INTEGER: u8 = 0x21;
pub const VALUE_TAG_BOOLEAN: u8 = 0x22;
pub const VALUE_TAG_ENUM: u8 = 0x23;
pub const VALUE_TAG_OCTET_STRING: u8 = 0x30;
pub const VALUE_TAG_DATE_TIME: u8 = 0x31;
pub const VALUE_TAG_RESOLUTION: u8 = 0x32;
pub const VALUE_TAG_RANGE_OF_INTEGER: u8 = 0x33;
pub const VALUE_TAG_TEXT_WITH_LANGUAGE: u8 = 0x34;
pub const VALUE_TAG_NAME_WITH_LANGUAGE: u8 = 0x35;
pub const VALUE_TAG_TEXT: u8 = 0x41;
pub const VALUE_TAG_NAME: u8 = 0x42;
pub const VALUE_TAG_KEYWORD: u8 = 0x44;
pub const VALUE_TAG_URI: u8 = 0x45;
pub const VALUE_TAG_URI_SCHEME: u8 = 0x46;
pub const VALUE_TAG_CHARSET: u8 = 0x47;
pub const VALUE_TAG_NATURAL_LANGUAGE: u8 = 0x48;

/// Tag written in front of every outgoing attribute. Servers such as CUPS
/// accept it regardless of the attribute's real syntax.
pub const REQUEST_ATTRIBUTE_TAG: u8 = VALUE_TAG_CHARSET;

/// Smallest well-formed message: version, status/operation, request-id.
pub const IPP_HEADER_LEN: usize = 8;

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Operations the encoder knows an operation-id for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    PrintJob,
    GetPrinters,
    GetJobs,
    GetPrinterAttributes,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::PrintJob,
        Operation::GetPrinters,
        Operation::GetJobs,
        Operation::GetPrinterAttributes,
    ];

    /// Look up an operation by its IPP keyword (e.g. `"print-job"`).
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.name() == name)
            .ok_or_else(|| CupsError::UnsupportedOperation(name.to_string()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::PrintJob => "print-job",
            Self::GetPrinters => "get-printers",
            Self::GetJobs => "get-jobs",
            Self::GetPrinterAttributes => "get-printer-attributes",
        }
    }

    /// operation-id written into the request header.
    pub fn code(&self) -> u16 {
        match self {
            Self::PrintJob => 0x0002,
            Self::GetPrinters => 0x0004,
            Self::GetJobs => 0x000A,
            Self::GetPrinterAttributes => 0x000B,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Attribute values
// ---------------------------------------------------------------------------

/// A decoded attribute value. The variant is chosen by the value tag alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    Integer(i32),
    Boolean(bool),
    Enum(u16),
    OctetString(Vec<u8>),
    DateTime(Vec<u8>),
    Resolution(Vec<u8>),
    RangeOfInteger(Vec<u8>),
    TextWithLanguage { language: String, text: String },
    NameWithLanguage { language: String, text: String },
    TextWithoutLanguage(String),
    NameWithoutLanguage(String),
    Keyword(String),
    Uri(String),
    UriScheme(String),
    Charset(String),
    NaturalLanguage(String),
    /// Any tag outside the known set, kept verbatim.
    Unknown { tag: u8, raw: Vec<u8> },
}

impl AttributeValue {
    /// The value tag this variant is decoded from.
    pub fn tag(&self) -> u8 {
        match self {
            Self::Integer(_) => VALUE_TAG_INTEGER,
            Self::Boolean(_) => VALUE_TAG_BOOLEAN,
            Self::Enum(_) => VALUE_TAG_ENUM,
            Self::OctetString(_) => VALUE_TAG_OCTET_STRING,
            Self::DateTime(_) => VALUE_TAG_DATE_TIME,
            Self::Resolution(_) => VALUE_TAG_RESOLUTION,
            Self::RangeOfInteger(_) => VALUE_TAG_RANGE_OF_INTEGER,
            Self::TextWithLanguage { .. } => VALUE_TAG_TEXT_WITH_LANGUAGE,
            Self::NameWithLanguage { .. } => VALUE_TAG_NAME_WITH_LANGUAGE,
            Self::TextWithoutLanguage(_) => VALUE_TAG_TEXT,
            Self::NameWithoutLanguage(_) => VALUE_TAG_NAME,
            Self::Keyword(_) => VALUE_TAG_KEYWORD,
            Self::Uri(_) => VALUE_TAG_URI,
            Self::UriScheme(_) => VALUE_TAG_URI_SCHEME,
            Self::Charset(_) => VALUE_TAG_CHARSET,
            Self::NaturalLanguage(_) => VALUE_TAG_NATURAL_LANGUAGE,
            Self::Unknown { tag, .. } => *tag,
        }
    }

    /// Integer-like values (integer and enum).
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(i64::from(*v)),
            Self::Enum(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    /// String-like values, including the text part of the with-language forms.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::TextWithLanguage { text, .. } | Self::NameWithLanguage { text, .. } => Some(text),
            Self::TextWithoutLanguage(s)
            | Self::NameWithoutLanguage(s)
            | Self::Keyword(s)
            | Self::Uri(s)
            | Self::UriScheme(s)
            | Self::Charset(s)
            | Self::NaturalLanguage(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Enum(v) => write!(f, "{v}"),
            Self::OctetString(raw)
            | Self::DateTime(raw)
            | Self::Resolution(raw)
            | Self::RangeOfInteger(raw)
            | Self::Unknown { raw, .. } => {
                for byte in raw {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
            Self::TextWithLanguage { language, text } | Self::NameWithLanguage { language, text } => {
                write!(f, "{text} [{language}]")
            }
            Self::TextWithoutLanguage(s)
            | Self::NameWithoutLanguage(s)
            | Self::Keyword(s)
            | Self::Uri(s)
            | Self::UriScheme(s)
            | Self::Charset(s)
            | Self::NaturalLanguage(s) => f.write_str(s),
        }
    }
}

// ---------------------------------------------------------------------------
// Response model
// ---------------------------------------------------------------------------

/// A named (or anonymous) set of attributes from a response.
///
/// Repeated attribute names overwrite earlier ones, so a 1setOf value keeps
/// only its last member.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeGroup {
    /// `None` for attributes read before any group marker.
    pub name: Option<String>,
    pub attributes: HashMap<String, AttributeValue>,
}

impl AttributeGroup {
    pub fn new(name: Option<String>) -> Self {
        Self {
            name,
            attributes: HashMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// A decoded IPP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IppResponse {
    pub version_major: u8,
    pub version_minor: u8,
    pub status_code: u16,
    pub request_id: u32,
    /// Groups in the order their first marker appeared.
    pub groups: Vec<AttributeGroup>,
    /// Bytes following the attribute section, if any.
    pub payload: Option<Vec<u8>>,
}

impl IppResponse {
    /// Status codes below 0x0100 are the successful-ok family.
    pub fn is_successful(&self) -> bool {
        self.status_code < 0x0100
    }

    /// The group opened by a marker carrying `name`.
    pub fn group(&self, name: &str) -> Option<&AttributeGroup> {
        self.groups.iter().find(|g| g.name.as_deref() == Some(name))
    }

    /// Attributes that appeared before any group marker.
    pub fn ungrouped(&self) -> Option<&AttributeGroup> {
        self.groups.iter().find(|g| g.name.is_none())
    }

    /// First value named `attribute`, searching groups in order.
    pub fn find(&self, attribute: &str) -> Option<&AttributeValue> {
        self.groups.iter().find_map(|g| g.get(attribute))
    }

    /// Mutable access to a group, creating it at the end if absent.
    pub fn group_mut(&mut self, name: Option<&str>) -> &mut AttributeGroup {
        let index = match self.groups.iter().position(|g| g.name.as_deref() == name) {
            Some(index) => index,
            None => {
                self.groups.push(AttributeGroup::new(name.map(str::to_string)));
                self.groups.len() - 1
            }
        };
        &mut self.groups[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_table_matches_wire_codes() {
        assert_eq!(Operation::from_name("print-job").unwrap().code(), 0x0002);
        assert_eq!(Operation::from_name("get-printers").unwrap().code(), 0x0004);
        assert_eq!(Operation::from_name("get-jobs").unwrap().code(), 0x000A);
        assert_eq!(
            Operation::from_name("get-printer-attributes").unwrap().code(),
            0x000B
        );
    }

    #[test]
    fn get_version_has_no_operation_code() {
        let err = Operation::from_name("get-version").unwrap_err();
        assert!(matches!(err, CupsError::UnsupportedOperation(ref op) if op == "get-version"));
    }

    #[test]
    fn value_tag_round_trips_through_variant() {
        assert_eq!(AttributeValue::Integer(1).tag(), VALUE_TAG_INTEGER);
        assert_eq!(AttributeValue::Charset("utf-8".into()).tag(), 0x47);
        assert_eq!(AttributeValue::Unknown { tag: 0x7f, raw: vec![] }.tag(), 0x7f);
    }

    #[test]
    fn display_renders_binary_as_hex() {
        let value = AttributeValue::OctetString(vec![0xde, 0xad]);
        assert_eq!(value.to_string(), "dead");
        let value = AttributeValue::NameWithLanguage {
            language: "en".into(),
            text: "Office".into(),
        };
        assert_eq!(value.to_string(), "Office [en]");
    }

    #[test]
    fn group_mut_merges_reopened_groups() {
        let mut response = IppResponse {
            version_major: 1,
            version_minor: 1,
            status_code: 0,
            request_id: 1,
            groups: Vec::new(),
            payload: None,
        };
        response
            .group_mut(Some("printer"))
            .attributes
            .insert("a".into(), AttributeValue::Integer(1));
        response.group_mut(None);
        response
            .group_mut(Some("printer"))
            .attributes
            .insert("b".into(), AttributeValue::Integer(2));

        assert_eq!(response.groups.len(), 2);
        assert_eq!(response.group("printer").unwrap().len(), 2);
        assert_eq!(response.find("b"), Some(&AttributeValue::Integer(2)));
        assert!(response.ungrouped().unwrap().is_empty());
    }
}
