// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Attribute value codec: turns the raw bytes of one attribute into a typed
// `AttributeValue` based solely on its value tag (RFC 8010 SS3.9).

use cupslink_core::error::{CupsError, Result};
use cupslink_core::types::*;

/// Decode a single attribute value.
///
/// Unknown tags are never an error; they come back as
/// [`AttributeValue::Unknown`].  Integers and booleans with the wrong length,
/// enums shorter than two bytes and truncated with-language composites fail
/// with `MalformedResponse`.
pub fn decode_value(tag: u8, raw: &[u8]) -> Result<AttributeValue> {
    let value = match tag {
        VALUE_TAG_INTEGER => AttributeValue::Integer(i32::from_be_bytes(fixed::<4>(tag, raw)?)),
        VALUE_TAG_BOOLEAN => AttributeValue::Boolean(fixed::<1>(tag, raw)?[0] != 0),
        VALUE_TAG_ENUM => AttributeValue::Enum(u16::from_be_bytes(leading::<2>(tag, raw)?)),

        VALUE_TAG_OCTET_STRING => AttributeValue::OctetString(raw.to_vec()),
        VALUE_TAG_DATE_TIME => AttributeValue::DateTime(raw.to_vec()),
        VALUE_TAG_RESOLUTION => AttributeValue::Resolution(raw.to_vec()),
        VALUE_TAG_RANGE_OF_INTEGER => AttributeValue::RangeOfInteger(raw.to_vec()),

        VALUE_TAG_TEXT_WITH_LANGUAGE => {
            let (language, text) = with_language(raw)?;
            AttributeValue::TextWithLanguage { language, text }
        }
        VALUE_TAG_NAME_WITH_LANGUAGE => {
            let (language, text) = with_language(raw)?;
            AttributeValue::NameWithLanguage { language, text }
        }

        VALUE_TAG_TEXT => AttributeValue::TextWithoutLanguage(utf8(raw)),
        VALUE_TAG_NAME => AttributeValue::NameWithoutLanguage(utf8(raw)),
        VALUE_TAG_KEYWORD => AttributeValue::Keyword(utf8(raw)),
        VALUE_TAG_URI => AttributeValue::Uri(utf8(raw)),
        VALUE_TAG_URI_SCHEME => AttributeValue::UriScheme(utf8(raw)),
        VALUE_TAG_CHARSET => AttributeValue::Charset(utf8(raw)),
        VALUE_TAG_NATURAL_LANGUAGE => AttributeValue::NaturalLanguage(utf8(raw)),

        _ => AttributeValue::Unknown {
            tag,
            raw: raw.to_vec(),
        },
    };
    Ok(value)
}

fn fixed<const N: usize>(tag: u8, raw: &[u8]) -> Result<[u8; N]> {
    raw.try_into().map_err(|_| {
        CupsError::MalformedResponse(format!(
            "value tag 0x{tag:02x} needs {N} bytes, got {}",
            raw.len()
        ))
    })
}

/// First `N` bytes of `raw`; anything after them is ignored.
fn leading<const N: usize>(tag: u8, raw: &[u8]) -> Result<[u8; N]> {
    match raw.get(..N) {
        Some(head) => fixed::<N>(tag, head),
        None => fixed::<N>(tag, raw),
    }
}

fn utf8(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

/// Split `[2B lang len][lang][2B text len][text]`; bytes after the text are
/// ignored.
fn with_language(raw: &[u8]) -> Result<(String, String)> {
    let mut pos = 0;
    let language = length_prefixed(raw, &mut pos, "language")?;
    let text = length_prefixed(raw, &mut pos, "text")?;
    Ok((utf8(language), utf8(text)))
}

fn length_prefixed<'a>(raw: &'a [u8], pos: &mut usize, what: &str) -> Result<&'a [u8]> {
    let truncated = || CupsError::MalformedResponse(format!("truncated with-language {what}"));

    let len_bytes = raw.get(*pos..*pos + 2).ok_or_else(truncated)?;
    let len = u16::from_be_bytes([len_bytes[0], len_bytes[1]]) as usize;
    *pos += 2;

    let field = raw.get(*pos..*pos + len).ok_or_else(truncated)?;
    *pos += len;
    Ok(field)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn composite(language: &str, text: &str) -> Vec<u8> {
        let mut raw = Vec::new();
        raw.extend_from_slice(&(language.len() as u16).to_be_bytes());
        raw.extend_from_slice(language.as_bytes());
        raw.extend_from_slice(&(text.len() as u16).to_be_bytes());
        raw.extend_from_slice(text.as_bytes());
        raw
    }

    #[test]
    fn integer_is_signed_big_endian() {
        let raw = (-2i32).to_be_bytes();
        assert_eq!(
            decode_value(VALUE_TAG_INTEGER, &raw).unwrap(),
            AttributeValue::Integer(-2)
        );
    }

    #[test]
    fn integer_with_wrong_width_is_malformed() {
        let result = decode_value(VALUE_TAG_INTEGER, &[0, 0, 1]);
        assert!(matches!(result, Err(CupsError::MalformedResponse(_))));
    }

    #[test]
    fn boolean_nonzero_is_true() {
        assert_eq!(
            decode_value(VALUE_TAG_BOOLEAN, &[0x00]).unwrap(),
            AttributeValue::Boolean(false)
        );
        assert_eq!(
            decode_value(VALUE_TAG_BOOLEAN, &[0x01]).unwrap(),
            AttributeValue::Boolean(true)
        );
        assert_eq!(
            decode_value(VALUE_TAG_BOOLEAN, &[0x7f]).unwrap(),
            AttributeValue::Boolean(true)
        );
    }

    #[test]
    fn enum_is_two_bytes() {
        assert_eq!(
            decode_value(VALUE_TAG_ENUM, &[0x00, 0x03]).unwrap(),
            AttributeValue::Enum(3)
        );
    }

    #[test]
    fn four_byte_enum_keeps_leading_pair() {
        assert_eq!(
            decode_value(VALUE_TAG_ENUM, &[0x00, 0x05, 0x00, 0x03]).unwrap(),
            AttributeValue::Enum(5)
        );
        assert!(matches!(
            decode_value(VALUE_TAG_ENUM, &[0x07]),
            Err(CupsError::MalformedResponse(_))
        ));
    }

    #[test]
    fn binary_syntaxes_pass_through() {
        let raw = [1, 2, 3, 4, 5, 6, 7, 8, 9];
        assert_eq!(
            decode_value(VALUE_TAG_RESOLUTION, &raw).unwrap(),
            AttributeValue::Resolution(raw.to_vec())
        );
        assert_eq!(
            decode_value(VALUE_TAG_DATE_TIME, &raw).unwrap(),
            AttributeValue::DateTime(raw.to_vec())
        );
    }

    #[test]
    fn text_with_language_splits_composite() {
        let mut raw = composite("en-us", "Front desk");
        raw.extend_from_slice(b"ignored");
        assert_eq!(
            decode_value(VALUE_TAG_TEXT_WITH_LANGUAGE, &raw).unwrap(),
            AttributeValue::TextWithLanguage {
                language: "en-us".into(),
                text: "Front desk".into(),
            }
        );
    }

    #[test]
    fn truncated_name_with_language_is_malformed() {
        let raw = composite("en", "Office");
        let result = decode_value(VALUE_TAG_NAME_WITH_LANGUAGE, &raw[..raw.len() - 1]);
        assert!(matches!(result, Err(CupsError::MalformedResponse(_))));
    }

    #[test]
    fn string_syntaxes_decode_as_utf8() {
        assert_eq!(
            decode_value(VALUE_TAG_URI, b"ipp://localhost/printers/a").unwrap(),
            AttributeValue::Uri("ipp://localhost/printers/a".into())
        );
        assert_eq!(
            decode_value(VALUE_TAG_NAME, "Büro".as_bytes()).unwrap(),
            AttributeValue::NameWithoutLanguage("Büro".into())
        );
    }

    #[test]
    fn unknown_tag_is_kept_verbatim() {
        assert_eq!(
            decode_value(0x13, b"\x01\x02").unwrap(),
            AttributeValue::Unknown {
                tag: 0x13,
                raw: vec![1, 2],
            }
        );
    }
}
