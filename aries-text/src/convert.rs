//! Byte, base64 and numeric conversions.

use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::encoding::encode_strict;
use crate::error::{Result, TextError};

/// UTF-8 bytes of `text`.
pub fn to_bytes(text: &str) -> Vec<u8> {
    text.as_bytes().to_vec()
}

/// Bytes of `text` in the encoding named by `label` (WHATWG label such as
/// `"gbk"`, `"shift_jis"`, `"latin1"`). Fails with
/// [`TextError::Unrepresentable`] when a character has no mapping there.
pub fn to_bytes_with(text: &str, label: &str) -> Result<Vec<u8>> {
    encode_strict(text, label)
}

pub fn to_base64(input: impl AsRef<[u8]>) -> String {
    STANDARD.encode(input)
}

pub fn to_base64_with(text: &str, label: &str) -> Result<String> {
    Ok(STANDARD.encode(to_bytes_with(text, label)?))
}

/// Inverse of [`to_base64`].
pub fn from_base64(encoded: &str) -> Result<Vec<u8>> {
    Ok(STANDARD.decode(encoded.trim())?)
}

pub fn to_int(text: &str) -> Result<i32> {
    parse_literal(text, "i32")
}

pub fn to_long(text: &str) -> Result<i64> {
    parse_literal(text, "i64")
}

pub fn to_float(text: &str) -> Result<f32> {
    parse_literal(text, "f32")
}

pub fn to_double(text: &str) -> Result<f64> {
    parse_literal(text, "f64")
}

// Surrounding whitespace is tolerated; scraped numbers usually carry some.
fn parse_literal<T: FromStr>(text: &str, target: &'static str) -> Result<T> {
    text.trim().parse().map_err(|_| TextError::Format {
        input: text.to_owned(),
        target,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_round_trips() {
        for input in [&b""[..], b"f", b"fo", b"foo", &[0u8, 255, 128, 7][..]] {
            let encoded = to_base64(input);
            assert_eq!(from_base64(&encoded).unwrap(), input);
        }
    }

    #[test]
    fn base64_of_text_uses_utf8() {
        assert_eq!(to_base64("漫画"), "5ryr55S7");
        assert_eq!(to_base64(""), "");
    }

    #[test]
    fn base64_with_legacy_encoding() {
        // "漫画" in GBK is C2 FE BB AD.
        assert_eq!(to_base64_with("漫画", "gbk").unwrap(), "wv67rQ==");
    }

    #[test]
    fn invalid_base64_is_rejected() {
        assert!(matches!(from_base64("@@@"), Err(TextError::Base64(_))));
    }

    #[test]
    fn numbers_parse() {
        assert_eq!(to_int(" 42 ").unwrap(), 42);
        assert_eq!(to_long("-9000000000").unwrap(), -9_000_000_000);
        assert_eq!(to_float("1.5").unwrap(), 1.5);
        assert_eq!(to_double("2.25").unwrap(), 2.25);
    }

    #[test]
    fn bad_numbers_are_format_errors() {
        let err = to_int("12a").unwrap_err();
        assert!(matches!(err, TextError::Format { target: "i32", .. }));
        assert!(to_int("3000000000").is_err());
        assert!(to_double("").is_err());
    }

    #[test]
    fn legacy_encodings_refuse_foreign_characters() {
        assert!(matches!(
            to_bytes_with("漫画", "latin1"),
            Err(TextError::Unrepresentable { .. })
        ));
        assert!(matches!(
            to_base64_with("漫画", "latin1"),
            Err(TextError::Unrepresentable { .. })
        ));
    }

    #[test]
    fn to_bytes_is_utf8() {
        assert_eq!(to_bytes("é"), vec![0xC3, 0xA9]);
        assert_eq!(to_bytes_with("é", "latin1").unwrap(), vec![0xE9]);
    }
}
