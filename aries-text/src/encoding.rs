//! Charset lookup, re-decoding and URI data escaping.

use encoding_rs::Encoding;

use crate::error::{Result, TextError};

/// Resolve a WHATWG encoding label (case-insensitive, e.g. `"utf-8"`,
/// `"GB2312"`, `"iso-8859-1"`).
pub fn lookup(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| TextError::UnsupportedEncoding(label.to_owned()))
}

/// Decode `bytes` with the named encoding. A BOM, when present, wins over
/// the label. Malformed sequences become U+FFFD.
pub fn decode_with(bytes: &[u8], label: &str) -> Result<String> {
    let (text, _, _) = lookup(label)?.decode(bytes);
    Ok(text.into_owned())
}

/// Bytes of `text` in the encoding named by `label`.
///
/// Characters the target cannot represent are an error; nothing is
/// substituted for them.
pub(crate) fn encode_strict(text: &str, label: &str) -> Result<Vec<u8>> {
    let encoding = lookup(label)?;
    let (bytes, _, had_errors) = encoding.encode(text);
    if had_errors {
        return Err(TextError::Unrepresentable {
            input: text.to_owned(),
            encoding: encoding.name(),
        });
    }
    Ok(bytes.into_owned())
}

/// Encode `text` with `label` and read the bytes back as UTF-8.
///
/// Repairs text that was decoded with the wrong charset: UTF-8 markup read
/// as windows-1252 turns `é` into `Ã©`, and
/// `change_encoding("Ã©", "windows-1252")` turns it back.
pub fn change_encoding(text: &str, label: &str) -> Result<String> {
    let bytes = encode_strict(text, label)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Percent-encode everything but unreserved characters.
pub fn escape_data_string(text: &str) -> String {
    urlencoding::encode(text).into_owned()
}

pub fn unescape_data_string(text: &str) -> Result<String> {
    Ok(urlencoding::decode(text)?.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_label_is_unsupported() {
        let err = lookup("klingon-8").unwrap_err();
        assert!(matches!(err, TextError::UnsupportedEncoding(ref l) if l == "klingon-8"));
        assert!(change_encoding("x", "klingon-8").is_err());
    }

    #[test]
    fn labels_are_case_insensitive() {
        assert_eq!(lookup("GBK").unwrap(), encoding_rs::GBK);
        assert_eq!(lookup(" utf-8 ").unwrap(), encoding_rs::UTF_8);
    }

    #[test]
    fn change_encoding_repairs_mojibake() {
        assert_eq!(change_encoding("Ã©tÃ©", "windows-1252").unwrap(), "été");
    }

    #[test]
    fn unmappable_characters_are_rejected() {
        let err = change_encoding("漫画", "latin1").unwrap_err();
        assert!(matches!(
            err,
            TextError::Unrepresentable { encoding: "windows-1252", .. }
        ));
        assert!(encode_strict("漫画", "gbk").is_ok());
    }

    #[test]
    fn decode_with_legacy_charset() {
        let gbk = [0xC2, 0xFE, 0xBB, 0xAD];
        assert_eq!(decode_with(&gbk, "gbk").unwrap(), "漫画");
    }

    #[test]
    fn data_string_escaping_round_trips() {
        let escaped = escape_data_string("第1话 a&b");
        assert_eq!(escaped, "%E7%AC%AC1%E8%AF%9D%20a%26b");
        assert_eq!(unescape_data_string(&escaped).unwrap(), "第1话 a&b");
    }

    #[test]
    fn invalid_utf8_escape_is_an_error() {
        assert!(matches!(
            unescape_data_string("%FF"),
            Err(TextError::Unescape(_))
        ));
    }
}
