use thiserror::Error;

#[derive(Debug, Error)]
pub enum TextError {
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("{input:?} is not a valid {target} literal")]
    Format { input: String, target: &'static str },
    #[error("unsupported encoding: {0}")]
    UnsupportedEncoding(String),
    #[error("{input:?} cannot be represented in {encoding}")]
    Unrepresentable {
        input: String,
        encoding: &'static str,
    },
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("unescaped data is not UTF-8: {0}")]
    Unescape(#[from] std::string::FromUtf8Error),
}

pub type Result<T> = std::result::Result<T, TextError>;
