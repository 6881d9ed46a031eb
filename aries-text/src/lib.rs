//! Pattern-based text extraction and small conversion helpers.
//!
//! Everything here is a pure function of its arguments: fetched markup goes
//! in, typed fragments (chapter titles, page paths, ids) come out. There is
//! no DOM; patterns are plain regular expressions or pairs of markers that
//! delimit a non-greedy capture.
//!
//! ```
//! use aries_text::{extract_all, strip_line_breaks};
//!
//! let html = strip_line_breaks("<li>\n<a>Ch.1</a></li><li><a>Ch.2</a></li>");
//! let titles = extract_all(&html, "<a>", "</a>").unwrap();
//! assert_eq!(titles, ["Ch.1", "Ch.2"]);
//! ```
//!
//! "No match" is never an error: single lookups return `None`, multi
//! lookups return an empty `Vec`.

pub mod convert;
pub mod encoding;
mod error;
pub mod pattern;

pub use convert::{
    from_base64, to_base64, to_base64_with, to_bytes, to_bytes_with, to_double, to_float, to_int,
    to_long,
};
pub use encoding::{
    change_encoding, decode_with, escape_data_string, lookup, unescape_data_string,
};
pub use error::{Result, TextError};
pub use pattern::{
    extract_all, extract_one, match_all, match_one, remove_all, remove_matching,
    strip_line_breaks, ExtractionPattern,
};
