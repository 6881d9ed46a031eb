//! Regex matching, marker extraction and removal.

use regex::Regex;

use crate::error::Result;

const INNER: &str = "inner";

/// A compiled, immutable extraction pattern.
///
/// Built either from a single regular expression (the whole match is the
/// result) or from a pair of start/end markers (only the text between them
/// is the result). Markers are regex fragments, so escape literal
/// metacharacters with [`regex::escape`] when needed.
#[derive(Debug, Clone)]
pub struct ExtractionPattern {
    regex: Regex,
    bounded: bool,
}

impl ExtractionPattern {
    pub fn regex(pattern: &str) -> Result<Self> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            bounded: false,
        })
    }

    /// Capture the smallest span between `start` and `end`.
    ///
    /// Each marker is grouped on its own, so alternations stay inside it:
    /// `between("<b>|<i>", "</b>|</i>")` captures bold and italic text.
    ///
    /// The inner group is non-greedy, so two adjacent blocks yield two
    /// results instead of one spanning from the first start to the last end.
    /// `.` does not cross line breaks; run [`strip_line_breaks`] over
    /// multi-line markup first.
    pub fn between(start: &str, end: &str) -> Result<Self> {
        let regex = Regex::new(&format!("(?:{start})(?P<{INNER}>.*?)(?:{end})"))?;
        Ok(Self {
            regex,
            bounded: true,
        })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn first<'t>(&self, text: &'t str) -> Option<&'t str> {
        if self.bounded {
            self.regex
                .captures(text)
                .and_then(|caps| caps.name(INNER))
                .map(|m| m.as_str())
        } else {
            self.regex.find(text).map(|m| m.as_str())
        }
    }

    /// All non-overlapping results, in source order.
    pub fn all<'t>(&self, text: &'t str) -> Vec<&'t str> {
        if self.bounded {
            self.regex
                .captures_iter(text)
                .filter_map(|caps| caps.name(INNER))
                .map(|m| m.as_str())
                .collect()
        } else {
            self.regex.find_iter(text).map(|m| m.as_str()).collect()
        }
    }

    /// Drop every full match (markers included) from `text`.
    pub fn remove_from(&self, text: &str) -> String {
        self.regex.replace_all(text, "").into_owned()
    }
}

/// First substring of `text` matching `pattern`.
pub fn match_one<'t>(text: &'t str, pattern: &str) -> Result<Option<&'t str>> {
    Ok(ExtractionPattern::regex(pattern)?.first(text))
}

pub fn match_all<'t>(text: &'t str, pattern: &str) -> Result<Vec<&'t str>> {
    Ok(ExtractionPattern::regex(pattern)?.all(text))
}

/// Inner content of the first `start … end` block.
///
/// ```
/// let body = "<Title>Ch.1</Title>";
/// let title = aries_text::extract_one(body, "<Title>", "</Title>").unwrap();
/// assert_eq!(title, Some("Ch.1"));
/// ```
pub fn extract_one<'t>(text: &'t str, start: &str, end: &str) -> Result<Option<&'t str>> {
    Ok(ExtractionPattern::between(start, end)?.first(text))
}

pub fn extract_all<'t>(text: &'t str, start: &str, end: &str) -> Result<Vec<&'t str>> {
    Ok(ExtractionPattern::between(start, end)?.all(text))
}

/// Remove literal `targets` one after another.
///
/// Each removal runs on the output of the previous one, so removing `"b"`
/// then `"ac"` from `"abc"` leaves an empty string.
pub fn remove_all<I, S>(text: &str, targets: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    targets.into_iter().fold(text.to_owned(), |acc, target| {
        let target = target.as_ref();
        if target.is_empty() {
            acc
        } else {
            acc.replace(target, "")
        }
    })
}

pub fn remove_matching(text: &str, pattern: &str) -> Result<String> {
    Ok(ExtractionPattern::regex(pattern)?.remove_from(text))
}

/// Remove `\n`, `\r` and form feeds.
pub fn strip_line_breaks(text: &str) -> String {
    remove_all(text, ["\n", "\r", "\x0c"])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TextError;

    #[test]
    fn match_one_returns_first_hit() {
        let got = match_one("id=12 id=34", r"id=\d+").unwrap();
        assert_eq!(got, Some("id=12"));
    }

    #[test]
    fn match_one_without_hit_is_none() {
        assert_eq!(match_one("nothing here", r"\d+").unwrap(), None);
    }

    #[test]
    fn match_all_keeps_source_order() {
        let got = match_all("p3.jpg p1.jpg p2.jpg", r"p\d\.jpg").unwrap();
        assert_eq!(got, ["p3.jpg", "p1.jpg", "p2.jpg"]);
        assert!(match_all("", r"p\d").unwrap().is_empty());
    }

    #[test]
    fn extraction_is_non_greedy() {
        let got = extract_all("<a>X</a><a>Y</a>", "<a>", "</a>").unwrap();
        assert_eq!(got, ["X", "Y"]);
    }

    #[test]
    fn extract_one_excludes_markers() {
        let got = extract_one("<Title>Ch.1</Title>", "<Title>", "</Title>").unwrap();
        assert_eq!(got, Some("Ch.1"));
        assert_eq!(extract_one("<p>x</p>", "<Title>", "</Title>").unwrap(), None);
    }

    #[test]
    fn empty_block_is_a_valid_capture() {
        let got = extract_all("<a></a><a>Y</a>", "<a>", "</a>").unwrap();
        assert_eq!(got, ["", "Y"]);
    }

    #[test]
    fn markers_accept_regex_fragments() {
        let html = r#"<img src="/p/1.jpg"><img src="/p/2.png">"#;
        let got = extract_all(html, r#"src=""#, r#"\.(?:jpg|png)""#).unwrap();
        assert_eq!(got, ["/p/1", "/p/2"]);
    }

    #[test]
    fn alternation_stays_inside_its_marker() {
        let got = extract_all("<b>X</b><i>Y</i>", "<b>|<i>", "</b>|</i>").unwrap();
        assert_eq!(got, ["X", "Y"]);
        let one = extract_one("<p>a</p><i>Y</i>", "<b>|<i>", "</b>|</i>").unwrap();
        assert_eq!(one, Some("Y"));
    }

    #[test]
    fn bad_pattern_is_reported() {
        let err = match_one("x", "(").unwrap_err();
        assert!(matches!(err, TextError::Pattern(_)));
    }

    #[test]
    fn remove_all_is_sequential() {
        assert_eq!(remove_all("abc", ["b", "ac"]), "");
        assert_eq!(remove_all("abc", ["ac", "b"]), "ac");
    }

    #[test]
    fn remove_all_is_idempotent() {
        let once = remove_all("xaxbxx", ["x"]);
        assert_eq!(once, "ab");
        assert_eq!(remove_all(&once, ["x"]), once);
    }

    #[test]
    fn remove_matching_strips_every_match() {
        let got = remove_matching("a<br/>b<br />c", r"<br\s*/>").unwrap();
        assert_eq!(got, "abc");
    }

    #[test]
    fn line_breaks_are_stripped() {
        assert_eq!(strip_line_breaks("a\r\nb\x0cc\n"), "abc");
    }

    #[test]
    fn compiled_pattern_is_reusable() {
        let chapter = ExtractionPattern::between(r#"<li class="ch">"#, "</li>").unwrap();
        let page = r#"<li class="ch">One</li><li class="ch">Two</li>"#;
        assert_eq!(chapter.first(page), Some("One"));
        assert_eq!(chapter.all(page), ["One", "Two"]);
        assert_eq!(chapter.remove_from(page), "");
    }
}
