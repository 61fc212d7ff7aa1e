//! Serialized-chapter markers in gallery titles.
//!
//! Two ordered pattern cascades, first match wins:
//! - extraction looks anywhere in the title and yields a chapter token
//!   ("19-20" or "5");
//! - suffix stripping only looks at the end of the title and yields the
//!   series base name.
//!
//! `話` (Traditional/Japanese) and `话` (Simplified) are interchangeable.

use std::sync::LazyLock;

use regex::Regex;

use crate::normalize::collapse_whitespace;

/// Shape of the token a pattern produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capture {
    /// Two numbers, joined as "N-M".
    Range,
    /// One number.
    Single,
}

struct ChapterPattern {
    regex: Regex,
    capture: Capture,
}

impl ChapterPattern {
    fn new(pattern: &str, capture: Capture) -> Self {
        Self {
            regex: Regex::new(pattern).unwrap(),
            capture,
        }
    }

    fn token(&self, title: &str) -> Option<String> {
        let caps = self.regex.captures(title)?;
        match self.capture {
            Capture::Range => Some(format!("{}-{}", &caps[1], &caps[2])),
            Capture::Single => Some(caps[1].to_string()),
        }
    }
}

// ── Extraction cascade ──────────────────────────────────────────

/// Ranges before singles, so "第19-20話" never yields a lone "20".
static EXTRACT_PATTERNS: LazyLock<Vec<ChapterPattern>> = LazyLock::new(|| {
    vec![
        ChapterPattern::new(r"(\d+)-(\d+)[話话]", Capture::Range),
        ChapterPattern::new(r"第(\d+)-(\d+)[話话]", Capture::Range),
        ChapterPattern::new(r"(\d+)~(\d+)[話话]", Capture::Range),
        ChapterPattern::new(r"(\d+)-(\d+)", Capture::Range),
        ChapterPattern::new(r"第(\d+)[話话]", Capture::Single),
        ChapterPattern::new(r"(\d+)[話话]", Capture::Single),
    ]
});

/// Extract the chapter token from a title.
///
/// Returns `None` when the title carries no chapter marker.
pub fn extract_chapter(title: &str) -> Option<String> {
    EXTRACT_PATTERNS.iter().find_map(|p| p.token(title))
}

// ── Suffix cascade ──────────────────────────────────────────────

/// Trailing markers, each preceded by whitespace.
static SUFFIX_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\s+\d+-\d+[話话]$",
        r"\s+第\d+-\d+[話话]$",
        r"\s+\d+~\d+[話话]$",
        r"\s+第\d+[話话]$",
        r"\s+\d+[話话]$",
        r"\s+\(\d+-\d+\)$",
        r"\s+\[\d+-\d+\]$",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Strip one trailing chapter marker, if any.
fn strip_once(title: &str) -> Option<&str> {
    SUFFIX_PATTERNS
        .iter()
        .find_map(|re| re.find(title))
        .map(|m| title[..m.start()].trim())
}

/// Recover the series base name by removing trailing chapter markers.
///
/// Whitespace is collapsed first. Stripping repeats until no marker is
/// left, so the result is a fixed point: `strip(strip(x)) == strip(x)`.
/// A title without a marker is its own base name.
pub fn strip_chapter_suffix(title: &str) -> String {
    let mut base = collapse_whitespace(title);
    while let Some(stripped) = strip_once(&base) {
        base = stripped.to_string();
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Extraction ──────────────────────────────────────────────

    #[test]
    fn prefixed_range() {
        assert_eq!(extract_chapter("第19-20話").as_deref(), Some("19-20"));
        assert_eq!(extract_chapter("某漫画 第3-4话").as_deref(), Some("3-4"));
    }

    #[test]
    fn bare_range_with_marker() {
        assert_eq!(extract_chapter("海贼王 19-20話").as_deref(), Some("19-20"));
    }

    #[test]
    fn tilde_range() {
        assert_eq!(extract_chapter("Title 19~20話").as_deref(), Some("19-20"));
        assert_eq!(extract_chapter("Title 19~20话").as_deref(), Some("19-20"));
    }

    #[test]
    fn range_without_marker() {
        assert_eq!(extract_chapter("[Group] Title (1-5)").as_deref(), Some("1-5"));
    }

    #[test]
    fn prefixed_single() {
        assert_eq!(extract_chapter("第5話").as_deref(), Some("5"));
        assert_eq!(extract_chapter("标题 第12话").as_deref(), Some("12"));
    }

    #[test]
    fn bare_single() {
        assert_eq!(extract_chapter("海賊王 21話").as_deref(), Some("21"));
        assert_eq!(extract_chapter("Title 7话").as_deref(), Some("7"));
    }

    #[test]
    fn no_marker() {
        assert_eq!(extract_chapter("Foo Bar"), None);
        assert_eq!(extract_chapter(""), None);
        assert_eq!(extract_chapter("Vol 3"), None);
    }

    #[test]
    fn range_wins_over_single() {
        // Single patterns would match "20話" inside the range.
        assert_eq!(extract_chapter("Foo 19-20話").as_deref(), Some("19-20"));
        assert_eq!(extract_chapter("Foo 第19~20話").as_deref(), Some("19-20"));
    }

    #[test]
    fn first_occurrence_in_title() {
        assert_eq!(extract_chapter("Foo 3話 Bar 4話").as_deref(), Some("3"));
    }

    // ── Suffix stripping ────────────────────────────────────────

    #[test]
    fn strip_prefixed_single() {
        assert_eq!(strip_chapter_suffix("Foo Bar 第5話"), "Foo Bar");
    }

    #[test]
    fn strip_no_marker_unchanged() {
        assert_eq!(strip_chapter_suffix("Foo Bar"), "Foo Bar");
    }

    #[test]
    fn strip_each_form() {
        assert_eq!(strip_chapter_suffix("Foo 19-20話"), "Foo");
        assert_eq!(strip_chapter_suffix("Foo 第19-20话"), "Foo");
        assert_eq!(strip_chapter_suffix("Foo 19~20話"), "Foo");
        assert_eq!(strip_chapter_suffix("Foo 21话"), "Foo");
        assert_eq!(strip_chapter_suffix("Foo (1-5)"), "Foo");
        assert_eq!(strip_chapter_suffix("Foo [1-5]"), "Foo");
    }

    #[test]
    fn strip_requires_leading_space() {
        assert_eq!(strip_chapter_suffix("Foo第5話"), "Foo第5話");
        assert_eq!(strip_chapter_suffix("第5話"), "第5話");
    }

    #[test]
    fn strip_only_at_end() {
        assert_eq!(strip_chapter_suffix("Foo 5話 extra"), "Foo 5話 extra");
    }

    #[test]
    fn strip_collapses_whitespace() {
        assert_eq!(strip_chapter_suffix("  Foo   Bar   第5話 "), "Foo Bar");
    }

    #[test]
    fn strip_is_idempotent() {
        let samples = [
            "Foo Bar 第5話",
            "Foo 1話 2話",
            "Foo (1-2) [3-4]",
            "Foo Bar",
            "",
            "第5話",
        ];
        for s in samples {
            let once = strip_chapter_suffix(s);
            assert_eq!(strip_chapter_suffix(&once), once, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn stacked_markers_strip_fully() {
        assert_eq!(strip_chapter_suffix("Foo 1話 2話"), "Foo");
    }
}
