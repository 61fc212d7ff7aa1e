//! Title normalization for query-vs-title comparison.
//!
//! Only bracket width and whitespace are canonicalized. Gallery titles mix
//! full-width and half-width brackets freely, and the similarity ratio is
//! character based, so `（` vs `(` alone would cost a match point.

/// Canonicalize a title: half-width brackets, single spaces, trimmed.
///
/// Total and idempotent; apply it to the query and every title alike.
pub fn normalize(s: &str) -> String {
    let mapped: String = s.chars().map(half_width_bracket).collect();
    collapse_whitespace(&mapped)
}

/// Normalize and lowercase, the form the similarity scorer compares.
pub fn comparable(s: &str) -> String {
    normalize(&s.to_lowercase())
}

/// Map full-width parentheses and lenticular brackets to ASCII.
fn half_width_bracket(c: char) -> char {
    match c {
        '\u{FF08}' => '(', // （
        '\u{FF09}' => ')', // ）
        '\u{3010}' => '[', // 【
        '\u{3011}' => ']', // 】
        c => c,
    }
}

/// Trim and collapse multiple whitespace runs to a single space.
pub(crate) fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fullwidth_parentheses() {
        assert_eq!(normalize("海贼王（汉化）"), "海贼王(汉化)");
    }

    #[test]
    fn lenticular_brackets() {
        assert_eq!(normalize("【中文】 Title"), "[中文] Title");
    }

    #[test]
    fn collapse_spaces() {
        assert_eq!(normalize("  hello   world  "), "hello world");
    }

    #[test]
    fn ideographic_space_collapses() {
        // U+3000 is Unicode whitespace.
        assert_eq!(normalize("海贼王\u{3000}\u{3000}21話"), "海贼王 21話");
    }

    #[test]
    fn tabs_and_newlines() {
        assert_eq!(normalize("a\t\nb"), "a b");
    }

    #[test]
    fn empty_and_blank() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn other_fullwidth_untouched() {
        // Only brackets are mapped; full-width letters stay as they are.
        assert_eq!(normalize("ＡＢＣ"), "ＡＢＣ");
    }

    #[test]
    fn idempotent() {
        let samples = [
            "",
            "  【汉化】 海贼王（第1卷）  19-20話 ",
            "Foo\u{3000}Bar",
            "already normal",
            "（（））【【】】",
        ];
        for s in samples {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn comparable_lowercases() {
        assert_eq!(comparable("  One PIECE（Vol 1） "), "one piece(vol 1)");
    }
}
