//! Query-vs-title relevance scoring.
//!
//! The score is a longest-matching-blocks ratio (Ratcliff/Obershelp) plus
//! two fixed bonuses: one when the query appears verbatim in the title, one
//! when most query words appear as title words. The sum is clamped to
//! `[0.0, 1.0]`.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::normalize::comparable;

/// Hand-tuned scoring constants. Exposed through `[search.weights]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Added when the query is a substring of the title.
    pub containment_bonus: f64,
    /// Added when shared words cover enough of the query.
    pub keyword_bonus: f64,
    /// Fraction of query words that must appear in the title.
    pub keyword_coverage: f64,
    /// Lowest score in the high tier.
    pub high_tier: f64,
    /// Lowest score in the medium tier.
    pub medium_tier: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            containment_bonus: 0.3,
            keyword_bonus: 0.2,
            keyword_coverage: 0.7,
            high_tier: 0.8,
            medium_tier: 0.5,
        }
    }
}

/// Score a title against a query with the default weights.
pub fn score(query: &str, title: &str) -> f64 {
    score_with(query, title, &ScoringWeights::default())
}

/// Score a title against a query.
///
/// Both sides are normalized and lowercased first. An empty query or title
/// scores 0.0.
pub fn score_with(query: &str, title: &str, weights: &ScoringWeights) -> f64 {
    let query = comparable(query);
    let title = comparable(title);
    if query.is_empty() || title.is_empty() {
        return 0.0;
    }

    let mut similarity = ratio(&query, &title);

    if title.contains(&query) {
        similarity += weights.containment_bonus;
    }

    if keyword_overlap(&query, &title, weights.keyword_coverage) {
        similarity += weights.keyword_bonus;
    }

    similarity.clamp(0.0, 1.0)
}

/// True when the query and title share words covering at least `coverage`
/// of the query's distinct words.
fn keyword_overlap(query: &str, title: &str, coverage: f64) -> bool {
    let query_words: HashSet<&str> = query.split_whitespace().collect();
    let title_words: HashSet<&str> = title.split_whitespace().collect();
    let common = query_words.intersection(&title_words).count();
    common > 0 && common as f64 >= query_words.len() as f64 * coverage
}

// ── Longest matching blocks ──────────────────────────────────────

/// Similarity ratio `2*M / T` over characters, where `M` is the total size
/// of the matching blocks and `T` the combined length. Two empty strings
/// are identical (1.0).
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matches = BlockMatcher::new(&a, &b).matched_len();
    2.0 * matches as f64 / total as f64
}

/// A matching block: `a[a_start..a_start+len] == b[b_start..b_start+len]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Block {
    a_start: usize,
    b_start: usize,
    len: usize,
}

struct BlockMatcher<'s> {
    a: &'s [char],
    b: &'s [char],
    /// Positions of every character of `b`.
    b_index: HashMap<char, Vec<usize>>,
}

impl<'s> BlockMatcher<'s> {
    fn new(a: &'s [char], b: &'s [char]) -> Self {
        let mut b_index: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, &c) in b.iter().enumerate() {
            b_index.entry(c).or_default().push(j);
        }
        Self { a, b, b_index }
    }

    /// Longest common block within `a[alo..ahi]` and `b[blo..bhi]`.
    ///
    /// Ties go to the block starting earliest in `a`, then earliest in `b`.
    fn longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> Block {
        let mut best = Block {
            a_start: alo,
            b_start: blo,
            len: 0,
        };
        // Length of the match ending at b[j] for the previous row of `a`.
        let mut run_len: HashMap<usize, usize> = HashMap::new();

        for i in alo..ahi {
            let mut next_run: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b_index.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| run_len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next_run.insert(j, k);
                    if k > best.len {
                        best = Block {
                            a_start: i + 1 - k,
                            b_start: j + 1 - k,
                            len: k,
                        };
                    }
                }
            }
            run_len = next_run;
        }

        best
    }

    /// Total length of all matching blocks, found by recursively taking the
    /// longest block and searching the regions to its left and right.
    fn matched_len(&self) -> usize {
        let mut pending = vec![(0, self.a.len(), 0, self.b.len())];
        let mut total = 0;

        while let Some((alo, ahi, blo, bhi)) = pending.pop() {
            let block = self.longest_match(alo, ahi, blo, bhi);
            if block.len == 0 {
                continue;
            }
            total += block.len;
            let (i, j, k) = (block.a_start, block.b_start, block.len);
            if alo < i && blo < j {
                pending.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                pending.push((i + k, ahi, j + k, bhi));
            }
        }

        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    // ── Ratio ───────────────────────────────────────────────────

    #[test]
    fn ratio_identical() {
        assert!(approx(ratio("abcd", "abcd"), 1.0));
    }

    #[test]
    fn ratio_disjoint() {
        assert!(approx(ratio("abc", "xyz"), 0.0));
    }

    #[test]
    fn ratio_known_values() {
        // 2*M/T with M the total matched-block length.
        assert!(approx(ratio("abcd", "bcde"), 0.75));
        assert!(approx(ratio("海贼王", "海賊王 21話"), 0.4));
        assert!(approx(ratio("hello", "hallo"), 0.8));
    }

    #[test]
    fn ratio_recurses_both_sides() {
        // Blocks "ab" and "de" around the mismatched middle.
        assert!(approx(ratio("abXde", "abYde"), 0.8));
    }

    #[test]
    fn ratio_both_empty() {
        assert!(approx(ratio("", ""), 1.0));
    }

    #[test]
    fn longest_match_prefers_earliest() {
        let a: Vec<char> = "abab".chars().collect();
        let b: Vec<char> = "ab".chars().collect();
        let m = BlockMatcher::new(&a, &b);
        let block = m.longest_match(0, a.len(), 0, b.len());
        assert_eq!(
            block,
            Block {
                a_start: 0,
                b_start: 0,
                len: 2
            }
        );
    }

    // ── Score ───────────────────────────────────────────────────

    #[test]
    fn self_match_is_one() {
        for q in ["海贼王", "One Piece", "a", "【汉化】 Foo（1）"] {
            assert!(approx(score(q, q), 1.0), "score({q:?}, {q:?}) != 1.0");
        }
    }

    #[test]
    fn score_is_bounded() {
        let pairs = [
            ("", ""),
            ("", "title"),
            ("query", ""),
            ("one piece", "one piece one piece one piece"),
            ("海贼王", "海贼王 19-20話"),
            ("zzz", "aaa"),
        ];
        for (q, t) in pairs {
            let s = score(q, t);
            assert!((0.0..=1.0).contains(&s), "score({q:?}, {t:?}) = {s}");
        }
    }

    #[test]
    fn empty_sides_score_zero() {
        assert!(approx(score("", "title"), 0.0));
        assert!(approx(score("query", ""), 0.0));
        assert!(approx(score("   ", "title"), 0.0));
    }

    #[test]
    fn containment_adds_bonus() {
        let base = ratio("海贼王", "海贼王 19-20話");
        let s = score("海贼王", "海贼王 19-20話");
        assert!(s >= base);
        // Both bonuses apply: containment and the shared word "海贼王".
        assert!(approx(s, (base + 0.5).min(1.0)));
    }

    #[test]
    fn case_and_width_insensitive() {
        assert!(approx(score("ONE PIECE", "one piece"), 1.0));
        assert!(approx(score("foo（1）", "foo(1)"), 1.0));
    }

    #[test]
    fn keyword_bonus_without_containment() {
        // "piece one" is not a substring of the title but every word is shared.
        let base = ratio("piece one", "one piece 5");
        let s = score("piece one", "one piece 5");
        assert!(approx(s, (base + 0.2).min(1.0)));
    }

    #[test]
    fn keyword_bonus_needs_coverage() {
        // One shared word out of four query words is below 70%.
        assert!(!keyword_overlap("a b c d", "a x y", 0.7));
        assert!(keyword_overlap("a b c", "a b x", 0.6));
        assert!(!keyword_overlap("a", "b", 0.0));
    }

    #[test]
    fn custom_weights() {
        let weights = ScoringWeights {
            containment_bonus: 0.0,
            keyword_bonus: 0.0,
            ..ScoringWeights::default()
        };
        let s = score_with("海贼王", "海贼王 21話", &weights);
        assert!(approx(s, ratio("海贼王", "海贼王 21話")));
    }

    #[test]
    fn deterministic() {
        let a = score("海贼王", "海賊王 21話");
        let b = score("海贼王", "海賊王 21話");
        assert_eq!(a.to_bits(), b.to_bits());
    }
}
