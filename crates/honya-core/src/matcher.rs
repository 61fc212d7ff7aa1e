//! Candidate filtering, confidence tiers and series grouping.

use std::collections::HashMap;

use crate::chapter::{extract_chapter, strip_chapter_suffix};
use crate::models::{Candidate, ScoredCandidate, Titled};
use crate::normalize::normalize;
use crate::similarity::{score_with, ScoringWeights};
use crate::variants::fold_variants;

/// Default similarity floor for a candidate to count as a match.
pub const DEFAULT_MIN_SIMILARITY: f64 = 0.3;

/// Score one candidate against a query.
pub fn score_candidate(
    query: &str,
    candidate: Candidate,
    weights: &ScoringWeights,
) -> ScoredCandidate {
    let similarity = score_with(query, &candidate.title, weights);
    let chapter = extract_chapter(&candidate.title);
    ScoredCandidate {
        candidate,
        similarity,
        chapter,
    }
}

/// Incremental matcher: feed candidates as pages arrive, then `finish()`.
///
/// Candidates below the floor are dropped on arrival. The final order is by
/// descending similarity, ties kept in arrival order.
#[derive(Debug, Clone)]
pub struct Matcher {
    query: String,
    min_similarity: f64,
    weights: ScoringWeights,
    seen: usize,
    kept: Vec<ScoredCandidate>,
}

impl Matcher {
    pub fn new(query: impl Into<String>, min_similarity: f64, weights: ScoringWeights) -> Self {
        Self {
            query: query.into(),
            min_similarity,
            weights,
            seen: 0,
            kept: Vec::new(),
        }
    }

    pub fn push(&mut self, candidate: Candidate) {
        self.seen += 1;
        let scored = score_candidate(&self.query, candidate, &self.weights);
        if scored.similarity >= self.min_similarity {
            self.kept.push(scored);
        }
    }

    /// Number of candidates fed so far, matched or not.
    pub fn seen(&self) -> usize {
        self.seen
    }

    pub fn finish(mut self) -> Vec<ScoredCandidate> {
        // `sort_by` is stable, which keeps input order among equal scores.
        self.kept
            .sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        self.kept
    }
}

impl Extend<Candidate> for Matcher {
    fn extend<I: IntoIterator<Item = Candidate>>(&mut self, iter: I) {
        for candidate in iter {
            self.push(candidate);
        }
    }
}

/// Score every candidate, drop those below `min_similarity`, and sort the
/// rest by descending similarity (stable).
pub fn filter_matches(
    query: &str,
    candidates: impl IntoIterator<Item = Candidate>,
    min_similarity: f64,
    weights: &ScoringWeights,
) -> Vec<ScoredCandidate> {
    let mut matcher = Matcher::new(query, min_similarity, *weights);
    matcher.extend(candidates);
    matcher.finish()
}

// ── Tiers ───────────────────────────────────────────────────────

/// Confidence bucket derived from a similarity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchTier {
    High,
    Medium,
    Low,
}

impl MatchTier {
    pub fn of(similarity: f64, weights: &ScoringWeights) -> Self {
        if similarity >= weights.high_tier {
            Self::High
        } else if similarity >= weights.medium_tier {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "High match",
            Self::Medium => "Medium match",
            Self::Low => "Low match",
        }
    }
}

impl std::fmt::Display for MatchTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sorted matches split into confidence tiers, order preserved in each.
#[derive(Debug, Clone, Default)]
pub struct MatchTiers<'a> {
    pub high: Vec<&'a ScoredCandidate>,
    pub medium: Vec<&'a ScoredCandidate>,
    pub low: Vec<&'a ScoredCandidate>,
}

impl<'a> MatchTiers<'a> {
    pub fn partition(matches: &'a [ScoredCandidate], weights: &ScoringWeights) -> Self {
        let mut tiers = Self::default();
        for m in matches {
            match MatchTier::of(m.similarity, weights) {
                MatchTier::High => tiers.high.push(m),
                MatchTier::Medium => tiers.medium.push(m),
                MatchTier::Low => tiers.low.push(m),
            }
        }
        tiers
    }

    pub fn get(&self, tier: MatchTier) -> &[&'a ScoredCandidate] {
        match tier {
            MatchTier::High => &self.high,
            MatchTier::Medium => &self.medium,
            MatchTier::Low => &self.low,
        }
    }

    /// Tiers to display, highest first, empty tiers omitted.
    ///
    /// With `show_all` every non-empty tier is returned; otherwise only the
    /// highest non-empty one.
    pub fn visible(&self, show_all: bool) -> Vec<(MatchTier, &[&'a ScoredCandidate])> {
        let non_empty = [MatchTier::High, MatchTier::Medium, MatchTier::Low]
            .into_iter()
            .map(|t| (t, self.get(t)))
            .filter(|(_, items)| !items.is_empty());
        if show_all {
            non_empty.collect()
        } else {
            non_empty.take(1).collect()
        }
    }

    /// Number of matches `visible(show_all)` would return.
    pub fn visible_count(&self, show_all: bool) -> usize {
        self.visible(show_all).iter().map(|(_, items)| items.len()).sum()
    }

    /// True when `visible(false)` hides some matches.
    pub fn has_hidden(&self) -> bool {
        self.visible_count(false) < self.high.len() + self.medium.len() + self.low.len()
    }
}

// ── Series grouping ─────────────────────────────────────────────

/// Items sharing one inferred series.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesGroup<T> {
    /// Base name of the first member seen.
    pub name: String,
    pub members: Vec<T>,
}

/// Series base name of a title: normalized, chapter suffix removed.
pub fn base_name(title: &str) -> String {
    strip_chapter_suffix(&normalize(title))
}

/// Bucket key for a base name. Case and Traditional/Simplified script are
/// ignored, so "海賊王" and "海贼王" land together.
pub fn series_key(base: &str) -> String {
    fold_variants(&base.to_lowercase())
}

/// Group items by series, keeping first-seen order of groups and of members
/// within each group. Every item lands in exactly one group.
pub fn group_by_series<T: Titled>(items: impl IntoIterator<Item = T>) -> Vec<SeriesGroup<T>> {
    let mut groups: Vec<SeriesGroup<T>> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for item in items {
        let base = base_name(item.title());
        let key = series_key(&base);
        match index.get(&key) {
            Some(&i) => groups[i].members.push(item),
            None => {
                index.insert(key, groups.len());
                groups.push(SeriesGroup {
                    name: base,
                    members: vec![item],
                });
            }
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(id: u64, similarity: f64) -> ScoredCandidate {
        ScoredCandidate {
            candidate: Candidate::new(id, format!("t{id}")),
            similarity,
            chapter: None,
        }
    }

    // ── Filtering ───────────────────────────────────────────────

    #[test]
    fn filter_drops_below_floor_and_sorts() {
        let candidates = vec![
            Candidate::new(1, "海贼王 19-20話"),
            Candidate::new(2, "海賊王 21話"),
            Candidate::new(3, "Unrelated"),
        ];
        let matches = filter_matches("海贼王", candidates, 0.3, &ScoringWeights::default());
        let ids: Vec<u64> = matches.iter().map(|m| m.candidate.id).collect();
        assert_eq!(ids, [1, 2]);
        assert!(matches[0].similarity >= matches[1].similarity);
    }

    #[test]
    fn unordered_input_sorted_descending() {
        // Scores in input order: 0.4, 0.0, ~0.96.
        let candidates = vec![
            Candidate::new(2, "海賊王 21話"),
            Candidate::new(3, "Unrelated"),
            Candidate::new(1, "海贼王 19-20話"),
        ];
        let matches = filter_matches("海贼王", candidates, 0.3, &ScoringWeights::default());
        let ids: Vec<u64> = matches.iter().map(|m| m.candidate.id).collect();
        assert_eq!(ids, [1, 2]);
        assert!(matches[0].similarity > 0.9);
        assert!((matches[1].similarity - 0.4).abs() < 1e-9);
    }

    #[test]
    fn filter_keeps_exact_floor() {
        // "海贼王" vs "海賊王 21話" scores exactly 0.4.
        let matches = filter_matches(
            "海贼王",
            vec![Candidate::new(2, "海賊王 21話")],
            0.4,
            &ScoringWeights::default(),
        );
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn sort_is_stable_for_ties() {
        let candidates = vec![
            Candidate::new(10, "Foo 1話"),
            Candidate::new(11, "Bar"),
            Candidate::new(12, "Foo 1話"),
            Candidate::new(13, "Foo 1話"),
        ];
        let matches = filter_matches("foo 1話", candidates, 0.3, &ScoringWeights::default());
        let ids: Vec<u64> = matches.iter().map(|m| m.candidate.id).collect();
        assert_eq!(ids, [10, 12, 13]);
    }

    #[test]
    fn incremental_equals_batch() {
        let pages = vec![
            vec![Candidate::new(1, "One Piece 3話"), Candidate::new(2, "Naruto")],
            vec![Candidate::new(3, "One Piece 1-2話")],
        ];
        let weights = ScoringWeights::default();
        let mut matcher = Matcher::new("one piece", 0.3, weights);
        for page in pages.clone() {
            matcher.extend(page);
        }
        assert_eq!(matcher.seen(), 3);
        let incremental = matcher.finish();
        let batch = filter_matches("one piece", pages.into_iter().flatten(), 0.3, &weights);
        assert_eq!(incremental, batch);
    }

    #[test]
    fn chapter_attached() {
        let s = score_candidate(
            "海贼王",
            Candidate::new(1, "海贼王 19-20話"),
            &ScoringWeights::default(),
        );
        assert_eq!(s.chapter.as_deref(), Some("19-20"));
    }

    #[test]
    fn empty_query_matches_nothing() {
        let matches = filter_matches(
            "",
            vec![Candidate::new(1, "Anything")],
            0.3,
            &ScoringWeights::default(),
        );
        assert!(matches.is_empty());
    }

    // ── Tiers ───────────────────────────────────────────────────

    #[test]
    fn tier_boundaries() {
        let w = ScoringWeights::default();
        assert_eq!(MatchTier::of(1.0, &w), MatchTier::High);
        assert_eq!(MatchTier::of(0.8, &w), MatchTier::High);
        assert_eq!(MatchTier::of(0.79, &w), MatchTier::Medium);
        assert_eq!(MatchTier::of(0.5, &w), MatchTier::Medium);
        assert_eq!(MatchTier::of(0.49, &w), MatchTier::Low);
    }

    #[test]
    fn visible_defaults_to_highest_tier() {
        let matches = vec![scored(1, 0.9), scored(2, 0.6), scored(3, 0.4)];
        let tiers = MatchTiers::partition(&matches, &ScoringWeights::default());
        let shown = tiers.visible(false);
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].0, MatchTier::High);
        assert!(tiers.has_hidden());
        assert_eq!(tiers.visible_count(true), 3);
    }

    #[test]
    fn visible_falls_through_to_low() {
        let matches = vec![scored(1, 0.35), scored(2, 0.31)];
        let tiers = MatchTiers::partition(&matches, &ScoringWeights::default());
        let shown = tiers.visible(false);
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].0, MatchTier::Low);
        assert_eq!(shown[0].1.len(), 2);
        assert!(!tiers.has_hidden());
    }

    #[test]
    fn visible_show_all_skips_empty() {
        let matches = vec![scored(1, 0.9), scored(3, 0.4)];
        let tiers = MatchTiers::partition(&matches, &ScoringWeights::default());
        let kinds: Vec<MatchTier> = tiers.visible(true).iter().map(|(t, _)| *t).collect();
        assert_eq!(kinds, [MatchTier::High, MatchTier::Low]);
    }

    // ── Grouping ────────────────────────────────────────────────

    #[test]
    fn chapters_group_under_base_name() {
        let items = vec![
            Candidate::new(1, "Foo 第1話"),
            Candidate::new(2, "Bar"),
            Candidate::new(3, "Foo 第2話"),
        ];
        let groups = group_by_series(items);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "Foo");
        let ids: Vec<u64> = groups[0].members.iter().map(|c| c.id).collect();
        assert_eq!(ids, [1, 3]);
        assert_eq!(groups[1].name, "Bar");
    }

    #[test]
    fn script_variants_share_group() {
        let items = vec![
            Candidate::new(1, "海贼王 19-20話"),
            Candidate::new(2, "海賊王 21話"),
        ];
        let groups = group_by_series(&items);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "海贼王");
        assert_eq!(groups[0].members.len(), 2);
    }

    #[test]
    fn fullwidth_range_suffix_stripped() {
        // No space before the bracket: normalized but kept.
        assert_eq!(base_name("Foo（1-5）"), "Foo(1-5)");
        assert_eq!(base_name("Foo （1-5）"), "Foo");
    }

    #[test]
    fn base_name_idempotent() {
        for t in ["Foo 第1話", "Foo", "  海贼王  19-20話", "Bar [1-2]"] {
            let once = base_name(t);
            assert_eq!(base_name(&once), once);
        }
    }

    #[test]
    fn every_item_in_one_group() {
        let items: Vec<Candidate> = (0..20)
            .map(|i| Candidate::new(i, format!("S{} {}話", i % 3, i)))
            .collect();
        let groups = group_by_series(&items);
        let total: usize = groups.iter().map(|g| g.members.len()).sum();
        assert_eq!(total, items.len());
        let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, ["S0", "S1", "S2"]);
    }

    #[test]
    fn empty_input_no_groups() {
        assert!(group_by_series(Vec::<Candidate>::new()).is_empty());
    }
}
