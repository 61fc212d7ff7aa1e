//! Turns matched candidates into the export records consumed by the link
//! resolver and the downloader.

use crate::config::AppConfig;
use crate::matcher::{group_by_series, MatchTiers, Matcher, SeriesGroup};
use crate::models::record::now_iso;
use crate::models::{
    Candidate, ComicRecord, Export, SaveLayout, ScoredCandidate, SearchInfo, SearchKind,
    SearchMetadata, Shelf,
};
use crate::similarity::ScoringWeights;

/// Parameters of one search run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    pub min_similarity: f64,
    /// Display every non-empty tier instead of only the best one.
    pub show_all: bool,
    /// Upper bound on result pages fetched before matching.
    pub max_pages: u32,
    pub weights: ScoringWeights,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            min_similarity: crate::matcher::DEFAULT_MIN_SIMILARITY,
            show_all: false,
            max_pages: 20,
            weights: ScoringWeights::default(),
        }
    }
}

impl SearchOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            min_similarity: config.search.min_similarity,
            show_all: false,
            max_pages: config.request.max_pages,
            weights: config.search.weights,
        }
    }
}

/// Matches for one query. Built fresh per search; holds no shared state.
#[derive(Debug, Clone)]
pub struct ResultSet {
    pub query: String,
    pub kind: SearchKind,
    pub options: SearchOptions,
    /// Candidates fetched, matched or not.
    pub fetched: usize,
    /// Matches sorted by descending similarity.
    pub matches: Vec<ScoredCandidate>,
}

/// What a search produced. The two empty cases are reported differently.
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    /// The site returned nothing at all.
    NoCandidates,
    /// Candidates were fetched but none reached the similarity floor.
    NoMatches { fetched: usize },
    Matches(ResultSet),
}

impl SearchOutcome {
    pub fn result_set(&self) -> Option<&ResultSet> {
        match self {
            Self::Matches(set) => Some(set),
            _ => None,
        }
    }
}

/// Score and filter candidates for a query.
#[tracing::instrument(name = "assemble", skip(candidates, options), fields(query = %query, kind = %kind))]
pub fn search(
    query: &str,
    kind: SearchKind,
    candidates: impl IntoIterator<Item = Candidate>,
    options: SearchOptions,
) -> SearchOutcome {
    let mut matcher = Matcher::new(query, options.min_similarity, options.weights);
    matcher.extend(candidates);
    let fetched = matcher.seen();
    let matches = matcher.finish();

    tracing::debug!(fetched, matched = matches.len(), "Scored candidates");

    if fetched == 0 {
        SearchOutcome::NoCandidates
    } else if matches.is_empty() {
        SearchOutcome::NoMatches { fetched }
    } else {
        SearchOutcome::Matches(ResultSet {
            query: query.to_string(),
            kind,
            options,
            fetched,
            matches,
        })
    }
}

impl ResultSet {
    pub fn tiers(&self) -> MatchTiers<'_> {
        MatchTiers::partition(&self.matches, &self.options.weights)
    }

    pub fn groups(&self) -> Vec<SeriesGroup<&ScoredCandidate>> {
        group_by_series(&self.matches)
    }

    /// Build the export files for this result set.
    ///
    /// `All` yields a single export with per-series counts; `Grouped` yields
    /// one export per series, paired with the series name.
    pub fn exports(&self, layout: SaveLayout) -> Vec<(Option<String>, Export)> {
        let groups = self.groups();
        match layout {
            SaveLayout::All => {
                let counts = groups
                    .iter()
                    .map(|g| (g.name.clone(), serde_json::Value::from(g.members.len())))
                    .collect();
                let comics = self.matches.iter().map(|m| to_record(m, &self.query)).collect();
                let mut meta = self.metadata(SaveLayout::All);
                meta.manga_groups = Some(counts);
                vec![(None, export(comics, meta))]
            }
            SaveLayout::Grouped => groups
                .into_iter()
                .map(|group| {
                    let comics = group
                        .members
                        .iter()
                        .map(|m| to_record(m, &self.query))
                        .collect();
                    let mut meta = self.metadata(SaveLayout::Grouped);
                    meta.manga_name = Some(group.name.clone());
                    (Some(group.name), export(comics, meta))
                })
                .collect(),
        }
    }

    fn metadata(&self, layout: SaveLayout) -> SearchMetadata {
        SearchMetadata {
            search_query: self.query.clone(),
            search_kind: Some(self.kind),
            search_time: now_iso(),
            search_type: Some(layout),
            manga_name: None,
            manga_groups: None,
        }
    }
}

fn export(comics: Vec<ComicRecord>, meta: SearchMetadata) -> Export {
    Export {
        total_comics: comics.len(),
        comics,
        search_metadata: Some(meta),
        shelf_metadata: None,
        extra: serde_json::Map::new(),
    }
}

/// Shelf label used for search results, which belong to no shelf.
fn search_shelf_name(query: &str) -> String {
    if query.is_empty() {
        "搜索结果".to_string()
    } else {
        format!("搜索结果-{query}")
    }
}

/// Convert a match into an export record. Similarity and chapter token are
/// carried in `search_info`.
pub fn to_record(m: &ScoredCandidate, query: &str) -> ComicRecord {
    let c = &m.candidate;
    ComicRecord {
        id: c.id,
        title: c.title.clone(),
        cover: c.cover.clone(),
        favorite_time: String::new(),
        shelf: Shelf {
            id: 0,
            name: search_shelf_name(query),
        },
        search_info: Some(SearchInfo {
            title_html: c.title_html.clone(),
            additional_info: c.additional_info.clone(),
            similarity: m.similarity,
            chapter_info: m.chapter.clone(),
            search_query: query.to_string(),
        }),
        download_links: None,
        extra: serde_json::Map::new(),
    }
}

/// Recover a match from an export record written by `to_record`.
///
/// Returns `None` for records without search details (shelf exports).
pub fn from_record(record: &ComicRecord) -> Option<ScoredCandidate> {
    let info = record.search_info.as_ref()?;
    Some(ScoredCandidate {
        candidate: Candidate {
            id: record.id,
            title: record.title.clone(),
            title_html: info.title_html.clone(),
            cover: record.cover.clone(),
            additional_info: info.additional_info.clone(),
        },
        similarity: info.similarity,
        chapter: info.chapter_info.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates() -> Vec<Candidate> {
        vec![
            Candidate {
                id: 1,
                title: "海贼王 19-20話".into(),
                title_html: "海贼王 19-20話".into(),
                cover: "https://img/1.jpg".into(),
                additional_info: "40P".into(),
            },
            Candidate::new(2, "海賊王 21話"),
            Candidate::new(3, "Unrelated"),
        ]
    }

    fn result_set() -> ResultSet {
        match search("海贼王", SearchKind::Keyword, candidates(), SearchOptions::default()) {
            SearchOutcome::Matches(set) => set,
            other => panic!("Expected Matches, got {other:?}"),
        }
    }

    #[test]
    fn end_to_end_scenario() {
        let set = result_set();
        assert_eq!(set.fetched, 3);
        let ids: Vec<u64> = set.matches.iter().map(|m| m.candidate.id).collect();
        assert_eq!(ids, [1, 2]);

        let chapters: Vec<Option<&str>> =
            set.matches.iter().map(|m| m.chapter.as_deref()).collect();
        assert_eq!(chapters, [Some("19-20"), Some("21")]);

        let groups = set.groups();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].members.len(), 2);

        let tiers = set.tiers();
        let tiered: usize = tiers.high.len() + tiers.medium.len() + tiers.low.len();
        assert_eq!(tiered, 2);
        assert_eq!(tiers.high.len(), 1);
        assert_eq!(tiers.low.len(), 1);
    }

    #[test]
    fn no_candidates_distinct_from_no_matches() {
        let none = search("q", SearchKind::Keyword, Vec::new(), SearchOptions::default());
        assert!(matches!(none, SearchOutcome::NoCandidates));

        let unmatched = search(
            "海贼王",
            SearchKind::Tag,
            vec![Candidate::new(3, "Unrelated")],
            SearchOptions::default(),
        );
        assert!(matches!(unmatched, SearchOutcome::NoMatches { fetched: 1 }));
        assert!(unmatched.result_set().is_none());
    }

    #[test]
    fn record_shape() {
        let set = result_set();
        let record = to_record(&set.matches[0], &set.query);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["favorite_time"], "");
        assert_eq!(json["shelf"]["id"], 0);
        assert_eq!(json["shelf"]["name"], "搜索结果-海贼王");
        assert_eq!(json["search_info"]["chapter_info"], "19-20");
        assert_eq!(json["search_info"]["search_query"], "海贼王");
        assert_eq!(json["search_info"]["additional_info"], "40P");
    }

    #[test]
    fn record_roundtrip_is_lossless() {
        let set = result_set();
        for m in &set.matches {
            let record = to_record(m, &set.query);
            let text = serde_json::to_string(&record).unwrap();
            let back: ComicRecord = serde_json::from_str(&text).unwrap();
            assert_eq!(from_record(&back).as_ref(), Some(m));
        }
    }

    #[test]
    fn stored_similarity_keeps_every_bit() {
        let similarity = crate::similarity::score("海贼王", "海贼王 19-20話");
        let text = serde_json::to_string(&similarity).unwrap();
        let back: f64 = serde_json::from_str(&text).unwrap();
        assert_eq!(back.to_bits(), similarity.to_bits());
    }

    #[test]
    fn missing_chapter_serializes_as_null() {
        let m = ScoredCandidate {
            candidate: Candidate::new(9, "Plain"),
            similarity: 0.5,
            chapter: None,
        };
        let json = serde_json::to_value(to_record(&m, "")).unwrap();
        assert!(json["search_info"]["chapter_info"].is_null());
        assert_eq!(json["shelf"]["name"], "搜索结果");
    }

    #[test]
    fn export_all_layout() {
        let set = result_set();
        let exports = set.exports(SaveLayout::All);
        assert_eq!(exports.len(), 1);
        let (name, export) = &exports[0];
        assert!(name.is_none());
        assert_eq!(export.total_comics, 2);
        let meta = export.search_metadata.as_ref().unwrap();
        assert_eq!(meta.search_type, Some(SaveLayout::All));
        assert_eq!(meta.search_kind, Some(SearchKind::Keyword));
        assert_eq!(meta.manga_groups.as_ref().unwrap()["海贼王"], 2);

        let json = serde_json::to_value(export).unwrap();
        assert!(json["comics"].is_array());
        assert_eq!(json["total_comics"], 2);
        assert_eq!(json["search_metadata"]["search_query"], "海贼王");
        assert_eq!(json["search_metadata"]["search_type"], "all");
    }

    #[test]
    fn export_grouped_layout() {
        let matches = vec![
            ScoredCandidate {
                candidate: Candidate::new(1, "Foo 第1話"),
                similarity: 0.9,
                chapter: Some("1".into()),
            },
            ScoredCandidate {
                candidate: Candidate::new(2, "Bar"),
                similarity: 0.8,
                chapter: None,
            },
            ScoredCandidate {
                candidate: Candidate::new(3, "Foo 第2話"),
                similarity: 0.7,
                chapter: Some("2".into()),
            },
        ];
        let set = ResultSet {
            query: "foo".into(),
            kind: SearchKind::Tag,
            options: SearchOptions::default(),
            fetched: 3,
            matches,
        };
        let exports = set.exports(SaveLayout::Grouped);
        assert_eq!(exports.len(), 2);
        assert_eq!(exports[0].0.as_deref(), Some("Foo"));
        assert_eq!(exports[0].1.total_comics, 2);
        let meta = exports[0].1.search_metadata.as_ref().unwrap();
        assert_eq!(meta.manga_name.as_deref(), Some("Foo"));
        assert_eq!(meta.search_type, Some(SaveLayout::Grouped));
        assert_eq!(exports[1].0.as_deref(), Some("Bar"));
    }

    #[test]
    fn options_from_config() {
        let config = AppConfig::default();
        let options = SearchOptions::from_config(&config);
        assert_eq!(options.max_pages, 20);
        assert!(!options.show_all);
        assert_eq!(options, SearchOptions::default());
    }
}
