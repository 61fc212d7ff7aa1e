//! Persisted record shapes shared by search exports, shelf exports and the
//! link/download stages.
//!
//! Unknown fields are carried through `extra` so that enriching a file with
//! download links never drops data written by another tool.

use std::fmt;

use chrono::Local;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A favorites shelf. Id 0 means "all" or "no shelf".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shelf {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

/// Search details embedded in each search-result record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchInfo {
    #[serde(default)]
    pub title_html: String,
    #[serde(default)]
    pub additional_info: String,
    #[serde(default)]
    pub similarity: f64,
    #[serde(default)]
    pub chapter_info: Option<String>,
    #[serde(default)]
    pub search_query: String,
}

/// How a download link was found on the download page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    /// A `.down_btn` anchor.
    DirectLink,
    /// Any other anchor that looked like a download.
    FoundLink,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadLink {
    pub url: String,
    #[serde(default)]
    pub text: String,
    #[serde(rename = "type")]
    pub kind: LinkKind,
}

/// Download links keyed by their button label, in page order.
///
/// Serialized as a JSON object; order matters because the downloader tries
/// links first to last.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadLinks(Vec<(String, DownloadLink)>);

impl DownloadLinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a link, replacing an existing entry with the same name in place.
    pub fn insert(&mut self, name: String, link: DownloadLink) {
        if let Some(slot) = self.0.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = link;
        } else {
            self.0.push((name, link));
        }
    }

    pub fn get(&self, name: &str) -> Option<&DownloadLink> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, l)| l)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DownloadLink)> {
        self.0.iter().map(|(n, l)| (n.as_str(), l))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for DownloadLinks {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, link) in &self.0 {
            map.serialize_entry(name, link)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for DownloadLinks {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct LinksVisitor;

        impl<'de> Visitor<'de> for LinksVisitor {
            type Value = DownloadLinks;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of link name to download link")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut links = DownloadLinks::new();
                while let Some((name, link)) = access.next_entry::<String, DownloadLink>()? {
                    links.insert(name, link);
                }
                Ok(links)
            }
        }

        deserializer.deserialize_map(LinksVisitor)
    }
}

/// One comic as written to an export file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComicRecord {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub cover: String,
    /// Empty for search results, which have no shelf membership.
    #[serde(default)]
    pub favorite_time: String,
    #[serde(default)]
    pub shelf: Shelf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_info: Option<SearchInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_links: Option<DownloadLinks>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ComicRecord {
    pub fn has_links(&self) -> bool {
        self.download_links.as_ref().is_some_and(|l| !l.is_empty())
    }
}

/// Where a search query was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    Keyword,
    Tag,
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyword => write!(f, "keyword"),
            Self::Tag => write!(f, "tag"),
        }
    }
}

/// How a search export was split into files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveLayout {
    /// One file with every result.
    All,
    /// One file per series.
    Grouped,
}

impl fmt::Display for SaveLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Grouped => write!(f, "grouped"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchMetadata {
    pub search_query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_kind: Option<SearchKind>,
    /// ISO-8601 local time; kept as text so older exports still load.
    pub search_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_type: Option<SaveLayout>,
    /// Series name for a grouped file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manga_name: Option<String>,
    /// Series name to member count, for a single-file export.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manga_groups: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShelfMetadata {
    pub shelf_id: u64,
    pub shelf_name: String,
    pub export_time: String,
    pub source: String,
}

/// Current local time in the ISO-8601 form used by export metadata.
pub fn now_iso() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// A complete export file: search results or a shelf listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Export {
    pub comics: Vec<ComicRecord>,
    #[serde(default)]
    pub total_comics: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_metadata: Option<SearchMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shelf_metadata: Option<ShelfMetadata>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Export {
    /// Build a shelf export from the comics of one shelf.
    pub fn from_shelf(shelf_id: u64, comics: Vec<ComicRecord>) -> Self {
        let shelf_name = comics
            .first()
            .map(|c| c.shelf.name.clone())
            .unwrap_or_else(|| "empty".to_string());
        Self {
            total_comics: comics.len(),
            comics,
            search_metadata: None,
            shelf_metadata: Some(ShelfMetadata {
                shelf_id,
                shelf_name,
                export_time: now_iso(),
                source: "shelf_info".to_string(),
            }),
            extra: serde_json::Map::new(),
        }
    }

    /// Human label for listings: the query or the shelf name.
    pub fn label(&self) -> String {
        if let Some(meta) = &self.search_metadata {
            format!("search: {}", meta.search_query)
        } else if let Some(meta) = &self.shelf_metadata {
            format!("shelf: {}", meta.shelf_name)
        } else if let Some(first) = self.comics.first() {
            format!("shelf: {}", first.shelf.name)
        } else {
            "unknown".to_string()
        }
    }
}
