use serde::{Deserialize, Serialize};

/// One gallery entry as listed by a search or tag page.
///
/// Fields other than `id` and `title` are optional on the page, so they
/// default to empty strings rather than failing deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: u64,
    pub title: String,
    /// The raw `title` attribute of the gallery link.
    #[serde(default)]
    pub title_html: String,
    #[serde(default)]
    pub cover: String,
    #[serde(default)]
    pub additional_info: String,
}

impl Candidate {
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            title_html: String::new(),
            cover: String::new(),
            additional_info: String::new(),
        }
    }
}

/// A candidate scored against one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    /// Similarity to the query, in `[0.0, 1.0]`.
    pub similarity: f64,
    /// Chapter number or range found in the title ("21", "19-20").
    pub chapter: Option<String>,
}

impl ScoredCandidate {
    /// Similarity as a whole percentage, truncated like the listing shows it.
    pub fn percent(&self) -> u32 {
        (self.similarity * 100.0) as u32
    }
}

/// Anything that carries a gallery title; lets the series grouper work on
/// raw and scored items alike.
pub trait Titled {
    fn title(&self) -> &str;
}

impl Titled for Candidate {
    fn title(&self) -> &str {
        &self.title
    }
}

impl Titled for ScoredCandidate {
    fn title(&self) -> &str {
        &self.candidate.title
    }
}

impl<T: Titled> Titled for &T {
    fn title(&self) -> &str {
        (**self).title()
    }
}
