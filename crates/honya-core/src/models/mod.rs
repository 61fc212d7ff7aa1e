pub mod candidate;
pub mod record;

pub use candidate::{Candidate, ScoredCandidate, Titled};
pub use record::{
    ComicRecord, DownloadLink, DownloadLinks, Export, LinkKind, SaveLayout, SearchInfo,
    SearchKind, SearchMetadata, Shelf, ShelfMetadata,
};
