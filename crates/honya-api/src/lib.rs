pub mod client;
pub mod download;
pub mod error;
pub mod parse;
pub mod source;

pub use client::WnacgClient;
pub use download::{DownloadSummary, Downloader, Pacing};
pub use error::ApiError;
pub use source::{collect_pages, resolve_links, ComicSource};
