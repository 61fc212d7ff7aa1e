//! JSON export files on disk.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local};

use crate::error::HonyaError;
use crate::models::Export;

/// Longest file stem, in characters, produced by `clean_filename`.
const MAX_NAME_CHARS: usize = 200;

/// Replace characters forbidden in file names, cap the length and trim.
pub fn clean_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c => c,
        })
        .take(MAX_NAME_CHARS)
        .collect();
    replaced.trim().to_string()
}

/// Timestamp used in export file names.
fn file_timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

fn write_json(path: &Path, export: &Export) -> Result<(), HonyaError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let text = serde_json::to_string_pretty(export)?;
    fs::write(path, text)?;
    tracing::info!(path = %path.display(), comics = export.total_comics, "Saved export");
    Ok(())
}

/// Write search exports into `dir`.
///
/// An unnamed export becomes `search_{query}_all_{ts}.json`; a named one
/// (one series) becomes `search_{query}_{series}_{ts}.json`.
pub fn save_search(
    dir: &Path,
    query: &str,
    exports: &[(Option<String>, Export)],
) -> Result<Vec<PathBuf>, HonyaError> {
    let ts = file_timestamp();
    let query = clean_filename(query);
    let mut written = Vec::with_capacity(exports.len());

    for (series, export) in exports {
        let label = match series {
            Some(name) => clean_filename(name),
            None => "all".to_string(),
        };
        let path = dir.join(format!("search_{query}_{label}_{ts}.json"));
        write_json(&path, export)?;
        written.push(path);
    }

    Ok(written)
}

/// Write a shelf export as `shelf_{name}_{ts}.json`.
pub fn save_shelf(dir: &Path, export: &Export) -> Result<PathBuf, HonyaError> {
    let name = export
        .shelf_metadata
        .as_ref()
        .map(|m| m.shelf_name.as_str())
        .unwrap_or("unknown");
    let path = dir.join(format!(
        "shelf_{}_{}.json",
        clean_filename(name),
        file_timestamp()
    ));
    write_json(&path, export)?;
    Ok(path)
}

pub fn load_export(path: &Path) -> Result<Export, HonyaError> {
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|e| {
        HonyaError::Storage(format!("{} is not a valid export: {e}", path.display()))
    })
}

/// Write an export enriched with download links as
/// `{source stem}_with_downloads.json` in `dir`.
pub fn save_enriched(dir: &Path, source: &Path, export: &Export) -> Result<PathBuf, HonyaError> {
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| HonyaError::Storage(format!("bad file name: {}", source.display())))?;
    let path = dir.join(format!("{stem}_with_downloads.json"));
    write_json(&path, export)?;
    Ok(path)
}

// ── Listing ─────────────────────────────────────────────────────

/// What an export file contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Search,
    Shelf,
    Unknown,
}

impl std::fmt::Display for ExportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Search => write!(f, "search"),
            Self::Shelf => write!(f, "shelf"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// One export file found by `scan_exports`.
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub kind: ExportKind,
    pub label: String,
    pub comics: usize,
    pub with_links: usize,
    pub size: u64,
    pub modified: DateTime<Local>,
}

impl ExportSummary {
    fn new(path: PathBuf, export: &Export, size: u64, modified: SystemTime) -> Self {
        let kind = if export.search_metadata.is_some() {
            ExportKind::Search
        } else if export.shelf_metadata.is_some() {
            ExportKind::Shelf
        } else {
            ExportKind::Unknown
        };
        Self {
            path,
            kind,
            label: export.label(),
            comics: export.comics.len(),
            with_links: export.comics.iter().filter(|c| c.has_links()).count(),
            size,
            modified: modified.into(),
        }
    }
}

/// List the export files in `dir`, newest first.
///
/// Files that are not valid exports are skipped with a warning. A missing
/// directory lists as empty.
pub fn scan_exports(dir: &Path) -> Result<Vec<ExportSummary>, HonyaError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let meta = fs::metadata(&path)?;
        match load_export(&path) {
            Ok(export) => {
                let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
                found.push(ExportSummary::new(path, &export, meta.len(), modified));
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable export");
            }
        }
    }

    found.sort_by(|a, b| b.modified.cmp(&a.modified));
    Ok(found)
}
