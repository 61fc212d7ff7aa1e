//! Terminal rendering of search results, shelves and export listings.

use std::fmt::Write;

use honya_core::assemble::{ResultSet, SearchOutcome};
use honya_core::models::{ScoredCandidate, Shelf};
use honya_core::storage::ExportSummary;
use honya_api::DownloadSummary;

fn push_match(out: &mut String, n: usize, m: &ScoredCandidate) {
    let c = &m.candidate;
    let _ = writeln!(out, "\n{n}. ID: {} ({}% match)", c.id, m.percent());
    let _ = writeln!(out, "   Title: {}", c.title);
    if let Some(chapter) = &m.chapter {
        let _ = writeln!(out, "   Chapter: {chapter}");
    }
    if !c.additional_info.is_empty() {
        let _ = writeln!(out, "   Info: {}", c.additional_info);
    }
    if !c.cover.is_empty() {
        let _ = writeln!(out, "   Cover: {}", c.cover);
    }
}

/// Tiers, statistics and series counts for one search.
pub fn render_outcome(outcome: &SearchOutcome, query: &str, min_similarity: f64) -> String {
    match outcome {
        SearchOutcome::NoCandidates => format!("No results found for \"{query}\".\n"),
        SearchOutcome::NoMatches { fetched } => format!(
            "Fetched {fetched} results for \"{query}\", none reached similarity {:.0}%.\n",
            min_similarity * 100.0
        ),
        SearchOutcome::Matches(set) => render_results(set),
    }
}

fn render_results(set: &ResultSet) -> String {
    let mut out = String::new();
    let tiers = set.tiers();

    for (tier, items) in tiers.visible(set.options.show_all) {
        let _ = writeln!(out, "\n=== {tier} ({}) ===", items.len());
        for (i, m) in items.iter().enumerate() {
            push_match(&mut out, i + 1, m);
        }
    }

    let _ = writeln!(out, "\n=== Summary ===");
    let _ = writeln!(out, "Fetched: {}", set.fetched);
    let _ = writeln!(out, "Matched: {}", set.matches.len());
    let _ = writeln!(out, "Shown: {}", tiers.visible_count(set.options.show_all));
    if !set.options.show_all && tiers.has_hidden() {
        let _ = writeln!(out, "Pass --all to show lower-confidence matches.");
    }

    let mut groups = set.groups();
    if !groups.is_empty() {
        // Stable: equal-sized series keep first-seen order.
        groups.sort_by(|a, b| b.members.len().cmp(&a.members.len()));
        let _ = writeln!(out, "\n=== Series ===");
        for group in &groups {
            let _ = writeln!(out, "{}: {}", group.name, group.members.len());
        }
    }

    out
}

pub fn render_shelves(shelves: &[Shelf]) -> String {
    if shelves.is_empty() {
        return "No shelves found.\n".to_string();
    }
    let mut out = String::new();
    for shelf in shelves {
        let _ = writeln!(out, "{:>6}  {}", shelf.id, shelf.name);
    }
    out
}

pub fn render_files(title: &str, files: &[ExportSummary]) -> String {
    let mut out = format!("=== {title} ({}) ===\n", files.len());
    for (i, f) in files.iter().enumerate() {
        let name = f
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let _ = writeln!(out, "{}. {name}", i + 1);
        let _ = writeln!(
            out,
            "   {} | {} comics, {} with links | {} KB | {}",
            f.label,
            f.comics,
            f.with_links,
            f.size.div_ceil(1024),
            f.modified.format("%Y-%m-%d %H:%M:%S")
        );
    }
    out
}

pub fn render_download_summary(summary: &DownloadSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n=== Download summary ===");
    let _ = writeln!(out, "Total: {}", summary.total);
    let _ = writeln!(out, "Succeeded: {}", summary.succeeded);
    let _ = writeln!(out, "Failed: {}", summary.failed.len());
    for (i, title) in summary.failed.iter().enumerate() {
        let _ = writeln!(out, "  {}. {title}", i + 1);
    }
    out
}
