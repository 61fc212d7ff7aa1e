//! HTML page parsers. Pure functions over page text, so every one of them
//! runs against fixture strings in tests.

use std::sync::LazyLock;

use honya_core::models::{Candidate, ComicRecord, DownloadLink, DownloadLinks, LinkKind, Shelf};
use scraper::{ElementRef, Html, Selector};

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap()
}

static GALLERY_ITEM: LazyLock<Selector> = LazyLock::new(|| selector(".li.gallary_item"));
static GALLERY_TITLE: LazyLock<Selector> = LazyLock::new(|| selector(".title > a"));
static IMG: LazyLock<Selector> = LazyLock::new(|| selector("img"));
static INFO_COL: LazyLock<Selector> = LazyLock::new(|| selector(".info_col"));
static THIS_PAGE: LazyLock<Selector> = LazyLock::new(|| selector(".thispage"));
static PAGINATOR: LazyLock<Selector> = LazyLock::new(|| selector(".f_left.paginator > a"));
static RESULT_TOTAL: LazyLock<Selector> = LazyLock::new(|| selector("#bodywrap .result > b"));

static FAV_ITEM: LazyLock<Selector> = LazyLock::new(|| selector(".asTB"));
static FAV_TITLE: LazyLock<Selector> = LazyLock::new(|| selector(".l_title > a"));
static FAV_THUMB: LazyLock<Selector> = LazyLock::new(|| selector(".asTBcell.thumb img"));
static FAV_TIME: LazyLock<Selector> = LazyLock::new(|| selector(".l_catg > span"));
static FAV_SHELF: LazyLock<Selector> = LazyLock::new(|| selector(".l_catg > a"));
static CURRENT_SHELF: LazyLock<Selector> = LazyLock::new(|| selector(".cur"));
static SHELF_NAV: LazyLock<Selector> = LazyLock::new(|| selector(".nav_list > a"));

static DOWN_BTN: LazyLock<Selector> = LazyLock::new(|| selector("a.down_btn"));
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| selector("a"));

/// Prefix shown before the creation time on favorites pages.
const FAVORITE_TIME_LABEL: &str = "創建時間：";

/// Anchor texts of the site's local download mirrors.
const MIRROR_LABELS: [&str; 4] = ["本地下載一", "本地下載二", "本地下载一", "本地下载二"];

/// Text of an element with every text node trimmed and concatenated.
fn stripped_text(el: ElementRef<'_>) -> String {
    el.text().map(str::trim).collect()
}

fn first_number(doc: &Html, sel: &Selector) -> Option<u32> {
    doc.select(sel).next()?.text().collect::<String>().trim().parse().ok()
}

fn last_paginator_number(doc: &Html) -> Option<u32> {
    doc.select(&PAGINATOR)
        .last()?
        .text()
        .collect::<String>()
        .trim()
        .parse()
        .ok()
}

/// Make a page-relative URL absolute.
///
/// `//host/x` gets `https:`, `/x` gets the site origin, anything else is
/// returned unchanged.
pub fn resolve_url(href: &str, domain: &str) -> String {
    if href.starts_with("//") {
        format!("https:{href}")
    } else if href.starts_with('/') {
        format!("https://{domain}{href}")
    } else {
        href.to_string()
    }
}

// ── Search pages ────────────────────────────────────────────────

/// One page of keyword or tag search results.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPage {
    pub comics: Vec<Candidate>,
    pub current_page: u32,
    pub total_page: u32,
    pub by_tag: bool,
}

/// Parse a search result page.
///
/// Tag pages carry a paginator; keyword pages only a result count, from
/// which the page total is derived with `page_size`. Items that cannot be
/// parsed are skipped with a warning.
pub fn parse_search_page(html: &str, by_tag: bool, page_size: u32) -> SearchPage {
    let doc = Html::parse_document(html);

    let mut comics = Vec::new();
    for item in doc.select(&GALLERY_ITEM) {
        let Some(link) = item.select(&GALLERY_TITLE).next() else {
            continue;
        };
        let href = link.value().attr("href").unwrap_or_default();
        let id = match gallery_id(href) {
            Some(id) => id,
            None => {
                tracing::warn!(href, "Skipping gallery item with unparseable id");
                continue;
            }
        };
        let cover = item
            .select(&IMG)
            .next()
            .and_then(|img| img.value().attr("src"))
            .map(|src| format!("https:{src}"))
            .unwrap_or_default();
        let additional_info = item
            .select(&INFO_COL)
            .next()
            .map(stripped_text)
            .unwrap_or_default();

        comics.push(Candidate {
            id,
            title: stripped_text(link),
            title_html: link.value().attr("title").unwrap_or_default().trim().to_string(),
            cover,
            additional_info,
        });
    }

    let current_page = first_number(&doc, &THIS_PAGE).unwrap_or(1);
    let total_page = if by_tag {
        last_paginator_number(&doc).unwrap_or(1).max(current_page)
    } else {
        doc.select(&RESULT_TOTAL)
            .next()
            .and_then(|b| b.text().collect::<String>().replace(',', "").trim().parse::<u32>().ok())
            .map(|total| total.div_ceil(page_size.max(1)))
            .unwrap_or(1)
    };

    SearchPage {
        comics,
        current_page,
        total_page,
        by_tag,
    }
}

/// Gallery id from `/photos-index-aid-{id}.html`.
fn gallery_id(href: &str) -> Option<u64> {
    href.replace("/photos-index-aid-", "")
        .replace(".html", "")
        .parse()
        .ok()
}

// ── Favorites ───────────────────────────────────────────────────

/// One page of a favorites shelf.
#[derive(Debug, Clone, PartialEq)]
pub struct FavoritesPage {
    pub comics: Vec<ComicRecord>,
    pub current_page: u32,
    pub total_page: u32,
    /// The shelf the page belongs to.
    pub shelf: Shelf,
}

/// Shelf from a shelf anchor: id from `c-{id}.html` in the href (0 when
/// absent), name from the anchor text.
pub fn parse_shelf_link(anchor: Option<ElementRef<'_>>) -> Shelf {
    let Some(a) = anchor else {
        return Shelf::default();
    };
    let id = a
        .value()
        .attr("href")
        .and_then(|href| href.split("c-").nth(1))
        .and_then(|rest| rest.split(".html").next())
        .and_then(|id| id.parse().ok())
        .unwrap_or(0);
    Shelf {
        id,
        name: stripped_text(a),
    }
}

/// Shelves listed in the favorites navigation.
pub fn parse_shelves(html: &str) -> Vec<Shelf> {
    let doc = Html::parse_document(html);
    doc.select(&SHELF_NAV)
        .map(|a| parse_shelf_link(Some(a)))
        .collect()
}

pub fn parse_favorites(html: &str) -> FavoritesPage {
    let doc = Html::parse_document(html);

    let mut comics = Vec::new();
    for item in doc.select(&FAV_ITEM) {
        let Some(link) = item.select(&FAV_TITLE).next() else {
            continue;
        };
        let href = link.value().attr("href").unwrap_or_default();
        let Some(id) = href
            .split("aid-")
            .nth(1)
            .and_then(|rest| rest.split(".html").next())
            .and_then(|id| id.parse().ok())
        else {
            tracing::warn!(href, "Skipping favorite with unparseable id");
            continue;
        };
        let cover = item
            .select(&FAV_THUMB)
            .next()
            .and_then(|img| img.value().attr("src"))
            .map(|src| format!("https:{src}"))
            .unwrap_or_default();
        let favorite_time = item
            .select(&FAV_TIME)
            .next()
            .map(|span| stripped_text(span).replace(FAVORITE_TIME_LABEL, ""))
            .unwrap_or_default();

        comics.push(ComicRecord {
            id,
            title: stripped_text(link),
            cover,
            favorite_time,
            shelf: parse_shelf_link(item.select(&FAV_SHELF).next()),
            search_info: None,
            download_links: Some(DownloadLinks::new()),
            extra: serde_json::Map::new(),
        });
    }

    FavoritesPage {
        comics,
        current_page: first_number(&doc, &THIS_PAGE).unwrap_or(1),
        total_page: last_paginator_number(&doc).unwrap_or(1),
        shelf: parse_shelf_link(doc.select(&CURRENT_SHELF).next()),
    }
}

// ── Download page ───────────────────────────────────────────────

/// Download links on a gallery's download page, in page order.
///
/// `a.down_btn` anchors are preferred. Without any, every anchor that looks
/// like a download (href mentions `download`, `wzip` or `.zip`, or the text
/// names a local mirror) is taken instead.
pub fn parse_download_links(html: &str, domain: &str) -> DownloadLinks {
    let doc = Html::parse_document(html);
    let mut links = DownloadLinks::new();

    for (i, button) in doc.select(&DOWN_BTN).enumerate() {
        let href = button.value().attr("href").unwrap_or_default();
        if href.is_empty() {
            continue;
        }
        let text = stripped_text(button);
        let key = if text.is_empty() {
            format!("下载链接{}", i + 1)
        } else {
            text.clone()
        };
        links.insert(
            key,
            DownloadLink {
                url: resolve_url(href, domain),
                text,
                kind: LinkKind::DirectLink,
            },
        );
    }

    if !links.is_empty() {
        return links;
    }

    for anchor in doc.select(&ANCHOR) {
        let href = anchor.value().attr("href").unwrap_or_default();
        if href.is_empty() {
            continue;
        }
        let text = stripped_text(anchor);
        let lower = href.to_lowercase();
        let looks_like_download = lower.contains("download")
            || lower.contains("wzip")
            || lower.contains(".zip")
            || MIRROR_LABELS.contains(&text.as_str());
        if !looks_like_download {
            continue;
        }
        let key = if text.is_empty() {
            format!("下载链接{}", links.len() + 1)
        } else {
            text.clone()
        };
        links.insert(
            key,
            DownloadLink {
                url: resolve_url(href, domain),
                text,
                kind: LinkKind::FoundLink,
            },
        );
    }

    links
}
