use std::time::Duration;

use honya_core::config::AppConfig;
use honya_core::models::{ComicRecord, DownloadLinks, SearchKind, Shelf};
use reqwest::header::{HeaderMap, HeaderValue, COOKIE, REFERER, USER_AGENT};
use reqwest::Client;
use url::Url;

use crate::error::ApiError;
use crate::parse::{
    parse_download_links, parse_favorites, parse_search_page, parse_shelves, FavoritesPage,
    SearchPage,
};
use crate::source::ComicSource;

/// HTTP client for the comic site.
///
/// Cookie, referer and user agent are sent with every request. Shelf and
/// favorites pages need the cookie; search and download pages do not.
#[derive(Debug, Clone)]
pub struct WnacgClient {
    http: Client,
    domain: String,
    has_cookie: bool,
    max_retries: u32,
    page_size: u32,
}

impl WnacgClient {
    pub fn new(config: &AppConfig) -> Result<Self, ApiError> {
        let domain = config.site.domain.trim().to_string();
        if domain.is_empty() {
            return Err(ApiError::Config("site.domain is empty".into()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header_value(&config.site.user_agent)?);
        headers.insert(REFERER, header_value(&format!("https://{domain}/"))?);
        let cookie = config.cookie();
        if let Some(cookie) = &cookie {
            headers.insert(COOKIE, header_value(cookie)?);
        }

        let http = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            domain,
            has_cookie: cookie.is_some(),
            max_retries: config.request.max_retries.max(1),
            page_size: config.search.page_size,
        })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(Url::parse(&format!("https://{}/", self.domain))?.join(path)?)
    }

    fn require_cookie(&self) -> Result<(), ApiError> {
        if self.has_cookie {
            Ok(())
        } else {
            Err(ApiError::Config(format!(
                "a login cookie is required; set site.cookie or {}",
                honya_core::config::COOKIE_ENV
            )))
        }
    }

    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            Err(ApiError::Status {
                status: resp.status().as_u16(),
                url: resp.url().to_string(),
            })
        }
    }

    async fn fetch_once(&self, url: &Url) -> Result<String, ApiError> {
        let resp = self.http.get(url.clone()).send().await?;
        let resp = Self::check_response(resp).await?;
        Ok(resp.text().await?)
    }

    /// GET a page as text, retrying with `2^attempt` second backoff.
    async fn fetch(&self, url: Url) -> Result<String, ApiError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(&url).await {
                Ok(text) => return Ok(text),
                Err(e) if attempt + 1 >= self.max_retries => return Err(e),
                Err(e) => {
                    let wait = Duration::from_secs(1 << attempt);
                    tracing::warn!(
                        url = %url,
                        attempt = attempt + 1,
                        max = self.max_retries,
                        wait_secs = wait.as_secs(),
                        error = %e,
                        "Request failed, retrying"
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
            }
        }
    }

    // ── Search ──────────────────────────────────────────────────

    pub async fn search_keyword(&self, query: &str, page: u32) -> Result<SearchPage, ApiError> {
        let mut url = self.url("search/index.php")?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("syn", "yes")
            .append_pair("f", "_all")
            .append_pair("s", "create_time_DESC")
            .append_pair("p", &page.to_string());
        let html = self.fetch(url).await?;
        Ok(parse_search_page(&html, false, self.page_size))
    }

    pub async fn search_tag(&self, tag: &str, page: u32) -> Result<SearchPage, ApiError> {
        let mut url = self.url("/")?;
        // Pushing a whole segment percent-encodes `/`, `?` and `#` in the tag.
        url.path_segments_mut()
            .map_err(|()| ApiError::Config(format!("cannot build tag URL on {}", self.domain)))?
            .clear()
            .push(&format!("albums-index-page-{page}-tag-{tag}.html"));
        let html = self.fetch(url).await?;
        Ok(parse_search_page(&html, true, self.page_size))
    }

    // ── Shelves ─────────────────────────────────────────────────

    /// List the user's favorites shelves.
    pub async fn shelves(&self) -> Result<Vec<Shelf>, ApiError> {
        self.require_cookie()?;
        let html = self.fetch(self.url("users-users_fav-page-1-c-0.html")?).await?;
        Ok(parse_shelves(&html))
    }

    pub async fn favorites_page(&self, shelf_id: u64, page: u32) -> Result<FavoritesPage, ApiError> {
        self.require_cookie()?;
        let url = self.url(&format!("users-users_fav-page-{page}-c-{shelf_id}.html"))?;
        let html = self.fetch(url).await?;
        Ok(parse_favorites(&html))
    }

    /// Every comic on a shelf: the first page, then the rest concurrently.
    #[tracing::instrument(name = "shelf_comics", skip(self))]
    pub async fn shelf_comics(&self, shelf_id: u64) -> Result<Vec<ComicRecord>, ApiError> {
        let first = self.favorites_page(shelf_id, 1).await?;
        tracing::info!(shelf = %first.shelf.name, pages = first.total_page, "Reading shelf");

        let mut comics = first.comics;
        if first.total_page > 1 {
            let rest = (2..=first.total_page).map(|page| self.favorites_page(shelf_id, page));
            for page in futures::future::try_join_all(rest).await? {
                comics.extend(page.comics);
            }
        }

        tracing::info!(count = comics.len(), "Read shelf");
        Ok(comics)
    }

    // ── Downloads ───────────────────────────────────────────────

    pub async fn download_links(&self, id: u64) -> Result<DownloadLinks, ApiError> {
        let url = self.url(&format!("download-index-aid-{id}.html"))?;
        let html = self.fetch(url).await?;
        Ok(parse_download_links(&html, &self.domain))
    }
}

fn header_value(value: &str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(value).map_err(|e| ApiError::Config(format!("invalid header value: {e}")))
}

impl ComicSource for WnacgClient {
    async fn search_page(
        &self,
        kind: SearchKind,
        query: &str,
        page: u32,
    ) -> Result<SearchPage, ApiError> {
        match kind {
            SearchKind::Keyword => self.search_keyword(query, page).await,
            SearchKind::Tag => self.search_tag(query, page).await,
        }
    }

    async fn download_links(&self, id: u64) -> Result<DownloadLinks, ApiError> {
        WnacgClient::download_links(self, id).await
    }
}
