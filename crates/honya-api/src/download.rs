//! Archive downloader for exports enriched with download links.

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::{Stream, StreamExt};
use honya_core::models::{ComicRecord, Export};
use rand::Rng;
use reqwest::header::{HeaderValue, USER_AGENT};
use reqwest::Client;
use tokio::io::AsyncWriteExt;

use crate::error::ApiError;

/// Archive extensions kept from the link URL; anything else becomes `zip`.
const ARCHIVE_EXTENSIONS: [&str; 5] = ["zip", "rar", "7z", "tar", "gz"];

/// Pauses between download attempts, in seconds.
#[derive(Debug, Clone)]
pub struct Pacing {
    /// Random pause after every link that failed all its attempts.
    pub between_links: RangeInclusive<f64>,
    /// Random pause between two comics.
    pub between_comics: RangeInclusive<f64>,
    /// Base of the linear backoff between attempts on one link.
    pub retry_step: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            between_links: 3.0..=8.0,
            between_comics: 5.0..=10.0,
            retry_step: Duration::from_secs(2),
        }
    }
}

impl Pacing {
    /// No waiting at all.
    pub fn none() -> Self {
        Self {
            between_links: 0.0..=0.0,
            between_comics: 0.0..=0.0,
            retry_step: Duration::ZERO,
        }
    }
}

/// Draw a pause from `range`. Kept synchronous: the thread-local RNG must
/// not live across an await point.
fn jitter(range: &RangeInclusive<f64>) -> Duration {
    if range.start() >= range.end() {
        return Duration::from_secs_f64(range.start().max(0.0));
    }
    Duration::from_secs_f64(rand::thread_rng().gen_range(range.clone()))
}

/// Outcome of a download run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    /// Comics that had at least one link.
    pub total: usize,
    pub succeeded: usize,
    /// Titles whose every link failed.
    pub failed: Vec<String>,
}

pub struct Downloader {
    http: Client,
    dir: PathBuf,
    max_attempts: u32,
    pacing: Pacing,
}

impl Downloader {
    pub fn new(dir: impl Into<PathBuf>, user_agent: &str) -> Result<Self, ApiError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .map_err(|e| ApiError::Config(format!("invalid user agent: {e}")))?,
        );
        let http = Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(300))
            .build()?;
        Ok(Self {
            http,
            dir: dir.into(),
            max_attempts: 3,
            pacing: Pacing::default(),
        })
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Download every comic in `export` that carries links, one at a time.
    #[tracing::instrument(name = "download", skip_all, fields(dir = %self.dir.display()))]
    pub async fn download_export(&self, export: &Export) -> Result<DownloadSummary, ApiError> {
        let comics: Vec<&ComicRecord> = export.comics.iter().filter(|c| c.has_links()).collect();
        let mut summary = DownloadSummary {
            total: comics.len(),
            ..Default::default()
        };
        if comics.is_empty() {
            tracing::warn!("No comics with download links");
            return Ok(summary);
        }

        tokio::fs::create_dir_all(&self.dir).await?;
        tracing::info!(total = summary.total, "Starting downloads");

        for (i, comic) in comics.iter().enumerate() {
            tracing::info!(n = i + 1, total = summary.total, title = %comic.title, "Downloading");
            if self.download_comic(comic).await {
                summary.succeeded += 1;
            } else {
                summary.failed.push(comic.title.clone());
            }
            if i + 1 < comics.len() {
                tokio::time::sleep(jitter(&self.pacing.between_comics)).await;
            }
        }

        tracing::info!(
            succeeded = summary.succeeded,
            failed = summary.failed.len(),
            "Downloads finished"
        );
        Ok(summary)
    }

    /// Try each link in order until one succeeds.
    async fn download_comic(&self, comic: &ComicRecord) -> bool {
        let Some(links) = &comic.download_links else {
            return false;
        };

        for (name, link) in links.iter() {
            let path = self.dir.join(file_name_for(&link.url, &comic.title, name));

            for attempt in 1..=self.max_attempts {
                match self.download_file(&link.url, &path).await {
                    Ok(bytes) => {
                        tracing::info!(file = %path.display(), bytes, "Saved archive");
                        return true;
                    }
                    Err(e) => {
                        tracing::warn!(link = %name, attempt, error = %e, "Download attempt failed");
                        if attempt < self.max_attempts {
                            tokio::time::sleep(self.pacing.retry_step * attempt).await;
                        }
                    }
                }
            }

            tracing::warn!(link = %name, "Every attempt failed, trying next link");
            tokio::time::sleep(jitter(&self.pacing.between_links)).await;
        }

        tracing::error!(title = %comic.title, "All download links failed");
        false
    }

    /// Stream one URL to `path`.
    async fn download_file(&self, url: &str, path: &Path) -> Result<u64, ApiError> {
        let resp = self.http.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(ApiError::Status {
                status: resp.status().as_u16(),
                url: url.to_string(),
            });
        }

        save_stream(resp.bytes_stream(), path).await
    }
}

/// Stream `body` to `path`. The bytes go to a `.part` file first, renamed
/// once complete and removed if anything fails.
async fn save_stream<S, B, E>(body: S, path: &Path) -> Result<u64, ApiError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    ApiError: From<E>,
{
    let partial = path.with_extension("part");
    match write_body(body, &partial).await {
        Ok(written) => {
            tokio::fs::rename(&partial, path).await?;
            Ok(written)
        }
        Err(e) => {
            let _ = tokio::fs::remove_file(&partial).await;
            Err(e)
        }
    }
}

async fn write_body<S, B, E>(body: S, path: &Path) -> Result<u64, ApiError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    ApiError: From<E>,
{
    let mut body = std::pin::pin!(body);
    let mut file = tokio::fs::File::create(path).await?;
    let mut written = 0u64;
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(chunk.as_ref()).await?;
        written += chunk.as_ref().len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

/// Keep alphanumerics, space, `-` and `_`; trim.
fn safe_name(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Archive file name for one link of one comic.
///
/// `{title}_{link}.{ext}`, or `{title}.{ext}` when the link name adds
/// nothing. The extension comes from the URL path when it is a known
/// archive type.
pub fn file_name_for(url: &str, title: &str, link_name: &str) -> String {
    let path = url::Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string());
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| ARCHIVE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or_else(|| "zip".to_string());

    let safe_title = safe_name(title);
    let safe_link = safe_name(link_name);
    if !safe_link.is_empty() && safe_link != safe_title {
        format!("{safe_title}_{safe_link}.{ext}")
    } else {
        format!("{safe_title}.{ext}")
    }
}
