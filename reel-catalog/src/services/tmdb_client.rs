//! TMDB API client
//!
//! Read-only access to the external movie catalog: paginated discover
//! queries sorted by revenue and per-movie credits lookups. Every request
//! carries its own timeout; a timeout is reported like any other failure.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const TMDB_IMAGE_BASE_W500: &str = "https://image.tmdb.org/t/p/w500";
const USER_AGENT: &str = concat!("reel-catalog/", env!("CARGO_PKG_VERSION"));

/// Number of cast names kept per movie
pub const TOP_CAST: usize = 6;

/// TMDB client errors
#[derive(Debug, Error)]
pub enum TmdbError {
    #[error("TMDB API key not configured")]
    MissingApiKey,

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("status {0}")]
    Status(u16),

    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for TmdbError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TmdbError::Timeout
        } else if e.is_decode() {
            TmdbError::Parse(e.to_string())
        } else {
            TmdbError::Network(e.to_string())
        }
    }
}

/// One result of a discover query
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DiscoverMovie {
    /// TMDB movie id
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub original_title: Option<String>,
    /// Release date in YYYY-MM-DD format
    #[serde(default)]
    pub release_date: Option<String>,
    /// Image path fragment, e.g. `/abc.jpg`
    #[serde(default)]
    pub poster_path: Option<String>,
}

impl DiscoverMovie {
    /// External id used as the catalog dedup key
    pub fn external_id(&self) -> String {
        self.id.to_string()
    }

    /// Localized title, falling back to the original title
    pub fn display_title(&self) -> Option<String> {
        [&self.title, &self.original_title]
            .into_iter()
            .flatten()
            .map(|t| t.trim())
            .find(|t| !t.is_empty())
            .map(str::to_string)
    }

    /// Release year (first four characters of the release date)
    pub fn year(&self) -> Option<String> {
        let year: String = self.release_date.as_deref()?.chars().take(4).collect();
        (!year.is_empty()).then_some(year)
    }
}

#[derive(Debug, Deserialize)]
struct DiscoverResponse {
    #[serde(default)]
    results: Vec<DiscoverMovie>,
}

#[derive(Debug, Deserialize)]
struct MovieDetails {
    #[serde(default)]
    poster_path: Option<String>,
}

/// Credits of a movie
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub crew: Vec<CrewMember>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CastMember {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CrewMember {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub job: Option<String>,
}

/// Director, producer and top cast of a movie
///
/// `Default` is the empty enrichment used when the credits lookup fails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enrichment {
    pub director: Option<String>,
    pub producer: Option<String>,
    /// Up to [`TOP_CAST`] names joined with ", "
    pub cast: Option<String>,
}

impl Enrichment {
    /// Extract enrichment fields from credits
    ///
    /// The director is the last crew member credited as "Director", the
    /// producer the first one credited as "Producer".
    pub fn from_credits(credits: &Credits) -> Self {
        let crew_named = |job: &'static str| {
            credits
                .crew
                .iter()
                .filter(move |c| c.job.as_deref() == Some(job))
                .filter_map(|c| c.name.clone())
                .filter(|n| !n.trim().is_empty())
        };

        let names: Vec<&str> = credits
            .cast
            .iter()
            .take(TOP_CAST)
            .filter_map(|c| c.name.as_deref())
            .filter(|n| !n.trim().is_empty())
            .collect();

        Self {
            director: crew_named("Director").last(),
            producer: crew_named("Producer").next(),
            cast: (!names.is_empty()).then(|| names.join(", ")),
        }
    }
}

/// Poster URL for a TMDB image path, or the catalog default
pub fn poster_url_from_path(path: Option<&str>) -> String {
    match path.map(str::trim).filter(|p| !p.is_empty()) {
        Some(path) => format!("{}{}", TMDB_IMAGE_BASE_W500, path),
        None => crate::db::movies::DEFAULT_POSTER_URL.to_string(),
    }
}

/// External catalog operations used by the import job and the admin API
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// An access credential is available
    fn is_configured(&self) -> bool;

    /// One page of movies sorted by descending revenue
    async fn discover_page(&self, page: u32) -> Result<Vec<DiscoverMovie>, TmdbError>;

    /// Credits of one movie
    async fn fetch_credits(&self, external_id: &str) -> Result<Credits, TmdbError>;

    /// Poster path of one movie, if TMDB has one
    async fn fetch_poster_path(&self, external_id: &str) -> Result<Option<String>, TmdbError>;
}

/// TMDB connection settings
#[derive(Debug, Clone)]
pub struct TmdbConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub discover_timeout: Duration,
    pub credits_timeout: Duration,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: TMDB_BASE_URL.to_string(),
            discover_timeout: Duration::from_secs(20),
            credits_timeout: Duration::from_secs(15),
        }
    }
}

/// TMDB API client
pub struct TmdbClient {
    http_client: reqwest::Client,
    config: TmdbConfig,
}

impl TmdbClient {
    pub fn new(config: TmdbConfig) -> Result<Self, TmdbError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TmdbError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            config,
        })
    }

    fn api_key(&self) -> Result<&str, TmdbError> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(TmdbError::MissingApiKey)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn get_json<T>(
        &self,
        path: &str,
        query: &[(&str, String)],
        timeout: Duration,
    ) -> Result<T, TmdbError>
    where
        T: serde::de::DeserializeOwned,
    {
        let api_key = self.api_key()?;

        let response = self
            .http_client
            .get(self.url(path))
            .query(&[("api_key", api_key)])
            .query(query)
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TmdbError::Status(status.as_u16()));
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl CatalogSource for TmdbClient {
    fn is_configured(&self) -> bool {
        self.api_key().is_ok()
    }

    async fn discover_page(&self, page: u32) -> Result<Vec<DiscoverMovie>, TmdbError> {
        tracing::debug!(page, "Querying TMDB discover");

        let response: DiscoverResponse = self
            .get_json(
                "/discover/movie",
                &[
                    ("sort_by", "revenue.desc".to_string()),
                    ("page", page.to_string()),
                    ("language", "en-US".to_string()),
                ],
                self.config.discover_timeout,
            )
            .await?;

        tracing::debug!(page, results = response.results.len(), "TMDB discover page received");
        Ok(response.results)
    }

    async fn fetch_credits(&self, external_id: &str) -> Result<Credits, TmdbError> {
        tracing::debug!(external_id, "Querying TMDB credits");
        self.get_json(
            &format!("/movie/{}/credits", external_id),
            &[],
            self.config.credits_timeout,
        )
        .await
    }

    async fn fetch_poster_path(&self, external_id: &str) -> Result<Option<String>, TmdbError> {
        let details: MovieDetails = self
            .get_json(
                &format!("/movie/{}", external_id),
                &[],
                self.config.credits_timeout,
            )
            .await?;
        Ok(details.poster_path.filter(|p| !p.trim().is_empty()))
    }
}
