//! TMDB-backed poster source.
//!
//! One request per movie, no retries. The request timeout is the only bound
//! on how long a lookup can block.

use crate::source::PosterSource;
use crate::{join_url, PosterError, DEFAULT_API_URL, POSTER_BASE_URL};
use async_trait::async_trait;
use data_loader::MovieId;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// The part of `/movie/{id}` we care about
#[derive(Debug, Deserialize)]
struct MovieDetails {
    #[serde(default)]
    poster_path: Option<String>,
}

/// Client for TMDB poster lookups
#[derive(Clone)]
pub struct TmdbClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl std::fmt::Debug for TmdbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TmdbClient")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl TmdbClient {
    /// Create a client against the public TMDB API.
    ///
    /// # Arguments
    /// * `api_key` - TMDB v3 API key
    /// * `timeout` - per-request timeout
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, PosterError> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;
        info!("Created TMDB client (timeout {:?})", timeout);
        Ok(Self {
            http_client,
            api_key: api_key.into(),
            api_url: DEFAULT_API_URL.to_string(),
        })
    }

    /// Point the client at a different API root (default: TMDB v3)
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    async fn fetch_details(&self, movie_id: MovieId) -> Result<MovieDetails, PosterError> {
        let url = format!("{}/movie/{}", self.api_url.trim_end_matches('/'), movie_id);

        // The key travels in the query string; strip URLs from errors so it
        // never reaches the logs.
        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("language", "en-US")])
            .send()
            .await
            .map_err(|e| PosterError::Http(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PosterError::Status {
                movie_id,
                status: status.as_u16(),
            });
        }

        response
            .json::<MovieDetails>()
            .await
            .map_err(|e| PosterError::Http(e.without_url()))
    }
}

#[async_trait]
impl PosterSource for TmdbClient {
    fn name(&self) -> &str {
        "TmdbClient"
    }

    async fn poster_url(&self, movie_id: MovieId) -> Result<String, PosterError> {
        debug!("Fetching poster for movie {}", movie_id);
        let details = self.fetch_details(movie_id).await?;

        let poster_path = details
            .poster_path
            .filter(|path| !path.is_empty())
            .ok_or(PosterError::MissingPoster { movie_id })?;

        Ok(join_url(POSTER_BASE_URL, &poster_path))
    }
}
