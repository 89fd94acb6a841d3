//! Runtime configuration.
//!
//! Values come from environment variables (optionally via a `.env` file).
//! The TMDB key is the only secret and is never given a default.

use poster_client::{PlaceholderPosters, PosterSource, TmdbClient, DEFAULT_API_URL};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Env(#[from] envy::Error),

    #[error("TMDB_API_KEY is not set; export it or pass --no-posters")]
    MissingApiKey,

    #[error("Failed to build poster client: {0}")]
    PosterClient(#[from] poster_client::PosterError),
}

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// TMDB v3 API key (`TMDB_API_KEY`)
    #[serde(default)]
    pub tmdb_api_key: Option<String>,

    /// TMDB API root (`TMDB_API_URL`)
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Catalog artifact (`CATALOG_PATH`)
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,

    /// Similarity artifact (`SIMILARITY_PATH`)
    #[serde(default = "default_similarity_path")]
    pub similarity_path: PathBuf,

    /// Where to download the similarity artifact from when it is missing
    /// locally (`SIMILARITY_URL`)
    #[serde(default)]
    pub similarity_url: Option<String>,

    /// Timeout for every outgoing HTTP request, in seconds (`HTTP_TIMEOUT_SECS`)
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

fn default_tmdb_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("artifacts/movie_dict.json")
}

fn default_similarity_path() -> PathBuf {
    PathBuf::from("similarity.bin")
}

fn default_http_timeout_secs() -> u64 {
    10
}

impl Config {
    /// Load configuration from the process environment, reading `.env` first
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from explicit `(NAME, value)` pairs
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::from_iter(vars)?)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// The API key, treating an empty value as unset
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        self.tmdb_api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }

    /// Build the poster source: TMDB when online, placeholders when `offline`
    pub fn poster_source(&self, offline: bool) -> Result<Arc<dyn PosterSource>, ConfigError> {
        if offline {
            info!("Poster lookups disabled, using placeholders");
            return Ok(Arc::new(PlaceholderPosters));
        }

        let client = TmdbClient::new(self.api_key()?, self.http_timeout())?
            .with_api_url(self.tmdb_api_url.clone());
        Ok(Arc::new(client))
    }
}
