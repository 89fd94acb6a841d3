//! The poster capability injected into the orchestrator.

use crate::{PosterError, PLACEHOLDER_POSTER_URL};
use async_trait::async_trait;
use data_loader::MovieId;
use tracing::warn;

/// Something that can resolve a movie id to a poster image URL.
///
/// ## Design Note
/// - `Send + Sync` so a single source can sit behind an `Arc` in the
///   orchestrator
/// - `poster_url` reports failures; `poster_url_or_placeholder` is what the
///   rendering path calls, and it never fails
#[async_trait]
pub trait PosterSource: Send + Sync {
    /// Returns the name of this source (for logging)
    fn name(&self) -> &str;

    /// Look up the poster URL for `movie_id`
    async fn poster_url(&self, movie_id: MovieId) -> Result<String, PosterError>;

    /// Look up the poster, substituting the placeholder on any error
    async fn poster_url_or_placeholder(&self, movie_id: MovieId) -> String {
        match self.poster_url(movie_id).await {
            Ok(url) => url,
            Err(e) => {
                warn!(movie_id, source = self.name(), "Poster lookup failed: {}", e);
                PLACEHOLDER_POSTER_URL.to_string()
            }
        }
    }
}

/// Offline source that always answers with the placeholder
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderPosters;

#[async_trait]
impl PosterSource for PlaceholderPosters {
    fn name(&self) -> &str {
        "PlaceholderPosters"
    }

    async fn poster_url(&self, _movie_id: MovieId) -> Result<String, PosterError> {
        Ok(PLACEHOLDER_POSTER_URL.to_string())
    }
}
