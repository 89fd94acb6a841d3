//! # Recommendation Orchestrator
//!
//! This module runs one "show recommendations" interaction:
//! 1. Resolve the selected title to a catalog index
//! 2. Rank its similarity row and keep the top 5
//! 3. Enrich each result with catalog metadata and a poster URL
//!
//! An unknown title is not an error here: it produces a `NotFound` outcome
//! carrying the message to show the user, and no poster lookups happen.
//! Poster failures are absorbed per item by the poster source.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, instrument};

use data_loader::{Artifacts, Catalog, LookupError, MovieId};
use poster_client::PosterSource;
use recommender::{Recommender, ScoredMovie};

/// Message shown when the selected title is not in the catalog
pub const NOT_FOUND_MESSAGE: &str = "Movie not found in the dataset. Please select another one.";

/// One result card
#[derive(Debug, Clone, PartialEq)]
pub struct MovieRecommendation {
    /// Catalog index
    pub index: usize,
    pub movie_id: MovieId,
    pub title: String,
    pub year: Option<u16>,
    pub rating: f64,
    /// Similarity to the query movie
    pub score: f32,
    pub poster_url: String,
}

impl MovieRecommendation {
    /// `"Year: 2009"`, or `"Year: N/A"` when the year is unknown
    pub fn year_caption(&self) -> String {
        match self.year {
            Some(year) => format!("Year: {}", year),
            None => "Year: N/A".to_string(),
        }
    }

    /// `"Rating: 7.2"`, always one decimal place
    pub fn rating_caption(&self) -> String {
        format!("Rating: {:.1}", self.rating)
    }
}

/// Result of one interaction
#[derive(Debug, Clone, PartialEq)]
pub enum RecommendationOutcome {
    /// The title resolved; cards are in ranked order
    Found(Vec<MovieRecommendation>),
    /// The title is not in the catalog
    NotFound { title: String, message: String },
}

impl RecommendationOutcome {
    /// Cards to render; empty for `NotFound`
    pub fn recommendations(&self) -> &[MovieRecommendation] {
        match self {
            RecommendationOutcome::Found(recommendations) => recommendations,
            RecommendationOutcome::NotFound { .. } => &[],
        }
    }

    /// User-facing message, if any
    pub fn message(&self) -> Option<&str> {
        match self {
            RecommendationOutcome::Found(_) => None,
            RecommendationOutcome::NotFound { message, .. } => Some(message),
        }
    }
}

/// Coordinates ranking and poster enrichment
#[derive(Clone)]
pub struct RecommendationOrchestrator {
    recommender: Recommender,
    posters: Arc<dyn PosterSource>,
}

impl RecommendationOrchestrator {
    /// Create an orchestrator with the default recommender settings
    ///
    /// # Arguments
    /// * `artifacts` - Shared catalog and similarity matrix
    /// * `posters` - Poster capability (TMDB, or placeholders offline)
    pub fn new(artifacts: Arc<Artifacts>, posters: Arc<dyn PosterSource>) -> Self {
        Self::with_recommender(Recommender::new(artifacts), posters)
    }

    /// Create an orchestrator around a pre-configured recommender
    pub fn with_recommender(recommender: Recommender, posters: Arc<dyn PosterSource>) -> Self {
        Self {
            recommender,
            posters,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        self.recommender.artifacts().catalog()
    }

    /// Main entry point: recommendations for the selected title
    #[instrument(skip(self))]
    pub async fn get_recommendations(&self, title: &str) -> Result<RecommendationOutcome> {
        let start_time = Instant::now();

        let ranked = match self.recommender.recommend_title(title) {
            Ok((index, ranked)) => {
                info!("Resolved '{}' to index {}", title, index);
                ranked
            }
            Err(LookupError::NotFound { title }) => {
                info!("Title '{}' not found in catalog", title);
                return Ok(RecommendationOutcome::NotFound {
                    title,
                    message: NOT_FOUND_MESSAGE.to_string(),
                });
            }
            Err(e) => return Err(e).context("Failed to rank similar movies"),
        };

        let recommendations = self.enrich(ranked).await?;

        info!(
            "Built {} recommendations for '{}' in {:.2?}",
            recommendations.len(),
            title,
            start_time.elapsed()
        );
        Ok(RecommendationOutcome::Found(recommendations))
    }

    /// Attach catalog metadata and posters, one movie at a time, in rank order
    async fn enrich(&self, ranked: Vec<ScoredMovie>) -> Result<Vec<MovieRecommendation>> {
        let catalog = self.catalog();
        let mut recommendations = Vec::with_capacity(ranked.len());

        for scored in ranked {
            let movie = catalog
                .get(scored.index)
                .with_context(|| format!("Ranked index {} missing from catalog", scored.index))?;

            let poster_url = self.posters.poster_url_or_placeholder(movie.id).await;

            recommendations.push(MovieRecommendation {
                index: scored.index,
                movie_id: movie.id,
                title: movie.title.clone(),
                year: movie.year,
                rating: movie.rating,
                score: scored.score,
                poster_url,
            });
        }

        Ok(recommendations)
    }
}
