//! Server crate for the similar-movie recommender.
//!
//! This crate wires the pieces together:
//! - `config`: environment-driven settings and the poster source they imply
//! - `bootstrap`: download-if-missing plus artifact loading at startup
//! - `orchestrator`: resolve, rank, and enrich one selection into result cards

pub mod bootstrap;
pub mod config;
pub mod orchestrator;

pub use bootstrap::{ensure_artifact, load_artifacts, load_from_config, BootstrapError, Fetched};
pub use config::{Config, ConfigError};
pub use orchestrator::{
    MovieRecommendation, RecommendationOrchestrator, RecommendationOutcome, NOT_FOUND_MESSAGE,
};
