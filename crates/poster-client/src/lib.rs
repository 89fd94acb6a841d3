//! Poster lookup client for the TMDB movie metadata API.
//!
//! This crate turns a catalog movie id into a displayable poster URL. It
//! handles:
//! - Calling `GET /movie/{id}` with the API key credential
//! - Extracting `poster_path` and joining it onto the image base URL
//! - Falling back to a fixed placeholder image on any failure
//!
//! Callers depend on the `PosterSource` trait, so ranking and rendering can
//! be tested with `PlaceholderPosters` and no network.

pub mod source;
pub mod tmdb;

pub use source::{PlaceholderPosters, PosterSource};
pub use tmdb::TmdbClient;

use data_loader::MovieId;
use thiserror::Error;

/// Default TMDB API root
pub const DEFAULT_API_URL: &str = "https://api.themoviedb.org/3";

/// Base URL poster paths are appended to
pub const POSTER_BASE_URL: &str = "https://image.tmdb.org/t/p/w500/";

/// Image shown when no poster can be fetched
pub const PLACEHOLDER_POSTER_URL: &str = "https://placehold.co/500x750/333/FFFFFF?text=No+Poster";

/// Errors that can occur when looking up a poster
#[derive(Error, Debug)]
pub enum PosterError {
    /// Network, TLS, timeout, or body decoding failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-2xx status
    #[error("Movie {movie_id}: API returned status {status}")]
    Status { movie_id: MovieId, status: u16 },

    /// The response had no usable `poster_path`
    #[error("Movie {movie_id} has no poster")]
    MissingPoster { movie_id: MovieId },
}

/// Join a base URL and a path with exactly one `/` between them.
///
/// Plain concatenation of `POSTER_BASE_URL` and a TMDB `poster_path` would
/// give `w500//file.jpg`; the duplicate slash is collapsed here.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
