//! # Data Loader Crate
//!
//! Loads the two startup artifacts of the recommender: the movie catalog and
//! the precomputed similarity matrix.
//!
//! ## Main Components
//!
//! - **types**: `MovieRecord`, `Catalog`, `SimilarityMatrix`, `Artifacts`
//! - **parser**: JSON catalog and JSON/binary similarity formats
//! - **index**: parallel loading plus validation
//! - **error**: load and lookup errors
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::Artifacts;
//! use std::path::Path;
//!
//! let artifacts = Artifacts::load_from_files(
//!     Path::new("artifacts/movie_dict.json"),
//!     Path::new("similarity.bin"),
//! )?;
//!
//! let index = artifacts.catalog().resolve("Avatar")?;
//! let row = artifacts.similarity().row(index).unwrap();
//! ```

pub mod error;
pub mod types;
pub mod parser;
pub mod index;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, LookupError, Result};
pub use types::{
    MovieId,
    MovieRecord,
    Catalog,
    SimilarityMatrix,
    Artifacts,
};
