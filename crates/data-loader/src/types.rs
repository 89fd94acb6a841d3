//! Core domain types for the movie catalog and similarity matrix.
//!
//! Everything here is immutable once built. The position of a record in the
//! `Catalog` is the row/column index of that movie in the `SimilarityMatrix`,
//! and `Artifacts` is the only way to pair the two, so the alignment is
//! checked exactly once.

use crate::error::{DataLoadError, LookupError, Result};

// =============================================================================
// Type Aliases
// =============================================================================

/// External movie database identifier (TMDB id)
pub type MovieId = u32;

// =============================================================================
// Movie Records
// =============================================================================

/// A single movie in the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct MovieRecord {
    pub id: MovieId,
    pub title: String,
    /// Release year, when the source data has one
    pub year: Option<u16>,
    /// Average vote on the external database
    pub rating: f64,
}

/// Ordered collection of movie records.
///
/// Titles are not required to be unique; `resolve` always picks the first
/// match.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    movies: Vec<MovieRecord>,
}

impl Catalog {
    pub fn new(movies: Vec<MovieRecord>) -> Self {
        Self { movies }
    }

    /// Position of the first record whose title equals `title` exactly.
    ///
    /// No case folding or trimming is done.
    pub fn resolve(&self, title: &str) -> std::result::Result<usize, LookupError> {
        self.movies
            .iter()
            .position(|movie| movie.title == title)
            .ok_or_else(|| LookupError::NotFound {
                title: title.to_string(),
            })
    }

    /// Get a movie by catalog index
    pub fn get(&self, index: usize) -> Option<&MovieRecord> {
        self.movies.get(index)
    }

    pub fn records(&self) -> &[MovieRecord] {
        &self.movies
    }

    /// All titles in catalog order
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.movies.iter().map(|movie| movie.title.as_str())
    }

    /// Case-insensitive substring search, returning `(index, record)` pairs
    /// in catalog order. Only meant for narrowing a selection list.
    pub fn search(&self, fragment: &str) -> Vec<(usize, &MovieRecord)> {
        let needle = fragment.to_lowercase();
        self.movies
            .iter()
            .enumerate()
            .filter(|(_, movie)| movie.title.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }
}

// =============================================================================
// Similarity Matrix
// =============================================================================

/// Square matrix of precomputed similarity scores, stored row-major
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimilarityMatrix {
    size: usize,
    scores: Vec<f32>,
}

impl SimilarityMatrix {
    /// Build from nested rows, rejecting anything that isn't square
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let size = rows.len();
        let mut scores = Vec::with_capacity(size * size);
        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != size {
                return Err(DataLoadError::NotSquare {
                    row,
                    expected: size,
                    found: values.len(),
                });
            }
            scores.extend(values);
        }
        Ok(Self { size, scores })
    }

    /// Build from a flat row-major buffer of `size * size` scores
    pub fn from_flat(size: usize, scores: Vec<f32>) -> Result<Self> {
        let expected = size.checked_mul(size).ok_or_else(|| DataLoadError::InvalidValue {
            field: "matrix size".to_string(),
            value: size.to_string(),
        })?;
        if scores.len() != expected {
            return Err(DataLoadError::InvalidValue {
                field: "score count".to_string(),
                value: format!("{} (expected {})", scores.len(), expected),
            });
        }
        Ok(Self { size, scores })
    }

    /// Number of rows (and columns)
    pub fn size(&self) -> usize {
        self.size
    }

    /// One row of scores, `None` if out of range
    pub fn row(&self, index: usize) -> Option<&[f32]> {
        if index >= self.size {
            return None;
        }
        let start = index * self.size;
        Some(&self.scores[start..start + self.size])
    }

    pub fn get(&self, row: usize, column: usize) -> Option<f32> {
        self.row(row)?.get(column).copied()
    }

    pub(crate) fn as_flat(&self) -> &[f32] {
        &self.scores
    }
}

// =============================================================================
// Artifacts - the loaded, aligned pair
// =============================================================================

/// Catalog and similarity matrix, guaranteed to have matching dimensions.
///
/// Built once at startup and shared (usually behind an `Arc`) with everything
/// that answers queries.
#[derive(Debug, Clone)]
pub struct Artifacts {
    catalog: Catalog,
    similarity: SimilarityMatrix,
}

impl Artifacts {
    /// Pair a catalog with its matrix, failing if they are not aligned
    pub fn new(catalog: Catalog, similarity: SimilarityMatrix) -> Result<Self> {
        if catalog.len() != similarity.size() {
            return Err(DataLoadError::DimensionMismatch {
                catalog: catalog.len(),
                matrix: similarity.size(),
            });
        }
        Ok(Self {
            catalog,
            similarity,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn similarity(&self) -> &SimilarityMatrix {
        &self.similarity
    }

    /// Number of movies (same for catalog and matrix)
    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }
}
