//! Loading and validating the artifact pair.
//!
//! The catalog and the similarity matrix are independent files, so they are
//! parsed in parallel with `rayon::join`. Validation then checks the two
//! things lookups rely on: the dimensions line up, and every score is finite
//! (NaN would make the descending sort meaningless).

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use rayon::prelude::*;
use std::path::Path;
use tracing::{debug, info};

impl Artifacts {
    /// Load the catalog and similarity artifacts from disk.
    ///
    /// Steps:
    /// 1. Parse both files in parallel
    /// 2. Check catalog length against matrix size
    /// 3. Scan every row for non-finite scores
    pub fn load_from_files(catalog_path: &Path, similarity_path: &Path) -> Result<Self> {
        info!(
            catalog = %catalog_path.display(),
            similarity = %similarity_path.display(),
            "Loading artifacts"
        );

        let (movies, similarity) = rayon::join(
            || parser::parse_catalog(catalog_path),
            || parser::parse_similarity(similarity_path),
        );
        let movies = movies?;
        let similarity = similarity?;

        debug!(
            "Parsed {} catalog records and a {}x{} matrix",
            movies.len(),
            similarity.size(),
            similarity.size()
        );

        let artifacts = Artifacts::new(Catalog::new(movies), similarity)?;
        artifacts.validate()?;

        info!("Loaded {} movies", artifacts.len());
        Ok(artifacts)
    }

    /// Validate score values.
    ///
    /// Dimension alignment is already enforced by `Artifacts::new`; this
    /// checks that no score is NaN or infinite.
    pub fn validate(&self) -> Result<()> {
        let size = self.similarity().size().max(1);
        let bad = self
            .similarity()
            .as_flat()
            .par_chunks(size)
            .enumerate()
            .find_map_first(|(row, scores)| {
                scores
                    .iter()
                    .position(|score| !score.is_finite())
                    .map(|column| (row, column))
            });

        match bad {
            Some((row, column)) => Err(DataLoadError::NonFiniteScore { row, column }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const CATALOG: &str = r#"{
        "movie_id": [1, 2, 3],
        "title": ["A", "B", "C"],
        "year": [2000, 2001, 1999],
        "vote_average": [7.0, 8.0, 6.5]
    }"#;

    #[test]
    fn test_load_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let catalog_path = dir.path().join("movie_dict.json");
        let similarity_path = dir.path().join("similarity.json");
        fs::write(&catalog_path, CATALOG).unwrap();
        fs::write(
            &similarity_path,
            "[[1.0, 0.9, 0.2], [0.9, 1.0, 0.4], [0.2, 0.4, 1.0]]",
        )
        .unwrap();

        let artifacts = Artifacts::load_from_files(&catalog_path, &similarity_path).unwrap();
        assert_eq!(artifacts.len(), 3);
        assert_eq!(artifacts.catalog().get(1).unwrap().title, "B");
        assert_eq!(artifacts.similarity().get(0, 1), Some(0.9));
    }

    #[test]
    fn test_load_binary_matrix() {
        let dir = tempfile::tempdir().unwrap();
        let catalog_path = dir.path().join("movie_dict.json");
        let similarity_path = dir.path().join("similarity.bin");
        fs::write(&catalog_path, CATALOG).unwrap();

        let matrix = SimilarityMatrix::from_rows(vec![
            vec![1.0, 0.9, 0.2],
            vec![0.9, 1.0, 0.4],
            vec![0.2, 0.4, 1.0],
        ])
        .unwrap();
        parser::write_similarity_bin(&similarity_path, &matrix).unwrap();

        let artifacts = Artifacts::load_from_files(&catalog_path, &similarity_path).unwrap();
        assert_eq!(artifacts.similarity(), &matrix);
    }

    #[test]
    fn test_load_rejects_misaligned_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let catalog_path = dir.path().join("movie_dict.json");
        let similarity_path = dir.path().join("similarity.json");
        fs::write(&catalog_path, CATALOG).unwrap();
        fs::write(&similarity_path, "[[1.0, 0.5], [0.5, 1.0]]").unwrap();

        let err = Artifacts::load_from_files(&catalog_path, &similarity_path).unwrap_err();
        assert!(matches!(
            err,
            DataLoadError::DimensionMismatch { catalog: 3, matrix: 2 }
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let catalog_path = dir.path().join("movie_dict.json");
        fs::write(&catalog_path, CATALOG).unwrap();

        let err = Artifacts::load_from_files(&catalog_path, &dir.path().join("nope.bin"))
            .unwrap_err();
        assert!(matches!(err, DataLoadError::FileNotFound { .. }));
    }

    #[test]
    fn test_validate_rejects_non_finite_scores() {
        let catalog = Catalog::new(vec![
            MovieRecord { id: 1, title: "A".into(), year: None, rating: 5.0 },
            MovieRecord { id: 2, title: "B".into(), year: None, rating: 5.0 },
        ]);
        let matrix =
            SimilarityMatrix::from_rows(vec![vec![1.0, 0.5], vec![f32::NAN, 1.0]]).unwrap();
        let artifacts = Artifacts::new(catalog, matrix).unwrap();
        assert!(matches!(
            artifacts.validate(),
            Err(DataLoadError::NonFiniteScore { row: 1, column: 0 })
        ));
    }
}
