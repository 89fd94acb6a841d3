//! Title-to-neighbours lookup over the loaded artifacts.
//!
//! `Recommender` is cheap to clone: it only holds an `Arc` to the artifacts
//! plus two small settings.

use crate::ranking::{self, ScoredMovie, SelfExclusion};
use data_loader::{Artifacts, LookupError};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Number of recommendations returned per query
pub const DEFAULT_LIMIT: usize = 5;

/// Ranks catalog movies by similarity to a query movie
#[derive(Debug, Clone)]
pub struct Recommender {
    /// Shared, read-only artifacts
    artifacts: Arc<Artifacts>,
    limit: usize,
    self_exclusion: SelfExclusion,
}

impl Recommender {
    /// Create a recommender returning `DEFAULT_LIMIT` results and dropping the
    /// first-ranked entry as the query itself.
    pub fn new(artifacts: Arc<Artifacts>) -> Self {
        Self {
            artifacts,
            limit: DEFAULT_LIMIT,
            self_exclusion: SelfExclusion::default(),
        }
    }

    /// Configure how many results to return (default: 5)
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Configure how the query is excluded (default: `DropFirstRanked`)
    pub fn with_self_exclusion(mut self, policy: SelfExclusion) -> Self {
        self.self_exclusion = policy;
        self
    }

    pub fn artifacts(&self) -> &Arc<Artifacts> {
        &self.artifacts
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Catalog index of the first movie titled exactly `title`
    pub fn resolve(&self, title: &str) -> Result<usize, LookupError> {
        self.artifacts.catalog().resolve(title)
    }

    /// Top neighbours of the movie at `index`, best first.
    ///
    /// Returns `limit` entries, or fewer when the catalog is smaller than
    /// `limit + 1`.
    #[instrument(skip(self))]
    pub fn recommend(&self, index: usize) -> Result<Vec<ScoredMovie>, LookupError> {
        let row = self
            .artifacts
            .similarity()
            .row(index)
            .ok_or(LookupError::IndexOutOfRange {
                index,
                len: self.artifacts.len(),
            })?;

        let ranked = ranking::rank_row(row);
        let top = ranking::select_top(ranked, index, self.self_exclusion, self.limit);

        debug!(
            "Top {} for index {}: [{}]",
            top.len(),
            index,
            ranking::describe(&top, |i| self.artifacts.catalog().get(i).map(|m| m.id))
        );
        Ok(top)
    }

    /// Resolve `title`, then recommend.
    ///
    /// Ranking never runs when the title is unknown.
    pub fn recommend_title(&self, title: &str) -> Result<(usize, Vec<ScoredMovie>), LookupError> {
        let index = self.resolve(title)?;
        let top = self.recommend(index)?;
        Ok((index, top))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{Catalog, MovieRecord, SimilarityMatrix};

    fn build_test_artifacts() -> Arc<Artifacts> {
        let catalog = Catalog::new(vec![
            MovieRecord { id: 1, title: "A".into(), year: Some(2000), rating: 7.0 },
            MovieRecord { id: 2, title: "B".into(), year: Some(2001), rating: 8.0 },
            MovieRecord { id: 3, title: "C".into(), year: Some(1999), rating: 6.5 },
        ]);
        let matrix = SimilarityMatrix::from_rows(vec![
            vec![1.0, 0.9, 0.2],
            vec![0.9, 1.0, 0.4],
            vec![0.2, 0.4, 1.0],
        ])
        .unwrap();
        Arc::new(Artifacts::new(catalog, matrix).unwrap())
    }

    #[test]
    fn test_recommend_title() {
        let recommender = Recommender::new(build_test_artifacts());
        let (index, top) = recommender.recommend_title("A").unwrap();
        assert_eq!(index, 0);
        assert_eq!(top.iter().map(|m| m.index).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(top[0].score, 0.9);
    }

    #[test]
    fn test_recommend_title_not_found() {
        let recommender = Recommender::new(build_test_artifacts());
        assert_eq!(
            recommender.recommend_title("Z"),
            Err(LookupError::NotFound { title: "Z".into() })
        );
    }

    #[test]
    fn test_recommend_out_of_range() {
        let recommender = Recommender::new(build_test_artifacts());
        assert_eq!(
            recommender.recommend(3),
            Err(LookupError::IndexOutOfRange { index: 3, len: 3 })
        );
    }

    #[test]
    fn test_with_limit() {
        let recommender = Recommender::new(build_test_artifacts()).with_limit(1);
        assert_eq!(recommender.limit(), 1);
        let top = recommender.recommend(1).unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].index, 0);
    }
}
