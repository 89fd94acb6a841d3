//! Pure ranking over one similarity row.
//!
//! ## Algorithm
//! 1. Pair every column of the row with its index, including the query itself
//! 2. Stable sort by score, descending. Equal scores keep ascending index order
//! 3. Remove the query according to the `SelfExclusion` policy
//! 4. Keep the first `limit` entries

use data_loader::MovieId;

/// One ranked neighbour of the query movie
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredMovie {
    /// Catalog index of the neighbour
    pub index: usize,
    /// Similarity between the query and this neighbour
    pub score: f32,
}

/// How the query movie is kept out of its own results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelfExclusion {
    /// Drop whatever lands at sorted position 0.
    ///
    /// Assumes self-similarity is the row maximum. If another movie ties with
    /// or beats the query, that movie is dropped and the query can appear in
    /// the results.
    #[default]
    DropFirstRanked,

    /// Remove the query by index, wherever it sorts.
    ///
    /// Differs from `DropFirstRanked` whenever self-similarity is not the
    /// unique maximum of the row.
    QueryIndex,
}

/// Pair each score with its column index and sort descending.
///
/// `sort_by` is stable, so ties stay in index order. Scores are compared
/// with `total_cmp`, so a NaN sorts ahead of every number instead of
/// scrambling the order of the rest.
pub fn rank_row(row: &[f32]) -> Vec<ScoredMovie> {
    let mut ranked: Vec<ScoredMovie> = row
        .iter()
        .enumerate()
        .map(|(index, &score)| ScoredMovie { index, score })
        .collect();

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}

/// Apply the self-exclusion policy to a ranked row and cut it to `limit`
pub fn select_top(
    ranked: Vec<ScoredMovie>,
    query: usize,
    policy: SelfExclusion,
    limit: usize,
) -> Vec<ScoredMovie> {
    match policy {
        SelfExclusion::DropFirstRanked => ranked.into_iter().skip(1).take(limit).collect(),
        SelfExclusion::QueryIndex => ranked
            .into_iter()
            .filter(|movie| movie.index != query)
            .take(limit)
            .collect(),
    }
}

/// Ids of ranked movies, for logging
pub(crate) fn describe(ranked: &[ScoredMovie], ids: impl Fn(usize) -> Option<MovieId>) -> String {
    ranked
        .iter()
        .map(|movie| match ids(movie.index) {
            Some(id) => format!("{}:{:.3}", id, movie.score),
            None => format!("#{}:{:.3}", movie.index, movie.score),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indices(ranked: &[ScoredMovie]) -> Vec<usize> {
        ranked.iter().map(|m| m.index).collect()
    }

    #[test]
    fn test_rank_row_sorts_descending() {
        let ranked = rank_row(&[0.1, 1.0, 0.5, 0.7]);
        assert_eq!(indices(&ranked), vec![1, 3, 2, 0]);
    }

    #[test]
    fn test_rank_row_ties_keep_index_order() {
        let ranked = rank_row(&[0.3, 1.0, 0.3, 0.9, 0.3]);
        assert_eq!(indices(&ranked), vec![1, 3, 0, 2, 4]);
    }

    #[test]
    fn test_rank_row_with_nan_keeps_numbers_descending() {
        let row: Vec<f32> = (0..200)
            .map(|i| if i % 3 == 0 { f32::NAN } else { (i * 37 % 101) as f32 / 100.0 })
            .collect();
        let ranked = rank_row(&row);
        assert_eq!(ranked.len(), 200);

        let finite: Vec<f32> = ranked
            .iter()
            .map(|m| m.score)
            .filter(|s| !s.is_nan())
            .collect();
        assert!(finite.windows(2).all(|w| w[0] >= w[1]));

        // NaNs lead, in index order
        assert!(ranked[..67].iter().all(|m| m.score.is_nan()));
        assert_eq!(ranked[0].index, 0);
        assert_eq!(ranked[1].index, 3);
    }

    #[test]
    fn test_drop_first_ranked_drops_position_zero() {
        let ranked = rank_row(&[1.0, 0.9, 0.2]);
        let top = select_top(ranked, 0, SelfExclusion::DropFirstRanked, 5);
        assert_eq!(indices(&top), vec![1, 2]);
    }

    #[test]
    fn test_drop_first_ranked_can_leak_query() {
        // Movie 2 beats the query's self-similarity, so it gets dropped and
        // the query itself shows up.
        let ranked = rank_row(&[1.0, 0.4, 1.5, 0.1]);
        let top = select_top(ranked, 0, SelfExclusion::DropFirstRanked, 5);
        assert_eq!(indices(&top), vec![0, 1, 3]);
    }

    #[test]
    fn test_drop_first_ranked_with_tie_on_self() {
        // Query is index 2; index 0 ties with it and sorts first.
        let ranked = rank_row(&[1.0, 0.5, 1.0]);
        let top = select_top(ranked, 2, SelfExclusion::DropFirstRanked, 5);
        assert_eq!(indices(&top), vec![2, 1]);
    }

    #[test]
    fn test_query_index_policy_removes_query() {
        let ranked = rank_row(&[1.0, 0.4, 1.5, 0.1]);
        let top = select_top(ranked, 0, SelfExclusion::QueryIndex, 5);
        assert_eq!(indices(&top), vec![2, 1, 3]);
    }

    #[test]
    fn test_select_top_respects_limit() {
        let ranked = rank_row(&[1.0, 0.9, 0.8, 0.7, 0.6, 0.5, 0.4, 0.3]);
        let top = select_top(ranked, 0, SelfExclusion::DropFirstRanked, 5);
        assert_eq!(indices(&top), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_single_movie_has_no_neighbours() {
        let ranked = rank_row(&[1.0]);
        assert!(select_top(ranked, 0, SelfExclusion::DropFirstRanked, 5).is_empty());
    }

    #[test]
    fn test_describe_uses_ids_when_known() {
        let ranked = vec![
            ScoredMovie { index: 0, score: 0.5 },
            ScoredMovie { index: 9, score: 0.25 },
        ];
        let text = describe(&ranked, |i| if i == 0 { Some(42) } else { None });
        assert_eq!(text, "42:0.500, #9:0.250");
    }
}
