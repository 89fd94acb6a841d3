//! Similar-movie lookup.
//!
//! This crate provides:
//! - `rank_row` / `select_top`: the pure ranking over one similarity row
//! - `Recommender`: title resolution plus ranking over shared artifacts
//!
//! Nothing here touches the network; enriching results with posters is the
//! orchestrator's job.
//!
//! ## Example Usage
//! ```ignore
//! use recommender::Recommender;
//! use std::sync::Arc;
//!
//! let recommender = Recommender::new(Arc::new(artifacts));
//! let (index, top) = recommender.recommend_title("Avatar")?;
//! for movie in top {
//!     println!("{} {:.3}", movie.index, movie.score);
//! }
//! ```

pub mod ranking;
pub mod recommender;

// Re-export main types
pub use ranking::{rank_row, select_top, ScoredMovie, SelfExclusion};
pub use recommender::{Recommender, DEFAULT_LIMIT};
