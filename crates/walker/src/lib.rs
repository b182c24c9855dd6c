//! # Walker Crate
//!
//! This crate generates metapath-guided random walks over the movie graph
//! loaded by `data-loader`. The walks are the training corpus for skip-gram
//! style node embeddings.
//!
//! ## Components
//!
//! - **sampling**: Weighted, rating-similarity (softmax) and uniform choice
//! - **metapath**: Picks direct / genre / cast continuations at each movie
//! - **retry**: Bounded retry with a fallback, used by detour completion
//! - **generator**: One walk from a start user
//! - **driver**: All users, N walks each, parallel with deterministic output
//! - **random**: The [`RandomSource`] seam and the seeded [`WalkRng`]
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::HeteroGraph;
//! use walker::{BatchDriver, WalkConfig};
//! use std::io::BufWriter;
//!
//! let graph = HeteroGraph::load_from_files("processed_data".as_ref())?;
//! let config = WalkConfig::default().with_seed(42);
//!
//! let mut out = BufWriter::new(std::fs::File::create("walks.txt")?);
//! let summary = BatchDriver::new(&graph, config).run(&mut out)?;
//! println!("{} walks written", summary.walks_written);
//! ```

pub mod driver;
pub mod error;
pub mod generator;
pub mod metapath;
pub mod random;
pub mod retry;
pub mod sampling;

#[cfg(test)]
mod fixtures;

// Re-export main types
pub use driver::{BatchDriver, BatchSummary, WalkConfig};
pub use error::{Result, WalkError};
pub use generator::{Walk, WalkGenerator, WalkStats};
pub use metapath::{
    DEFAULT_METAPATH_PRIOR, DETOUR_RETRY_LIMIT, Detour, MIN_DETOUR_BUDGET, Metapath,
    MetapathPolicy,
};
pub use random::{RandomSource, WalkRng, entropy_seed};
pub use retry::{BoundedRetry, RetryOutcome};
