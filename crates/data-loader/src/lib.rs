//! # Data Loader Crate
//!
//! This crate loads the preprocessed movie/genre/cast/user graph and holds it
//! in memory for walk generation.
//!
//! ## Main Components
//!
//! - **types**: Node types, typed handles, the global id layout, relations
//! - **graph**: The read-only [`HeteroGraph`] store and its [`GraphBuilder`]
//! - **parser**: Parse the count record, membership tables and ratings
//! - **loader**: Build a validated graph from a data directory
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{HeteroGraph, NodeType, Relation};
//! use std::path::Path;
//!
//! let graph = HeteroGraph::load_from_files(Path::new("processed_data"))?;
//!
//! let users = graph.count(NodeType::User);
//! let rated = graph.neighbors(Relation::UserMovie, 0);
//! println!("{} users, user 0 rated {} movies", users, rated.len());
//! ```

pub mod error;
pub mod graph;
pub mod loader;
pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use graph::{GraphBuilder, HeteroGraph, Membership};
pub use loader::write_type_map;
pub use types::{
    // Type aliases
    GlobalId,
    LocalIndex,
    RatingValue,
    // Core types
    NodeCounts,
    NodeHandle,
    NodeLayout,
    NodeType,
    Relation,
};
