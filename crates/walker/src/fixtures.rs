//! Small hand-built graphs shared by the unit tests.

use data_loader::{GraphBuilder, HeteroGraph, Membership, NodeCounts};

/// Five movies, one genre, one cast member, two users
///
/// | movie | genre | cast | rated by          |
/// |-------|-------|------|-------------------|
/// | 0     | yes   | yes  | user 0 (4.0)      |
/// | 1     | yes   |      | user 1 (3.0)      |
/// | 2     | yes   | yes  | nobody            |
/// | 3     |       | yes  | user 1 (5.0)      |
/// | 4     |       |      | user 0 (2.0)      |
///
/// Genre 0 lists movies `[0, 1, 2]`, cast 0 lists movies `[0, 2, 3]`.
pub(crate) fn sparse_graph() -> HeteroGraph {
    let mut builder = GraphBuilder::with_counts(NodeCounts::new(5, 1, 1, 2)).unwrap();
    for movie in [0, 1, 2] {
        builder.add_membership(Membership::Genre, movie, 0).unwrap();
    }
    for movie in [0, 2, 3] {
        builder.add_membership(Membership::Cast, movie, 0).unwrap();
    }
    builder.add_rating(0, 0, 4.0).unwrap();
    builder.add_rating(1, 1, 3.0).unwrap();
    builder.add_rating(1, 3, 5.0).unwrap();
    builder.add_rating(0, 4, 2.0).unwrap();
    builder.build().unwrap()
}
