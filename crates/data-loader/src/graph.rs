//! The in-memory heterogeneous graph store.
//!
//! [`HeteroGraph`] owns one adjacency table per [`Relation`] plus the two
//! rating tables that run parallel to the user/movie tables. It is built once
//! through [`GraphBuilder`] and is read-only afterward, so walk generation can
//! share it across threads by plain reference.

use crate::error::{DataLoadError, Result};
use crate::types::*;
use tracing::debug;

/// Neighbour lists indexed by source local index
type AdjacencyTable = Vec<Vec<LocalIndex>>;

/// Ratings aligned 1:1 with an [`AdjacencyTable`]
type RatingTable = Vec<Vec<RatingValue>>;

/// Read-only typed adjacency and rating tables
#[derive(Debug, Clone)]
pub struct HeteroGraph {
    layout: NodeLayout,

    movie_cast: AdjacencyTable,
    cast_movie: AdjacencyTable,
    movie_genre: AdjacencyTable,
    genre_movie: AdjacencyTable,
    user_movie: AdjacencyTable,
    movie_user: AdjacencyTable,

    /// Rating of `user_movie[u][k]`
    user_movie_ratings: RatingTable,
    /// Rating of `movie_user[m][k]`
    movie_user_ratings: RatingTable,
}

impl HeteroGraph {
    pub fn layout(&self) -> &NodeLayout {
        &self.layout
    }

    /// Number of nodes of one type
    pub fn count(&self, kind: NodeType) -> u32 {
        self.layout.count(kind)
    }

    fn table(&self, relation: Relation) -> &AdjacencyTable {
        match relation {
            Relation::MovieCast => &self.movie_cast,
            Relation::CastMovie => &self.cast_movie,
            Relation::MovieGenre => &self.movie_genre,
            Relation::GenreMovie => &self.genre_movie,
            Relation::UserMovie => &self.user_movie,
            Relation::MovieUser => &self.movie_user,
        }
    }

    /// Neighbours of `index` along `relation`, as local indices of the target type
    ///
    /// Returns an empty slice for an index outside the source range.
    pub fn neighbors(&self, relation: Relation, index: LocalIndex) -> &[LocalIndex] {
        self.table(relation)
            .get(index as usize)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Ratings aligned with [`neighbors`](Self::neighbors)
    ///
    /// Only user/movie relations carry ratings; any other relation yields an
    /// empty slice.
    pub fn ratings(&self, relation: Relation, index: LocalIndex) -> &[RatingValue] {
        if !relation.is_rated() {
            return &[];
        }
        let table = if relation == Relation::UserMovie {
            &self.user_movie_ratings
        } else {
            &self.movie_user_ratings
        };
        table
            .get(index as usize)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn has_any_neighbor(&self, relation: Relation, index: LocalIndex) -> bool {
        !self.neighbors(relation, index).is_empty()
    }

    /// Number of directed edges stored for a relation
    pub fn edge_count(&self, relation: Relation) -> usize {
        self.table(relation).iter().map(|v| v.len()).sum()
    }

    /// Users with at least one rated movie, ascending
    pub fn active_users(&self) -> impl Iterator<Item = LocalIndex> + '_ {
        (0..self.count(NodeType::User)).filter(|&u| self.has_any_neighbor(Relation::UserMovie, u))
    }

    /// Check the structural invariants of the tables
    ///
    /// - every table has one row per source node
    /// - every neighbour index is inside the target range
    /// - rating rows have the same length as their adjacency rows
    /// - each symmetric pair holds the same number of edges
    pub fn validate(&self) -> Result<()> {
        for relation in Relation::ALL {
            let table = self.table(relation);
            let rows = self.count(relation.source()) as usize;
            if table.len() != rows {
                return Err(DataLoadError::ValidationError(format!(
                    "{:?} table has {} rows, expected {}",
                    relation,
                    table.len(),
                    rows
                )));
            }

            let target_count = self.count(relation.target());
            for row in table {
                if let Some(&bad) = row.iter().find(|&&n| n >= target_count) {
                    return Err(DataLoadError::IndexOutOfBounds {
                        kind: relation.target(),
                        index: bad,
                        count: target_count,
                    });
                }
            }

            if self.edge_count(relation) != self.edge_count(relation.reverse()) {
                return Err(DataLoadError::ValidationError(format!(
                    "{:?} and {:?} disagree on edge count",
                    relation,
                    relation.reverse()
                )));
            }
        }

        for (relation, ratings) in [
            (Relation::UserMovie, &self.user_movie_ratings),
            (Relation::MovieUser, &self.movie_user_ratings),
        ] {
            let table = self.table(relation);
            let aligned = ratings.len() == table.len()
                && ratings.iter().zip(table).all(|(r, a)| r.len() == a.len());
            if !aligned {
                return Err(DataLoadError::ValidationError(format!(
                    "{:?} ratings are not aligned with adjacency",
                    relation
                )));
            }
        }

        Ok(())
    }
}

/// Which membership table a movie attribute belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Cast,
    Genre,
}

impl Membership {
    pub fn node_type(self) -> NodeType {
        match self {
            Membership::Cast => NodeType::Cast,
            Membership::Genre => NodeType::Genre,
        }
    }
}

/// Incremental constructor for [`HeteroGraph`]
///
/// Every record is inserted into both directions of its relation at once,
/// which keeps the symmetric tables consistent by construction.
#[derive(Debug)]
pub struct GraphBuilder {
    layout: NodeLayout,
    movie_cast: AdjacencyTable,
    cast_movie: AdjacencyTable,
    movie_genre: AdjacencyTable,
    genre_movie: AdjacencyTable,
    user_movie: AdjacencyTable,
    movie_user: AdjacencyTable,
    user_movie_ratings: RatingTable,
    movie_user_ratings: RatingTable,
}

impl GraphBuilder {
    /// Create a builder with one empty row per node of each type
    pub fn new(layout: NodeLayout) -> Self {
        let rows = |kind: NodeType| layout.count(kind) as usize;
        Self {
            layout,
            movie_cast: vec![Vec::new(); rows(NodeType::Movie)],
            cast_movie: vec![Vec::new(); rows(NodeType::Cast)],
            movie_genre: vec![Vec::new(); rows(NodeType::Movie)],
            genre_movie: vec![Vec::new(); rows(NodeType::Genre)],
            user_movie: vec![Vec::new(); rows(NodeType::User)],
            movie_user: vec![Vec::new(); rows(NodeType::Movie)],
            user_movie_ratings: vec![Vec::new(); rows(NodeType::User)],
            movie_user_ratings: vec![Vec::new(); rows(NodeType::Movie)],
        }
    }

    /// Shorthand for `GraphBuilder::new(NodeLayout::new(counts)?)`
    pub fn with_counts(counts: NodeCounts) -> Result<Self> {
        Ok(Self::new(NodeLayout::new(counts)?))
    }

    pub fn layout(&self) -> &NodeLayout {
        &self.layout
    }

    /// Link a movie to a genre or cast member (local indices)
    pub fn add_membership(
        &mut self,
        membership: Membership,
        movie: LocalIndex,
        member: LocalIndex,
    ) -> Result<&mut Self> {
        self.layout.handle(NodeType::Movie, movie)?;
        self.layout.handle(membership.node_type(), member)?;

        let (forward, backward) = match membership {
            Membership::Cast => (&mut self.movie_cast, &mut self.cast_movie),
            Membership::Genre => (&mut self.movie_genre, &mut self.genre_movie),
        };
        forward[movie as usize].push(member);
        backward[member as usize].push(movie);
        Ok(self)
    }

    /// Record a user's rating of a movie (local indices)
    pub fn add_rating(
        &mut self,
        user: LocalIndex,
        movie: LocalIndex,
        rating: RatingValue,
    ) -> Result<&mut Self> {
        self.layout.handle(NodeType::User, user)?;
        self.layout.handle(NodeType::Movie, movie)?;
        if !rating.is_finite() {
            return Err(DataLoadError::InvalidRating {
                user,
                movie,
                value: rating,
            });
        }

        self.user_movie[user as usize].push(movie);
        self.user_movie_ratings[user as usize].push(rating);
        self.movie_user[movie as usize].push(user);
        self.movie_user_ratings[movie as usize].push(rating);
        Ok(self)
    }

    /// Finish construction and validate the result
    pub fn build(self) -> Result<HeteroGraph> {
        let graph = HeteroGraph {
            layout: self.layout,
            movie_cast: self.movie_cast,
            cast_movie: self.cast_movie,
            movie_genre: self.movie_genre,
            genre_movie: self.genre_movie,
            user_movie: self.user_movie,
            movie_user: self.movie_user,
            user_movie_ratings: self.user_movie_ratings,
            movie_user_ratings: self.movie_user_ratings,
        };
        graph.validate()?;

        debug!(
            cast_edges = graph.edge_count(Relation::MovieCast),
            genre_edges = graph.edge_count(Relation::MovieGenre),
            rating_edges = graph.edge_count(Relation::UserMovie),
            "graph built"
        );
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_graph() -> HeteroGraph {
        let mut builder = GraphBuilder::with_counts(NodeCounts::new(3, 2, 1, 2)).unwrap();
        builder
            .add_membership(Membership::Genre, 0, 0)
            .unwrap()
            .add_membership(Membership::Genre, 1, 0)
            .unwrap()
            .add_membership(Membership::Genre, 2, 1)
            .unwrap()
            .add_membership(Membership::Cast, 1, 0)
            .unwrap();
        builder
            .add_rating(0, 0, 4.0)
            .unwrap()
            .add_rating(0, 1, 3.5)
            .unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn test_symmetric_tables() {
        let graph = small_graph();

        assert_eq!(graph.neighbors(Relation::MovieGenre, 1), &[0]);
        assert_eq!(graph.neighbors(Relation::GenreMovie, 0), &[0, 1]);
        assert_eq!(graph.neighbors(Relation::CastMovie, 0), &[1]);
        assert_eq!(graph.neighbors(Relation::MovieUser, 1), &[0]);
        assert_eq!(graph.edge_count(Relation::UserMovie), 2);
    }

    #[test]
    fn test_ratings_align_with_adjacency() {
        let graph = small_graph();

        assert_eq!(graph.neighbors(Relation::UserMovie, 0), &[0, 1]);
        assert_eq!(graph.ratings(Relation::UserMovie, 0), &[4.0, 3.5]);
        assert_eq!(graph.ratings(Relation::MovieUser, 1), &[3.5]);
        for relation in Relation::ALL {
            let rated = !graph.ratings(relation, 0).is_empty();
            assert_eq!(rated, relation.is_rated(), "{:?}", relation);
        }
    }

    #[test]
    fn test_neighbor_queries_on_sparse_nodes() {
        let graph = small_graph();

        assert!(!graph.has_any_neighbor(Relation::MovieCast, 0));
        assert!(graph.has_any_neighbor(Relation::MovieCast, 1));
        assert!(!graph.has_any_neighbor(Relation::UserMovie, 1));
        assert!(graph.neighbors(Relation::UserMovie, 99).is_empty());
        assert_eq!(graph.active_users().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn test_builder_rejects_out_of_range() {
        let mut builder = GraphBuilder::with_counts(NodeCounts::new(3, 2, 1, 2)).unwrap();

        assert!(matches!(
            builder.add_membership(Membership::Cast, 0, 1),
            Err(DataLoadError::IndexOutOfBounds { kind: NodeType::Cast, index: 1, count: 1 })
        ));
        assert!(builder.add_rating(2, 0, 3.0).is_err());
        assert!(builder.add_rating(0, 3, 3.0).is_err());
    }

    #[test]
    fn test_builder_rejects_nan_rating() {
        let mut builder = GraphBuilder::with_counts(NodeCounts::new(1, 0, 0, 1)).unwrap();
        assert!(matches!(
            builder.add_rating(0, 0, f64::NAN),
            Err(DataLoadError::InvalidRating { user: 0, movie: 0, .. })
        ));
    }
}
