//! Core domain types for the heterogeneous movie graph.
//!
//! Node ids live in one flat space partitioned by type into four contiguous
//! ranges, always in the order movies, genres, cast members, users:
//!
//! ```text
//! [0 .. movies) [genre_base .. +genres) [cast_base .. +casts) [user_base .. +users)
//! ```
//!
//! Code outside this module never does base-offset arithmetic itself. It holds
//! a [`NodeHandle`] (type tag + local index) and asks the [`NodeLayout`] for
//! the global id when writing output.

use crate::error::{DataLoadError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Type Aliases
// =============================================================================

/// Index of a node inside its own type's range
pub type LocalIndex = u32;

/// Identifier unique across all node types (`base[type] + local index`)
pub type GlobalId = u32;

/// Rating value attached to a user/movie edge
pub type RatingValue = f64;

// =============================================================================
// Node types and handles
// =============================================================================

/// The four node types, declared in global id order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeType {
    Movie,
    Genre,
    Cast,
    User,
}

impl NodeType {
    /// All node types in the order their id ranges are laid out
    pub const ALL: [NodeType; 4] = [NodeType::Movie, NodeType::Genre, NodeType::Cast, NodeType::User];

    /// Position of this type in [`NodeType::ALL`]
    pub fn ordinal(self) -> usize {
        match self {
            NodeType::Movie => 0,
            NodeType::Genre => 1,
            NodeType::Cast => 2,
            NodeType::User => 3,
        }
    }

    /// Lowercase name used in `id2type.txt`
    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Movie => "movie",
            NodeType::Genre => "genre",
            NodeType::Cast => "cast",
            NodeType::User => "user",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A node reference carrying its type tag
///
/// Handles are what the walk code passes around; converting to a flat
/// [`GlobalId`] only happens through [`NodeLayout::global`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    pub kind: NodeType,
    pub index: LocalIndex,
}

impl NodeHandle {
    pub fn new(kind: NodeType, index: LocalIndex) -> Self {
        Self { kind, index }
    }

    pub fn movie(index: LocalIndex) -> Self {
        Self::new(NodeType::Movie, index)
    }

    pub fn genre(index: LocalIndex) -> Self {
        Self::new(NodeType::Genre, index)
    }

    pub fn cast(index: LocalIndex) -> Self {
        Self::new(NodeType::Cast, index)
    }

    pub fn user(index: LocalIndex) -> Self {
        Self::new(NodeType::User, index)
    }
}

// =============================================================================
// Node counts and the id layout
// =============================================================================

/// Number of nodes of each type, as declared by the node-count record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodeCounts {
    pub movies: u32,
    pub genres: u32,
    pub casts: u32,
    pub users: u32,
}

impl NodeCounts {
    pub fn new(movies: u32, genres: u32, casts: u32, users: u32) -> Self {
        Self { movies, genres, casts, users }
    }

    /// Count for a single node type
    pub fn get(&self, kind: NodeType) -> u32 {
        match kind {
            NodeType::Movie => self.movies,
            NodeType::Genre => self.genres,
            NodeType::Cast => self.casts,
            NodeType::User => self.users,
        }
    }

    /// Sum over all types, widened so overflow can be detected
    pub fn total(&self) -> u64 {
        NodeType::ALL.iter().map(|&kind| self.get(kind) as u64).sum()
    }
}

/// Immutable mapping between typed handles and flat global ids
///
/// Derived once from [`NodeCounts`]; every global id written to the walk
/// corpus goes through this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeLayout {
    counts: NodeCounts,
    bases: [GlobalId; 4],
}

impl NodeLayout {
    /// Build a layout, rejecting counts whose total doesn't fit a [`GlobalId`]
    pub fn new(counts: NodeCounts) -> Result<Self> {
        let total = counts.total();
        if total > GlobalId::MAX as u64 {
            return Err(DataLoadError::ValidationError(format!(
                "{} nodes exceed the global id space",
                total
            )));
        }

        let mut bases = [0; 4];
        let mut next: GlobalId = 0;
        for kind in NodeType::ALL {
            bases[kind.ordinal()] = next;
            next += counts.get(kind);
        }

        Ok(Self { counts, bases })
    }

    /// Build a layout from a node-count record, checking its declared total
    pub fn from_record(counts: NodeCounts, declared_total: u64) -> Result<Self> {
        let sum = counts.total();
        if sum != declared_total {
            return Err(DataLoadError::CountMismatch {
                sum,
                declared: declared_total,
            });
        }
        Self::new(counts)
    }

    pub fn count(&self, kind: NodeType) -> u32 {
        self.counts.get(kind)
    }

    pub fn base(&self, kind: NodeType) -> GlobalId {
        self.bases[kind.ordinal()]
    }

    /// Total number of nodes across all types
    pub fn total(&self) -> GlobalId {
        // Bounded by `new`.
        self.counts.total() as GlobalId
    }

    /// Global id of a handle
    pub fn global(&self, handle: NodeHandle) -> GlobalId {
        debug_assert!(handle.index < self.count(handle.kind));
        self.base(handle.kind) + handle.index
    }

    /// Checked handle construction from a local index
    pub fn handle(&self, kind: NodeType, index: LocalIndex) -> Result<NodeHandle> {
        let count = self.count(kind);
        if index >= count {
            return Err(DataLoadError::IndexOutOfBounds { kind, index, count });
        }
        Ok(NodeHandle::new(kind, index))
    }

    /// Map a global id back to its typed handle, `None` if past the end
    pub fn classify(&self, global: u64) -> Option<NodeHandle> {
        NodeType::ALL.iter().rev().find_map(|&kind| {
            let base = self.base(kind) as u64;
            let count = self.count(kind) as u64;
            (global >= base && global < base + count)
                .then(|| NodeHandle::new(kind, (global - base) as LocalIndex))
        })
    }

    /// Convert a global id that must belong to `expected` into a local index
    pub fn local(&self, expected: NodeType, global: u64) -> Result<LocalIndex> {
        match self.classify(global) {
            Some(handle) if handle.kind == expected => Ok(handle.index),
            _ => Err(DataLoadError::OutOfRange {
                expected,
                id: global,
            }),
        }
    }

    /// Every node in ascending global id order
    pub fn handles(&self) -> impl Iterator<Item = NodeHandle> + '_ {
        NodeType::ALL
            .into_iter()
            .flat_map(move |kind| (0..self.count(kind)).map(move |i| NodeHandle::new(kind, i)))
    }
}

// =============================================================================
// Relations
// =============================================================================

/// Directed typed edge relations stored by the graph
///
/// Each symmetric pair (movie/cast, movie/genre, movie/user) is stored as two
/// tables built from the same records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    MovieCast,
    CastMovie,
    MovieGenre,
    GenreMovie,
    UserMovie,
    MovieUser,
}

impl Relation {
    pub const ALL: [Relation; 6] = [
        Relation::MovieCast,
        Relation::CastMovie,
        Relation::MovieGenre,
        Relation::GenreMovie,
        Relation::UserMovie,
        Relation::MovieUser,
    ];

    pub fn source(self) -> NodeType {
        match self {
            Relation::MovieCast | Relation::MovieGenre | Relation::MovieUser => NodeType::Movie,
            Relation::CastMovie => NodeType::Cast,
            Relation::GenreMovie => NodeType::Genre,
            Relation::UserMovie => NodeType::User,
        }
    }

    pub fn target(self) -> NodeType {
        self.reverse().source()
    }

    /// The opposite direction of the same edges
    pub fn reverse(self) -> Relation {
        match self {
            Relation::MovieCast => Relation::CastMovie,
            Relation::CastMovie => Relation::MovieCast,
            Relation::MovieGenre => Relation::GenreMovie,
            Relation::GenreMovie => Relation::MovieGenre,
            Relation::UserMovie => Relation::MovieUser,
            Relation::MovieUser => Relation::UserMovie,
        }
    }

    /// Whether the edges of this relation carry a rating
    pub fn is_rated(self) -> bool {
        matches!(self, Relation::UserMovie | Relation::MovieUser)
    }
}
