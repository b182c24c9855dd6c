//! Single-walk generation.
//!
//! A walk starts at a user and alternates movie and user steps. After every
//! movie step the [`MetapathPolicy`] may insert a genre or cast detour. Rating
//! context flows along the walk: each step prefers neighbours whose rating is
//! close to the rating of the edge just taken.

use crate::error::{Result, WalkError};
use crate::metapath::{Metapath, MetapathPolicy};
use crate::random::RandomSource;
use crate::sampling::{softmax_choice, uniform_index};
use data_loader::{GlobalId, HeteroGraph, LocalIndex, NodeHandle, NodeType, RatingValue, Relation};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::ops::AddAssign;

/// Detour counters for one walk or a whole batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WalkStats {
    pub genre_detours: u64,
    pub cast_detours: u64,
    /// Detours that exhausted their retries and stayed on the starting movie
    pub fallbacks: u64,
}

impl WalkStats {
    pub fn detours(&self) -> u64 {
        self.genre_detours + self.cast_detours
    }
}

impl AddAssign for WalkStats {
    fn add_assign(&mut self, other: Self) {
        self.genre_detours += other.genre_detours;
        self.cast_detours += other.cast_detours;
        self.fallbacks += other.fallbacks;
    }
}

/// One generated walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Walk {
    nodes: Vec<GlobalId>,
    stats: WalkStats,
}

impl Walk {
    /// Global ids in visit order; the first is the start user
    pub fn nodes(&self) -> &[GlobalId] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn stats(&self) -> WalkStats {
        self.stats
    }

    /// Write the walk as one line of space-separated ids
    pub fn write_line<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        let mut ids = self.nodes.iter();
        if let Some(first) = ids.next() {
            write!(out, "{}", first)?;
        }
        for id in ids {
            write!(out, " {}", id)?;
        }
        writeln!(out)
    }
}

/// Walk under construction
struct WalkBuffer<'g> {
    graph: &'g HeteroGraph,
    nodes: Vec<GlobalId>,
    target: usize,
}

impl<'g> WalkBuffer<'g> {
    fn new(graph: &'g HeteroGraph, walk_length: usize) -> Self {
        let target = walk_length + 1;
        Self {
            graph,
            nodes: Vec::with_capacity(target),
            target,
        }
    }

    fn push(&mut self, handle: NodeHandle) {
        self.nodes.push(self.graph.layout().global(handle));
    }

    fn is_full(&self) -> bool {
        self.nodes.len() >= self.target
    }

    /// Positions still open after the last pushed node
    fn remaining(&self) -> usize {
        self.target - self.nodes.len()
    }
}

/// Generates walks over a borrowed graph
#[derive(Debug, Clone)]
pub struct WalkGenerator<'g> {
    graph: &'g HeteroGraph,
    policy: MetapathPolicy,
}

impl<'g> WalkGenerator<'g> {
    pub fn new(graph: &'g HeteroGraph) -> Self {
        Self {
            graph,
            policy: MetapathPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: MetapathPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn graph(&self) -> &'g HeteroGraph {
        self.graph
    }

    pub fn policy(&self) -> &MetapathPolicy {
        &self.policy
    }

    /// Generate one walk of `walk_length + 1` ids starting at `start_user`
    ///
    /// ## Steps
    /// 1. Movie step: uniform over the user's movies on the first step,
    ///    softmax around the last rating afterwards
    /// 2. Metapath: an optional genre/cast detour (hub, then a hub movie)
    /// 3. User step: softmax over the movie's raters around the last rating
    ///
    /// Generation stops as soon as the walk is full, so an odd `walk_length`
    /// ends on a movie. Fails up front if the user is out of range or has no
    /// rated movies.
    pub fn generate_walk<R: RandomSource + ?Sized>(
        &self,
        start_user: LocalIndex,
        walk_length: usize,
        rng: &mut R,
    ) -> Result<Walk> {
        let users = self.graph.count(NodeType::User);
        if start_user >= users {
            return Err(WalkError::UnknownUser {
                user: start_user,
                count: users,
            });
        }
        if !self.graph.has_any_neighbor(Relation::UserMovie, start_user) {
            return Err(WalkError::IsolatedUser(start_user));
        }

        let mut walk = WalkBuffer::new(self.graph, walk_length);
        let mut stats = WalkStats::default();
        let mut user = start_user;
        let mut last_rating: Option<RatingValue> = None;

        walk.push(NodeHandle::user(user));

        while !walk.is_full() {
            let (mut movie, rating) = self.movie_step(user, last_rating, rng)?;
            last_rating = Some(rating);
            walk.push(NodeHandle::movie(movie));
            if walk.is_full() {
                break;
            }

            let path = self.policy.choose(self.graph, movie, walk.remaining(), rng)?;
            if let Some(detour) = self.policy.detour(self.graph, path, movie, rng)? {
                match path {
                    Metapath::GenreDetour => stats.genre_detours += 1,
                    Metapath::CastDetour => stats.cast_detours += 1,
                    Metapath::Direct => {}
                }
                if detour.landing.is_fallback() {
                    stats.fallbacks += 1;
                }
                movie = detour.landing.into_inner();
                walk.push(detour.hub);
                walk.push(NodeHandle::movie(movie));
            }

            let (next_user, rating) = self.user_step(movie, rating, rng)?;
            user = next_user;
            last_rating = Some(rating);
            walk.push(NodeHandle::user(user));
        }

        Ok(Walk {
            nodes: walk.nodes,
            stats,
        })
    }

    fn movie_step<R: RandomSource + ?Sized>(
        &self,
        user: LocalIndex,
        last_rating: Option<RatingValue>,
        rng: &mut R,
    ) -> Result<(LocalIndex, RatingValue)> {
        let movies = self.graph.neighbors(Relation::UserMovie, user);
        let ratings = self.graph.ratings(Relation::UserMovie, user);
        let k = match last_rating {
            None => uniform_index(movies.len(), rng)?,
            Some(reference) => softmax_choice(reference, ratings, rng)?,
        };
        Ok((movies[k], ratings[k]))
    }

    fn user_step<R: RandomSource + ?Sized>(
        &self,
        movie: LocalIndex,
        last_rating: RatingValue,
        rng: &mut R,
    ) -> Result<(LocalIndex, RatingValue)> {
        let users = self.graph.neighbors(Relation::MovieUser, movie);
        let ratings = self.graph.ratings(Relation::MovieUser, movie);
        let k = softmax_choice(last_rating, ratings, rng)?;
        Ok((users[k], ratings[k]))
    }
}
