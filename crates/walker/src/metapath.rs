//! Metapath policy: what a walk does after landing on a movie.
//!
//! ## Metapaths
//! - `Direct`:      movie → user
//! - `GenreDetour`: movie → genre → movie → user
//! - `CastDetour`:  movie → cast → movie → user
//!
//! ## Decision
//! 1. Fewer than [`MIN_DETOUR_BUDGET`] positions left, or no genre and no cast
//!    neighbours: `Direct`
//! 2. Otherwise draw from the prior (default 0.5 / 0.1 / 0.4)
//! 3. A drawn detour the movie can't take is remapped with one coin flip:
//!    no cast turns `CastDetour` into `Direct` or `GenreDetour`, no genre turns
//!    `GenreDetour` into `Direct` or `CastDetour`
//!
//! The remap is a single flip over a two-element subset, not a resample loop.
//! A genre-only movie therefore takes a genre detour with probability
//! 0.1 + 0.4 / 2.

use crate::error::Result;
use crate::random::RandomSource;
use crate::retry::{BoundedRetry, RetryOutcome};
use crate::sampling::{random_bit, uniform_choice, weighted_choice};
use data_loader::{HeteroGraph, LocalIndex, NodeHandle, NodeType, Relation};
use tracing::trace;

/// Positions a detour needs: hub, movie, user
pub const MIN_DETOUR_BUDGET: usize = 3;

/// Uniform picks of a hub's movie before giving up on the detour
pub const DETOUR_RETRY_LIMIT: usize = 8;

/// Prior over `[Direct, GenreDetour, CastDetour]`
pub const DEFAULT_METAPATH_PRIOR: [f64; 3] = [0.5, 0.1, 0.4];

/// Continuation taken from a movie node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metapath {
    Direct,
    GenreDetour,
    CastDetour,
}

impl Metapath {
    /// Indexed the same way as the prior
    pub const ALL: [Metapath; 3] = [Metapath::Direct, Metapath::GenreDetour, Metapath::CastDetour];

    /// `(movie → hub, hub → movie)` relations for a detour, `None` for `Direct`
    pub fn hub_relations(self) -> Option<(Relation, Relation)> {
        match self {
            Metapath::Direct => None,
            Metapath::GenreDetour => Some((Relation::MovieGenre, Relation::GenreMovie)),
            Metapath::CastDetour => Some((Relation::MovieCast, Relation::CastMovie)),
        }
    }

    /// Hub node type a detour passes through
    pub fn hub_type(self) -> Option<NodeType> {
        self.hub_relations().map(|(to_hub, _)| to_hub.target())
    }
}

/// A detour that has been walked: the hub visited and the movie landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detour {
    pub hub: NodeHandle,
    /// `Fallback` holds the movie the detour started from
    pub landing: RetryOutcome<LocalIndex>,
}

/// Chooses and walks metapaths
#[derive(Debug, Clone)]
pub struct MetapathPolicy {
    prior: [f64; 3],
    retry: BoundedRetry,
}

impl MetapathPolicy {
    pub fn new() -> Self {
        Self {
            prior: DEFAULT_METAPATH_PRIOR,
            retry: BoundedRetry::new(DETOUR_RETRY_LIMIT),
        }
    }

    /// Override the `[Direct, GenreDetour, CastDetour]` prior (default 0.5/0.1/0.4)
    ///
    /// Weights need not be normalized. A prior with no positive weight makes
    /// every [`choose`](Self::choose) that reaches the draw fail.
    pub fn with_prior(mut self, prior: [f64; 3]) -> Self {
        self.prior = prior;
        self
    }

    pub fn prior(&self) -> [f64; 3] {
        self.prior
    }

    /// Pick the continuation from `movie` with `remaining` positions left in the walk
    pub fn choose<R: RandomSource + ?Sized>(
        &self,
        graph: &HeteroGraph,
        movie: LocalIndex,
        remaining: usize,
        rng: &mut R,
    ) -> Result<Metapath> {
        let no_cast = !graph.has_any_neighbor(Relation::MovieCast, movie);
        let no_genre = !graph.has_any_neighbor(Relation::MovieGenre, movie);

        if remaining < MIN_DETOUR_BUDGET || (no_cast && no_genre) {
            return Ok(Metapath::Direct);
        }

        let drawn = Metapath::ALL[weighted_choice(&self.prior, rng)?];
        let path = match drawn {
            Metapath::CastDetour if no_cast => Metapath::ALL[random_bit(rng)],
            Metapath::GenreDetour if no_genre => Metapath::ALL[random_bit(rng) * 2],
            other => other,
        };
        Ok(path)
    }

    /// Walk the detour for `path` starting at `movie`
    ///
    /// Returns `None` for [`Metapath::Direct`]. Otherwise steps to a uniform
    /// hub, then retries uniform hub movies until one has a user neighbour, at
    /// most [`DETOUR_RETRY_LIMIT`] times, falling back to `movie` itself.
    pub fn detour<R: RandomSource + ?Sized>(
        &self,
        graph: &HeteroGraph,
        path: Metapath,
        movie: LocalIndex,
        rng: &mut R,
    ) -> Result<Option<Detour>> {
        let Some((to_hub, from_hub)) = path.hub_relations() else {
            return Ok(None);
        };

        let hub = *uniform_choice(graph.neighbors(to_hub, movie), rng)?;
        let hub_movies = graph.neighbors(from_hub, hub);

        let landing = self.retry.run(
            |_| -> Result<Option<LocalIndex>> {
                let candidate = *uniform_choice(hub_movies, &mut *rng)?;
                Ok(graph
                    .has_any_neighbor(Relation::MovieUser, candidate)
                    .then_some(candidate))
            },
            || movie,
        )?;

        if landing.is_fallback() {
            trace!(
                movie,
                hub,
                ?path,
                attempts = self.retry.max_attempts(),
                "detour exhausted retries, staying on movie"
            );
        }

        Ok(Some(Detour {
            hub: NodeHandle::new(to_hub.target(), hub),
            landing,
        }))
    }
}

impl Default for MetapathPolicy {
    fn default() -> Self {
        Self::new()
    }
}
