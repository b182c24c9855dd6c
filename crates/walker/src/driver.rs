//! Batch walk generation over every user.
//!
//! Users are split into chunks of `chunk_size`. Each chunk is walked in
//! parallel on a dedicated rayon pool; every user draws from its own
//! [`WalkRng`] stream and writes into a private buffer. Buffers are flushed in
//! ascending user order, so for a fixed seed the output bytes don't depend on
//! the thread count.

use crate::error::{Result, WalkError};
use crate::generator::{WalkGenerator, WalkStats};
use crate::metapath::MetapathPolicy;
use crate::random::{WalkRng, entropy_seed};
use data_loader::{HeteroGraph, LocalIndex, NodeType, Relation};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Batch generation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkConfig {
    /// Walks generated per user with at least one rating
    pub walks_per_user: usize,
    /// Steps per walk; each walk holds `walk_length + 1` ids
    pub walk_length: usize,
    /// Base seed; drawn from OS entropy when absent
    pub seed: Option<u64>,
    /// Worker threads, 0 for all cores
    pub threads: usize,
    /// Users per parallel batch
    pub chunk_size: usize,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            walks_per_user: 100,
            walk_length: 80,
            seed: None,
            threads: 0,
            chunk_size: 512,
        }
    }
}

impl WalkConfig {
    pub fn with_walks_per_user(mut self, walks_per_user: usize) -> Self {
        self.walks_per_user = walks_per_user;
        self
    }

    pub fn with_walk_length(mut self, walk_length: usize) -> Self {
        self.walk_length = walk_length;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(WalkError::InvalidConfig("chunk size must be positive".into()));
        }
        Ok(())
    }
}

/// What a batch run produced
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Base seed actually used
    pub seed: u64,
    pub users_seen: u64,
    pub users_walked: u64,
    /// Users with no ratings
    pub users_skipped: u64,
    pub walks_written: u64,
    pub stats: WalkStats,
}

/// Walks and their serialized lines for one user
struct UserWalks {
    lines: Vec<u8>,
    walks: u64,
    stats: WalkStats,
}

/// Runs a [`WalkGenerator`] over every user of the graph
pub struct BatchDriver<'g> {
    generator: WalkGenerator<'g>,
    config: WalkConfig,
}

impl<'g> BatchDriver<'g> {
    pub fn new(graph: &'g HeteroGraph, config: WalkConfig) -> Self {
        Self {
            generator: WalkGenerator::new(graph),
            config,
        }
    }

    pub fn with_policy(mut self, policy: MetapathPolicy) -> Self {
        self.generator = self.generator.with_policy(policy);
        self
    }

    pub fn config(&self) -> &WalkConfig {
        &self.config
    }

    /// Generate every walk and write one line per walk to `out`
    #[instrument(skip_all, fields(walks_per_user = self.config.walks_per_user, walk_length = self.config.walk_length))]
    pub fn run<W: Write>(&self, out: &mut W) -> Result<BatchSummary> {
        self.config.validate()?;

        let seed = self.config.seed.unwrap_or_else(entropy_seed);
        if self.config.seed.is_none() {
            info!(seed, "No seed given, drew one from OS entropy");
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .build()
            .map_err(|e| WalkError::InvalidConfig(e.to_string()))?;
        info!(
            prior = ?self.generator.policy().prior(),
            "Using {} worker threads",
            pool.current_num_threads()
        );

        let users = self.generator.graph().count(NodeType::User);
        let chunk = LocalIndex::try_from(self.config.chunk_size).unwrap_or(LocalIndex::MAX);
        let mut summary = BatchSummary {
            seed,
            users_seen: users as u64,
            ..BatchSummary::default()
        };

        let start = Instant::now();
        let mut first = 0;
        while first < users {
            let last = first.saturating_add(chunk).min(users);
            let results: Vec<Result<Option<UserWalks>>> = pool.install(|| {
                (first..last)
                    .into_par_iter()
                    .map(|user| self.walk_user(user, seed))
                    .collect()
            });

            for result in results {
                match result? {
                    Some(walks) => {
                        out.write_all(&walks.lines)?;
                        summary.users_walked += 1;
                        summary.walks_written += walks.walks;
                        summary.stats += walks.stats;
                    }
                    None => summary.users_skipped += 1,
                }
            }
            debug!(first, last, "Wrote user chunk");
            first = last;
        }
        out.flush()?;

        info!(
            users_walked = summary.users_walked,
            users_skipped = summary.users_skipped,
            walks = summary.walks_written,
            fallbacks = summary.stats.fallbacks,
            "Generated walks in {:.2?}",
            start.elapsed()
        );
        Ok(summary)
    }

    /// All walks for one user, or `None` for a user with no ratings
    fn walk_user(&self, user: LocalIndex, seed: u64) -> Result<Option<UserWalks>> {
        let graph = self.generator.graph();
        if !graph.has_any_neighbor(Relation::UserMovie, user) {
            debug!(user, "Skipping user with no ratings");
            return Ok(None);
        }

        let mut rng = WalkRng::for_stream(seed, user as u64);
        let mut lines = Vec::new();
        let mut stats = WalkStats::default();
        for _ in 0..self.config.walks_per_user {
            let walk = self
                .generator
                .generate_walk(user, self.config.walk_length, &mut rng)?;
            walk.write_line(&mut lines)?;
            stats += walk.stats();
        }

        Ok(Some(UserWalks {
            lines,
            walks: self.config.walks_per_user as u64,
            stats,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sparse_graph;
    use data_loader::{GraphBuilder, Membership, NodeCounts};

    fn run_to_string(graph: &HeteroGraph, config: WalkConfig) -> (String, BatchSummary) {
        let mut out = Vec::new();
        let summary = BatchDriver::new(graph, config).run(&mut out).unwrap();
        (String::from_utf8(out).unwrap(), summary)
    }

    #[test]
    fn test_skips_user_without_ratings() {
        let mut builder = GraphBuilder::with_counts(NodeCounts::new(2, 0, 0, 3)).unwrap();
        builder.add_rating(0, 0, 4.0).unwrap();
        builder.add_rating(2, 1, 2.0).unwrap();
        let graph = builder.build().unwrap();

        let config = WalkConfig::default()
            .with_walks_per_user(3)
            .with_walk_length(4)
            .with_seed(1);
        let (text, summary) = run_to_string(&graph, config);

        let user_base = graph.layout().base(NodeType::User);
        let starts: Vec<&str> = text
            .lines()
            .map(|line| line.split(' ').next().unwrap())
            .collect();
        let u0 = user_base.to_string();
        let u2 = (user_base + 2).to_string();
        let (u0, u2) = (u0.as_str(), u2.as_str());
        assert_eq!(starts, vec![u0, u0, u0, u2, u2, u2]);

        assert_eq!(summary.users_seen, 3);
        assert_eq!(summary.users_walked, 2);
        assert_eq!(summary.users_skipped, 1);
        assert_eq!(summary.walks_written, 6);
    }

    #[test]
    fn test_line_shape() {
        let graph = sparse_graph();
        let config = WalkConfig::default()
            .with_walks_per_user(5)
            .with_walk_length(12)
            .with_seed(5);
        let (text, summary) = run_to_string(&graph, config);

        assert_eq!(text.lines().count(), 10);
        for line in text.lines() {
            let ids: Vec<u32> = line.split(' ').map(|s| s.parse().unwrap()).collect();
            assert_eq!(ids.len(), 13);
            assert!(ids.iter().all(|&id| id < graph.layout().total()));
        }
        assert_eq!(summary.seed, 5);
        assert_eq!(BatchDriver::new(&graph, WalkConfig::default()).config().chunk_size, 512);
    }

    #[test]
    fn test_output_independent_of_threads_and_chunks() {
        let graph = sparse_graph();
        let base = WalkConfig::default()
            .with_walks_per_user(20)
            .with_walk_length(30)
            .with_seed(2024);

        let (single, s1) = run_to_string(&graph, base.clone().with_threads(1));
        let (multi, s4) = run_to_string(&graph, base.clone().with_threads(4).with_chunk_size(1));
        assert_eq!(single, multi);
        assert_eq!(s1, s4);
    }

    #[test]
    fn test_different_seeds_differ() {
        let graph = sparse_graph();
        let base = WalkConfig::default().with_walks_per_user(20).with_walk_length(30);
        let (a, _) = run_to_string(&graph, base.clone().with_seed(1));
        let (b, _) = run_to_string(&graph, base.with_seed(2));
        assert_ne!(a, b);
    }

    #[test]
    fn test_detour_between_distant_ratings_completes() {
        // Both movies share genre 0; a detour from movie 0 (rated 0.0) can
        // land on movie 1 whose only rating is 1000.0
        let mut builder = GraphBuilder::with_counts(NodeCounts::new(2, 1, 0, 2)).unwrap();
        builder.add_membership(Membership::Genre, 0, 0).unwrap();
        builder.add_membership(Membership::Genre, 1, 0).unwrap();
        builder.add_rating(0, 0, 0.0).unwrap();
        builder.add_rating(1, 1, 1000.0).unwrap();
        let graph = builder.build().unwrap();

        let config = WalkConfig::default()
            .with_walks_per_user(20)
            .with_walk_length(10)
            .with_seed(3);
        let mut out = Vec::new();
        let summary = BatchDriver::new(&graph, config)
            .with_policy(MetapathPolicy::new().with_prior([0.0, 1.0, 0.0]))
            .run(&mut out)
            .unwrap();

        assert_eq!(summary.walks_written, 40);
        assert!(summary.stats.genre_detours > 0);
        assert_eq!(summary.stats.cast_detours, 0);
        // Landing on the other user's movie crosses over to that user
        let text = String::from_utf8(out).unwrap();
        assert!(text.lines().take(20).any(|line| line.contains(" 1 ")));
    }

    #[test]
    fn test_rejects_zero_chunk_size() {
        let graph = sparse_graph();
        let config = WalkConfig::default().with_chunk_size(0);
        let mut out = Vec::new();
        assert!(matches!(
            BatchDriver::new(&graph, config).run(&mut out),
            Err(WalkError::InvalidConfig(_))
        ));
        assert!(out.is_empty());
    }
}
