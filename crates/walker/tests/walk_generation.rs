//! Integration tests for walk generation.
//!
//! These tests load a small dataset from disk the way the CLI does and run
//! the batch driver end to end.

use data_loader::loader::{CAST_FILE, GENRE_FILE, NODE_COUNTS_FILE, RATINGS_FILE};
use data_loader::{HeteroGraph, NodeType};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use walker::{BatchDriver, MetapathPolicy, WalkConfig, WalkGenerator, WalkRng};

/// 3 movies, 2 genres, 1 cast member, 2 users; user 0 rates movies 0 and 1
///
/// Global ids: movies 0-2, genres 3-4, cast 5, users 6-7.
fn write_dataset(dir: &Path) {
    fs::write(dir.join(NODE_COUNTS_FILE), "3 2 1 2 8\n").unwrap();
    fs::write(dir.join(GENRE_FILE), "0 1 3\n1 2 3 4\n2 1 4\n").unwrap();
    fs::write(dir.join(CAST_FILE), "0 1 5\n1 1 5\n2 0\n").unwrap();
    fs::write(
        dir.join(RATINGS_FILE),
        "uId,mId,binary,rating\n6,0,1,4.5\n6,1,0,2.0\n7,1,1,3.5\n7,2,1,5.0\n",
    )
    .unwrap();
}

fn load_test_graph() -> (TempDir, HeteroGraph) {
    let dir = TempDir::new().unwrap();
    write_dataset(dir.path());
    let graph = HeteroGraph::load_from_files(dir.path()).unwrap();
    (dir, graph)
}

fn kind_of(graph: &HeteroGraph, id: &str) -> NodeType {
    let id: u64 = id.parse().unwrap();
    graph.layout().classify(id).unwrap().kind
}

#[test]
fn test_single_walk_alternates_types() {
    let (_dir, graph) = load_test_graph();

    for seed in 0..50 {
        let config = WalkConfig::default()
            .with_walks_per_user(1)
            .with_walk_length(4)
            .with_seed(seed);
        let mut out = Vec::new();
        BatchDriver::new(&graph, config).run(&mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let first_line = text.lines().next().unwrap();
        let ids: Vec<&str> = first_line.split(' ').collect();
        assert_eq!(ids.len(), 5);
        assert_eq!(ids[0], "6");

        assert_eq!(kind_of(&graph, ids[1]), NodeType::Movie);
        assert!(matches!(
            kind_of(&graph, ids[2]),
            NodeType::User | NodeType::Genre | NodeType::Cast
        ));
        assert_eq!(kind_of(&graph, ids[3]), NodeType::Movie);
        assert_eq!(kind_of(&graph, ids[4]), NodeType::User);
    }
}

#[test]
fn test_full_batch() {
    let (_dir, graph) = load_test_graph();
    let config = WalkConfig::default()
        .with_walks_per_user(10)
        .with_walk_length(20)
        .with_seed(17)
        .with_threads(2);

    let mut out = Vec::new();
    let summary = BatchDriver::new(&graph, config).run(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert_eq!(summary.users_walked, 2);
    assert_eq!(summary.walks_written, 20);
    assert_eq!(text.lines().count(), 20);
    assert!(text.lines().take(10).all(|line| line.starts_with("6 ")));
    assert!(text.lines().skip(10).all(|line| line.starts_with("7 ")));
    for line in text.lines() {
        assert_eq!(line.split(' ').count(), 21);
    }
}

#[test]
fn test_direct_only_prior() {
    let (_dir, graph) = load_test_graph();
    let policy = MetapathPolicy::new().with_prior([1.0, 0.0, 0.0]);
    let generator = WalkGenerator::new(&graph).with_policy(policy);
    let mut rng = WalkRng::seed_from_u64(8);

    for _ in 0..100 {
        let walk = generator.generate_walk(1, 30, &mut rng).unwrap();
        assert_eq!(walk.stats().detours(), 0);
        for (i, &id) in walk.nodes().iter().enumerate() {
            let expected = if i % 2 == 0 { NodeType::User } else { NodeType::Movie };
            assert_eq!(graph.layout().classify(id as u64).unwrap().kind, expected);
        }
    }
}
