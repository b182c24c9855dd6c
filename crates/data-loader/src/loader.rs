//! Building the [`HeteroGraph`] from a preprocessed data directory.
//!
//! Steps:
//! 1. Read the node-count record and derive the [`NodeLayout`]
//! 2. Parse the cast, genre and rating tables in parallel
//! 3. Translate global ids to local indices and feed a [`GraphBuilder`]
//! 4. Validate the finished graph
//!
//! Any failure here is fatal: the walk generator never sees a partially
//! loaded graph.

use crate::error::{DataLoadError, Result};
use crate::graph::{GraphBuilder, HeteroGraph, Membership};
use crate::parser::{self, MembershipRecord, RatingRecord};
use crate::types::*;
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Node-count record
pub const NODE_COUNTS_FILE: &str = "datainfo.md";
/// Movie to cast/crew membership table
pub const CAST_FILE: &str = "mId2CC.txt";
/// Movie to genre membership table
pub const GENRE_FILE: &str = "mId2Genre.txt";
/// Training ratings
pub const RATINGS_FILE: &str = "rating_train.csv";
/// Id to node type listing written by [`write_type_map`]
pub const TYPE_MAP_FILE: &str = "id2type.txt";

impl HeteroGraph {
    /// Load the whole graph from a data directory
    ///
    /// This is the main entry point for loading data.
    #[instrument(skip_all, fields(dir = %data_dir.display()))]
    pub fn load_from_files(data_dir: &Path) -> Result<Self> {
        let start = Instant::now();

        let (counts, declared_total) = parser::parse_node_counts(&data_dir.join(NODE_COUNTS_FILE))?;
        let layout = NodeLayout::from_record(counts, declared_total)?;
        info!(
            movies = counts.movies,
            genres = counts.genres,
            casts = counts.casts,
            users = counts.users,
            "read node counts"
        );

        let cast_path = data_dir.join(CAST_FILE);
        let genre_path = data_dir.join(GENRE_FILE);
        let ratings_path = data_dir.join(RATINGS_FILE);

        // The three tables are independent; nest joins for three-way parallelism
        let ((cast, genres), ratings) = rayon::join(
            || {
                rayon::join(
                    || parser::parse_memberships(&cast_path),
                    || parser::parse_memberships(&genre_path),
                )
            },
            || parser::parse_ratings(&ratings_path),
        );
        let cast = cast?;
        let genres = genres?;
        let ratings = ratings?;
        debug!(
            cast_rows = cast.len(),
            genre_rows = genres.len(),
            ratings = ratings.len(),
            "parsed tables"
        );

        let mut builder = GraphBuilder::new(layout);
        add_memberships(&mut builder, Membership::Cast, CAST_FILE, &cast)?;
        add_memberships(&mut builder, Membership::Genre, GENRE_FILE, &genres)?;
        add_ratings(&mut builder, &ratings)?;
        let graph = builder.build()?;

        info!(
            rating_edges = graph.edge_count(Relation::UserMovie),
            active_users = graph.active_users().count(),
            elapsed = ?start.elapsed(),
            "graph loaded"
        );
        Ok(graph)
    }
}

/// Re-tag an out-of-range id with the line it came from
fn locate(file: &str, line: usize) -> impl FnOnce(DataLoadError) -> DataLoadError + '_ {
    move |err| DataLoadError::ParseError {
        file: file.to_string(),
        line,
        reason: err.to_string(),
    }
}

fn add_memberships(
    builder: &mut GraphBuilder,
    membership: Membership,
    file: &str,
    records: &[MembershipRecord],
) -> Result<()> {
    let layout = *builder.layout();
    for record in records {
        let movie = layout
            .local(NodeType::Movie, record.movie)
            .map_err(locate(file, record.line))?;
        for &member in &record.members {
            let member = layout
                .local(membership.node_type(), member)
                .map_err(locate(file, record.line))?;
            builder.add_membership(membership, movie, member)?;
        }
    }
    Ok(())
}

fn add_ratings(builder: &mut GraphBuilder, records: &[RatingRecord]) -> Result<()> {
    let layout = *builder.layout();
    for record in records {
        let user = layout
            .local(NodeType::User, record.user)
            .map_err(locate(RATINGS_FILE, record.line))?;
        let movie = layout
            .local(NodeType::Movie, record.movie)
            .map_err(locate(RATINGS_FILE, record.line))?;
        builder.add_rating(user, movie, record.rating)?;
    }
    Ok(())
}

/// Write one `<global id> <type>` line per node, in id order
pub fn write_type_map<W: Write>(layout: &NodeLayout, out: &mut W) -> Result<()> {
    for handle in layout.handles() {
        writeln!(out, "{} {}", layout.global(handle), handle.kind)?;
    }
    out.flush()?;
    Ok(())
}
