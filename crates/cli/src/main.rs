use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::loader::{NODE_COUNTS_FILE, TYPE_MAP_FILE};
use data_loader::parser::parse_node_counts;
use data_loader::{write_type_map, HeteroGraph, NodeLayout, NodeType, Relation};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;
use walker::{BatchDriver, BatchSummary, WalkConfig};

/// Name of the walk corpus inside the output directory
const WALKS_FILE: &str = "walks.txt";

/// metapath-walks - Metapath random walks over the movie graph
#[derive(Parser)]
#[command(name = "metapath-walks")]
#[command(about = "Generate metapath-guided random walks for node embeddings", long_about = None)]
struct Cli {
    /// Directory holding datainfo.md, mId2CC.txt, mId2Genre.txt and rating_train.csv
    #[arg(short, long, default_value = "processed_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate walks for every user and write them to walks.txt
    Walk {
        /// Directory that receives walks.txt (created if missing)
        #[arg(short, long, default_value = "walks")]
        output_dir: PathBuf,

        /// Walks per user
        #[arg(long, default_value = "100")]
        num_walks: usize,

        /// Steps per walk (each line holds length + 1 ids)
        #[arg(long, default_value = "80")]
        length: usize,

        /// Base seed; drawn from OS entropy when omitted
        #[arg(long)]
        seed: Option<u64>,

        /// Worker threads (0 = all cores)
        #[arg(long, default_value = "0")]
        threads: usize,

        /// Users per parallel batch
        #[arg(long, default_value = "512")]
        chunk_size: usize,

        /// Write a JSON run summary to this path
        #[arg(long)]
        summary: Option<PathBuf>,
    },

    /// Write the global id to node type map (id2type.txt)
    Types {
        /// Output path (default: DATA_DIR/id2type.txt)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show node counts, id ranges and edge counts
    Info,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Walk {
            output_dir,
            num_walks,
            length,
            seed,
            threads,
            chunk_size,
            summary,
        } => {
            let mut config = WalkConfig::default()
                .with_walks_per_user(num_walks)
                .with_walk_length(length)
                .with_threads(threads)
                .with_chunk_size(chunk_size);
            config.seed = seed;
            handle_walk(&cli.data_dir, &output_dir, config, summary.as_deref())?
        }
        Commands::Types { output } => {
            let output = output.unwrap_or_else(|| cli.data_dir.join(TYPE_MAP_FILE));
            handle_types(&cli.data_dir, &output)?
        }
        Commands::Info => handle_info(&cli.data_dir)?,
    }

    Ok(())
}

/// Load the graph, printing how long it took
fn load_graph(data_dir: &Path) -> Result<HeteroGraph> {
    println!("Loading graph from {}...", data_dir.display());
    let start = Instant::now();
    let graph = HeteroGraph::load_from_files(data_dir)
        .with_context(|| format!("Failed to load graph from {}", data_dir.display()))?;
    println!("{} Loaded graph in {:?}", "✓".green(), start.elapsed());
    Ok(graph)
}

/// Handle the 'walk' command
fn handle_walk(
    data_dir: &Path,
    output_dir: &Path,
    config: WalkConfig,
    summary_path: Option<&Path>,
) -> Result<()> {
    let graph = load_graph(data_dir)?;

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;
    let walks_path = output_dir.join(WALKS_FILE);
    let file = File::create(&walks_path)
        .with_context(|| format!("Failed to create {}", walks_path.display()))?;
    let mut out = BufWriter::new(file);
    info!(path = %walks_path.display(), ?config, "Writing walks");

    let driver = BatchDriver::new(&graph, config);
    let start = Instant::now();
    let summary = driver.run(&mut out).context("Walk generation failed")?;
    let elapsed = start.elapsed();

    print_summary(&summary, &walks_path, elapsed.as_secs_f64());

    if let Some(path) = summary_path {
        let report = serde_json::json!({
            "config": driver.config(),
            "summary": summary,
            "walks_file": walks_path,
            "elapsed_secs": elapsed.as_secs_f64(),
        });
        let text = serde_json::to_string_pretty(&report)?;
        fs::write(path, text)
            .with_context(|| format!("Failed to write summary to {}", path.display()))?;
        println!("{} Summary written to {}", "✓".green(), path.display());
    }

    Ok(())
}

/// Handle the 'types' command
fn handle_types(data_dir: &Path, output: &Path) -> Result<()> {
    let counts_path = data_dir.join(NODE_COUNTS_FILE);
    let (counts, declared) = parse_node_counts(&counts_path)
        .with_context(|| format!("Failed to read {}", counts_path.display()))?;
    let layout = NodeLayout::from_record(counts, declared)?;

    let file = File::create(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    write_type_map(&layout, &mut BufWriter::new(file))?;

    println!(
        "{} Wrote {} node types to {}",
        "✓".green(),
        layout.total(),
        output.display()
    );
    Ok(())
}

/// Handle the 'info' command
fn handle_info(data_dir: &Path) -> Result<()> {
    let graph = load_graph(data_dir)?;
    let layout = graph.layout();

    println!("{}", "Node ranges:".bold().blue());
    for kind in NodeType::ALL {
        let count = layout.count(kind);
        let base = layout.base(kind);
        println!(
            "{}{:<6} {:>9} ids [{}, {})",
            "• ".green(),
            kind,
            count,
            base,
            base + count
        );
    }
    println!("{}total  {:>9}", "• ".green(), layout.total());

    println!("{}", "Edges:".bold().blue());
    for relation in Relation::ALL {
        println!(
            "{}{:<10} {:>10}",
            "• ".cyan(),
            format!("{:?}", relation),
            graph.edge_count(relation)
        );
    }

    let active = graph.active_users().count();
    println!(
        "{}users with ratings: {} of {}",
        "• ".cyan(),
        active,
        layout.count(NodeType::User)
    );
    Ok(())
}

/// Print the human-readable result of a walk run
fn print_summary(summary: &BatchSummary, walks_path: &Path, secs: f64) {
    println!("{}", "Walk generation complete:".bold().blue());
    println!("{}Seed: {}", "• ".green(), summary.seed);
    println!(
        "{}Users walked: {} ({} skipped without ratings)",
        "• ".green(),
        summary.users_walked,
        summary.users_skipped
    );
    println!(
        "{}Walks written: {} to {}",
        "• ".green(),
        summary.walks_written,
        walks_path.display()
    );
    println!(
        "{}Detours: {} genre, {} cast ({} fell back)",
        "• ".cyan(),
        summary.stats.genre_detours,
        summary.stats.cast_detours,
        summary.stats.fallbacks
    );
    if secs > 0.0 {
        println!(
            "{}Throughput: {:.0} walks/second",
            "• ".cyan(),
            summary.walks_written as f64 / secs
        );
    }
}
