use data_loader::{HeteroGraph, NodeType, Relation};
use std::path::Path;
use std::time::Instant;

fn main() {
    let data_dir = Path::new("processed_data");

    println!("Loading graph from {}...\n", data_dir.display());

    let start = Instant::now();
    let graph = HeteroGraph::load_from_files(data_dir)
        .expect("Failed to load graph");
    let elapsed = start.elapsed();

    println!("=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    for kind in NodeType::ALL {
        println!("{:>6}: {} (base {})", kind, graph.count(kind), graph.layout().base(kind));
    }
    let ratings = graph.edge_count(Relation::UserMovie);
    println!("Ratings: {}", ratings);
    println!("Active users: {}", graph.active_users().count());
    println!("\nPerformance: {:.0} ratings/second",
             ratings as f64 / elapsed.as_secs_f64());
}
