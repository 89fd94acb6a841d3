use data_loader::Artifacts;
use std::path::Path;
use std::time::Instant;

fn main() {
    let catalog_path = Path::new("artifacts/movie_dict.json");
    let similarity_path = Path::new("similarity.bin");

    println!("Loading recommender artifacts...\n");

    let start = Instant::now();
    let artifacts = Artifacts::load_from_files(catalog_path, similarity_path)
        .expect("Failed to load artifacts");
    let elapsed = start.elapsed();

    let movies = artifacts.len();
    let cells = movies * movies;

    println!("\n=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("Movies: {}", movies);
    println!("Similarity cells: {}", cells);
    println!("\nPerformance: {:.0} cells/second",
             cells as f64 / elapsed.as_secs_f64());
}
