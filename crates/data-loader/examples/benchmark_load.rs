use data_loader::MovieLens;
use std::path::Path;
use std::time::Instant;

fn main() {
    let data_dir = Path::new("data/ml-1m");

    println!("Loading MovieLens 1M dataset...\n");

    let start = Instant::now();
    let ml = MovieLens::load_from_files(data_dir).expect("Failed to load dataset");
    let load_elapsed = start.elapsed();

    let start = Instant::now();
    let full = ml.dataset().build_full_trainset();
    let index_elapsed = start.elapsed();

    let (users, movies, ratings) = ml.counts();

    println!("\n=== Load Complete ===");
    println!("Parse + validate: {:?}", load_elapsed);
    println!("Train set indexing: {:?}", index_elapsed);
    println!("Users: {}", users);
    println!("Movies: {}", movies);
    println!("Ratings: {}", ratings);
    println!("Global mean: {:.3}", full.global_mean());
    println!("\nPerformance: {:.0} ratings/second",
             ratings as f64 / load_elapsed.as_secs_f64());
}
