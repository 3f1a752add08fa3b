use std::path::PathBuf;

use clap::Parser;

use stroke_server::train::{self, TrainParams};

#[derive(Debug, Parser)]
#[command(name = "stroke-train", about = "Train the stroke-risk ensemble and save the bundle")]
struct Args {
    /// Path to the stroke dataset CSV.
    #[arg(long, default_value = "healthcare-dataset-stroke-data.csv")]
    data: PathBuf,

    /// Where to write the trained model bundle.
    #[arg(long, default_value = "stroke_ensemble_model.json")]
    out: PathBuf,

    /// Fraction of each class held out for evaluation.
    #[arg(long, default_value_t = 0.2)]
    test_fraction: f64,

    /// Seed for the split, oversampling, and forest bootstrap.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of trees in the random forest.
    #[arg(long, default_value_t = 200)]
    trees: usize,

    /// Number of neighbors for the KNN classifier.
    #[arg(long, default_value_t = 5)]
    neighbors: usize,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let mut params = TrainParams {
        test_fraction: args.test_fraction,
        seed: args.seed,
        ..TrainParams::default()
    };
    params.knn.k = args.neighbors;
    params.forest.n_trees = args.trees;
    params.forest.seed = args.seed;

    train::run(&args.data, &args.out, &params)
}
