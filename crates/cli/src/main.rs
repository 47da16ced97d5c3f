use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use data_loader::{MovieLens, UserId};
use evaluation::{metrics, EvaluationConfig, EvaluationData, EvaluationReport, Evaluator};
use recommenders::{
    AutoRec, CfMode, ContentKnn, CosineSimilarity, KnnBasic, NeighborhoodTopN, NormalPredictor,
    Prediction, Recommender, ScoredItem, SimilaritySource, Svd,
};
use std::path::PathBuf;
use std::time::Instant;
use tracing::debug;

/// RecsBakeOff - offline evaluation of movie recommenders
#[derive(Parser)]
#[command(name = "recs-bakeoff")]
#[command(about = "Evaluate recommendation algorithms on MovieLens ratings", long_about = None)]
struct Cli {
    /// Path to MovieLens dataset directory
    #[arg(short, long, default_value = "data/ml-1m", global = true)]
    data_dir: PathBuf,

    /// JSON file overriding evaluation settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Seed for the data splits (overrides the config file)
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Print results as JSON instead of a table
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// SVD against the random baseline, including top-N metrics
    BakeOff,

    /// Content-based KNN against the random baseline, plus sample recommendations
    Content {
        /// User to sample recommendations for
        #[arg(long, default_value = "85")]
        user_id: UserId,

        /// Number of sample recommendations per algorithm
        #[arg(long, default_value = "10")]
        samples: usize,
    },

    /// Evaluate any combination of algorithms
    Evaluate {
        /// Algorithms to evaluate, in report order
        #[arg(long, value_enum, num_args = 1.., required = true)]
        algorithm: Vec<AlgorithmKind>,

        /// Also compute hit rates, coverage, diversity and novelty
        #[arg(long)]
        top_n: bool,
    },

    /// Hit rate of neighborhood top-N lists built straight from similarities
    CfHitRate {
        /// Compare users or items
        #[arg(long, value_enum, default_value = "item")]
        mode: Mode,

        /// Neighbors (user mode) or seed ratings (item mode)
        #[arg(long, default_value = "10")]
        k: usize,
    },

    /// The autoencoder against the random baseline
    Autorec {
        /// Training epochs
        #[arg(long, default_value = "100")]
        epochs: usize,

        /// Also compute hit rates, coverage, diversity and novelty
        #[arg(long)]
        top_n: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum AlgorithmKind {
    Random,
    UserKnn,
    ItemKnn,
    Svd,
    ContentKnn,
    Autorec,
}

impl AlgorithmKind {
    /// The algorithm and the name it is reported under
    fn build(self, movielens: &MovieLens) -> (Recommender, &'static str) {
        match self {
            AlgorithmKind::Random => (NormalPredictor::new().into(), "Random"),
            AlgorithmKind::UserKnn => (KnnBasic::new().user_based(true).into(), "User KNN"),
            AlgorithmKind::ItemKnn => (KnnBasic::new().into(), "Item KNN"),
            AlgorithmKind::Svd => (Svd::new().into(), "SVD"),
            AlgorithmKind::ContentKnn => {
                (ContentKnn::new(movielens.catalog()).into(), "ContentKNN")
            }
            AlgorithmKind::Autorec => (AutoRec::new().into(), "AutoRec"),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    User,
    Item,
}

impl From<Mode> for CfMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::User => CfMode::User,
            Mode::Item => CfMode::Item,
        }
    }
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
    let config = load_config(&cli)?;

    println!("Loading MovieLens dataset from {}...", cli.data_dir.display());
    let start = Instant::now();
    let movielens = MovieLens::load_from_files(&cli.data_dir)
        .context("Failed to load MovieLens dataset")?;
    let (users, movies, ratings) = movielens.counts();
    println!(
        "{} Loaded {} ratings of {} movies by {} users in {:?}",
        "✓".green(),
        ratings,
        movies,
        users,
        start.elapsed()
    );

    match cli.command {
        Commands::BakeOff => handle_bake_off(&movielens, config, cli.json)?,
        Commands::Content { user_id, samples } => {
            handle_content(&movielens, config, user_id, samples, cli.json)?
        }
        Commands::Evaluate { algorithm, top_n } => {
            handle_evaluate(&movielens, config, &algorithm, top_n, cli.json)?
        }
        Commands::CfHitRate { mode, k } => {
            handle_cf_hit_rate(&movielens, config, mode.into(), k, cli.json)?
        }
        Commands::Autorec { epochs, top_n } => {
            handle_autorec(&movielens, config, epochs, top_n, cli.json)?
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<EvaluationConfig> {
    let mut config = match &cli.config {
        Some(path) => EvaluationConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => EvaluationConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }
    debug!("Evaluation settings: {:?}", config);
    Ok(config)
}

fn evaluator(movielens: &MovieLens, config: EvaluationConfig) -> Result<Evaluator> {
    println!("Preparing train/test and leave-one-out splits...");
    Evaluator::new(movielens.dataset(), config).context("Failed to prepare evaluation data")
}

/// Handle the 'bake-off' command
fn handle_bake_off(movielens: &MovieLens, config: EvaluationConfig, json: bool) -> Result<()> {
    let report = evaluator(movielens, config)?
        .add_algorithm(Svd::new(), "SVD")
        .add_algorithm(NormalPredictor::new(), "Random")
        .evaluate(true)
        .context("Evaluation failed")?;

    print_report(&report, json)
}

/// Handle the 'content' command
fn handle_content(
    movielens: &MovieLens,
    config: EvaluationConfig,
    user_id: UserId,
    samples: usize,
    json: bool,
) -> Result<()> {
    let evaluator = evaluator(movielens, config)?
        .add_algorithm(ContentKnn::new(movielens.catalog()), "ContentKNN")
        .add_algorithm(NormalPredictor::new(), "Random");

    let report = evaluator.evaluate(false).context("Evaluation failed")?;
    let recs = evaluator
        .sample_top_n_recs(user_id, samples)
        .with_context(|| format!("Failed to sample recommendations for user {}", user_id))?;

    if json {
        let output = serde_json::json!({ "report": report, "samples": recs });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_report(&report, false)?;
    for (name, items) in &recs {
        print_sample(movielens, user_id, name, items);
    }
    Ok(())
}

/// Handle the 'evaluate' command
fn handle_evaluate(
    movielens: &MovieLens,
    config: EvaluationConfig,
    kinds: &[AlgorithmKind],
    top_n: bool,
    json: bool,
) -> Result<()> {
    let evaluator = kinds.iter().fold(evaluator(movielens, config)?, |evaluator, kind| {
        let (algorithm, name) = kind.build(movielens);
        evaluator.add_algorithm(algorithm, name)
    });

    let report = evaluator.evaluate(top_n).context("Evaluation failed")?;
    print_report(&report, json)
}

/// Handle the 'cf-hit-rate' command
fn handle_cf_hit_rate(
    movielens: &MovieLens,
    config: EvaluationConfig,
    mode: CfMode,
    k: usize,
    json: bool,
) -> Result<()> {
    let data = EvaluationData::with_similarity_source(movielens.dataset(), &config, None)
        .context("Failed to prepare evaluation data")?;
    let trainset = data.loocv_trainset();

    let source = match mode {
        CfMode::User => CosineSimilarity::user_based(),
        CfMode::Item => CosineSimilarity::item_based(),
    };
    let start = Instant::now();
    let sims = source
        .similarities(&trainset)
        .context("Failed to compute similarities")?;
    let lists = NeighborhoodTopN::new(mode).with_k(k).top_n(&trainset, &sims);
    println!(
        "{} Built {} top-N lists in {:?}",
        "✓".green(),
        lists.len(),
        start.elapsed()
    );

    let left_out: Vec<Prediction> = data
        .loocv_testset()
        .iter()
        .map(|r| Prediction {
            user_id: r.user_id,
            movie_id: r.movie_id,
            actual: Some(r.rating),
            estimate: r.rating,
            was_impossible: false,
        })
        .collect();
    let hit_rate = metrics::hit_rate(&lists, &left_out);

    if json {
        let output = serde_json::json!({
            "mode": format!("{:?}", mode),
            "k": k,
            "hit_rate": hit_rate,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    match hit_rate {
        Some(hr) => println!("{} {:.4}", "HR".bold(), hr),
        None => println!("{} n/a (no held-out ratings)", "HR".bold()),
    }
    Ok(())
}

/// Handle the 'autorec' command
fn handle_autorec(
    movielens: &MovieLens,
    config: EvaluationConfig,
    epochs: usize,
    top_n: bool,
    json: bool,
) -> Result<()> {
    let report = evaluator(movielens, config)?
        .add_algorithm(AutoRec::new().with_epochs(epochs), "AutoRec")
        .add_algorithm(NormalPredictor::new(), "Random")
        .evaluate(top_n)
        .context("Evaluation failed")?;

    print_report(&report, json)
}

fn print_report(report: &EvaluationReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!();
    println!("{}", "Evaluation Results:".bold().blue());
    print!("{}", report);
    Ok(())
}

fn print_sample(movielens: &MovieLens, user_id: UserId, name: &str, items: &[ScoredItem]) {
    println!();
    println!("{}", format!("Recommendations for user {} ({}):", user_id, name).bold().blue());
    if items.is_empty() {
        println!("  (none: unknown user or nothing left to recommend)");
        return;
    }
    for (rank, item) in items.iter().enumerate() {
        println!(
            "{}. {} - {:.2}",
            (rank + 1).to_string().green(),
            movielens.movie_title(item.movie_id),
            item.estimate
        );
    }
}
