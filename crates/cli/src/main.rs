use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::{Artifacts, parser};
use rand::Rng;
use recommender::Recommender;
use server::{
    Config, Fetched, MovieRecommendation, RecommendationOrchestrator, RecommendationOutcome,
    ensure_artifact, load_from_config,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// movie-recs - Similar movie recommender
#[derive(Parser)]
#[command(name = "movie-recs")]
#[command(about = "Recommend movies similar to a title using a precomputed similarity matrix", long_about = None)]
struct Cli {
    /// Catalog artifact (overrides CATALOG_PATH)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Similarity artifact (overrides SIMILARITY_PATH)
    #[arg(long, global = true)]
    similarity: Option<PathBuf>,

    /// Download location for a missing similarity artifact (overrides SIMILARITY_URL)
    #[arg(long, global = true)]
    similarity_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List catalog titles
    List {
        /// Only show titles containing this text (case-insensitive)
        #[arg(long)]
        filter: Option<String>,

        /// Maximum number of titles to print
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show the 5 movies most similar to a title
    Recommend {
        /// Exact catalog title
        #[arg(long)]
        title: String,

        /// Skip TMDB lookups and use placeholder posters
        #[arg(long)]
        no_posters: bool,

        /// Show similarity scores and catalog positions
        #[arg(long)]
        explain: bool,
    },

    /// Download the similarity artifact if it is not cached yet
    Fetch,

    /// Convert a JSON similarity matrix to the binary format
    Convert {
        /// Nested-array JSON matrix
        #[arg(long)]
        input: PathBuf,

        /// Binary output path
        #[arg(long)]
        output: PathBuf,
    },

    /// Time ranking over random catalog titles
    Benchmark {
        /// Number of lookups to make
        #[arg(long, default_value = "1000")]
        requests: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env().context("Failed to read configuration")?;
    if let Some(path) = cli.catalog {
        config.catalog_path = path;
    }
    if let Some(path) = cli.similarity {
        config.similarity_path = path;
    }
    if let Some(url) = cli.similarity_url {
        config.similarity_url = Some(url);
    }

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::List { filter, limit } => {
            let artifacts = load(&config).await?;
            handle_list(&artifacts, filter.as_deref(), limit);
        }
        Commands::Recommend {
            title,
            no_posters,
            explain,
        } => {
            let artifacts = load(&config).await?;
            handle_recommend(&config, artifacts, &title, no_posters, explain).await?;
        }
        Commands::Fetch => handle_fetch(&config).await?,
        Commands::Convert { input, output } => handle_convert(input, output).await?,
        Commands::Benchmark { requests } => {
            let artifacts = load(&config).await?;
            handle_benchmark(artifacts, requests)?;
        }
    }

    Ok(())
}

/// Load artifacts, fetching the similarity matrix first if needed
async fn load(config: &Config) -> Result<Arc<Artifacts>> {
    println!("Loading artifacts from {}...", config.catalog_path.display());
    let start = Instant::now();
    let artifacts = load_from_config(config).await?;
    println!(
        "{} Loaded {} movies in {:?}",
        "✓".green(),
        artifacts.len(),
        start.elapsed()
    );
    Ok(artifacts)
}

/// Handle the 'list' command
fn handle_list(artifacts: &Artifacts, filter: Option<&str>, limit: Option<usize>) {
    let catalog = artifacts.catalog();
    let matches = match filter {
        Some(fragment) => catalog.search(fragment),
        None => catalog.records().iter().enumerate().collect(),
    };

    let shown = limit.unwrap_or(matches.len()).min(matches.len());
    for (index, movie) in matches.iter().take(shown) {
        let year = movie
            .year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        println!("{:>6}  {} ({})", index.to_string().dimmed(), movie.title, year);
    }
    if shown < matches.len() {
        println!("... {} more", matches.len() - shown);
    }
}

/// Handle the 'recommend' command
async fn handle_recommend(
    config: &Config,
    artifacts: Arc<Artifacts>,
    title: &str,
    no_posters: bool,
    explain: bool,
) -> Result<()> {
    let posters = config.poster_source(no_posters)?;
    let orchestrator = RecommendationOrchestrator::new(artifacts, posters);

    let outcome = orchestrator.get_recommendations(title).await?;
    match &outcome {
        RecommendationOutcome::Found(recommendations) => {
            print_recommendations(title, recommendations, explain)
        }
        RecommendationOutcome::NotFound { message, .. } => {
            println!("{} {}", "✗".red(), message);
        }
    }
    Ok(())
}

/// Handle the 'fetch' command
async fn handle_fetch(config: &Config) -> Result<()> {
    let http_client = reqwest::Client::builder()
        .connect_timeout(config.http_timeout())
        .build()
        .context("Failed to build HTTP client")?;

    let fetched = ensure_artifact(
        &http_client,
        &config.similarity_path,
        config.similarity_url.as_deref(),
    )
    .await?;

    match fetched {
        Fetched::AlreadyPresent => println!(
            "{} {} already present",
            "✓".green(),
            config.similarity_path.display()
        ),
        Fetched::Downloaded { bytes } => println!(
            "{} Downloaded {} bytes to {}",
            "✓".green(),
            bytes,
            config.similarity_path.display()
        ),
    }
    Ok(())
}

/// Handle the 'convert' command
async fn handle_convert(input: PathBuf, output: PathBuf) -> Result<()> {
    let start = Instant::now();
    let size = tokio::task::spawn_blocking(move || -> Result<usize> {
        let matrix = parser::parse_similarity(&input)
            .with_context(|| format!("Failed to read {}", input.display()))?;
        parser::write_similarity_bin(&output, &matrix)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        Ok(matrix.size())
    })
    .await
    .context("Conversion task panicked")??;

    println!(
        "{} Converted {}x{} matrix in {:?}",
        "✓".green(),
        size,
        size,
        start.elapsed()
    );
    Ok(())
}

/// Handle the 'benchmark' command
fn handle_benchmark(artifacts: Arc<Artifacts>, requests: usize) -> Result<()> {
    if requests == 0 {
        bail!("--requests must be at least 1");
    }
    if artifacts.is_empty() {
        bail!("Catalog is empty, nothing to benchmark");
    }

    let recommender = Recommender::new(artifacts.clone());
    let catalog = artifacts.catalog();

    // Pick random titles from the catalog
    let mut rng = rand::rng();
    let titles: Vec<&str> = (0..requests)
        .map(|_| {
            let index = rng.random_range(0..catalog.len());
            catalog.records()[index].title.as_str()
        })
        .collect();

    // Time each lookup, sequentially
    let mut timings: Vec<Duration> = Vec::with_capacity(requests);
    for title in titles {
        let start = Instant::now();
        recommender.recommend_title(title)?;
        timings.push(start.elapsed());
    }

    let total_time: Duration = timings.iter().sum();
    let avg_latency = average(total_time, timings.len());
    timings.sort();
    let percentile = |p: f32| timings[((timings.len() as f32 * p) as usize).min(timings.len() - 1)];
    let throughput = requests as f32 / total_time.as_secs_f32();

    println!("Benchmark results:");
    println!("Total time: {:?}", total_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

/// Mean of `count` samples summing to `total`
fn average(total: Duration, count: usize) -> Duration {
    total.div_f64(count as f64)
}

/// Helper function to print result cards
fn print_recommendations(title: &str, recommendations: &[MovieRecommendation], explain: bool) {
    println!("{}", format!("Movies similar to '{}':", title).bold().blue());
    for (rank, rec) in recommendations.iter().enumerate() {
        println!("{}. {}", (rank + 1).to_string().green(), rec.title.bold());
        println!("   {}", rec.poster_url.dimmed());
        println!("   📅 {}", rec.year_caption());
        println!("   ⭐ {}", rec.rating_caption());
        if explain {
            println!(
                "   Similarity: {:.4} (catalog #{}, tmdb {})",
                rec.score, rec.index, rec.movie_id
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_latency() {
        assert_eq!(average(Duration::from_millis(1500), 3), Duration::from_millis(500));
    }

    #[test]
    fn test_average_latency_beyond_u32_samples() {
        // A count that truncates to 0 as u32 must still divide by the full count
        let count = u32::MAX as usize + 1;
        let avg = average(Duration::from_secs(count as u64), count);
        assert_eq!(avg, Duration::from_secs(1));
    }
}
