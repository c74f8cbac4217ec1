use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use namescout::config::Config;
use namescout::ner::onnx::OnnxEntityRecognizer;
use namescout::output::report::BatchReport;
use namescout::output::terminal;
use namescout::pipeline::batch::{self, BatchSettings};
use namescout::scrape::fetcher::HttpFetcher;

/// namescout: find the name variants the web uses for a public figure.
///
/// Searches the web, runs named-entity recognition over the result pages,
/// and reports the most frequent person names and how they cluster.
#[derive(Parser)]
#[command(name = "namescout", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the ONNX NER model (~430 MB)
    DownloadModel,

    /// Print the result URLs a search would process
    Search {
        /// The search query (e.g. "Miri Regev")
        query: String,

        /// Number of search results to request (10, 20, 30, 40, 50 or 100)
        #[arg(long)]
        results: Option<u32>,
    },

    /// Search, extract person names from every result page, count and cluster them
    Analyze {
        /// The search query (e.g. 'Miri Miriam Regev -"Netanyahu"')
        query: String,

        /// Number of search results to request (10, 20, 30, 40, 50 or 100)
        #[arg(long)]
        results: Option<u32>,

        #[command(flatten)]
        report: ReportArgs,
    },

    /// Like analyze, but read page URLs from a file instead of searching
    AnalyzeUrls {
        /// File with one URL per line ('#' comments and blank lines ignored)
        file: std::path::PathBuf,

        #[command(flatten)]
        report: ReportArgs,
    },
}

#[derive(Args)]
struct ReportArgs {
    /// Number of name clusters
    #[arg(long)]
    clusters: Option<usize>,

    /// How many of the most frequent names to show
    #[arg(long)]
    top: Option<usize>,

    /// Print the report as JSON instead of tables
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("namescout=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::DownloadModel => {
            let config = Config::load()?;
            let model_dir = &config.model_dir;

            println!("Downloading ONNX NER model...");
            println!("  Destination: {}", model_dir.display());

            namescout::ner::download::download_model(model_dir).await?;

            println!("\n{}", "Model downloaded successfully.".bold());
            println!("You can now run `namescout analyze \"<name>\"`.");
        }

        Commands::Search { query, results } => {
            let config = Config::load()?;
            let fetcher = HttpFetcher::new(config.timeout)?;
            let n_results = results.unwrap_or(config.n_results);

            let urls =
                namescout::scrape::search::search_urls(fetcher.client(), &query, n_results).await?;

            if urls.is_empty() {
                println!("No results found (the search page may have blocked the request).");
            }
            for url in &urls {
                println!("{url}");
            }
        }

        Commands::Analyze {
            query,
            results,
            report,
        } => {
            let config = Config::load()?;
            config.require_model()?;
            let fetcher = HttpFetcher::new(config.timeout)?;
            let n_results = results.unwrap_or(config.n_results);

            println!("Searching for \"{query}\" ({n_results} results)...");
            let urls =
                namescout::scrape::search::search_urls(fetcher.client(), &query, n_results).await?;

            run_batch(&config, &fetcher, Some(query), urls, &report).await?;
        }

        Commands::AnalyzeUrls { file, report } => {
            let config = Config::load()?;
            config.require_model()?;
            let fetcher = HttpFetcher::new(config.timeout)?;

            let contents = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read URL list {}", file.display()))?;
            let urls = parse_url_list(&contents);
            info!(count = urls.len(), file = %file.display(), "Loaded URL list");

            run_batch(&config, &fetcher, None, urls, &report).await?;
        }
    }

    Ok(())
}

/// Load the model, run the batch over `urls`, and print the report.
async fn run_batch(
    config: &Config,
    fetcher: &HttpFetcher,
    query: Option<String>,
    urls: Vec<String>,
    args: &ReportArgs,
) -> Result<()> {
    let recognizer = OnnxEntityRecognizer::load(&config.model_dir)?;
    let settings = BatchSettings {
        k: args.clusters.unwrap_or(config.k),
        seed: config.seed,
    };
    let top_n = args.top.unwrap_or(config.top_n);

    println!("Extracting names from {} pages...", urls.len());
    let outcome = batch::run(
        &urls,
        &config.site_filter(),
        fetcher,
        &recognizer,
        &settings,
    )
    .await;

    if args.json {
        let report = BatchReport::new(
            query,
            urls.len(),
            outcome.stats,
            &outcome.frequencies,
            top_n,
            outcome.clusters,
        );
        println!("{}", report.to_json()?);
        return Ok(());
    }

    terminal::display_stats(urls.len(), &outcome.stats);
    terminal::display_top_names(&outcome.frequencies, top_n);

    match &outcome.clusters {
        Ok(report) => {
            terminal::display_vocabulary(report);
            terminal::display_clusters(report);
        }
        Err(e) => {
            println!("\n{} {}", "Clustering skipped:".yellow(), e);
        }
    }

    Ok(())
}

/// One URL per line; blank lines and '#' comments are ignored.
fn parse_url_list(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
