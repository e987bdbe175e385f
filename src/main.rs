use anyhow::Context;
use clap::{Parser, Subcommand};
use showtime_finder::observability::{self, metrics};
use showtime_finder::{server, Aggregator, Config, Query, SearchReport};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "showtime_finder")]
#[command(about = "Find movie showtimes across Stuttgart-area theaters")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to $SHOWTIME_CONFIG, then ./config.toml, then built-ins)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search every theater for a movie
    Search {
        /// Movie name, matched case-insensitively
        movie: String,
        /// Specific sources to search (comma-separated)
        #[arg(long)]
        sources: Option<String>,
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
    /// List configured theaters and their websites
    Sources,
    /// Serve the search over HTTP
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Validate the configuration and exit
    CheckConfig,
}

fn parse_sources(sources: Option<String>) -> Vec<String> {
    sources
        .map(|list| {
            list.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn print_report(report: &SearchReport) {
    if report.matches.is_empty() {
        println!(
            "No showtimes found for \"{}\". Try another movie name or check back later.",
            report.movie
        );
    } else {
        println!("🎬 Found showtimes for \"{}\":", report.movie);
        for found in &report.matches {
            println!("\n{}", found.theater);
            if let Some(times) = &found.times {
                println!("   Showtimes: {}", times);
            }
            println!("   More info: {}", found.link);
        }
    }

    if report.degraded {
        println!("\n⚠️  No theater could be reached; results may be incomplete.");
    } else if !report.failures.is_empty() {
        println!("\n⚠️  Some theaters could not be searched:");
        for failure in &report.failures {
            println!("   - {}: {}", failure.theater, failure.reason);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    observability::init_logging();

    let cli = Cli::parse();
    let config = Config::resolve(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Commands::Search {
            movie,
            sources,
            json,
        } => {
            let query = Query::new(&movie)?;
            let config = config.restricted_to(&parse_sources(sources))?;
            let aggregator = Aggregator::from_config(&config)?;
            info!(sources = ?aggregator.source_ids(), "Searching");

            let report = aggregator.search_report(&query).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
        Commands::Sources => {
            for source in config.enabled_sources() {
                println!(
                    "{:<14} {:<34} {}",
                    source.id,
                    source.display_name,
                    source.canonical_link()
                );
            }
        }
        Commands::Serve { port } => {
            let handle = match metrics::init() {
                Ok(handle) => Some(handle),
                Err(e) => {
                    error!("Metrics disabled: {}", e);
                    None
                }
            };
            server::start_server(config, handle, port)
                .await
                .map_err(|e| anyhow::anyhow!("server failed: {}", e))?;
        }
        Commands::CheckConfig => {
            println!(
                "✅ Configuration OK: {} enabled source(s)",
                config.enabled_sources().count()
            );
        }
    }

    Ok(())
}
