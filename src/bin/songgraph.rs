//! Songgraph CLI: song grouping service and offline report.
//!
//! Usage:
//!   songgraph serve [--bind addr] [--config file] [--marker m]...
//!   songgraph report <songs.json> [--config file] [--marker m]...

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use songgraph::{AppState, Config, Ingestor, ItemGraph, Song, TextReport};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "songgraph",
    version,
    about = "Groups song variants into connected clusters"
)]
struct Cli {
    /// Path to a YAML config file
    #[arg(long, global = true, env = "SONGGRAPH_CONFIG")]
    config: Option<PathBuf>,

    /// Variant marker to strip from titles (repeatable; replaces the configured list)
    #[arg(long = "marker", global = true)]
    markers: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service
    Serve {
        /// Address to listen on
        #[arg(long, env = "SONGGRAPH_BIND")]
        bind: Option<SocketAddr>,
    },
    /// Group the songs in a JSON file and print the text report
    Report {
        /// File holding a JSON array of songs, ingested in order
        file: PathBuf,
    },
}

fn load_songs(path: &Path) -> Result<Vec<Song>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid song list in {}", path.display()))
}

async fn cmd_serve(config: Config) -> Result<()> {
    let state = AppState::new(config.key_deriver());
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    info!("songgraph listening on http://{}", config.bind);
    info!("variant markers: {:?}", config.markers);

    songgraph::server::serve(listener, state).await?;
    Ok(())
}

fn cmd_report(config: Config, file: &Path) -> Result<()> {
    let songs = load_songs(file)?;
    let ingestor = Ingestor::with_deriver(Arc::new(ItemGraph::new()), config.key_deriver());
    ingestor.ingest_all(songs)?;

    let mut report = TextReport::new(String::new());
    let groups = ingestor.graph().grouping_traversal(&mut report)?;
    print!("{}", report.into_inner());
    info!(groups, songs = ingestor.graph().node_count(), "report complete");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?.with_markers(cli.markers);

    match cli.command {
        Commands::Serve { bind } => {
            info!("Starting songgraph v{}", songgraph::VERSION);
            cmd_serve(config.with_bind(bind)).await
        }
        Commands::Report { file } => cmd_report(config, &file),
    }
}
