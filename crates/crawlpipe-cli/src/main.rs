//! crawlpipe - Crawl output ETL
//!
//! Streams the gzip partitions a crawler writes and folds them into
//! per-url documents (traffic sources, extracted fields) as JSON lines.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "crawlpipe")]
#[command(about = "Stream and fold crawl output partitions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./crawlpipe.toml or ~/.config/crawlpipe/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Dump host, path, query string or metadata tuples as JSON lines
    Stream(cmd::stream::StreamArgs),
    /// Fold a feature into per-url documents
    Documents(cmd::documents::DocumentsArgs),
    /// List the public fields of the enabled features
    Fields,
    /// Count crawled pages up to the crawl boundary
    Count(cmd::count::CountArgs),
    /// Show current configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Progress context (TTY auto-detect)
    let progress = crawlpipe_core::ProgressContext::new();

    // Logging:
    //   TTY:     quiet (warn) unless --debug, the spinner shows activity
    //   non-TTY: info unless --debug, logs are the only progress indicator
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = if is_tty { !cli.debug } else { false };
    crawlpipe_core::init_logging(quiet, cli.debug, multi);

    let config = if let Some(path) = cli.config {
        Config::from_file(&path)?
    } else {
        Config::load()?
    };

    match cli.command {
        Command::Stream(args) => cmd::stream::run(args, &config),
        Command::Documents(args) => cmd::documents::run(args, &config, &progress),
        Command::Fields => cmd::fields::run(&config),
        Command::Count(args) => cmd::count::run(args, &config),
        Command::Config => cmd::config::run(&config),
    }
}
