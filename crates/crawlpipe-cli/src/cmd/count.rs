//! Count subcommand - number of crawled pages

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::config::Config;

#[derive(Args, Debug)]
pub struct CountArgs {
    /// Crawl directory (default: [input] data_dir)
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,
}

pub fn run(args: CountArgs, config: &Config) -> Result<()> {
    let data_dir = config.data_dir(args.data_dir);
    let count = crawlpipe_core::nb_crawled_urls(&data_dir)
        .with_context(|| format!("Failed to count crawled urls in {}", data_dir.display()))?;
    println!("{count}");
    Ok(())
}
