//! Stream subcommand - dump typed url streams as JSON lines

use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::builder::PossibleValuesParser;
use clap::{Args, ValueEnum};
use serde::Serialize;

use crawlpipe_core::content::content_type_names;
use crawlpipe_core::{
    CrawlManifest, DataStream, DataStreamFactory, HostStreamFactory, MetadataStreamFactory,
    PathStreamFactory, QueryStringStreamFactory, fmt_num,
};

use crate::config::Config;

#[derive(Args, Debug)]
pub struct StreamArgs {
    /// Stream to dump
    #[arg(value_enum)]
    pub kind: StreamKind,

    /// Crawl directory (default: [input] data_dir)
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Only read this partition
    #[arg(short, long)]
    pub part: Option<u64>,

    /// Metadata type for the metadata stream
    #[arg(
        long,
        default_value = "title",
        value_parser = PossibleValuesParser::new(content_type_names())
    )]
    pub content_type: String,
}

#[derive(Clone, Copy, ValueEnum, Debug)]
pub enum StreamKind {
    Host,
    Path,
    QueryString,
    Metadata,
}

pub fn run(args: StreamArgs, config: &Config) -> Result<()> {
    let data_dir = config.data_dir(args.data_dir);
    let manifest = CrawlManifest::load(&data_dir)
        .with_context(|| format!("Failed to load crawl manifest from {}", data_dir.display()))?;
    let start = Instant::now();

    let mut out = super::output_writer(None)?;
    let count = match args.kind {
        StreamKind::Host => {
            let factory = HostStreamFactory::new(&data_dir, &manifest, args.part)?;
            dump(factory.stream()?, &mut out)?
        }
        StreamKind::Path => {
            let factory = PathStreamFactory::new(&data_dir, &manifest, args.part)?;
            dump(factory.stream()?, &mut out)?
        }
        StreamKind::QueryString => {
            let factory = QueryStringStreamFactory::new(&data_dir, &manifest, args.part)?;
            dump(factory.stream()?, &mut out)?
        }
        StreamKind::Metadata => {
            let factory =
                MetadataStreamFactory::new(&data_dir, &args.content_type, &manifest, args.part)?;
            dump(factory.stream()?, &mut out)?
        }
    };
    out.flush()?;

    log::info!(
        "Streamed {} {:?} entries in {:.1}s",
        fmt_num(count),
        args.kind,
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

fn dump<T: Serialize>(stream: DataStream<T>, out: &mut dyn Write) -> Result<usize> {
    let mut count = 0;
    for item in stream {
        serde_json::to_writer(&mut *out, &item?)?;
        out.write_all(b"\n")?;
        count += 1;
    }
    Ok(count)
}
