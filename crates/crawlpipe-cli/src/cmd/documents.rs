//! Documents subcommand - fold a feature's content into per-url JSON documents

use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use indicatif::ProgressBar;

use crawlpipe_core::progress::UPDATE_INTERVAL;
use crawlpipe_core::{CrawlManifest, ProgressContext, fmt_num};
use crawlpipe_features::{
    DocumentStream, DocumentStreamFactory, ExtractResultsStreamDef, Feature, VisitsStreamDef,
};

use crate::config::Config;

#[derive(Args, Debug)]
pub struct DocumentsArgs {
    /// Feature to fold
    #[arg(value_enum)]
    pub feature: FeatureArg,

    /// Crawl directory (default: [input] data_dir)
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Only read this partition
    #[arg(short, long)]
    pub part: Option<u64>,

    /// JSON lines output file, relative to [output] dir (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum, Debug)]
pub enum FeatureArg {
    Visits,
    Extract,
}

impl From<FeatureArg> for Feature {
    fn from(f: FeatureArg) -> Self {
        match f {
            FeatureArg::Visits => Feature::Visits,
            FeatureArg::Extract => Feature::Extract,
        }
    }
}

struct FoldSummary {
    documents: usize,
    elapsed: Duration,
}

pub fn run(args: DocumentsArgs, config: &Config, progress: &ProgressContext) -> Result<()> {
    let feature = Feature::from(args.feature);
    if feature == Feature::Visits && !config.analytics.enabled {
        anyhow::bail!("analytics import is disabled in the configuration");
    }

    let data_dir = config.data_dir(args.data_dir);
    let manifest = CrawlManifest::load(&data_dir)
        .with_context(|| format!("Failed to load crawl manifest from {}", data_dir.display()))?;
    log::info!(
        "Folding {} documents from {} (crawl boundary: url id {})",
        feature.name(),
        data_dir.display(),
        manifest.max_crawled_urlid()
    );

    let output = args.output.map(|p| config.output_path(p));
    let mut out = super::output_writer(output.as_deref())?;
    let pb = progress.counter_line("documents");
    let summary = match feature {
        Feature::Visits => {
            let factory =
                DocumentStreamFactory::new(&data_dir, VisitsStreamDef, &manifest, args.part)?;
            write_documents(&factory, feature, &mut out, &pb)?
        }
        Feature::Extract => {
            let factory = DocumentStreamFactory::new(
                &data_dir,
                ExtractResultsStreamDef,
                &manifest,
                args.part,
            )?;
            write_documents(&factory, feature, &mut out, &pb)?
        }
    };
    pb.finish_and_clear();
    out.flush()?;

    if progress.is_tty() {
        print_summary(feature, &summary, output.as_deref());
    } else {
        log::info!(
            "Wrote {} {} documents in {:.1}s",
            fmt_num(summary.documents),
            feature.name(),
            summary.elapsed.as_secs_f64()
        );
    }
    Ok(())
}

fn write_documents<S: DocumentStream>(
    factory: &DocumentStreamFactory<'_, S>,
    feature: Feature,
    out: &mut dyn Write,
    pb: &ProgressBar,
) -> Result<FoldSummary> {
    let start = Instant::now();
    let mut documents = 0;
    for document in factory.documents()? {
        let document = document?;
        serde_json::to_writer(&mut *out, &document)
            .with_context(|| format!("Failed to write document for url id {}", document.id))?;
        out.write_all(b"\n")?;
        documents += 1;
        if documents % UPDATE_INTERVAL == 0 {
            pb.set_message(format!("{} {}", fmt_num(documents), feature.name()));
        }
    }
    Ok(FoldSummary {
        documents,
        elapsed: start.elapsed(),
    })
}

fn print_summary(feature: Feature, summary: &FoldSummary, output: Option<&std::path::Path>) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new(format!("{} documents", feature.name())).fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);
    let rows = [
        ("Content", feature.content().to_string()),
        ("Documents", fmt_num(summary.documents)),
        ("Time", format!("{:.1}s", summary.elapsed.as_secs_f64())),
        (
            "Output",
            output.map_or_else(|| "stdout".to_string(), |p| p.display().to_string()),
        ),
    ];
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label), Cell::new(value)]);
    }
    eprintln!("\n{table}");
}
