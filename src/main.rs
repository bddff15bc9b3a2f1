mod archives;
mod authoryear;
mod bibentry;
mod boundary;
mod context;
mod dedup;
mod engine;
mod numbered;
mod resolve;
mod types;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use engine::EngineConfig;
use types::{ArchiveMention, ContextExcerpt, PaperTarget};

#[derive(Parser)]
#[command(name = "citectx", about = "Locate citations of a paper or dataset in paper text")]
struct Cli {
    /// UTF-8 text file containing the citing paper's full text
    file: PathBuf,

    /// DOI of the cited work
    #[arg(long)]
    doi: Option<String>,

    /// Author surname of the cited work (repeatable, citation order)
    #[arg(long = "author")]
    authors: Vec<String>,

    /// Publication year of the cited work
    #[arg(long)]
    year: Option<i32>,

    /// Title of the cited work
    #[arg(long)]
    title: Option<String>,

    /// Also scan for dataset-archive identifiers
    #[arg(long)]
    archives: bool,

    /// Context budget in characters for citation excerpts
    #[arg(long, default_value_t = 500)]
    context_chars: usize,

    /// Context budget in words for archive and body-citation excerpts
    #[arg(long, default_value_t = 100)]
    context_words: usize,

    /// Accepted distance from the given publication year
    #[arg(long, default_value_t = 1)]
    year_tolerance: u32,

    /// Merge same-identifier archive detections within this many characters
    #[arg(long, default_value_t = 200)]
    proximity_threshold: usize,

    /// Keep matches found inside the reference list
    #[arg(long)]
    include_bibliography: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Serialize)]
struct Output {
    citations: Vec<ContextExcerpt>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    archive_mentions: Vec<ArchiveMention>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let text = std::fs::read_to_string(&cli.file)
        .with_context(|| format!("Failed to read: {}", cli.file.display()))?;

    let target = PaperTarget {
        doi: cli.doi,
        authors: cli.authors,
        year: cli.year,
        title: cli.title,
    };
    if target.is_empty() && !cli.archives {
        bail!("no citation target given; pass --doi, --author/--year, --title, or --archives");
    }

    // A paper whose main text ends almost immediately is metadata-only and
    // produces junk citation positions. The archive scan is exempt: a
    // references-only text (metadata fallbacks yield exactly that) still
    // carries bibliography mentions worth reporting.
    if !target.is_empty() && boundary::doi_density_start(&text) < 1000 {
        bail!("insufficient main text before the reference section");
    }

    let cfg = EngineConfig {
        context_chars: cli.context_chars,
        context_words: cli.context_words,
        year_tolerance: cli.year_tolerance,
        proximity_threshold: cli.proximity_threshold,
        exclude_bibliography: !cli.include_bibliography,
    };

    let citations = engine::find_citation_contexts(&text, &target, &cfg);
    let archive_mentions = if cli.archives {
        engine::find_archive_contexts(&text, &cfg)
    } else {
        Vec::new()
    };

    print_output(&Output { citations, archive_mentions }, cli.pretty)
}

fn print_output(output: &Output, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(output)?
    } else {
        serde_json::to_string(output)?
    };
    println!("{json}");
    Ok(())
}
