//! # qagen CLI
//!
//! The `qagen` binary drives the Q&A generation pipeline and offers a few
//! commands for inspecting the similarity index and the prompt.
//!
//! ## Usage
//!
//! ```bash
//! qagen --config ./config/qagen.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `qagen run <dir>` | Generate Q&A artifacts for every PDF in `<dir>` |
//! | `qagen init` | Create or open the index collection and print its stats |
//! | `qagen query "<text>"` | Print the stored texts most similar to `<text>` |
//! | `qagen prompt <file>` | Print the prompt that would be sent for one PDF |
//!
//! Without `--config`, `./config/qagen.toml` is used if present, otherwise
//! built-in defaults.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};

use qagen::config::{self, Config};
use qagen::progress::ProgressMode;
use qagen::index::SimilarityIndex;
use qagen::{batch, extract, index, logging, prompt};

const DEFAULT_CONFIG: &str = "./config/qagen.toml";

/// qagen: generate question/answer training data from PDF documents.
#[derive(Parser)]
#[command(
    name = "qagen",
    about = "Generate question/answer training data from PDF documents",
    version,
    long_about = "qagen extracts the leading pages of each PDF in a directory, relates it \
    to similar documents through a similarity index, asks a local chat model for \
    question/answer pairs, and writes one JSON artifact per document."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/qagen.toml` when it exists; otherwise built-in
    /// defaults are used.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Progress output on stderr. Defaults to `human` on a terminal, `off` otherwise.
    #[arg(long, global = true, value_enum)]
    progress: Option<ProgressMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate Q&A artifacts for every PDF in a directory.
    ///
    /// Files are processed concurrently (`[pipeline].pool_size`). A file
    /// that fails is logged and skipped; the run still succeeds.
    Run {
        /// Directory containing the `.pdf` files (not searched recursively).
        dir: PathBuf,

        /// Maximum number of leading pages to read per file.
        #[arg(long)]
        pages: Option<i64>,

        /// List the files that would be processed and exit.
        #[arg(long)]
        dry_run: bool,
    },

    /// Create the index collection if absent and print its stats.
    Init,

    /// Print the stored texts most similar to a query.
    Query {
        /// Query text.
        text: String,

        /// Number of results (defaults to `[pipeline].similar_k`).
        #[arg(long)]
        k: Option<usize>,
    },

    /// Print the prompt that would be sent for one PDF.
    ///
    /// Reads the index but never writes to it; no model call is made.
    Prompt {
        /// Path to the PDF.
        file: PathBuf,

        /// Maximum number of leading pages to read.
        #[arg(long)]
        pages: Option<i64>,
    },
}

fn resolve_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => config::load_config(path),
        None if Path::new(DEFAULT_CONFIG).exists() => config::load_config(Path::new(DEFAULT_CONFIG)),
        None => Ok(Config::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = resolve_config(cli.config.as_deref())?;

    if let Commands::Run {
        dir, dry_run: true, ..
    } = &cli.command
    {
        let files = batch::discover_pdfs(dir)?;
        println!("run {} (dry-run)", dir.display());
        for file in &files {
            println!("  {}", file.display());
        }
        println!("  files found: {}", files.len());
        return Ok(());
    }

    logging::init(&cfg.logging)?;

    match cli.command {
        Commands::Run { dir, pages, .. } => {
            let page_cap = pages.unwrap_or(cfg.pipeline.page_cap);
            let mode = cli.progress.unwrap_or_else(ProgressMode::default_for_tty);
            let reporter = mode.reporter();
            let summary = batch::run(&cfg, &dir, page_cap, reporter.as_ref()).await?;

            println!("run {}", dir.display());
            println!("  discovered: {}", summary.discovered);
            println!("  persisted: {}", summary.persisted);
            println!("  skipped: {}", summary.skipped);
            println!("  aborted: {}", summary.aborted);
            println!("  output: {}", cfg.pipeline.output_dir.display());
            println!("ok");
        }
        Commands::Init => {
            let similarity = open_index(&cfg).await?;
            let stats = similarity.stats().await?;
            println!("index {}", stats.collection);
            println!("  backend: {}", stats.backend);
            println!("  embedding: {}", stats.embedding_model);
            println!("  entries: {}", stats.entries);
            println!("ok");
        }
        Commands::Query { text, k } => {
            let similarity = open_index(&cfg).await?;
            let k = k.unwrap_or(cfg.pipeline.similar_k);
            let hits = similarity.query(&text, k).await?;
            println!("query {} (k={})", similarity.collection(), k);
            if hits.is_empty() {
                println!("No results.");
            }
            for (i, hit) in hits.iter().enumerate() {
                println!("{}. {}", i + 1, snippet(hit, 200));
            }
        }
        Commands::Prompt { file, pages } => {
            let page_cap = pages.unwrap_or(cfg.pipeline.page_cap);
            let text = extract::extract_text(&file, page_cap);
            let similarity = open_index(&cfg).await?;
            let similar = similarity.query(&text, cfg.pipeline.similar_k).await?;
            println!(
                "{}",
                prompt::build_prompt(&text, &similar, cfg.pipeline.question_count)
            );
        }
    }

    Ok(())
}

/// Opens the configured index for the inspection commands, warning on
/// stderr when there is nothing a previous run could have left behind.
async fn open_index(cfg: &Config) -> Result<SimilarityIndex> {
    if cfg.index.backend == "memory" {
        eprintln!(
            "warning: index backend is \"memory\"; it starts empty in every process. \
             Set [index].backend = \"sqlite\" to inspect what `qagen run` stored."
        );
    }
    let similarity = index::setup(&cfg.index, &cfg.embedding).await?;
    if similarity.is_empty().await? {
        eprintln!("note: collection {} has no entries", similarity.collection());
    }
    Ok(similarity)
}

fn snippet(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}
