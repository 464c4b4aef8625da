use chrono::Utc;
use clap::{Parser, Subcommand};
use fact_search_core::{
    build_corpus_best_effort, generate_title, AnswerEngine, FactIndex, Index, IndexConfig,
};
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "fact-search", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Minimum paragraph length in runes; shorter facts are skipped.
    #[arg(long, default_value = "40")]
    min_paragraph_runes: usize,

    /// Maximum number of indexed facts (0 = unlimited).
    #[arg(long, default_value = "0")]
    max_docs: usize,
}

#[derive(Subcommand)]
enum Command {
    /// Answer a question against the corpus, or decline.
    Ask {
        /// Markdown file or folder of Markdown files.
        #[arg(long)]
        corpus: String,
        /// The question to answer.
        #[arg(long)]
        prompt: String,
        /// Acceptance threshold on the raw index score, in [0, 1].
        #[arg(long, default_value = "0.32", env = "FACT_SEARCH_THRESHOLD")]
        threshold: f64,
    },
    /// Print the raw ranked snippets for a query.
    Search {
        #[arg(long)]
        corpus: String,
        #[arg(long)]
        query: String,
        /// Number of snippets to return.
        #[arg(long, default_value = "10")]
        top_k: usize,
        /// Emit the hits as a JSON array instead of plain lines.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Scan a folder and report which Markdown files would be indexed.
    Ingest {
        #[arg(long)]
        folder: String,
    },
}

fn build_index(corpus: &str, config: IndexConfig) -> anyhow::Result<FactIndex> {
    let path = Path::new(corpus);
    if path.is_dir() {
        let report = build_corpus_best_effort(path)?;
        for skipped in &report.skipped_files {
            warn!(path = %skipped.path.display(), reason = %skipped.reason, "skipped file");
        }
        info!(files = report.files.len(), "corpus folder loaded");
        Ok(FactIndex::from_text(&report.text, config))
    } else {
        Ok(FactIndex::from_markdown_file(path, config)?)
    }
}

fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = IndexConfig {
        min_paragraph_runes: cli.min_paragraph_runes,
        max_docs: cli.max_docs,
        ..Default::default()
    };

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "fact-search boot"
    );

    match cli.command {
        Command::Ask {
            corpus,
            prompt,
            threshold,
        } => {
            if !(0.0..=1.0).contains(&threshold) {
                anyhow::bail!("--threshold must be between 0 and 1");
            }
            let index = build_index(&corpus, config)?;
            info!(facts = index.len(), "index built");

            let engine = AnswerEngine::new(index, threshold);
            let answer = engine.retrieve(&prompt);

            println!("{}", answer.reply);
            match answer.score {
                Some(score) => {
                    println!("score: {score:.4}");
                    let title = generate_title(&prompt, 0);
                    if !title.is_empty() {
                        println!("suggested_title: {title}");
                    }
                }
                None => println!("score: n/a"),
            }
        }
        Command::Search {
            corpus,
            query,
            top_k,
            json,
        } => {
            let index = build_index(&corpus, config)?;
            let hits = index.top_k(&query, top_k);
            if json {
                println!("{}", serde_json::to_string_pretty(&hits)?);
            } else {
                if hits.is_empty() {
                    println!("no matches");
                }
                for (rank, hit) in hits.iter().enumerate() {
                    println!("[{rank}] score={:.4} snippet={}", hit.score, hit.snippet);
                }
            }
        }
        Command::Ingest { folder } => {
            let report = build_corpus_best_effort(Path::new(&folder))?;
            for file in &report.files {
                println!(
                    "{} checksum={} ingested_at={}",
                    file.source_path,
                    &file.checksum[..12],
                    file.ingested_at.to_rfc3339()
                );
            }
            for skipped in &report.skipped_files {
                warn!(path = %skipped.path.display(), reason = %skipped.reason, "skipped file");
            }
            println!(
                "{} file(s), {} skipped, {} corpus bytes",
                report.files.len(),
                report.skipped_files.len(),
                report.text.len()
            );
        }
    }

    Ok(())
}
