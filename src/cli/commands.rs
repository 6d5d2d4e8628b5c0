//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to the analysis
//! pipeline.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use conversense::config::ConversenseConfig;
use conversense::models::{AnalysisResult, Message, SummaryAggregate};
use conversense::pipeline::ConversationPipeline;
use conversense::sink::{JsonlSink, ResultSink};
use conversense::source::{decode_records, MessageRecord};
use conversense::watermark::IngestionWatermark;

#[derive(Parser)]
#[command(name = "conversense")]
#[command(about = "Conversation ingestion and sentiment analysis system")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a batch of message records and print a sentiment summary
    Analyze {
        /// JSON file containing an array of message records
        #[arg(short, long)]
        input: PathBuf,

        /// Write per-message results to this JSONL file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Summarize a previously written JSONL result file
    Summarize {
        /// JSONL file of analysis results
        #[arg(short, long)]
        input: PathBuf,
    },
}

/// Parse arguments and run the selected command.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ConversenseConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze { input, output } => analyze(&config, &input, output.as_deref()).await,
        Commands::Summarize { input } => summarize(&config, &input).await,
    }
}

async fn analyze(
    config: &ConversenseConfig,
    input: &Path,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let contents = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let records: Vec<MessageRecord> =
        serde_json::from_str(&contents).context("failed to parse message records")?;

    let (messages, skipped) = decode_records(records);
    if skipped > 0 {
        eprintln!("Skipped {} malformed record(s)", skipped);
    }

    // Group by conversation, preserving arrival order within each.
    let mut conversations: BTreeMap<String, Vec<Message>> = BTreeMap::new();
    for message in messages {
        conversations
            .entry(message.conversation_id.clone())
            .or_default()
            .push(message);
    }

    let pipeline = ConversationPipeline::new(config)?;
    let mut watermark = IngestionWatermark::new();
    let sink = match output {
        Some(path) => Some(JsonlSink::create(path).await?),
        None => None,
    };

    let total: usize = conversations.values().map(|m| m.len()).sum();
    let progress = ProgressBar::new(total as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} {msg} [{bar:30.cyan/blue}] {pos}/{len}")
            .unwrap()
            .progress_chars("█▓░"),
    );

    let mut all_results: Vec<AnalysisResult> = Vec::new();
    for (conversation_id, batch) in &conversations {
        progress.set_message(conversation_id.clone());

        let fresh = watermark.filter_new(conversation_id, batch);
        info!(
            conversation_id,
            observed = batch.len(),
            fresh = fresh.len(),
            "filtered conversation batch"
        );
        progress.inc((batch.len() - fresh.len()) as u64);

        let results = pipeline.run_batch(&fresh).await;
        progress.inc(results.len() as u64);

        if let Some(sink) = &sink {
            for result in &results {
                sink.store(result).await?;
            }
        }
        all_results.extend(results);
    }
    progress.finish_and_clear();

    if let Some(sink) = &sink {
        sink.flush().await?;
    }

    print_summary(&pipeline.summarize(&all_results));
    Ok(())
}

async fn summarize(config: &ConversenseConfig, input: &Path) -> anyhow::Result<()> {
    let contents = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;

    let results: Vec<AnalysisResult> = contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(serde_json::from_str)
        .collect::<Result<_, _>>()
        .context("failed to parse analysis results")?;

    let pipeline = ConversationPipeline::new(config)?;
    print_summary(&pipeline.summarize(&results));
    Ok(())
}

fn print_summary(summary: &SummaryAggregate) {
    println!("Messages analyzed: {}", summary.total);
    println!(
        "Succeeded: {} (failed: {})",
        summary.succeeded,
        summary.total - summary.succeeded
    );
    println!(
        "  positive: {:>4}  ({:.1}%)",
        summary.counts.positive, summary.percentages.positive
    );
    println!(
        "  negative: {:>4}  ({:.1}%)",
        summary.counts.negative, summary.percentages.negative
    );
    println!(
        "  neutral:  {:>4}  ({:.1}%)",
        summary.counts.neutral, summary.percentages.neutral
    );
    println!("Average confidence: {:.2}", summary.average_confidence);
    println!("Overall sentiment: {}", summary.overall_label);
}
