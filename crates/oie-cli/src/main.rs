//! OIE CLI - Command-line interface
//!
//! Usage:
//!   oie extract --config oie.toml [--input sentences.tsv] [--workers N] [--threshold X] [--json]
//!   oie check --config oie.toml
//!
//! Input records are `[raw text TAB] graph-json`, one per line. Extractions
//! go to stdout, logs to stderr.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use oie_core::{AppConfig, ExtractorKind, LoggingConfig};
use oie_extractor::{OpenExtractor, ScoredExtraction, SentenceRecord};

#[derive(Parser)]
#[command(name = "oie")]
#[command(about = "Open relation extraction over dependency parses")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract relations from parsed sentences
    Extract {
        /// Configuration file
        #[arg(short, long)]
        config: PathBuf,
        /// Sentence records (defaults to stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Sentences processed concurrently
        #[arg(short, long)]
        workers: Option<usize>,
        /// Override the configured confidence threshold
        #[arg(short, long)]
        threshold: Option<f64>,
        /// Print one JSON object per extraction
        #[arg(long)]
        json: bool,
    },
    /// Load and validate a configuration and its models
    Check {
        /// Configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            config,
            input,
            workers,
            threshold,
            json,
        } => {
            let mut config = load_config(&config)?;
            if let Some(threshold) = threshold {
                config.extraction.confidence_threshold = threshold;
            }
            init_logging(&config.logging);

            let workers = workers.unwrap_or_else(default_workers).max(1);
            extract(&config, input.as_deref(), workers, json).await
        }
        Commands::Check { config } => {
            let config = load_config(&config)?;
            init_logging(&config.logging);
            check(&config)
        }
    }
}

fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    let config = AppConfig::from_file(path)?.with_env_override()?;
    Ok(config)
}

fn init_logging(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_file(logging.include_location)
        .with_line_number(logging.include_location);

    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

// ============================================================================
// Commands
// ============================================================================

async fn extract(
    config: &AppConfig,
    input: Option<&Path>,
    workers: usize,
    json: bool,
) -> anyhow::Result<()> {
    let pipeline = Arc::new(OpenExtractor::from_config(config)?);

    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open input {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let (sentences, extractions) = run_batch(pipeline, reader, workers, &mut out, json).await?;
    out.flush()?;

    tracing::info!(sentences, extractions, "Extraction finished");
    Ok(())
}

/// Extract every record of `reader` and write the results to `out`,
/// returning the number of records and extractions
async fn run_batch<R, W>(
    pipeline: Arc<OpenExtractor>,
    reader: R,
    workers: usize,
    out: &mut W,
    json: bool,
) -> anyhow::Result<(usize, usize)>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let lines = stream::unfold(reader, |mut reader| async move {
        let mut buf = Vec::new();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => None,
            Ok(_) => Some((Ok(buf), reader)),
            Err(e) => Some((Err(e), reader)),
        }
    });

    // results come back in input order
    let mut results = Box::pin(
        lines
            .enumerate()
            .map(|(i, line)| {
                let pipeline = Arc::clone(&pipeline);
                async move {
                    let bytes = line.context("Failed to read input")?;
                    let number = i + 1;
                    let handle = tokio::task::spawn_blocking(move || {
                        process_bytes(&pipeline, number, bytes)
                    });
                    Ok::<_, anyhow::Error>(handle.await??)
                }
            })
            .buffered(workers),
    );

    let mut sentences = 0usize;
    let mut extractions = 0usize;

    while let Some(result) = results.next().await {
        let (number, scored) = result?;
        sentences += 1;
        extractions += scored.len();
        for extraction in &scored {
            if json {
                let record = OutputRecord::new(number, extraction);
                writeln!(out, "{}", serde_json::to_string(&record)?)?;
            } else {
                writeln!(out, "{}", format_tsv(extraction))?;
            }
        }
    }

    Ok((sentences, extractions))
}

fn check(config: &AppConfig) -> anyhow::Result<()> {
    let pipeline = OpenExtractor::from_config(config)?;

    println!(
        "Configuration OK: {} model file(s), {} extractor(s)",
        config.extractors.len(),
        pipeline.extractors().len()
    );
    for kind in [
        ExtractorKind::General,
        ExtractorKind::Specific,
        ExtractorKind::TopicModel,
        ExtractorKind::Template,
    ] {
        let count = pipeline
            .extractors()
            .iter()
            .filter(|extractor| extractor.kind() == kind)
            .count();
        println!("  {:<12} {}", kind.as_str(), count);
    }
    Ok(())
}

// ============================================================================
// Records
// ============================================================================

/// Decode one raw input line; lines that are not UTF-8 are malformed records
fn process_bytes(
    pipeline: &OpenExtractor,
    number: usize,
    bytes: Vec<u8>,
) -> anyhow::Result<(usize, Vec<ScoredExtraction>)> {
    match String::from_utf8(bytes) {
        Ok(line) => process_line(pipeline, number, &line),
        Err(e) => {
            tracing::warn!(line = number, error = %e, "Skipping malformed record");
            Ok((number, Vec::new()))
        }
    }
}

/// Extract one input line; malformed records are logged and yield nothing
fn process_line(
    pipeline: &OpenExtractor,
    number: usize,
    line: &str,
) -> anyhow::Result<(usize, Vec<ScoredExtraction>)> {
    if line.trim().is_empty() {
        return Ok((number, Vec::new()));
    }

    let record = match SentenceRecord::parse(line) {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!(line = number, error = %e, "Skipping malformed record");
            return Ok((number, Vec::new()));
        }
    };

    let scored = pipeline
        .extract(&record.graph)
        .with_context(|| format!("Extraction failed for sentence {}", number))?;
    tracing::debug!(
        line = number,
        sentence = %record.sentence(),
        extractions = scored.len(),
        "Processed sentence"
    );
    Ok((number, scored))
}

fn format_tsv(scored: &ScoredExtraction) -> String {
    let e = &scored.extraction;
    format!(
        "{:.4}\t{}\t{}\t{}",
        scored.confidence, e.arg1.text, e.rel.text, e.arg2.text
    )
}

#[derive(Debug, Serialize)]
struct OutputRecord<'a> {
    sentence: usize,
    confidence: f64,
    arg1: &'a str,
    rel: &'a str,
    arg2: &'a str,
    pattern: &'a str,
}

impl<'a> OutputRecord<'a> {
    fn new(sentence: usize, scored: &'a ScoredExtraction) -> Self {
        let e = &scored.extraction;
        Self {
            sentence,
            confidence: scored.confidence,
            arg1: &e.arg1.text,
            rel: &e.rel.text,
            arg2: &e.arg2.text,
            pattern: &e.pattern,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
