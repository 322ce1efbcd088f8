use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, ValueEnum, error::ErrorKind};

use crate::collate::{EvalBatch, TrainBatch};
use crate::config::{CandidateMode, LoaderConfig};
use crate::constants::item::POSITIVE_LABEL;
use crate::heuristics::{format_u128_with_commas, raw_eval_rows, train_rows_per_epoch};
use crate::loader::HypergraphDataset;
use crate::metrics::DatasetSummary;
use crate::splits::SplitLabel;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Raw,
    Fil,
}

impl From<ModeArg> for CandidateMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Raw => CandidateMode::Raw,
            ModeArg::Fil => CandidateMode::Filtered,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "dataset_report",
    disable_help_subcommand = true,
    about = "Load a knowledge hypergraph and report its batches",
    long_about = "Build vocabularies and encoded facts from train/valid/test files, then print dataset statistics and the first training and evaluation batch.",
    after_help = "Set RUST_LOG=info to see load progress."
)]
/// CLI for `dataset_report`.
///
/// Common usage:
/// - Report a dataset directory: `--data-dir data/JF17K`
/// - Use raw candidates: `--mode raw`
/// - Reproducible corruption draws: `--seed 7`
struct DatasetReportCli {
    #[arg(
        long = "data-dir",
        value_name = "PATH",
        help = "Directory holding train.txt, valid.txt, and test.txt"
    )]
    data_dir: PathBuf,
    #[arg(
        long = "batch-size",
        default_value_t = 4,
        value_parser = parse_positive_usize,
        help = "Training facts per batch"
    )]
    batch_size: usize,
    #[arg(
        long = "eval-batch-size",
        default_value_t = 1,
        value_parser = parse_positive_usize,
        help = "Evaluation facts per batch"
    )]
    eval_batch_size: usize,
    #[arg(
        long = "negative-ratio",
        default_value_t = 10,
        help = "Corrupted rows per entity slot"
    )]
    negative_ratio: usize,
    #[arg(long, default_value_t = 0, help = "Parallel data-loading workers")]
    workers: usize,
    #[arg(long, help = "Optional deterministic seed")]
    seed: Option<u64>,
    #[arg(long, value_enum, default_value = "fil", help = "Evaluation candidate mode")]
    mode: ModeArg,
    #[arg(long, help = "Print the first batches as JSON")]
    json: bool,
}

/// Load a dataset from CLI arguments and print its summary and first batches.
pub fn run_dataset_report<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let Some(cli) = parse_cli::<DatasetReportCli, _>(
        std::iter::once("dataset_report".to_string()).chain(args_iter),
    )?
    else {
        return Ok(());
    };

    let config = LoaderConfig {
        data_dir: cli.data_dir,
        batch_size: cli.batch_size,
        eval_batch_size: cli.eval_batch_size,
        negative_ratio: cli.negative_ratio,
        workers: cli.workers,
        seed: cli.seed,
        shuffle: false,
        eval_mode: cli.mode.into(),
    };
    let dataset = HypergraphDataset::load(config)?;
    print_summary(&dataset.summary());

    let facts = dataset.facts();
    let entity_count = dataset.vocab().entity_count();
    println!();
    println!("Estimated rows per epoch:");
    println!(
        "  train (r={}):     {}",
        dataset.config().negative_ratio,
        format_u128_with_commas(train_rows_per_epoch(
            facts.get(SplitLabel::Train),
            dataset.config().negative_ratio
        ))
    );
    for split in [SplitLabel::Validation, SplitLabel::Test] {
        println!(
            "  {split} raw bound:  {}",
            format_u128_with_commas(raw_eval_rows(facts.get(split), entity_count))
        );
    }

    let splits = dataset.splits()?;
    println!();
    match splits.train.batches(0).next() {
        Some(batch) => print_train_batch(&batch?, cli.json)?,
        None => println!("Training split is empty."),
    }
    match splits.valid.batches(0).next() {
        Some(batch) => print_eval_batch(&batch?, dataset.config().eval_mode, cli.json)?,
        None => println!("Validation split is empty."),
    }
    Ok(())
}

fn print_summary(summary: &DatasetSummary) {
    println!("=== hypergraph summary ===");
    println!("  vertices:            {}", summary.entities);
    println!("  relations:           {}", summary.relations);
    println!("  max hyperedge size:  {}", summary.max_arity);
    println!("  known facts:         {}", summary.known_facts);
    println!("  incident vertices:   {}", summary.incident_entities);
    for split in &summary.splits {
        let histogram = split
            .arity_histogram
            .iter()
            .map(|(arity, count)| format!("{arity}:{count}"))
            .collect::<Vec<_>>()
            .join(" ");
        println!("  {:<6} facts={:<8} arity {}", split.split, split.facts, histogram);
    }
}

fn print_train_batch(batch: &TrainBatch, json: bool) -> Result<(), Box<dyn Error>> {
    println!("=== first train batch ===");
    println!(
        "  rows={} entity_columns={} positives={}",
        batch.len(),
        batch.entities.len(),
        batch.labels.iter().filter(|label| **label == POSITIVE_LABEL).count()
    );
    if json {
        println!("{}", serde_json::to_string(batch)?);
    }
    Ok(())
}

fn print_eval_batch(
    batch: &EvalBatch,
    mode: CandidateMode,
    json: bool,
) -> Result<(), Box<dyn Error>> {
    println!("=== first valid batch ({mode}) ===");
    println!("  rows={} groups={}", batch.len(), batch.group_lens.len());
    for (idx, range) in batch.groups().iter().enumerate() {
        println!("  group {idx}: rows {}..{}", range.start, range.end);
    }
    if json {
        println!("{}", serde_json::to_string(batch)?);
    }
    Ok(())
}

fn parse_positive_usize(raw: &str) -> Result<usize, String> {
    let parsed = raw
        .parse::<usize>()
        .map_err(|_| format!("Could not parse '{}' as a positive integer", raw))?;
    if parsed == 0 {
        return Err("value must be greater than zero".to_string());
    }
    Ok(parsed)
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}
