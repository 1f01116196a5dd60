use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use docsim::{
    DocsimConfig, HashVariant, probability_curve, run_directory, s_curve_threshold,
    suggest_band_count, write_report,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "docsim", version, about = "MinHash/LSH near-duplicate detection")]
struct Cli {
    /// Emit logs as JSON lines instead of human-readable text
    #[arg(long = "json-logs", global = true, action = ArgAction::SetTrue)]
    json_logs: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign every file in a directory and write signatures and pair scores
    Run(RunArgs),
    /// Print the candidate probability curve for a parameter choice
    Tune(TuneArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    #[arg(long = "corpus-dir")]
    corpus_dir: PathBuf,
    /// YAML configuration; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(short = 'l', long = "signature-length")]
    signature_length: Option<usize>,
    #[arg(short = 'b', long = "bands")]
    band_count: Option<usize>,
    #[arg(short = 'n', long = "ngram-len")]
    ngram_len: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, value_enum)]
    variant: Option<VariantArg>,
    #[arg(long, action = ArgAction::SetTrue)]
    parallel: bool,
    #[arg(long = "out-dir")]
    out_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct TuneArgs {
    #[arg(short = 'l', long = "signature-length", default_value_t = 240)]
    signature_length: usize,
    #[arg(short = 'b', long = "bands", default_value_t = 80)]
    band_count: usize,
    /// Number of similarity steps in the printed curve
    #[arg(long, default_value_t = 10)]
    steps: usize,
    /// Also suggest a band count whose threshold is close to this similarity
    #[arg(long)]
    target: Option<f64>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum VariantArg {
    Universal,
    Xor,
}

impl From<VariantArg> for HashVariant {
    fn from(value: VariantArg) -> Self {
        match value {
            VariantArg::Universal => HashVariant::Universal,
            VariantArg::Xor => HashVariant::Xor,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match cli.command {
        Command::Run(args) => run(args),
        Command::Tune(args) => tune(args),
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(args: RunArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => DocsimConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => DocsimConfig::default(),
    };

    apply_overrides(&mut config, &args);

    tracing::info!(
        corpus_dir = %args.corpus_dir.display(),
        signature_length = config.lsh.signature_length,
        band_count = config.lsh.band_count,
        ngram_len = config.lsh.ngram_len,
        seed = config.lsh.seed,
        "run_start"
    );

    let (corpus, report) = run_directory(&args.corpus_dir, &config)
        .with_context(|| format!("processing corpus {}", args.corpus_dir.display()))?;
    let written = write_report(&config.output, &corpus, &report)?;

    tracing::info!(
        documents = corpus.len(),
        degenerate = corpus.degenerate_ids().len(),
        candidates = report.candidates.len(),
        signatures = %written.signatures.display(),
        "run_complete"
    );
    Ok(())
}

/// Apply command-line flags on top of the loaded configuration.
fn apply_overrides(config: &mut DocsimConfig, args: &RunArgs) {
    if let Some(value) = args.signature_length {
        config.lsh.signature_length = value;
    }
    if let Some(value) = args.band_count {
        config.lsh.band_count = value;
    }
    if let Some(value) = args.ngram_len {
        config.lsh.ngram_len = value;
    }
    if let Some(value) = args.seed {
        config.lsh.seed = value;
    }
    if let Some(value) = args.variant {
        config.lsh.variant = value.into();
    }
    if args.parallel {
        config.lsh.use_parallel = true;
    }
    if let Some(dir) = &args.out_dir {
        config.output.dir = dir.clone();
    }
}

fn tune(args: TuneArgs) -> Result<()> {
    let threshold = s_curve_threshold(args.signature_length, args.band_count)?;
    println!(
        "signature_length={} band_count={} rows_per_band={} threshold~{:.4}",
        args.signature_length,
        args.band_count,
        args.signature_length / args.band_count,
        threshold
    );
    println!("similarity,probability");
    for (similarity, probability) in
        probability_curve(args.signature_length, args.band_count, args.steps)?
    {
        println!("{similarity:.3},{probability:.6}");
    }

    if let Some(target) = args.target {
        let suggested = suggest_band_count(args.signature_length, target)?;
        println!(
            "suggested band_count for threshold {target}: {suggested} (threshold~{:.4})",
            s_curve_threshold(args.signature_length, suggested)?
        );
    }
    Ok(())
}
