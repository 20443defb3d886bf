//! Command-line interface: train an artifact, screen postings, inspect a
//! model.

use std::{
    io::Read,
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use job_screen_preprocessing::pre_processor::set_progress_enabled;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::{
    Screener, Screening, ServeError, TrainedArtifact,
    train::{FileReportSink, ReportSink, TrainConfig, Trainer, load_csv},
    wordcloud::render_wordcloud,
};

#[derive(Parser)]
#[command(name = "job-screen", version)]
#[command(about = "Detect fake job postings and explain why", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Quiet mode (warnings and errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Train a model from a labeled CSV file
    Train(TrainArgs),
    /// Screen one or more postings
    Predict(PredictArgs),
    /// Show how a model was trained and its strongest indicators
    Inspect(InspectArgs),
}

#[derive(Args)]
struct TrainArgs {
    /// Labeled CSV dataset
    #[arg(long, value_name = "PATH")]
    data: PathBuf,

    /// Where to write the trained artifact (`.json` for JSON)
    #[arg(long, value_name = "PATH")]
    output: PathBuf,

    /// Directory for the training report and word clouds
    #[arg(long, value_name = "DIR")]
    report_dir: Option<PathBuf>,

    /// JSON training config; flags below override it
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[arg(long)]
    seed: Option<u64>,

    /// Fraction of each class held out for evaluation
    #[arg(long)]
    test_size: Option<f64>,

    #[arg(long)]
    max_features: Option<usize>,
}

#[derive(Args)]
struct PredictArgs {
    /// Text to screen (if not provided, reads from stdin)
    #[arg(value_name = "TEXT")]
    text: Option<String>,

    /// Read text from file
    #[arg(short, long, value_name = "PATH", conflicts_with = "text")]
    file: Option<PathBuf>,

    /// Batch process postings (one per line)
    #[arg(short, long, value_name = "PATH", conflicts_with_all = ["text", "file"])]
    batch: Option<PathBuf>,

    /// Batch process from a JSON array of strings
    #[arg(long, value_name = "PATH", conflicts_with_all = ["text", "file", "batch"])]
    batch_json: Option<PathBuf>,

    /// Trained artifact
    #[arg(short, long, value_name = "PATH", env = "JOB_SCREEN_MODEL")]
    model: PathBuf,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "human")]
    format: OutputFormat,

    /// Write an SVG word cloud of the posting (single input only)
    #[arg(long, value_name = "PATH", conflicts_with_all = ["batch", "batch_json"])]
    wordcloud: Option<PathBuf>,
}

#[derive(Args)]
struct InspectArgs {
    /// Trained artifact
    #[arg(short, long, value_name = "PATH", env = "JOB_SCREEN_MODEL")]
    model: PathBuf,

    /// Number of indicators to list per class
    #[arg(long, default_value_t = 20)]
    top: usize,
}

#[derive(ValueEnum, Clone, Copy)]
enum OutputFormat {
    /// Output just the class label (0 real, 1 fake)
    Class,
    /// Output the fake probability as a float 0-1
    Probability,
    /// Output the full screening payload as JSON
    Json,
    /// Human-readable output with confidence and flags
    Human,
}

enum InputSource {
    Single(String),
    Batch(Vec<String>),
}

fn init_logging(cli: &Cli) {
    let default = match (cli.quiet, cli.verbose) {
        (true, _) => "job_screen=warn,job_screen_preprocessing=warn",
        (_, true) => "job_screen=debug,job_screen_preprocessing=debug",
        _ => "job_screen=info,job_screen_preprocessing=info",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Run the parsed command line.
pub fn run(cli: &Cli) -> Result<()> {
    init_logging(cli);
    set_progress_enabled(!cli.quiet);
    match &cli.command {
        Command::Train(args) => train(args),
        Command::Predict(args) => predict(args),
        Command::Inspect(args) => inspect(args),
    }
}

fn load_artifact(path: &Path) -> Result<Arc<TrainedArtifact>> {
    let artifact = TrainedArtifact::load(path)
        .with_context(|| format!("Failed to load model: {}", path.display()))?;
    Ok(Arc::new(artifact))
}

fn train(args: &TrainArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => TrainConfig::from_json_file(path)?,
        None => TrainConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(test_size) = args.test_size {
        config.test_size = test_size;
    }
    if let Some(max_features) = args.max_features {
        config.vectorizer = config.vectorizer.with_max_features(max_features);
    }

    let postings = load_csv(&args.data, &config.schema)
        .with_context(|| format!("Failed to load dataset: {}", args.data.display()))?;

    let start = Instant::now();
    let sink = args.report_dir.as_ref().map(FileReportSink::new);
    let outcome = Trainer::new(config)
        .run(
            &postings,
            &args.output,
            sink.as_ref().map(|s| s as &dyn ReportSink),
        )
        .context("Training failed")?;
    info!(elapsed = ?start.elapsed(), "Training finished");

    let summary = outcome.artifact.summary();
    println!("Model written to {}", args.output.display());
    println!(
        "Postings: {} real, {} fake ({} train / {} test)",
        summary.real_count, summary.fake_count, summary.train_size, summary.test_size
    );
    println!("Features: {}", outcome.artifact.vocabulary().len());
    println!("Train accuracy: {}", format_accuracy(summary.train_accuracy));
    println!("Test accuracy: {}", format_accuracy(summary.test_accuracy));
    Ok(())
}

fn format_accuracy(accuracy: Option<f64>) -> String {
    accuracy.map_or_else(|| "n/a".to_string(), |a| format!("{:.1}%", a * 100.0))
}

/// Priority: text arg > file > batch > batch_json > stdin
fn determine_input_source(args: &PredictArgs) -> Result<InputSource> {
    if let Some(text) = &args.text {
        return Ok(InputSource::Single(text.clone()));
    }

    if let Some(path) = &args.file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        return Ok(InputSource::Single(text));
    }

    if let Some(path) = &args.batch {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read batch file: {}", path.display()))?;
        return Ok(InputSource::Batch(
            contents.lines().map(String::from).collect(),
        ));
    }

    if let Some(path) = &args.batch_json {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read JSON batch file: {}", path.display()))?;
        let texts: Vec<String> =
            serde_json::from_str(&contents).context("Failed to parse JSON array")?;
        return Ok(InputSource::Batch(texts));
    }

    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read from stdin")?;
    Ok(InputSource::Single(buffer))
}

fn predict(args: &PredictArgs) -> Result<()> {
    let input = determine_input_source(args)?;
    let screener = Screener::new(load_artifact(&args.model)?);

    match input {
        InputSource::Single(text) => {
            let start = Instant::now();
            let screening = screener.serve(&text).context("Screening failed")?;
            debug!(elapsed = ?start.elapsed(), "Inference finished");

            let mut wordcloud = None;
            if let Some(path) = &args.wordcloud {
                match render_wordcloud(&text) {
                    Some(svg) => {
                        std::fs::write(path, &svg).with_context(|| {
                            format!("Failed to write word cloud: {}", path.display())
                        })?;
                        wordcloud = String::from_utf8(svg).ok();
                    }
                    None => info!("Text too short for a word cloud; skipping"),
                }
            }
            output_result(&screening, wordcloud, args.format)?;
        }
        InputSource::Batch(texts) => {
            let start = Instant::now();
            let results = screener.serve_batch(&texts);
            debug!(
                elapsed = ?start.elapsed(),
                postings = texts.len(),
                "Batch inference finished"
            );
            output_batch_results(&results, args.format)?;
        }
    }
    Ok(())
}

fn output_result(screening: &Screening, wordcloud: Option<String>, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Class => {
            println!("{}", i64::from(screening.classification()));
        }
        OutputFormat::Probability => {
            println!("{:.4}", screening.prediction.fake_probability());
        }
        OutputFormat::Json => {
            let response = screening.to_response().with_wordcloud(wordcloud);
            println!("{}", serde_json::to_string(&response)?);
        }
        OutputFormat::Human => {
            let class = screening.classification();
            let confidence = if class.is_fake() {
                screening.prediction.fake_probability()
            } else {
                screening.prediction.real_probability()
            };
            println!("Result: {class}");
            println!("Confidence: {:.1}%", confidence * 100.0);
            if !screening.red_flags().is_empty() {
                println!("Red flags:");
                for flag in screening.red_flags() {
                    println!("  {:<20} {:+.3}", flag.word, flag.score);
                }
            }
            if !screening.green_flags().is_empty() {
                println!("Green flags:");
                for flag in screening.green_flags() {
                    println!("  {:<20} {:+.3}", flag.word, flag.score);
                }
            }
        }
    }
    Ok(())
}

fn output_batch_results(
    results: &[Result<Screening, ServeError>],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json_array = results
                .iter()
                .map(|result| match result {
                    Ok(screening) => serde_json::to_value(screening.to_response()),
                    Err(e) => Ok(serde_json::json!({ "error": e.to_string() })),
                })
                .collect::<Result<Vec<_>, _>>()?;
            println!("{}", serde_json::to_string(&json_array)?);
        }
        _ => {
            for (i, result) in results.iter().enumerate() {
                match result {
                    Ok(screening) => output_result(screening, None, format)?,
                    Err(e) => println!("error (line {}): {e}", i + 1),
                }
            }
        }
    }
    Ok(())
}

fn inspect(args: &InspectArgs) -> Result<()> {
    let artifact = load_artifact(&args.model)?;
    let summary = artifact.summary();
    let weights = artifact
        .weights()
        .context("Model has no trained weights")?;

    println!("Model: {}", args.model.display());
    println!(
        "Postings: {} real, {} fake ({} train / {} test, seed {})",
        summary.real_count,
        summary.fake_count,
        summary.train_size,
        summary.test_size,
        summary.seed
    );
    println!("Train accuracy: {}", format_accuracy(summary.train_accuracy));
    println!("Test accuracy: {}", format_accuracy(summary.test_accuracy));
    println!("Features: {}", artifact.vocabulary().len());
    println!("Intercept: {:+.4}", weights.intercept());

    let mut ranked = artifact
        .vocabulary()
        .iter()
        .filter_map(|(term, idx)| weights.coefficient(idx).map(|c| (term, c)))
        .collect::<Vec<_>>();
    ranked.sort_by(|(a_term, a), (b_term, b)| b.total_cmp(a).then_with(|| a_term.cmp(b_term)));

    println!("Strongest fake indicators:");
    for (term, coef) in ranked.iter().filter(|(_, c)| *c > 0.0).take(args.top) {
        println!("  {term:<24} {coef:+.4}");
    }
    println!("Strongest real indicators:");
    for (term, coef) in ranked.iter().rev().filter(|(_, c)| *c < 0.0).take(args.top) {
        println!("  {term:<24} {coef:+.4}");
    }
    Ok(())
}
