// voiceband command-line tool
//
// record  - capture training clips into the recordings folder
// train   - build and persist a model from recorded clips
// classify- classify a WAV file against a model
// mic     - record one take from the microphone and classify it
// listen  - stream from the microphone and print recognized commands

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, Subcommand};

use voiceband::audio::capture::record_fixed_duration;
use voiceband::audio::wav;
use voiceband::model::trainer;
use voiceband::{AppConfig, CommandModel, Prediction, Recognizer};

#[derive(Parser)]
#[command(name = "voiceband", about = "Sub-band energy voice-command recognition")]
struct Cli {
    /// Path to a JSON configuration file.
    #[arg(long, default_value = "voiceband.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record training clips for one label.
    Record {
        /// Label to record; clips land in <recordings_root>/<label>/.
        label: String,
        /// Number of clips to record.
        #[arg(long, default_value_t = 5)]
        count: usize,
    },
    /// Train a model from recorded clips and persist it.
    Train {
        /// Comma-separated labels; each label is also its folder name.
        #[arg(value_delimiter = ',')]
        labels: Vec<String>,
        /// Output model path; defaults to the configured model path.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Classify a single WAV file.
    Classify {
        file: PathBuf,
        #[arg(long)]
        model: Option<PathBuf>,
    },
    /// Record one take from the microphone and classify it.
    Mic {
        #[arg(long)]
        model: Option<PathBuf>,
        /// Take length in seconds; defaults to one frame.
        #[arg(long)]
        seconds: Option<f64>,
    },
    /// Stream from the microphone and print recognized commands.
    Listen {
        #[arg(long)]
        model: Option<PathBuf>,
        /// How long to listen before stopping.
        #[arg(long, default_value_t = 30.0)]
        seconds: f64,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load_from_file(&cli.config);

    match cli.command {
        Commands::Record { label, count } => record(&config, &label, count),
        Commands::Train { labels, output } => train(&config, &labels, output),
        Commands::Classify { file, model } => classify_file(&config, &file, model),
        Commands::Mic { model, seconds } => classify_mic(&config, model, seconds),
        Commands::Listen { model, seconds } => listen(&config, model, seconds),
    }
}

fn record(config: &AppConfig, label: &str, count: usize) -> anyhow::Result<()> {
    let dir = config.train.recordings_root.join(label);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("cannot create {}", dir.display()))?;

    let fs = config.feature.fs;
    let clip_secs = config.feature.frame_len as f64 / fs as f64;
    let existing = std::fs::read_dir(&dir)?.count();

    for i in 1..=count {
        println!(
            "[{}/{}] say '{}' now ({:.2} s)...",
            i, count, label, clip_secs
        );
        let samples = record_fixed_duration(fs, clip_secs, config.audio.device.as_deref())?;
        let path = dir.join(format!("{}_{:03}.wav", label, existing + i));
        wav::write_mono(&path, &samples, fs)?;
        println!("  saved {}", path.display());
    }
    Ok(())
}

fn train(
    config: &AppConfig,
    labels: &[String],
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    anyhow::ensure!(!labels.is_empty(), "at least one label is required");
    let pairs: Vec<(String, String)> = labels
        .iter()
        .map(|l| (l.clone(), l.clone()))
        .collect();
    let model_path = output.unwrap_or_else(|| config.train.model_path.clone());

    let model = trainer::train_to_file(
        &pairs,
        &config.feature,
        config.train.min_recordings,
        &config.train.recordings_root,
        &model_path,
    )?;

    println!(
        "trained {} labels ({} bands at {} Hz) -> {}",
        model.commands.len(),
        model.num_bands,
        model.fs,
        model_path.display()
    );
    Ok(())
}

fn load_model(config: &AppConfig, path: Option<PathBuf>) -> anyhow::Result<CommandModel> {
    let path = path.unwrap_or_else(|| config.train.model_path.clone());
    let model = CommandModel::load(&path)
        .with_context(|| format!("cannot load model {}", path.display()))?;
    Ok(model)
}

fn classify_file(
    config: &AppConfig,
    file: &PathBuf,
    model: Option<PathBuf>,
) -> anyhow::Result<()> {
    let model = load_model(config, model)?;
    let recognizer = Recognizer::new(model, config.trigger.clone(), config.audio.clone())?;
    let result = recognizer.recognize_file(file)?;
    print_classification(&result.label, &result.distances);
    Ok(())
}

fn classify_mic(
    config: &AppConfig,
    model: Option<PathBuf>,
    seconds: Option<f64>,
) -> anyhow::Result<()> {
    let model = load_model(config, model)?;
    let recognizer = Recognizer::new(model, config.trigger.clone(), config.audio.clone())?;
    println!("speak now...");
    let result = recognizer.recognize_mic(seconds)?;
    print_classification(&result.label, &result.distances);
    Ok(())
}

fn listen(config: &AppConfig, model: Option<PathBuf>, seconds: f64) -> anyhow::Result<()> {
    let model = load_model(config, model)?;
    let labels: Vec<String> = model.labels().map(String::from).collect();
    let mut recognizer = Recognizer::new(model, config.trigger.clone(), config.audio.clone())?;

    let mut rx = recognizer.subscribe();
    recognizer.start()?;
    println!("listening for {:?} ({}s, ctrl-c to abort)", labels, seconds);

    let deadline = Instant::now() + Duration::from_secs_f64(seconds);
    while Instant::now() < deadline {
        match rx.try_recv() {
            Ok(Prediction::Command { label, .. }) => println!(">> {}", label),
            Ok(Prediction::Silence) => println!("(silence)"),
            Ok(Prediction::Idle) => {}
            Err(tokio::sync::broadcast::error::TryRecvError::Empty) => {
                std::thread::sleep(Duration::from_millis(20));
            }
            Err(tokio::sync::broadcast::error::TryRecvError::Lagged(skipped)) => {
                log::warn!("missed {} predictions", skipped);
            }
            Err(tokio::sync::broadcast::error::TryRecvError::Closed) => break,
        }
    }

    recognizer.stop()?;
    Ok(())
}

fn print_classification(label: &str, distances: &std::collections::BTreeMap<String, f64>) {
    println!("recognized: {}", label);
    for (candidate, dist) in distances {
        println!("  {:<12} {:.6}", candidate, dist);
    }
}
