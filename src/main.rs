use chrono::Local;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use voxguard::report::{self, FileReport, Summary};
use voxguard::{Classification, ClassifierModel, Detector, DetectorConfig, Language};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(name = "voxguard")]
#[command(author, version, about = "Detect AI-synthesized speech in audio clips")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// File or directory to analyze
    path: Option<PathBuf>,

    /// Language spoken in the clips (English, Hindi, Tamil, Malayalam, Telugu)
    #[arg(short, long, default_value = "English")]
    language: Language,

    /// Model file (JSON); the built-in model is used if omitted
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Detector configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output report file (.csv, .json)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory for auto-generated reports
    #[arg(long, default_value = "voxguard-reports")]
    report_dir: PathBuf,

    /// Don't auto-generate CSV report
    #[arg(long)]
    no_report: bool,

    /// Number of parallel workers (default: number of CPUs)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Number of features named in each explanation
    #[arg(long)]
    top_k: Option<usize>,

    /// Show detailed analysis and debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Only show summary
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Model file operations
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },
}

#[derive(Subcommand, Debug)]
enum ModelAction {
    /// Validate a model file against the feature schema
    Check {
        /// Model file to validate
        path: PathBuf,
    },

    /// Write the built-in model to a file
    WriteDefault {
        /// Destination path
        path: PathBuf,
    },
}

/// Supported audio formats
const SUPPORTED_EXTENSIONS: [&str; 5] = ["wav", "wave", "mp3", "flac", "ogg"];

fn main() {
    let mut args = Args::parse();
    init_logging(args.verbose);

    // Handle subcommands first
    if let Some(Command::Model { action }) = args.command.take() {
        handle_model_action(action);
        return;
    }

    let path = if let Some(p) = args.path.clone() {
        p
    } else {
        eprintln!("Usage: voxguard <PATH>");
        eprintln!("Run 'voxguard --help' for more options.");
        std::process::exit(1);
    };

    let detector = match build_detector(&args) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            std::process::exit(1);
        }
    };

    // Set up thread pool
    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .ok();
    }

    let files = collect_files(&path);
    if files.is_empty() {
        eprintln!("No audio files found (supported: {})", SUPPORTED_EXTENSIONS.join(", "));
        std::process::exit(1);
    }

    if !args.quiet {
        eprintln!("\x1b[1mVoxguard - AI Speech Detector\x1b[0m");
        eprintln!("{}", "─".repeat(70));
        eprintln!("Found {} audio file(s), language: {}\n", files.len(), args.language);
    }

    // Set up progress bar
    let pb = if !args.quiet && files.len() > 1 {
        let pb = ProgressBar::new(files.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("=>-"));
        }
        Some(pb)
    } else {
        None
    };

    // Analyze files in parallel
    let entries: Vec<FileReport> = files
        .par_iter()
        .map(|file| {
            let outcome = detector.analyze_file(file, args.language);
            if let Err(ref e) = outcome {
                tracing::warn!(file = %file.display(), error = %e, "analysis failed");
            }
            let entry = FileReport::new(file, outcome);
            if let Some(ref pb) = pb {
                pb.inc(1);
                pb.set_message(entry.file_name.clone());
            }
            entry
        })
        .collect();

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    // Print results
    if !args.quiet {
        for e in &entries {
            print_entry(e, args.verbose);
        }
    }

    // Summary
    let summary = Summary::from_entries(&entries);
    if !args.quiet {
        eprintln!("\n{}", "─".repeat(70));
        eprintln!("\x1b[1mSummary:\x1b[0m");
        eprintln!("  \x1b[31m✗ AI-generated:\x1b[0m {}", summary.ai_generated);
        eprintln!("  \x1b[32m✓ Human:\x1b[0m        {}", summary.human);
        eprintln!("  \x1b[33m? Borderline:\x1b[0m   {}", summary.borderline);
        if summary.error > 0 {
            eprintln!("  \x1b[90mErrors:\x1b[0m         {}", summary.error);
        }
    }

    // Determine report path
    let report_path = if let Some(ref output) = args.output {
        Some(output.clone())
    } else if !args.no_report {
        // Auto-generate report
        std::fs::create_dir_all(&args.report_dir).ok();
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let filename = format!("voxguard_report_{}.csv", timestamp);
        Some(args.report_dir.join(filename))
    } else {
        None
    };

    // Generate report
    if let Some(ref output_path) = report_path {
        if let Err(e) = report::generate(output_path, &entries) {
            eprintln!("Failed to write report: {}", e);
            std::process::exit(1);
        }
        if !args.quiet {
            eprintln!("\n\x1b[32mReport saved: {}\x1b[0m", output_path.display());
        }
    }

    if !args.quiet {
        eprintln!("\n\x1b[90mAnalysis complete.\x1b[0m");
    }

    // Exit with appropriate code
    if summary.ai_generated > 0 {
        std::process::exit(2);
    } else if summary.borderline > 0 || summary.error > 0 {
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "voxguard=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build_detector(args: &Args) -> Result<Detector, Box<dyn std::error::Error>> {
    let mut config = match args.config {
        Some(ref path) => DetectorConfig::load(path)?,
        None => DetectorConfig::default(),
    };
    if let Some(k) = args.top_k {
        config.explanation.top_k = k;
    }

    let model = match args.model {
        Some(ref path) => ClassifierModel::load(path)?,
        None => ClassifierModel::builtin(),
    };

    Ok(Detector::new(Arc::new(model), config)?)
}

fn collect_files(path: &Path) -> Vec<PathBuf> {
    if !path.is_dir() {
        return vec![path.to_path_buf()];
    }
    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
        })
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    files
}

fn print_entry(e: &FileReport, verbose: bool) {
    let reset = "\x1b[0m";
    let Some(ref r) = e.result else {
        println!(
            "\x1b[90m{:<14}{} {:>4}  {:<7}  {:<30}  {}",
            "[ERROR]",
            reset,
            "-",
            "-",
            truncate(e.error.as_deref().unwrap_or(""), 30),
            &e.file_name
        );
        return;
    };

    let color = match r.classification {
        Classification::AiGenerated => "\x1b[31m", // Red
        Classification::Human => "\x1b[32m",       // Green
        Classification::Borderline => "\x1b[33m",  // Yellow
    };

    println!(
        "{}{:<14}{} {:>3.0}%  {:<7}  {:<30}  {}",
        color,
        format!("[{}]", r.classification),
        reset,
        r.confidence_score * 100.0,
        r.confidence_category.to_string(),
        truncate(&r.explanation, 30),
        &e.file_name
    );

    if verbose {
        let q = &r.audio_quality;
        eprintln!(
            "    Quality: score={:.2} duration={:.1}s rate={}Hz channels={}{}{}",
            q.quality_score,
            q.duration_seconds,
            q.sample_rate,
            q.channels,
            if q.short_audio { " short" } else { "" },
            if q.sample_rate_suspect { " low-rate" } else { "" },
        );
        eprintln!("    p(AI)={:.3}  {}", r.p_ai, r.explanation);
        let features: Vec<String> = r
            .features
            .iter()
            .map(|(id, v)| format!("{}={:.3}", id.name(), v))
            .collect();
        eprintln!("    {}", features.join(" "));
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

fn handle_model_action(action: ModelAction) {
    match action {
        ModelAction::Check { path } => match ClassifierModel::load(&path) {
            Ok(model) => {
                println!(
                    "{}: ok (schema v{}, {} features, primary language {})",
                    path.display(),
                    model.schema_version,
                    model.feature_names.len(),
                    model.primary_language
                );
            }
            Err(e) => {
                eprintln!("{}: {}", path.display(), e);
                std::process::exit(1);
            }
        },

        ModelAction::WriteDefault { path } => {
            if let Err(e) = ClassifierModel::builtin().save(&path) {
                eprintln!("Failed to write model: {}", e);
                std::process::exit(1);
            }
            println!("Built-in model written to {}", path.display());
        }
    }
}
