use chrono::Local;
use clap::{Parser, Subcommand};
use fakeshot::analyzer::metadata::MetadataState;
use fakeshot::{Analyzer, RiskLevel, ScanRecord, ScoringConfig};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fakeshot")]
#[command(author, version, about = "Estimate whether images are AI-generated or manipulated")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// File or directory to analyze (optional in GUI mode)
    path: Option<PathBuf>,

    /// Launch GUI file picker (auto-enabled when double-clicked)
    #[arg(long)]
    gui: bool,

    /// Output report file (.csv, .json)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory for auto-generated reports
    #[arg(long, default_value = "fakeshot-reports")]
    report_dir: PathBuf,

    /// Don't auto-generate CSV report
    #[arg(long)]
    no_report: bool,

    /// Don't prompt to open report
    #[arg(long)]
    no_open: bool,

    /// Number of parallel workers (default: number of CPUs)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Scoring weights and thresholds (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Give up on a single file after this many seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Scores above this are medium risk (overrides config)
    #[arg(long)]
    medium_above: Option<u8>,

    /// Scores above this are high risk (overrides config)
    #[arg(long)]
    high_above: Option<u8>,

    /// Show detailed analysis
    #[arg(short, long)]
    verbose: bool,

    /// Only show summary
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start interactive web UI for analysis
    Serve {
        /// Directory offered for folder scans
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Port to listen on
        #[arg(short, long, default_value = "3001")]
        port: u16,

        /// Largest accepted upload, in megabytes
        #[arg(long, default_value = "25")]
        max_upload_mb: usize,

        /// Don't open the browser
        #[arg(long)]
        no_open: bool,

        /// Scoring weights and thresholds (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "fakeshot=debug" } else { "fakeshot=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .compact()
        .init();
}

fn load_config(path: Option<&PathBuf>) -> ScoringConfig {
    match path {
        Some(path) => match ScoringConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Invalid config: {}", e);
                std::process::exit(1);
            }
        },
        None => ScoringConfig::default(),
    }
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    // Handle subcommands first
    if let Some(cmd) = args.command {
        match cmd {
            Command::Serve { path, port, max_upload_mb, no_open, config } => {
                let analyzer = Analyzer::new().with_config(load_config(config.as_ref()));
                let options = fakeshot::serve::ServeOptions {
                    port,
                    path,
                    max_upload: max_upload_mb.saturating_mul(1024 * 1024),
                    open_browser: !no_open,
                };
                if let Err(e) = fakeshot::serve::start(options, analyzer) {
                    eprintln!("Server error: {}", e);
                    std::process::exit(1);
                }
                return;
            }
        }
    }

    // Determine if we should use GUI mode
    // With GUI feature: launch GUI if --gui flag OR no path provided
    #[cfg(feature = "gui")]
    let use_gui = args.gui || args.path.is_none();

    #[cfg(not(feature = "gui"))]
    let use_gui = false;

    #[cfg(feature = "gui")]
    let path = match args.path.clone() {
        Some(p) if !use_gui => p,
        _ => match pick_path_gui() {
            Some(p) => p,
            None => {
                eprintln!("No file or folder selected.");
                std::process::exit(0);
            }
        },
    };

    #[cfg(not(feature = "gui"))]
    let path = if let Some(p) = args.path.clone() {
        if args.gui {
            eprintln!("Note: GUI mode not available in this build.");
        }
        p
    } else {
        eprintln!("Usage: fakeshot <PATH>");
        eprintln!("Run 'fakeshot --help' for more options.");
        std::process::exit(1);
    };

    // Set up thread pool
    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .ok();
    }

    let files = fakeshot::scan::collect_images(&path);

    if files.is_empty() {
        eprintln!(
            "No image files found (supported: {})",
            fakeshot::scan::SUPPORTED_EXTENSIONS.join(", ")
        );
        std::process::exit(1);
    }

    if !args.quiet {
        eprintln!("\x1b[1mFakeshot - Synthetic Image Screening\x1b[0m");
        eprintln!("{}", "─".repeat(70));
        eprintln!("Found {} image file(s)\n", files.len());
    }
    info!(files = files.len(), path = %path.display(), "starting scan");

    // Set up progress bar
    let pb = if !args.quiet && files.len() > 1 {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    // Create analyzer
    let mut config = load_config(args.config.as_ref());
    if let Some(medium) = args.medium_above {
        config.tiers.medium_above = medium;
    }
    if let Some(high) = args.high_above {
        config.tiers.high_above = high;
    }
    if let Err(e) = config.validate() {
        eprintln!("Invalid thresholds: {}", e);
        std::process::exit(1);
    }

    let mut analyzer = Analyzer::new().with_config(config);
    if let Some(secs) = args.timeout {
        analyzer = analyzer.with_deadline(Duration::from_secs(secs));
    }

    // Analyze files in parallel
    let records: Vec<ScanRecord> = files
        .par_iter()
        .map(|path| {
            let record = analyzer.analyze_path(path);
            if let Some(ref pb) = pb {
                pb.inc(1);
                pb.set_message(record.file_name.clone());
            }
            record
        })
        .collect();

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    // Print results
    if !args.quiet {
        for r in &records {
            let (color, tag) = match r.risk_level {
                _ if r.is_error() => ("\x1b[90m", "ERROR"), // Gray
                Some(RiskLevel::Low) => ("\x1b[32m", "LOW"),     // Green
                Some(RiskLevel::Medium) => ("\x1b[33m", "MEDIUM"), // Yellow
                Some(RiskLevel::High) => ("\x1b[31m", "HIGH"),   // Red
                None => ("\x1b[90m", "ERROR"),
            };
            let reset = "\x1b[0m";

            let size = r
                .pixels
                .map(|p| format!("{}x{}", p.width, p.height))
                .unwrap_or_else(|| "-".to_string());
            let first = r
                .error
                .as_deref()
                .or_else(|| r.reasons.first().map(|s| s.as_str()))
                .unwrap_or("-");

            println!(
                "{}{:<9}{} {:>3}  {:>11}  {:<40}  {}",
                color,
                format!("[{}]", tag),
                reset,
                r.total_score.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()),
                size,
                truncate(first, 40),
                &r.file_name
            );

            if args.verbose && !r.is_error() {
                for reason in r.reasons.iter().skip(1) {
                    eprintln!("    {}", reason);
                }
                if let Some(ref p) = r.pixels {
                    eprintln!(
                        "    Pixels: count={} mean={:.1} variance={:.1}",
                        p.pixel_count, p.mean, p.variance
                    );
                }
                match r.metadata {
                    Some(MetadataState::Present(ref m)) => eprintln!(
                        "    Metadata: make={} model={} taken={} software={}",
                        m.make.as_deref().unwrap_or("n/a"),
                        m.model.as_deref().unwrap_or("n/a"),
                        m.date_time_original.as_deref().unwrap_or("n/a"),
                        m.software.as_deref().unwrap_or("n/a"),
                    ),
                    Some(MetadataState::Unreadable { ref detail }) => {
                        eprintln!("    Metadata: unreadable ({})", detail)
                    }
                    _ => eprintln!("    Metadata: none"),
                }
            }
        }
    }

    // Summary
    let summary = fakeshot::report::Summary::from_records(&records);

    if !args.quiet {
        eprintln!("\n{}", "─".repeat(70));
        eprintln!("\x1b[1mSummary:\x1b[0m");
        eprintln!("  \x1b[32m✓ Low:\x1b[0m     {}", summary.low);
        eprintln!("  \x1b[33m? Medium:\x1b[0m  {}", summary.medium);
        eprintln!("  \x1b[31m✗ High:\x1b[0m    {}", summary.high);
        if summary.error > 0 {
            eprintln!("  \x1b[90mErrors:\x1b[0m    {}", summary.error);
        }
    }

    // Determine report path
    let report_path = if let Some(ref output) = args.output {
        Some(output.clone())
    } else if !args.no_report {
        // Auto-generate report
        std::fs::create_dir_all(&args.report_dir).ok();
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let filename = format!("fakeshot_report_{}.csv", timestamp);
        Some(args.report_dir.join(filename))
    } else {
        None
    };

    // Generate report
    if let Some(ref output_path) = report_path {
        if let Err(e) = fakeshot::report::generate(output_path, &records) {
            eprintln!("Failed to write report: {}", e);
            std::process::exit(1);
        }
        if !args.quiet {
            eprintln!("\n\x1b[32mReport saved: {}\x1b[0m", output_path.display());
        }

        // Open report
        if !args.no_open {
            if use_gui {
                // In GUI mode, auto-open the report (no prompt)
                let _ = open::that(output_path);
            } else if !args.quiet {
                // In terminal mode, ask first
                eprint!("\nOpen report? [Y/n] ");
                io::stderr().flush().ok();

                let mut input = String::new();
                if io::stdin().read_line(&mut input).is_ok() {
                    let input = input.trim().to_lowercase();
                    if input.is_empty() || input == "y" || input == "yes" {
                        if let Err(e) = open::that(output_path) {
                            eprintln!("Failed to open report: {}", e);
                        }
                    }
                }
            }
        }
    }

    if !args.quiet {
        eprintln!("\n\x1b[90mScores are heuristic. No tool can prove an image is authentic.\x1b[0m");
    }

    // Exit with appropriate code
    if summary.high > 0 {
        std::process::exit(2);
    } else if summary.medium > 0 {
        std::process::exit(1);
    }
}

#[cfg(feature = "gui")]
fn pick_path_gui() -> Option<PathBuf> {
    // First try folder picker
    if let Some(folder) = rfd::FileDialog::new()
        .set_title("Select folder to analyze (or Cancel for single file)")
        .pick_folder()
    {
        return Some(folder);
    }

    // If cancelled, offer file picker
    rfd::FileDialog::new()
        .set_title("Select image to analyze")
        .add_filter("Images", &fakeshot::scan::SUPPORTED_EXTENSIONS)
        .pick_file()
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len - 3).collect();
        format!("{}...", cut)
    }
}
