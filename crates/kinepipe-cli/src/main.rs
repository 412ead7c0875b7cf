//! kinepipe - Kinetics-700 corpus preparation
//!
//! Fetches annotated videos, trims them to their labeled segment, and
//! derives frame sequences and audio tracks for ML training.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};

use kinepipe_core::shutdown_flag;
use kinepipe_kinetics::{metadata, runner, Config, RunOptions, Stage};

#[derive(Parser)]
#[command(name = "kinepipe")]
#[command(about = "Kinetics-700 corpus preparation pipelines")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Reduce logging to warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, conflicts_with = "quiet")]
    debug: bool,

    /// Config file path (default: ./kinepipe.toml or ~/.config/kinepipe/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch videos and trim them to their annotated segment
    Download(StageArgs),
    /// Decode downloaded clips into per-frame JPEG sequences
    Frames(FramesArgs),
    /// Extract audio tracks from downloaded clips
    Sound(StageArgs),
    /// Show current configuration
    Config,
}

#[derive(Args)]
struct StageArgs {
    /// Categories to process
    #[arg(long = "category", num_args = 1..)]
    categories: Vec<String>,

    /// Classes to process
    #[arg(long = "classes", num_args = 1..)]
    classes: Vec<String>,

    /// JSON file holding a list of classes to process
    #[arg(long)]
    json_classes: Option<PathBuf>,

    /// Process every category in the categories file
    #[arg(long)]
    all: bool,

    /// Process the unlabeled test subset
    #[arg(long)]
    test: bool,

    /// Parallel workers (default from config)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Failure log; also read as the skip set on reruns
    #[arg(long)]
    failed_log: Option<PathBuf>,

    /// Per-item stats table (disabled unless set here or in config)
    #[arg(long)]
    stats_log: Option<PathBuf>,

    /// Write stats to a timestamped file under the dataset root
    #[arg(long, conflicts_with = "stats_log")]
    stats: bool,

    /// Append raw external-tool output to this file
    #[arg(long)]
    tool_log: Option<PathBuf>,

    /// Skip whole classes whose target directory already exists
    #[arg(long)]
    skip: bool,
}

#[derive(Args)]
struct FramesArgs {
    #[command(flatten)]
    stage: StageArgs,

    /// Shorter-side target in pixels after rescaling
    #[arg(long)]
    shorter_side: Option<u32>,

    /// Keep the source resolution
    #[arg(long)]
    no_resize: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_signal_handler();

    // Progress context (TTY auto-detect)
    let progress = Arc::new(kinepipe_core::ProgressContext::new());

    // Logging:
    //   TTY:     quiet (warn) unless --debug  — progress bars show activity
    //   non-TTY: info unless --debug          — logs are the only progress indicator
    //   --quiet forces warn in either mode
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = cli.quiet || (is_tty && !cli.debug);
    kinepipe_core::init_logging(quiet, cli.debug, multi);

    let config = if let Some(path) = cli.config {
        Config::from_file(&path)?
    } else {
        Config::load()?
    };

    match cli.command {
        Command::Download(args) => run_stage(Stage::Download, args, config, &progress),
        Command::Frames(args) => {
            let mut config = config;
            if let Some(side) = args.shorter_side {
                config.frames.shorter_side = side;
            }
            if args.no_resize {
                config.frames.resize = false;
            }
            run_stage(Stage::Frames, args.stage, config, &progress)
        }
        Command::Sound(args) => run_stage(Stage::Sound, args, config, &progress),
        Command::Config => {
            print_config(&config);
            Ok(())
        }
    }
}

fn run_stage(
    stage: Stage,
    args: StageArgs,
    mut config: Config,
    progress: &kinepipe_core::SharedProgress,
) -> Result<()> {
    // CLI paths override the config file
    if let Some(path) = args.failed_log {
        config.logs.failed = path;
    }
    if let Some(path) = args.stats_log {
        config.logs.stats = Some(path);
    } else if args.stats {
        config.logs.stats = Some(config.timestamped_stats_path());
    }
    if let Some(path) = args.tool_log {
        config.logs.tool = Some(path);
    }

    let opts = RunOptions {
        workers: args.workers.unwrap_or(config.workers.default),
        skip_existing_class_dirs: args.skip,
    };

    let mut selected = false;

    if args.all {
        selected = true;
        runner::run_all(stage, &config, &opts, progress)?;
    } else {
        for category in &args.categories {
            selected = true;
            runner::run_category(stage, category, &config, &opts, progress)?;
        }
        if !args.classes.is_empty() {
            selected = true;
            runner::run_classes(stage, &args.classes, &config, &opts, progress)?;
        }
        if let Some(path) = &args.json_classes {
            selected = true;
            let classes = metadata::load_classes(path)?;
            runner::run_classes(stage, &classes, &config, &opts, progress)?;
        }
    }

    if args.test {
        selected = true;
        runner::run_test(stage, &config, &opts, progress)?;
    }

    if !selected {
        bail!("nothing selected; pass --all, --test, --category, --classes, or --json-classes");
    }
    Ok(())
}

fn print_config(config: &Config) {
    eprintln!("Dataset root:    {}", config.dataset.root.display());
    eprintln!("Train metadata:  {}", config.metadata.train.display());
    eprintln!("Valid metadata:  {}", config.metadata.valid.display());
    eprintln!("Test metadata:   {}", config.metadata.test.display());
    eprintln!("Classes file:    {}", config.metadata.classes.display());
    eprintln!("Categories file: {}", config.metadata.categories.display());
    eprintln!("Failure log:     {}", config.logs.failed.display());
    eprintln!(
        "Stats log:       {}",
        config
            .logs
            .stats
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "disabled".to_string())
    );
    eprintln!(
        "Tool log:        {}",
        config
            .logs
            .tool
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "disabled".to_string())
    );
    eprintln!(
        "Workers:         {} (max: {})",
        config.workers.default, config.workers.max
    );
    eprintln!(
        "Frames:          shorter side {}px, resize {}",
        config.frames.shorter_side,
        if config.frames.resize { "on" } else { "off" }
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn quiet_is_a_global_flag() {
        let cli = Cli::try_parse_from(["kinepipe", "download", "--all", "--quiet"]).unwrap();
        assert!(cli.quiet);
        assert!(!cli.debug);
    }

    #[test]
    fn quiet_and_debug_are_mutually_exclusive() {
        assert!(Cli::try_parse_from(["kinepipe", "download", "--all", "--quiet", "--debug"]).is_err());
    }
}

fn setup_signal_handler() {
    // First signal: set graceful shutdown flag
    // Second signal: force exit (default SIGINT behavior restored)
    // SAFETY: AtomicBool::swap and process::exit are async-signal-safe
    unsafe {
        signal_hook::low_level::register(signal_hook::consts::SIGTERM, || {
            if shutdown_flag().swap(true, Ordering::Relaxed) {
                std::process::exit(130);
            }
        })
        .expect("Failed to register SIGTERM handler");
        signal_hook::low_level::register(signal_hook::consts::SIGINT, || {
            if shutdown_flag().swap(true, Ordering::Relaxed) {
                std::process::exit(130);
            }
        })
        .expect("Failed to register SIGINT handler");
    }
}
