use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

use stereocam::rig::{StereoRigBuilder, TriggerMode, WorkflowStage};
use stereocam::sdk::MockSdk;
use stereocam::{RigWorker, StereoConfig};

#[derive(Parser, Debug)]
#[command(name = "stereocam-sim")]
#[command(about = "Drive the stereo camera rig against a simulated camera pair")]
#[command(version)]
#[command(long_about = "Runs the stereo rig lifecycle (initialize, configure, capture, release) \
against an in-memory pair of cameras carrying the built-in left/right serials. Useful for \
checking configuration files and exercising the capture path without hardware.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "stereocam.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    /// Also write logs to a daily rolling file in this directory
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize the rig, report the negotiated geometry and release
    Probe,

    /// Capture synchronized frame pairs
    Capture {
        /// Number of pairs to capture
        #[arg(short = 'n', long, default_value_t = 10)]
        count: u32,

        /// Workflow stage to configure before capturing (preview, detection, alignment)
        #[arg(long)]
        stage: Option<String>,

        /// Write raw frames; without DIR the configured capture.path is used
        #[arg(long, value_name = "DIR", num_args = 0..=1)]
        save: Option<Option<PathBuf>>,
    },

    /// Print default configuration in TOML format and exit
    PrintConfig,

    /// Validate configuration file and exit
    ValidateConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Command::PrintConfig = args.command {
        print_default_config()?;
        return Ok(());
    }

    let _log_guard = init_logging(&args)?;

    info!("Starting stereocam-sim v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let config = StereoConfig::load_from_file(&args.config).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        eprintln!("✗ Configuration validation failed: {}", e);
        std::process::exit(1);
    }

    match args.command {
        Command::ValidateConfig => {
            info!("Configuration validation successful");
            println!("✓ Configuration is valid");
            Ok(())
        }
        Command::Probe => probe(&config).await,
        Command::Capture { count, stage, save } => {
            let stage = stage
                .map(|name| name.parse::<WorkflowStage>())
                .transpose()?;
            let save_dir = resolve_save_dir(save, &config);
            capture(&config, count, stage, save_dir).await
        }
        Command::PrintConfig => Ok(()),
    }
}

/// Where `--save` writes: its own argument, else the configured capture path
fn resolve_save_dir(save: Option<Option<PathBuf>>, config: &StereoConfig) -> Option<PathBuf> {
    save.map(|dir| dir.unwrap_or_else(|| config.capture_dir()))
}

fn spawn_worker(config: &StereoConfig) -> Result<RigWorker> {
    let rig = StereoRigBuilder::new()
        .sdk(MockSdk::stereo_pair())
        .config(config)
        .build()?;
    Ok(RigWorker::spawn(rig))
}

async fn probe(config: &StereoConfig) -> Result<()> {
    let worker = spawn_worker(config)?;

    let outcome = async {
        worker.initialize().await?;
        let frame_size = worker.frame_buffer_size().await?;
        let health = worker.health().await?;

        println!("✓ Rig initialized, {} bytes per frame", frame_size);
        println!("{}", serde_json::to_string_pretty(&health)?);
        anyhow::Ok(())
    }
    .await;

    worker.shutdown().await?;
    outcome
}

async fn capture(
    config: &StereoConfig,
    count: u32,
    stage: Option<WorkflowStage>,
    save: Option<PathBuf>,
) -> Result<()> {
    let worker = spawn_worker(config)?;

    let outcome = async {
        worker.initialize().await?;
        worker.start_grabbing().await?;

        let triggered = match stage {
            Some(stage) => {
                worker.configure_for_stage(stage.as_str()).await?;
                stage.trigger_mode() == TriggerMode::Software
            }
            None => false,
        };

        for _ in 0..count {
            if triggered {
                worker.trigger_software().await?;
            }
            let frame = worker.capture().await?;
            info!(
                "Captured pair {} (left #{}, right #{}, {} bytes each)",
                frame.sequence,
                frame.left_frame_number,
                frame.right_frame_number,
                frame.left.len()
            );

            if let Some(dir) = &save {
                let [left, right] = frame
                    .save_raw(dir)
                    .with_context(|| format!("saving frame {} to {}", frame.sequence, dir.display()))?;
                println!("{} {}", left.display(), right.display());
            }
        }

        for slot in 0..2 {
            let (fps, dropped) = worker.status(slot).await?;
            println!("Camera {}: {:.2} fps, {} dropped", slot, fps, dropped);
        }
        println!("✓ Captured {} frame pair(s)", count);
        anyhow::Ok(())
    }
    .await;

    worker.shutdown().await?;
    outcome
}

fn init_logging(args: &Args) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    // Determine log level based on flags
    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("stereocam={}", log_level)));

    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_target(true)
                .with_thread_ids(args.debug)
                .with_file(args.debug)
                .with_line_number(args.debug)
                .boxed()
        }
    };

    let (file_layer, guard) = match &args.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "stereocam-sim.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(file_layer)
        .with(env_filter)
        .init();

    Ok(guard)
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# Stereocam Configuration File");
    println!("# Environment overrides use the STEREOCAM_ prefix, e.g. STEREOCAM_ACQUISITION__FRAME_RATE=15");
    println!();
    println!("{}", StereoConfig::default_toml()?);
    Ok(())
}
