use anyhow::Result;
use clap::Parser;
use fatigue_monitor::telemetry::TelemetryTransport;
use fatigue_monitor::{FatigueConfig, FatigueOrchestrator, HttpTransport, ReplayProvider};
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "fatigue-monitor")]
#[command(about = "Driver fatigue monitor with hysteresis classification and backend telemetry")]
#[command(version)]
#[command(long_about = "Derives eye, mouth and head-tilt signals from facial landmarks, \
classifies sustained drowsiness, yawning and head tilt, drives the in-cab alarm and relays \
status to the fleet backend without stalling the sensing loop.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "fatigue.toml", help = "Path to TOML configuration file")]
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

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit without starting the monitor")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Probe the backend and exit
    #[arg(long, help = "Check backend health, print the latest stored record and exit")]
    check_backend: bool,

    /// Landmark replay file
    #[arg(long, value_name = "FILE", help = "Feed a JSON-lines landmark file through the pipeline")]
    replay: Option<PathBuf>,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle special modes that don't require full initialization
    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    // Initialize logging
    init_logging(&args)?;

    info!("Starting fatigue monitor v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    // Load and validate configuration
    let config = match FatigueConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        if args.validate_config {
            eprintln!("✗ Configuration validation failed: {}", e);
            std::process::exit(1);
        }
        return Err(e.into());
    }

    if args.validate_config {
        info!("Configuration validation successful");
        println!("✓ Configuration is valid");
        return Ok(());
    }

    if args.check_backend {
        let reachable = check_backend(&config).await?;
        std::process::exit(if reachable { 0 } else { 1 });
    }

    let Some(replay) = args.replay.as_ref() else {
        error!("No landmark source given; use --replay FILE");
        eprintln!("✗ No landmark source given; use --replay FILE");
        std::process::exit(2);
    };

    let provider = ReplayProvider::open(replay).await.map_err(|e| {
        error!("Failed to open replay file: {}", e);
        e
    })?;

    let mut orchestrator = FatigueOrchestrator::with_http_backend(config, Box::new(provider))
        .map_err(|e| {
            error!("Failed to create orchestrator: {}", e);
            e
        })?;

    let summary = orchestrator.run().await.map_err(|e| {
        error!("Monitor error during execution: {}", e);
        e
    })?;

    info!(
        "Fatigue monitor stopped ({:?}) after {} frames, exit code {}",
        summary.reason, summary.stats.frames, summary.exit_code
    );

    std::process::exit(summary.exit_code);
}

/// Probe backend health and print the latest record stored for this device
async fn check_backend(config: &FatigueConfig) -> Result<bool> {
    let transport = HttpTransport::new(&config.backend)?;
    let timeout = config.telemetry.delivery_timeout();

    match tokio::time::timeout(timeout, transport.health()).await {
        Ok(Ok(())) => println!("✓ Backend reachable at {}", transport.endpoint()),
        Ok(Err(e)) => {
            eprintln!("✗ Backend unreachable at {}: {}", transport.endpoint(), e);
            return Ok(false);
        }
        Err(_) => {
            eprintln!(
                "✗ Backend health check timed out after {:?} at {}",
                timeout,
                transport.endpoint()
            );
            return Ok(false);
        }
    }

    match transport.latest_data(timeout).await {
        Ok(record) => println!("{}", serde_json::to_string_pretty(&record)?),
        Err(e) => warn!("No latest record available: {}", e),
    }

    Ok(true)
}

fn init_logging(args: &Args) -> Result<()> {
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
        .unwrap_or_else(|_| EnvFilter::new(format!("fatigue_monitor={}", log_level)));

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

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();

    Ok(())
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# Fatigue Monitor Configuration File");
    println!("# This is the default configuration with all available options");
    println!("# Any value can be overridden with FATIGUE_<SECTION>__<KEY>, e.g. FATIGUE_TELEMETRY__PROBE_TIMEOUT_MS=300");
    println!();
    println!("{}", toml::to_string_pretty(&FatigueConfig::default())?);
    Ok(())
}
