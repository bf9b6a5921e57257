use anyhow::Result;
use clap::Parser;
use tracing::info;

use sevad::config::PortalConfig;
use sevad::{rest, seed, AppContext};

#[derive(Parser)]
#[command(
    name = "sevad",
    about = "Seva Portal — unified citizen-services backend",
    version
)]
struct Args {
    /// HTTP server port
    #[arg(long, env = "SEVAD_PORT")]
    port: Option<u16>,

    /// Data directory for uploads, config, and the SQLite database
    #[arg(long, env = "SEVAD_DATA_DIR")]
    data_dir: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "SEVAD_LOG")]
    log: Option<String>,

    /// Bind address (default: 127.0.0.1; use 0.0.0.0 for LAN access)
    #[arg(long, env = "SEVAD_BIND")]
    bind_address: Option<String>,

    /// Write logs to this file path (rotated daily). Optional.
    #[arg(long, env = "SEVAD_LOG_FILE")]
    log_file: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = PortalConfig::new(args.port, args.data_dir, args.log, args.bind_address);

    let _log_guard = setup_tracing(&config.log, &config.log_format, args.log_file.as_deref());

    info!(
        version = env!("CARGO_PKG_VERSION"),
        data_dir = %config.data_dir.display(),
        "starting sevad"
    );

    let ctx = AppContext::initialize(config).await?;

    seed::seed_grants(&ctx.storage).await?;

    let idle_minutes = ctx.config.chat.session_idle_minutes;
    if idle_minutes > 0 {
        ctx.chat.clone().spawn_idle_sweeper(idle_minutes);
    }

    rest::start_server(ctx).await
}

/// Initialise the tracing subscriber.
///
/// Returns the file-appender guard when a log file is configured; dropping it
/// flushes buffered log lines on shutdown.
fn setup_tracing(
    log_level: &str,
    log_format: &str,
    log_file: Option<&std::path::Path>,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let use_json = log_format == "json";

    if let Some(path) = log_file {
        let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
        let filename = path
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("sevad.log"));

        // Ensure the directory exists before tracing-appender tries to open it.
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!(
                "warn: could not create log directory '{}': {e} — falling back to stdout",
                dir.display()
            );
            if use_json {
                tracing_subscriber::fmt().json().with_env_filter(log_level).init();
            } else {
                tracing_subscriber::fmt().with_env_filter(log_level).compact().init();
            }
            return None;
        }

        let appender = tracing_appender::rolling::daily(dir, filename);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);

        if use_json {
            tracing_subscriber::registry()
                .with(EnvFilter::new(log_level))
                .with(fmt::layer().json())
                .with(fmt::layer().json().with_writer(non_blocking))
                .init();
        } else {
            tracing_subscriber::registry()
                .with(EnvFilter::new(log_level))
                .with(fmt::layer().compact())
                .with(fmt::layer().with_writer(non_blocking))
                .init();
        }

        Some(guard)
    } else if use_json {
        tracing_subscriber::fmt().json().with_env_filter(log_level).init();
        None
    } else {
        tracing_subscriber::fmt().with_env_filter(log_level).compact().init();
        None
    }
}
