//! Main entry point for the Tutor Match service
//!
//! This is the production entry point that initializes and runs the
//! complete matchmaking and chat relay service with proper error
//! handling, logging, and graceful shutdown.

use anyhow::Result;
use clap::Parser;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tutor_match::audit::{AuditLogger, SqliteAuditStore};
use tutor_match::config::{validate_config, AppConfig};
use tutor_match::hub::Hub;
use tutor_match::utils::lan_addresses;
use tutor_match::ws::build_router;

/// Tutor Match Service - Anonymous one-on-one tutoring matchmaking
#[derive(Parser)]
#[command(
    name = "tutor-match",
    version,
    about = "A matchmaking and chat relay service for anonymous one-on-one tutoring",
    long_about = "Tutor Match pairs waiting students and tutors by grade, subject, and role \
                 over long-lived WebSocket connections, relays their private chat sessions, \
                 hosts a public chat room, and records activity to a durable log."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Host override
    #[arg(long, value_name = "HOST", help = "Override listener host")]
    host: Option<String>,

    /// Port override
    #[arg(short, long, value_name = "PORT", help = "Override listener port")]
    port: Option<u16>,

    /// Static asset directory override
    #[arg(long, value_name = "DIR", help = "Override static asset directory")]
    static_dir: Option<PathBuf>,

    /// Audit database URL override
    #[arg(long, value_name = "URL", help = "Override audit database URL")]
    audit_db: Option<String>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Dry run mode (validate config and exit)
    #[arg(
        long,
        help = "Validate configuration and exit without starting service"
    )]
    dry_run: bool,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => error!("Failed to install Ctrl+C handler: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C) signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

/// Display startup banner with service information
fn display_startup_banner(config: &AppConfig) {
    info!("🚀 Tutor Match Service");
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    info!("   Listening on: http://{}", config.bind_address());
    for addr in lan_addresses() {
        info!("   LAN access: http://{}:{}", addr, config.server.port);
    }
    info!("   Static assets: {}", config.server.static_dir);
    info!("   Audit database: {}", config.audit.database_url);
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

/// Load and merge configuration from environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    // Start with environment-based config
    let mut config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path.display());
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }

    if let Some(port) = args.port {
        config.server.port = port;
    }

    if let Some(static_dir) = &args.static_dir {
        config.server.static_dir = static_dir.display().to_string();
    }

    if let Some(audit_db) = &args.audit_db {
        config.audit.database_url = audit_db.clone();
    }

    // Overrides can introduce values env loading would have rejected
    validate_config(&config)?;

    Ok(config)
}


#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration (CLI args can override environment/config file)
    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    // Initialize logging early (before any other operations)
    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if args.dry_run {
        info!("Configuration validation successful");
        display_startup_banner(&config);
        info!("Dry run completed - exiting without starting service");
        return Ok(());
    }

    display_startup_banner(&config);

    // A service that cannot reach its audit store at boot must not start
    info!("Initializing service components...");
    let store = match SqliteAuditStore::connect(&config.audit.database_url).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!("Failed to open audit store: {}", e);
            std::process::exit(1);
        }
    };

    let audit = AuditLogger::spawn(store);
    let hub = Arc::new(Hub::new(audit));
    let app = build_router(hub, std::path::Path::new(&config.server.static_dir));

    let listener = match tokio::net::TcpListener::bind(config.bind_address()).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", config.bind_address(), e);
            std::process::exit(1);
        }
    };

    info!("✅ Tutor Match Service is running");
    info!("Press Ctrl+C to shutdown gracefully...");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        let _ = shutdown_rx.await;
    });
    let server_task = tokio::spawn(server.into_future());

    // Wait for shutdown signal
    wait_for_shutdown_signal().await;

    // Begin graceful shutdown
    info!("🛑 Shutdown signal received, beginning graceful shutdown...");
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(config.shutdown_timeout(), server_task).await {
        Ok(Ok(Ok(()))) => {
            info!("✅ Graceful shutdown completed successfully");
        }
        Ok(Ok(Err(e))) => {
            error!("Server error: {}", e);
            std::process::exit(1);
        }
        Ok(Err(e)) => {
            error!("Server task failed: {}", e);
            std::process::exit(1);
        }
        Err(_) => {
            warn!("⚠️  Shutdown timeout exceeded, forcing exit");
        }
    }

    info!("🛑 Tutor Match Service stopped");
    Ok(())
}
