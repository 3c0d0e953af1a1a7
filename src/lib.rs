pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod db;
pub mod entities;
pub mod scheduler;
pub mod services;
pub mod state;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

pub use cli::{Cli, Commands};
pub use config::Config;
use scheduler::MaintenanceScheduler;
use state::SharedState;

/// Loads the config for `serve`/`purge-tokens`: an explicit `--config` path,
/// or the first file found in the default locations.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    path.map_or_else(Config::load, Config::load_from_path)
}

pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    init_tracing(&config);

    if cli.resolved_command() == Commands::Init {
        return cmd_init(cli.config.as_deref());
    }

    config.validate()?;

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        info!("Prometheus metrics recorder initialized");
        Some(handle)
    } else {
        None
    };

    match cli.resolved_command() {
        Commands::Serve => run_daemon(config, prometheus_handle).await,
        Commands::PurgeTokens => cmd_purge_tokens(config).await,
        Commands::Init => Ok(()),
    }
}

fn init_tracing(config: &Config) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.general.log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn cmd_init(path: Option<&Path>) -> anyhow::Result<()> {
    let path = path.map_or_else(Config::default_config_path, Path::to_path_buf);

    if Config::create_default_if_missing(&path)? {
        println!("Created config file: {}", path.display());
        println!("A random signing secret was generated for auth.jwt_secret.");
    } else {
        println!("Config file already exists: {}", path.display());
    }

    Ok(())
}

async fn cmd_purge_tokens(config: Config) -> anyhow::Result<()> {
    let shared = SharedState::new(config).await?;
    let scheduler = MaintenanceScheduler::new(
        Arc::clone(&shared.auth_service),
        shared.config.maintenance.clone(),
    );

    let purged = scheduler.run_once().await?;
    println!("Purged {purged} expired revocation entries");

    Ok(())
}

async fn run_daemon(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<()> {
    info!("taskd v{} starting...", env!("CARGO_PKG_VERSION"));

    let port = config.server.port;
    let api_state = api::create_app_state_from_config(config, prometheus_handle).await?;

    let scheduler = MaintenanceScheduler::new(
        Arc::clone(api_state.auth_service()),
        api_state.config().maintenance.clone(),
    );
    let mut cron = scheduler.start().await?;

    info!("Starting Web API on port {}", port);

    let app = api::router(api_state);
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Web Server running at http://0.0.0.0:{}", port);

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());
    if let Err(e) = server.await {
        error!("Web server error: {}", e);
    }

    if let Some(sched) = cron.as_mut()
        && let Err(e) = sched.shutdown().await
    {
        warn!("Scheduler shutdown failed: {}", e);
    }

    info!("taskd stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}
