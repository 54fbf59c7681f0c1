//! Portal API binary

use std::net::SocketAddr;
use std::sync::Arc;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use portal_api::{build_router, AppState, Config, Directory};
use portal_auth_core::HttpIdentityProvider;
use portal_db::Repositories;
use tokio::signal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("portal_api=debug".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Portal API");

    let config = Config::from_env()?;
    tracing::info!(
        http_port = config.http_port,
        lookup_timeout_secs = config.lookup_timeout.as_secs(),
        "Configuration loaded"
    );

    let metrics_handle = if config.metrics_enabled {
        Some(setup_metrics()?)
    } else {
        None
    };

    let pool = portal_db::create_pool_with_options(&config.database_url, &config.pool).await?;
    tracing::info!("Database pool created");

    let directory = Directory::from_repositories(Repositories::new(pool.clone()));
    let provider = Arc::new(HttpIdentityProvider::new(config.provider.clone()));

    let state = AppState::new(directory, provider)
        .with_pool(pool)
        .with_request_timeout(config.request_timeout)
        .with_lookup_timeout(config.lookup_timeout);

    let app = build_router(state, metrics_handle);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    tracing::info!("HTTP server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn setup_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    metrics::describe_counter!(
        "portal_resolution_cache_hits",
        "Resolutions served from the cache"
    );
    metrics::describe_counter!(
        "portal_resolution_cache_misses",
        "Resolutions that ran a directory lookup"
    );
    metrics::describe_counter!(
        "portal_access_checks_total",
        "Access validations by outcome"
    );

    Ok(handle)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
