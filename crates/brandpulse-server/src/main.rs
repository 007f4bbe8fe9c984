mod api;
mod middleware;

use std::sync::Arc;

use brandpulse_monitor::{build_deps, Monitor, MonitorScheduler, MonitorStore, PgStore};
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = brandpulse_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pipeline = brandpulse_core::load_pipeline_config(config.pipeline_config_path.as_deref())?;

    let pool_config = brandpulse_db::PoolConfig::from_app_config(&config);
    let pool = brandpulse_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = brandpulse_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations up to date");

    let store: Arc<dyn MonitorStore> = Arc::new(PgStore::new(pool.clone()));
    let monitor = Monitor::new(build_deps(&config, pipeline, store)?);
    let scheduler = Arc::new(MonitorScheduler::new(monitor).await?);
    scheduler.resume_active().await?;

    let app = build_app(AppState {
        scheduler: Arc::clone(&scheduler),
        pool: Some(pool),
    });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(bind_addr = %config.bind_addr, env = %config.env, "brandpulse server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown().await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, stopping scheduler and server");
}
