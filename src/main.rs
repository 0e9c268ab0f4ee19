//! TelcoX Backend Server
//!
//! Customer account backend: realtime consumption, usage simulation,
//! consumption resets and account CRUD, plus a background updater that
//! keeps consumption counters moving.

use actix_cors::Cors;
use actix_web::{http::header, middleware, web, App, HttpResponse, HttpServer};
use anyhow::Context;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use telcox_api::{configure_routes, json_config, query_config};
use telcox_core::{AppConfig, Clock, SystemClock};
use telcox_db::{create_pool, run_migrations, MemoryStore, Repositories};
use telcox_services::{AutoUpdater, RandomSource, RealtimeService, UsageService};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging
fn init_tracing() {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "telcox_backend={lvl},telcox_api={lvl},telcox_services={lvl},telcox_db={lvl},actix_web=info,sqlx=warn",
            lvl = log_level
        ))
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

/// Build the CORS policy from a comma-separated origin list
fn build_cors(origins: &str) -> Cors {
    let cors = if origins.trim() == "*" {
        Cors::default().allow_any_origin()
    } else {
        let allowed: Vec<String> = origins
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();
        Cors::default().allowed_origin_fn(move |origin, _req_head| {
            origin
                .to_str()
                .map(|o| allowed.iter().any(|a| a == o))
                .unwrap_or(false)
        })
    };

    cors.allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
        .max_age(3600)
}

/// Select the storage backend
async fn build_repositories(config: &AppConfig) -> anyhow::Result<Repositories> {
    match config.database.url.as_deref() {
        Some(url) => {
            info!("Connecting to database...");
            let pool = create_pool(
                url,
                Some(config.database.max_connections),
                Some(config.database.acquire_timeout_secs),
            )
            .await
            .context("Failed to create database pool")?;

            if config.database.run_migrations {
                run_migrations(&pool)
                    .await
                    .context("Failed to apply migrations")?;
            }

            Ok(Repositories::postgres(pool))
        }
        None => {
            warn!("No database URL configured, using the in-memory store");
            Ok(Repositories::in_memory(Arc::new(MemoryStore::new())))
        }
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_tracing();

    info!(
        "Starting TelcoX Backend v{}",
        env!("CARGO_PKG_VERSION")
    );

    let config = AppConfig::load().context("Failed to load configuration")?;
    let repos = build_repositories(&config).await?;
    info!("Storage backend: {}", repos.backend);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let usage = web::Data::new(UsageService::new(
        &repos,
        clock.clone(),
        Box::new(RandomSource::from_entropy()),
        config.usage.clone(),
    ));
    let realtime = web::Data::new(RealtimeService::new(&repos, clock.clone()));

    let updater = if config.usage.auto_update_enabled {
        let period = Duration::from_secs(config.usage.auto_update_interval_secs);
        info!("Auto-updater enabled, period {:?}", period);
        let updater = AutoUpdater::new(
            &repos,
            clock.clone(),
            Box::new(RandomSource::from_entropy()),
            period,
        );
        Some(updater.spawn(CancellationToken::new()))
    } else {
        info!("Auto-updater disabled");
        None
    };

    let bind_addr = config.server_addr();
    let workers = config.server.workers.max(1);
    info!(
        "Starting HTTP server on {} with {} workers",
        bind_addr, workers
    );

    let cors_origins = config.server.cors_origins.clone();
    let repos = web::Data::new(repos);

    HttpServer::new(move || {
        App::new()
            .app_data(repos.clone())
            .app_data(usage.clone())
            .app_data(realtime.clone())
            .app_data(json_config())
            .app_data(query_config())
            // Middleware
            .wrap(build_cors(&cors_origins))
            .wrap(TracingLogger::default())
            .wrap(middleware::Logger::new("%a \"%r\" %s %b %Dms"))
            .wrap(middleware::NormalizePath::trim())
            .configure(configure_routes)
            // Root redirect to health
            .route(
                "/",
                web::get().to(|| async {
                    HttpResponse::Found()
                        .append_header(("Location", "/api/health"))
                        .finish()
                }),
            )
    })
    .workers(workers)
    .bind(&bind_addr)
    .with_context(|| format!("Failed to bind {}", bind_addr))?
    .run()
    .await?;

    if let Some(handle) = updater {
        let passes = handle.shutdown().await?;
        info!("Auto-updater stopped after {} passes", passes);
    }

    info!("TelcoX Backend stopped");
    Ok(())
}
