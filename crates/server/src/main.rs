//! Folio - personal portfolio server.
//!
//! # Architecture
//!
//! - Axum web framework
//! - Askama templates for server-side rendering
//! - Claude API for the visitor assistant and admin drafting help
//! - OAuth sign-in with a single admin account
//! - Projects in memory, `PostgreSQL` or Firebase, chosen by `FOLIO_STORE`

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::error::Error;

use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use folio_server::config::SiteConfig;
use folio_server::profile::Profile;
use folio_server::state::AppState;
use folio_server::{build_router, store};

/// Schema and table holding sessions when running on `PostgreSQL`.
const SESSION_SCHEMA: &str = "folio";
const SESSION_TABLE: &str = "session";

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &SiteConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            send_default_pii: false,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing(config: &SiteConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "folio_server=info,tower_http=debug".into());

    let json_layer = config
        .log_json
        .then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!config.log_json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = SiteConfig::from_env()?;

    // Sentry before the subscriber so the tracing integration has a client.
    let _sentry_guard = init_sentry(&config);
    init_tracing(&config);

    let profile = Profile::load(config.profile_path.as_deref())?;
    let connected = store::connect(&config.store).await?;
    tracing::info!(store = config.store.kind(), "Project store ready");

    // NOTE: Migrations are NOT run on startup.
    // Run them explicitly via: cargo run -p folio-cli -- migrate

    let addr = config.socket_addr();
    let state = AppState::new(config, connected.store, profile)?;

    let app = match connected.pool {
        Some(pool) => {
            let sessions = tower_sessions_sqlx_store::PostgresStore::new(pool)
                .with_schema_name(SESSION_SCHEMA)?
                .with_table_name(SESSION_TABLE)?;
            build_router(state, sessions)
        }
        None => build_router(state, tower_sessions::MemoryStore::default()),
    };

    tracing::info!("folio listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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
