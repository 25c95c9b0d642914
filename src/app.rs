/*
 * Responsibility
 * - Config -> dependencies -> Router
 * - JWT middleware (with exclusions) and HTTP layers
 * - Serve with axum::serve()
 */
use std::{panic, process};

use anyhow::Result;
use axum::{Router, routing::get};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::api::v1::handlers::health::health;
use crate::config::Config;
use crate::middleware::{self, JwtAuth, Middleware};
use crate::services::cache::{CacheBackend, CacheClient, CacheError};
use crate::services::revocation::CacheDenylist;
use crate::state::{AppState, Denylist, TOKEN_KEY};

fn init_tracing() {
    // RUST_LOG wins, e.g. RUST_LOG=info,bearer_guard=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // development: crash loudly; production: keep serving
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config).await?;
    let app = build_router(&config, state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub async fn build_state(config: &Config) -> Result<AppState, CacheError> {
    let cache = CacheBackend::from_url(config.valkey_url.as_deref()).await?;
    if !cache.is_shared() {
        tracing::warn!("VALKEY_URL not set; revocations are kept in process memory");
    }
    tracing::info!(backend = cache.backend_name(), "revocation denylist ready");

    Ok(AppState::new(CacheDenylist::new(cache), &config.state_key))
}

/// JWT middleware as configured; the denylist doubles as revocation check.
pub fn build_auth(config: &Config, denylist: &Denylist) -> JwtAuth {
    let mut builder = JwtAuth::builder()
        .secret(config.secret.clone())
        .key(&config.state_key)
        .token_key(TOKEN_KEY)
        .algorithms(config.algorithms.iter().copied())
        .leeway(config.leeway_seconds)
        .passthrough(config.passthrough)
        .debug(config.debug)
        .is_revoked(denylist.clone());

    if let Some(cookie) = &config.cookie {
        builder = builder.cookie(cookie);
    }
    for audience in &config.audience {
        builder = builder.audience(audience);
    }
    for issuer in &config.issuer {
        builder = builder.issuer(issuer);
    }

    builder.build()
}

pub fn build_router(config: &Config, state: AppState) -> Router {
    let auth = build_auth(config, &state.denylist).unless(config.exclusions.clone());

    let router = Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api::v1::routes())
        .with_state(state);

    let router = middleware::apply(router, auth);
    middleware::http::apply(router)
}
