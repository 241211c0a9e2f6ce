//! Dashbank dashboard loader
//!
//! Loads one user's dashboard against the configured document store and
//! rate source, then prints the rendered view as JSON.
//!
//! ```text
//! dashbank <user-id> [user|admin]
//! ```
//!
//! `DASHBANK_USER` and `DASHBANK_ROLE` are used when the arguments are absent.

use std::sync::Arc;

use anyhow::{Context, bail};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dashbank_core::modules::Role;
use dashbank_core::session::{DashboardPorts, DashboardSession, SessionSettings};
use dashbank_shared::AppConfig;
use dashbank_shared::types::UserId;
use dashbank_store::{CachedRateSource, HttpDocumentStore, HttpRateSource};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dashbank=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let (user_id, role) = identity()?;
    let config = AppConfig::load().context("Failed to load configuration")?;
    let settings = SessionSettings::from_config(user_id, role, &config.dashboard)?;

    let store = Arc::new(HttpDocumentStore::new(&config.store)?);
    let rates = HttpRateSource::new(&config.rates, settings.base_currency.clone())?;
    let rates = CachedRateSource::with_ttl(Arc::new(rates), config.rates.cache_ttl_secs);
    info!(
        store = %config.store.base_url,
        rates = %config.rates.url,
        base_currency = %settings.base_currency,
        "Adapters configured"
    );

    let ports = DashboardPorts {
        rates: Arc::new(rates),
        catalog: store.clone(),
        preferences: store.clone(),
        collections: store,
    };
    let mut session = DashboardSession::new(ports, settings);
    session.load().await;

    let view = session.view();
    info!(
        modules = view.modules.len(),
        notices = view.notices.len(),
        partial = view.totals.partial,
        "Dashboard loaded"
    );
    println!("{}", serde_json::to_string_pretty(&view)?);

    Ok(())
}

/// Reads the user id and role from the arguments, falling back to the environment.
fn identity() -> anyhow::Result<(UserId, Role)> {
    let mut args = std::env::args().skip(1);

    let Some(user) = args.next().or_else(|| std::env::var("DASHBANK_USER").ok()) else {
        bail!("usage: dashbank <user-id> [user|admin]");
    };
    let role = match args.next().or_else(|| std::env::var("DASHBANK_ROLE").ok()) {
        Some(role) => role.parse::<Role>().map_err(anyhow::Error::msg)?,
        None => Role::default(),
    };

    Ok((UserId::from(user), role))
}
