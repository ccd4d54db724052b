// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Amaliah Tracker API Server
//!
//! Tracks daily prayers, fasting, Quran reading and good deeds during
//! Ramadan for students, with an admin panel for teachers.

use amaliah_tracker::{
    config::Config,
    db::{users::NewUser, Database},
    models::Role,
    services::{password::hash_password, PrayerTimeService},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const INITIAL_ADMIN_USERNAME: &str = "admin";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Amaliah Tracker API");

    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    if let Some(password) = &config.admin_initial_password {
        seed_initial_admin(&db, password).await?;
    }

    let prayer_times = PrayerTimeService::from_config(&config)?;
    tracing::info!(
        api = %config.prayer_api_url,
        geocoder = %config.geocoder_url,
        "Prayer schedule client initialized"
    );

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        prayer_times,
    });

    // Build router
    let app = amaliah_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Create the first superadmin account unless an admin already exists.
async fn seed_initial_admin(db: &Database, password: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db.admin_exists().await? {
        return Ok(());
    }

    let user = NewUser {
        username: INITIAL_ADMIN_USERNAME.to_string(),
        email: "admin@localhost".to_string(),
        password_hash: hash_password(password)?,
        full_name: "Administrator".to_string(),
        class: String::new(),
        role: Role::SuperAdmin,
        school_id: None,
    };
    db.create_user(&user).await?;
    tracing::warn!(
        username = INITIAL_ADMIN_USERNAME,
        "Seeded initial admin account; change its password"
    );
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("amaliah_tracker=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
