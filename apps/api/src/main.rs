use std::sync::Arc;

use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{self, TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bookit_api::{router, seed};
use reminder_cell::{LoggingDispatcher, ReminderScheduler};
use shared_config::AppConfig;
use shared_database::InMemoryStore;
use shared_utils::{AppState, SystemClock};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting BookIt scheduling API");

    // Load configuration
    let config = AppConfig::from_env();
    if !config.is_consistent() {
        warn!(
            "Default availability range ({} days) exceeds the maximum ({} days)",
            config.default_availability_days, config.max_availability_days
        );
    }

    let store = Arc::new(InMemoryStore::new());
    if config.seed_demo_data {
        seed::seed_demo_data(&store)
            .await
            .context("seeding demo data")?;
    }

    // Create shared state
    let state = Arc::new(AppState::new(config.clone(), store, Arc::new(SystemClock)));

    // Background reminder sweep
    let reminders = Arc::new(ReminderScheduler::new(&state, Arc::new(LoggingDispatcher)));
    let reminder_task = tokio::spawn({
        let reminders = reminders.clone();
        async move { reminders.start().await }
    });

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(state, reminders.clone())
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let listener = TcpListener::bind(config.bind_addr.as_str())
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    reminders.shutdown().await;
    if let Err(e) = reminder_task.await {
        warn!("Reminder task ended abnormally: {}", e);
    }

    info!("BookIt scheduling API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
