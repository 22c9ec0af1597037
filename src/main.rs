//! Bridgeway - Q&A backend connecting seniors who ask with youth who answer

use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bridgeway::{config::Args, db::MongoClient, server, sweep};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("bridgeway={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration
    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    // Print startup banner
    info!("======================================");
    info!("  Bridgeway - senior/youth Q&A");
    info!("======================================");
    info!("Node ID: {}", args.node_id);
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("MongoDB: {}", args.mongodb_uri);
    info!("Pending page size: {}", args.pending_page_size);
    info!("Acceptance award: {} points", args.accept_award_points);
    info!("Sweep interval: {}s", args.sweep_interval_secs);
    info!("======================================");

    // Connect to MongoDB (optional in dev mode)
    let mongo = match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
        Ok(client) => {
            info!("MongoDB connected successfully");
            Some(client)
        }
        Err(e) => {
            if args.dev_mode {
                warn!("MongoDB connection failed (dev mode, continuing without): {}", e);
                None
            } else {
                error!("MongoDB connection failed: {}", e);
                std::process::exit(1);
            }
        }
    };

    // Create application state
    let state = Arc::new(server::AppState::new(args.clone(), mongo));

    // Start the consistency sweep (repairs two-row-write residue)
    let _sweep_handle = match (&state.mongo, args.sweep_interval_secs) {
        (Some(mongo), secs) if secs > 0 => {
            let handle = sweep::spawn_sweep_task(
                mongo.clone(),
                Arc::clone(&state.events),
                args.accept_award_points,
                Duration::from_secs(secs),
            );
            info!("Consistency sweep started (every {}s)", secs);
            Some(handle)
        }
        (Some(_), _) => {
            warn!("Consistency sweep disabled (SWEEP_INTERVAL_SECS=0)");
            None
        }
        (None, _) => {
            warn!("Consistency sweep not started (no MongoDB)");
            None
        }
    };

    // Run the server
    if let Err(e) = server::run(state).await {
        error!("Server error: {:?}", e);
        std::process::exit(1);
    }

    Ok(())
}
