use axum::{
    routing::{get, post, put},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

use stockledger_rs::{
    config::Config,
    db,
    health::health,
    routes::checks::{apply_adjustments, complete_check, get_check, open_check, record_line},
    routes::credit::{append_entry, create_account, get_account, settle_entry},
    routes::movements::{apply_movement, list_low_stock, list_stock},
    routes::returns::{process_return, submit_return},
    routes::sales::{finalize_sale, get_sale, recompute_sale, submit_sale},
};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file (if present)
    dotenvy::dotenv().ok();

    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    tracing::info!("Starting stock ledger service...");

    let config = Config::from_env()
        .expect("Failed to load configuration from environment");

    tracing::info!(
        "Configuration loaded: host={}, port={}",
        config.host,
        config.port
    );

    tracing::info!("Connecting to database...");
    let pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Running migrations...");
    sqlx::migrate!("./db/migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let app = Router::new()
        .route("/api/health", get(health))
        .route("/api/stock/movements", post(apply_movement))
        .route("/api/stock", get(list_stock))
        .route("/api/stock/low", get(list_low_stock))
        .route("/api/sales", post(submit_sale))
        .route("/api/sales/{sale_id}", get(get_sale))
        .route("/api/sales/{sale_id}/finalize", post(finalize_sale))
        .route("/api/sales/{sale_id}/recompute", post(recompute_sale))
        .route("/api/returns", post(submit_return))
        .route("/api/returns/{return_id}/process", post(process_return))
        .route("/api/credit/accounts", post(create_account))
        .route("/api/credit/accounts/{account_id}", get(get_account))
        .route("/api/credit/entries", post(append_entry))
        .route("/api/credit/entries/{entry_id}/settle", post(settle_entry))
        .route("/api/checks", post(open_check))
        .route("/api/checks/{check_id}", get(get_check))
        .route("/api/checks/{check_id}/lines", put(record_line))
        .route("/api/checks/{check_id}/complete", post(complete_check))
        .route("/api/checks/{check_id}/apply-adjustments", post(apply_adjustments))
        .with_state(Arc::new(pool.clone()))
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Stock ledger service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}
