//! Lab server entrypoint.
//!
//! Run: cargo run
//! Test:
//!   # Log in and read your own record
//!   TOKEN=$(curl -s -X POST http://localhost:8080/api/auth/login \
//!     -H 'Content-Type: application/json' \
//!     -d '{"email": "marcus.webb@creditlab.test", "password": "password123"}' | jq -r .access_token)
//!   curl -H "Authorization: Bearer $TOKEN" http://localhost:8080/api/users
//!
//!   # Read someone else's record without any token
//!   curl http://localhost:8080/api/users/U1001
//!
//!   # Raise someone else's credit limit without any token
//!   curl -X POST http://localhost:8080/api/users/U1002/credits \
//!     -H 'Content-Type: application/json' \
//!     -d '{"creditLimit": "999999.99"}'

use credit_api_lab::db::Database;
use credit_api_lab::handlers::{self, AppState};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "credit_api_lab=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db = match std::env::var("CREDIT_API_DB") {
        Ok(path) => Database::new_from_file(&path).expect("Failed to open database"),
        Err(_) => Database::new_in_memory().expect("Failed to create database"),
    };
    db.seed_users().expect("Failed to seed users");

    let app = handlers::app(AppState { db })
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr =
        std::env::var("CREDIT_API_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();

    tracing::info!("Credit management lab API running on http://{}", addr);
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  POST /api/auth/login                - Exchange email/password for a token");
    tracing::info!("  GET  /api/users                     - Own record (Bearer token required)");
    tracing::info!("  GET  /api/users/{{user_id}}           - Any record, no auth");
    tracing::info!("  PUT  /api/users/{{user_id}}           - Update any record, no auth");
    tracing::info!("  GET  /api/users/{{user_id}}/credits   - Any credit limit, no auth");
    tracing::info!("  POST /api/users/{{user_id}}/credits   - Set/add any credit limit, no auth");
    tracing::info!("");
    tracing::info!("Seeded accounts:");
    tracing::info!("  U1001  priya.raman@creditlab.test    admin123    (admin)");
    tracing::info!("  U1002  marcus.webb@creditlab.test    password123");
    tracing::info!("  U1003  elena.sokolova@creditlab.test winter2025");
    tracing::info!("  U1004  dev.patel@creditlab.test      changeme1   (suspended)");

    axum::serve(listener, app).await.unwrap();
}
