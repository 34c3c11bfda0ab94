//! # rusty-threads Binary
//!
//! The entry point that assembles the application based on compile-time
//! features.

use actix_web::{web, App, HttpServer};
use rt_api::handlers::AppState;
use rt_api::middleware;
use rt_core::traits::Stores;
use std::sync::Arc;

#[cfg(feature = "db-sqlite")]
use rt_db_sqlite::SqliteStore;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let db_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite:rusty_threads.db?mode=rwc".to_string());

    // 1. Initialize the store implementation
    #[cfg(feature = "db-sqlite")]
    let store = Arc::new(
        SqliteStore::new(&db_url)
            .await
            .expect("Failed to init SQLite"),
    );

    // 2. One plugin backs all four store traits
    let state = web::Data::new(AppState {
        stores: Stores {
            threads: store.clone(),
            users: store.clone(),
            communities: store.clone(),
            notifications: store,
        },
    });

    log::info!("🚀 rusty-threads API starting on http://127.0.0.1:8080");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::standard_middleware())
            .wrap(middleware::cors_policy())
            .configure(rt_api::configure_routes)
    })
    .bind(("127.0.0.1", 8080))?
    .run()
    .await
}
