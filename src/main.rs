// src/main.rs

use std::sync::Arc;

use actix_web::{web, App, HttpServer};

use sales_ledger::sales::postgres_store::PgSaleStore;
use sales_ledger::sales::sales_router;
use sales_ledger::sales::sales_service::SaleService;
use sales_ledger::sales::sales_store::{InMemorySaleStore, SaleStore};
use sales_ledger::shared::clock::SystemClock;
use sales_ledger::shared::config::Config;
use sales_ledger::shared::telemetry;
use sales_ledger::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Logging first so config and connection failures are reported
    telemetry::init();

    let config = Config::from_env()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    // Picks the store: Postgres when DATABASE_URL is set (migrations run on
    // connect), memory otherwise
    let store: Arc<dyn SaleStore> = match &config.database_url {
        Some(url) => {
            let store = PgSaleStore::connect(url, config.max_connections)
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, "failed to connect to PostgreSQL");
                    std::io::Error::new(std::io::ErrorKind::Other, e)
                })?;
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; sales are kept in memory only");
            Arc::new(InMemorySaleStore::new())
        }
    };

    // Shared application state, cloned into every worker
    let app_state = web::Data::new(AppState {
        sales: SaleService::new(store, Arc::new(SystemClock)),
    });

    tracing::info!(addr = %config.bind_addr, "starting sales API");

    // Starts the HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .configure(sales_router::configure)
    })
    .bind(&config.bind_addr)?
    .run()
    .await
}
