use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod config;
mod dispatch;
mod flows;
mod game;
mod matching;
mod models;
mod routes;
mod schema;
mod store;
mod voting;
mod wallet;

use config::AppConfig;
use flows::FlowRegistry;
use models::ItemKind;
use parlor_shared::clients::chat::ChatClient;
use parlor_shared::clients::db::create_pool;
use parlor_shared::clients::geocode::Geocoder;
use parlor_shared::errors::AppResult;
use store::pg::PgStore;
use store::Store;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub chat: ChatClient,
    pub geocoder: Geocoder,
    pub config: AppConfig,
    pub flows: FlowRegistry,
    /// Maintenance switch: everyone but admins gets turned away.
    pub guest_mode: AtomicBool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    parlor_shared::middleware::init_tracing("parlor-bot");

    let config = AppConfig::load()?;
    let port = config.port;

    let pool = create_pool(&config.database_url);
    let store: Arc<dyn Store> = Arc::new(PgStore::new(pool, config.initial_balance));
    seed_shop(store.as_ref())?;

    let state = Arc::new(AppState {
        chat: ChatClient::new(&config.chat_api_base_url),
        geocoder: Geocoder::new(),
        flows: FlowRegistry::new(),
        guest_mode: AtomicBool::new(false),
        store,
        config,
    });

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/webhook", post(routes::webhook::receive_update))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "parlor-bot starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Catalog rows are stable; reruns are no-ops.
fn seed_shop(store: &dyn Store) -> AppResult<()> {
    store.ensure_shop_item("ticket", "Party ticket", ItemKind::Ticket, 25)?;
    store.ensure_shop_item("bottle", "Signature bottle", ItemKind::Bottle, 40)?;
    store.ensure_shop_item("hoodie", "Logo hoodie", ItemKind::Hoodie, 120)?;
    Ok(())
}
