use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use ember_api::{AppState, AppStateInner};
use ember_gateway::Dispatcher;
use ember_rooms::Rooms;

mod sweep;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "ember=debug,ember_api=debug,ember_db=debug,ember_gateway=debug,\
                 ember_rooms=debug,tower_http=debug"
                    .into()
            }),
        )
        .init();

    // Config
    let db_path = std::env::var("EMBER_DB_PATH").unwrap_or_else(|_| "ember.db".into());
    let host = std::env::var("EMBER_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("EMBER_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let sweep_interval_secs: u64 = std::env::var("EMBER_SWEEP_INTERVAL_SECS")
        .unwrap_or_else(|_| "30".into())
        .parse()?;

    // Init database
    let db = ember_db::Database::open(&PathBuf::from(&db_path))?;

    // Shared state
    let dispatcher = Dispatcher::new();
    let rooms = Rooms::new(Arc::new(db));
    let state: AppState = Arc::new(AppStateInner {
        rooms: rooms.clone(),
        dispatcher: dispatcher.clone(),
    });

    // Retire rooms past their deadline in the background
    tokio::spawn(sweep::run_sweep_loop(rooms, dispatcher, sweep_interval_secs));

    let app = ember_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("ember relay listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
