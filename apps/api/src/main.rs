use axum::Router;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{error, info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod router;

use shared_config::AppConfig;
use shared_database::AppState;

const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Request spans at INFO plus an open CORS policy for browser clients.
fn with_http_layers(app: Router) -> Router {
    let trace = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    app.layer(trace).layer(cors)
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env();
    let addr = config.bind_addr;
    info!("Starting clinic API with {:?} storage", config.storage);

    let app = with_http_layers(router::create_router(AppState::from_config(config)));

    let listener = TcpListener::bind(addr).await.inspect_err(|e| {
        error!("Could not bind {}: {}", addr, e);
    })?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await
}
