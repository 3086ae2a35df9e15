use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use http::{header, Method};
use tower_governor::governor::GovernorConfigBuilder;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pastebox::{app, config::Config, services::reaper, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    tracing::info!("✅ Configuration loaded successfully");

    let state = AppState::new(&config).await?;
    tracing::info!("✅ AppState initialized");

    let cors = CorsLayer::new()
        .allow_origin([
            "http://localhost:3000".parse().unwrap(),
            "http://127.0.0.1:3000".parse().unwrap(),
        ])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::COOKIE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(86400));

    // Password verification is the brute-forceable surface; the governor
    // keeps per-client attempt rates bounded.
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(5)
            .burst_size(20)
            .use_headers()
            .finish()
            .unwrap(),
    );

    let sweep_store = state.store.clone();
    let sweep_interval = Duration::from_secs(config.sweep_interval_secs);
    tokio::spawn(async move {
        reaper::sweep_loop(sweep_store, sweep_interval).await;
    });
    tracing::info!("✅ Background expiration sweep started");

    let app = app::router(state)
        .layer(tower_governor::GovernorLayer::new(governor_conf))
        .layer(cors);

    let addr: SocketAddr = config.bind_addr.parse()?;
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
