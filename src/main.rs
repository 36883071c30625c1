use persona_rooms::{bootstrap, config::Config, middleware::RateLimitLayer, server};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Initialize logging and tracing
fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,tower_http=debug,persona_rooms=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    info!("🚀 Starting persona rooms backend");

    let config = Config::from_env()?;
    let state = bootstrap::initialize_app_state(&config)?;

    let app = server::create_app(
        state,
        &config.cors_origins,
        RateLimitLayer::per_minute(config.chat_rate_limit_per_minute),
    );

    server::run_server(app, &config.bind_address).await?;

    Ok(())
}
