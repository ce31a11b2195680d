use std::sync::Arc;
use storefront_cart::{
    adapters,
    cart::{state::spawn_session_sweeper, AppState, StoreSettings},
    config::ServerConfig,
    logging,
    router::create_app_router,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::load()?;
    logging::init_subscriber(&config)?;

    // Initialize application state
    let settings = StoreSettings {
        pricing: config.pricing_policy()?,
        transition_policy: config.transition_policy,
        chat_phone: config.chat_phone.clone(),
    };
    let ports = adapters::from_config(&config)?;
    let state = Arc::new(AppState::new(ports, settings));
    spawn_session_sweeper(
        state.clone(),
        config.session_sweep_period(),
        config.session_idle_timeout(),
    );

    // Build application router with all routes and middleware
    let app = create_app_router(state);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
