use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use routecast::bot::ConversationController;
use routecast::bot::session::SessionStore;
use routecast::bot::telegram::{TelegramTransport, run_polling};
use routecast::config::RoutecastConfig;
use routecast::provider::ProviderClient;
use routecast::service::{ForecastProvider, WeatherService};
use routecast::web;

#[tokio::main]
async fn main() -> Result<()> {
    let config = RoutecastConfig::load().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone())),
        )
        .init();

    let client = ProviderClient::new(config.provider.clone())
        .context("Failed to create provider client")?;
    let service: Arc<dyn ForecastProvider> = Arc::new(WeatherService::new(client));

    let transport = Arc::new(
        TelegramTransport::new(&config.bot).context("Failed to create Telegram transport")?,
    );
    let controller = Arc::new(ConversationController::new(
        Arc::clone(&service),
        transport.clone(),
        SessionStore::new(),
    ));

    tokio::select! {
        result = web::run(config.web.port, Arc::clone(&service)) => {
            result.context("Dashboard server exited")
        }
        result = run_polling(controller, transport) => {
            result.context("Bot update loop exited")
        }
    }
}
