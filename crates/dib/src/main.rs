use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use dib_core::{config::Config, market::MarketDataPort};
use dib_yahoo::YahooFinanceClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Arc::new(Config::load().context("failed to load configuration")?);
    dib_core::logging::init("dib", cfg.debug)?;

    let market: Arc<dyn MarketDataPort> = Arc::new(YahooFinanceClient::from_config(&cfg)?);
    info!(
        market_api = %cfg.market_api_base,
        timeframe = %cfg.ta_timeframe,
        simulations = cfg.monte_carlo_simulations,
        "starting dual investment bot"
    );

    dib_telegram::router::run_polling(cfg, market)
        .await
        .context("telegram bot failed")?;

    Ok(())
}
