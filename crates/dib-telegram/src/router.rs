use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*, types::BotCommand};
use tracing::{info, warn};

use dib_core::{
    config::Config,
    market::MarketDataPort,
    messaging::{port::MessagingPort, types::BotCommandSpec},
    service::{bot_commands, BotService},
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<BotService>,
}

pub async fn run_polling(
    cfg: Arc<Config>,
    market: Arc<dyn MarketDataPort>,
) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    match bot.get_me().await {
        Ok(me) => info!("bot started: @{}", me.username()),
        Err(e) => warn!("get_me failed: {e}"),
    }

    if let Err(e) = bot.set_my_commands(telegram_commands(bot_commands())).await {
        warn!("failed to register bot commands: {e}");
    }

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let service = Arc::new(BotService::new(cfg, messenger, market));
    let state = Arc::new(AppState { service });

    let handler =
        dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("dispatcher stopped");
    Ok(())
}

fn telegram_commands(specs: &[BotCommandSpec]) -> Vec<BotCommand> {
    specs
        .iter()
        .map(|c| BotCommand::new(c.name, c.description))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_all_core_commands() {
        let cmds = telegram_commands(bot_commands());
        let names: Vec<&str> = cmds.iter().map(|c| c.command.as_str()).collect();
        assert_eq!(names, vec!["start", "help", "calculate", "cancel"]);
        assert!(cmds.iter().all(|c| !c.description.is_empty()));
    }
}
