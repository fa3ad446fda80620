//! Telegram message handler.
//!
//! Converts a teloxide `Message` into a core `IncomingUpdate` and hands it to
//! the `BotService`. Non-text messages are ignored.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};
use tracing::{debug, error, warn};

use dib_core::{
    domain::{ChatId, UserId},
    messaging::types::{parse_command, Command, IncomingUpdate, TextMessage},
};

use crate::router::AppState;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        debug!(chat_id = msg.chat.id.0, "ignoring non-text message");
        return Ok(());
    };

    let user = msg.from();
    let update = incoming_update(
        msg.chat.id.0,
        user.map(|u| u.id.0),
        user.map(|u| u.first_name.clone()),
        text,
    );

    let chat_id = update.chat_id();
    match state.service.handle(update).await {
        Ok(()) => {}
        Err(e) if e.is_user_error() => warn!(chat_id = chat_id.0, "rejected update: {e}"),
        Err(e) => error!(chat_id = chat_id.0, "failed to handle update: {e}"),
    }
    Ok(())
}

fn incoming_update(
    chat_id: i64,
    user_id: Option<u64>,
    first_name: Option<String>,
    text: &str,
) -> IncomingUpdate {
    let chat_id = ChatId(chat_id);
    let user_id = user_id.map(|id| UserId(id as i64));

    match parse_command(text) {
        Some((name, args)) => IncomingUpdate::Command(Command {
            chat_id,
            user_id,
            first_name,
            name,
            args,
        }),
        None => IncomingUpdate::Text(TextMessage {
            chat_id,
            user_id,
            first_name,
            text: text.to_string(),
        }),
    }
}
