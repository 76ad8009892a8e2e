use std::sync::Arc;
use std::time::Instant;

use teloxide::prelude::*;
use teloxide::types::Me;

use crate::bot_command_helpers::{is_addressed_to_bot, strip_command_prefix, user_from_telegram};
use crate::data_types::HandlerResult;
use crate::db_operations::SqliteBrain;
use crate::lunch_bot::LunchBot;

/// Text messages meant for the bot go through the lunch bot, replies are sent right away.
pub async fn message_handler(
    bot: Bot,
    msg: Message,
    me: Me,
    lunch_bot: Arc<LunchBot<SqliteBrain>>,
) -> HandlerResult {
    let (Some(text), Some(from)) = (msg.text(), msg.from()) else {
        return Ok(());
    };
    if !is_addressed_to_bot(text, me.username(), msg.chat.is_private()) {
        return Ok(());
    }

    let now = Instant::now();
    let sender = user_from_telegram(from);
    let text = strip_command_prefix(text, me.username());

    let replies = lunch_bot.handle_message(msg.chat.id.0, &sender, &text);
    log::debug!("Handled message from {}: {:.2?}", sender, now.elapsed());

    for reply in replies {
        bot.send_message(ChatId(reply.chat_id), reply.text).await?;
    }
    Ok(())
}
