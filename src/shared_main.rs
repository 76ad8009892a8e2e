use std::env;

use teloxide::prelude::*;
use tokio::sync::mpsc;

use crate::data_types::Outgoing;

/// Info for everything, debug for the bot itself when `RUST_LOG=debug`.
pub fn logger_init(module_path: &str) {
    let own_level =
        if env::var(pretty_env_logger::env_logger::DEFAULT_FILTER_ENV).unwrap_or_default() == "debug" {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        };

    pretty_env_logger::formatted_timed_builder()
        .filter_level(log::LevelFilter::Info)
        .filter_module(module_path, own_level)
        .filter_module("pranzo_telegram_rs", own_level)
        .init();
}

/// Delivers messages produced outside of a chat update (scheduled jobs, marking).
pub async fn run_outbox(bot: Bot, mut outbox_rx: mpsc::UnboundedReceiver<Outgoing>) {
    while let Some(msg) = outbox_rx.recv().await {
        if let Err(e) = bot.send_message(ChatId(msg.chat_id), msg.text).await {
            log::error!("Sending to {} failed: {}", msg.chat_id, e);
        }
    }
    log::warn!("Outbox closed");
}
