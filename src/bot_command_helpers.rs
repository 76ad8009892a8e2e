use crate::data_types::User;

/// Removes the bot mention and a leading '/' from a chat message.
///
/// `"/ordine@pranzo_bot"` and `"@pranzo_bot ordine"` both become `"ordine"`.
pub fn strip_command_prefix(text: &str, bot_name: &str) -> String {
    let text = text.trim();
    let stripped = if bot_name.is_empty() {
        text.to_string()
    } else {
        text.replace(&format!("@{}", bot_name), "")
    };

    stripped.trim().trim_start_matches('/').trim().to_string()
}

/// Private chats always talk to the bot, groups only with a leading `/` or `@botname`.
pub fn is_addressed_to_bot(text: &str, bot_name: &str, private_chat: bool) -> bool {
    let text = text.trim_start();
    private_chat
        || text.starts_with('/')
        || (!bot_name.is_empty() && text.starts_with(&format!("@{}", bot_name)))
}

/// The bot's user for a telegram sender: username when there is one, else the first name.
pub fn user_from_telegram(from: &teloxide::types::User) -> User {
    let name = from
        .username
        .clone()
        .unwrap_or_else(|| from.first_name.clone());
    User::new(name, from.id.0.to_string())
}
