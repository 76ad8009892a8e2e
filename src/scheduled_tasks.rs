use std::str::FromStr;

use chrono::NaiveDate;
use tokio::sync::mpsc::UnboundedSender;

use crate::constants::{MENU_KEY, REMIND_KEY};
use crate::data_backend::today;
use crate::data_types::menu_types::Menu;
use crate::data_types::{BotConfig, Outgoing};
use crate::db_operations::DataStore;
use crate::errors::CronError;
use crate::mark::MarkClient;
use crate::order::Order;
use crate::reminder::{due_users, ReminderTable};
use crate::user_choice::mark_codes;

/// What a cron entry runs.
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduledTask {
    /// `post <chat_id> [-o] [-m] <message>`
    Post {
        chat_id: i64,
        only_valid_order: bool,
        only_valid_menu: bool,
        message: String,
    },
    Reminder,
    Mark,
}

impl FromStr for ScheduledTask {
    type Err = CronError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();

        match words.next().map(str::to_lowercase).as_deref() {
            Some("reminder") => Ok(ScheduledTask::Reminder),
            Some("mark") => Ok(ScheduledTask::Mark),
            Some("post") => {
                let chat_id = words
                    .next()
                    .ok_or_else(|| CronError::InvalidTask("post senza chat".to_string()))?;
                let chat_id = chat_id
                    .parse()
                    .map_err(|_| CronError::InvalidTask(format!("chat '{}' non valida", chat_id)))?;

                let mut only_valid_order = false;
                let mut only_valid_menu = false;
                let mut message = Vec::new();

                for word in words {
                    match word.strip_prefix('-') {
                        Some(opts) if message.is_empty() && !opts.is_empty() => {
                            only_valid_order |= opts.contains('o');
                            only_valid_menu |= opts.contains('m');
                        }
                        _ => message.push(word),
                    }
                }

                if message.is_empty() {
                    return Err(CronError::InvalidTask("post senza messaggio".to_string()));
                }

                Ok(ScheduledTask::Post {
                    chat_id,
                    only_valid_order,
                    only_valid_menu,
                    message: message.join(" "),
                })
            }
            Some(other) => Err(CronError::InvalidTask(format!("'{}' sconosciuta", other))),
            None => Err(CronError::InvalidTask("attività vuota".to_string())),
        }
    }
}

/// Fills in `$MENU`, `$ORDER`, `$ORDER_NONAMES` and `\n`.
pub fn render_post(message: &str, menu: Option<&Menu>, order: &Order) -> String {
    let menu = menu.map(Menu::to_string).unwrap_or_default();

    message
        .replace("$MENU", &menu)
        .replace("$ORDER_NONAMES", &order.format(false, false))
        .replace("$ORDER", &order.format(true, false))
        .replace("\\n", "\n")
}

pub fn post_message<B: DataStore>(
    brain: &B,
    chat_id: i64,
    only_valid_order: bool,
    only_valid_menu: bool,
    message: &str,
) -> Option<Outgoing> {
    let menu: Option<Menu> = brain.get(MENU_KEY).ok();
    // stale orders are posted too, unless -o says otherwise
    let order: Option<Order> = Order::load(brain).ok();

    if only_valid_menu && !menu.as_ref().is_some_and(Menu::is_updated) {
        log::info!(target: "pranzo_telegram_rs::TaskSched", "No menu for today, not posting");
        return None;
    }
    if only_valid_order && !order.as_ref().is_some_and(Order::is_updated) {
        log::info!(target: "pranzo_telegram_rs::TaskSched", "No order for today, not posting");
        return None;
    }

    let order = order.unwrap_or_default();

    Some(Outgoing::new(chat_id, render_post(message, menu.as_ref(), &order)))
}

/// Private menu messages for users who asked for a reminder today and haven't ordered.
pub fn reminder_messages<B: DataStore>(brain: &B, today: NaiveDate) -> Vec<Outgoing> {
    let menu: Menu = match brain.get(MENU_KEY) {
        Ok(menu) => menu,
        Err(_) => return Vec::new(),
    };
    if menu.date != Some(today) {
        log::info!(target: "pranzo_telegram_rs::TaskSched", "Menu is not today's, no reminders");
        return Vec::new();
    }

    let order = Order::get_current(brain);
    let table: ReminderTable = brain.get_or_default(REMIND_KEY);

    due_users(&table, &today)
        .into_iter()
        .filter(|id| !order.users().any(|u| &u.id == id))
        .filter_map(|id| id.parse::<i64>().ok())
        .map(|chat_id| {
            Outgoing::new(
                chat_id,
                format!("Ciao! Non hai ancora ordinato, ecco il menù di oggi:\n{}", menu),
            )
        })
        .collect()
}

/// Marks every ordering user on the lunch sheet, reporting to each one privately.
pub async fn mark_order<B: DataStore>(brain: &B, client: &MarkClient) -> Vec<Outgoing> {
    let order = Order::get_current(brain);
    let mut out = Vec::new();

    for user in order.users() {
        let Some(chat_id) = user.chat_id() else {
            continue;
        };
        let code = mark_codes(order.choices_of(user).unwrap_or_default());

        let text = match client.mark(user, &code).await {
            Ok(()) => format!("Ok, segnato '{}' per {} sul foglio dei pranzi", code, user),
            Err(e) => {
                log::error!("Marking {} failed: {}", user, e);
                format!("Non sono riuscito a segnare il pranzo ('{}'): {}", code, e)
            }
        };
        out.push(Outgoing::new(chat_id, text));
    }

    out
}

pub async fn run_task<B: DataStore>(
    task: &ScheduledTask,
    brain: &B,
    config: &BotConfig,
    outbox: &UnboundedSender<Outgoing>,
) {
    let messages = match task {
        ScheduledTask::Post {
            chat_id,
            only_valid_order,
            only_valid_menu,
            message,
        } => post_message(brain, *chat_id, *only_valid_order, *only_valid_menu, message)
            .into_iter()
            .collect(),
        ScheduledTask::Reminder => reminder_messages(brain, today()),
        ScheduledTask::Mark => match MarkClient::from_config(config) {
            Ok(client) => mark_order(brain, &client).await,
            Err(e) => {
                log::error!(target: "pranzo_telegram_rs::TaskSched", "Can't mark: {}", e);
                Vec::new()
            }
        },
    };

    for msg in messages {
        if outbox.send(msg).is_err() {
            log::error!("Outbox closed, dropping scheduled message");
        }
    }
}
