pub mod menu_types;

use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use tokio::sync::{broadcast, mpsc};

pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

pub type SchedulerTaskType = (
    broadcast::Sender<SchedulerTask>,
    broadcast::Receiver<SchedulerTask>,
);

pub type OutboxType = (
    mpsc::UnboundedSender<Outgoing>,
    mpsc::UnboundedReceiver<Outgoing>,
);

const USER_KEY_SEPARATOR: &str = "&&&&";

/// Somebody who can own an order. Guests have an empty id.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct User {
    pub name: String,
    pub id: String,
}

impl User {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        User {
            name: name.into(),
            id: id.into(),
        }
    }

    pub fn guest(name: impl Into<String>) -> Self {
        User::new(name, "")
    }

    pub fn is_guest(&self) -> bool {
        self.id.is_empty()
    }

    /// Private chat with this user, if there is one.
    pub fn chat_id(&self) -> Option<i64> {
        self.id.parse().ok()
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

// users are map keys inside the stored order, so they travel as a single string
impl Serialize for User {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&format_args!("{}{}{}", self.name, USER_KEY_SEPARATOR, self.id))
    }
}

impl<'de> Deserialize<'de> for User {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.rsplit_once(USER_KEY_SEPARATOR)
            .map(|(name, id)| User::new(name, id))
            .ok_or_else(|| de::Error::custom(format!("invalid User field: {}", raw)))
    }
}

/// A chat message waiting to be delivered.
#[derive(Debug, Clone, PartialEq)]
pub struct Outgoing {
    pub chat_id: i64,
    pub text: String,
}

impl Outgoing {
    pub fn new(chat_id: i64, text: impl Into<String>) -> Self {
        Outgoing {
            chat_id,
            text: text.into(),
        }
    }
}

// used internally between the command handlers and the task scheduler
#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerTask {
    ReloadCron,
}

#[derive(Debug, Clone, Default)]
pub struct BotConfig {
    /// Endpoint used to mark lunches, with `<USER>` and `<FOOD>` placeholders.
    pub mark_url: Option<String>,
    pub email_recipients: Vec<String>,
}
