use std::collections::BTreeMap;

use chrono::{Datelike, Weekday};

/// Reminder masks by user id; bit 0 is sunday.
pub type ReminderTable = BTreeMap<String, u8>;

pub const ALL_DAYS: u8 = 0x7f;

const WEEK_NAMES: [&str; 7] = [
    "domenica",
    "lunedì",
    "martedì",
    "mercoledì",
    "giovedì",
    "venerdì",
    "sabato",
];

fn keyword_mask(keyword: &str) -> Option<u8> {
    let mask = match keyword {
        "off" | "dis" | "fal" | "0" => 0,
        "on" | "ena" | "tru" | "1" | "sem" | "tut" | "all" => ALL_DAYS,
        "dom" => 1 << 0,
        "lun" => 1 << 1,
        "mar" => 1 << 2,
        "mer" => 1 << 3,
        "gio" => 1 << 4,
        "ven" => 1 << 5,
        "sab" => 1 << 6,
        _ => return None,
    };
    Some(mask)
}

/// Parses a comma separated list of days or switches ("on", "lun, mar").
///
/// Only the first three letters of each item count. Returns `None` when no
/// item is understood.
pub fn parse_reminder(arg: &str) -> Option<u8> {
    let arg = arg.to_lowercase();
    let mut found = false;
    let mut mask = 0;

    for item in arg.split(',') {
        let key: String = item.trim().chars().take(3).collect();
        if let Some(m) = keyword_mask(&key) {
            mask |= m;
            found = true;
        }
    }

    found.then_some(mask)
}

pub fn format_reminder(mask: u8) -> String {
    if mask == 0 {
        return "Reminder disattivato".to_string();
    }

    if mask & ALL_DAYS == ALL_DAYS {
        return "Reminder attivo tutti i giorni".to_string();
    }

    let days: Vec<&str> = (0..7)
        .filter(|i| mask & (1 << i) != 0)
        .map(|i| WEEK_NAMES[i])
        .collect();

    format!("Reminder attivo {}", days.join(", "))
}

pub fn reminds_on(mask: u8, weekday: Weekday) -> bool {
    mask & (1 << weekday.num_days_from_sunday()) != 0
}

/// Stores the mask for `user_id`; a zero mask removes the entry.
pub fn update_table(table: &mut ReminderTable, user_id: &str, mask: u8) {
    if mask == 0 {
        table.remove(user_id);
    } else {
        table.insert(user_id.to_string(), mask);
    }
}

/// Users to be reminded on the weekday of `date`.
pub fn due_users<D: Datelike>(table: &ReminderTable, date: &D) -> Vec<String> {
    table
        .iter()
        .filter(|(_, mask)| reminds_on(**mask, date.weekday()))
        .map(|(id, _)| id.clone())
        .collect()
}
