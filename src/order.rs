use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::ORDER_KEY;
use crate::data_backend::{reference_date, today, REFERENCE_TZ};
use crate::data_types::User;
use crate::db_operations::DataStore;
use crate::errors::BrainError;
use crate::user_choice::UserChoice;

/// The lunch order of the day.
///
/// Every user listed under a dish in `dish_users` has a choice rendering to
/// that dish in `user_choices`, and the other way round. Both maps are only
/// touched through `set` and `clear_user`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Order {
    timestamp: DateTime<Utc>,
    dish_users: BTreeMap<String, Vec<User>>,
    user_choices: BTreeMap<User, Vec<UserChoice>>,
}

impl Default for Order {
    fn default() -> Self {
        Self::new()
    }
}

impl Order {
    pub fn new() -> Self {
        Order {
            timestamp: Utc::now(),
            dish_users: BTreeMap::new(),
            user_choices: BTreeMap::new(),
        }
    }

    /// When the order was started, in the reference zone.
    pub fn timestamp(&self) -> DateTime<Tz> {
        self.timestamp.with_timezone(&REFERENCE_TZ)
    }

    pub fn is_empty(&self) -> bool {
        self.user_choices.is_empty()
    }

    /// Replaces the choices of `user`, returns the ordered dishes.
    pub fn set(&mut self, user: &User, choices: Vec<UserChoice>) -> Vec<String> {
        self.clear_user(user);

        let mut list = Vec::with_capacity(choices.len());
        for choice in choices {
            let dish = choice.to_string();
            self.dish_users.entry(dish.clone()).or_default().push(user.clone());
            self.user_choices.entry(user.clone()).or_default().push(choice);
            list.push(dish);
        }

        debug_assert!(self.is_consistent());
        list
    }

    /// Removes every dish of `user`, returns what was removed one per line.
    pub fn clear_user(&mut self, user: &User) -> String {
        let mut deleted = Vec::new();

        for dish in self.sorted() {
            let Some(users) = self.dish_users.get_mut(&dish) else {
                continue;
            };

            let before = users.len();
            users.retain(|u| u != user);
            deleted.extend(std::iter::repeat(dish.clone()).take(before - users.len()));

            if users.is_empty() {
                self.dish_users.remove(&dish);
            }
        }

        self.user_choices.remove(user);

        debug_assert!(self.is_consistent());
        deleted.join("\n")
    }

    /// Distinct dishes, grouped by category and then by name.
    pub fn sorted(&self) -> Vec<String> {
        let dishes: BTreeMap<String, String> = self
            .user_choices
            .values()
            .flatten()
            .map(|c| (c.ord_string(), c.to_string()))
            .collect();

        dishes.into_values().collect()
    }

    pub fn format(&self, with_user_names: bool, with_prices: bool) -> String {
        let mut lines = Vec::new();
        let mut no_price = Vec::new();
        let mut total = Decimal::ZERO;

        for dish in self.sorted() {
            let users = self.dish_users.get(&dish).map(Vec::as_slice).unwrap_or_default();
            let mut line = format!("{} {}", users.len(), dish);

            if with_user_names {
                let names: Vec<&str> = users.iter().map(|u| u.name.as_str()).collect();
                line += &format!(" [{}]", names.join(", "));
            }

            if with_prices {
                let row = self
                    .unit_price(&dish)
                    .map(|price| price * Decimal::from(users.len()))
                    .filter(|row| !row.is_zero());

                match row {
                    Some(row) => {
                        total += row;
                        line += &format!(" -> €{}", row);
                    }
                    None => {
                        line += " -> prezzo non disponibile!";
                        no_price.push(dish.clone());
                    }
                }
            }

            lines.push(line);
        }

        if with_prices {
            lines.push(format!("Prezzo TOTALE: €{}", total));
            if !no_price.is_empty() {
                lines.push("I seguenti piatti non hanno un prezzo indicato:".to_string());
                lines.extend(no_price);
            }
        }

        lines.join("\n")
    }

    pub fn bill(&self) -> String {
        self.format(true, true)
    }

    // price of one portion, taken from the first user who ordered the dish
    fn unit_price(&self, dish: &str) -> Option<Decimal> {
        let user = self.dish_users.get(dish)?.first()?;
        self.user_choices
            .get(user)?
            .iter()
            .find(|c| c.to_string() == dish)
            .map(UserChoice::price)
    }

    /// True if the order was started today.
    pub fn is_updated(&self) -> bool {
        reference_date(self.timestamp) == today()
    }

    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.user_choices.keys()
    }

    pub fn choices_of(&self, user: &User) -> Option<&[UserChoice]> {
        self.user_choices.get(user).map(Vec::as_slice)
    }

    /// Looks up an ordering user by name, ignoring case.
    pub fn find_user_by_name(&self, name: &str) -> Option<&User> {
        self.user_choices
            .keys()
            .find(|u| u.name.eq_ignore_ascii_case(name))
    }

    /// Checks that both maps describe the same order.
    pub fn is_consistent(&self) -> bool {
        let mut expected: BTreeMap<&str, Vec<&User>> = BTreeMap::new();
        let mut rendered: Vec<(User, String)> = Vec::new();

        for (user, choices) in &self.user_choices {
            for choice in choices {
                rendered.push((user.clone(), choice.to_string()));
            }
        }
        for (user, dish) in &rendered {
            expected.entry(dish.as_str()).or_default().push(user);
        }

        let mut actual: BTreeMap<&str, Vec<&User>> = self
            .dish_users
            .iter()
            .map(|(dish, users)| (dish.as_str(), users.iter().collect()))
            .collect();

        for users in expected.values_mut().chain(actual.values_mut()) {
            users.sort();
        }

        expected == actual
    }

    pub fn load<B: DataStore>(brain: &B) -> Result<Order, BrainError> {
        brain.get(ORDER_KEY)
    }

    pub fn save<B: DataStore>(&self, brain: &B) -> Result<(), BrainError> {
        brain.set(ORDER_KEY, self)
    }

    /// Today's order, or a fresh one if the stored order is missing or stale.
    pub fn get_current<B: DataStore>(brain: &B) -> Order {
        match Order::load(brain) {
            Ok(order) if order.is_updated() => order,
            Ok(_) => {
                log::info!("Discarding old order");
                Order::new()
            }
            Err(e) => {
                if !e.is_not_found() {
                    log::error!("Loading order failed: {}", e);
                }
                Order::new()
            }
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(true, false))
    }
}
