use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::data_types::menu_types::{Category, CategoryMask, MenuRow};
use crate::errors::CombinationError;

/// One dish as ordered by a user: a single menu row, or a main course
/// customized with one or more sides.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct UserChoice {
    mask: CategoryMask,
    dishes: Vec<MenuRow>,
}

impl UserChoice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mask(&self) -> CategoryMask {
        self.mask
    }

    pub fn dishes(&self) -> &[MenuRow] {
        &self.dishes
    }

    pub fn is_empty(&self) -> bool {
        self.dishes.is_empty()
    }

    /// Adds `dish`, rejecting it if something already chosen can't go with it.
    pub fn add(&mut self, dish: MenuRow) -> Result<(), CombinationError> {
        if !self.mask.without(dish.category.allowed_companions()).is_empty() {
            return Err(CombinationError {
                rejected: dish.content,
            });
        }

        self.mask.insert(dish.category);
        self.dishes.push(dish);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.mask = CategoryMask::EMPTY;
        self.dishes.clear();
    }

    pub fn customized(&self) -> bool {
        self.dishes.len() > 1
    }

    pub fn price(&self) -> Decimal {
        self.dishes.iter().map(|d| d.price).sum()
    }

    /// Sort key: the mask first, so dishes group by category, then the name.
    pub fn ord_string(&self) -> String {
        format!("{:04}-{}", self.mask.bits(), self)
    }

    pub fn mark_code(&self) -> Option<MarkCode> {
        let mask = self.mask;

        if mask.contains(Category::FirstCourse) || mask.contains(Category::Sandwich) {
            Some(MarkCode::First)
        } else if mask.contains(Category::MainCourse) || mask.contains(Category::Vegetarian) {
            Some(MarkCode::Second)
        } else if mask.contains(Category::SideDish) {
            Some(MarkCode::First)
        } else if mask.contains(Category::Fruit) || mask.contains(Category::Dessert) {
            Some(MarkCode::Dessert)
        } else if !mask.is_empty() {
            // free text, count it as a main
            Some(MarkCode::Second)
        } else {
            None
        }
    }
}

impl fmt::Display for UserChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sorted: Vec<&MenuRow> = self.dishes.iter().collect();
        sorted.sort_by(|a, b| (a.category, &a.content).cmp(&(b.category, &b.content)));

        let (main, side): (Vec<&MenuRow>, Vec<&MenuRow>) = sorted
            .into_iter()
            .partition(|d| d.category == Category::MainCourse);

        let main = main.iter().map(|d| d.content.as_str()).collect::<Vec<_>>().join(", ");
        let side = side.iter().map(|d| d.content.as_str()).collect::<Vec<_>>().join(", ");

        match (main.is_empty(), side.is_empty()) {
            (false, false) => write!(f, "{} con {}", main, side),
            (false, true) => f.write_str(&main),
            _ => f.write_str(&side),
        }
    }
}

/// Course codes understood by the lunch sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MarkCode {
    First,
    Second,
    Dessert,
}

impl MarkCode {
    pub fn letter(self) -> char {
        match self {
            MarkCode::First => 'P',
            MarkCode::Second => 'S',
            MarkCode::Dessert => 'D',
        }
    }
}

pub const NOTHING_MARK: &str = "Niente";

/// Aggregated sheet code for all the choices of one user, e.g. "PS".
pub fn mark_codes(choices: &[UserChoice]) -> String {
    let mut codes: Vec<MarkCode> = choices.iter().filter_map(UserChoice::mark_code).collect();
    codes.sort();

    if codes.is_empty() {
        return NOTHING_MARK.to_string();
    }
    codes.into_iter().map(MarkCode::letter).collect()
}
