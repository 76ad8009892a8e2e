use std::fmt;
use std::ops::BitOr;

use chrono::NaiveDate;
use regex_lite::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::data_backend::today;

/// Menu sections, in the order they appear on the sheet.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    #[default]
    Unknown,
    Empty,
    FirstCourse,
    MainCourse,
    SideDish,
    Vegetarian,
    Fruit,
    Dessert,
    Sandwich,
}

impl Category {
    pub const SECTIONS: [Category; 7] = [
        Category::FirstCourse,
        Category::MainCourse,
        Category::SideDish,
        Category::Vegetarian,
        Category::Fruit,
        Category::Dessert,
        Category::Sandwich,
    ];

    /// Section title as printed on the menu.
    pub fn title(self) -> &'static str {
        match self {
            Category::Unknown => "sconosciuto",
            Category::Empty => "testo libero",
            Category::FirstCourse => "primi piatti",
            Category::MainCourse => "secondi piatti",
            Category::SideDish => "contorni",
            Category::Vegetarian => "piatti vegetariani",
            Category::Fruit => "frutta",
            Category::Dessert => "dessert",
            Category::Sandwich => "panini espressi",
        }
    }

    /// Alternative spellings of a section title found on real menus.
    pub fn title_aliases(self) -> &'static [&'static str] {
        match self {
            Category::Dessert => &["dolci"],
            Category::Sandwich => &["i nostri panini espressi"],
            _ => &[],
        }
    }

    /// Categories a dish of this category may be combined with.
    pub fn allowed_companions(self) -> CategoryMask {
        match self {
            Category::Unknown
            | Category::Empty
            | Category::FirstCourse
            | Category::Fruit
            | Category::Dessert
            | Category::Sandwich => CategoryMask::EMPTY,
            Category::MainCourse => Category::SideDish | Category::Vegetarian,
            Category::SideDish | Category::Vegetarian => {
                Category::MainCourse | Category::SideDish | Category::Vegetarian
            }
        }
    }

    fn bit(self) -> u16 {
        1 << self as u16
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Set of categories, one bit per `Category` discriminant.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct CategoryMask(u16);

impl CategoryMask {
    pub const EMPTY: CategoryMask = CategoryMask(0);

    pub fn bits(self) -> u16 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, category: Category) -> bool {
        self.0 & category.bit() != 0
    }

    pub fn insert(&mut self, category: Category) {
        self.0 |= category.bit();
    }

    /// Categories in `self` that are not in `other`.
    pub fn without(self, other: CategoryMask) -> CategoryMask {
        CategoryMask(self.0 & !other.0)
    }
}

impl BitOr for CategoryMask {
    type Output = CategoryMask;

    fn bitor(self, rhs: CategoryMask) -> CategoryMask {
        CategoryMask(self.0 | rhs.0)
    }
}

impl BitOr<Category> for CategoryMask {
    type Output = CategoryMask;

    fn bitor(self, rhs: Category) -> CategoryMask {
        CategoryMask(self.0 | rhs.bit())
    }
}

impl BitOr for Category {
    type Output = CategoryMask;

    fn bitor(self, rhs: Category) -> CategoryMask {
        CategoryMask(self.bit() | rhs.bit())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct MenuRow {
    pub content: String,
    pub category: Category,
    pub is_daily_proposal: bool,
    #[serde(default)]
    pub price: Decimal,
}

impl MenuRow {
    pub fn new(content: impl Into<String>, category: Category) -> Self {
        MenuRow {
            content: content.into(),
            category,
            is_daily_proposal: false,
            price: Decimal::ZERO,
        }
    }

    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = price;
        self
    }

    /// Free text entered by a user, kept verbatim in the order.
    pub fn literal(content: impl Into<String>) -> Self {
        MenuRow::new(content, Category::Empty)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Menu {
    rows: Vec<MenuRow>,
    pub date: Option<NaiveDate>,
}

impl Menu {
    pub fn new(date: Option<NaiveDate>) -> Self {
        Menu {
            rows: Vec::new(),
            date,
        }
    }

    pub fn rows(&self) -> &[MenuRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends a row; an older row with the same content is dropped first.
    pub fn add_row(&mut self, row: MenuRow) {
        self.rows.retain(|r| r.content != row.content);
        self.rows.push(row);
    }

    /// True if the menu is the one for today.
    pub fn is_updated(&self) -> bool {
        self.date == Some(today())
    }

    /// Looks up the rows matching a user query.
    ///
    /// A case-insensitive exact match wins on its own. Otherwise every row
    /// matching the query with its spaces turned into wildcards is returned.
    pub fn find_dishes(&self, query: &str) -> Vec<&MenuRow> {
        let query = query.trim().to_lowercase();

        if let Some(exact) = self.rows.iter().find(|r| r.content.to_lowercase() == query) {
            return vec![exact];
        }

        let pattern = regex_lite::escape(&query).replace(' ', ".*");
        let Ok(re) = Regex::new(&pattern) else {
            log::warn!("Invalid dish pattern '{}'", pattern);
            return Vec::new();
        };

        self.rows
            .iter()
            .filter(|r| re.is_match(&r.content.to_lowercase()))
            .collect()
    }
}

impl fmt::Display for Menu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines = Vec::new();
        let mut current = Category::Unknown;

        for row in &self.rows {
            if row.category != current {
                current = row.category;
                lines.push(current.title().to_uppercase());
            }

            let mut line = format!(" • {}", row.content);
            if row.is_daily_proposal {
                line += " (proposta del giorno)";
            }
            if !row.price.is_zero() {
                line += &format!(" €{}", row.price);
            }
            lines.push(line);
        }

        f.write_str(&lines.join("\n"))
    }
}
