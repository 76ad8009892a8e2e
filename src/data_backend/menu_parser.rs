use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::Datelike;
use rust_decimal::Decimal;

use crate::data_backend::date_parser::parse_menu_date;
use crate::data_backend::{standardize_spaces, today};
use crate::data_types::menu_types::{Category, Menu, MenuRow};
use crate::errors::MenuParseError;

// attempt at having a sensible number of rows required in menu
pub const MIN_MENU_ROWS: usize = 12;

const DAILY_PROPOSAL_PREFIX: &str = "Proposta del giorno: ";
const ALWAYS_AVAILABLE_SUFFIX: &str = "(sono sempre disponibili)";
const ALWAYS_AVAILABLE_DISHES: [&str; 3] = ["Pasta al ragù", "Pasta al pesto", "Pasta al pomodoro"];

// titles at least this long tolerate a typo
const FUZZY_TITLE_MIN_LEN: usize = 8;

/// Parses a menu pasted as text, one row per line.
pub fn parse_menu_text(text: &str) -> Result<Menu, MenuParseError> {
    let rows: Vec<&str> = text.trim().lines().collect();
    if rows.len() < MIN_MENU_ROWS {
        return Err(MenuParseError::NotEnoughRows(rows.len()));
    }

    parse_menu_rows(&rows)
}

pub fn parse_menu_rows<S: AsRef<str>>(rows: &[S]) -> Result<Menu, MenuParseError> {
    parse_menu_rows_for_year(rows, today().year())
}

/// Parses menu rows; `year` completes the date found in the heading.
pub fn parse_menu_rows_for_year<S: AsRef<str>>(
    rows: &[S],
    year: i32,
) -> Result<Menu, MenuParseError> {
    let cells: Vec<(String, Decimal)> = rows
        .iter()
        .map(|raw| {
            let (text, price) = split_price_cell(raw.as_ref());
            (standardize_spaces(&text), price)
        })
        .collect();

    let contents: Vec<&str> = cells.iter().map(|(content, _)| content.as_str()).collect();
    let titles = find_titles(&contents)?;

    let mut menu = Menu::new(None);
    let mut current = Category::Unknown;
    let mut date_checked = false;

    for (index, (content, price)) in cells.iter().enumerate() {
        if let Some(&category) = titles.get(&index) {
            current = category;
            continue;
        }

        // rows before the first section: only the heading with the date matters
        if current == Category::Unknown {
            if !date_checked && !content.is_empty() {
                date_checked = true;
                menu.date = parse_menu_date(content, year);
            }
            continue;
        }

        if content.is_empty() {
            if current == Category::Sandwich {
                break;
            }
            continue;
        }

        // "Pasta al ragù, pesto o pomodoro (sono sempre disponibili)"
        if content.ends_with(ALWAYS_AVAILABLE_SUFFIX) {
            for dish in ALWAYS_AVAILABLE_DISHES {
                menu.add_row(MenuRow::new(dish, current));
            }
            continue;
        }

        let (content, is_daily_proposal) = match content.strip_prefix(DAILY_PROPOSAL_PREFIX) {
            Some(stripped) => (stripped, true),
            None => (content.as_str(), false),
        };

        menu.add_row(MenuRow {
            content: content.trim().to_string(),
            category: current,
            is_daily_proposal,
            price: *price,
        });
    }

    log::debug!("Parsed menu: {} rows, date {:?}", menu.rows().len(), menu.date);
    Ok(menu)
}

/// How closely a row resembles a section title, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TitleMatch {
    /// The title words appear in the row ("PRIMI PIATTI DEL GIORNO").
    Partial,
    /// One typo away from the title.
    Fuzzy,
    /// Same letters as the title, ignoring case, spaces and punctuation.
    Exact,
}

/// Compares a row with the titles of `category`.
///
/// Multi-word titles may appear anywhere in the row, single-word titles
/// only as its first word.
pub fn title_match(content: &str, category: Category) -> Option<TitleMatch> {
    let letters = letters_only(content);
    if letters.is_empty() {
        return None;
    }
    let row_words = words(content);

    std::iter::once(category.title())
        .chain(category.title_aliases().iter().copied())
        .filter_map(|title| {
            let title_letters = letters_only(title);
            let title_words = words(title);

            if letters == title_letters {
                Some(TitleMatch::Exact)
            } else if title_letters.chars().count() >= FUZZY_TITLE_MIN_LEN
                && strsim::levenshtein(&letters, &title_letters) <= 1
            {
                Some(TitleMatch::Fuzzy)
            } else if title_words.len() > 1 {
                row_words
                    .windows(title_words.len())
                    .any(|w| w == title_words.as_slice())
                    .then_some(TitleMatch::Partial)
            } else {
                (row_words.first() == title_words.first()).then_some(TitleMatch::Partial)
            }
        })
        .max()
}

/// Picks the heading row of every section found, keyed by row index.
///
/// Each section gets one heading: its closest match, the earliest on ties.
/// Other rows matching a title are dishes.
fn find_titles(contents: &[&str]) -> Result<BTreeMap<usize, Category>, MenuParseError> {
    let mut titles = BTreeMap::new();

    for category in Category::SECTIONS {
        let best = contents
            .iter()
            .enumerate()
            .filter_map(|(index, content)| {
                title_match(content, category).map(|strength| (strength, Reverse(index)))
            })
            .max();

        let Some((_, Reverse(index))) = best else {
            continue;
        };
        // one row opening two sections
        if titles.contains_key(&index) {
            return Err(MenuParseError::DuplicateTitle(category));
        }
        titles.insert(index, category);
    }

    if titles.is_empty() {
        return Err(MenuParseError::NoSections);
    }

    let mut last = Category::Unknown;
    for &category in titles.values() {
        if category < last {
            return Err(MenuParseError::UnexpectedTitleOrder {
                found: category,
                last,
            });
        }
        last = category;
    }

    Ok(titles)
}

fn words(input: &str) -> Vec<String> {
    input
        .to_lowercase()
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn letters_only(input: &str) -> String {
    input
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphabetic())
        .collect()
}

// cells copied from a spreadsheet are tab separated, the last one may be the price
fn split_price_cell(raw: &str) -> (String, Decimal) {
    let cells: Vec<&str> = raw
        .split('\t')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect();

    if cells.len() > 1 {
        if let Some(price) = parse_price(cells[cells.len() - 1]) {
            return (cells[..cells.len() - 1].join(" "), price);
        }
    }

    (cells.join(" "), Decimal::ZERO)
}

fn parse_price(cell: &str) -> Option<Decimal> {
    let cleaned = cell.trim_start_matches('€').trim_end_matches('€').trim().replace(',', ".");
    Decimal::from_str(&cleaned).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const MENU: &str = "Lunedì 10 dicembre
PRIMI PIATTI
Rigatoni al ragù dell'aia
Ravioli ricotta e spinaci con burro e salvia
Pasta al ragù, pesto o pomodoro (sono sempre disponibili)
Proposta del giorno: Lasagne cavolo nero e porri + macedonia

SECONDI PIATTI
Roastbeef con patate arrosto\t€ 6,50
Polpette   in umido con verdure
CONTORNI…
Patate arrosto
PIATTI VEGETARIANI
Fantasia di verdure grigliate
FRUTTA
Macedonia di frutta fresca
Frutta a tocchi
I NOSTRI  PANINI  ESPRESSI…
Diametro 12 mortadella
Tubo 15 tonno maionese e pomodoro

Questa riga non fa parte del menù";

    fn contents(menu: &Menu) -> Vec<(&str, Category, bool)> {
        menu.rows()
            .iter()
            .map(|r| (r.content.as_str(), r.category, r.is_daily_proposal))
            .collect()
    }

    #[test]
    fn test_parse_menu_text() {
        let menu = parse_menu_rows_for_year(&MENU.lines().collect::<Vec<_>>(), 2018).unwrap();

        assert_eq!(menu.date, NaiveDate::from_ymd_opt(2018, 12, 10));
        assert_eq!(
            contents(&menu),
            vec![
                ("Rigatoni al ragù dell'aia", Category::FirstCourse, false),
                ("Ravioli ricotta e spinaci con burro e salvia", Category::FirstCourse, false),
                ("Pasta al ragù", Category::FirstCourse, false),
                ("Pasta al pesto", Category::FirstCourse, false),
                ("Pasta al pomodoro", Category::FirstCourse, false),
                ("Lasagne cavolo nero e porri + macedonia", Category::FirstCourse, true),
                ("Roastbeef con patate arrosto", Category::MainCourse, false),
                ("Polpette in umido con verdure", Category::MainCourse, false),
                ("Patate arrosto", Category::SideDish, false),
                ("Fantasia di verdure grigliate", Category::Vegetarian, false),
                ("Macedonia di frutta fresca", Category::Fruit, false),
                ("Frutta a tocchi", Category::Fruit, false),
                ("Diametro 12 mortadella", Category::Sandwich, false),
                ("Tubo 15 tonno maionese e pomodoro", Category::Sandwich, false),
            ]
        );

        assert_eq!(menu.rows()[6].price, Decimal::new(650, 2));
        assert!(menu.rows()[7].price.is_zero());
    }

    #[test]
    fn test_wrong_weekday_keeps_menu() {
        let text = MENU.replacen("Lunedì", "Martedì", 1);
        let menu = parse_menu_rows_for_year(&text.lines().collect::<Vec<_>>(), 2018).unwrap();

        assert_eq!(menu.date, None);
        assert_eq!(menu.rows().len(), 14);
    }

    #[test]
    fn test_duplicate_rows_keep_last() {
        let rows = [
            "PRIMI PIATTI",
            "Pasta al pomodoro",
            "Riso olio",
            "Pasta al pomodoro",
        ];
        let menu = parse_menu_rows_for_year(&rows, 2019).unwrap();

        assert_eq!(
            contents(&menu),
            vec![
                ("Riso olio", Category::FirstCourse, false),
                ("Pasta al pomodoro", Category::FirstCourse, false),
            ]
        );
    }

    #[test]
    fn test_title_order_errors() {
        let rows = ["SECONDI PIATTI", "Pollo", "PRIMI PIATTI", "Pasta"];
        assert_eq!(
            parse_menu_rows_for_year(&rows, 2019),
            Err(MenuParseError::UnexpectedTitleOrder {
                found: Category::FirstCourse,
                last: Category::MainCourse,
            })
        );

        let rows = ["PRIMI PIATTI", "Pasta", "SECONDI PIATTI VEGETARIANI", "Seitan"];
        assert_eq!(
            parse_menu_rows_for_year(&rows, 2019),
            Err(MenuParseError::DuplicateTitle(Category::Vegetarian))
        );

        let rows = ["Lunedì 10 dicembre", "Pasta", "Pollo"];
        assert_eq!(
            parse_menu_rows_for_year(&rows, 2018),
            Err(MenuParseError::NoSections)
        );
    }

    #[test]
    fn test_heading_with_extra_words() {
        let rows = ["PRIMI PIATTI DEL GIORNO", "Lasagne", "SECONDI PIATTI", "Pollo"];
        let menu = parse_menu_rows_for_year(&rows, 2019).unwrap();

        assert_eq!(
            contents(&menu),
            vec![
                ("Lasagne", Category::FirstCourse, false),
                ("Pollo", Category::MainCourse, false),
            ]
        );
    }

    #[test]
    fn test_dish_named_like_its_section() {
        let rows = ["PRIMI PIATTI", "Lasagne", "FRUTTA", "Frutta", "Mela"];
        let menu = parse_menu_rows_for_year(&rows, 2019).unwrap();
        assert_eq!(
            contents(&menu),
            vec![
                ("Lasagne", Category::FirstCourse, false),
                ("Frutta", Category::Fruit, false),
                ("Mela", Category::Fruit, false),
            ]
        );

        let rows = ["PRIMI PIATTI", "Lasagne", "CONTORNI", "Contorno", "Patate"];
        let menu = parse_menu_rows_for_year(&rows, 2019).unwrap();
        assert_eq!(
            contents(&menu),
            vec![
                ("Lasagne", Category::FirstCourse, false),
                ("Contorno", Category::SideDish, false),
                ("Patate", Category::SideDish, false),
            ]
        );

        // the same heading twice: the second one is a row of the section
        let rows = ["FRUTTA", "Mela", "Frutta.", "Pera"];
        let menu = parse_menu_rows_for_year(&rows, 2019).unwrap();
        assert_eq!(
            contents(&menu),
            vec![
                ("Mela", Category::Fruit, false),
                ("Frutta.", Category::Fruit, false),
                ("Pera", Category::Fruit, false),
            ]
        );
    }

    #[test]
    fn test_not_enough_rows() {
        assert_eq!(
            parse_menu_text("PRIMI PIATTI\nPasta"),
            Err(MenuParseError::NotEnoughRows(2))
        );
    }

    #[test]
    fn test_title_match() {
        let cases = [
            ("Primi piatti", Category::FirstCourse),
            ("Primi  piatti", Category::FirstCourse),
            ("primi Piatti", Category::FirstCourse),
            ("Primipiatti", Category::FirstCourse),
            ("primi Piatti.", Category::FirstCourse),
            ("primi;, Piatti..", Category::FirstCourse),
            ("primi Piatti…", Category::FirstCourse),
            ("Secondi piatti", Category::MainCourse),
            ("Secondipiatti", Category::MainCourse),
            ("Contorni", Category::SideDish),
            ("contorni….", Category::SideDish),
            ("Piatti vegetariani", Category::Vegetarian),
            ("Piattivegetariani", Category::Vegetarian),
            ("Frutta  ", Category::Fruit),
            ("frutta", Category::Fruit),
            ("Dolci", Category::Dessert),
            ("i nostri panini espressi", Category::Sandwich),
            ("I NOSTRI  PANINI  ESPRESSI…", Category::Sandwich),
        ];
        for (title, category) in cases {
            assert_eq!(title_match(title, category), Some(TitleMatch::Exact), "title: {}", title);
        }

        assert_eq!(title_match("Panini espresi", Category::Sandwich), Some(TitleMatch::Fuzzy));
        assert_eq!(title_match("Contorno", Category::SideDish), Some(TitleMatch::Fuzzy));

        assert_eq!(
            title_match("PRIMI PIATTI DEL GIORNO", Category::FirstCourse),
            Some(TitleMatch::Partial)
        );
        assert_eq!(
            title_match("Oggi: secondi piatti", Category::MainCourse),
            Some(TitleMatch::Partial)
        );
        assert_eq!(title_match("Frutta a tocchi", Category::Fruit), Some(TitleMatch::Partial));

        assert_eq!(title_match("Macedonia di frutta fresca", Category::Fruit), None);
        assert_eq!(title_match("Pollo con contorni misti", Category::SideDish), None);
        assert_eq!(title_match("Frutta", Category::SideDish), None);
        assert_eq!(title_match("", Category::Fruit), None);
        assert_eq!(title_match("12 ...", Category::FirstCourse), None);
    }

    #[test]
    fn test_split_price_cell() {
        assert_eq!(
            split_price_cell("\tPollo al curry\t5,50 €"),
            ("Pollo al curry".to_string(), Decimal::new(550, 2))
        );
        assert_eq!(
            split_price_cell("Diametro 12 mortadella"),
            ("Diametro 12 mortadella".to_string(), Decimal::ZERO)
        );
    }
}
