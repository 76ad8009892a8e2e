use chrono::{Datelike, NaiveDate};
use regex_lite::Regex;
use static_init::dynamic;

// index == days from sunday
const WEEK_DAYS: [&str; 7] = [
    "domenica", "luned", "marted", "mercoled", "gioved", "venerd", "sabato",
];

const MONTHS: [&str; 12] = [
    "gennaio",
    "febbraio",
    "marzo",
    "aprile",
    "maggio",
    "giugno",
    "luglio",
    "agosto",
    "settembre",
    "ottobre",
    "novembre",
    "dicembre",
];

/// Reads a menu heading like "Lunedì 10 dicembre" for the given year.
///
/// Returns `None` if any part is missing or if the weekday does not match
/// the calendar.
pub fn parse_menu_date(content: &str, year: i32) -> Option<NaiveDate> {
    #[dynamic]
    static DAY_RE: Regex = Regex::new(r"\d+").unwrap();

    let content = content.to_lowercase();

    let week_day = WEEK_DAYS.iter().position(|d| content.contains(d))?;
    let month = MONTHS.iter().position(|m| content.contains(m))? + 1;
    let day = DAY_RE
        .find(&content)
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .filter(|d| (1..=31).contains(d))?;

    log::debug!("menu date: weekday {} day {} month {}", week_day, day, month);

    let date = NaiveDate::from_ymd_opt(year, month as u32, day)?;
    if date.weekday().num_days_from_sunday() as usize != week_day {
        log::warn!("Weekday mismatch in menu date '{}'", content);
        return None;
    }

    Some(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_menu_date() {
        assert_eq!(
            parse_menu_date("Lunedì 10 dicembre", 2018),
            NaiveDate::from_ymd_opt(2018, 12, 10)
        );
        assert_eq!(
            parse_menu_date("MARTEDÌ 12 FEBBRAIO", 2019),
            NaiveDate::from_ymd_opt(2019, 2, 12)
        );
    }

    #[test]
    fn test_weekday_mismatch_is_discarded() {
        assert_eq!(parse_menu_date("Martedì 10 dicembre", 2018), None);
    }

    #[test]
    fn test_missing_parts() {
        assert_eq!(parse_menu_date("Menu del giorno", 2018), None);
        assert_eq!(parse_menu_date("Lunedì dicembre", 2018), None);
        assert_eq!(parse_menu_date("Lunedì 10", 2018), None);
        assert_eq!(parse_menu_date("Lunedì 40 dicembre", 2018), None);
        assert_eq!(parse_menu_date("Giovedì 31 febbraio", 2019), None);
    }
}
