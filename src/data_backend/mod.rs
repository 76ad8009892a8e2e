use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;

pub mod date_parser;
pub mod menu_parser;

pub const EMOJIS: [&str; 7] = ["🍝", "🥗", "🍕", "🥪", "🍲", "🍎", "🧆"];

/// Calendar days (menu date, order rollover) are counted in this zone.
pub const REFERENCE_TZ: Tz = chrono_tz::Europe::Rome;

/// The calendar day of `instant` in the reference zone.
pub fn reference_date(instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&REFERENCE_TZ).date_naive()
}

pub fn today() -> NaiveDate {
    reference_date(Utc::now())
}

pub fn italian_date_fmt(date: NaiveDate) -> String {
    let week_days = [
        "lunedì",
        "martedì",
        "mercoledì",
        "giovedì",
        "venerdì",
        "sabato",
        "domenica",
    ];

    format!(
        "{} {}",
        week_days[date.weekday().num_days_from_monday() as usize],
        date.format("%d/%m/%Y")
    )
}

fn standardize_spaces(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_italian_date_fmt() {
        let date = NaiveDate::from_ymd_opt(2018, 12, 10).unwrap();
        assert_eq!(italian_date_fmt(date), "lunedì 10/12/2018");
    }

    #[test]
    fn test_reference_date_follows_rome() {
        // 00:30 in Rome, still the previous day in UTC
        let winter = "2024-01-14T23:30:00Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(reference_date(winter), NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());

        // summer time: 01:30 in Rome
        let summer = "2024-05-01T23:30:00Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(reference_date(summer), NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());

        let afternoon = "2024-05-01T12:00:00Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(reference_date(afternoon), NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
    }

    #[test]
    fn test_standardize_spaces() {
        assert_eq!(standardize_spaces("  Pasta \t al   ragù "), "Pasta al ragù");
    }
}
