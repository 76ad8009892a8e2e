use tokio_cron_scheduler::Job;

use crate::errors::CronError;
use crate::scheduled_tasks::ScheduledTask;

/// Entries look like `"<min> <hour> <dom> <month> <dow>;<task> <args>"`.
pub type CronTable = Vec<String>;

#[derive(Debug, Clone, PartialEq)]
pub enum CronCommand {
    List,
    Add(String),
    Remove(String),
}

pub fn parse_cron_command(args: &str) -> Result<CronCommand, CronError> {
    let args = args.trim();
    if args.is_empty() {
        return Ok(CronCommand::List);
    }

    let Some((sub, rest)) = args.split_once(char::is_whitespace) else {
        return Err(CronError::MissingArguments);
    };

    match sub.to_lowercase().as_str() {
        "add" => Ok(CronCommand::Add(rest.trim().to_string())),
        "rm" => Ok(CronCommand::Remove(rest.trim().to_string())),
        other => Err(CronError::UnknownSubcommand(other.to_string())),
    }
}

pub fn split_entry(entry: &str) -> Option<(&str, &str)> {
    entry
        .split_once(';')
        .map(|(schedule, task)| (schedule.trim(), task.trim()))
}

/// The scheduler wants a leading seconds field.
pub fn job_schedule(schedule: &str) -> String {
    format!("0 {}", schedule.trim())
}

pub fn validate_schedule(schedule: &str) -> Result<(), CronError> {
    let fields = schedule.split_whitespace().count();
    if fields != 5 {
        return Err(CronError::InvalidSchedule(format!(
            "servono 5 campi, trovati {}",
            fields
        )));
    }

    Job::new(job_schedule(schedule).as_str(), |_uuid, _l| {})
        .map(|_| ())
        .map_err(|e| CronError::InvalidSchedule(format!("{:?}", e)))
}

/// Validates and appends `entry`, returns its index.
pub fn add_entry(table: &mut CronTable, entry: &str) -> Result<usize, CronError> {
    let (schedule, task) = split_entry(entry).ok_or(CronError::MissingArguments)?;
    if task.is_empty() {
        return Err(CronError::MissingArguments);
    }

    validate_schedule(schedule)?;
    task.parse::<ScheduledTask>()?;

    table.push(entry.trim().to_string());
    Ok(table.len() - 1)
}

/// Removes the entry at `index`, returns it.
pub fn remove_entry(table: &mut CronTable, index: &str) -> Result<String, CronError> {
    if table.is_empty() {
        return Err(CronError::Empty);
    }

    let index: i64 = index
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| CronError::InvalidIndex(e.to_string()))?;

    if index < 0 || index as usize >= table.len() {
        return Err(CronError::IndexOutOfRange);
    }

    Ok(table.remove(index as usize))
}

pub fn format_entry(index: usize, entry: &str) -> String {
    format!("{} - {}", index, entry)
}

pub fn format_table(table: &CronTable) -> Option<String> {
    if table.is_empty() {
        return None;
    }

    Some(
        table
            .iter()
            .enumerate()
            .map(|(i, entry)| format_entry(i, entry))
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cron_command() {
        assert_eq!(parse_cron_command("  "), Ok(CronCommand::List));
        assert_eq!(
            parse_cron_command("add 50 10 * * MON-FRI;reminder"),
            Ok(CronCommand::Add("50 10 * * MON-FRI;reminder".to_string()))
        );
        assert_eq!(parse_cron_command("RM 2"), Ok(CronCommand::Remove("2".to_string())));
        assert_eq!(parse_cron_command("add"), Err(CronError::MissingArguments));
        assert_eq!(
            parse_cron_command("drop 1"),
            Err(CronError::UnknownSubcommand("drop".to_string()))
        );
    }

    #[test]
    fn test_add_entry() {
        let mut table = CronTable::new();

        assert_eq!(add_entry(&mut table, "50 10 * * MON-FRI;reminder"), Ok(0));
        assert_eq!(add_entry(&mut table, "0 13 * * *; mark"), Ok(1));
        assert_eq!(add_entry(&mut table, "50 10 * * *"), Err(CronError::MissingArguments));
        assert_eq!(add_entry(&mut table, "50 10 * * *;"), Err(CronError::MissingArguments));
        assert!(matches!(
            add_entry(&mut table, "50 10 *;reminder"),
            Err(CronError::InvalidSchedule(_))
        ));
        assert!(matches!(
            add_entry(&mut table, "99 10 * * *;reminder"),
            Err(CronError::InvalidSchedule(_))
        ));
        assert!(matches!(
            add_entry(&mut table, "50 10 * * *;dance"),
            Err(CronError::InvalidTask(_))
        ));

        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_remove_entry() {
        let mut table = CronTable::new();
        assert_eq!(remove_entry(&mut table, "0"), Err(CronError::Empty));

        table.push("0 12 * * *;mark".to_string());
        table.push("50 10 * * *;reminder".to_string());

        assert!(matches!(remove_entry(&mut table, "x"), Err(CronError::InvalidIndex(_))));
        assert_eq!(remove_entry(&mut table, "-1"), Err(CronError::IndexOutOfRange));
        assert_eq!(remove_entry(&mut table, "2"), Err(CronError::IndexOutOfRange));
        assert_eq!(remove_entry(&mut table, "0"), Ok("0 12 * * *;mark".to_string()));
        assert_eq!(format_table(&table).unwrap(), "0 - 50 10 * * *;reminder");
    }

    #[test]
    fn test_format_empty_table() {
        assert_eq!(format_table(&CronTable::new()), None);
    }
}
