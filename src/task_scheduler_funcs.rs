use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

use crate::constants::CRON_KEY;
use crate::cron_table::{job_schedule, split_entry, CronTable};
use crate::data_types::{BotConfig, Outgoing};
use crate::db_operations::DataStore;
use crate::scheduled_tasks::{run_task, ScheduledTask};

/// Adds one scheduler job per stored cron entry, returns their ids.
///
/// Entries that don't parse anymore are logged and skipped.
pub async fn load_cron_jobs<B: DataStore + 'static>(
    brain: Arc<B>,
    sched: &JobScheduler,
    config: &BotConfig,
    outbox: &UnboundedSender<Outgoing>,
) -> Vec<Uuid> {
    let table: CronTable = brain.get_or_default(CRON_KEY);
    let mut uuids = Vec::with_capacity(table.len());

    for entry in table {
        let Some((schedule, task)) = split_entry(&entry) else {
            log::error!(target: "pranzo_telegram_rs::TaskSched", "Malformed cron entry '{}'", entry);
            continue;
        };
        let task: ScheduledTask = match task.parse() {
            Ok(task) => task,
            Err(e) => {
                log::error!(target: "pranzo_telegram_rs::TaskSched", "Skipping '{}': {}", entry, e);
                continue;
            }
        };

        let brain = brain.clone();
        let config = config.clone();
        let outbox = outbox.clone();
        let job = Job::new_async(job_schedule(schedule).as_str(), move |_uuid, mut _l| {
            let brain = brain.clone();
            let config = config.clone();
            let outbox = outbox.clone();
            let task = task.clone();

            Box::pin(async move {
                log::info!(target: "pranzo_telegram_rs::TaskSched", "Running {:?}", task);
                run_task(&task, &*brain, &config, &outbox).await;
            })
        });

        let job = match job {
            Ok(job) => job,
            Err(e) => {
                log::error!(target: "pranzo_telegram_rs::TaskSched", "Bad schedule in '{}': {:?}", entry, e);
                continue;
            }
        };

        let uuid = job.guid();
        match sched.add(job).await {
            Ok(_) => {
                log::info!(target: "pranzo_telegram_rs::TaskSched", "Loaded '{}'", entry);
                uuids.push(uuid);
            }
            Err(e) => {
                log::error!(target: "pranzo_telegram_rs::TaskSched", "Adding '{}' failed: {:?}", entry, e)
            }
        }
    }

    uuids
}

/// Drops the jobs in `loaded` and loads the crontab again.
pub async fn handle_reload_cron_task<B: DataStore + 'static>(
    brain: Arc<B>,
    sched: &JobScheduler,
    config: &BotConfig,
    outbox: &UnboundedSender<Outgoing>,
    loaded: &mut Vec<Uuid>,
) {
    for uuid in loaded.drain(..) {
        if let Err(e) = sched.remove(&uuid).await {
            log::error!(target: "pranzo_telegram_rs::TaskSched", "Removing job {} failed: {:?}", uuid, e);
        }
    }

    *loaded = load_cron_jobs(brain, sched, config, outbox).await;
    log::info!(target: "pranzo_telegram_rs::TaskSched", "Crontab reloaded, {} jobs", loaded.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db_operations::MemoryBrain;

    #[tokio::test]
    async fn test_load_skips_bad_entries() {
        let brain = Arc::new(MemoryBrain::new());
        let table: CronTable = vec![
            "50 10 * * MON-FRI;reminder".to_string(),
            "0 13 * * *;post 42 -o $ORDER".to_string(),
            "0 13 * * *;dance".to_string(),
            "no separator".to_string(),
        ];
        brain.set(CRON_KEY, &table).unwrap();

        let sched = JobScheduler::new().await.unwrap();
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();

        let mut loaded = load_cron_jobs(brain.clone(), &sched, &BotConfig::default(), &tx).await;
        assert_eq!(loaded.len(), 2);

        brain.set(CRON_KEY, &vec!["0 12 * * *;mark".to_string()]).unwrap();
        handle_reload_cron_task(brain, &sched, &BotConfig::default(), &tx, &mut loaded).await;
        assert_eq!(loaded.len(), 1);
    }
}
