use pranzo_telegram_rs::bot_command_handlers::message_handler;
use pranzo_telegram_rs::constants::{DB_FILENAME, DEFAULT_DB};
use pranzo_telegram_rs::data_types::{
    BotConfig, Outgoing, OutboxType, SchedulerTask, SchedulerTaskType,
};
use pranzo_telegram_rs::db_operations::SqliteBrain;
use pranzo_telegram_rs::lunch_bot::LunchBot;
use pranzo_telegram_rs::shared_main::{logger_init, run_outbox};
use pranzo_telegram_rs::task_scheduler_funcs::{handle_reload_cron_task, load_cron_jobs};

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use teloxide::{dispatching::UpdateHandler, prelude::*};
use tokio::sync::{broadcast, mpsc};
use tokio_cron_scheduler::JobScheduler;

/// Telegram bot collecting the daily lunch order of the office.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// The telegram bot token to be used
    #[arg(short, long, env = "TELOXIDE_TOKEN")]
    token: String,
    /// SQLite file holding menu, order, reminders and crontab
    #[arg(short, long, env = "PRANZO_DB", default_value = DEFAULT_DB)]
    db: String,
    /// Lunch sheet endpoint, <USER> and <FOOD> are replaced{n}Example: <https://example.org/mark?u=<USER>&f=<FOOD>>
    #[arg(long, env = "MARK_URL")]
    mark_url: Option<String>,
    /// Recipients of the order email, comma separated
    #[arg(long, env = "EMAIL_TO", value_delimiter = ',')]
    email_to: Vec<String>,
    /// enable verbose logging{n}[SETS env: RUST_LOG=debug]
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    //// Args setup
    let args = Args::parse();

    if args.verbose {
        std::env::set_var("RUST_LOG", "debug");
    }

    logger_init(module_path!());
    log::info!("Starting bot...");

    //// DB setup
    let db_file = DB_FILENAME.get_or_init(|| args.db);
    let brain = Arc::new(
        SqliteBrain::open(db_file).with_context(|| format!("opening database {}", db_file))?,
    );

    let config = BotConfig {
        mark_url: args.mark_url,
        email_recipients: args
            .email_to
            .into_iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect(),
    };

    let bot = Bot::new(args.token);

    let (scheduler_tx, scheduler_rx): SchedulerTaskType = broadcast::channel(10);
    let (outbox_tx, outbox_rx): OutboxType = mpsc::unbounded_channel();

    {
        let bot = bot.clone();
        tokio::spawn(async move {
            run_outbox(bot, outbox_rx).await;
        });
    }

    {
        let brain = brain.clone();
        let config = config.clone();
        let outbox_tx = outbox_tx.clone();
        tokio::spawn(async move {
            log::info!("Starting task scheduler...");
            if let Err(e) = run_task_scheduler(brain, config, outbox_tx, scheduler_rx).await {
                log::error!(target: "pranzo_telegram_rs::TaskSched", "Scheduler stopped: {:?}", e);
            }
        });
    }

    let lunch_bot = Arc::new(LunchBot::new(brain, config, outbox_tx, scheduler_tx));

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![lunch_bot])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    Update::filter_message().branch(dptree::endpoint(message_handler))
}

async fn run_task_scheduler(
    brain: Arc<SqliteBrain>,
    config: BotConfig,
    outbox_tx: mpsc::UnboundedSender<Outgoing>,
    mut scheduler_rx: broadcast::Receiver<SchedulerTask>,
) -> anyhow::Result<()> {
    let sched = JobScheduler::new().await?;

    let mut loaded = load_cron_jobs(brain.clone(), &sched, &config, &outbox_tx).await;

    // start scheduler (non blocking)
    sched.start().await?;

    log::info!(target: "pranzo_telegram_rs::TaskSched", "Ready, {} jobs.", loaded.len());

    while let Ok(task) = scheduler_rx.recv().await {
        match task {
            SchedulerTask::ReloadCron => {
                handle_reload_cron_task(brain.clone(), &sched, &config, &outbox_tx, &mut loaded)
                    .await;
            }
        }
    }

    Ok(())
}
