pub mod bot_command_handlers;
pub mod bot_command_helpers;
pub mod commands;
pub mod constants;
pub mod cron_table;
pub mod data_backend;
pub mod data_types;
pub mod db_operations;
pub mod errors;
pub mod lunch_bot;
pub mod mark;
pub mod order;
pub mod order_expression;
pub mod reminder;
pub mod scheduled_tasks;
pub mod shared_main;
pub mod task_scheduler_funcs;
pub mod tokenizer;
pub mod user_choice;
