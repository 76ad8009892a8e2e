use std::collections::BTreeMap;
use std::sync::Arc;

use rand::Rng;
use tokio::sync::{broadcast, mpsc};

use crate::commands::ChatCommand;
use crate::constants::{
    CRON_KEY, DEFAULT_REPLY, GUEST_PREFIX, HELP_MSG, MENU_KEY, NO_MENU_MSG, ORDER_NOT_ADDED,
    REMIND_KEY, USERS_KEY,
};
use crate::cron_table::{
    add_entry, format_entry, format_table, parse_cron_command, remove_entry, CronCommand,
    CronTable,
};
use crate::data_backend::{italian_date_fmt, today, EMOJIS};
use crate::data_backend::menu_parser::parse_menu_text;
use crate::data_types::menu_types::Menu;
use crate::data_types::{BotConfig, Outgoing, SchedulerTask, User};
use crate::db_operations::DataStore;
use crate::errors::BrainError;
use crate::mark::{normalize_code, MarkClient, VALID_CODES};
use crate::order::Order;
use crate::order_expression::parse_order_expression;
use crate::reminder::{format_reminder, parse_reminder, update_table, ReminderTable};
use crate::tokenizer::sanitize;

/// Users who talked to the bot, by lowercase name.
type UserDirectory = BTreeMap<String, User>;

/// Turns chat messages into order operations and replies.
pub struct LunchBot<B: DataStore> {
    brain: Arc<B>,
    config: BotConfig,
    outbox: mpsc::UnboundedSender<Outgoing>,
    scheduler_tx: broadcast::Sender<SchedulerTask>,
}

impl<B: DataStore + 'static> LunchBot<B> {
    pub fn new(
        brain: Arc<B>,
        config: BotConfig,
        outbox: mpsc::UnboundedSender<Outgoing>,
        scheduler_tx: broadcast::Sender<SchedulerTask>,
    ) -> Self {
        LunchBot {
            brain,
            config,
            outbox,
            scheduler_tx,
        }
    }

    pub fn brain(&self) -> &Arc<B> {
        &self.brain
    }

    /// Handles one message from `sender` in `chat_id`, returns the replies.
    ///
    /// Replies to other chats (e.g. the user somebody ordered for) are part of
    /// the result; slow work answers later through the outbox.
    pub fn handle_message(&self, chat_id: i64, sender: &User, text: &str) -> Vec<Outgoing> {
        self.remember_user(sender);

        let cmd = ChatCommand::parse(text);
        log::debug!("{} in {}: {:?}", sender, chat_id, cmd);

        let reply = |text: String| vec![Outgoing::new(chat_id, text)];

        match cmd {
            ChatCommand::Help => reply(HELP_MSG.to_string()),
            ChatCommand::For { target, expression } => {
                self.order_for(chat_id, sender, &target, &expression)
            }
            ChatCommand::ShowOrder => reply(self.show_order()),
            ChatCommand::Bill => reply(format!("Ecco il conto:\n{}", self.current_order().bill())),
            ChatCommand::ClearOrder => reply(self.save_or_report(&Order::new(), "Ordine cancellato")),
            ChatCommand::Email => reply(self.email()),
            ChatCommand::Menu { args } => reply(self.show_menu(&args)),
            ChatCommand::SetMenu { text } => reply(self.set_menu(&text)),
            ChatCommand::Remind { args } => reply(self.remind(sender, &args)),
            ChatCommand::Cron { args } => reply(self.cron(&args)),
            ChatCommand::Mark { code } => self.mark(chat_id, sender, &code),
            ChatCommand::RemoveOrder { user } => reply(self.remove_order(&user)),
            ChatCommand::Unknown => reply(format!("Mi dispiace {}, {}", sender, DEFAULT_REPLY)),
        }
    }

    fn remember_user(&self, user: &User) {
        if user.is_guest() {
            return;
        }

        let mut users: UserDirectory = self.brain.get_or_default(USERS_KEY);
        let key = user.name.to_lowercase();
        if users.get(&key) == Some(user) {
            return;
        }

        users.retain(|_, known| known.id != user.id);
        users.insert(key, user.clone());
        if let Err(e) = self.brain.set(USERS_KEY, &users) {
            log::error!("Saving users failed: {}", e);
        }
    }

    fn find_user(&self, name: &str) -> Option<User> {
        let users: UserDirectory = self.brain.get_or_default(USERS_KEY);
        users.get(&name.trim_start_matches('@').to_lowercase()).cloned()
    }

    fn current_order(&self) -> Order {
        Order::get_current(&*self.brain)
    }

    fn save_or_report(&self, order: &Order, ok_text: &str) -> String {
        match order.save(&*self.brain) {
            Ok(()) => ok_text.to_string(),
            Err(e) => {
                log::error!("Saving order failed: {}", e);
                format!("Errore nel salvataggio dell'ordine: {}", e)
            }
        }
    }

    fn order_for(&self, chat_id: i64, sender: &User, target: &str, expression: &str) -> Vec<Outgoing> {
        let mut out = Vec::new();

        let dest = if target.eq_ignore_ascii_case("me") {
            sender.clone()
        } else if let Some(user) = self.find_user(target) {
            user
        } else if target.starts_with(GUEST_PREFIX) {
            User::guest(target)
        } else {
            out.push(Outgoing::new(
                chat_id,
                format!(
                    "Utente '{}' non trovato. Se vuoi ordinare per conto di un ospite usa il prefisso {} nel nome",
                    target, GUEST_PREFIX
                ),
            ));
            return out;
        };

        // somebody else's private chat, to let them know
        let notify = dest.chat_id().filter(|_| &dest != sender);
        let expression = sanitize(expression);

        if expression.trim().eq_ignore_ascii_case("niente") {
            let mut order = self.current_order();
            let old = order.clear_user(&dest);
            let text = self.save_or_report(
                &order,
                &format!("Ok, cancello ordine per {}:\n{}", dest, old),
            );
            out.push(Outgoing::new(chat_id, text));

            if let Some(dest_chat) = notify {
                out.push(Outgoing::new(
                    dest_chat,
                    format!(
                        "Mi spiace disturbarti, volevo informarti che {} ha appena cancellato il tuo ordine:\n{}",
                        sender, old
                    ),
                ));
            }
            return out;
        }

        let menu: Menu = match self.brain.get(MENU_KEY) {
            Ok(menu) => menu,
            Err(e) => {
                if !e.is_not_found() {
                    log::error!("Loading menu failed: {}", e);
                }
                out.push(Outgoing::new(chat_id, NO_MENU_MSG));
                return out;
            }
        };

        if !menu.is_updated() {
            let date = menu
                .date
                .map(|d| d.format("%d/%m/%Y").to_string())
                .unwrap_or_else(|| "nessuna data".to_string());
            out.push(Outgoing::new(
                chat_id,
                format!(
                    "Non puoi ordinare, il menù non è quello di oggi, riporta la data del {}",
                    date
                ),
            ));
            return out;
        }

        let mut order = self.current_order();
        let mut log = Vec::new();

        let words: Vec<&str> = expression.split_whitespace().collect();
        let choices = if words.first().is_some_and(|w| w.eq_ignore_ascii_case("come")) {
            let Some(name) = words.get(1) else {
                out.push(Outgoing::new(
                    chat_id,
                    "È necessario specificare da chi vuoi copiare l'ordine",
                ));
                return out;
            };

            let source = self
                .find_user(name)
                .filter(|u| order.choices_of(u).is_some())
                .or_else(|| order.find_user_by_name(name.trim_start_matches('@')).cloned());

            match source.and_then(|u| order.choices_of(&u).map(|c| (u.clone(), c.to_vec()))) {
                Some((source, choices)) => {
                    log.push(format!("Ok, copio l'ordine di {}:", source));
                    log.extend(choices.iter().map(ToString::to_string));
                    choices
                }
                None => {
                    out.push(Outgoing::new(
                        chat_id,
                        format!("Mi spiace, ma non trovo l'utente '{}' nell'ordine", name),
                    ));
                    return out;
                }
            }
        } else {
            match parse_order_expression(&menu, &expression, &mut log) {
                Ok(choices) => choices,
                Err(e) => {
                    log.push(e.to_string());
                    log.push(ORDER_NOT_ADDED.to_string());
                    out.push(Outgoing::new(chat_id, log.join("\n")));
                    return out;
                }
            }
        };

        let count = choices.len();
        let list = order.set(&dest, choices);
        if let Err(e) = order.save(&*self.brain) {
            log::error!("Saving order failed: {}", e);
            out.push(Outgoing::new(
                chat_id,
                format!("Errore nel salvataggio dell'ordine: {}\n{}", e, ORDER_NOT_ADDED),
            ));
            return out;
        }

        let suffix = if count == 1 { "o" } else { "i" };
        log.push(format!(
            "Ok, aggiunt{} {} piatt{} per {}",
            suffix, count, suffix, dest
        ));
        out.push(Outgoing::new(chat_id, log.join("\n")));

        if let Some(dest_chat) = notify {
            out.push(Outgoing::new(
                dest_chat,
                format!(
                    "Ti volevo informare che {} ha ordinato i seguenti piatti per conto tuo:\n{}",
                    sender,
                    list.join("\n")
                ),
            ));
        }
        out
    }

    fn show_order(&self) -> String {
        let order = self.current_order();
        if order.is_empty() {
            return "Nessun piatto ordinato per oggi".to_string();
        }
        format!("Ecco l'ordine:\n{}", order)
    }

    fn email(&self) -> String {
        let order = self.current_order();
        let subject = format!("Ordine del giorno {}", order.timestamp().format("%d/%m/%Y"));
        let body = order.format(false, false);

        let mut out = format!("{}\n{}", subject, body);
        if !self.config.email_recipients.is_empty() {
            out += &format!(
                "\n\nmailto:{}?subject={}&body={}",
                self.config.email_recipients.join(","),
                mailto_escape(&subject),
                mailto_escape(&body)
            );
        }
        out
    }

    fn show_menu(&self, args: &str) -> String {
        if !args.is_empty() {
            return "Se stai cercando di impostare il menù, usa il comando 'setmenu'\nPer vedere il menù corrente, usa il comando 'menu' senza argomenti.".to_string();
        }

        match self.brain.get::<Menu>(MENU_KEY) {
            Ok(menu) => {
                let emoji = EMOJIS[rand::thread_rng().gen_range(0..EMOJIS.len())];
                match menu.date {
                    Some(date) => format!(
                        "Ecco il menù di {} {}\n{}",
                        italian_date_fmt(date),
                        emoji,
                        menu
                    ),
                    None => format!("Ecco il menù {}\n{}", emoji, menu),
                }
            }
            Err(BrainError::NotFound(_)) => "Non c'è nessun menù impostato!".to_string(),
            Err(e) => {
                log::error!("Loading menu failed: {}", e);
                "Non c'è nessun menù impostato!".to_string()
            }
        }
    }

    fn set_menu(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return "Non hai indicato nessun nuovo menù!".to_string();
        }

        let mut menu = match parse_menu_text(&sanitize(text)) {
            Ok(menu) => menu,
            Err(e) => return format!("Errore nel menù: {}", e),
        };

        let mut notes = String::new();
        if menu.date.is_none() {
            let today = today();
            menu.date = Some(today);
            notes = format!(
                "Data non trovata nel menù, imposto quella di oggi ({})\n",
                italian_date_fmt(today)
            );
        }

        match self.brain.set(MENU_KEY, &menu) {
            Ok(()) => format!("{}Ok, menù impostato:\n{}", notes, menu),
            Err(e) => {
                log::error!("Saving menu failed: {}", e);
                format!("Errore nel salvataggio del menù: {}", e)
            }
        }
    }

    fn remind(&self, sender: &User, args: &str) -> String {
        let mut table: ReminderTable = self.brain.get_or_default(REMIND_KEY);

        if args.is_empty() {
            return match table.get(&sender.id) {
                Some(mask) => format_reminder(*mask),
                None => "Non c'è nessun reminder impostato".to_string(),
            };
        }

        let Some(mask) = parse_reminder(args) else {
            return "Mi spiace, ma non ho capito cosa mi stai chiedendo di ricordare".to_string();
        };

        update_table(&mut table, &sender.id, mask);
        match self.brain.set(REMIND_KEY, &table) {
            Ok(()) => format_reminder(mask),
            Err(e) => {
                log::error!("Saving reminders failed: {}", e);
                format!("Errore nel salvataggio del reminder: {}", e)
            }
        }
    }

    fn cron(&self, args: &str) -> String {
        let command = match parse_cron_command(args) {
            Ok(command) => command,
            Err(e) => return e.to_string(),
        };
        let mut table: CronTable = self.brain.get_or_default(CRON_KEY);

        let reply = match command {
            CronCommand::List => {
                return format_table(&table)
                    .unwrap_or_else(|| "Non c'è nessun cron impostato".to_string())
            }
            CronCommand::Add(entry) => match add_entry(&mut table, &entry) {
                Ok(index) => format!("Ok, cron aggiunto:\n{}", format_entry(index, &table[index])),
                Err(e) => return e.to_string(),
            },
            CronCommand::Remove(index) => match remove_entry(&mut table, &index) {
                Ok(entry) => format!("Ok, rimosso cron:\n{} - {}", index.trim(), entry),
                Err(e) => return e.to_string(),
            },
        };

        if let Err(e) = self.brain.set(CRON_KEY, &table) {
            log::error!("Saving crontab failed: {}", e);
            return format!("Errore nel salvataggio dei cron: {}", e);
        }

        if self.scheduler_tx.send(SchedulerTask::ReloadCron).is_err() {
            log::warn!("No scheduler listening, cron changes apply on restart");
        }
        reply
    }

    fn mark(&self, chat_id: i64, sender: &User, code: &str) -> Vec<Outgoing> {
        let reply = |text: String| vec![Outgoing::new(chat_id, text)];

        if code.trim().is_empty() {
            return reply("Cosa devo segnare? Consulta 'aiuto' per sapere come fare".to_string());
        }

        let code = match normalize_code(code) {
            Ok(code) => code,
            Err(e) => {
                return reply(format!(
                    "Scusami, {}.\nStringhe valide sono: {}",
                    e,
                    VALID_CODES.join(", ")
                ))
            }
        };

        let client = match MarkClient::from_config(&self.config) {
            Ok(client) => client,
            Err(e) => return reply(format!("errore: {}", e)),
        };

        // slow, answer through the outbox
        let outbox = self.outbox.clone();
        let user = sender.clone();
        tokio::spawn(async move {
            let text = match client.mark(&user, code).await {
                Ok(()) => format!("Ok, segnato '{}' per {} sul foglio dei pranzi", code, user),
                Err(e) => format!("errore: {}", e),
            };
            if outbox.send(Outgoing::new(chat_id, text)).is_err() {
                log::error!("Outbox closed, dropping mark result for {}", user);
            }
        });

        Vec::new()
    }

    fn remove_order(&self, name: &str) -> String {
        let mut order = self.current_order();
        let Some(user) = order.find_user_by_name(name).cloned() else {
            return format!("Mi spiace, ma non trovo l'utente '{}' nell'ordine", name);
        };

        let old = order.clear_user(&user);
        self.save_or_report(&order, &format!("Ok, cancello ordine di {}:\n{}", user, old))
    }
}

// mail clients want %20 for spaces
fn mailto_escape(text: &str) -> String {
    url::form_urlencoded::byte_serialize(text.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
