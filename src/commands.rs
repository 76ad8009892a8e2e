use regex_lite::{Captures, Regex};
use static_init::dynamic;

/// A chat message understood as a command.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    Help,
    For { target: String, expression: String },
    ShowOrder,
    Bill,
    ClearOrder,
    Email,
    Menu { args: String },
    SetMenu { text: String },
    Remind { args: String },
    Cron { args: String },
    Mark { code: String },
    RemoveOrder { user: String },
    Unknown,
}

type Builder = fn(&Captures) -> ChatCommand;

// first match wins
const COMMANDS: [(&str, Builder); 12] = [
    (r"^(?is)(help|aiut).*$", |_| ChatCommand::Help),
    (r"^(?is)per\s+(\S+)\s+(.*)$", |c| ChatCommand::For {
        target: group(c, 1),
        expression: group(c, 2),
    }),
    (r"^(?i)ordine$", |_| ChatCommand::ShowOrder),
    (r"^(?i)conto$", |_| ChatCommand::Bill),
    (r"^(?i)cancella\s+ordine$", |_| ChatCommand::ClearOrder),
    (r"^(?i)email$", |_| ChatCommand::Email),
    (r"^(?is)menu(.*)$", |c| ChatCommand::Menu { args: group(c, 1) }),
    (r"^(?is)setmenu(.*)$", |c| ChatCommand::SetMenu { text: group(c, 1) }),
    (r"^(?i)remind(.*)$", |c| ChatCommand::Remind { args: group(c, 1) }),
    (r"^(?i)cron(.*)$", |c| ChatCommand::Cron { args: group(c, 1) }),
    (r"^(?i)segna(.*)$", |c| ChatCommand::Mark { code: group(c, 1) }),
    (r"^(?i)rmorder\s+(.*)$", |c| ChatCommand::RemoveOrder { user: group(c, 1) }),
];

fn group(caps: &Captures, i: usize) -> String {
    caps.get(i).map_or("", |m| m.as_str()).trim().to_string()
}

impl ChatCommand {
    pub fn parse(text: &str) -> ChatCommand {
        #[dynamic]
        static PATTERNS: Vec<(Regex, Builder)> = COMMANDS
            .iter()
            .map(|(pattern, builder)| (Regex::new(pattern).unwrap(), *builder))
            .collect();

        let text = text.trim();
        PATTERNS
            .iter()
            .find_map(|(re, builder)| re.captures(text).map(|caps| builder(&caps)))
            .unwrap_or(ChatCommand::Unknown)
    }
}
