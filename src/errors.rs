use thiserror::Error;

use crate::data_types::menu_types::Category;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MenuParseError {
    #[error("menù troppo corto: {0} righe")]
    NotEnoughRows(usize),
    #[error("nessuna sezione riconosciuta nel menù")]
    NoSections,
    #[error("ordine delle sezioni inatteso ('{found}' dopo '{last}')")]
    UnexpectedTitleOrder { found: Category, last: Category },
    #[error("sezione duplicata: '{0}'")]
    DuplicateTitle(Category),
}

#[derive(Debug, Error, Clone, PartialEq)]
#[error("è possibile solo comporre piatti formati da un secondo e contorno/i")]
pub struct CombinationError {
    pub rejected: String,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum OrderExpressionError {
    #[error("piatto vuoto nell'ordine")]
    EmptyDish,
    #[error("Non ho trovato nulla nel menù che corrisponda a '{0}'")]
    NotFound(String),
    #[error("Cercando per '{query}' ho trovato i seguenti piatti:\n{}\n----\nprova ad essere più preciso!", .candidates.join("\n"))]
    Ambiguous {
        query: String,
        candidates: Vec<String>,
    },
    #[error("Errore nella personalizzazione: {0}")]
    Combination(#[from] CombinationError),
}

#[derive(Debug, Error)]
pub enum BrainError {
    #[error("chiave '{0}' non trovata")]
    NotFound(String),
    #[error("errore del database: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("dati non validi: {0}")]
    Json(#[from] serde_json::Error),
}

impl BrainError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BrainError::NotFound(_))
    }
}

#[derive(Debug, Error)]
pub enum MarkError {
    #[error("nessun URL per segnare il pranzo configurato")]
    Unconfigured,
    #[error("la stringa '{0}' non è valida")]
    InvalidCode(String),
    #[error("utente senza identificativo, impossibile segnare il pranzo")]
    MissingUser,
    #[error("client HTTP non disponibile: {0}")]
    Client(#[from] reqwest::Error),
    #[error("richiesta fallita dopo {attempts} tentativi: {source}")]
    RequestFailed {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CronError {
    #[error("Argomenti insufficienti!")]
    MissingArguments,
    #[error("Errore di formato cron: {0}")]
    InvalidSchedule(String),
    #[error("Errore di parsing indice: {0}")]
    InvalidIndex(String),
    #[error("Indice inesistente!")]
    IndexOutOfRange,
    #[error("Nessun cron impostato!")]
    Empty,
    #[error("Comando cron sconosciuto: '{0}'")]
    UnknownSubcommand(String),
    #[error("Attività non valida: {0}")]
    InvalidTask(String),
}
