use std::sync::OnceLock;

pub static DB_FILENAME: OnceLock<String> = OnceLock::new();
pub const DEFAULT_DB: &str = "pranzo.sqlite";

// brain keys
pub const MENU_KEY: &str = "menu";
pub const ORDER_KEY: &str = "order";
pub const REMIND_KEY: &str = "remind";
pub const CRON_KEY: &str = "cron";
pub const USERS_KEY: &str = "users";

pub const GUEST_PREFIX: &str = "guest_";

pub const NO_MENU_MSG: &str = "Nessun menù impostato!";
pub const ORDER_NOT_ADDED: &str = "Ordine non aggiunto!";
pub const DEFAULT_REPLY: &str = "purtroppo non posso farlo.\nProva con 'aiuto' per vedere l'elenco delle cose che posso fare.";

pub const HELP_MSG: &str = "Elenco comandi supportati:

PER ORDINARE UN PIATTO:
per <utente> <ordine>
<utente> può essere 'me' per ordinare per se stessi, oppure il nome di un altro utente (che verrà avvisato!). È possibile ordinare per ospiti esterni chiamandoli 'guest_<nome>'.

<ordine> può essere una serie di parole separate da spazi, cercherò tra le voci del menù il piatto che corrisponde meglio.

Funzionalità speciali per personalizzare l'ordine:
& - unisce un secondo ad uno o più contorni in un solo piatto.
  es. per me scorfano & piselli
+ - ordina più portate alla volta (un primo e un secondo, un secondo e una frutta...).
  es. per me fusilli + peposo
\"testo\" - aggiunge testualmente quanto scritto tra virgolette (utile per le insalate o il senza glutine). Non abusatene!
come <utente> - copia l'ordine di un altro utente.
  es. per me come mario
Le funzionalità speciali possono essere combinate tra loro.

PER CANCELLARE UN ORDINE:
per <utente> niente

PER VEDERE I PIATTI ORDINATI:
ordine

PER VEDERE IL CONTO:
conto

PER CANCELLARE L'ORDINE DI TUTTI:
cancella ordine

PER PREPARARE LA MAIL DELL'ORDINE:
email

PER VEDERE IL MENÙ:
menu

PER IMPOSTARE IL MENÙ:
setmenu <menù>
Il menù può essere multilinea, basta copiare le celle del foglio inviato dal ristorante.

PER IMPOSTARE IL REMINDER:
remind <giorni>
<giorni> può essere 'on' (tutti i giorni), 'off', oppure un elenco come 'lun, mar'. Senza argomenti mostra lo stato del reminder.
Se il menù del giorno è impostato e non hai ancora ordinato, ti verrà inviato il menù in privato.

PER SEGNARE IL PRANZO:
segna <cibo>
<cibo> può essere P, PS, PD, S, SD, D, PSD oppure Niente.
Se hai ordinato con il bot, il pranzo viene segnato in automatico.

PER GESTIRE LE ATTIVITÀ PROGRAMMATE:
cron
cron add <min ora giorno mese giorno_sett>;<attività>
cron rm <indice>";
