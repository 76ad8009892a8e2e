use std::{
    collections::BTreeMap,
    path::PathBuf,
    sync::{PoisonError, RwLock},
};

use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};

use crate::errors::BrainError;

/// Key-value store holding whole JSON documents.
pub trait DataStore: Send + Sync {
    fn read(&self, key: &str) -> Result<String, BrainError>;

    fn write(&self, key: &str, raw: &str) -> Result<(), BrainError>;

    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, BrainError>
    where
        Self: Sized,
    {
        Ok(serde_json::from_str(&self.read(key)?)?)
    }

    fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), BrainError>
    where
        Self: Sized,
    {
        self.write(key, &serde_json::to_string(value)?)?;
        log::debug!("Saved '{}'", key);
        Ok(())
    }

    /// Like `get`, but any failure yields the default value.
    fn get_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T
    where
        Self: Sized,
    {
        match self.get(key) {
            Ok(value) => value,
            Err(e) => {
                if !e.is_not_found() {
                    log::error!("Reading '{}' failed: {}", key, e);
                }
                T::default()
            }
        }
    }
}

pub struct SqliteBrain {
    path: PathBuf,
}

impl SqliteBrain {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, BrainError> {
        let brain = SqliteBrain { path: path.into() };

        // ensure db table exists
        brain
            .connect()?
            .prepare(
                "create table if not exists brain (
                key text not null unique primary key,
                value text not null
                )",
            )?
            .execute([])?;

        Ok(brain)
    }

    fn connect(&self) -> rusqlite::Result<Connection> {
        Connection::open(&self.path)
    }
}

impl DataStore for SqliteBrain {
    fn read(&self, key: &str) -> Result<String, BrainError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare_cached("select value from brain where key = ?1")?;

        stmt.query_row(params![key], |row| row.get(0))
            .optional()?
            .ok_or_else(|| BrainError::NotFound(key.to_string()))
    }

    fn write(&self, key: &str, raw: &str) -> Result<(), BrainError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare_cached(
            "replace into brain (key, value)
                values (?1, ?2)",
        )?;

        stmt.execute(params![key, raw])?;
        Ok(())
    }
}

/// Volatile store, handy for tests.
#[derive(Default)]
pub struct MemoryBrain {
    values: RwLock<BTreeMap<String, String>>,
}

impl MemoryBrain {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DataStore for MemoryBrain {
    fn read(&self, key: &str) -> Result<String, BrainError> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
            .ok_or_else(|| BrainError::NotFound(key.to_string()))
    }

    fn write(&self, key: &str, raw: &str) -> Result<(), BrainError> {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), raw.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let brain = SqliteBrain::open(dir.path().join("brain.sqlite")).unwrap();

        assert!(brain.read("cron").unwrap_err().is_not_found());

        let crontab = vec!["50 11 * * 1-5;reminder".to_string()];
        brain.set("cron", &crontab).unwrap();
        assert_eq!(brain.get::<Vec<String>>("cron").unwrap(), crontab);

        // replace, not append
        brain.set("cron", &Vec::<String>::new()).unwrap();
        assert!(brain.get::<Vec<String>>("cron").unwrap().is_empty());
    }

    #[test]
    fn test_sqlite_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brain.sqlite");

        SqliteBrain::open(&path).unwrap().write("menu", "{}").unwrap();
        assert_eq!(SqliteBrain::open(&path).unwrap().read("menu").unwrap(), "{}");
    }

    #[test]
    fn test_get_or_default() {
        let brain = MemoryBrain::new();
        let remind: BTreeMap<String, u8> = brain.get_or_default("remind");
        assert!(remind.is_empty());

        brain.write("remind", "not json").unwrap();
        assert!(!brain.get::<BTreeMap<String, u8>>("remind").unwrap_err().is_not_found());
        let remind: BTreeMap<String, u8> = brain.get_or_default("remind");
        assert!(remind.is_empty());
    }
}
