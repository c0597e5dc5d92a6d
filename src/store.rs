use rusqlite::{Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

use crate::model::{standard_test_items, Class, Role, User};

/// The six logical collections the application persists. Each one is stored
/// as a single JSON array blob; writes replace the whole collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Users,
    Classes,
    Students,
    Assignments,
    Records,
    TestItems,
}

impl Collection {
    pub fn key(self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Classes => "classes",
            Collection::Students => "students",
            Collection::Assignments => "assignments",
            Collection::Records => "records",
            Collection::TestItems => "test_items",
        }
    }
}

pub struct RecordStore {
    conn: Connection,
}

pub fn open_store(workspace: &Path) -> anyhow::Result<RecordStore> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("fitness.sqlite3");
    let conn = Connection::open(db_path)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS collections(
            key TEXT PRIMARY KEY,
            data TEXT NOT NULL
        )",
        [],
    )?;

    let store = RecordStore { conn };
    store.seed_defaults()?;
    Ok(store)
}

impl RecordStore {
    /// Reads a full collection. A collection that was never written reads as
    /// empty rather than erroring.
    pub fn get<T: DeserializeOwned>(&self, collection: Collection) -> anyhow::Result<Vec<T>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT data FROM collections WHERE key = ?",
                [collection.key()],
                |r| r.get(0),
            )
            .optional()?;
        match raw {
            Some(text) => Ok(serde_json::from_str(&text)?),
            None => Ok(Vec::new()),
        }
    }

    /// Replaces a collection wholesale. There are no partial writes.
    pub fn set<T: Serialize>(&self, collection: Collection, items: &[T]) -> anyhow::Result<()> {
        let text = serde_json::to_string(items)?;
        self.conn.execute(
            "INSERT INTO collections(key, data) VALUES(?, ?)
             ON CONFLICT(key) DO UPDATE SET data = excluded.data",
            (collection.key(), &text),
        )?;
        Ok(())
    }

    fn has(&self, collection: Collection) -> anyhow::Result<bool> {
        let row: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM collections WHERE key = ?",
                [collection.key()],
                |r| r.get(0),
            )
            .optional()?;
        Ok(row.is_some())
    }

    /// First-open seeding, mirroring what the browser app ships with. Only
    /// collections that are absent are filled; re-opening never clobbers.
    fn seed_defaults(&self) -> anyhow::Result<()> {
        if !self.has(Collection::Users)? {
            let users = vec![
                User {
                    id: "1".to_string(),
                    username: "admin".to_string(),
                    password: Some("0000".to_string()),
                    name: "System Administrator".to_string(),
                    role: Role::Admin,
                    student_id: None,
                    last_login: None,
                },
                User {
                    id: "2".to_string(),
                    username: "teacher1".to_string(),
                    password: Some("123".to_string()),
                    name: "Default Teacher".to_string(),
                    role: Role::Teacher,
                    student_id: None,
                    last_login: None,
                },
            ];
            self.set(Collection::Users, &users)?;
        }
        if !self.has(Collection::Classes)? {
            let classes = vec![
                Class {
                    id: "c1".to_string(),
                    name: "Grade 1/1".to_string(),
                },
                Class {
                    id: "c2".to_string(),
                    name: "Grade 6/2".to_string(),
                },
            ];
            self.set(Collection::Classes, &classes)?;
        }
        if !self.has(Collection::TestItems)? {
            self.set(Collection::TestItems, &standard_test_items())?;
        }
        if !self.has(Collection::Students)? {
            self.set::<crate::model::Student>(Collection::Students, &[])?;
        }
        if !self.has(Collection::Assignments)? {
            self.set::<crate::model::Assignment>(Collection::Assignments, &[])?;
        }
        if !self.has(Collection::Records)? {
            self.set::<crate::model::FitnessRecord>(Collection::Records, &[])?;
        }
        Ok(())
    }
}
