pub mod import;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod sequence;

use anyhow::{Result, anyhow};
use rusqlite::{Connection, OpenFlags, Transaction, TransactionBehavior};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

pub use rusqlite;

#[derive(Debug, Clone, Copy)]
pub struct DbOptions {
    pub reader_pool_size: usize,
}

impl Default for DbOptions {
    fn default() -> Self {
        Self {
            reader_pool_size: 4,
        }
    }
}

/// One writer connection plus a pool of read-only connections.
///
/// In-memory databases have no readers; reads then go through the writer.
pub struct Database {
    writer: Mutex<Connection>,
    readers: Vec<Mutex<Connection>>,
    reader_idx: AtomicUsize,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with(path, DbOptions::default())
    }

    pub fn open_with(path: &Path, options: DbOptions) -> Result<Self> {
        let writer = Connection::open(path)?;

        // WAL mode for concurrent reads
        writer.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;
        writer.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&writer)?;

        let mut readers = Vec::with_capacity(options.reader_pool_size);
        for _ in 0..options.reader_pool_size {
            let conn = Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            readers.push(Mutex::new(conn));
        }

        info!(
            "Database opened at {} (1 writer + {} readers)",
            path.display(),
            readers.len()
        );
        Ok(Self {
            writer: Mutex::new(writer),
            readers,
            reader_idx: AtomicUsize::new(0),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let writer = Connection::open_in_memory()?;
        writer.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run(&writer)?;

        Ok(Self {
            writer: Mutex::new(writer),
            readers: Vec::new(),
            reader_idx: AtomicUsize::new(0),
        })
    }

    /// Run a read on one of the pooled reader connections.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        self.read(f)
    }

    /// Like [`Database::with_conn`], for callers with their own error type.
    pub fn read<F, T, E>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&Connection) -> std::result::Result<T, E>,
        E: From<anyhow::Error>,
    {
        let lock = match self.readers.len() {
            0 => &self.writer,
            n => &self.readers[self.reader_idx.fetch_add(1, Ordering::Relaxed) % n],
        };
        let conn = lock
            .lock()
            .map_err(|e| anyhow!("Connection lock poisoned: {}", e))?;
        f(&conn)
    }

    /// Run `f` inside an IMMEDIATE transaction on the writer.
    ///
    /// Commits when `f` returns `Ok`; any `Err` drops the transaction, which rolls it back.
    pub fn transaction<F, T, E>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> std::result::Result<T, E>,
        E: From<anyhow::Error>,
    {
        let mut conn = self
            .writer
            .lock()
            .map_err(|e| anyhow!("Writer lock poisoned: {}", e))?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(anyhow::Error::from)?;
        let value = f(&tx)?;
        tx.commit().map_err(anyhow::Error::from)?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_transaction_leaves_no_rows() {
        let db = Database::open_in_memory().unwrap();

        let result: Result<()> = db.transaction(|tx| {
            tx.execute(
                "INSERT INTO users (id, name, password, gender, age) VALUES (1, 'ann', 'pw', 'Female', 30)",
                [],
            )?;
            Err(anyhow!("abort"))
        });
        assert!(result.is_err());

        let count: i64 = db
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn on_disk_readers_see_committed_writes() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_with(
            &dir.path().join("forkful.db"),
            DbOptions {
                reader_pool_size: 2,
            },
        )
        .unwrap();

        db.transaction(|tx| -> Result<()> {
            tx.execute(
                "INSERT INTO users (id, name, password, gender, age) VALUES (1, 'ann', 'pw', 'Female', 30)",
                [],
            )?;
            Ok(())
        })
        .unwrap();

        for _ in 0..3 {
            let name: String = db
                .with_conn(|conn| {
                    Ok(conn.query_row("SELECT name FROM users WHERE id = 1", [], |r| r.get(0))?)
                })
                .unwrap();
            assert_eq!(name, "ann");
        }
    }
}
