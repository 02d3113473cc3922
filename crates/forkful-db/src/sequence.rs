//! Per-entity id counters.
//!
//! Ids are handed out by incrementing a row in `id_sequences` inside the caller's
//! write transaction, so two concurrent creations can never observe the same id.

use anyhow::Result;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    User,
    Recipe,
    Review,
}

impl IdKind {
    fn table(&self) -> &'static str {
        match self {
            IdKind::User => "users",
            IdKind::Recipe => "recipes",
            IdKind::Review => "reviews",
        }
    }
}

/// Allocate the next id. Must run inside a write transaction.
pub fn next_id(conn: &Connection, kind: IdKind) -> Result<i64> {
    let id = conn.query_row(
        "UPDATE id_sequences SET last_id = last_id + 1 WHERE entity = ?1 RETURNING last_id",
        [kind.table()],
        |row| row.get(0),
    )?;
    Ok(id)
}

/// Move the counter past every id already present in the entity's table.
pub fn advance_past_existing(conn: &Connection, kind: IdKind) -> Result<()> {
    let sql = format!(
        "UPDATE id_sequences
         SET last_id = MAX(last_id, (SELECT COALESCE(MAX(id), 0) FROM {}))
         WHERE entity = ?1",
        kind.table()
    );
    conn.execute(&sql, [kind.table()])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations;

    #[test]
    fn ids_are_sequential_per_kind() {
        let conn = Connection::open_in_memory().unwrap();
        migrations::run(&conn).unwrap();

        assert_eq!(next_id(&conn, IdKind::User).unwrap(), 1);
        assert_eq!(next_id(&conn, IdKind::User).unwrap(), 2);
        assert_eq!(next_id(&conn, IdKind::Recipe).unwrap(), 1);
    }

    #[test]
    fn advancing_skips_existing_rows() {
        let conn = Connection::open_in_memory().unwrap();
        migrations::run(&conn).unwrap();
        conn.execute(
            "INSERT INTO users (id, name, password, age) VALUES (41, 'ann', 'pw', 30)",
            [],
        )
        .unwrap();

        advance_past_existing(&conn, IdKind::User).unwrap();
        assert_eq!(next_id(&conn, IdKind::User).unwrap(), 42);

        // never moves backwards
        advance_past_existing(&conn, IdKind::User).unwrap();
        assert_eq!(next_id(&conn, IdKind::User).unwrap(), 43);
    }
}
