use anyhow::Result;
use rusqlite::{Connection, Row};

use forkful_types::models::{Gender, UserId};

use super::OptionalExt;
use crate::models::{NewUser, UserRow};

const USER_COLUMNS: &str = "id, name, password, gender, age, role, is_deleted";

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        name: row.get(1)?,
        password: row.get(2)?,
        gender: row.get(3)?,
        age: row.get(4)?,
        role: row.get(5)?,
        is_deleted: row.get(6)?,
    })
}

/// Any user, including soft-deleted ones.
pub fn by_id(conn: &Connection, id: UserId) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
    conn.query_row(&sql, [id], map_user).optional()
}

/// `Some(is_deleted)` when the user row exists.
pub fn deleted_flag(conn: &Connection, id: UserId) -> Result<Option<bool>> {
    conn.query_row("SELECT is_deleted FROM users WHERE id = ?1", [id], |row| {
        row.get(0)
    })
    .optional()
}

pub fn name_taken(conn: &Connection, name: &str) -> Result<bool> {
    let taken = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE name = ?1)",
        [name],
        |row| row.get(0),
    )?;
    Ok(taken)
}

pub fn insert(conn: &Connection, user: &NewUser<'_>) -> Result<()> {
    conn.execute(
        "INSERT INTO users (id, name, password, gender, age) VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            user.id,
            user.name,
            user.password,
            user.gender.as_str(),
            user.age
        ],
    )?;
    Ok(())
}

/// Update whichever of gender and age are supplied.
pub fn update_profile(
    conn: &Connection,
    id: UserId,
    gender: Option<Gender>,
    age: Option<i32>,
) -> Result<usize> {
    let changed = conn.execute(
        "UPDATE users SET gender = COALESCE(?2, gender), age = COALESCE(?3, age) WHERE id = ?1",
        rusqlite::params![id, gender.map(|g| g.as_str()), age],
    )?;
    Ok(changed)
}

pub fn soft_delete(conn: &Connection, id: UserId) -> Result<usize> {
    let changed = conn.execute(
        "UPDATE users SET is_deleted = 1 WHERE id = ?1 AND is_deleted = 0",
        [id],
    )?;
    Ok(changed)
}
