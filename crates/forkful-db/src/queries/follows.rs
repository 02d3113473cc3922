use anyhow::Result;
use rusqlite::Connection;

use forkful_types::models::UserId;

use crate::models::FollowCountRow;

pub fn exists(conn: &Connection, follower: UserId, followee: UserId) -> Result<bool> {
    let found = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM user_follows WHERE follower_id = ?1 AND followee_id = ?2)",
        [follower, followee],
        |row| row.get(0),
    )?;
    Ok(found)
}

pub fn insert(conn: &Connection, follower: UserId, followee: UserId) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO user_follows (follower_id, followee_id) VALUES (?1, ?2)",
        [follower, followee],
    )?;
    Ok(())
}

pub fn delete(conn: &Connection, follower: UserId, followee: UserId) -> Result<usize> {
    let removed = conn.execute(
        "DELETE FROM user_follows WHERE follower_id = ?1 AND followee_id = ?2",
        [follower, followee],
    )?;
    Ok(removed)
}

/// Remove every edge touching `user`, in either direction.
pub fn delete_all_for(conn: &Connection, user: UserId) -> Result<usize> {
    let removed = conn.execute(
        "DELETE FROM user_follows WHERE follower_id = ?1 OR followee_id = ?1",
        [user],
    )?;
    Ok(removed)
}

pub fn follower_count(conn: &Connection, user: UserId) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM user_follows WHERE followee_id = ?1",
        [user],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn following_count(conn: &Connection, user: UserId) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM user_follows WHERE follower_id = ?1",
        [user],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Users following `user`, ascending.
pub fn followers(conn: &Connection, user: UserId) -> Result<Vec<UserId>> {
    let mut stmt = conn.prepare(
        "SELECT follower_id FROM user_follows WHERE followee_id = ?1 ORDER BY follower_id ASC",
    )?;
    let ids = stmt
        .query_map([user], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(ids)
}

/// Users `user` follows, ascending.
pub fn following(conn: &Connection, user: UserId) -> Result<Vec<UserId>> {
    let mut stmt = conn.prepare(
        "SELECT followee_id FROM user_follows WHERE follower_id = ?1 ORDER BY followee_id ASC",
    )?;
    let ids = stmt
        .query_map([user], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(ids)
}

/// Follower/following counts for active users who follow at least one account.
pub fn ratio_candidates(conn: &Connection) -> Result<Vec<FollowCountRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, followers, following FROM (
             SELECT u.id AS id, u.name AS name,
                    (SELECT COUNT(*) FROM user_follows f WHERE f.followee_id = u.id) AS followers,
                    (SELECT COUNT(*) FROM user_follows f WHERE f.follower_id = u.id) AS following
             FROM users u
             WHERE u.is_deleted = 0
         )
         WHERE following > 0
         ORDER BY id ASC",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(FollowCountRow {
                user_id: row.get(0)?,
                name: row.get(1)?,
                followers: row.get(2)?,
                following: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
