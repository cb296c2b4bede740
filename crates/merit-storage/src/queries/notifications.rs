// SPDX-FileCopyrightText: 2026 Merit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification outbox reads. Rows are written by the award ledger.

use std::str::FromStr;

use merit_core::MeritError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{Notification, NotificationKind, UserId};

fn notification_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Notification> {
    let kind: String = row.get(2)?;
    let kind = NotificationKind::from_str(&kind).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Notification {
        id: row.get(0)?,
        user_id: UserId(row.get(1)?),
        kind,
        subject_slug: row.get(3)?,
        title: row.get(4)?,
        message: row.get(5)?,
        is_read: row.get(6)?,
        created_at: row.get(7)?,
    })
}

/// Most recent notifications for the user, newest first.
pub async fn for_user(
    db: &Database,
    user: UserId,
    limit: usize,
    unread_only: bool,
) -> Result<Vec<Notification>, MeritError> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, notification_type, subject_slug, title, message, \
                 is_read, created_at \
                 FROM achievement_notifications \
                 WHERE user_id = ?1 AND (?2 = 0 OR is_read = 0) \
                 ORDER BY id DESC LIMIT ?3",
            )?;
            let rows = stmt.query_map(params![user.0, unread_only, limit], notification_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Mark one of the user's notifications read. Returns `false` if no such
/// notification belongs to the user.
pub async fn mark_read(db: &Database, user: UserId, id: i64) -> Result<bool, MeritError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE achievement_notifications SET is_read = 1 WHERE id = ?1 AND user_id = ?2",
                params![id, user.0],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Number of unread notifications for the user.
pub async fn unread_count(db: &Database, user: UserId) -> Result<u64, MeritError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM achievement_notifications WHERE user_id = ?1 AND is_read = 0",
                params![user.0],
                |row| row.get(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_db() -> Database {
        let db = Database::open_in_memory().await.unwrap();
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch(
                    "INSERT INTO achievement_notifications \
                         (user_id, notification_type, subject_slug, title, message) \
                     VALUES (1, 'achievement_unlocked', 'first-steps', 'Achievement Unlocked!', 'a'), \
                            (1, 'level_up', NULL, 'Level Up!', 'b'), \
                            (2, 'badge_earned', 'collector', 'Badge Earned!', 'c');",
                )
            })
            .await
            .unwrap();
        db
    }

    #[tokio::test]
    async fn for_user_returns_newest_first() {
        let db = setup_db().await;
        let list = for_user(&db, UserId(1), 10, false).await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].kind, NotificationKind::LevelUp);
        assert!(list[0].subject_slug.is_none());
        assert_eq!(list[1].subject_slug.as_deref(), Some("first-steps"));
    }

    #[tokio::test]
    async fn mark_read_is_scoped_to_owner() {
        let db = setup_db().await;
        let theirs = for_user(&db, UserId(2), 10, false).await.unwrap()[0].id;
        assert!(!mark_read(&db, UserId(1), theirs).await.unwrap());

        let mine = for_user(&db, UserId(1), 10, false).await.unwrap()[0].id;
        assert!(mark_read(&db, UserId(1), mine).await.unwrap());
        assert_eq!(unread_count(&db, UserId(1)).await.unwrap(), 1);
        assert_eq!(for_user(&db, UserId(1), 10, true).await.unwrap().len(), 1);
    }
}
