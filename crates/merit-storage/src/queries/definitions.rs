// SPDX-FileCopyrightText: 2026 Merit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Achievement and badge definitions.
//!
//! Definitions are authored outside the engine; apart from [`insert`], used
//! by seeding and admin tooling, everything here is read-only.

use std::str::FromStr;

use merit_core::MeritError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{Definition, Namespace, NewDefinition, Rarity};

pub(crate) const DEFINITION_COLUMNS: &str = "id, slug, name, description, category, rarity, \
     requirement_type, requirement_value, xp_reward, points_reward, is_active, sort_order";

/// Table holding the definitions of `ns`.
pub(crate) fn table(ns: Namespace) -> &'static str {
    match ns {
        Namespace::Achievement => "achievements",
        Namespace::Badge => "badges",
    }
}

/// Map a row selected with [`DEFINITION_COLUMNS`], starting at column `at`.
pub(crate) fn definition_from_row(row: &rusqlite::Row<'_>, at: usize) -> rusqlite::Result<Definition> {
    let rarity: String = row.get(at + 5)?;
    Ok(Definition {
        id: row.get(at)?,
        slug: row.get(at + 1)?,
        name: row.get(at + 2)?,
        description: row.get(at + 3)?,
        category: row.get(at + 4)?,
        rarity: Rarity::from_str(&rarity).unwrap_or_default(),
        requirement_type: row.get(at + 6)?,
        requirement_value: row.get(at + 7)?,
        xp_reward: row.get(at + 8)?,
        points_reward: row.get(at + 9)?,
        is_active: row.get(at + 10)?,
        sort_order: row.get(at + 11)?,
    })
}

/// Active definitions in evaluation order (sort_order, then id).
pub async fn active(db: &Database, ns: Namespace) -> Result<Vec<Definition>, MeritError> {
    let sql = format!(
        "SELECT {DEFINITION_COLUMNS} FROM {} WHERE is_active = 1 ORDER BY sort_order, id",
        table(ns)
    );
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([], |row| definition_from_row(row, 0))?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Every definition, active or not, ordered by id.
pub async fn all(db: &Database, ns: Namespace) -> Result<Vec<Definition>, MeritError> {
    let sql = format!("SELECT {DEFINITION_COLUMNS} FROM {} ORDER BY id", table(ns));
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([], |row| definition_from_row(row, 0))?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Active definition with this slug, if any.
pub async fn find_active(
    db: &Database,
    ns: Namespace,
    slug: &str,
) -> Result<Option<Definition>, MeritError> {
    let sql = format!(
        "SELECT {DEFINITION_COLUMNS} FROM {} WHERE slug = ?1 AND is_active = 1",
        table(ns)
    );
    let slug = slug.to_string();
    db.connection()
        .call(move |conn| {
            match conn.query_row(&sql, params![slug], |row| definition_from_row(row, 0)) {
                Ok(def) => Ok(Some(def)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert a definition. Returns its id.
pub async fn insert(db: &Database, ns: Namespace, def: &NewDefinition) -> Result<i64, MeritError> {
    let sql = format!(
        "INSERT INTO {} (slug, name, description, category, rarity, requirement_type, \
         requirement_value, xp_reward, points_reward, is_active, sort_order) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        table(ns)
    );
    let def = def.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                &sql,
                params![
                    def.slug,
                    def.name,
                    def.description,
                    def.category,
                    def.rarity.to_string(),
                    def.requirement_type,
                    def.requirement_value,
                    def.xp_reward,
                    def.points_reward,
                    def.is_active,
                    def.sort_order,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}
