use std::collections::HashSet;

use crate::Database;
use crate::models::{HistoryRow, ProfileRow};
use anyhow::{Result, bail};
use rusqlite::{Connection, OptionalExtension, Row};
use tracing::debug;

const PROFILE_COLUMNS: &str = "uid, gender, first_name, last_name, city, state, phone, cell, \
     picture_large, picture_medium, picture_thumbnail, interaction_status";

impl Database {
    // -- Active profiles --

    /// All active profiles in the order they were cached.
    pub fn get_all_profiles(&self) -> Result<Vec<ProfileRow>> {
        self.with_conn(query_all_profiles)
    }

    pub fn get_profile(&self, uid: &str) -> Result<Option<ProfileRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM user_profiles WHERE uid = ?1", PROFILE_COLUMNS);
            let row = conn.query_row(&sql, [uid], profile_from_row).optional()?;
            Ok(row)
        })
    }

    pub fn count_profiles(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM user_profiles", [], |r| r.get(0))?;
            Ok(n as usize)
        })
    }

    /// Append a batch in one transaction. Rows whose uid is already active
    /// or already in history are skipped; returns how many were added.
    pub fn insert_profiles(&self, profiles: &[ProfileRow]) -> Result<usize> {
        if profiles.is_empty() {
            return Ok(0);
        }

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let mut inserted = 0;
            {
                let sql = format!(
                    "INSERT OR IGNORE INTO user_profiles ({}) \
                     SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12 \
                     WHERE NOT EXISTS (SELECT 1 FROM history_profiles WHERE uid = ?1)",
                    PROFILE_COLUMNS
                );
                let mut stmt = tx.prepare(&sql)?;
                for p in profiles {
                    inserted += stmt.execute(rusqlite::params![
                        p.uid,
                        p.gender,
                        p.first_name,
                        p.last_name,
                        p.city,
                        p.state,
                        p.phone,
                        p.cell,
                        p.picture_large,
                        p.picture_medium,
                        p.picture_thumbnail,
                        p.interaction_status,
                    ])?;
                }
            }
            tx.commit()?;
            Ok(inserted)
        })
    }

    pub fn delete_all_profiles(&self) -> Result<usize> {
        self.with_conn(|conn| Ok(conn.execute("DELETE FROM user_profiles", [])?))
    }

    pub fn delete_profile(&self, uid: &str) -> Result<bool> {
        self.with_conn(|conn| Ok(conn.execute("DELETE FROM user_profiles WHERE uid = ?1", [uid])? > 0))
    }

    // -- History --

    /// History, most recent decision first.
    pub fn get_history(&self) -> Result<Vec<HistoryRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {}, decided_at FROM history_profiles ORDER BY decided_at DESC, rowid DESC",
                PROFILE_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(HistoryRow {
                        profile: profile_from_row(row)?,
                        decided_at: row.get(12)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Every uid the store has seen, active or decided.
    pub fn known_uids(&self) -> Result<HashSet<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT uid FROM user_profiles UNION SELECT uid FROM history_profiles",
            )?;
            let uids = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<HashSet<_>, _>>()?;

            Ok(uids)
        })
    }

    /// Copy the profile into history and drop it from the active table,
    /// both or neither. Fails if the uid is not currently active.
    pub fn move_to_history(&self, profile: &ProfileRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let sql = format!(
                "INSERT OR REPLACE INTO history_profiles ({}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                PROFILE_COLUMNS
            );
            tx.execute(
                &sql,
                rusqlite::params![
                    profile.uid,
                    profile.gender,
                    profile.first_name,
                    profile.last_name,
                    profile.city,
                    profile.state,
                    profile.phone,
                    profile.cell,
                    profile.picture_large,
                    profile.picture_medium,
                    profile.picture_thumbnail,
                    profile.interaction_status,
                ],
            )?;

            let deleted = tx.execute("DELETE FROM user_profiles WHERE uid = ?1", [&profile.uid])?;
            if deleted == 0 {
                // Dropping the transaction rolls back the history insert.
                bail!("Profile not in active table: {}", profile.uid);
            }

            tx.commit()?;
            debug!("Moved {} to history as {}", profile.uid, profile.interaction_status);
            Ok(())
        })
    }
}

fn query_all_profiles(conn: &Connection) -> Result<Vec<ProfileRow>> {
    let sql = format!("SELECT {} FROM user_profiles ORDER BY rowid", PROFILE_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;

    let rows = stmt
        .query_map([], profile_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<ProfileRow> {
    Ok(ProfileRow {
        uid: row.get(0)?,
        gender: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        city: row.get(4)?,
        state: row.get(5)?,
        phone: row.get(6)?,
        cell: row.get(7)?,
        picture_large: row.get(8)?,
        picture_medium: row.get(9)?,
        picture_thumbnail: row.get(10)?,
        interaction_status: row.get(11)?,
    })
}
