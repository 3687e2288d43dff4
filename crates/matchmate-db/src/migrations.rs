use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub const SCHEMA_VERSION: i64 = 1;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE user_profiles (
                uid                 TEXT PRIMARY KEY,
                gender              TEXT NOT NULL,
                first_name          TEXT NOT NULL,
                last_name           TEXT NOT NULL,
                city                TEXT NOT NULL,
                state               TEXT NOT NULL,
                phone               TEXT NOT NULL,
                cell                TEXT NOT NULL,
                picture_large       TEXT NOT NULL,
                picture_medium      TEXT NOT NULL,
                picture_thumbnail   TEXT NOT NULL,
                interaction_status  TEXT NOT NULL DEFAULT 'UNSEEN'
            );

            CREATE TABLE history_profiles (
                uid                 TEXT PRIMARY KEY,
                gender              TEXT NOT NULL,
                first_name          TEXT NOT NULL,
                last_name           TEXT NOT NULL,
                city                TEXT NOT NULL,
                state               TEXT NOT NULL,
                phone               TEXT NOT NULL,
                cell                TEXT NOT NULL,
                picture_large       TEXT NOT NULL,
                picture_medium      TEXT NOT NULL,
                picture_thumbnail   TEXT NOT NULL,
                interaction_status  TEXT NOT NULL,
                decided_at          TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_history_decided
                ON history_profiles(decided_at);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete (schema v{})", SCHEMA_VERSION);
    Ok(())
}
