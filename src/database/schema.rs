/*!
 * Database schema definitions and migrations.
 *
 * This module contains the SQL schema for the dictionary tables
 * and handles schema migrations for version upgrades.
 */

use log::{debug, info};
use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// Initialize the database schema
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        info!("Initializing database schema v{}", SCHEMA_VERSION);
        create_all_tables(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if current_version < SCHEMA_VERSION {
        info!(
            "Migrating database schema from v{} to v{}",
            current_version, SCHEMA_VERSION
        );
        migrate_schema(conn, current_version)?;
    } else {
        debug!("Database schema is up to date (v{})", current_version);
    }

    Ok(())
}

/// Get the current schema version from the database
fn get_schema_version(conn: &Connection) -> rusqlite::Result<i32> {
    let table_exists: bool = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_version'",
        [],
        |row| row.get(0),
    )?;

    if !table_exists {
        return Ok(0);
    }

    let version: i32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .unwrap_or(0);

    Ok(version)
}

/// Set the schema version in the database
fn set_schema_version(conn: &Connection, version: i32) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (id, version, updated_at) VALUES (1, ?1, datetime('now'))",
        [version],
    )?;
    Ok(())
}

/// Create all database tables
fn create_all_tables(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )?;

    // Global vocabulary pools, one per language
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS english_words (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            text TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS russian_words (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            text TEXT NOT NULL UNIQUE
        );
        "#,
    )?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS word_pairs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            english_word_id INTEGER NOT NULL REFERENCES english_words(id),
            russian_word_id INTEGER NOT NULL REFERENCES russian_words(id),
            shared INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_word_pairs_english ON word_pairs(english_word_id);
        CREATE INDEX IF NOT EXISTS idx_word_pairs_russian ON word_pairs(russian_word_id);
        "#,
    )?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS learners (
            id INTEGER PRIMARY KEY,
            display_name TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        "#,
    )?;

    create_learner_words_table(conn)?;

    Ok(())
}

fn create_learner_words_table(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS learner_words (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            learner_id INTEGER NOT NULL REFERENCES learners(id),
            word_pair_id INTEGER NOT NULL REFERENCES word_pairs(id),
            UNIQUE(learner_id, word_pair_id)
        );

        CREATE INDEX IF NOT EXISTS idx_learner_words_pair ON learner_words(word_pair_id);
        "#,
    )
}

/// Migrate schema from an older version
fn migrate_schema(conn: &Connection, from_version: i32) -> rusqlite::Result<()> {
    if from_version < 2 {
        // v1 lacked the shared flag and allowed duplicate associations
        info!("Applying migration v1 -> v2");
        conn.execute_batch(
            r#"
            ALTER TABLE word_pairs ADD COLUMN shared INTEGER NOT NULL DEFAULT 0;

            DELETE FROM learner_words
            WHERE id NOT IN (
                SELECT MIN(id) FROM learner_words GROUP BY learner_id, word_pair_id
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_learner_words_unique
                ON learner_words(learner_id, word_pair_id);
            CREATE INDEX IF NOT EXISTS idx_learner_words_pair ON learner_words(word_pair_id);
            "#,
        )?;
    }

    set_schema_version(conn, SCHEMA_VERSION)?;
    Ok(())
}
