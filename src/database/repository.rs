/*!
 * Repository layer for dictionary operations.
 *
 * This module provides the only path to persisted words, pairs, learners and
 * associations. Every query is filtered through a learner's associations where
 * the caller asks for quiz material, and every multi-row write runs inside a
 * single transaction.
 */

use anyhow::Result as AnyResult;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};

use super::connection::DatabaseConnection;
use super::models::{
    AssociatedPair, DictionaryStats, Language, LearnerId, LearnerRecord, PairId, RemovalPolicy,
    RemovalReport, SeedPair, WordId, WordPairRecord, WordRecord,
};
use crate::errors::RepositoryError;

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepositoryError>;

/// Columns selected whenever a pair is read together with both texts
const PAIR_COLUMNS: &str = r#"
    wp.id, wp.english_word_id, wp.russian_word_id, e.text, r.text, wp.shared
"#;

/// Repository for word, pair, learner and association rows
#[derive(Clone)]
pub struct WordRepository {
    /// Database connection
    db: DatabaseConnection,
}

impl WordRepository {
    /// Create a new repository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a repository with an in-memory database (for testing)
    pub fn new_in_memory() -> AnyResult<Self> {
        let db = DatabaseConnection::new_in_memory()?;
        Ok(Self::new(db))
    }

    /// Get the underlying connection
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    fn parse_pair_row(row: &rusqlite::Row) -> rusqlite::Result<WordPairRecord> {
        Ok(WordPairRecord {
            id: row.get(0)?,
            english_word_id: row.get(1)?,
            russian_word_id: row.get(2)?,
            english: row.get(3)?,
            russian: row.get(4)?,
            shared: row.get(5)?,
        })
    }

    // =========================================================================
    // Quiz Selection
    // =========================================================================

    /// Pick a random pair the learner has no association with yet
    ///
    /// Returns `None` once every pair in the dictionary is associated with the learner.
    pub async fn pick_quiz_pair(&self, learner_id: LearnerId) -> RepoResult<Option<WordPairRecord>> {
        self.db
            .execute_async(move |conn| {
                let sql = format!(
                    r#"
                    SELECT {PAIR_COLUMNS}
                    FROM word_pairs wp
                    JOIN english_words e ON e.id = wp.english_word_id
                    JOIN russian_words r ON r.id = wp.russian_word_id
                    WHERE NOT EXISTS (
                        SELECT 1 FROM learner_words lw
                        WHERE lw.word_pair_id = wp.id AND lw.learner_id = ?1
                    )
                    ORDER BY RANDOM()
                    LIMIT 1
                    "#
                );

                let pair = conn
                    .query_row(&sql, [learner_id], Self::parse_pair_row)
                    .optional()?;

                debug!(
                    "Quiz pair for learner {}: {:?}",
                    learner_id,
                    pair.as_ref().map(|p| p.id)
                );
                Ok(pair)
            })
            .await
    }

    /// Pick up to `count` distinct word texts to present as wrong options
    ///
    /// Only words from pairs the learner has no association with are eligible,
    /// and `exclude_text` is never returned.
    pub async fn pick_distractors(
        &self,
        language: Language,
        exclude_text: &str,
        learner_id: LearnerId,
        count: usize,
    ) -> RepoResult<Vec<String>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let exclude_text = exclude_text.to_string();

        self.db
            .execute_async(move |conn| {
                let sql = format!(
                    r#"
                    SELECT text FROM (
                        SELECT DISTINCT w.text AS text
                        FROM {table} w
                        JOIN word_pairs wp ON wp.{column} = w.id
                        WHERE w.text <> ?1
                          AND NOT EXISTS (
                              SELECT 1 FROM learner_words lw
                              WHERE lw.word_pair_id = wp.id AND lw.learner_id = ?2
                          )
                    )
                    ORDER BY RANDOM()
                    LIMIT ?3
                    "#,
                    table = language.words_table(),
                    column = language.pair_column(),
                );

                let mut stmt = conn.prepare(&sql)?;
                let texts = stmt
                    .query_map(params![exclude_text, learner_id, count as i64], |row| {
                        row.get::<_, String>(0)
                    })?
                    .collect::<rusqlite::Result<Vec<String>>>()?;

                debug!(
                    "Picked {} {} distractor(s) for learner {}",
                    texts.len(),
                    language,
                    learner_id
                );
                Ok(texts)
            })
            .await
    }

    // =========================================================================
    // Learner Operations
    // =========================================================================

    /// Check whether a learner row exists
    pub async fn learner_exists(&self, learner_id: LearnerId) -> RepoResult<bool> {
        self.db
            .execute_async(move |conn| {
                conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM learners WHERE id = ?1)",
                    [learner_id],
                    |row| row.get(0),
                )
            })
            .await
    }

    /// Register a learner on first contact
    ///
    /// Fails with `Conflict` when the learner is already registered.
    pub async fn create_learner(&self, learner_id: LearnerId, display_name: &str) -> RepoResult<()> {
        let display_name = display_name.to_string();
        let now = chrono::Utc::now().to_rfc3339();

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    "INSERT INTO learners (id, display_name, created_at) VALUES (?1, ?2, ?3)",
                    params![learner_id, display_name, now],
                )?;
                Ok(())
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Duplicate => RepositoryError::Conflict,
                other => other,
            })
    }

    /// Get a learner by ID
    pub async fn get_learner(&self, learner_id: LearnerId) -> RepoResult<Option<LearnerRecord>> {
        self.db
            .execute_async(move |conn| {
                conn.query_row(
                    "SELECT id, display_name, created_at FROM learners WHERE id = ?1",
                    [learner_id],
                    |row| {
                        Ok(LearnerRecord {
                            id: row.get(0)?,
                            display_name: row.get(1)?,
                            created_at: row.get(2)?,
                        })
                    },
                )
                .optional()
            })
            .await
    }

    // =========================================================================
    // Dictionary Mutations
    // =========================================================================

    /// Insert both words, the pair and the learner's association atomically
    ///
    /// Fails with `Duplicate` if either text already exists in its language; in
    /// that case nothing is written.
    pub async fn add_word_pair(
        &self,
        learner_id: LearnerId,
        english: &str,
        russian: &str,
    ) -> RepoResult<PairId> {
        let english = english.to_string();
        let russian = russian.to_string();

        self.db
            .transaction_async(move |tx| {
                tx.execute("INSERT INTO english_words (text) VALUES (?1)", [&english])?;
                let english_word_id = tx.last_insert_rowid();

                tx.execute("INSERT INTO russian_words (text) VALUES (?1)", [&russian])?;
                let russian_word_id = tx.last_insert_rowid();

                tx.execute(
                    "INSERT INTO word_pairs (english_word_id, russian_word_id, shared) VALUES (?1, ?2, 0)",
                    params![english_word_id, russian_word_id],
                )?;
                let pair_id = tx.last_insert_rowid();

                tx.execute(
                    "INSERT INTO learner_words (learner_id, word_pair_id) VALUES (?1, ?2)",
                    params![learner_id, pair_id],
                )?;

                debug!(
                    "Learner {} added pair {} ({} / {})",
                    learner_id, pair_id, english, russian
                );
                Ok(pair_id)
            })
            .await
    }

    /// Associate an existing pair with a learner, taking it out of their quiz pool
    ///
    /// Returns `false` when the association already existed.
    pub async fn record_association(&self, learner_id: LearnerId, pair_id: PairId) -> RepoResult<bool> {
        self.db
            .execute_async(move |conn| {
                let inserted = conn.execute(
                    "INSERT OR IGNORE INTO learner_words (learner_id, word_pair_id) VALUES (?1, ?2)",
                    params![learner_id, pair_id],
                )?;
                Ok(inserted > 0)
            })
            .await
    }

    /// Bulk-insert shared pairs with no learner association
    ///
    /// Existing word rows are reused and pairs already present are skipped.
    /// Returns the number of pairs created.
    pub async fn seed_pairs(&self, pairs: Vec<SeedPair>) -> RepoResult<usize> {
        self.db
            .transaction_async(move |tx| {
                let mut created = 0;

                for pair in &pairs {
                    let english_word_id = Self::upsert_word(tx, Language::English, &pair.english)?;
                    let russian_word_id = Self::upsert_word(tx, Language::Russian, &pair.russian)?;

                    let exists: bool = tx.query_row(
                        "SELECT EXISTS(SELECT 1 FROM word_pairs WHERE english_word_id = ?1 AND russian_word_id = ?2)",
                        params![english_word_id, russian_word_id],
                        |row| row.get(0),
                    )?;

                    if !exists {
                        tx.execute(
                            "INSERT INTO word_pairs (english_word_id, russian_word_id, shared) VALUES (?1, ?2, 1)",
                            params![english_word_id, russian_word_id],
                        )?;
                        created += 1;
                    }
                }

                debug!("Seeded {} of {} pair(s)", created, pairs.len());
                Ok(created)
            })
            .await
    }

    fn upsert_word(conn: &Connection, language: Language, text: &str) -> rusqlite::Result<WordId> {
        let table = language.words_table();
        conn.execute(
            &format!("INSERT OR IGNORE INTO {table} (text) VALUES (?1)"),
            [text],
        )?;
        conn.query_row(
            &format!("SELECT id FROM {table} WHERE text = ?1"),
            [text],
            |row| row.get(0),
        )
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Locate the pair this learner is associated with under `text` in `language`
    pub async fn find_associated_pair(
        &self,
        learner_id: LearnerId,
        language: Language,
        text: &str,
    ) -> RepoResult<Option<AssociatedPair>> {
        let text = text.to_string();

        self.db
            .execute_async(move |conn| {
                let sql = format!(
                    r#"
                    SELECT wp.id, w.id
                    FROM {table} w
                    JOIN word_pairs wp ON wp.{column} = w.id
                    JOIN learner_words lw ON lw.word_pair_id = wp.id
                    WHERE lw.learner_id = ?1 AND w.text = ?2
                    ORDER BY wp.id
                    LIMIT 1
                    "#,
                    table = language.words_table(),
                    column = language.pair_column(),
                );

                conn.query_row(&sql, params![learner_id, text], |row| {
                    Ok(AssociatedPair {
                        pair_id: row.get(0)?,
                        word_id: row.get(1)?,
                        language,
                    })
                })
                .optional()
            })
            .await
    }

    /// Locate the learner's pair whose English word is `english`
    pub async fn find_associated_pair_by_english(
        &self,
        learner_id: LearnerId,
        english: &str,
    ) -> RepoResult<Option<AssociatedPair>> {
        self.find_associated_pair(learner_id, Language::English, english)
            .await
    }

    /// Locate the learner's pair whose Russian word is `russian`
    pub async fn find_associated_pair_by_russian(
        &self,
        learner_id: LearnerId,
        russian: &str,
    ) -> RepoResult<Option<AssociatedPair>> {
        self.find_associated_pair(learner_id, Language::Russian, russian)
            .await
    }

    /// Return the word id on the side opposite `known_side` for a pair
    pub async fn find_pair_endpoints(
        &self,
        pair_id: PairId,
        known_side: Language,
    ) -> RepoResult<Option<WordId>> {
        self.db
            .execute_async(move |conn| {
                let sql = format!(
                    "SELECT {} FROM word_pairs WHERE id = ?1",
                    known_side.opposite().pair_column()
                );
                conn.query_row(&sql, [pair_id], |row| row.get(0)).optional()
            })
            .await
    }

    /// Get a pair with both texts by ID
    pub async fn get_pair(&self, pair_id: PairId) -> RepoResult<Option<WordPairRecord>> {
        self.db
            .execute_async(move |conn| {
                let sql = format!(
                    r#"
                    SELECT {PAIR_COLUMNS}
                    FROM word_pairs wp
                    JOIN english_words e ON e.id = wp.english_word_id
                    JOIN russian_words r ON r.id = wp.russian_word_id
                    WHERE wp.id = ?1
                    "#
                );
                conn.query_row(&sql, [pair_id], Self::parse_pair_row).optional()
            })
            .await
    }

    /// Get the pair joining exactly these two texts
    pub async fn find_pair_by_texts(
        &self,
        english: &str,
        russian: &str,
    ) -> RepoResult<Option<WordPairRecord>> {
        let english = english.to_string();
        let russian = russian.to_string();

        self.db
            .execute_async(move |conn| {
                let sql = format!(
                    r#"
                    SELECT {PAIR_COLUMNS}
                    FROM word_pairs wp
                    JOIN english_words e ON e.id = wp.english_word_id
                    JOIN russian_words r ON r.id = wp.russian_word_id
                    WHERE e.text = ?1 AND r.text = ?2
                    "#
                );
                conn.query_row(&sql, params![english, russian], Self::parse_pair_row)
                    .optional()
            })
            .await
    }

    /// Get a word row by its text
    pub async fn find_word(&self, language: Language, text: &str) -> RepoResult<Option<WordRecord>> {
        let text = text.to_string();

        self.db
            .execute_async(move |conn| {
                let sql = format!(
                    "SELECT id, text FROM {} WHERE text = ?1",
                    language.words_table()
                );
                conn.query_row(&sql, [text], |row| {
                    Ok(WordRecord {
                        id: row.get(0)?,
                        text: row.get(1)?,
                    })
                })
                .optional()
            })
            .await
    }

    // =========================================================================
    // Removal
    // =========================================================================

    /// Remove a pair from a learner's dictionary
    ///
    /// With `RemovalPolicy::ReferenceCounted` only the learner's association is
    /// always deleted; the pair and each word row go only when nothing else still
    /// references them, and shared pairs are never deleted. With
    /// `RemovalPolicy::Unconditional` every association to the pair, the pair and
    /// both words are deleted; a word still used by another pair makes the whole
    /// removal fail with `ConstraintViolation`.
    pub async fn remove_pair(
        &self,
        learner_id: LearnerId,
        pair_id: PairId,
        english_word_id: WordId,
        russian_word_id: WordId,
        policy: RemovalPolicy,
    ) -> RepoResult<RemovalReport> {
        self.db
            .transaction_async(move |tx| {
                let report = match policy {
                    RemovalPolicy::ReferenceCounted => Self::remove_pair_counted(
                        tx,
                        learner_id,
                        pair_id,
                        english_word_id,
                        russian_word_id,
                    )?,
                    RemovalPolicy::Unconditional => Self::remove_pair_unconditional(
                        tx,
                        pair_id,
                        english_word_id,
                        russian_word_id,
                    )?,
                };

                debug!(
                    "Removed pair {} for learner {} ({}): {:?}",
                    pair_id, learner_id, policy, report
                );
                Ok(report)
            })
            .await
    }

    fn remove_pair_counted(
        conn: &Connection,
        learner_id: LearnerId,
        pair_id: PairId,
        english_word_id: WordId,
        russian_word_id: WordId,
    ) -> rusqlite::Result<RemovalReport> {
        let mut report = RemovalReport {
            associations_removed: conn.execute(
                "DELETE FROM learner_words WHERE learner_id = ?1 AND word_pair_id = ?2",
                params![learner_id, pair_id],
            )?,
            ..RemovalReport::default()
        };

        let still_referenced: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM learner_words WHERE word_pair_id = ?1)",
            [pair_id],
            |row| row.get(0),
        )?;
        let shared: bool = conn
            .query_row("SELECT shared FROM word_pairs WHERE id = ?1", [pair_id], |row| {
                row.get(0)
            })
            .optional()?
            .unwrap_or(false);

        if still_referenced || shared {
            return Ok(report);
        }

        report.pair_removed = conn.execute("DELETE FROM word_pairs WHERE id = ?1", [pair_id])? > 0;
        report.english_word_removed =
            Self::delete_word_if_orphaned(conn, Language::English, english_word_id)?;
        report.russian_word_removed =
            Self::delete_word_if_orphaned(conn, Language::Russian, russian_word_id)?;

        Ok(report)
    }

    fn delete_word_if_orphaned(
        conn: &Connection,
        language: Language,
        word_id: WordId,
    ) -> rusqlite::Result<bool> {
        let sql = format!(
            r#"
            DELETE FROM {table}
            WHERE id = ?1
              AND NOT EXISTS (SELECT 1 FROM word_pairs WHERE {column} = ?1)
            "#,
            table = language.words_table(),
            column = language.pair_column(),
        );
        Ok(conn.execute(&sql, [word_id])? > 0)
    }

    fn remove_pair_unconditional(
        conn: &Connection,
        pair_id: PairId,
        english_word_id: WordId,
        russian_word_id: WordId,
    ) -> rusqlite::Result<RemovalReport> {
        let associations_removed =
            conn.execute("DELETE FROM learner_words WHERE word_pair_id = ?1", [pair_id])?;
        let pair_removed = conn.execute("DELETE FROM word_pairs WHERE id = ?1", [pair_id])? > 0;
        let english_word_removed =
            conn.execute("DELETE FROM english_words WHERE id = ?1", [english_word_id])? > 0;
        let russian_word_removed =
            conn.execute("DELETE FROM russian_words WHERE id = ?1", [russian_word_id])? > 0;

        Ok(RemovalReport {
            associations_removed,
            pair_removed,
            english_word_removed,
            russian_word_removed,
        })
    }

    // =========================================================================
    // Counters
    // =========================================================================

    /// Number of pairs associated with the learner
    pub async fn count_learner_words(&self, learner_id: LearnerId) -> RepoResult<i64> {
        self.db
            .execute_async(move |conn| {
                conn.query_row(
                    "SELECT COUNT(*) FROM learner_words WHERE learner_id = ?1",
                    [learner_id],
                    |row| row.get(0),
                )
            })
            .await
    }

    /// Row counts across the whole dictionary
    pub async fn stats(&self) -> RepoResult<DictionaryStats> {
        self.db
            .execute_async(|conn| {
                let count = |sql: &str| conn.query_row(sql, [], |row| row.get::<_, i64>(0));

                Ok(DictionaryStats {
                    english_words: count("SELECT COUNT(*) FROM english_words")?,
                    russian_words: count("SELECT COUNT(*) FROM russian_words")?,
                    pairs: count("SELECT COUNT(*) FROM word_pairs")?,
                    shared_pairs: count("SELECT COUNT(*) FROM word_pairs WHERE shared = 1")?,
                    learners: count("SELECT COUNT(*) FROM learners")?,
                    associations: count("SELECT COUNT(*) FROM learner_words")?,
                })
            })
            .await
    }
}
