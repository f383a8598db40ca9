/*!
 * Database module for persistent storage of the shared dictionary.
 *
 * This module provides SQLite-based persistence for:
 * - English and Russian word pools
 * - Word pairs linking one word of each language
 * - Learners and their per-learner pair associations
 */

pub mod schema;
pub mod connection;
pub mod repository;
pub mod models;

// Re-export main types
pub use connection::DatabaseConnection;
pub use repository::WordRepository;
