/*!
 * # Lexidrill - English/Russian vocabulary drills
 *
 * A Rust library for running flashcard-style vocabulary quizzes against a
 * shared bilingual dictionary, with per-learner progress.
 *
 * ## Features
 *
 * - Shared English/Russian word-pair dictionary stored in SQLite
 * - Multiple-choice rounds that never repeat a pair a learner already knows
 * - Per-learner dialogue sessions for answering, adding and deleting words
 * - Reference-counted removal that keeps vocabulary other learners rely on
 * - Pluggable message transports with a console implementation
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `database`: SQLite persistence:
 *   - `database::connection`: Connection handling and async execution
 *   - `database::schema`: Tables, indexes and migrations
 *   - `database::repository`: The word repository
 * - `quiz`: Round values and round generation
 * - `dictionary`: Add/delete orchestration and the starter vocabulary
 * - `session`: The per-learner dialogue state machine
 * - `transport`: Message boundary and the console transport
 * - `app_controller`: Main application controller
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod database;
pub mod dictionary;
pub mod errors;
pub mod quiz;
pub mod session;
pub mod transport;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::Controller;
pub use database::WordRepository;
pub use dictionary::DictionaryEditor;
pub use errors::{InvalidWord, RepositoryError};
pub use quiz::{QuizRoundGenerator, Round};
pub use session::SessionManager;
pub use transport::{ConsoleTransport, InboundMessage, OutboundMessage, Transport};
