/*!
 * Session module for per-learner dialogues.
 *
 * This module provides:
 * - The dialogue state machine driving quiz and editing flows
 * - Command recognition for menu buttons and slash commands
 * - Learner-facing reply texts
 */

pub mod manager;
pub mod models;
pub mod replies;

// Re-export main types
pub use manager::SessionManager;
pub use models::{Command, DialogueState, LearnerSession};
