/*!
 * Dictionary editing: learner add/delete flows and the starter vocabulary.
 */

pub mod editor;
pub mod seed;

// Re-export main types
pub use editor::{AddOutcome, DictionaryEditor, RemoveOutcome};
pub use seed::{default_seed, load_seed_file};
