/*!
 * Quiz module: round values and the generator that builds them.
 */

pub mod generator;
pub mod round;

// Re-export main types
pub use generator::QuizRoundGenerator;
pub use round::{Round, RoundId, RoundOption};
