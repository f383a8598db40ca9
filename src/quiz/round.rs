/*!
 * Quiz round value types.
 */

use serde::{Deserialize, Serialize};

use crate::database::models::{Language, PairId};

/// Identifier of a generated round, unique and increasing within a process
pub type RoundId = u64;

/// Marker appended to an option the learner already picked wrongly
pub const REJECTED_MARK: &str = "❌";

/// One selectable answer in a round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOption {
    /// Option text
    pub text: String,
    /// Set once the learner picked this option and it was wrong
    pub rejected: bool,
}

impl RoundOption {
    fn new(text: String) -> Self {
        Self {
            text,
            rejected: false,
        }
    }

    /// Label shown to the learner
    pub fn label(&self) -> String {
        if self.rejected {
            format!("{}{}", self.text, REJECTED_MARK)
        } else {
            self.text.clone()
        }
    }
}

/// A single quiz presentation: a prompt word and shuffled candidate translations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    /// Round identifier
    pub id: RoundId,
    /// Pair the prompt and answer come from
    pub pair_id: PairId,
    /// Language of the prompt word
    pub prompt_language: Language,
    /// Word the learner must translate
    pub prompt_text: String,
    /// The translation that counts as correct
    pub correct_answer_text: String,
    /// Correct answer plus distractors, in presentation order
    pub options: Vec<RoundOption>,
}

impl Round {
    /// Build a round from already de-duplicated, already ordered option texts
    pub(crate) fn new(
        id: RoundId,
        pair_id: PairId,
        prompt_language: Language,
        prompt_text: String,
        correct_answer_text: String,
        option_texts: Vec<String>,
    ) -> Self {
        Self {
            id,
            pair_id,
            prompt_language,
            prompt_text,
            correct_answer_text,
            options: option_texts.into_iter().map(RoundOption::new).collect(),
        }
    }

    /// Language the answer is expected in
    pub fn answer_language(&self) -> Language {
        self.prompt_language.opposite()
    }

    /// Option texts in presentation order
    pub fn option_texts(&self) -> Vec<&str> {
        self.options.iter().map(|o| o.text.as_str()).collect()
    }

    /// Number of options, the correct answer included
    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    /// Option labels in presentation order, rejected ones marked
    pub fn option_labels(&self) -> Vec<String> {
        self.options.iter().map(RoundOption::label).collect()
    }

    /// Exact-text answer check
    ///
    /// No normalization happens here; transports trim input before it arrives.
    pub fn is_correct(&self, answer: &str) -> bool {
        answer == self.correct_answer_text
    }

    /// Mark the option matching `answer` as rejected
    ///
    /// Accepts the bare text or a label that already carries the rejection
    /// mark. Returns `false` when no displayed option matches.
    pub fn reject(&mut self, answer: &str) -> bool {
        let bare = answer.strip_suffix(REJECTED_MARK).unwrap_or(answer);
        match self
            .options
            .iter_mut()
            .find(|o| o.text == bare && o.text != self.correct_answer_text)
        {
            Some(option) => {
                option.rejected = true;
                true
            }
            None => false,
        }
    }
}
