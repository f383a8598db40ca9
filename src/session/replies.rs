/*!
 * Learner-facing reply texts.
 */

use crate::errors::InvalidWord;

pub fn greeting(display_name: &str) -> String {
    format!(
        "Hi {} 👋 Let's practice some English. Train at your own pace. \
         Send /cards to start learning.",
        display_name
    )
}

pub fn round_prompt(prompt_text: &str) -> String {
    format!("Choose the translation of the word:\n {}", prompt_text)
}

pub fn correct_answer(prompt_text: &str, answer_text: &str) -> String {
    format!("Great!❤\n{} -> {}", prompt_text, answer_text)
}

pub fn wrong_answer(prompt_text: &str) -> String {
    format!(
        "That's a mistake!\nTry to remember the word {} and try again!",
        prompt_text
    )
}

pub fn no_active_round() -> String {
    "There is no question right now. Send /cards or Next to get one.".to_string()
}

pub fn round_expired() -> String {
    "That question has expired. Here is the current one:".to_string()
}

pub fn pool_exhausted() -> String {
    "You have learned every word in the dictionary! Use Add word to add new ones.".to_string()
}

pub fn ask_new_english_word() -> String {
    "Write a new English word".to_string()
}

pub fn ask_translation(english: &str) -> String {
    format!("Great, the word {} is noted! Now enter its translation", english)
}

/// The count line is left out when the count could not be read
pub fn word_added(russian: &str, word_count: Option<i64>) -> String {
    let added = format!("Great! The new word {} was added to your dictionary!", russian);
    match word_count {
        Some(count) => format!("{}\n\nYour word count ➝ {}", added, count),
        None => added,
    }
}

pub fn word_duplicate() -> String {
    "This word is already in your dictionary!".to_string()
}

pub fn ask_word_to_delete() -> String {
    "Write the word you would like to delete".to_string()
}

pub fn word_removed(text: &str, word_count: i64) -> String {
    format!(
        "The word {} was deleted!\nYour dictionary now holds ➝ {}",
        text, word_count
    )
}

pub fn word_not_found() -> String {
    "This word is not in your dictionary!".to_string()
}

pub fn invalid_word(error: &InvalidWord) -> String {
    match error {
        InvalidWord::Empty => "The word must not be empty, please try again".to_string(),
        InvalidWord::TooLong { max } => {
            format!("The word is too long (at most {} characters), please try again", max)
        }
    }
}

/// Generic apology for storage failures; never carries internal details
pub fn try_again() -> String {
    "Something went wrong on our side. Please try again.".to_string()
}
