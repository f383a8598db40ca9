/*!
 * Tests for command recognition and reply texts
 */

use lexidrill::errors::InvalidWord;
use lexidrill::session::replies;
use lexidrill::session::{Command, DialogueState, LearnerSession};

#[test]
fn test_commandParse_withOriginalRussianButtons_shouldMatch() {
    assert_eq!(Command::parse("Добавить слово ➕"), Some(Command::AddWord));
    assert_eq!(Command::parse("Удалить слово 🗑️"), Some(Command::DeleteWord));
    assert_eq!(Command::parse("Дальше ⏩"), Some(Command::Next));
}

#[test]
fn test_commandParse_withWordsThatLookSimilar_shouldNotMatch() {
    assert_eq!(Command::parse("Nextdoor"), None);
    assert_eq!(Command::parse("add"), None);
    assert_eq!(Command::parse("/startle"), None);
}

#[test]
fn test_newSession_shouldStartIdleAndUnregistered() {
    let session = LearnerSession::new(42);

    assert_eq!(session.learner_id, 42);
    assert_eq!(session.state, DialogueState::Idle);
    assert!(session.round.is_none());
    assert!(session.pending_english.is_none());
    assert!(!session.registered);
}

#[test]
fn test_replies_shouldCarryCountsAndWords() {
    assert!(replies::word_added("Кошка", Some(3)).contains("Кошка"));
    assert!(replies::word_added("Кошка", Some(3)).ends_with("3"));
    assert!(replies::word_added("Кошка", None).ends_with("dictionary!"));
    assert!(replies::word_removed("Cat", 0).ends_with("0"));
    assert!(replies::correct_answer("Apple", "Яблоко").contains("Apple -> Яблоко"));
    assert!(replies::invalid_word(&InvalidWord::TooLong { max: 5 }).contains('5'));
}

#[test]
fn test_tryAgain_shouldNotLeakDetails() {
    let text = replies::try_again();
    assert!(!text.to_lowercase().contains("sql"));
    assert!(!text.contains("Error"));
}
