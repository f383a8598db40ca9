/*!
 * End-to-end learner scenarios against an in-memory dictionary
 */

use lexidrill::app_config::{DictionaryConfig, PromptDirection};
use lexidrill::database::models::{Language, RemovalPolicy};
use lexidrill::dictionary::{AddOutcome, DictionaryEditor, RemoveOutcome};
use lexidrill::session::Command;
use lexidrill::{InboundMessage, SessionManager, WordRepository};

use crate::common;

const L1: i64 = 1001;
const L2: i64 = 1002;

/// A fresh learner answers the only pair correctly and the pool is then exhausted
#[tokio::test]
async fn test_scenarioA_correctAnswer_shouldExhaustPool() {
    let repo = common::seeded_repository(&[("Apple", "Яблоко")]).await.unwrap();
    let manager = SessionManager::from_config(
        repo.clone(),
        &common::config_with(PromptDirection::Russian),
    );

    let replies = manager.handle(InboundMessage::command(L1, Command::BeginRound)).await;
    assert_eq!(replies.len(), 1);
    assert!(replies[0].text.contains("Яблоко"));
    assert_eq!(replies[0].option_labels, vec!["Apple".to_string()]);

    let replies = manager
        .handle(common::text(L1, "Apple").for_round(replies[0].round_id.unwrap()))
        .await;

    assert_eq!(replies.len(), 2);
    assert!(replies[0].text.contains("Яблоко -> Apple"));
    assert!(!replies[1].has_round());
    assert!(repo.pick_quiz_pair(L1).await.unwrap().is_none());

    // Other learners still see the pair
    assert!(repo.pick_quiz_pair(L2).await.unwrap().is_some());
}

/// Adding the same English word twice yields Duplicate and one row
#[tokio::test]
async fn test_scenarioB_duplicateAdd_shouldKeepSingleRow() {
    let repo = WordRepository::new_in_memory().unwrap();
    repo.create_learner(L1, "L1").await.unwrap();
    let editor = DictionaryEditor::new(repo.clone(), &DictionaryConfig::default());

    let first = editor.add_word_pair(L1, "Mango", "Манго").await.unwrap();
    let second = editor.add_word_pair(L1, "Mango", "Other").await.unwrap();

    assert!(matches!(first, AddOutcome::Added { .. }));
    assert_eq!(second, AddOutcome::Duplicate);

    let stats = repo.stats().await.unwrap();
    assert_eq!(stats.english_words, 1);
    assert_eq!(stats.russian_words, 1);
    assert_eq!(stats.pairs, 1);
    assert!(repo.find_word(Language::Russian, "Other").await.unwrap().is_none());
}

/// Word count goes 0, 1, then back to 0 through the delete flow
#[tokio::test]
async fn test_scenarioC_wordCount_shouldFollowAddAndDelete() {
    let manager = common::seeded_manager(&[]).await.unwrap();
    let repo = manager.repository().clone();
    manager.handle(common::text(L1, "/start")).await;

    assert_eq!(repo.count_learner_words(L1).await.unwrap(), 0);

    manager.handle(common::text(L1, "Add word")).await;
    manager.handle(common::text(L1, "Table")).await;
    manager.handle(common::text(L1, "Стол")).await;
    assert_eq!(repo.count_learner_words(L1).await.unwrap(), 1);

    manager.handle(common::text(L1, "Delete word")).await;
    let replies = manager.handle(common::text(L1, "Table")).await;
    assert!(replies[0].text.ends_with('0'));
    assert_eq!(repo.count_learner_words(L1).await.unwrap(), 0);
}

/// Deleting then re-adding the identical pair succeeds
#[tokio::test]
async fn test_deleteThenReadd_shouldLeaveNoResidualConflict() {
    for policy in [RemovalPolicy::ReferenceCounted, RemovalPolicy::Unconditional] {
        let repo = WordRepository::new_in_memory().unwrap();
        repo.create_learner(L1, "L1").await.unwrap();
        let config = DictionaryConfig {
            removal_policy: policy,
            ..DictionaryConfig::default()
        };
        let editor = DictionaryEditor::new(repo.clone(), &config);

        editor.add_word_pair(L1, "Hello", "Привет").await.unwrap();
        let removed = editor.remove_word(L1, "Привет").await.unwrap();
        assert!(matches!(removed, RemoveOutcome::Removed { word_count: 0, .. }));

        let readded = editor.add_word_pair(L1, "Hello", "Привет").await.unwrap();
        assert!(
            matches!(readded, AddOutcome::Added { word_count: Some(1), .. }),
            "policy {} failed to re-add",
            policy
        );
        assert_eq!(repo.stats().await.unwrap().pairs, 1);
    }
}

/// Re-adding works even when another learner kept the pair alive
#[tokio::test]
async fn test_deleteThenReadd_withPairLearnedByOther_shouldReattach() {
    let repo = WordRepository::new_in_memory().unwrap();
    repo.create_learner(L1, "L1").await.unwrap();
    repo.create_learner(L2, "L2").await.unwrap();
    let editor = DictionaryEditor::new(repo.clone(), &DictionaryConfig::default());

    let AddOutcome::Added { pair_id, .. } = editor.add_word_pair(L1, "Hello", "Привет").await.unwrap()
    else {
        panic!("expected pair to be added");
    };
    // L2 answered it correctly in a quiz
    repo.record_association(L2, pair_id).await.unwrap();

    let removed = editor.remove_word(L1, "Hello").await.unwrap();
    assert!(matches!(removed, RemoveOutcome::Removed { word_count: 0, .. }));

    let readded = editor.add_word_pair(L1, "Hello", "Привет").await.unwrap();
    assert_eq!(
        readded,
        AddOutcome::Added {
            pair_id,
            word_count: Some(1),
        }
    );
    assert_eq!(repo.count_learner_words(L2).await.unwrap(), 1);
    assert_eq!(repo.stats().await.unwrap().pairs, 1);

    // A mismatched translation still clashes with the kept English word
    let clash = editor.add_word_pair(L1, "Hello", "Здравствуйте").await.unwrap();
    assert_eq!(clash, AddOutcome::Duplicate);
}

/// Removing a seeded word keeps it for everyone else
#[tokio::test]
async fn test_removeSharedPair_withReferenceCounting_shouldKeepSharedRows() {
    let repo = common::seeded_repository(&[("Water", "Вода")]).await.unwrap();
    repo.create_learner(L1, "L1").await.unwrap();
    let pair = repo.pick_quiz_pair(L1).await.unwrap().unwrap();
    repo.record_association(L1, pair.id).await.unwrap();
    let editor = DictionaryEditor::new(repo.clone(), &DictionaryConfig::default());

    let outcome = editor.remove_word(L1, "Water").await.unwrap();

    match outcome {
        RemoveOutcome::Removed { report, .. } => {
            assert_eq!(report.associations_removed, 1);
            assert!(!report.pair_removed);
            assert!(!report.english_word_removed);
        }
        RemoveOutcome::NotFound => panic!("expected removal"),
    }
    assert!(repo.get_pair(pair.id).await.unwrap().is_some());
    // The learner sees the pair in their pool again
    assert_eq!(repo.pick_quiz_pair(L1).await.unwrap().unwrap().id, pair.id);
}

/// Another learner's association to a pair survives one learner deleting it
#[tokio::test]
async fn test_removePair_withSecondLearner_shouldOnlyDropOwnAssociation() {
    let repo = WordRepository::new_in_memory().unwrap();
    repo.create_learner(L1, "L1").await.unwrap();
    repo.create_learner(L2, "L2").await.unwrap();
    let editor = DictionaryEditor::new(repo.clone(), &DictionaryConfig::default());

    let AddOutcome::Added { pair_id, .. } = editor.add_word_pair(L1, "Chair", "Стул").await.unwrap()
    else {
        panic!("expected pair to be added");
    };
    repo.record_association(L2, pair_id).await.unwrap();

    editor.remove_word(L1, "Chair").await.unwrap();

    assert_eq!(repo.count_learner_words(L1).await.unwrap(), 0);
    assert_eq!(repo.count_learner_words(L2).await.unwrap(), 1);
    assert!(repo.find_word(Language::English, "Chair").await.unwrap().is_some());
}
