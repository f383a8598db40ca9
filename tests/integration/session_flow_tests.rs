/*!
 * Session engine tests: concurrency, stale rounds and the serve loop
 */

use std::sync::Arc;
use std::time::Duration;

use lexidrill::app_config::PromptDirection;
use lexidrill::session::{replies, Command, DialogueState};
use lexidrill::database::DatabaseConnection;
use lexidrill::{Controller, InboundMessage, SessionManager, WordRepository};

use crate::common::{self, ScriptedTransport};

/// Different learners progress independently when handled concurrently
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrentLearners_shouldNotInterfere() {
    let manager = Arc::new(common::seeded_manager(&common::FRUITS).await.unwrap());

    let mut tasks = Vec::new();
    for learner_id in 1..=8i64 {
        let manager = Arc::clone(&manager);
        tasks.push(tokio::spawn(async move {
            manager
                .handle(InboundMessage::command(learner_id, Command::BeginRound))
                .await;
            let round = manager.active_round(learner_id).await.unwrap();
            let replies = manager
                .handle(common::text(learner_id, &round.correct_answer_text).for_round(round.id))
                .await;
            (learner_id, round.pair_id, replies.len())
        }));
    }

    for task in tasks {
        let (learner_id, pair_id, reply_count) = task.await.unwrap();
        assert_eq!(reply_count, 2);
        let repo = manager.repository();
        assert_eq!(repo.count_learner_words(learner_id).await.unwrap(), 1);
        let next = manager.active_round(learner_id).await.unwrap();
        assert_ne!(next.pair_id, pair_id);
    }
    assert_eq!(manager.active_sessions(), 8);
}

/// Messages from one learner racing each other are applied one at a time
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_duplicateDelivery_sameLearner_shouldAwardOnce() {
    let manager = Arc::new(common::seeded_manager(&common::FRUITS).await.unwrap());
    manager
        .handle(InboundMessage::command(5, Command::BeginRound))
        .await;
    let round = manager.active_round(5).await.unwrap();

    let answer = common::text(5, &round.correct_answer_text).for_round(round.id);
    let first = tokio::spawn({
        let manager = Arc::clone(&manager);
        let answer = answer.clone();
        async move { manager.handle(answer).await }
    });
    let second = tokio::spawn({
        let manager = Arc::clone(&manager);
        async move { manager.handle(answer).await }
    });

    let mut outcomes = vec![first.await.unwrap(), second.await.unwrap()];
    outcomes.sort_by_key(|replies| replies.len());

    // One delivery wins, the other hits the next round's id check
    assert_eq!(outcomes[1].len(), 2);
    assert_eq!(outcomes[0].len(), 1);
    assert!(outcomes[0][0].text.starts_with(&replies::round_expired()));
    assert_eq!(manager.repository().count_learner_words(5).await.unwrap(), 1);
}

/// An answer tagged with an older round leaves the active round alone
#[tokio::test]
async fn test_staleAnswer_shouldNotCountForNewRound() {
    let manager = common::seeded_manager(&common::FRUITS).await.unwrap();

    manager.handle(InboundMessage::command(9, Command::BeginRound)).await;
    let old = manager.active_round(9).await.unwrap();
    manager.handle(InboundMessage::command(9, Command::Next)).await;
    let current = manager.active_round(9).await.unwrap();
    assert!(current.id > old.id);

    let replies = manager
        .handle(common::text(9, &current.correct_answer_text).for_round(old.id))
        .await;

    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].round_id, Some(current.id));
    assert_eq!(manager.repository().count_learner_words(9).await.unwrap(), 0);
}

/// Deleting the word of the active round clears a round that would dangle
#[tokio::test]
async fn test_deleteActiveRoundWord_shouldDropRound() {
    let manager = common::seeded_manager(&[]).await.unwrap();
    manager.handle(common::text(3, "Add word")).await;
    manager.handle(common::text(3, "Cat")).await;
    manager.handle(common::text(3, "Кошка")).await;

    // Another learner owns the pair only through the shared pool
    let repo = manager.repository().clone();
    repo.create_learner(4, "Other").await.unwrap();
    let other = SessionManager::from_config(repo.clone(), &common::config_with(PromptDirection::English));
    other.handle(InboundMessage::command(4, Command::BeginRound)).await;
    assert_eq!(other.active_round(4).await.unwrap().prompt_text, "Cat");

    manager.handle(common::text(3, "Delete word")).await;
    manager.handle(common::text(3, "Cat")).await;

    let replies = other.handle(common::text(4, "Кошка")).await;
    // The pair is gone; the learner is told to move on rather than shown an error
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[1].text, replies::pool_exhausted());
}

/// The serve loop feeds every message through and delivers every reply in order
#[tokio::test]
async fn test_serve_withScriptedTransport_shouldDeliverReplies() {
    let repo = common::seeded_repository(&[("Apple", "Яблоко")]).await.unwrap();
    let controller = Controller::with_repository(common::config_with(PromptDirection::English), repo);
    let mut transport = ScriptedTransport::new(vec![
        common::text(1, "/start"),
        common::text(1, "/cards"),
        common::text(1, "Банан"),
        common::text(1, "Яблоко"),
        common::text(1, "Add word"),
        common::text(1, "Cat"),
        common::text(1, "Кошка"),
    ]);

    let handled = controller.serve(&mut transport).await.unwrap();

    assert_eq!(handled, 7);
    let texts = transport.sent_texts();
    assert!(texts[0].contains("Learner 1"));
    assert!(texts[1].contains("Apple"));
    assert_eq!(texts[2], replies::wrong_answer("Apple"));
    assert_eq!(texts[3], replies::correct_answer("Apple", "Яблоко"));
    assert_eq!(texts[4], replies::pool_exhausted());
    assert_eq!(texts[5], replies::ask_new_english_word());
    assert_eq!(texts[6], replies::ask_translation("Cat"));
    assert_eq!(texts[7], replies::word_added("Кошка", Some(2)));
    assert_eq!(
        controller.manager().dialogue_state(1).await,
        Some(DialogueState::Idle)
    );
}

/// A storage failure mid-flow keeps the pending text for a retry
#[tokio::test]
async fn test_storageFailure_duringAdd_shouldKeepFlowState() {
    let repo = WordRepository::new_in_memory().unwrap();
    let manager = SessionManager::from_config(repo.clone(), &common::config_with(PromptDirection::English));

    manager.handle(common::text(6, "Add word")).await;
    manager.handle(common::text(6, "Cat")).await;

    repo.connection()
        .execute(|conn| conn.execute_batch("DROP TABLE learner_words"))
        .unwrap();
    let replies = manager.handle(common::text(6, "Кошка")).await;

    assert_eq!(replies[0].text, replies::try_again());
    assert_eq!(
        manager.dialogue_state(6).await,
        Some(DialogueState::AwaitingNewRussianWord)
    );
}

/// A locked database is a transient failure: the learner retries and the add goes through
#[tokio::test]
async fn test_busyDatabase_duringAdd_shouldSucceedOnRetry() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("words.db");
    let db = DatabaseConnection::new(&path, Duration::ZERO).unwrap();
    let repo = WordRepository::new(db);
    let manager = SessionManager::from_config(repo.clone(), &common::config_with(PromptDirection::English));

    manager.handle(common::text(6, "Add word")).await;
    manager.handle(common::text(6, "Cat")).await;

    let writer = rusqlite::Connection::open(&path).unwrap();
    writer.execute_batch("BEGIN IMMEDIATE").unwrap();
    let replies = manager.handle(common::text(6, "Кошка")).await;

    assert_eq!(replies[0].text, replies::try_again());
    assert_eq!(
        manager.dialogue_state(6).await,
        Some(DialogueState::AwaitingNewRussianWord)
    );

    writer.execute_batch("ROLLBACK").unwrap();
    let replies = manager.handle(common::text(6, "Кошка")).await;

    assert_eq!(replies[0].text, replies::word_added("Кошка", Some(1)));
    assert_eq!(manager.dialogue_state(6).await, Some(DialogueState::Idle));
}
