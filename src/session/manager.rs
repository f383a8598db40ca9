/*!
 * Per-learner dialogue engine.
 *
 * This module handles:
 * - First-contact learner registration
 * - Quiz rounds: presenting, checking answers, auto-advancing
 * - The two-step add flow and the delete flow
 * - Idle session eviction
 *
 * Sessions live in a registry keyed by learner id. The registry lock is only
 * held to look a session up; each session has its own async mutex, so one
 * learner's messages are handled strictly in order while different learners
 * proceed independently.
 */

use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::Config;
use crate::database::models::LearnerId;
use crate::database::repository::{RepoResult, WordRepository};
use crate::dictionary::{AddOutcome, DictionaryEditor, RemoveOutcome};
use crate::errors::RepositoryError;
use crate::quiz::{QuizRoundGenerator, Round};
use crate::transport::{InboundMessage, OutboundMessage};

use super::models::{Command, DialogueState, LearnerSession};
use super::replies;

type SessionHandle = Arc<tokio::sync::Mutex<LearnerSession>>;

/// Session manager driving every learner's dialogue
pub struct SessionManager {
    /// Repository for learner registration and association bookkeeping
    repo: WordRepository,
    /// Round builder
    generator: QuizRoundGenerator,
    /// Add/delete orchestration
    editor: DictionaryEditor,
    /// Live sessions
    sessions: Mutex<HashMap<LearnerId, SessionHandle>>,
    /// Eviction threshold
    idle_timeout: Option<Duration>,
}

impl SessionManager {
    /// Create a session manager from its collaborators
    pub fn new(
        repo: WordRepository,
        generator: QuizRoundGenerator,
        editor: DictionaryEditor,
        idle_timeout: Option<Duration>,
    ) -> Self {
        Self {
            repo,
            generator,
            editor,
            sessions: Mutex::new(HashMap::new()),
            idle_timeout,
        }
    }

    /// Create a session manager wired from configuration
    pub fn from_config(repo: WordRepository, config: &Config) -> Self {
        let generator = QuizRoundGenerator::new(repo.clone(), &config.quiz);
        let editor = DictionaryEditor::new(repo.clone(), &config.dictionary);
        Self::new(repo, generator, editor, config.session.idle_timeout())
    }

    /// Create a session manager with an in-memory database (for testing)
    pub fn new_in_memory() -> anyhow::Result<Self> {
        let repo = WordRepository::new_in_memory()?;
        Ok(Self::from_config(repo, &Config::default()))
    }

    /// Get the underlying repository
    pub fn repository(&self) -> &WordRepository {
        &self.repo
    }

    // =========================================================================
    // Message Handling
    // =========================================================================

    /// Handle one inbound message and return the replies to send, in order
    ///
    /// Never fails: storage problems turn into a generic apology and are logged.
    pub async fn handle(&self, message: InboundMessage) -> Vec<OutboundMessage> {
        let learner_id = message.sender_id;
        let handle = self.session_for(learner_id);
        let mut session = handle.lock().await;
        session.touch();

        let state_before = session.state;
        match self.dispatch(&mut session, &message).await {
            Ok(replies) => {
                if session.state != state_before {
                    debug!(
                        "Learner {}: {} -> {}",
                        learner_id, state_before, session.state
                    );
                }
                replies
            }
            Err(e) if e.is_transient() => {
                warn!(
                    "Storage busy while handling learner {} in state {}: {}",
                    learner_id, session.state, e
                );
                vec![OutboundMessage::text(learner_id, replies::try_again())]
            }
            Err(e) => {
                error!(
                    "Failed to handle message from learner {} in state {}: {}",
                    learner_id, session.state, e
                );
                vec![OutboundMessage::text(learner_id, replies::try_again())]
            }
        }
    }

    async fn dispatch(
        &self,
        session: &mut LearnerSession,
        message: &InboundMessage,
    ) -> RepoResult<Vec<OutboundMessage>> {
        self.ensure_registered(session, &message.display_name).await?;

        if let Some(command) = message.command.or_else(|| Command::parse(&message.text)) {
            return self.handle_command(session, command, message).await;
        }

        match session.state {
            DialogueState::Idle => self.handle_answer(session, message).await,
            DialogueState::AwaitingNewEnglishWord => Ok(self.handle_new_english(session, &message.text)),
            DialogueState::AwaitingNewRussianWord => self.handle_new_russian(session, &message.text).await,
            DialogueState::AwaitingWordToDelete => self.handle_delete_target(session, &message.text).await,
        }
    }

    /// Create the learner row on first contact
    async fn ensure_registered(&self, session: &mut LearnerSession, display_name: &str) -> RepoResult<()> {
        if session.registered {
            return Ok(());
        }

        if !self.repo.learner_exists(session.learner_id).await? {
            match self.repo.create_learner(session.learner_id, display_name).await {
                Ok(()) => info!("Registered new learner {}", session.learner_id),
                // Someone else registered them in the meantime
                Err(RepositoryError::Conflict) => {}
                Err(e) => return Err(e),
            }
        }

        session.registered = true;
        Ok(())
    }

    async fn handle_command(
        &self,
        session: &mut LearnerSession,
        command: Command,
        message: &InboundMessage,
    ) -> RepoResult<Vec<OutboundMessage>> {
        let learner_id = session.learner_id;
        session.reset_flow();

        match command {
            Command::StartSession => {
                let name = if message.display_name.is_empty() {
                    "there"
                } else {
                    message.display_name.as_str()
                };
                Ok(vec![OutboundMessage::text(learner_id, replies::greeting(name))])
            }
            Command::BeginRound | Command::Next => self.next_round(session).await,
            Command::AddWord => {
                session.state = DialogueState::AwaitingNewEnglishWord;
                Ok(vec![OutboundMessage::text(learner_id, replies::ask_new_english_word())])
            }
            Command::DeleteWord => {
                session.state = DialogueState::AwaitingWordToDelete;
                Ok(vec![OutboundMessage::text(learner_id, replies::ask_word_to_delete())])
            }
        }
    }

    /// Generate a round and make it the active one
    async fn next_round(&self, session: &mut LearnerSession) -> RepoResult<Vec<OutboundMessage>> {
        let learner_id = session.learner_id;

        match self.generator.generate(learner_id).await? {
            Some(round) => {
                let reply = OutboundMessage::with_round(
                    learner_id,
                    replies::round_prompt(&round.prompt_text),
                    &round,
                );
                session.round = Some(round);
                Ok(vec![reply])
            }
            None => {
                info!("Learner {} has exhausted the quiz pool", learner_id);
                session.round = None;
                Ok(vec![OutboundMessage::text(learner_id, replies::pool_exhausted())])
            }
        }
    }

    async fn handle_answer(
        &self,
        session: &mut LearnerSession,
        message: &InboundMessage,
    ) -> RepoResult<Vec<OutboundMessage>> {
        let learner_id = session.learner_id;
        let Some(round) = session.round.as_mut() else {
            return Ok(vec![OutboundMessage::text(learner_id, replies::no_active_round())]);
        };

        if let Some(answered) = message.round_id {
            if answered != round.id {
                debug!(
                    "Learner {} answered round {} but round {} is active",
                    learner_id, answered, round.id
                );
                return Ok(vec![OutboundMessage::with_round(
                    learner_id,
                    format!("{}\n{}", replies::round_expired(), round.prompt_text),
                    round,
                )]);
            }
        }

        let answer = message.text.as_str();
        if !round.is_correct(answer) {
            round.reject(answer);
            let reply = OutboundMessage::with_round(
                learner_id,
                replies::wrong_answer(&round.prompt_text),
                round,
            );
            return Ok(vec![reply]);
        }

        let pair_id = round.pair_id;
        let feedback = replies::correct_answer(&round.prompt_text, &round.correct_answer_text);

        match self.repo.record_association(learner_id, pair_id).await {
            Ok(_) => {}
            // The pair was deleted while the round was open
            Err(RepositoryError::ConstraintViolation(detail)) => {
                warn!(
                    "Pair {} vanished before learner {} answered it: {}",
                    pair_id, learner_id, detail
                );
            }
            Err(e) => return Err(e),
        }
        session.round = None;

        let mut replies = vec![OutboundMessage::text(learner_id, feedback)];
        replies.extend(self.next_round(session).await?);
        Ok(replies)
    }

    fn handle_new_english(&self, session: &mut LearnerSession, text: &str) -> Vec<OutboundMessage> {
        let learner_id = session.learner_id;

        match self.editor.validate_word(text) {
            Ok(english) => {
                let reply = replies::ask_translation(&english);
                session.pending_english = Some(english);
                session.state = DialogueState::AwaitingNewRussianWord;
                vec![OutboundMessage::text(learner_id, reply)]
            }
            Err(e) => vec![OutboundMessage::text(learner_id, replies::invalid_word(&e))],
        }
    }

    async fn handle_new_russian(
        &self,
        session: &mut LearnerSession,
        text: &str,
    ) -> RepoResult<Vec<OutboundMessage>> {
        let learner_id = session.learner_id;

        let russian = match self.editor.validate_word(text) {
            Ok(russian) => russian,
            Err(e) => return Ok(vec![OutboundMessage::text(learner_id, replies::invalid_word(&e))]),
        };

        let Some(english) = session.pending_english.clone() else {
            // Only reachable if state and pending text drifted apart
            warn!("Learner {} had no pending English word", learner_id);
            session.reset_flow();
            return Ok(vec![OutboundMessage::text(learner_id, replies::ask_new_english_word())]);
        };

        // On error the state is kept so the next message retries
        let outcome = self.editor.add_word_pair(learner_id, &english, &russian).await?;
        session.reset_flow();

        let reply = match outcome {
            AddOutcome::Added { word_count, .. } => replies::word_added(&russian, word_count),
            AddOutcome::Duplicate => replies::word_duplicate(),
        };
        Ok(vec![OutboundMessage::text(learner_id, reply)])
    }

    async fn handle_delete_target(
        &self,
        session: &mut LearnerSession,
        text: &str,
    ) -> RepoResult<Vec<OutboundMessage>> {
        let learner_id = session.learner_id;

        let target = match self.editor.validate_word(text) {
            Ok(target) => target,
            Err(e) => return Ok(vec![OutboundMessage::text(learner_id, replies::invalid_word(&e))]),
        };

        let outcome = self.editor.remove_word(learner_id, &target).await?;
        session.reset_flow();

        let reply = match outcome {
            RemoveOutcome::Removed {
                pair_id,
                report,
                word_count,
                ..
            } => {
                if report.pair_removed && session.round.as_ref().is_some_and(|r| r.pair_id == pair_id) {
                    session.round = None;
                }
                replies::word_removed(&target, word_count)
            }
            RemoveOutcome::NotFound => replies::word_not_found(),
        };
        Ok(vec![OutboundMessage::text(learner_id, reply)])
    }

    // =========================================================================
    // Registry
    // =========================================================================

    fn session_for(&self, learner_id: LearnerId) -> SessionHandle {
        let mut sessions = self.sessions.lock();
        sessions
            .entry(learner_id)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(LearnerSession::new(learner_id))))
            .clone()
    }

    /// Number of sessions currently held in memory
    pub fn active_sessions(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Drop sessions idle longer than the configured timeout
    ///
    /// Sessions being handled right now are skipped. Returns the number dropped.
    pub fn evict_idle_sessions(&self) -> usize {
        let Some(timeout) = self.idle_timeout else {
            return 0;
        };

        let mut sessions = self.sessions.lock();
        let before = sessions.len();
        sessions.retain(|_, handle| {
            if Arc::strong_count(handle) > 1 {
                return true;
            }
            match handle.try_lock() {
                Ok(session) => session.idle_for() <= timeout,
                Err(_) => true,
            }
        });

        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!("Evicted {} idle session(s)", evicted);
        }
        evicted
    }

    /// Current dialogue state of a learner, if they have a session
    pub async fn dialogue_state(&self, learner_id: LearnerId) -> Option<DialogueState> {
        let handle = self.sessions.lock().get(&learner_id).cloned()?;
        let session = handle.lock().await;
        Some(session.state)
    }

    /// Snapshot of a learner's active round
    pub async fn active_round(&self, learner_id: LearnerId) -> Option<Round> {
        let handle = self.sessions.lock().get(&learner_id).cloned()?;
        let session = handle.lock().await;
        session.round.clone()
    }
}
