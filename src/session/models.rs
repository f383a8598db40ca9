/*!
 * Per-learner dialogue state and the command vocabulary.
 */

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::database::models::LearnerId;
use crate::quiz::Round;

/// Where a learner is in the dialogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DialogueState {
    /// Answering the active round or choosing a menu command
    #[default]
    Idle,
    /// Add flow, first step
    AwaitingNewEnglishWord,
    /// Add flow, second step; the English text is pending
    AwaitingNewRussianWord,
    /// Delete flow
    AwaitingWordToDelete,
}

impl std::fmt::Display for DialogueState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::AwaitingNewEnglishWord => write!(f, "awaiting_new_english_word"),
            Self::AwaitingNewRussianWord => write!(f, "awaiting_new_russian_word"),
            Self::AwaitingWordToDelete => write!(f, "awaiting_word_to_delete"),
        }
    }
}

/// Menu commands understood in every state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// First contact greeting
    StartSession,
    /// Start quizzing
    BeginRound,
    /// Skip to another round
    Next,
    /// Start the add flow
    AddWord,
    /// Start the delete flow
    DeleteWord,
}

impl Command {
    /// Menu entries shown next to round options
    pub const MENU: [Command; 3] = [Command::Next, Command::AddWord, Command::DeleteWord];

    /// Recognize a command from raw message text
    ///
    /// Matches slash commands and button labels, ignoring case and the label emoji.
    pub fn parse(text: &str) -> Option<Self> {
        let normalized = text
            .trim()
            .trim_end_matches(|c: char| !c.is_alphanumeric())
            .trim()
            .to_lowercase();

        match normalized.as_str() {
            "/start" => Some(Self::StartSession),
            "/cards" => Some(Self::BeginRound),
            "next" | "дальше" => Some(Self::Next),
            "add word" | "добавить слово" => Some(Self::AddWord),
            "delete word" | "удалить слово" => Some(Self::DeleteWord),
            _ => None,
        }
    }

    /// Text shown on the command's button
    pub fn label(&self) -> &'static str {
        match self {
            Self::StartSession => "/start",
            Self::BeginRound => "/cards",
            Self::Next => "Next ⏩",
            Self::AddWord => "Add word ➕",
            Self::DeleteWord => "Delete word 🗑️",
        }
    }
}

/// In-memory session of one learner
#[derive(Debug, Clone)]
pub struct LearnerSession {
    /// Owner
    pub learner_id: LearnerId,
    /// Current dialogue state
    pub state: DialogueState,
    /// Round awaiting an answer
    pub round: Option<Round>,
    /// English text captured by the first add step
    pub pending_english: Option<String>,
    /// Whether the learner row is known to exist
    pub registered: bool,
    last_seen: Instant,
}

impl LearnerSession {
    /// Fresh idle session for a learner not yet known to be registered
    pub fn new(learner_id: LearnerId) -> Self {
        Self {
            learner_id,
            state: DialogueState::Idle,
            round: None,
            pending_english: None,
            registered: false,
            last_seen: Instant::now(),
        }
    }

    /// Record activity
    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    /// Time since the last message
    pub fn idle_for(&self) -> Duration {
        self.last_seen.elapsed()
    }

    /// Abandon any add/delete flow in progress; the active round is kept
    pub fn reset_flow(&mut self) {
        self.state = DialogueState::Idle;
        self.pending_english = None;
    }
}
