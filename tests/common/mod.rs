/*!
 * Common test utilities for the lexidrill test suite
 */

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use std::collections::VecDeque;

use lexidrill::app_config::{Config, PromptDirection};
use lexidrill::database::models::{LearnerId, SeedPair};
use lexidrill::{InboundMessage, OutboundMessage, SessionManager, Transport, WordRepository};

/// Creates an in-memory repository holding the given shared pairs
pub async fn seeded_repository(pairs: &[(&str, &str)]) -> Result<WordRepository> {
    let repo = WordRepository::new_in_memory()?;
    repo.seed_pairs(to_seed(pairs)).await?;
    Ok(repo)
}

/// Creates a session manager over an in-memory repository with English prompts
pub async fn seeded_manager(pairs: &[(&str, &str)]) -> Result<SessionManager> {
    let repo = seeded_repository(pairs).await?;
    Ok(SessionManager::from_config(repo, &config_with(PromptDirection::English)))
}

/// Default configuration with a fixed prompt direction
pub fn config_with(direction: PromptDirection) -> Config {
    let mut config = Config::default();
    config.quiz.prompt_language = direction;
    config
}

pub fn to_seed(pairs: &[(&str, &str)]) -> Vec<SeedPair> {
    pairs.iter().map(|(e, r)| SeedPair::new(*e, *r)).collect()
}

/// A plain text message from a learner
pub fn text(learner_id: LearnerId, text: &str) -> InboundMessage {
    InboundMessage::new(learner_id, text).with_display_name(format!("Learner {}", learner_id))
}

/// A small vocabulary used across tests
pub const FRUITS: [(&str, &str); 6] = [
    ("Apple", "Яблоко"),
    ("Banana", "Банан"),
    ("Mango", "Манго"),
    ("Pumpkin", "Тыква"),
    ("Orange", "Оранжевый"),
    ("Milk", "Молоко"),
];

/// Transport replaying a fixed script and recording every reply
pub struct ScriptedTransport {
    inbound: VecDeque<InboundMessage>,
    pub sent: Vec<OutboundMessage>,
}

impl ScriptedTransport {
    pub fn new(messages: Vec<InboundMessage>) -> Self {
        Self {
            inbound: messages.into(),
            sent: Vec::new(),
        }
    }

    /// Texts of every reply, in delivery order
    pub fn sent_texts(&self) -> Vec<&str> {
        self.sent.iter().map(|m| m.text.as_str()).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn receive(&mut self) -> Option<InboundMessage> {
        self.inbound.pop_front()
    }

    async fn send(&mut self, message: &OutboundMessage) -> Result<()> {
        self.sent.push(message.clone());
        Ok(())
    }
}
