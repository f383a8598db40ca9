/*!
 * Message transport boundary.
 *
 * The session engine only deals in logical messages: inbound text with an
 * optional recognized command and round id, outbound text with option labels.
 * Rendering and delivery belong to a `Transport` implementation.
 */

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin, Stdout};

use crate::database::models::LearnerId;
use crate::quiz::{Round, RoundId};
use crate::session::models::Command;

/// A message from a learner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Learner who sent it
    pub sender_id: LearnerId,
    /// Learner's display name, used on first contact
    pub display_name: String,
    /// Raw text
    pub text: String,
    /// Command recognized by the transport, if any
    pub command: Option<Command>,
    /// Round the text answers, if the transport tracks it
    pub round_id: Option<RoundId>,
}

impl InboundMessage {
    /// Create a plain text message
    pub fn new(sender_id: LearnerId, text: impl Into<String>) -> Self {
        Self {
            sender_id,
            display_name: String::new(),
            text: text.into(),
            command: None,
            round_id: None,
        }
    }

    /// Create a message carrying a command
    pub fn command(sender_id: LearnerId, command: Command) -> Self {
        Self {
            command: Some(command),
            ..Self::new(sender_id, command.label())
        }
    }

    /// Set the name used if the sender has to be registered
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Tag the message as an answer to a specific round
    pub fn for_round(mut self, round_id: RoundId) -> Self {
        self.round_id = Some(round_id);
        self
    }
}

/// A reply for a learner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Learner to deliver to
    pub recipient_id: LearnerId,
    /// Reply text
    pub text: String,
    /// Selectable answers, empty when the reply carries no round
    pub option_labels: Vec<String>,
    /// Round the options belong to
    pub round_id: Option<RoundId>,
}

impl OutboundMessage {
    /// Create a text-only reply
    pub fn text(recipient_id: LearnerId, text: impl Into<String>) -> Self {
        Self {
            recipient_id,
            text: text.into(),
            option_labels: Vec::new(),
            round_id: None,
        }
    }

    /// Create a reply presenting a round's current options
    pub fn with_round(recipient_id: LearnerId, text: impl Into<String>, round: &Round) -> Self {
        Self {
            recipient_id,
            text: text.into(),
            option_labels: round.option_labels(),
            round_id: Some(round.id),
        }
    }

    /// Whether the reply presents a round
    pub fn has_round(&self) -> bool {
        self.round_id.is_some()
    }
}

/// Source of learner messages and sink for replies
#[async_trait]
pub trait Transport: Send {
    /// Next inbound message, or `None` once the transport is closed
    async fn receive(&mut self) -> Option<InboundMessage>;

    /// Deliver one reply
    async fn send(&mut self, message: &OutboundMessage) -> Result<()>;
}

/// Interactive single-learner transport over stdin/stdout
///
/// Options are numbered; typing a number picks that option. Answers are
/// tagged with the round id of the options last printed.
pub struct ConsoleTransport {
    learner_id: LearnerId,
    display_name: String,
    lines: Lines<BufReader<Stdin>>,
    stdout: Stdout,
    last_round: Option<RoundId>,
    last_options: Vec<String>,
}

impl ConsoleTransport {
    /// Console session reading stdin lines as messages from one learner
    pub fn new(learner_id: LearnerId, display_name: impl Into<String>) -> Self {
        Self {
            learner_id,
            display_name: display_name.into(),
            lines: BufReader::new(tokio::io::stdin()).lines(),
            stdout: tokio::io::stdout(),
            last_round: None,
            last_options: Vec::new(),
        }
    }

    fn to_inbound(&self, line: &str) -> InboundMessage {
        let text = resolve_option(line, &self.last_options);
        let mut message =
            InboundMessage::new(self.learner_id, text).with_display_name(&self.display_name);
        message.command = Command::parse(&message.text);
        if message.command.is_none() {
            message.round_id = self.last_round;
        }
        message
    }
}

/// Map a typed option number to its label text; anything else passes through trimmed
fn resolve_option(line: &str, options: &[String]) -> String {
    let trimmed = line.trim();
    trimmed
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|index| options.get(index))
        .cloned()
        .unwrap_or_else(|| trimmed.to_string())
}

/// Render a reply for a terminal
fn render(message: &OutboundMessage) -> String {
    let mut out = format!("{}\n", message.text);
    for (index, label) in message.option_labels.iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", index + 1, label));
    }
    if message.has_round() {
        let menu: Vec<&str> = Command::MENU.iter().map(Command::label).collect();
        out.push_str(&format!("  [{}]\n", menu.join(" | ")));
    }
    out
}

#[async_trait]
impl Transport for ConsoleTransport {
    async fn receive(&mut self) -> Option<InboundMessage> {
        loop {
            self.stdout.write_all(b"> ").await.ok()?;
            self.stdout.flush().await.ok()?;

            match self.lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => return Some(self.to_inbound(&line)),
                Ok(None) => return None,
                Err(e) => {
                    log::error!("Failed to read from stdin: {}", e);
                    return None;
                }
            }
        }
    }

    async fn send(&mut self, message: &OutboundMessage) -> Result<()> {
        if message.has_round() {
            self.last_round = message.round_id;
            self.last_options = message
                .option_labels
                .iter()
                .map(|label| label.trim_end_matches(crate::quiz::round::REJECTED_MARK).to_string())
                .collect();
        }

        self.stdout
            .write_all(render(message).as_bytes())
            .await
            .context("Failed to write to stdout")?;
        self.stdout.flush().await.context("Failed to flush stdout")?;
        Ok(())
    }
}
