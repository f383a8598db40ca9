/*!
 * Database entity models and DTOs.
 *
 * These structures map directly to database tables and provide
 * type-safe access to persisted data.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Learner identifier, supplied by the chat transport
pub type LearnerId = i64;

/// Row id of a word pair
pub type PairId = i64;

/// Row id of an English or Russian word
pub type WordId = i64;

/// Side of the bilingual dictionary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    /// English vocabulary pool
    English,
    /// Russian vocabulary pool
    Russian,
}

impl Language {
    /// The language on the other side of a pair
    pub fn opposite(self) -> Self {
        match self {
            Language::English => Language::Russian,
            Language::Russian => Language::English,
        }
    }

    /// Table holding the words of this language
    pub(crate) fn words_table(self) -> &'static str {
        match self {
            Language::English => "english_words",
            Language::Russian => "russian_words",
        }
    }

    /// Column of `word_pairs` referencing this language's word
    pub(crate) fn pair_column(self) -> &'static str {
        match self {
            Language::English => "english_word_id",
            Language::Russian => "russian_word_id",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::English => write!(f, "english"),
            Language::Russian => write!(f, "russian"),
        }
    }
}

impl std::str::FromStr for Language {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "english" | "en" => Ok(Language::English),
            "russian" | "ru" => Ok(Language::Russian),
            _ => Err(anyhow::anyhow!("Invalid language: {}", s)),
        }
    }
}

/// Word row (same shape for both languages)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordRecord {
    /// Row id
    pub id: WordId,
    /// Word text, unique within its language
    pub text: String,
}

/// Word pair joined with the text of both words
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordPairRecord {
    /// Pair id
    pub id: PairId,
    /// English word id
    pub english_word_id: WordId,
    /// Russian word id
    pub russian_word_id: WordId,
    /// English word text
    pub english: String,
    /// Russian word text
    pub russian: String,
    /// Whether the pair belongs to the seeded shared vocabulary
    pub shared: bool,
}

impl WordPairRecord {
    /// Text of the word on the given side
    pub fn text(&self, language: Language) -> &str {
        match language {
            Language::English => &self.english,
            Language::Russian => &self.russian,
        }
    }

    /// Word id on the given side
    pub fn word_id(&self, language: Language) -> WordId {
        match language {
            Language::English => self.english_word_id,
            Language::Russian => self.russian_word_id,
        }
    }
}

/// Learner row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnerRecord {
    /// Learner id supplied by the transport
    pub id: LearnerId,
    /// Display name at first contact
    pub display_name: String,
    /// Registration timestamp (RFC 3339)
    pub created_at: String,
}

/// A pair located through one learner's association
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssociatedPair {
    /// Pair the learner is associated with
    pub pair_id: PairId,
    /// Id of the word that matched the looked-up text
    pub word_id: WordId,
    /// Language the text matched in
    pub language: Language,
}

/// Shared vocabulary entry used for bulk seeding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedPair {
    /// English text
    pub english: String,
    /// Russian text
    pub russian: String,
}

impl SeedPair {
    /// Create a new seed pair
    pub fn new(english: impl Into<String>, russian: impl Into<String>) -> Self {
        Self {
            english: english.into(),
            russian: russian.into(),
        }
    }
}

/// What a pair removal actually deleted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemovalReport {
    /// Association rows deleted
    pub associations_removed: usize,
    /// Whether the pair row itself was deleted
    pub pair_removed: bool,
    /// Whether the English word row was deleted
    pub english_word_removed: bool,
    /// Whether the Russian word row was deleted
    pub russian_word_removed: bool,
}

/// How `remove_pair` treats rows that other learners or pairs may still use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalPolicy {
    /// Drop only the learner's association, then each row nothing else references
    #[default]
    ReferenceCounted,
    /// Drop every association to the pair, the pair and both words
    Unconditional,
}

impl fmt::Display for RemovalPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemovalPolicy::ReferenceCounted => write!(f, "reference_counted"),
            RemovalPolicy::Unconditional => write!(f, "unconditional"),
        }
    }
}

/// Row counts across the dictionary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryStats {
    /// English word rows
    pub english_words: i64,
    /// Russian word rows
    pub russian_words: i64,
    /// Word pair rows
    pub pairs: i64,
    /// Pairs from the shared seed vocabulary
    pub shared_pairs: i64,
    /// Registered learners
    pub learners: i64,
    /// Learner/pair associations
    pub associations: i64,
}

impl fmt::Display for DictionaryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "English words: {}, Russian words: {}, Pairs: {} ({} shared), Learners: {}, Associations: {}",
            self.english_words,
            self.russian_words,
            self.pairs,
            self.shared_pairs,
            self.learners,
            self.associations
        )
    }
}
