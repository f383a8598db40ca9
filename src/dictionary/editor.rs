/*!
 * Add/remove orchestration for a learner's personal dictionary.
 */

use log::{debug, info, warn};

use crate::app_config::DictionaryConfig;
use crate::database::models::{
    AssociatedPair, Language, LearnerId, PairId, RemovalPolicy, RemovalReport, WordId,
};
use crate::database::repository::{RepoResult, WordRepository};
use crate::errors::{InvalidWord, RepositoryError};

/// Result of adding a word pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// The pair is now in the learner's set
    Added {
        /// Pair id, new or re-attached
        pair_id: PairId,
        /// Learner's word count afterwards, if it could be read
        word_count: Option<i64>,
    },
    /// The learner already has the pair, or one of the texts belongs to another pair
    Duplicate,
}

/// Result of the delete flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The text matched one of the learner's pairs and it was removed
    Removed {
        /// Pair the text belonged to
        pair_id: PairId,
        /// Language the text matched in
        language: Language,
        /// Rows actually deleted
        report: RemovalReport,
        /// Learner's word count afterwards
        word_count: i64,
    },
    /// The learner has no pair under that text
    NotFound,
}

/// Dictionary editor for learner-initiated changes
#[derive(Clone)]
pub struct DictionaryEditor {
    repo: WordRepository,
    removal_policy: RemovalPolicy,
    max_word_length: usize,
}

impl DictionaryEditor {
    /// Create an editor applying the configured removal policy and word limit
    pub fn new(repo: WordRepository, config: &DictionaryConfig) -> Self {
        Self {
            repo,
            removal_policy: config.removal_policy,
            max_word_length: config.max_word_length,
        }
    }

    /// Trim a learner-supplied word and check its length
    pub fn validate_word(&self, text: &str) -> Result<String, InvalidWord> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(InvalidWord::Empty);
        }
        if trimmed.chars().count() > self.max_word_length {
            return Err(InvalidWord::TooLong {
                max: self.max_word_length,
            });
        }
        Ok(trimmed.to_string())
    }

    /// Add a pair to the shared dictionary and to the learner's set
    ///
    /// When exactly this pair already exists (seeded, or kept alive by another
    /// learner) and the learner does not hold it, it is attached to them instead.
    pub async fn add_word_pair(
        &self,
        learner_id: LearnerId,
        english: &str,
        russian: &str,
    ) -> RepoResult<AddOutcome> {
        let pair_id = match self.repo.add_word_pair(learner_id, english, russian).await {
            Ok(pair_id) => pair_id,
            Err(RepositoryError::Duplicate) => {
                match self.attach_existing(learner_id, english, russian).await? {
                    Some(pair_id) => pair_id,
                    None => {
                        debug!("Learner {} tried to add an existing word", learner_id);
                        return Ok(AddOutcome::Duplicate);
                    }
                }
            }
            Err(e) => return Err(e),
        };

        // The pair is durable from here on, so a failed count must not fail the add
        let word_count = self.repo.count_learner_words(learner_id).await;
        Ok(Self::added(learner_id, pair_id, word_count))
    }

    async fn attach_existing(
        &self,
        learner_id: LearnerId,
        english: &str,
        russian: &str,
    ) -> RepoResult<Option<PairId>> {
        let Some(pair) = self.repo.find_pair_by_texts(english, russian).await? else {
            return Ok(None);
        };

        if self.repo.record_association(learner_id, pair.id).await? {
            debug!("Learner {} attached existing pair {}", learner_id, pair.id);
            Ok(Some(pair.id))
        } else {
            Ok(None)
        }
    }

    fn added(learner_id: LearnerId, pair_id: PairId, word_count: RepoResult<i64>) -> AddOutcome {
        let word_count = match word_count {
            Ok(count) => {
                info!(
                    "Learner {} added a word pair, now has {} word(s)",
                    learner_id, count
                );
                Some(count)
            }
            Err(e) => {
                warn!(
                    "Learner {} added pair {} but the word count could not be read: {}",
                    learner_id, pair_id, e
                );
                None
            }
        };

        AddOutcome::Added {
            pair_id,
            word_count,
        }
    }

    /// Remove the learner's pair whose English or Russian word equals `text`
    ///
    /// An English match wins when the text exists on both sides.
    pub async fn remove_word(&self, learner_id: LearnerId, text: &str) -> RepoResult<RemoveOutcome> {
        let english_match = self
            .repo
            .find_associated_pair_by_english(learner_id, text)
            .await?;
        let russian_match = self
            .repo
            .find_associated_pair_by_russian(learner_id, text)
            .await?;

        let Some(found) = english_match.or(russian_match) else {
            return Ok(RemoveOutcome::NotFound);
        };

        // The pair may have vanished between the lookup and here
        let Some(sibling_word_id) = self
            .repo
            .find_pair_endpoints(found.pair_id, found.language)
            .await?
        else {
            return Ok(RemoveOutcome::NotFound);
        };

        let report = self.remove_found(learner_id, found, sibling_word_id).await?;
        let word_count = self.repo.count_learner_words(learner_id).await?;

        info!(
            "Learner {} removed pair {} via {} text, now has {} word(s)",
            learner_id, found.pair_id, found.language, word_count
        );

        Ok(RemoveOutcome::Removed {
            pair_id: found.pair_id,
            language: found.language,
            report,
            word_count,
        })
    }

    async fn remove_found(
        &self,
        learner_id: LearnerId,
        found: AssociatedPair,
        sibling_word_id: WordId,
    ) -> RepoResult<RemovalReport> {
        let (english_word_id, russian_word_id) = match found.language {
            Language::English => (found.word_id, sibling_word_id),
            Language::Russian => (sibling_word_id, found.word_id),
        };

        self.repo
            .remove_pair(
                learner_id,
                found.pair_id,
                english_word_id,
                russian_word_id,
                self.removal_policy,
            )
            .await
    }

    /// Learner's current word count
    pub async fn word_count(&self, learner_id: LearnerId) -> RepoResult<i64> {
        self.repo.count_learner_words(learner_id).await
    }
}
