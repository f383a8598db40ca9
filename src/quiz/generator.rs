/*!
 * Quiz round generation.
 *
 * A round is built from one pair the learner has not been associated with yet,
 * a prompt direction, and up to N distractors drawn from the answer's language
 * under the same visibility rule. Option order is shuffled per round.
 */

use log::debug;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use super::round::{Round, RoundId};
use crate::app_config::{PromptDirection, QuizConfig};
use crate::database::models::{Language, LearnerId, WordPairRecord};
use crate::database::repository::{RepoResult, WordRepository};

/// Process-wide round counter so ids never repeat across generators
static NEXT_ROUND_ID: AtomicU64 = AtomicU64::new(1);

/// Builds quiz rounds for learners
pub struct QuizRoundGenerator {
    /// Repository for pair and distractor selection
    repo: WordRepository,
    /// Wrong options requested per round
    distractor_count: usize,
    /// Prompt language policy
    direction: PromptDirection,
    /// Direction and shuffle source; never held across an await
    rng: Mutex<StdRng>,
}

impl QuizRoundGenerator {
    /// Create a generator seeded from the operating system
    pub fn new(repo: WordRepository, config: &QuizConfig) -> Self {
        Self::with_rng(repo, config, StdRng::from_os_rng())
    }

    /// Create a generator with a fixed seed (deterministic shuffles in tests)
    pub fn with_seed(repo: WordRepository, config: &QuizConfig, seed: u64) -> Self {
        Self::with_rng(repo, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(repo: WordRepository, config: &QuizConfig, rng: StdRng) -> Self {
        Self {
            repo,
            distractor_count: config.distractor_count,
            direction: config.prompt_language,
            rng: Mutex::new(rng),
        }
    }

    /// Build the next round for a learner
    ///
    /// Returns `None` when the learner's pool is exhausted.
    pub async fn generate(&self, learner_id: LearnerId) -> RepoResult<Option<Round>> {
        let Some(pair) = self.repo.pick_quiz_pair(learner_id).await? else {
            debug!("Quiz pool exhausted for learner {}", learner_id);
            return Ok(None);
        };

        let prompt_language = self.choose_prompt_language();
        let answer_language = prompt_language.opposite();

        let distractors = self
            .repo
            .pick_distractors(
                answer_language,
                pair.text(answer_language),
                learner_id,
                self.distractor_count,
            )
            .await?;

        let round = self.assemble(next_round_id(), &pair, prompt_language, distractors);
        debug!(
            "Round {} for learner {}: pair {} with {} option(s)",
            round.id,
            learner_id,
            round.pair_id,
            round.option_count()
        );

        Ok(Some(round))
    }

    fn choose_prompt_language(&self) -> Language {
        match self.direction.fixed_language() {
            Some(language) => language,
            None => {
                if self.rng.lock().random_bool(0.5) {
                    Language::English
                } else {
                    Language::Russian
                }
            }
        }
    }

    /// Combine the correct answer with distractors and shuffle
    ///
    /// Distractors equal to the answer or the prompt and repeated texts are dropped,
    /// so the answer appears exactly once and the prompt never appears.
    fn assemble(
        &self,
        id: RoundId,
        pair: &WordPairRecord,
        prompt_language: Language,
        distractors: Vec<String>,
    ) -> Round {
        let prompt_text = pair.text(prompt_language).to_string();
        let correct_answer_text = pair.text(prompt_language.opposite()).to_string();

        let mut seen: HashSet<String> = HashSet::new();
        seen.insert(correct_answer_text.clone());
        seen.insert(prompt_text.clone());

        let mut options = vec![correct_answer_text.clone()];
        options.extend(distractors.into_iter().filter(|d| seen.insert(d.clone())));

        options.shuffle(&mut *self.rng.lock());

        Round::new(
            id,
            pair.id,
            prompt_language,
            prompt_text,
            correct_answer_text,
            options,
        )
    }
}

fn next_round_id() -> RoundId {
    NEXT_ROUND_ID.fetch_add(1, Ordering::Relaxed)
}
