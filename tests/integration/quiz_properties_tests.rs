/*!
 * Selection properties of rounds and distractors
 */

use std::collections::HashSet;

use lexidrill::app_config::{PromptDirection, QuizConfig};
use lexidrill::database::models::Language;
use lexidrill::QuizRoundGenerator;

use crate::common;

const LEARNER: i64 = 77;

/// Once a learner is associated with a pair it never comes back
#[tokio::test]
async fn test_pickQuizPair_afterAssociation_shouldNeverReturnPair() {
    let repo = common::seeded_repository(&common::FRUITS).await.unwrap();
    repo.create_learner(LEARNER, "Monotonic").await.unwrap();

    let mut learned = HashSet::new();
    while let Some(pair) = repo.pick_quiz_pair(LEARNER).await.unwrap() {
        assert!(learned.insert(pair.id), "pair {} was offered twice", pair.id);
        repo.record_association(LEARNER, pair.id).await.unwrap();

        for _ in 0..5 {
            if let Some(again) = repo.pick_quiz_pair(LEARNER).await.unwrap() {
                assert!(!learned.contains(&again.id));
            }
        }
    }

    assert_eq!(learned.len(), common::FRUITS.len());
}

/// Distractors never contain the excluded text or repeats, whatever the pool size
#[tokio::test]
async fn test_pickDistractors_forEveryPoolSize_shouldRespectExclusion() {
    for size in 0..=common::FRUITS.len() {
        let repo = common::seeded_repository(&common::FRUITS[..size]).await.unwrap();
        let exclude = "Яблоко";

        for count in [0, 1, 4, 10] {
            let picked = repo
                .pick_distractors(Language::Russian, exclude, LEARNER, count)
                .await
                .unwrap();

            let unique: HashSet<&String> = picked.iter().collect();
            assert_eq!(unique.len(), picked.len(), "duplicates for size {}", size);
            assert!(!picked.iter().any(|t| t == exclude));

            let available = size.saturating_sub(1);
            assert_eq!(picked.len(), count.min(available), "size {} count {}", size, count);
        }
    }
}

/// Distractors skip words of pairs the learner already knows
#[tokio::test]
async fn test_pickDistractors_shouldRespectLearnerVisibility() {
    let repo = common::seeded_repository(&[("Apple", "Яблоко"), ("Milk", "Молоко"), ("Table", "Стол")])
        .await
        .unwrap();
    repo.create_learner(LEARNER, "Visibility").await.unwrap();
    let milk_pair = loop {
        let pair = repo.pick_quiz_pair(LEARNER).await.unwrap().unwrap();
        if pair.english == "Milk" {
            break pair;
        }
    };
    repo.record_association(LEARNER, milk_pair.id).await.unwrap();

    let picked = repo
        .pick_distractors(Language::Russian, "Яблоко", LEARNER, 4)
        .await
        .unwrap();

    assert_eq!(picked, vec!["Стол".to_string()]);
}

/// Every generated round holds the answer once and never the prompt
#[tokio::test]
async fn test_generate_repeatedly_shouldKeepRoundGuarantees() {
    let repo = common::seeded_repository(&common::FRUITS).await.unwrap();
    let config = QuizConfig {
        distractor_count: 4,
        prompt_language: PromptDirection::Random,
    };
    let generator = QuizRoundGenerator::with_seed(repo, &config, 2024);

    for _ in 0..50 {
        let round = generator.generate(LEARNER).await.unwrap().unwrap();
        let texts = round.option_texts();

        assert_eq!(
            texts.iter().filter(|t| **t == round.correct_answer_text).count(),
            1
        );
        assert!(!texts.contains(&round.prompt_text.as_str()));
        let unique: HashSet<&&str> = texts.iter().collect();
        assert_eq!(unique.len(), texts.len());
        assert_eq!(round.option_count(), 5);
        assert_eq!(round.answer_language(), round.prompt_language.opposite());
    }
}

/// A small pool degrades to fewer options instead of failing
#[tokio::test]
async fn test_generate_withSmallPool_shouldDegradeGracefully() {
    let repo = common::seeded_repository(&common::FRUITS[..3]).await.unwrap();
    let generator = QuizRoundGenerator::new(repo, &QuizConfig::default());

    let round = generator.generate(LEARNER).await.unwrap().unwrap();

    assert_eq!(round.option_count(), 3);
    assert_eq!(round.prompt_language, Language::English);
}
