//! Progress updater: one answered review in, one full progress record out.
//!
//! Steps, in order:
//! 1. schedule the next review
//! 2. record the answer in the lifetime counters
//! 3. classify the *updated* state
//! 4. score the *updated* state and counters
//! 5. prepend the outcome to the history and detect the trend
//!
//! Classification and scoring never see the pre-review state. A strong item
//! that is forgotten therefore comes back as `new`, not `decaying`.

use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::core::{FullProgress, ReviewInput, ReviewRequest, MAX_DIFFICULTY};
use crate::engine::{classifier, scheduler, scoring, trend};
use crate::error::{RetainError, Result};

/// Applies reviews under a fixed configuration.
///
/// Holds no per-item state; one updater can serve any number of items and
/// threads. Writes for the *same* item must still be serialized by the
/// caller, which owns persistence.
#[derive(Debug, Clone, Default)]
pub struct ProgressUpdater {
    config: Config,
}

impl ProgressUpdater {
    /// Create an updater with the given configuration.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Apply one review.
    ///
    /// Out-of-range prior state (ease below the floor, difficulty above 100)
    /// is clamped rather than rejected.
    pub fn apply_review(&self, input: &ReviewInput, now: DateTime<Utc>) -> FullProgress {
        let scheduling = scheduler::schedule(
            &input.scheduling,
            input.grade,
            &self.config.scheduler,
            now,
        );
        let counters = input.counters.record(input.grade);

        let word_state = classifier::classify_with(&scheduling, &self.config.classifier, now);
        let personal_score = scoring::personal_score_with(
            input.dictionary_difficulty,
            &counters,
            &scheduling,
            &self.config.scoring,
            now,
        );

        let recent_history = trend::push_outcome(
            &input.recent_history,
            input.grade.is_correct(),
            self.config.trend.history_limit,
        );
        let trend = trend::trend_with(&recent_history, &self.config.trend);

        tracing::debug!(
            grade = %input.grade,
            word_state = %word_state,
            personal_score,
            trend = %trend,
            "applied review"
        );

        FullProgress {
            scheduling,
            counters,
            word_state,
            personal_score,
            trend,
            recent_history,
        }
    }

    /// Apply one review, rejecting input outside its documented domain.
    pub fn apply_review_strict(
        &self,
        input: &ReviewInput,
        now: DateTime<Utc>,
    ) -> Result<FullProgress> {
        input
            .scheduling
            .validate(self.config.scheduler.minimum_ease)?;
        if input.dictionary_difficulty > MAX_DIFFICULTY {
            return Err(RetainError::invalid_state(format!(
                "dictionary_difficulty {} above {}",
                input.dictionary_difficulty, MAX_DIFFICULTY
            )));
        }
        Ok(self.apply_review(input, now))
    }

    /// Decode a loosely typed request and apply it, clamping bad fields.
    pub fn apply_request(&self, request: &ReviewRequest, now: DateTime<Utc>) -> FullProgress {
        let input = request.into_input(&self.config.scheduler);
        self.apply_review(&input, now)
    }

    /// Decode a loosely typed request strictly and apply it.
    pub fn apply_request_strict(
        &self,
        request: &ReviewRequest,
        now: DateTime<Utc>,
    ) -> Result<FullProgress> {
        let input = request.into_input_strict(&self.config.scheduler)?;
        self.apply_review_strict(&input, now)
    }
}

/// Apply one review with the default configuration.
pub fn apply_review(input: &ReviewInput, now: DateTime<Utc>) -> FullProgress {
    ProgressUpdater::default().apply_review(input, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        PersonalCounters, ReviewGrade, SchedulingState, TrendDirection, WordState,
    };
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 2, 7, 45, 0).unwrap()
    }

    #[test]
    fn test_fresh_item_good() {
        let progress = apply_review(&ReviewInput::first_review(ReviewGrade::Good, 50), now());

        assert_eq!(progress.scheduling.repetitions, 1);
        assert_eq!(progress.scheduling.interval_days, 1);
        assert_eq!(progress.counters, PersonalCounters::new(1, 0));
        assert_eq!(progress.word_state, WordState::Learning);
        // 50 - round(log2(2) * 5) = 45
        assert_eq!(progress.personal_score, 45);
        assert_eq!(progress.trend, TrendDirection::Stable);
        assert_eq!(progress.recent_history, vec![true]);
    }

    #[test]
    fn test_fresh_item_forgot() {
        let progress = apply_review(&ReviewInput::first_review(ReviewGrade::Forgot, 50), now());

        assert_eq!(progress.scheduling.repetitions, 0);
        assert_eq!(progress.counters, PersonalCounters::new(0, 1));
        assert_eq!(progress.word_state, WordState::New);
        // 50 + mistake penalty 10
        assert_eq!(progress.personal_score, 60);
        assert_eq!(progress.recent_history, vec![false]);
    }

    #[test]
    fn test_forgotten_strong_item_is_new_not_decaying() {
        let prior = SchedulingState {
            ease_factor: 2.4,
            interval_days: 25,
            repetitions: 6,
            next_review_at: Some(now()),
            last_grade: Some(ReviewGrade::Good),
        };
        let input = ReviewInput::first_review(ReviewGrade::Forgot, 30)
            .with_scheduling(prior)
            .with_counters(PersonalCounters::new(6, 0));

        let progress = apply_review(&input, now());

        assert_eq!(progress.scheduling.repetitions, 0);
        assert_eq!(progress.scheduling.interval_days, 0);
        assert_eq!(progress.word_state, WordState::New);
    }

    #[test]
    fn test_score_uses_updated_counters() {
        let input = ReviewInput::first_review(ReviewGrade::Forgot, 50)
            .with_scheduling(SchedulingState {
                repetitions: 1,
                interval_days: 1,
                last_grade: Some(ReviewGrade::Good),
                next_review_at: Some(now()),
                ..Default::default()
            })
            .with_counters(PersonalCounters::new(1, 0));

        let progress = apply_review(&input, now());

        // counters (1, 1): bonus round(log2(2) * 5) = 5, penalty 5
        assert_eq!(progress.counters, PersonalCounters::new(1, 1));
        assert_eq!(progress.personal_score, 50);
    }

    #[test]
    fn test_trend_includes_current_outcome() {
        let input = ReviewInput::first_review(ReviewGrade::Good, 50)
            .with_scheduling(SchedulingState {
                repetitions: 2,
                interval_days: 6,
                last_grade: Some(ReviewGrade::Good),
                next_review_at: Some(now()),
                ..Default::default()
            })
            .with_counters(PersonalCounters::new(2, 3))
            .with_history(vec![true, true, false, false, false]);

        let progress = apply_review(&input, now());

        assert_eq!(
            progress.recent_history,
            vec![true, true, true, false, false, false]
        );
        assert_eq!(progress.trend, TrendDirection::Easier);
    }

    #[test]
    fn test_history_truncated_to_limit() {
        let mut config = Config::default();
        config.trend.history_limit = 4;
        let updater = ProgressUpdater::new(config);

        let input = ReviewInput::first_review(ReviewGrade::Good, 50)
            .with_history(vec![false; 9]);
        let progress = updater.apply_review(&input, now());

        assert_eq!(progress.recent_history, vec![true, false, false, false]);
    }

    #[test]
    fn test_next_input_chains_reviews() {
        let updater = ProgressUpdater::default();
        let mut progress =
            updater.apply_review(&ReviewInput::first_review(ReviewGrade::Good, 40), now());

        for _ in 0..4 {
            let due = progress.scheduling.next_review_at.unwrap();
            progress = updater.apply_review(&progress.next_input(ReviewGrade::Good, 40), due);
        }

        // intervals 1, 6, 15, 38, 95
        assert_eq!(progress.scheduling.repetitions, 5);
        assert_eq!(progress.scheduling.interval_days, 95);
        assert_eq!(progress.counters, PersonalCounters::new(5, 0));
        assert_eq!(progress.word_state, WordState::Mastered);
        assert_eq!(
            progress.scheduling.next_review_at,
            Some(now() + Duration::days(1 + 6 + 15 + 38 + 95))
        );
    }

    #[test]
    fn test_configured_initial_ease_on_both_entry_points() {
        let mut config = Config::default();
        config.scheduler.initial_ease = 3.0;
        let updater = ProgressUpdater::new(config);

        let typed = updater.apply_review(&ReviewInput::first_review(ReviewGrade::Good, 50), now());
        let request: ReviewRequest =
            serde_json::from_str(r#"{"grade": "good", "dictionary_difficulty": 50}"#).unwrap();
        let wire = updater.apply_request(&request, now());

        assert!((typed.scheduling.ease_factor - 3.0).abs() < 1e-9);
        assert_eq!(typed, wire);
    }

    #[test]
    fn test_long_easy_streak_is_capped() {
        let updater = ProgressUpdater::default();
        let mut progress =
            updater.apply_review(&ReviewInput::first_review(ReviewGrade::Easy, 50), now());

        for _ in 0..39 {
            let due = progress.scheduling.next_review_at.unwrap();
            progress = updater.apply_review(&progress.next_input(ReviewGrade::Easy, 50), due);
        }

        assert_eq!(progress.scheduling.repetitions, 40);
        assert_eq!(progress.scheduling.interval_days, 36_500);
        assert_eq!(progress.word_state, WordState::Mastered);
    }

    #[test]
    fn test_huge_prior_interval_does_not_overflow() {
        let input = ReviewInput::first_review(ReviewGrade::Good, 50).with_scheduling(
            SchedulingState {
                interval_days: 40_000_000,
                repetitions: 3,
                last_grade: Some(ReviewGrade::Good),
                next_review_at: Some(now()),
                ..Default::default()
            },
        );

        let progress = apply_review(&input, now());
        assert_eq!(progress.scheduling.interval_days, 36_500);
        assert_eq!(
            progress.scheduling.next_review_at,
            Some(now() + Duration::days(36_500))
        );
    }

    #[test]
    fn test_strict_rejects_invalid_prior_state() {
        let input = ReviewInput::first_review(ReviewGrade::Good, 50).with_scheduling(
            SchedulingState {
                ease_factor: 0.2,
                ..Default::default()
            },
        );
        let updater = ProgressUpdater::default();

        assert!(updater.apply_review_strict(&input, now()).is_err());
        // The lenient path clamps and carries on
        let progress = updater.apply_review(&input, now());
        assert!(progress.scheduling.ease_factor >= 1.3);
    }

    #[test]
    fn test_strict_rejects_difficulty_above_range() {
        let input = ReviewInput::first_review(ReviewGrade::Good, 130);
        let updater = ProgressUpdater::default();

        assert!(updater.apply_review_strict(&input, now()).is_err());
        assert!(updater.apply_review(&input, now()).personal_score <= 100);
    }

    #[test]
    fn test_apply_request_lenient_and_strict() {
        let request: ReviewRequest = serde_json::from_str(
            r#"{"grade": "great", "dictionary_difficulty": 55,
                "scheduling": {"interval_days": -3}}"#,
        )
        .unwrap();
        let updater = ProgressUpdater::default();

        assert!(updater.apply_request_strict(&request, now()).is_err());

        let progress = updater.apply_request(&request, now());
        assert_eq!(progress.scheduling.last_grade, Some(ReviewGrade::Forgot));
        assert_eq!(progress.word_state, WordState::New);
    }
}
