//! End-to-end review flows through the public API.

use chrono::{DateTime, Duration, TimeZone, Utc};

use retain::engine::{classify, personal_score};
use retain::{
    apply_review, build_session, next_schedule, FullProgress, PersonalCounters, ProgressUpdater,
    QueueEntry, ReviewGrade, ReviewInput, SchedulingState, TrendDirection, WordState,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap()
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn scenario_a_fresh_item_good() {
    let state = next_schedule(&SchedulingState::default(), ReviewGrade::Good, now());

    assert_eq!(state.repetitions, 1);
    assert_eq!(state.interval_days, 1);
    assert!((state.ease_factor - 2.5).abs() < 1e-9);
    assert_eq!(state.next_review_at, Some(now() + Duration::days(1)));
    assert_eq!(classify(&state, now()), WordState::Learning);
}

#[test]
fn scenario_b_second_success_jumps_to_six_days() {
    let prior = SchedulingState {
        ease_factor: 2.5,
        interval_days: 1,
        repetitions: 1,
        next_review_at: Some(now()),
        last_grade: Some(ReviewGrade::Good),
    };

    let state = next_schedule(&prior, ReviewGrade::Good, now());
    assert_eq!(state.interval_days, 6);
    assert_eq!(state.repetitions, 2);
}

#[test]
fn scenario_c_forgotten_strong_item_classifies_as_new() {
    let prior = SchedulingState {
        ease_factor: 2.4,
        interval_days: 25,
        repetitions: 6,
        next_review_at: Some(now()),
        last_grade: Some(ReviewGrade::Good),
    };
    let input = ReviewInput::first_review(ReviewGrade::Forgot, 40)
        .with_scheduling(prior.clone())
        .with_counters(PersonalCounters::new(6, 0));

    let progress = apply_review(&input, now());

    assert_eq!(progress.scheduling.repetitions, 0);
    assert_eq!(progress.scheduling.interval_days, 0);
    assert_eq!(progress.word_state, WordState::New);

    // The same failure classified against the pre-reset counts is decay.
    let stale = SchedulingState {
        last_grade: Some(ReviewGrade::Forgot),
        ..prior
    };
    assert_eq!(classify(&stale, now()), WordState::Decaying);
}

#[test]
fn scenario_d_personal_score() {
    let state = SchedulingState {
        ease_factor: 2.5,
        interval_days: 40,
        repetitions: 10,
        next_review_at: Some(now() + Duration::days(3)),
        last_grade: Some(ReviewGrade::Good),
    };
    let counters = PersonalCounters::new(10, 2);

    // 60 - min(15, 17) + round(2/12 * 10) + 0
    assert_eq!(personal_score(60, &counters, &state, now()), 47);
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn lifecycle_learn_master_decay_relearn() {
    let updater = ProgressUpdater::default();
    let mut progress = updater.apply_review(&ReviewInput::first_review(ReviewGrade::Good, 70), now());
    let mut states = vec![progress.word_state];

    for _ in 0..4 {
        let due = progress.scheduling.next_review_at.unwrap();
        progress = updater.apply_review(&progress.next_input(ReviewGrade::Good, 70), due);
        states.push(progress.word_state);
    }

    assert_eq!(
        states,
        vec![
            WordState::Learning,
            WordState::Learning,
            WordState::Stabilizing,
            WordState::Stabilizing,
            WordState::Mastered,
        ]
    );
    assert_eq!(progress.scheduling.interval_days, 95);
    assert_eq!(progress.personal_score, 70 - 13);

    // The learner disappears for three weeks past the due date
    let due = progress.scheduling.next_review_at.unwrap();
    let late = due + Duration::days(21);
    assert_eq!(classify(&progress.scheduling, late), WordState::Decaying);

    progress = updater.apply_review(&progress.next_input(ReviewGrade::Forgot, 70), late);
    assert_eq!(progress.word_state, WordState::New);
    assert!((progress.scheduling.ease_factor - 1.7).abs() < 1e-9);
    assert_eq!(progress.scheduling.next_review_at, Some(late));
    assert_eq!(progress.counters, PersonalCounters::new(5, 1));

    progress = updater.apply_review(&progress.next_input(ReviewGrade::Good, 70), late);
    assert_eq!(progress.word_state, WordState::Learning);
    assert_eq!(progress.scheduling.interval_days, 1);
    assert_eq!(
        progress.recent_history,
        vec![true, false, true, true, true, true, true]
    );
}

#[test]
fn years_of_easy_reviews_stay_within_the_interval_cap() {
    let updater = ProgressUpdater::default();
    let mut progress = updater.apply_review(&ReviewInput::first_review(ReviewGrade::Easy, 50), now());
    let mut intervals = vec![progress.scheduling.interval_days];

    for _ in 0..39 {
        let due = progress.scheduling.next_review_at.unwrap();
        progress = updater.apply_review(&progress.next_input(ReviewGrade::Easy, 50), due);
        intervals.push(progress.scheduling.interval_days);
    }

    assert_eq!(&intervals[..4], &[1, 6, 16, 45]);
    assert!(intervals.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(*intervals.last().unwrap(), 36_500);
    assert!(progress.scheduling.next_review_at.unwrap() > now());
    assert_eq!(progress.word_state, WordState::Mastered);
}

#[test]
fn trend_turns_harder_after_repeated_failures() {
    let updater = ProgressUpdater::default();
    let mut progress = updater.apply_review(&ReviewInput::first_review(ReviewGrade::Easy, 30), now());
    let mut at = now();

    for grade in [ReviewGrade::Good, ReviewGrade::Good] {
        at += Duration::days(1);
        progress = updater.apply_review(&progress.next_input(grade, 30), at);
    }
    assert_eq!(progress.trend, TrendDirection::Stable);

    for _ in 0..3 {
        at += Duration::hours(1);
        progress = updater.apply_review(&progress.next_input(ReviewGrade::Forgot, 30), at);
    }

    assert_eq!(progress.recent_history, vec![false, false, false, true, true, true]);
    assert_eq!(progress.trend, TrendDirection::Harder);
}

#[test]
fn session_after_reviews() {
    let updater = ProgressUpdater::default();
    let forgot = updater.apply_review(&ReviewInput::first_review(ReviewGrade::Forgot, 50), now());
    let good = updater.apply_review(&ReviewInput::first_review(ReviewGrade::Good, 50), now());

    let entries = vec![
        QueueEntry::new("good", good.scheduling),
        QueueEntry::unseen("unseen"),
        QueueEntry::new("forgot", forgot.scheduling),
    ];

    let today: Vec<&str> = build_session(entries.clone(), now(), None)
        .into_iter()
        .map(|e| e.item)
        .collect();
    assert_eq!(today, vec!["forgot", "unseen"]);

    let tomorrow: Vec<&str> = build_session(entries, now() + Duration::days(1), None)
        .into_iter()
        .map(|e| e.item)
        .collect();
    assert_eq!(tomorrow, vec!["forgot", "unseen", "good"]);
}

// =============================================================================
// Concurrency
// =============================================================================

/// Independent items can be updated from parallel threads with one shared
/// updater. Reviews of the same item are chained by the caller, so each
/// thread owns its item's progress for the whole run.
#[test]
fn independent_items_in_parallel_match_sequential() {
    let updater = ProgressUpdater::default();
    let plans: Vec<Vec<ReviewGrade>> = (0..8)
        .map(|i| {
            (0..12)
                .map(|j| ReviewGrade::ALL[(i * 7 + j * 3) % ReviewGrade::ALL.len()])
                .collect()
        })
        .collect();

    let run = |grades: &[ReviewGrade]| -> FullProgress {
        let mut at = now();
        let mut progress = updater.apply_review(&ReviewInput::first_review(grades[0], 50), at);
        for &grade in &grades[1..] {
            at = progress.scheduling.next_review_at.unwrap_or(at);
            progress = updater.apply_review(&progress.next_input(grade, 50), at);
        }
        progress
    };

    let sequential: Vec<FullProgress> = plans.iter().map(|p| run(p)).collect();

    let parallel: Vec<FullProgress> = std::thread::scope(|scope| {
        let handles: Vec<_> = plans
            .iter()
            .map(|plan| scope.spawn(|| run(plan)))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(parallel, sequential);
}
