//! Integration tests for the lock state machine over a simulated morning.

use chrono::{Duration, NaiveDate};
use std::sync::Arc;

use detox_core::detox::{DetoxController, LockExitReason};
use detox_core::storage::{keys, ExpiryPolicy};
use detox_core::{
    BypassOutcome, Config, DayPhase, DetoxEngine, Event, FixedClock, KeyValueStore, MemoryStore,
};

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

async fn controller_at(clock: &FixedClock, store: Arc<MemoryStore>, config: &Config) -> DetoxController {
    let engine = DetoxEngine::load(store, Arc::new(clock.clone()), config)
        .await
        .unwrap();
    DetoxController::new(engine, config).await.unwrap()
}

#[tokio::test]
async fn test_minute_ticks_through_a_morning() {
    let clock = FixedClock::at(date("2026-03-10"), 5, 0);
    let store = Arc::new(MemoryStore::new());
    let mut controller = controller_at(&clock, store.clone(), &Config::default()).await;

    let mut locked_minutes = 0;
    for _ in 0..(5 * 60) {
        if controller.tick().await.unwrap() == DayPhase::Locked {
            locked_minutes += 1;
        }
        clock.advance(Duration::minutes(1));
    }
    // 06:00 through 09:00 inclusive.
    assert_eq!(locked_minutes, 181);

    let events = controller.take_events();
    let entered = events.iter().filter(|e| matches!(e, Event::LockEntered { .. })).count();
    let exited: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            Event::LockExited { reason, .. } => Some(*reason),
            _ => None,
        })
        .collect();
    assert_eq!(entered, 1);
    assert_eq!(exited, vec![LockExitReason::Expired]);

    let history = store.get(keys::DETOX_HISTORY).await.unwrap().unwrap();
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["completed"], false);
}

#[tokio::test]
async fn test_three_bypasses_then_next_day() {
    let clock = FixedClock::at(date("2026-03-10"), 7, 0);
    let store = Arc::new(MemoryStore::new());
    let mut controller = controller_at(&clock, store.clone(), &Config::default()).await;
    controller
        .engine_mut()
        .complete_detox_day_on(date("2026-03-09"))
        .await
        .unwrap();

    for _ in 0..2 {
        assert!(matches!(
            controller.bypass().await.unwrap(),
            BypassOutcome::Warned { .. }
        ));
    }
    assert_eq!(
        controller.bypass().await.unwrap(),
        BypassOutcome::Released { attempts: 3 }
    );
    assert_eq!(controller.engine().stats().current_streak, 0);

    let history = store.get(keys::DETOX_HISTORY).await.unwrap().unwrap();
    assert_eq!(history[0]["bypassCount"], 3);

    // The next morning locks again with a fresh attempt count.
    clock.set(date("2026-03-11").and_hms_opt(6, 30, 0).unwrap());
    controller.tick().await.unwrap();
    assert!(controller.is_locked());
    assert_eq!(controller.session().unwrap().bypass_attempts, 0);

    controller.complete().await.unwrap();
    assert_eq!(controller.engine().stats().current_streak, 1);
    assert_eq!(controller.engine().stats().total_detox_days, 2);
}

#[tokio::test]
async fn test_overnight_window_with_expiry_credit() {
    let clock = FixedClock::at(date("2026-03-10"), 21, 59);
    let store = Arc::new(MemoryStore::new());
    let mut config = Config::default();
    config.lock.expiry = ExpiryPolicy::Complete;
    let mut controller = controller_at(&clock, store, &config).await;
    controller.engine_mut().set_start_time("22:00").await.unwrap();
    controller.engine_mut().set_end_time("06:00").await.unwrap();

    assert_eq!(controller.tick().await.unwrap(), DayPhase::Inactive);
    clock.advance(Duration::minutes(1));
    assert_eq!(controller.tick().await.unwrap(), DayPhase::Locked);

    clock.set(date("2026-03-11").and_hms_opt(2, 0, 0).unwrap());
    assert_eq!(controller.tick().await.unwrap(), DayPhase::Locked);
    let progress = controller.progress().unwrap();
    assert_eq!(progress.total_minutes, 480);
    assert_eq!(progress.remaining_minutes, 240);
    assert_eq!(progress.label, "4h 0m");

    clock.set(date("2026-03-11").and_hms_opt(6, 1, 0).unwrap());
    assert_eq!(controller.tick().await.unwrap(), DayPhase::Inactive);
    let stats = controller.engine().stats();
    assert_eq!(stats.current_streak, 1);
    assert_eq!(stats.last_completed_date, Some(date("2026-03-11")));

    let week = controller.history().unwrap().weekly_summary(date("2026-03-11"));
    assert_eq!(week.completed_days, 1);
    assert_eq!(week.total_minutes, 481);
}

#[tokio::test]
async fn test_disabled_detox_never_locks() {
    let clock = FixedClock::at(date("2026-03-10"), 7, 0);
    let store = Arc::new(MemoryStore::new());
    let mut controller = controller_at(&clock, store, &Config::default()).await;
    controller.engine_mut().toggle_enabled().await.unwrap();

    assert_eq!(controller.tick().await.unwrap(), DayPhase::Inactive);
    assert_eq!(controller.bypass().await.unwrap(), BypassOutcome::NotLocked);
}
