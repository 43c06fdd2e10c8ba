//! Integration tests for streak accounting against real and failing stores.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::Mutex;

use detox_core::error::StoreError;
use detox_core::storage::{keys, WritePolicy};
use detox_core::{
    CompletionOutcome, Config, CoreError, DetoxEngine, DetoxStats, Event, FixedClock,
    KeyValueStore, MemoryStore, SettingsPatch, SqliteStore,
};

/// Memory store whose writes can be switched to fail.
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    fail_writes: AtomicBool,
}

impl FlakyStore {
    fn fail(&self, on: bool) {
        self.fail_writes.store(on, Ordering::SeqCst);
    }
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::WriteFailed {
                key: key.to_string(),
                message: "disk full".into(),
            });
        }
        self.inner.set(key, value).await
    }
}

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn config_with(policy: WritePolicy) -> Config {
    let mut config = Config::default();
    config.persistence.write_policy = policy;
    config
}

#[tokio::test]
async fn test_streak_over_a_week_with_a_gap() {
    let clock = FixedClock::at(date("2026-03-02"), 8, 0);
    let store = Arc::new(MemoryStore::new());
    let mut engine = DetoxEngine::load(store, Arc::new(clock.clone()), &Config::default())
        .await
        .unwrap();

    for _ in 0..3 {
        engine.complete_detox_day().await.unwrap();
        clock.advance(Duration::days(1));
    }
    assert_eq!(engine.stats().current_streak, 3);

    // Skip a day.
    clock.advance(Duration::days(1));
    let outcome = engine.complete_detox_day().await.unwrap();
    assert_eq!(outcome, CompletionOutcome::Started);
    assert_eq!(engine.stats().current_streak, 1);
    assert_eq!(engine.stats().longest_streak, 3);
    assert_eq!(engine.stats().total_detox_days, 4);
}

#[tokio::test]
async fn test_reset_streak_keeps_history_counters() {
    let clock = FixedClock::at(date("2026-03-10"), 8, 0);
    let mut engine = DetoxEngine::load(
        Arc::new(MemoryStore::new()),
        Arc::new(clock),
        &Config::default(),
    )
    .await
    .unwrap();
    engine.complete_detox_day_on(date("2026-03-09")).await.unwrap();
    engine.complete_detox_day_on(date("2026-03-10")).await.unwrap();

    let previous = engine.reset_streak().await.unwrap();
    assert_eq!(previous, 2);
    assert_eq!(
        engine.stats(),
        &DetoxStats {
            current_streak: 0,
            longest_streak: 2,
            total_detox_days: 2,
            last_completed_date: Some(date("2026-03-10")),
        }
    );

    // Completing again on the same day is still a no-op.
    let outcome = engine.complete_detox_day().await.unwrap();
    assert_eq!(outcome, CompletionOutcome::AlreadyCompleted);
    assert_eq!(engine.stats().current_streak, 0);
}

#[tokio::test]
async fn test_commit_after_write_keeps_memory_on_failure() {
    let store = Arc::new(FlakyStore::default());
    let clock = FixedClock::at(date("2026-03-10"), 8, 0);
    let mut engine = DetoxEngine::load(
        store.clone(),
        Arc::new(clock),
        &config_with(WritePolicy::CommitAfterWrite),
    )
    .await
    .unwrap();

    store.fail(true);
    let err = engine.complete_detox_day().await.unwrap_err();
    assert!(matches!(err, CoreError::Store(StoreError::WriteFailed { .. })));
    assert_eq!(engine.stats(), &DetoxStats::default());
    assert!(engine.take_events().iter().any(|e| matches!(
        e,
        Event::PersistFailed { committed: false, .. }
    )));

    // Retrying after recovery succeeds from the untouched state.
    store.fail(false);
    engine.complete_detox_day().await.unwrap();
    assert_eq!(engine.stats().total_detox_days, 1);
}

#[tokio::test]
async fn test_optimistic_runs_one_mutation_ahead() {
    let store = Arc::new(FlakyStore::default());
    let clock = FixedClock::at(date("2026-03-10"), 8, 0);
    let mut engine = DetoxEngine::load(
        store.clone(),
        Arc::new(clock),
        &config_with(WritePolicy::Optimistic),
    )
    .await
    .unwrap();

    store.fail(true);
    assert!(engine.complete_detox_day().await.is_err());
    assert_eq!(engine.stats().current_streak, 1);
    assert!(store.get(keys::DETOX_STATS).await.unwrap().is_none());
    assert!(engine.take_events().iter().any(|e| matches!(
        e,
        Event::PersistFailed { committed: true, .. }
    )));

    // A failed settings write is also visible in memory only.
    assert!(engine.toggle_enabled().await.is_err());
    assert!(!engine.settings().enabled);
    assert!(store.get(keys::DETOX_SETTINGS).await.unwrap().is_none());
}

#[tokio::test]
async fn test_serialized_concurrent_updates_last_write_wins() {
    let clock = FixedClock::at(date("2026-03-10"), 8, 0);
    let store = Arc::new(MemoryStore::new());
    let engine = DetoxEngine::load(store.clone(), Arc::new(clock), &Config::default())
        .await
        .unwrap();
    let engine = Arc::new(Mutex::new(engine));

    let mut handles = Vec::new();
    for end in ["10:00", "11:00", "12:00"] {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            let mut guard = engine.lock().await;
            let result = guard
                .update_settings(SettingsPatch {
                    end_time: Some(end.to_string()),
                    ..SettingsPatch::default()
                })
                .await
                .map(|s| s.end_time.clone());
            result
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let guard = engine.lock().await;
    let stored = store.get(keys::DETOX_SETTINGS).await.unwrap().unwrap();
    // Memory and store agree on whichever write landed last.
    assert_eq!(stored["endTime"], guard.settings().end_time.as_str());
    assert_eq!(stored["startTime"], "06:00");
}

#[tokio::test]
async fn test_sqlite_store_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("detox.db");
    let clock = FixedClock::at(date("2026-03-10"), 8, 0);

    {
        let store = Arc::new(SqliteStore::open_at(&path).unwrap());
        let mut engine = DetoxEngine::load(store, Arc::new(clock.clone()), &Config::default())
            .await
            .unwrap();
        engine.set_start_time("22:00").await.unwrap();
        engine.set_end_time("06:00").await.unwrap();
        engine.complete_detox_day_on(date("2026-03-09")).await.unwrap();
        engine.complete_detox_day().await.unwrap();
    }

    let store = Arc::new(SqliteStore::open_at(&path).unwrap());
    let engine = DetoxEngine::load(store, Arc::new(clock), &Config::default())
        .await
        .unwrap();
    assert_eq!(engine.settings().start_time, "22:00");
    assert_eq!(engine.settings().end_time, "06:00");
    assert_eq!(engine.stats().current_streak, 2);
    assert_eq!(engine.stats().last_completed_date, Some(date("2026-03-10")));
}
