//! Streaming engine: fetch → observe → dispatch → stall check.
//!
//! Epistemic foundation:
//! - K_i: Events are handled strictly in feed order, one at a time
//! - K_i: Every row (marker or data) resets the stall clock
//! - B_i: Feed keeps producing rows → bounded by the stall timeout
//! - I^B: Any dispatch or feed error ends the loop; restart resumes from checkpoint

use crate::feed::ChangeFeed;
use crate::models::{Result, StreamStats, Timestamp};
use crate::pipeline::{Dispatcher, StallMonitor};
use std::time::Duration;
use tracing::{debug, error, info};

/// Why the engine stopped without an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shutdown {
    /// No rows for longer than the stall timeout
    Stalled {
        idle: Duration,
        last_timestamp: Option<Timestamp>,
    },
}

/// Drives a change feed through the dispatcher.
pub struct Engine<F: ChangeFeed> {
    feed: F,
    dispatcher: Dispatcher,
    stall: StallMonitor,
}

impl<F: ChangeFeed> Engine<F> {
    pub fn new(feed: F, dispatcher: Dispatcher, stall_timeout: Duration) -> Self {
        Self {
            feed,
            dispatcher,
            stall: StallMonitor::new(stall_timeout),
        }
    }

    /// One fetch iteration. `Ok(Some(_))` means the engine must stop.
    pub async fn step(&mut self) -> Result<Option<Shutdown>> {
        let events = self.feed.fetch().await?;
        self.dispatcher.stats_mut().fetches += 1;

        for event in &events {
            self.stall.observe(event.timestamp());
            let stats = self.dispatcher.stats_mut();
            stats.rows_seen += 1;

            if event.is_progress() {
                stats.progress_markers += 1;
                debug!(timestamp = event.timestamp(), "Progress marker");
                continue;
            }

            debug!(
                timestamp = event.timestamp(),
                diff = ?event.diff_sign(),
                "Data row"
            );
            self.dispatcher.dispatch(event).await?;
        }

        if let Some(idle) = self.stall.check() {
            let last_timestamp = self.stall.last_timestamp();
            error!(
                idle_secs = idle.as_secs(),
                last_timestamp,
                "No progress from the feed, giving up"
            );
            return Ok(Some(Shutdown::Stalled {
                idle,
                last_timestamp,
            }));
        }

        Ok(None)
    }

    /// Loop until a shutdown condition or an error.
    pub async fn run(&mut self) -> Result<Shutdown> {
        info!(
            resume_from = self.dispatcher.high_water(),
            "Streaming change feed"
        );
        loop {
            if let Some(shutdown) = self.step().await? {
                let stats = self.stats();
                info!(
                    fetches = stats.fetches,
                    rows = stats.rows_seen,
                    data_rows = stats.data_rows(),
                    triggers = stats.triggers,
                    deletes = stats.deletes,
                    checkpoints = stats.checkpoints_written,
                    "Engine stopped"
                );
                return Ok(shutdown);
            }
        }
    }

    pub fn stats(&self) -> &StreamStats {
        self.dispatcher.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::{CheckpointStore, MemoryBackend};
    use crate::client::{DispatchIntent, DryRunNotifier};
    use crate::models::{ChangeEvent, IdempotencyKey, NotifyError};
    use crate::pipeline::{RecipientResolver, Transformer};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Arc;

    /// Scripted batches, then quiet fetches that each take one second.
    struct ScriptedFeed {
        batches: VecDeque<Result<Vec<ChangeEvent>>>,
    }

    impl ScriptedFeed {
        fn new(batches: Vec<Vec<ChangeEvent>>) -> Self {
            Self {
                batches: batches.into_iter().map(Ok).collect(),
            }
        }
    }

    #[async_trait]
    impl ChangeFeed for ScriptedFeed {
        async fn fetch(&mut self) -> Result<Vec<ChangeEvent>> {
            match self.batches.pop_front() {
                Some(batch) => batch,
                None => {
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    Ok(Vec::new())
                }
            }
        }
    }

    fn row(values: &[&str]) -> Vec<Option<String>> {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    fn engine(
        feed: ScriptedFeed,
        notifier: &DryRunNotifier,
        backend: &MemoryBackend,
        send_retractions: bool,
        stall_timeout: Duration,
    ) -> Engine<ScriptedFeed> {
        let dispatcher = Dispatcher::new(
            Transformer::new(vec!["user".to_string(), "msg".to_string()]),
            RecipientResolver::new(Some("user".to_string()), Vec::new(), ",".to_string()),
            Arc::new(notifier.clone()),
            CheckpointStore::new(Box::new(backend.clone()), Duration::from_secs(3600)),
            "alert".to_string(),
            send_retractions,
            50,
        );
        Engine::new(feed, dispatcher, stall_timeout)
    }

    fn key_ax() -> IdempotencyKey {
        IdempotencyKey::from_values([Some("a"), Some("x")])
    }

    #[tokio::test]
    async fn test_insert_between_markers_triggers_once() {
        let notifier = DryRunNotifier::new();
        let backend = MemoryBackend::with_value(0);
        let feed = ScriptedFeed::new(vec![vec![
            ChangeEvent::Progress { timestamp: 100 },
            ChangeEvent::Insert {
                timestamp: 150,
                columns: row(&["a", "x"]),
            },
            ChangeEvent::Progress { timestamp: 160 },
        ]]);
        let mut engine = engine(feed, &notifier, &backend, false, Duration::from_secs(600));

        assert_eq!(engine.step().await.unwrap(), None);

        let intents = notifier.intents();
        assert_eq!(intents.len(), 1);
        assert!(matches!(intents[0], DispatchIntent::Trigger { .. }));
        assert_eq!(intents[0].key(), &key_ax());
        assert_eq!(backend.value(), Some(150));
        assert_eq!(backend.writes(), vec![150]);

        let stats = engine.stats();
        assert_eq!(stats.rows_seen, 3);
        assert_eq!(stats.progress_markers, 2);
        assert_eq!(stats.triggers, 1);
    }

    #[tokio::test]
    async fn test_disabled_retraction_advances_checkpoint() {
        let notifier = DryRunNotifier::new();
        let backend = MemoryBackend::with_value(0);
        let feed = ScriptedFeed::new(vec![vec![ChangeEvent::Retraction {
            timestamp: 200,
            columns: row(&["a", "x"]),
        }]]);
        let mut engine = engine(feed, &notifier, &backend, false, Duration::from_secs(600));

        engine.step().await.unwrap();

        assert!(notifier.intents().is_empty());
        assert_eq!(backend.value(), Some(200));
        assert_eq!(engine.stats().retractions_skipped, 1);
        assert_eq!(engine.stats().data_rows(), 1);
    }

    #[tokio::test]
    async fn test_enabled_retraction_deletes_with_insert_key() {
        let notifier = DryRunNotifier::new();
        let backend = MemoryBackend::with_value(0);
        let feed = ScriptedFeed::new(vec![vec![ChangeEvent::Retraction {
            timestamp: 200,
            columns: row(&["a", "x"]),
        }]]);
        let mut engine = engine(feed, &notifier, &backend, true, Duration::from_secs(600));

        engine.step().await.unwrap();

        assert_eq!(
            notifier.intents(),
            vec![DispatchIntent::Delete { key: key_ax() }]
        );
        assert_eq!(backend.value(), Some(200));
    }

    #[tokio::test]
    async fn test_markers_only_leave_checkpoint_alone() {
        let notifier = DryRunNotifier::new();
        let backend = MemoryBackend::with_value(0);
        let feed = ScriptedFeed::new(vec![
            vec![ChangeEvent::Progress { timestamp: 100 }],
            vec![ChangeEvent::Progress { timestamp: 300 }],
        ]);
        let mut engine = engine(feed, &notifier, &backend, false, Duration::from_secs(600));

        engine.step().await.unwrap();
        engine.step().await.unwrap();

        assert!(backend.writes().is_empty());
        assert_eq!(engine.stats().fetches, 2);
    }

    #[tokio::test]
    async fn test_dispatch_error_stops_engine() {
        let notifier = DryRunNotifier::new();
        let backend = MemoryBackend::with_value(0);
        let feed = ScriptedFeed::new(vec![vec![
            ChangeEvent::Insert {
                timestamp: 150,
                columns: row(&["a"]),
            },
            ChangeEvent::Insert {
                timestamp: 160,
                columns: row(&["b", "y"]),
            },
        ]]);
        let mut engine = engine(feed, &notifier, &backend, false, Duration::from_secs(600));

        assert!(matches!(
            engine.run().await,
            Err(NotifyError::Transform { .. })
        ));
        assert!(notifier.intents().is_empty());
        assert!(backend.writes().is_empty());
    }

    #[tokio::test]
    async fn test_feed_error_propagates() {
        let notifier = DryRunNotifier::new();
        let backend = MemoryBackend::with_value(0);
        let feed = ScriptedFeed {
            batches: VecDeque::from(vec![Err(NotifyError::Decode("bad diff".to_string()))]),
        };
        let mut engine = engine(feed, &notifier, &backend, false, Duration::from_secs(600));

        assert!(matches!(engine.run().await, Err(NotifyError::Decode(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_feed_stalls() {
        let notifier = DryRunNotifier::new();
        let backend = MemoryBackend::with_value(0);
        let feed = ScriptedFeed::new(vec![vec![ChangeEvent::Progress { timestamp: 100 }]]);
        let mut engine = engine(feed, &notifier, &backend, false, Duration::from_secs(10));

        let shutdown = engine.run().await.unwrap();

        match shutdown {
            Shutdown::Stalled {
                idle,
                last_timestamp,
            } => {
                assert!(idle > Duration::from_secs(10));
                assert_eq!(last_timestamp, Some(100));
            }
        }
        assert!(notifier.intents().is_empty());
        assert!(engine.stats().fetches > 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_steady_markers_do_not_stall() {
        let notifier = DryRunNotifier::new();
        let backend = MemoryBackend::with_value(0);
        let feed = ScriptedFeed::new(Vec::new());
        let mut engine = engine(feed, &notifier, &backend, false, Duration::from_secs(5));

        for ts in 0..20 {
            engine
                .feed
                .batches
                .push_back(Ok(vec![ChangeEvent::Progress { timestamp: ts }]));
            tokio::time::sleep(Duration::from_secs(2)).await;
            assert_eq!(engine.step().await.unwrap(), None);
        }
    }
}
