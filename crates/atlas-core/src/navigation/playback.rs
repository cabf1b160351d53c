//! Timer scheduling for autoplay
//!
//! The controller never owns a clock. It asks a [`PlaybackScheduler`] for a
//! repeating timer and receives a [`TimerToken`]; the host delivers each tick
//! back through `ViewportController::tick`. Ticks carrying a token that is no
//! longer active are ignored, so a cancelled timer can never advance the year.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ahash::AHashMap;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Identifies one repeating timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

impl TimerToken {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Source of repeating ticks
pub trait PlaybackScheduler: Send + Sync {
    /// Start a repeating timer firing every `interval`
    fn schedule(&self, interval: Duration) -> TimerToken;

    /// Stop a timer; unknown or already cancelled tokens are ignored
    fn cancel(&self, token: TimerToken);
}

/// Scheduler driven by hand, for tests and step-through hosts
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: AtomicU64,
    active: Mutex<Vec<(TimerToken, Duration)>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timers that are currently scheduled
    pub fn active(&self) -> Vec<TimerToken> {
        self.active.lock().iter().map(|(token, _)| *token).collect()
    }

    /// Interval of a scheduled timer
    pub fn interval_of(&self, token: TimerToken) -> Option<Duration> {
        self.active
            .lock()
            .iter()
            .find(|(t, _)| *t == token)
            .map(|(_, interval)| *interval)
    }
}

impl PlaybackScheduler for ManualScheduler {
    fn schedule(&self, interval: Duration) -> TimerToken {
        let token = TimerToken(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.active.lock().push((token, interval));
        token
    }

    fn cancel(&self, token: TimerToken) {
        self.active.lock().retain(|(t, _)| *t != token);
    }
}

/// Scheduler backed by tokio interval tasks.
///
/// Tokens of firing timers are sent to the receiver returned by
/// [`TokioScheduler::new`]; the host forwards them to the controller.
pub struct TokioScheduler {
    runtime_handle: tokio::runtime::Handle,
    sender: mpsc::UnboundedSender<TimerToken>,
    next_id: AtomicU64,
    tasks: Arc<Mutex<AHashMap<TimerToken, JoinHandle<()>>>>,
}

impl TokioScheduler {
    /// Create a scheduler spawning on `runtime_handle`
    pub fn new(
        runtime_handle: tokio::runtime::Handle,
    ) -> (Self, mpsc::UnboundedReceiver<TimerToken>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let scheduler = Self {
            runtime_handle,
            sender,
            next_id: AtomicU64::new(0),
            tasks: Arc::new(Mutex::new(AHashMap::new())),
        };
        (scheduler, receiver)
    }
}

impl PlaybackScheduler for TokioScheduler {
    fn schedule(&self, interval: Duration) -> TimerToken {
        let token = TimerToken(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let sender = self.sender.clone();
        // tokio rejects a zero period
        let interval = interval.max(Duration::from_millis(1));

        let task = self.runtime_handle.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if sender.send(token).is_err() {
                    break;
                }
            }
        });

        debug!(token = token.0, ?interval, "Playback timer scheduled");
        self.tasks.lock().insert(token, task);
        token
    }

    fn cancel(&self, token: TimerToken) {
        if let Some(task) = self.tasks.lock().remove(&token) {
            debug!(token = token.0, "Playback timer cancelled");
            task.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, task) in self.tasks.lock().drain() {
            task.abort();
        }
    }
}
