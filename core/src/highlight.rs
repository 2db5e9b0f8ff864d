//! "Newly added" detection with a timed highlight window.
//!
//! # Design
//! Each evaluation diffs the current id set against the set seen at the
//! previous evaluation, and the baseline is replaced every time. Ids that
//! appear form a new batch: the batch replaces whatever was highlighted and
//! schedules one expiry task. Starting a batch aborts the previous task, and
//! the task also checks its batch number before clearing, so a superseded
//! task can never clear a newer batch.
//!
//! The first evaluation only records the baseline; the collection loaded at
//! startup is not "new".

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

pub const HIGHLIGHT_WINDOW: Duration = Duration::from_millis(2000);

#[derive(Debug, Default)]
struct HighlightState {
    baseline: Option<HashSet<i64>>,
    highlighted: HashSet<i64>,
    batch: u64,
    expiry: Option<JoinHandle<()>>,
}

#[derive(Debug)]
pub struct Highlighter {
    window: Duration,
    state: Arc<Mutex<HighlightState>>,
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new(HIGHLIGHT_WINDOW)
    }
}

impl Highlighter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            state: Arc::new(Mutex::new(HighlightState::default())),
        }
    }

    /// Record the current collection and return the ids that are new since
    /// the previous call. Must run inside a tokio runtime when a batch
    /// starts.
    pub async fn observe<I>(&self, ids: I) -> HashSet<i64>
    where
        I: IntoIterator<Item = i64>,
    {
        let current: HashSet<i64> = ids.into_iter().collect();
        let mut state = self.state.lock().await;
        let Some(previous) = state.baseline.replace(current.clone()) else {
            return HashSet::new();
        };

        let fresh: HashSet<i64> = current.difference(&previous).copied().collect();
        if fresh.is_empty() {
            return fresh;
        }

        if let Some(expiry) = state.expiry.take() {
            expiry.abort();
        }
        state.batch += 1;
        state.highlighted = fresh.clone();

        let batch = state.batch;
        let window = self.window;
        let shared = Arc::clone(&self.state);
        state.expiry = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let mut state = shared.lock().await;
            if state.batch == batch {
                state.highlighted.clear();
                state.expiry = None;
                tracing::debug!(batch, "highlight expired");
            }
        }));
        tracing::debug!(batch, ids = ?fresh, "highlighting new todos");
        fresh
    }

    pub async fn highlighted(&self) -> HashSet<i64> {
        self.state.lock().await.highlighted.clone()
    }

    pub async fn is_highlighted(&self, id: i64) -> bool {
        self.state.lock().await.highlighted.contains(&id)
    }
}

impl Drop for Highlighter {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.try_lock() {
            if let Some(expiry) = state.expiry.take() {
                expiry.abort();
            }
        }
    }
}
