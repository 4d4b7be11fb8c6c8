//! Periodic forced refresh.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::fetch::TimestampedFetch;
use crate::store::WeatherStore;
use crate::types::Coordinate;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

struct ActivePoll {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Runs at most one refresh loop at a time and publishes every result.
///
/// Each iteration fetches remotely (bypassing the cache-first read),
/// publishes the outcome, then waits the full interval, failures included.
/// Cancellation is observed while waiting and before publishing; an
/// in-flight fetch runs to completion but its result is dropped. A
/// restarted loop waits for the replaced one to exit before its first
/// fetch, so fetches never overlap.
///
/// Must be used from within a Tokio runtime.
pub struct PollingController {
    store: WeatherStore,
    tx: Arc<watch::Sender<TimestampedFetch>>,
    active: Mutex<Option<ActivePoll>>,
}

impl PollingController {
    pub fn new(store: WeatherStore) -> Self {
        let (tx, _rx) = watch::channel(TimestampedFetch::loading());
        Self {
            store,
            tx: Arc::new(tx),
            active: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<TimestampedFetch> {
        self.tx.subscribe()
    }

    /// The most recently published result (`Loading` before the first).
    pub fn latest(&self) -> TimestampedFetch {
        self.tx.borrow().clone()
    }

    /// Start polling `coordinate`, replacing any running loop.
    pub fn start_polling(&self, coordinate: Coordinate, interval: Duration) {
        let mut active = self.active.lock();
        let previous = active.take().map(|previous| {
            previous.token.cancel();
            tracing::debug!("Cancelled previous poll loop");
            previous.handle
        });

        let token = CancellationToken::new();
        let handle = tokio::spawn(poll_loop(
            self.store.clone(),
            self.tx.clone(),
            coordinate,
            interval,
            token.clone(),
            previous,
        ));

        tracing::info!("Started polling {} every {:?}", coordinate, interval);
        *active = Some(ActivePoll { token, handle });
    }

    /// Stop the running loop. Returns false if nothing was running.
    ///
    /// The cancelled loop stays recorded so a later start still waits for
    /// its in-flight fetch.
    pub fn stop_polling(&self) -> bool {
        match self.active.lock().as_ref() {
            Some(current) if !current.token.is_cancelled() => {
                current.token.cancel();
                tracing::info!("Stopped polling");
                true
            }
            _ => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.active
            .lock()
            .as_ref()
            .is_some_and(|a| !a.token.is_cancelled() && !a.handle.is_finished())
    }
}

impl Drop for PollingController {
    fn drop(&mut self) {
        if let Some(previous) = self.active.get_mut().take() {
            previous.token.cancel();
        }
    }
}

async fn poll_loop(
    store: WeatherStore,
    tx: Arc<watch::Sender<TimestampedFetch>>,
    coordinate: Coordinate,
    interval: Duration,
    token: CancellationToken,
    previous: Option<JoinHandle<()>>,
) {
    if let Some(previous) = previous {
        if let Err(e) = previous.await {
            tracing::warn!("Previous poll loop ended abnormally: {}", e);
        }
    }

    let mut iteration: u64 = 0;

    while !token.is_cancelled() {
        iteration += 1;
        let state = store.refresh(coordinate).await;

        let success = state.is_success();
        let published = tx.send_if_modified(|latest| {
            if token.is_cancelled() {
                return false;
            }
            *latest = TimestampedFetch::now(state);
            true
        });
        if !published {
            tracing::debug!("Poll loop cancelled during fetch; dropping result");
            break;
        }

        tracing::debug!(
            "Poll iteration {} finished (success: {})",
            iteration,
            success
        );

        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    tracing::debug!("Poll loop exited after {} iterations", iteration);
}
