//! Owned state behind the weather screen.
//!
//! `WeatherSession` is the only writer of [`SessionState`]; observers get
//! snapshots through a `watch` receiver. Poll results and connectivity
//! changes are folded into the state by background tasks that stop when
//! the session is disposed.

use std::sync::Arc;
use std::time::Duration;

use theweather_forecast::{
    ConnectivitySignal, Coordinate, FetchState, ForecastSnapshot, LocationError,
    LocationPermission, LocationProvider, PollingController, TimestampedFetch, WeatherStore,
};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct SessionState {
    pub location: Option<Coordinate>,
    /// Last location failure, cleared once a coordinate is known.
    pub location_error: Option<LocationError>,
    pub connected: bool,
    /// `None` until the cache has been checked.
    pub cached_available: Option<bool>,
    pub permission: LocationPermission,
    pub weather: TimestampedFetch,
    pub cached: Option<ForecastSnapshot>,
    pub polling: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            location: None,
            location_error: None,
            connected: true,
            cached_available: None,
            permission: LocationPermission::Undetermined,
            weather: TimestampedFetch::loading(),
            cached: None,
            polling: false,
        }
    }
}

/// Must be created inside a Tokio runtime.
pub struct WeatherSession {
    store: WeatherStore,
    poller: PollingController,
    tx: Arc<watch::Sender<SessionState>>,
    shutdown: CancellationToken,
}

impl WeatherSession {
    pub fn new(store: WeatherStore) -> Self {
        let poller = PollingController::new(store.clone());
        let (tx, _rx) = watch::channel(SessionState::default());
        let tx = Arc::new(tx);
        let shutdown = CancellationToken::new();

        tokio::spawn(forward_poll_results(
            poller.subscribe(),
            tx.clone(),
            shutdown.clone(),
        ));

        Self {
            store,
            poller,
            tx,
            shutdown,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    pub async fn check_cached_availability(&self) -> bool {
        let available = self.store.has_cached_forecast().await;
        self.tx.send_modify(|s| s.cached_available = Some(available));
        available
    }

    pub async fn fetch_cached(&self) -> Option<ForecastSnapshot> {
        let cached = self.store.cached_forecast().await;
        let snapshot = cached.clone();
        self.tx.send_modify(|s| {
            s.cached_available = Some(snapshot.is_some());
            s.cached = snapshot;
        });
        cached
    }

    pub fn update_permission(&self, permission: LocationPermission) {
        tracing::debug!("Location permission: {:?}", permission);
        self.tx.send_modify(|s| s.permission = permission);
    }

    /// Resolve the device location once and remember it.
    pub async fn request_location(
        &self,
        provider: &dyn LocationProvider,
        timeout: Duration,
    ) -> Result<Coordinate, LocationError> {
        let denied = self.tx.borrow().permission == LocationPermission::Denied;
        if denied {
            tracing::warn!("Location permission not granted");
            self.tx
                .send_modify(|s| s.location_error = Some(LocationError::PermissionDenied));
            return Err(LocationError::PermissionDenied);
        }

        let result = theweather_forecast::request_location(provider, timeout).await;
        self.tx.send_modify(|s| match &result {
            Ok(coordinate) => {
                s.location = Some(*coordinate);
                s.location_error = None;
            }
            Err(e) => {
                if *e == LocationError::PermissionDenied {
                    s.permission = LocationPermission::Denied;
                }
                s.location_error = Some(e.clone());
            }
        });
        result
    }

    /// Cache-first fetch for `coordinate`, published as the latest result.
    pub async fn fetch_and_update(&self, coordinate: Coordinate) -> FetchState<ForecastSnapshot> {
        let state = self.store.get_forecast(coordinate).await;
        self.publish(state.clone());
        state
    }

    /// Forced fetch for the known location. Returns `None` when no
    /// location has been resolved yet.
    pub async fn refresh(&self) -> Option<FetchState<ForecastSnapshot>> {
        let location = self.tx.borrow().location;
        let Some(coordinate) = location else {
            tracing::debug!("Refresh skipped: no location yet");
            return None;
        };

        let state = self.store.refresh(coordinate).await;
        self.publish(state.clone());
        Some(state)
    }

    pub fn set_connected(&self, connected: bool) {
        apply_connected(&self.tx, connected);
    }

    /// Mirror `signal` into the state until the session is disposed.
    pub fn watch_connectivity(&self, signal: &ConnectivitySignal) {
        let mut rx = signal.subscribe();
        let current = *rx.borrow_and_update();
        self.set_connected(current);

        let tx = self.tx.clone();
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let connected = *rx.borrow_and_update();
                        apply_connected(&tx, connected);
                    }
                }
            }
        });
    }

    /// Start (or restart) polling the known location.
    ///
    /// Returns false when no location is known.
    pub fn start_periodic_fetching(&self, interval: Duration) -> bool {
        let location = self.tx.borrow().location;
        let Some(coordinate) = location else {
            tracing::warn!("Cannot start polling without a location");
            return false;
        };

        self.tx.send_modify(|s| s.polling = true);
        self.poller.start_polling(coordinate, interval);
        true
    }

    /// Start polling only if a location is known, the network is up and
    /// no loop is running yet.
    pub fn maybe_start_polling(&self, interval: Duration) -> bool {
        let (has_location, connected) = {
            let s = self.tx.borrow();
            (s.location.is_some(), s.connected)
        };

        if self.poller.is_running() {
            return false;
        }
        if !has_location || !connected {
            tracing::debug!(
                "Polling not started (location: {}, connected: {})",
                has_location,
                connected
            );
            return false;
        }

        self.start_periodic_fetching(interval)
    }

    pub fn is_polling(&self) -> bool {
        self.poller.is_running()
    }

    /// Stop polling. Results still in flight are discarded.
    pub fn stop(&self) -> bool {
        self.tx.send_modify(|s| s.polling = false);
        self.poller.stop_polling()
    }

    /// Stop polling and all background forwarding.
    pub fn dispose(&self) {
        self.stop();
        self.shutdown.cancel();
        tracing::info!("Weather session disposed");
    }

    fn publish(&self, state: FetchState<ForecastSnapshot>) {
        let fetch = TimestampedFetch::now(state);
        self.tx.send_modify(|s| apply_fetch(s, fetch));
    }
}

impl Drop for WeatherSession {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn apply_connected(tx: &watch::Sender<SessionState>, connected: bool) {
    tx.send_if_modified(|s| {
        if s.connected == connected {
            return false;
        }
        s.connected = connected;
        true
    });
}

/// A successful result also becomes the fallback shown when a later
/// fetch fails, matching what the store has just cached.
fn apply_fetch(s: &mut SessionState, fetch: TimestampedFetch) {
    if let FetchState::Success(snapshot) = &fetch.state {
        s.cached = Some(snapshot.clone());
        s.cached_available = Some(true);
    }
    s.weather = fetch;
}

async fn forward_poll_results(
    mut rx: watch::Receiver<TimestampedFetch>,
    tx: Arc<watch::Sender<SessionState>>,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let fetch = rx.borrow_and_update().clone();
                // Drop anything that lands after stop().
                tx.send_if_modified(|s| {
                    if !s.polling {
                        return false;
                    }
                    apply_fetch(s, fetch);
                    true
                });
            }
        }
    }
    tracing::debug!("Poll forwarding stopped");
}
