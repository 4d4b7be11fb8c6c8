//! Network availability signal.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Boolean connectivity flag with change notification.
///
/// Starts connected so the first fetch is attempted before any probe has run.
#[derive(Debug, Clone)]
pub struct ConnectivitySignal {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for ConnectivitySignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectivitySignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(true);
        Self { tx: Arc::new(tx) }
    }

    /// Update the flag. Observers are only woken on a transition.
    pub fn set_connected(&self, connected: bool) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == connected {
                false
            } else {
                *current = connected;
                true
            }
        });

        if changed {
            if connected {
                tracing::info!("Network available");
            } else {
                tracing::warn!("Network lost");
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// Periodically checks reachability with a TCP connect.
pub struct ConnectivityProbe;

impl ConnectivityProbe {
    /// One connect attempt to `host:port`.
    pub async fn probe_once(host: &str, port: u16, timeout: Duration) -> bool {
        matches!(
            tokio::time::timeout(timeout, TcpStream::connect((host, port))).await,
            Ok(Ok(_))
        )
    }

    /// Host and port to probe for a URL like the API base URL.
    pub fn probe_target(base_url: &str) -> Option<(String, u16)> {
        let url = Url::parse(base_url).ok()?;
        let host = url.host_str()?.to_string();
        let port = url.port_or_known_default()?;
        Some((host, port))
    }

    /// Probe every `every` until `token` is cancelled, feeding `signal`.
    pub fn spawn(
        signal: ConnectivitySignal,
        host: String,
        port: u16,
        every: Duration,
        token: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::debug!("Connectivity probe started for {}:{}", host, port);
            loop {
                let reachable = Self::probe_once(&host, port, every.min(PROBE_TIMEOUT)).await;
                if token.is_cancelled() {
                    break;
                }
                signal.set_connected(reachable);

                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(every) => {}
                }
            }
            tracing::debug!("Connectivity probe stopped");
        })
    }
}
