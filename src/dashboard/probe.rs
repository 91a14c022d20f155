use crate::error::{AppError, Result};
use crate::store::Service;
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;

/// Reachability of a service as last observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Checking,
    Online,
    Offline,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Checking => "checking",
            Status::Online => "online",
            Status::Offline => "offline",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome of one probe
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub name: String,
    pub status: Status,
    pub checked_at: DateTime<Utc>,
}

/// Best-effort liveness checks against service URLs
#[derive(Clone)]
pub struct Prober {
    client: reqwest::Client,
    timeout: Duration,
}

impl Prober {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().no_proxy().build().map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Failed to build probe client: {}", e))
        })?;

        Ok(Self { client, timeout })
    }

    /// Probe `url` once
    ///
    /// Any response counts as online, whatever its status code. Transport
    /// errors and the timeout count as offline.
    pub async fn probe(&self, url: &str) -> Status {
        match tokio::time::timeout(self.timeout, self.client.get(url).send()).await {
            Ok(Ok(response)) => {
                tracing::debug!("Probe {} answered {}", url, response.status());
                Status::Online
            }
            Ok(Err(e)) => {
                tracing::debug!("Probe {} failed: {}", url, e);
                Status::Offline
            }
            Err(_) => {
                tracing::debug!("Probe {} timed out after {:?}", url, self.timeout);
                Status::Offline
            }
        }
    }

    /// Start one independent probe task per service
    ///
    /// Each task sends exactly one update; the channel closes once all of
    /// them have finished.
    pub fn spawn_all(&self, services: &[Service]) -> mpsc::UnboundedReceiver<StatusUpdate> {
        let (tx, rx) = mpsc::unbounded_channel();

        for service in services {
            let prober = self.clone();
            let tx = tx.clone();
            let name = service.name.clone();
            let url = service.url.clone();

            tokio::spawn(async move {
                let status = prober.probe(&url).await;
                // Receiver gone means the dashboard moved on
                let _ = tx.send(StatusUpdate {
                    name,
                    status,
                    checked_at: Utc::now(),
                });
            });
        }

        rx
    }
}
