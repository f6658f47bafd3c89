use super::event::TelemetryEvent;
use crate::config::BackendConfig;
use crate::error::TelemetryError;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::debug;

/// Network side of the dispatcher.
///
/// Callers bound every call with their own timeout, so implementations may
/// take as long as the network does.
#[async_trait]
pub trait TelemetryTransport: Send + Sync {
    /// One health round trip; `Ok` means the backend is reachable
    async fn health(&self) -> Result<(), TelemetryError>;

    /// Post one event; `Ok` means the backend accepted it
    async fn deliver(&self, event: &TelemetryEvent) -> Result<(), TelemetryError>;

    /// Human-readable destination for logs
    fn endpoint(&self) -> &str;
}

/// JSON-over-HTTP transport for the fleet backend
pub struct HttpTransport {
    client: Client,
    base_url: String,
    device_id: String,
}

impl HttpTransport {
    pub fn new(config: &BackendConfig) -> Result<Self, TelemetryError> {
        let client = Client::builder()
            .user_agent(concat!("fatigue-monitor/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TelemetryError::Client {
                details: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            device_id: config.device_id.clone(),
        })
    }

    pub fn health_url(&self) -> String {
        format!("{}/api/health", self.base_url)
    }

    pub fn data_url(&self) -> String {
        format!("{}/api/devices/{}/data", self.base_url, self.device_id)
    }

    pub fn alert_url(&self) -> String {
        format!("{}/api/devices/{}/alert", self.base_url, self.device_id)
    }

    /// Fetch the most recent data record the backend stored for this device
    pub async fn latest_data(
        &self,
        timeout: Duration,
    ) -> Result<serde_json::Value, TelemetryError> {
        let response = self
            .client
            .get(self.data_url())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| TelemetryError::Client {
                details: e.to_string(),
            })?;

        if response.status() != StatusCode::OK {
            return Err(TelemetryError::Client {
                details: describe_rejection(response).await,
            });
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| TelemetryError::Client {
                details: format!("invalid response body: {}", e),
            })
    }
}

#[async_trait]
impl TelemetryTransport for HttpTransport {
    async fn health(&self) -> Result<(), TelemetryError> {
        let response = self
            .client
            .get(self.health_url())
            .send()
            .await
            .map_err(|e| TelemetryError::Probe {
                details: e.to_string(),
            })?;

        if response.status() != StatusCode::OK {
            return Err(TelemetryError::Probe {
                details: format!("backend returned status {}", response.status()),
            });
        }
        Ok(())
    }

    async fn deliver(&self, event: &TelemetryEvent) -> Result<(), TelemetryError> {
        let request = match event {
            TelemetryEvent::Data(data) => self.client.post(self.data_url()).json(data),
            TelemetryEvent::Alert(alert) => self.client.post(self.alert_url()).json(alert),
        };

        let response = request.send().await.map_err(|e| TelemetryError::Delivery {
            event_type: event.event_type(),
            details: e.to_string(),
        })?;

        if response.status() != StatusCode::OK {
            return Err(TelemetryError::Delivery {
                event_type: event.event_type(),
                details: describe_rejection(response).await,
            });
        }

        debug!("Backend accepted {}", event.description());
        Ok(())
    }

    fn endpoint(&self) -> &str {
        &self.base_url
    }
}

async fn describe_rejection(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if body.is_empty() {
        format!("status {}", status)
    } else {
        format!("status {}: {}", status, body)
    }
}
