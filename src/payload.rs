//! Fetching signed RedStone payloads from the gateway network.
//!
//! The payload is treated as an opaque blob: it is decoded from the hex string the
//! gateway returns and handed to the contract byte for byte.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::HarnessConfig;

const PAYLOAD_PATH: &str = "data-packages/payload";

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("invalid payload request: {0}")]
    InvalidRequest(String),
    #[error("no gateway answered: {}", format_attempts(.attempts))]
    Network { attempts: Vec<GatewayFailure> },
    #[error("gateway {gateway} returned a malformed payload: {reason}")]
    Format { gateway: String, reason: String },
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Why a single gateway was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayFailure {
    pub gateway: String,
    pub reason: String,
}

fn format_attempts(attempts: &[GatewayFailure]) -> String {
    attempts
        .iter()
        .map(|a| format!("{} ({})", a.gateway, a.reason))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Which data packages to ask the gateways for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadRequest {
    pub data_service_id: String,
    pub unique_signers_count: u32,
    pub data_feeds: Vec<String>,
}

impl PayloadRequest {
    pub fn new<I, S>(data_service_id: impl Into<String>, unique_signers_count: u32, data_feeds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            data_service_id: data_service_id.into(),
            unique_signers_count,
            data_feeds: data_feeds.into_iter().map(Into::into).collect(),
        }
    }

    pub fn validate(&self) -> Result<(), PayloadError> {
        if self.data_service_id.is_empty() {
            return Err(PayloadError::InvalidRequest("data service id is empty".into()));
        }
        if self.unique_signers_count == 0 {
            return Err(PayloadError::InvalidRequest(
                "unique signers count must be at least 1".into(),
            ));
        }
        if self.data_feeds.is_empty() {
            return Err(PayloadError::InvalidRequest("no data feeds requested".into()));
        }
        if self.data_feeds.iter().any(|feed| feed.is_empty()) {
            return Err(PayloadError::InvalidRequest("empty data feed symbol".into()));
        }
        Ok(())
    }

    fn query(&self) -> [(&'static str, String); 4] {
        [
            ("data-service-id", self.data_service_id.clone()),
            ("unique-signers-count", self.unique_signers_count.to_string()),
            ("data-packages-ids", self.data_feeds.join(",")),
            ("format", "hex".to_string()),
        ]
    }
}

/// Signed oracle payload. Serializes as a JSON array of byte values, the shape
/// contracts expect for a `Vec<u8>` argument.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OraclePayload(Vec<u8>);

impl OraclePayload {
    /// Decodes a gateway response (hex, no `0x` prefix).
    pub fn from_hex(payload_hex: &str) -> Result<Self, hex::FromHexError> {
        hex::decode(payload_hex.trim()).map(Self)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Arguments shared by both oracle entry points.
    pub fn contract_args(&self, symbol: &str) -> serde_json::Value {
        serde_json::json!({
            "redstone_payload": self,
            "symbol": symbol,
        })
    }
}

impl fmt::Debug for OraclePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OraclePayload(0x{})", hex::encode(&self.0))
    }
}

impl From<Vec<u8>> for OraclePayload {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// HTTP client over an ordered list of fallback gateways.
#[derive(Debug, Clone)]
pub struct PayloadFetcher {
    client: reqwest::Client,
    gateways: Vec<String>,
}

impl PayloadFetcher {
    pub fn new(gateways: Vec<String>, timeout: Duration) -> Result<Self, PayloadError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, gateways })
    }

    pub fn from_config(config: &HarnessConfig) -> Result<Self, PayloadError> {
        Self::new(config.gateways.clone(), config.request_timeout)
    }

    /// Fetches a fresh payload, trying each gateway in order until one answers.
    pub async fn fetch(&self, request: &PayloadRequest) -> Result<OraclePayload, PayloadError> {
        request.validate()?;
        if self.gateways.is_empty() {
            return Err(PayloadError::InvalidRequest("no gateways configured".into()));
        }

        info!(
            data_service_id = %request.data_service_id,
            data_feeds = ?request.data_feeds,
            unique_signers_count = request.unique_signers_count,
            "Requesting redstone payload"
        );

        let mut attempts = Vec::with_capacity(self.gateways.len());
        for gateway in &self.gateways {
            let body = match self.request_from(gateway, request).await {
                Ok(body) => body,
                Err(reason) => {
                    warn!(%gateway, %reason, "Gateway did not return a payload");
                    attempts.push(GatewayFailure {
                        gateway: gateway.clone(),
                        reason,
                    });
                    continue;
                }
            };

            let payload = OraclePayload::from_hex(&body).map_err(|e| PayloadError::Format {
                gateway: gateway.clone(),
                reason: e.to_string(),
            })?;
            if payload.is_empty() {
                return Err(PayloadError::Format {
                    gateway: gateway.clone(),
                    reason: "empty payload".into(),
                });
            }

            info!(%gateway, bytes = payload.len(), "Redstone payload received: {}", body.trim());
            return Ok(payload);
        }

        Err(PayloadError::Network { attempts })
    }

    async fn request_from(&self, gateway: &str, request: &PayloadRequest) -> Result<String, String> {
        let url = format!("{}/{}", gateway.trim_end_matches('/'), PAYLOAD_PATH);
        let response = self
            .client
            .get(&url)
            .query(&request.query())
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {status}"));
        }
        response.text().await.map_err(|e| e.to_string())
    }
}

/// Fetches the payload described by `config` from its gateways.
pub async fn get_redstone_payload(config: &HarnessConfig) -> Result<OraclePayload, PayloadError> {
    PayloadFetcher::from_config(config)?.fetch(&config.payload).await
}
