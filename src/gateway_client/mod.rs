//! GatewayClient - Remote Sensor Gateway Adapter
//!
//! ## Responsibilities
//!
//! - Fetch the current camera snapshot and detection status
//! - Open an incident case with the fire department
//! - Fetch responder contact info
//!
//! Any non-200 answer is `GatewayRejected`; transport failures are
//! `NetworkUnavailable`.

pub mod types;

#[cfg(test)]
pub(crate) mod fake;

use crate::error::{Error, Result};
use crate::models::{Observation, ResponderContact};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use types::{endpoints, CaseRequest, ImageResponse, ResponderResponse};

pub use types::CASE_STATUS_ONGOING;

/// Operations the monitor needs from the sensor gateway
#[async_trait]
pub trait SensorGateway: Send + Sync {
    /// Current snapshot and detection status of `camera_id`
    async fn get_observation(&self, camera_id: &str) -> Result<Observation>;

    /// Open an incident case
    async fn open_case(&self, request: &CaseRequest) -> Result<()>;

    /// Contact info of responder `responder_id`
    async fn get_responder(&self, responder_id: &str) -> Result<ResponderContact>;
}

/// reqwest-backed gateway client
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    /// Create new gateway client
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    fn ensure_ok(endpoint: &'static str, status: StatusCode) -> Result<()> {
        if status == StatusCode::OK {
            Ok(())
        } else {
            Err(Error::GatewayRejected {
                endpoint,
                status: status.as_u16(),
            })
        }
    }
}

#[async_trait]
impl SensorGateway for HttpGateway {
    async fn get_observation(&self, camera_id: &str) -> Result<Observation> {
        let resp = self
            .client
            .get(self.url(endpoints::IMAGE))
            .query(&[("camera", camera_id)])
            .send()
            .await?;
        Self::ensure_ok(endpoints::IMAGE, resp.status())?;

        let body: ImageResponse = resp.json().await?;
        Observation::try_from(body)
    }

    async fn open_case(&self, request: &CaseRequest) -> Result<()> {
        let resp = self
            .client
            .post(self.url(endpoints::CASE))
            .header(reqwest::header::ACCEPT, "application/json")
            .json(request)
            .send()
            .await?;
        Self::ensure_ok(endpoints::CASE, resp.status())
    }

    async fn get_responder(&self, responder_id: &str) -> Result<ResponderContact> {
        let resp = self
            .client
            .get(self.url(endpoints::RESPONDER))
            .query(&[("id", responder_id)])
            .send()
            .await?;
        Self::ensure_ok(endpoints::RESPONDER, resp.status())?;

        let contact: ResponderResponse = resp.json().await?;
        Ok(contact)
    }
}
