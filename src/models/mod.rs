//! Shared data models

use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fire detection status reported by the sensor gateway
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStatus {
    /// No observation received yet
    #[default]
    Unknown,
    /// Gateway status 0
    Clear,
    /// Gateway status 1
    Detected,
}

impl DetectionStatus {
    /// Map the gateway's numeric status code
    pub fn from_wire(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Clear),
            1 => Some(Self::Detected),
            _ => None,
        }
    }

    /// Banner text shown under the camera image
    pub fn label(&self) -> &'static str {
        match self {
            Self::Detected => "FIRE DETECTED",
            Self::Clear | Self::Unknown => "NO FIRE DETECTED",
        }
    }
}

impl fmt::Display for DetectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Clear => write!(f, "clear"),
            Self::Detected => write!(f, "detected"),
        }
    }
}

/// Camera snapshot as delivered by the gateway (base64 text).
///
/// The payload is never interpreted; it is echoed back when a case is
/// opened and decoded to raw bytes only to be served as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImagePayload(String);

impl ImagePayload {
    pub fn new(base64: impl Into<String>) -> Self {
        Self(base64.into())
    }

    pub fn as_base64(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw image bytes
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        base64::engine::general_purpose::STANDARD.decode(self.0.trim())
    }
}

/// One poll result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Observation {
    pub image: ImagePayload,
    /// Timestamp label supplied by the gateway, displayed verbatim
    pub captured_at: String,
    pub status: DetectionStatus,
}

/// Fire department contact returned after a case is opened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponderContact {
    pub name: String,
    pub address: String,
    pub phone: String,
}

/// Report workflow lifecycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportPhase {
    #[default]
    Idle,
    /// Case submission outstanding
    OpeningCase,
    /// Case opened, responder lookup outstanding
    FetchingContact,
    /// Case opened and responder contact known
    Accepted,
    /// Case opened but responder lookup failed
    ContactUnavailable,
}

impl ReportPhase {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::OpeningCase | Self::FetchingContact)
    }
}

/// Everything the monitor knows about the camera and its current incident.
///
/// Invariants:
/// - `report_eligible` implies the last status is `Detected`
/// - `incident_contact` is only present while the last status is `Detected`
/// - `incident` changes on every status transition; report completions
///   stamped with an older value are stale
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationState {
    pub last_observation: Option<Observation>,
    pub report_eligible: bool,
    pub incident_contact: Option<ResponderContact>,
    pub report_phase: ReportPhase,
    pub incident: u64,
}

impl ReconciliationState {
    pub fn status(&self) -> DetectionStatus {
        self.last_observation
            .as_ref()
            .map(|o| o.status)
            .unwrap_or_default()
    }
}

/// Side effect requested by a reconcile step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Raise a local notification for the new status
    Notify(DetectionStatus),
    /// A Clear arrived while a report was in flight; its completion will be dropped
    ReportCancelled,
}
