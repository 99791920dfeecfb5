//! Sensor gateway wire types

use crate::error::{Error, Result};
use crate::models::{DetectionStatus, ImagePayload, Observation, ResponderContact};
use serde::{Deserialize, Serialize};

/// Case status sent when opening an incident case
pub const CASE_STATUS_ONGOING: &str = "ongoing";

/// Gateway endpoints (relative to the base URL)
pub mod endpoints {
    pub const IMAGE: &str = "/get/image";
    pub const CASE: &str = "/post/case";
    pub const RESPONDER: &str = "/get/firefighter";
}

/// GET /get/image response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageResponse {
    pub image: String,
    pub date: String,
    pub status: i64,
}

impl TryFrom<ImageResponse> for Observation {
    type Error = Error;

    fn try_from(resp: ImageResponse) -> Result<Self> {
        let status = DetectionStatus::from_wire(resp.status).ok_or_else(|| {
            Error::InvalidResponse(format!("unexpected detection status {}", resp.status))
        })?;

        Ok(Observation {
            image: ImagePayload::new(resp.image),
            captured_at: resp.date,
            status,
        })
    }
}

/// POST /post/case body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRequest {
    pub image: String,
    pub status: String,
    pub user: String,
    pub date: String,
}

impl CaseRequest {
    /// Open an ongoing case for `user` with the given snapshot
    pub fn ongoing(image: &ImagePayload, user: &str, date: String) -> Self {
        Self {
            image: image.as_base64().to_string(),
            status: CASE_STATUS_ONGOING.to_string(),
            user: user.to_string(),
            date,
        }
    }
}

/// GET /get/firefighter response
pub type ResponderResponse = ResponderContact;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_response_maps_status() {
        let resp: ImageResponse =
            serde_json::from_str(r#"{"image":"abc=","date":"2026/10/16 08:00:00","status":1}"#)
                .unwrap();
        let observation = Observation::try_from(resp).unwrap();
        assert_eq!(observation.status, DetectionStatus::Detected);
        assert_eq!(observation.captured_at, "2026/10/16 08:00:00");
        assert_eq!(observation.image.as_base64(), "abc=");
    }

    #[test]
    fn test_image_response_rejects_unknown_status() {
        let resp = ImageResponse {
            image: String::new(),
            date: String::new(),
            status: 2,
        };
        assert!(matches!(
            Observation::try_from(resp),
            Err(Error::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_case_request_serialization() {
        let req = CaseRequest::ongoing(
            &ImagePayload::new("ZmlyZQ=="),
            "user1",
            "2026/10/16 02:05:09 PM".to_string(),
        );
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["status"], "ongoing");
        assert_eq!(json["user"], "user1");
        assert_eq!(json["image"], "ZmlyZQ==");
        assert_eq!(json["date"], "2026/10/16 02:05:09 PM");
    }
}
