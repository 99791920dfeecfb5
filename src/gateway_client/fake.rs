//! Scripted in-memory gateway for unit tests

use super::types::CaseRequest;
use super::SensorGateway;
use crate::error::{Error, Result};
use crate::models::{DetectionStatus, ImagePayload, Observation, ResponderContact};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;

/// Scripted reply
#[derive(Debug, Clone)]
pub(crate) enum Reply<T> {
    Ok(T),
    Reject(u16),
    Network,
    /// Never resolves
    Hang,
}

impl<T> Reply<T> {
    async fn resolve(self, endpoint: &'static str) -> Result<T> {
        match self {
            Reply::Ok(value) => Ok(value),
            Reply::Reject(status) => Err(Error::GatewayRejected { endpoint, status }),
            Reply::Network => Err(Error::NetworkUnavailable("connection refused".to_string())),
            Reply::Hang => std::future::pending().await,
        }
    }
}

pub(crate) fn contact() -> ResponderContact {
    ResponderContact {
        name: "Pos Damkar Sektor 3".to_string(),
        address: "Jl. Sudirman 12".to_string(),
        phone: "021-113".to_string(),
    }
}

pub(crate) fn observation(status: DetectionStatus) -> Observation {
    Observation {
        image: ImagePayload::new("ZmlyZQ=="),
        captured_at: "2026/10/16 11:00:00".to_string(),
        status,
    }
}

pub(crate) struct FakeGateway {
    observations: Mutex<VecDeque<Reply<DetectionStatus>>>,
    case_reply: Mutex<Reply<()>>,
    responder_reply: Mutex<Reply<ResponderContact>>,
    gated: AtomicBool,
    case_gate: Notify,
    pub case_entered: Notify,
    case_requests: Mutex<Vec<CaseRequest>>,
    responder_calls: AtomicUsize,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            observations: Mutex::new(VecDeque::new()),
            case_reply: Mutex::new(Reply::Ok(())),
            responder_reply: Mutex::new(Reply::Ok(contact())),
            gated: AtomicBool::new(false),
            case_gate: Notify::new(),
            case_entered: Notify::new(),
            case_requests: Mutex::new(Vec::new()),
            responder_calls: AtomicUsize::new(0),
        }
    }

    pub fn push_observation(&self, reply: Reply<DetectionStatus>) {
        self.observations.lock().unwrap().push_back(reply);
    }

    pub fn set_case_reply(&self, reply: Reply<()>) {
        *self.case_reply.lock().unwrap() = reply;
    }

    pub fn set_responder_reply(&self, reply: Reply<ResponderContact>) {
        *self.responder_reply.lock().unwrap() = reply;
    }

    /// Hold `open_case` until `release_case`
    pub fn gate_cases(&self) {
        self.gated.store(true, Ordering::SeqCst);
    }

    pub fn release_case(&self) {
        self.case_gate.notify_one();
    }

    pub fn case_requests(&self) -> Vec<CaseRequest> {
        self.case_requests.lock().unwrap().clone()
    }

    pub fn responder_calls(&self) -> usize {
        self.responder_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SensorGateway for FakeGateway {
    async fn get_observation(&self, _camera_id: &str) -> Result<Observation> {
        let reply = self
            .observations
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Reply::Network);
        reply.resolve("/get/image").await.map(observation)
    }

    async fn open_case(&self, request: &CaseRequest) -> Result<()> {
        self.case_requests.lock().unwrap().push(request.clone());
        self.case_entered.notify_one();
        if self.gated.load(Ordering::SeqCst) {
            self.case_gate.notified().await;
        }
        let reply = self.case_reply.lock().unwrap().clone();
        reply.resolve("/post/case").await
    }

    async fn get_responder(&self, _responder_id: &str) -> Result<ResponderContact> {
        self.responder_calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.responder_reply.lock().unwrap().clone();
        reply.resolve("/get/firefighter").await
    }
}
