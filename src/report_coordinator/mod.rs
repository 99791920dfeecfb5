//! ReportCoordinator - Fire Department Report Workflow
//!
//! ## Responsibilities
//!
//! - Open an incident case with the current snapshot
//! - Fetch responder contact info once the case is accepted
//! - Single-flight: at most one report per incident at a time
//!
//! ## Flow
//!
//! 1. Claim the report slot (`AlreadyInFlight` / `NotEligible` otherwise)
//! 2. POST the case; on failure the slot is released and the user may retry
//! 3. On success eligibility drops immediately, then the responder is fetched
//! 4. Contact stored, lifecycle `Accepted`
//!
//! A Clear transition during any step makes the completion stale; it is
//! dropped without surfacing anything.

use crate::error::{Error, Result};
use crate::error_surfacer::{AlertKind, ErrorSurfacer};
use crate::gateway_client::types::CaseRequest;
use crate::gateway_client::SensorGateway;
use crate::models::ResponderContact;
use crate::monitor_state::{MonitorState, ReportTicket};
use crate::realtime_hub::{HubMessage, RealtimeHub, ReportUpdatedMessage};
use chrono::{DateTime, Local, TimeZone};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Case timestamp, e.g. `2026/10/16 02:05:09 PM`
pub fn format_case_date<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    at.format("%Y/%m/%d %I:%M:%S %p").to_string().to_uppercase()
}

/// Identity used when reporting
#[derive(Debug, Clone)]
pub struct ReportIdentity {
    pub user_id: String,
    pub responder_id: String,
}

/// ReportCoordinator instance
#[derive(Clone)]
pub struct ReportCoordinator {
    gateway: Arc<dyn SensorGateway>,
    state: Arc<MonitorState>,
    surfacer: Arc<ErrorSurfacer>,
    hub: Arc<RealtimeHub>,
    identity: ReportIdentity,
    call_timeout: Duration,
}

impl ReportCoordinator {
    pub fn new(
        gateway: Arc<dyn SensorGateway>,
        state: Arc<MonitorState>,
        surfacer: Arc<ErrorSurfacer>,
        hub: Arc<RealtimeHub>,
        identity: ReportIdentity,
        call_timeout: Duration,
    ) -> Self {
        Self {
            gateway,
            state,
            surfacer,
            hub,
            identity,
            call_timeout,
        }
    }

    /// Report the current incident to the fire department
    ///
    /// The workflow runs on its own task: dropping the returned future (a
    /// disconnected HTTP client) does not abandon a claimed report.
    pub async fn file_report(&self) -> Result<ResponderContact> {
        let ticket = self
            .state
            .begin_report()
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Report rejected"))?;

        let worker = self.clone();
        let claimed = ticket.clone();
        let handle = tokio::spawn(async move { worker.run(&claimed).await });

        match handle.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(report_id = ticket.id, error = %e, "Report workflow died");
                if self.state.abandon_report(&ticket).await.is_ok() {
                    self.publish(&ticket).await;
                }
                Err(Error::Internal(format!("report workflow died: {}", e)))
            }
        }
    }

    async fn run(&self, ticket: &ReportTicket) -> Result<ResponderContact> {
        tracing::info!(
            report_id = ticket.id,
            user_id = %self.identity.user_id,
            "Filing fire report"
        );
        self.publish(ticket).await;

        let request = CaseRequest::ongoing(
            &ticket.image,
            &self.identity.user_id,
            format_case_date(&Local::now()),
        );

        if let Err(e) = self.bounded(self.gateway.open_case(&request)).await {
            return self.fail_case(ticket, e).await;
        }

        self.state.case_opened(ticket).await.inspect_err(|_| {
            tracing::info!(report_id = ticket.id, "Case opened for a superseded incident")
        })?;
        tracing::info!(report_id = ticket.id, "Case opened");
        self.publish(ticket).await;

        let contact = match self
            .bounded(self.gateway.get_responder(&self.identity.responder_id))
            .await
        {
            Ok(contact) => contact,
            Err(e) => return self.fail_contact(ticket, e).await,
        };

        self.state.contact_received(ticket, contact.clone()).await?;
        tracing::info!(
            report_id = ticket.id,
            responder = %contact.name,
            "Report accepted"
        );
        self.publish(ticket).await;

        Ok(contact)
    }

    async fn fail_case(&self, ticket: &ReportTicket, error: Error) -> Result<ResponderContact> {
        if self.state.case_failed(ticket).await.is_err() {
            tracing::debug!(report_id = ticket.id, error = %error, "Stale case failure dropped");
            return Err(Error::StaleCompletion);
        }

        tracing::warn!(report_id = ticket.id, error = %error, "Case submission failed");
        self.surfacer.report(AlertKind::CaseSubmissionFailed).await;
        self.publish(ticket).await;
        Err(error)
    }

    async fn fail_contact(
        &self,
        ticket: &ReportTicket,
        error: Error,
    ) -> Result<ResponderContact> {
        if self.state.contact_unavailable(ticket).await.is_err() {
            tracing::debug!(report_id = ticket.id, error = %error, "Stale responder failure dropped");
            return Err(Error::StaleCompletion);
        }

        tracing::warn!(report_id = ticket.id, error = %error, "Responder lookup failed");
        self.surfacer.report(AlertKind::ResponderFetchFailed).await;
        self.publish(ticket).await;
        Err(error)
    }

    async fn bounded<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        match timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(Error::timeout(self.call_timeout)),
        }
    }

    async fn publish(&self, ticket: &ReportTicket) {
        let snapshot = self.state.snapshot().await;
        tracing::debug!(report_id = ticket.id, phase = ?snapshot.report_phase, "Report phase");
        self.hub.broadcast(HubMessage::ReportUpdated(ReportUpdatedMessage {
            phase: snapshot.report_phase,
            contact: snapshot.incident_contact,
        }));
    }
}
