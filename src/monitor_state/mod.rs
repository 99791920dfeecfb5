//! MonitorState - Owned Reconciliation Slot
//!
//! ## Responsibilities
//!
//! - Hold the single current `ReconciliationState`
//! - Stamp every poll and report cycle with a generation
//! - Drop completions whose generation no longer matches (stale)
//!
//! Locks are never held across network calls: callers take a ticket,
//! release the slot, do I/O, then hand the ticket back with the result.

use crate::error::{Error, Result};
use crate::models::{
    Effect, ImagePayload, Observation, ReconciliationState, ReportPhase, ResponderContact,
};
use crate::state_reconciler::reconcile;
use tokio::sync::RwLock;

/// Identifies one poll cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTicket {
    epoch: u64,
    seq: u64,
}

impl PollTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// Identifies one report workflow and the incident it was filed for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTicket {
    pub id: u64,
    incident: u64,
    /// Image of the observation being reported
    pub image: ImagePayload,
}

#[derive(Debug, Default)]
struct Slot {
    state: ReconciliationState,
    /// Bumped whenever polling is stopped; older poll tickets become stale
    epoch: u64,
    next_poll_seq: u64,
    last_applied_seq: u64,
    next_report_id: u64,
    active_report: Option<u64>,
}

impl Slot {
    fn check_report(&self, ticket: &ReportTicket) -> Result<()> {
        if self.active_report == Some(ticket.id) && self.state.incident == ticket.incident {
            Ok(())
        } else {
            Err(Error::StaleCompletion)
        }
    }
}

/// Shared owner of the reconciliation state
#[derive(Debug, Default)]
pub struct MonitorState {
    slot: RwLock<Slot>,
}

impl MonitorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> ReconciliationState {
        self.slot.read().await.state.clone()
    }

    // ========================================
    // Poll cycle
    // ========================================

    /// Start a poll cycle
    pub async fn begin_poll(&self) -> PollTicket {
        let mut slot = self.slot.write().await;
        slot.next_poll_seq += 1;
        PollTicket {
            epoch: slot.epoch,
            seq: slot.next_poll_seq,
        }
    }

    /// Whether a poll started with `ticket` may still apply its result
    pub async fn is_current_poll(&self, ticket: &PollTicket) -> bool {
        let slot = self.slot.read().await;
        ticket.epoch == slot.epoch && ticket.seq > slot.last_applied_seq
    }

    /// Invalidate every poll cycle started so far
    pub async fn invalidate_polls(&self) {
        let mut slot = self.slot.write().await;
        slot.epoch += 1;
        tracing::debug!(epoch = slot.epoch, "Outstanding poll cycles invalidated");
    }

    /// Reconcile an observation fetched under `ticket`
    ///
    /// Returns `StaleCompletion` when polling was stopped since the ticket
    /// was issued or a newer cycle already applied its result.
    pub async fn apply_observation(
        &self,
        ticket: &PollTicket,
        observation: Observation,
    ) -> Result<Vec<Effect>> {
        let mut slot = self.slot.write().await;
        if ticket.epoch != slot.epoch || ticket.seq <= slot.last_applied_seq {
            tracing::debug!(seq = ticket.seq, "Dropping stale poll result");
            return Err(Error::StaleCompletion);
        }

        let reconciliation = reconcile(&slot.state, observation);
        if reconciliation.next.incident != slot.state.incident {
            slot.active_report = None;
        }
        slot.state = reconciliation.next;
        slot.last_applied_seq = ticket.seq;

        Ok(reconciliation.effects)
    }

    // ========================================
    // Report workflow
    // ========================================

    /// Claim the report slot for the current incident
    pub async fn begin_report(&self) -> Result<ReportTicket> {
        let mut slot = self.slot.write().await;
        if slot.state.report_phase.is_in_flight() {
            return Err(Error::AlreadyInFlight);
        }
        if !slot.state.report_eligible {
            return Err(Error::NotEligible);
        }
        let image = slot
            .state
            .last_observation
            .as_ref()
            .map(|o| o.image.clone())
            .ok_or(Error::NotEligible)?;

        slot.next_report_id += 1;
        let id = slot.next_report_id;
        slot.active_report = Some(id);
        slot.state.report_phase = ReportPhase::OpeningCase;

        Ok(ReportTicket {
            id,
            incident: slot.state.incident,
            image,
        })
    }

    /// Case submission failed; the user may try again
    pub async fn case_failed(&self, ticket: &ReportTicket) -> Result<()> {
        let mut slot = self.slot.write().await;
        slot.check_report(ticket)?;
        slot.active_report = None;
        slot.state.report_phase = ReportPhase::Idle;
        Ok(())
    }

    /// Case accepted by the gateway; no second case for this incident
    pub async fn case_opened(&self, ticket: &ReportTicket) -> Result<()> {
        let mut slot = self.slot.write().await;
        slot.check_report(ticket)?;
        slot.state.report_eligible = false;
        slot.state.report_phase = ReportPhase::FetchingContact;
        Ok(())
    }

    /// Responder contact arrived
    pub async fn contact_received(
        &self,
        ticket: &ReportTicket,
        contact: ResponderContact,
    ) -> Result<()> {
        let mut slot = self.slot.write().await;
        slot.check_report(ticket)?;
        slot.active_report = None;
        slot.state.incident_contact = Some(contact);
        slot.state.report_phase = ReportPhase::Accepted;
        Ok(())
    }

    /// Responder lookup failed after the case was opened
    pub async fn contact_unavailable(&self, ticket: &ReportTicket) -> Result<()> {
        let mut slot = self.slot.write().await;
        slot.check_report(ticket)?;
        slot.active_report = None;
        slot.state.report_phase = ReportPhase::ContactUnavailable;
        Ok(())
    }

    /// Release a claim whose workflow ended without a verdict
    ///
    /// Before the case was opened the user may retry; afterwards the case
    /// stands and only the contact is missing.
    pub async fn abandon_report(&self, ticket: &ReportTicket) -> Result<()> {
        let mut slot = self.slot.write().await;
        slot.check_report(ticket)?;
        slot.active_report = None;
        slot.state.report_phase = match slot.state.report_phase {
            ReportPhase::FetchingContact => ReportPhase::ContactUnavailable,
            _ => ReportPhase::Idle,
        };
        Ok(())
    }
}
