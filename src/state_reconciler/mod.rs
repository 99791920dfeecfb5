//! StateReconciler - Poll Result Reconciliation
//!
//! ## Responsibilities
//!
//! - Compare each observation against the last known status
//! - Decide which transition (if any) occurred
//! - Request side effects exactly once per transition
//!
//! `reconcile` is pure: no clock, no I/O. The caller owns the state slot.

use crate::models::{DetectionStatus, Effect, Observation, ReconciliationState, ReportPhase};

/// Result of one reconcile step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub next: ReconciliationState,
    pub effects: Vec<Effect>,
}

/// Fold an observation into the previous state
pub fn reconcile(previous: &ReconciliationState, observation: Observation) -> Reconciliation {
    let prev_status = previous.status();
    let new_status = observation.status;

    // Unknown is never re-entered once a real observation exists
    if new_status == DetectionStatus::Unknown {
        return Reconciliation {
            next: previous.clone(),
            effects: Vec::new(),
        };
    }

    let mut next = previous.clone();
    next.last_observation = Some(observation);
    let mut effects = Vec::new();

    match (prev_status, new_status) {
        // Baseline: only a fire already present at startup is announced
        (DetectionStatus::Unknown, status) => {
            next.report_eligible = status == DetectionStatus::Detected;
            next.incident_contact = None;
            next.report_phase = ReportPhase::Idle;
            next.incident = previous.incident + 1;
            if status == DetectionStatus::Detected {
                effects.push(Effect::Notify(status));
            }
        }
        (prev, status) if prev != status => {
            effects.push(Effect::Notify(status));
            next.incident = previous.incident + 1;

            match status {
                DetectionStatus::Detected => {
                    next.report_eligible = true;
                }
                _ => {
                    if previous.report_phase.is_in_flight() {
                        effects.push(Effect::ReportCancelled);
                    }
                    next.report_eligible = false;
                    next.incident_contact = None;
                    next.report_phase = ReportPhase::Idle;
                }
            }
        }
        // Unchanged: image/date refresh only
        _ => {}
    }

    Reconciliation { next, effects }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ImagePayload, ResponderContact};

    fn obs(status: DetectionStatus) -> Observation {
        Observation {
            image: ImagePayload::new("aGVsbG8="),
            captured_at: "2026/10/16 09:00:00".to_string(),
            status,
        }
    }

    fn feed(statuses: &[DetectionStatus]) -> (ReconciliationState, Vec<Vec<Effect>>) {
        let mut state = ReconciliationState::default();
        let mut all = Vec::new();
        for s in statuses {
            let r = reconcile(&state, obs(*s));
            state = r.next;
            all.push(r.effects);
        }
        (state, all)
    }

    fn notify_count(effects: &[Vec<Effect>]) -> usize {
        effects
            .iter()
            .flatten()
            .filter(|e| matches!(e, Effect::Notify(_)))
            .count()
    }

    #[test]
    fn test_baseline_detected_notifies_and_arms_report() {
        let (state, effects) = feed(&[DetectionStatus::Detected]);
        assert_eq!(effects[0], vec![Effect::Notify(DetectionStatus::Detected)]);
        assert!(state.report_eligible);
        assert_eq!(state.status(), DetectionStatus::Detected);
    }

    #[test]
    fn test_baseline_clear_is_silent() {
        let (state, effects) = feed(&[DetectionStatus::Clear]);
        assert!(effects[0].is_empty());
        assert!(!state.report_eligible);
    }

    #[test]
    fn test_detected_detected_clear() {
        let (state, effects) = feed(&[
            DetectionStatus::Detected,
            DetectionStatus::Detected,
            DetectionStatus::Clear,
        ]);
        assert!(effects[1].is_empty());
        assert_eq!(effects[2], vec![Effect::Notify(DetectionStatus::Clear)]);
        assert!(!state.report_eligible);
        assert!(state.incident_contact.is_none());
    }

    #[test]
    fn test_unchanged_status_is_idempotent() {
        let (first, _) = feed(&[DetectionStatus::Clear, DetectionStatus::Detected]);
        let r = reconcile(&first, obs(DetectionStatus::Detected));
        assert!(r.effects.is_empty());
        assert_eq!(r.next.report_eligible, first.report_eligible);
        assert_eq!(r.next.incident, first.incident);
    }

    #[test]
    fn test_unchanged_status_refreshes_image() {
        let (state, _) = feed(&[DetectionStatus::Clear]);
        let mut newer = obs(DetectionStatus::Clear);
        newer.captured_at = "2026/10/16 09:00:01".to_string();
        let r = reconcile(&state, newer.clone());
        assert_eq!(r.next.last_observation, Some(newer));
    }

    #[test]
    fn test_notify_count_matches_transitions() {
        use DetectionStatus::{Clear, Detected};
        let sequence = [Clear, Clear, Detected, Detected, Clear, Detected, Clear, Clear];
        let (_, effects) = feed(&sequence);
        let transitions = sequence.windows(2).filter(|w| w[0] != w[1]).count();
        assert_eq!(notify_count(&effects), transitions);
        assert!(effects.iter().all(|e| e.len() <= 1));
    }

    #[test]
    fn test_clear_resets_report_state() {
        let (mut state, _) = feed(&[DetectionStatus::Detected]);
        state.report_eligible = false;
        state.report_phase = ReportPhase::Accepted;
        state.incident_contact = Some(ResponderContact {
            name: "Station 1".to_string(),
            address: "Main St".to_string(),
            phone: "113".to_string(),
        });

        let r = reconcile(&state, obs(DetectionStatus::Clear));
        assert_eq!(r.effects, vec![Effect::Notify(DetectionStatus::Clear)]);
        assert!(r.next.incident_contact.is_none());
        assert_eq!(r.next.report_phase, ReportPhase::Idle);
        assert!(r.next.incident > state.incident);
    }

    #[test]
    fn test_clear_during_in_flight_report_cancels_it() {
        let (mut state, _) = feed(&[DetectionStatus::Detected]);
        state.report_phase = ReportPhase::OpeningCase;

        let r = reconcile(&state, obs(DetectionStatus::Clear));
        assert_eq!(
            r.effects,
            vec![Effect::Notify(DetectionStatus::Clear), Effect::ReportCancelled]
        );
        assert!(!r.next.report_eligible);
    }

    #[test]
    fn test_new_incident_rearms_after_accepted_report() {
        let (mut state, _) = feed(&[DetectionStatus::Detected]);
        state.report_eligible = false;
        state.report_phase = ReportPhase::Accepted;

        let cleared = reconcile(&state, obs(DetectionStatus::Clear)).next;
        let r = reconcile(&cleared, obs(DetectionStatus::Detected));
        assert_eq!(r.effects, vec![Effect::Notify(DetectionStatus::Detected)]);
        assert!(r.next.report_eligible);
    }

    #[test]
    fn test_unknown_observation_ignored() {
        let (state, _) = feed(&[DetectionStatus::Detected]);
        let r = reconcile(&state, obs(DetectionStatus::Unknown));
        assert!(r.effects.is_empty());
        assert_eq!(r.next, state);
    }
}
