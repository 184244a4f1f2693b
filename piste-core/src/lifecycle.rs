//! Competition and phase lifecycle.
//!
//! All competition status changes go through [`CompetitionStatus::apply`],
//! which holds the full transition table:
//!
//! ```text
//! DRAFT --open--> REGISTRATION_OPEN --close--> REGISTRATION_CLOSED
//!   |                    |                            |
//!   +------- start ------+----------- start ----------+--> IN_PROGRESS --complete--> COMPLETED
//!
//! any non-terminal --cancel--> CANCELLED
//! ```

use crate::{CompetitionStatus, PhaseStatus, StateConflictError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Event driving a competition through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompetitionEvent {
    OpenRegistration,
    CloseRegistration,
    /// Sent by generation. Idempotent once the competition is running.
    Start,
    Complete,
    Cancel,
}

impl fmt::Display for CompetitionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompetitionEvent::OpenRegistration => "OPEN_REGISTRATION",
            CompetitionEvent::CloseRegistration => "CLOSE_REGISTRATION",
            CompetitionEvent::Start => "START",
            CompetitionEvent::Complete => "COMPLETE",
            CompetitionEvent::Cancel => "CANCEL",
        };
        f.write_str(name)
    }
}

impl CompetitionStatus {
    /// Next status after `event`, or a conflict if the table has no edge.
    pub fn apply(self, event: CompetitionEvent) -> Result<CompetitionStatus, StateConflictError> {
        use CompetitionEvent as E;
        use CompetitionStatus as S;

        let next = match (self, event) {
            (S::Completed | S::Cancelled, _) => None,
            (_, E::Cancel) => Some(S::Cancelled),
            (_, E::Start) => Some(S::InProgress),
            (S::Draft, E::OpenRegistration) => Some(S::RegistrationOpen),
            (S::RegistrationOpen, E::CloseRegistration) => Some(S::RegistrationClosed),
            (S::InProgress, E::Complete) => Some(S::Completed),
            (
                S::Draft | S::RegistrationOpen | S::RegistrationClosed | S::InProgress,
                E::OpenRegistration | E::CloseRegistration | E::Complete,
            ) => None,
        };

        next.ok_or_else(|| StateConflictError::IllegalCompetitionTransition {
            from: self,
            event: event.to_string(),
        })
    }
}

impl PhaseStatus {
    /// Phases only move forward: SCHEDULED, IN_PROGRESS, COMPLETED.
    /// Re-applying the current status is allowed.
    pub fn can_transition_to(&self, next: PhaseStatus) -> bool {
        next >= *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATUSES: [CompetitionStatus; 6] = [
        CompetitionStatus::Draft,
        CompetitionStatus::RegistrationOpen,
        CompetitionStatus::RegistrationClosed,
        CompetitionStatus::InProgress,
        CompetitionStatus::Completed,
        CompetitionStatus::Cancelled,
    ];

    const ALL_EVENTS: [CompetitionEvent; 5] = [
        CompetitionEvent::OpenRegistration,
        CompetitionEvent::CloseRegistration,
        CompetitionEvent::Start,
        CompetitionEvent::Complete,
        CompetitionEvent::Cancel,
    ];

    #[test]
    fn test_happy_path() {
        let status = CompetitionStatus::Draft
            .apply(CompetitionEvent::OpenRegistration)
            .and_then(|s| s.apply(CompetitionEvent::CloseRegistration))
            .and_then(|s| s.apply(CompetitionEvent::Start))
            .and_then(|s| s.apply(CompetitionEvent::Complete))
            .unwrap();
        assert_eq!(status, CompetitionStatus::Completed);
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        for status in [CompetitionStatus::Completed, CompetitionStatus::Cancelled] {
            for event in ALL_EVENTS {
                assert!(status.apply(event).is_err(), "{status} accepted {event}");
            }
        }
    }

    #[test]
    fn test_start_is_idempotent() {
        assert_eq!(
            CompetitionStatus::InProgress.apply(CompetitionEvent::Start),
            Ok(CompetitionStatus::InProgress)
        );
    }

    #[test]
    fn test_cancel_from_any_non_terminal() {
        for status in ALL_STATUSES.into_iter().filter(|s| !s.is_terminal()) {
            assert_eq!(
                status.apply(CompetitionEvent::Cancel),
                Ok(CompetitionStatus::Cancelled)
            );
        }
    }

    #[test]
    fn test_complete_requires_in_progress() {
        let err = CompetitionStatus::RegistrationOpen
            .apply(CompetitionEvent::Complete)
            .unwrap_err();
        assert_eq!(
            err,
            StateConflictError::IllegalCompetitionTransition {
                from: CompetitionStatus::RegistrationOpen,
                event: "COMPLETE".to_string(),
            }
        );
    }

    #[test]
    fn test_no_backward_registration_moves() {
        assert!(CompetitionStatus::RegistrationClosed
            .apply(CompetitionEvent::OpenRegistration)
            .is_err());
        assert!(CompetitionStatus::InProgress
            .apply(CompetitionEvent::CloseRegistration)
            .is_err());
    }

    #[test]
    fn test_phase_status_forward_only() {
        assert!(PhaseStatus::Scheduled.can_transition_to(PhaseStatus::InProgress));
        assert!(PhaseStatus::Scheduled.can_transition_to(PhaseStatus::Completed));
        assert!(PhaseStatus::InProgress.can_transition_to(PhaseStatus::InProgress));
        assert!(!PhaseStatus::Completed.can_transition_to(PhaseStatus::Scheduled));
        assert!(!PhaseStatus::InProgress.can_transition_to(PhaseStatus::Scheduled));
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_status() -> impl Strategy<Value = CompetitionStatus> {
        prop_oneof![
            Just(CompetitionStatus::Draft),
            Just(CompetitionStatus::RegistrationOpen),
            Just(CompetitionStatus::RegistrationClosed),
            Just(CompetitionStatus::InProgress),
            Just(CompetitionStatus::Completed),
            Just(CompetitionStatus::Cancelled),
        ]
    }

    fn arb_event() -> impl Strategy<Value = CompetitionEvent> {
        prop_oneof![
            Just(CompetitionEvent::OpenRegistration),
            Just(CompetitionEvent::CloseRegistration),
            Just(CompetitionEvent::Start),
            Just(CompetitionEvent::Complete),
            Just(CompetitionEvent::Cancel),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// No sequence of events ever leaves a terminal state.
        #[test]
        fn prop_terminal_states_are_absorbing(
            start in arb_status(),
            events in prop::collection::vec(arb_event(), 0..12),
        ) {
            let mut status = start;
            let mut reached_terminal = status.is_terminal();
            for event in events {
                match status.apply(event) {
                    Ok(next) => {
                        prop_assert!(!reached_terminal);
                        status = next;
                    }
                    Err(_) => {}
                }
                reached_terminal |= status.is_terminal();
            }
        }
    }
}
