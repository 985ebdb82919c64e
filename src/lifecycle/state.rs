//! Remote lifecycle states and the per-instance phase machine.
//!
//! [`LifecycleState`] is what the identity service reports for an object.
//! [`InstancePhase`] is the adapter's own view of one managed instance:
//!
//! ```text
//! Absent -> Creating -> Active <-> Updating
//!                         |
//!                         v
//!                      Deleting -> Absent
//! ```
//!
//! `Failed` is absorbing and reachable from Creating, Updating and Deleting.

use crate::error::{ProviderError, ProviderResult, ValidationError};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state reported by the identity service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleState {
    Creating,
    Active,
    Inactive,
    Deleting,
    Deleted,
    Failed,
}

impl LifecycleState {
    pub const ALL: [LifecycleState; 6] = [
        LifecycleState::Creating,
        LifecycleState::Active,
        LifecycleState::Inactive,
        LifecycleState::Deleting,
        LifecycleState::Deleted,
        LifecycleState::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Creating => "CREATING",
            LifecycleState::Active => "ACTIVE",
            LifecycleState::Inactive => "INACTIVE",
            LifecycleState::Deleting => "DELETING",
            LifecycleState::Deleted => "DELETED",
            LifecycleState::Failed => "FAILED",
        }
    }

    /// Object exists and accepts updates.
    pub fn is_stable(&self) -> bool {
        matches!(self, LifecycleState::Active | LifecycleState::Inactive)
    }

    /// The service will not move the object out of this state on its own.
    pub fn is_terminal(&self) -> bool {
        !self.is_pending()
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, LifecycleState::Creating | LifecycleState::Deleting)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleState {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LifecycleState::ALL
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ValidationError::InvalidValue {
                attribute: "state".to_string(),
                value: s.to_string(),
                allowed: LifecycleState::ALL
                    .iter()
                    .map(|state| state.as_str().to_string())
                    .collect(),
            })
    }
}

/// Implemented by remote entities that report a lifecycle state.
pub trait HasLifecycleState {
    fn lifecycle_state(&self) -> LifecycleState;
}

/// The adapter's phase for one managed resource instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstancePhase {
    Absent,
    Creating,
    Active,
    Updating,
    Deleting,
    Failed,
}

impl InstancePhase {
    pub fn can_transition_to(self, next: InstancePhase) -> bool {
        use InstancePhase::*;
        matches!(
            (self, next),
            (Absent, Creating)
                | (Creating, Active)
                | (Creating, Failed)
                | (Active, Updating)
                | (Updating, Active)
                | (Updating, Failed)
                | (Active, Deleting)
                | (Deleting, Absent)
                | (Deleting, Failed)
        )
    }

    /// Phase an instance is in when the service reports `state`.
    ///
    /// Returns `None` for states that mean the instance no longer exists.
    pub fn from_remote(state: LifecycleState) -> Option<InstancePhase> {
        match state {
            LifecycleState::Creating => Some(InstancePhase::Creating),
            LifecycleState::Active | LifecycleState::Inactive => Some(InstancePhase::Active),
            LifecycleState::Deleting => Some(InstancePhase::Deleting),
            LifecycleState::Failed => Some(InstancePhase::Failed),
            LifecycleState::Deleted => None,
        }
    }
}

impl fmt::Display for InstancePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InstancePhase::Absent => "absent",
            InstancePhase::Creating => "creating",
            InstancePhase::Active => "active",
            InstancePhase::Updating => "updating",
            InstancePhase::Deleting => "deleting",
            InstancePhase::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Tracks one instance through a single lifecycle operation.
///
/// Every move is checked against [`InstancePhase::can_transition_to`] so a
/// resource adapter cannot skip a step (e.g. report Active straight from
/// Absent).
#[derive(Debug, Clone)]
pub struct PhaseTracker {
    resource_type: &'static str,
    id: String,
    phase: InstancePhase,
}

impl PhaseTracker {
    pub fn new(resource_type: &'static str, id: impl Into<String>, phase: InstancePhase) -> Self {
        Self {
            resource_type,
            id: id.into(),
            phase,
        }
    }

    pub fn phase(&self) -> InstancePhase {
        self.phase
    }

    /// Attach the identifier once the service has assigned one.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    pub fn advance(&mut self, next: InstancePhase) -> ProviderResult<()> {
        if !self.phase.can_transition_to(next) {
            return Err(ProviderError::InvalidTransition {
                resource_type: self.resource_type.to_string(),
                id: self.id.clone(),
                from: self.phase,
                to: next,
            });
        }
        debug!(
            "{} '{}': {} -> {}",
            self.resource_type, self.id, self.phase, next
        );
        self.phase = next;
        Ok(())
    }

    /// Record a failure without losing the original error.
    ///
    /// Failed is absorbing, so an invalid move here only means the failure
    /// happened outside a tracked operation and is ignored.
    pub fn fail(&mut self) {
        if self.phase.can_transition_to(InstancePhase::Failed) {
            debug!(
                "{} '{}': {} -> {}",
                self.resource_type,
                self.id,
                self.phase,
                InstancePhase::Failed
            );
            self.phase = InstancePhase::Failed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn any_phase() -> impl Strategy<Value = InstancePhase> {
        prop_oneof![
            Just(InstancePhase::Absent),
            Just(InstancePhase::Creating),
            Just(InstancePhase::Active),
            Just(InstancePhase::Updating),
            Just(InstancePhase::Deleting),
            Just(InstancePhase::Failed),
        ]
    }

    #[test]
    fn test_state_round_trips_through_str() {
        for state in LifecycleState::ALL {
            assert_eq!(state.as_str().parse::<LifecycleState>().unwrap(), state);
        }
        assert!("PROVISIONING".parse::<LifecycleState>().is_err());
    }

    #[test]
    fn test_state_serializes_like_the_service() {
        assert_eq!(
            serde_json::to_string(&LifecycleState::Active).unwrap(),
            "\"ACTIVE\""
        );
    }

    #[test]
    fn test_stable_and_pending_are_disjoint() {
        for state in LifecycleState::ALL {
            assert!(!(state.is_stable() && state.is_pending()));
        }
        assert!(LifecycleState::Failed.is_terminal());
        assert!(!LifecycleState::Creating.is_terminal());
    }

    #[test]
    fn test_full_lifecycle_is_allowed() {
        let mut tracker = PhaseTracker::new("oci_identity_user", "", InstancePhase::Absent);
        tracker.advance(InstancePhase::Creating).unwrap();
        tracker.set_id("ocid1.user.oc1..abc");
        tracker.advance(InstancePhase::Active).unwrap();
        tracker.advance(InstancePhase::Updating).unwrap();
        tracker.advance(InstancePhase::Active).unwrap();
        tracker.advance(InstancePhase::Deleting).unwrap();
        tracker.advance(InstancePhase::Absent).unwrap();
        assert_eq!(tracker.phase(), InstancePhase::Absent);
    }

    #[test]
    fn test_skipping_creation_is_rejected() {
        let mut tracker = PhaseTracker::new("oci_identity_user", "x", InstancePhase::Absent);
        let error = tracker.advance(InstancePhase::Active).unwrap_err();
        assert!(matches!(error, ProviderError::InvalidTransition { .. }));
        assert_eq!(tracker.phase(), InstancePhase::Absent);
    }

    proptest! {
        #[test]
        fn failed_is_absorbing(next in any_phase()) {
            prop_assert!(!InstancePhase::Failed.can_transition_to(next));
        }

        #[test]
        fn failed_reachable_only_from_busy_phases(from in any_phase()) {
            let busy = matches!(
                from,
                InstancePhase::Creating | InstancePhase::Updating | InstancePhase::Deleting
            );
            prop_assert_eq!(from.can_transition_to(InstancePhase::Failed), busy);
        }

        #[test]
        fn no_self_transitions(phase in any_phase()) {
            prop_assert!(!phase.can_transition_to(phase));
        }
    }
}
