//! Lifecycle states and stability polling.

pub mod state;
pub mod wait;

pub use state::{HasLifecycleState, InstancePhase, LifecycleState, PhaseTracker};
pub use wait::{WaitError, WaitPolicy, WaitTarget, await_terminal_state, settle};
