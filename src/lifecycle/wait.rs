//! Stability polling.
//!
//! [`await_terminal_state`] is the one place the adapter waits on the remote
//! service. Every resource type calls it with its own probe after create,
//! update and delete instead of carrying its own retry loop.

use crate::client::{ClientError, ClientResult};
use crate::lifecycle::{HasLifecycleState, LifecycleState};
use log::{debug, warn};
use std::future::Future;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Interval and bounds for one wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Sleep between two probes.
    pub interval: Duration,
    /// Total time allowed before giving up.
    pub timeout: Duration,
    /// Transient probe failures tolerated before giving up.
    pub max_transient_retries: u32,
}

impl WaitPolicy {
    pub fn new(interval: Duration, timeout: Duration, max_transient_retries: u32) -> Self {
        Self {
            interval,
            timeout,
            max_transient_retries,
        }
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            timeout: Duration::from_secs(20 * 60),
            max_transient_retries: 5,
        }
    }
}

/// Which observed states end the wait and which keep it going.
#[derive(Debug, Clone, Copy)]
pub struct WaitTarget {
    pub target: &'static [LifecycleState],
    pub pending: &'static [LifecycleState],
    /// Treat a missing object as reaching the target.
    pub absent_is_target: bool,
}

impl WaitTarget {
    /// Wait for a created or updated object to settle.
    pub const STABLE: WaitTarget = WaitTarget {
        target: &[LifecycleState::Active, LifecycleState::Inactive],
        pending: &[LifecycleState::Creating],
        absent_is_target: false,
    };

    /// Wait for a deleted object to disappear.
    pub const GONE: WaitTarget = WaitTarget {
        target: &[LifecycleState::Deleted],
        pending: &[LifecycleState::Deleting],
        absent_is_target: true,
    };

    pub fn describe(&self) -> String {
        self.target
            .iter()
            .map(|state| state.as_str())
            .collect::<Vec<_>>()
            .join("|")
    }
}

/// Why a wait ended without reaching its target.
#[derive(Debug, Error)]
pub enum WaitError {
    #[error("timed out after {waited:?} (last observed state: {last_state:?})")]
    Timeout {
        last_state: Option<LifecycleState>,
        waited: Duration,
    },

    #[error("object entered unexpected state {state}")]
    UnexpectedState { state: LifecycleState },

    #[error("object disappeared while waiting")]
    Vanished,

    #[error("gave up after {attempts} transient failures: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: ClientError,
    },

    #[error(transparent)]
    Client(ClientError),
}

/// Poll `probe` until it reports a state in `target`.
///
/// The probe returns `Ok(None)` when the object does not exist. Pending states
/// sleep for `policy.interval` and re-probe; any state that is neither target
/// nor pending ends the wait immediately. The loop runs inside the caller's
/// task and only stops on its own outcome or the caller dropping the future.
pub async fn await_terminal_state<T, F, Fut>(
    mut probe: F,
    target: &WaitTarget,
    policy: &WaitPolicy,
) -> Result<Option<T>, WaitError>
where
    T: HasLifecycleState,
    F: FnMut() -> Fut,
    Fut: Future<Output = ClientResult<Option<T>>>,
{
    let started = Instant::now();
    let mut last_state = None;
    let mut transient_failures = 0u32;
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        match probe().await {
            Ok(Some(object)) => {
                let state = object.lifecycle_state();
                last_state = Some(state);
                if target.target.contains(&state) {
                    debug!("poll {}: reached {}", attempt, state);
                    return Ok(Some(object));
                }
                if !target.pending.contains(&state) {
                    return Err(WaitError::UnexpectedState { state });
                }
                debug!("poll {}: {} still pending", attempt, state);
            }
            Ok(None) if target.absent_is_target => {
                debug!("poll {}: object is gone", attempt);
                return Ok(None);
            }
            Ok(None) => return Err(WaitError::Vanished),
            Err(error) if error.is_transient() => {
                transient_failures += 1;
                if transient_failures > policy.max_transient_retries {
                    return Err(WaitError::RetriesExhausted {
                        attempts: transient_failures,
                        source: error,
                    });
                }
                warn!(
                    "poll {}: transient failure {}/{}: {}",
                    attempt, transient_failures, policy.max_transient_retries, error
                );
            }
            Err(error) => return Err(WaitError::Client(error)),
        }

        let waited = started.elapsed();
        if waited + policy.interval > policy.timeout {
            return Err(WaitError::Timeout { last_state, waited });
        }
        tokio::time::sleep(policy.interval).await;
    }
}

/// Skip polling when the object is already where it needs to be.
pub async fn settle<T, F, Fut>(
    initial: T,
    probe: F,
    target: &WaitTarget,
    policy: &WaitPolicy,
) -> Result<Option<T>, WaitError>
where
    T: HasLifecycleState,
    F: FnMut() -> Fut,
    Fut: Future<Output = ClientResult<Option<T>>>,
{
    if target.target.contains(&initial.lifecycle_state()) {
        return Ok(Some(initial));
    }
    await_terminal_state(probe, target, policy).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone)]
    struct Probe(LifecycleState);

    impl HasLifecycleState for Probe {
        fn lifecycle_state(&self) -> LifecycleState {
            self.0
        }
    }

    fn fast_policy(retries: u32) -> WaitPolicy {
        WaitPolicy::new(Duration::from_millis(2), Duration::from_millis(500), retries)
    }

    /// A probe that replays scripted answers, repeating the last one.
    fn scripted(
        answers: Vec<ClientResult<Option<Probe>>>,
    ) -> (
        impl FnMut() -> std::future::Ready<ClientResult<Option<Probe>>>,
        Arc<Mutex<u32>>,
    ) {
        let calls = Arc::new(Mutex::new(0u32));
        let counter = Arc::clone(&calls);
        let mut queue: VecDeque<_> = answers.into();
        let probe = move || {
            *counter.lock().unwrap() += 1;
            let answer = if queue.len() > 1 {
                queue.pop_front().unwrap()
            } else {
                queue.front().cloned().unwrap()
            };
            std::future::ready(answer)
        };
        (probe, calls)
    }

    #[tokio::test]
    async fn test_creating_then_active() {
        let (probe, calls) = scripted(vec![
            Ok(Some(Probe(LifecycleState::Creating))),
            Ok(Some(Probe(LifecycleState::Creating))),
            Ok(Some(Probe(LifecycleState::Active))),
        ]);
        let result = await_terminal_state(probe, &WaitTarget::STABLE, &fast_policy(0))
            .await
            .unwrap();
        assert_eq!(result.unwrap().0, LifecycleState::Active);
        assert_eq!(*calls.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_stuck_in_creating_times_out() {
        let (probe, _) = scripted(vec![Ok(Some(Probe(LifecycleState::Creating)))]);
        let policy = WaitPolicy::new(Duration::from_millis(5), Duration::from_millis(30), 0);
        let error = await_terminal_state(probe, &WaitTarget::STABLE, &policy)
            .await
            .unwrap_err();
        match error {
            WaitError::Timeout { last_state, .. } => {
                assert_eq!(last_state, Some(LifecycleState::Creating))
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failed_state_is_unexpected() {
        let (probe, _) = scripted(vec![
            Ok(Some(Probe(LifecycleState::Creating))),
            Ok(Some(Probe(LifecycleState::Failed))),
        ]);
        let error = await_terminal_state(probe, &WaitTarget::STABLE, &fast_policy(0))
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            WaitError::UnexpectedState {
                state: LifecycleState::Failed
            }
        ));
    }

    #[tokio::test]
    async fn test_transient_errors_within_bound_are_absorbed() {
        let (probe, _) = scripted(vec![
            Err(ClientError::transient("connection reset")),
            Err(ClientError::service(503, "ServiceUnavailable", "try later")),
            Ok(Some(Probe(LifecycleState::Active))),
        ]);
        let result = await_terminal_state(probe, &WaitTarget::STABLE, &fast_policy(2))
            .await
            .unwrap();
        assert!(result.is_some());
    }

    #[tokio::test]
    async fn test_transient_errors_beyond_bound_surface() {
        let (probe, calls) = scripted(vec![Err(ClientError::transient("connection reset"))]);
        let error = await_terminal_state::<Probe, _, _>(probe, &WaitTarget::STABLE, &fast_policy(2))
            .await
            .unwrap_err();
        assert!(matches!(error, WaitError::RetriesExhausted { attempts: 3, .. }));
        assert_eq!(*calls.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_non_transient_error_is_not_retried() {
        let (probe, calls) = scripted(vec![Err(ClientError::service(
            401,
            "NotAuthenticated",
            "bad signature",
        ))]);
        let error = await_terminal_state::<Probe, _, _>(probe, &WaitTarget::STABLE, &fast_policy(5))
            .await
            .unwrap_err();
        assert!(matches!(error, WaitError::Client(_)));
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_absence_ends_delete_wait() {
        let (probe, _) = scripted(vec![Ok(Some(Probe(LifecycleState::Deleting))), Ok(None)]);
        let result = await_terminal_state(probe, &WaitTarget::GONE, &fast_policy(0))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_absence_while_creating_is_an_error() {
        let (probe, _) = scripted(vec![Ok(None)]);
        let error = await_terminal_state::<Probe, _, _>(probe, &WaitTarget::STABLE, &fast_policy(0))
            .await
            .unwrap_err();
        assert!(matches!(error, WaitError::Vanished));
    }

    #[test]
    fn test_settle_skips_probe_when_already_stable() {
        let (probe, calls) = scripted(vec![Ok(Some(Probe(LifecycleState::Creating)))]);
        let result = tokio_test::block_on(settle(
            Probe(LifecycleState::Active),
            probe,
            &WaitTarget::STABLE,
            &fast_policy(0),
        ))
        .unwrap();
        assert_eq!(result.unwrap().0, LifecycleState::Active);
        assert_eq!(*calls.lock().unwrap(), 0);
    }
}
