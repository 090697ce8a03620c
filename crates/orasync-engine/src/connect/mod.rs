//! Connection resilience layer.
//!
//! `acquire` obtains a working database connection under adverse
//! conditions by applying a bounded escalation policy: same-target
//! retries for transient failures, then at most one protocol fallback
//! (encrypted to plain after a handshake failure), then at most one
//! port fallback (to the well-known listener port after a refusal on a
//! non-default port). Unrecoverable failures (bad credentials, unknown
//! service) fail immediately without consuming the retry budget.
//!
//! The escalation decision is a pure function of (state, outcome) so
//! the ordering invariants are unit-testable with scripted outcomes and
//! no network.

mod oracle;

pub use oracle::OracleDialer;

use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

use orasync_types::{
    AttemptOutcome, AttemptRecord, ConnectTarget, EntityError, Protocol, RetryPolicy,
    DEFAULT_LISTENER_PORT,
};

/// Classified failure from a single dial attempt.
#[derive(Debug, Clone)]
pub struct DialFailure {
    pub outcome: AttemptOutcome,
    pub message: String,
}

/// The seam between the escalation driver and the actual transport.
///
/// Production uses [`OracleDialer`]; tests use scripted dialers.
#[allow(async_fn_in_trait)]
pub trait Dialer {
    type Handle;

    async fn attempt(&mut self, target: &ConnectTarget) -> Result<Self::Handle, DialFailure>;
}

/// Successful acquisition: the handle plus the full attempt trail.
#[derive(Debug)]
pub struct Acquired<H> {
    pub handle: H,
    pub attempts: Vec<AttemptRecord>,
}

/// Which fallback an escalation step derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FallbackKind {
    Protocol,
    Port,
}

/// Why an acquire call gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GiveUpReason {
    /// Retry budget exhausted on transient failures.
    Exhausted,
    /// The outcome class is not worth retrying.
    Unrecoverable(AttemptOutcome),
}

/// Next action after a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
enum NextStep {
    /// Sleep, then retry the same target.
    RetrySame { delay: Duration },
    /// Switch to a derived target immediately.
    Fallback {
        target: ConnectTarget,
        kind: FallbackKind,
    },
    GiveUp(GiveUpReason),
}

/// Escalation bookkeeping for one acquire call.
#[derive(Debug, Clone)]
struct EscalationState {
    attempts_used: u32,
    protocol_fallback_used: bool,
    port_fallback_used: bool,
}

impl EscalationState {
    fn new() -> Self {
        Self {
            attempts_used: 0,
            protocol_fallback_used: false,
            port_fallback_used: false,
        }
    }
}

/// Pure escalation decision: (state, last outcome) -> next action.
///
/// Precedence is fixed: unrecoverable classes fail immediately; a
/// handshake failure escalates the protocol at most once; a refusal on
/// a non-default port escalates the port at most once; everything
/// transient retries the same target until the budget runs out.
fn plan_next(
    state: &EscalationState,
    policy: &RetryPolicy,
    target: &ConnectTarget,
    outcome: AttemptOutcome,
) -> NextStep {
    match outcome {
        AttemptOutcome::Success => {
            // Driver handles success before planning; reaching here is a bug.
            NextStep::GiveUp(GiveUpReason::Unrecoverable(AttemptOutcome::Other))
        }
        AttemptOutcome::TlsHandshake => {
            if policy.allow_protocol_fallback
                && !state.protocol_fallback_used
                && target.protocol == Protocol::Tcps
                && state.attempts_used < policy.max_attempts
            {
                NextStep::Fallback {
                    target: target.with_protocol(Protocol::Tcp),
                    kind: FallbackKind::Protocol,
                }
            } else {
                NextStep::GiveUp(GiveUpReason::Unrecoverable(outcome))
            }
        }
        AttemptOutcome::Refused
            if policy.allow_port_fallback
                && !state.port_fallback_used
                && target.port != DEFAULT_LISTENER_PORT
                && state.attempts_used < policy.max_attempts =>
        {
            NextStep::Fallback {
                target: target.with_port(DEFAULT_LISTENER_PORT),
                kind: FallbackKind::Port,
            }
        }
        AttemptOutcome::Timeout | AttemptOutcome::Refused | AttemptOutcome::Dns => {
            if state.attempts_used >= policy.max_attempts {
                NextStep::GiveUp(GiveUpReason::Exhausted)
            } else {
                NextStep::RetrySame {
                    delay: policy.delay_after(state.attempts_used),
                }
            }
        }
        AttemptOutcome::AuthFailed
        | AttemptOutcome::ServiceUnknown
        | AttemptOutcome::Cancelled
        | AttemptOutcome::Other => NextStep::GiveUp(GiveUpReason::Unrecoverable(outcome)),
    }
}

fn give_up_error(reason: GiveUpReason, failure: &DialFailure, target: &ConnectTarget) -> EntityError {
    match reason {
        GiveUpReason::Exhausted => EntityError::transient_network(
            "RETRY_BUDGET_EXHAUSTED",
            format!(
                "retry budget exhausted connecting to {}: {}",
                target, failure.message
            ),
        ),
        GiveUpReason::Unrecoverable(outcome) => match outcome {
            AttemptOutcome::AuthFailed => EntityError::auth(
                "ORA-01017",
                format!("authentication failed for {}: {}", target, failure.message),
            ),
            AttemptOutcome::ServiceUnknown => EntityError::config(
                "ORA-12514",
                format!(
                    "service '{}' not known to the listener: {}",
                    target.service, failure.message
                ),
            ),
            AttemptOutcome::TlsHandshake => EntityError::protocol(
                "TLS_HANDSHAKE_FAILED",
                format!("TLS handshake failed for {}: {}", target, failure.message),
            ),
            _ => EntityError::internal(
                "CONNECT_FAILED",
                format!("unrecoverable connect failure for {}: {}", target, failure.message),
            ),
        },
    }
}

/// Acquire a connection under the given policy.
///
/// Returns the handle plus the attempt trail on success, or a definitive
/// [`EntityError`] carrying the full trail on failure. The optional
/// `deadline` is honored between attempts only; expiry yields a
/// distinguishable cancelled error, never a generic failure.
///
/// # Errors
///
/// Fails on unrecoverable outcomes, on budget exhaustion, or on
/// deadline expiry.
pub async fn acquire<D: Dialer>(
    dialer: &mut D,
    target: ConnectTarget,
    policy: &RetryPolicy,
    deadline: Option<Instant>,
) -> Result<Acquired<D::Handle>, EntityError> {
    let mut state = EscalationState::new();
    let mut current = target;
    let mut attempts: Vec<AttemptRecord> = Vec::new();

    loop {
        state.attempts_used += 1;
        let attempt_no = state.attempts_used;
        let started = Instant::now();
        let result = dialer.attempt(&current).await;
        let elapsed = started.elapsed();

        let failure = match result {
            Ok(handle) => {
                attempts.push(AttemptRecord {
                    endpoint: current.endpoint(),
                    attempt_no,
                    outcome: AttemptOutcome::Success,
                    elapsed,
                });
                info!(
                    endpoint = %current.endpoint(),
                    attempt = attempt_no,
                    "Connection acquired"
                );
                return Ok(Acquired { handle, attempts });
            }
            Err(failure) => failure,
        };

        attempts.push(AttemptRecord {
            endpoint: current.endpoint(),
            attempt_no,
            outcome: failure.outcome,
            elapsed,
        });
        warn!(
            endpoint = %current.endpoint(),
            attempt = attempt_no,
            outcome = %failure.outcome,
            "Connection attempt failed: {}",
            failure.message
        );

        match plan_next(&state, policy, &current, failure.outcome) {
            NextStep::RetrySame { delay } => {
                if deadline_expired(deadline) {
                    return Err(EntityError::cancelled(format!(
                        "deadline expired after {attempt_no} connection attempt(s) to {current}"
                    ))
                    .with_attempts(attempts));
                }
                tokio::time::sleep(delay).await;
            }
            NextStep::Fallback { target: next, kind } => {
                if deadline_expired(deadline) {
                    return Err(EntityError::cancelled(format!(
                        "deadline expired after {attempt_no} connection attempt(s) to {current}"
                    ))
                    .with_attempts(attempts));
                }
                match kind {
                    FallbackKind::Protocol => {
                        state.protocol_fallback_used = true;
                        warn!(
                            fallback = "protocol",
                            from = %current.endpoint(),
                            to = %next.endpoint(),
                            "Protocol fallback after TLS handshake failure"
                        );
                    }
                    FallbackKind::Port => {
                        state.port_fallback_used = true;
                        warn!(
                            fallback = "port",
                            from = %current.endpoint(),
                            to = %next.endpoint(),
                            "Port fallback after refusal on non-default port"
                        );
                    }
                }
                current = next;
            }
            NextStep::GiveUp(reason) => {
                return Err(give_up_error(reason, &failure, &current).with_attempts(attempts));
            }
        }
    }
}

fn deadline_expired(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}
