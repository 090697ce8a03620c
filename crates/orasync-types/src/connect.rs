//! Connection targets, attempt records, and the retry policy.
//!
//! A [`ConnectTarget`] is immutable for the duration of one attempt; the
//! resilience layer derives new targets (alternate protocol or port)
//! rather than mutating the original. None of these types are persisted;
//! they live for a single `acquire` call.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default Oracle listener port, used as the port-fallback alternate.
pub const DEFAULT_LISTENER_PORT: u16 = 1521;

/// Wire transport for the database connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    /// Encrypted transport (TCPS).
    Tcps,
    /// Plain transport (TCP).
    Tcp,
}

impl Protocol {
    /// The other transport, for protocol fallback.
    pub fn alternate(self) -> Self {
        match self {
            Self::Tcps => Self::Tcp,
            Self::Tcp => Self::Tcps,
        }
    }

    fn descriptor_token(self) -> &'static str {
        match self {
            Self::Tcps => "TCPS",
            Self::Tcp => "TCP",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tcps => f.write_str("tcps"),
            Self::Tcp => f.write_str("tcp"),
        }
    }
}

/// One connection endpoint plus credentials.
///
/// `Debug` and `Display` never include the password.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectTarget {
    pub host: String,
    pub port: u16,
    /// Oracle service name (or SID).
    pub service: String,
    pub username: String,
    pub password: String,
    pub protocol: Protocol,
}

impl ConnectTarget {
    /// Derive a target on the alternate transport, same endpoint otherwise.
    pub fn with_protocol(&self, protocol: Protocol) -> Self {
        Self {
            protocol,
            ..self.clone()
        }
    }

    /// Derive a target on a different port, same everything else.
    pub fn with_port(&self, port: u16) -> Self {
        Self {
            port,
            ..self.clone()
        }
    }

    /// Render the Oracle connect descriptor for this target.
    pub fn descriptor(&self) -> String {
        format!(
            "(DESCRIPTION=(ADDRESS=(PROTOCOL={})(HOST={})(PORT={}))(CONNECT_DATA=(SERVICE_NAME={})))",
            self.protocol.descriptor_token(),
            self.host,
            self.port,
            self.service
        )
    }

    /// Short endpoint label for logs and attempt records.
    pub fn endpoint(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.protocol)
    }
}

impl std::fmt::Debug for ConnectTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectTarget")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("service", &self.service)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("protocol", &self.protocol)
            .finish()
    }
}

impl std::fmt::Display for ConnectTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.username, self.endpoint())
    }
}

/// Classified result of a single connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success,
    /// Connect timed out (transient).
    Timeout,
    /// Connection refused by the listener (transient, may trigger port fallback).
    Refused,
    /// Hostname did not resolve (transient).
    Dns,
    /// TLS/SSL handshake failed (may trigger protocol fallback).
    TlsHandshake,
    /// Bad credentials (unrecoverable).
    AuthFailed,
    /// Service name not registered with the listener (unrecoverable).
    ServiceUnknown,
    /// The caller's deadline expired between attempts.
    Cancelled,
    /// Anything else (unrecoverable).
    Other,
}

impl AttemptOutcome {
    /// Transient outcomes are retried against the same target.
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Timeout | Self::Refused | Self::Dns)
    }
}

impl std::fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::Timeout => "timeout",
            Self::Refused => "refused",
            Self::Dns => "dns",
            Self::TlsHandshake => "tls_handshake",
            Self::AuthFailed => "auth_failed",
            Self::ServiceUnknown => "service_unknown",
            Self::Cancelled => "cancelled",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

/// Diagnostic record of one attempt within an `acquire` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// `host:port/protocol` of the target used.
    pub endpoint: String,
    /// 1-based attempt index within the acquire call.
    pub attempt_no: u32,
    pub outcome: AttemptOutcome,
    pub elapsed: Duration,
}

/// Bounded escalation policy for `acquire`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempt budget across all targets (>= 1).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base delay before the first transient retry.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Multiplier applied per transient retry.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    /// Permit one encrypted-to-plain escalation after a handshake failure.
    #[serde(default = "default_true")]
    pub allow_protocol_fallback: bool,
    /// Permit one escalation to the well-known listener port after a refusal.
    #[serde(default = "default_true")]
    pub allow_port_fallback: bool,
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            allow_protocol_fallback: true,
            allow_port_fallback: true,
        }
    }
}

impl RetryPolicy {
    /// Delay before retrying after the given 1-based attempt number.
    ///
    /// `base_delay * multiplier^(attempt - 1)`, saturating.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let ms = {
            let scaled =
                self.base_delay_ms as f64 * self.backoff_multiplier.powi(exp.min(30) as i32);
            if scaled.is_finite() && scaled >= 0.0 {
                scaled.min(u64::MAX as f64) as u64
            } else {
                u64::MAX
            }
        };
        Duration::from_millis(ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> ConnectTarget {
        ConnectTarget {
            host: "wmsdb.internal".into(),
            port: 1522,
            service: "WMSPRD".into(),
            username: "etl_loader".into(),
            password: "hunter2".into(),
            protocol: Protocol::Tcps,
        }
    }

    #[test]
    fn descriptor_renders_protocol_host_port_service() {
        let d = target().descriptor();
        assert_eq!(
            d,
            "(DESCRIPTION=(ADDRESS=(PROTOCOL=TCPS)(HOST=wmsdb.internal)(PORT=1522))\
             (CONNECT_DATA=(SERVICE_NAME=WMSPRD)))"
        );
        assert!(d.contains("(PROTOCOL=TCPS)"));
        assert!(d.contains("(PORT=1522)"));
    }

    #[test]
    fn derived_targets_do_not_mutate_original() {
        let t = target();
        let plain = t.with_protocol(Protocol::Tcp);
        let moved = t.with_port(1521);
        assert_eq!(t.protocol, Protocol::Tcps);
        assert_eq!(t.port, 1522);
        assert_eq!(plain.protocol, Protocol::Tcp);
        assert_eq!(moved.port, 1521);
        assert_eq!(moved.protocol, Protocol::Tcps);
    }

    #[test]
    fn debug_redacts_password() {
        let s = format!("{:?}", target());
        assert!(s.contains("<redacted>"));
        assert!(!s.contains("hunter2"));
    }

    #[test]
    fn display_omits_password() {
        let s = format!("{}", target());
        assert_eq!(s, "etl_loader@wmsdb.internal:1522/tcps");
    }

    #[test]
    fn protocol_alternate_flips() {
        assert_eq!(Protocol::Tcps.alternate(), Protocol::Tcp);
        assert_eq!(Protocol::Tcp.alternate(), Protocol::Tcps);
    }

    #[test]
    fn transient_classification() {
        assert!(AttemptOutcome::Timeout.is_transient());
        assert!(AttemptOutcome::Refused.is_transient());
        assert!(AttemptOutcome::Dns.is_transient());
        assert!(!AttemptOutcome::TlsHandshake.is_transient());
        assert!(!AttemptOutcome::AuthFailed.is_transient());
        assert!(!AttemptOutcome::Cancelled.is_transient());
    }

    #[test]
    fn backoff_grows_geometrically() {
        let policy = RetryPolicy {
            base_delay_ms: 100,
            backoff_multiplier: 2.0,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.delay_after(1), Duration::from_millis(100));
        assert_eq!(policy.delay_after(2), Duration::from_millis(200));
        assert_eq!(policy.delay_after(3), Duration::from_millis(400));
    }

    #[test]
    fn retry_policy_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 5);
        assert!(policy.allow_protocol_fallback);
        assert!(policy.allow_port_fallback);
    }
}
