//! Oracle-backed [`Dialer`] implementation.

use orasync_types::{AttemptOutcome, ConnectTarget};

use super::{DialFailure, Dialer};

/// Dials the database through the Oracle client using the rendered
/// connect descriptor. The blocking client call runs on the blocking
/// pool so the escalation driver stays async.
#[derive(Debug, Default)]
pub struct OracleDialer;

impl Dialer for OracleDialer {
    type Handle = oracle::Connection;

    async fn attempt(&mut self, target: &ConnectTarget) -> Result<Self::Handle, DialFailure> {
        let username = target.username.clone();
        let password = target.password.clone();
        let descriptor = target.descriptor();

        let joined = tokio::task::spawn_blocking(move || {
            oracle::Connection::connect(&username, &password, &descriptor)
        })
        .await;

        match joined {
            Ok(Ok(conn)) => Ok(conn),
            Ok(Err(err)) => {
                let message = err.to_string();
                Err(DialFailure {
                    outcome: classify_connect_error(&message),
                    message,
                })
            }
            Err(join_err) => Err(DialFailure {
                outcome: AttemptOutcome::Other,
                message: format!("connect task failed: {join_err}"),
            }),
        }
    }
}

/// Map an Oracle client error message to an attempt outcome.
///
/// Classification is by ORA- code first, with a few message-text
/// fallbacks for errors the client surfaces without a code.
fn classify_connect_error(message: &str) -> AttemptOutcome {
    let lower = message.to_lowercase();

    if message.contains("ORA-12170") || lower.contains("timed out") {
        return AttemptOutcome::Timeout;
    }
    if message.contains("ORA-12541") || lower.contains("connection refused") {
        return AttemptOutcome::Refused;
    }
    if message.contains("ORA-12545") || lower.contains("could not resolve") {
        return AttemptOutcome::Dns;
    }
    if message.contains("ORA-28759")
        || message.contains("ORA-28860")
        || message.contains("ORA-29024")
        || lower.contains("ssl")
        || lower.contains("tls")
        || lower.contains("handshake")
    {
        return AttemptOutcome::TlsHandshake;
    }
    if message.contains("ORA-01017") {
        return AttemptOutcome::AuthFailed;
    }
    if message.contains("ORA-12514") || message.contains("ORA-12505") {
        return AttemptOutcome::ServiceUnknown;
    }
    AttemptOutcome::Other
}
