use std::path::Path;

use anyhow::Result;
use orasync_engine::connect::{acquire, OracleDialer};
use orasync_types::AttemptRecord;

/// Execute the `check` command: validate config and database connectivity.
pub async fn execute(config_path: &Path) -> Result<()> {
    let config = super::load_config(config_path)?;
    println!("Configuration: OK");

    let mut dialer = OracleDialer;
    match acquire(&mut dialer, config.connection.target(), &config.retry, None).await {
        Ok(acquired) => {
            println!("Connection:    OK");
            print_attempts(&acquired.attempts);

            let conn = acquired.handle;
            tokio::task::spawn_blocking(move || conn.close()).await?.ok();

            println!("\nAll checks passed.");
            Ok(())
        }
        Err(err) => {
            println!("Connection:    FAILED");
            print_attempts(&err.attempts);
            anyhow::bail!("Connectivity check failed: {err}")
        }
    }
}

fn print_attempts(attempts: &[AttemptRecord]) {
    for attempt in attempts {
        println!(
            "  attempt {}: {} -> {} ({:?})",
            attempt.attempt_no, attempt.endpoint, attempt.outcome, attempt.elapsed
        );
    }
}
