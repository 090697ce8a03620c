//! Strategy A: discovery through the upstream orchestrator.

use std::process::Command;

use orasync_types::{DiscoverySource, FieldSchema};
use tracing::debug;

use crate::config::{CommandConfig, DiscoveryConfig};
use crate::discover::{singer, DiscoveryStrategy};

/// Invokes the orchestrator's discovery command for one entity.
///
/// Requires the configured credential variables to be present; a
/// missing variable is a preflight failure so the coordinator can
/// fall through to direct discovery without spawning anything.
pub struct OrchestratedStrategy {
    command: CommandConfig,
    required_env: Vec<String>,
}

impl OrchestratedStrategy {
    pub fn new(config: &DiscoveryConfig) -> Self {
        Self {
            command: config.orchestrator.clone(),
            required_env: config.required_env.clone(),
        }
    }
}

impl DiscoveryStrategy for OrchestratedStrategy {
    fn source(&self) -> DiscoverySource {
        DiscoverySource::Orchestrated
    }

    fn preflight(&self) -> Result<(), String> {
        let missing: Vec<&str> = self
            .required_env
            .iter()
            .filter(|var| std::env::var(var.as_str()).is_err())
            .map(String::as_str)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(format!(
                "missing required environment variable(s): {}",
                missing.join(", ")
            ))
        }
    }

    fn attempt(&self, entity: &str) -> Result<Vec<FieldSchema>, String> {
        let args: Vec<String> = self
            .command
            .args
            .iter()
            .map(|a| a.replace("{entity}", entity))
            .collect();
        debug!(program = %self.command.program, ?args, entity, "Running orchestrated discovery");

        let output = Command::new(&self.command.program)
            .args(&args)
            .output()
            .map_err(|e| format!("failed to run '{}': {e}", self.command.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!(
                "'{}' exited with {}: {}",
                self.command.program,
                output.status,
                stderr.trim()
            ));
        }

        singer::parse_discovery_output(&String::from_utf8_lossy(&output.stdout), entity)
    }
}
