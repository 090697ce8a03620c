//! Strategy B: direct extractor invocation.
//!
//! Bypasses the orchestrator entirely: a minimal extractor config
//! (base URL, credentials, entity filter) is written to a temp file
//! and the extractor is invoked with it. This path exists because the
//! orchestrator can fail for reasons unrelated to the upstream source
//! being reachable.

use std::io::Write;
use std::process::Command;

use orasync_types::{DiscoverySource, FieldSchema};
use serde_json::json;
use tracing::debug;

use crate::config::{CommandConfig, DiscoveryConfig};
use crate::discover::{singer, DiscoveryStrategy};

pub struct DirectStrategy {
    command: CommandConfig,
    base_url_env: String,
    username_env: String,
    password_env: String,
}

impl DirectStrategy {
    pub fn new(config: &DiscoveryConfig) -> Self {
        Self {
            command: config.extractor.clone(),
            base_url_env: config.base_url_env.clone(),
            username_env: config.username_env.clone(),
            password_env: config.password_env.clone(),
        }
    }

    fn credentials(&self) -> Result<(String, String, String), String> {
        let read = |var: &str| {
            std::env::var(var).map_err(|_| format!("missing environment variable {var}"))
        };
        Ok((
            read(&self.base_url_env)?,
            read(&self.username_env)?,
            read(&self.password_env)?,
        ))
    }
}

impl DiscoveryStrategy for DirectStrategy {
    fn source(&self) -> DiscoverySource {
        DiscoverySource::Direct
    }

    fn preflight(&self) -> Result<(), String> {
        self.credentials().map(|_| ())
    }

    fn attempt(&self, entity: &str) -> Result<Vec<FieldSchema>, String> {
        let (base_url, username, password) = self.credentials()?;

        let inline_config = json!({
            "api_url": base_url,
            "username": username,
            "password": password,
            "entities": [entity],
        });

        let mut config_file = tempfile::NamedTempFile::new()
            .map_err(|e| format!("failed to create extractor config file: {e}"))?;
        config_file
            .write_all(inline_config.to_string().as_bytes())
            .map_err(|e| format!("failed to write extractor config file: {e}"))?;
        let config_path = config_file.path().to_string_lossy().into_owned();

        let args: Vec<String> = self
            .command
            .args
            .iter()
            .map(|a| a.replace("{entity}", entity).replace("{config}", &config_path))
            .collect();
        debug!(program = %self.command.program, ?args, entity, "Running direct discovery");

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

#[cfg(test)]
mod tests {
    use super::*;

    fn env_config(suffix: &str) -> DiscoveryConfig {
        DiscoveryConfig {
            base_url_env: format!("OS_DIRECT_URL_{suffix}"),
            username_env: format!("OS_DIRECT_USER_{suffix}"),
            password_env: format!("OS_DIRECT_PASS_{suffix}"),
            ..DiscoveryConfig::default()
        }
    }

    #[test]
    fn preflight_fails_without_credentials() {
        let strategy = DirectStrategy::new(&env_config("ABSENT"));
        let err = strategy.preflight().unwrap_err();
        assert!(err.contains("OS_DIRECT_URL_ABSENT"));
    }

    #[test]
    fn preflight_passes_with_credentials() {
        std::env::set_var("OS_DIRECT_URL_SET", "https://wms.example.com/api");
        std::env::set_var("OS_DIRECT_USER_SET", "svc_discovery");
        std::env::set_var("OS_DIRECT_PASS_SET", "pw");
        let strategy = DirectStrategy::new(&env_config("SET"));
        assert!(strategy.preflight().is_ok());
        std::env::remove_var("OS_DIRECT_URL_SET");
        std::env::remove_var("OS_DIRECT_USER_SET");
        std::env::remove_var("OS_DIRECT_PASS_SET");
    }

    #[test]
    fn missing_extractor_yields_readable_reason() {
        std::env::set_var("OS_DIRECT_URL_RUN", "https://wms.example.com/api");
        std::env::set_var("OS_DIRECT_USER_RUN", "svc_discovery");
        std::env::set_var("OS_DIRECT_PASS_RUN", "pw");
        let config = DiscoveryConfig {
            extractor: CommandConfig {
                program: "/nonexistent/orasync-test-extractor".into(),
                args: vec!["--discover".into(), "--config".into(), "{config}".into()],
            },
            ..env_config("RUN")
        };
        let strategy = DirectStrategy::new(&config);
        let err = strategy.attempt("allocation").unwrap_err();
        assert!(err.contains("failed to run"));
        std::env::remove_var("OS_DIRECT_URL_RUN");
        std::env::remove_var("OS_DIRECT_USER_RUN");
        std::env::remove_var("OS_DIRECT_PASS_RUN");
    }
}
