//! Typed sync configuration sections.

use orasync_types::{ConnectTarget, NamingPolicy, Protocol, RetryPolicy};
use serde::{Deserialize, Serialize};

/// Top-level sync configuration, deserialized from YAML after
/// `${ENV_VAR}` substitution.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Human-readable project name, used in logs.
    pub project: String,
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub retry: RetryPolicy,
    pub naming: NamingPolicy,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    /// Entities to synchronize, in declaration order.
    pub entities: Vec<String>,
    #[serde(default)]
    pub resources: ResourceConfig,
}

/// Target database coordinates and credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Oracle service name (or SID).
    pub service: String,
    pub username: String,
    pub password: String,
    #[serde(default = "default_protocol")]
    pub protocol: Protocol,
}

fn default_port() -> u16 {
    1521
}

fn default_protocol() -> Protocol {
    Protocol::Tcps
}

impl ConnectionConfig {
    /// Build the initial connection target for an acquire call.
    pub fn target(&self) -> ConnectTarget {
        ConnectTarget {
            host: self.host.clone(),
            port: self.port,
            service: self.service.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            protocol: self.protocol,
        }
    }
}

/// External program plus argument template.
///
/// Occurrences of `{entity}` in `args` are replaced with the entity
/// name; `{config}` with the path of a generated config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Discovery strategy configuration (Strategies A and B).
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    /// Strategy A: the orchestrator's discovery command.
    #[serde(default = "default_orchestrator")]
    pub orchestrator: CommandConfig,
    /// Environment variables that must be present before Strategy A is
    /// even attempted. A missing variable routes straight to Strategy B.
    #[serde(default = "default_required_env")]
    pub required_env: Vec<String>,
    /// Strategy B: the extractor invoked directly.
    #[serde(default = "default_extractor")]
    pub extractor: CommandConfig,
    /// Environment variable carrying the upstream base URL.
    #[serde(default = "default_base_url_env")]
    pub base_url_env: String,
    /// Environment variable carrying the upstream username.
    #[serde(default = "default_username_env")]
    pub username_env: String,
    /// Environment variable carrying the upstream password.
    #[serde(default = "default_password_env")]
    pub password_env: String,
}

fn default_orchestrator() -> CommandConfig {
    CommandConfig {
        program: "meltano".into(),
        args: vec![
            "invoke".into(),
            "tap-wms".into(),
            "--discover-entity".into(),
            "{entity}".into(),
        ],
    }
}

fn default_extractor() -> CommandConfig {
    CommandConfig {
        program: "tap-wms".into(),
        args: vec!["--discover".into(), "--config".into(), "{config}".into()],
    }
}

fn default_required_env() -> Vec<String> {
    vec![
        "WMS_API_URL".into(),
        "WMS_API_USERNAME".into(),
        "WMS_API_PASSWORD".into(),
    ]
}

fn default_base_url_env() -> String {
    "WMS_API_URL".into()
}

fn default_username_env() -> String {
    "WMS_API_USERNAME".into()
}

fn default_password_env() -> String {
    "WMS_API_PASSWORD".into()
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            orchestrator: default_orchestrator(),
            required_env: default_required_env(),
            extractor: default_extractor(),
            base_url_env: default_base_url_env(),
            username_env: default_username_env(),
            password_env: default_password_env(),
        }
    }
}

/// Concurrency and retry bounds for a whole sync run.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ResourceConfig {
    /// Bounded worker pool size; one worker per in-flight entity.
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
    /// Whole-entity retries on retryable errors.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Overall deadline per entity, seconds. `None` means no deadline.
    #[serde(default)]
    pub deadline_seconds: Option<u64>,
}

fn default_parallelism() -> u32 {
    4
}

fn default_max_retries() -> u32 {
    2
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            parallelism: default_parallelism(),
            max_retries: default_max_retries(),
            deadline_seconds: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_defaults() {
        let yaml = r"
host: wmsdb.internal
service: WMSPRD
username: etl_loader
password: secret
";
        let conn: ConnectionConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(conn.port, 1521);
        assert_eq!(conn.protocol, Protocol::Tcps);
        let target = conn.target();
        assert_eq!(target.endpoint(), "wmsdb.internal:1521/tcps");
    }

    #[test]
    fn discovery_defaults_are_meltano_shaped() {
        let d = DiscoveryConfig::default();
        assert_eq!(d.orchestrator.program, "meltano");
        assert!(d.orchestrator.args.iter().any(|a| a == "{entity}"));
        assert_eq!(d.required_env.len(), 3);
        assert!(d.extractor.args.iter().any(|a| a == "{config}"));
    }

    #[test]
    fn resource_defaults() {
        let r = ResourceConfig::default();
        assert_eq!(r.parallelism, 4);
        assert_eq!(r.max_retries, 2);
        assert_eq!(r.deadline_seconds, None);
    }
}
