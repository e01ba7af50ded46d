//! Configuration module for the ChainTicket client
//!
//! This module handles all configuration loading from TOML files,
//! environment variables, and provides structured configuration types.

use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Node endpoint configuration
    pub rpc: RpcConfig,

    /// Wallet configuration
    pub wallet: WalletConfig,

    /// Transaction assembly configuration
    #[serde(default)]
    pub assembler: AssemblerConfig,

    /// Submission recovery configuration
    #[serde(default)]
    pub submit: SubmitConfig,

    /// Bulk operation configuration
    #[serde(default)]
    pub bulk: BulkConfig,

    /// Monitoring and metrics
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Node RPC endpoint
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_rpc_timeout")]
    pub timeout_secs: u64,

    /// Commitment level for reads and submission preflight
    #[serde(default = "default_commitment")]
    pub commitment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Path to keypair file
    pub keypair_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblerConfig {
    /// Total freshness token fetch attempts, first try included
    #[serde(default = "default_blockhash_attempts")]
    pub max_blockhash_attempts: u32,

    /// Pause between fetch attempts in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitConfig {
    /// How many times an expired transaction is rebuilt before giving up
    #[serde(default = "default_stale_rebuilds")]
    pub max_stale_rebuilds: u32,

    /// How many times an unreachable node is retried before giving up
    #[serde(default = "default_transport_retries")]
    pub max_transport_retries: u32,

    /// Pause between transport retries in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub transport_retry_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkConfig {
    /// Maximum holder pipelines in flight at once
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Per-pipeline deadline in seconds
    #[serde(default = "default_pipeline_deadline")]
    pub pipeline_deadline_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Enable Prometheus metrics
    #[serde(default = "default_true")]
    pub enable_metrics: bool,
}

// Default value functions
fn default_rpc_timeout() -> u64 {
    30
}
fn default_commitment() -> String {
    "confirmed".to_string()
}
fn default_blockhash_attempts() -> u32 {
    3
}
fn default_retry_delay_ms() -> u64 {
    500
}
fn default_stale_rebuilds() -> u32 {
    2
}
fn default_transport_retries() -> u32 {
    3
}
fn default_max_concurrency() -> usize {
    8
}
fn default_pipeline_deadline() -> u64 {
    30
}
fn default_true() -> bool {
    true
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            max_blockhash_attempts: default_blockhash_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            max_stale_rebuilds: default_stale_rebuilds(),
            max_transport_retries: default_transport_retries(),
            transport_retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            pipeline_deadline_secs: default_pipeline_deadline(),
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enable_metrics: default_true(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration after sourcing `.env`, so variables like
    /// `RUST_LOG` set there are visible to the rest of startup
    pub fn from_file_with_env(path: &str) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_file(path)
    }

    /// Create default configuration
    pub fn default() -> Self {
        Self {
            rpc: RpcConfig {
                url: "https://api.mainnet-beta.solana.com".to_string(),
                timeout_secs: default_rpc_timeout(),
                commitment: default_commitment(),
            },
            wallet: WalletConfig {
                keypair_path: "~/.config/solana/id.json".to_string(),
            },
            assembler: AssemblerConfig::default(),
            submit: SubmitConfig::default(),
            bulk: BulkConfig::default(),
            monitoring: MonitoringConfig::default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.rpc.timeout_secs, 30);
        assert_eq!(config.rpc.commitment, "confirmed");
        assert_eq!(config.assembler.max_blockhash_attempts, 3);
        assert_eq!(config.assembler.retry_delay_ms, 500);
        assert_eq!(config.submit.max_stale_rebuilds, 2);
        assert_eq!(config.submit.max_transport_retries, 3);
        assert_eq!(config.bulk.max_concurrency, 8);
        assert_eq!(config.bulk.pipeline_deadline_secs, 30);
        assert!(config.monitoring.enable_metrics);
    }

    #[test]
    fn test_minimal_file_fills_in_defaults() {
        let toml_str = r#"
            [rpc]
            url = "http://localhost:8899"

            [wallet]
            keypair_path = "/tmp/id.json"
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.rpc.url, "http://localhost:8899");
        assert_eq!(config.rpc.commitment, "confirmed");
        assert_eq!(config.submit.max_transport_retries, 3);
        assert_eq!(config.bulk.max_concurrency, 8);
    }

    #[test]
    fn test_explicit_values_survive_a_round_trip() {
        let mut config = Config::default();
        config.rpc.url = "http://localhost:8899".to_string();
        config.assembler.max_blockhash_attempts = 5;
        config.bulk.pipeline_deadline_secs = 120;

        let rendered = toml::to_string(&config).unwrap();
        let reparsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(reparsed.rpc.url, "http://localhost:8899");
        assert_eq!(reparsed.assembler.max_blockhash_attempts, 5);
        assert_eq!(reparsed.bulk.pipeline_deadline_secs, 120);
    }

    #[test]
    fn test_missing_required_section_is_an_error() {
        let toml_str = r#"
            [rpc]
            url = "http://localhost:8899"
        "#;
        assert!(toml::from_str::<Config>(toml_str).is_err());
    }
}
