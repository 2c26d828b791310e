//! Exodus Configuration
//!
//! Shared configuration crate for the exodus operator tooling.
//!
//! Handles loading configuration from:
//! 1. EXODUS_CONFIG env var (explicit path)
//! 2. ./exodus.toml (current directory)
//! 3. ~/.exodus/exodus.toml (user home)
//!
//! Environment variables take precedence over TOML config.

use alloy_primitives::Address;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, fs};

const CONFIG_FILE_NAME: &str = "exodus.toml";
const CONFIG_DIR_NAME: &str = ".exodus";

// ============================================================================
// Default Constants
// ============================================================================

const DEFAULT_DB_PATH: &str = "./exodus-db";
const DEFAULT_PROCESSOR_ADDRESS: &str = "0x00000000000000000000000000000000e0d05000";
const DEFAULT_RELAY_ADDRESS: &str = "0x00000000000000000000000000000000e0d05001";

// ============================================================================
// Config Structs
// ============================================================================

/// Root configuration structure (matches TOML layout)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExodusConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub processor: ProcessorConfig,
    #[serde(default)]
    pub relay: RelayConfig,
    /// Initial role grants applied when the processor is created
    #[serde(default)]
    pub roles: Vec<RoleGrant>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_DB_PATH.into(),
        }
    }
}

fn default_db_path() -> String {
    DEFAULT_DB_PATH.into()
}

/// Withdrawal processor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Address holding the processor's funds
    #[serde(default = "default_processor_address")]
    pub address: String,
    /// Initial administrator
    #[serde(default)]
    pub admin: Option<String>,
    /// Whether committed roots may be replaced
    #[serde(default)]
    pub allow_root_override: bool,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_PROCESSOR_ADDRESS.into(),
            admin: None,
            allow_root_override: false,
        }
    }
}

fn default_processor_address() -> String {
    DEFAULT_PROCESSOR_ADDRESS.into()
}

impl ProcessorConfig {
    pub fn address(&self) -> Result<Address> {
        parse_address(&self.address).context("processor.address")
    }

    pub fn admin(&self) -> Result<Option<Address>> {
        self.admin
            .as_deref()
            .map(|a| parse_address(a).context("processor.admin"))
            .transpose()
    }
}

/// Cross-chain root relay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Identity the relay acts under when forwarding roots
    #[serde(default = "default_relay_address")]
    pub address: String,
    #[serde(default)]
    pub sources: Vec<RelaySource>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_RELAY_ADDRESS.into(),
            sources: Vec::new(),
        }
    }
}

fn default_relay_address() -> String {
    DEFAULT_RELAY_ADDRESS.into()
}

impl RelayConfig {
    pub fn address(&self) -> Result<Address> {
        parse_address(&self.address).context("relay.address")
    }
}

/// An allowed `(chain, address)` origin for relayed messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelaySource {
    pub chain: String,
    pub address: String,
}

/// Roles granted to one address at creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    pub address: String,
    /// Role names, e.g. "disburse", "pause"
    #[serde(default)]
    pub roles: Vec<String>,
}

impl RoleGrant {
    pub fn address(&self) -> Result<Address> {
        parse_address(&self.address).with_context(|| format!("roles entry {}", self.address))
    }
}

fn parse_address(value: &str) -> Result<Address> {
    Address::from_str(value.trim()).with_context(|| format!("Invalid address: {value}"))
}

// ============================================================================
// Environment Variable Helpers
// ============================================================================

/// Set field from env var if present
fn env_string(key: &str, field: &mut String) {
    if let Ok(v) = env::var(key) {
        *field = v;
    }
}

/// Set Option<String> from env var if present
fn env_option_string(key: &str, field: &mut Option<String>) {
    if let Ok(v) = env::var(key) {
        *field = Some(v);
    }
}

/// Check if env var is set to a truthy value ("1" or "true")
fn env_bool(key: &str) -> Option<bool> {
    env::var(key)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

// ============================================================================
// Implementation
// ============================================================================

impl ExodusConfig {
    /// Load configuration from config file with env var overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::find_config_file() {
            Some(path) => {
                log::info!("Loading config from: {}", path.display());
                Self::read(&path)?
            }
            None => {
                log::info!("No config file found, using defaults and environment variables");
                Self::default()
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file path
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::read(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Find the config file path
    fn find_config_file() -> Option<PathBuf> {
        // 1. Check EXODUS_CONFIG env var
        if let Ok(path) = env::var("EXODUS_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. Check ./exodus.toml (current directory)
        let local_path = PathBuf::from(CONFIG_FILE_NAME);
        if local_path.exists() {
            return Some(local_path);
        }

        // 3. Check ~/.exodus/exodus.toml
        Self::default_config_path().filter(|p| p.exists())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        env_string("EXODUS_DB_PATH", &mut self.database.path);

        env_string("EXODUS_PROCESSOR_ADDRESS", &mut self.processor.address);
        env_option_string("EXODUS_ADMIN", &mut self.processor.admin);
        if let Some(v) = env_bool("EXODUS_ALLOW_ROOT_OVERRIDE") {
            self.processor.allow_root_override = v;
        }

        env_string("EXODUS_RELAY_ADDRESS", &mut self.relay.address);
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Generate a sample config file
    pub fn generate_sample() -> String {
        let mut sample = Self::default();
        sample.processor.admin = Some("0x000000000000000000000000000000000000ad01".into());
        sample.relay.sources.push(RelaySource {
            chain: "ethereum".into(),
            address: "0x000000000000000000000000000000000000beef".into(),
        });
        sample.roles.push(RoleGrant {
            address: "0x000000000000000000000000000000000000d15b".into(),
            roles: vec!["disburse".into()],
        });
        toml::to_string_pretty(&sample).unwrap_or_default()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ExodusConfig::default();
        assert_eq!(config.database.path, DEFAULT_DB_PATH);
        assert_eq!(config.processor.address, DEFAULT_PROCESSOR_ADDRESS);
        assert!(config.processor.admin.is_none());
        assert!(!config.processor.allow_root_override);
        assert!(config.relay.sources.is_empty());
        assert!(config.roles.is_empty());
    }

    #[test]
    fn test_generate_sample() {
        let sample = ExodusConfig::generate_sample();
        assert!(sample.contains("[database]"));
        assert!(sample.contains("[processor]"));
        assert!(sample.contains("[[relay.sources]]"));
        assert!(sample.contains("[[roles]]"));
    }

    #[test]
    fn test_parse_sample() {
        let sample = ExodusConfig::generate_sample();
        let parsed: ExodusConfig = toml::from_str(&sample).unwrap();
        assert_eq!(parsed.database.path, DEFAULT_DB_PATH);
        assert!(parsed.processor.admin().unwrap().is_some());
        assert_eq!(parsed.relay.sources.len(), 1);
        assert_eq!(parsed.roles[0].roles, vec!["disburse".to_string()]);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let parsed: ExodusConfig = toml::from_str(
            r#"
            [processor]
            allow_root_override = true
            "#,
        )
        .unwrap();
        assert!(parsed.processor.allow_root_override);
        assert_eq!(parsed.processor.address, DEFAULT_PROCESSOR_ADDRESS);
        assert_eq!(parsed.relay.address, DEFAULT_RELAY_ADDRESS);
    }

    #[test]
    fn test_address_parsing() {
        let config = ExodusConfig::default();
        assert!(config.processor.address().is_ok());
        assert!(config.relay.address().is_ok());

        let bad = ProcessorConfig {
            address: "not-an-address".into(),
            ..ProcessorConfig::default()
        };
        assert!(bad.address().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[database]\npath = \"/tmp/exodus-test-db\"\n").unwrap();

        let config = ExodusConfig::load_from(&path).unwrap();
        if env::var("EXODUS_DB_PATH").is_err() {
            assert_eq!(config.database.path, "/tmp/exodus-test-db");
        }
    }
}
