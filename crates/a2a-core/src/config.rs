//! Anchoring configuration: JSON file plus environment overrides.

use a2a_ledger::XrplConfig;
use a2a_store::IpfsConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::committer::Committer;
use crate::merkle::DEFAULT_CHUNK_SIZE;

/// Environment variable overriding the chunk size.
pub const ENV_CHUNK_SIZE: &str = "A2A_CHUNK_SIZE";
/// Environment variable overriding the IPFS API URL.
pub const ENV_IPFS_API: &str = "A2A_IPFS_API";
/// Environment variable overriding the XRPL node URL.
pub const ENV_XRPL_NODE: &str = "A2A_XRPL_NODE";
/// Environment variable overriding the XRPL network tag.
pub const ENV_XRPL_NETWORK: &str = "A2A_XRPL_NETWORK";
/// Environment variable holding the XRPL account address.
pub const ENV_XRPL_ACCOUNT: &str = "A2A_XRPL_ACCOUNT";
/// Environment variable holding the XRPL account secret.
pub const ENV_XRPL_SECRET: &str = "A2A_XRPL_SECRET";

/// Configuration errors. All of them are fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config file {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The config file is not valid JSON for this schema.
    #[error("invalid config file {path}: {source}")]
    Parse {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
    /// An environment override has an unusable value.
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Variable name.
        key: &'static str,
        /// Offending value.
        value: String,
    },
    /// Chunk size must be positive.
    #[error("invalid chunk size {0}: must be a positive integer")]
    InvalidChunkSize(usize),
    /// A required endpoint is empty.
    #[error("missing endpoint: {0}")]
    MissingEndpoint(&'static str),
    /// Anchoring needs ledger credentials.
    #[error("missing credentials: {0}")]
    MissingCredentials(&'static str),
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

/// Settings for anchoring and verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorConfig {
    /// Merkle chunk size in bytes.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Content store node.
    #[serde(default)]
    pub ipfs: IpfsConfig,
    /// Ledger node and credentials.
    #[serde(default)]
    pub xrpl: XrplConfig,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            ipfs: IpfsConfig::default(),
            xrpl: XrplConfig::default(),
        }
    }
}

impl AnchorConfig {
    /// Reads a JSON config file. Missing keys take their defaults.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// File (or defaults), then process environment, then validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`; empty values are ignored.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(value) = get(ENV_CHUNK_SIZE) {
            match value.trim().parse() {
                Ok(size) => self.chunk_size = size,
                Err(_) => {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_CHUNK_SIZE,
                        value,
                    })
                }
            }
        }
        if let Some(value) = get(ENV_IPFS_API) {
            self.ipfs.api_url = value;
        }
        if let Some(value) = get(ENV_XRPL_NODE) {
            self.xrpl.node_url = value;
        }
        if let Some(value) = get(ENV_XRPL_NETWORK) {
            self.xrpl.network = value;
        }
        if let Some(value) = get(ENV_XRPL_ACCOUNT) {
            self.xrpl.account = Some(value);
        }
        if let Some(value) = get(ENV_XRPL_SECRET) {
            self.xrpl.secret = Some(value);
        }
        Ok(())
    }

    /// Checks chunk size and endpoints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidChunkSize(self.chunk_size));
        }
        if self.ipfs.api_url.trim().is_empty() {
            return Err(ConfigError::MissingEndpoint("ipfs.api_url"));
        }
        if self.xrpl.node_url.trim().is_empty() {
            return Err(ConfigError::MissingEndpoint("xrpl.node_url"));
        }
        Ok(())
    }

    /// Checks that ledger credentials are present, as anchoring requires.
    pub fn require_credentials(&self) -> Result<(), ConfigError> {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        if !present(&self.xrpl.account) {
            return Err(ConfigError::MissingCredentials("xrpl.account"));
        }
        if !present(&self.xrpl.secret) {
            return Err(ConfigError::MissingCredentials("xrpl.secret"));
        }
        Ok(())
    }

    /// Committer for the configured chunk size.
    pub fn committer(&self) -> Result<Committer, ConfigError> {
        Committer::new(self.chunk_size).map_err(|_| ConfigError::InvalidChunkSize(self.chunk_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let config = AnchorConfig::default();
        assert_eq!(config.chunk_size, 4096);
        assert_eq!(config.ipfs.api_url, "http://127.0.0.1:5001");
        assert_eq!(config.xrpl.network, "testnet");
        config.validate().unwrap();
        assert!(matches!(
            config.require_credentials(),
            Err(ConfigError::MissingCredentials("xrpl.account"))
        ));
    }

    #[test]
    fn partial_json_takes_defaults() {
        let config: AnchorConfig =
            serde_json::from_str(r#"{"chunk_size": 1024, "xrpl": {"network": "devnet"}}"#).unwrap();
        assert_eq!(config.chunk_size, 1024);
        assert_eq!(config.xrpl.network, "devnet");
        assert_eq!(config.xrpl.confirm_timeout_secs, 30);
        assert_eq!(config.ipfs.timeout_secs, 30);
    }

    #[test]
    fn environment_overrides_file_values() {
        let mut config = AnchorConfig::default();
        config
            .apply_env_from(env(&[
                (ENV_CHUNK_SIZE, "2048"),
                (ENV_IPFS_API, "http://ipfs:5001"),
                (ENV_XRPL_ACCOUNT, "rAccount"),
                (ENV_XRPL_SECRET, "sSecret"),
                (ENV_XRPL_NETWORK, ""),
            ]))
            .unwrap();
        assert_eq!(config.chunk_size, 2048);
        assert_eq!(config.ipfs.api_url, "http://ipfs:5001");
        assert_eq!(config.xrpl.network, "testnet");
        config.require_credentials().unwrap();
    }

    #[test]
    fn file_is_read_and_validated() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("a2a.json");
        std::fs::write(
            &path,
            r#"{"ipfs": {"api_url": "http://ipfs.local:5001"}, "xrpl": {"account": "rAcc"}}"#,
        )
        .unwrap();
        let config = AnchorConfig::from_path(&path).unwrap();
        assert_eq!(config.ipfs.api_url, "http://ipfs.local:5001");
        assert_eq!(config.xrpl.account.as_deref(), Some("rAcc"));
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);

        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            AnchorConfig::from_path(&path),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            AnchorConfig::from_path(dir.path().join("missing.json")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn bad_values_are_rejected() {
        let mut config = AnchorConfig::default();
        assert!(matches!(
            config.apply_env_from(env(&[(ENV_CHUNK_SIZE, "big")])),
            Err(ConfigError::InvalidValue { key: ENV_CHUNK_SIZE, .. })
        ));

        config.chunk_size = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidChunkSize(0))));
        assert!(config.committer().is_err());

        let mut config = AnchorConfig::default();
        config.ipfs.api_url = " ".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingEndpoint("ipfs.api_url"))
        ));
    }
}
