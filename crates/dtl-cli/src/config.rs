use std::path::{Path, PathBuf};

use anyhow::Context;
use dtl_contract::ContractConfig;
use serde::{Deserialize, Serialize};

/// Settings for one `dtl` invocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// JSON file holding committed ledger state.
    pub state_path: PathBuf,
    /// Public key of the caller; its fingerprint is offered to the contract.
    pub public_key_file: Option<PathBuf>,
    pub contract: ContractConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            state_path: PathBuf::from("dtl-state.json"),
            public_key_file: None,
            contract: ContractConfig::default(),
        }
    }
}

impl CliConfig {
    /// Read a TOML config file, or fall back to defaults when none is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dtl_contract::ReceiptPolicy;

    #[test]
    fn default_config() {
        let c = CliConfig::default();
        assert_eq!(c.state_path, PathBuf::from("dtl-state.json"));
        assert!(c.public_key_file.is_none());
        assert_eq!(c.contract, ContractConfig::default());
    }

    #[test]
    fn missing_path_gives_defaults() {
        assert_eq!(CliConfig::load(None).unwrap(), CliConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dtl.toml");
        std::fs::write(
            &path,
            r#"
state_path = "ledger.json"

[contract]
receipt_policy = "strict"
"#,
        )
        .unwrap();

        let c = CliConfig::load(Some(&path)).unwrap();
        assert_eq!(c.state_path, PathBuf::from("ledger.json"));
        assert_eq!(c.contract.receipt_policy, ReceiptPolicy::Strict);
        assert!(c.contract.dedup_purchase_items);
        assert!(c.public_key_file.is_none());
    }

    #[test]
    fn unreadable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CliConfig::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().contains("reading config"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "state_path = [").unwrap();
        assert!(CliConfig::load(Some(&path)).is_err());
    }
}
