use std::path::{Path, PathBuf};

use alloy_primitives::Address;
use eyre::WrapErr;
use serde::{Deserialize, Serialize};

/// Overrides `ethereum.account.key_file_password`.
pub const PASSWORD_ENV_VAR: &str = "KEEP_ETHEREUM_PASSWORD";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub ethereum: EthereumConfig,
    #[serde(default)]
    pub sanctioned_applications: SanctionedApplications,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EthereumConfig {
    pub url: String,
    pub contract_addresses: ContractAddresses,
    pub account: AccountConfig,
    #[serde(default = "default_polling_interval_ms")]
    pub polling_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractAddresses {
    pub bonded_ecdsa_keep_factory: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    pub key_file: PathBuf,
    #[serde(default)]
    pub key_file_password: String,
}

/// Applications the operator is willing to serve keeps for.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SanctionedApplications {
    #[serde(default)]
    pub addresses: Vec<String>,
}

fn default_polling_interval_ms() -> u64 {
    3000
}

impl ClientConfig {
    pub async fn load_from_file(path: &Path) -> eyre::Result<Self> {
        let contents = tokio::fs::read_to_string(path).await?;
        let config: Self = serde_json::from_str(&contents)?;
        Ok(config)
    }

    pub fn with_env_overrides(self) -> Self {
        self.with_password_override(std::env::var(PASSWORD_ENV_VAR).ok())
    }

    fn with_password_override(mut self, password: Option<String>) -> Self {
        if let Some(password) = password {
            self.ethereum.account.key_file_password = password;
        }
        self
    }
}

impl ContractAddresses {
    pub fn bonded_ecdsa_keep_factory(&self) -> eyre::Result<Address> {
        self.bonded_ecdsa_keep_factory.parse::<Address>().wrap_err_with(|| {
            format!(
                "invalid keep factory address [{}]",
                self.bonded_ecdsa_keep_factory
            )
        })
    }
}

impl SanctionedApplications {
    pub fn parsed(&self) -> eyre::Result<Vec<Address>> {
        self.addresses
            .iter()
            .map(|address| {
                address
                    .parse::<Address>()
                    .wrap_err_with(|| format!("invalid application address [{}]", address))
            })
            .collect()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ethereum: EthereumConfig {
                url: "http://localhost:8545".to_string(),
                contract_addresses: ContractAddresses {
                    bonded_ecdsa_keep_factory: "0x0000000000000000000000000000000000000000"
                        .to_string(),
                },
                account: AccountConfig {
                    key_file: PathBuf::from("./configs/keystore.json"),
                    key_file_password: String::new(),
                },
                polling_interval_ms: default_polling_interval_ms(),
            },
            sanctioned_applications: SanctionedApplications::default(),
        }
    }
}
