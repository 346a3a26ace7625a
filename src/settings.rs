use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use starknet_core::types::Felt;

use crate::felt::{deserialize_felt, deserialize_optional_felt};

pub const DEFAULT_CONFIG_PATH: &str = "counter.yaml";

// STRK token, deployed at the same address on mainnet, sepolia and devnet.
const STRK_ADDRESS: [u8; 32] = [
    0x04, 0x71, 0x8f, 0x5a, 0x0f, 0xc3, 0x4c, 0xc1, 0xaf, 0x16, 0xa1, 0xcd, 0xee, 0x98, 0xff, 0xb2,
    0x0c, 0x31, 0xf5, 0xcd, 0x61, 0xd6, 0xab, 0x07, 0x20, 0x18, 0x58, 0xf4, 0x28, 0x7c, 0x93, 0x8d,
];

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub rpc_endpoint: String,
    pub request_timeout_sec: u64,
    pub rpc_retries: u32,
    #[serde(deserialize_with = "deserialize_felt")]
    pub counter_address: Felt,
    #[serde(deserialize_with = "deserialize_felt")]
    pub token_address: Felt,
    #[serde(deserialize_with = "deserialize_optional_felt")]
    pub account_address: Option<Felt>,
    /// Stark private key of `account_address`, hex encoded.
    pub account_private_key: Option<String>,
    pub poll_interval_sec: u64,
    pub event_lookback_blocks: u64,
    pub events_chunk_size: u64,
    pub network_name: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_endpoint: "http://127.0.0.1:5050/rpc".to_string(),
            request_timeout_sec: 60,
            rpc_retries: 3,
            counter_address: Felt::ZERO,
            token_address: Felt::from_bytes_be(&STRK_ADDRESS),
            account_address: None,
            account_private_key: None,
            poll_interval_sec: 5,
            event_lookback_blocks: 50,
            events_chunk_size: 100,
            network_name: None,
        }
    }
}

impl Config {
    /// Defaults, overridden by the YAML file at `path` (if present), then by
    /// `COUNTER_*` environment variables.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(config::Environment::with_prefix("COUNTER").try_parsing(true))
            .build()
            .and_then(|settings| settings.try_deserialize())
            .with_context(|| format!("Failed to load config from `{}`", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    static NEXT_FILE: AtomicU32 = AtomicU32::new(0);

    /// A yaml path no other test (or concurrent test run) writes to.
    fn unique_yaml_path() -> std::path::PathBuf {
        std::env::temp_dir().join(format!(
            "counter-workshop-settings-{}-{}.yaml",
            std::process::id(),
            NEXT_FILE.fetch_add(1, Ordering::Relaxed)
        ))
    }

    #[test]
    fn defaults_point_at_local_devnet() {
        let config = Config::default();
        assert_eq!(config.event_lookback_blocks, 50);
        assert_eq!(
            config.token_address,
            Felt::from_hex("0x04718f5a0fc34cc1af16a1cdee98ffb20c31f5cd61d6ab07201858f4287c938d")
                .unwrap()
        );
    }

    #[test]
    fn env_overrides_defaults() {
        temp_env::with_vars(
            [
                ("COUNTER_RPC_ENDPOINT", Some("http://node:9545")),
                ("COUNTER_COUNTER_ADDRESS", Some("0x123")),
                ("COUNTER_ACCOUNT_ADDRESS", Some("0xabc")),
                ("COUNTER_ACCOUNT_PRIVATE_KEY", Some("0x1234")),
                ("COUNTER_POLL_INTERVAL_SEC", Some("30")),
            ],
            || {
                let config = Config::load("does-not-exist.yaml").unwrap();
                assert_eq!(config.rpc_endpoint, "http://node:9545");
                assert_eq!(config.counter_address, Felt::from(0x123u64));
                assert_eq!(config.account_address, Some(Felt::from(0xabcu64)));
                assert_eq!(config.account_private_key.as_deref(), Some("0x1234"));
                assert_eq!(config.poll_interval_sec, 30);
                assert_eq!(config.rpc_retries, Config::default().rpc_retries);
            },
        );
    }

    #[test]
    fn reads_yaml_file() {
        let path = unique_yaml_path();
        std::fs::write(
            &path,
            "counter_address: \"0x42\"\nevent_lookback_blocks: 10\nnetwork_name: Devnet\n",
        )
        .unwrap();

        let config = temp_env::with_vars_unset(
            [
                "COUNTER_COUNTER_ADDRESS",
                "COUNTER_EVENT_LOOKBACK_BLOCKS",
                "COUNTER_NETWORK_NAME",
            ],
            || Config::load(&path).unwrap(),
        );
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.counter_address, Felt::from(0x42u64));
        assert_eq!(config.event_lookback_blocks, 10);
        assert_eq!(config.network_name.as_deref(), Some("Devnet"));
    }

    #[test]
    fn rejects_addresses_outside_the_field() {
        let path = unique_yaml_path();
        std::fs::write(
            &path,
            "counter_address: \"0x800000000000011000000000000000000000000000000000000000000000001\"\n",
        )
        .unwrap();

        let result = temp_env::with_vars_unset(["COUNTER_COUNTER_ADDRESS"], || Config::load(&path));
        std::fs::remove_file(&path).unwrap();

        assert!(result.is_err());
    }
}
