use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;
use starknet_core::types::Felt;

use crate::rpc_client::*;

/// The header fields of `starknet_getBlockWithTxHashes` used by the indexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BlockHeader {
    pub block_number: u64,
    pub timestamp: u64,
}

impl RpcClient {
    pub async fn block_number(&self) -> Result<u64> {
        self.request("starknet_blockNumber", json!([]))
            .await
            .context("Failed to get current block number")
    }

    pub async fn chain_id(&self) -> Result<Felt> {
        self.request("starknet_chainId", json!([]))
            .await
            .context("Failed to get chain id")
    }

    pub async fn block_header(&self, block_hash: Felt) -> Result<BlockHeader> {
        self.request(
            "starknet_getBlockWithTxHashes",
            json!({ "block_id": { "block_hash": block_hash } }),
        )
        .await
        .with_context(|| format!("Failed to get block `{block_hash:#x}`"))
    }
}
