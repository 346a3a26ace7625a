use anyhow::{Context, Result};
use serde_json::json;
use starknet_core::types::{BlockId, BlockTag, Felt, FunctionCall};

use crate::rpc_client::*;

impl RpcClient {
    /// Runs a view function against the latest block.
    pub async fn call(&self, call: &FunctionCall) -> Result<Vec<Felt>> {
        self.request(
            "starknet_call",
            json!({
                "request": call,
                "block_id": BlockId::Tag(BlockTag::Latest),
            }),
        )
        .await
        .with_context(|| {
            format!(
                "Failed to call `{:#x}` on `{:#x}`",
                call.entry_point_selector, call.contract_address
            )
        })
    }
}
