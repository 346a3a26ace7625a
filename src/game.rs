use anyhow::{Context, Result};
use primitive_types::U256;
use starknet_core::types::{Call, Felt};

use crate::felt::{self, u256_from_felts, u256_to_felts};
use crate::format::{format_token_amount, TOKEN_DECIMALS};
use crate::models::{invoke, view, CounterStatus};
use crate::rpc_client::RpcClient;
use crate::settings::Config;
use crate::wallet::Wallet;

const PRIZE_POOL_PLACES: u32 = 6;

/// Reads and drives the counter contract and the STRK prize pool behind it.
pub struct CounterGame {
    rpc_client: RpcClient,
    counter: Felt,
    token: Felt,
    network_name: Option<String>,
}

impl CounterGame {
    pub fn new(config: &Config, rpc_client: RpcClient) -> Self {
        Self {
            rpc_client,
            counter: config.counter_address,
            token: config.token_address,
            network_name: config.network_name.clone(),
        }
    }

    pub async fn counter_value(&self) -> Result<u64> {
        let reply = self
            .rpc_client
            .call(&view(self.counter, "get_counter", vec![])?)
            .await?;
        single_u64(&reply, "get_counter")
    }

    pub async fn win_number(&self) -> Result<u64> {
        let reply = self
            .rpc_client
            .call(&view(self.counter, "get_win_number", vec![])?)
            .await?;
        single_u64(&reply, "get_win_number")
    }

    /// STRK balance held by the counter contract.
    pub async fn prize_pool(&self) -> Result<U256> {
        let reply = self
            .rpc_client
            .call(&view(self.token, "balance_of", vec![self.counter])?)
            .await?;
        match reply.as_slice() {
            [low, high, ..] => Ok(u256_from_felts(low, high)),
            _ => Err(GameError::ShortReply("balance_of", reply.len()).into()),
        }
    }

    /// Configured network name, otherwise the chain id as a short string.
    pub async fn network_name(&self) -> Result<String> {
        if let Some(name) = &self.network_name {
            return Ok(name.clone());
        }
        let chain_id = self.rpc_client.chain_id().await?;
        Ok(felt::to_short_string(&chain_id).unwrap_or_else(|_| format!("{chain_id:#x}")))
    }

    pub async fn status(&self, account: Option<Felt>) -> Result<CounterStatus> {
        let (network, counter, win_number, prize_pool) = tokio::try_join!(
            self.network_name(),
            self.counter_value(),
            self.win_number(),
            self.prize_pool(),
        )?;

        Ok(CounterStatus {
            network,
            counter,
            win_number,
            prize_pool: format_token_amount(prize_pool, TOKEN_DECIMALS, PRIZE_POOL_PLACES),
            account,
        })
    }

    /// Calls for an increment, bundling a STRK deposit into the pool when
    /// `deposit` is non-zero.
    pub fn increase_calls(&self, deposit: Option<U256>) -> Result<Vec<Call>> {
        let mut calls = Vec::with_capacity(2);
        if let Some(amount) = deposit.filter(|amount| !amount.is_zero()) {
            let [low, high] = u256_to_felts(amount);
            calls.push(invoke(self.token, "transfer", vec![self.counter, low, high])?);
        }
        calls.push(invoke(self.counter, "increase_counter", vec![])?);
        Ok(calls)
    }

    /// Calls for a reset. The counter pulls the whole pool from the caller, so
    /// the caller approves it first.
    pub fn reset_calls(&self, prize_pool: U256) -> Result<Vec<Call>> {
        let [low, high] = u256_to_felts(prize_pool);
        Ok(vec![
            invoke(self.token, "approve", vec![self.counter, low, high])?,
            invoke(self.counter, "reset_counter", vec![])?,
        ])
    }

    pub async fn increase(&self, wallet: &dyn Wallet, deposit: Option<U256>) -> Result<Felt> {
        let calls = self.increase_calls(deposit)?;
        tracing::info!(account = %format!("{:#x}", wallet.address()), calls = calls.len(), "increasing counter");
        wallet
            .execute(calls)
            .await
            .context("Failed to increase counter")
    }

    pub async fn reset(&self, wallet: &dyn Wallet) -> Result<Felt> {
        let prize_pool = self.prize_pool().await?;
        tracing::info!(account = %format!("{:#x}", wallet.address()), %prize_pool, "resetting counter");
        wallet
            .execute(self.reset_calls(prize_pool)?)
            .await
            .context("Failed to reset counter")
    }
}

fn single_u64(reply: &[Felt], entry_point: &'static str) -> Result<u64> {
    let value = reply
        .first()
        .ok_or(GameError::ShortReply(entry_point, reply.len()))?;
    Ok(felt::to_u64(value)?)
}

#[derive(thiserror::Error, Debug)]
pub enum GameError {
    #[error("`{0}` returned {1} values")]
    ShortReply(&'static str, usize),
}
