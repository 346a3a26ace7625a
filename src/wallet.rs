use anyhow::{anyhow, Context, Result};
use futures::future::BoxFuture;
use starknet_accounts::{Account, ExecutionEncoding, SingleOwnerAccount};
use starknet_core::types::{BlockId, BlockTag, Call, Felt};
use starknet_providers::jsonrpc::{HttpTransport, JsonRpcClient};
use starknet_providers::Url;
use starknet_signer::{LocalWallet, SigningKey};

use crate::felt::parse_felt;

/// Connected account: exposes its address and executes multi-calls.
pub trait Wallet: Send + Sync {
    fn address(&self) -> Felt;

    /// Executes `calls` atomically in one transaction and returns its hash.
    fn execute(&self, calls: Vec<Call>) -> BoxFuture<'_, Result<Felt>>;
}

type Signer = SingleOwnerAccount<JsonRpcClient<HttpTransport>, LocalWallet>;

/// OpenZeppelin-style account controlled by a single stark key. Invokes are
/// signed locally and submitted as V3 transactions with estimated fees.
pub struct SigningAccount {
    account: Signer,
}

impl SigningAccount {
    pub fn new(rpc_endpoint: &str, address: Felt, private_key: &str, chain_id: Felt) -> Result<Self> {
        let url = Url::parse(rpc_endpoint)
            .with_context(|| format!("Invalid rpc endpoint `{rpc_endpoint}`"))?;
        let secret = parse_felt(private_key).context("Invalid account private key")?;
        let signer = LocalWallet::from(SigningKey::from_secret_scalar(secret));

        let mut account = SingleOwnerAccount::new(
            JsonRpcClient::new(HttpTransport::new(url)),
            signer,
            address,
            chain_id,
            ExecutionEncoding::New,
        );
        account.set_block_id(BlockId::Tag(BlockTag::Pending));

        Ok(Self { account })
    }
}

impl Wallet for SigningAccount {
    fn address(&self) -> Felt {
        self.account.address()
    }

    fn execute(&self, calls: Vec<Call>) -> BoxFuture<'_, Result<Felt>> {
        Box::pin(async move {
            tracing::debug!(account = %format!("{:#x}", self.address()), calls = calls.len(), "submitting invoke");

            let result = self
                .account
                .execute_v3(calls)
                .send()
                .await
                .map_err(|e| anyhow!("Failed to submit invoke: {e}"))?;

            tracing::info!(transaction_hash = %format!("{:#x}", result.transaction_hash), "transaction submitted");
            Ok(result.transaction_hash)
        })
    }
}
