use std::time::Duration;

use anyhow::{Context, Result};

use crate::cli::{Args, Command};
use crate::feed::render_record;
use crate::felt::to_address_string;
use crate::format::{ellipsify, parse_token_amount, DEFAULT_ELLIPSIS_LEN, TOKEN_DECIMALS};
use crate::game::CounterGame;
use crate::indexer::CounterIndexer;
use crate::rpc_client::RpcClient;
use crate::settings::Config;
use crate::wallet::SigningAccount;

pub mod cli;
pub mod feed;
pub mod felt;
pub mod format;
pub mod game;
pub mod indexer;
pub mod models;
pub mod rpc_client;
pub mod settings;
pub mod wallet;

pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .with_target(false)
        .init();
}

pub async fn start_service(args: Args) -> Result<()> {
    let config = Config::load(&args.config)?;

    let rpc_client = RpcClient::new(
        config.rpc_endpoint.clone(),
        Duration::from_secs(config.request_timeout_sec),
        config.rpc_retries,
    )
    .context("Failed to create rpc client")?;
    tracing::debug!(
        endpoint = rpc_client.url(),
        counter = %format!("{:#x}", config.counter_address),
        "client ready"
    );

    match args.command {
        Command::Status(_) => show_status(&config, rpc_client).await,
        Command::History(cmd) => show_history(config, rpc_client, cmd.watch).await,
        Command::Increase(cmd) => {
            let deposit = cmd
                .amount
                .as_deref()
                .map(|amount| parse_token_amount(amount, TOKEN_DECIMALS))
                .transpose()?;
            let wallet = connect_wallet(&config, &rpc_client).await?;
            let game = CounterGame::new(&config, rpc_client);
            let transaction_hash = game.increase(&wallet, deposit).await?;
            println!("Increment submitted: {transaction_hash:#x}");
            Ok(())
        }
        Command::Reset(_) => {
            let wallet = connect_wallet(&config, &rpc_client).await?;
            let game = CounterGame::new(&config, rpc_client);
            let transaction_hash = game.reset(&wallet).await?;
            println!("Reset submitted: {transaction_hash:#x}");
            Ok(())
        }
    }
}

async fn connect_wallet(config: &Config, rpc_client: &RpcClient) -> Result<SigningAccount> {
    let address = config
        .account_address
        .context("No account connected, set `account_address` in the config")?;
    let private_key = config
        .account_private_key
        .as_deref()
        .context("No signing key, set `account_private_key` in the config")?;
    let chain_id = rpc_client.chain_id().await?;
    SigningAccount::new(&config.rpc_endpoint, address, private_key, chain_id)
}

async fn show_status(config: &Config, rpc_client: RpcClient) -> Result<()> {
    let status = CounterGame::new(config, rpc_client)
        .status(config.account_address)
        .await?;

    println!("Counter Workshop [{}]", status.network);
    match status.account {
        Some(account) => println!(
            "Account:       {}",
            ellipsify(&to_address_string(&account), DEFAULT_ELLIPSIS_LEN)
        ),
        None => println!("Account:       not connected"),
    }
    println!("Current count: {} / {}", status.counter, status.win_number);
    println!("Prize pool:    {} STRK", status.prize_pool);
    Ok(())
}

async fn show_history(config: Config, rpc_client: RpcClient, watch: bool) -> Result<()> {
    let indexer = CounterIndexer::new(config, rpc_client);

    if watch {
        indexer
            .run(|added| {
                for record in added {
                    println!("{}", render_record(record));
                }
            })
            .await;
        return Ok(());
    }

    indexer.update().await?;
    for line in indexer.feed().render() {
        println!("{line}");
    }
    Ok(())
}
