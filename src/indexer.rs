use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::future::try_join_all;
use itertools::Itertools;
use parking_lot::{Mutex, RwLock};
use starknet_core::types::{EmittedEvent, Felt};

use crate::feed::ActivityFeed;
use crate::models::{ActivityRecord, DeliveredEvent, EventKind};
use crate::rpc_client::{BlockHeader, EventFilter, RpcClient};
use crate::settings;

/// Polls the counter contract for `Increased` and `Reset` events and keeps
/// the merged activity feed.
pub struct CounterIndexer {
    config: settings::Config,
    rpc_client: RpcClient,
    feed: RwLock<ActivityFeed>,
    block_headers: Mutex<HashMap<Felt, BlockHeader>>,
}

impl CounterIndexer {
    pub fn new(config: settings::Config, rpc_client: RpcClient) -> Self {
        Self {
            config,
            rpc_client,
            feed: RwLock::new(ActivityFeed::new()),
            block_headers: Mutex::new(HashMap::new()),
        }
    }

    pub fn feed(&self) -> ActivityFeed {
        self.feed.read().clone()
    }

    /// One poll over the lookback window. Returns records not seen before.
    pub async fn update(&self) -> Result<Vec<ActivityRecord>> {
        let height = self.rpc_client.block_number().await?;
        let from_block = window_start(height, self.config.event_lookback_blocks);
        tracing::debug!(height, from_block, "polling counter events");

        let (increases, resets) = tokio::try_join!(
            self.fetch(EventKind::Increased, from_block),
            self.fetch(EventKind::Reset, from_block),
        )?;

        self.resolve_blocks(increases.iter().chain(resets.iter()))
            .await
            .context("Failed to resolve event blocks")?;

        let (increases, resets) = {
            let mut headers = self.block_headers.lock();
            let delivered = (attach(increases, &headers), attach(resets, &headers));
            headers.retain(|_, header| header.block_number >= from_block);
            delivered
        };

        let added = self.feed.write().merge(&increases, &resets);
        if !added.is_empty() {
            tracing::info!(added = added.len(), total = self.feed.read().len(), "activity feed updated");
        }

        Ok(added)
    }

    /// Keeps polling until the process exits. Failed polls are logged and
    /// retried on the next tick.
    pub async fn run<F>(&self, mut on_new: F)
    where
        F: FnMut(&[ActivityRecord]),
    {
        let poll_interval = Duration::from_secs(self.config.poll_interval_sec);
        loop {
            match self.update().await {
                Ok(added) if !added.is_empty() => on_new(&added),
                Ok(_) => {}
                Err(e) => tracing::error!("error occurred during indexer update: {e:?}"),
            }

            tokio::time::sleep(poll_interval).await;
        }
    }

    async fn fetch(&self, kind: EventKind, from_block: u64) -> Result<Vec<EmittedEvent>> {
        let filter = EventFilter {
            address: self.config.counter_address,
            key: kind.key()?,
            from_block,
            chunk_size: self.config.events_chunk_size,
        };
        self.rpc_client
            .get_events(&filter)
            .await
            .with_context(|| format!("Failed to fetch {kind:?} events"))
    }

    /// Fetches headers of blocks not in the cache, each block once.
    async fn resolve_blocks<'a>(&self, events: impl Iterator<Item = &'a EmittedEvent>) -> Result<()> {
        let missing: Vec<Felt> = {
            let known = self.block_headers.lock();
            events
                .filter_map(|event| event.block_hash)
                .filter(|hash| !known.contains_key(hash))
                .unique()
                .collect()
        };

        let fetched = try_join_all(missing.into_iter().map(|hash| async move {
            let header = self.rpc_client.block_header(hash).await?;
            Ok::<_, anyhow::Error>((hash, header))
        }))
        .await?;

        self.block_headers.lock().extend(fetched);
        Ok(())
    }
}

/// Attaches block timestamps. Events not yet in a block are skipped.
fn attach(events: Vec<EmittedEvent>, headers: &HashMap<Felt, BlockHeader>) -> Vec<DeliveredEvent> {
    events
        .into_iter()
        .filter_map(|event| {
            let block_hash = event.block_hash?;
            let header = headers.get(&block_hash)?;
            Some(DeliveredEvent {
                event,
                block_hash,
                timestamp: header.timestamp,
            })
        })
        .collect()
}

/// First block of the polling window ending at `height`.
pub fn window_start(height: u64, lookback: u64) -> u64 {
    height.saturating_sub(lookback)
}
