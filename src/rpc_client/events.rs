use anyhow::{Context, Result};
use serde_json::json;
use starknet_core::types::{
    BlockId, BlockTag, EmittedEvent, EventFilter as CoreEventFilter, EventFilterWithPage,
    EventsPage, Felt, ResultPageRequest,
};

use crate::rpc_client::*;

/// Events of one contract matching one key, from `from_block` up to `latest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFilter {
    pub address: Felt,
    pub key: Felt,
    pub from_block: u64,
    pub chunk_size: u64,
}

impl EventFilter {
    fn page(&self, continuation_token: Option<String>) -> EventFilterWithPage {
        EventFilterWithPage {
            event_filter: CoreEventFilter {
                from_block: Some(BlockId::Number(self.from_block)),
                to_block: Some(BlockId::Tag(BlockTag::Latest)),
                address: Some(self.address),
                keys: Some(vec![vec![self.key]]),
            },
            result_page_request: ResultPageRequest {
                continuation_token,
                chunk_size: self.chunk_size,
            },
        }
    }
}

impl RpcClient {
    /// Fetches every page of events matching `filter`.
    pub async fn get_events(&self, filter: &EventFilter) -> Result<Vec<EmittedEvent>> {
        let mut events = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let page: EventsPage = self
                .request(
                    "starknet_getEvents",
                    json!({ "filter": filter.page(continuation_token.take()) }),
                )
                .await
                .with_context(|| format!("Failed to get events with key `{:#x}`", filter.key))?;

            events.extend(page.events);

            match page.continuation_token {
                Some(token) => continuation_token = Some(token),
                None => break,
            }
        }

        Ok(events)
    }
}
