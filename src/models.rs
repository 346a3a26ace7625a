use serde::{Deserialize, Serialize};
use starknet_core::types::{Call, EmittedEvent, Felt, FunctionCall};

use crate::felt::{selector, to_address_string, FeltError};

/// The two events of the counter contract that make up the activity feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Increased,
    Reset,
}

impl EventKind {
    pub fn key(&self) -> Result<Felt, FeltError> {
        match self {
            EventKind::Increased => selector("Increased"),
            EventKind::Reset => selector("Reset"),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Increased => "Increased counter",
            EventKind::Reset => "Reset counter",
        }
    }
}

/// An emitted event together with the header fields of the block it landed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredEvent {
    pub event: EmittedEvent,
    pub block_hash: Felt,
    pub timestamp: u64,
}

impl DeliveredEvent {
    /// Account that triggered the event: first data member, or the first key
    /// member when the contract marks the account as `#[key]`.
    pub fn account(&self) -> Option<Felt> {
        self.event
            .data
            .first()
            .or_else(|| self.event.keys.get(1))
            .copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub account: String,
    pub name: String,
    pub hash: String,
    pub timestamp: u64,
}

impl ActivityRecord {
    pub fn from_delivered(kind: EventKind, delivered: &DeliveredEvent) -> Self {
        Self {
            account: delivered
                .account()
                .map(|account| to_address_string(&account))
                .unwrap_or_default(),
            name: kind.label().to_string(),
            hash: format!("{:#x}", delivered.block_hash),
            timestamp: delivered.timestamp,
        }
    }
}

/// One entry of an account multi-call.
pub fn invoke(to: Felt, entry_point: &str, calldata: Vec<Felt>) -> Result<Call, FeltError> {
    Ok(Call {
        to,
        selector: selector(entry_point)?,
        calldata,
    })
}

/// A view call evaluated by `starknet_call`.
pub fn view(
    contract_address: Felt,
    entry_point: &str,
    calldata: Vec<Felt>,
) -> Result<FunctionCall, FeltError> {
    Ok(FunctionCall {
        contract_address,
        entry_point_selector: selector(entry_point)?,
        calldata,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterStatus {
    pub network: String,
    pub counter: u64,
    pub win_number: u64,
    pub prize_pool: String,
    pub account: Option<Felt>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delivered(keys: Vec<Felt>, data: Vec<Felt>) -> DeliveredEvent {
        DeliveredEvent {
            event: EmittedEvent {
                from_address: Felt::from(1u64),
                keys,
                data,
                block_hash: Some(Felt::from(0xbeefu64)),
                block_number: Some(10),
                transaction_hash: Felt::from(2u64),
            },
            block_hash: Felt::from(0xbeefu64),
            timestamp: 1_700_000_000,
        }
    }

    #[test]
    fn normalizes_account_from_data_or_keys() {
        let increased = EventKind::Increased.key().unwrap();
        let from_data = delivered(vec![increased], vec![Felt::from(0xabu64)]);
        let record = ActivityRecord::from_delivered(EventKind::Increased, &from_data);
        assert_eq!(record.account, to_address_string(&Felt::from(0xabu64)));
        assert_eq!(record.name, "Increased counter");
        assert_eq!(record.hash, "0xbeef");
        assert_eq!(record.timestamp, 1_700_000_000);

        let reset = EventKind::Reset.key().unwrap();
        let from_keys = delivered(vec![reset, Felt::from(0xcdu64)], vec![]);
        let record = ActivityRecord::from_delivered(EventKind::Reset, &from_keys);
        assert_eq!(record.account, to_address_string(&Felt::from(0xcdu64)));
        assert_eq!(record.name, "Reset counter");
    }

    #[test]
    fn event_kinds_have_distinct_keys() {
        assert_ne!(
            EventKind::Increased.key().unwrap(),
            EventKind::Reset.key().unwrap()
        );
    }

    #[test]
    fn builds_calls_with_selectors() {
        let call = invoke(Felt::from(0x10u64), "transfer", vec![Felt::ONE]).unwrap();
        assert_eq!(call.to, Felt::from(0x10u64));
        assert_eq!(call.selector, selector("transfer").unwrap());
        assert_eq!(call.calldata, vec![Felt::ONE]);

        let call = view(Felt::from(0x20u64), "get_counter", vec![]).unwrap();
        assert_eq!(call.entry_point_selector, selector("get_counter").unwrap());
        assert!(call.calldata.is_empty());
    }

    #[test]
    fn parses_rpc_event() {
        let event: EmittedEvent = serde_json::from_value(serde_json::json!({
            "from_address": "0x1",
            "keys": ["0x2"],
            "data": ["0x3"],
            "block_hash": "0x4",
            "block_number": 5,
            "transaction_hash": "0x6"
        }))
        .unwrap();
        assert_eq!(event.block_hash, Some(Felt::from(4u64)));
        assert_eq!(event.block_number, Some(5));
    }
}
