//! Upstream block-data source: domain types and the `BlockSource` seam.
//!
//! The monitor only ever reads a handful of fields per block, so the domain
//! types here carry exactly those instead of the full RPC shapes. The
//! `BlockSource` trait is the complete contract the pipeline needs from the
//! chain, which lets tests drive the pump and supervisor with a fake source.

pub mod provider;

use alloy::primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use futures_util::stream::BoxStream;

pub use provider::WsBlockSource;

/// New-block notifications. An `Err` item is a transport error event; the
/// stream ending is a transport close. Dropping the stream unsubscribes.
pub type BlockStream = BoxStream<'static, anyhow::Result<u64>>;

/// A block with full transaction bodies, as delivered by the data source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockBody {
    pub number: u64,
    pub transactions: Vec<TxBody>,
}

/// The slice of a transaction the pipeline reads. `to` is absent for
/// contract creations; empty `input` marks a plain value transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxBody {
    pub hash: B256,
    pub to: Option<Address>,
    pub input: Bytes,
    pub value: U256,
}

/// One receipt log entry: its position index and raw data payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptLog {
    pub index: u64,
    pub data: Bytes,
}

/// Minimum contract the monitor needs from the chain data provider.
#[async_trait]
pub trait BlockSource: Send + Sync {
    /// Subscribe to new-block height notifications.
    async fn subscribe_blocks(&self) -> anyhow::Result<BlockStream>;

    /// Fetch a block with full transaction bodies. `None` if the node does
    /// not have the block (possible right at the tip).
    async fn block_with_transactions(&self, number: u64) -> anyhow::Result<Option<BlockBody>>;

    /// Fetch the receipt logs for a transaction, `None` if not yet available.
    async fn transaction_receipt(&self, hash: B256) -> anyhow::Result<Option<Vec<ReceiptLog>>>;

    /// Number of transactions ever sent from `address`.
    async fn transaction_count(&self, address: Address) -> anyhow::Result<u64>;

    /// Current chain head height; doubles as the heartbeat liveness probe.
    async fn block_number(&self) -> anyhow::Result<u64>;
}

#[cfg(test)]
pub mod testutil;
