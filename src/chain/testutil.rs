//! Fake [`BlockSource`] used by pump and supervisor tests.

use crate::chain::{BlockBody, BlockSource, BlockStream, ReceiptLog};
use alloy::primitives::{Address, B256};
use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
pub struct FakeSource {
    /// Streams handed out per `subscribe_blocks` call, in order. Once
    /// exhausted, further subscriptions hang forever (never deliver).
    pub streams: Mutex<VecDeque<BlockStream>>,
    pub blocks: Mutex<HashMap<u64, BlockBody>>,
    pub receipts: Mutex<HashMap<B256, Vec<ReceiptLog>>>,
    pub tx_counts: Mutex<HashMap<Address, u64>>,
    /// Fault injection.
    pub receipt_errors: Mutex<HashSet<B256>>,
    pub count_error: bool,
    pub probe_error: bool,
    /// How long the liveness probe takes to answer.
    pub probe_delay: Duration,
    /// How long a block fetch takes to answer.
    pub block_delay: Duration,
    pub subscribes: AtomicUsize,
    pub probes: AtomicUsize,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_stream(&self, heights: Vec<u64>, then_close: bool) {
        let head = stream::iter(heights.into_iter().map(Ok));
        let s: BlockStream = if then_close {
            head.boxed()
        } else {
            head.chain(stream::pending()).boxed()
        };
        self.streams.lock().unwrap().push_back(s);
    }

    pub fn insert_block(&self, block: BlockBody) {
        self.blocks.lock().unwrap().insert(block.number, block);
    }

    pub fn insert_receipt(&self, hash: B256, logs: Vec<ReceiptLog>) {
        self.receipts.lock().unwrap().insert(hash, logs);
    }

    pub fn set_tx_count(&self, address: Address, count: u64) {
        self.tx_counts.lock().unwrap().insert(address, count);
    }

    pub fn fail_receipt(&self, hash: B256) {
        self.receipt_errors.lock().unwrap().insert(hash);
    }
}

#[async_trait]
impl BlockSource for FakeSource {
    async fn subscribe_blocks(&self) -> anyhow::Result<BlockStream> {
        self.subscribes.fetch_add(1, Ordering::SeqCst);
        let next = self.streams.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| stream::pending().boxed()))
    }

    async fn block_with_transactions(&self, number: u64) -> anyhow::Result<Option<BlockBody>> {
        tokio::time::sleep(self.block_delay).await;
        let block = self.blocks.lock().unwrap().get(&number).cloned();
        Ok(block)
    }

    async fn transaction_receipt(&self, hash: B256) -> anyhow::Result<Option<Vec<ReceiptLog>>> {
        if self.receipt_errors.lock().unwrap().contains(&hash) {
            anyhow::bail!("receipt fetch failed");
        }
        Ok(self.receipts.lock().unwrap().get(&hash).cloned())
    }

    async fn transaction_count(&self, address: Address) -> anyhow::Result<u64> {
        if self.count_error {
            anyhow::bail!("transaction count probe failed");
        }
        Ok(*self.tx_counts.lock().unwrap().get(&address).unwrap_or(&0))
    }

    async fn block_number(&self) -> anyhow::Result<u64> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.probe_delay).await;
        if self.probe_error {
            anyhow::bail!("liveness probe failed");
        }
        Ok(1)
    }
}
