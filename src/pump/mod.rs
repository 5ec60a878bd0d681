//! Per-block processing pipeline: extract -> filter -> resolve -> dispatch.
//!
//! Faults are contained at two boundaries: a failure fetching the block is
//! logged with the height and skips the block; a failure inside any one
//! transaction is logged with its hash and does not touch its siblings.
//! Transactions run sequentially in block order, so alert order follows
//! transaction order.

use crate::alert::AlertDispatcher;
use crate::chain::{BlockSource, TxBody};
use crate::extract;
use crate::filter;
use crate::profile::ProfileResolver;
use alloy::primitives::Address;
use std::sync::Arc;
use tracing::{debug, error, warn};

pub struct BlockPump {
    source: Arc<dyn BlockSource>,
    resolver: ProfileResolver,
    dispatcher: AlertDispatcher,
    internal_transfer: Address,
}

impl BlockPump {
    pub fn new(
        source: Arc<dyn BlockSource>,
        resolver: ProfileResolver,
        dispatcher: AlertDispatcher,
        internal_transfer: Address,
    ) -> Self {
        Self {
            source,
            resolver,
            dispatcher,
            internal_transfer,
        }
    }

    /// Handle one new-block notification. Never returns an error: the
    /// subscription must survive any single bad block.
    pub async fn on_block(&self, height: u64) {
        let block = match self.source.block_with_transactions(height).await {
            Ok(Some(block)) => block,
            Ok(None) => {
                warn!(block = height, "block not available, skipping");
                return;
            }
            Err(e) => {
                error!(block = height, error = %e, "failed to fetch block, skipping");
                return;
            }
        };

        debug!(
            block = height,
            txs = block.transactions.len(),
            "processing block"
        );

        for tx in &block.transactions {
            if let Err(e) = self.process_transaction(tx).await {
                error!(tx = %tx.hash, error = %e, "failed to process transaction");
            }
        }
    }

    /// One transaction through the full pipeline, each stage gated on the
    /// previous one.
    async fn process_transaction(&self, tx: &TxBody) -> anyhow::Result<()> {
        let Some(candidate) =
            extract::extract_candidate(self.source.as_ref(), tx, self.internal_transfer).await?
        else {
            return Ok(());
        };

        if !filter::is_fresh(self.source.as_ref(), candidate.address).await? {
            return Ok(());
        }

        debug!(address = %candidate.address, reason = ?candidate.reason, "fresh candidate");

        if let Some(alert) = self.resolver.resolve(candidate.address).await? {
            self.dispatcher.dispatch(&alert).await;
        }

        Ok(())
    }
}
