//! alloy WebSocket implementation of [`BlockSource`].

use crate::chain::{BlockBody, BlockSource, BlockStream, ReceiptLog, TxBody};
use alloy::consensus::Transaction as ConsensusTx;
use alloy::consensus::TxReceipt as _;
use alloy::eips::BlockNumberOrTag;
use alloy::network::TransactionResponse as _;
use alloy::primitives::{Address, B256};
use alloy::providers::{Provider, ProviderBuilder, RootProvider, WsConnect};
use async_trait::async_trait;
use futures_util::StreamExt;
use tracing::info;

/// Block source backed by a single WebSocket RPC connection.
pub struct WsBlockSource {
    provider: RootProvider,
}

impl WsBlockSource {
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let ws = WsConnect::new(url);
        let provider = ProviderBuilder::new().connect_ws(ws).await?;
        info!(url = %url, "chain WebSocket connected");
        Ok(Self {
            provider: provider.root().clone(),
        })
    }
}

#[async_trait]
impl BlockSource for WsBlockSource {
    async fn subscribe_blocks(&self) -> anyhow::Result<BlockStream> {
        let sub = self.provider.subscribe_blocks().await?;
        Ok(sub.into_stream().map(|header| Ok(header.number)).boxed())
    }

    async fn block_with_transactions(&self, number: u64) -> anyhow::Result<Option<BlockBody>> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Number(number))
            .full()
            .await?;

        let Some(block) = block else {
            return Ok(None);
        };

        let transactions = block
            .transactions
            .into_transactions()
            .map(|tx| TxBody {
                hash: tx.tx_hash(),
                to: ConsensusTx::to(&tx),
                input: ConsensusTx::input(&tx).clone(),
                value: ConsensusTx::value(&tx),
            })
            .collect();

        Ok(Some(BlockBody {
            number: block.header.number,
            transactions,
        }))
    }

    async fn transaction_receipt(&self, hash: B256) -> anyhow::Result<Option<Vec<ReceiptLog>>> {
        let Some(receipt) = self.provider.get_transaction_receipt(hash).await? else {
            return Ok(None);
        };

        // Index is the log's position within this receipt, not within the block.
        let logs = receipt
            .inner
            .logs()
            .iter()
            .enumerate()
            .map(|(position, log)| ReceiptLog {
                index: position as u64,
                data: log.data().data.clone(),
            })
            .collect();

        Ok(Some(logs))
    }

    async fn transaction_count(&self, address: Address) -> anyhow::Result<u64> {
        Ok(self.provider.get_transaction_count(address).await?)
    }

    async fn block_number(&self) -> anyhow::Result<u64> {
        Ok(self.provider.get_block_number().await?)
    }
}
