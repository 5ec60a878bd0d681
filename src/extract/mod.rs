//! Candidate-address extraction: decides whether a transaction represents a
//! join and, if so, which address joined.
//!
//! Two shapes qualify:
//! - a call into the internal-transfer contract, where the joining address is
//!   decoded out of the first receipt log
//! - a plain value transfer (empty call-data), where the destination itself
//!   is the candidate
//!
//! At most one candidate per transaction. The receipt is only fetched when
//! the transaction actually targets the internal-transfer contract.

use crate::chain::{BlockSource, TxBody};
use alloy::primitives::Address;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateReason {
    /// Decoded from log 0 of an internal-transfer call.
    InternalTransfer,
    /// Destination of a plain value transfer.
    PlainTransfer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub address: Address,
    pub reason: CandidateReason,
}

/// Run both extraction rules against one transaction.
///
/// A receipt-fetch failure is a fault and propagates; "no candidate" cases
/// (missing receipt, no log 0, short log data) are `Ok(None)`.
pub async fn extract_candidate(
    source: &dyn BlockSource,
    tx: &TxBody,
    internal_transfer: Address,
) -> anyhow::Result<Option<Candidate>> {
    let Some(to) = tx.to else {
        return Ok(None);
    };

    // Address equality is byte equality; hex casing never matters here.
    if to == internal_transfer {
        let Some(logs) = source.transaction_receipt(tx.hash).await? else {
            return Ok(None);
        };
        for log in &logs {
            if log.index == 0 {
                // The joining address occupies the final 20 bytes of the
                // first 32-byte data word.
                let Some(word) = log.data.get(12..32) else {
                    return Ok(None);
                };
                return Ok(Some(Candidate {
                    address: Address::from_slice(word),
                    reason: CandidateReason::InternalTransfer,
                }));
            }
        }
        Ok(None)
    } else if tx.input.is_empty() {
        Ok(Some(Candidate {
            address: to,
            reason: CandidateReason::PlainTransfer,
        }))
    } else {
        Ok(None)
    }
}
