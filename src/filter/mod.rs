//! Fresh-address filter: a candidate is only worth a profile lookup if its
//! wallet has never sent a transaction, the heuristic for a newly created
//! wallet joining for the first time.

use crate::chain::BlockSource;
use alloy::primitives::Address;

/// True iff the address has a zero outgoing-transaction count. A probe
/// failure propagates so the caller can tell a fault from "filtered out".
pub async fn is_fresh(source: &dyn BlockSource, address: Address) -> anyhow::Result<bool> {
    let count = source.transaction_count(address).await?;
    Ok(count == 0)
}
