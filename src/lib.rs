//! Shared library modules for the joinwatch monitor.
//!
//! Watches new Base blocks for wallets joining through the internal-transfer
//! contract, resolves the counterparty to a social profile, and alerts
//! Telegram when a large account joins.

pub mod alert;
pub mod chain;
pub mod config;
pub mod extract;
pub mod filter;
pub mod profile;
pub mod pump;
pub mod supervisor;
