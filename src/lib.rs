pub mod cleaner;
pub mod config;
pub mod error;
pub mod fee_policy;
pub mod payout;
pub mod report;
pub mod rpc;
pub mod selection;
pub mod unspent;
