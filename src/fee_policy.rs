use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

/// Size and fee rules of the coin network the dust is collected on.
///
/// Sizes are in bytes, amounts in coins.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeePolicy {
    /// Transactions strictly smaller than this are relayed for free.
    pub free_block_size: u64,
    /// Minimum `priority / size` ratio for a larger transaction to get the stepped fee.
    pub free_priority_threshold: Decimal,
    pub fee_per_block: Decimal,
    pub max_standard_tx_size: u64,
    pub base_tx_size: u64,
    pub output_size: u64,
    pub input_size: u64,
}

impl Default for FeePolicy {
    fn default() -> Self {
        Self {
            free_block_size: 1000,
            free_priority_threshold: dec!(0.576),
            fee_per_block: dec!(0.0001),
            max_standard_tx_size: 100_000,
            base_tx_size: 10,
            output_size: 34,
            input_size: 180,
        }
    }
}

impl FeePolicy {
    /// Size of a transaction with no inputs and the single payout output.
    pub fn empty_tx_size(&self) -> u64 {
        self.base_tx_size + self.output_size
    }

    pub fn is_free_by_size(&self, size: u64) -> bool {
        size < self.free_block_size
    }

    pub fn is_free_by_priority(&self, weight: Decimal, size: u64) -> bool {
        weight > self.free_priority_threshold * Decimal::from(size)
    }

    /// One `fee_per_block` for every started block of `free_block_size` bytes.
    pub fn stepped_fee(&self, size: u64) -> Decimal {
        Decimal::from(size / self.free_block_size) * self.fee_per_block + self.fee_per_block
    }

    pub fn exceeds_standard_size(&self, size: u64) -> bool {
        size > self.max_standard_tx_size
    }
}
