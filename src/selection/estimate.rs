use crate::fee_policy::FeePolicy;
use rust_decimal::Decimal;

/// Running totals of the transaction being assembled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxEstimate {
    pub size_bytes: u64,
    pub amount: Decimal,
    /// Sum of the priorities of the inputs.
    pub weight: Decimal,
    pub fee: Decimal,
}

impl TxEstimate {
    pub fn empty(policy: &FeePolicy) -> Self {
        Self {
            size_bytes: policy.empty_tx_size(),
            amount: Decimal::ZERO,
            weight: Decimal::ZERO,
            fee: Decimal::ZERO,
        }
    }

    /// Totals as if one more input of `amount` and `priority` were spent.
    ///
    /// A transaction that is neither small enough to be free nor over the
    /// priority ratio keeps the fee of `self`.
    pub fn with_input(&self, amount: Decimal, priority: Decimal, policy: &FeePolicy) -> Self {
        let size_bytes = self.size_bytes + policy.input_size;
        let weight = self.weight + priority;

        let fee = if policy.is_free_by_size(size_bytes) {
            Decimal::ZERO
        } else if policy.is_free_by_priority(weight, size_bytes) {
            policy.stepped_fee(size_bytes)
        } else {
            self.fee
        };

        Self {
            size_bytes,
            amount: self.amount + amount,
            weight,
            fee,
        }
    }

    pub fn is_acceptable(&self, max_fee: Decimal, policy: &FeePolicy) -> bool {
        self.fee <= max_fee && !policy.exceeds_standard_size(self.size_bytes)
    }
}
