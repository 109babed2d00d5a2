use crate::error::DustError;
use crate::unspent::{OutputRef, UnspentOutput};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Inputs and outputs of the consolidating transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct PayoutPlan {
    pub inputs: Vec<OutputRef>,
    pub outputs: BTreeMap<String, Decimal>,
}

impl PayoutPlan {
    /// Sum of the plan's outputs.
    pub fn net_amount(&self) -> Decimal {
        self.outputs.values().copied().sum()
    }

    pub fn ensure_positive(&self, total_amount: Decimal, fee: Decimal) -> Result<(), DustError> {
        if self.net_amount() <= Decimal::ZERO {
            return Err(DustError::NegativePayout {
                total: total_amount,
                fee,
            });
        }
        Ok(())
    }
}

/// Spends every accepted output, last accepted first, into a single
/// `total_amount - fee` payment to `pay_to`.
///
/// The sign of the payment is not checked here, see [`PayoutPlan::ensure_positive`].
pub fn build_payout_plan(
    accepted: &[UnspentOutput],
    pay_to: &str,
    total_amount: Decimal,
    fee: Decimal,
) -> PayoutPlan {
    let inputs = accepted
        .iter()
        .rev()
        .map(UnspentOutput::output_ref)
        .collect::<Vec<_>>();

    let mut outputs = BTreeMap::new();
    outputs.insert(pay_to.to_string(), total_amount - fee);

    PayoutPlan { inputs, outputs }
}
