pub mod estimate;

use crate::fee_policy::FeePolicy;
use crate::selection::estimate::TxEstimate;
use crate::unspent::UnspentOutput;
use itertools::Itertools;
use rust_decimal::Decimal;
use std::collections::HashSet;

/// Outcome of one selection pass.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionResult {
    /// Outputs to spend, in the order they were accepted.
    pub accepted: Vec<UnspentOutput>,
    /// Excluded outputs first, then the ones refused by the fee or size rules.
    pub rejected: Vec<UnspentOutput>,
    pub total_amount: Decimal,
    pub fee: Decimal,
    pub size_bytes: u64,
}

impl SelectionResult {
    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }
}

/// Greedy dust selector.
///
/// Candidates are visited once, from the highest priority to the lowest, and
/// each one is kept if the transaction still fits under the fee ceiling and
/// the standard size. There is no backtracking: the result is best-effort and
/// not necessarily the largest subset that would fit.
#[derive(Debug, Clone, Default)]
pub struct DustSelector {
    policy: FeePolicy,
}

impl DustSelector {
    pub fn new(policy: FeePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &FeePolicy {
        &self.policy
    }

    pub fn select(
        &self,
        candidates: Vec<UnspentOutput>,
        excluded_addresses: &HashSet<String>,
        max_fee: Decimal,
    ) -> SelectionResult {
        let (mut rejected, eligible): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .partition(|candidate| candidate.is_excluded(excluded_addresses));

        // stable ascending sort, consumed from the high-priority end
        let work = eligible
            .into_iter()
            .map(|candidate| (candidate.priority(), candidate))
            .sorted_by(|(a, _), (b, _)| a.cmp(b));

        let mut accepted = vec![];
        let mut estimate = TxEstimate::empty(&self.policy);

        for (priority, candidate) in work.rev() {
            let next = estimate.with_input(candidate.amount, priority, &self.policy);
            if next.is_acceptable(max_fee, &self.policy) {
                tracing::trace!(
                    "accepted {}:{} priority: {}, size: {}, fee: {}",
                    candidate.txid,
                    candidate.vout,
                    priority,
                    next.size_bytes,
                    next.fee
                );
                accepted.push(candidate);
                estimate = next;
            } else {
                tracing::trace!(
                    "rejected {}:{} priority: {}, size: {}, fee: {}",
                    candidate.txid,
                    candidate.vout,
                    priority,
                    next.size_bytes,
                    next.fee
                );
                rejected.push(candidate);
            }
        }

        SelectionResult {
            accepted,
            rejected,
            total_amount: estimate.amount,
            fee: estimate.fee,
            size_bytes: estimate.size_bytes,
        }
    }
}

/// [`DustSelector::select`] with the default fee policy.
pub fn select_dust(
    candidates: Vec<UnspentOutput>,
    excluded_addresses: &HashSet<String>,
    max_fee: Decimal,
) -> SelectionResult {
    DustSelector::default().select(candidates, excluded_addresses, max_fee)
}

#[cfg(test)]
mod tests {
    use crate::fee_policy::FeePolicy;
    use crate::selection::{select_dust, DustSelector};
    use crate::unspent::UnspentOutput;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::HashSet;

    fn output(txid: &str, address: &str, amount: Decimal, confirmations: u64) -> UnspentOutput {
        UnspentOutput::new(txid, 0, address, amount, confirmations)
    }

    fn txids(outputs: &[UnspentOutput]) -> Vec<&str> {
        outputs.iter().map(|o| o.txid.as_str()).collect()
    }

    fn high_priority(count: usize) -> Vec<UnspentOutput> {
        (0..count)
            .map(|i| output(&format!("tx{i}"), "A", dec!(1), 1000))
            .collect()
    }

    #[test]
    fn empty_candidates() {
        let result = select_dust(vec![], &HashSet::new(), Decimal::ZERO);
        assert!(result.accepted.is_empty());
        assert!(result.rejected.is_empty());
        assert_eq!(result.total_amount, Decimal::ZERO);
        assert_eq!(result.fee, Decimal::ZERO);
        assert_eq!(result.size_bytes, 44);
    }

    #[test]
    fn everything_excluded() {
        let candidates = vec![
            output("a", "X", dec!(1), 10),
            output("b", "Y", dec!(2), 10),
        ];
        let excluded = HashSet::from(["X".to_string(), "Y".to_string()]);
        let result = select_dust(candidates, &excluded, dec!(1));
        assert!(result.accepted.is_empty());
        assert_eq!(txids(&result.rejected), vec!["a", "b"]);
        assert_eq!(result.total_amount, Decimal::ZERO);
        assert_eq!(result.fee, Decimal::ZERO);
        assert_eq!(result.size_bytes, 44);
    }

    #[test]
    fn highest_priority_goes_first() {
        let candidates = vec![
            output("b", "B", dec!(1), 1),
            output("a", "A", dec!(10), 100),
        ];
        let result = select_dust(candidates, &HashSet::new(), Decimal::ZERO);
        assert_eq!(txids(&result.accepted), vec!["a", "b"]);
        assert!(result.rejected.is_empty());
        assert_eq!(result.total_amount, dec!(11));
        assert_eq!(result.fee, Decimal::ZERO);
        assert_eq!(result.size_bytes, 404);
    }

    #[test]
    fn equal_priority_takes_later_input_first() {
        let candidates = vec![
            output("first", "A", dec!(2), 5),
            output("second", "A", dec!(5), 2),
        ];
        let result = select_dust(candidates, &HashSet::new(), Decimal::ZERO);
        assert_eq!(txids(&result.accepted), vec!["second", "first"]);
    }

    #[test]
    fn free_only_stops_at_free_block_size() {
        let result = select_dust(high_priority(7), &HashSet::new(), Decimal::ZERO);
        assert_eq!(result.accepted.len(), 5);
        assert_eq!(result.rejected.len(), 2);
        assert_eq!(result.size_bytes, 944);
        assert_eq!(result.fee, Decimal::ZERO);
    }

    #[test]
    fn two_block_fee_over_ceiling_is_rejected() {
        // the sixth input brings the size to 1124 bytes and the fee to 0.0002
        let result = select_dust(high_priority(7), &HashSet::new(), dec!(0.0001));
        assert_eq!(result.accepted.len(), 5);
        assert_eq!(result.rejected.len(), 2);
        assert_eq!(result.fee, Decimal::ZERO);
        assert_eq!(result.total_amount, dec!(5));
    }

    #[test]
    fn stepped_fee_within_ceiling() {
        let result = select_dust(high_priority(12), &HashSet::new(), dec!(0.0002));
        // 44 + 10 * 180 = 1844 is the last size below 2000 bytes
        assert_eq!(result.accepted.len(), 10);
        assert_eq!(result.rejected.len(), 2);
        assert_eq!(result.size_bytes, 1844);
        assert_eq!(result.fee, dec!(0.0002));
    }

    #[test]
    fn low_priority_keeps_committed_fee() {
        let mut candidates: Vec<_> = (0..5)
            .map(|i| output(&format!("high{i}"), "A", dec!(1.29), 100))
            .collect();
        // pushes the ratio over the threshold at 1124 bytes: fee 0.0002 > 0
        candidates.push(output("medium", "A", dec!(0.03), 100));
        // stays under the threshold: fee stays at the committed 0
        candidates.push(output("low", "A", dec!(0.01), 100));

        let result = select_dust(candidates, &HashSet::new(), Decimal::ZERO);
        assert_eq!(result.accepted.len(), 6);
        assert_eq!(result.accepted.last().unwrap().txid, "low");
        assert_eq!(txids(&result.rejected), vec!["medium"]);
        assert_eq!(result.size_bytes, 1124);
        assert_eq!(result.fee, Decimal::ZERO);
        assert_eq!(result.total_amount, dec!(6.46));
    }

    #[test]
    fn low_priority_dust_past_free_size_stays_free() {
        let candidates: Vec<_> = (0..6)
            .map(|i| output(&format!("dust{i}"), "A", dec!(0.001), 1))
            .collect();
        let result = select_dust(candidates, &HashSet::new(), Decimal::ZERO);
        assert_eq!(result.accepted.len(), 6);
        assert_eq!(result.size_bytes, 1124);
        assert_eq!(result.fee, Decimal::ZERO);
    }

    #[test]
    fn standard_size_limit() {
        let result = select_dust(high_priority(560), &HashSet::new(), dec!(1));
        assert_eq!(result.accepted.len(), 555);
        assert_eq!(result.rejected.len(), 5);
        assert_eq!(result.size_bytes, 99_944);
        assert_eq!(result.fee, dec!(0.01));
    }

    #[test]
    fn custom_policy() {
        let selector = DustSelector::new(FeePolicy {
            max_standard_tx_size: 500,
            ..FeePolicy::default()
        });
        let result = selector.select(high_priority(4), &HashSet::new(), dec!(1));
        assert_eq!(result.accepted.len(), 2);
        assert_eq!(result.rejected.len(), 2);
        assert_eq!(result.size_bytes, 404);
    }

    #[test]
    fn random_sets_keep_invariants() {
        let mut rng = StdRng::seed_from_u64(7);
        let addresses = ["A", "B", "C", "D"];
        let excluded = HashSet::from(["D".to_string()]);
        let policy = FeePolicy::default();

        for _ in 0..200 {
            let count = rng.gen_range(0..40);
            let candidates: Vec<_> = (0..count)
                .map(|i| {
                    UnspentOutput::new(
                        format!("tx{i}"),
                        rng.gen_range(0..4),
                        addresses[rng.gen_range(0..addresses.len())],
                        Decimal::new(rng.gen_range(1..10_000_000), 8),
                        rng.gen_range(0..20_000),
                    )
                })
                .collect();
            let max_fee = Decimal::new(rng.gen_range(0..4), 4);

            let result = select_dust(candidates.clone(), &excluded, max_fee);

            assert_eq!(result.accepted.len() + result.rejected.len(), candidates.len());
            for candidate in candidates.iter() {
                let in_accepted = result.accepted.contains(candidate);
                let in_rejected = result.rejected.contains(candidate);
                assert!(in_accepted != in_rejected, "{candidate:?}");
                if candidate.address == "D" {
                    assert!(in_rejected);
                }
            }
            assert!(result.fee <= max_fee);
            assert!(result.size_bytes <= policy.max_standard_tx_size);
            assert_eq!(
                result.size_bytes,
                44 + 180 * result.accepted.len() as u64
            );
            let total: Decimal = result.accepted.iter().map(|o| o.amount).sum();
            assert_eq!(result.total_amount, total);
        }
    }
}
