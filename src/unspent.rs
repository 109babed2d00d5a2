use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use std::collections::HashSet;

/// Reference to a previous transaction output, in the shape `createrawtransaction` expects.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputRef {
    pub txid: String,
    pub vout: u32,
}

/// One entry of the wallet's `listunspent` answer.
///
/// Only the fields the cleaner needs are kept, everything else the wallet
/// reports (scriptPubKey, account, spendable...) is ignored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnspentOutput {
    pub txid: String,
    pub vout: u32,
    // outputs paying to non-standard scripts come without an address
    #[serde(default)]
    pub address: String,
    pub amount: Decimal,
    pub confirmations: u64,
}

impl UnspentOutput {
    pub fn new(
        txid: impl Into<String>,
        vout: u32,
        address: impl Into<String>,
        amount: Decimal,
        confirmations: u64,
    ) -> Self {
        Self {
            txid: txid.into(),
            vout,
            address: address.into(),
            amount,
            confirmations,
        }
    }

    /// `amount * confirmations`, the coin-age score used for free-transaction eligibility.
    pub fn priority(&self) -> Decimal {
        self.amount * Decimal::from(self.confirmations)
    }

    pub fn output_ref(&self) -> OutputRef {
        OutputRef {
            txid: self.txid.clone(),
            vout: self.vout,
        }
    }

    pub fn is_excluded(&self, excluded_addresses: &HashSet<String>) -> bool {
        excluded_addresses.contains(&self.address)
    }
}

#[cfg(test)]
mod tests {
    use crate::unspent::UnspentOutput;
    use rust_decimal_macros::dec;
    use std::collections::HashSet;

    #[test]
    fn parse_listunspent_entry() {
        let entry = r#"{
            "txid": "6f1b0c3a9d",
            "vout": 1,
            "address": "MNqv1Cq4qmhvZeX2kL9yZ3vJ2hW7kH8gGq",
            "account": "",
            "scriptPubKey": "76a914",
            "amount": 0.00012345,
            "confirmations": 1204,
            "spendable": true
        }"#;
        let output: UnspentOutput = serde_json::from_str(entry).unwrap();
        assert_eq!(output.amount, dec!(0.00012345));
        assert_eq!(output.confirmations, 1204);
        assert_eq!(output.vout, 1);
        assert_eq!(output.priority(), dec!(0.14863380));
    }

    #[test]
    fn missing_address_is_empty() {
        let entry = r#"{"txid": "aa", "vout": 0, "amount": 1, "confirmations": 0}"#;
        let output: UnspentOutput = serde_json::from_str(entry).unwrap();
        assert!(output.address.is_empty());
        assert_eq!(output.priority(), dec!(0));
    }

    #[test]
    fn exclusion_by_address() {
        let output = UnspentOutput::new("aa", 0, "X", dec!(1), 1);
        let mut excluded = HashSet::new();
        assert!(!output.is_excluded(&excluded));
        excluded.insert("X".to_string());
        assert!(output.is_excluded(&excluded));
    }
}
