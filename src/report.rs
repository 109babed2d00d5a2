use crate::selection::SelectionResult;
use crate::unspent::UnspentOutput;
use anyhow::Context;
use rust_decimal::Decimal;
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Summary printed to the user after a selection.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionReport {
    pub coin_code: String,
    pub accepted: usize,
    pub rejected: usize,
    pub fee: Decimal,
    pub total_amount: Decimal,
    pub size_bytes: u64,
}

impl SelectionReport {
    pub fn new(selection: &SelectionResult, coin_code: impl Into<String>) -> Self {
        Self {
            coin_code: coin_code.into(),
            accepted: selection.accepted.len(),
            rejected: selection.rejected.len(),
            fee: selection.fee,
            total_amount: selection.total_amount,
            size_bytes: selection.size_bytes,
        }
    }

    pub fn to_collect(&self) -> Decimal {
        self.total_amount - self.fee
    }
}

impl fmt::Display for SelectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dust cleaning:")?;
        writeln!(f, "- Number of transactions: {}", self.accepted)?;
        writeln!(f, "- Left out: {}", self.rejected)?;
        writeln!(f, "- Transaction size: {} bytes", self.size_bytes)?;
        writeln!(f, "- Transaction fee: {} {}", self.fee, self.coin_code)?;
        write!(
            f,
            "- Dust to collect: {} {}",
            self.to_collect(),
            self.coin_code
        )
    }
}

/// Writes every output of the selection, accepted ones first, as CSV.
pub fn dump_csv(selection: &SelectionResult, path: &Path) -> anyhow::Result<()> {
    let mut file = File::create(path)
        .with_context(|| format!("Cannot create report file {path}", path = path.display()))?;
    file.write_all(csv(selection).as_bytes())?;
    Ok(())
}

fn csv(selection: &SelectionResult) -> String {
    let mut out = String::from("status,address,txid,vout,amount,confirmations,priority\n");
    let rows = selection
        .accepted
        .iter()
        .map(|output| ("accepted", output))
        .chain(selection.rejected.iter().map(|output| ("rejected", output)));
    for (status, output) in rows {
        out.push_str(&csv_row(status, output));
    }
    out
}

fn csv_row(status: &str, output: &UnspentOutput) -> String {
    format!(
        "{},{},{},{},{},{},{}\n",
        status,
        output.address,
        output.txid,
        output.vout,
        output.amount,
        output.confirmations,
        output.priority()
    )
}
