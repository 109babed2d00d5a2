use crate::error::{DustError, SubmissionStage};
use crate::payout::build_payout_plan;
use crate::rpc::WalletRpc;
use crate::selection::{DustSelector, SelectionResult};
use rust_decimal::Decimal;
use std::collections::HashSet;

/// What to collect and where to send it.
#[derive(Debug, Clone)]
pub struct CleanRequest {
    pub pay_to: String,
    pub max_fee: Decimal,
    /// Addresses whose outputs are left alone. `pay_to` is always added.
    pub ignore: Vec<String>,
    /// Without it the run only reports what it would collect.
    pub commit: bool,
}

impl CleanRequest {
    pub fn excluded_addresses(&self) -> HashSet<String> {
        self.ignore
            .iter()
            .cloned()
            .chain(std::iter::once(self.pay_to.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanOutcome {
    DryRun,
    NothingToCollect,
    Broadcast { txid: String },
}

#[derive(Debug)]
pub struct CleanReport {
    pub selection: SelectionResult,
    pub outcome: CleanOutcome,
}

pub struct DustCleaner<W> {
    wallet: W,
    selector: DustSelector,
    coin_name: String,
}

impl<W: WalletRpc> DustCleaner<W> {
    pub fn new(wallet: W, selector: DustSelector, coin_name: impl Into<String>) -> Self {
        Self {
            wallet,
            selector,
            coin_name: coin_name.into(),
        }
    }

    /// Fetches the unspent outputs and selects the dust to collect.
    pub async fn select(&self, request: &CleanRequest) -> Result<SelectionResult, DustError> {
        let candidates = self
            .wallet
            .list_unspent()
            .await
            .map_err(|err| DustError::Connectivity(format!("{err:#}")))?;
        tracing::info!("Wallet reported {} unspent outputs", candidates.len());

        let selection =
            self.selector
                .select(candidates, &request.excluded_addresses(), request.max_fee);
        tracing::info!(
            "Selected {} outputs, rejected {}, size: {} bytes",
            selection.accepted.len(),
            selection.rejected.len(),
            selection.size_bytes
        );
        Ok(selection)
    }

    pub async fn run(&self, request: &CleanRequest) -> Result<CleanReport, DustError> {
        let selection = self.select(request).await?;
        let outcome = self.collect(request, &selection).await?;
        Ok(CleanReport { selection, outcome })
    }

    /// Submits the selection when the request commits to it.
    pub async fn collect(
        &self,
        request: &CleanRequest,
        selection: &SelectionResult,
    ) -> Result<CleanOutcome, DustError> {
        if !request.commit {
            return Ok(CleanOutcome::DryRun);
        }
        if selection.is_empty() {
            tracing::info!("No dust to collect, nothing submitted");
            return Ok(CleanOutcome::NothingToCollect);
        }
        let txid = self.submit(request, selection).await?;
        Ok(CleanOutcome::Broadcast { txid })
    }

    async fn submit(
        &self,
        request: &CleanRequest,
        selection: &SelectionResult,
    ) -> Result<String, DustError> {
        tracing::info!("Preparing transaction");
        let is_valid = self
            .wallet
            .validate_address(&request.pay_to)
            .await
            .map_err(|err| DustError::submission(SubmissionStage::Validate, err))?;
        if !is_valid {
            return Err(DustError::InvalidAddress {
                coin: self.coin_name.clone(),
                address: request.pay_to.clone(),
            });
        }

        let plan = build_payout_plan(
            &selection.accepted,
            &request.pay_to,
            selection.total_amount,
            selection.fee,
        );
        plan.ensure_positive(selection.total_amount, selection.fee)?;

        let raw_tx = self
            .wallet
            .create_raw_transaction(&plan)
            .await
            .map_err(|err| DustError::submission(SubmissionStage::Create, err))?;

        let signed = self
            .wallet
            .sign_raw_transaction(&raw_tx)
            .await
            .map_err(|err| DustError::submission(SubmissionStage::Sign, err))?;
        if !signed.complete {
            return Err(DustError::Submission {
                stage: SubmissionStage::Sign,
                message: "the wallet could not sign every input".to_string(),
            });
        }

        let txid = self
            .wallet
            .send_raw_transaction(&signed.hex)
            .await
            .map_err(|err| DustError::submission(SubmissionStage::Broadcast, err))?;
        tracing::info!("Broadcast transaction {}", txid);
        Ok(txid)
    }
}
