use rust_decimal::Decimal;

/// Failures that terminate a cleaning run.
///
/// The selector itself never fails; everything here comes from a collaborator
/// (wallet RPC, configuration) or from a selection that cannot be paid out.
#[derive(Debug, thiserror::Error)]
pub enum DustError {
    #[error("failed to retrieve the list of unspent outputs from the wallet: {0}")]
    Connectivity(String),
    #[error("invalid {coin} address: {address}")]
    InvalidAddress { coin: String, address: String },
    #[error("failed to {stage} the transaction: {message}")]
    Submission {
        stage: SubmissionStage,
        message: String,
    },
    #[error("fee {fee} is not covered by the collected amount {total}")]
    NegativePayout { total: Decimal, fee: Decimal },
    #[error("configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStage {
    Validate,
    Create,
    Sign,
    Broadcast,
}

impl std::fmt::Display for SubmissionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stage = match self {
            SubmissionStage::Validate => "validate the destination of",
            SubmissionStage::Create => "create",
            SubmissionStage::Sign => "sign",
            SubmissionStage::Broadcast => "broadcast",
        };
        f.write_str(stage)
    }
}

impl DustError {
    pub fn submission(stage: SubmissionStage, err: anyhow::Error) -> Self {
        DustError::Submission {
            stage,
            message: format!("{err:#}"),
        }
    }
}
