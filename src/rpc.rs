use crate::config::RpcEndpoint;
use crate::payout::PayoutPlan;
use crate::unspent::UnspentOutput;
use anyhow::{anyhow, bail, Context};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{header, Client};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Wallet calls a cleaning run depends on.
#[allow(async_fn_in_trait)]
pub trait WalletRpc {
    async fn list_unspent(&self) -> anyhow::Result<Vec<UnspentOutput>>;

    async fn validate_address(&self, address: &str) -> anyhow::Result<bool>;

    /// Returns the hex of the unsigned transaction.
    async fn create_raw_transaction(&self, plan: &PayoutPlan) -> anyhow::Result<String>;

    async fn sign_raw_transaction(&self, raw_tx: &str) -> anyhow::Result<SignedTransaction>;

    /// Returns the id of the broadcast transaction.
    async fn send_raw_transaction(&self, signed_tx: &str) -> anyhow::Result<String>;
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SignedTransaction {
    pub hex: String,
    pub complete: bool,
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    method: &'a str,
    params: serde_json::Value,
    jsonrpc: &'static str,
    id: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

impl<T> RpcResponse<T> {
    fn into_result(self, method: &str) -> anyhow::Result<T> {
        if let Some(error) = self.error {
            bail!(
                "`{method}` failed with code {}: {}",
                error.code,
                error.message
            );
        }
        self.result
            .ok_or_else(|| anyhow!("`{method}` returned no result"))
    }
}

#[derive(Debug, Deserialize)]
struct AddressValidation {
    isvalid: bool,
}

/// JSON-RPC client of the coin daemon.
pub struct RpcClient {
    client: Client,
    endpoint: RpcEndpoint,
}

impl RpcClient {
    pub fn new(endpoint: RpcEndpoint) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.append(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP Client")?;

        Ok(Self { client, endpoint })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> anyhow::Result<T> {
        tracing::debug!("calling `{}` on {}", method, self.endpoint.url());
        let request = RpcRequest {
            method,
            params,
            jsonrpc: "2.0",
            id: 0,
        };
        let response = self
            .client
            .post(self.endpoint.url())
            .basic_auth(&self.endpoint.user, Some(&self.endpoint.password))
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Failed to reach the wallet at {}", self.endpoint.url()))?;

        // the daemon answers RPC errors with a non-200 status and an error body
        let status = response.status();
        let response: RpcResponse<T> = response
            .json()
            .await
            .with_context(|| format!("Unexpected `{method}` response, status: {status}"))?;
        response.into_result(method)
    }
}

impl WalletRpc for RpcClient {
    async fn list_unspent(&self) -> anyhow::Result<Vec<UnspentOutput>> {
        self.call("listunspent", json!([])).await
    }

    async fn validate_address(&self, address: &str) -> anyhow::Result<bool> {
        let validation: AddressValidation = self.call("validateaddress", json!([address])).await?;
        Ok(validation.isvalid)
    }

    async fn create_raw_transaction(&self, plan: &PayoutPlan) -> anyhow::Result<String> {
        self.call("createrawtransaction", payout_params(plan)?).await
    }

    async fn sign_raw_transaction(&self, raw_tx: &str) -> anyhow::Result<SignedTransaction> {
        self.call("signrawtransaction", json!([raw_tx])).await
    }

    async fn send_raw_transaction(&self, signed_tx: &str) -> anyhow::Result<String> {
        self.call("sendrawtransaction", json!([signed_tx])).await
    }
}

/// `createrawtransaction` params: the inputs array and the address to amount object.
fn payout_params(plan: &PayoutPlan) -> anyhow::Result<serde_json::Value> {
    let mut outputs = serde_json::Map::new();
    for (address, amount) in plan.outputs.iter() {
        outputs.insert(address.clone(), amount_to_json(*amount)?);
    }
    Ok(json!([plan.inputs, outputs]))
}

/// Wallets take amounts as JSON numbers with at most 8 decimals.
fn amount_to_json(amount: Decimal) -> anyhow::Result<serde_json::Value> {
    let amount = amount.round_dp(8);
    amount
        .to_f64()
        .and_then(serde_json::Number::from_f64)
        .map(serde_json::Value::Number)
        .ok_or_else(|| anyhow!("amount {amount} can't be sent as a JSON number"))
}

#[cfg(test)]
mod tests {
    use crate::payout::build_payout_plan;
    use crate::rpc::{amount_to_json, payout_params, RpcResponse, SignedTransaction};
    use crate::unspent::UnspentOutput;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn result_is_returned() {
        let response: RpcResponse<Vec<UnspentOutput>> = serde_json::from_str(
            r#"{"result": [{"txid": "aa", "vout": 2, "address": "X", "amount": 0.5, "confirmations": 3}], "error": null, "id": 0}"#,
        )
        .unwrap();
        let outputs = response.into_result("listunspent").unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].amount, dec!(0.5));
        assert_eq!(outputs[0].vout, 2);
    }

    #[test]
    fn error_object_fails() {
        let response: RpcResponse<String> = serde_json::from_str(
            r#"{"result": null, "error": {"code": -26, "message": "insufficient priority"}, "id": 0}"#,
        )
        .unwrap();
        let err = response.into_result("sendrawtransaction").unwrap_err();
        assert_eq!(
            err.to_string(),
            "`sendrawtransaction` failed with code -26: insufficient priority"
        );
    }

    #[test]
    fn missing_result_fails() {
        let response: RpcResponse<String> = serde_json::from_str(r#"{"id": 0}"#).unwrap();
        assert!(response.into_result("createrawtransaction").is_err());
    }

    #[test]
    fn signed_transaction_shape() {
        let response: RpcResponse<SignedTransaction> = serde_json::from_str(
            r#"{"result": {"hex": "0100", "complete": false}, "error": null, "id": 0}"#,
        )
        .unwrap();
        let signed = response.into_result("signrawtransaction").unwrap();
        assert_eq!(signed.hex, "0100");
        assert!(!signed.complete);
    }

    #[test]
    fn amounts_are_numbers() {
        assert_eq!(amount_to_json(dec!(4)).unwrap(), json!(4.0));
        assert_eq!(amount_to_json(dec!(0.12345678)).unwrap(), json!(0.12345678));
    }

    #[test]
    fn create_params() {
        let accepted = vec![
            UnspentOutput::new("a", 0, "dust", dec!(1.5), 10),
            UnspentOutput::new("b", 3, "dust", dec!(1), 10),
        ];
        let plan = build_payout_plan(&accepted, "X", dec!(2.5), dec!(0.0001));
        assert_eq!(
            payout_params(&plan).unwrap(),
            json!([
                [{"txid": "b", "vout": 3}, {"txid": "a", "vout": 0}],
                {"X": 2.4999}
            ])
        );
    }
}
