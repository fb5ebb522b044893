use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::endpoints::EndpointPool;
use super::env::APP_CONFIG;

/// Message type urls under this namespace mark a transaction as cross-chain.
const IBC_MSG_PREFIX: &str = "/ibc.";

/// Fees are only counted in the base denomination.
const FEE_DENOM: &str = "uatom";

/// Enriched view of one transaction: total fee in uatom and the ordered
/// message type urls carried by the tx body.
#[derive(Debug, Clone)]
pub struct TxDetail {
    pub fee_uatom: u64,
    pub msg_types: Vec<String>,
}

impl TxDetail {
    /// A tx counts as cross-chain once, no matter how many of its messages
    /// live under the IBC namespace.
    pub fn is_cross_chain(&self) -> bool {
        self.msg_types.iter().any(|t| t.starts_with(IBC_MSG_PREFIX))
    }
}

#[async_trait]
pub trait TxDetailSource {
    async fn tx_detail(&self, hash: &str) -> Result<TxDetail>;
}

#[derive(Deserialize)]
struct TxByHashResponse {
    tx: TxEnvelope,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct TxEnvelope {
    auth_info: AuthInfo,
    body: TxBody,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct AuthInfo {
    fee: Fee,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct Fee {
    amount: Vec<FeeCoin>,
}

#[derive(Deserialize)]
struct FeeCoin {
    denom: String,
    amount: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct TxBody {
    messages: Vec<MsgEntry>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct MsgEntry {
    #[serde(rename = "@type")]
    type_url: String,
}

fn into_detail(response: TxByHashResponse) -> Result<TxDetail> {
    let mut fee_uatom = 0u64;
    for coin in &response.tx.auth_info.fee.amount {
        if coin.denom == FEE_DENOM {
            fee_uatom += coin
                .amount
                .parse::<u64>()
                .with_context(|| format!("non-numeric fee amount: {:?}", coin.amount))?;
        }
    }

    Ok(TxDetail {
        fee_uatom,
        msg_types: response
            .tx
            .body
            .messages
            .into_iter()
            .map(|m| m.type_url)
            .collect(),
    })
}

pub struct CosmosLcd {
    pool: EndpointPool,
}

impl CosmosLcd {
    pub fn new() -> Self {
        Self {
            pool: EndpointPool::new(
                APP_CONFIG.lcd_urls.clone(),
                Duration::from_secs(APP_CONFIG.request_timeout_secs),
                APP_CONFIG.max_retries,
                Duration::from_millis(APP_CONFIG.backoff_base_ms),
            ),
        }
    }
}

#[async_trait]
impl TxDetailSource for CosmosLcd {
    async fn tx_detail(&self, hash: &str) -> Result<TxDetail> {
        let path = format!("/cosmos/tx/v1beta1/txs/{}", hash);
        let (response, _): (TxByHashResponse, _) = self.pool.get_json(&path).await?;
        into_detail(response)
    }
}

#[cfg(test)]
mod tests {
    use super::{into_detail, TxByHashResponse, TxDetail};

    fn detail_from(body: &str) -> TxDetail {
        let response: TxByHashResponse = serde_json::from_str(body).unwrap();
        into_detail(response).unwrap()
    }

    #[test]
    fn it_sums_only_base_denomination_fees() {
        let detail = detail_from(
            r#"{"tx":{
                "auth_info":{"fee":{"amount":[
                    {"denom":"uatom","amount":"500"},
                    {"denom":"ibc/27394FB092D2ECCD56123C74F36E4C1F","amount":"999"},
                    {"denom":"uatom","amount":"300"}
                ]}},
                "body":{"messages":[{"@type":"/cosmos.bank.v1beta1.MsgSend"}]}
            }}"#,
        );

        assert_eq!(detail.fee_uatom, 800);
        assert!(!detail.is_cross_chain());
    }

    #[test]
    fn it_classifies_ibc_transactions_from_any_message() {
        let detail = detail_from(
            r#"{"tx":{
                "auth_info":{"fee":{"amount":[{"denom":"uatom","amount":"120"}]}},
                "body":{"messages":[
                    {"@type":"/cosmos.bank.v1beta1.MsgSend"},
                    {"@type":"/ibc.core.client.v1.MsgUpdateClient"},
                    {"@type":"/ibc.applications.transfer.v1.MsgTransfer"}
                ]}
            }}"#,
        );

        assert!(detail.is_cross_chain());
        assert_eq!(detail.msg_types.len(), 3);
    }

    #[test]
    fn it_defaults_missing_fee_sections_to_zero() {
        let detail = detail_from(r#"{"tx":{"body":{"messages":[]}}}"#);

        assert_eq!(detail.fee_uatom, 0);
        assert!(!detail.is_cross_chain());
    }

    #[test]
    fn it_fails_loudly_on_non_numeric_amounts() {
        let response: TxByHashResponse = serde_json::from_str(
            r#"{"tx":{"auth_info":{"fee":{"amount":[{"denom":"uatom","amount":"lots"}]}},"body":{}}}"#,
        )
        .unwrap();

        assert!(super::into_detail(response).is_err());
    }
}
