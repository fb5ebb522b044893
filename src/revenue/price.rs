use anyhow::{Context, Result};
use serde::Deserialize;

// Market data is an external collaborator: the core scan never touches it,
// the fetched spot price only feeds the derived display columns.
const PRICE_URL: &str =
    "https://api.coingecko.com/api/v3/simple/price?ids=cosmos&vs_currencies=usd";

#[derive(Deserialize)]
struct PriceResponse {
    cosmos: UsdQuote,
}

#[derive(Deserialize)]
struct UsdQuote {
    usd: f64,
}

pub async fn fetch_atom_price_usd() -> Result<f64> {
    reqwest::get(PRICE_URL)
        .await?
        .error_for_status()?
        .json::<PriceResponse>()
        .await
        .map(|res| res.cosmos.usd)
        .context("malformed price feed response")
}
