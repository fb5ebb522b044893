use lazy_static::lazy_static;
use reqwest::Url;
use serde::Deserialize;

use crate::env::{deserialize_urls, get_app_config};

fn default_rpc_urls() -> Vec<Url> {
    [
        "https://cosmos-rpc.polkachu.com:443",
        "https://rpc.cosmoshub.strange.love:443",
        "https://rpc-cosmoshub.blockapsis.com:443",
        "https://rpc.cosmos.network",
    ]
    .iter()
    .map(|s| Url::parse(s).expect("static rpc url"))
    .collect()
}

fn default_lcd_urls() -> Vec<Url> {
    [
        "https://cosmos-api.polkachu.com",
        "https://cosmoshub-lcd.publicnode.com",
        "https://api.cosmos.network",
    ]
    .iter()
    .map(|s| Url::parse(s).expect("static lcd url"))
    .collect()
}

fn default_state_file() -> String {
    "scan_state.json".to_string()
}

fn default_table_file() -> String {
    "hub_revenue_daily.csv".to_string()
}

// tx-by-hash means one LCD call per transaction, so keep batches small
fn default_block_batch() -> u64 {
    60
}

fn default_request_timeout_secs() -> u64 {
    25
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    800
}

fn default_block_delay_ms() -> u64 {
    50
}

fn default_tx_delay_ms() -> u64 {
    20
}

#[derive(Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_rpc_urls", deserialize_with = "deserialize_urls")]
    pub rpc_urls: Vec<Url>,
    #[serde(default = "default_lcd_urls", deserialize_with = "deserialize_urls")]
    pub lcd_urls: Vec<Url>,
    #[serde(default = "default_state_file")]
    pub state_file: String,
    #[serde(default = "default_table_file")]
    pub table_file: String,
    #[serde(default = "default_block_batch")]
    pub block_batch: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_block_delay_ms")]
    pub block_delay_ms: u64,
    #[serde(default = "default_tx_delay_ms")]
    pub tx_delay_ms: u64,
}

lazy_static! {
    pub static ref APP_CONFIG: AppConfig = get_app_config();
}
