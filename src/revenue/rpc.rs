use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::endpoints::EndpointPool;
use super::env::APP_CONFIG;

/// One block as served by the Tendermint RPC: the header timestamp (raw, the
/// fractional-second precision is endpoint dependent) and the raw transaction
/// payloads in block order.
#[derive(Debug, Clone)]
pub struct BlockData {
    pub time: String,
    pub txs_base64: Vec<String>,
}

#[async_trait]
pub trait BlockSource {
    async fn latest_height(&self) -> Result<u64>;
    async fn block(&self, height: u64) -> Result<BlockData>;
}

#[derive(Deserialize)]
struct StatusResponse {
    result: StatusResult,
}

#[derive(Deserialize)]
struct StatusResult {
    sync_info: SyncInfo,
}

#[derive(Deserialize)]
struct SyncInfo {
    latest_block_height: String,
}

#[derive(Deserialize)]
struct BlockResponse {
    result: BlockResult,
}

#[derive(Deserialize)]
struct BlockResult {
    block: BlockEnvelope,
}

#[derive(Deserialize)]
struct BlockEnvelope {
    header: BlockHeader,
    data: BlockPayloads,
}

#[derive(Deserialize)]
struct BlockHeader {
    time: String,
}

#[derive(Deserialize)]
struct BlockPayloads {
    // empty blocks come back with "txs": null or no txs key at all
    #[serde(default)]
    txs: Option<Vec<String>>,
}

pub struct TendermintRpc {
    pool: EndpointPool,
}

impl TendermintRpc {
    pub fn new() -> Self {
        Self {
            pool: EndpointPool::new(
                APP_CONFIG.rpc_urls.clone(),
                Duration::from_secs(APP_CONFIG.request_timeout_secs),
                APP_CONFIG.max_retries,
                Duration::from_millis(APP_CONFIG.backoff_base_ms),
            ),
        }
    }
}

#[async_trait]
impl BlockSource for TendermintRpc {
    async fn latest_height(&self) -> Result<u64> {
        let (status, endpoint): (StatusResponse, _) = self.pool.get_json("/status").await?;
        let height = status
            .result
            .sync_info
            .latest_block_height
            .parse()
            .context("malformed latest_block_height in status response")?;
        debug!(%endpoint, height, "fetched chain status");
        Ok(height)
    }

    async fn block(&self, height: u64) -> Result<BlockData> {
        let path = format!("/block?height={}", height);
        let (block, _): (BlockResponse, _) = self.pool.get_json(&path).await?;
        let envelope = block.result.block;
        Ok(BlockData {
            time: envelope.header.time,
            txs_base64: envelope.data.txs.unwrap_or_default(),
        })
    }
}
