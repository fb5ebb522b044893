use std::time::Duration;

use anyhow::{anyhow, Result};
use itertools::Itertools;
use reqwest::Url;
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tracing::{debug, warn};

/*
  Public RPC and LCD endpoints fail, rate-limit and desync all the time, so
  every query walks an ordered list of equivalent bases: bounded retries with
  linearly growing backoff per endpoint, then fall through to the next one.
  No endpoint health is remembered across calls. A marked-bad endpoint that
  has recovered would otherwise stay excluded, and a fresh walk per call is
  cheap at our request rates.
*/
pub struct EndpointPool {
    endpoints: Vec<Url>,
    client: reqwest::Client,
    timeout: Duration,
    max_retries: u32,
    backoff_base: Duration,
}

impl EndpointPool {
    pub fn new(
        endpoints: Vec<Url>,
        timeout: Duration,
        max_retries: u32,
        backoff_base: Duration,
    ) -> Self {
        if endpoints.is_empty() {
            panic!("tried to instantiate EndpointPool without at least one url");
        }
        Self {
            endpoints,
            client: reqwest::Client::new(),
            timeout,
            max_retries,
            backoff_base,
        }
    }

    /// Try every endpoint in order, with per-endpoint retries. Returns the
    /// decoded body and the endpoint that served it, or an error naming every
    /// endpoint with its last failure.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<(T, Url)> {
        let mut failures: Vec<(Url, anyhow::Error)> = vec![];

        for base in &self.endpoints {
            let url = format!("{}{}", base, path.trim_start_matches('/'));
            match self.get_with_retries(&url).await {
                Ok(body) => return Ok((body, base.clone())),
                Err(err) => {
                    warn!(endpoint = %base, %err, "endpoint exhausted, falling back");
                    failures.push((base.clone(), err));
                }
            }
        }

        Err(anyhow!(
            "all endpoints failed for {}:\n{}",
            path,
            failures
                .iter()
                .map(|(base, err)| format!("- {}: {}", base, err))
                .join("\n")
        ))
    }

    async fn get_with_retries<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let attempts = self.max_retries.max(1);
        let mut last_err = anyhow!("no attempt made");

        for attempt in 1..=attempts {
            match self.get_once(url).await {
                Ok(body) => return Ok(body),
                Err(err) => {
                    debug!(url, attempt, %err, "request failed");
                    last_err = err;
                    if attempt < attempts {
                        sleep(self.backoff_base * attempt).await;
                    }
                }
            }
        }

        Err(last_err)
    }

    async fn get_once<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .json::<T>()
            .await
            .map_err(Into::into)
    }
}
