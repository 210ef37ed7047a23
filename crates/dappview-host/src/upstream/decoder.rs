//! Calldata decoding for the send-transaction modal

use alloy_primitives::Bytes;
use async_trait::async_trait;
use dappview_core::models::DecodedTransaction;
use serde_json::json;
use std::time::Duration;

use crate::wallet::{Result, TxDecoder, UpstreamError};

/// Posts `{"data": "0x..."}` to a decoding service and expects a
/// [`DecodedTransaction`] back.
pub struct HttpTxDecoder {
    client: reqwest::Client,
    url: String,
}

impl HttpTxDecoder {
    pub fn new(url: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl TxDecoder for HttpTxDecoder {
    async fn decode(&self, calldata: &Bytes) -> Result<DecodedTransaction> {
        let res = self
            .client
            .post(&self.url)
            .json(&json!({ "data": calldata }))
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(UpstreamError::Http(format!(
                "decoder returned {}",
                res.status()
            )));
        }

        res.json()
            .await
            .map_err(|e| UpstreamError::InvalidResponse(e.to_string()))
    }
}

/// Used when no decoding service is configured; the modal shows raw calldata.
pub struct NoopDecoder;

#[async_trait]
impl TxDecoder for NoopDecoder {
    async fn decode(&self, _calldata: &Bytes) -> Result<DecodedTransaction> {
        Err(UpstreamError::InvalidResponse(
            "No decoder configured".to_string(),
        ))
    }
}
