//! Client for the off-chain content pinning service and helpers for moving
//! between the two encodings of a content identifier: the base58 CIDv0
//! string and the raw 32-byte sha2-256 digest used on-chain.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde::Serialize;
use std::time::Duration;

// CIDv0 multihash prefix: sha2-256, 32-byte digest.
const CIDV0_PREFIX: [u8; 2] = [0x12, 0x20];

#[derive(Debug, Clone)]
pub struct IpfsClient {
    base_url: String,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: String,
}

impl IpfsClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed building the pin service http client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Pin a JSON document and return the base58 content identifier the
    /// service reports back.
    pub async fn pin_json<T: Serialize>(&self, value: &T) -> Result<String> {
        let body = serde_json::to_vec(value).context("failed serializing metadata")?;
        let part = reqwest::multipart::Part::bytes(body).file_name("metadata.json");
        let form = reqwest::multipart::Form::new().part("file", part);
        let url = format!("{}/api/v0/add", self.base_url);
        let resp = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("pin request to {url} failed"))?;
        let status = resp.status();
        if !status.is_success() {
            bail!("pin service returned HTTP status {status}");
        }
        let added: AddResponse = resp
            .json()
            .await
            .context("pin service returned an unexpected response body")?;
        Ok(added.hash)
    }
}

/// Decode a base58 CIDv0 string into the fixed-width 32-byte digest form.
pub fn deployment_id_bytes32(base58: &str) -> Result<[u8; 32]> {
    let raw = bs58::decode(base58)
        .into_vec()
        .with_context(|| format!("`{base58}` is not valid base58"))?;
    if raw.len() != 34 || raw[..2] != CIDV0_PREFIX {
        bail!("`{base58}` is not a CIDv0 sha2-256 content identifier");
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&raw[2..]);
    Ok(out)
}

/// Re-encode a 32-byte digest as its base58 CIDv0 string form.
pub fn bytes32_to_base58(digest: &[u8; 32]) -> String {
    let mut raw = Vec::with_capacity(34);
    raw.extend_from_slice(&CIDV0_PREFIX);
    raw.extend_from_slice(digest);
    bs58::encode(raw).into_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_builds_and_normalizes_base_url() {
        let client = IpfsClient::new("http://localhost:5001/").unwrap();
        assert_eq!(client.base_url, "http://localhost:5001");
    }

    #[test]
    fn cid_conversion_matches_known_vector() {
        let digest =
            deployment_id_bytes32("QmUD3uySqxGehHySzwj4LWbxjgxQMFNqWC5nVw1yKyZUvR").unwrap();
        assert_eq!(
            hex::encode(digest),
            "5733b66e5ea02ed774c7cc12f42d7ac678459bae6482dac3812a37918113c4a6"
        );
    }

    #[test]
    fn cid_conversion_round_trips() {
        let id = "QmY1iaXriReFxJxE86PzPGBVzHe2S1728N2JkkjnKsF9yM";
        let digest = deployment_id_bytes32(id).unwrap();
        assert_eq!(bytes32_to_base58(&digest), id);
    }

    #[test]
    fn rejects_non_cid_input() {
        assert!(deployment_id_bytes32("not-base58-0OIl").is_err());
        // Valid base58 but not a 34-byte CIDv0 payload.
        assert!(deployment_id_bytes32("3mJr7AoUXx2Wqd").is_err());
    }
}
