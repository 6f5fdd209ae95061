/// Outbound HTTP client the coordinator uses to push shards to, and pull
/// shards back from, individual renters. Mirrors the reference coordinator's
/// `distribute_shards_to_renters` / reconstruction loop, but as a typed
/// client instead of inline `requests` calls.
use log::{debug, warn};
use std::time::Duration;

pub struct RenterClient {
    http: reqwest::Client,
}

impl RenterClient {
    pub fn new(timeout_secs: u64) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("valid reqwest client configuration");
        Self { http }
    }

    /// Uploads one shard's bytes to a renter via multipart, as
    /// `store-shard/` expects.
    pub async fn store_shard(
        &self,
        renter_url: &str,
        filename: &str,
        data: Vec<u8>,
    ) -> Result<(), reqwest::Error> {
        let part = reqwest::multipart::Part::bytes(data).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        self.http
            .post(format!("{}/store-shard/", renter_url.trim_end_matches('/')))
            .multipart(form)
            .send()
            .await?
            .error_for_status()?;
        debug!("Stored shard {} on {}", filename, renter_url);
        Ok(())
    }

    /// Fetches one shard's bytes from a renter. Returns `Ok(None)` on a 404
    /// (shard absent on this particular renter) or on an empty 200 body
    /// (treated the same as absent); either way the caller should try the
    /// next replica.
    pub async fn retrieve_shard(
        &self,
        renter_url: &str,
        filename: &str,
    ) -> Result<Option<Vec<u8>>, reqwest::Error> {
        let response = self
            .http
            .get(format!(
                "{}/retrieve-shard/?filename={}",
                renter_url.trim_end_matches('/'),
                urlencoding_escape(filename)
            ))
            .send()
            .await?;

        if response.status().as_u16() == 404 {
            return Ok(None);
        }
        let response = response.error_for_status()?;
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(bytes.to_vec()))
    }

    /// Best-effort shard deletion; callers log and continue past failures
    /// rather than aborting the whole file delete.
    pub async fn delete_shard(&self, renter_url: &str, filename: &str) -> bool {
        match self
            .http
            .post(format!(
                "{}/delete-shard/?filename={}",
                renter_url.trim_end_matches('/'),
                urlencoding_escape(filename)
            ))
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                warn!(
                    "Unexpected status deleting shard {} from {}: {}",
                    filename,
                    renter_url,
                    resp.status()
                );
                false
            }
            Err(e) => {
                warn!("Failed to delete shard {} from {}: {}", filename, renter_url, e);
                false
            }
        }
    }
}

fn urlencoding_escape(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{:02X}", b),
        })
        .collect()
}
