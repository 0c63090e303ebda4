use super::{truncate, MAX_ERROR_BODY};
use crate::error::{ForgeError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;

/// Fetches generated image bytes, either over HTTP or from an inline `data:` URL.
#[derive(Clone)]
pub struct AssetClient {
    http: Client,
}

impl AssetClient {
    pub fn new(http: Client) -> Self {
        Self { http }
    }

    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        if url.starts_with("data:") {
            return decode_data_url(url);
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ForgeError::Response(format!(
                "Unsupported image URL scheme: {}",
                url
            )));
        }

        log::debug!("Downloading image from {}", url);
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("Image download returned {}: {}", status, truncate(&body, MAX_ERROR_BODY));
            return Err(ForgeError::Service {
                status: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

fn decode_data_url(url: &str) -> Result<Vec<u8>> {
    let (header, payload) = url
        .split_once(',')
        .ok_or_else(|| ForgeError::Response("Malformed data URL".into()))?;
    if !header.ends_with(";base64") {
        return Err(ForgeError::Response(
            "Only base64 data URLs are supported".into(),
        ));
    }
    STANDARD
        .decode(payload.trim())
        .map_err(|e| ForgeError::Response(e.to_string()))
}
