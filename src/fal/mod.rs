pub mod asset_client;
pub mod queue_client;

#[cfg(test)]
mod fake_server;

use crate::{
    config::FalConfig,
    error::Result,
    models::{GenerationOutput, GenerationParameters, ProgressUpdate},
};
use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::mpsc::UnboundedSender;

pub use asset_client::AssetClient;
pub use queue_client::QueueClient;

/// Error bodies longer than this are cut before they are logged or returned.
pub(crate) const MAX_ERROR_BODY: usize = 512;

/// The remote image generator as seen by the session controller.
#[async_trait]
pub trait ImageService: Send + Sync {
    /// Runs one generation to completion. Progress notifications go to
    /// `progress`; the sender is dropped when the call returns.
    async fn generate(
        &self,
        params: &GenerationParameters,
        progress: UnboundedSender<ProgressUpdate>,
    ) -> Result<GenerationOutput>;

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>>;
}

#[derive(Clone)]
pub struct FalClient {
    queue_client: QueueClient,
    asset_client: AssetClient,
}

impl FalClient {
    pub fn new(config: FalConfig) -> Result<Self> {
        let http = Client::builder().build()?;
        Ok(Self {
            queue_client: QueueClient::new(http.clone(), &config)?,
            asset_client: AssetClient::new(http),
        })
    }

    pub fn queue(&self) -> &QueueClient {
        &self.queue_client
    }
}

#[async_trait]
impl ImageService for FalClient {
    async fn generate(
        &self,
        params: &GenerationParameters,
        progress: UnboundedSender<ProgressUpdate>,
    ) -> Result<GenerationOutput> {
        self.queue_client.generate(params, progress).await
    }

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>> {
        self.asset_client.fetch(url).await
    }
}

pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars).collect();
    cut.push_str("...");
    cut
}
