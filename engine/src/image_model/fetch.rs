use std::pin::Pin;

use bytes::Bytes;
use color_eyre::Result;
use log::debug;
use reqwest::Client;

use super::ImageFetcher;
use crate::PipelineError;

/// Downloads generated images with a plain GET.
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: Client,
}

impl HttpImageFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl ImageFetcher for HttpImageFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> Pin<Box<dyn Future<Output = Result<Bytes>> + Send + 'a>> {
        Box::pin(async move {
            let fetch_error = |status: Option<u16>, reason: String| PipelineError::ResourceFetch {
                url: url.to_string(),
                status,
                reason,
            };

            let resp = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| fetch_error(None, e.to_string()))?;

            let status = resp.status();
            if !status.is_success() {
                return Err(fetch_error(Some(status.as_u16()), status.to_string()).into());
            }

            let bytes = resp
                .bytes()
                .await
                .map_err(|e| fetch_error(Some(status.as_u16()), e.to_string()))?;
            debug!("Fetched {} bytes from {url}", bytes.len());
            Ok(bytes)
        })
    }
}
