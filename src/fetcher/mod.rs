use async_trait::async_trait;
use encoding_rs::Encoding;
use reqwest::Client;
use reqwest::header::ACCEPT;
use tracing::{debug, warn};

use crate::error::{CatalogError, Result};
use crate::traits::{CatalogConfig, PageFetcher};

/// Fetches catalog pages over HTTP and decodes them from the site's legacy charset
pub struct HttpFetcher {
    client: Client,
    accept: String,
    encoding: &'static Encoding,
}

impl HttpFetcher {
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let encoding = Encoding::for_label(config.charset.as_bytes())
            .ok_or_else(|| CatalogError::UnknownCharset(config.charset.clone()))?;
        let client = Client::builder().user_agent(&config.user_agent).build()?;

        Ok(Self {
            client,
            accept: config.accept.clone(),
            encoding,
        })
    }
}

/// Decode with `encoding` regardless of what the response headers claim.
fn decode(bytes: &[u8], encoding: &'static Encoding) -> String {
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        warn!("Page contained bytes invalid in {}", encoding.name());
    }
    text.into_owned()
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header(ACCEPT, &self.accept)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CatalogError::UpstreamStatus {
                url: url.to_string(),
                status: response.status(),
            });
        }

        let body = response.bytes().await?;
        Ok(decode(&body, self.encoding))
    }
}
