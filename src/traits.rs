//! Configuration and the fetch interface the catalog scraper is built on

use async_trait::async_trait;
use tracing::warn;

use crate::error::Result;
use crate::models::SearchParameters;

/// Configuration for the catalog website
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Search endpoint; also serves the page carrying the set filter
    pub base_url: String,
    /// Host prefixed to the relative image paths found in listings
    pub image_host: String,
    /// Listings per result page, the stride of the `limit` offset
    pub page_size: u32,
    /// Upper bound on fetches per search, first page included
    pub page_limit: u32,
    /// Encoding every response body is decoded with
    pub charset: String,
    /// User agent sent with every request
    pub user_agent: String,
    /// Accept header sent with every request
    pub accept: String,
    /// CSS selectors and markers describing the page layout
    pub selectors: SiteSelectors,
    /// Parameter template caller fields are layered over
    pub defaults: SearchParameters,
}

/// CSS selectors for the parts of the catalog pages we read
#[derive(Debug, Clone)]
pub struct SiteSelectors {
    /// Table holding the listings
    pub results_table: String,
    /// Body sections of the results table; listings live in the second one
    pub table_body: String,
    /// Styled card name inside the name row
    pub name: String,
    /// Detail link inside the name row
    pub link: String,
    /// Sub-cells of the set/type and rarity/quantity/price rows
    pub cell: String,
    /// Set symbol inside the set cell
    pub set_image: String,
    /// Set filter control on the search form
    pub set_select: String,
    /// Options of the set filter
    pub set_option: String,
    /// Phrase in the results summary announcing further pages
    pub pages_marker: String,
}

impl Default for SiteSelectors {
    fn default() -> Self {
        Self {
            results_table: "table.kusovkytext".to_string(),
            table_body: "tbody".to_string(),
            name: "font".to_string(),
            link: "a".to_string(),
            cell: "td".to_string(),
            set_image: "img".to_string(),
            set_select: r#"select[name="edice_magic"]"#.to_string(),
            set_option: "option".to_string(),
            pages_marker: "Nalezeno".to_string(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.cernyrytir.cz/index.php3?akce=3".to_string(),
            image_host: "https://www.cernyrytir.cz".to_string(),
            page_size: 30,
            page_limit: 20,
            charset: "windows-1250".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3".to_string(),
            accept: "application/text".to_string(),
            selectors: SiteSelectors::default(),
            defaults: SearchParameters::default(),
        }
    }
}

impl CatalogConfig {
    /// Build the configuration from `CATALOG_*` environment variables,
    /// falling back to the defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(base_url) = lookup("CATALOG_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(image_host) = lookup("CATALOG_IMAGE_HOST") {
            config.image_host = image_host.trim_end_matches('/').to_string();
        }
        if let Some(charset) = lookup("CATALOG_CHARSET") {
            config.charset = charset;
        }
        if let Some(user_agent) = lookup("CATALOG_USER_AGENT") {
            config.user_agent = user_agent;
        }
        config.page_size = parse_number(&lookup, "CATALOG_PAGE_SIZE", config.page_size);
        config.page_limit = parse_number(&lookup, "CATALOG_PAGE_LIMIT", config.page_limit).max(1);

        config
    }
}

fn parse_number(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u32) -> u32 {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} is not a number ({:?}), using {}", key, raw, default);
            default
        }),
        None => default,
    }
}

/// Source of decoded page text
///
/// The production implementation is [`crate::fetcher::HttpFetcher`]; tests
/// substitute canned pages.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` and return its body decoded to text
    ///
    /// # Returns
    /// * `Result<String>` - The page text, or an upstream error for a
    ///   non-success status or transport failure
    async fn fetch_text(&self, url: &str) -> Result<String>;
}
