use std::sync::Arc;

use scraper::Html;
use tracing::{info, warn};

use crate::error::Result;
use crate::fetcher::HttpFetcher;
use crate::models::{CardRecord, SearchRequest, SetRecord};
use crate::params::{build_search_url, build_sets_url, map_parameters};
use crate::scrapers::CatalogParser;
use crate::traits::{CatalogConfig, PageFetcher};

/// Runs searches against the catalog, following its result pages
pub struct CardFinder {
    fetcher: Arc<dyn PageFetcher>,
    parser: CatalogParser,
    config: CatalogConfig,
}

impl CardFinder {
    pub fn new(config: CatalogConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config)?;
        Self::with_fetcher(config, Arc::new(fetcher))
    }

    pub fn with_fetcher(config: CatalogConfig, fetcher: Arc<dyn PageFetcher>) -> Result<Self> {
        let parser = CatalogParser::new(&config)?;

        Ok(Self {
            fetcher,
            parser,
            config,
        })
    }

    /// Collect every listing matching `request`, in page order.
    ///
    /// Pages are fetched one after another and at most `page_limit` fetches
    /// are made. Any failed fetch or unparseable page aborts the search and
    /// the listings gathered so far are dropped.
    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<CardRecord>> {
        let params = map_parameters(request, &self.config.defaults);
        info!("Searching catalog for {:?}", params.card_name);

        let url = build_search_url(&self.config.base_url, &params);
        let webpage = self.fetcher.fetch_text(&url).await?;

        // Parse in a scope so the document is dropped before the next await
        let (mut cards, pages_count) = {
            let document = Html::parse_document(&webpage);
            (
                self.parser.parse_page(&document)?,
                self.parser.count_pages(&document),
            )
        };

        let last_page = pages_count.min(self.config.page_limit.saturating_sub(1));
        if last_page < pages_count {
            warn!(
                "Catalog reports {} pages, fetching only {} (page limit {})",
                pages_count,
                last_page + 1,
                self.config.page_limit
            );
        }

        for page in 1..=last_page {
            let offset = page.saturating_mul(self.config.page_size);
            info!("Fetching page {} (offset {})", page + 1, offset);

            let url = build_search_url(&self.config.base_url, &params.with_offset(offset));
            let webpage = self.fetcher.fetch_text(&url).await?;

            let batch = {
                let document = Html::parse_document(&webpage);
                self.parser.parse_page(&document)?
            };
            cards.extend(batch);
        }

        info!(
            "Found {} listings for {:?} across {} pages",
            cards.len(),
            params.card_name,
            last_page + 1
        );
        Ok(cards)
    }

    /// Set codes accepted by the search's set filter.
    pub async fn list_sets(&self) -> Result<Vec<SetRecord>> {
        let url = build_sets_url(&self.config.base_url);
        let webpage = self.fetcher.fetch_text(&url).await?;

        let sets = {
            let document = Html::parse_document(&webpage);
            self.parser.parse_sets(&document)
        };

        info!("Found {} sets", sets.len());
        Ok(sets)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use reqwest::StatusCode;

    use super::*;
    use crate::error::CatalogError;

    /// Serves canned pages keyed by the `limit` offset and records every URL asked for
    #[derive(Default)]
    struct CannedFetcher {
        pages: HashMap<u32, String>,
        failing_offset: Option<u32>,
        requests: Mutex<Vec<String>>,
    }

    impl CannedFetcher {
        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    fn offset_of(url: &str) -> u32 {
        url.split('&')
            .find_map(|pair| pair.strip_prefix("limit="))
            .and_then(|value| value.parse().ok())
            .unwrap_or(0)
    }

    #[async_trait]
    impl PageFetcher for CannedFetcher {
        async fn fetch_text(&self, url: &str) -> Result<String> {
            self.requests.lock().unwrap().push(url.to_string());

            let offset = offset_of(url);
            if self.failing_offset == Some(offset) {
                return Err(CatalogError::UpstreamStatus {
                    url: url.to_string(),
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                });
            }
            Ok(self.pages.get(&offset).cloned().unwrap_or_else(|| page("", &[])))
        }
    }

    fn row(name: &str, number: &str) -> String {
        format!(
            r#"<tr><td><a href="/images/kusovkymagic/WOE/{number}.jpg"><font>{name}</font></a></td></tr>
            <tr><td><img src="/images/edice/WOE.gif">Wilds of Eldraine</td><td>Creature</td></tr>
            <tr><td>R</td><td>2 ks</td><td>80 Kč</td></tr>"#
        )
    }

    fn page(summary: &str, rows: &[String]) -> String {
        format!(
            r#"<html><body><div>{summary}</div><table class="kusovkytext">
            <tbody><tr><td>header</td></tr></tbody><tbody>{}</tbody></table></body></html>"#,
            rows.concat()
        )
    }

    fn finder(fetcher: &Arc<CannedFetcher>, config: CatalogConfig) -> CardFinder {
        CardFinder::with_fetcher(config, fetcher.clone()).unwrap()
    }

    #[test]
    fn invalid_selector_fails_construction() {
        let mut config = CatalogConfig::default();
        config.selectors.results_table = "table[".to_string();

        let result = CardFinder::with_fetcher(config, Arc::new(CannedFetcher::default()));
        assert!(matches!(result, Err(CatalogError::Selector(_))));
    }

    #[tokio::test]
    async fn single_page_search_fetches_once() {
        let fetcher = Arc::new(CannedFetcher {
            pages: HashMap::from([(0, page("12 karet", &[row("Beseech the Mirror", "082")]))]),
            ..CannedFetcher::default()
        });

        let request = SearchRequest {
            card_name: Some("Beseech".to_string()),
            ..SearchRequest::default()
        };
        let cards = finder(&fetcher, CatalogConfig::default())
            .search(&request)
            .await
            .unwrap();

        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].id, "woe_082");

        let requests = fetcher.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].contains("jmenokarty=Beseech&"));
        assert!(requests[0].contains("limit=0"));
    }

    #[tokio::test]
    async fn follows_announced_pages_in_order() {
        let fetcher = Arc::new(CannedFetcher {
            pages: HashMap::from([
                (0, page("Nalezeno 75 karet: 2 3", &[row("First", "001")])),
                (30, page("", &[row("Second", "002"), row("Third", "003")])),
                (60, page("", &[row("Fourth", "004")])),
            ]),
            ..CannedFetcher::default()
        });

        let cards = finder(&fetcher, CatalogConfig::default())
            .search(&SearchRequest::default())
            .await
            .unwrap();

        let names: Vec<&str> = cards.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["First", "Second", "Third", "Fourth"]);

        let offsets: Vec<u32> = fetcher.requests().iter().map(|u| offset_of(u)).collect();
        assert_eq!(offsets, [0, 30, 60, 90]);
    }

    #[tokio::test]
    async fn never_fetches_more_than_the_page_limit() {
        let links: Vec<String> = (2..=60).map(|n| n.to_string()).collect();
        let summary = format!("Nalezeno 1800 karet: {}", links.join(" "));
        let fetcher = Arc::new(CannedFetcher {
            pages: HashMap::from([(0, page(&summary, &[row("First", "001")]))]),
            ..CannedFetcher::default()
        });

        let config = CatalogConfig::default();
        let limit = config.page_limit as usize;
        finder(&fetcher, config)
            .search(&SearchRequest::default())
            .await
            .unwrap();

        let requests = fetcher.requests();
        assert_eq!(requests.len(), limit);
        assert_eq!(offset_of(requests.last().unwrap()), 19 * 30);
    }

    #[tokio::test]
    async fn failed_page_aborts_the_whole_search() {
        let fetcher = Arc::new(CannedFetcher {
            pages: HashMap::from([(0, page("Nalezeno 60 karet: 2", &[row("First", "001")]))]),
            failing_offset: Some(30),
            ..CannedFetcher::default()
        });

        let err = finder(&fetcher, CatalogConfig::default())
            .search(&SearchRequest::default())
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::UpstreamStatus { .. }));
        assert_eq!(fetcher.requests().len(), 2);
    }

    #[tokio::test]
    async fn unparseable_page_aborts_the_search() {
        let broken = r#"<tr><td><font>No link</font></td></tr><tr><td></td></tr><tr><td></td></tr>"#;
        let fetcher = Arc::new(CannedFetcher {
            pages: HashMap::from([(0, page("", &[broken.to_string()]))]),
            ..CannedFetcher::default()
        });

        let err = finder(&fetcher, CatalogConfig::default())
            .search(&SearchRequest::default())
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[tokio::test]
    async fn list_sets_reads_the_base_page() {
        let html = r#"<select name="edice_magic"><option value="">-- any --</option>
            <option value="WOE">Wilds of Eldraine</option></select>"#;
        let fetcher = Arc::new(CannedFetcher {
            pages: HashMap::from([(0, html.to_string())]),
            ..CannedFetcher::default()
        });

        let config = CatalogConfig::default();
        let base_url = config.base_url.clone();
        let sets = finder(&fetcher, config).list_sets().await.unwrap();

        assert_eq!(sets.len(), 2);
        assert_eq!(sets[1].set, "WOE");
        assert_eq!(sets[1].set_name, "Wilds of Eldraine");
        assert_eq!(fetcher.requests(), vec![base_url]);
    }
}
