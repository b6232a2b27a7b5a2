//! Product extraction from rendered search-result pages.
//!
//! The extraction pipeline is a pure pass over parsed HTML: locate product
//! blocks in document order, extract each block independently, and fold the
//! successes. A block that cannot produce a complete record is skipped with
//! a log line; it never aborts the rest of the page.

use anyhow::{Context, Result};
use async_trait::async_trait;
use scraper::{ElementRef, Html};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::models::Product;
use crate::selectors::{CompiledSelectors, PageSelectors};
use crate::session::{RenderSession, SessionConfig};
use crate::traits::PriceSource;

/// Fatal collection failures. Per-block extraction problems are handled
/// inside the page loop and never become one of these.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Unable to initialize the headless browser session")]
    SessionInitialization(#[source] anyhow::Error),

    #[error("Unable to get product price data from {url}")]
    PageAcquisition {
        url: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Browser-driven price source: renders the target url in headless Chrome
/// and extracts one [`Product`] per fully-priced result block.
#[derive(Clone)]
pub struct BrowserScraper {
    url: String,
    session_config: SessionConfig,
    selectors: CompiledSelectors,
}

impl BrowserScraper {
    pub fn new(url: String, session_config: SessionConfig) -> Result<Self> {
        let selectors = PageSelectors::default().compile()?;

        Ok(Self {
            url,
            session_config,
            selectors,
        })
    }

    /// Runs one full browser pass. Blocking: drives a real Chrome process.
    fn scrape_blocking(&self) -> Result<Vec<Product>, ScrapeError> {
        let session = RenderSession::start(&self.session_config)
            .map_err(ScrapeError::SessionInitialization)?;

        render_and_extract(session, &self.url, &self.selectors)
    }
}

#[async_trait]
impl PriceSource for BrowserScraper {
    type Record = Product;

    fn describe(&self) -> String {
        format!("rendered page {}", self.url)
    }

    async fn fetch(&self) -> Result<Vec<Product>> {
        info!("Scraping product price data from {}", self.url);

        let scraper = self.clone();
        let products = tokio::task::spawn_blocking(move || scraper.scrape_blocking())
            .await
            .context("Browser task panicked")??;

        Ok(products)
    }
}

/// Anything that can turn a url into rendered page HTML.
///
/// [`RenderSession`] is the real implementation; tests substitute fakes to
/// exercise the release-on-every-path guarantee without a browser.
pub(crate) trait Render {
    fn render(&self, url: &str) -> Result<String>;
}

impl Render for RenderSession {
    fn render(&self, url: &str) -> Result<String> {
        RenderSession::render(self, url)
    }
}

/// Renders `url` and extracts every product block from the result.
///
/// Consumes the renderer and drops it before returning, so the session is
/// released exactly once whether rendering succeeds or fails.
fn render_and_extract<R: Render>(
    renderer: R,
    url: &str,
    selectors: &CompiledSelectors,
) -> Result<Vec<Product>, ScrapeError> {
    let rendered = renderer.render(url);
    drop(renderer);

    let html = rendered.map_err(|source| ScrapeError::PageAcquisition {
        url: url.to_string(),
        source,
    })?;

    Ok(products_from_html(&html, selectors))
}

/// Extracts all products from one rendered page, in document order.
///
/// An empty page (zero blocks) is a valid outcome and yields an empty list.
pub fn products_from_html(html: &str, selectors: &CompiledSelectors) -> Vec<Product> {
    let document = Html::parse_document(html);
    let blocks: Vec<ElementRef<'_>> = document.select(&selectors.product_container).collect();

    info!("Found {} product blocks on the page", blocks.len());

    collect_blocks(blocks, |block| extract_product(block, selectors))
}

/// Folds per-block extraction results into the final list.
///
/// Each block is extracted independently; an unexpected failure on one
/// block is logged and must not prevent extraction of the blocks after it.
fn collect_blocks<'a, F>(blocks: Vec<ElementRef<'a>>, extract: F) -> Vec<Product>
where
    F: Fn(ElementRef<'a>) -> Result<Option<Product>>,
{
    let mut products = Vec::new();

    for block in blocks {
        match extract(block) {
            Ok(Some(product)) => products.push(product),
            Ok(None) => {}
            Err(e) => {
                error!("Unexpected error when parsing prices for product, skipping: {e:#}");
            }
        }
    }

    products
}

/// Extracts one product from one result block.
///
/// Only a missing price short-circuits the block: a listing without a price
/// container is treated as out of stock and yields `Ok(None)`. Title, url
/// and currency degrade to empty strings when their sub-elements are
/// missing, so a layout variant without a title still produces a record.
fn extract_product(
    block: ElementRef<'_>,
    selectors: &CompiledSelectors,
) -> Result<Option<Product>> {
    let title = block
        .select(&selectors.title)
        .next()
        .map_or_else(String::new, element_text);

    let url = block
        .select(&selectors.link)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map_or_else(String::new, str::to_string);

    let Some(price_container) = block.select(&selectors.price_container).next() else {
        warn!("Price not found for product '{title}'. Likely out of stock.");
        return Ok(None);
    };

    let Some(price) = assemble_price(price_container, selectors) else {
        warn!("Incomplete price markup for product '{title}'. Skipping.");
        return Ok(None);
    };

    let currency = price_container
        .select(&selectors.price_symbol)
        .next()
        .map_or_else(String::new, element_text);

    Ok(Some(Product {
        title,
        url,
        price,
        currency,
    }))
}

/// Joins the whole and fractional price fragments as `<whole>.<fraction>`.
///
/// Either fragment missing makes the price unassemblable; that is reported
/// as `None` rather than a malformed string.
fn assemble_price(container: ElementRef<'_>, selectors: &CompiledSelectors) -> Option<String> {
    let whole = container
        .select(&selectors.price_whole)
        .next()
        .map(element_text)?;
    let fraction = container
        .select(&selectors.price_fraction)
        .next()
        .map(element_text)?;

    Some(format!("{whole}.{fraction}"))
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
