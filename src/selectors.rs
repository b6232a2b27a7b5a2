//! Selector table for the rendered search-result page.
//!
//! Every structural query the extractor runs lives in this one table, so
//! selector churn after a page redesign is isolated here. The product
//! container matches on the `data-component-type` attribute, which is a
//! semantic marker and far more stable than the presentation class names
//! used for the sub-elements.

use anyhow::Result;
use scraper::Selector;

/// Selector strings for each part of a product listing.
#[derive(Debug, Clone)]
pub struct PageSelectors {
    /// Container element for one product block
    pub product_container: String,
    /// Primary title text within a block
    pub title: String,
    /// Detail-page anchor within a block
    pub link: String,
    /// Price container within a block
    pub price_container: String,
    /// Whole-number price fragment within the price container
    pub price_whole: String,
    /// Fractional price fragment within the price container
    pub price_fraction: String,
    /// Currency symbol within the price container
    pub price_symbol: String,
}

impl Default for PageSelectors {
    fn default() -> Self {
        Self {
            product_container: "div[data-component-type='s-search-result']".to_string(),
            title: "h2.a-size-base-plus.a-spacing-none.a-color-base.a-text-normal > span"
                .to_string(),
            link: "a.a-link-normal.s-no-outline".to_string(),
            price_container: "span.a-price".to_string(),
            price_whole: ".a-price-whole".to_string(),
            price_fraction: ".a-price-fraction".to_string(),
            price_symbol: ".a-price-symbol".to_string(),
        }
    }
}

impl PageSelectors {
    /// Parses every selector string up front so a bad entry fails fast
    /// instead of surfacing mid-extraction.
    pub fn compile(&self) -> Result<CompiledSelectors> {
        Ok(CompiledSelectors {
            product_container: parse(&self.product_container)?,
            title: parse(&self.title)?,
            link: parse(&self.link)?,
            price_container: parse(&self.price_container)?,
            price_whole: parse(&self.price_whole)?,
            price_fraction: parse(&self.price_fraction)?,
            price_symbol: parse(&self.price_symbol)?,
        })
    }
}

/// Parsed counterparts of [`PageSelectors`], ready to run against a page.
#[derive(Debug, Clone)]
pub struct CompiledSelectors {
    pub product_container: Selector,
    pub title: Selector,
    pub link: Selector,
    pub price_container: Selector,
    pub price_whole: Selector,
    pub price_fraction: Selector,
    pub price_symbol: Selector,
}

fn parse(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| anyhow::anyhow!("Failed to parse selector '{selector}': {e:?}"))
}
