//! Data models for collected price listings

use serde::{Deserialize, Serialize};

use crate::traits::TabularRecord;

/// One product listing extracted from a rendered search-result page.
///
/// Always constructed fully-populated: an optional field the page layout
/// lacks (title, url, currency) becomes an empty string rather than a null.
/// A block without a price never produces a `Product` at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub title: String,
    pub url: String,
    pub price: String,
    pub currency: String,
}

impl TabularRecord for Product {
    fn columns() -> &'static [&'static str] {
        &["title", "url", "price", "currency"]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.title.clone(),
            self.url.clone(),
            self.price.clone(),
            self.currency.clone(),
        ]
    }
}

/// One listing as returned by the hosted realtime API.
///
/// The API does not surface a detail-page link, so this shape carries no
/// url. Unknown response fields are ignored during deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub price: f64,
    pub title: String,
    pub currency: String,
}

impl TabularRecord for PricePoint {
    fn columns() -> &'static [&'static str] {
        &["price", "title", "currency"]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.price.to_string(),
            self.title.clone(),
            self.currency.clone(),
        ]
    }
}
