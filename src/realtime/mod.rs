//! # Hosted Realtime-API Integration
//!
//! This module provides the second collection strategy: instead of driving
//! a browser, it POSTs a query payload to the hosted realtime scraping
//! endpoint and flattens the pre-parsed response into price records.
//!
//! ## Supported query shapes
//!
//! - **Search**: `source = "amazon_search"` with a query string; listings
//!   arrive under `content.results.organic`
//! - **Bestsellers**: `source = "amazon_bestsellers"` with a category id;
//!   listings arrive directly under `content.results`
//! - **Deals**: `source = "amazon"` with a full page url; listings arrive
//!   under `content.results.organic`
//!
//! ## Environment Configuration
//!
//! Credentials come from the `REALTIME_API_USERNAME` and
//! `REALTIME_API_PASSWORD` environment variables and are sent as HTTP
//! basic auth. Unlike the browser path there is no header spoofing here;
//! the hosted service handles page acquisition itself.
//!
//! Requests are not retried; a non-success status fails the collection.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::PricePoint;
use crate::traits::PriceSource;

const REALTIME_ENDPOINT: &str = "https://realtime.oxylabs.io/v1/queries";

/// Request payload for the realtime queries endpoint.
///
/// Only the fields a given query shape needs are serialized; the rest are
/// omitted from the JSON body entirely.
#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest {
    source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    domain: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_page: Option<u32>,
    parse: bool,
}

impl QueryRequest {
    /// Payload for a product search query.
    pub fn search(query: &str, start_page: u32) -> Self {
        Self {
            source: "amazon_search",
            domain: Some("com"),
            query: Some(query.to_string()),
            url: None,
            start_page: Some(start_page),
            parse: true,
        }
    }

    /// Payload for a best-sellers category query.
    pub fn bestsellers(category_id: &str, start_page: u32) -> Self {
        Self {
            source: "amazon_bestsellers",
            domain: Some("com"),
            query: Some(category_id.to_string()),
            url: None,
            start_page: Some(start_page),
            parse: true,
        }
    }

    /// Payload for scraping a deals page by url.
    pub fn deals(url: &str) -> Self {
        Self {
            source: "amazon",
            domain: None,
            query: None,
            url: Some(url.to_string()),
            start_page: None,
            parse: true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    results: Vec<QueryResult>,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    content: PageContent,
}

#[derive(Debug, Deserialize)]
struct PageContent {
    results: ListingResults,
}

/// Search and deals responses nest organic listings one level deeper than
/// bestsellers responses; both shapes flatten to the same record list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListingResults {
    Flat(Vec<PricePoint>),
    Organic { organic: Vec<PricePoint> },
}

impl ListingResults {
    fn into_price_points(self) -> Vec<PricePoint> {
        match self {
            Self::Flat(points) => points,
            Self::Organic { organic } => organic,
        }
    }
}

/// Client for one realtime-API query.
///
/// Holds a reusable HTTP client plus the prepared payload; `fetch` submits
/// the query and flattens whichever response nesting the source uses.
pub struct RealtimeClient {
    client: Client,
    username: String,
    password: String,
    request: QueryRequest,
    label: String,
}

impl RealtimeClient {
    /// Creates a client with credentials from the environment.
    ///
    /// # Errors
    /// Fails when `REALTIME_API_USERNAME` or `REALTIME_API_PASSWORD` is
    /// not set.
    pub fn from_env(request: QueryRequest, label: String) -> Result<Self> {
        let username = std::env::var("REALTIME_API_USERNAME")
            .context("REALTIME_API_USERNAME is not set")?;
        let password = std::env::var("REALTIME_API_PASSWORD")
            .context("REALTIME_API_PASSWORD is not set")?;

        Ok(Self {
            client: Client::new(),
            username,
            password,
            request,
            label,
        })
    }
}

#[async_trait]
impl PriceSource for RealtimeClient {
    type Record = PricePoint;

    fn describe(&self) -> String {
        self.label.clone()
    }

    async fn fetch(&self) -> Result<Vec<PricePoint>> {
        info!("Querying the realtime API for {}", self.label);

        let response = self
            .client
            .post(REALTIME_ENDPOINT)
            .basic_auth(&self.username, Some(&self.password))
            .json(&self.request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "Realtime API request failed: {}",
                response.status()
            ));
        }

        let body: QueryResponse = response.json().await?;
        let first = body
            .results
            .into_iter()
            .next()
            .context("Realtime API response contained no results")?;

        Ok(first.content.results.into_price_points())
    }
}

impl Clone for RealtimeClient {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            request: self.request.clone(),
            label: self.label.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn search_payload_has_query_fields_only() {
        let payload = serde_json::to_value(QueryRequest::search("couch", 1)).unwrap();

        assert_eq!(
            payload,
            json!({
                "source": "amazon_search",
                "domain": "com",
                "query": "couch",
                "start_page": 1,
                "parse": true,
            })
        );
    }

    #[test]
    fn bestsellers_payload_uses_the_category_id_as_query() {
        let payload = serde_json::to_value(QueryRequest::bestsellers("2975359011", 1)).unwrap();

        assert_eq!(payload["source"], "amazon_bestsellers");
        assert_eq!(payload["query"], "2975359011");
        assert!(payload.get("url").is_none());
    }

    #[test]
    fn deals_payload_has_url_and_no_domain() {
        let payload =
            serde_json::to_value(QueryRequest::deals("https://www.amazon.com/s?i=sporting"))
                .unwrap();

        assert_eq!(payload["source"], "amazon");
        assert_eq!(payload["url"], "https://www.amazon.com/s?i=sporting");
        assert!(payload.get("domain").is_none());
        assert!(payload.get("query").is_none());
        assert!(payload.get("start_page").is_none());
    }

    #[test]
    fn decodes_flat_bestsellers_response() {
        let body = json!({
            "results": [{
                "content": {
                    "results": [
                        { "price": 12.99, "title": "Dog Food", "currency": "USD", "rank": 1 },
                        { "price": 45.0, "title": "Bigger Dog Food", "currency": "USD", "rank": 2 },
                    ]
                }
            }]
        });

        let decoded: QueryResponse = serde_json::from_value(body).unwrap();
        let points = decoded.results[0].content.results.clone_points();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].title, "Dog Food");
        assert_eq!(points[1].price, 45.0);
    }

    #[test]
    fn decodes_nested_organic_search_response() {
        let body = json!({
            "results": [{
                "content": {
                    "results": {
                        "organic": [
                            { "price": 299.0, "title": "Couch", "currency": "USD", "pos": 1 }
                        ],
                        "paid": []
                    }
                }
            }]
        });

        let decoded: QueryResponse = serde_json::from_value(body).unwrap();
        let points = decoded.results[0].content.results.clone_points();

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].currency, "USD");
    }

    impl ListingResults {
        fn clone_points(&self) -> Vec<PricePoint> {
            match self {
                Self::Flat(points) => points.clone(),
                Self::Organic { organic } => organic.clone(),
            }
        }
    }
}
