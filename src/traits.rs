//! Traits and interfaces for source-agnostic price collection

use anyhow::Result;
use async_trait::async_trait;

/// A record that knows how to render itself as one row of delimited output.
pub trait TabularRecord {
    /// Column names for the output header, in field order.
    fn columns() -> &'static [&'static str];

    /// The record's field values, in the same order as `columns()`.
    fn fields(&self) -> Vec<String>;
}

/// A collection strategy that produces price records for one target.
///
/// Implemented by the browser-driven scraper (records carry a detail-page
/// url) and by the hosted realtime-API client (records do not).
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Row type this source produces.
    type Record: TabularRecord + Send;

    /// Human-readable description of the target, for log lines.
    fn describe(&self) -> String;

    /// Fetch all records for the target.
    ///
    /// # Returns
    /// * `Result<Vec<Self::Record>>` - Collected records or a fatal
    ///   collection error. Per-item extraction problems are handled inside
    ///   the source and never surface here.
    async fn fetch(&self) -> Result<Vec<Self::Record>>;
}
