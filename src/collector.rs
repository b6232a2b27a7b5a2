//! Collection orchestration: fetch from a price source, persist to CSV.

use std::path::PathBuf;

use tracing::{error, info};

use crate::output;
use crate::traits::PriceSource;

/// Drives one collection pass over one target.
pub struct Collector<S> {
    source: S,
    output_file: PathBuf,
}

impl<S: PriceSource> Collector<S> {
    pub fn new(source: S, output_file: PathBuf) -> Self {
        Self {
            source,
            output_file,
        }
    }

    /// Runs the collection end to end.
    ///
    /// Collection and write failures are logged, never propagated, so the
    /// process still exits cleanly; callers watch the log stream rather
    /// than the exit code. When the source yields nothing, no output file
    /// is written at all.
    pub async fn run(&self) {
        info!("Collecting price data from {}", self.source.describe());

        let records = match self.source.fetch().await {
            Ok(records) => records,
            Err(e) => {
                error!(
                    "Error when collecting price data from {}: {e:#}",
                    self.source.describe()
                );
                return;
            }
        };

        if records.is_empty() {
            info!("No prices found for {}", self.source.describe());
            return;
        }

        info!(
            "Writing {} records to {}",
            records.len(),
            self.output_file.display()
        );
        if let Err(e) = output::write_csv(&self.output_file, &records) {
            error!("Failed to write {}: {e:#}", self.output_file.display());
        }
    }
}
