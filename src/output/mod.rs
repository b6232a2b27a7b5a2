//! CSV persistence for collected records.

use std::path::Path;

use anyhow::Result;
use tracing::info;

use crate::traits::TabularRecord;

/// Writes all records to `path` as CSV, one row per record.
///
/// The header row carries a leading unnamed row-index column followed by
/// the record type's column names; each data row starts with its position
/// in the collection.
pub fn write_csv<R: TabularRecord>(path: &Path, records: &[R]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec!["".to_string()];
    header.extend(R::columns().iter().map(|column| (*column).to_string()));
    writer.write_record(&header)?;

    for (index, record) in records.iter().enumerate() {
        let mut row = vec![index.to_string()];
        row.extend(record.fields());
        writer.write_record(&row)?;
    }

    writer.flush()?;
    info!("Wrote {} records to {}", records.len(), path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Product;

    fn sample() -> Vec<Product> {
        vec![
            Product {
                title: "Dog Food".to_string(),
                url: "https://www.amazon.com/dp/B0TEST".to_string(),
                price: "19.99".to_string(),
                currency: "$".to_string(),
            },
            Product {
                title: "".to_string(),
                url: "https://www.amazon.com/dp/B0OTHER".to_string(),
                price: "7.50".to_string(),
                currency: "$".to_string(),
            },
        ]
    }

    #[test]
    fn writes_header_index_column_and_one_row_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.csv");

        write_csv(&path, &sample()).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], ",title,url,price,currency");
        assert_eq!(
            lines[1],
            "0,Dog Food,https://www.amazon.com/dp/B0TEST,19.99,$"
        );
        assert_eq!(lines[2], "1,,https://www.amazon.com/dp/B0OTHER,7.50,$");
    }

    #[test]
    fn empty_record_list_still_produces_a_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");

        write_csv::<Product>(&path, &[]).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.trim_end(), ",title,url,price,currency");
    }
}
