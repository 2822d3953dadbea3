use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::app::ports::ExportPort;
use crate::error::Result;
use crate::infra::export_path;
use crate::types::Record;

pub(crate) const HEADER: [&str; 3] = ["name", "price", "url"];

/// Writes records as `name,price,url` rows to
/// `<output_dir>/<search_term>_<suffix>.csv`, creating the directory if needed.
pub struct CsvOutputAdapter {
    output_dir: PathBuf,
    file_suffix: String,
}

impl CsvOutputAdapter {
    pub fn new(output_dir: impl Into<PathBuf>, file_suffix: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            file_suffix: file_suffix.into(),
        }
    }

    /// Deterministic path for a search term; spaces become underscores.
    pub fn path_for(&self, search_term: &str) -> PathBuf {
        export_path(&self.output_dir, search_term, &self.file_suffix, "csv")
    }

    fn write(path: &Path, records: &[Record]) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path)?;
        wtr.write_record(HEADER)?;
        for record in records {
            wtr.write_record([
                record.name.as_str(),
                record.price.to_string().as_str(),
                record.url.as_str(),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }
}

#[async_trait]
impl ExportPort for CsvOutputAdapter {
    async fn export(&self, search_term: &str, records: &[Record]) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.path_for(search_term);
        Self::write(&path, records)?;
        info!("Wrote {} records to {}", records.len(), path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Price;

    fn records() -> Vec<Record> {
        vec![
            Record {
                name: "Notebook, 15 inch".to_string(),
                price: Price::from_units(1_042_634),
                url: "https://shop.test/p/1".to_string(),
            },
            Record {
                name: "Sticker".to_string(),
                price: Price::from_cents(45),
                url: "https://shop.test/p/2".to_string(),
            },
        ]
    }

    #[test]
    fn test_path_is_derived_from_search_term() {
        let adapter = CsvOutputAdapter::new("data", "mercadolibre");
        assert_eq!(
            adapter.path_for("gaming laptop"),
            PathBuf::from("data/gaming_laptop_mercadolibre.csv")
        );
    }

    #[tokio::test]
    async fn test_export_creates_directory_and_writes_rows() {
        let temp_dir = tempfile::tempdir().unwrap();
        let output_dir = temp_dir.path().join("nested").join("data");
        let adapter = CsvOutputAdapter::new(&output_dir, "mercadolibre");

        let path = adapter.export("laptop", &records()).await.unwrap();
        assert_eq!(path, output_dir.join("laptop_mercadolibre.csv"));

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines[0], "name,price,url");
        assert_eq!(lines[1], "\"Notebook, 15 inch\",1042634.00,https://shop.test/p/1");
        assert_eq!(lines[2], "Sticker,0.45,https://shop.test/p/2");
    }

    #[tokio::test]
    async fn test_export_reports_unwritable_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let blocker = temp_dir.path().join("taken");
        fs::write(&blocker, "not a directory").unwrap();

        let adapter = CsvOutputAdapter::new(&blocker, "mercadolibre");
        assert!(adapter.export("laptop", &records()).await.is_err());
    }
}
