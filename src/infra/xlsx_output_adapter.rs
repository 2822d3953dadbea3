use async_trait::async_trait;
use rust_xlsxwriter::{Format, Workbook};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::app::ports::ExportPort;
use crate::error::Result;
use crate::infra::csv_output_adapter::HEADER;
use crate::infra::export_path;
use crate::types::Record;

const SHEET_NAME: &str = "listings";

/// Writes records to a single-sheet workbook at
/// `<output_dir>/<search_term>_<suffix>.xlsx`. Prices are numeric cells with
/// two decimals, so they sort and sum in a spreadsheet.
pub struct XlsxOutputAdapter {
    output_dir: PathBuf,
    file_suffix: String,
}

impl XlsxOutputAdapter {
    pub fn new(output_dir: impl Into<PathBuf>, file_suffix: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            file_suffix: file_suffix.into(),
        }
    }

    pub fn path_for(&self, search_term: &str) -> PathBuf {
        export_path(&self.output_dir, search_term, &self.file_suffix, "xlsx")
    }

    fn write(path: &Path, records: &[Record]) -> Result<()> {
        let mut workbook = Workbook::new();
        let bold = Format::new().set_bold();
        let money = Format::new().set_num_format("0.00");

        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME)?;
        for (col, title) in HEADER.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, *title, &bold)?;
        }
        for (index, record) in records.iter().enumerate() {
            let row = index as u32 + 1;
            sheet.write_string(row, 0, record.name.as_str())?;
            sheet.write_number_with_format(row, 1, record.price.as_f64(), &money)?;
            sheet.write_string(row, 2, record.url.as_str())?;
        }
        sheet.set_column_width(0, 60)?;
        sheet.set_column_width(2, 80)?;

        workbook.save(path)?;
        Ok(())
    }
}

#[async_trait]
impl ExportPort for XlsxOutputAdapter {
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

    #[test]
    fn test_path_uses_xlsx_extension() {
        let adapter = XlsxOutputAdapter::new("data", "mercadolibre");
        assert_eq!(
            adapter.path_for(" gaming laptop "),
            PathBuf::from("data/gaming_laptop_mercadolibre.xlsx")
        );
    }

    #[tokio::test]
    async fn test_export_writes_workbook() {
        let temp_dir = tempfile::tempdir().unwrap();
        let adapter = XlsxOutputAdapter::new(temp_dir.path().join("out"), "mercadolibre");
        let records = vec![Record {
            name: "Notebook".to_string(),
            price: Price::from_units(1_042_634),
            url: "https://shop.test/p/1".to_string(),
        }];

        let path = adapter.export("laptop", &records).await.unwrap();
        assert_eq!(path, temp_dir.path().join("out").join("laptop_mercadolibre.xlsx"));

        // xlsx is a zip container
        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }
}
