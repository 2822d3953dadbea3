use std::path::{Path, PathBuf};

pub mod csv_output_adapter;
pub mod xlsx_output_adapter;

/// `<output_dir>/<search term, spaces as underscores>_<suffix>.<extension>`
pub fn export_path(output_dir: &Path, search_term: &str, suffix: &str, extension: &str) -> PathBuf {
    let stem = search_term.trim().replace(' ', "_");
    output_dir.join(format!("{}_{}.{}", stem, suffix, extension))
}
