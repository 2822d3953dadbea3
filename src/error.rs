use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("WebDriver session could not be started: {0}")]
    Session(#[from] fantoccini::error::NewSessionError),

    #[error("WebDriver command failed: {0}")]
    WebDriver(#[from] fantoccini::error::CmdError),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("Workbook write failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Metrics recorder could not be installed: {0}")]
    Metrics(String),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ScraperError>;
