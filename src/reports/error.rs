use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportStoreError {
    #[error("Failed to read report store '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to write report store '{0}'")]
    Write(PathBuf, #[source] std::io::Error),

    #[error("Report store '{0}' is not valid JSON")]
    Parse(PathBuf, #[source] serde_json::Error),

    #[error("Failed to encode reports")]
    Encode(#[source] serde_json::Error),

    #[error("Failed to export report as CSV")]
    Csv(#[from] csv::Error),

    #[error("Exported CSV is not valid UTF-8")]
    CsvEncoding(#[from] std::string::FromUtf8Error),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
