use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CircleIndexError {
    #[error("Neither a dataset path nor a dataset URL was given")]
    MissingSource,

    #[error("Failed to read circle dataset '{0}'")]
    DatasetRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to read cache file '{0}'")]
    CacheRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to write cache file '{0}'")]
    CacheWrite(PathBuf, #[source] std::io::Error),

    #[error("Failed to decode cache data from '{0}'")]
    CacheDecode(PathBuf, #[source] Box<bincode::error::DecodeError>),

    #[error("Failed to encode cache data")]
    CacheEncode(#[source] Box<bincode::error::EncodeError>),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Dataset download or decompression failed")]
    DownloadIo(#[from] std::io::Error),

    #[error("Failed to parse circle dataset")]
    JsonParse(#[from] serde_json::Error),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
