/// Errors from the time-series writer.
///
/// Write failures are logged and dropped; metrics storage is best
/// effort and never blocks alerting.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The HTTP request to the storage endpoint failed.
    #[error("Storage: HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The storage API rejected the write.
    #[error("Storage: write rejected: status={status}, body={body}")]
    Api { status: u16, body: String },
}

pub type Result<T> = std::result::Result<T, StorageError>;
