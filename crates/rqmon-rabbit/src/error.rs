/// Errors from the RabbitMQ management API client.
///
/// A fetch failure marks the cycle degraded; it never terminates the
/// collection loop.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The HTTP request itself failed (connect, timeout, TLS).
    #[error("Rabbit: HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The management API answered with a non-success status.
    #[error("Rabbit: API error: status={status}, body={body}")]
    Api { status: u16, body: String },

    /// The response body did not match the expected shape.
    #[error("Rabbit: unexpected response payload: {0}")]
    Payload(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FetchError>;
