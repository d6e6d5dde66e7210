/// Errors from the notification subsystem.
///
/// A delivery failure is logged and dropped by the caller; it never
/// interrupts a collection cycle.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The HTTP request to the notification endpoint failed.
    #[error("Notify: HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success response.
    #[error("Notify: API error from {service}: status={status}, body={body}")]
    Api {
        service: String,
        status: u16,
        body: String,
    },
}

pub type Result<T> = std::result::Result<T, NotifyError>;
