use thiserror::Error;

/// Errors emitted by the backend client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never completed (DNS, connect, timeout).
    #[error("connection error: {0}")]
    Connection(String),
    /// Non-success HTTP response; `detail` comes from the error body when
    /// the backend provided one.
    #[error("server error ({status}): {detail}")]
    Server { status: u16, detail: String },
    /// The response body did not match the expected shape.
    #[error("unexpected response: {0}")]
    Parse(String),
    /// A file download failed or the requested format was not produced.
    #[error("download error: {0}")]
    Download(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
