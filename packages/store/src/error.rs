/// Local errors raised by a [`JsonStore`](crate::JsonStore).
///
/// These signal misuse of the handle and are returned before any request is
/// issued. Remote failures never show up here; they resolve as a
/// [`Reply`](crate::Reply).
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("use of destroyed store instance")]
    Destroyed,

    #[error("path must not be empty")]
    EmptyPath,

    #[error("invalid token {token:?}: {message}")]
    InvalidToken { token: String, message: String },

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("content is not JSON-serializable: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("transport error: {0}")]
    Transport(#[from] jsonstore_http::Error),

    #[error("configuration error: {message}")]
    Config { message: String },
}

/// Errors from decoding a [`Reply`](crate::Reply) into a typed value.
#[derive(thiserror::Error, Debug)]
pub enum ReplyError {
    #[error("remote failure: {0}")]
    Failure(String),

    #[error("failed to decode value: {0}")]
    Decode(#[from] serde_json::Error),
}
