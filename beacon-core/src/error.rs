use thiserror::Error;

/// Errors from decoding a single inbound frame.
///
/// Always recoverable: a bad frame is dropped, the connection and its
/// room stay untouched.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("message is not a json object")]
    NotAnObject,

    #[error("missing or non-string \"type\" field")]
    MissingType,

    #[error("missing or non-string \"{0}\" field")]
    MissingField(&'static str),
}
