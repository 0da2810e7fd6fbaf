#[derive(Debug, thiserror::Error)]
pub enum ProtoError {
    #[error("empty request line")]
    EmptyLine,
    #[error("unrecognized operation {0:?}")]
    UnknownOperation(String),
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("malformed response status line: {0:?}")]
    MalformedResponse(String),
    #[error("unrecognized response status {0:?}")]
    UnknownStatus(String),
}
