//! The error kinds visible at the broker's wire boundary, shared between the
//! pool actor, the request handler, and the client library so all three agree
//! on the same numeric codes.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireErrorKind {
    AuthFailed,
    Cancelled,
    ResetFailed,
    UnknownConnection,
    NotLeased,
    MethodNotAllowed,
    BadRequest,
    Internal,
}

impl WireErrorKind {
    /// The numeric code used on the wire (§6/§7), chosen to echo familiar
    /// HTTP status semantics without implying this is HTTP.
    pub fn code(self) -> u16 {
        match self {
            WireErrorKind::AuthFailed => 401,
            WireErrorKind::Cancelled => 408,
            WireErrorKind::ResetFailed => 500,
            WireErrorKind::UnknownConnection => 400,
            WireErrorKind::NotLeased => 400,
            WireErrorKind::MethodNotAllowed => 405,
            WireErrorKind::BadRequest => 400,
            WireErrorKind::Internal => 500,
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        Some(match code {
            401 => WireErrorKind::AuthFailed,
            408 => WireErrorKind::Cancelled,
            400 => WireErrorKind::BadRequest,
            405 => WireErrorKind::MethodNotAllowed,
            500 => WireErrorKind::Internal,
            _ => return None,
        })
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{kind:?}: {message}")]
pub struct WireError {
    pub kind: WireErrorKind,
    pub message: String,
}

impl WireError {
    pub fn new(kind: WireErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn code(&self) -> u16 {
        self.kind.code()
    }
}
