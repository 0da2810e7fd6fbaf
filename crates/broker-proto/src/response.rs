//! Response line parsing and rendering (§6): a status line followed by an
//! optional body line, both `\n`-terminated.

use broker_core::{WireError, WireErrorKind};

use crate::error::ProtoError;

#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// `OK\n` or `OK <body>\n` — acquire's connection descriptor, release-by-tag's
    /// count, or health's snapshot JSON, all rendered as the body string.
    Ok(Option<String>),
    Err { code: u16, message: String },
}

impl Response {
    pub fn ok_empty() -> Self {
        Response::Ok(None)
    }

    pub fn ok_body(body: impl Into<String>) -> Self {
        Response::Ok(Some(body.into()))
    }

    pub fn err(kind: WireErrorKind, message: impl Into<String>) -> Self {
        Response::Err {
            code: kind.code(),
            message: message.into(),
        }
    }

    pub fn encode(&self) -> String {
        match self {
            Response::Ok(None) => "OK\n".to_string(),
            Response::Ok(Some(body)) => format!("OK {body}\n"),
            Response::Err { code, message } => format!("ERR {code} {message}\n"),
        }
    }

    /// Parses a response line. Multi-line bodies (health's JSON) are not
    /// split across lines on the wire, so a single line suffices.
    pub fn parse(line: &str) -> Result<Self, ProtoError> {
        let line = line.trim_end_matches(['\n', '\r']);
        if let Some(rest) = line.strip_prefix("OK") {
            let rest = rest.trim_start();
            return Ok(if rest.is_empty() {
                Response::Ok(None)
            } else {
                Response::Ok(Some(rest.to_string()))
            });
        }
        if let Some(rest) = line.strip_prefix("ERR") {
            let rest = rest.trim_start();
            let (code, message) = rest.split_once(' ').unwrap_or((rest, ""));
            let code: u16 = code
                .parse()
                .map_err(|_| ProtoError::MalformedResponse(line.to_string()))?;
            return Ok(Response::Err {
                code,
                message: message.to_string(),
            });
        }
        Err(ProtoError::UnknownStatus(line.to_string()))
    }

    /// Converts an `Err` response into a typed [`WireError`] for client callers.
    pub fn into_result(self) -> Result<Option<String>, WireError> {
        match self {
            Response::Ok(body) => Ok(body),
            Response::Err { code, message } => {
                let kind = WireErrorKind::from_code(code).unwrap_or(WireErrorKind::Internal);
                Err(WireError::new(kind, message))
            }
        }
    }
}
