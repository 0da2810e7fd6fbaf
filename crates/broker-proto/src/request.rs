//! Request line parsing and rendering (§6): whitespace-delimited fields
//! terminated by `\n`, one request per connection.

use broker_core::ConnectionDescriptor;

use crate::error::ProtoError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Acquire { secret: String, tag: String },
    Release { secret: String, connection: ConnectionDescriptor },
    ForceRelease { secret: String, connection: ConnectionDescriptor },
    ReleaseByTag { secret: String, tag: String },
    Health,
}

impl Request {
    /// Parses a single request line, with or without its trailing newline.
    pub fn parse(line: &str) -> Result<Self, ProtoError> {
        let line = line.trim_end_matches(['\n', '\r']);
        let mut parts = line.split_whitespace();
        let op = parts.next().ok_or(ProtoError::EmptyLine)?;

        match op {
            "ACQUIRE" => {
                let secret = parts.next().ok_or(ProtoError::MissingField("secret"))?.to_string();
                let tag = parts.next().unwrap_or("").to_string();
                Ok(Request::Acquire { secret, tag })
            }
            "RELEASE" => {
                let secret = parts.next().ok_or(ProtoError::MissingField("secret"))?.to_string();
                let connection = parts.next().ok_or(ProtoError::MissingField("connection"))?;
                Ok(Request::Release {
                    secret,
                    connection: ConnectionDescriptor::new(connection),
                })
            }
            "FORCE-RELEASE" => {
                let secret = parts.next().ok_or(ProtoError::MissingField("secret"))?.to_string();
                let connection = parts.next().ok_or(ProtoError::MissingField("connection"))?;
                Ok(Request::ForceRelease {
                    secret,
                    connection: ConnectionDescriptor::new(connection),
                })
            }
            "RELEASE-BY-TAG" => {
                let secret = parts.next().ok_or(ProtoError::MissingField("secret"))?.to_string();
                let tag = parts.next().unwrap_or("").to_string();
                Ok(Request::ReleaseByTag { secret, tag })
            }
            "HEALTH" => Ok(Request::Health),
            other => Err(ProtoError::UnknownOperation(other.to_string())),
        }
    }

    /// Renders the request line, `\n`-terminated. Used by `broker-client`.
    pub fn encode(&self) -> String {
        match self {
            Request::Acquire { secret, tag } => format!("ACQUIRE {secret} {tag}\n"),
            Request::Release { secret, connection } => format!("RELEASE {secret} {connection}\n"),
            Request::ForceRelease { secret, connection } => format!("FORCE-RELEASE {secret} {connection}\n"),
            Request::ReleaseByTag { secret, tag } => format!("RELEASE-BY-TAG {secret} {tag}\n"),
            Request::Health => "HEALTH\n".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_acquire() {
        let req = Request::parse("ACQUIRE shh TestA\n").unwrap();
        assert_eq!(
            req,
            Request::Acquire {
                secret: "shh".to_string(),
                tag: "TestA".to_string()
            }
        );
    }

    #[test]
    fn parses_release() {
        let req = Request::parse("RELEASE shh postgres://t@h:5432/db_0").unwrap();
        assert_eq!(
            req,
            Request::Release {
                secret: "shh".to_string(),
                connection: ConnectionDescriptor::new("postgres://t@h:5432/db_0")
            }
        );
    }

    #[test]
    fn parses_health_with_no_fields() {
        assert_eq!(Request::parse("HEALTH\n").unwrap(), Request::Health);
    }

    #[test]
    fn rejects_unknown_operation() {
        let err = Request::parse("DANCE shh\n").unwrap_err();
        assert!(matches!(err, ProtoError::UnknownOperation(op) if op == "DANCE"));
    }

    #[test]
    fn rejects_empty_line() {
        assert!(matches!(Request::parse("").unwrap_err(), ProtoError::EmptyLine));
    }

    #[test]
    fn release_without_connection_is_missing_field() {
        let err = Request::parse("RELEASE shh\n").unwrap_err();
        assert!(matches!(err, ProtoError::MissingField("connection")));
    }

    #[test]
    fn round_trips_through_encode_and_parse() {
        let req = Request::ReleaseByTag {
            secret: "shh".to_string(),
            tag: "alpha".to_string(),
        };
        assert_eq!(Request::parse(&req.encode()).unwrap(), req);
    }
}
