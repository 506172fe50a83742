//! TR-064 error type.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tr64Error {
    pub kind: Tr64ErrorKind,
    pub message: String,
    /// HTTP status that triggered the error, if any.
    pub status: Option<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Tr64ErrorKind {
    /// Request could not be sent or the body could not be read.
    Http,
    /// Router answered with a non-2xx status.
    HttpStatus,
    /// Credentials missing or rejected by the digest exchange.
    AuthFailed,
    /// Response lacked a required element (nonce, realm, port).
    Protocol,
    InvalidConfig,
}

pub type Tr64Result<T> = Result<T, Tr64Error>;

impl Tr64Error {
    pub fn new(kind: Tr64ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            status: None,
        }
    }

    pub fn http(msg: impl Into<String>) -> Self {
        Self::new(Tr64ErrorKind::Http, msg)
    }

    pub fn http_status(status: u16, msg: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            ..Self::new(Tr64ErrorKind::HttpStatus, msg)
        }
    }

    pub fn auth_failed(msg: impl Into<String>) -> Self {
        Self::new(Tr64ErrorKind::AuthFailed, msg)
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::new(Tr64ErrorKind::Protocol, msg)
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::new(Tr64ErrorKind::InvalidConfig, msg)
    }

    /// 401 / 403: the router refused the credentials at the HTTP level.
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self.status, Some(401) | Some(403))
    }
}

impl fmt::Display for Tr64Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(status) = self.status {
            write!(f, "[TR-064 {:?} {}] {}", self.kind, status, self.message)
        } else {
            write!(f, "[TR-064 {:?}] {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for Tr64Error {}

impl From<reqwest::Error> for Tr64Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::http(format!("Request timed out: {}", e))
        } else {
            Self::http(e.to_string())
        }
    }
}

impl From<url::ParseError> for Tr64Error {
    fn from(e: url::ParseError) -> Self {
        Self::invalid_config(format!("Invalid URL: {}", e))
    }
}

impl From<Tr64Error> for String {
    fn from(e: Tr64Error) -> String {
        e.message
    }
}
