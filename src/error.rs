//! Aggregate error for facade calls.

use rtr_ftp::FtpError;
use rtr_tr64::Tr64Error;

pub type TransportResult<T> = Result<T, TransportError>;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failure inside the FTP client (connect, timeout, data channel).
    #[error(transparent)]
    Ftp(#[from] FtpError),

    /// Failure inside the TR-064 client (HTTP, digest exchange).
    #[error(transparent)]
    Tr64(#[from] Tr64Error),

    /// The FTP server refused USER/PASS.
    #[error("FTP login as '{user}' on {host} refused (reply {code:?})")]
    Login {
        host: String,
        user: String,
        code: Option<u16>,
    },

    #[error("{0} is not available over TR-064")]
    Unsupported(&'static str),

    #[error("Invalid router profile: {0}")]
    Config(String),
}

impl From<serde_json::Error> for TransportError {
    fn from(e: serde_json::Error) -> Self {
        Self::Config(e.to_string())
    }
}

impl From<TransportError> for String {
    fn from(e: TransportError) -> String {
        e.to_string()
    }
}
