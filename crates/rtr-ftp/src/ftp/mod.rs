//! # rtr-ftp: FTP client for router file stores
//!
//! The subset of RFC 959 / RFC 2428 a home router's FTP store needs:
//! login, passive data channels (EPSV with PASV fallback), NLST listings,
//! binary RETR/STOR, DELE.
//!
//! Architecture:
//! - `types`: config, reply and session-info structures
//! - `error`: FTP-specific error type
//! - `protocol`: command/reply codec with the multi-line reply reader
//! - `connection`: TCP connect for control and data channels
//! - `client`: `FtpSession` with connect, send_command, login, close
//! - `transfer`: passive-mode negotiation and data-channel I/O
//! - `directory`: CWD + NLST listing
//! - `file_ops`: download, upload, delete

pub mod types;
pub mod error;
pub mod protocol;
pub mod connection;
pub mod client;
pub mod transfer;
pub mod directory;
pub mod file_ops;

pub use client::FtpSession;
pub use error::{FtpError, FtpErrorKind, FtpResult};
pub use types::*;
