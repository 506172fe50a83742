//! Shared types for the FTP crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Connection / Session ────────────────────────────────────────────

/// Configuration for a single FTP session against a router.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FtpConnectionConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// TCP connect timeout in seconds (control and data channel).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_sec: u64,
    /// Deadline for one complete control reply, measured from the start of the read.
    #[serde(default = "default_reply_timeout")]
    pub reply_timeout_sec: u64,
    /// Data-channel read/write timeout in seconds.
    #[serde(default = "default_data_timeout")]
    pub data_timeout_sec: u64,
    /// Upload chunk size in bytes.
    #[serde(default = "default_chunk")]
    pub chunk_size: usize,
}

fn default_port() -> u16 {
    21
}
fn default_connect_timeout() -> u64 {
    15
}
fn default_reply_timeout() -> u64 {
    5
}
fn default_data_timeout() -> u64 {
    30
}
fn default_chunk() -> usize {
    65_536
}

impl FtpConnectionConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

impl Default for FtpConnectionConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_port(),
            connect_timeout_sec: default_connect_timeout(),
            reply_timeout_sec: default_reply_timeout(),
            data_timeout_sec: default_data_timeout(),
            chunk_size: default_chunk(),
        }
    }
}

/// Information about an open FTP session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FtpSessionInfo {
    pub id: String,
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub logged_in: bool,
    pub server_banner: Option<String>,
    pub connected_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub bytes_uploaded: u64,
    pub bytes_downloaded: u64,
}

// ─── FTP Response ────────────────────────────────────────────────────

/// A single FTP reply (may be multi-line).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FtpResponse {
    pub code: u16,
    pub lines: Vec<String>,
}

impl FtpResponse {
    /// Full reply text (all lines joined).
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Whether this is a positive-completion reply (2xx).
    pub fn is_completion(&self) -> bool {
        (200..300).contains(&self.code)
    }
}

/// Reply codes this client acts on.
pub mod codes {
    pub const OPENING_DATA: u16 = 150;
    pub const COMMAND_OK: u16 = 200;
    pub const SERVICE_READY: u16 = 220;
    pub const TRANSFER_COMPLETE: u16 = 226;
    pub const PASSIVE_MODE: u16 = 227;
    pub const EXTENDED_PASSIVE_MODE: u16 = 229;
    pub const LOGGED_IN: u16 = 230;
    pub const FILE_ACTION_OK: u16 = 250;
    pub const NEED_PASSWORD: u16 = 331;
}
