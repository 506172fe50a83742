//! Router profiles and credential lookup.
//!
//! A profile is the persisted description of one router: where it lives,
//! which users to log in as and whether it has to be driven over FTP.
//! Passwords never live in the profile; they come from a [`CredentialStore`].

use crate::error::{TransportError, TransportResult};
use rtr_ftp::FtpConnectionConfig;
use rtr_tr64::{SharedAuthState, Tr64Config};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

/// Credential-store key for the TR-064 / web login password.
pub const LOGIN_PASSWORD_KEY: &str = "login-password";
/// Credential-store key for the FTP password.
pub const FTP_PASSWORD_KEY: &str = "ftp-password";

// ─── Profile ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterProfile {
    pub name: String,
    pub host: String,
    /// Router model only offers file access over FTP.
    #[serde(default)]
    pub needs_ftp: bool,
    #[serde(default)]
    pub login_user: String,
    #[serde(default)]
    pub ftp_user: String,
    #[serde(default)]
    pub ftp: FtpOptions,
    #[serde(default)]
    pub tr64: Tr64Options,
    /// Digest header and security port, shared by every call for this router.
    #[serde(skip)]
    pub auth: SharedAuthState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FtpOptions {
    #[serde(default = "default_ftp_port")]
    pub port: u16,
    #[serde(default = "default_reply_timeout")]
    pub reply_timeout_sec: u64,
}

fn default_ftp_port() -> u16 {
    21
}
fn default_reply_timeout() -> u64 {
    5
}

impl Default for FtpOptions {
    fn default() -> Self {
        Self {
            port: default_ftp_port(),
            reply_timeout_sec: default_reply_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tr64Options {
    #[serde(default = "default_discovery_port")]
    pub discovery_port: u16,
    #[serde(default = "default_http_timeout")]
    pub timeout_sec: u64,
    #[serde(default = "default_true")]
    pub accept_invalid_certs: bool,
}

fn default_discovery_port() -> u16 {
    49000
}
fn default_http_timeout() -> u64 {
    10
}
fn default_true() -> bool {
    true
}

impl Default for Tr64Options {
    fn default() -> Self {
        Self {
            discovery_port: default_discovery_port(),
            timeout_sec: default_http_timeout(),
            accept_invalid_certs: true,
        }
    }
}

impl RouterProfile {
    pub fn new(name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            needs_ftp: false,
            login_user: String::new(),
            ftp_user: String::new(),
            ftp: FtpOptions::default(),
            tr64: Tr64Options::default(),
            auth: SharedAuthState::default(),
        }
    }

    pub fn from_json(json: &str) -> TransportResult<Self> {
        let profile: Self = serde_json::from_str(json)?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn load(path: impl AsRef<Path>) -> TransportResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| TransportError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> TransportResult<()> {
        if self.host.trim().is_empty() {
            return Err(TransportError::Config(format!(
                "profile '{}' has no host",
                self.name
            )));
        }
        Ok(())
    }

    pub fn ftp_config(&self) -> FtpConnectionConfig {
        let mut cfg = FtpConnectionConfig::new(self.host.clone()).with_port(self.ftp.port);
        cfg.reply_timeout_sec = self.ftp.reply_timeout_sec;
        cfg
    }

    pub fn tr64_config(&self, password: String) -> Tr64Config {
        let mut cfg = Tr64Config::new(self.host.clone())
            .with_credentials(self.login_user.clone(), password);
        cfg.discovery_port = self.tr64.discovery_port;
        cfg.timeout_sec = self.tr64.timeout_sec;
        cfg.accept_invalid_certs = self.tr64.accept_invalid_certs;
        cfg
    }
}

// ─── Credentials ─────────────────────────────────────────────────────

/// Source of router passwords, keyed by profile name and purpose.
pub trait CredentialStore: Send + Sync {
    fn password(&self, profile: &str, key: &str) -> Option<String>;
}

/// Process-local store, for tests and for callers without a keyring.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    secrets: RwLock<HashMap<(String, String), String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_password(&self, profile: &str, key: &str, password: impl Into<String>) {
        let mut secrets = self.secrets.write().unwrap_or_else(|e| e.into_inner());
        secrets.insert((profile.to_string(), key.to_string()), password.into());
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn password(&self, profile: &str, key: &str) -> Option<String> {
        let secrets = self.secrets.read().unwrap_or_else(|e| e.into_inner());
        secrets.get(&(profile.to_string(), key.to_string())).cloned()
    }
}
