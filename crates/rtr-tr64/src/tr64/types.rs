//! Shared types for the TR-064 crate.

use crate::tr64::xml;
use serde::{Deserialize, Serialize};

/// Ordered action arguments, emitted as `<key>value</key>` in this order.
pub type SoapParams = Vec<(String, String)>;

// ─── Request / Response ──────────────────────────────────────────────

/// One SOAP action call against a TR-064 control endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapRequest {
    /// Path segment after `/upnp/control/`, e.g. `deviceinfo`.
    pub control: String,
    pub action: String,
    /// Service type URN, e.g. `urn:dslforum-org:service:DeviceInfo:1`.
    pub service: String,
    pub params: SoapParams,
}

impl SoapRequest {
    pub fn new(
        control: impl Into<String>,
        action: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            control: control.into(),
            action: action.into(),
            service: service.into(),
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Value of the `SoapAction` HTTP header.
    pub fn soap_action(&self) -> String {
        format!("{}#{}", self.service, self.action)
    }
}

/// Raw HTTP result of a SOAP POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapResponse {
    pub status: u16,
    pub body: String,
}

impl SoapResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Text of the first element named `tag` (namespace prefix ignored).
    pub fn extract(&self, tag: &str) -> Option<String> {
        xml::extract_tag(&self.body, tag)
    }
}

/// Raw HTTP result of a file GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileResponse {
    pub status: u16,
    pub data: Vec<u8>,
}

// ─── Well-known actions ──────────────────────────────────────────────

pub mod actions {
    pub const DEVICEINFO_CONTROL: &str = "deviceinfo";
    pub const DEVICEINFO_SERVICE: &str = "urn:dslforum-org:service:DeviceInfo:1";
    pub const GET_SECURITY_PORT: &str = "GetSecurityPort";
    pub const SECURITY_PORT_OUT: &str = "NewSecurityPort";

    /// Value of `<Status>` in a response demanding (re-)authentication.
    pub const STATUS_UNAUTHENTICATED: &str = "Unauthenticated";
}

// ─── Configuration ───────────────────────────────────────────────────

/// Connection settings for one router's TR-064 interface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tr64Config {
    pub host: String,
    /// Login user; empty means `admin`.
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    /// Plain-HTTP port used for discovery calls.
    #[serde(default = "default_discovery_port")]
    pub discovery_port: u16,
    #[serde(default = "default_timeout")]
    pub timeout_sec: u64,
    /// Routers ship self-signed certificates on the security port.
    #[serde(default = "default_accept_invalid_certs")]
    pub accept_invalid_certs: bool,
}

fn default_discovery_port() -> u16 {
    49000
}
fn default_timeout() -> u64 {
    10
}
fn default_accept_invalid_certs() -> bool {
    true
}

pub const DEFAULT_LOGIN_USER: &str = "admin";

impl Tr64Config {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            username: String::new(),
            password: String::new(),
            discovery_port: default_discovery_port(),
            timeout_sec: default_timeout(),
            accept_invalid_certs: default_accept_invalid_certs(),
        }
    }

    pub fn with_credentials(
        mut self,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = user.into();
        self.password = password.into();
        self
    }

    /// User sent in `UserID`; falls back to `admin`.
    pub fn login_user(&self) -> &str {
        if self.username.is_empty() {
            DEFAULT_LOGIN_USER
        } else {
            &self.username
        }
    }
}
