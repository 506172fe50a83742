//! Digest challenge-response client.
//!
//! One authenticated call is at most two POSTs:
//!
//! 1. Send with the cached `ClientAuth` header, or an `InitChallenge` header
//!    naming the user when nothing is cached.
//! 2. If the router answers `<Status>Unauthenticated</Status>`, answer its
//!    nonce/realm with a fresh `ClientAuth` header and send once more.
//!
//! The accepted header is cached in the router's `SharedAuthState`; any
//! failure along the way clears it.

use crate::tr64::digest::{self, lock_state, SharedAuthState};
use crate::tr64::envelope;
use crate::tr64::error::{Tr64Error, Tr64Result};
use crate::tr64::http::{HttpSoapTransport, SoapTransport};
use crate::tr64::types::*;
use std::sync::Arc;
use url::Url;

pub struct DigestClient {
    config: Tr64Config,
    auth: SharedAuthState,
    transport: Arc<dyn SoapTransport>,
}

impl DigestClient {
    pub fn new(
        config: Tr64Config,
        auth: SharedAuthState,
        transport: Arc<dyn SoapTransport>,
    ) -> Self {
        Self {
            config,
            auth,
            transport,
        }
    }

    /// Client over a reqwest client built from `config`.
    pub fn with_http(config: Tr64Config, auth: SharedAuthState) -> Tr64Result<Self> {
        let transport = HttpSoapTransport::from_config(&config)?;
        Ok(Self::new(config, auth, Arc::new(transport)))
    }

    pub fn config(&self) -> &Tr64Config {
        &self.config
    }

    pub fn auth_state(&self) -> SharedAuthState {
        Arc::clone(&self.auth)
    }

    // ─── Discovery ───────────────────────────────────────────────

    /// Ask the router for its HTTPS port over plain HTTP and remember it.
    ///
    /// Returns 0 (and stores 0) when the router does not report one.
    pub async fn discover_security_port(&self) -> Tr64Result<u16> {
        let req = SoapRequest::new(
            actions::DEVICEINFO_CONTROL,
            actions::GET_SECURITY_PORT,
            actions::DEVICEINFO_SERVICE,
        );
        let resp = self.invoke_unauthenticated(&req).await?;
        let port = resp
            .extract(actions::SECURITY_PORT_OUT)
            .and_then(|p| p.trim().parse::<u16>().ok())
            .unwrap_or(0);

        log::debug!("TR-064 {}: security port {}", self.config.host, port);
        lock_state(&self.auth).secure_port = port;
        Ok(port)
    }

    /// True iff the router reports a non-zero security port.
    pub async fn is_available(&self) -> bool {
        match self.discover_security_port().await {
            Ok(port) => port != 0,
            Err(e) => {
                log::debug!("TR-064 {} unavailable: {}", self.config.host, e);
                false
            }
        }
    }

    /// Cached security port, discovering it first if unknown.
    pub async fn security_port(&self) -> Tr64Result<u16> {
        let cached = lock_state(&self.auth).secure_port;
        let port = if cached == 0 {
            self.discover_security_port().await?
        } else {
            cached
        };
        if port == 0 {
            return Err(Tr64Error::protocol(format!(
                "{} did not report a TR-064 security port",
                self.config.host
            )));
        }
        Ok(port)
    }

    // ─── Calls ───────────────────────────────────────────────────

    /// Plain-HTTP call on the discovery port, no auth header.
    pub async fn invoke_unauthenticated(&self, req: &SoapRequest) -> Tr64Result<SoapResponse> {
        let url = self.control_url("http", self.config.discovery_port, &req.control)?;
        self.post(&url, req, None).await
    }

    /// Authenticated call on the security port.
    pub async fn invoke(&self, req: &SoapRequest) -> Tr64Result<SoapResponse> {
        let port = self.security_port().await?;
        let url = self.control_url("https", port, &req.control)?;
        let user = self.config.login_user().to_string();

        let cached = lock_state(&self.auth).auth_header.clone();
        let first_header = cached.unwrap_or_else(|| envelope::init_challenge_header(&user));

        let first = match self.post(&url, req, Some(&first_header)).await {
            Ok(resp) => resp,
            Err(e) => {
                if e.is_auth_rejection() {
                    self.clear_auth();
                }
                return Err(e);
            }
        };

        if !is_unauthenticated(&first) {
            return Ok(first);
        }

        // The header just sent was rejected.
        self.clear_auth();

        // Challenge round.
        let nonce = first
            .extract("Nonce")
            .ok_or_else(|| Tr64Error::protocol("Challenge without Nonce"))?;
        let realm = first
            .extract("Realm")
            .ok_or_else(|| Tr64Error::protocol("Challenge without Realm"))?;
        if self.config.password.is_empty() {
            return Err(Tr64Error::auth_failed(format!(
                "{} requires a password for '{}'",
                self.config.host, user
            )));
        }
        log::debug!("TR-064 {}: answering challenge for realm '{}'", self.config.host, realm);

        let response = digest::compute_response(&user, &realm, &self.config.password, &nonce);
        let auth_header = envelope::client_auth_header(&nonce, &response, &user, &realm);

        let second = match self.post(&url, req, Some(&auth_header)).await {
            Ok(resp) => resp,
            Err(e) => {
                self.clear_auth();
                return Err(e);
            }
        };

        if is_unauthenticated(&second) {
            self.clear_auth();
            log::warn!("TR-064 {}: credentials for '{}' rejected", self.config.host, user);
            return Err(Tr64Error::auth_failed(format!(
                "{} rejected the credentials for '{}'",
                self.config.host, user
            )));
        }

        lock_state(&self.auth).auth_header = Some(auth_header);
        Ok(second)
    }

    /// Download a file from the router's HTTPS interface.
    ///
    /// `path` is either an absolute URL handed out by the router or a path
    /// (with query) on the security port.
    pub async fn fetch(&self, path: &str) -> Tr64Result<Vec<u8>> {
        let url = if path.starts_with("http://") || path.starts_with("https://") {
            Url::parse(path)?
        } else {
            let port = self.security_port().await?;
            self.base_url("https", port)?.join(path)?
        };

        let resp = self.transport.get(url.as_str()).await?;
        if !(200..300).contains(&resp.status) {
            return Err(Tr64Error::http_status(
                resp.status,
                format!("GET {} failed", url),
            ));
        }
        Ok(resp.data)
    }

    // ─── Helpers ─────────────────────────────────────────────────

    async fn post(
        &self,
        url: &str,
        req: &SoapRequest,
        header: Option<&str>,
    ) -> Tr64Result<SoapResponse> {
        let body = envelope::build_envelope(req, header);
        let resp = self.transport.post(url, &req.soap_action(), body).await?;
        if !resp.is_success() {
            let detail = resp
                .extract("errorDescription")
                .or_else(|| resp.extract("faultstring"))
                .unwrap_or_else(|| format!("HTTP error {}", resp.status));
            return Err(Tr64Error::http_status(
                resp.status,
                format!("{} {}: {}", req.action, url, detail),
            ));
        }
        Ok(resp)
    }

    fn base_url(&self, scheme: &str, port: u16) -> Tr64Result<Url> {
        if self.config.host.is_empty() {
            return Err(Tr64Error::invalid_config("Host must not be empty"));
        }
        let mut url = Url::parse(&format!("{}://{}/", scheme, self.config.host))?;
        url.set_port(Some(port))
            .map_err(|_| Tr64Error::invalid_config(format!("Cannot set port on {}", url)))?;
        Ok(url)
    }

    fn control_url(&self, scheme: &str, port: u16, control: &str) -> Tr64Result<String> {
        let mut url = self.base_url(scheme, port)?;
        url.set_path(&format!("/upnp/control/{}", control));
        Ok(url.into())
    }

    fn clear_auth(&self) {
        lock_state(&self.auth).clear_auth();
    }
}

fn is_unauthenticated(resp: &SoapResponse) -> bool {
    resp.extract("Status").as_deref() == Some(actions::STATUS_UNAUTHENTICATED)
}
