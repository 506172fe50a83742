//! Router transport facade.
//!
//! Routing switch plus credential lookup: every call opens what it needs,
//! does one operation, and tears down again. FTP routers get a fresh
//! `FtpSession` per call; TR-064 routers share one HTTP client and the
//! profile's digest cache.

use crate::error::{TransportError, TransportResult};
use crate::profile::{CredentialStore, RouterProfile, FTP_PASSWORD_KEY, LOGIN_PASSWORD_KEY};
use rtr_ftp::{FtpResult, FtpSession};
use rtr_tr64::{DigestClient, HttpSoapTransport, SoapRequest, SoapResponse, SoapTransport};
use std::sync::Arc;

pub struct RouterTransport {
    profile: RouterProfile,
    credentials: Arc<dyn CredentialStore>,
    soap: Arc<dyn SoapTransport>,
}

impl RouterTransport {
    /// Facade over a reqwest-backed SOAP transport built from the profile.
    pub fn new(
        profile: RouterProfile,
        credentials: Arc<dyn CredentialStore>,
    ) -> TransportResult<Self> {
        profile.validate()?;
        let soap = HttpSoapTransport::from_config(&profile.tr64_config(String::new()))?;
        Ok(Self::with_soap_transport(profile, credentials, Arc::new(soap)))
    }

    pub fn with_soap_transport(
        profile: RouterProfile,
        credentials: Arc<dyn CredentialStore>,
        soap: Arc<dyn SoapTransport>,
    ) -> Self {
        Self {
            profile,
            credentials,
            soap,
        }
    }

    pub fn profile(&self) -> &RouterProfile {
        &self.profile
    }

    // ─── Files ───────────────────────────────────────────────────

    /// Download a file. `Ok(None)` when the router refuses it.
    pub async fn fetch_file(&self, path: &str) -> TransportResult<Option<Vec<u8>>> {
        if !self.profile.needs_ftp {
            return Ok(Some(self.digest_client().fetch(path).await?));
        }

        let mut session = self.open_ftp().await?;
        let result = passive_download(&mut session, path).await;
        self.close_ftp(session).await;
        Ok(result?)
    }

    /// Upload `data` to `path` (directory and file name).
    pub async fn store_file(&self, path: &str, data: &[u8]) -> TransportResult<bool> {
        if !self.profile.needs_ftp {
            return Err(TransportError::Unsupported("store_file"));
        }

        let (dir, name) = split_remote_path(path);
        let mut session = self.open_ftp().await?;
        let result = session.upload_file(name, dir, data).await;
        self.close_ftp(session).await;
        Ok(result?)
    }

    pub async fn delete_file(&self, path: &str) -> TransportResult<bool> {
        if !self.profile.needs_ftp {
            return Err(TransportError::Unsupported("delete_file"));
        }

        let mut session = self.open_ftp().await?;
        let result = passive_delete(&mut session, path).await;
        self.close_ftp(session).await;
        Ok(result?)
    }

    /// Names in a remote directory (FTP routers only).
    pub async fn list_directory(&self, path: &str) -> TransportResult<Vec<String>> {
        if !self.profile.needs_ftp {
            return Err(TransportError::Unsupported("list_directory"));
        }

        let mut session = self.open_ftp().await?;
        let result = passive_list(&mut session, path).await;
        self.close_ftp(session).await;
        Ok(result?)
    }

    // ─── SOAP ────────────────────────────────────────────────────

    /// Authenticated TR-064 action.
    pub async fn invoke(&self, req: &SoapRequest) -> TransportResult<SoapResponse> {
        Ok(self.digest_client().invoke(req).await?)
    }

    /// Discover the security port; true iff the router reports one.
    pub async fn is_tr64_available(&self) -> bool {
        self.digest_client().is_available().await
    }

    // ─── Helpers ─────────────────────────────────────────────────

    fn digest_client(&self) -> DigestClient {
        let password = self
            .credentials
            .password(&self.profile.name, LOGIN_PASSWORD_KEY)
            .unwrap_or_default();
        DigestClient::new(
            self.profile.tr64_config(password),
            Arc::clone(&self.profile.auth),
            Arc::clone(&self.soap),
        )
    }

    async fn open_ftp(&self) -> TransportResult<FtpSession> {
        let user = self.profile.ftp_user.clone();
        let password = self
            .credentials
            .password(&self.profile.name, FTP_PASSWORD_KEY)
            .unwrap_or_default();

        let mut session = FtpSession::connect(self.profile.ftp_config()).await?;
        let logged_in = match session.login(&user, &password).await {
            Ok(ok) => ok,
            Err(e) => {
                self.close_ftp(session).await;
                return Err(e.into());
            }
        };
        if !logged_in {
            let code = session.last_code();
            self.close_ftp(session).await;
            return Err(TransportError::Login {
                host: self.profile.host.clone(),
                user,
                code,
            });
        }
        Ok(session)
    }

    async fn close_ftp(&self, session: FtpSession) {
        if let Err(e) = session.close().await {
            log::debug!("{}: FTP close failed: {}", self.profile.name, e);
        }
    }
}

async fn passive_download(session: &mut FtpSession, path: &str) -> FtpResult<Option<Vec<u8>>> {
    if !session.enter_passive_mode().await? {
        return Ok(None);
    }
    session.download_file(path).await
}

async fn passive_list(session: &mut FtpSession, path: &str) -> FtpResult<Vec<String>> {
    if !session.enter_passive_mode().await? {
        return Ok(Vec::new());
    }
    session.list_directory(path).await
}

// DELE needs no data channel; passive mode is negotiated anyway and its
// outcome does not gate the delete.
async fn passive_delete(session: &mut FtpSession, path: &str) -> FtpResult<bool> {
    if !session.enter_passive_mode().await? {
        log::debug!("FTP {}: no passive mode before DELE", session.id);
    }
    session.delete_file(path).await
}

/// Split `a/b/c` into (`a/b`, `c`). A bare name lands in the root.
fn split_remote_path(path: &str) -> (&str, &str) {
    path.rsplit_once('/').unwrap_or(("", path))
}
