//! Stateful FTP session: owns the control connection and issues commands.
//!
//! Lifecycle: `connect()` (drains the 220 greeting) → `login()` →
//! passive negotiation + transfer operations → `close()`.
//!
//! Every reply read through the session is remembered: `last_code()` and
//! `last_reply()` let callers report why an operation returned `false`.
//!
//! A failed control-channel exchange (timeout, EOF, I/O error, garbled
//! reply) leaves the reply stream at an unknown position. The session is
//! then marked out of sync and refuses further commands.

use crate::ftp::connection;
use crate::ftp::error::{FtpError, FtpResult};
use crate::ftp::protocol::FtpCodec;
use crate::ftp::types::*;
use chrono::Utc;
use tokio::net::TcpStream;
use uuid::Uuid;

/// A connected FTP session.
///
/// Holds exactly one control connection and at most one data connection.
/// All operations take `&mut self`, so a session is never driven from two
/// places at once.
pub struct FtpSession {
    pub id: String,
    codec: FtpCodec,
    pub(crate) data: Option<TcpStream>,
    pub(crate) config: FtpConnectionConfig,
    pub(crate) info: FtpSessionInfo,
    last_code: Option<u16>,
    last_reply: String,
    desynced: bool,
}

impl FtpSession {
    /// Open the control connection and read the greeting banner.
    pub async fn connect(config: FtpConnectionConfig) -> FtpResult<Self> {
        if config.host.is_empty() {
            return Err(FtpError::invalid_config("Host must not be empty"));
        }

        let session_id = Uuid::new_v4().to_string();
        let (codec, banner) = connection::connect(&config).await?;
        if banner.code != codes::SERVICE_READY {
            return Err(FtpError::protocol_error(format!(
                "Unexpected greeting: {}",
                banner.text()
            ))
            .with_code(banner.code));
        }
        log::debug!("FTP {} connected to {}:{}", session_id, config.host, config.port);

        let info = FtpSessionInfo {
            id: session_id.clone(),
            host: config.host.clone(),
            port: config.port,
            username: None,
            logged_in: false,
            server_banner: Some(banner.text()),
            connected_at: Utc::now(),
            last_activity: Utc::now(),
            bytes_uploaded: 0,
            bytes_downloaded: 0,
        };

        Ok(Self {
            id: session_id,
            codec,
            data: None,
            config,
            info,
            last_code: Some(banner.code),
            last_reply: banner.text(),
            desynced: false,
        })
    }

    // ─── Commands ────────────────────────────────────────────────

    /// Send `cmd` + CRLF and read the reply.
    ///
    /// If the reply does not arrive within `reply_timeout_sec`, a late reply
    /// could still be queued on the control stream and would be taken as the
    /// answer to the next command. After any such failure every further
    /// command fails with `Disconnected` without touching the socket; open a
    /// new session.
    pub async fn send_command(&mut self, cmd: &str) -> FtpResult<FtpResponse> {
        self.ensure_in_sync()?;
        self.forget_reply();
        let result = self.codec.execute(cmd).await;
        self.remember(result)
    }

    /// Read one more reply without sending anything (e.g. 226 after a transfer).
    pub async fn read_reply(&mut self) -> FtpResult<FtpResponse> {
        self.ensure_in_sync()?;
        self.forget_reply();
        let result = self.codec.read_response().await;
        self.remember(result)
    }

    /// False once a control-channel read or write has failed.
    pub fn is_in_sync(&self) -> bool {
        !self.desynced
    }

    fn ensure_in_sync(&self) -> FtpResult<()> {
        if self.desynced {
            return Err(FtpError::disconnected(format!(
                "Control channel to {} out of sync after an earlier failure",
                self.config.host
            )));
        }
        Ok(())
    }

    fn forget_reply(&mut self) {
        self.last_code = None;
        self.last_reply.clear();
    }

    fn remember(&mut self, result: FtpResult<FtpResponse>) -> FtpResult<FtpResponse> {
        let resp = match result {
            Ok(resp) => resp,
            Err(e) => {
                log::debug!("FTP {}: control channel out of sync: {}", self.id, e);
                self.desynced = true;
                return Err(e);
            }
        };
        self.last_code = Some(resp.code);
        self.last_reply = resp.text();
        self.touch();
        Ok(resp)
    }

    // ─── Login ───────────────────────────────────────────────────

    /// Authenticate with USER/PASS.
    ///
    /// Returns `Ok(false)` when the server refuses; the refusing code stays
    /// in `last_code()` and the control channel remains usable.
    pub async fn login(&mut self, user: &str, password: &str) -> FtpResult<bool> {
        let user_resp = self.send_command(&format!("USER {}", user)).await?;
        let logged_in = match user_resp.code {
            codes::NEED_PASSWORD => {
                let pass_resp = self.send_command(&format!("PASS {}", password)).await?;
                pass_resp.code == codes::LOGGED_IN
            }
            // Already authenticated, no password required.
            codes::LOGGED_IN => true,
            _ => false,
        };

        if logged_in {
            self.info.username = Some(user.to_string());
            self.info.logged_in = true;
        } else {
            log::warn!(
                "FTP login as '{}' on {} refused: {}",
                user,
                self.info.host,
                self.last_reply
            );
        }
        Ok(logged_in)
    }

    // ─── Close ───────────────────────────────────────────────────

    /// Tear down both channels. QUIT is sent best-effort.
    pub async fn close(mut self) -> FtpResult<()> {
        self.close_data_channel();
        if !self.desynced {
            if let Err(e) = self.codec.execute("QUIT").await {
                log::debug!("FTP {}: QUIT failed: {}", self.id, e);
            }
        }
        let _ = self.codec.shutdown().await;
        log::debug!("FTP {} closed", self.id);
        Ok(())
    }

    // ─── Data channel bookkeeping ────────────────────────────────

    pub(crate) fn close_data_channel(&mut self) {
        if self.data.take().is_some() {
            log::trace!("FTP {}: dropping previous data channel", self.id);
        }
    }

    pub(crate) fn take_data_channel(&mut self) -> FtpResult<TcpStream> {
        self.data
            .take()
            .ok_or_else(|| FtpError::data_channel("No data channel open; enter passive mode first"))
    }

    pub fn has_data_channel(&self) -> bool {
        self.data.is_some()
    }

    // ─── Accessors ───────────────────────────────────────────────

    /// Code of the most recent reply; `None` if the last read failed.
    pub fn last_code(&self) -> Option<u16> {
        self.last_code
    }

    /// Raw text of the most recent reply.
    pub fn last_reply(&self) -> &str {
        &self.last_reply
    }

    pub fn info(&self) -> &FtpSessionInfo {
        &self.info
    }

    pub fn host(&self) -> &str {
        &self.config.host
    }

    pub(crate) fn touch(&mut self) {
        self.info.last_activity = Utc::now();
    }
}
