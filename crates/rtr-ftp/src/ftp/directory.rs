//! Directory listing (CWD + NLST).

use crate::ftp::client::FtpSession;
use crate::ftp::error::FtpResult;
use crate::ftp::types::codes;

impl FtpSession {
    /// List the names in `path`.
    ///
    /// Expects a data channel from `enter_passive_mode()`. The CWD reply is
    /// not checked; a missing directory shows up as a refused NLST. Returns
    /// an empty list unless NLST answers 150.
    pub async fn list_directory(&mut self, path: &str) -> FtpResult<Vec<String>> {
        let cwd = self.send_command(&format!("CWD {}", path)).await?;
        if !cwd.is_completion() {
            log::debug!("FTP {}: CWD {} answered {}", self.id, path, cwd.code);
        }

        let resp = self.send_command("NLST").await?;
        if resp.code != codes::OPENING_DATA {
            log::debug!("FTP {}: NLST answered {}", self.id, resp.code);
            return Ok(Vec::new());
        }

        let raw = self.drain_data_channel().await?;
        self.finish_transfer().await?;
        Ok(parse_name_list(&String::from_utf8_lossy(&raw)))
    }
}

/// Split an NLST body into names, dropping blank lines and CRs.
pub fn parse_name_list(raw: &str) -> Vec<String> {
    raw.lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty())
        .map(str::to_string)
        .collect()
}
