//! File-level operations: download (RETR), upload (STOR), delete (DELE).
//!
//! Whole files are held in memory; router stores are small (journals,
//! voicebox metadata, fax PDFs).

use crate::ftp::client::FtpSession;
use crate::ftp::error::FtpResult;
use crate::ftp::transfer::write_chunked;
use crate::ftp::types::codes;

impl FtpSession {
    // ─── DOWNLOAD (RETR) ─────────────────────────────────────────

    /// Download a remote file over the current data channel.
    ///
    /// Returns `Ok(None)` unless RETR answers 150.
    pub async fn download_file(&mut self, path: &str) -> FtpResult<Option<Vec<u8>>> {
        self.send_command("TYPE I").await?;

        let resp = self.send_command(&format!("RETR {}", path)).await?;
        if resp.code != codes::OPENING_DATA {
            log::debug!("FTP {}: RETR {} answered {}", self.id, path, resp.code);
            return Ok(None);
        }

        let data = self.drain_data_channel().await?;
        // Resynchronise the control channel on the 226.
        self.finish_transfer().await?;

        self.info.bytes_downloaded += data.len() as u64;
        log::debug!("FTP {}: downloaded {} ({} bytes)", self.id, path, data.len());
        Ok(Some(data))
    }

    // ─── UPLOAD (STOR) ───────────────────────────────────────────

    /// Store `data` as `path/name`.
    ///
    /// Negotiates its own data channel. Any refused step returns `Ok(false)`
    /// with the refusing code in `last_code()`. A write failure mid-upload is
    /// an error and is not rolled back.
    pub async fn upload_file(&mut self, name: &str, path: &str, data: &[u8]) -> FtpResult<bool> {
        let ty = self.send_command("TYPE I").await?;
        if ty.code != codes::COMMAND_OK {
            return Ok(false);
        }

        if !self.enter_passive_mode().await? {
            return Ok(false);
        }

        let target = remote_join(path, name);
        let stor = self.send_command(&format!("STOR {}", target)).await?;
        if stor.code != codes::OPENING_DATA {
            log::debug!("FTP {}: STOR {} answered {}", self.id, target, stor.code);
            self.close_data_channel();
            return Ok(false);
        }

        let mut stream = self.take_data_channel()?;
        let (chunk_size, idle) = (self.config.chunk_size, self.data_timeout());
        let written = match write_chunked(&mut stream, data, chunk_size, idle).await {
            Ok(n) => n,
            Err(e) => {
                drop(stream);
                log::warn!("FTP {}: upload of {} failed: {}", self.id, target, e);
                // Pick up the server's 426/451 so the control channel stays in step.
                if let Ok(reply) = self.read_reply().await {
                    log::debug!("FTP {}: after aborted STOR: {}", self.id, reply.text());
                }
                return Err(e);
            }
        };
        drop(stream);

        let done = self.read_reply().await?;
        self.info.bytes_uploaded += written as u64;
        log::debug!(
            "FTP {}: stored {} ({} bytes), server said {}",
            self.id,
            target,
            written,
            done.code
        );
        Ok(done.is_completion())
    }

    // ─── DELE ────────────────────────────────────────────────────

    /// Delete a remote file. True iff the server answers 250.
    pub async fn delete_file(&mut self, path: &str) -> FtpResult<bool> {
        let resp = self.send_command(&format!("DELE {}", path)).await?;
        if resp.code != codes::FILE_ACTION_OK {
            log::debug!("FTP {}: DELE {} answered {}", self.id, path, resp.code);
            return Ok(false);
        }
        Ok(true)
    }
}

/// Join a remote directory and a file name with exactly one `/`.
pub fn remote_join(dir: &str, name: &str) -> String {
    format!("{}/{}", dir.trim_end_matches('/'), name.trim_start_matches('/'))
}
