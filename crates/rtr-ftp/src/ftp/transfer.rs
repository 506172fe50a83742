//! Data-channel management for FTP transfers.
//!
//! Passive mode only: `EPSV` (RFC 2428) first, `PASV` as fallback. The data
//! connection always goes to the session's own host; the address inside a
//! PASV reply is ignored because routers behind NAT often announce an
//! internal one.

use crate::ftp::client::FtpSession;
use crate::ftp::connection;
use crate::ftp::error::{FtpError, FtpResult};
use crate::ftp::types::codes;
use lazy_static::lazy_static;
use regex::Regex;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Read buffer size for data-channel downloads (32 KiB).
const READ_CHUNK: usize = 32_768;

lazy_static! {
    static ref PASV_TUPLE: Regex =
        Regex::new(r"(\d{1,3}),(\d{1,3}),(\d{1,3}),(\d{1,3}),(\d{1,3}),(\d{1,3})").unwrap();
}

impl FtpSession {
    /// Negotiate passive mode and open a fresh data channel.
    ///
    /// Any data channel left over from an earlier negotiation is dropped
    /// first. Returns `Ok(false)` if the server accepts neither `EPSV` nor
    /// `PASV`, or answers with something that carries no usable port.
    pub async fn enter_passive_mode(&mut self) -> FtpResult<bool> {
        self.close_data_channel();

        let epsv = self.send_command("EPSV").await?;
        let port = if epsv.code == codes::EXTENDED_PASSIVE_MODE {
            parse_epsv_port(&epsv.text())
        } else {
            log::debug!("FTP {}: EPSV answered {}, trying PASV", self.id, epsv.code);
            let pasv = self.send_command("PASV").await?;
            if pasv.code != codes::PASSIVE_MODE {
                return Ok(false);
            }
            parse_pasv_port(&pasv.text())
        };

        let Some(port) = port else {
            log::warn!(
                "FTP {}: no data port in passive reply '{}'",
                self.id,
                self.last_reply()
            );
            return Ok(false);
        };

        let tcp = connection::open_port(
            &self.config.host,
            port,
            Duration::from_secs(self.config.connect_timeout_sec),
        )
        .await?;
        log::debug!("FTP {}: data channel open on port {}", self.id, port);
        self.data = Some(tcp);
        Ok(true)
    }

    /// Consume the data channel, reading until the server closes it.
    pub(crate) async fn drain_data_channel(&mut self) -> FtpResult<Vec<u8>> {
        let mut stream = self.take_data_channel()?;
        read_to_end(&mut stream, self.data_timeout()).await
    }

    /// Read the completion reply that follows a transfer.
    pub(crate) async fn finish_transfer(&mut self) -> FtpResult<()> {
        let done = self.read_reply().await?;
        if done.code != codes::TRANSFER_COMPLETE {
            log::warn!(
                "FTP {}: transfer ended with {}: {}",
                self.id,
                done.code,
                done.text()
            );
        }
        Ok(())
    }

    pub(crate) fn data_timeout(&self) -> Duration {
        Duration::from_secs(self.config.data_timeout_sec)
    }
}

/// Extract the port from a 229 reply: the number between the third and
/// fourth `|`, e.g. `229 Entering Extended Passive Mode (|||51210|)`.
pub fn parse_epsv_port(text: &str) -> Option<u16> {
    text.split('|')
        .nth(3)?
        .trim()
        .parse::<u16>()
        .ok()
        .filter(|p| *p != 0)
}

/// Extract the port from a 227 reply carrying `h1,h2,h3,h4,p1,p2`.
///
/// Only the last two numbers matter; the host octets are not used.
pub fn parse_pasv_port(text: &str) -> Option<u16> {
    let caps = PASV_TUPLE.captures(text)?;
    let p1 = caps[5].parse::<u8>().ok()?;
    let p2 = caps[6].parse::<u8>().ok()?;
    let port = u16::from(p1) * 256 + u16::from(p2);
    (port != 0).then_some(port)
}

/// Read a data stream to EOF. `idle` bounds each individual read.
pub(crate) async fn read_to_end(stream: &mut TcpStream, idle: Duration) -> FtpResult<Vec<u8>> {
    let mut data = Vec::new();
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        let n = timeout(idle, stream.read(&mut buf))
            .await
            .map_err(|_| FtpError::timeout("Data channel stalled"))?
            .map_err(|e| FtpError::data_channel(format!("Data channel read: {}", e)))?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);
    }
    Ok(data)
}

/// Write `data` in `chunk_size` pieces, then flush and half-close.
///
/// A failure after the first byte leaves a truncated file on the server;
/// the error says how far the upload got.
pub(crate) async fn write_chunked(
    stream: &mut TcpStream,
    data: &[u8],
    chunk_size: usize,
    idle: Duration,
) -> FtpResult<usize> {
    let chunk_size = chunk_size.max(1);
    let total = data.len();
    let mut offset = 0;

    while offset < total {
        let end = (offset + chunk_size).min(total);
        match timeout(idle, stream.write(&data[offset..end])).await {
            Ok(Ok(0)) => {
                return Err(FtpError::partial_transfer(offset, total, "peer stopped reading"))
            }
            Ok(Ok(n)) => offset += n,
            Ok(Err(e)) => return Err(FtpError::partial_transfer(offset, total, e)),
            Err(_) => return Err(FtpError::partial_transfer(offset, total, "write timed out")),
        }
    }

    stream
        .flush()
        .await
        .map_err(|e| FtpError::partial_transfer(offset, total, e))?;
    stream
        .shutdown()
        .await
        .map_err(|e| FtpError::partial_transfer(offset, total, e))?;
    Ok(offset)
}
