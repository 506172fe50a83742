//! Low-level FTP command/reply codec (RFC 959 §4).
//!
//! Handles:
//! - Sending FTP commands terminated with `\r\n`
//! - Reading single-line and multi-line replies under one deadline
//! - Parsing the 3-digit reply code

use crate::ftp::error::{FtpError, FtpResult};
use crate::ftp::types::FtpResponse;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// The FTP command/reply codec operating on split halves of the control socket.
pub struct FtpCodec {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    reply_timeout: Duration,
}

impl FtpCodec {
    /// Create a codec from a connected control stream.
    pub fn from_tcp(stream: TcpStream, reply_timeout: Duration) -> Self {
        let (rd, wr) = stream.into_split();
        Self {
            reader: BufReader::new(rd),
            writer: wr,
            reply_timeout,
        }
    }

    /// Send a raw FTP command (without trailing CRLF: we add it).
    pub async fn send_command(&mut self, cmd: &str) -> FtpResult<()> {
        let line = format!("{}\r\n", cmd);
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;
        log::trace!(">>> {}", mask_secret(cmd));
        Ok(())
    }

    /// Read one complete reply from the control channel.
    pub async fn read_response(&mut self) -> FtpResult<FtpResponse> {
        read_reply(&mut self.reader, self.reply_timeout).await
    }

    /// Send a command and return its reply.
    pub async fn execute(&mut self, cmd: &str) -> FtpResult<FtpResponse> {
        self.send_command(cmd).await?;
        self.read_response().await
    }

    /// Close the write side of the control connection.
    pub async fn shutdown(&mut self) -> FtpResult<()> {
        self.writer.shutdown().await?;
        Ok(())
    }
}

/// Read one logical reply, possibly spanning several lines.
///
/// Multi-line replies look like:
/// ```text
/// 220-Welcome to my FTP server
/// 220-This is line 2
/// 220 End of greeting
/// ```
///
/// The whole reply must arrive within `deadline`, counted from the start of
/// the call.
pub async fn read_reply<R>(reader: &mut R, deadline: Duration) -> FtpResult<FtpResponse>
where
    R: AsyncBufRead + Unpin,
{
    match timeout(deadline, read_reply_lines(reader)).await {
        Ok(result) => result,
        Err(_) => Err(FtpError::timeout(format!(
            "No complete control reply within {} ms",
            deadline.as_millis()
        ))),
    }
}

async fn read_reply_lines<R>(reader: &mut R) -> FtpResult<FtpResponse>
where
    R: AsyncBufRead + Unpin,
{
    let first = read_line_raw(reader).await?;
    let first_trimmed = trim_eol(&first);
    let code = parse_code(first_trimmed)?;
    let mut lines = vec![first_trimmed.to_string()];

    // "NNN-" opens a multi-line reply closed by the first "NNN " line.
    if first_trimmed.as_bytes().get(3) == Some(&b'-') {
        let terminator = format!("{} ", &first_trimmed[..3]);
        loop {
            let next = read_line_raw(reader).await?;
            let next_trimmed = trim_eol(&next);
            lines.push(next_trimmed.to_string());
            if next_trimmed.starts_with(&terminator) {
                break;
            }
        }
    }

    let resp = FtpResponse { code, lines };
    log::trace!(
        "<<< {} {}",
        resp.code,
        resp.lines.last().map(String::as_str).unwrap_or("")
    );
    Ok(resp)
}

/// Read a single line (including CRLF).
async fn read_line_raw<R>(reader: &mut R) -> FtpResult<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = String::new();
    let n = reader.read_line(&mut buf).await?;
    if n == 0 {
        return Err(FtpError::disconnected("Server closed connection"));
    }
    Ok(buf)
}

fn trim_eol(line: &str) -> &str {
    line.trim_end_matches(|c| c == '\r' || c == '\n')
}

/// Parse the 3-digit reply code from the start of a line.
fn parse_code(line: &str) -> FtpResult<u16> {
    let digits = line
        .get(..3)
        .filter(|d| d.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(|| FtpError::protocol_error(format!("Invalid reply line: '{}'", line)))?;
    digits
        .parse::<u16>()
        .map_err(|_| FtpError::protocol_error(format!("Invalid reply code in: '{}'", line)))
}

/// Hide the argument of `PASS` in trace output.
fn mask_secret(cmd: &str) -> &str {
    if cmd.get(..4).is_some_and(|verb| verb.eq_ignore_ascii_case("PASS")) {
        "PASS ****"
    } else {
        cmd
    }
}
