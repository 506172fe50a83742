//! TCP transport: opens the control connection and passive data connections.
//!
//! Both channels use the connect timeout from `FtpConnectionConfig`.

use crate::ftp::error::{FtpError, FtpErrorKind, FtpResult};
use crate::ftp::protocol::FtpCodec;
use crate::ftp::types::{FtpConnectionConfig, FtpResponse};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Establish the control connection and return a ready-to-use codec
/// **plus** the server welcome banner.
pub async fn connect(config: &FtpConnectionConfig) -> FtpResult<(FtpCodec, FtpResponse)> {
    let tcp = open_port(
        &config.host,
        config.port,
        Duration::from_secs(config.connect_timeout_sec),
    )
    .await
    .map_err(|e| match e.kind {
        FtpErrorKind::DataChannelFailed => FtpError::connection_failed(e.message),
        _ => e,
    })?;

    let mut codec = FtpCodec::from_tcp(tcp, Duration::from_secs(config.reply_timeout_sec));
    let banner = codec.read_response().await?;
    Ok((codec, banner))
}

/// Open a plain TCP connection to `host:port`.
///
/// Errors are reported as data-channel failures; the control path re-labels
/// them.
pub async fn open_port(host: &str, port: u16, connect_timeout: Duration) -> FtpResult<TcpStream> {
    let addr = format!("{}:{}", host, port);
    let tcp = timeout(connect_timeout, TcpStream::connect(&addr))
        .await
        .map_err(|_| FtpError::timeout(format!("TCP connect to {} timed out", addr)))?
        .map_err(|e| FtpError::data_channel(format!("TCP connect to {}: {}", addr, e)))?;

    tcp.set_nodelay(true).ok();
    log::debug!("connected to {}", addr);
    Ok(tcp)
}
