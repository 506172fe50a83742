mod common;

use common::*;
use router_transport::ftp::{FtpConnectionConfig, FtpErrorKind, FtpSession};
use router_transport::{MemoryCredentialStore, RouterProfile, RouterTransport, TransportError};
use std::sync::Arc;

fn config_for(server: &MockFtpServer) -> FtpConnectionConfig {
    FtpConnectionConfig::new("127.0.0.1").with_port(server.addr.port())
}

async fn logged_in(server: &MockFtpServer) -> FtpSession {
    let mut session = FtpSession::connect(config_for(server)).await.unwrap();
    assert!(session.login(FTP_USER, FTP_PASS).await.unwrap());
    session
}

fn sample(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

// ── Session level ────────────────────────────────────────────────────

#[tokio::test]
async fn test_connect_reads_multiline_banner() {
    let server = MockFtpServer::start().await;
    let session = FtpSession::connect(config_for(&server)).await.unwrap();

    assert_eq!(session.last_code(), Some(220));
    let banner = session.info().server_banner.clone().unwrap();
    assert!(banner.contains("Welcome to the mock router"));
    assert!(banner.contains("FTP server ready"));
    session.close().await.unwrap();
}

#[tokio::test]
async fn test_upload_then_download_round_trip() {
    let server = MockFtpServer::start().await;
    let mut session = logged_in(&server).await;

    // Larger than one 64 KiB chunk.
    let payload = sample(200_000);
    assert!(session
        .upload_file("fax.pdf", "/USB/FRITZ/faxbox/", &payload)
        .await
        .unwrap());
    assert_eq!(session.last_code(), Some(226));
    assert_eq!(server.get("/USB/FRITZ/faxbox/fax.pdf").as_deref(), Some(&payload[..]));

    assert!(session.enter_passive_mode().await.unwrap());
    let back = session
        .download_file("/USB/FRITZ/faxbox/fax.pdf")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(back, payload);
    // The 226 after the data was consumed.
    assert_eq!(session.last_code(), Some(226));

    assert_eq!(session.info().bytes_uploaded, 200_000);
    assert_eq!(session.info().bytes_downloaded, 200_000);
    session.close().await.unwrap();
}

#[tokio::test]
async fn test_empty_file_round_trip() {
    let server = MockFtpServer::start().await;
    let mut session = logged_in(&server).await;

    assert!(session.upload_file("empty", "/tmp", &[]).await.unwrap());
    assert!(session.enter_passive_mode().await.unwrap());
    assert_eq!(session.download_file("/tmp/empty").await.unwrap(), Some(Vec::new()));
}

#[tokio::test]
async fn test_pasv_fallback_when_epsv_refused() {
    let server = MockFtpServer::start_with(ServerOptions {
        epsv: false,
        ..ServerOptions::default()
    }).await;
    server.put("/voicebox/meta0", b"voicebox index");
    let mut session = logged_in(&server).await;

    assert!(session.enter_passive_mode().await.unwrap());
    assert_eq!(session.last_code(), Some(227));
    let data = session.download_file("/voicebox/meta0").await.unwrap();
    assert_eq!(data.as_deref(), Some(&b"voicebox index"[..]));
}

#[tokio::test]
async fn test_passive_mode_refused() {
    let server = MockFtpServer::start_with(ServerOptions {
        epsv: false,
        pasv: false,
        ..ServerOptions::default()
    }).await;
    let mut session = logged_in(&server).await;

    assert!(!session.enter_passive_mode().await.unwrap());
    assert_eq!(session.last_code(), Some(502));
    assert!(!session.has_data_channel());
    // Uploads need a data channel, so they fail as a value too.
    assert!(!session.upload_file("x", "/", b"x").await.unwrap());
}

#[tokio::test]
async fn test_upload_cut_off_mid_transfer() {
    const LIMIT: usize = 100_000;
    let server = MockFtpServer::start_with(ServerOptions {
        stor_limit: Some(LIMIT),
        ..ServerOptions::default()
    })
    .await;
    let mut session = logged_in(&server).await;

    // Far more than the socket buffers hold, so writes fail after the reset.
    let payload = sample(16 * 1024 * 1024);
    let err = session
        .upload_file("rec.0.000", "/USB/FRITZ/voicebox/rec", &payload)
        .await
        .unwrap_err();
    assert_eq!(err.kind, FtpErrorKind::PartialTransfer);

    let progress = err
        .message
        .strip_prefix("Upload aborted after ")
        .and_then(|rest| rest.split_once(" of "))
        .unwrap();
    let written: usize = progress.0.parse().unwrap();
    assert!(written < payload.len());
    assert!(progress.1.starts_with(&format!("{} bytes", payload.len())));

    // The truncated file is left in place, no rollback.
    let stored = server.get("/USB/FRITZ/voicebox/rec/rec.0.000").unwrap();
    assert_eq!(stored.len(), LIMIT);
    assert_eq!(stored, payload[..LIMIT]);

    // The 426 was consumed; the control channel is still usable.
    assert_eq!(session.last_code(), Some(426));
    assert!(session.is_in_sync());
    assert_eq!(session.send_command("TYPE I").await.unwrap().code, 200);
}

#[tokio::test]
async fn test_download_missing_file_is_none() {
    let server = MockFtpServer::start().await;
    let mut session = logged_in(&server).await;

    assert!(session.enter_passive_mode().await.unwrap());
    assert_eq!(session.download_file("/nope").await.unwrap(), None);
    assert_eq!(session.last_code(), Some(550));
}

#[tokio::test]
async fn test_delete_missing_file_returns_false() {
    let server = MockFtpServer::start().await;
    let mut session = logged_in(&server).await;

    assert!(!session.delete_file("/does/not/exist").await.unwrap());
    let code = session.last_code().unwrap();
    assert_ne!(code, 250);
    assert_eq!(code, 550);
}

#[tokio::test]
async fn test_delete_existing_file() {
    let server = MockFtpServer::start().await;
    server.put("/faxbox/old.pdf", b"%PDF");
    let mut session = logged_in(&server).await;

    assert!(session.delete_file("/faxbox/old.pdf").await.unwrap());
    assert_eq!(server.get("/faxbox/old.pdf"), None);
}

#[tokio::test]
async fn test_empty_password_rejected_session_still_usable() {
    let server = MockFtpServer::start().await;
    let mut session = FtpSession::connect(config_for(&server)).await.unwrap();

    assert!(!session.login(FTP_USER, "").await.unwrap());
    assert_eq!(session.last_code(), Some(530));
    assert!(!session.info().logged_in);

    // Control channel still in sync.
    assert!(session.login(FTP_USER, FTP_PASS).await.unwrap());
    assert_eq!(session.last_code(), Some(230));
    let resp = session.send_command("TYPE I").await.unwrap();
    assert_eq!(resp.code, 200);
}

#[tokio::test]
async fn test_login_without_password_step() {
    let server = MockFtpServer::start().await;
    let mut session = FtpSession::connect(config_for(&server)).await.unwrap();

    assert!(session.login(GUEST_USER, "").await.unwrap());
    assert_eq!(session.info().username.as_deref(), Some(GUEST_USER));
}

#[tokio::test]
async fn test_list_directory() {
    let server = MockFtpServer::start().await;
    server.put("/USB/FRITZ/faxbox/a.pdf", b"a");
    server.put("/USB/FRITZ/faxbox/b.pdf", b"b");
    server.put("/USB/FRITZ/voicebox/meta0", b"m");
    let mut session = logged_in(&server).await;

    assert!(session.enter_passive_mode().await.unwrap());
    let names = session.list_directory("/USB/FRITZ/faxbox").await.unwrap();
    assert_eq!(names, vec!["a.pdf", "b.pdf"]);

    // Control channel resynchronised: next command gets its own reply.
    assert_eq!(session.send_command("TYPE I").await.unwrap().code, 200);
}

#[tokio::test]
async fn test_reply_timeout_clears_code() {
    let addr = start_silent_server().await;
    let mut cfg = FtpConnectionConfig::new("127.0.0.1").with_port(addr.port());
    cfg.reply_timeout_sec = 1;
    let mut session = FtpSession::connect(cfg).await.unwrap();

    let err = session.send_command("NOOP").await.unwrap_err();
    assert_eq!(err.kind, FtpErrorKind::Timeout);
    assert_eq!(session.last_code(), None);
    assert!(!session.is_in_sync());

    // A late reply would be mistaken for this one, so the session refuses.
    let started = std::time::Instant::now();
    let err = session.send_command("TYPE I").await.unwrap_err();
    assert_eq!(err.kind, FtpErrorKind::Disconnected);
    assert!(started.elapsed() < std::time::Duration::from_millis(500));
    assert_eq!(session.last_code(), None);
    session.close().await.unwrap();
}

#[tokio::test]
async fn test_session_in_sync_after_refusals() {
    let server = MockFtpServer::start().await;
    let mut session = logged_in(&server).await;

    assert!(!session.delete_file("/missing").await.unwrap());
    assert!(session.is_in_sync());
    assert_eq!(session.send_command("TYPE I").await.unwrap().code, 200);
}

#[tokio::test]
async fn test_connect_refused() {
    // Bind and drop to get a port nobody listens on.
    let port = {
        let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        l.local_addr().unwrap().port()
    };
    let err = FtpSession::connect(FtpConnectionConfig::new("127.0.0.1").with_port(port))
        .await
        .err()
        .unwrap();
    assert_eq!(err.kind, FtpErrorKind::ConnectionFailed);
}

// ── Facade over FTP ──────────────────────────────────────────────────

fn ftp_transport(server: &MockFtpServer, password: &str) -> RouterTransport {
    let mut profile = RouterProfile::new("home", "127.0.0.1");
    profile.needs_ftp = true;
    profile.ftp_user = FTP_USER.to_string();
    profile.ftp.port = server.addr.port();

    let store = MemoryCredentialStore::new();
    store.set_password("home", "ftp-password", password);
    RouterTransport::new(profile, Arc::new(store)).unwrap()
}

#[tokio::test]
async fn test_facade_store_fetch_list_delete() {
    let server = MockFtpServer::start().await;
    let transport = ftp_transport(&server, FTP_PASS);

    let journal = b"Typ;Datum;Name\n1;01.01.24 12:00;Anna\n".to_vec();
    assert!(transport
        .store_file("/USB/FRITZ/journal.csv", &journal)
        .await
        .unwrap());

    let fetched = transport.fetch_file("/USB/FRITZ/journal.csv").await.unwrap();
    assert_eq!(fetched, Some(journal));

    let names = transport.list_directory("/USB/FRITZ").await.unwrap();
    assert_eq!(names, vec!["journal.csv"]);

    assert!(transport.delete_file("/USB/FRITZ/journal.csv").await.unwrap());
    assert!(!transport.delete_file("/USB/FRITZ/journal.csv").await.unwrap());
    assert_eq!(transport.fetch_file("/USB/FRITZ/journal.csv").await.unwrap(), None);
}

#[tokio::test]
async fn test_facade_login_failure() {
    let server = MockFtpServer::start().await;
    let transport = ftp_transport(&server, "wrong");

    match transport.fetch_file("/any").await {
        Err(TransportError::Login { code, user, .. }) => {
            assert_eq!(code, Some(530));
            assert_eq!(user, FTP_USER);
        }
        other => panic!("expected login error, got {:?}", other),
    }
}
