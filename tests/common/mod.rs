//! In-process mock FTP server shared by the integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

pub const FTP_USER: &str = "ftpuser";
pub const FTP_PASS: &str = "ftppass";
/// Logs in on USER alone (230 without PASS).
pub const GUEST_USER: &str = "guest";

pub type FileTree = Arc<Mutex<BTreeMap<String, Vec<u8>>>>;

#[derive(Clone, Copy)]
pub struct ServerOptions {
    /// Answer EPSV with 229; otherwise 500 so clients fall back to PASV.
    pub epsv: bool,
    /// Answer PASV with 227; otherwise 502.
    pub pasv: bool,
    /// Reset the STOR data connection after this many bytes and answer 426.
    pub stor_limit: Option<usize>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            epsv: true,
            pasv: true,
            stor_limit: None,
        }
    }
}

pub struct MockFtpServer {
    pub addr: SocketAddr,
    pub files: FileTree,
}

impl MockFtpServer {
    pub async fn start() -> Self {
        Self::start_with(ServerOptions::default()).await
    }

    pub async fn start_with(opts: ServerOptions) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let files: FileTree = Arc::new(Mutex::new(BTreeMap::new()));

        let tree = files.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let tree = tree.clone();
                tokio::spawn(async move {
                    let _ = serve(stream, tree, opts).await;
                });
            }
        });

        Self { addr, files }
    }

    pub fn put(&self, path: &str, data: &[u8]) {
        self.files.lock().unwrap().insert(path.to_string(), data.to_vec());
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned()
    }
}

/// A server that greets and then never answers anything.
pub async fn start_silent_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let _ = stream.write_all(b"220 ready\r\n").await;
                let mut sink = Vec::new();
                let _ = stream.read_to_end(&mut sink).await;
            });
        }
    });
    addr
}

async fn reply(w: &mut OwnedWriteHalf, line: &str) -> std::io::Result<()> {
    w.write_all(format!("{}\r\n", line).as_bytes()).await
}

async fn accept_data(listener: &Option<TcpListener>) -> Option<TcpStream> {
    let listener = listener.as_ref()?;
    match timeout(Duration::from_secs(5), listener.accept()).await {
        Ok(Ok((stream, _))) => Some(stream),
        _ => None,
    }
}

fn resolve(cwd: &str, arg: &str) -> String {
    if arg.starts_with('/') {
        arg.to_string()
    } else {
        format!("{}/{}", cwd.trim_end_matches('/'), arg)
    }
}

async fn serve(stream: TcpStream, files: FileTree, opts: ServerOptions) -> std::io::Result<()> {
    let (r, mut w) = stream.into_split();
    let mut lines = BufReader::new(r).lines();

    w.write_all(b"220-Welcome to the mock router\r\n220 FTP server ready\r\n")
        .await?;

    let mut pending_user: Option<String> = None;
    let mut logged_in = false;
    let mut passive: Option<TcpListener> = None;
    let mut cwd = String::from("/");

    while let Some(line) = lines.next_line().await? {
        let (cmd, arg) = match line.split_once(' ') {
            Some((c, a)) => (c.to_ascii_uppercase(), a.to_string()),
            None => (line.to_ascii_uppercase(), String::new()),
        };

        match cmd.as_str() {
            "USER" if arg == GUEST_USER => {
                logged_in = true;
                reply(&mut w, "230 Guest login ok").await?;
            }
            "USER" => {
                pending_user = Some(arg);
                reply(&mut w, "331 Password required").await?;
            }
            "PASS" => {
                if pending_user.as_deref() == Some(FTP_USER) && arg == FTP_PASS {
                    logged_in = true;
                    reply(&mut w, "230 User logged in").await?;
                } else {
                    reply(&mut w, "530 Login incorrect").await?;
                }
            }
            "QUIT" => {
                reply(&mut w, "221 Goodbye").await?;
                break;
            }
            _ if !logged_in => reply(&mut w, "530 Not logged in").await?,
            "TYPE" => reply(&mut w, "200 Type set to I").await?,
            "EPSV" if opts.epsv => {
                let l = TcpListener::bind("127.0.0.1:0").await?;
                let port = l.local_addr()?.port();
                passive = Some(l);
                reply(&mut w, &format!("229 Entering Extended Passive Mode (|||{}|)", port)).await?;
            }
            "EPSV" => reply(&mut w, "500 EPSV not understood").await?,
            "PASV" if opts.pasv => {
                let l = TcpListener::bind("127.0.0.1:0").await?;
                let port = l.local_addr()?.port();
                passive = Some(l);
                // Deliberately announce a foreign host; clients must ignore it.
                reply(
                    &mut w,
                    &format!("227 Entering Passive Mode (10,0,0,5,{},{}).", port / 256, port % 256),
                )
                .await?;
            }
            "PASV" => reply(&mut w, "502 PASV not implemented").await?,
            "CWD" => {
                cwd = resolve(&cwd, &arg);
                reply(&mut w, "250 Directory changed").await?;
            }
            "NLST" => {
                let prefix = format!("{}/", cwd.trim_end_matches('/'));
                let names: Vec<String> = files
                    .lock()
                    .unwrap()
                    .keys()
                    .filter_map(|k| k.strip_prefix(&prefix))
                    .filter(|rest| !rest.contains('/'))
                    .map(str::to_string)
                    .collect();
                reply(&mut w, "150 Opening data connection").await?;
                if let Some(mut data) = accept_data(&passive).await {
                    for n in names {
                        data.write_all(format!("{}\r\n", n).as_bytes()).await?;
                    }
                    data.shutdown().await?;
                }
                passive = None;
                reply(&mut w, "226 Transfer complete").await?;
            }
            "RETR" => {
                let path = resolve(&cwd, &arg);
                let content = files.lock().unwrap().get(&path).cloned();
                match content {
                    Some(bytes) => {
                        reply(&mut w, "150 Opening BINARY mode data connection").await?;
                        if let Some(mut data) = accept_data(&passive).await {
                            data.write_all(&bytes).await?;
                            data.shutdown().await?;
                        }
                        passive = None;
                        reply(&mut w, "226 Transfer complete").await?;
                    }
                    None => reply(&mut w, "550 File not found").await?,
                }
            }
            "STOR" => {
                let path = resolve(&cwd, &arg);
                reply(&mut w, "150 Ok to send data").await?;
                let mut buf = Vec::new();
                let mut aborted = false;
                if let Some(mut data) = accept_data(&passive).await {
                    match opts.stor_limit {
                        Some(limit) => {
                            (&mut data).take(limit as u64).read_to_end(&mut buf).await?;
                            // Closing with unread input makes the kernel send RST.
                            drop(data);
                            aborted = true;
                        }
                        None => {
                            data.read_to_end(&mut buf).await?;
                        }
                    }
                }
                passive = None;
                files.lock().unwrap().insert(path, buf);
                if aborted {
                    reply(&mut w, "426 Connection closed; transfer aborted").await?;
                } else {
                    reply(&mut w, "226 Transfer complete").await?;
                }
            }
            "DELE" => {
                let path = resolve(&cwd, &arg);
                let removed = files.lock().unwrap().remove(&path).is_some();
                if removed {
                    reply(&mut w, "250 File deleted").await?;
                } else {
                    reply(&mut w, "550 No such file").await?;
                }
            }
            _ => reply(&mut w, "502 Command not implemented").await?,
        }
    }
    Ok(())
}
