// Shared test helpers: a scripted loopback FTP server and locator files.
//
// The server answers just enough of the protocol for the prober: login,
// CWD, PASV, LIST and QUIT. Every LIST serves the same fixed listing.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tempfile::NamedTempFile;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};

/// Handle on a running scripted FTP server.
#[allow(dead_code)] // Not every test file reads every counter
pub struct FtpFixture {
    pub port: u16,
    pub connections: Arc<AtomicUsize>,
    pub lists: Arc<AtomicUsize>,
    pub cwds: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl FtpFixture {
    pub fn url(&self, path: &str) -> String {
        format!("ftp://127.0.0.1:{}{}", self.port, path)
    }

    pub fn list_count(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

/// Starts a server on an ephemeral loopback port serving `listing` for every LIST.
#[allow(dead_code)]
pub async fn spawn_ftp_server(listing: &'static str) -> FtpFixture {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind FTP control listener");
    let port = listener.local_addr().expect("control address").port();

    let connections = Arc::new(AtomicUsize::new(0));
    let lists = Arc::new(AtomicUsize::new(0));
    let cwds = Arc::new(AtomicUsize::new(0));

    let fixture = FtpFixture {
        port,
        connections: Arc::clone(&connections),
        lists: Arc::clone(&lists),
        cwds: Arc::clone(&cwds),
    };

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            connections.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(serve_control(
                stream,
                listing,
                Arc::clone(&lists),
                Arc::clone(&cwds),
            ));
        }
    });

    fixture
}

async fn reply(out: &mut OwnedWriteHalf, line: &str) -> bool {
    out.write_all(format!("{line}\r\n").as_bytes()).await.is_ok()
}

async fn serve_control(
    stream: TcpStream,
    listing: &'static str,
    lists: Arc<AtomicUsize>,
    cwds: Arc<AtomicUsize>,
) {
    let (read, mut out) = stream.into_split();
    let mut lines = BufReader::new(read).lines();
    let mut data: Option<TcpListener> = None;

    if !reply(&mut out, "220 test archive ready").await {
        return;
    }

    while let Ok(Some(line)) = lines.next_line().await {
        let command = line
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_uppercase();
        let ok = match command.as_str() {
            "USER" => reply(&mut out, "331 Password required").await,
            "PASS" => reply(&mut out, "230 Logged in").await,
            "CWD" => {
                cwds.fetch_add(1, Ordering::SeqCst);
                reply(&mut out, "250 Directory changed").await
            }
            "PASV" => {
                let listener = TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("Failed to bind FTP data listener");
                let port = listener.local_addr().expect("data address").port();
                data = Some(listener);
                reply(
                    &mut out,
                    &format!(
                        "227 Entering Passive Mode (127,0,0,1,{},{})",
                        port / 256,
                        port % 256
                    ),
                )
                .await
            }
            "LIST" => match data.take() {
                Some(listener) => {
                    if !reply(&mut out, "150 Here comes the listing").await {
                        break;
                    }
                    if let Ok((mut conn, _)) = listener.accept().await {
                        let _ = conn.write_all(listing.as_bytes()).await;
                        let _ = conn.shutdown().await;
                    }
                    lists.fetch_add(1, Ordering::SeqCst);
                    reply(&mut out, "226 Transfer complete").await
                }
                None => reply(&mut out, "425 Use PASV first").await,
            },
            "QUIT" => {
                let _ = reply(&mut out, "221 Goodbye").await;
                break;
            }
            _ => reply(&mut out, "502 Command not implemented").await,
        };
        if !ok {
            break;
        }
    }
}

/// Writes `lines` to a temporary locator file.
#[allow(dead_code)]
pub fn locator_file(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    for line in lines {
        writeln!(file, "{line}").expect("Failed to write locator");
    }
    file.flush().expect("Failed to flush locator file");
    file
}
