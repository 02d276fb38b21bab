//! FTP control and data channels.
//!
//! The prober only needs four commands: log in, `CWD`, `LIST` over a passive
//! data connection, and `QUIT`. [`FtpConnector`] and [`FtpSession`] are the
//! seams used by the prober; [`TcpFtpConnector`] is the network implementation.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::config::{Config, FTP_ANONYMOUS_PASSWORD, FTP_ANONYMOUS_USER, FTP_DEFAULT_PORT, TCP_CONNECT_TIMEOUT_SECS};
use crate::error_handling::ProbeError;
use crate::locator::{Credentials, ParentKey};

/// An open, logged-in control connection.
#[async_trait]
pub trait FtpSession: Send {
    /// Changes the working directory.
    async fn cwd(&mut self, dir: &str) -> Result<(), ProbeError>;

    /// Returns the raw `LIST` output of the working directory.
    async fn list(&mut self) -> Result<String, ProbeError>;

    /// Ends the session.
    async fn quit(&mut self) -> Result<(), ProbeError>;
}

/// Opens logged-in sessions to the server named by a parent key.
#[async_trait]
pub trait FtpConnector: Send + Sync {
    /// Connects and logs in, anonymously when `credentials` is `None`.
    ///
    /// # Errors
    ///
    /// [`ProbeError::Timeout`] when the server does not answer in time; any
    /// other variant means the server cannot be used at all.
    async fn connect(
        &self,
        key: &ParentKey,
        credentials: Option<&Credentials>,
    ) -> Result<Box<dyn FtpSession>, ProbeError>;
}

/// A complete (possibly multi-line) server reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub code: u16,
    pub text: String,
}

impl Reply {
    pub fn is_preliminary(&self) -> bool {
        (100..200).contains(&self.code)
    }

    pub fn is_completion(&self) -> bool {
        (200..300).contains(&self.code)
    }

    pub fn is_intermediate(&self) -> bool {
        (300..400).contains(&self.code)
    }

    fn into_error(self, command: &str) -> ProbeError {
        ProbeError::Protocol {
            code: Some(self.code),
            message: format!("{command}: {}", self.text.trim()),
        }
    }
}

fn reply_code(line: &str) -> Option<u16> {
    let digits = line.get(..3)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Reads one reply from the control channel.
///
/// A multi-line reply opens with `NNN-` and ends at the first line starting
/// with the same code followed by a space.
pub async fn read_reply<R>(reader: &mut R) -> Result<Reply, ProbeError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    if reader.read_line(&mut line).await? == 0 {
        return Err(ProbeError::Network("control connection closed".into()));
    }

    let code = reply_code(&line)
        .ok_or_else(|| ProbeError::protocol(format!("malformed reply: {}", line.trim_end())))?;
    let mut text = line.get(4..).unwrap_or_default().to_string();

    if line.as_bytes().get(3) == Some(&b'-') {
        let terminator = format!("{code} ");
        loop {
            line.clear();
            if reader.read_line(&mut line).await? == 0 {
                return Err(ProbeError::Network("control connection closed mid-reply".into()));
            }
            let last = line.starts_with(&terminator) || line.trim_end() == code.to_string();
            text.push_str(if last { line.get(4..).unwrap_or_default() } else { &line });
            if last {
                break;
            }
        }
    }

    Ok(Reply {
        code,
        text: text.trim_end().to_string(),
    })
}

/// Extracts the data port from a `227 Entering Passive Mode (h1,h2,h3,h4,p1,p2)` reply.
///
/// The advertised address is ignored; the data connection goes to the control
/// peer, which also works behind NAT.
pub fn parse_pasv_port(text: &str) -> Option<u16> {
    let start = text.find('(')?;
    let end = text[start..].find(')')? + start;
    let fields: Vec<u16> = text[start + 1..end]
        .split(',')
        .map(|f| f.trim().parse())
        .collect::<Result<_, _>>()
        .ok()?;
    match fields.as_slice() {
        [_, _, _, _, hi, lo] if *hi <= 255 && *lo <= 255 => Some(hi * 256 + lo),
        _ => None,
    }
}

/// Encodes one control command, CRLF-terminated.
///
/// A command holding CR, LF or NUL would be split by the server into several
/// commands, so it is refused.
fn command_line(command: &str) -> Result<Vec<u8>, ProbeError> {
    if command.contains(['\r', '\n', '\0']) {
        return Err(ProbeError::protocol(format!(
            "refusing to send command with a line break: {:?}",
            command
        )));
    }
    let mut line = Vec::with_capacity(command.len() + 2);
    line.extend_from_slice(command.as_bytes());
    line.extend_from_slice(b"\r\n");
    Ok(line)
}

/// Connects to FTP servers over TCP.
#[derive(Debug, Clone)]
pub struct TcpFtpConnector {
    connect_timeout: Duration,
    io_timeout: Duration,
}

impl TcpFtpConnector {
    pub fn new(connect_timeout: Duration, io_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            io_timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let connect = Duration::from_secs(TCP_CONNECT_TIMEOUT_SECS).min(config.request_timeout());
        Self::new(connect, config.request_timeout())
    }
}

impl Default for TcpFtpConnector {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[async_trait]
impl FtpConnector for TcpFtpConnector {
    async fn connect(
        &self,
        key: &ParentKey,
        credentials: Option<&Credentials>,
    ) -> Result<Box<dyn FtpSession>, ProbeError> {
        let port = key.port.unwrap_or(FTP_DEFAULT_PORT);
        let addr = format!("{}:{}", key.host, port);

        let stream = timeout(self.connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| ProbeError::Timeout(format!("connect to {addr}")))??;
        let peer = stream.peer_addr()?.ip();
        debug!("Connected to {} ({})", addr, peer);

        let mut session = TcpFtpSession {
            control: BufReader::new(stream),
            peer,
            io_timeout: self.io_timeout,
        };

        // The greeting and login are part of connecting, so a slow server here
        // counts as a connect timeout.
        let result = timeout(self.connect_timeout, session.login(credentials))
            .await
            .map_err(|_| ProbeError::Timeout(format!("login to {addr}")));
        match result {
            Ok(Ok(())) => Ok(Box::new(session)),
            Ok(Err(e)) | Err(e) => Err(e),
        }
    }
}

struct TcpFtpSession {
    control: BufReader<TcpStream>,
    peer: IpAddr,
    io_timeout: Duration,
}

impl TcpFtpSession {
    async fn login(&mut self, credentials: Option<&Credentials>) -> Result<(), ProbeError> {
        let mut greeting = read_reply(&mut self.control).await?;
        // 120: service ready in a few minutes
        while greeting.is_preliminary() {
            greeting = read_reply(&mut self.control).await?;
        }
        if !greeting.is_completion() {
            return Err(greeting.into_error("greeting"));
        }

        let (user, pass) = match credentials {
            Some(c) => (
                c.username.as_str(),
                c.password.as_deref().unwrap_or(FTP_ANONYMOUS_PASSWORD),
            ),
            None => (FTP_ANONYMOUS_USER, FTP_ANONYMOUS_PASSWORD),
        };

        let reply = self.exchange(&format!("USER {user}")).await?;
        if reply.is_completion() {
            return Ok(());
        }
        if !reply.is_intermediate() {
            return Err(reply.into_error("USER"));
        }

        let reply = self.exchange(&format!("PASS {pass}")).await?;
        if reply.is_completion() {
            Ok(())
        } else {
            Err(reply.into_error("PASS"))
        }
    }

    async fn send(&mut self, command: &str) -> Result<(), ProbeError> {
        let line = command_line(command)?;
        let stream = self.control.get_mut();
        stream.write_all(&line).await?;
        stream.flush().await?;
        Ok(())
    }

    async fn reply(&mut self) -> Result<Reply, ProbeError> {
        Ok(timeout(self.io_timeout, read_reply(&mut self.control)).await??)
    }

    async fn exchange(&mut self, command: &str) -> Result<Reply, ProbeError> {
        self.send(command).await?;
        self.reply().await
    }

    async fn open_data_channel(&mut self) -> Result<TcpStream, ProbeError> {
        let reply = self.exchange("PASV").await?;
        if reply.code != 227 {
            return Err(reply.into_error("PASV"));
        }
        let port = parse_pasv_port(&reply.text)
            .ok_or_else(|| ProbeError::protocol(format!("unparseable PASV reply: {}", reply.text)))?;
        Ok(timeout(self.io_timeout, TcpStream::connect((self.peer, port))).await??)
    }
}

#[async_trait]
impl FtpSession for TcpFtpSession {
    async fn cwd(&mut self, dir: &str) -> Result<(), ProbeError> {
        let reply = self.exchange(&format!("CWD {dir}")).await?;
        if reply.is_completion() {
            Ok(())
        } else {
            Err(reply.into_error("CWD"))
        }
    }

    async fn list(&mut self) -> Result<String, ProbeError> {
        let mut data = self.open_data_channel().await?;

        let reply = self.exchange("LIST").await?;
        if !reply.is_preliminary() {
            return Err(reply.into_error("LIST"));
        }

        let mut raw = Vec::new();
        timeout(self.io_timeout, data.read_to_end(&mut raw)).await??;
        drop(data);

        let done = self.reply().await?;
        if !done.is_completion() {
            return Err(done.into_error("LIST"));
        }

        Ok(String::from_utf8_lossy(&raw).into_owned())
    }

    async fn quit(&mut self) -> Result<(), ProbeError> {
        self.send("QUIT").await?;
        // The server may close without answering
        let _ = timeout(self.io_timeout, read_reply(&mut self.control)).await;
        Ok(())
    }
}
