//! SSH command execution for network devices.
//!
//! Structurally the same state machine as the HTTP client applied to a
//! connection: open, authenticate, run one command (or an ordered config
//! sequence followed by a persist command), capture text output, close
//! unconditionally. Connection and authentication failures are classified
//! distinctly from command failures so callers never retry bad credentials.
//!
//! The `ssh2` API is synchronous, so all work runs on the blocking thread
//! pool via `tokio::task::spawn_blocking`.

use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::ClientError;
use crate::redact::{mask, Redactor};

/// Connection settings for a device family. Credentials come from the
/// environment only — tool parameters never carry passwords.
#[derive(Clone, Debug)]
pub struct SshConfig {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub connect_timeout: Duration,
    /// Read timeout doubles as the "no more output" cutoff for shell reads.
    pub read_timeout: Duration,
}

impl SshConfig {
    pub fn new(username: String, password: String) -> Self {
        Self {
            username,
            password,
            port: 22,
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30),
        }
    }
}

/// Seam over an authenticated device session. The production implementation
/// wraps `ssh2`; tests substitute a mock to verify the close-exactly-once
/// guarantee.
pub trait DeviceSession {
    /// Run a single exec-channel command and capture its output.
    fn run(&mut self, command: &str) -> Result<String, ClientError>;
    /// Send an ordered configuration sequence plus the persist command over
    /// a shell channel and capture the transcript.
    fn send_config(&mut self, commands: &[String]) -> Result<String, ClientError>;
    /// Release the connection. Must be idempotent.
    fn close(&mut self);
}

/// Run `f` against the session and close it on every exit path.
fn with_session<S: DeviceSession, T>(
    mut session: S,
    f: impl FnOnce(&mut S) -> Result<T, ClientError>,
) -> Result<T, ClientError> {
    let result = f(&mut session);
    session.close();
    result
}

/// Execute one show-style command on a device.
pub async fn run_command(
    host: String,
    command: String,
    config: SshConfig,
    redactor: Redactor,
) -> Result<String, ClientError> {
    info!(
        host,
        user = config.username,
        pwd = mask(&config.password),
        "connecting to device to execute command"
    );
    tokio::task::spawn_blocking(move || {
        let session = Ssh2Session::connect(&host, &config, &redactor)?;
        with_session(session, |s| s.run(&command))
    })
    .await
    .map_err(|_| ClientError::Transport("SSH worker task failed".into()))?
}

/// Apply an ordered configuration sequence to a device, then persist it
/// with `write memory`.
pub async fn run_config(
    host: String,
    commands: Vec<String>,
    config: SshConfig,
    redactor: Redactor,
) -> Result<String, ClientError> {
    info!(
        host,
        user = config.username,
        pwd = mask(&config.password),
        "connecting to device for configuration"
    );
    tokio::task::spawn_blocking(move || {
        let session = Ssh2Session::connect(&host, &config, &redactor)?;
        with_session(session, |s| s.send_config(&commands))
    })
    .await
    .map_err(|_| ClientError::Transport("SSH worker task failed".into()))?
}

/// `ssh2`-backed device session.
pub struct Ssh2Session {
    session: ssh2::Session,
    redactor: Redactor,
    closed: bool,
}

impl Ssh2Session {
    /// TCP connect, SSH handshake, password authentication.
    ///
    /// TCP/handshake failures are transport errors; a rejected credential is
    /// an authentication error — the caller must not retry those.
    pub fn connect(
        host: &str,
        config: &SshConfig,
        redactor: &Redactor,
    ) -> Result<Self, ClientError> {
        let addr = (host, config.port)
            .to_socket_addrs()
            .map_err(|e| ClientError::Transport(format!("could not resolve {host}: {e}")))?
            .next()
            .ok_or_else(|| ClientError::Transport(format!("no address found for {host}")))?;

        let tcp = TcpStream::connect_timeout(&addr, config.connect_timeout).map_err(|e| {
            ClientError::Transport(redactor.scrub(&format!("failed to connect to {host}: {e}")))
        })?;
        tcp.set_read_timeout(Some(config.read_timeout)).ok();
        tcp.set_write_timeout(Some(config.read_timeout)).ok();

        let mut session = ssh2::Session::new()
            .map_err(|_| ClientError::Transport("failed to create SSH session".into()))?;
        session.set_tcp_stream(tcp);
        session.handshake().map_err(|e| {
            ClientError::Transport(redactor.scrub(&format!("SSH handshake with {host} failed: {e}")))
        })?;

        session
            .userauth_password(&config.username, &config.password)
            .map_err(|e| {
                ClientError::Auth(redactor.scrub(&format!(
                    "SSH authentication to {host} failed for user '{}': {e}",
                    config.username
                )))
            })?;
        if !session.authenticated() {
            return Err(ClientError::Auth(format!(
                "SSH authentication to {host} rejected"
            )));
        }

        debug!(host, "SSH session established");
        Ok(Self {
            session,
            redactor: redactor.clone(),
            closed: false,
        })
    }

    fn transport(&self, context: &str, err: &dyn std::fmt::Display) -> ClientError {
        ClientError::Transport(self.redactor.scrub(&format!("{context}: {err}")))
    }
}

impl DeviceSession for Ssh2Session {
    fn run(&mut self, command: &str) -> Result<String, ClientError> {
        let mut channel = self
            .session
            .channel_session()
            .map_err(|e| self.transport("failed to open channel", &e))?;
        channel
            .exec(command)
            .map_err(|e| self.transport("command execution failed", &e))?;

        let mut output = read_stream(&mut channel);
        let stderr = read_stream(&mut channel.stderr());
        if !stderr.is_empty() {
            if !output.is_empty() {
                output.push('\n');
            }
            output.push_str(&stderr);
        }

        channel.wait_close().ok();
        Ok(output)
    }

    fn send_config(&mut self, commands: &[String]) -> Result<String, ClientError> {
        let mut channel = self
            .session
            .channel_session()
            .map_err(|e| self.transport("failed to open channel", &e))?;
        // IOS only offers an interactive CLI over shell channels; a PTY is
        // required before the shell request is honored.
        channel
            .request_pty("vt100", None, None)
            .map_err(|e| self.transport("PTY request failed", &e))?;
        channel
            .shell()
            .map_err(|e| self.transport("shell request failed", &e))?;

        let mut script = String::from("terminal length 0\nconfigure terminal\n");
        for command in commands {
            script.push_str(command);
            script.push('\n');
        }
        script.push_str("end\nwrite memory\nexit\n");

        channel
            .write_all(script.as_bytes())
            .and_then(|()| channel.flush())
            .map_err(|e| self.transport("failed to send configuration", &e))?;
        channel.send_eof().ok();

        let transcript = read_stream(&mut channel);
        channel.wait_close().ok();
        Ok(transcript)
    }

    fn close(&mut self) {
        if !self.closed {
            self.session
                .disconnect(None, "session complete", None)
                .ok();
            self.closed = true;
        }
    }
}

/// Drain a blocking stream until EOF or the socket read timeout fires.
/// A timeout simply ends capture — partial output is still returned.
fn read_stream(stream: &mut impl Read) -> String {
    let mut collected = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        match stream.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => collected.extend_from_slice(&buf[..n]),
            Err(_) => break,
        }
    }
    String::from_utf8_lossy(&collected).into_owned()
}
