// src/events/qubes.rs

//! Event source backed by the Qubes admin API (`admin.Events`).
//!
//! In dom0 the source talks to qubesd over its unix socket. Inside a VM the
//! socket does not exist and the call goes through `qrexec-client-vm`
//! instead. Either way the response is the stream decoded by [`codec`].
//!
//! [`codec`]: super::codec

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::errors::{CallbackdError, Result};

use super::codec::read_event;
use super::handlers::HandlerRegistry;
use super::{EventHandler, EventOccurrence, EventSource, CONNECTION_ESTABLISHED};

/// Location of the qubesd socket in dom0.
pub const DEFAULT_QUBESD_SOCKET: &str = "/var/run/qubesd.sock";

/// Admin API method streaming events.
pub const EVENTS_METHOD: &str = "admin.Events";

/// Destination meaning "the whole system" (events of every VM).
pub const DEFAULT_DEST: &str = "dom0";

/// How to reach qubesd.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    /// Direct connection to the qubesd unix socket (dom0).
    Socket(PathBuf),
    /// `qrexec-client-vm <dest> admin.Events` (inside a VM).
    Qrexec,
}

impl Transport {
    /// Use the given socket, else the default socket if it exists, else qrexec.
    pub fn detect(socket: Option<PathBuf>) -> Self {
        match socket {
            Some(path) => Transport::Socket(path),
            None => {
                let default = PathBuf::from(DEFAULT_QUBESD_SOCKET);
                if default.exists() {
                    Transport::Socket(default)
                } else {
                    Transport::Qrexec
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct QubesSourceOptions {
    pub transport: Transport,
    /// Whose events to receive; `dom0` means all of them.
    pub dest: String,
    /// Reconnect after transport failures and end of stream.
    pub reconnect: bool,
    pub reconnect_delay: Duration,
}

impl Default for QubesSourceOptions {
    fn default() -> Self {
        Self {
            transport: Transport::detect(None),
            dest: DEFAULT_DEST.to_string(),
            reconnect: true,
            reconnect_delay: Duration::from_secs(1),
        }
    }
}

/// An open event stream. Holding the child keeps the qrexec call alive;
/// it is killed when the connection is dropped.
struct Connection {
    reader: BufReader<Box<dyn AsyncRead + Unpin + Send>>,
    _child: Option<Child>,
}

#[derive(Debug)]
pub struct QubesEventSource {
    options: QubesSourceOptions,
    handlers: HandlerRegistry,
}

impl QubesEventSource {
    pub fn new(options: QubesSourceOptions) -> Self {
        Self {
            options,
            handlers: HandlerRegistry::new(),
        }
    }

    async fn listen(&self) -> Result<()> {
        loop {
            match self.listen_once().await {
                Ok(()) => {
                    info!("qubesd closed the event stream");
                    if !self.options.reconnect {
                        return Ok(());
                    }
                }
                Err(err) => {
                    if !self.options.reconnect {
                        return Err(err);
                    }
                    warn!(
                        error = %err,
                        "Failed to connect to qubesd, reconnecting in {:?}",
                        self.options.reconnect_delay
                    );
                }
            }
            tokio::time::sleep(self.options.reconnect_delay).await;
        }
    }

    /// One connection: announce it, then dispatch events until the stream
    /// ends or fails.
    async fn listen_once(&self) -> Result<()> {
        let mut connection = self.connect().await?;
        info!(transport = ?self.options.transport, dest = %self.options.dest, "connected to qubesd");

        self.handlers
            .dispatch(&EventOccurrence::new(None, CONNECTION_ESTABLISHED));

        while let Some(occurrence) = read_event(&mut connection.reader).await? {
            debug!(
                subject = occurrence.subject.as_deref().unwrap_or("-"),
                event = %occurrence.name,
                "received event"
            );
            self.handlers.dispatch(&occurrence);
        }
        Ok(())
    }

    async fn connect(&self) -> Result<Connection> {
        match &self.options.transport {
            Transport::Socket(path) => connect_socket(path, &self.options.dest).await,
            Transport::Qrexec => connect_qrexec(&self.options.dest),
        }
    }
}

impl EventSource for QubesEventSource {
    fn add_handler(&mut self, pattern: &str, handler: EventHandler) -> Result<()> {
        self.handlers.add(pattern, handler)
    }

    fn listen_for_events(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(self.listen())
    }
}

/// Request bytes for an admin call over the qubesd socket:
/// `<source>\0<method>\0<dest>\0<arg>\0`.
pub fn socket_request(dest: &str) -> Vec<u8> {
    let mut request = Vec::new();
    for field in ["dom0", EVENTS_METHOD, dest, ""] {
        request.extend_from_slice(field.as_bytes());
        request.push(0);
    }
    request
}

#[cfg(unix)]
async fn connect_socket(path: &std::path::Path, dest: &str) -> Result<Connection> {
    use tokio::io::AsyncWriteExt;
    use tokio::net::UnixStream;

    let mut stream = UnixStream::connect(path).await?;
    stream.write_all(&socket_request(dest)).await?;
    stream.shutdown().await?;

    let reader: Box<dyn AsyncRead + Unpin + Send> = Box::new(stream);
    Ok(Connection {
        reader: BufReader::new(reader),
        _child: None,
    })
}

#[cfg(not(unix))]
async fn connect_socket(path: &std::path::Path, _dest: &str) -> Result<Connection> {
    Err(CallbackdError::ConfigError(format!(
        "unix socket {} is not supported on this platform",
        path.display()
    )))
}

fn connect_qrexec(dest: &str) -> Result<Connection> {
    let mut child = Command::new("qrexec-client-vm")
        .arg(dest)
        .arg(EVENTS_METHOD)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()?;

    let stdout = child.stdout.take().ok_or_else(|| {
        CallbackdError::ListenerError("qrexec-client-vm stdout was not captured".to_string())
    })?;

    let reader: Box<dyn AsyncRead + Unpin + Send> = Box::new(stdout);
    Ok(Connection {
        reader: BufReader::new(reader),
        _child: Some(child),
    })
}

#[cfg(all(test, unix))]
mod tests {
    use std::sync::{Arc, Mutex};

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::UnixListener;

    use super::*;

    fn options(path: PathBuf, reconnect: bool) -> QubesSourceOptions {
        QubesSourceOptions {
            transport: Transport::Socket(path),
            dest: DEFAULT_DEST.to_string(),
            reconnect,
            reconnect_delay: Duration::from_millis(10),
        }
    }

    #[test]
    fn request_names_method_and_destination() {
        assert_eq!(socket_request("work"), b"dom0\0admin.Events\0work\0\0".to_vec());
    }

    #[test]
    fn explicit_socket_wins_detection() {
        let path = PathBuf::from("/tmp/does-not-matter.sock");
        assert_eq!(Transport::detect(Some(path.clone())), Transport::Socket(path));
    }

    #[tokio::test]
    async fn streams_events_to_matching_handlers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qubesd.sock");
        let listener = UnixListener::bind(&path).unwrap();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            stream.read_to_end(&mut request).await.unwrap();
            stream
                .write_all(b"1\0work\0domain-start\0start_guid\0abc\0\01\0work\0domain-paused\0\0")
                .await
                .unwrap();
            request
        });

        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut source = QubesEventSource::new(options(path, false));
        let log = Arc::clone(&seen);
        source
            .add_handler(
                "*",
                Box::new(move |occ: &EventOccurrence| {
                    log.lock()
                        .unwrap()
                        .push((occ.subject.clone(), occ.name.clone()))
                }),
            )
            .unwrap();

        source.listen_for_events().await.unwrap();

        assert_eq!(server.await.unwrap(), socket_request(DEFAULT_DEST));
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                (None, CONNECTION_ESTABLISHED.to_string()),
                (Some("work".to_string()), "domain-start".to_string()),
                (Some("work".to_string()), "domain-paused".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn transport_error_surfaces_without_reconnect() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = QubesEventSource::new(options(dir.path().join("missing.sock"), false));

        let err = source.listen_for_events().await.unwrap_err();
        assert!(matches!(err, CallbackdError::IoError(_)));
    }

    #[tokio::test]
    async fn reconnects_after_the_stream_ends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qubesd.sock");
        let listener = UnixListener::bind(&path).unwrap();

        let connections = Arc::new(Mutex::new(0usize));
        let mut source = QubesEventSource::new(options(path, true));
        let counter = Arc::clone(&connections);
        source
            .add_handler(
                CONNECTION_ESTABLISHED,
                Box::new(move |_: &EventOccurrence| *counter.lock().unwrap() += 1),
            )
            .unwrap();

        let listening = tokio::spawn(async move { source.listen_for_events().await });

        for _ in 0..2 {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            stream.read_to_end(&mut request).await.unwrap();
            drop(stream);
        }
        // Third connection proves the source came back twice.
        let (_stream, _) = listener.accept().await.unwrap();

        listening.abort();
        assert!(listening.await.unwrap_err().is_cancelled());
        assert!(*connections.lock().unwrap() >= 2);
    }
}
