//! Notification listener
//!
//! Binds a local TCP address and waits for the reader to connect. Every
//! accepted connection gets its own task that reads with a short receive
//! timeout, cuts the stream into `report`/`alarm` frames, decodes them and
//! publishes the result. After a connection ends the listener goes back to
//! accepting, so a reader that reconnects is picked up again.
//!
//! # Usage Example
//! ```rust,no_run
//! use rfid_listener::{ListenerSettings, NotificationChannel, NotificationListener};
//! use tokio::sync::broadcast;
//!
//! # async fn example() -> rfid_core::RfidResult<()> {
//! let (events, mut rx) = broadcast::channel(64);
//! let listener = NotificationListener::bind(
//!     NotificationChannel::All,
//!     "0.0.0.0:10002".parse().unwrap(),
//!     ListenerSettings::default(),
//!     events,
//! )
//! .await?;
//! let event = rx.recv().await;
//! listener.stop().await;
//! # Ok(())
//! # }
//! ```

use crate::channel::NotificationChannel;
use crate::dispatch::{ack_frame, decode_frame};
use rfid_core::{ReaderEvent, RfidError, RfidResult};
use rfid_session::{Correlation, FrameBuffer, FrameScanner};
use rfid_transport::{ReadOutcome, StreamAccessor, TcpTransport};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const READ_BUFFER_SIZE: usize = 4096;

/// How long [`NotificationListener::stop`] waits for the accept task
const STOP_TIMEOUT: Duration = Duration::from_millis(500);

/// Per-listener settings
#[derive(Debug, Clone)]
pub struct ListenerSettings {
    /// Receive timeout of each read on an accepted connection
    pub receive_timeout: Duration,
    /// Answer every decoded frame with an acknowledgment
    pub ack: bool,
    /// Publish [`ReaderEvent::Debug`] traces
    pub debug: bool,
}

impl Default for ListenerSettings {
    fn default() -> Self {
        Self {
            receive_timeout: Duration::from_millis(500),
            ack: false,
            debug: false,
        }
    }
}

impl ListenerSettings {
    pub fn with_ack(mut self, ack: bool) -> Self {
        self.ack = ack;
        self
    }
}

/// A running listener for one notification channel
pub struct NotificationListener {
    channel: NotificationChannel,
    local_addr: SocketAddr,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl NotificationListener {
    /// Bind `address` and start accepting in the background
    ///
    /// # Errors
    /// Returns error if binding to the address fails
    pub async fn bind(
        channel: NotificationChannel,
        address: SocketAddr,
        settings: ListenerSettings,
        events: broadcast::Sender<ReaderEvent>,
    ) -> RfidResult<Self> {
        let listener = TcpListener::bind(address).await.map_err(|e| {
            RfidError::NoConnection(format!("Failed to bind to {}: {}", address, e))
        })?;
        let local_addr = listener.local_addr()?;
        log::info!("{} notification listener listening on {}", channel, local_addr);

        let cancel = CancellationToken::new();
        let task = tokio::spawn(accept_loop(
            listener,
            channel,
            settings,
            events,
            cancel.clone(),
        ));

        Ok(Self {
            channel,
            local_addr,
            cancel,
            task,
        })
    }

    pub fn channel(&self) -> NotificationChannel {
        self.channel
    }

    /// Address actually bound, with the real port when bound to port 0
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop accepting and close every accepted connection
    pub async fn stop(self) {
        self.cancel.cancel();
        let abort = self.task.abort_handle();
        if tokio::time::timeout(STOP_TIMEOUT, self.task).await.is_err() {
            log::warn!("{} listener did not stop in time, aborting", self.channel);
            abort.abort();
        }
        log::info!("{} notification listener on {} stopped", self.channel, self.local_addr);
    }
}

async fn accept_loop(
    listener: TcpListener,
    channel: NotificationChannel,
    settings: ListenerSettings,
    events: broadcast::Sender<ReaderEvent>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => break,

            accepted = listener.accept() => match accepted {
                Ok((stream, peer_addr)) => {
                    log::info!("{} listener accepted connection from {}", channel, peer_addr);
                    let connection = Connection {
                        channel,
                        settings: settings.clone(),
                        events: events.clone(),
                        peer_addr,
                    };
                    tokio::spawn(connection.run(stream, cancel.child_token()));
                }
                Err(e) => {
                    log::error!("{} listener error accepting connection: {}", channel, e);
                }
            },
        }
    }
}

struct Connection {
    channel: NotificationChannel,
    settings: ListenerSettings,
    events: broadcast::Sender<ReaderEvent>,
    peer_addr: SocketAddr,
}

impl Connection {
    async fn run(self, stream: TcpStream, cancel: CancellationToken) {
        let mut transport = TcpTransport::from_connected_stream(stream, Some(self.settings.receive_timeout));
        let mut buffer = FrameBuffer::new();
        let mut scanner = FrameScanner::push();
        let mut buf = [0u8; READ_BUFFER_SIZE];

        loop {
            let read = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                read = transport.poll_read(&mut buf) => read,
            };

            match read {
                Ok(ReadOutcome::Data(n)) => {
                    buffer.extend(&buf[..n]);
                    if let Err(e) = self.dispatch(&mut transport, &mut buffer, &mut scanner).await {
                        self.report_fault(&format!("acknowledgment failed: {}", e));
                        break;
                    }
                }
                Ok(ReadOutcome::Idle) => continue,
                Ok(ReadOutcome::Closed) => {
                    log::info!("{} connection from {} closed by reader", self.channel, self.peer_addr);
                    break;
                }
                Err(e) => {
                    self.report_fault(&format!("read failed: {}", e));
                    break;
                }
            }
        }

        if let Err(e) = transport.close().await {
            log::debug!("closing connection from {}: {}", self.peer_addr, e);
        }
    }

    async fn dispatch(
        &self,
        transport: &mut TcpTransport,
        buffer: &mut FrameBuffer,
        scanner: &mut FrameScanner,
    ) -> RfidResult<()> {
        for frame in scanner.scan(buffer, &Correlation::Discard) {
            if !self.channel.accepts(frame.kind) {
                log::debug!("{} listener ignoring {} frame", self.channel, frame.kind);
                continue;
            }
            self.trace(|| format!("Received: {}", frame));

            match decode_frame(&frame) {
                Ok(event) => {
                    // no receivers is fine
                    let _ = self.events.send(event);
                }
                Err(e) => self.report_fault(&format!("undecodable {} frame: {}", frame.kind, e)),
            }

            if self.settings.ack {
                if let Some(ack) = ack_frame(&frame, false) {
                    transport.write_all(ack.as_bytes()).await?;
                    transport.flush().await?;
                    self.trace(|| format!("Sent: {}", ack));
                }
            }
        }
        Ok(())
    }

    fn trace(&self, message: impl FnOnce() -> String) {
        if self.settings.debug {
            let _ = self.events.send(ReaderEvent::Debug(message()));
        }
    }

    fn report_fault(&self, message: &str) {
        log::warn!("{} listener, {}: {}", self.channel, self.peer_addr, message);
        self.trace(|| message.to_string());
    }
}
