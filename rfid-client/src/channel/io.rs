//! IO task of the command channel
//!
//! One tokio task owns the transport and the carry-over buffer. Commands
//! reach it as [`Request`]s over an mpsc channel and get their result back
//! on a oneshot, so at most one read/write sequence runs on the socket at a
//! time. A request whose caller stopped waiting before its turn came is
//! dropped unsent. Between commands the task drains the connection every poll
//! interval, so reports and alarms pushed on the command connection are
//! delivered even when nobody executes anything.
//!
//! Decoded asynchronous data is queued while a command runs and published
//! on the broadcast channel after the command's result has been handed
//! back.

use rfid_core::{ReaderEvent, RfidError, RfidResult};
use rfid_listener::{ack_frame, decode_frame};
use rfid_session::{Correlation, Frame, FrameBuffer, FrameKind, FrameScanner};
use rfid_transport::{ReadOutcome, TransportLayer};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::state::ChannelState;

const READ_BUFFER_SIZE: usize = 16 * 1024;

/// Upper bound on consecutive reads of one drain
const MAX_DRAIN_READS: usize = 64;

/// A request sent from the channel handle to the IO task
pub(crate) enum Request {
    /// Write a command and wait for the reply matching `correlation`
    Execute {
        xml: String,
        correlation: Correlation,
        timeout: Duration,
        reply: oneshot::Sender<RfidResult<String>>,
    },
    /// Write without waiting for any reply
    Send {
        xml: String,
        reply: oneshot::Sender<RfidResult<()>>,
    },
}

/// Settings of the IO task, taken from the reader configuration
#[derive(Debug, Clone)]
pub(crate) struct IoSettings {
    pub poll_interval: Duration,
    pub read_timeout: Duration,
    pub drain_timeout: Duration,
    pub ack: bool,
    pub debug: bool,
}

/// Handle to the IO task
pub(crate) struct ChannelIo {
    pub tx: mpsc::Sender<Request>,
    pub cancel: CancellationToken,
    pub task: JoinHandle<()>,
}

/// Spawn the IO task for an open transport
pub(crate) fn spawn_io_task(
    transport: Box<dyn TransportLayer>,
    settings: IoSettings,
    events: broadcast::Sender<ReaderEvent>,
    state: Arc<watch::Sender<ChannelState>>,
) -> ChannelIo {
    let (tx, rx) = mpsc::channel::<Request>(32);
    let cancel = CancellationToken::new();

    let worker = IoWorker {
        transport,
        buffer: FrameBuffer::new(),
        scanner: FrameScanner::command(),
        settings,
        events,
        pending: Vec::new(),
    };
    let task = tokio::spawn(io_loop(worker, rx, cancel.clone(), state));

    ChannelIo { tx, cancel, task }
}

/// The main IO loop
///
/// Uses `tokio::select! { biased; }` to prioritize:
/// 1. Cancellation
/// 2. Command requests
/// 3. Background drain
async fn io_loop(
    mut worker: IoWorker,
    mut rx: mpsc::Receiver<Request>,
    cancel: CancellationToken,
    state: Arc<watch::Sender<ChannelState>>,
) {
    let mut ticker = tokio::time::interval(worker.settings.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                log::debug!("command channel IO task cancelled");
                break;
            }

            req = rx.recv() => {
                let lost = match req {
                    Some(Request::Execute { xml, correlation, timeout, reply }) => {
                        if reply.is_closed() {
                            log::debug!("caller gave up before its turn, not sending: {}", xml);
                            continue;
                        }
                        let result = worker.execute(&xml, &correlation, timeout).await;
                        let lost = matches!(&result, Err(e) if e.is_connection_lost());
                        let _ = reply.send(result);
                        lost
                    }
                    Some(Request::Send { xml, reply }) => {
                        if reply.is_closed() {
                            log::debug!("caller gave up before its turn, not sending: {}", xml);
                            continue;
                        }
                        let result = worker.send(&xml).await;
                        let lost = result.is_err();
                        let _ = reply.send(result);
                        lost
                    }
                    None => {
                        log::debug!("command channel handle dropped, exiting IO task");
                        break;
                    }
                };
                worker.publish_pending();
                if lost {
                    break;
                }
            }

            _ = ticker.tick() => {
                let result = worker.drain().await;
                worker.publish_pending();
                if let Err(e) = result {
                    worker.fault(&format!("background drain stopped: {}", e));
                    break;
                }
            }
        }
    }

    if let Err(e) = worker.transport.close().await {
        log::debug!("closing command connection: {}", e);
    }
    state.send_replace(ChannelState::Disconnected);
}

struct IoWorker {
    transport: Box<dyn TransportLayer>,
    buffer: FrameBuffer,
    scanner: FrameScanner,
    settings: IoSettings,
    events: broadcast::Sender<ReaderEvent>,
    pending: Vec<ReaderEvent>,
}

impl IoWorker {
    /// Write `xml` and wait for the reply accepted by `correlation`
    async fn execute(&mut self, xml: &str, correlation: &Correlation, timeout: Duration) -> RfidResult<String> {
        self.drain().await?;
        self.send(xml).await?;

        let deadline = Instant::now() + timeout;
        let mut buf = vec![0u8; READ_BUFFER_SIZE];
        loop {
            let now = Instant::now();
            if now >= deadline {
                self.trace(|| format!("No reply within {:?}", timeout));
                return Err(RfidError::NoReply(timeout));
            }
            let attempt = self.settings.read_timeout.min(deadline - now);
            self.transport.set_timeout(Some(attempt)).await?;

            match self.transport.poll_read(&mut buf).await.map_err(lost)? {
                ReadOutcome::Data(n) => {
                    self.buffer.extend(&buf[..n]);
                    if let Some(reply) = self.process(correlation).await? {
                        return Ok(reply);
                    }
                }
                ReadOutcome::Idle => continue,
                ReadOutcome::Closed => return Err(closed_by_reader()),
            }
        }
    }

    /// Write `xml` without waiting for a reply
    async fn send(&mut self, xml: &str) -> RfidResult<()> {
        self.transport.write_all(xml.as_bytes()).await.map_err(lost)?;
        self.transport.flush().await.map_err(lost)?;
        self.trace(|| format!("Sent: {}", xml));
        Ok(())
    }

    /// Read whatever is pending and decode the asynchronous frames in it
    ///
    /// Replies found here belong to no outstanding command and are dropped.
    async fn drain(&mut self) -> RfidResult<()> {
        self.transport
            .set_timeout(Some(self.settings.drain_timeout))
            .await?;
        let mut buf = vec![0u8; READ_BUFFER_SIZE];
        for _ in 0..MAX_DRAIN_READS {
            match self.transport.poll_read(&mut buf).await.map_err(lost)? {
                ReadOutcome::Data(n) => {
                    self.buffer.extend(&buf[..n]);
                    self.process(&Correlation::Discard).await?;
                }
                ReadOutcome::Idle => return Ok(()),
                ReadOutcome::Closed => return Err(closed_by_reader()),
            }
        }
        Ok(())
    }

    /// Scan the buffer; returns the first accepted reply
    ///
    /// Reports and alarms are queued for publishing and acknowledged when
    /// configured, including those behind the reply in the same read.
    async fn process(&mut self, correlation: &Correlation) -> RfidResult<Option<String>> {
        let mut reply = None;
        for frame in self.scanner.scan(&mut self.buffer, correlation) {
            self.trace(|| format!("Received: {}", frame));
            match frame.kind {
                FrameKind::Reply => {
                    if reply.is_none() {
                        reply = Some(frame.text);
                    } else {
                        log::debug!("dropping second reply in one read: {}", frame);
                    }
                }
                FrameKind::Report | FrameKind::Alarm => self.handle_async(&frame).await?,
            }
        }
        Ok(reply)
    }

    async fn handle_async(&mut self, frame: &Frame) -> RfidResult<()> {
        match decode_frame(frame) {
            Ok(event) => self.pending.push(event),
            Err(e) => self.fault(&format!("undecodable {} frame: {}", frame.kind, e)),
        }
        if self.settings.ack {
            if let Some(ack) = ack_frame(frame, true) {
                self.send(&ack).await?;
            }
        }
        Ok(())
    }

    fn publish_pending(&mut self) {
        for event in self.pending.drain(..) {
            // no receivers is fine
            let _ = self.events.send(event);
        }
    }

    fn trace(&mut self, message: impl FnOnce() -> String) {
        if self.settings.debug {
            self.pending.push(ReaderEvent::Debug(message()));
        }
    }

    fn fault(&mut self, message: &str) {
        log::warn!("command channel: {}", message);
        if self.settings.debug {
            let _ = self.events.send(ReaderEvent::Debug(message.to_string()));
        }
    }
}

fn closed_by_reader() -> RfidError {
    RfidError::NoConnection("connection closed by reader".to_string())
}

fn lost(e: RfidError) -> RfidError {
    match e {
        RfidError::Connection(io) => RfidError::NoConnection(io.to_string()),
        other => other,
    }
}
