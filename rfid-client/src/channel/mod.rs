//! Command channel
//!
//! Owns the persistent connection to the reader's command port. Commands
//! are written as `<frame><cmd>` documents and the channel waits for the
//! `reply` carrying the same id; reports and alarms arriving on the same
//! connection are published as [`ReaderEvent`]s.
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use rfid_client::{CommandChannel, ReaderConfig};
//!
//! # async fn example() -> rfid_core::RfidResult<()> {
//! let mut channel = CommandChannel::new(ReaderConfig::default())?;
//! channel.connect("192.168.0.254:10001").await?;
//! let reply = channel.heart_beat().await?;
//! assert!(reply.is_success());
//! channel.close().await;
//! # Ok(())
//! # }
//! ```

mod io;
mod state;

pub use state::ChannelState;

use crate::config::ReaderConfig;
use crate::id::CommandIdGenerator;
use io::{spawn_io_task, ChannelIo, IoSettings, Request};
use rfid_codec::{Command, CommandReply, ParamNode};
use rfid_core::{ReaderAddress, ReaderEvent, RfidError, RfidResult};
use rfid_session::Correlation;
use rfid_transport::{TcpSettings, TcpTransport, TransportLayer};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, oneshot, watch};

/// Connection to the command port of a reader
pub struct CommandChannel {
    config: ReaderConfig,
    ids: CommandIdGenerator,
    events: broadcast::Sender<ReaderEvent>,
    state: Arc<watch::Sender<ChannelState>>,
    io: Option<ChannelIo>,
    address: Option<ReaderAddress>,
}

impl CommandChannel {
    /// Create a disconnected channel
    ///
    /// # Errors
    /// Returns error if the configuration is invalid
    pub fn new(config: ReaderConfig) -> RfidResult<Self> {
        config.validate()?;
        let (events, _) = broadcast::channel(config.event_capacity);
        Ok(Self::with_events(config, events))
    }

    /// Create a disconnected channel publishing on an existing event sender
    pub fn with_events(config: ReaderConfig, events: broadcast::Sender<ReaderEvent>) -> Self {
        let (state, _) = watch::channel(ChannelState::Disconnected);
        Self {
            config,
            ids: CommandIdGenerator::new(),
            events,
            state: Arc::new(state),
            io: None,
            address: None,
        }
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn state(&self) -> ChannelState {
        *self.state.borrow()
    }

    /// Receiver notified on every state change
    pub fn state_changes(&self) -> watch::Receiver<ChannelState> {
        self.state.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Address of the reader, once connected
    pub fn address(&self) -> Option<&ReaderAddress> {
        self.address.as_ref()
    }

    /// New receiver of asynchronous data and debug traces
    pub fn events(&self) -> broadcast::Receiver<ReaderEvent> {
        self.events.subscribe()
    }

    /// Next command id of this channel
    pub fn next_id(&self) -> u64 {
        self.ids.next_id()
    }

    /// Connect to a reader
    ///
    /// `address` takes the forms accepted by [`ReaderAddress::parse`]; an
    /// `ackData=true` query turns acknowledgments on. Connecting a channel
    /// that is already connected succeeds without effect.
    pub async fn connect(&mut self, address: &str) -> RfidResult<()> {
        let address = ReaderAddress::parse_with_port(address, self.config.command_port)?;
        let settings = TcpSettings::from_reader_address(&address)
            .with_connect_timeout(self.config.connect_timeout);
        self.connect_with(Box::new(TcpTransport::new(settings)), Some(address))
            .await
    }

    /// Connect over a caller supplied transport
    pub async fn connect_transport(&mut self, transport: Box<dyn TransportLayer>) -> RfidResult<()> {
        self.connect_with(transport, None).await
    }

    async fn connect_with(
        &mut self,
        mut transport: Box<dyn TransportLayer>,
        address: Option<ReaderAddress>,
    ) -> RfidResult<()> {
        if self.is_connected() {
            log::debug!("command channel already connected");
            return Ok(());
        }
        if let Some(stale) = self.io.take() {
            stale.task.abort();
        }

        let target = address
            .as_ref()
            .map(|a| a.to_string())
            .unwrap_or_else(|| "transport".to_string());
        self.state.send_replace(ChannelState::Connecting);
        if self.config.debug {
            let _ = self
                .events
                .send(ReaderEvent::Debug(format!("CmdChn connect {}", target)));
        }

        if let Err(e) = transport.open().await {
            self.state.send_replace(ChannelState::Disconnected);
            return Err(match e {
                RfidError::Timeout => RfidError::NoConnection(format!(
                    "Connecting to {} timed out",
                    target
                )),
                other => RfidError::NoConnection(format!(
                    "Failed to connect to {}: {}",
                    target, other
                )),
            });
        }
        log::info!("connected to reader at {}", target);

        let ack = self.config.ack_async_data || address.as_ref().is_some_and(|a| a.ack_data);
        let settings = IoSettings {
            poll_interval: self.config.poll_interval,
            read_timeout: self.config.read_timeout,
            drain_timeout: self.config.drain_timeout,
            ack,
            debug: self.config.debug,
        };
        self.state.send_replace(ChannelState::Connected);
        self.io = Some(spawn_io_task(
            transport,
            settings,
            self.events.clone(),
            self.state.clone(),
        ));
        self.address = address;
        Ok(())
    }

    /// Write a command and wait for the reply carrying `id`
    ///
    /// An empty or `"0"` id accepts the first reply. Returns the reply
    /// frame as received.
    ///
    /// Commands run one at a time. `timeout` starts once the command is
    /// written, so time spent queued behind another command does not count
    /// against it. Dropping the returned future before the command reaches
    /// the socket withdraws it; the reader never sees it.
    pub async fn execute(&self, xml: &str, id: &str, timeout: Duration) -> RfidResult<String> {
        let io = self.connected_io()?;
        let (reply_tx, reply_rx) = oneshot::channel();
        io.tx
            .send(Request::Execute {
                xml: xml.to_string(),
                correlation: Correlation::for_id(id),
                timeout,
                reply: reply_tx,
            })
            .await
            .map_err(|_| not_connected())?;

        // the IO task enforces the deadline
        reply_rx.await.unwrap_or_else(|_| Err(not_connected()))
    }

    /// Execute a command and decode its reply
    ///
    /// A non-zero result code is returned as a reply, not an error; see
    /// [`CommandReply::into_result`].
    pub async fn execute_command(&self, command: &Command, timeout: Duration) -> RfidResult<CommandReply> {
        let xml = self
            .execute(&command.to_xml(), &command.correlation_id(), timeout)
            .await?;
        CommandReply::parse(&xml)
    }

    /// Build a command with the next id, execute it and decode the reply
    pub async fn call(&self, name: &str, params: Vec<ParamNode>, timeout: Duration) -> RfidResult<CommandReply> {
        let mut command = Command::new(self.next_id(), name);
        command.params = params;
        self.execute_command(&command, timeout).await
    }

    /// Prove the connection with a `heartBeat` round trip
    pub async fn heart_beat(&self) -> RfidResult<CommandReply> {
        self.call("heartBeat", Vec::new(), self.config.command_timeout)
            .await?
            .into_result()
    }

    /// Send `hostGoodbye` without waiting, then close
    pub async fn close(&mut self) {
        if self.is_connected() {
            let goodbye = Command::new(self.next_id(), "hostGoodbye").to_xml();
            if let Err(e) = self.send(goodbye).await {
                log::debug!("hostGoodbye not sent: {}", e);
            }
        }
        self.shutdown().await;
    }

    async fn send(&self, xml: String) -> RfidResult<()> {
        let io = self.connected_io()?;
        let (reply_tx, reply_rx) = oneshot::channel();
        io.tx
            .send(Request::Send { xml, reply: reply_tx })
            .await
            .map_err(|_| not_connected())?;
        reply_rx.await.map_err(|_| not_connected())?
    }

    /// Stop the IO task and close the socket
    ///
    /// Waits `close_attempts` poll intervals for the task to finish and
    /// aborts it after that.
    async fn shutdown(&mut self) {
        let Some(io) = self.io.take() else {
            return;
        };
        io.cancel.cancel();
        let abort = io.task.abort_handle();
        if tokio::time::timeout(self.config.close_wait(), io.task).await.is_err() {
            log::warn!("command channel IO task did not stop, aborting");
            abort.abort();
        }
        self.state.send_replace(ChannelState::Disconnected);
        if let Some(address) = self.address.take() {
            log::info!("disconnected from reader at {}", address);
        }
    }

    fn connected_io(&self) -> RfidResult<&ChannelIo> {
        match &self.io {
            Some(io) if self.is_connected() => Ok(io),
            _ => Err(not_connected()),
        }
    }
}

impl Drop for CommandChannel {
    fn drop(&mut self) {
        if let Some(io) = self.io.take() {
            io.cancel.cancel();
        }
    }
}

fn not_connected() -> RfidError {
    RfidError::NoConnection("command channel not connected".to_string())
}
