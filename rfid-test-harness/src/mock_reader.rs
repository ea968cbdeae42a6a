//! Scripted mock reader
//!
//! [`MockReader`] listens on a random localhost port, accepts one command
//! connection and walks its script in order. Every `<frame>` the client
//! sends is recorded, including acknowledgments and commands that no step
//! waits for. After the script ends the reader keeps recording until the
//! client disconnects.
//!
//! # Example
//!
//! ```no_run
//! use rfid_test_harness::{ok_reply, MockReader};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mut reader = MockReader::new().await?;
//! reader.respond("heartBeat", [ok_reply("heartBeat", "")]);
//! reader.start();
//! // ... connect a command channel to reader.addr() ...
//! reader.finish().await?;
//! # Ok(())
//! # }
//! ```

use anyhow::{anyhow, bail, Context, Result};
use rfid_codec::Command;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Delay between the chunks of one response, so they arrive as separate reads
const CHUNK_DELAY: Duration = Duration::from_millis(20);

/// How long [`MockReader::finish`] waits for the client to hang up
const FINISH_TIMEOUT: Duration = Duration::from_secs(5);

/// One step of a mock reader script
#[derive(Debug, Clone)]
pub enum Step {
    /// Wait for the command `command`, then write each chunk in turn.
    /// `{id}` in a chunk is replaced with the id of that command.
    Respond { command: String, chunks: Vec<String> },
    /// Wait for the command `command` and leave it unanswered
    Ignore { command: String },
    /// Write unsolicited data
    Push(String),
    /// Sleep
    Pause(Duration),
}

/// `<reply>` frame for `command` with result code 0, addressed to `{id}`
pub fn ok_reply(command: &str, return_value: &str) -> String {
    format!(
        "<reply><id>{{id}}</id><resultCode>0</resultCode><{cmd}><returnValue>{rv}</returnValue></{cmd}></reply>",
        cmd = command,
        rv = return_value
    )
}

#[derive(Debug, Default)]
struct Received {
    frames: Vec<String>,
    commands: Vec<Command>,
}

/// A scripted reader for command channel tests
pub struct MockReader {
    addr: String,
    listener: Option<TcpListener>,
    script: Vec<Step>,
    received: Arc<Mutex<Received>>,
    handle: Option<JoinHandle<Result<()>>>,
}

impl MockReader {
    /// Bind a mock reader on a random localhost port
    pub async fn new() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("failed to bind mock reader")?;
        let addr = listener.local_addr()?.to_string();
        Ok(Self {
            addr,
            listener: Some(listener),
            script: Vec::new(),
            received: Arc::new(Mutex::new(Received::default())),
            handle: None,
        })
    }

    /// `host:port` the mock reader listens on
    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn step(&mut self, step: Step) -> &mut Self {
        self.script.push(step);
        self
    }

    pub fn respond<I, S>(&mut self, command: &str, chunks: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.step(Step::Respond {
            command: command.to_string(),
            chunks: chunks.into_iter().map(Into::into).collect(),
        })
    }

    pub fn ignore(&mut self, command: &str) -> &mut Self {
        self.step(Step::Ignore {
            command: command.to_string(),
        })
    }

    pub fn push(&mut self, data: impl Into<String>) -> &mut Self {
        self.step(Step::Push(data.into()))
    }

    pub fn pause(&mut self, duration: Duration) -> &mut Self {
        self.step(Step::Pause(duration))
    }

    /// Start serving the script in a background task
    pub fn start(&mut self) {
        let Some(listener) = self.listener.take() else {
            log::warn!("mock reader on {} already started", self.addr);
            return;
        };
        let script = std::mem::take(&mut self.script);
        let received = self.received.clone();

        self.handle = Some(tokio::spawn(async move {
            let (stream, peer) = listener.accept().await.context("accept failed")?;
            log::debug!("mock reader accepted {}", peer);
            let mut session = Session {
                stream,
                pending: String::new(),
                received,
            };
            session.run(script).await
        }));
    }

    /// Every frame received so far, in arrival order
    pub async fn received(&self) -> Vec<String> {
        self.received.lock().await.frames.clone()
    }

    /// Every well-formed command received so far, in arrival order
    pub async fn commands(&self) -> Vec<Command> {
        self.received.lock().await.commands.clone()
    }

    /// Wait for the client to disconnect and report script failures
    ///
    /// Returns every frame received over the whole connection.
    pub async fn finish(mut self) -> Result<Vec<String>> {
        if let Some(handle) = self.handle.take() {
            let abort = handle.abort_handle();
            match tokio::time::timeout(FINISH_TIMEOUT, handle).await {
                Ok(joined) => joined.map_err(|e| anyhow!("mock reader task failed: {}", e))??,
                Err(_) => {
                    abort.abort();
                    bail!("client did not disconnect from mock reader")
                }
            }
        }
        Ok(self.received().await)
    }
}

struct Session {
    stream: TcpStream,
    pending: String,
    received: Arc<Mutex<Received>>,
}

impl Session {
    async fn run(&mut self, script: Vec<Step>) -> Result<()> {
        for (i, step) in script.into_iter().enumerate() {
            match step {
                Step::Respond { command, chunks } => {
                    let cmd = self
                        .wait_for(&command)
                        .await
                        .with_context(|| format!("step {}", i))?;
                    let id = cmd.id.to_string();
                    for (n, chunk) in chunks.iter().enumerate() {
                        if n > 0 {
                            tokio::time::sleep(CHUNK_DELAY).await;
                        }
                        self.write(&chunk.replace("{id}", &id)).await?;
                    }
                }
                Step::Ignore { command } => {
                    self.wait_for(&command)
                        .await
                        .with_context(|| format!("step {}", i))?;
                }
                Step::Push(data) => self.write(&data).await?,
                Step::Pause(duration) => tokio::time::sleep(duration).await,
            }
        }

        while self.next_frame().await?.is_some() {}
        Ok(())
    }

    async fn write(&mut self, data: &str) -> Result<()> {
        self.stream.write_all(data.as_bytes()).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Read frames until the command `name` arrives
    async fn wait_for(&mut self, name: &str) -> Result<Command> {
        loop {
            let Some(frame) = self.next_frame().await? else {
                bail!("client disconnected while waiting for {}", name);
            };
            match Command::parse(&frame) {
                Ok(cmd) if cmd.name == name => return Ok(cmd),
                Ok(cmd) => log::debug!("mock reader skipping {}", cmd.name),
                Err(_) => log::debug!("mock reader skipping {}", frame),
            }
        }
    }

    /// Next complete `<frame>`, or `None` once the client hangs up
    async fn next_frame(&mut self) -> Result<Option<String>> {
        let mut buf = [0u8; 4096];
        loop {
            if let Some(end) = self.pending.find("</frame>") {
                let end = end + "</frame>".len();
                let frame: String = self.pending.drain(..end).collect();
                let frame = frame.trim().to_string();
                self.record(&frame).await;
                return Ok(Some(frame));
            }
            let n = match self.stream.read(&mut buf).await {
                Ok(n) => n,
                Err(e) => {
                    log::debug!("mock reader read error: {}", e);
                    0
                }
            };
            if n == 0 {
                return Ok(None);
            }
            self.pending.push_str(&String::from_utf8_lossy(&buf[..n]));
        }
    }

    async fn record(&self, frame: &str) {
        let mut received = self.received.lock().await;
        received.frames.push(frame.to_string());
        if let Ok(cmd) = Command::parse(frame) {
            received.commands.push(cmd);
        }
    }
}
