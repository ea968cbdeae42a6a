//! Reader side of a push connection
//!
//! The reader opens a TCP connection to the subscribed listener, writes
//! reports and alarms, and reads back acknowledgments when requested.

use anyhow::{bail, Context, Result};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

pub struct PushClient {
    stream: TcpStream,
    pending: String,
}

impl PushClient {
    pub async fn connect(addr: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .with_context(|| format!("failed to connect to {}", addr))?;
        Ok(Self {
            stream,
            pending: String::new(),
        })
    }

    pub async fn send(&mut self, data: &str) -> Result<()> {
        self.stream.write_all(data.as_bytes()).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Read until `pattern` has been received; returns everything up to and
    /// including it
    pub async fn read_until(&mut self, pattern: &str, timeout: Duration) -> Result<String> {
        let read = async {
            let mut buf = [0u8; 1024];
            loop {
                if let Some(pos) = self.pending.find(pattern) {
                    let end = pos + pattern.len();
                    return Ok::<String, anyhow::Error>(self.pending.drain(..end).collect());
                }
                let n = self.stream.read(&mut buf).await?;
                if n == 0 {
                    bail!("listener closed the connection");
                }
                self.pending.push_str(&String::from_utf8_lossy(&buf[..n]));
            }
        };
        tokio::time::timeout(timeout, read)
            .await
            .with_context(|| format!("no '{}' within {:?}", pattern, timeout))?
    }

    /// Whether nothing arrives within `window`
    pub async fn is_silent(&mut self, window: Duration) -> bool {
        if !self.pending.is_empty() {
            return false;
        }
        let mut buf = [0u8; 256];
        match tokio::time::timeout(window, self.stream.read(&mut buf)).await {
            Err(_) => true,
            Ok(Ok(0)) => true,
            Ok(Ok(n)) => {
                self.pending.push_str(&String::from_utf8_lossy(&buf[..n]));
                false
            }
            Ok(Err(_)) => true,
        }
    }
}
