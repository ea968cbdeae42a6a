//! Byte stream traits shared by the command channel and push connections

use async_trait::async_trait;
use rfid_core::{RfidError, RfidResult};
use std::time::Duration;

/// Result of one read attempt with a receive timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// This many bytes were read
    Data(usize),
    /// Nothing arrived within the receive timeout
    Idle,
    /// The reader hung up
    Closed,
}

/// A byte stream to or from a reader
///
/// The reader protocol has no length prefixes, so the stream is read in
/// whatever pieces the socket hands out; framing happens above this layer.
#[async_trait]
pub trait StreamAccessor: Send + Sync {
    /// Set the receive timeout of subsequent reads; `None` waits forever
    async fn set_timeout(&mut self, timeout: Option<Duration>) -> RfidResult<()>;

    /// Read into `buf`
    ///
    /// Returns 0 once the peer has closed the connection. A read that
    /// outlives the timeout fails with [`RfidError::Timeout`] and leaves the
    /// stream usable.
    async fn read(&mut self, buf: &mut [u8]) -> RfidResult<usize>;

    /// Read once, folding the receive timeout and end of stream into
    /// [`ReadOutcome`]
    async fn poll_read(&mut self, buf: &mut [u8]) -> RfidResult<ReadOutcome> {
        match self.read(buf).await {
            Ok(0) => Ok(ReadOutcome::Closed),
            Ok(n) => Ok(ReadOutcome::Data(n)),
            Err(RfidError::Timeout) => Ok(ReadOutcome::Idle),
            Err(e) => Err(e),
        }
    }

    async fn write(&mut self, buf: &[u8]) -> RfidResult<usize>;

    /// Write a whole frame
    async fn write_all(&mut self, buf: &[u8]) -> RfidResult<()> {
        let mut rest = buf;
        while !rest.is_empty() {
            match self.write(rest).await? {
                0 => {
                    return Err(RfidError::Connection(std::io::Error::new(
                        std::io::ErrorKind::WriteZero,
                        "reader stopped accepting data",
                    )));
                }
                n => rest = &rest[n..],
            }
        }
        Ok(())
    }

    async fn flush(&mut self) -> RfidResult<()>;

    fn is_closed(&self) -> bool;

    async fn close(&mut self) -> RfidResult<()>;
}

/// A stream that can be (re)opened by the host
#[async_trait]
pub trait TransportLayer: StreamAccessor {
    /// Connect to the reader
    ///
    /// Opening a transport that is already open succeeds without effect.
    async fn open(&mut self) -> RfidResult<()>;
}
