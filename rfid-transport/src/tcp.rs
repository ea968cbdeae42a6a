//! TCP transport implementation

use crate::stream::{StreamAccessor, TransportLayer};
use async_trait::async_trait;
use rfid_core::{ReaderAddress, RfidError, RfidResult};
use std::fmt;
use std::net::SocketAddr;
use std::ops::{Deref, DerefMut};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Wrapper for TcpStream that implements Debug
struct DebugTcpStream(TcpStream);

impl fmt::Debug for DebugTcpStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TcpStream")
            .field("peer", &self.0.peer_addr().ok())
            .finish()
    }
}

impl Deref for DebugTcpStream {
    type Target = TcpStream;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for DebugTcpStream {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// TCP transport layer settings
#[derive(Debug, Clone)]
pub struct TcpSettings {
    /// `host:port` of the reader
    pub address: String,
    /// Bound on connection establishment
    pub connect_timeout: Option<Duration>,
    /// Per-read timeout
    pub timeout: Option<Duration>,
}

impl TcpSettings {
    /// Create new TCP settings
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            connect_timeout: Some(Duration::from_secs(5)),
            timeout: Some(Duration::from_millis(100)),
        }
    }

    /// Create TCP settings from a parsed reader address
    pub fn from_reader_address(address: &ReaderAddress) -> Self {
        Self::new(address.socket_string())
    }

    /// Create TCP settings with a connect timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }
}

/// TCP transport layer implementation
#[derive(Debug)]
pub struct TcpTransport {
    stream: Option<DebugTcpStream>,
    settings: TcpSettings,
    closed: bool,
}

impl TcpTransport {
    /// Create a new TCP transport layer
    pub fn new(settings: TcpSettings) -> Self {
        Self {
            stream: None,
            settings,
            closed: true,
        }
    }

    /// Create TCP transport from address string
    pub fn from_address(address: &str) -> RfidResult<Self> {
        let address = ReaderAddress::parse(address)?;
        Ok(Self::new(TcpSettings::from_reader_address(&address)))
    }

    /// Create TCP transport from an already-connected TcpStream (for listener use)
    ///
    /// # Arguments
    /// * `stream` - The already-connected TCP stream
    /// * `timeout` - Optional per-read timeout
    pub fn from_connected_stream(stream: TcpStream, timeout: Option<Duration>) -> Self {
        let address = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_default();
        Self {
            stream: Some(DebugTcpStream(stream)),
            settings: TcpSettings {
                address,
                connect_timeout: None,
                timeout,
            },
            closed: false,
        }
    }

    /// Address of the remote end, if connected
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.stream.as_ref().and_then(|s| s.peer_addr().ok())
    }

    pub fn settings(&self) -> &TcpSettings {
        &self.settings
    }

    fn stream_mut(&mut self) -> RfidResult<&mut DebugTcpStream> {
        self.stream.as_mut().ok_or_else(|| {
            RfidError::Connection(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "TCP stream not connected",
            ))
        })
    }
}

#[async_trait]
impl TransportLayer for TcpTransport {
    async fn open(&mut self) -> RfidResult<()> {
        if !self.closed && self.stream.is_some() {
            log::debug!("TCP transport to {} already open", self.settings.address);
            return Ok(());
        }

        let connect = TcpStream::connect(self.settings.address.as_str());
        let stream = if let Some(timeout) = self.settings.connect_timeout {
            tokio::time::timeout(timeout, connect)
                .await
                .map_err(|_| RfidError::Timeout)?
                .map_err(RfidError::Connection)?
        } else {
            connect.await.map_err(RfidError::Connection)?
        };
        stream.set_nodelay(true).map_err(RfidError::Connection)?;

        self.stream = Some(DebugTcpStream(stream));
        self.closed = false;
        Ok(())
    }
}

#[async_trait]
impl StreamAccessor for TcpTransport {
    async fn set_timeout(&mut self, timeout: Option<Duration>) -> RfidResult<()> {
        self.settings.timeout = timeout;
        Ok(())
    }

    async fn read(&mut self, buf: &mut [u8]) -> RfidResult<usize> {
        let timeout = self.settings.timeout;
        let stream = self.stream_mut()?;

        let result = if let Some(timeout) = timeout {
            tokio::time::timeout(timeout, stream.read(buf))
                .await
                .map_err(|_| RfidError::Timeout)?
                .map_err(RfidError::Connection)
        } else {
            stream.read(buf).await.map_err(RfidError::Connection)
        };

        match result {
            Ok(0) => {
                self.closed = true;
                Ok(0)
            }
            Ok(n) => Ok(n),
            Err(e) => {
                self.closed = true;
                Err(e)
            }
        }
    }

    async fn write(&mut self, buf: &[u8]) -> RfidResult<usize> {
        let stream = self.stream_mut()?;
        match stream.write(buf).await {
            Ok(n) => Ok(n),
            Err(e) => {
                self.closed = true;
                Err(RfidError::Connection(e))
            }
        }
    }

    async fn flush(&mut self) -> RfidResult<()> {
        let stream = self.stream_mut()?;
        stream.flush().await.map_err(RfidError::Connection)
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    async fn close(&mut self) -> RfidResult<()> {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
        }
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::ReadOutcome;
    use tokio::net::TcpListener;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_tcp_settings() {
        let settings = TcpSettings::from_reader_address(&ReaderAddress::new("127.0.0.1"));
        assert_eq!(settings.address, "127.0.0.1:10001");
        assert!(settings.connect_timeout.is_some());
        assert_eq!(settings.timeout, Some(Duration::from_millis(100)));
    }

    #[tokio::test]
    async fn test_open_is_idempotent_and_read_timeout_keeps_stream() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accept = tokio::spawn(async move { listener.accept().await.unwrap().0 });

        let mut transport = TcpTransport::new(TcpSettings::new(addr.to_string()));
        assert!(transport.is_closed());
        assert_ok!(transport.open().await);
        assert_ok!(transport.open().await);
        let mut server = accept.await.unwrap();

        transport
            .set_timeout(Some(Duration::from_millis(20)))
            .await
            .unwrap();
        let mut buf = [0u8; 16];
        let err = transport.read(&mut buf).await.unwrap_err();
        assert!(matches!(err, RfidError::Timeout));
        assert!(!transport.is_closed());
        assert_eq!(transport.poll_read(&mut buf).await.unwrap(), ReadOutcome::Idle);

        server.write_all(b"<reply>").await.unwrap();
        let n = transport.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"<reply>");

        drop(server);
        assert_eq!(transport.poll_read(&mut buf).await.unwrap(), ReadOutcome::Closed);
        assert!(transport.is_closed());
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut transport = TcpTransport::new(TcpSettings::new(addr.to_string()));
        assert_err!(transport.open().await);
        assert!(transport.is_closed());
    }
}
