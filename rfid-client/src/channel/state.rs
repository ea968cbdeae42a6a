/// Command channel state
///
/// `Disconnected → Connecting → Connected → Disconnected`. A channel whose
/// background task notices the reader hang up drops back to
/// `Disconnected` on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// No connection (initial state)
    Disconnected,
    /// Socket connect in progress
    Connecting,
    /// Socket open and background task running
    Connected,
}

impl ChannelState {
    /// Check if commands can be executed
    pub fn is_connected(&self) -> bool {
        matches!(self, ChannelState::Connected)
    }
}
