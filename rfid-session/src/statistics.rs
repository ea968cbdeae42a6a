//! Frame scanner statistics

/// Counters kept by a [`FrameScanner`](crate::FrameScanner)
///
/// Useful to see how noisy a reader connection is: a steady rise in
/// `fragments_discarded` or `replies_mismatched` usually points at stale
/// replies from an earlier, timed out command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStatistics {
    /// Complete frames handed to the caller
    pub frames_accepted: u64,
    /// Unrecognized elements and stray text dropped while scanning
    pub fragments_discarded: u64,
    /// Replies dropped because their id did not match
    pub replies_mismatched: u64,
}

impl ScanStatistics {
    pub fn new() -> Self {
        Self::default()
    }
}
