use super::HidError;

/// Size of one input report; output reports carry one extra leading byte
/// for the report id.
pub const REPORT_SIZE: usize = 64;

/// Blocking report I/O on one opened HID handle. The handle closes when the
/// implementing value is dropped.
pub trait HidTransport {
    /// Write one 65-byte output report (report id + frame). Returns the
    /// number of bytes the device accepted.
    fn write_report(&mut self, report: &[u8]) -> Result<usize, HidError>;

    /// Read one 64-byte input report. `Ok(0)` means the timeout elapsed
    /// without data; `Err` means the handle failed.
    fn read_report(&mut self, buf: &mut [u8], timeout_ms: i32) -> Result<usize, HidError>;
}

/// Resolves and opens the device handle a session binds to. Separate from
/// the transport because a key re-enumerates at a new path whenever it
/// reboots, so every handshake re-resolves it.
pub trait HidConnector {
    type Transport: HidTransport;

    fn connect(&mut self) -> Result<Self::Transport, HidError>;
}
