// serial
pub const SERIAL_TX: usize = 0x5e7a_0000;
pub const SERIAL_RX: usize = 0x5e7a_1000;
pub const SERIAL_WAIT: usize = 0x5e7a_2000;
pub const SERIAL_LINE_ERROR: usize = 0x5e7a_3000;

/// Records `event_id | payload`. Compiled out unless the `trace` feature is on.
#[inline(always)]
pub fn push_trace(event_id: usize) {
    #[cfg(feature = "trace")]
    trace!("[trace] {:#010x}", event_id);
    #[cfg(not(feature = "trace"))]
    let _ = event_id;
}
