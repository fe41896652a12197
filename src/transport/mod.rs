//! Bridge Transport Abstraction
//!
//! Trait-based abstraction over the wireless datagram transport, so the
//! bridge core can run against real UDP sockets, an embedded network stack,
//! or a scripted mock in tests.
//!
//! # Model
//!
//! The transport is polled, never blocking:
//!
//! - Inbound: `bytes_available()` reports the size of the datagram currently
//!   pending (0 if none); `read_byte()` drains it one byte at a time;
//!   `sender_addr()` identifies where the current datagram came from.
//! - Outbound: `begin_outbound(dest)` opens a datagram boundary, `write()`
//!   appends bytes (short writes signal a full transmit buffer), and
//!   `end_outbound()` closes and transmits the datagram.
//!
//! The driver-mode calls (`set_discovery`, `radio_mode`, `signal_strength`)
//! expose the radio driver's state as a capability instead of global hardware
//! queries, so they can be stubbed in tests.

use core::fmt;

#[cfg(feature = "std")]
pub mod udp;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(feature = "std")]
pub use udp::UdpBridgeTransport;

#[cfg(any(test, feature = "mock"))]
pub use mock::MockTransport;

/// IPv4 socket endpoint (address + port)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SocketAddr {
    /// IPv4 address (4 bytes)
    pub ip: [u8; 4],
    /// UDP port
    pub port: u16,
}

impl SocketAddr {
    /// Create new socket address
    pub fn new(ip: [u8; 4], port: u16) -> Self {
        Self { ip, port }
    }

    /// Broadcast sentinel for the given port
    pub fn broadcast(port: u16) -> Self {
        Self {
            ip: [255, 255, 255, 255],
            port,
        }
    }

    /// True if this is a broadcast/"any peer" sentinel
    ///
    /// The wire convention marks broadcast with a 255 final octet (subnet
    /// broadcast), so only the last octet is checked.
    pub fn is_broadcast(&self) -> bool {
        self.ip[3] == 255
    }
}

/// Radio driver operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioMode {
    /// Joined an existing network; signal strength is meaningful
    Station,
    /// Hosting the network; no signal strength reading available
    AccessPoint,
}

/// Transport error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// Generic I/O error
    IoError,
    /// Transport is no longer available
    Disconnected,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::IoError => write!(f, "I/O error"),
            TransportError::Disconnected => write!(f, "transport disconnected"),
        }
    }
}

/// Datagram transport used by the bridge endpoint
///
/// All operations are non-blocking; the bridge's `poll()` drains whatever is
/// already available and returns.
pub trait BridgeTransport {
    /// Open an outbound datagram boundary to `dest`
    fn begin_outbound(&mut self, dest: SocketAddr) -> Result<(), TransportError>;

    /// Append bytes to the open outbound datagram
    ///
    /// Returns the number of bytes accepted. A short write means the transmit
    /// buffer is full; the caller decides whether to retry the remainder.
    fn write(&mut self, buf: &[u8]) -> Result<usize, TransportError>;

    /// Close and transmit the open outbound datagram
    fn end_outbound(&mut self) -> Result<(), TransportError>;

    /// Size of the inbound datagram currently pending, or 0 if none
    fn bytes_available(&mut self) -> usize;

    /// Read one byte of the pending inbound datagram
    fn read_byte(&mut self) -> Option<u8>;

    /// Sender address of the current inbound datagram
    fn sender_addr(&self) -> SocketAddr;

    /// Enable or disable peer-discovery broadcast mode on the radio driver
    fn set_discovery(&mut self, enabled: bool);

    /// Current radio driver mode
    fn radio_mode(&self) -> RadioMode;

    /// Signal strength reading, meaningful only in [`RadioMode::Station`]
    fn signal_strength(&self) -> i8;
}
