//! Peer address lock and heartbeat tracking
//!
//! Tracks whether the remote GCS's address is known (locked) or must be
//! discovered (broadcast/unlocked), and whether the peer is alive.
//!
//! # Lock state machine
//!
//! | Current  | Event                                   | Next     |
//! |----------|-----------------------------------------|----------|
//! | UNLOCKED | frame accepted from non-broadcast sender | LOCKED   |
//! | LOCKED   | no heartbeat for longer than the timeout | UNLOCKED |
//! | LOCKED   | heartbeat received                       | LOCKED   |
//!
//! The timeout is checked once per receive-poll cycle, not on a separate
//! timer, so detection latency equals the poll interval. Both structures live
//! for the process lifetime and are mutated only by the owning bridge.

use crate::codec::Frame;
use crate::transport::SocketAddr;

/// Current peer address with lock flag
///
/// Invariant: while unlocked, the address is the broadcast sentinel and
/// outbound frames are broadcast; while locked, it is the specific peer that
/// most recently announced itself.
#[derive(Debug, Clone, Copy)]
pub struct PeerAddress {
    addr: SocketAddr,
    locked: bool,
}

impl PeerAddress {
    /// Create in the unlocked state
    ///
    /// `initial` is normally the broadcast sentinel for the configured peer
    /// port.
    pub fn new(initial: SocketAddr) -> Self {
        Self {
            addr: initial,
            locked: false,
        }
    }

    /// Current outbound destination
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// True while locked to a discovered peer
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Lock onto a discovered peer address
    pub fn lock(&mut self, sender: SocketAddr) {
        self.addr = SocketAddr::new(sender.ip, self.addr.port);
        self.locked = true;
        crate::log_info!(
            "response from GCS, locking to {}.{}.{}.{}:{}",
            sender.ip[0],
            sender.ip[1],
            sender.ip[2],
            sender.ip[3],
            self.addr.port
        );
    }

    /// Return to the broadcast sentinel
    ///
    /// Restores subnet broadcast by forcing the final octet, matching the
    /// shared wire convention.
    pub fn unlock(&mut self) {
        self.addr.ip[3] = 255;
        self.locked = false;
    }
}

/// Heartbeat liveness tracking
///
/// `heard_from` is true iff a heartbeat has been accepted and no liveness
/// timeout has since elapsed. `expected_seq` is advisory, consumed by gap
/// accounting and reseeded on every heartbeat.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeartbeatTracking {
    /// A heartbeat has been accepted and the peer is considered alive
    pub heard_from: bool,
    /// Peer system id from the first heartbeat
    pub system_id: u8,
    /// Peer component id from the first heartbeat
    pub component_id: u8,
    /// Next sequence number expected from the peer
    pub expected_seq: u8,
    /// Time of the most recent heartbeat (milliseconds)
    pub last_heartbeat_ms: u32,
}

impl HeartbeatTracking {
    /// Accept the first heartbeat from the peer
    pub fn first_heartbeat(&mut self, frame: &Frame, now_ms: u32) {
        self.heard_from = true;
        self.system_id = frame.system_id;
        self.component_id = frame.component_id;
        self.expected_seq = frame.seq.wrapping_add(1);
        self.last_heartbeat_ms = now_ms;
    }

    /// Refresh liveness on a subsequent heartbeat
    pub fn refresh(&mut self, now_ms: u32) {
        self.last_heartbeat_ms = now_ms;
    }

    /// True if the liveness timeout has elapsed since the last heartbeat
    pub fn timed_out(&self, now_ms: u32, timeout_ms: u32) -> bool {
        self.heard_from && now_ms.wrapping_sub(self.last_heartbeat_ms) > timeout_ms
    }

    /// Forget the peer after a liveness timeout
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
