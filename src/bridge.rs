//! GCS Bridge Endpoint
//!
//! The orchestrator for the ground-station side of the bridge. An external
//! run loop calls [`GcsBridge::poll`] repeatedly; each cycle drains whatever
//! the transport already has, updates lock/liveness state, offers frames to
//! the interceptor, forwards unconsumed frames to the counterpart endpoint,
//! and emits a radio status report at 1 Hz while the peer is alive.
//!
//! # Concurrency model
//!
//! Single-threaded, cooperative. `poll()` never blocks and is never
//! reentered; all mutable state is owned by the bridge instance. The only
//! cross-endpoint sharing is each side's read-only statistics snapshot.
//! Timestamps are passed in by the caller so tests control time.

use crate::accounting::{GapAccounting, SeqGapCounter};
use crate::codec::{
    CodecError, Frame, FrameCodec, RadioStatus, COMP_ID_UDP_BRIDGE, MSG_ID_RADIO_STATUS,
    TX_SCRATCH_SIZE,
};
use crate::link::{HeartbeatTracking, PeerAddress};
use crate::stats::{loss_percent, LinkStats};
use crate::transport::{BridgeTransport, RadioMode, SocketAddr, TransportError};

/// Bridge endpoint configuration
///
/// All values are sourced externally (parameter storage, build config); the
/// defaults match the reference deployment.
#[derive(Debug, Clone, Copy)]
pub struct BridgeConfig {
    /// Local listening port
    pub bind_port: u16,
    /// Peer (GCS) destination port
    pub peer_port: u16,
    /// Liveness timeout: maximum silence before the peer is considered gone
    pub heartbeat_timeout_ms: u32,
    /// Interval between radio status reports
    pub status_interval_ms: u32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            bind_port: 14555,
            peer_port: 14550,
            heartbeat_timeout_ms: 3000,
            status_interval_ms: 1000,
        }
    }
}

/// Bridge error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BridgeError {
    /// Frame serialization failed
    Codec(CodecError),
    /// Transport operation failed
    Transport(TransportError),
}

impl From<CodecError> for BridgeError {
    fn from(e: CodecError) -> Self {
        BridgeError::Codec(e)
    }
}

impl From<TransportError> for BridgeError {
    fn from(e: TransportError) -> Self {
        BridgeError::Transport(e)
    }
}

impl core::fmt::Display for BridgeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BridgeError::Codec(e) => write!(f, "codec: {}", e),
            BridgeError::Transport(e) => write!(f, "transport: {}", e),
        }
    }
}

/// The counterpart bridge endpoint (vehicle side)
///
/// Only its forwarding entry point and read-only statistics snapshot are
/// consumed here; its own receive loop is out of scope.
pub trait CounterpartEndpoint {
    /// Forward one frame to the counterpart's transport
    fn receive(&mut self, frame: &Frame);

    /// Read-only statistics snapshot for status report synthesis
    fn link_stats(&self) -> LinkStats;

    /// System id this bridge reports under
    fn system_id(&self) -> u8;
}

/// Frame-level interception
///
/// Decides whether a parsed frame is swallowed locally (bridge commands,
/// parameter traffic addressed to the bridge itself) instead of forwarded.
pub trait FrameInterceptor {
    /// True means the frame is consumed and must not be forwarded
    fn try_consume(&mut self, frame: &Frame) -> bool;
}

/// Interceptor that never consumes anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullInterceptor;

impl FrameInterceptor for NullInterceptor {
    fn try_consume(&mut self, _frame: &Frame) -> bool {
        false
    }
}

/// GCS-side bridge endpoint
///
/// Owns the datagram transport, the frame codec, its own statistics and the
/// peer lock/liveness state. Counterpart and interceptor collaborators are
/// passed into `poll()` so a single logical thread of control touches
/// everything.
pub struct GcsBridge<T: BridgeTransport, A: GapAccounting = SeqGapCounter> {
    transport: T,
    codec: FrameCodec,
    stats: LinkStats,
    peer: PeerAddress,
    tracking: HeartbeatTracking,
    accounting: A,
    config: BridgeConfig,
    tx_seq: u8,
    last_status_ms: u32,
}

impl<T: BridgeTransport> GcsBridge<T, SeqGapCounter> {
    /// Create a bridge with default sequence-gap accounting
    ///
    /// The transport is expected to already be bound to the configured
    /// listening port. `initial_peer` is normally the broadcast sentinel for
    /// the peer port; statistics are seeded to zero and peer discovery is
    /// enabled.
    pub fn new(transport: T, initial_peer: SocketAddr, config: BridgeConfig) -> Self {
        Self::with_accounting(transport, initial_peer, config, SeqGapCounter)
    }
}

impl<T: BridgeTransport, A: GapAccounting> GcsBridge<T, A> {
    /// Create a bridge with a custom gap-accounting collaborator
    pub fn with_accounting(
        mut transport: T,
        initial_peer: SocketAddr,
        config: BridgeConfig,
        accounting: A,
    ) -> Self {
        transport.set_discovery(true);
        Self {
            transport,
            codec: FrameCodec::new(),
            stats: LinkStats::default(),
            peer: PeerAddress::new(initial_peer),
            tracking: HeartbeatTracking::default(),
            accounting,
            config,
            tx_seq: 0,
            last_status_ms: 0,
        }
    }

    /// Read-only statistics snapshot for the counterpart side
    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    /// Current outbound peer address
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer.addr()
    }

    /// True while locked to a discovered peer
    pub fn is_locked(&self) -> bool {
        self.peer.is_locked()
    }

    /// True while the peer is considered alive
    pub fn heard_from(&self) -> bool {
        self.tracking.heard_from
    }

    /// Access the underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable access to the underlying transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// One receive/liveness/report cycle; non-blocking
    ///
    /// 1. Drain the pending datagram into the codec.
    /// 2. Update statistics, lock and heartbeat state for the first parsed
    ///    frame; offer it to the interceptor; forward it to the counterpart
    ///    if not consumed, then stop draining for this cycle.
    /// 3. If nothing was forwarded and the liveness timeout elapsed, unlock
    ///    and re-enable discovery.
    /// 4. While the peer is alive, send a radio status report once per
    ///    configured interval, decoupled from frame arrival.
    pub fn poll<C, I>(&mut self, counterpart: &mut C, interceptor: &mut I, now_ms: u32)
    where
        C: CounterpartEndpoint,
        I: FrameInterceptor,
    {
        let forwarded = self.read_frames(counterpart, interceptor, now_ms);

        if !forwarded && self.tracking.timed_out(now_ms, self.config.heartbeat_timeout_ms) {
            crate::log_info!("heartbeat timeout from GCS");
            self.tracking.reset();
            self.peer.unlock();
            self.transport.set_discovery(true);
        }

        if self.tracking.heard_from
            && now_ms.wrapping_sub(self.last_status_ms) >= self.config.status_interval_ms
        {
            if let Err(e) = self.send_status_report(&*counterpart) {
                crate::log_warn!("status report failed: {}", e);
            }
            self.last_status_ms = now_ms;
        }
    }

    /// Drain the pending datagram; returns true if a frame was forwarded
    fn read_frames<C, I>(&mut self, counterpart: &mut C, interceptor: &mut I, now_ms: u32) -> bool
    where
        C: CounterpartEndpoint,
        I: FrameInterceptor,
    {
        let mut remaining = self.transport.bytes_available();
        while remaining > 0 {
            remaining -= 1;
            let byte = match self.transport.read_byte() {
                Some(b) => b,
                None => break,
            };
            let frame = match self.codec.feed(byte) {
                Some(f) => f,
                None => continue,
            };

            self.stats.frames_received += 1;

            let sender = self.transport.sender_addr();
            if !self.peer.is_locked() && !sender.is_broadcast() {
                self.peer.lock(sender);
            }

            if !self.tracking.heard_from {
                if frame.is_heartbeat() {
                    self.tracking.first_heartbeat(&frame, now_ms);
                    self.transport.set_discovery(false);
                }
            } else if frame.is_heartbeat() {
                self.tracking.refresh(now_ms);
            } else {
                self.stats.frames_lost += self.accounting.on_frame(&frame, &mut self.tracking);
            }

            if interceptor.try_consume(&frame) {
                // Eaten locally; keep draining for another frame this cycle
                continue;
            }

            counterpart.receive(&frame);
            return true;
        }
        false
    }

    /// Serialize and transmit one frame to the current peer address
    ///
    /// If the transport accepts fewer bytes than the serialized length, the
    /// unsent remainder is retried exactly once in a fresh datagram boundary.
    /// Best effort: a second short write drops the remainder silently.
    pub fn send(&mut self, frame: &Frame) -> Result<(), BridgeError> {
        let mut buf = [0u8; TX_SCRATCH_SIZE];
        let len = frame.encode(&mut buf)?;
        let dest = self.peer.addr();

        self.transport.begin_outbound(dest)?;
        let sent = self.transport.write(&buf[..len])?;
        self.transport.end_outbound()?;

        if sent < len {
            self.transport.begin_outbound(dest)?;
            let _ = self.transport.write(&buf[sent..len])?;
            self.transport.end_outbound()?;
        }

        self.stats.frames_sent += 1;
        Ok(())
    }

    /// Write several frames back-to-back inside one datagram boundary
    ///
    /// Stops at the first write whose byte count falls short (transmit buffer
    /// full) and returns the number of frames fully appended before the stop.
    /// Unlike [`GcsBridge::send`], no retry is attempted.
    pub fn send_batch(&mut self, frames: &[Frame]) -> Result<usize, BridgeError> {
        let mut buf = [0u8; TX_SCRATCH_SIZE];
        self.transport.begin_outbound(self.peer.addr())?;

        let mut appended = 0;
        for frame in frames {
            let len = frame.encode(&mut buf)?;
            let sent = self.transport.write(&buf[..len])?;
            if sent != len {
                break;
            }
            self.stats.frames_sent += 1;
            appended += 1;
        }

        self.transport.end_outbound()?;
        Ok(appended)
    }

    /// Synthesize and send a radio status report
    ///
    /// Merges the counterpart's statistics snapshot with this endpoint's own
    /// counters. Loss percentages are clamped to zero until the respective
    /// side has received at least one frame.
    fn send_status_report<C: CounterpartEndpoint>(
        &mut self,
        counterpart: &C,
    ) -> Result<(), BridgeError> {
        let vehicle = counterpart.link_stats();

        let rssi = match self.transport.radio_mode() {
            RadioMode::Station => self.transport.signal_strength() as u8,
            RadioMode::AccessPoint => 0,
        };

        let status = RadioStatus {
            rx_errors_percent: loss_percent(vehicle.frames_lost, vehicle.frames_received),
            fixed_percent: loss_percent(self.stats.frames_lost, self.stats.frames_received),
            rssi,
            remote_rssi: 0,
            tx_buffer: vehicle.queue_occupancy,
            noise: 0,
        };

        let frame = Frame::new(
            MSG_ID_RADIO_STATUS,
            counterpart.system_id(),
            COMP_ID_UDP_BRIDGE,
            self.next_seq(),
            &status.to_payload(),
        )?;
        self.send(&frame)?;
        self.stats.status_reports_sent += 1;
        Ok(())
    }

    fn next_seq(&mut self) -> u8 {
        let seq = self.tx_seq;
        self.tx_seq = self.tx_seq.wrapping_add(1);
        seq
    }
}
