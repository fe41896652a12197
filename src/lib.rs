#![cfg_attr(not(any(test, feature = "std")), no_std)]

//! mavbridge - GCS-side endpoint of a bidirectional MAVLink bridge
//!
//! This library implements the "ground-station side" of a UART/UDP MAVLink
//! bridge: it receives datagrams from a GCS over an unreliable wireless
//! network, reassembles and validates MAVLink frames across datagram
//! boundaries, locks onto the peer's address once it is discovered, tracks
//! link liveness via heartbeats, forwards frames to the counterpart (vehicle)
//! side, and reports merged link-quality statistics back to the GCS at 1 Hz.
//!
//! # Architecture
//!
//! - **Codec**: incremental frame parsing and serialization
//! - **Link**: peer address lock state machine + heartbeat tracking
//! - **Stats**: per-side link statistics counters
//! - **Accounting**: pluggable sequence-gap loss accounting
//! - **Bridge**: the `GcsBridge` orchestrator driven by an external run loop
//! - **Transport**: datagram transport abstraction (mock + std UDP impls)
//!
//! All collaborators (transport, counterpart endpoint, frame interceptor) are
//! injected, so multiple bridge instances can coexist and everything is
//! testable on the host without hardware.

pub mod accounting;
pub mod bridge;
pub mod codec;
pub mod link;
pub mod logging;
pub mod stats;
pub mod transport;
