//! End-to-end bridge tests over the mock transport
//!
//! Drives a full GCS bridge endpoint through the discovery → lock → forward →
//! report → timeout → re-lock cycle, the way the surrounding run loop would.

use heapless::Vec;
use mavbridge::bridge::{
    BridgeConfig, CounterpartEndpoint, FrameInterceptor, GcsBridge, NullInterceptor,
};
use mavbridge::codec::{
    Frame, FrameCodec, RadioStatus, MSG_ID_HEARTBEAT, MSG_ID_RADIO_STATUS, TX_SCRATCH_SIZE,
};
use mavbridge::stats::LinkStats;
use mavbridge::transport::{MockTransport, RadioMode, SocketAddr};

const GCS: SocketAddr = SocketAddr {
    ip: [192, 168, 4, 2],
    port: 52000,
};

/// Vehicle-side stand-in: records forwarded frames, serves a stats snapshot
struct VehicleSide {
    received: std::vec::Vec<Frame>,
    stats: LinkStats,
}

impl VehicleSide {
    fn new() -> Self {
        Self {
            received: std::vec::Vec::new(),
            stats: LinkStats::default(),
        }
    }
}

impl CounterpartEndpoint for VehicleSide {
    fn receive(&mut self, frame: &Frame) {
        self.received.push(frame.clone());
    }

    fn link_stats(&self) -> LinkStats {
        self.stats
    }

    fn system_id(&self) -> u8 {
        1
    }
}

/// Consumes frames addressed to the bridge component itself
struct ComponentInterceptor {
    component_id: u8,
    consumed: usize,
}

impl FrameInterceptor for ComponentInterceptor {
    fn try_consume(&mut self, frame: &Frame) -> bool {
        if frame.component_id == self.component_id {
            self.consumed += 1;
            return true;
        }
        false
    }
}

fn encode(frame: &Frame) -> Vec<u8, 600> {
    let mut buf = [0u8; TX_SCRATCH_SIZE];
    let len = frame.encode(&mut buf).unwrap();
    Vec::from_slice(&buf[..len]).unwrap()
}

fn heartbeat(seq: u8) -> Frame {
    Frame::new(MSG_ID_HEARTBEAT, 255, 190, seq, &[0; 9]).unwrap()
}

fn telemetry(seq: u8) -> Frame {
    Frame::new(30, 255, 190, seq, &[0xAB; 28]).unwrap()
}

fn decode_last_report(bridge: &GcsBridge<MockTransport>) -> (Frame, RadioStatus) {
    let outbound = bridge.transport().outbound.last().expect("no outbound datagram");
    let mut codec = FrameCodec::new();
    let mut frame = None;
    for &b in outbound.data.iter() {
        if let Some(f) = codec.feed(b) {
            frame = Some(f);
        }
    }
    let frame = frame.expect("outbound datagram held no valid frame");
    let status = RadioStatus::from_payload(&frame.payload).expect("truncated radio status");
    (frame, status)
}

fn new_bridge() -> GcsBridge<MockTransport> {
    GcsBridge::new(
        MockTransport::new(),
        SocketAddr::broadcast(14550),
        BridgeConfig::default(),
    )
}

#[test]
fn full_link_lifecycle() {
    let mut bridge = new_bridge();
    let mut vehicle = VehicleSide::new();
    let mut interceptor = NullInterceptor;

    // Nothing heard yet: broadcasting, discovering, silent
    assert!(bridge.peer_addr().is_broadcast());
    assert!(bridge.transport().discovery_enabled);
    bridge.poll(&mut vehicle, &mut interceptor, 100);
    assert_eq!(bridge.transport().sent_count(), 0);

    // GCS announces itself
    bridge.transport_mut().push_datagram(&encode(&heartbeat(0)), GCS);
    bridge.poll(&mut vehicle, &mut interceptor, 200);
    assert!(bridge.is_locked());
    assert!(bridge.heard_from());
    assert!(!bridge.transport().discovery_enabled);
    assert_eq!(vehicle.received.len(), 1);

    // Telemetry flows and is forwarded
    bridge.transport_mut().push_datagram(&encode(&telemetry(1)), GCS);
    bridge.poll(&mut vehicle, &mut interceptor, 300);
    assert_eq!(vehicle.received.len(), 2);
    assert_eq!(bridge.stats().frames_received, 2);
    assert_eq!(bridge.stats().frames_lost, 0);

    // 1 Hz report towards the locked peer
    vehicle.stats.frames_received = 100;
    vehicle.stats.frames_lost = 10;
    vehicle.stats.queue_occupancy = 4;
    bridge.transport_mut().mode = RadioMode::Station;
    bridge.transport_mut().rssi = 55;
    bridge.poll(&mut vehicle, &mut interceptor, 1200);

    assert_eq!(bridge.stats().status_reports_sent, 1);
    let (frame, status) = decode_last_report(&bridge);
    assert_eq!(frame.msg_id, MSG_ID_RADIO_STATUS);
    assert_eq!(frame.system_id, 1);
    assert_eq!(status.rx_errors_percent, 10);
    assert_eq!(status.fixed_percent, 0);
    assert_eq!(status.rssi, 55);
    assert_eq!(status.tx_buffer, 4);
    assert_eq!(
        bridge.transport().outbound.last().unwrap().dest,
        SocketAddr::new([192, 168, 4, 2], 14550)
    );

    // Silence past the liveness timeout: unlock and resume discovery
    bridge.poll(&mut vehicle, &mut interceptor, 4300);
    assert!(!bridge.is_locked());
    assert!(!bridge.heard_from());
    assert!(bridge.peer_addr().is_broadcast());
    assert!(bridge.transport().discovery_enabled);

    // Peer comes back from a different address; re-lock
    let other = SocketAddr::new([192, 168, 4, 7], 52001);
    bridge.transport_mut().push_datagram(&encode(&heartbeat(7)), other);
    bridge.poll(&mut vehicle, &mut interceptor, 5000);
    assert!(bridge.is_locked());
    assert_eq!(bridge.peer_addr().ip, [192, 168, 4, 7]);
}

#[test]
fn frame_split_across_datagrams_still_forwards() {
    let mut bridge = new_bridge();
    let mut vehicle = VehicleSide::new();
    let mut interceptor = NullInterceptor;

    let bytes = encode(&heartbeat(0));
    let split = bytes.len() / 2;
    bridge.transport_mut().push_datagram(&bytes[..split], GCS);
    bridge.transport_mut().push_datagram(&bytes[split..], GCS);

    bridge.poll(&mut vehicle, &mut interceptor, 100);
    assert!(vehicle.received.is_empty());

    bridge.poll(&mut vehicle, &mut interceptor, 150);
    assert_eq!(vehicle.received.len(), 1);
    assert!(bridge.heard_from());
}

#[test]
fn intercepted_frames_never_reach_the_vehicle() {
    let mut bridge = new_bridge();
    let mut vehicle = VehicleSide::new();
    let mut interceptor = ComponentInterceptor {
        component_id: 190,
        consumed: 0,
    };

    bridge.transport_mut().push_datagram(&encode(&heartbeat(0)), GCS);
    bridge.poll(&mut vehicle, &mut interceptor, 100);

    assert_eq!(interceptor.consumed, 1);
    assert!(vehicle.received.is_empty());
    // Consumption still counted as received and still drove liveness
    assert_eq!(bridge.stats().frames_received, 1);
    assert!(bridge.heard_from());
}

#[test]
fn corrupted_datagram_is_ignored() {
    let mut bridge = new_bridge();
    let mut vehicle = VehicleSide::new();
    let mut interceptor = NullInterceptor;

    let mut bytes = encode(&heartbeat(0));
    bytes[7] ^= 0xFF;
    bridge.transport_mut().push_datagram(&bytes, GCS);
    bridge.poll(&mut vehicle, &mut interceptor, 100);

    assert!(vehicle.received.is_empty());
    assert_eq!(bridge.stats().frames_received, 0);
    assert!(!bridge.is_locked());

    // A clean frame afterwards parses normally
    bridge.transport_mut().push_datagram(&encode(&heartbeat(1)), GCS);
    bridge.poll(&mut vehicle, &mut interceptor, 200);
    assert_eq!(vehicle.received.len(), 1);
}
