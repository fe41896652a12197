//! Mock transport implementation for testing
//!
//! Scripted datagram transport: queue inbound datagrams with their sender
//! address, capture outbound datagram boundaries, and cap per-boundary write
//! budgets to force short writes. Radio driver state (discovery mode, radio
//! mode, signal strength) is plain fields the test can set and inspect.

#![cfg(any(test, feature = "mock"))]

use super::{BridgeTransport, RadioMode, SocketAddr, TransportError};
use heapless::Vec;

/// Largest scripted datagram
pub const MOCK_DATAGRAM_SIZE: usize = 600;

/// Maximum scripted/captured datagrams
pub const MOCK_QUEUE_DEPTH: usize = 16;

/// One inbound datagram with its sender
#[derive(Debug, Clone)]
pub struct InboundDatagram {
    pub data: Vec<u8, MOCK_DATAGRAM_SIZE>,
    pub sender: SocketAddr,
}

/// One captured outbound datagram boundary
#[derive(Debug, Clone)]
pub struct OutboundDatagram {
    pub dest: SocketAddr,
    pub data: Vec<u8, MOCK_DATAGRAM_SIZE>,
}

/// Scriptable transport for bridge tests
pub struct MockTransport {
    inbound: Vec<InboundDatagram, MOCK_QUEUE_DEPTH>,
    rx_index: usize,
    rx_pos: usize,
    current_sender: SocketAddr,
    /// Outbound datagrams captured in transmit order
    pub outbound: Vec<OutboundDatagram, MOCK_QUEUE_DEPTH>,
    open: bool,
    /// Per-boundary write budgets, consumed by each `begin_outbound`
    write_caps: Vec<Option<usize>, MOCK_QUEUE_DEPTH>,
    cap_index: usize,
    budget: Option<usize>,
    /// Last discovery mode set by the bridge
    pub discovery_enabled: bool,
    /// Radio driver mode reported to the bridge
    pub mode: RadioMode,
    /// Signal strength reported in station mode
    pub rssi: i8,
}

impl MockTransport {
    /// Create a mock transport with no scripted traffic
    pub fn new() -> Self {
        Self {
            inbound: Vec::new(),
            rx_index: 0,
            rx_pos: 0,
            current_sender: SocketAddr::broadcast(0),
            outbound: Vec::new(),
            open: false,
            write_caps: Vec::new(),
            cap_index: 0,
            budget: None,
            discovery_enabled: true,
            mode: RadioMode::AccessPoint,
            rssi: 0,
        }
    }

    /// Queue an inbound datagram from `sender`
    pub fn push_datagram(&mut self, data: &[u8], sender: SocketAddr) {
        let datagram = InboundDatagram {
            data: Vec::from_slice(data).unwrap(),
            sender,
        };
        self.inbound.push(datagram).ok().unwrap();
    }

    /// Cap the number of bytes accepted inside the next outbound boundary
    ///
    /// Caps apply in `begin_outbound` order; boundaries beyond the scripted
    /// caps are unlimited.
    pub fn push_write_cap(&mut self, cap: usize) {
        self.write_caps.push(Some(cap)).ok().unwrap();
    }

    /// Datagrams transmitted so far
    pub fn sent_count(&self) -> usize {
        self.outbound.len()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl BridgeTransport for MockTransport {
    fn begin_outbound(&mut self, dest: SocketAddr) -> Result<(), TransportError> {
        self.open = true;
        self.budget = self
            .write_caps
            .get(self.cap_index)
            .copied()
            .unwrap_or(None);
        self.cap_index += 1;
        self.outbound
            .push(OutboundDatagram {
                dest,
                data: Vec::new(),
            })
            .ok()
            .unwrap();
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, TransportError> {
        if !self.open {
            return Err(TransportError::IoError);
        }
        let accept = match self.budget {
            Some(budget) => buf.len().min(budget),
            None => buf.len(),
        };
        if let Some(budget) = self.budget.as_mut() {
            *budget -= accept;
        }
        let packet = self.outbound.last_mut().unwrap();
        packet.data.extend_from_slice(&buf[..accept]).unwrap();
        Ok(accept)
    }

    fn end_outbound(&mut self) -> Result<(), TransportError> {
        self.open = false;
        Ok(())
    }

    fn bytes_available(&mut self) -> usize {
        while let Some(datagram) = self.inbound.get(self.rx_index) {
            let remaining = datagram.data.len() - self.rx_pos;
            if remaining > 0 {
                return remaining;
            }
            self.rx_index += 1;
            self.rx_pos = 0;
        }
        0
    }

    fn read_byte(&mut self) -> Option<u8> {
        let datagram = self.inbound.get(self.rx_index)?;
        let byte = *datagram.data.get(self.rx_pos)?;
        self.rx_pos += 1;
        self.current_sender = datagram.sender;
        Some(byte)
    }

    fn sender_addr(&self) -> SocketAddr {
        self.current_sender
    }

    fn set_discovery(&mut self, enabled: bool) {
        self.discovery_enabled = enabled;
    }

    fn radio_mode(&self) -> RadioMode {
        self.mode
    }

    fn signal_strength(&self) -> i8 {
        self.rssi
    }
}
