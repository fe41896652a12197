//! UDP transport over std sockets
//!
//! Host-side implementation of [`BridgeTransport`] on a non-blocking
//! `std::net::UdpSocket`. Used by SITL runs and host integration setups; the
//! embedded target supplies its own network-stack implementation of the same
//! trait.
//!
//! Inbound datagrams are received whole into a fixed buffer and drained byte
//! by byte; outbound boundaries accumulate into a fixed buffer transmitted by
//! `end_outbound`. A `write` that does not fit the remaining buffer space
//! reports a short write, mirroring a full radio transmit queue.

#![cfg(feature = "std")]

use super::{BridgeTransport, RadioMode, SocketAddr, TransportError};
use heapless::Vec;
use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddrV4, UdpSocket};

/// Maximum datagram size handled (standard MTU-sized)
pub const UDP_DATAGRAM_SIZE: usize = 1500;

fn to_std(addr: SocketAddr) -> SocketAddrV4 {
    SocketAddrV4::new(
        Ipv4Addr::new(addr.ip[0], addr.ip[1], addr.ip[2], addr.ip[3]),
        addr.port,
    )
}

fn from_std(addr: std::net::SocketAddr) -> SocketAddr {
    match addr {
        std::net::SocketAddr::V4(v4) => SocketAddr::new(v4.ip().octets(), v4.port()),
        // The socket is bound to an IPv4 address; V6 senders do not occur
        std::net::SocketAddr::V6(v6) => SocketAddr::new([0, 0, 0, 0], v6.port()),
    }
}

/// [`BridgeTransport`] backed by a std UDP socket
pub struct UdpBridgeTransport {
    socket: UdpSocket,
    rx_buf: [u8; UDP_DATAGRAM_SIZE],
    rx_len: usize,
    rx_pos: usize,
    sender: SocketAddr,
    tx_buf: Vec<u8, UDP_DATAGRAM_SIZE>,
    tx_dest: SocketAddr,
    tx_open: bool,
    discovery_enabled: bool,
}

impl UdpBridgeTransport {
    /// Bind to the given local port, non-blocking
    pub fn bind(port: u16) -> std::io::Result<Self> {
        let socket = UdpSocket::bind(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port))?;
        socket.set_nonblocking(true)?;
        crate::log_info!("UDP socket bound to port {}", port);
        Ok(Self {
            socket,
            rx_buf: [0u8; UDP_DATAGRAM_SIZE],
            rx_len: 0,
            rx_pos: 0,
            sender: SocketAddr::broadcast(0),
            tx_buf: Vec::new(),
            tx_dest: SocketAddr::broadcast(0),
            tx_open: false,
            discovery_enabled: false,
        })
    }

    /// True while peer-discovery broadcast mode is enabled
    pub fn discovery_enabled(&self) -> bool {
        self.discovery_enabled
    }
}

impl BridgeTransport for UdpBridgeTransport {
    fn begin_outbound(&mut self, dest: SocketAddr) -> Result<(), TransportError> {
        self.tx_buf.clear();
        self.tx_dest = dest;
        self.tx_open = true;
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, TransportError> {
        if !self.tx_open {
            return Err(TransportError::IoError);
        }
        let room = self.tx_buf.capacity() - self.tx_buf.len();
        let accept = buf.len().min(room);
        // Cannot fail: accept is clamped to remaining capacity
        let _ = self.tx_buf.extend_from_slice(&buf[..accept]);
        Ok(accept)
    }

    fn end_outbound(&mut self) -> Result<(), TransportError> {
        self.tx_open = false;
        if self.tx_buf.is_empty() {
            return Ok(());
        }
        match self.socket.send_to(&self.tx_buf, to_std(self.tx_dest)) {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(()),
            Err(_) => Err(TransportError::IoError),
        }
    }

    fn bytes_available(&mut self) -> usize {
        let remaining = self.rx_len - self.rx_pos;
        if remaining > 0 {
            return remaining;
        }
        match self.socket.recv_from(&mut self.rx_buf) {
            Ok((n, from)) => {
                self.rx_len = n;
                self.rx_pos = 0;
                self.sender = from_std(from);
                n
            }
            Err(_) => 0,
        }
    }

    fn read_byte(&mut self) -> Option<u8> {
        if self.rx_pos >= self.rx_len {
            return None;
        }
        let byte = self.rx_buf[self.rx_pos];
        self.rx_pos += 1;
        Some(byte)
    }

    fn sender_addr(&self) -> SocketAddr {
        self.sender
    }

    fn set_discovery(&mut self, enabled: bool) {
        if self.socket.set_broadcast(enabled).is_err() {
            crate::log_warn!("failed to toggle broadcast mode");
        }
        self.discovery_enabled = enabled;
    }

    fn radio_mode(&self) -> RadioMode {
        // Host builds behave like a joined station
        RadioMode::Station
    }

    fn signal_strength(&self) -> i8 {
        // No radio hardware behind a host socket
        0
    }
}
