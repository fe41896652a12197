//! MAVLink Frame Codec
//!
//! Serializes frames to wire bytes and incrementally parses wire bytes into
//! frames. Parser state persists across calls, so a frame split across two
//! datagrams still parses correctly.
//!
//! # Wire format
//!
//! The framing matches the shared bridge protocol byte-for-byte:
//!
//! ```text
//! 0xFE | len | seq | sysid | compid | msgid | payload[len] | ck_lo | ck_hi
//! ```
//!
//! The checksum is the X.25 / CRC-16-MCRF4XX accumulate over every byte after
//! the magic, initialized to 0xFFFF and transmitted low byte first.
//!
//! # Error behavior
//!
//! Malformed or corrupt input never raises an error: bytes outside a frame
//! boundary are discarded, CRC failures drop the frame and are only visible
//! in [`CodecStats`]. This is deliberate; the protocol is lossy-tolerant.

use heapless::Vec;

/// Frame start magic byte
pub const FRAME_MAGIC: u8 = 0xFE;

/// Maximum payload length (len field is one byte)
pub const MAX_PAYLOAD_LEN: usize = 255;

/// Bytes of framing around the payload (magic..msgid + 2 CRC bytes)
pub const FRAME_OVERHEAD: usize = 8;

/// Largest possible serialized frame
pub const MAX_FRAME_LEN: usize = FRAME_OVERHEAD + MAX_PAYLOAD_LEN;

/// Scratch buffer size for outbound serialization
///
/// Larger than [`MAX_FRAME_LEN`]; sized to the transport's maximum datagram
/// payload so encode can never overrun a send buffer.
pub const TX_SCRATCH_SIZE: usize = 300;

/// HEARTBEAT message id
pub const MSG_ID_HEARTBEAT: u8 = 0;

/// RADIO_STATUS message id
pub const MSG_ID_RADIO_STATUS: u8 = 109;

/// Component id used by UDP bridge endpoints (MAV_COMP_ID_UDP_BRIDGE)
pub const COMP_ID_UDP_BRIDGE: u8 = 240;

const CRC_INIT: u16 = 0xFFFF;

/// X.25 CRC accumulate step (CRC-16-MCRF4XX)
fn crc_accumulate(byte: u8, crc: &mut u16) {
    let mut tmp = byte ^ (*crc & 0xFF) as u8;
    tmp ^= tmp << 4;
    *crc = (*crc >> 8) ^ ((tmp as u16) << 8) ^ ((tmp as u16) << 3) ^ ((tmp as u16) >> 4);
}

/// Codec error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CodecError {
    /// Payload exceeds [`MAX_PAYLOAD_LEN`]
    PayloadTooLarge,
    /// Destination buffer cannot hold the serialized frame
    BufferTooSmall,
}

impl core::fmt::Display for CodecError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CodecError::PayloadTooLarge => write!(f, "payload exceeds maximum frame size"),
            CodecError::BufferTooSmall => write!(f, "destination buffer too small"),
        }
    }
}

/// One complete, validated unit of the bridged protocol
///
/// Immutable once parsed. Ownership transfers to the endpoint that parsed it
/// for the duration of processing, then the frame is either discarded or
/// handed to the counterpart endpoint's forwarding entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Message kind id
    pub msg_id: u8,
    /// Source system id
    pub system_id: u8,
    /// Source component id
    pub component_id: u8,
    /// Sequence number
    pub seq: u8,
    /// Message payload
    pub payload: Vec<u8, MAX_PAYLOAD_LEN>,
}

impl Frame {
    /// Build a frame from parts
    ///
    /// Fails with [`CodecError::PayloadTooLarge`] if the payload does not fit.
    pub fn new(
        msg_id: u8,
        system_id: u8,
        component_id: u8,
        seq: u8,
        payload: &[u8],
    ) -> Result<Self, CodecError> {
        let payload = Vec::from_slice(payload).map_err(|_| CodecError::PayloadTooLarge)?;
        Ok(Self {
            msg_id,
            system_id,
            component_id,
            seq,
            payload,
        })
    }

    /// True if this is a HEARTBEAT frame
    pub fn is_heartbeat(&self) -> bool {
        self.msg_id == MSG_ID_HEARTBEAT
    }

    /// Serialize to wire bytes
    ///
    /// Deterministic, no side effects. Returns the number of bytes written,
    /// or [`CodecError::BufferTooSmall`] if `buf` cannot hold the frame.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, CodecError> {
        let len = self.payload.len();
        let total = FRAME_OVERHEAD + len;
        if buf.len() < total {
            return Err(CodecError::BufferTooSmall);
        }
        buf[0] = FRAME_MAGIC;
        buf[1] = len as u8;
        buf[2] = self.seq;
        buf[3] = self.system_id;
        buf[4] = self.component_id;
        buf[5] = self.msg_id;
        buf[6..6 + len].copy_from_slice(&self.payload);

        let mut crc = CRC_INIT;
        for &b in &buf[1..6 + len] {
            crc_accumulate(b, &mut crc);
        }
        buf[6 + len] = (crc & 0xFF) as u8;
        buf[7 + len] = (crc >> 8) as u8;
        Ok(total)
    }
}

/// Codec statistics for monitoring and diagnostics
#[derive(Debug, Clone, Copy, Default)]
pub struct CodecStats {
    /// Total frames successfully parsed
    pub frames_parsed: u32,
    /// Parse errors (CRC failures)
    pub parse_errors: u32,
}

/// Parser state, one variant per wire field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    Idle,
    Len,
    Seq,
    SysId,
    CompId,
    MsgId,
    Payload,
    CrcLo,
    CrcHi,
}

/// Incremental frame parser
///
/// Feed one byte at a time; yields a frame when a complete, checksum-valid
/// frame boundary is reached. Tolerates being fed bytes from many separate
/// datagrams with no reset between them.
pub struct FrameCodec {
    state: ParseState,
    len: u8,
    seq: u8,
    system_id: u8,
    component_id: u8,
    msg_id: u8,
    payload: Vec<u8, MAX_PAYLOAD_LEN>,
    crc: u16,
    crc_lo: u8,
    stats: CodecStats,
}

impl FrameCodec {
    /// Create a new codec in the idle state
    pub fn new() -> Self {
        Self {
            state: ParseState::Idle,
            len: 0,
            seq: 0,
            system_id: 0,
            component_id: 0,
            msg_id: 0,
            payload: Vec::new(),
            crc: CRC_INIT,
            crc_lo: 0,
            stats: CodecStats::default(),
        }
    }

    /// Get codec statistics
    pub fn stats(&self) -> CodecStats {
        self.stats
    }

    /// Consume one byte of input, yielding a frame at a valid frame boundary
    ///
    /// Bytes outside a frame are silently discarded. A CRC mismatch drops the
    /// frame and returns the parser to idle; the next magic byte starts a new
    /// frame.
    pub fn feed(&mut self, byte: u8) -> Option<Frame> {
        match self.state {
            ParseState::Idle => {
                if byte == FRAME_MAGIC {
                    self.crc = CRC_INIT;
                    self.payload.clear();
                    self.state = ParseState::Len;
                }
            }
            ParseState::Len => {
                self.len = byte;
                crc_accumulate(byte, &mut self.crc);
                self.state = ParseState::Seq;
            }
            ParseState::Seq => {
                self.seq = byte;
                crc_accumulate(byte, &mut self.crc);
                self.state = ParseState::SysId;
            }
            ParseState::SysId => {
                self.system_id = byte;
                crc_accumulate(byte, &mut self.crc);
                self.state = ParseState::CompId;
            }
            ParseState::CompId => {
                self.component_id = byte;
                crc_accumulate(byte, &mut self.crc);
                self.state = ParseState::MsgId;
            }
            ParseState::MsgId => {
                self.msg_id = byte;
                crc_accumulate(byte, &mut self.crc);
                self.state = if self.len == 0 {
                    ParseState::CrcLo
                } else {
                    ParseState::Payload
                };
            }
            ParseState::Payload => {
                crc_accumulate(byte, &mut self.crc);
                // len <= 255 == capacity, push cannot fail
                let _ = self.payload.push(byte);
                if self.payload.len() == self.len as usize {
                    self.state = ParseState::CrcLo;
                }
            }
            ParseState::CrcLo => {
                self.crc_lo = byte;
                self.state = ParseState::CrcHi;
            }
            ParseState::CrcHi => {
                self.state = ParseState::Idle;
                let received = u16::from_le_bytes([self.crc_lo, byte]);
                if received == self.crc {
                    self.stats.frames_parsed += 1;
                    return Some(Frame {
                        msg_id: self.msg_id,
                        system_id: self.system_id,
                        component_id: self.component_id,
                        seq: self.seq,
                        payload: self.payload.clone(),
                    });
                }
                self.stats.parse_errors += 1;
            }
        }
        None
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// RADIO_STATUS payload length
pub const RADIO_STATUS_PAYLOAD_LEN: usize = 8;

/// RADIO_STATUS message body
///
/// Carries merged link-quality statistics from both bridge sides back to the
/// GCS. Field order on the wire follows MAVLink sizing rules: u16 fields
/// first (little-endian), then u8 fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RadioStatus {
    /// Percent of frames lost on the vehicle-to-bridge link
    pub rx_errors_percent: u16,
    /// Percent of frames lost on the bridge-to-GCS link
    pub fixed_percent: u16,
    /// Local signal strength (valid in station radio mode only, else 0)
    pub rssi: u8,
    /// Remote signal strength (not available, always 0)
    pub remote_rssi: u8,
    /// Counterpart transmit queue occupancy
    pub tx_buffer: u8,
    /// Background noise level (not available, always 0)
    pub noise: u8,
}

impl RadioStatus {
    /// Encode to the wire payload layout
    pub fn to_payload(&self) -> [u8; RADIO_STATUS_PAYLOAD_LEN] {
        let mut p = [0u8; RADIO_STATUS_PAYLOAD_LEN];
        p[0..2].copy_from_slice(&self.rx_errors_percent.to_le_bytes());
        p[2..4].copy_from_slice(&self.fixed_percent.to_le_bytes());
        p[4] = self.rssi;
        p[5] = self.remote_rssi;
        p[6] = self.tx_buffer;
        p[7] = self.noise;
        p
    }

    /// Decode from a wire payload, or None if truncated
    pub fn from_payload(payload: &[u8]) -> Option<Self> {
        if payload.len() < RADIO_STATUS_PAYLOAD_LEN {
            return None;
        }
        Some(Self {
            rx_errors_percent: u16::from_le_bytes([payload[0], payload[1]]),
            fixed_percent: u16::from_le_bytes([payload[2], payload[3]]),
            rssi: payload[4],
            remote_rssi: payload[5],
            tx_buffer: payload[6],
            noise: payload[7],
        })
    }
}
