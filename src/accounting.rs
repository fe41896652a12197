//! Sequence-gap loss accounting
//!
//! The bridge invokes an accounting collaborator for every non-heartbeat
//! frame once the peer has been heard from; the collaborator inspects the
//! frame against the heartbeat-tracking state and reports how many frames
//! were lost in between. The algorithm is pluggable; [`SeqGapCounter`] is the
//! default used by the bridge.

use crate::codec::Frame;
use crate::link::HeartbeatTracking;

/// Loss/gap accounting capability
pub trait GapAccounting {
    /// Inspect one received frame, returning the number of frames lost
    /// since the previous one
    fn on_frame(&mut self, frame: &Frame, tracking: &mut HeartbeatTracking) -> u32;
}

/// Default accounting: wrapping sequence-number gap detection
///
/// A frame arriving with the expected sequence number reports zero loss; a
/// frame arriving N numbers ahead reports N lost frames. Reordered frames
/// (sequence behind expected) show up as a large wrapped gap; the protocol
/// accepts that inaccuracy rather than buffering for reordering.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeqGapCounter;

impl GapAccounting for SeqGapCounter {
    fn on_frame(&mut self, frame: &Frame, tracking: &mut HeartbeatTracking) -> u32 {
        let lost = frame.seq.wrapping_sub(tracking.expected_seq) as u32;
        tracking.expected_seq = frame.seq.wrapping_add(1);
        lost
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(seq: u8) -> Frame {
        Frame::new(30, 1, 1, seq, &[0; 4]).unwrap()
    }

    #[test]
    fn test_in_order_no_loss() {
        let mut counter = SeqGapCounter;
        let mut tracking = HeartbeatTracking {
            expected_seq: 10,
            ..Default::default()
        };

        assert_eq!(counter.on_frame(&frame(10), &mut tracking), 0);
        assert_eq!(tracking.expected_seq, 11);
        assert_eq!(counter.on_frame(&frame(11), &mut tracking), 0);
    }

    #[test]
    fn test_gap_counts_lost_frames() {
        let mut counter = SeqGapCounter;
        let mut tracking = HeartbeatTracking {
            expected_seq: 10,
            ..Default::default()
        };

        assert_eq!(counter.on_frame(&frame(13), &mut tracking), 3);
        assert_eq!(tracking.expected_seq, 14);
    }

    #[test]
    fn test_gap_across_sequence_wrap() {
        let mut counter = SeqGapCounter;
        let mut tracking = HeartbeatTracking {
            expected_seq: 254,
            ..Default::default()
        };

        // 254 dropped, 255 dropped, 1 received: gap of 3 (wrapping)
        assert_eq!(counter.on_frame(&frame(1), &mut tracking), 3);
        assert_eq!(tracking.expected_seq, 2);
    }
}
