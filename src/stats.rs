//! Link Statistics
//!
//! Counters for sent/received/lost frames and a queue-occupancy gauge, owned
//! per bridge side. The GCS endpoint owns its own instance and reads the
//! counterpart's snapshot when synthesizing radio status reports.
//!
//! Counters are monotonically increasing except `queue_occupancy`, which is a
//! point-in-time gauge. Counters are never reset during normal operation.

/// Per-side link statistics
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkStats {
    /// Frames transmitted on this side
    pub frames_sent: u32,
    /// Frames received and checksum-validated on this side
    pub frames_received: u32,
    /// Frames deemed lost by gap accounting
    pub frames_lost: u32,
    /// Radio status reports transmitted
    pub status_reports_sent: u32,
    /// Transmit queue occupancy gauge
    pub queue_occupancy: u8,
}

/// Percent of frames lost on a link
///
/// Reports 0 when nothing has been received yet; a status report synthesized
/// before the first frame must not divide by zero.
pub fn loss_percent(lost: u32, received: u32) -> u16 {
    if received == 0 {
        return 0;
    }
    ((lost as u64 * 100) / received as u64).min(u16::MAX as u64) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loss_percent() {
        assert_eq!(loss_percent(10, 100), 10);
        assert_eq!(loss_percent(5, 50), 10);
        assert_eq!(loss_percent(0, 100), 0);
        assert_eq!(loss_percent(100, 100), 100);
    }

    #[test]
    fn test_loss_percent_zero_received() {
        // Guarded: no frames received yet reports 0, never divides by zero
        assert_eq!(loss_percent(0, 0), 0);
        assert_eq!(loss_percent(7, 0), 0);
    }

    #[test]
    fn test_loss_percent_saturates() {
        assert_eq!(loss_percent(u32::MAX, 1), u16::MAX);
    }

    #[test]
    fn test_default_is_zeroed() {
        let stats = LinkStats::default();
        assert_eq!(stats.frames_sent, 0);
        assert_eq!(stats.frames_received, 0);
        assert_eq!(stats.frames_lost, 0);
        assert_eq!(stats.status_reports_sent, 0);
        assert_eq!(stats.queue_occupancy, 0);
    }
}
