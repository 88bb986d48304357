//! RTP sequence number arithmetic
//!
//! Sequence numbers live on a 16-bit circle. Comparisons take the shorter way
//! around: a raw difference of more than half the space is folded back by
//! one full turn.

use crate::RtpSequenceNumber;

/// Size of the RTP sequence number space
pub const SEQUENCE_SPACE: i32 = 1 << 16;

/// Half of the sequence number space
pub const HALF_SEQUENCE_SPACE: i32 = 1 << 15;

/// Signed circular distance from `b` to `a`.
///
/// Positive iff `a` is logically ahead of `b`. The result lies in
/// `[-32768, 32768]` and `corrected_diff(a, b) == -corrected_diff(b, a)`.
#[inline]
pub fn corrected_diff(a: RtpSequenceNumber, b: RtpSequenceNumber) -> i32 {
    let diff = a as i32 - b as i32;
    if diff > HALF_SEQUENCE_SPACE {
        diff - SEQUENCE_SPACE
    } else if diff < -HALF_SEQUENCE_SPACE {
        diff + SEQUENCE_SPACE
    } else {
        diff
    }
}

/// Whether the raw difference `a - b` wraps forward through zero
#[inline]
pub fn wraps_forward(a: RtpSequenceNumber, b: RtpSequenceNumber) -> bool {
    (a as i32 - b as i32) < -HALF_SEQUENCE_SPACE
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_corrected_diff() {
        // Normal cases
        assert_eq!(corrected_diff(101, 100), 1);
        assert_eq!(corrected_diff(100, 200), -100);

        // Wraparound cases
        assert_eq!(corrected_diff(10, 65530), 16);
        assert_eq!(corrected_diff(65530, 10), -16);
        assert_eq!(corrected_diff(0, 65535), 1);

        // Half-range keeps the raw sign
        assert_eq!(corrected_diff(32768, 0), 32768);
        assert_eq!(corrected_diff(0, 32768), -32768);
        assert_eq!(corrected_diff(32769, 0), -32767);
    }

    #[test]
    fn test_wraps_forward() {
        assert!(wraps_forward(3, 65534));
        assert!(!wraps_forward(65534, 3));
        assert!(!wraps_forward(200, 100));
    }

    proptest! {
        #[test]
        fn corrected_diff_is_antisymmetric(a in any::<u16>(), b in any::<u16>()) {
            prop_assert_eq!(corrected_diff(a, b), -corrected_diff(b, a));
        }

        #[test]
        fn corrected_diff_of_self_is_zero(a in any::<u16>()) {
            prop_assert_eq!(corrected_diff(a, a), 0);
        }

        #[test]
        fn corrected_diff_matches_wrapping_offset(a in any::<u16>(), step in -1000i32..1000) {
            let b = (a as i32 + step).rem_euclid(SEQUENCE_SPACE) as u16;
            prop_assert_eq!(corrected_diff(b, a), step);
        }
    }
}
