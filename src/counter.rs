/// Length of an encoded moving factor in bytes
pub const COUNTER_LEN: usize = 8;

/// The decoded value does not fit in a `u64`
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("counter does not fit in 64 bits")]
pub struct CounterOverflow;

/// Encode a moving factor as 8 big-endian bytes
pub fn encode(counter: u64) -> [u8; COUNTER_LEN] {
    counter.to_be_bytes()
}

/// Decode big-endian bytes into a moving factor
///
/// Leading zero bytes beyond the eighth are accepted, any magnitude above
/// `u64::MAX` is rejected.
pub fn decode(bytes: &[u8]) -> Result<u64, CounterOverflow> {
    bytes.iter().try_fold(0u64, |acc, &byte| {
        acc.checked_mul(256)
            .and_then(|acc| acc.checked_add(u64::from(byte)))
            .ok_or(CounterOverflow)
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn encodes_most_significant_byte_first() {
        assert_eq!(encode(0), [0; 8]);
        assert_eq!(encode(1), [0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(encode(0x0102_0304_0506_0708), [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(encode(0x23523EC), [0, 0, 0, 0, 0x02, 0x35, 0x23, 0xEC]);
    }

    #[test]
    fn round_trips_boundary_values() {
        for n in [0, 1, u64::from(u32::MAX), (1 << 53) - 1, u64::MAX] {
            assert_eq!(decode(&encode(n)).unwrap(), n);
        }
    }

    #[test]
    fn decode_accepts_short_and_zero_prefixed_input() {
        assert_eq!(decode(&[]).unwrap(), 0);
        assert_eq!(decode(&[0x01, 0x00]).unwrap(), 256);
        assert_eq!(decode(&[0, 0, 0, 0, 0, 0, 0, 0, 0, 7]).unwrap(), 7);
    }

    #[test]
    fn decode_rejects_values_wider_than_64_bits() {
        assert_eq!(decode(&[1, 0, 0, 0, 0, 0, 0, 0, 0]), Err(CounterOverflow));
    }
}
