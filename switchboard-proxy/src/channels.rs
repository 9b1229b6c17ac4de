//! Channel bitmask codec.
//!
//! Boards store one bit per channel, eight channels per byte. The bit order
//! is fixed by the firmware and is part of the wire contract:
//!
//! ```text
//! byte:      0                   1
//! bit:       7 6 5 4 3 2 1 0     7 6 5 4 3 2 1 0
//! channel:   7 6 5 4 3 2 1 0    15 14 ...      8
//! ```
//!
//! Channel `i` is bit `i % 8` (bit 0 = LSB) of byte `i / 8`. Unused high bits
//! of the last byte are zero when packing and ignored when unpacking.

use bitvec::prelude::*;

use crate::error::{Error, Result};

/// Number of bytes needed to hold `channel_count` channel bits.
pub fn packed_len(channel_count: usize) -> usize {
    channel_count.div_ceil(8)
}

/// Pack one boolean per channel into bytes.
pub fn pack(states: &[bool]) -> Vec<u8> {
    let mut bytes = vec![0u8; packed_len(states.len())];
    let bits = bytes.view_bits_mut::<Lsb0>();
    for (channel, &on) in states.iter().enumerate() {
        bits.set(channel, on);
    }
    bytes
}

/// Unpack exactly `channel_count` channel states.
///
/// Padding bits past `channel_count` are ignored, as are any whole bytes the
/// device sends beyond `packed_len(channel_count)`.
pub fn unpack(bytes: &[u8], channel_count: usize) -> Result<Vec<bool>> {
    let expected = packed_len(channel_count);
    if bytes.len() < expected {
        return Err(Error::ShortChannelBuffer {
            expected,
            actual: bytes.len(),
        });
    }
    let bits = bytes.view_bits::<Lsb0>();
    Ok(bits[..channel_count].iter().by_vals().collect())
}
