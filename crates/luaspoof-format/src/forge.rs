//! CRC32 forging
//!
//! CRC32 is affine over GF(2), so for any running state there is exactly one
//! 4-byte block that moves it to any chosen final value. [`forge_suffix`]
//! computes that block by running the register backwards from the target,
//! one bit at a time.

use crate::checksum::crc32;

/// Reflected CRC32 polynomial
pub const CRC32_POLY: u32 = 0xEDB8_8320;

/// Polynomial constant used when stepping the register backwards
const CRC32_POLY_INVERSE: u32 = 0x5B35_8FD3;

/// Length of a correction suffix in bytes
pub const SUFFIX_LEN: usize = 4;

/// Compute the 4 bytes that, appended to a payload with CRC32 `actual`, make
/// the CRC32 of the whole sequence equal `target`.
///
/// Always solvable. When `actual == target` the result is still a valid
/// suffix, but [`correction_suffix`] is what callers want in that case.
pub fn forge_suffix(actual: u32, target: u32) -> [u8; SUFFIX_LEN] {
    let mut fix = 0u32;
    let mut inverted = !target;

    for _ in 0..32 {
        fix = if fix & 1 == 1 {
            (fix >> 1) ^ CRC32_POLY
        } else {
            fix >> 1
        };

        if inverted & 1 == 1 {
            fix ^= CRC32_POLY_INVERSE;
        }

        inverted >>= 1;
    }

    (fix ^ !actual).to_le_bytes()
}

/// Correction suffix for a payload with CRC32 `actual`, or `None` if the
/// payload already has the `target` checksum.
pub fn correction_suffix(actual: u32, target: u32) -> Option<[u8; SUFFIX_LEN]> {
    (actual != target).then(|| forge_suffix(actual, target))
}

/// Return `payload` followed by whatever suffix makes its CRC32 equal `target`
pub fn forge_apply(payload: &[u8], target: u32) -> Vec<u8> {
    let suffix = correction_suffix(crc32(payload), target);
    let mut forged = Vec::with_capacity(payload.len() + SUFFIX_LEN);
    forged.extend_from_slice(payload);
    if let Some(suffix) = suffix {
        forged.extend_from_slice(&suffix);
    }
    forged
}
