//! # Packet Checksum
//!
//! Photon's CRC is the reflected CRC-32 (polynomial `0xEDB88320`, initial value
//! `0xFFFFFFFF`) without the final XOR, i.e. the bitwise complement of the
//! standard CRC-32 that `crc32fast` produces.
//!
//! The sender computes it while the checksum field is still zero, so verification
//! zeroes that field in a scratch copy before recomputing.

use crate::core::packet::CRC_FIELD_LENGTH;

/// Compute the Photon checksum over `data`.
#[inline]
pub fn calculate(data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(data);
    !hasher.finalize()
}

/// Check the big-endian checksum stored at `field_offset` against the checksum of
/// `buffer` with that field zeroed. The caller's buffer is not modified.
///
/// Returns `false` when the field does not fit inside the buffer.
pub fn verify(buffer: &[u8], field_offset: usize) -> bool {
    let Some(field_end) = field_offset.checked_add(CRC_FIELD_LENGTH) else {
        return false;
    };
    let Some(field) = buffer.get(field_offset..field_end) else {
        return false;
    };
    let stored = u32::from_be_bytes([field[0], field[1], field[2], field[3]]);

    let mut scratch = buffer.to_vec();
    scratch[field_offset..field_end].fill(0);

    stored == calculate(&scratch)
}

/// Write the checksum for `buffer` into its field at `field_offset`.
///
/// Counterpart of [`verify`], used when synthesizing checksum-enabled datagrams.
pub fn seal(buffer: &mut [u8], field_offset: usize) {
    let Some(field_end) = field_offset.checked_add(CRC_FIELD_LENGTH) else {
        return;
    };
    if field_end > buffer.len() {
        return;
    }
    buffer[field_offset..field_end].fill(0);
    let crc = calculate(buffer);
    buffer[field_offset..field_end].copy_from_slice(&crc.to_be_bytes());
}
