//! XOR checksum shared by the configuration image and feature reports.
//!
//! Detects corruption and truncation, not tampering.

/// XOR of all bytes in `data`.
#[inline]
#[must_use]
pub fn xor_checksum(data: &[u8]) -> u8 {
    data.iter().fold(0, |acc, &b| acc ^ b)
}

/// XOR of all bytes in `data` except the one at `skip`.
#[inline]
#[must_use]
pub fn xor_checksum_skipping(data: &[u8], skip: usize) -> u8 {
    data.iter()
        .enumerate()
        .filter(|&(i, _)| i != skip)
        .fold(0, |acc, (_, &b)| acc ^ b)
}
