//! The 32-bit CRC used to trail fragmented, CRC-protected ALPDUs.
//!
//! This is the IEEE 802.3 CRC-32 (polynomial `0x04C11DB7`, reflected input and output, initial
//! value and final XOR both `0xFFFFFFFF`), the same definition used by Ethernet FCS fields.

use crc::{Crc, CRC_32_ISO_HDLC};

const ALGORITHM: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Computes the CRC-32 over `data`.
pub fn crc32(data: &[u8]) -> u32 {
    ALGORITHM.checksum(data)
}
