//! CRC-16/XMODEM checksum over packet bytes.
//!
//! Polynomial `0x1021`, initial value `0x0000`, no reflection, no final XOR.
//! Used for transmission-error detection only.

use ::crc::{CRC_16_XMODEM, Crc};

static XMODEM: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// Computes the CRC-16/XMODEM of `data`, MSB-first.
pub fn crc16_xmodem(data: &[u8]) -> u16 {
    XMODEM.checksum(data)
}

/// Computes the CRC-16/XMODEM over several slices as if they were concatenated.
pub fn crc16_xmodem_parts(parts: &[&[u8]]) -> u16 {
    let mut digest = XMODEM.digest();
    for part in parts {
        digest.update(part);
    }
    digest.finalize()
}

pub(crate) fn hi8(x: u16) -> u8 {
    (x >> 8) as u8
}

pub(crate) fn lo8(x: u16) -> u8 {
    (x & 0xff) as u8
}
