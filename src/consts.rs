//! Constants used across the framing, packet and ADC implementations.
//!
//! This module defines the protocol-wide widths and limits for the packet
//! header, the sizing of the COBS frame buffers, and the command opcodes and
//! register addresses of the ADS1256 delta-sigma converter.
//!
//! ## Key Concepts
//!
//! - **Header fields**: Four bit-packed fields, MSB-first, 48 bits in total.
//! - **Payload Limits**: Derived from the 11-bit `data_length` field.
//! - **Frame Sizing**: COBS adds one length byte per 254-byte block plus the
//!   terminating delimiter.
//! - **Opcodes**: Fixed command bytes from the ADS1256 datasheet (Table 24),
//!   some of which are OR'd with a register address.
//!
//! These values should be used wherever framing or buffer logic is implemented to ensure
//! consistent message boundaries on both ends of the link.

/// Width (in bits) of the millisecond timestamp field.
pub const MILLISTAMP_BITS: u32 = 27;

/// Width (in bits) of the topic field.
pub const TOPIC_BITS: u32 = 6;

/// Width (in bits) of the command field.
pub const COMMAND_BITS: u32 = 4;

/// Width (in bits) of the payload length field.
pub const DATA_LENGTH_BITS: u32 = 11;

/// Largest topic that fits in [`TOPIC_BITS`].
pub const MAX_TOPIC: u8 = (1 << TOPIC_BITS) - 1;

/// Largest command that fits in [`COMMAND_BITS`].
pub const MAX_COMMAND: u8 = (1 << COMMAND_BITS) - 1;

/// Largest millistamp that fits in [`MILLISTAMP_BITS`].
///
/// Valid timestamps are further constrained to be below [`MILLIS_PER_DAY`].
pub const MAX_MILLISTAMP: u32 = (1 << MILLISTAMP_BITS) - 1;

/// Number of milliseconds in one day. Millistamps must be strictly less.
pub const MILLIS_PER_DAY: u32 = 86_400_000;

/// Millistamp assigned when timestamping is explicitly disabled.
pub const SENTINEL_MILLISTAMP: u32 = 1;

/// Length (in bytes) of the packed packet header.
pub const HEADER_LEN: usize = 6;

/// Length (in bytes) of the trailing CRC-16.
pub const CRC_LEN: usize = 2;

/// Maximum size (in bytes) of a packet payload, bounded by [`DATA_LENGTH_BITS`].
pub const MAX_PAYLOAD_LEN: usize = (1 << DATA_LENGTH_BITS) - 1;

/// Smallest well-formed packet: a header, an empty payload and the CRC.
pub const MIN_PACKET_LEN: usize = HEADER_LEN + CRC_LEN;

/// Maximum size (in bytes) of a complete packet, before framing.
pub const MAX_PACKET_LEN: usize = HEADER_LEN + MAX_PAYLOAD_LEN + CRC_LEN;

/// Longest run of non-zero bytes a single COBS block may carry.
pub const COBS_MAX_BLOCK: usize = 254;

/// Frame delimiter. Never appears inside an encoded frame.
pub const COBS_DELIMITER: u8 = 0x00;

/// Worst-case encoded size of `len` raw bytes, including the terminator.
pub const fn max_encoded_len(len: usize) -> usize {
    len + len / COBS_MAX_BLOCK + 2
}

/// Maximum size (in bytes) of a framed packet on the wire.
pub const MAX_FRAME_LEN: usize = max_encoded_len(MAX_PACKET_LEN);

/// ADS1256 command opcodes (datasheet Table 24).
pub mod opcode {
    /// Completes SYNC and exits standby mode.
    pub const WAKEUP: u8 = 0xFF;
    /// Read a single conversion result.
    pub const RDATA: u8 = 0x01;
    /// Read data continuously.
    pub const RDATAC: u8 = 0x03;
    /// Stop read data continuously.
    pub const SDATAC: u8 = 0x0F;
    /// Read register; OR'd with the register address.
    pub const RREG: u8 = 0x10;
    /// Write register; OR'd with the register address.
    pub const WREG: u8 = 0x50;
    /// Offset and gain self-calibration.
    pub const SELFCAL: u8 = 0xF0;
    /// Synchronise the A/D conversion.
    pub const SYNC: u8 = 0xFC;
}

/// ADS1256 register addresses (datasheet Table 23).
pub mod register {
    /// Status control register.
    pub const STATUS: u8 = 0x00;
    /// Input multiplexer control register.
    pub const MUX: u8 = 0x01;
    /// A/D control register: clock out, sensor detect, gain.
    pub const ADCON: u8 = 0x02;
    /// A/D data rate.
    pub const DRATE: u8 = 0x03;
    /// GPIO control register.
    pub const IO: u8 = 0x04;
    /// Offset calibration, low byte.
    pub const OFC0: u8 = 0x05;
    /// Offset calibration, middle byte.
    pub const OFC1: u8 = 0x06;
    /// Offset calibration, high byte.
    pub const OFC2: u8 = 0x07;
    /// Full-scale calibration, low byte.
    pub const FSC0: u8 = 0x08;
    /// Full-scale calibration, middle byte.
    pub const FSC1: u8 = 0x09;
    /// Full-scale calibration, high byte.
    pub const FSC2: u8 = 0x0A;
    /// Highest valid register address.
    pub const LAST: u8 = FSC2;
}

/// Full-scale divisor of the 24-bit converter output, 2^23.
pub const ADC_FULL_SCALE: f32 = 8_388_608.0;
