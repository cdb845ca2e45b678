//! Error types.
//!
//! Every failure is returned to the immediate caller; nothing here is retried
//! or logged as a substitute for being returned.

use thiserror::Error;

/// Failure to de-frame a COBS frame.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum CobsError {
    /// A block contained a zero byte, or a length byte was zero.
    #[error("malformed COBS frame")]
    Malformed,
    /// The frame ended before a block or its terminator was complete.
    #[error("truncated COBS frame")]
    Truncated,
    /// The output buffer cannot hold the result.
    #[error("output buffer too small")]
    BufferTooSmall,
}

/// Failure to build, validate or parse a packet.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum PacketError {
    /// Topic does not fit in 6 bits.
    #[error("topic {0} does not fit in 6 bits")]
    BadTopic(u8),
    /// Command does not fit in 4 bits.
    #[error("command {0} does not fit in 4 bits")]
    BadCommand(u8),
    /// Payload length does not fit in 11 bits.
    #[error("payload of {0} bytes does not fit in 11 bits")]
    BadDataLength(usize),
    /// Millistamp does not fit in 27 bits.
    #[error("millistamp {0} does not fit in 27 bits")]
    BadMillistamp(u32),
    /// The header was requested before a millistamp was assigned.
    #[error("millistamp must be assigned before encoding the header")]
    MissingMillistamp,
    /// The packet was requested before the header was encoded.
    #[error("header must be encoded before packetizing")]
    MissingHeader,
    /// The assembled packet does not have the expected size.
    #[error("packet length {actual} does not match expected {expected}")]
    BadPacketLength {
        /// `6 + data_length + 2`.
        expected: usize,
        /// Bytes actually assembled.
        actual: usize,
    },
    /// A received packet is shorter than a header plus CRC.
    #[error("packet of {0} bytes is shorter than the 8 byte minimum")]
    TooShort(usize),
    /// A header slice is not exactly 6 bytes.
    #[error("header must be 6 bytes, got {0}")]
    BadHeaderLength(usize),
    /// The transmitted CRC does not match the one computed on receipt.
    #[error("CRC mismatch: received {received:#06x}, computed {computed:#06x}")]
    CrcMismatch {
        /// Trailing CRC of the packet.
        received: u16,
        /// CRC computed over header and payload.
        computed: u16,
    },
    /// The header's `data_length` disagrees with the payload actually present.
    #[error("declared data length {declared} does not match actual {actual}")]
    DataLengthMismatch {
        /// Length decoded from the header.
        declared: u16,
        /// Payload bytes present.
        actual: usize,
    },
    /// The decoded millistamp is not within one day.
    #[error("millistamp {0} does not fit within a day")]
    MillistampOverflow(u32),
    /// The time source reported a non-OK status.
    #[error("time source returned status {0}")]
    TimeSource(u8),
}

/// Failure anywhere on the framed link, outbound or inbound.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum LinkError {
    /// COBS framing failed.
    #[error("framing error: {0}")]
    Framing(#[from] CobsError),
    /// Packet validation failed.
    #[error("packet error: {0}")]
    Packet(#[from] PacketError),
}

/// Invalid time handed to the day clock.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum ClockError {
    /// Milliseconds since midnight must be below one day.
    #[error("{0} ms is not within a day")]
    BeyondMidnight(u32),
    /// Hours, minutes or seconds out of range.
    #[error("invalid time of day {hours}:{minutes}:{seconds}")]
    InvalidTime {
        /// Hours, 0-23.
        hours: u8,
        /// Minutes, 0-59.
        minutes: u8,
        /// Seconds, 0-59.
        seconds: u8,
    },
}

/// Failure of an ADC operation.
///
/// `S` is the SPI bus error type and `P` the pin error type.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AdcError<S, P> {
    /// SPI bus error.
    #[error("SPI bus error: {0:?}")]
    Spi(S),
    /// GPIO error.
    #[error("pin error: {0:?}")]
    Pin(P),
    /// The data-ready interrupt could not be armed.
    #[error("data-ready interrupt setup failed")]
    Interrupt,
    /// Data ready was not asserted within the configured timeout.
    #[error("no data ready within {0} us")]
    Timeout(u32),
    /// The data-ready wait was cancelled.
    #[error("data-ready wait cancelled")]
    Cancelled,
    /// The operation conflicts with a running continuous or cycling session.
    #[error("acquisition session already running")]
    SessionActive,
    /// GPIO index outside 0-3.
    #[error("GPIO pin {0} out of range")]
    InvalidGpioPin(u8),
    /// Register address outside the device map.
    #[error("register {0:#x} out of range")]
    InvalidRegister(u8),
}
