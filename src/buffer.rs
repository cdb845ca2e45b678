//! Owned byte buffers for payloads, packets and frames.
//!
//! Without the `std` feature these are fixed-capacity `heapless::Vec`s sized
//! from the protocol limits in [`consts`](crate::consts). With `std` they are
//! plain growable vectors.

#[cfg(not(feature = "std"))]
use crate::consts::{MAX_FRAME_LEN, MAX_PACKET_LEN, MAX_PAYLOAD_LEN};

/// Owned message payload, at most `MAX_PAYLOAD_LEN` bytes.
#[cfg(not(feature = "std"))]
pub type PayloadBuf = heapless::Vec<u8, MAX_PAYLOAD_LEN>;
/// Owned message payload.
#[cfg(feature = "std")]
pub type PayloadBuf = Vec<u8>;

/// A finalized packet (header, payload and CRC), at most `MAX_PACKET_LEN` bytes.
#[cfg(not(feature = "std"))]
pub type PacketBuf = heapless::Vec<u8, MAX_PACKET_LEN>;
/// A finalized packet (header, payload and CRC).
#[cfg(feature = "std")]
pub type PacketBuf = Vec<u8>;

/// A COBS frame including its terminator, at most `MAX_FRAME_LEN` bytes.
#[cfg(not(feature = "std"))]
pub type FrameBuf = heapless::Vec<u8, MAX_FRAME_LEN>;
/// A COBS frame including its terminator.
#[cfg(feature = "std")]
pub type FrameBuf = Vec<u8>;

/// The fixed capacity of a buffer was exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CapacityError;

/// A buffer of exactly `len` zero bytes.
#[cfg(not(feature = "std"))]
pub(crate) fn zeroed<const N: usize>(len: usize) -> Result<heapless::Vec<u8, N>, CapacityError> {
    let mut buf = heapless::Vec::new();
    buf.resize(len, 0).map_err(|_| CapacityError)?;
    Ok(buf)
}

/// A buffer of exactly `len` zero bytes.
#[cfg(feature = "std")]
pub(crate) fn zeroed(len: usize) -> Result<Vec<u8>, CapacityError> {
    Ok(vec![0; len])
}

/// A zeroed working buffer of `len` bytes, clamped to the buffer capacity.
#[cfg(not(feature = "std"))]
pub(crate) fn scratch<const N: usize>(len: usize) -> heapless::Vec<u8, N> {
    let mut buf = heapless::Vec::new();
    let _ = buf.resize(len.min(N), 0);
    buf
}

/// A zeroed working buffer of `len` bytes.
#[cfg(feature = "std")]
pub(crate) fn scratch(len: usize) -> Vec<u8> {
    vec![0; len]
}

/// Appends `data`, failing without modification if it would not fit.
#[cfg(not(feature = "std"))]
pub(crate) fn extend<const N: usize>(
    buf: &mut heapless::Vec<u8, N>,
    data: &[u8],
) -> Result<(), CapacityError> {
    buf.extend_from_slice(data).map_err(|_| CapacityError)
}

/// Appends `data`.
#[cfg(feature = "std")]
pub(crate) fn extend(buf: &mut Vec<u8>, data: &[u8]) -> Result<(), CapacityError> {
    buf.extend_from_slice(data);
    Ok(())
}
