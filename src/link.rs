//! The framed link: packets wrapped in COBS frames on a byte stream.
//!
//! Outbound, a configured and stamped [`Message`] is packetized and COBS
//! encoded by [`frame`]. Inbound, a [`FrameAccumulator`] collects bytes from
//! the transport until a delimiter arrives, and [`unframe`] turns the frame
//! back into a validated [`Message`].
//!
//! ```rust
//! use telemetry_core::link::{self, FrameAccumulator};
//! use telemetry_core::packet::Message;
//!
//! let mut msg = Message::new();
//! msg.configure(2, 1, &[0x00, 0x10]).unwrap();
//! msg.stamp_sentinel().unwrap();
//! let frame = link::frame(&mut msg).unwrap();
//!
//! let mut rx: FrameAccumulator<64> = FrameAccumulator::new();
//! let mut received = None;
//! for &byte in frame.iter() {
//!     if let Some(complete) = rx.push(byte) {
//!         received = Some(link::unframe(complete).unwrap());
//!     }
//! }
//! assert_eq!(received.unwrap().payload(), &[0x00, 0x10]);
//! ```

use crate::buffer::FrameBuf;
use crate::cobs;
use crate::consts::COBS_DELIMITER;
use crate::error::LinkError;
use crate::packet::Message;

/// Encodes the header of `msg`, packetizes it and COBS frames the result.
///
/// The message must already be configured and stamped.
pub fn frame(msg: &mut Message) -> Result<FrameBuf, LinkError> {
    let _ = msg.encode_header()?;
    let packet = msg.packetize()?;
    let frame = cobs::encode(&packet)?;
    trace!(
        "framed topic {} command {} into {} bytes",
        msg.topic(),
        msg.command(),
        frame.len()
    );
    Ok(frame)
}

/// Decodes a terminated COBS frame and validates the packet inside it.
pub fn unframe(frame: &[u8]) -> Result<Message, LinkError> {
    let packet = cobs::decode(frame)?;
    Ok(Message::depacketize(&packet)?)
}

/// Collects stream bytes into delimiter-terminated frames.
///
/// `N` bounds a single frame including its delimiter. A frame that grows past
/// `N` is discarded whole once its delimiter arrives, and collection resumes
/// with the next byte.
#[derive(Debug)]
pub struct FrameAccumulator<const N: usize> {
    buf: heapless::Vec<u8, N>,
    overflowed: bool,
    complete: bool,
}

impl<const N: usize> FrameAccumulator<N> {
    /// Creates an empty accumulator.
    pub const fn new() -> Self {
        Self {
            buf: heapless::Vec::new(),
            overflowed: false,
            complete: false,
        }
    }

    /// Feeds one byte from the transport.
    ///
    /// Returns the complete frame, terminator included, when `byte` is the
    /// delimiter. The returned frame is released on the next call.
    pub fn push(&mut self, byte: u8) -> Option<&[u8]> {
        if self.complete {
            self.reset();
        }

        if self.buf.push(byte).is_err() {
            self.overflowed = true;
        }
        if byte != COBS_DELIMITER {
            return None;
        }

        if self.overflowed {
            debug!("dropping frame longer than {} bytes", N);
            self.reset();
            return None;
        }
        if self.buf.len() == 1 {
            // Back-to-back delimiters carry no frame
            self.reset();
            return None;
        }

        self.complete = true;
        Some(self.buf.as_slice())
    }

    /// Bytes collected toward the current frame.
    pub fn pending(&self) -> usize {
        if self.complete { 0 } else { self.buf.len() }
    }

    /// Discards any partial frame.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.overflowed = false;
        self.complete = false;
    }
}

impl<const N: usize> Default for FrameAccumulator<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CobsError, PacketError};

    fn framed(topic: u8, payload: &[u8]) -> FrameBuf {
        let mut msg = Message::new();
        msg.configure(topic, 4, payload).unwrap();
        let _ = msg.set_millistamp(5_000).unwrap();
        frame(&mut msg).unwrap()
    }

    fn feed<const N: usize>(rx: &mut FrameAccumulator<N>, bytes: &[u8]) -> Vec<Vec<u8>> {
        let mut frames = Vec::new();
        for &b in bytes {
            if let Some(f) = rx.push(b) {
                frames.push(f.to_vec());
            }
        }
        frames
    }

    #[test]
    fn test_frame_round_trip() {
        let frame = framed(9, &[0x00, 0x01, 0x00]);
        let msg = unframe(&frame).unwrap();
        assert_eq!(msg.topic(), 9);
        assert_eq!(msg.command(), 4);
        assert_eq!(msg.millistamp(), Some(5_000));
        assert_eq!(msg.payload(), &[0x00, 0x01, 0x00]);
    }

    #[test]
    fn test_frame_requires_millistamp() {
        let mut msg = Message::new();
        msg.configure(1, 1, &[]).unwrap();
        assert_eq!(
            frame(&mut msg),
            Err(LinkError::Packet(PacketError::MissingMillistamp))
        );
    }

    #[test]
    fn test_unframe_errors() {
        assert_eq!(
            unframe(&[0x03, 0x11, 0x00, 0x00]),
            Err(LinkError::Framing(CobsError::Malformed))
        );
        // A well-formed frame around a runt packet
        assert_eq!(
            unframe(&[0x04, 0x01, 0x02, 0x03, 0x00]),
            Err(LinkError::Packet(PacketError::TooShort(3)))
        );
    }

    #[test]
    fn test_accumulator_splits_stream() {
        let a = framed(1, b"first");
        let b = framed(2, b"second");
        let mut stream = Vec::new();
        stream.extend_from_slice(&a);
        stream.push(COBS_DELIMITER);
        stream.extend_from_slice(&b);

        let mut rx: FrameAccumulator<64> = FrameAccumulator::default();
        let frames = feed(&mut rx, &stream);
        assert_eq!(frames, vec![a.to_vec(), b.to_vec()]);
        assert_eq!(unframe(&frames[1]).unwrap().payload(), b"second");
        assert_eq!(rx.pending(), 0);
    }

    #[test]
    fn test_accumulator_resyncs_after_overflow() {
        let good = framed(3, b"ok");
        let mut stream = vec![0x55u8; 40];
        stream.push(COBS_DELIMITER);
        stream.extend_from_slice(&good);

        let mut rx: FrameAccumulator<16> = FrameAccumulator::new();
        let frames = feed(&mut rx, &stream);
        assert_eq!(frames, vec![good.to_vec()]);
    }

    #[test]
    fn test_accumulator_recovers_from_corruption() {
        let mut bad = framed(3, b"payload");
        bad[4] ^= 0x20;
        let good = framed(4, b"payload");
        let mut stream = bad.to_vec();
        stream.extend_from_slice(&good);

        let mut rx: FrameAccumulator<64> = FrameAccumulator::new();
        let results: Vec<_> = feed(&mut rx, &stream)
            .iter()
            .map(|f| unframe(f).map(|m| m.topic()))
            .collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_err());
        assert_eq!(results[1], Ok(4));
    }

    #[test]
    fn test_accumulator_partial_and_reset() {
        let mut rx: FrameAccumulator<8> = FrameAccumulator::new();
        assert!(rx.push(0x02).is_none());
        assert_eq!(rx.pending(), 1);
        rx.reset();
        assert_eq!(rx.pending(), 0);
        assert_eq!(rx.push(0x01), None);
        assert_eq!(rx.push(0x00), Some(&[0x01, 0x00][..]));
    }
}
