//! Consistent Overhead Byte Stuffing (COBS) framing.
//!
//! This module implements the byte-stuffing codec used to put packets on a
//! stream transport. It removes every `0x00` from the payload so that a single
//! `0x00` can mark the end of each frame, which lets a receiver resynchronise
//! after any corruption simply by waiting for the next delimiter.
//!
//! ## Frame Layout
//!
//! ```text
//! [code][block ...][code][block ...] ... [0x00]
//! ```
//!
//! Each `code` byte is `block_len + 1` (2-255 for non-empty blocks, 1 for an
//! empty one). A block ends either where the raw data held a zero byte or when
//! it reaches [`COBS_MAX_BLOCK`] bytes. Only in the first case is a zero
//! re-inserted on decode.
//!
//! ## Functions
//!
//! - [`encode_into`]: Encodes a raw slice into a caller-provided frame slice
//! - [`decode_into`]: Decodes a frame slice into a caller-provided raw slice
//! - [`encode`]: Encodes into an owned [`FrameBuf`]
//! - [`decode`]: Decodes into an owned [`PacketBuf`]
//!
//! ## Limitations
//!
//! - A frame that contains a zero byte inside a block is rejected, never truncated
//! - Bytes after the first terminator are ignored

use crate::buffer::{self, FrameBuf, PacketBuf};
use crate::consts::{COBS_DELIMITER, COBS_MAX_BLOCK, max_encoded_len};
use crate::error::CobsError;

/// Encodes `raw` into `output` as a terminated COBS frame.
///
/// # Arguments
/// - `&[u8]` : The raw bytes
/// - `&mut [u8]` : The output buffer, at least [`max_encoded_len`]`(raw.len())` long
///
/// # Returns
/// The length of the frame written, including the terminator.
pub fn encode_into(raw: &[u8], output: &mut [u8]) -> Result<usize, CobsError> {
    if output.len() < max_encoded_len(raw.len()) {
        return Err(CobsError::BufferTooSmall);
    }

    // The code byte of the current block is written once the block closes
    let mut code_at = 0;
    let mut i = 1;
    let mut run: u8 = 0;

    for &byte in raw {
        if byte == COBS_DELIMITER {
            output[code_at] = run + 1;
            code_at = i;
            i += 1;
            run = 0;
        } else {
            output[i] = byte;
            i += 1;
            run += 1;
            if usize::from(run) == COBS_MAX_BLOCK {
                output[code_at] = run + 1;
                code_at = i;
                i += 1;
                run = 0;
            }
        }
    }

    output[code_at] = run + 1;
    output[i] = COBS_DELIMITER;
    Ok(i + 1)
}

/// Decodes a terminated COBS frame into `output`.
///
/// # Arguments
/// - `&[u8]` : The frame, up to and including its terminator
/// - `&mut [u8]` : The output buffer
///
/// # Returns
/// The number of raw bytes written. On error the contents of `output` are
/// unspecified and must be discarded.
pub fn decode_into(frame: &[u8], output: &mut [u8]) -> Result<usize, CobsError> {
    let mut pos = 0;
    let mut len = 0;

    loop {
        let code = *frame.get(pos).ok_or(CobsError::Truncated)?;
        if code == COBS_DELIMITER {
            return Err(CobsError::Malformed);
        }
        pos += 1;

        let block_len = usize::from(code - 1);
        let block = frame
            .get(pos..pos + block_len)
            .ok_or(CobsError::Truncated)?;
        if block.contains(&COBS_DELIMITER) {
            return Err(CobsError::Malformed);
        }
        output
            .get_mut(len..len + block_len)
            .ok_or(CobsError::BufferTooSmall)?
            .copy_from_slice(block);
        len += block_len;
        pos += block_len;

        match frame.get(pos) {
            None => return Err(CobsError::Truncated),
            Some(&COBS_DELIMITER) => return Ok(len),
            Some(_) => {}
        }

        // A full block was split for length, not at a zero
        if block_len < COBS_MAX_BLOCK {
            *output.get_mut(len).ok_or(CobsError::BufferTooSmall)? = 0;
            len += 1;
        }
    }
}

/// Encodes `raw` into an owned, terminated frame.
pub fn encode(raw: &[u8]) -> Result<FrameBuf, CobsError> {
    let mut frame: FrameBuf =
        buffer::zeroed(max_encoded_len(raw.len())).map_err(|_| CobsError::BufferTooSmall)?;
    let len = encode_into(raw, &mut frame)?;
    frame.truncate(len);
    Ok(frame)
}

/// Decodes a terminated frame into owned raw bytes.
///
/// Nothing is returned on failure; a partially decoded frame is dropped.
pub fn decode(frame: &[u8]) -> Result<PacketBuf, CobsError> {
    // Decoded data is always shorter than its frame
    let mut raw: PacketBuf = buffer::scratch(frame.len());
    match decode_into(frame, &mut raw) {
        Ok(len) => {
            raw.truncate(len);
            Ok(raw)
        }
        Err(e) => {
            debug!("dropping frame of {} bytes", frame.len());
            Err(e)
        }
    }
}
