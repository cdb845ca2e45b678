//! Bit-packed telemetry packets with a CRC-16/XMODEM trailer.
//!
//! A packet is a fixed 6-byte header, `data_length` payload bytes and a
//! big-endian CRC computed over header and payload:
//!
//! ```text
//! [header: 6][payload: data_length][crc_hi][crc_lo]
//! ```
//!
//! The header packs four fields MSB-first across byte boundaries:
//!
//! | Field         | Bits | Range                                   |
//! |---------------|------|-----------------------------------------|
//! | `millistamp`  | 27   | 0 - 134,217,727 (valid: < 86,400,000)   |
//! | `topic`       | 6    | 0 - 63                                  |
//! | `command`     | 4    | 0 - 15                                  |
//! | `data_length` | 11   | 0 - 2047                                |
//!
//! ## Send path
//!
//! [`Message::configure`] → [`Message::stamp`] → [`Message::encode_header`]
//! → [`Message::packetize`]. Each step fails with a distinct [`PacketError`]
//! if a field is out of range or a previous step is missing.
//!
//! ## Receive path
//!
//! [`Message::depacketize`] checks, in order: minimum length, CRC, declared
//! against actual payload length, and that the millistamp falls within a day.
//! Nothing is returned unless every check passes.

use crate::buffer::{self, PacketBuf, PayloadBuf};
use crate::checksum::{crc16_xmodem, hi8, lo8};
use crate::clock::TimeSource;
use crate::consts::{
    COMMAND_BITS, CRC_LEN, DATA_LENGTH_BITS, HEADER_LEN, MAX_COMMAND, MAX_MILLISTAMP,
    MAX_PAYLOAD_LEN, MAX_TOPIC, MILLIS_PER_DAY, MILLISTAMP_BITS, MIN_PACKET_LEN,
    SENTINEL_MILLISTAMP, TOPIC_BITS,
};
use crate::error::PacketError;

const COMMAND_SHIFT: u32 = DATA_LENGTH_BITS;
const TOPIC_SHIFT: u32 = COMMAND_SHIFT + COMMAND_BITS;
const MILLISTAMP_SHIFT: u32 = TOPIC_SHIFT + TOPIC_BITS;

fn field(bits: u64, shift: u32, width: u32) -> u64 {
    (bits >> shift) & ((1 << width) - 1)
}

fn check_topic(topic: u8) -> Result<(), PacketError> {
    if topic > MAX_TOPIC {
        return Err(PacketError::BadTopic(topic));
    }
    Ok(())
}

fn check_command(command: u8) -> Result<(), PacketError> {
    if command > MAX_COMMAND {
        return Err(PacketError::BadCommand(command));
    }
    Ok(())
}

fn check_millistamp(millistamp: u32) -> Result<(), PacketError> {
    if millistamp > MAX_MILLISTAMP {
        return Err(PacketError::BadMillistamp(millistamp));
    }
    Ok(())
}

/// The decoded fields of a 6-byte packet header.
///
/// Every field is guaranteed to fit its bit width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Header {
    millistamp: u32,
    topic: u8,
    command: u8,
    data_length: u16,
}

impl Header {
    /// Creates a header, rejecting any field that exceeds its bit width.
    pub fn new(
        millistamp: u32,
        topic: u8,
        command: u8,
        data_length: u16,
    ) -> Result<Self, PacketError> {
        check_millistamp(millistamp)?;
        check_topic(topic)?;
        check_command(command)?;
        if usize::from(data_length) > MAX_PAYLOAD_LEN {
            return Err(PacketError::BadDataLength(usize::from(data_length)));
        }
        Ok(Self {
            millistamp,
            topic,
            command,
            data_length,
        })
    }

    /// Milliseconds since midnight.
    pub fn millistamp(&self) -> u32 {
        self.millistamp
    }

    /// Routing category.
    pub fn topic(&self) -> u8 {
        self.topic
    }

    /// Action selector within the topic.
    pub fn command(&self) -> u8 {
        self.command
    }

    /// Declared payload length.
    pub fn data_length(&self) -> u16 {
        self.data_length
    }

    /// Packs the fields MSB-first into 6 bytes.
    pub fn pack(&self) -> [u8; HEADER_LEN] {
        let bits = (u64::from(self.millistamp) << MILLISTAMP_SHIFT)
            | (u64::from(self.topic) << TOPIC_SHIFT)
            | (u64::from(self.command) << COMMAND_SHIFT)
            | u64::from(self.data_length);
        let b = bits.to_be_bytes();
        [b[2], b[3], b[4], b[5], b[6], b[7]]
    }

    /// Unpacks a 6-byte header.
    ///
    /// Only the length is checked; range checks on the millistamp belong to
    /// [`Message::depacketize`].
    pub fn unpack(bytes: &[u8]) -> Result<Self, PacketError> {
        if bytes.len() != HEADER_LEN {
            return Err(PacketError::BadHeaderLength(bytes.len()));
        }
        let mut b = [0u8; 8];
        b[2..].copy_from_slice(bytes);
        let bits = u64::from_be_bytes(b);
        Ok(Self {
            millistamp: field(bits, MILLISTAMP_SHIFT, MILLISTAMP_BITS) as u32,
            topic: field(bits, TOPIC_SHIFT, TOPIC_BITS) as u8,
            command: field(bits, COMMAND_SHIFT, COMMAND_BITS) as u8,
            data_length: field(bits, 0, DATA_LENGTH_BITS) as u16,
        })
    }
}

/// A telemetry message, built up for sending or produced by receiving.
///
/// ## Example
///
/// ```rust
/// use telemetry_core::packet::Message;
///
/// let mut msg = Message::new();
/// msg.configure(5, 3, &[0xaa, 0xbb]).unwrap();
/// msg.set_millistamp(1000).unwrap();
/// msg.encode_header().unwrap();
/// let packet = msg.packetize().unwrap();
///
/// let received = Message::depacketize(&packet).unwrap();
/// assert_eq!(received.topic(), 5);
/// assert_eq!(received.payload(), &[0xaa, 0xbb]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    topic: u8,
    command: u8,
    payload: PayloadBuf,
    millistamp: Option<u32>,
    header: Option<[u8; HEADER_LEN]>,
    crc: Option<u16>,
}

impl Message {
    /// Creates an empty message: topic 0, command 0, no payload, unstamped.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets topic, command and payload.
    ///
    /// Nothing is changed if any value exceeds its bit width. A previously
    /// encoded header is discarded.
    pub fn configure(&mut self, topic: u8, command: u8, payload: &[u8]) -> Result<(), PacketError> {
        check_topic(topic)?;
        check_command(command)?;
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(PacketError::BadDataLength(payload.len()));
        }
        let mut data = PayloadBuf::new();
        buffer::extend(&mut data, payload)
            .map_err(|_| PacketError::BadDataLength(payload.len()))?;

        self.topic = topic;
        self.command = command;
        self.payload = data;
        self.invalidate();
        Ok(())
    }

    /// Stamps the message with the current time of day from `clock`.
    ///
    /// A non-OK status from the clock is returned as [`PacketError::TimeSource`].
    pub fn stamp<T: TimeSource>(&mut self, clock: &mut T) -> Result<u32, PacketError> {
        let millis = clock
            .millis_since_midnight()
            .map_err(PacketError::TimeSource)?;
        self.set_millistamp(millis)
    }

    /// Stamps the message with [`SENTINEL_MILLISTAMP`], for when timestamping
    /// is disabled.
    pub fn stamp_sentinel(&mut self) -> Result<u32, PacketError> {
        self.set_millistamp(SENTINEL_MILLISTAMP)
    }

    /// Assigns an explicit millistamp. It must fit in 27 bits.
    pub fn set_millistamp(&mut self, millistamp: u32) -> Result<u32, PacketError> {
        check_millistamp(millistamp)?;
        self.millistamp = Some(millistamp);
        self.invalidate();
        Ok(millistamp)
    }

    /// Packs and stores the 6-byte header.
    pub fn encode_header(&mut self) -> Result<[u8; HEADER_LEN], PacketError> {
        let millistamp = self.millistamp.ok_or(PacketError::MissingMillistamp)?;
        let header =
            Header::new(millistamp, self.topic, self.command, self.data_length())?.pack();
        self.header = Some(header);
        self.crc = None;
        Ok(header)
    }

    /// Assembles header, payload and big-endian CRC into a finalized packet.
    pub fn packetize(&mut self) -> Result<PacketBuf, PacketError> {
        let header = self.header.ok_or(PacketError::MissingHeader)?;
        let expected = HEADER_LEN + self.payload.len() + CRC_LEN;
        let bad_length = |actual| PacketError::BadPacketLength { expected, actual };

        let mut packet = PacketBuf::new();
        buffer::extend(&mut packet, &header).map_err(|_| bad_length(0))?;
        buffer::extend(&mut packet, &self.payload).map_err(|_| bad_length(HEADER_LEN))?;
        if packet.len() + CRC_LEN != expected {
            return Err(bad_length(packet.len() + CRC_LEN));
        }

        let crc = crc16_xmodem(&packet);
        buffer::extend(&mut packet, &[hi8(crc), lo8(crc)])
            .map_err(|_| bad_length(expected - CRC_LEN))?;
        self.crc = Some(crc);
        Ok(packet)
    }

    /// Validates and parses a received packet.
    ///
    /// # Errors
    /// - [`PacketError::TooShort`] if fewer than 8 bytes
    /// - [`PacketError::CrcMismatch`] if the trailer disagrees with the content
    /// - [`PacketError::DataLengthMismatch`] if `data_length` is not the payload size
    /// - [`PacketError::MillistampOverflow`] if the millistamp is not within a day
    pub fn depacketize(raw: &[u8]) -> Result<Self, PacketError> {
        if raw.len() < MIN_PACKET_LEN {
            debug!("packet of {} bytes too short", raw.len());
            return Err(PacketError::TooShort(raw.len()));
        }

        let (body, trailer) = raw.split_at(raw.len() - CRC_LEN);
        let received = u16::from_be_bytes([trailer[0], trailer[1]]);
        let computed = crc16_xmodem(body);
        if received != computed {
            debug!(
                "packet CRC {:#x} does not match computed {:#x}",
                received, computed
            );
            return Err(PacketError::CrcMismatch { received, computed });
        }

        let (header_bytes, data) = body.split_at(HEADER_LEN);
        let header = Header::unpack(header_bytes)?;

        if usize::from(header.data_length) != data.len() {
            debug!(
                "declared data length {} but {} bytes present",
                header.data_length,
                data.len()
            );
            return Err(PacketError::DataLengthMismatch {
                declared: header.data_length,
                actual: data.len(),
            });
        }

        if header.millistamp >= MILLIS_PER_DAY {
            debug!("millistamp {} beyond one day", header.millistamp);
            return Err(PacketError::MillistampOverflow(header.millistamp));
        }

        let mut payload = PayloadBuf::new();
        buffer::extend(&mut payload, data).map_err(|_| PacketError::BadDataLength(data.len()))?;

        Ok(Self {
            topic: header.topic,
            command: header.command,
            payload,
            millistamp: Some(header.millistamp),
            header: Some(header.pack()),
            crc: Some(received),
        })
    }

    /// Routing category.
    pub fn topic(&self) -> u8 {
        self.topic
    }

    /// Action selector within the topic.
    pub fn command(&self) -> u8 {
        self.command
    }

    /// Assigned millistamp, if stamped.
    pub fn millistamp(&self) -> Option<u32> {
        self.millistamp
    }

    /// The payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Payload length as carried in the header.
    pub fn data_length(&self) -> u16 {
        // Bounded by MAX_PAYLOAD_LEN in configure and depacketize
        self.payload.len() as u16
    }

    /// The encoded header, once [`encode_header`](Message::encode_header) has run.
    pub fn header(&self) -> Option<[u8; HEADER_LEN]> {
        self.header
    }

    /// The packet CRC, once packetized or received.
    pub fn crc(&self) -> Option<u16> {
        self.crc
    }

    fn invalidate(&mut self) {
        self.header = None;
        self.crc = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedTime(Result<u32, u8>);

    impl TimeSource for FixedTime {
        fn millis_since_midnight(&mut self) -> Result<u32, u8> {
            self.0
        }
    }

    fn finalized(topic: u8, command: u8, payload: &[u8], millistamp: u32) -> PacketBuf {
        let mut msg = Message::new();
        msg.configure(topic, command, payload).unwrap();
        let _ = msg.set_millistamp(millistamp).unwrap();
        let _ = msg.encode_header().unwrap();
        msg.packetize().unwrap()
    }

    fn with_crc(body: &[u8]) -> Vec<u8> {
        let crc = crc16_xmodem(body);
        let mut raw = body.to_vec();
        raw.extend_from_slice(&crc.to_be_bytes());
        raw
    }

    #[test]
    fn test_header_packing_example() {
        let header = Header::new(1000, 5, 3, 2).unwrap();
        let bytes = header.pack();
        assert_eq!(bytes, [0x00, 0x00, 0x7d, 0x02, 0x98, 0x02]);
        assert_eq!(Header::unpack(&bytes).unwrap(), header);
    }

    #[test]
    fn test_header_boundaries() {
        for (ms, topic, command, len) in [
            (0, 0, 0, 0),
            (MILLIS_PER_DAY - 1, 63, 15, 2047),
            (MAX_MILLISTAMP, 63, 0, 0),
            (0, 0, 15, 2047),
            (1, 62, 1, 1),
        ] {
            let header = Header::new(ms, topic, command, len).unwrap();
            let unpacked = Header::unpack(&header.pack()).unwrap();
            assert_eq!(unpacked.millistamp(), ms);
            assert_eq!(unpacked.topic(), topic);
            assert_eq!(unpacked.command(), command);
            assert_eq!(unpacked.data_length(), len);
        }
    }

    #[test]
    fn test_header_rejects_wide_fields() {
        assert_eq!(Header::new(0, 64, 0, 0), Err(PacketError::BadTopic(64)));
        assert_eq!(Header::new(0, 0, 16, 0), Err(PacketError::BadCommand(16)));
        assert_eq!(
            Header::new(0, 0, 0, 2048),
            Err(PacketError::BadDataLength(2048))
        );
        assert_eq!(
            Header::new(MAX_MILLISTAMP + 1, 0, 0, 0),
            Err(PacketError::BadMillistamp(MAX_MILLISTAMP + 1))
        );
        assert_eq!(
            Header::unpack(&[0; 5]),
            Err(PacketError::BadHeaderLength(5))
        );
    }

    #[test]
    fn test_configure_rejects_wide_fields() {
        let mut msg = Message::new();
        assert_eq!(msg.configure(64, 0, &[]), Err(PacketError::BadTopic(64)));
        assert_eq!(msg.configure(0, 16, &[]), Err(PacketError::BadCommand(16)));
        assert_eq!(
            msg.configure(0, 0, &[0u8; 2048]),
            Err(PacketError::BadDataLength(2048))
        );
        assert_eq!(msg, Message::new());
        assert!(msg.configure(63, 15, &[0u8; 2047]).is_ok());
        assert_eq!(msg.data_length(), 2047);
    }

    #[test]
    fn test_lifecycle_order_enforced() {
        let mut msg = Message::new();
        msg.configure(1, 1, b"x").unwrap();
        assert_eq!(msg.packetize(), Err(PacketError::MissingHeader));
        assert_eq!(msg.encode_header(), Err(PacketError::MissingMillistamp));
        let _ = msg.set_millistamp(0).unwrap();
        let _ = msg.encode_header().unwrap();
        assert!(msg.packetize().is_ok());

        // Reconfiguring drops the stale header
        msg.configure(2, 2, b"yz").unwrap();
        assert_eq!(msg.header(), None);
        assert_eq!(msg.packetize(), Err(PacketError::MissingHeader));
    }

    #[test]
    fn test_stamp_from_time_source() {
        let mut msg = Message::new();
        assert_eq!(msg.stamp(&mut FixedTime(Ok(43_200_000))), Ok(43_200_000));
        assert_eq!(msg.millistamp(), Some(43_200_000));
        assert_eq!(
            msg.stamp(&mut FixedTime(Err(5))),
            Err(PacketError::TimeSource(5))
        );
        assert_eq!(
            msg.stamp(&mut FixedTime(Ok(MAX_MILLISTAMP + 1))),
            Err(PacketError::BadMillistamp(MAX_MILLISTAMP + 1))
        );
        assert_eq!(msg.stamp_sentinel(), Ok(SENTINEL_MILLISTAMP));
    }

    #[test]
    fn test_packetize_layout() {
        let packet = finalized(5, 3, &[0xaa, 0xbb], 1000);
        assert_eq!(packet.len(), HEADER_LEN + 2 + CRC_LEN);
        assert_eq!(&packet[..6], &[0x00, 0x00, 0x7d, 0x02, 0x98, 0x02]);
        assert_eq!(&packet[6..8], &[0xaa, 0xbb]);
        let crc = crc16_xmodem(&packet[..8]);
        assert_eq!(&packet[8..], &[hi8(crc), lo8(crc)]);
    }

    #[test]
    fn test_depacketize_round_trip() {
        let packet = finalized(63, 15, b"telemetry", MILLIS_PER_DAY - 1);
        let msg = Message::depacketize(&packet).unwrap();
        assert_eq!(msg.topic(), 63);
        assert_eq!(msg.command(), 15);
        assert_eq!(msg.millistamp(), Some(MILLIS_PER_DAY - 1));
        assert_eq!(msg.payload(), b"telemetry");
        assert_eq!(msg.header().map(|h| h.to_vec()), Some(packet[..6].to_vec()));
        let n = packet.len();
        assert_eq!(msg.crc(), Some(u16::from_be_bytes([packet[n - 2], packet[n - 1]])));
    }

    #[test]
    fn test_depacketize_empty_payload() {
        let packet = finalized(0, 0, &[], 0);
        assert_eq!(packet.len(), MIN_PACKET_LEN);
        let msg = Message::depacketize(&packet).unwrap();
        assert!(msg.payload().is_empty());
        assert_eq!(msg.millistamp(), Some(0));
    }

    #[test]
    fn test_depacketize_too_short() {
        assert_eq!(
            Message::depacketize(&[0u8; 7]),
            Err(PacketError::TooShort(7))
        );
    }

    #[test]
    fn test_depacketize_crc_mismatch() {
        let mut packet = finalized(1, 2, &[1, 2, 3], 1000);
        packet[7] ^= 0xff;
        assert!(matches!(
            Message::depacketize(&packet),
            Err(PacketError::CrcMismatch { .. })
        ));
    }

    #[test]
    fn test_depacketize_length_mismatch() {
        // Header declares 3 bytes, only 2 follow
        let header = Header::new(1000, 5, 3, 3).unwrap().pack();
        let mut body = header.to_vec();
        body.extend_from_slice(&[0xaa, 0xbb]);
        assert_eq!(
            Message::depacketize(&with_crc(&body)),
            Err(PacketError::DataLengthMismatch {
                declared: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn test_depacketize_millistamp_beyond_day() {
        let packet = finalized(5, 3, &[], MILLIS_PER_DAY);
        assert_eq!(
            Message::depacketize(&packet),
            Err(PacketError::MillistampOverflow(MILLIS_PER_DAY))
        );
    }

    #[test]
    fn test_every_single_bit_flip_is_detected() {
        let packet = finalized(42, 7, b"\x00\x01\xfe\xff", 12_345_678);
        for byte in 0..packet.len() {
            for bit in 0..8 {
                let mut corrupted = packet.clone();
                corrupted[byte] ^= 1 << bit;
                let n = corrupted.len();
                let computed = crc16_xmodem(&corrupted[..n - CRC_LEN]);
                let received = u16::from_be_bytes([corrupted[n - 2], corrupted[n - 1]]);
                assert_ne!(computed, received, "flip at byte {byte} bit {bit}");
                assert!(Message::depacketize(&corrupted).is_err());
            }
        }
    }
}
