use core::fmt;
use core::mem::{MaybeUninit, size_of};
use core::slice;

use crate::error::{Error, ErrorKind};

/// The type of an ICMP message.
#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct Type(u8);

super::macros::define_types! {
    impl Type {
        /// echo reply
        ECHO_REPLY = 0;
        /// destination unreachable
        UNREACHABLE = 3;
        /// source quench
        SOURCE_QUENCH = 4;
        /// redirect
        REDIRECT = 5;
        /// echo request
        ECHO_REQUEST = 8;
        /// time exceeded
        TIME_EXCEEDED = 11;
        /// parameter problem
        PARAMETER_PROBLEM = 12;
    }
}

/// The code for a Destination Unreachable ICMP message.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct UnreachableCode(u8);

super::macros::define_types! {
    impl UnreachableCode {
        /// net unreachable
        NET_UNREACHABLE = 0;
        /// host unreachable
        HOST_UNREACHABLE = 1;
        /// protocol unreachable
        PROTOCOL_UNREACHABLE = 2;
        /// port unreachable
        PORT_UNREACHABLE = 3;
        /// fragmentation needed and don't fragment was set
        FRAGMENTATION_NEEDED = 4;
        /// source route failed
        SOURCE_ROUTE_FAILED = 5;
        /// destination network unknown
        DESTINATION_NETWORK_UNKNOWN = 6;
        /// destination host unknown
        DESTINATION_HOST_UNKNOWN = 7;
        /// source host isolated
        SOURCE_HOST_ISOLATED = 8;
        /// communication with destination network is administratively prohibited
        NETWORK_ADMINISTRATIVELY_PROHIBITED = 9;
        /// communication with destination host is administratively prohibited
        HOST_ADMINISTRATIVELY_PROHIBITED = 10;
        /// destination network unreachable for type of service
        NETWORK_UNREACHABLE_SERVICE = 11;
        /// destination host unreachable for type of service
        HOST_UNREACHABLE_SERVICE = 12;
        /// communication administratively prohibited
        ADMINISTRATIVELY_PROHIBITED = 13;
        /// host precedence violation
        HOST_PRECEDENCE_VIOLATION = 14;
        /// precedence cutoff in effect
        PRECEDENCE_CUTOFF_IN_EFFECT = 15;
    }
}

/// The ICMP echo header structure.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct Header {
    pub ty: Type,
    pub code: u8,
    checksum: u16,
    identifier: u16,
    sequence: u16,
}

impl Header {
    /// A header with all fields set to zero.
    pub const ZEROED: Self = Self::from_array([0u8; Self::SIZE]);
    /// The size of the header in bytes.
    pub const SIZE: usize = size_of::<Self>();

    /// Read the given array as a Header.
    pub const fn from_array(buffer: [u8; Self::SIZE]) -> Self {
        let mut header = MaybeUninit::<Self>::uninit();

        unsafe {
            header
                .as_mut_ptr()
                .cast::<u8>()
                .copy_from_nonoverlapping(buffer.as_ptr(), size_of::<Self>());

            header.assume_init()
        }
    }

    /// Read a header from the start of the given bytes, if there are enough of
    /// them.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let array = bytes.first_chunk::<{ Header::SIZE }>()?;
        Some(Self::from_array(*array))
    }

    /// Get the checksum from the header.
    #[inline]
    pub fn checksum(&self) -> u16 {
        u16::from_be(self.checksum)
    }

    /// Set the checksum in the header.
    #[inline]
    pub fn set_checksum(&mut self, checksum: u16) {
        self.checksum = checksum.to_be();
    }

    /// Get the identifier from the header.
    #[inline]
    pub fn identifier(&self) -> u16 {
        u16::from_be(self.identifier)
    }

    /// Set the identifier in the header.
    #[inline]
    pub fn set_identifier(&mut self, identifier: u16) {
        self.identifier = identifier.to_be();
    }

    /// Get the sequence number from the header.
    #[inline]
    pub fn sequence(&self) -> u16 {
        u16::from_be(self.sequence)
    }

    /// Set the sequence number in the header.
    #[inline]
    pub fn set_sequence(&mut self, sequence: u16) {
        self.sequence = sequence.to_be();
    }

    /// Get the header as a byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: The layout for Header is compatible with a byte slice of its
        // size.
        unsafe { slice::from_raw_parts((self as *const Self).cast::<u8>(), size_of::<Self>()) }
    }
}

/// The internet checksum: the complement of the one's complement sum of the
/// big-endian 16-bit words in `data`.
///
/// Applied over a message which carries a correct checksum this yields zero.
/// A trailing odd byte is padded with zero.
pub fn checksum(data: &[u8]) -> u16 {
    let mut sum: u64 = 0;

    let mut chunks = data.chunks_exact(2);

    for c in chunks.by_ref() {
        let &[a, b] = c else {
            continue;
        };

        sum += u16::from_be_bytes([a, b]) as u64;
    }

    if let &[last] = chunks.remainder() {
        sum += u16::from_be_bytes([last, 0]) as u64;
    }

    while (sum >> 16) != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }

    !(sum as u16)
}

/// Encode an echo request of `size` bytes in total.
///
/// Payload byte `i` is `i mod 256`. The size must be even and cover at least
/// the header.
pub fn encode_echo_request(identifier: u16, sequence: u16, size: usize) -> Result<Vec<u8>, Error> {
    if size < Header::SIZE {
        return Err(Error::new(ErrorKind::PacketTooSmall {
            size,
            min: Header::SIZE,
        }));
    }

    if !size.is_multiple_of(2) {
        return Err(Error::new(ErrorKind::PacketSizeOdd { size }));
    }

    let mut header = Header::ZEROED;
    header.ty = Type::ECHO_REQUEST;
    header.set_identifier(identifier);
    header.set_sequence(sequence);

    let mut packet = Vec::with_capacity(size);
    packet.extend_from_slice(header.as_bytes());
    packet.extend((0..size - Header::SIZE).map(|i| i as u8));

    header.set_checksum(checksum(&packet));
    packet[..Header::SIZE].copy_from_slice(header.as_bytes());
    Ok(packet)
}

/// A decoded echo reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoReply {
    pub ty: Type,
    pub code: u8,
    pub checksum: u16,
    pub identifier: u16,
    pub sequence: u16,
    pub payload: Vec<u8>,
    /// The checksum computed over the framed ICMP bytes, zero if intact.
    pub residue: u16,
}

/// Decode an echo reply out of `received`.
///
/// A raw socket hands us the whole IP datagram, so the ICMP message is taken
/// to be the trailing `icmp_size` bytes. When fewer bytes than that arrived,
/// all of them are used.
pub fn decode_echo_reply(received: &[u8], icmp_size: usize) -> Result<EchoReply, Error> {
    if received.len() < Header::SIZE {
        return Err(Error::new(ErrorKind::ReplyTooShort {
            len: received.len(),
            min: Header::SIZE,
        }));
    }

    let start = received
        .len()
        .saturating_sub(icmp_size.max(Header::SIZE));

    Ok(decode_frame(&received[start..]))
}

fn decode_frame(frame: &[u8]) -> EchoReply {
    let (head, payload) = frame.split_at(Header::SIZE);
    let header = Header::from_bytes(head).unwrap_or(Header::ZEROED);

    EchoReply {
        ty: header.ty,
        code: header.code,
        checksum: header.checksum(),
        identifier: header.identifier(),
        sequence: header.sequence(),
        payload: payload.to_vec(),
        residue: checksum(frame),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeroed_buffers_checksum_to_all_ones() {
        for len in [0, 2, 8, 28, 512] {
            assert_eq!(checksum(&vec![0u8; len]), 0xFFFF, "len {len}");
        }
    }

    #[test]
    fn checksum_folds_carries() {
        // 0x1FFFF folds to 0x10000, which needs a second fold.
        assert_eq!(checksum(&[0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x01]), 0xFFFE);
    }

    #[test]
    fn header_only_request_matches_reference() {
        let packet = encode_echo_request(0x1234, 1234, 8).unwrap();
        assert_eq!(packet, [8, 0, 0xe0, 0xf9, 0x12, 0x34, 0x04, 0xd2]);
    }

    #[test]
    fn encoded_request_checksums_to_zero() {
        for size in [8, 28, 64, 256] {
            for (identifier, sequence) in [(0, 0), (0xffff, 0xffff), (4321, 12345)] {
                let packet = encode_echo_request(identifier, sequence, size).unwrap();
                assert_eq!(packet.len(), size);
                assert_eq!(checksum(&packet), 0, "size {size}");
            }
        }
    }

    #[test]
    fn request_layout() {
        let packet = encode_echo_request(0xabcd, 0x0102, 28).unwrap();
        let header = Header::from_bytes(&packet).unwrap();

        assert_eq!(header.ty, Type::ECHO_REQUEST);
        assert_eq!(header.code, 0);
        assert_eq!(header.identifier(), 0xabcd);
        assert_eq!(header.sequence(), 0x0102);
        assert_eq!(&packet[4..8], &[0xab, 0xcd, 0x01, 0x02]);

        let payload = &packet[Header::SIZE..];
        assert_eq!(payload.len(), 20);
        assert!(payload.iter().enumerate().all(|(i, b)| *b == i as u8));
    }

    #[test]
    fn payload_wraps_every_256_bytes() {
        let packet = encode_echo_request(1, 1, 8 + 300).unwrap();
        assert_eq!(packet[8 + 255], 255);
        assert_eq!(packet[8 + 256], 0);
        assert_eq!(packet[8 + 299], 43);
    }

    #[test]
    fn rejects_bad_sizes() {
        assert!(encode_echo_request(1, 1, 6).is_err());
        assert!(encode_echo_request(1, 1, 29).is_err());
    }

    #[test]
    fn decode_strips_ip_header() {
        let mut reply = encode_echo_request(7, 9, 28).unwrap();
        reply[0] = 0;
        reply[2..4].fill(0);
        let sum = checksum(&reply);
        reply[2..4].copy_from_slice(&sum.to_be_bytes());

        let mut datagram = vec![0x45; 20];
        datagram.extend_from_slice(&reply);

        let decoded = decode_echo_reply(&datagram, reply.len()).unwrap();
        assert_eq!(decoded.ty, Type::ECHO_REPLY);
        assert_eq!(decoded.identifier, 7);
        assert_eq!(decoded.sequence, 9);
        assert_eq!(decoded.checksum, sum);
        assert_eq!(decoded.residue, 0);
        assert_eq!(decoded.payload, &reply[8..]);
    }

    #[test]
    fn decode_short_datagram_uses_everything() {
        let reply = [0, 0, 0xff, 0xff, 0, 0, 0, 0];
        let decoded = decode_echo_reply(&reply, 28).unwrap();
        assert_eq!(decoded.residue, 0);
        assert!(decoded.payload.is_empty());
    }

    #[test]
    fn decode_rejects_truncated_reply() {
        assert!(decode_echo_reply(&[0, 0, 0, 0, 0, 0, 0], 8).is_err());
        assert!(decode_echo_reply(&[], 8).is_err());
    }

    #[test]
    fn type_display() {
        assert_eq!(Type::ECHO_REPLY.to_string(), "echo reply");
        assert_eq!(Type::UNREACHABLE.to_string(), "destination unreachable");
        assert_eq!(Type::new(42).to_string(), "unknown (42)");
        assert_eq!(format!("{:?}", Type::TIME_EXCEEDED), "TIME_EXCEEDED");
        assert_eq!(UnreachableCode::new(1).to_string(), "host unreachable");
    }
}
