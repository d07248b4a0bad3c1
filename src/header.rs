//! The common PPDU header: a packed 16-bit, big-endian word shared by every fragment kind.
//!
//! ```notrust
//! MSB                                                                LSB
//! +---------+---------+----------------------------+-----------------+
//! |    S    |    E    |           Length            |     LT_T_FID    |
//! | (1 bit) | (1 bit) |          (11 bits)           |     (3 bits)    |
//! +---------+---------+----------------------------+-----------------+
//! ```
//!
//! `S` and `E` (Start/End) together select the fragment kind. `LT_T_FID` is reused for two
//! different purposes depending on that kind: on `COMPLETE` and `START` fragments it carries the
//! [`ProtoTypeField`] selecting how (or whether) a protocol-type header follows; on `CONT` and
//! `END` fragments it carries the fragment ID instead.

use crate::bytes::{ByteReader, ByteWriter};
use crate::Error;

/// Maximum value of a 3-bit fragment ID field.
pub const RLE_MAX_FRAG_ID: u8 = 7;

/// Size in bytes of the common header word.
pub const HEADER_SIZE: usize = 2;

/// Size in bytes of the sequence-number trailer.
pub const TRAILER_SEQNO_SIZE: usize = 1;

/// Size in bytes of the CRC-32 trailer.
pub const TRAILER_CRC_SIZE: usize = 4;

/// Largest value the 11-bit `Length` field can represent without truncation. Both an ALPDU's
/// total length (on `COMPLETE`/`START`) and a PPDU's payload length (on `CONT`/`END`) must fit in
/// this field; `Header::pack` never widens or wraps it.
pub const RLE_MAX_LENGTH_FIELD: u16 = 0x07FF;

const S_BIT: u16 = 1 << 15;
const E_BIT: u16 = 1 << 14;
const LENGTH_SHIFT: u16 = 3;
const LENGTH_MASK: u16 = RLE_MAX_LENGTH_FIELD;
const LT_T_FID_MASK: u16 = 0x0007;

/// The four PPDU fragment kinds, derived from the header's `S`/`E` bits.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FragmentKind {
    /// A whole, unfragmented ALPDU (`S=1, E=1`).
    Complete,
    /// The first fragment of a multi-PPDU ALPDU (`S=1, E=0`).
    Start,
    /// A middle fragment (`S=0, E=0`).
    Cont,
    /// The last fragment of a multi-PPDU ALPDU (`S=0, E=1`).
    End,
}

impl FragmentKind {
    fn from_bits(s: bool, e: bool) -> Self {
        match (s, e) {
            (true, true) => FragmentKind::Complete,
            (true, false) => FragmentKind::Start,
            (false, false) => FragmentKind::Cont,
            (false, true) => FragmentKind::End,
        }
    }

    fn bits(self) -> (bool, bool) {
        match self {
            FragmentKind::Complete => (true, true),
            FragmentKind::Start => (true, false),
            FragmentKind::Cont => (false, false),
            FragmentKind::End => (false, true),
        }
    }

    /// Whether this fragment kind starts a new ALPDU (carries a protocol-type field instead of a
    /// fragment ID in `LT_T_FID`).
    pub fn is_first(self) -> bool {
        matches!(self, FragmentKind::Complete | FragmentKind::Start)
    }

    /// Whether this fragment kind completes an ALPDU and releases its context. Note that only
    /// `End` carries a trailer: `Complete`'s `Length` field already spans the whole ALPDU.
    pub fn is_last(self) -> bool {
        matches!(self, FragmentKind::Complete | FragmentKind::End)
    }
}

/// Interpretation of the `LT_T_FID` field on `COMPLETE`/`START` fragments: how the protocol type
/// is (or isn't) represented in the bytes following the header.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProtoTypeField {
    /// No protocol-type header follows; the receiver must use the configured implicit type.
    Implicit = 0b000,
    /// No protocol-type header follows; the ALPDU carries the internal signalling type.
    Signal = 0b001,
    /// A compressed protocol-type header follows (1 byte, or the escape byte plus 2 bytes).
    Compressed = 0b010,
    /// An uncompressed, 2-byte big-endian protocol-type header follows.
    Uncompressed = 0b011,
}

impl ProtoTypeField {
    fn from_bits(bits: u16) -> Result<Self, Error> {
        match bits {
            0b000 => Ok(ProtoTypeField::Implicit),
            0b001 => Ok(ProtoTypeField::Signal),
            0b010 => Ok(ProtoTypeField::Compressed),
            0b011 => Ok(ProtoTypeField::Uncompressed),
            _ => Err(Error::MalformedHeader),
        }
    }
}

/// The packed 16-bit common header word.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Header(u16);

impl Header {
    /// Builds a header for a `COMPLETE` or `START` fragment.
    pub fn new_first(kind: FragmentKind, length: u16, ptype_field: ProtoTypeField) -> Self {
        debug_assert!(kind.is_first());
        Self::pack(kind, length, ptype_field as u16)
    }

    /// Builds a header for a `CONT` or `END` fragment.
    pub fn new_continuation(kind: FragmentKind, length: u16, frag_id: u8) -> Self {
        debug_assert!(!kind.is_first());
        debug_assert!(frag_id <= RLE_MAX_FRAG_ID);
        Self::pack(kind, length, u16::from(frag_id))
    }

    fn pack(kind: FragmentKind, length: u16, lt_t_fid: u16) -> Self {
        debug_assert!(
            length <= LENGTH_MASK,
            "length {} does not fit the 11-bit Length field",
            length
        );
        let (s, e) = kind.bits();
        let mut word = (length & LENGTH_MASK) << LENGTH_SHIFT;
        word |= lt_t_fid & LT_T_FID_MASK;
        if s {
            word |= S_BIT;
        }
        if e {
            word |= E_BIT;
        }
        Header(word)
    }

    /// Parses a header from a 16-bit, big-endian word already read off the wire.
    pub fn from_word(word: u16) -> Self {
        Header(word)
    }

    /// Returns the raw 16-bit word, to be written big-endian.
    pub fn to_word(self) -> u16 {
        self.0
    }

    /// Returns the fragment kind encoded by the `S`/`E` bits.
    pub fn kind(self) -> FragmentKind {
        FragmentKind::from_bits(self.0 & S_BIT != 0, self.0 & E_BIT != 0)
    }

    /// Returns the `Length` field.
    ///
    /// On `COMPLETE`/`START` fragments this is the total ALPDU length; on `CONT`/`END` fragments
    /// it is the length of this PPDU's payload.
    pub fn length(self) -> u16 {
        (self.0 >> LENGTH_SHIFT) & LENGTH_MASK
    }

    fn lt_t_fid(self) -> u16 {
        self.0 & LT_T_FID_MASK
    }

    /// Interprets `LT_T_FID` as a [`ProtoTypeField`]. Only meaningful when [`Header::kind`] is
    /// first (`COMPLETE`/`START`).
    pub fn proto_type_field(self) -> Result<ProtoTypeField, Error> {
        ProtoTypeField::from_bits(self.lt_t_fid())
    }

    /// Interprets `LT_T_FID` as a fragment ID. Only meaningful when [`Header::kind`] is a
    /// continuation (`CONT`/`END`).
    pub fn frag_id(self) -> u8 {
        self.lt_t_fid() as u8
    }

    /// Reads a header from the front of `reader`.
    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self, Error> {
        Ok(Header::from_word(reader.read_u16_be()?))
    }

    /// Writes this header to the front of `writer`.
    pub fn write(self, writer: &mut ByteWriter<'_>) -> Result<(), Error> {
        writer.write_u16_be(self.to_word())
    }
}

impl core::fmt::Debug for Header {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut s = f.debug_struct("Header");
        s.field("kind", &self.kind()).field("length", &self.length());
        match self.kind() {
            FragmentKind::Complete | FragmentKind::Start => {
                s.field("proto_type_field", &self.proto_type_field());
            }
            FragmentKind::Cont | FragmentKind::End => {
                s.field("frag_id", &self.frag_id());
            }
        }
        s.finish()
    }
}
