use core::fmt;

/// Errors returned by the RLE codec.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Rejected configuration (eg. an unsupported implicit protocol type).
    ConfigRejected,

    /// The SDU handed to the encapsulation engine exceeds `RLE_MAX_PDU_SIZE`.
    SduTooLarge,

    /// The requested burst capacity cannot hold a header plus at least one payload byte.
    BurstTooSmall,

    /// All fragment IDs are currently in use.
    NoFreeContext,

    /// A PPDU arrived whose fragment kind is not a legal successor for the context's current
    /// state.
    InvalidTransition,

    /// A PPDU header or trailer was structurally invalid (bad length field, unknown label type,
    /// buffer too short, ...).
    MalformedHeader,

    /// The END trailer (CRC or sequence number) did not match the reassembled ALPDU.
    TrailerMismatch,

    /// Nothing is queued to emit for this context.
    NoDataPending,

    /// Unexpectedly reached EOF while reading or writing a fixed-size buffer.
    Eof,

    /// Parsing didn't consume (or writing didn't fill) the entire buffer it was given.
    InvalidValue,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Error::ConfigRejected => "configuration rejected",
            Error::SduTooLarge => "SDU exceeds the maximum PDU size",
            Error::BurstTooSmall => "burst capacity too small for a header and payload byte",
            Error::NoFreeContext => "no free fragment-id context available",
            Error::InvalidTransition => "illegal fragment-kind transition for this context",
            Error::MalformedHeader => "malformed PPDU header or trailer",
            Error::TrailerMismatch => "END trailer does not match the reassembled ALPDU",
            Error::NoDataPending => "no data pending for this context",
            Error::Eof => "end of buffer",
            Error::InvalidValue => "invalid value for field",
        })
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
