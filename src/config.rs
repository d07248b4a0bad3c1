//! Instance-wide codec configuration.

use crate::Error;

/// The 16-bit protocol-type value that signals "VLAN-tagged, protocol type omitted", which this
/// crate does not support as an implicit type.
const UNSUPPORTED_IMPLICIT_PROTO_TYPE: u16 = 0x0031;

/// Immutable configuration shared by an [`RleTransmitter`] and an [`RleReceiver`].
///
/// [`RleTransmitter`]: crate::transmitter::RleTransmitter
/// [`RleReceiver`]: crate::receiver::RleReceiver
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Config {
    implicit_protocol_type: u16,
    use_alpdu_crc: bool,
    use_compressed_ptype: bool,
    use_ptype_omission: bool,
}

impl Config {
    /// Builds a new configuration.
    ///
    /// Returns `Error::ConfigRejected` if `implicit_protocol_type` is the unsupported
    /// VLAN-without-protocol-type variant (`0x0031`).
    pub fn new(
        implicit_protocol_type: u16,
        use_alpdu_crc: bool,
        use_compressed_ptype: bool,
        use_ptype_omission: bool,
    ) -> Result<Self, Error> {
        if implicit_protocol_type == UNSUPPORTED_IMPLICIT_PROTO_TYPE {
            return Err(Error::ConfigRejected);
        }

        Ok(Config {
            implicit_protocol_type,
            use_alpdu_crc,
            use_compressed_ptype,
            use_ptype_omission,
        })
    }

    /// The protocol type assumed by the receiver when the protocol-type header is omitted.
    pub fn implicit_protocol_type(&self) -> u16 {
        self.implicit_protocol_type
    }

    /// Whether fragmented ALPDUs are trailed by a 32-bit CRC (`true`) or an 8-bit sequence number
    /// (`false`).
    pub fn use_alpdu_crc(&self) -> bool {
        self.use_alpdu_crc
    }

    /// Whether protocol types with a known compressed code use that 1-byte encoding.
    pub fn use_compressed_ptype(&self) -> bool {
        self.use_compressed_ptype
    }

    /// Whether a protocol type matching the implicit default may be omitted from the wire.
    pub fn use_ptype_omission(&self) -> bool {
        self.use_ptype_omission
    }
}

impl Default for Config {
    /// IPv4-implicit, no CRC, no compression, no omission: the common baseline profile.
    fn default() -> Self {
        Config::new(crate::proto_type::PROTO_TYPE_IPV4, false, false, false)
            .expect("default configuration is always accepted")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unsupported_implicit_type() {
        assert_eq!(
            Config::new(UNSUPPORTED_IMPLICIT_PROTO_TYPE, false, false, false),
            Err(Error::ConfigRejected)
        );
    }

    #[test]
    fn accepts_ordinary_configuration() {
        let conf = Config::new(0x0800, true, true, true).unwrap();
        assert_eq!(conf.implicit_protocol_type(), 0x0800);
        assert!(conf.use_alpdu_crc());
        assert!(conf.use_compressed_ptype());
        assert!(conf.use_ptype_omission());
    }

    #[test]
    fn default_is_accepted() {
        let _ = Config::default();
    }
}
