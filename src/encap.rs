//! The encapsulation engine: turns an SDU into a staged ALPDU ready for fragmentation.

use crate::config::Config;
use crate::context::Context;
use crate::frag_buffer::FragmentBuffer;
use crate::header::{ProtoTypeField, RLE_MAX_LENGTH_FIELD};
use crate::proto_type::{self, PTYPE_COMPRESSION_ESCAPE, PROTO_TYPE_SIGNAL};
use crate::Error;
use heapless::Vec;

/// Encapsulates `sdu` (tagged with `ptype`) into `buffer`, updating `ctx`'s statistics and
/// per-ALPDU bookkeeping.
///
/// `ptype == PROTO_TYPE_SIGNAL` is treated as internal signalling traffic and is never omitted or
/// compressed: its `ProtoTypeField::Signal` marker is self-describing.
pub(crate) fn encapsulate(
    ctx: &mut Context,
    buffer: &mut FragmentBuffer,
    conf: &Config,
    sdu: &[u8],
    ptype: u16,
    max_pdu_size: usize,
) -> Result<(), Error> {
    ctx.link_status_mut().record_in(sdu.len());

    if sdu.len() > max_pdu_size {
        ctx.link_status_mut().record_dropped(sdu.len());
        warn!("dropping {}-byte SDU: exceeds max PDU size", sdu.len());
        return Err(Error::SduTooLarge);
    }

    let is_signal = ptype == PROTO_TYPE_SIGNAL;
    let omissible = !is_signal && conf.use_ptype_omission() && ptype == conf.implicit_protocol_type();

    let mut ptype_header = Vec::<u8, 3>::new();
    let field = if is_signal {
        ProtoTypeField::Signal
    } else if omissible {
        ProtoTypeField::Implicit
    } else if conf.use_compressed_ptype() {
        match proto_type::compress(ptype) {
            Some(code) => {
                let _ = ptype_header.push(code);
            }
            None => {
                let _ = ptype_header.push(PTYPE_COMPRESSION_ESCAPE);
                let _ = ptype_header.extend_from_slice(&ptype.to_be_bytes());
            }
        }
        ProtoTypeField::Compressed
    } else {
        let _ = ptype_header.extend_from_slice(&ptype.to_be_bytes());
        ProtoTypeField::Uncompressed
    };

    let alpdu_len = ptype_header.len() + sdu.len();
    if alpdu_len > RLE_MAX_LENGTH_FIELD as usize {
        ctx.link_status_mut().record_dropped(sdu.len());
        warn!(
            "dropping {}-byte SDU: {}-byte ALPDU exceeds the 11-bit Length field",
            sdu.len(),
            alpdu_len
        );
        return Err(Error::SduTooLarge);
    }

    if let Err(e) = buffer.stage(&ptype_header, sdu) {
        ctx.link_status_mut().record_dropped(sdu.len());
        return Err(e);
    }

    ctx.set_proto_type(ptype);
    ctx.set_proto_type_field(field);
    ctx.set_use_crc(conf.use_alpdu_crc());
    ctx.set_fragmented(false);

    debug!(
        "encapsulated {}-byte SDU, ptype=0x{:04x}, field={:?}",
        sdu.len(),
        ptype,
        field
    );

    Ok(())
}
