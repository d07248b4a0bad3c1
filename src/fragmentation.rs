//! The fragmentation engine: slices a staged ALPDU into wire-ready PPDUs.

use crate::bytes::ByteWriter;
use crate::context::Context;
use crate::crc::crc32;
use crate::frag_buffer::FragmentBuffer;
use crate::header::{FragmentKind, Header, HEADER_SIZE, TRAILER_CRC_SIZE, TRAILER_SEQNO_SIZE};
use crate::Error;

/// Writes the next PPDU for `ctx`/`buffer` into `out`, returning the fragment kind and the number
/// of bytes written.
///
/// `out.len()` is the burst capacity available to this PPDU; the PPDU (header, payload, and any
/// trailer) is never larger than that.
pub(crate) fn build_fragment(
    ctx: &mut Context,
    buffer: &mut FragmentBuffer,
    out: &mut [u8],
) -> Result<(FragmentKind, usize), Error> {
    if buffer.is_empty() {
        return Err(Error::NoDataPending);
    }
    if out.len() <= HEADER_SIZE {
        return Err(Error::BurstTooSmall);
    }

    let avail = out.len() - HEADER_SIZE;
    let trailer_size = if ctx.use_crc() {
        TRAILER_CRC_SIZE
    } else {
        TRAILER_SEQNO_SIZE
    };
    let total_len = buffer.total_len() as u16;

    let (kind, payload) = buffer.emit(avail, trailer_size)?;
    let payload_len = payload.len() as u16;

    let header = match kind {
        FragmentKind::Complete => Header::new_first(kind, payload_len, ctx.proto_type_field()),
        FragmentKind::Start => Header::new_first(kind, total_len, ctx.proto_type_field()),
        FragmentKind::Cont | FragmentKind::End => {
            Header::new_continuation(kind, payload_len, ctx.frag_id())
        }
    };

    let mut writer = ByteWriter::new(out);
    header.write(&mut writer)?;
    writer.write_slice(payload)?;

    if kind == FragmentKind::End {
        if ctx.use_crc() {
            let crc = crc32(buffer.bytes());
            writer.write_u32_be(crc)?;
        } else {
            writer.write_u8(ctx.next_seq_nb())?;
            ctx.bump_seq_nb();
        }
    }

    if kind.is_last() {
        // `is_last` covers both COMPLETE and END: both finish the ALPDU and free the context,
        // but only END carries a trailer (COMPLETE's length field already spans the whole ALPDU).
        ctx.link_status_mut().record_ok(total_len as usize);
        ctx.release();
        debug!("emitted {:?} fragment, releasing frag_id {}", kind, ctx.frag_id());
    } else {
        ctx.set_fragmented(true);
    }

    let written = out.len() - writer.space_left();
    Ok((kind, written))
}
