//! The reassembly engine: dispatches inbound PPDUs by fragment kind and ID, and drives each
//! fragment ID's reassembly state machine.

use crate::bytes::ByteReader;
use crate::config::Config;
use crate::context::{Context, FreeContextMask};
use crate::header::{FragmentKind, Header, ProtoTypeField};
use crate::proto_type::{self, PROTO_TYPE_SIGNAL, PTYPE_COMPRESSION_ESCAPE};
use crate::reassembly_buffer::ReassemblyBuffer;
use crate::Error;

/// Outcome of feeding one PPDU to the reassembly engine.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum DeencapResult {
    /// The fragment was accepted, but the ALPDU is not complete yet.
    Pending,
    /// The ALPDU for this fragment ID is complete; its SDU can now be read out of the
    /// corresponding [`ReassemblyBuffer`].
    Complete { frag_id: u8, proto_type: u16 },
}

/// Feeds one inbound PPDU through the reassembly state machine.
///
/// `contexts`/`buffers` are the receiver's full per-fragment-ID arrays; `mask` is its free-context
/// bitmap.
pub(crate) fn deencapsulate(
    contexts: &mut [Context],
    buffers: &mut [ReassemblyBuffer],
    mask: &mut FreeContextMask,
    conf: &Config,
    ppdu: &[u8],
    max_pdu_size: usize,
) -> Result<DeencapResult, Error> {
    if ppdu.len() > max_pdu_size {
        return Err(Error::MalformedHeader);
    }

    let mut reader = ByteReader::new(ppdu);
    let header = Header::read(&mut reader)?;
    let kind = header.kind();

    let frag_id = if kind.is_first() {
        // A new ALPDU always claims the lowest-numbered free context, mirroring the order in
        // which the transmitter itself allocates fragment IDs to new ALPDUs; see DESIGN.md for
        // why this keeps both sides in sync on a single point-to-point link.
        match mask.alloc_any() {
            Some(id) => id,
            None => {
                warn!("no free context for incoming {:?} fragment", kind);
                return Err(Error::NoFreeContext);
            }
        }
    } else {
        header.frag_id()
    };

    let ctx = &mut contexts[frag_id as usize];
    let buffer = &mut buffers[frag_id as usize];

    let next_state = match ctx.state().advance(kind) {
        Ok(state) => state,
        Err(err) => {
            drop_and_release(ctx, buffer, mask, frag_id, err);
            return Err(err);
        }
    };
    ctx.set_state(next_state);

    let result = match kind {
        FragmentKind::Complete => accept_first(ctx, buffer, &header, &mut reader, conf, true),
        FragmentKind::Start => accept_first(ctx, buffer, &header, &mut reader, conf, false),
        FragmentKind::Cont => accept_continuation(ctx, buffer, &header, &mut reader, conf, false),
        FragmentKind::End => accept_continuation(ctx, buffer, &header, &mut reader, conf, true),
    };

    match result {
        Ok(Some(proto_type)) => {
            mask.set_free(frag_id);
            ctx.release();
            Ok(DeencapResult::Complete { frag_id, proto_type })
        }
        Ok(None) => Ok(DeencapResult::Pending),
        Err(err) => {
            drop_and_release(ctx, buffer, mask, frag_id, err);
            Err(err)
        }
    }
}

/// Handles a `COMPLETE` or `START` fragment: stages the reassembly buffer and, for `COMPLETE`,
/// decodes the protocol type immediately (the whole ALPDU is already present).
///
/// Returns `Ok(Some(proto_type))` when the ALPDU is already complete, `Ok(None)` otherwise.
fn accept_first(
    ctx: &mut Context,
    buffer: &mut ReassemblyBuffer,
    header: &Header,
    reader: &mut ByteReader<'_>,
    conf: &Config,
    complete: bool,
) -> Result<Option<u16>, Error> {
    let field = header.proto_type_field()?;
    ctx.set_proto_type_field(field);

    if complete {
        let alpdu_bytes = reader.read_rest();
        buffer.init(alpdu_bytes.len());
        buffer.accept(alpdu_bytes)?;
        let proto_type = decode_proto_type(field, buffer.bytes(), conf)?;
        ctx.set_proto_type(proto_type);
        ctx.link_status_mut().record_ok(alpdu_bytes.len());
        Ok(Some(proto_type))
    } else {
        let total_alpdu_len = header.length() as usize;
        buffer.init(total_alpdu_len);
        let payload = reader.read_rest();
        buffer.accept(payload)?;
        Ok(None)
    }
}

/// Handles a `CONT` or `END` fragment. `END`s trailer (sequence number or CRC, per
/// `ctx.use_crc()`) is validated; on a mismatch, `Error::TrailerMismatch` is returned (the caller
/// is responsible for bumping `counter_lost`, since this path returns through the shared
/// drop-and-release handling).
fn accept_continuation(
    ctx: &mut Context,
    buffer: &mut ReassemblyBuffer,
    header: &Header,
    reader: &mut ByteReader<'_>,
    conf: &Config,
    end: bool,
) -> Result<Option<u16>, Error> {
    let payload_len = header.length() as usize;
    let payload = reader.read_slice(payload_len)?;
    buffer.accept(payload)?;

    if !end {
        if !reader.is_empty() {
            return Err(Error::InvalidValue);
        }
        return Ok(None);
    }

    let trailer_ok = if ctx.use_crc() {
        let crc = reader.read_u32_be()?;
        crc == crate::crc::crc32(buffer.bytes())
    } else {
        let seq = reader.read_u8()?;
        let expected = ctx.next_seq_nb();
        ctx.bump_seq_nb();
        seq == expected
    };
    if !reader.is_empty() {
        return Err(Error::InvalidValue);
    }
    if !buffer.is_complete() {
        return Err(Error::MalformedHeader);
    }
    if !trailer_ok {
        return Err(Error::TrailerMismatch);
    }

    let proto_type = decode_proto_type(ctx.proto_type_field(), buffer.bytes(), conf)?;
    ctx.set_proto_type(proto_type);
    ctx.link_status_mut().record_ok(buffer.received_length());
    Ok(Some(proto_type))
}

fn decode_proto_type(field: ProtoTypeField, alpdu_bytes: &[u8], conf: &Config) -> Result<u16, Error> {
    let mut reader = ByteReader::new(alpdu_bytes);
    match field {
        ProtoTypeField::Implicit => Ok(conf.implicit_protocol_type()),
        ProtoTypeField::Signal => Ok(PROTO_TYPE_SIGNAL),
        ProtoTypeField::Compressed => {
            let code = reader.read_u8()?;
            if code == PTYPE_COMPRESSION_ESCAPE {
                reader.read_u16_be()
            } else {
                proto_type::decompress(code).ok_or(Error::MalformedHeader)
            }
        }
        ProtoTypeField::Uncompressed => reader.read_u16_be(),
    }
}

/// The number of ALPDU bytes occupied by the protocol-type header, derived from `field` and (for
/// `Compressed`) the first byte actually present.
pub(crate) fn proto_type_header_len(field: ProtoTypeField, alpdu_bytes: &[u8]) -> usize {
    match field {
        ProtoTypeField::Implicit | ProtoTypeField::Signal => 0,
        ProtoTypeField::Compressed => {
            if alpdu_bytes.first() == Some(&PTYPE_COMPRESSION_ESCAPE) {
                3
            } else {
                1
            }
        }
        ProtoTypeField::Uncompressed => 2,
    }
}

fn drop_and_release(
    ctx: &mut Context,
    buffer: &ReassemblyBuffer,
    mask: &mut FreeContextMask,
    frag_id: u8,
    err: Error,
) {
    let was_pending = buffer.received_length() > 0 || buffer.expected_total_length() > 0;
    ctx.link_status_mut().record_dropped(buffer.received_length());
    if was_pending {
        ctx.link_status_mut().record_lost();
    }
    mask.set_free(frag_id);
    ctx.release();
    warn!("dropping frag_id {}: {}", frag_id, err);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RLE_MAX_FRAG_NUMBER;
    use crate::fragmentation::build_fragment;
    use crate::frag_buffer::FragmentBuffer;
    use crate::encap::encapsulate;
    use crate::proto_type::PROTO_TYPE_IPV4;

    struct Fixture {
        contexts: [Context; RLE_MAX_FRAG_NUMBER],
        buffers: [ReassemblyBuffer; RLE_MAX_FRAG_NUMBER],
        mask: FreeContextMask,
        conf: Config,
    }

    impl Fixture {
        fn new(conf: Config) -> Self {
            Fixture {
                contexts: core::array::from_fn(|i| Context::new(i as u8)),
                buffers: core::array::from_fn(|_| ReassemblyBuffer::new()),
                mask: FreeContextMask::new(),
                conf,
            }
        }

        fn feed(&mut self, ppdu: &[u8]) -> Result<DeencapResult, Error> {
            deencapsulate(&mut self.contexts, &mut self.buffers, &mut self.mask, &self.conf, ppdu, 4096)
        }

        fn sdu(&self, frag_id: u8) -> &[u8] {
            let ctx = &self.contexts[frag_id as usize];
            let buffer = &self.buffers[frag_id as usize];
            let header_len = proto_type_header_len(ctx.proto_type_field(), buffer.bytes());
            &buffer.bytes()[header_len..]
        }
    }

    fn build_complete_ppdu(conf: &Config, sdu: &[u8], ptype: u16) -> heapless::Vec<u8, 4096> {
        let mut ctx = Context::new(0);
        let mut buf = FragmentBuffer::new();
        encapsulate(&mut ctx, &mut buf, conf, sdu, ptype, 4096).unwrap();
        let mut out = [0u8; 4096];
        let (_, written) = build_fragment(&mut ctx, &mut buf, &mut out).unwrap();
        heapless::Vec::from_slice(&out[..written]).unwrap()
    }

    #[test]
    fn single_complete_ppdu_round_trips() {
        let conf = Config::new(PROTO_TYPE_IPV4, false, false, true).unwrap();
        let sdu = [1, 2, 3, 4, 5];
        let ppdu = build_complete_ppdu(&conf, &sdu, PROTO_TYPE_IPV4);

        let mut fx = Fixture::new(conf);
        match fx.feed(&ppdu).unwrap() {
            DeencapResult::Complete { frag_id, proto_type } => {
                assert_eq!(proto_type, PROTO_TYPE_IPV4);
                assert_eq!(fx.sdu(frag_id), &sdu);
            }
            DeencapResult::Pending => panic!("expected a complete ALPDU"),
        }
        assert!(fx.mask.is_free(0));
    }

    #[test]
    fn fragmented_flow_round_trips_with_crc() {
        let conf = Config::new(PROTO_TYPE_IPV4, true, false, false).unwrap();
        let sdu = [7u8; 1000];

        let mut ctx = Context::new(0);
        let mut buf = FragmentBuffer::new();
        encapsulate(&mut ctx, &mut buf, &conf, &sdu, PROTO_TYPE_IPV4, 4096).unwrap();

        let mut fx = Fixture::new(conf);
        let mut final_sdu: Option<heapless::Vec<u8, 4096>> = None;
        loop {
            let mut out = [0u8; 128];
            let (kind, written) = build_fragment(&mut ctx, &mut buf, &mut out).unwrap();
            match fx.feed(&out[..written]).unwrap() {
                DeencapResult::Complete { frag_id, .. } => {
                    final_sdu = Some(heapless::Vec::from_slice(fx.sdu(frag_id)).unwrap());
                }
                DeencapResult::Pending => {}
            }
            if kind == FragmentKind::End {
                break;
            }
        }
        assert_eq!(&final_sdu.unwrap()[..], &sdu[..]);
    }

    #[test]
    fn illegal_cont_on_free_context_is_rejected() {
        let conf = Config::default();
        let mut fx = Fixture::new(conf);
        // S=0,E=0 (CONT), Length=1, LT_T_FID=2 (frag_id), one payload byte.
        let ppdu = [0x00, 0x0A, 0xAA];
        assert_eq!(fx.feed(&ppdu), Err(Error::InvalidTransition));
        assert_eq!(fx.contexts[2].link_status().counter_dropped, 1);
        assert!(fx.mask.is_free(2));
    }

    #[test]
    fn bit_flip_in_crc_mode_reports_trailer_mismatch() {
        let conf = Config::new(PROTO_TYPE_IPV4, true, false, false).unwrap();
        let sdu = [3u8; 50];
        let mut ctx = Context::new(0);
        let mut buf = FragmentBuffer::new();
        encapsulate(&mut ctx, &mut buf, &conf, &sdu, PROTO_TYPE_IPV4, 4096).unwrap();

        let mut fx = Fixture::new(conf);
        loop {
            let mut out = [0u8; 32];
            let (kind, written) = build_fragment(&mut ctx, &mut buf, &mut out).unwrap();
            let mut frame = out;
            if kind == FragmentKind::End {
                frame[written - 1] ^= 0xFF;
                assert_eq!(fx.feed(&frame[..written]), Err(Error::TrailerMismatch));
                assert_eq!(fx.contexts[0].link_status().counter_lost, 1);
                break;
            } else {
                fx.feed(&frame[..written]).unwrap();
            }
        }
    }
}
