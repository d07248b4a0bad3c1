//! The receiver facade: owns every fragment ID's context and reassembly buffer, and drives
//! deencapsulation on behalf of a caller.

use crate::config::Config;
use crate::context::{Context, FreeContextMask, LinkStatus, RLE_MAX_FRAG_NUMBER};
use crate::reassembly::{self, DeencapResult};
use crate::reassembly_buffer::ReassemblyBuffer;
use crate::{Error, RLE_MAX_PDU_SIZE};

/// A reassembled SDU, ready to be read out of the receiver.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CompletedSdu {
    /// The fragment ID this ALPDU was reassembled on. Freed as of this event: a subsequent
    /// `COMPLETE`/`START` on the same link may reuse it.
    pub frag_id: u8,
    /// The decoded protocol type tagging the SDU.
    pub proto_type: u16,
}

/// Owns the receive-side state for up to [`RLE_MAX_FRAG_NUMBER`] concurrently in-flight ALPDUs.
pub struct RleReceiver {
    conf: Config,
    contexts: [Context; RLE_MAX_FRAG_NUMBER],
    buffers: [ReassemblyBuffer; RLE_MAX_FRAG_NUMBER],
    mask: FreeContextMask,
}

impl RleReceiver {
    /// Builds a receiver with every context free.
    pub fn new(conf: Config) -> Self {
        RleReceiver {
            conf,
            contexts: core::array::from_fn(|i| Context::new(i as u8)),
            buffers: core::array::from_fn(|_| ReassemblyBuffer::new()),
            mask: FreeContextMask::new(),
        }
    }

    /// Feeds one inbound PPDU through the reassembly engine.
    ///
    /// Returns `Some(CompletedSdu)` once the ALPDU it belongs to is fully reassembled; the SDU
    /// bytes themselves are then available via [`RleReceiver::take_sdu`]. A fragment that merely
    /// advances a pending ALPDU returns `None`.
    ///
    /// Malformed PPDUs, illegal reassembly transitions, and trailer mismatches are all reported as
    /// an `Err`; the owning context has already been dropped and released by the time this
    /// returns, so the caller only needs to decide what, if anything, to log.
    pub fn process_fragment(&mut self, ppdu: &[u8]) -> Result<Option<CompletedSdu>, Error> {
        let result = reassembly::deencapsulate(
            &mut self.contexts,
            &mut self.buffers,
            &mut self.mask,
            &self.conf,
            ppdu,
            RLE_MAX_PDU_SIZE,
        )?;
        Ok(match result {
            DeencapResult::Pending => None,
            DeencapResult::Complete { frag_id, proto_type } => Some(CompletedSdu { frag_id, proto_type }),
        })
    }

    /// Reads the SDU bytes of a completed ALPDU, as reported by [`RleReceiver::process_fragment`].
    ///
    /// Valid to call only up until the next `COMPLETE`/`START` fragment reclaims `frag_id`: the
    /// buffer is reused across ALPDUs, not reset on its own.
    pub fn take_sdu(&self, frag_id: u8) -> &[u8] {
        let ctx = &self.contexts[frag_id as usize];
        let buffer = &self.buffers[frag_id as usize];
        let header_len = reassembly::proto_type_header_len(ctx.proto_type_field(), buffer.bytes());
        &buffer.bytes()[header_len..]
    }

    /// Whether `frag_id` is currently free.
    pub fn is_free(&self, frag_id: u8) -> bool {
        self.mask.is_free(frag_id)
    }

    /// Reads the link statistics for `frag_id`.
    pub fn stats(&self, frag_id: u8) -> LinkStatus {
        *self.contexts[frag_id as usize].link_status()
    }

    /// Resets the link statistics for `frag_id` to zero.
    pub fn reset(&mut self, frag_id: u8) {
        self.contexts[frag_id as usize].link_status_mut().reset();
    }

    /// Reads the link statistics for every fragment ID at once.
    pub fn snapshot_all(&self) -> [LinkStatus; RLE_MAX_FRAG_NUMBER] {
        core::array::from_fn(|i| *self.contexts[i].link_status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encap::encapsulate;
    use crate::frag_buffer::FragmentBuffer;
    use crate::fragmentation::build_fragment;
    use crate::header::FragmentKind;
    use crate::proto_type::PROTO_TYPE_IPV4;

    #[test]
    fn single_complete_ppdu_is_reassembled() {
        let conf = Config::new(PROTO_TYPE_IPV4, false, false, true).unwrap();
        let mut ctx = Context::new(0);
        let mut buf = FragmentBuffer::new();
        encapsulate(&mut ctx, &mut buf, &conf, &[9, 9, 9], PROTO_TYPE_IPV4, 4096).unwrap();
        let mut out = [0u8; 64];
        let (_, written) = build_fragment(&mut ctx, &mut buf, &mut out).unwrap();

        let mut rx = RleReceiver::new(conf);
        let completed = rx.process_fragment(&out[..written]).unwrap().unwrap();
        assert_eq!(completed.proto_type, PROTO_TYPE_IPV4);
        assert_eq!(rx.take_sdu(completed.frag_id), &[9, 9, 9]);
        assert!(rx.is_free(completed.frag_id));
    }

    #[test]
    fn fragmented_flow_is_reassembled() {
        let conf = Config::new(PROTO_TYPE_IPV4, true, false, false).unwrap();
        let sdu = [5u8; 900];
        let mut ctx = Context::new(0);
        let mut buf = FragmentBuffer::new();
        encapsulate(&mut ctx, &mut buf, &conf, &sdu, PROTO_TYPE_IPV4, 4096).unwrap();

        let mut rx = RleReceiver::new(conf);
        let mut completed = None;
        loop {
            let mut out = [0u8; 100];
            let (kind, written) = build_fragment(&mut ctx, &mut buf, &mut out).unwrap();
            if let Some(c) = rx.process_fragment(&out[..written]).unwrap() {
                completed = Some(c);
            }
            if kind == FragmentKind::End {
                break;
            }
        }
        let completed = completed.unwrap();
        assert_eq!(rx.take_sdu(completed.frag_id), &sdu[..]);
    }

    #[test]
    fn malformed_ppdu_is_rejected_without_panicking() {
        let mut rx = RleReceiver::new(Config::default());
        assert!(rx.process_fragment(&[0x00]).is_err());
    }
}
