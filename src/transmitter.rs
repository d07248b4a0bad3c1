//! The transmitter facade: owns every fragment ID's context and fragment buffer, and drives
//! encapsulation and fragmentation on behalf of a caller.

use crate::config::Config;
use crate::context::{Context, FreeContextMask, LinkStatus, RLE_MAX_FRAG_NUMBER};
use crate::frag_buffer::FragmentBuffer;
use crate::header::FragmentKind;
use crate::{encap, fragmentation, Error, RLE_MAX_PDU_SIZE};

/// Owns the transmit-side state for up to [`RLE_MAX_FRAG_NUMBER`] concurrently in-flight ALPDUs.
pub struct RleTransmitter {
    conf: Config,
    contexts: [Context; RLE_MAX_FRAG_NUMBER],
    buffers: [FragmentBuffer; RLE_MAX_FRAG_NUMBER],
    mask: FreeContextMask,
}

impl RleTransmitter {
    /// Builds a transmitter with every context free.
    pub fn new(conf: Config) -> Self {
        RleTransmitter {
            conf,
            contexts: core::array::from_fn(|i| Context::new(i as u8)),
            buffers: core::array::from_fn(|_| FragmentBuffer::new()),
            mask: FreeContextMask::new(),
        }
    }

    /// Encapsulates `sdu` (tagged with `ptype`) into a freshly allocated context, returning the
    /// fragment ID it was assigned.
    ///
    /// Returns `Error::NoFreeContext` if every fragment ID is already in use.
    pub fn encapsulate(&mut self, sdu: &[u8], ptype: u16) -> Result<u8, Error> {
        let frag_id = self.mask.alloc_any().ok_or(Error::NoFreeContext)?;
        let ctx = &mut self.contexts[frag_id as usize];
        let buffer = &mut self.buffers[frag_id as usize];

        match encap::encapsulate(ctx, buffer, &self.conf, sdu, ptype, RLE_MAX_PDU_SIZE) {
            Ok(()) => Ok(frag_id),
            Err(err) => {
                self.mask.set_free(frag_id);
                Err(err)
            }
        }
    }

    /// Writes the next PPDU for `frag_id` into `out`, returning its fragment kind and length.
    ///
    /// Returns `Error::NoDataPending` if nothing is staged for `frag_id`. The context is freed
    /// automatically once the last fragment (`COMPLETE` or `END`) has been written.
    pub fn get_packet(&mut self, frag_id: u8, out: &mut [u8]) -> Result<(FragmentKind, usize), Error> {
        let ctx = &mut self.contexts[frag_id as usize];
        let buffer = &mut self.buffers[frag_id as usize];
        let (kind, written) = fragmentation::build_fragment(ctx, buffer, out)?;
        if kind.is_last() {
            self.mask.set_free(frag_id);
        }
        Ok((kind, written))
    }

    /// Whether `frag_id` is currently free.
    pub fn is_free(&self, frag_id: u8) -> bool {
        self.mask.is_free(frag_id)
    }

    /// Abandons any ALPDU in flight on `frag_id` and returns it to the free pool.
    ///
    /// Idempotent: calling this on an already-free context is a no-op besides the counter update,
    /// which only fires the first time (nothing is pending on subsequent calls).
    pub fn release_context(&mut self, frag_id: u8) {
        let buffer = &mut self.buffers[frag_id as usize];
        let ctx = &mut self.contexts[frag_id as usize];
        if !buffer.is_empty() {
            ctx.link_status_mut().record_dropped(buffer.remaining());
        }
        buffer.init();
        ctx.release();
        self.mask.set_free(frag_id);
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
