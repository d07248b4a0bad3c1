//! The transmit-side working buffer: owns one outbound ALPDU and slices it into PPDU payloads.

use crate::header::FragmentKind;
use crate::{Error, ALPDU_MAX_SIZE};
use heapless::Vec;

/// Owns one outbound ALPDU (protocol-type header, if any, followed by the SDU) and produces its
/// PPDU fragments in order.
pub struct FragmentBuffer {
    data: Vec<u8, ALPDU_MAX_SIZE>,
    offset: usize,
    /// Set once the terminal fragment (`COMPLETE` or `END`) has been emitted. `remaining() == 0`
    /// is not by itself sufficient to detect completion: a `CONT` can drain every remaining byte
    /// while leaving the trailer-carrying `END` still to be sent (see `emit`).
    finished: bool,
}

impl FragmentBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        FragmentBuffer {
            data: Vec::new(),
            offset: 0,
            finished: true,
        }
    }

    /// Clears the buffer back to its just-constructed state.
    pub fn init(&mut self) {
        self.data.clear();
        self.offset = 0;
        self.finished = true;
    }

    /// Stages a new ALPDU for fragmentation: `ptype_header` (0-3 bytes) followed by `sdu`.
    ///
    /// This is the one point where the SDU is copied: afterwards, `emit` only ever hands out
    /// borrowed slices of this buffer, decoupling the transmitter from the caller's SDU slice.
    pub fn stage(&mut self, ptype_header: &[u8], sdu: &[u8]) -> Result<(), Error> {
        if ptype_header.len() + sdu.len() > ALPDU_MAX_SIZE {
            return Err(Error::SduTooLarge);
        }
        self.data.clear();
        self.data
            .extend_from_slice(ptype_header)
            .map_err(|()| Error::SduTooLarge)?;
        self.data
            .extend_from_slice(sdu)
            .map_err(|()| Error::SduTooLarge)?;
        self.offset = 0;
        self.finished = false;
        Ok(())
    }

    /// Total ALPDU length (protocol-type header plus SDU).
    pub fn total_len(&self) -> usize {
        self.data.len()
    }

    /// Bytes not yet handed out by `emit`.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Whether the staged ALPDU's terminal fragment (`COMPLETE` or `END`) has already been
    /// emitted, or nothing has been staged at all.
    pub fn is_empty(&self) -> bool {
        self.finished
    }

    /// Whether no fragment has been emitted yet for the staged ALPDU.
    pub fn is_first(&self) -> bool {
        self.offset == 0
    }

    /// The full staged ALPDU, regardless of how much of it has been emitted. Used to compute the
    /// END trailer, which covers the entire ALPDU.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns the next PPDU payload slice (at most `avail` bytes) and its fragment kind,
    /// advancing past the returned bytes.
    ///
    /// `trailer_size` is the number of trailer bytes an `END` fragment would need, so this can
    /// decide whether the remainder fits in one more fragment.
    ///
    /// A `CONT` never takes more than `remaining`: when the whole remainder fits in `avail` as
    /// payload but leaves no room for the trailer, it is better to drain it as a `CONT` and emit a
    /// (possibly zero-payload) trailer-carrying `END` next, than to either overrun the buffer or
    /// drop the trailer.
    pub fn emit(&mut self, avail: usize, trailer_size: usize) -> Result<(FragmentKind, &[u8]), Error> {
        if avail == 0 {
            return Err(Error::BurstTooSmall);
        }

        let remaining = self.remaining();
        let first = self.is_first();

        let (kind, take) = if first && remaining <= avail {
            (FragmentKind::Complete, remaining)
        } else if first {
            (FragmentKind::Start, avail)
        } else if remaining + trailer_size <= avail {
            (FragmentKind::End, remaining)
        } else {
            (FragmentKind::Cont, remaining.min(avail))
        };

        let start = self.offset;
        self.offset += take;
        if kind.is_last() {
            self.finished = true;
        }
        Ok((kind, &self.data[start..start + take]))
    }
}

impl Default for FragmentBuffer {
    fn default() -> Self {
        Self::new()
    }
}
