//! Per-fragment-ID bookkeeping shared by the transmit and receive sides: link statistics, the
//! free-context bitmap, and the receiver's reassembly state machine.

use crate::header::{FragmentKind, ProtoTypeField, RLE_MAX_FRAG_ID};
use crate::Error;

/// Maximum number of fragment IDs, and so the maximum number of concurrently in-flight ALPDUs per
/// transmitter or receiver instance.
pub const RLE_MAX_FRAG_NUMBER: usize = RLE_MAX_FRAG_ID as usize + 1;

/// The seven monotonic counters tracked per fragment ID.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct LinkStatus {
    pub counter_in: u64,
    pub counter_ok: u64,
    pub counter_dropped: u64,
    pub counter_lost: u64,
    pub counter_bytes_in: u64,
    pub counter_bytes_ok: u64,
    pub counter_bytes_dropped: u64,
}

impl LinkStatus {
    /// Records an SDU (or PPDU) entering the pipeline.
    pub fn record_in(&mut self, bytes: usize) {
        self.counter_in += 1;
        self.counter_bytes_in += bytes as u64;
    }

    /// Records a successfully completed ALPDU.
    pub fn record_ok(&mut self, bytes: usize) {
        self.counter_ok += 1;
        self.counter_bytes_ok += bytes as u64;
    }

    /// Records a dropped ALPDU (rejected before or during framing).
    pub fn record_dropped(&mut self, bytes: usize) {
        self.counter_dropped += 1;
        self.counter_bytes_dropped += bytes as u64;
    }

    /// Records a reassembled-but-invalid ALPDU (trailer mismatch).
    pub fn record_lost(&mut self) {
        self.counter_lost += 1;
    }

    /// Resets every counter to zero.
    pub fn reset(&mut self) {
        *self = LinkStatus::default();
    }
}

/// One bit per fragment ID: set when the context is busy, clear when free.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct FreeContextMask(u8);

impl FreeContextMask {
    /// An empty mask: every context free.
    pub fn new() -> Self {
        FreeContextMask(0)
    }

    /// Whether `frag_id` is currently free.
    pub fn is_free(self, frag_id: u8) -> bool {
        self.0 & (1 << frag_id) == 0
    }

    /// Marks `frag_id` as busy.
    pub fn set_used(&mut self, frag_id: u8) {
        self.0 |= 1 << frag_id;
    }

    /// Marks `frag_id` as free.
    pub fn set_free(&mut self, frag_id: u8) {
        self.0 &= !(1 << frag_id);
    }

    /// Finds the lowest-numbered free fragment ID, marks it busy, and returns it.
    ///
    /// Returns `None` (and leaves the mask unchanged) if every fragment ID is busy.
    pub fn alloc_any(&mut self) -> Option<u8> {
        for frag_id in 0..=RLE_MAX_FRAG_ID {
            if self.is_free(frag_id) {
                self.set_used(frag_id);
                return Some(frag_id);
            }
        }
        None
    }

    /// Raw bitmap, bit *i* set iff fragment ID *i* is busy.
    pub fn raw(self) -> u8 {
        self.0
    }
}

/// The receiver-side reassembly state machine for one fragment ID.
///
/// `Idle` also stands in for the source's `UNINIT`/post-`END`/post-`COMPLETE` state: a context
/// with no ALPDU in flight.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReassemblyState {
    Idle,
    Started,
    Continuing,
}

impl Default for ReassemblyState {
    fn default() -> Self {
        ReassemblyState::Idle
    }
}

impl ReassemblyState {
    /// Validates and applies the transition implied by receiving a PPDU of `kind`.
    ///
    /// On success returns the state to move to. `Idle` means the context is now (or still) free.
    pub fn advance(self, kind: FragmentKind) -> Result<Self, Error> {
        use FragmentKind::*;
        use ReassemblyState::*;
        match (self, kind) {
            (Idle, Complete) => Ok(Idle),
            (Idle, Start) => Ok(Started),
            (Started, Cont) => Ok(Continuing),
            (Started, End) => Ok(Idle),
            (Continuing, Cont) => Ok(Continuing),
            (Continuing, End) => Ok(Idle),
            _ => Err(Error::InvalidTransition),
        }
    }
}

/// Per-fragment-ID record shared by transmitter and receiver contexts.
#[derive(Debug, Copy, Clone)]
pub struct Context {
    frag_id: u8,
    next_seq_nb: u8,
    is_fragmented: bool,
    use_crc: bool,
    proto_type: u16,
    proto_type_field: ProtoTypeField,
    state: ReassemblyState,
    link_status: LinkStatus,
}

impl Context {
    /// Builds a fresh, idle context for `frag_id`.
    pub fn new(frag_id: u8) -> Self {
        Context {
            frag_id,
            next_seq_nb: 0,
            is_fragmented: false,
            use_crc: false,
            proto_type: 0,
            proto_type_field: ProtoTypeField::Implicit,
            state: ReassemblyState::Idle,
            link_status: LinkStatus::default(),
        }
    }

    pub fn frag_id(&self) -> u8 {
        self.frag_id
    }

    pub fn next_seq_nb(&self) -> u8 {
        self.next_seq_nb
    }

    /// Increments the sequence number, wrapping at 256.
    pub fn bump_seq_nb(&mut self) {
        self.next_seq_nb = self.next_seq_nb.wrapping_add(1);
    }

    pub fn is_fragmented(&self) -> bool {
        self.is_fragmented
    }

    pub fn set_fragmented(&mut self, fragmented: bool) {
        self.is_fragmented = fragmented;
    }

    pub fn use_crc(&self) -> bool {
        self.use_crc
    }

    pub fn set_use_crc(&mut self, use_crc: bool) {
        self.use_crc = use_crc;
    }

    pub fn proto_type(&self) -> u16 {
        self.proto_type
    }

    pub fn set_proto_type(&mut self, proto_type: u16) {
        self.proto_type = proto_type;
    }

    pub fn proto_type_field(&self) -> ProtoTypeField {
        self.proto_type_field
    }

    pub fn set_proto_type_field(&mut self, field: ProtoTypeField) {
        self.proto_type_field = field;
    }

    pub fn state(&self) -> ReassemblyState {
        self.state
    }

    pub fn set_state(&mut self, state: ReassemblyState) {
        self.state = state;
    }

    pub fn link_status(&self) -> &LinkStatus {
        &self.link_status
    }

    pub fn link_status_mut(&mut self) -> &mut LinkStatus {
        &mut self.link_status
    }

    /// Resets per-ALPDU bookkeeping, as happens whenever the context is released back to free.
    pub fn release(&mut self) {
        self.is_fragmented = false;
        self.state = ReassemblyState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_allocates_lowest_free_id_first() {
        let mut mask = FreeContextMask::new();
        assert_eq!(mask.alloc_any(), Some(0));
        assert_eq!(mask.alloc_any(), Some(1));
        mask.set_free(0);
        assert_eq!(mask.alloc_any(), Some(0));
    }

    #[test]
    fn mask_exhausts() {
        let mut mask = FreeContextMask::new();
        for i in 0..=RLE_MAX_FRAG_ID {
            assert_eq!(mask.alloc_any(), Some(i));
        }
        assert_eq!(mask.alloc_any(), None);
    }

    #[test]
    fn release_is_idempotent() {
        let mut ctx = Context::new(0);
        ctx.set_fragmented(true);
        ctx.set_state(ReassemblyState::Continuing);
        ctx.release();
        ctx.release();
        assert!(!ctx.is_fragmented());
        assert_eq!(ctx.state(), ReassemblyState::Idle);
    }

    #[test]
    fn legal_reassembly_sequence() {
        use FragmentKind::*;
        use ReassemblyState::*;
        let mut state = Idle;
        state = state.advance(Start).unwrap();
        assert_eq!(state, Started);
        state = state.advance(Cont).unwrap();
        assert_eq!(state, Continuing);
        state = state.advance(End).unwrap();
        assert_eq!(state, Idle);
    }

    #[test]
    fn illegal_cont_on_idle_context() {
        assert_eq!(
            ReassemblyState::Idle.advance(FragmentKind::Cont),
            Err(Error::InvalidTransition)
        );
    }
}
