//! The receive-side working buffer: accumulates PPDU payloads into one reconstructed ALPDU.

use crate::{Error, ALPDU_MAX_SIZE};
use heapless::Vec;

/// Accumulates the bytes of one inbound ALPDU as its PPDU fragments arrive.
pub struct ReassemblyBuffer {
    data: Vec<u8, ALPDU_MAX_SIZE>,
    expected_total_length: usize,
}

impl ReassemblyBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        ReassemblyBuffer {
            data: Vec::new(),
            expected_total_length: 0,
        }
    }

    /// Resets the buffer to start reassembling an ALPDU of `expected_total_length` bytes.
    pub fn init(&mut self, expected_total_length: usize) {
        self.data.clear();
        self.expected_total_length = expected_total_length;
    }

    /// Appends `payload` to the accumulator.
    ///
    /// Fails if this would overrun `expected_total_length`, which indicates a malformed or
    /// out-of-sync stream of fragments.
    pub fn accept(&mut self, payload: &[u8]) -> Result<(), Error> {
        if self.data.len() + payload.len() > self.expected_total_length {
            return Err(Error::MalformedHeader);
        }
        self.data
            .extend_from_slice(payload)
            .map_err(|()| Error::MalformedHeader)
    }

    /// Bytes accumulated so far.
    pub fn received_length(&self) -> usize {
        self.data.len()
    }

    /// The total ALPDU length announced by the `START` (or `COMPLETE`) fragment.
    pub fn expected_total_length(&self) -> usize {
        self.expected_total_length
    }

    /// Whether every expected byte has arrived.
    pub fn is_complete(&self) -> bool {
        self.data.len() == self.expected_total_length
    }

    /// The accumulated ALPDU bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }
}

impl Default for ReassemblyBuffer {
    fn default() -> Self {
        Self::new()
    }
}
