//! A Return Link Encapsulation (RLE) codec core.
//!
//! RLE turns Service Data Units (SDUs) handed down from a higher layer into a stream of
//! fixed-capacity wire fragments (PPDUs) suitable for a satellite return link, and reassembles
//! SDUs back out of a received PPDU stream. Up to [`RLE_MAX_FRAG_NUMBER`] ALPDUs can be in flight
//! concurrently, multiplexed by a 3-bit fragment ID.
//!
//! The two facades applications actually drive are [`RleTransmitter`] and [`RleReceiver`]; the
//! header codec, buffers, and encapsulation/fragmentation/reassembly engines underneath them are
//! crate-internal.
//!
//! This crate does not allocate: every context owns its buffers inline, sized at construction
//! time, and reused across ALPDUs.

#![no_std]

#[cfg(feature = "std")]
extern crate std;

#[macro_use]
mod log;

pub mod bytes;
pub mod config;
mod context;
pub mod crc;
mod encap;
mod error;
mod frag_buffer;
mod fragmentation;
pub mod header;
pub mod proto_type;
mod reassembly;
mod reassembly_buffer;
pub mod receiver;
pub mod transmitter;

pub use config::Config;
pub use context::{LinkStatus, RLE_MAX_FRAG_NUMBER};
pub use error::Error;
pub use header::{FragmentKind, RLE_MAX_FRAG_ID};
pub use receiver::RleReceiver;
pub use transmitter::RleTransmitter;

/// Worst-case size of a protocol-type header: the compression escape byte plus an uncompressed
/// 16-bit type.
pub(crate) const PTYPE_HEADER_MAX_SIZE: usize = 3;

/// Maximum SDU size accepted by the encapsulation engine.
///
/// Bounded so that the worst-case ALPDU (this SDU plus the largest possible protocol-type header)
/// never exceeds [`header::RLE_MAX_LENGTH_FIELD`], the 11-bit `Length` field's capacity: a larger
/// bound would let `Header::pack` silently truncate a `COMPLETE`/`START` fragment's length.
pub const RLE_MAX_PDU_SIZE: usize = header::RLE_MAX_LENGTH_FIELD as usize - PTYPE_HEADER_MAX_SIZE;

/// Capacity of the fixed-size buffer backing each context: the largest ALPDU this crate can
/// stage, protocol-type header included. Equal to `RLE_MAX_LENGTH_FIELD` by construction.
pub(crate) const ALPDU_MAX_SIZE: usize = RLE_MAX_PDU_SIZE + PTYPE_HEADER_MAX_SIZE;
