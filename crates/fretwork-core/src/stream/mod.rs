//! Byte stream primitives shared by all dialect codecs.
//!
//! `InputStream` is a forward-only, position-tracking reader over an
//! in-memory byte buffer; `OutputStream` is the matching writer over any
//! `std::io::Write` sink. Both are little-endian, which is fixed across
//! the whole format family.

mod input;
mod output;

pub use input::InputStream;
pub use output::OutputStream;

/// Size of the signature block at the start of every supported file.
///
/// The block holds a u8-length-prefixed identifier string, zero padded.
pub const HEADER_BLOCK_SIZE: usize = 30;
