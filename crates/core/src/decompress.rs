//! Inflate for compressed containers.

use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::error::{CtfError, CtfResult};

/// Upper bound on the initial reservation, as a multiple of the input size.
const MAX_RATIO: usize = 8;

/// Inflate a zlib stream that must produce exactly `expected_len` bytes.
///
/// Short or oversized output is treated as corruption, as is any stream or
/// checksum error reported by the decoder. `expected_len` comes from an
/// untrusted header, so the buffer grows with the actual output instead of
/// being reserved up front.
pub fn inflate(compressed: &[u8], expected_len: usize) -> CtfResult<Vec<u8>> {
    let mut out = Vec::with_capacity(expected_len.min(compressed.len().saturating_mul(MAX_RATIO)));
    ZlibDecoder::new(compressed)
        .take(expected_len as u64 + 1)
        .read_to_end(&mut out)
        .map_err(CtfError::Decompress)?;

    if out.len() != expected_len {
        return Err(CtfError::DecompressedSize { expected: expected_len, actual: out.len() });
    }

    Ok(out)
}
