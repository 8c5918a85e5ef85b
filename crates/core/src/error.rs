//! Error type shared by the header reader, record decoder and graph builder.

use std::path::PathBuf;

use thiserror::Error;

/// Error type for building a [`Container`](crate::container::Container).
///
/// Every variant is terminal for the one container being decoded: no
/// partially built container is ever handed back to the caller.
#[derive(Debug, Error)]
pub enum CtfError {
    /// The buffer is too small to hold even the preamble.
    #[error("Buffer of {len} bytes does not contain a CTF preamble")]
    TooShort { len: usize },

    /// The preamble magic does not match in either byte order.
    #[error("Bad CTF magic 0x{found:04x}")]
    BadMagic { found: u16 },

    /// Only versions 2 and 3 are understood.
    #[error("CTF version {0} is not supported")]
    UnsupportedVersion(u8),

    /// The preamble is valid but the full header does not fit.
    #[error("CTF header truncated: need {needed} bytes, have {len}")]
    TruncatedHeader { needed: usize, len: usize },

    /// `typeoff` must be 4-byte aligned.
    #[error("Type section offset 0x{0:x} is not aligned properly")]
    MisalignedTypeOffset(u32),

    /// A section offset points past the end of the data.
    #[error("File is truncated or {section} offset is corrupt (offset {offset}, data length {len})")]
    SectionOutOfBounds { section: &'static str, offset: u64, len: usize },

    /// Section offsets are not in object <= function <= type <= string order.
    #[error("Section offsets out of order: {0}")]
    OffsetOrder(&'static str),

    /// The inflate stream itself failed (bad stream, bad checksum).
    #[error("Failed to decompress CTF data: {0}")]
    Decompress(#[source] std::io::Error),

    /// Inflate succeeded but produced the wrong amount of data.
    #[error("CTF data is corrupted: expected {expected} decompressed bytes, got {actual}")]
    DecompressedSize { expected: usize, actual: usize },

    /// A type record carries a kind outside the known range.
    #[error("Unexpected kind {kind} for type id {id}")]
    UnknownKind { kind: u32, id: u32 },

    /// A type record (or its trailer) runs past the end of the data.
    #[error("Type record for id {id} at offset {offset} is truncated")]
    TruncatedRecord { id: u32, offset: usize },

    /// Failure reading the input file.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input looked like an ELF object but could not be parsed.
    #[error("Failed to parse object file {path}: {message}")]
    Object { path: PathBuf, message: String },
}

/// Convenience result type for container decoding.
pub type CtfResult<T> = Result<T, CtfError>;
