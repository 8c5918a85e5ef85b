//! Preamble and header reader.

use tracing::debug;

use super::{Endian, Version, CTF_MAGIC, F_COMPRESS};
use crate::error::{CtfError, CtfResult};

/// Size of `magic (u16) | version (u8) | flags (u8)`.
pub const PREAMBLE_LEN: usize = 4;

/// Size of the full header: the preamble followed by eight `u32` fields.
pub const HEADER_LEN: usize = PREAMBLE_LEN + 8 * 4;

/// Decoded container header.
///
/// Every offset is relative to the first byte after the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub version: Version,
    pub endian: Endian,
    pub flags: u8,
    /// String reference to the label of the parent universe (0 if none).
    pub parent_label: u32,
    /// String reference to the name of the parent universe (0 if none).
    pub parent_name: u32,
    pub label_offset: u32,
    pub object_offset: u32,
    pub function_offset: u32,
    pub type_offset: u32,
    pub string_offset: u32,
    pub string_len: u32,
}

impl Header {
    /// Validate the preamble and decode the header at the start of `bytes`.
    ///
    /// The byte order is taken from whichever reading of the magic matches.
    pub fn parse(bytes: &[u8]) -> CtfResult<Header> {
        if bytes.len() < PREAMBLE_LEN {
            return Err(CtfError::TooShort { len: bytes.len() });
        }

        let endian = detect_endian(bytes)?;
        let raw_version = bytes[2];
        let version =
            Version::from_raw(raw_version).ok_or(CtfError::UnsupportedVersion(raw_version))?;

        if bytes.len() < HEADER_LEN {
            return Err(CtfError::TruncatedHeader { needed: HEADER_LEN, len: bytes.len() });
        }

        let field = |index: usize| {
            endian
                .read_u32(bytes, PREAMBLE_LEN + index * 4)
                .ok_or(CtfError::TruncatedHeader { needed: HEADER_LEN, len: bytes.len() })
        };

        let header = Header {
            version,
            endian,
            flags: bytes[3],
            parent_label: field(0)?,
            parent_name: field(1)?,
            label_offset: field(2)?,
            object_offset: field(3)?,
            function_offset: field(4)?,
            type_offset: field(5)?,
            string_offset: field(6)?,
            string_len: field(7)?,
        };

        debug!(
            version = %header.version,
            endian = ?header.endian,
            compressed = header.is_compressed(),
            objtoff = header.object_offset,
            funcoff = header.function_offset,
            typeoff = header.type_offset,
            stroff = header.string_offset,
            strlen = header.string_len,
            "parsed CTF header"
        );

        Ok(header)
    }

    pub fn is_compressed(&self) -> bool {
        self.flags & F_COMPRESS != 0
    }

    /// Whether this container declares a parent universe.
    pub fn has_parent(&self) -> bool {
        self.parent_name != 0
    }

    pub fn id_width(&self) -> usize {
        self.version.id_width()
    }

    /// Length of the (decompressed) data that follows the header.
    pub fn data_len(&self) -> usize {
        self.string_offset as usize + self.string_len as usize
    }

    /// Check the section offsets against the length of the data that
    /// actually follows the header.
    pub fn validate_sections(&self, data_len: usize) -> CtfResult<()> {
        if self.type_offset & 3 != 0 {
            return Err(CtfError::MisalignedTypeOffset(self.type_offset));
        }

        if self.type_offset as usize >= data_len {
            return Err(CtfError::SectionOutOfBounds {
                section: "type",
                offset: u64::from(self.type_offset),
                len: data_len,
            });
        }

        if self.string_offset as usize >= data_len {
            return Err(CtfError::SectionOutOfBounds {
                section: "string",
                offset: u64::from(self.string_offset),
                len: data_len,
            });
        }

        let string_end = u64::from(self.string_offset) + u64::from(self.string_len);
        if string_end > data_len as u64 {
            return Err(CtfError::SectionOutOfBounds {
                section: "string table end",
                offset: string_end,
                len: data_len,
            });
        }

        if self.type_offset > self.string_offset {
            return Err(CtfError::OffsetOrder("typeoff > stroff"));
        }

        if self.object_offset > self.function_offset {
            return Err(CtfError::OffsetOrder("objtoff > funcoff"));
        }

        if self.function_offset > self.type_offset {
            return Err(CtfError::OffsetOrder("funcoff > typeoff"));
        }

        Ok(())
    }
}

fn detect_endian(bytes: &[u8]) -> CtfResult<Endian> {
    let little = u16::from_le_bytes([bytes[0], bytes[1]]);
    if little == CTF_MAGIC {
        return Ok(Endian::Little);
    }
    if u16::from_be_bytes([bytes[0], bytes[1]]) == CTF_MAGIC {
        return Ok(Endian::Big);
    }
    Err(CtfError::BadMagic { found: little })
}
