//! Versioned type-record decoder.
//!
//! A record is a fixed header (name reference, packed kind/vlen word and a
//! size-or-type field, optionally followed by a 64-bit large size) and a
//! kind-specific trailer. Both versions expose the same operations here;
//! only field widths, the kind/vlen packing and the thresholds differ.

use super::{Endian, TypeKind, Version};

/// Size of one enum constant record (`name: u32, value: i32`), both versions.
pub const ENUM_RECORD_LEN: usize = 8;

/// Fixed part of a type record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    version: Version,
    name: u32,
    info: u32,
    size_or_type: u32,
    large_size: Option<u64>,
}

/// Trailer of an array record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayDescriptor {
    pub contents: u32,
    pub index: u32,
    pub count: u32,
}

/// One struct/union member as stored on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberRecord {
    pub name: u32,
    pub type_id: u32,
    /// Offset of the member in bits.
    pub offset: u64,
}

impl RecordHeader {
    /// Decode the record header starting at `at`, or `None` if it does not fit.
    pub fn decode(version: Version, endian: Endian, bytes: &[u8], at: usize) -> Option<Self> {
        let layout = version.layout();
        let name = endian.read_u32(bytes, at)?;
        let (info, size_or_type) = match version {
            Version::V2 => (
                u32::from(endian.read_u16(bytes, at + 4)?),
                u32::from(endian.read_u16(bytes, at + 6)?),
            ),
            Version::V3 => (endian.read_u32(bytes, at + 4)?, endian.read_u32(bytes, at + 8)?),
        };

        let large_size = if size_or_type == layout.lsize_sentinel {
            let tail = at + layout.short_header_len;
            let hi = endian.read_u32(bytes, tail)?;
            let lo = endian.read_u32(bytes, tail + 4)?;
            Some(u64::from(hi) << 32 | u64::from(lo))
        } else {
            None
        };

        Some(Self { version, name, info, size_or_type, large_size })
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Raw kind tag, which may be outside the known range.
    pub fn raw_kind(&self) -> u32 {
        self.version.layout().kind_of(self.info)
    }

    pub fn kind(&self) -> Option<TypeKind> {
        TypeKind::from_raw(self.raw_kind())
    }

    pub fn is_root(&self) -> bool {
        self.info & self.version.layout().root_mask != 0
    }

    /// Element count for variable-length kinds.
    pub fn vlen(&self) -> u32 {
        self.version.layout().vlen_of(self.info)
    }

    pub fn name_ref(&self) -> u32 {
        self.name
    }

    /// The referenced type for qualifier-like kinds and functions.
    pub fn referenced_type(&self) -> u32 {
        self.size_or_type
    }

    /// Declared byte size for sized kinds, honouring the large-size encoding.
    pub fn size(&self) -> u64 {
        self.large_size.unwrap_or(u64::from(self.size_or_type))
    }

    pub fn is_large(&self) -> bool {
        self.large_size.is_some()
    }

    /// Length of the header alone.
    pub fn record_byte_length(&self) -> usize {
        let layout = self.version.layout();
        if self.is_large() {
            layout.long_header_len
        } else {
            layout.short_header_len
        }
    }

    /// Length of an array trailer for this version.
    pub fn array_len(&self) -> usize {
        self.version.layout().array_len
    }

    pub fn decode_array(&self, endian: Endian, bytes: &[u8], at: usize) -> Option<ArrayDescriptor> {
        match self.version {
            Version::V2 => Some(ArrayDescriptor {
                contents: u32::from(endian.read_u16(bytes, at)?),
                index: u32::from(endian.read_u16(bytes, at + 2)?),
                count: endian.read_u32(bytes, at + 4)?,
            }),
            Version::V3 => Some(ArrayDescriptor {
                contents: endian.read_u32(bytes, at)?,
                index: endian.read_u32(bytes, at + 4)?,
                count: endian.read_u32(bytes, at + 8)?,
            }),
        }
    }

    /// Whether members of this aggregate use the long record shape.
    pub fn uses_long_members(&self) -> bool {
        self.size() >= self.version.layout().lstruct_threshold
    }

    /// Decode `vlen()` member records starting at `at`.
    ///
    /// Returns the number of trailer bytes consumed and the members in
    /// declaration order.
    pub fn decode_members(
        &self,
        endian: Endian,
        bytes: &[u8],
        at: usize,
    ) -> Option<(usize, Vec<MemberRecord>)> {
        let layout = self.version.layout();
        let long = self.uses_long_members();
        let stride = if long { layout.lmember_len } else { layout.member_len };
        let count = self.vlen() as usize;

        let mut members = Vec::with_capacity(count.min(bytes.len() / stride.max(1)));
        for i in 0..count {
            let base = at + i * stride;
            let name = endian.read_u32(bytes, base)?;
            let member = match (self.version, long) {
                (Version::V2, false) => MemberRecord {
                    name,
                    type_id: u32::from(endian.read_u16(bytes, base + 4)?),
                    offset: u64::from(endian.read_u16(bytes, base + 6)?),
                },
                (Version::V2, true) => MemberRecord {
                    name,
                    type_id: u32::from(endian.read_u16(bytes, base + 4)?),
                    offset: join_offset(
                        endian.read_u32(bytes, base + 8)?,
                        endian.read_u32(bytes, base + 12)?,
                    ),
                },
                (Version::V3, false) => MemberRecord {
                    name,
                    type_id: endian.read_u32(bytes, base + 4)?,
                    offset: u64::from(endian.read_u32(bytes, base + 8)?),
                },
                (Version::V3, true) => MemberRecord {
                    name,
                    type_id: endian.read_u32(bytes, base + 4)?,
                    offset: join_offset(
                        endian.read_u32(bytes, base + 8)?,
                        endian.read_u32(bytes, base + 12)?,
                    ),
                },
            };
            members.push(member);
        }

        Some((count * stride, members))
    }
}

fn join_offset(hi: u32, lo: u32) -> u64 {
    u64::from(hi) << 32 | u64::from(lo)
}
