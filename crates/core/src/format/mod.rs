//! Wire-level description of the CTF container.
//!
//! This module knows the two supported format versions, the byte order the
//! container was written in, and the closed set of record kinds. It does not
//! build any graph; see [`crate::container`] for that.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod header;
pub mod record;

pub use header::{Header, HEADER_LEN, PREAMBLE_LEN};
pub use record::{ArrayDescriptor, MemberRecord, RecordHeader, ENUM_RECORD_LEN};

/// Magic number stored in the first two bytes of every CTF container.
pub const CTF_MAGIC: u16 = 0xcff1;

/// Header flag: everything after the header is zlib-compressed.
pub const F_COMPRESS: u8 = 0x1;

/// Supported container versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Version {
    V2,
    V3,
}

impl Version {
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            2 => Some(Version::V2),
            3 => Some(Version::V3),
            _ => None,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Version::V2 => 2,
            Version::V3 => 3,
        }
    }

    /// Width in bytes of a type ID in the object and function sections and
    /// in function argument lists.
    pub fn id_width(self) -> usize {
        self.layout().id_width
    }

    /// First type ID handed out by the graph builder.
    ///
    /// A child container reserves the low ID space for its parent universe.
    pub fn first_type_id(self, has_parent: bool) -> u32 {
        if has_parent {
            1 + (1u32 << self.layout().parent_shift)
        } else {
            1
        }
    }

    pub(crate) fn layout(self) -> &'static Layout {
        match self {
            Version::V2 => &V2_LAYOUT,
            Version::V3 => &V3_LAYOUT,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.number())
    }
}

/// Field widths and bit packing that distinguish the two versions.
#[derive(Debug)]
pub(crate) struct Layout {
    pub id_width: usize,
    pub kind_shift: u32,
    pub kind_mask: u32,
    pub root_mask: u32,
    pub vlen_mask: u32,
    pub parent_shift: u32,
    /// `size` value announcing the large-size record shape.
    pub lsize_sentinel: u32,
    /// Aggregates at least this many bytes large use long member records.
    pub lstruct_threshold: u64,
    pub short_header_len: usize,
    pub long_header_len: usize,
    pub array_len: usize,
    pub member_len: usize,
    pub lmember_len: usize,
}

impl Layout {
    pub fn kind_of(&self, info: u32) -> u32 {
        (info & self.kind_mask) >> self.kind_shift
    }

    pub fn vlen_of(&self, info: u32) -> u32 {
        info & self.vlen_mask
    }
}

pub(crate) static V2_LAYOUT: Layout = Layout {
    id_width: 2,
    kind_shift: 11,
    kind_mask: 0xf800,
    root_mask: 0x0400,
    vlen_mask: 0x03ff,
    parent_shift: 15,
    lsize_sentinel: 0xffff,
    lstruct_threshold: 8192,
    short_header_len: 8,
    long_header_len: 16,
    array_len: 8,
    member_len: 8,
    lmember_len: 16,
};

pub(crate) static V3_LAYOUT: Layout = Layout {
    id_width: 4,
    kind_shift: 26,
    kind_mask: 0xfc00_0000,
    root_mask: 0x0200_0000,
    vlen_mask: 0x00ff_ffff,
    parent_shift: 31,
    lsize_sentinel: 0xffff_ffff,
    lstruct_threshold: 1 << 29,
    short_header_len: 12,
    long_header_len: 20,
    array_len: 12,
    member_len: 12,
    lmember_len: 16,
};

/// Byte order the container was produced in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    pub fn read_u16(self, bytes: &[u8], at: usize) -> Option<u16> {
        let raw: [u8; 2] = bytes.get(at..at.checked_add(2)?)?.try_into().ok()?;
        Some(match self {
            Endian::Little => u16::from_le_bytes(raw),
            Endian::Big => u16::from_be_bytes(raw),
        })
    }

    pub fn read_u32(self, bytes: &[u8], at: usize) -> Option<u32> {
        let raw: [u8; 4] = bytes.get(at..at.checked_add(4)?)?.try_into().ok()?;
        Some(match self {
            Endian::Little => u32::from_le_bytes(raw),
            Endian::Big => u32::from_be_bytes(raw),
        })
    }

    /// Read an unsigned value that is either 2 or 4 bytes wide.
    pub fn read_uint(self, bytes: &[u8], at: usize, width: usize) -> Option<u32> {
        match width {
            2 => self.read_u16(bytes, at).map(u32::from),
            _ => self.read_u32(bytes, at),
        }
    }
}

/// The closed set of type kinds.
///
/// The first fourteen are wire kinds; [`TypeKind::VaArg`] only ever appears
/// as the reserved ID-0 node and is never decoded from a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Unknown,
    Integer,
    Float,
    Pointer,
    Array,
    Function,
    Struct,
    Union,
    Enum,
    Forward,
    Typedef,
    Volatile,
    Const,
    Restrict,
    VaArg,
}

impl TypeKind {
    pub fn from_raw(raw: u32) -> Option<Self> {
        let kind = match raw {
            0 => TypeKind::Unknown,
            1 => TypeKind::Integer,
            2 => TypeKind::Float,
            3 => TypeKind::Pointer,
            4 => TypeKind::Array,
            5 => TypeKind::Function,
            6 => TypeKind::Struct,
            7 => TypeKind::Union,
            8 => TypeKind::Enum,
            9 => TypeKind::Forward,
            10 => TypeKind::Typedef,
            11 => TypeKind::Volatile,
            12 => TypeKind::Const,
            13 => TypeKind::Restrict,
            _ => return None,
        };
        Some(kind)
    }

    /// Kinds that wrap exactly one other type by reference.
    pub fn is_qualifier(self) -> bool {
        matches!(
            self,
            TypeKind::Pointer
                | TypeKind::Typedef
                | TypeKind::Volatile
                | TypeKind::Const
                | TypeKind::Restrict
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TypeKind::Unknown => "unknown",
            TypeKind::Integer => "integer",
            TypeKind::Float => "float",
            TypeKind::Pointer => "pointer",
            TypeKind::Array => "array",
            TypeKind::Function => "function",
            TypeKind::Struct => "struct",
            TypeKind::Union => "union",
            TypeKind::Enum => "enum",
            TypeKind::Forward => "forward",
            TypeKind::Typedef => "typedef",
            TypeKind::Volatile => "volatile",
            TypeKind::Const => "const",
            TypeKind::Restrict => "restrict",
            TypeKind::VaArg => "va_arg",
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.to_lowercase().as_str() {
            "unknown" => TypeKind::Unknown,
            "integer" | "int" => TypeKind::Integer,
            "float" => TypeKind::Float,
            "pointer" | "ptr" => TypeKind::Pointer,
            "array" => TypeKind::Array,
            "function" | "func" => TypeKind::Function,
            "struct" => TypeKind::Struct,
            "union" => TypeKind::Union,
            "enum" => TypeKind::Enum,
            "forward" => TypeKind::Forward,
            "typedef" => TypeKind::Typedef,
            "volatile" => TypeKind::Volatile,
            "const" => TypeKind::Const,
            "restrict" => TypeKind::Restrict,
            "va_arg" | "vaarg" => TypeKind::VaArg,
            other => return Err(format!("Unknown type kind '{other}'")),
        };
        Ok(kind)
    }
}
