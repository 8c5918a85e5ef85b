//! Name lookup in the string section.

use std::borrow::Cow;

use crate::format::Header;

/// Placeholder for a name whose first byte is the empty string.
pub const ANON_NAME: &str = "(anon)";
/// The reference points into a string table other than the primary one.
pub const EXTERNAL_STRTAB: &str = "<< ??? - name in external strtab >>";
/// The offset is at or past the declared string-table length.
pub const EXCEEDS_STRTAB: &str = "<< ??? - name exceeds strtab len >>";
/// The declared table extends past the end of the data.
pub const TRUNCATED_STRTAB: &str = "<< ??? - file truncated >>";

const STID_SHIFT: u32 = 31;
const OFFSET_MASK: u32 = 0x7fff_ffff;

/// Bounds-checked view of the string section.
#[derive(Debug, Clone, Copy)]
pub struct StringTable<'a> {
    data: &'a [u8],
    offset: usize,
    len: usize,
}

impl<'a> StringTable<'a> {
    pub fn new(header: &Header, data: &'a [u8]) -> Self {
        Self {
            data,
            offset: header.string_offset as usize,
            len: header.string_len as usize,
        }
    }

    /// Resolve a `table id | offset` name reference.
    ///
    /// Never fails; broken references resolve to one of the diagnostic
    /// placeholders so the graph stays usable.
    pub fn resolve(&self, name_ref: u32) -> Cow<'a, str> {
        if name_ref >> STID_SHIFT != 0 {
            return Cow::Borrowed(EXTERNAL_STRTAB);
        }

        let offset = (name_ref & OFFSET_MASK) as usize;
        if offset >= self.len {
            return Cow::Borrowed(EXCEEDS_STRTAB);
        }

        let start = self.offset + offset;
        let Some(bytes) = self.data.get(start..).filter(|b| !b.is_empty()) else {
            return Cow::Borrowed(TRUNCATED_STRTAB);
        };

        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        if end == 0 {
            return Cow::Borrowed(ANON_NAME);
        }

        String::from_utf8_lossy(&bytes[..end])
    }
}
