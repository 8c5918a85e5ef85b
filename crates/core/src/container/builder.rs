//! Sequential walk of the type section.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use super::strings::StringTable;
use crate::error::{CtfError, CtfResult};
use crate::format::{Header, RecordHeader, TypeKind, ENUM_RECORD_LEN};
use crate::types::{Encoding, EnumConstant, Member, TypeData, TypeId, TypeNode, VA_ARG_ID};

/// Decode every record between the type offset and the string offset.
///
/// IDs are handed out densely in encounter order, starting at 1 (or past
/// the reserved parent range for child containers). ID 0 is always the
/// variadic sentinel.
pub(crate) fn build_types(
    header: &Header,
    data: &[u8],
    strings: &StringTable<'_>,
) -> CtfResult<BTreeMap<TypeId, TypeNode>> {
    let version = header.version;
    let endian = header.endian;
    let id_width = header.id_width();
    let end = header.string_offset as usize;
    let section = &data[..end.min(data.len())];

    let mut types = BTreeMap::new();
    types.insert(VA_ARG_ID, TypeNode::va_arg());

    let mut id = version.first_type_id(header.has_parent());
    let mut pos = header.type_offset as usize;

    while pos < end {
        let truncated = || CtfError::TruncatedRecord { id, offset: pos };
        let record = RecordHeader::decode(version, endian, section, pos).ok_or_else(truncated)?;
        let kind = record
            .kind()
            .ok_or(CtfError::UnknownKind { kind: record.raw_kind(), id })?;
        let body = pos + record.record_byte_length();

        let (payload, trailer) = match kind {
            TypeKind::Integer | TypeKind::Float => {
                let word = endian.read_u32(section, body).ok_or_else(truncated)?;
                let encoding = Encoding(word);
                let payload = if kind == TypeKind::Integer {
                    TypeData::Integer(encoding)
                } else {
                    TypeData::Float(encoding)
                };
                (payload, 4)
            }
            TypeKind::Pointer => (TypeData::Pointer(record.referenced_type()), 0),
            TypeKind::Typedef => (TypeData::Typedef(record.referenced_type()), 0),
            TypeKind::Volatile => (TypeData::Volatile(record.referenced_type()), 0),
            TypeKind::Const => (TypeData::Const(record.referenced_type()), 0),
            TypeKind::Restrict => (TypeData::Restrict(record.referenced_type()), 0),
            TypeKind::Array => {
                let array = record.decode_array(endian, section, body).ok_or_else(truncated)?;
                let payload = TypeData::Array {
                    contents: array.contents,
                    index: array.index,
                    count: array.count,
                };
                (payload, record.array_len())
            }
            TypeKind::Function => {
                let count = record.vlen() as usize;
                let args = (0..count)
                    .map(|i| endian.read_uint(section, body + i * id_width, id_width))
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(truncated)?;
                let payload = TypeData::Function { ret: record.referenced_type(), args };
                (payload, round_up4(count * id_width))
            }
            TypeKind::Struct | TypeKind::Union => {
                let (len, raw) =
                    record.decode_members(endian, section, body).ok_or_else(truncated)?;
                let members = raw
                    .into_iter()
                    .map(|m| Member {
                        name: strings.resolve(m.name).into_owned(),
                        type_id: m.type_id,
                        offset: m.offset,
                    })
                    .collect();
                let size = record.size();
                let payload = if kind == TypeKind::Struct {
                    TypeData::Struct { size, members }
                } else {
                    TypeData::Union { size, members }
                };
                (payload, len)
            }
            TypeKind::Enum => {
                let count = record.vlen() as usize;
                let mut constants = Vec::with_capacity(count);
                for i in 0..count {
                    let at = body + i * ENUM_RECORD_LEN;
                    let name = endian.read_u32(section, at).ok_or_else(truncated)?;
                    let value = endian.read_u32(section, at + 4).ok_or_else(truncated)?;
                    constants.push(EnumConstant {
                        name: strings.resolve(name).into_owned(),
                        value: value as i32,
                    });
                }
                (TypeData::Enum(constants), count * ENUM_RECORD_LEN)
            }
            TypeKind::Forward => {
                let target = TypeKind::from_raw(record.referenced_type()).filter(|k| {
                    matches!(k, TypeKind::Struct | TypeKind::Union | TypeKind::Enum)
                });
                (TypeData::Forward(target), 0)
            }
            TypeKind::Unknown => (TypeData::Unknown, 0),
            TypeKind::VaArg => {
                return Err(CtfError::UnknownKind { kind: record.raw_kind(), id });
            }
        };

        let name = if kind == TypeKind::Unknown {
            String::new()
        } else {
            strings.resolve(record.name_ref()).into_owned()
        };

        trace!(id, %kind, name = %name, offset = pos, root = record.is_root(), "decoded type");
        types.insert(id, TypeNode::new(id, name, payload));

        pos = body + trailer;
        id += 1;
    }

    debug!(count = types.len() - 1, "decoded type section");
    Ok(types)
}

fn round_up4(n: usize) -> usize {
    (n + 3) & !3
}
