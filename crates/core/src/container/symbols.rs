//! Object (global variable) and function sections.
//!
//! Neither section stores names. Slots are matched positionally against the
//! symbol table: the n-th data slot belongs to the n-th eligible object
//! symbol, the n-th function entry to the n-th eligible function symbol.

use tracing::{debug, warn};

use crate::format::{Header, TypeKind};
use crate::object::{SymbolEntry, SymbolKind, SHN_ABS, SHN_UNDEF};
use crate::types::TypeId;

/// A global variable and its type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableEntry {
    pub name: String,
    pub type_id: TypeId,
    /// Index of the slot in the object section.
    pub slot: u32,
}

/// A function and its signature: return type first, then parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionEntry {
    pub name: String,
    pub type_ids: Vec<TypeId>,
    /// Index of the entry in the function section.
    pub slot: u32,
}

impl FunctionEntry {
    pub fn return_type(&self) -> TypeId {
        self.type_ids[0]
    }

    pub fn params(&self) -> &[TypeId] {
        &self.type_ids[1..]
    }
}

/// Synthetic boundary symbols some linkers emit.
const BOUNDARY_SYMBOLS: [&str; 2] = ["_START_", "_END_"];

fn is_ignored(sym: &SymbolEntry) -> bool {
    if sym.section_index == SHN_UNDEF || sym.name_offset == 0 {
        return true;
    }
    if BOUNDARY_SYMBOLS.contains(&sym.name.as_str()) {
        return true;
    }
    sym.kind == SymbolKind::Object && sym.section_index == SHN_ABS && sym.value == 0
}

/// Forward-only scan over the symbol table for one symbol kind.
struct SymbolCursor<'a> {
    symbols: &'a [SymbolEntry],
    next: usize,
    kind: SymbolKind,
}

impl<'a> SymbolCursor<'a> {
    fn new(symbols: &'a [SymbolEntry], kind: SymbolKind) -> Self {
        Self { symbols, next: 0, kind }
    }

    /// Name of the next eligible symbol, or `""` once the table is exhausted.
    fn next_name(&mut self) -> &'a str {
        while let Some(sym) = self.symbols.get(self.next) {
            self.next += 1;
            if sym.kind == self.kind && !is_ignored(sym) {
                return &sym.name;
            }
        }
        ""
    }
}

pub(crate) fn parse_objects(
    header: &Header,
    data: &[u8],
    symbols: &[SymbolEntry],
) -> Vec<VariableEntry> {
    let width = header.id_width();
    let start = header.object_offset as usize;
    let end = header.function_offset as usize;
    let slots = end.saturating_sub(start) / width;
    let mut cursor = SymbolCursor::new(symbols, SymbolKind::Object);

    let mut variables = Vec::new();
    for slot in 0..slots {
        let name = cursor.next_name();
        let Some(type_id) = header.endian.read_uint(data, start + slot * width, width) else {
            break;
        };
        if !name.is_empty() {
            variables.push(VariableEntry { name: name.to_string(), type_id, slot: slot as u32 });
        }
    }

    debug!(slots, matched = variables.len(), "parsed object section");
    variables
}

pub(crate) fn parse_functions(
    header: &Header,
    data: &[u8],
    symbols: &[SymbolEntry],
) -> Vec<FunctionEntry> {
    let layout = header.version.layout();
    let width = header.id_width();
    let end = header.type_offset as usize;
    let section = &data[..end.min(data.len())];
    let mut cursor = SymbolCursor::new(symbols, SymbolKind::Function);

    let mut functions = Vec::new();
    let mut pos = header.function_offset as usize;
    let mut slot = 0u32;

    while pos < end {
        let Some(info) = header.endian.read_uint(section, pos, width) else {
            break;
        };
        pos += width;

        let kind = layout.kind_of(info);
        let count = layout.vlen_of(info) as usize;

        if kind == 0 && count == 0 {
            slot += 1;
            continue;
        }

        let name = cursor.next_name();

        if TypeKind::from_raw(kind) != Some(TypeKind::Function) {
            warn!(name, slot, kind, "incorrect type for function");
        }

        let span = (count + 1) * width;
        if pos + span > end {
            warn!(name, slot, "function out of bound, skipping remaining function entries");
            break;
        }

        if !name.is_empty() {
            let type_ids = (0..=count)
                .filter_map(|i| header.endian.read_uint(section, pos + i * width, width))
                .collect();
            functions.push(FunctionEntry { name: name.to_string(), type_ids, slot });
        }

        pos += span;
        slot += 1;
    }

    debug!(entries = slot, matched = functions.len(), "parsed function section");
    functions
}
