//! One decoded type universe.
//!
//! A [`Container`] is built once from the CTF bytes of one input file and
//! is immutable afterwards. It owns every [`TypeNode`] in its ID space plus
//! the name-sorted variable and function lists used by the diff engine.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::decompress;
use crate::error::CtfResult;
use crate::format::{Header, Version, HEADER_LEN};
use crate::object::{ElfSectionProvider, ObjectSections, SectionProvider, SymbolEntry};
use crate::types::{TypeId, TypeNode, TypeRef};

mod builder;
mod strings;
mod symbols;

pub use strings::{StringTable, ANON_NAME, EXCEEDS_STRTAB, EXTERNAL_STRTAB, TRUNCATED_STRTAB};
pub use symbols::{FunctionEntry, VariableEntry};

#[derive(Debug)]
pub struct Container {
    header: Header,
    /// Everything after the header, decompressed.
    data: Vec<u8>,
    types: BTreeMap<TypeId, TypeNode>,
    variables: Vec<VariableEntry>,
    functions: Vec<FunctionEntry>,
}

impl Container {
    /// Locate the CTF section of an object file and decode it.
    pub fn open(path: impl AsRef<Path>) -> CtfResult<Self> {
        Self::open_with(&ElfSectionProvider, path)
    }

    /// Like [`Container::open`] with an explicit section provider.
    pub fn open_with(provider: &dyn SectionProvider, path: impl AsRef<Path>) -> CtfResult<Self> {
        let sections = provider.locate_sections(path.as_ref())?;
        Self::from_sections(&sections)
    }

    /// Decode a bare CTF blob that has no symbol table.
    ///
    /// Types are decoded, but with nothing to correlate against the
    /// variable and function lists stay empty.
    pub fn from_bytes(ctf: &[u8]) -> CtfResult<Self> {
        Self::build(ctf, &[])
    }

    pub fn from_sections(sections: &ObjectSections) -> CtfResult<Self> {
        Self::build(&sections.ctf, &sections.symbols)
    }

    fn build(ctf: &[u8], symtab: &[SymbolEntry]) -> CtfResult<Self> {
        let header = Header::parse(ctf)?;
        let body = &ctf[HEADER_LEN..];

        let data = if header.is_compressed() {
            decompress::inflate(body, header.data_len())?
        } else {
            body.to_vec()
        };

        header.validate_sections(data.len())?;

        let strings = StringTable::new(&header, &data);
        let types = builder::build_types(&header, &data, &strings)?;

        let mut variables = symbols::parse_objects(&header, &data, symtab);
        let mut functions = symbols::parse_functions(&header, &data, symtab);
        variables.sort_by(|a, b| a.name.cmp(&b.name));
        functions.sort_by(|a, b| a.name.cmp(&b.name));

        debug!(
            types = types.len(),
            variables = variables.len(),
            functions = functions.len(),
            "built CTF container"
        );

        Ok(Self { header, data, types, variables, functions })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn version(&self) -> Version {
        self.header.version
    }

    pub fn id_width(&self) -> usize {
        self.header.id_width()
    }

    /// Number of nodes, including the variadic sentinel.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn get(&self, id: TypeId) -> Option<&TypeNode> {
        self.types.get(&id)
    }

    /// Resolve an ID to a node bound to this container.
    pub fn node(&self, id: TypeId) -> Option<TypeRef<'_>> {
        self.types.get(&id).map(|node| TypeRef::new(self, node))
    }

    /// All nodes in ID order.
    pub fn types(&self) -> impl Iterator<Item = TypeRef<'_>> {
        self.types.values().map(move |node| TypeRef::new(self, node))
    }

    /// Global variables, sorted by name.
    pub fn variables(&self) -> &[VariableEntry] {
        &self.variables
    }

    /// Functions, sorted by name.
    pub fn functions(&self) -> &[FunctionEntry] {
        &self.functions
    }

    pub fn strings(&self) -> StringTable<'_> {
        StringTable::new(&self.header, &self.data)
    }

    pub fn resolve_name(&self, name_ref: u32) -> String {
        self.strings().resolve(name_ref).into_owned()
    }

    /// Name of the parent universe, if this container declares one.
    pub fn parent_name(&self) -> Option<String> {
        self.header.has_parent().then(|| self.resolve_name(self.header.parent_name))
    }
}
