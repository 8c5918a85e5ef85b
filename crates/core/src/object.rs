//! Object-file section provider.
//!
//! Extracts the raw CTF bytes and the symbol table from an input file. ELF
//! objects are parsed with `goblin`; anything that is not ELF (or an ELF
//! without a CTF section) is handed back whole as a raw CTF blob with an
//! empty symbol table, so a standalone CTF dump can be compared too.

use std::fs;
use std::path::Path;

use goblin::elf::section_header::{SHT_DYNSYM, SHT_NOBITS};
use goblin::elf::sym::{STT_FUNC, STT_OBJECT};
use goblin::elf::Elf;
use serde::Serialize;
use tracing::debug;

use crate::error::{CtfError, CtfResult};

/// Name of the section carrying CTF data.
pub const CTF_SECTION: &str = ".SUNW_ctf";

/// Section index of undefined symbols.
pub const SHN_UNDEF: usize = goblin::elf::section_header::SHN_UNDEF as usize;
/// Section index of absolute symbols.
pub const SHN_ABS: usize = goblin::elf::section_header::SHN_ABS as usize;

const ELF_MAGIC: &[u8; 4] = b"\x7fELF";

/// Symbol classes the CTF sections are correlated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Object,
    Function,
    Other,
}

/// One symbol-table entry, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntry {
    pub name: String,
    pub kind: SymbolKind,
    pub section_index: usize,
    pub value: u64,
    pub name_offset: usize,
}

impl SymbolEntry {
    pub fn new(name: impl Into<String>, kind: SymbolKind, section_index: usize, value: u64) -> Self {
        let name = name.into();
        // Any non-zero offset marks the symbol as named.
        let name_offset = usize::from(!name.is_empty());
        Self { name, kind, section_index, value, name_offset }
    }
}

/// CTF bytes plus the symbol table they are correlated with.
#[derive(Debug, Clone, Default)]
pub struct ObjectSections {
    pub ctf: Vec<u8>,
    pub symbols: Vec<SymbolEntry>,
}

impl ObjectSections {
    /// A raw CTF blob with no symbols.
    pub fn from_raw(ctf: Vec<u8>) -> Self {
        Self { ctf, symbols: Vec::new() }
    }

    pub fn with_symbols(mut self, symbols: Vec<SymbolEntry>) -> Self {
        self.symbols = symbols;
        self
    }
}

/// Source of CTF sections for a path.
pub trait SectionProvider {
    fn locate_sections(&self, path: &Path) -> CtfResult<ObjectSections>;
    fn name(&self) -> &'static str;
}

/// Reads ELF objects from disk.
pub struct ElfSectionProvider;

impl SectionProvider for ElfSectionProvider {
    fn locate_sections(&self, path: &Path) -> CtfResult<ObjectSections> {
        let bytes = fs::read(path)
            .map_err(|source| CtfError::Io { path: path.to_path_buf(), source })?;
        sections_from_bytes(path, bytes)
    }

    fn name(&self) -> &'static str {
        "elf"
    }
}

/// Split an in-memory file into CTF bytes and symbols.
pub fn sections_from_bytes(path: &Path, bytes: Vec<u8>) -> CtfResult<ObjectSections> {
    if !bytes.starts_with(ELF_MAGIC) {
        debug!(path = %path.display(), "not an ELF object, treating as raw CTF");
        return Ok(ObjectSections::from_raw(bytes));
    }

    let elf = Elf::parse(&bytes)
        .map_err(|e| CtfError::Object { path: path.to_path_buf(), message: e.to_string() })?;

    let Some((ctf_index, ctf_header)) = elf
        .section_headers
        .iter()
        .enumerate()
        .find(|(_, sh)| elf.shdr_strtab.get_at(sh.sh_name) == Some(CTF_SECTION))
    else {
        debug!(path = %path.display(), "no {CTF_SECTION} section, treating as raw CTF");
        return Ok(ObjectSections::from_raw(bytes));
    };

    let ctf = if ctf_header.sh_type == SHT_NOBITS {
        Vec::new()
    } else {
        let start = ctf_header.sh_offset as usize;
        let end = start.saturating_add(ctf_header.sh_size as usize);
        bytes
            .get(start..end)
            .ok_or_else(|| CtfError::Object {
                path: path.to_path_buf(),
                message: format!("{CTF_SECTION} section (index {ctf_index}) exceeds file size"),
            })?
            .to_vec()
    };

    // The CTF section links to the symbol table it was generated against.
    let linked = match ctf_header.sh_link as usize {
        0 => None,
        index => elf.section_headers.get(index),
    };
    let use_dynamic = linked.map(|sh| sh.sh_type == SHT_DYNSYM).unwrap_or(false);
    let symbols = if use_dynamic {
        collect_symbols(&elf.dynsyms, &elf.dynstrtab)
    } else {
        collect_symbols(&elf.syms, &elf.strtab)
    };

    debug!(
        path = %path.display(),
        ctf_len = ctf.len(),
        symbols = symbols.len(),
        dynamic = use_dynamic,
        "located CTF sections"
    );

    Ok(ObjectSections { ctf, symbols })
}

fn collect_symbols(
    symtab: &goblin::elf::sym::Symtab<'_>,
    strtab: &goblin::strtab::Strtab<'_>,
) -> Vec<SymbolEntry> {
    symtab
        .iter()
        .map(|sym| {
            let kind = match sym.st_type() {
                STT_OBJECT => SymbolKind::Object,
                STT_FUNC => SymbolKind::Function,
                _ => SymbolKind::Other,
            };
            let name =
                if sym.st_name == 0 { "" } else { strtab.get_at(sym.st_name).unwrap_or("") };
            SymbolEntry {
                name: name.to_string(),
                kind,
                section_index: sym.st_shndx,
                value: sym.st_value,
                name_offset: sym.st_name,
            }
        })
        .collect()
}
