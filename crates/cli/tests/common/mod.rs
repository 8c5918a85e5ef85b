//! ELF fixtures carrying a small little-endian CTF v2 section.
#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::ZlibEncoder;
use flate2::Compression;
use object::write::{Object, Symbol, SymbolSection};
use object::{
    Architecture, BinaryFormat, Endianness, SectionKind, SymbolFlags, SymbolKind, SymbolScope,
};

/// Type IDs in every fixture: 1 = `int`, 2 = `long`.
pub const INT: u16 = 1;
pub const LONG: u16 = 2;

/// A function as `(name, return type, argument types)`.
pub type Function<'a> = (&'a str, u16, &'a [u16]);
/// A variable as `(name, type)`.
pub type Variable<'a> = (&'a str, u16);

fn ctf_body(functions: &[Function<'_>], variables: &[Variable<'_>]) -> (Vec<u8>, [u32; 6]) {
    let mut body = Vec::new();
    for (_, type_id) in variables {
        body.extend_from_slice(&type_id.to_le_bytes());
    }
    let funcoff = body.len() as u32;
    for (_, ret, args) in functions {
        let info: u16 = (5 << 11) | args.len() as u16;
        body.extend_from_slice(&info.to_le_bytes());
        body.extend_from_slice(&ret.to_le_bytes());
        for arg in *args {
            body.extend_from_slice(&arg.to_le_bytes());
        }
    }
    while body.len() % 4 != 0 {
        body.push(0);
    }

    let typeoff = body.len() as u32;
    // strings: "\0int\0long\0"
    for (name, encoding) in [(1u32, 0x0100_0020u32), (5, 0x0100_0040)] {
        body.extend_from_slice(&name.to_le_bytes());
        body.extend_from_slice(&((1u16 << 11) | 0x400).to_le_bytes());
        body.extend_from_slice(&8u16.to_le_bytes());
        body.extend_from_slice(&encoding.to_le_bytes());
    }

    let stroff = body.len() as u32;
    let strings = b"\0int\0long\0";
    body.extend_from_slice(strings);
    (body, [0, 0, funcoff, typeoff, stroff, strings.len() as u32])
}

fn ctf_header(flags: u8, offsets: [u32; 6]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&0xcff1u16.to_le_bytes());
    out.push(2);
    out.push(flags);
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    for value in offsets {
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

pub fn ctf_blob(functions: &[Function<'_>], variables: &[Variable<'_>], compressed: bool) -> Vec<u8> {
    let (body, offsets) = ctf_body(functions, variables);
    let mut out = ctf_header(u8::from(compressed), offsets);
    if compressed {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&body).unwrap();
        out.extend_from_slice(&encoder.finish().unwrap());
    } else {
        out.extend_from_slice(&body);
    }
    out
}

pub fn elf_bytes(functions: &[Function<'_>], variables: &[Variable<'_>], compressed: bool) -> Vec<u8> {
    let mut obj = Object::new(BinaryFormat::Elf, Architecture::X86_64, Endianness::Little);
    let text_id = obj.add_section(Vec::new(), b".text".to_vec(), SectionKind::Text);
    obj.section_mut(text_id).set_data(vec![0xC3; 16], 16);
    let data_id = obj.add_section(Vec::new(), b".data".to_vec(), SectionKind::Data);
    obj.section_mut(data_id).set_data(vec![0u8; 64], 8);
    let ctf_id = obj.add_section(Vec::new(), b".SUNW_ctf".to_vec(), SectionKind::Other);
    obj.section_mut(ctf_id).set_data(ctf_blob(functions, variables, compressed), 4);

    for (i, (name, _, _)) in functions.iter().enumerate() {
        obj.add_symbol(Symbol {
            name: name.as_bytes().to_vec(),
            value: i as u64,
            size: 1,
            kind: SymbolKind::Text,
            scope: SymbolScope::Linkage,
            weak: false,
            section: SymbolSection::Section(text_id),
            flags: SymbolFlags::None,
        });
    }
    for (i, (name, _)) in variables.iter().enumerate() {
        obj.add_symbol(Symbol {
            name: name.as_bytes().to_vec(),
            value: (i * 8) as u64,
            size: 8,
            kind: SymbolKind::Data,
            scope: SymbolScope::Linkage,
            weak: false,
            section: SymbolSection::Section(data_id),
            flags: SymbolFlags::None,
        });
    }

    obj.write().unwrap()
}

pub fn write_elf(
    dir: &Path,
    file: &str,
    functions: &[Function<'_>],
    variables: &[Variable<'_>],
) -> PathBuf {
    let path = dir.join(file);
    std::fs::write(&path, elf_bytes(functions, variables, false)).unwrap();
    path
}

/// left: `a: int()`, `b: int(int)`, `counter: int`
pub fn write_left(dir: &Path) -> PathBuf {
    write_elf(dir, "left.o", &[("a", INT, &[]), ("b", INT, &[INT])], &[("counter", INT)])
}

/// right: `b: int(int)`, `c: int()`, `counter: long`
pub fn write_right(dir: &Path) -> PathBuf {
    write_elf(dir, "right.o", &[("b", INT, &[INT]), ("c", INT, &[])], &[("counter", LONG)])
}
