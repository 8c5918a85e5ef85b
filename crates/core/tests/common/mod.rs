//! Byte-level builder for synthetic CTF containers.
#![allow(dead_code)]

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

pub const KIND_UNKNOWN: u32 = 0;
pub const KIND_INTEGER: u32 = 1;
pub const KIND_FLOAT: u32 = 2;
pub const KIND_POINTER: u32 = 3;
pub const KIND_ARRAY: u32 = 4;
pub const KIND_FUNCTION: u32 = 5;
pub const KIND_STRUCT: u32 = 6;
pub const KIND_UNION: u32 = 7;
pub const KIND_ENUM: u32 = 8;
pub const KIND_FORWARD: u32 = 9;
pub const KIND_TYPEDEF: u32 = 10;
pub const KIND_VOLATILE: u32 = 11;
pub const KIND_CONST: u32 = 12;
pub const KIND_RESTRICT: u32 = 13;

/// Signed, offset 0, 32 bits.
pub const INT32: u32 = 0x0100_0020;
/// Double-precision float format, 64 bits.
pub const DOUBLE: u32 = 0x0200_0040;

pub struct CtfBuilder {
    version: u8,
    big_endian: bool,
    flags: u8,
    parent_name: u32,
    next_id: u32,
    strings: Vec<u8>,
    types: Vec<u8>,
    objects: Vec<u8>,
    functions: Vec<u8>,
}

impl CtfBuilder {
    pub fn v2() -> Self {
        Self::new(2)
    }

    pub fn v3() -> Self {
        Self::new(3)
    }

    pub fn new(version: u8) -> Self {
        Self {
            version,
            big_endian: false,
            flags: 0,
            parent_name: 0,
            next_id: 1,
            strings: vec![0],
            types: Vec::new(),
            objects: Vec::new(),
            functions: Vec::new(),
        }
    }

    pub fn big_endian(mut self) -> Self {
        self.big_endian = true;
        self
    }

    /// Declare a parent universe; IDs then start past the reserved range.
    pub fn with_parent(mut self, name: &str) -> Self {
        self.parent_name = self.string(name);
        self.next_id = 1 + (1u32 << if self.version == 2 { 15 } else { 31 });
        self
    }

    fn id_width(&self) -> usize {
        if self.version == 2 {
            2
        } else {
            4
        }
    }

    /// Append a NUL-terminated string; an empty name maps to offset 0.
    pub fn string(&mut self, s: &str) -> u32 {
        if s.is_empty() {
            return 0;
        }
        let offset = self.strings.len() as u32;
        self.strings.extend_from_slice(s.as_bytes());
        self.strings.push(0);
        offset
    }

    fn u16_bytes(&self, v: u16) -> [u8; 2] {
        if self.big_endian {
            v.to_be_bytes()
        } else {
            v.to_le_bytes()
        }
    }

    fn u32_bytes(&self, v: u32) -> [u8; 4] {
        if self.big_endian {
            v.to_be_bytes()
        } else {
            v.to_le_bytes()
        }
    }

    fn put_u16(buf: &mut Vec<u8>, bytes: [u8; 2]) {
        buf.extend_from_slice(&bytes);
    }

    fn put_u32(buf: &mut Vec<u8>, bytes: [u8; 4]) {
        buf.extend_from_slice(&bytes);
    }

    fn id_bytes(&self, id: u32) -> Vec<u8> {
        if self.version == 2 {
            self.u16_bytes(id as u16).to_vec()
        } else {
            self.u32_bytes(id).to_vec()
        }
    }

    fn info(&self, kind: u32, vlen: u32) -> u32 {
        if self.version == 2 {
            (kind << 11) | 0x0400 | (vlen & 0x3ff)
        } else {
            (kind << 26) | 0x0200_0000 | (vlen & 0x00ff_ffff)
        }
    }

    /// Write a record header. `size` above the short range switches to the
    /// large-size encoding.
    fn record(&mut self, name: &str, kind: u32, vlen: u32, size_or_type: u64) -> u32 {
        let name_ref = self.string(name);
        let info = self.info(kind, vlen);
        let mut out = Vec::new();
        Self::put_u32(&mut out, self.u32_bytes(name_ref));
        let sentinel: u64 = if self.version == 2 { 0xffff } else { 0xffff_ffff };
        let large = size_or_type >= sentinel;
        let field = if large { sentinel } else { size_or_type };
        if self.version == 2 {
            Self::put_u16(&mut out, self.u16_bytes(info as u16));
            Self::put_u16(&mut out, self.u16_bytes(field as u16));
        } else {
            Self::put_u32(&mut out, self.u32_bytes(info));
            Self::put_u32(&mut out, self.u32_bytes(field as u32));
        }
        if large {
            Self::put_u32(&mut out, self.u32_bytes((size_or_type >> 32) as u32));
            Self::put_u32(&mut out, self.u32_bytes(size_or_type as u32));
        }
        self.types.extend_from_slice(&out);
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn integer(&mut self, name: &str, encoding: u32) -> u32 {
        let id = self.record(name, KIND_INTEGER, 0, 4);
        let bytes = self.u32_bytes(encoding);
        self.types.extend_from_slice(&bytes);
        id
    }

    pub fn float(&mut self, name: &str, encoding: u32) -> u32 {
        let id = self.record(name, KIND_FLOAT, 0, 8);
        let bytes = self.u32_bytes(encoding);
        self.types.extend_from_slice(&bytes);
        id
    }

    pub fn pointer(&mut self, target: u32) -> u32 {
        self.record("", KIND_POINTER, 0, u64::from(target))
    }

    pub fn typedef(&mut self, name: &str, target: u32) -> u32 {
        self.record(name, KIND_TYPEDEF, 0, u64::from(target))
    }

    pub fn volatile(&mut self, target: u32) -> u32 {
        self.record("", KIND_VOLATILE, 0, u64::from(target))
    }

    pub fn constant(&mut self, target: u32) -> u32 {
        self.record("", KIND_CONST, 0, u64::from(target))
    }

    pub fn restrict(&mut self, target: u32) -> u32 {
        self.record("", KIND_RESTRICT, 0, u64::from(target))
    }

    pub fn array(&mut self, contents: u32, index: u32, count: u32) -> u32 {
        let id = self.record("", KIND_ARRAY, 0, 0);
        let mut out = Vec::new();
        if self.version == 2 {
            Self::put_u16(&mut out, self.u16_bytes(contents as u16));
            Self::put_u16(&mut out, self.u16_bytes(index as u16));
        } else {
            Self::put_u32(&mut out, self.u32_bytes(contents));
            Self::put_u32(&mut out, self.u32_bytes(index));
        }
        Self::put_u32(&mut out, self.u32_bytes(count));
        self.types.extend_from_slice(&out);
        id
    }

    pub fn function(&mut self, name: &str, ret: u32, args: &[u32]) -> u32 {
        let id = self.record(name, KIND_FUNCTION, args.len() as u32, u64::from(ret));
        let mut out = Vec::new();
        for arg in args {
            out.extend_from_slice(&self.id_bytes(*arg));
        }
        while out.len() % 4 != 0 {
            out.push(0);
        }
        self.types.extend_from_slice(&out);
        id
    }

    /// Members are `(name, type, bit offset)`.
    pub fn structure(&mut self, name: &str, size: u64, members: &[(&str, u32, u64)]) -> u32 {
        self.aggregate(KIND_STRUCT, name, size, members)
    }

    pub fn union(&mut self, name: &str, size: u64, members: &[(&str, u32, u64)]) -> u32 {
        self.aggregate(KIND_UNION, name, size, members)
    }

    fn aggregate(&mut self, kind: u32, name: &str, size: u64, members: &[(&str, u32, u64)]) -> u32 {
        let id = self.record(name, kind, members.len() as u32, size);
        let threshold: u64 = if self.version == 2 { 8192 } else { 1 << 29 };
        let long = size >= threshold;
        for (member, type_id, offset) in members {
            let name_ref = self.string(member);
            let mut out = Vec::new();
            Self::put_u32(&mut out, self.u32_bytes(name_ref));
            match (self.version == 2, long) {
                (true, false) => {
                    Self::put_u16(&mut out, self.u16_bytes(*type_id as u16));
                    Self::put_u16(&mut out, self.u16_bytes(*offset as u16));
                }
                (true, true) => {
                    Self::put_u16(&mut out, self.u16_bytes(*type_id as u16));
                    Self::put_u16(&mut out, self.u16_bytes(0));
                    Self::put_u32(&mut out, self.u32_bytes((*offset >> 32) as u32));
                    Self::put_u32(&mut out, self.u32_bytes(*offset as u32));
                }
                (false, false) => {
                    Self::put_u32(&mut out, self.u32_bytes(*type_id));
                    Self::put_u32(&mut out, self.u32_bytes(*offset as u32));
                }
                (false, true) => {
                    Self::put_u32(&mut out, self.u32_bytes(*type_id));
                    Self::put_u32(&mut out, self.u32_bytes((*offset >> 32) as u32));
                    Self::put_u32(&mut out, self.u32_bytes(*offset as u32));
                }
            }
            self.types.extend_from_slice(&out);
        }
        id
    }

    pub fn enumeration(&mut self, name: &str, constants: &[(&str, i32)]) -> u32 {
        let id = self.record(name, KIND_ENUM, constants.len() as u32, 4);
        for (constant, value) in constants {
            let name_ref = self.string(constant);
            let mut out = Vec::new();
            Self::put_u32(&mut out, self.u32_bytes(name_ref));
            Self::put_u32(&mut out, self.u32_bytes(*value as u32));
            self.types.extend_from_slice(&out);
        }
        id
    }

    pub fn forward(&mut self, name: &str, target_kind: u32) -> u32 {
        self.record(name, KIND_FORWARD, 0, u64::from(target_kind))
    }

    pub fn unknown(&mut self, name: &str) -> u32 {
        self.record(name, KIND_UNKNOWN, 0, 0)
    }

    /// A record with an arbitrary kind tag and no trailer.
    pub fn raw_kind(&mut self, kind: u32) -> u32 {
        self.record("", kind, 0, 0)
    }

    /// Append one object-section slot.
    pub fn object(&mut self, type_id: u32) -> &mut Self {
        let bytes = self.id_bytes(type_id);
        self.objects.extend_from_slice(&bytes);
        self
    }

    /// Append one function-section entry.
    pub fn function_entry(&mut self, ret: u32, args: &[u32]) -> &mut Self {
        self.function_entry_with_kind(KIND_FUNCTION, ret, args)
    }

    pub fn function_entry_with_kind(&mut self, kind: u32, ret: u32, args: &[u32]) -> &mut Self {
        let info = self.info(kind, args.len() as u32);
        let mut out = self.id_bytes(info);
        out.extend_from_slice(&self.id_bytes(ret));
        for arg in args {
            out.extend_from_slice(&self.id_bytes(*arg));
        }
        self.functions.extend_from_slice(&out);
        self
    }

    /// Append a zero-length padding entry.
    pub fn function_padding(&mut self) -> &mut Self {
        let bytes = self.id_bytes(0);
        self.functions.extend_from_slice(&bytes);
        self
    }

    /// Append a raw entry word without any trailing IDs.
    pub fn function_word(&mut self, word: u32) -> &mut Self {
        let bytes = self.id_bytes(word);
        self.functions.extend_from_slice(&bytes);
        self
    }

    /// Data section following the header, plus the header offsets.
    fn body(&self) -> (Vec<u8>, [u32; 6]) {
        let mut body = Vec::new();
        let objtoff = 0u32;
        body.extend_from_slice(&self.objects);
        let funcoff = body.len() as u32;
        body.extend_from_slice(&self.functions);
        while body.len() % 4 != 0 {
            body.push(0);
        }
        let typeoff = body.len() as u32;
        body.extend_from_slice(&self.types);
        let stroff = body.len() as u32;
        body.extend_from_slice(&self.strings);
        let strlen = self.strings.len() as u32;
        (body, [0, objtoff, funcoff, typeoff, stroff, strlen])
    }

    fn header(&self, flags: u8, offsets: [u32; 6]) -> Vec<u8> {
        let mut out = Vec::new();
        Self::put_u16(&mut out, self.u16_bytes(0xcff1));
        out.push(self.version);
        out.push(flags);
        Self::put_u32(&mut out, self.u32_bytes(0));
        Self::put_u32(&mut out, self.u32_bytes(self.parent_name));
        for value in offsets {
            Self::put_u32(&mut out, self.u32_bytes(value));
        }
        out
    }

    pub fn build(&self) -> Vec<u8> {
        let (body, offsets) = self.body();
        let mut out = self.header(self.flags, offsets);
        out.extend_from_slice(&body);
        out
    }

    pub fn build_compressed(&self) -> Vec<u8> {
        let (body, offsets) = self.body();
        let mut out = self.header(self.flags | 1, offsets);
        out.extend_from_slice(&compress(&body));
        out
    }

    /// Header offsets rewritten after the fact, for corruption tests.
    pub fn build_with_offsets(&self, offsets: [u32; 6]) -> Vec<u8> {
        let (body, _) = self.body();
        let mut out = self.header(self.flags, offsets);
        out.extend_from_slice(&body);
        out
    }

    pub fn offsets(&self) -> [u32; 6] {
        self.body().1
    }
}

pub fn compress(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).expect("compress");
    encoder.finish().expect("finish")
}
