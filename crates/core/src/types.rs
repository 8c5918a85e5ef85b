//! Decoded type nodes.
//!
//! Nodes are stored in a [`Container`] keyed by [`TypeId`]. A node never
//! holds a reference to its container; child references are plain IDs that
//! only mean something within the owning container. [`TypeRef`] pairs a
//! node with its container for the duration of a borrow, which is how the
//! equality engine crosses from one ID space into the other safely.

use std::fmt;

use crate::container::Container;
pub use crate::format::TypeKind;

/// Dense, container-local type identifier.
pub type TypeId = u32;

/// ID of the reserved variadic sentinel node.
pub const VA_ARG_ID: TypeId = 0;

/// Integer encoding flags.
pub const INT_SIGNED: u32 = 0x01;
pub const INT_CHAR: u32 = 0x02;
pub const INT_BOOL: u32 = 0x04;
pub const INT_VARARGS: u32 = 0x08;

/// Encoding word of an integer or float type.
///
/// Packed as `format:8 | bit offset:8 | bit width:16`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Encoding(pub u32);

impl Encoding {
    /// Format flags (`INT_*` for integers, a float format code for floats).
    pub fn format(self) -> u32 {
        (self.0 & 0xff00_0000) >> 24
    }

    pub fn offset(self) -> u32 {
        (self.0 & 0x00ff_0000) >> 16
    }

    pub fn bits(self) -> u32 {
        self.0 & 0x0000_ffff
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

/// A struct or union member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    pub type_id: TypeId,
    /// Offset in bits from the start of the aggregate.
    pub offset: u64,
}

/// A named enum constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumConstant {
    pub name: String,
    pub value: i32,
}

/// Kind-specific payload of a node. The variant is the kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeData {
    /// The ID-0 sentinel standing for a trailing `...`.
    VaArg,
    Unknown,
    Integer(Encoding),
    Float(Encoding),
    Pointer(TypeId),
    Typedef(TypeId),
    Volatile(TypeId),
    Const(TypeId),
    Restrict(TypeId),
    Array { contents: TypeId, index: TypeId, count: u32 },
    Function { ret: TypeId, args: Vec<TypeId> },
    Struct { size: u64, members: Vec<Member> },
    Union { size: u64, members: Vec<Member> },
    Enum(Vec<EnumConstant>),
    /// Forward declaration; carries the kind it forwards to when known.
    Forward(Option<TypeKind>),
}

impl TypeData {
    pub fn kind(&self) -> TypeKind {
        match self {
            TypeData::VaArg => TypeKind::VaArg,
            TypeData::Unknown => TypeKind::Unknown,
            TypeData::Integer(_) => TypeKind::Integer,
            TypeData::Float(_) => TypeKind::Float,
            TypeData::Pointer(_) => TypeKind::Pointer,
            TypeData::Typedef(_) => TypeKind::Typedef,
            TypeData::Volatile(_) => TypeKind::Volatile,
            TypeData::Const(_) => TypeKind::Const,
            TypeData::Restrict(_) => TypeKind::Restrict,
            TypeData::Array { .. } => TypeKind::Array,
            TypeData::Function { .. } => TypeKind::Function,
            TypeData::Struct { .. } => TypeKind::Struct,
            TypeData::Union { .. } => TypeKind::Union,
            TypeData::Enum(_) => TypeKind::Enum,
            TypeData::Forward(_) => TypeKind::Forward,
        }
    }

    /// The single referenced type of a qualifier kind.
    pub fn qualified(&self) -> Option<TypeId> {
        match self {
            TypeData::Pointer(id)
            | TypeData::Typedef(id)
            | TypeData::Volatile(id)
            | TypeData::Const(id)
            | TypeData::Restrict(id) => Some(*id),
            _ => None,
        }
    }
}

/// One decoded type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeNode {
    pub id: TypeId,
    pub name: String,
    pub data: TypeData,
}

impl TypeNode {
    pub fn new(id: TypeId, name: impl Into<String>, data: TypeData) -> Self {
        Self { id, name: name.into(), data }
    }

    pub(crate) fn va_arg() -> Self {
        Self::new(VA_ARG_ID, "va_arg", TypeData::VaArg)
    }

    pub fn kind(&self) -> TypeKind {
        self.data.kind()
    }
}

/// A node together with the container whose ID space its children index.
#[derive(Clone, Copy)]
pub struct TypeRef<'a> {
    container: &'a Container,
    node: &'a TypeNode,
}

impl<'a> TypeRef<'a> {
    pub(crate) fn new(container: &'a Container, node: &'a TypeNode) -> Self {
        Self { container, node }
    }

    pub fn container(&self) -> &'a Container {
        self.container
    }

    pub fn node(&self) -> &'a TypeNode {
        self.node
    }

    pub fn id(&self) -> TypeId {
        self.node.id
    }

    pub fn name(&self) -> &'a str {
        &self.node.name
    }

    pub fn kind(&self) -> TypeKind {
        self.node.kind()
    }

    pub fn data(&self) -> &'a TypeData {
        &self.node.data
    }

    /// Resolve a child ID in this node's own container.
    pub fn child(&self, id: TypeId) -> Option<TypeRef<'a>> {
        self.container.node(id)
    }

    /// Whether two refs point into the very same container.
    pub fn same_container(&self, other: &TypeRef<'_>) -> bool {
        std::ptr::eq(self.container, other.container)
    }
}

impl fmt::Debug for TypeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRef")
            .field("id", &self.node.id)
            .field("kind", &self.node.kind())
            .field("name", &self.node.name)
            .finish()
    }
}
