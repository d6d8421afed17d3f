//! Value objects owned by the [`Context`](crate::context::Context): types,
//! constants and decorations.

use rspirv::spirv::{self, BuiltIn, Dim, ImageFormat, StorageClass};

use crate::layout::Majorness;

// =============================================================================
// Handles
// =============================================================================

/// Handle of an interned [`Type`].
///
/// A `TypeId` is not a SPIR-V result id: the same type laid out under two
/// different rules maps to two result ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl From<u32> for TypeId {
    fn from(id: u32) -> Self {
        TypeId(id)
    }
}

/// Handle of a registered [`Decoration`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DecorationId(pub u32);

impl From<u32> for DecorationId {
    fn from(id: u32) -> Self {
        DecorationId(id)
    }
}

// =============================================================================
// Types
// =============================================================================

/// Structural description of a type.
///
/// Children are referenced by [`TypeId`], so two values compare equal exactly
/// when their structure does.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Void,
    Bool,
    Int { width: u32, signed: bool },
    Float { width: u32 },
    Vector { elem: TypeId, count: u32 },
    /// `columns` vectors of type `column`.
    Matrix { column: TypeId, columns: u32 },
    Array { elem: TypeId, length: u32 },
    RuntimeArray { elem: TypeId },
    Pointer { pointee: TypeId, storage: StorageClass },
    Image(ImageType),
    Sampler,
    SampledImage { image: TypeId },
    Struct(StructType),
    Function { ret: TypeId, params: Vec<TypeId> },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageType {
    pub sampled_type: TypeId,
    pub dim: Dim,
    pub depth: u32,
    pub arrayed: bool,
    pub multisampled: bool,
    /// 1 for sampled images, 2 for storage images.
    pub sampled: u32,
    pub format: ImageFormat,
}

/// How a struct is used at the module interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StructInterface {
    #[default]
    Internal,
    /// cbuffer / ConstantBuffer block in Uniform storage.
    UniformBuffer,
    /// Structured, byte-address or counter buffer.
    StorageBuffer { read_only: bool, has_counter: bool },
    /// Built-in per-vertex block (position, clip and cull distances).
    PerVertex,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructType {
    pub name: String,
    pub fields: Vec<StructField>,
    pub interface: StructInterface,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructField {
    pub name: String,
    pub ty: TypeId,
    pub majorness: Option<Majorness>,
    /// Byte offset requested through a `c` register or packoffset.
    pub offset: Option<u32>,
    pub builtin: Option<BuiltIn>,
}

impl StructField {
    pub fn new(name: impl Into<String>, ty: TypeId) -> Self {
        StructField {
            name: name.into(),
            ty,
            majorness: None,
            offset: None,
            builtin: None,
        }
    }

    pub fn with_majorness(mut self, majorness: Majorness) -> Self {
        self.majorness = Some(majorness);
        self
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_builtin(mut self, builtin: BuiltIn) -> Self {
        self.builtin = Some(builtin);
        self
    }
}

/// A type lowered to SPIR-V: children are result ids.
///
/// Together with its decoration set this is the key under which the
/// [`Context`](crate::context::Context) hands out type result ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SpirvType {
    Void,
    Bool,
    Int { width: u32, signed: bool },
    Float { width: u32 },
    Vector { component: spirv::Word, count: u32 },
    Matrix { column: spirv::Word, count: u32 },
    Array { elem: spirv::Word, length: spirv::Word },
    RuntimeArray { elem: spirv::Word },
    Pointer { storage: StorageClass, pointee: spirv::Word },
    Image {
        sampled_type: spirv::Word,
        dim: Dim,
        depth: u32,
        arrayed: bool,
        multisampled: bool,
        sampled: u32,
        format: ImageFormat,
    },
    Sampler,
    SampledImage { image: spirv::Word },
    Struct { name: String, members: Vec<spirv::Word> },
    Function { ret: spirv::Word, params: Vec<spirv::Word> },
}

// =============================================================================
// Constants
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConstantValue {
    Bool(bool),
    /// Raw bits, zero-extended to 64.
    Int(u64),
    /// IEEE bits: `f32::to_bits` widened for 32-bit floats.
    Float(u64),
    Composite(Vec<spirv::Word>),
    Null,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Constant {
    pub ty: TypeId,
    pub value: ConstantValue,
}

// =============================================================================
// Decorations
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decoration {
    pub kind: spirv::Decoration,
    pub params: Vec<u32>,
    /// Member index for `OpMemberDecorate`.
    pub member: Option<u32>,
}

impl Decoration {
    pub fn new(kind: spirv::Decoration, params: Vec<u32>) -> Self {
        Decoration {
            kind,
            params,
            member: None,
        }
    }

    pub fn member(member: u32, kind: spirv::Decoration, params: Vec<u32>) -> Self {
        Decoration {
            kind,
            params,
            member: Some(member),
        }
    }

    pub fn builtin(builtin: BuiltIn) -> Self {
        Decoration::new(spirv::Decoration::BuiltIn, vec![builtin as u32])
    }

    pub fn location(location: u32) -> Self {
        Decoration::new(spirv::Decoration::Location, vec![location])
    }
}
