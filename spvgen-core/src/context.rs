//! Compilation-scoped store of types, constants and decorations.
//!
//! Every value is interned: registering a structurally equal value again
//! returns the handle or result id it received the first time. Nothing is
//! ever removed; the whole store is dropped with the compilation.

use std::collections::HashMap;

use indexmap::IndexMap;
use rspirv::spirv::{self, Dim, ImageFormat, StorageClass};

use crate::ir::{
    Constant, ConstantValue, Decoration, DecorationId, ImageType, SpirvType, StructField, StructInterface,
    StructType, Type, TypeId,
};
use crate::{IdSource, InternArena};

/// Canonical, order-independent key for a set of decorations.
pub type DecorationSet = Vec<DecorationId>;

#[derive(Debug)]
pub struct Context {
    ids: IdSource<spirv::Word>,
    types: InternArena<TypeId, Type>,
    decorations: InternArena<DecorationId, Decoration>,
    /// Lowered type plus its canonical decoration set -> result id.
    type_ids: HashMap<(SpirvType, DecorationSet), spirv::Word>,
    constants: IndexMap<Constant, spirv::Word>,
    constant_index: HashMap<spirv::Word, usize>,
}

impl Context {
    pub fn new() -> Self {
        Context {
            ids: IdSource::starting_at(1),
            types: InternArena::new(),
            decorations: InternArena::new(),
            type_ids: HashMap::new(),
            constants: IndexMap::new(),
            constant_index: HashMap::new(),
        }
    }

    // =========================================================================
    // Result ids
    // =========================================================================

    /// Allocate a fresh result id.
    pub fn take_next_id(&mut self) -> spirv::Word {
        self.ids.next()
    }

    /// One past the largest result id handed out so far.
    pub fn id_bound(&self) -> u32 {
        self.ids.peek()
    }

    // =========================================================================
    // Types
    // =========================================================================

    pub fn intern_type(&mut self, ty: Type) -> TypeId {
        self.types.intern(ty)
    }

    pub fn ty(&self, id: TypeId) -> &Type {
        self.types
            .get(id)
            .unwrap_or_else(|| panic!("BUG: unknown type handle {:?}", id))
    }

    /// Number of distinct type values interned.
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Result id for a lowered type under a set of decorations.
    ///
    /// The decoration set is canonicalized first, so the order in which the
    /// decorations are listed does not matter. The flag is `true` when the id
    /// was allocated by this call and the definition still has to be written.
    pub fn get_or_create_type_id(
        &mut self,
        ty: SpirvType,
        decorations: &[DecorationId],
    ) -> (spirv::Word, bool) {
        let mut key_decorations = decorations.to_vec();
        key_decorations.sort_unstable();
        key_decorations.dedup();
        let key = (ty, key_decorations);
        if let Some(&id) = self.type_ids.get(&key) {
            return (id, false);
        }
        let id = self.ids.next();
        self.type_ids.insert(key, id);
        (id, true)
    }

    // =========================================================================
    // Constants
    // =========================================================================

    pub fn get_or_create_constant(&mut self, constant: Constant) -> spirv::Word {
        if let Some(&id) = self.constants.get(&constant) {
            return id;
        }
        let id = self.ids.next();
        let (index, _) = self.constants.insert_full(constant, id);
        self.constant_index.insert(id, index);
        id
    }

    /// The constant registered under result id `id`.
    pub fn constant(&self, id: spirv::Word) -> Option<&Constant> {
        let index = *self.constant_index.get(&id)?;
        self.constants.get_index(index).map(|(constant, _)| constant)
    }

    /// All constants in registration order.
    pub fn constants(&self) -> impl Iterator<Item = (&Constant, spirv::Word)> {
        self.constants.iter().map(|(c, &id)| (c, id))
    }

    // =========================================================================
    // Decorations
    // =========================================================================

    pub fn register_decoration(&mut self, decoration: Decoration) -> DecorationId {
        self.decorations.intern(decoration)
    }

    pub fn decoration(&self, id: DecorationId) -> &Decoration {
        self.decorations
            .get(id)
            .unwrap_or_else(|| panic!("BUG: unknown decoration handle {:?}", id))
    }

    // =========================================================================
    // Common types
    // =========================================================================

    pub fn void_type(&mut self) -> TypeId {
        self.intern_type(Type::Void)
    }

    pub fn bool_type(&mut self) -> TypeId {
        self.intern_type(Type::Bool)
    }

    pub fn int_type(&mut self) -> TypeId {
        self.intern_type(Type::Int {
            width: 32,
            signed: true,
        })
    }

    pub fn uint_type(&mut self) -> TypeId {
        self.intern_type(Type::Int {
            width: 32,
            signed: false,
        })
    }

    pub fn float_type(&mut self) -> TypeId {
        self.intern_type(Type::Float { width: 32 })
    }

    pub fn vec_type(&mut self, elem: TypeId, count: u32) -> TypeId {
        if count == 1 {
            return elem;
        }
        self.intern_type(Type::Vector { elem, count })
    }

    pub fn float_vec(&mut self, count: u32) -> TypeId {
        let f = self.float_type();
        self.vec_type(f, count)
    }

    /// HLSL-style `floatRxC`: `rows` components per column, `cols` columns.
    pub fn mat_type(&mut self, elem: TypeId, rows: u32, cols: u32) -> TypeId {
        let column = self.vec_type(elem, rows);
        self.intern_type(Type::Matrix { column, columns: cols })
    }

    pub fn array_type(&mut self, elem: TypeId, length: u32) -> TypeId {
        self.intern_type(Type::Array { elem, length })
    }

    pub fn runtime_array_type(&mut self, elem: TypeId) -> TypeId {
        self.intern_type(Type::RuntimeArray { elem })
    }

    pub fn pointer_type(&mut self, pointee: TypeId, storage: StorageClass) -> TypeId {
        self.intern_type(Type::Pointer { pointee, storage })
    }

    pub fn struct_type(
        &mut self,
        name: impl Into<String>,
        fields: Vec<StructField>,
        interface: StructInterface,
    ) -> TypeId {
        self.intern_type(Type::Struct(StructType {
            name: name.into(),
            fields,
            interface,
        }))
    }

    pub fn function_type(&mut self, ret: TypeId, params: Vec<TypeId>) -> TypeId {
        self.intern_type(Type::Function { ret, params })
    }

    /// Sampled `Texture<dim>` of float4 texels.
    pub fn texture_type(&mut self, dim: Dim, arrayed: bool) -> TypeId {
        let sampled_type = self.float_type();
        self.intern_type(Type::Image(ImageType {
            sampled_type,
            dim,
            depth: 0,
            arrayed,
            multisampled: false,
            sampled: 1,
            format: ImageFormat::Unknown,
        }))
    }

    /// Read-write `RWTexture<dim>` of float4 texels.
    pub fn storage_image_type(&mut self, dim: Dim, format: ImageFormat) -> TypeId {
        let sampled_type = self.float_type();
        self.intern_type(Type::Image(ImageType {
            sampled_type,
            dim,
            depth: 0,
            arrayed: false,
            multisampled: false,
            sampled: 2,
            format,
        }))
    }

    pub fn sampler_type(&mut self) -> TypeId {
        self.intern_type(Type::Sampler)
    }

    /// The block type backing a `StructuredBuffer<elem>` family resource.
    pub fn structured_buffer_type(&mut self, elem: TypeId, access: BufferAccess) -> TypeId {
        let data = self.runtime_array_type(elem);
        let name = format!("type.{}.{}", access.hlsl_name(), self.type_name(elem));
        self.struct_type(
            name,
            vec![StructField::new("_data", data)],
            StructInterface::StorageBuffer {
                read_only: access == BufferAccess::ReadOnly,
                has_counter: access.has_counter(),
            },
        )
    }

    /// The block type backing `ByteAddressBuffer` / `RWByteAddressBuffer`.
    pub fn byte_address_buffer_type(&mut self, writable: bool) -> TypeId {
        let uint = self.uint_type();
        let data = self.runtime_array_type(uint);
        let name = if writable { "type.RWByteAddressBuffer" } else { "type.ByteAddressBuffer" };
        self.struct_type(
            name,
            vec![StructField::new("_data", data)],
            StructInterface::StorageBuffer {
                read_only: !writable,
                has_counter: false,
            },
        )
    }

    /// Short HLSL-style spelling of a type, used in generated names.
    pub fn type_name(&self, id: TypeId) -> String {
        match self.ty(id) {
            Type::Void => "void".to_string(),
            Type::Bool => "bool".to_string(),
            Type::Int { width: 32, signed: true } => "int".to_string(),
            Type::Int { width: 32, signed: false } => "uint".to_string(),
            Type::Int { width, signed } => format!("{}int{}", if *signed { "" } else { "u" }, width),
            Type::Float { width: 32 } => "float".to_string(),
            Type::Float { width: 16 } => "half".to_string(),
            Type::Float { width } => format!("float{}_t", width),
            Type::Vector { elem, count } => format!("{}{}", self.type_name(*elem), count),
            Type::Matrix { column, columns } => match self.ty(*column) {
                Type::Vector { elem, count } => format!("{}{}x{}", self.type_name(*elem), count, columns),
                _ => "matrix".to_string(),
            },
            Type::Array { elem, length } => format!("{}[{}]", self.type_name(*elem), length),
            Type::RuntimeArray { elem } => format!("{}[]", self.type_name(*elem)),
            Type::Pointer { pointee, .. } => format!("{}*", self.type_name(*pointee)),
            Type::Image(_) => "image".to_string(),
            Type::Sampler => "sampler".to_string(),
            Type::SampledImage { .. } => "sampled_image".to_string(),
            Type::Struct(st) => st.name.clone(),
            Type::Function { .. } => "function".to_string(),
        }
    }

    // =========================================================================
    // Common constants
    // =========================================================================

    pub fn constant_u32(&mut self, value: u32) -> spirv::Word {
        let ty = self.uint_type();
        self.get_or_create_constant(Constant {
            ty,
            value: ConstantValue::Int(value as u64),
        })
    }

    pub fn constant_i32(&mut self, value: i32) -> spirv::Word {
        let ty = self.int_type();
        self.get_or_create_constant(Constant {
            ty,
            value: ConstantValue::Int(value as u32 as u64),
        })
    }

    pub fn constant_f32(&mut self, value: f32) -> spirv::Word {
        let ty = self.float_type();
        self.get_or_create_constant(Constant {
            ty,
            value: ConstantValue::Float(value.to_bits() as u64),
        })
    }

    pub fn constant_bool(&mut self, value: bool) -> spirv::Word {
        let ty = self.bool_type();
        self.get_or_create_constant(Constant {
            ty,
            value: ConstantValue::Bool(value),
        })
    }

    pub fn constant_null(&mut self, ty: TypeId) -> spirv::Word {
        self.get_or_create_constant(Constant {
            ty,
            value: ConstantValue::Null,
        })
    }

    pub fn constant_composite(&mut self, ty: TypeId, parts: Vec<spirv::Word>) -> spirv::Word {
        self.get_or_create_constant(Constant {
            ty,
            value: ConstantValue::Composite(parts),
        })
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

/// Access flavour of a structured buffer resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferAccess {
    ReadOnly,
    ReadWrite,
    Append,
    Consume,
}

impl BufferAccess {
    pub fn hlsl_name(self) -> &'static str {
        match self {
            BufferAccess::ReadOnly => "StructuredBuffer",
            BufferAccess::ReadWrite => "RWStructuredBuffer",
            BufferAccess::Append => "AppendStructuredBuffer",
            BufferAccess::Consume => "ConsumeStructuredBuffer",
        }
    }

    /// Whether the resource carries a hidden counter buffer.
    pub fn has_counter(self) -> bool {
        !matches!(self, BufferAccess::ReadOnly)
    }
}
