//! Type emission with explicit layout decorations.
//!
//! [`TypeEmitter::emit_type`] lowers an interned [`Type`] under a
//! [`LayoutRule`], computes the offsets and strides the rule implies, and
//! writes the type definition and its decorations the first time the
//! (lowered type, decoration set) pair is seen.

use std::collections::{HashMap, HashSet};

use log::trace;
use rspirv::spirv::{self, Op};

use crate::context::Context;
use crate::emit::{write_decoration, Section, Sections};
use crate::ir::{ConstantValue, Decoration, DecorationId, SpirvType, StructInterface, StructType, Type, TypeId};
use crate::layout::{self, LayoutRule, Majorness};

#[derive(Debug, Default)]
pub struct TypeEmitter {
    cache: HashMap<(TypeId, LayoutRule, Option<Majorness>), spirv::Word>,
    emitted_constants: HashSet<spirv::Word>,
    /// Base struct name -> number of distinct definitions emitted under it.
    struct_names: HashMap<String, u32>,
}

impl TypeEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Result id of `ty` laid out under `rule`, emitting it if needed.
    ///
    /// `majorness` applies to a matrix at the top of `ty` (or inside arrays);
    /// struct fields carry their own.
    pub fn emit_type(
        &mut self,
        ctx: &mut Context,
        out: &mut Sections,
        ty: TypeId,
        rule: LayoutRule,
        majorness: Option<Majorness>,
    ) -> spirv::Word {
        if let Some(&id) = self.cache.get(&(ty, rule, majorness)) {
            return id;
        }

        let mut decorations = Vec::new();
        let lowered = match ctx.ty(ty).clone() {
            Type::Void => SpirvType::Void,
            // Booleans have no defined size; laid-out storage holds them as uint.
            Type::Bool if rule != LayoutRule::Void => SpirvType::Int {
                width: 32,
                signed: false,
            },
            Type::Bool => SpirvType::Bool,
            Type::Int { width, signed } => SpirvType::Int { width, signed },
            Type::Float { width } => SpirvType::Float { width },
            Type::Vector { elem, count } => SpirvType::Vector {
                component: self.emit_type(ctx, out, elem, rule, None),
                count,
            },
            Type::Matrix { column, columns } => SpirvType::Matrix {
                column: self.emit_type(ctx, out, column, rule, None),
                count: columns,
            },
            Type::Array { elem, length } => {
                let elem_id = self.emit_type(ctx, out, elem, rule, majorness);
                let length_id = ctx.constant_u32(length);
                self.emit_constant(ctx, out, length_id);
                if rule != LayoutRule::Void {
                    let stride = layout::alignment_and_size(ctx, ty, rule, majorness).stride;
                    decorations.push(Decoration::new(spirv::Decoration::ArrayStride, vec![stride]));
                }
                SpirvType::Array {
                    elem: elem_id,
                    length: length_id,
                }
            }
            Type::RuntimeArray { elem } => {
                let elem_id = self.emit_type(ctx, out, elem, rule, majorness);
                if rule != LayoutRule::Void {
                    let stride = layout::alignment_and_size(ctx, ty, rule, majorness).stride;
                    decorations.push(Decoration::new(spirv::Decoration::ArrayStride, vec![stride]));
                }
                SpirvType::RuntimeArray { elem: elem_id }
            }
            Type::Pointer { pointee, storage } => SpirvType::Pointer {
                storage,
                pointee: self.emit_type(ctx, out, pointee, rule, majorness),
            },
            Type::Image(image) => SpirvType::Image {
                sampled_type: self.emit_type(ctx, out, image.sampled_type, LayoutRule::Void, None),
                dim: image.dim,
                depth: image.depth,
                arrayed: image.arrayed,
                multisampled: image.multisampled,
                sampled: image.sampled,
                format: image.format,
            },
            Type::Sampler => SpirvType::Sampler,
            Type::SampledImage { image } => SpirvType::SampledImage {
                image: self.emit_type(ctx, out, image, LayoutRule::Void, None),
            },
            Type::Struct(st) => {
                let members = st
                    .fields
                    .iter()
                    .map(|field| self.emit_type(ctx, out, field.ty, rule, field.majorness))
                    .collect();
                decorations.extend(struct_decorations(ctx, &st, rule));
                SpirvType::Struct {
                    name: st.name.clone(),
                    members,
                }
            }
            Type::Function { ret, params } => {
                let ret = self.emit_type(ctx, out, ret, LayoutRule::Void, None);
                let params = params
                    .iter()
                    .map(|&p| self.emit_type(ctx, out, p, LayoutRule::Void, None))
                    .collect();
                let id = self.emit_function_type(ctx, out, ret, params);
                self.cache.insert((ty, rule, majorness), id);
                return id;
            }
        };

        let decoration_ids: Vec<DecorationId> =
            decorations.iter().map(|d| ctx.register_decoration(d.clone())).collect();
        let (id, fresh) = ctx.get_or_create_type_id(lowered.clone(), &decoration_ids);
        if fresh {
            trace!("emitting type {} as %{} under {:?}", ctx.type_name(ty), id, rule);
            self.write_definition(out, id, &lowered);
            if let Type::Struct(st) = ctx.ty(ty) {
                self.write_struct_names(out, id, st);
            }
            for decoration in &decorations {
                write_decoration(out, id, decoration);
            }
        }

        self.cache.insert((ty, rule, majorness), id);
        id
    }

    /// `OpTypeFunction` over already-resolved return and parameter types.
    pub fn emit_function_type(
        &mut self,
        ctx: &mut Context,
        out: &mut Sections,
        ret: spirv::Word,
        params: Vec<spirv::Word>,
    ) -> spirv::Word {
        let lowered = SpirvType::Function { ret, params };
        let (id, fresh) = ctx.get_or_create_type_id(lowered.clone(), &[]);
        if fresh {
            self.write_definition(out, id, &lowered);
        }
        id
    }

    /// Write the definition of a registered constant (and its type) once.
    pub fn emit_constant(&mut self, ctx: &mut Context, out: &mut Sections, id: spirv::Word) {
        if !self.emitted_constants.insert(id) {
            return;
        }
        let constant = ctx
            .constant(id)
            .cloned()
            .unwrap_or_else(|| panic!("BUG: %{} is not a registered constant", id));

        if let ConstantValue::Composite(parts) = &constant.value {
            for &part in parts {
                self.emit_constant(ctx, out, part);
            }
        }

        let ty = self.emit_type(ctx, out, constant.ty, LayoutRule::Void, None);
        match &constant.value {
            ConstantValue::Bool(true) => out.push(Section::TypesConstants, Op::ConstantTrue, &[ty, id]),
            ConstantValue::Bool(false) => out.push(Section::TypesConstants, Op::ConstantFalse, &[ty, id]),
            ConstantValue::Int(bits) | ConstantValue::Float(bits) => {
                let width = match ctx.ty(constant.ty) {
                    Type::Int { width, .. } | Type::Float { width } => *width,
                    other => panic!("BUG: numeric constant of non-numeric type {:?}", other),
                };
                if width > 32 {
                    out.push(
                        Section::TypesConstants,
                        Op::Constant,
                        &[ty, id, *bits as u32, (*bits >> 32) as u32],
                    );
                } else {
                    out.push(Section::TypesConstants, Op::Constant, &[ty, id, *bits as u32]);
                }
            }
            ConstantValue::Composite(parts) => {
                let mut operands = vec![ty, id];
                operands.extend_from_slice(parts);
                out.push(Section::TypesConstants, Op::ConstantComposite, &operands);
            }
            ConstantValue::Null => out.push(Section::TypesConstants, Op::ConstantNull, &[ty, id]),
        }
    }

    fn write_definition(&mut self, out: &mut Sections, id: spirv::Word, ty: &SpirvType) {
        let section = Section::TypesConstants;
        match ty {
            SpirvType::Void => out.push(section, Op::TypeVoid, &[id]),
            SpirvType::Bool => out.push(section, Op::TypeBool, &[id]),
            SpirvType::Int { width, signed } => out.push(section, Op::TypeInt, &[id, *width, *signed as u32]),
            SpirvType::Float { width } => out.push(section, Op::TypeFloat, &[id, *width]),
            SpirvType::Vector { component, count } => out.push(section, Op::TypeVector, &[id, *component, *count]),
            SpirvType::Matrix { column, count } => out.push(section, Op::TypeMatrix, &[id, *column, *count]),
            SpirvType::Array { elem, length } => out.push(section, Op::TypeArray, &[id, *elem, *length]),
            SpirvType::RuntimeArray { elem } => out.push(section, Op::TypeRuntimeArray, &[id, *elem]),
            SpirvType::Pointer { storage, pointee } => {
                out.push(section, Op::TypePointer, &[id, *storage as u32, *pointee])
            }
            SpirvType::Image {
                sampled_type,
                dim,
                depth,
                arrayed,
                multisampled,
                sampled,
                format,
            } => out.push(
                section,
                Op::TypeImage,
                &[
                    id,
                    *sampled_type,
                    *dim as u32,
                    *depth,
                    *arrayed as u32,
                    *multisampled as u32,
                    *sampled,
                    *format as u32,
                ],
            ),
            SpirvType::Sampler => out.push(section, Op::TypeSampler, &[id]),
            SpirvType::SampledImage { image } => out.push(section, Op::TypeSampledImage, &[id, *image]),
            SpirvType::Struct { members, .. } => {
                let mut operands = vec![id];
                operands.extend_from_slice(members);
                out.push(section, Op::TypeStruct, &operands);
            }
            SpirvType::Function { ret, params } => {
                let mut operands = vec![id, *ret];
                operands.extend_from_slice(params);
                out.push(section, Op::TypeFunction, &operands);
            }
        }
    }

    /// Debug names for a freshly emitted struct.
    ///
    /// A struct name already used by a definition with other decorations
    /// gets a numeric suffix so that the two stay distinguishable.
    fn write_struct_names(&mut self, out: &mut Sections, id: spirv::Word, st: &StructType) {
        if !st.name.is_empty() {
            let seen = self.struct_names.entry(st.name.clone()).or_insert(0);
            let name = if *seen == 0 { st.name.clone() } else { format!("{}_{}", st.name, seen) };
            *seen += 1;
            out.push_name(id, &name);
        }
        for (index, field) in st.fields.iter().enumerate() {
            if !field.name.is_empty() {
                out.push_member_name(id, index as u32, &field.name);
            }
        }
    }
}

/// Interface and layout decorations of a struct under `rule`.
fn struct_decorations(ctx: &Context, st: &StructType, rule: LayoutRule) -> Vec<Decoration> {
    let mut decorations = Vec::new();
    match st.interface {
        StructInterface::Internal => {}
        StructInterface::UniformBuffer | StructInterface::StorageBuffer { .. } | StructInterface::PerVertex => {
            decorations.push(Decoration::new(spirv::Decoration::Block, vec![]));
        }
    }

    if rule != LayoutRule::Void {
        let placement = layout::place_struct_fields(ctx, st, rule);
        for (index, field) in st.fields.iter().enumerate() {
            let member = index as u32;
            decorations.push(Decoration::member(
                member,
                spirv::Decoration::Offset,
                vec![placement.offsets[index]],
            ));
            if let Some(matrix) = layout::innermost_matrix(ctx, field.ty) {
                let stride = layout::alignment_and_size(ctx, matrix, rule, field.majorness).stride;
                decorations.push(Decoration::member(member, spirv::Decoration::MatrixStride, vec![stride]));
                let majorness = match field.majorness.unwrap_or(Majorness::ColumnMajor) {
                    Majorness::RowMajor => spirv::Decoration::RowMajor,
                    Majorness::ColumnMajor => spirv::Decoration::ColMajor,
                };
                decorations.push(Decoration::member(member, majorness, vec![]));
            }
        }
    }

    for (index, field) in st.fields.iter().enumerate() {
        if let Some(builtin) = field.builtin {
            decorations.push(Decoration::member(
                index as u32,
                spirv::Decoration::BuiltIn,
                vec![builtin as u32],
            ));
        }
    }

    if let StructInterface::StorageBuffer { read_only: true, .. } = st.interface {
        for index in 0..st.fields.len() {
            decorations.push(Decoration::member(index as u32, spirv::Decoration::NonWritable, vec![]));
        }
    }

    decorations
}
