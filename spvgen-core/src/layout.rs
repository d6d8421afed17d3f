//! Type size and alignment helpers for buffer layout calculations.
//!
//! Three layout rules are supported besides [`LayoutRule::Void`]:
//!
//! - [`LayoutRule::Std430`]: tight packing for read/write structured storage.
//! - [`LayoutRule::RelaxedStd140`]: padded packing for uniform-style buffers,
//!   with the relaxed vector placement rule.
//! - [`LayoutRule::FxcCTBuffer`]: legacy register-granular packing for
//!   backward-compatible constant buffers.

use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::ir::{StructType, Type, TypeId};

/// Alignment of a 4-component 32-bit vector, the register size of the
/// padded and legacy rules.
pub const VEC4_ALIGNMENT: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutRule {
    /// No explicit layout (function-local and stage I/O types).
    #[default]
    Void,
    Std430,
    RelaxedStd140,
    #[serde(rename = "fxc_ctbuffer")]
    FxcCTBuffer,
}

impl LayoutRule {
    fn pads_to_vec4(self) -> bool {
        matches!(self, LayoutRule::RelaxedStd140 | LayoutRule::FxcCTBuffer)
    }

    fn uses_relaxed_vectors(self) -> bool {
        matches!(self, LayoutRule::RelaxedStd140 | LayoutRule::FxcCTBuffer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Majorness {
    RowMajor,
    ColumnMajor,
}

/// Computed placement information for one type under one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignmentSize {
    pub alignment: u32,
    pub size: u32,
    /// Array stride for arrays, matrix stride for matrices, zero otherwise.
    pub stride: u32,
}

pub fn round_up(value: u32, alignment: u32) -> u32 {
    if alignment == 0 {
        return value;
    }
    value.div_ceil(alignment) * alignment
}

/// A vector placed at `offset` straddles a 16-byte register improperly.
fn improper_straddle(size: u32, offset: u32) -> bool {
    if size <= VEC4_ALIGNMENT {
        offset / VEC4_ALIGNMENT != (offset + size - 1) / VEC4_ALIGNMENT
    } else {
        offset % VEC4_ALIGNMENT != 0
    }
}

/// Alignment, size and stride of `ty` under `rule`.
///
/// `majorness` selects how a matrix is split into vectors; `None` means
/// column-major.
pub fn alignment_and_size(
    ctx: &Context,
    ty: TypeId,
    rule: LayoutRule,
    majorness: Option<Majorness>,
) -> AlignmentSize {
    match ctx.ty(ty) {
        Type::Void => AlignmentSize {
            alignment: 1,
            size: 0,
            stride: 0,
        },
        // Booleans are stored as 32-bit integers in laid-out memory.
        Type::Bool => scalar(4, rule),
        Type::Int { width, .. } | Type::Float { width } => scalar(width / 8, rule),
        Type::Vector { elem, count } => {
            let elem = alignment_and_size(ctx, *elem, rule, None);
            let alignment = if rule == LayoutRule::FxcCTBuffer {
                elem.alignment
            } else {
                let slots = if *count == 3 { 4 } else { *count };
                slots * elem.size
            };
            AlignmentSize {
                alignment,
                size: count * elem.size,
                stride: 0,
            }
        }
        Type::Matrix { column, columns } => {
            let (scalar_ty, rows) = match ctx.ty(*column) {
                Type::Vector { elem, count } => (*elem, *count),
                other => panic!("BUG: matrix column is not a vector: {:?}", other),
            };
            let elem = alignment_and_size(ctx, scalar_ty, rule, None);
            let row_major = majorness == Some(Majorness::RowMajor);
            let (vec_len, vec_count) = if row_major { (*columns, rows) } else { (rows, *columns) };
            let slots = if vec_len == 3 { 4 } else { vec_len };
            let mut alignment = elem.alignment * slots;
            if rule.pads_to_vec4() {
                alignment = round_up(alignment, VEC4_ALIGNMENT);
            }
            AlignmentSize {
                alignment,
                size: vec_count * alignment,
                stride: alignment,
            }
        }
        Type::Array { elem, length } => {
            let inner = alignment_and_size(ctx, *elem, rule, majorness);
            let mut alignment = inner.alignment;
            if rule.pads_to_vec4() {
                alignment = round_up(alignment, VEC4_ALIGNMENT);
            }
            let count = (*length).max(1);
            if rule == LayoutRule::FxcCTBuffer {
                // The last element is not padded: data after the array may
                // share its final register.
                let stride = round_up(inner.size, alignment);
                AlignmentSize {
                    alignment,
                    size: inner.size + stride * (count - 1),
                    stride,
                }
            } else {
                let stride = round_up(inner.size, alignment);
                AlignmentSize {
                    alignment,
                    size: round_up(stride * count, alignment),
                    stride,
                }
            }
        }
        Type::RuntimeArray { elem } => {
            let inner = alignment_and_size(ctx, *elem, rule, majorness);
            let mut alignment = inner.alignment;
            if rule.pads_to_vec4() {
                alignment = round_up(alignment, VEC4_ALIGNMENT);
            }
            AlignmentSize {
                alignment,
                size: 0,
                stride: round_up(inner.size, alignment),
            }
        }
        Type::Struct(st) => {
            let placed = place_struct_fields(ctx, st, rule);
            AlignmentSize {
                alignment: placed.alignment,
                size: placed.size,
                stride: 0,
            }
        }
        Type::Pointer { .. }
        | Type::Image(_)
        | Type::Sampler
        | Type::SampledImage { .. }
        | Type::Function { .. } => AlignmentSize {
            alignment: 1,
            size: 0,
            stride: 0,
        },
    }
}

fn scalar(size: u32, rule: LayoutRule) -> AlignmentSize {
    let alignment = if rule == LayoutRule::RelaxedStd140 { size.max(4) } else { size };
    AlignmentSize {
        alignment,
        size,
        stride: 0,
    }
}

/// Offsets of every field of a struct together with its overall placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructPlacement {
    pub offsets: Vec<u32>,
    pub alignment: u32,
    pub size: u32,
}

/// Place the fields of `st` one after another under `rule`.
pub fn place_struct_fields(ctx: &Context, st: &StructType, rule: LayoutRule) -> StructPlacement {
    let mut offsets = Vec::with_capacity(st.fields.len());
    let mut offset = 0u32;
    let mut max_alignment = 1u32;

    for field in &st.fields {
        let placed = alignment_and_size(ctx, field.ty, rule, field.majorness);
        let mut alignment = placed.alignment;

        if rule.uses_relaxed_vectors() {
            // Vectors only need their scalar alignment, unless that would make
            // them straddle a register.
            if let Type::Vector { elem, .. } = ctx.ty(field.ty) {
                let elem = alignment_and_size(ctx, *elem, rule, None);
                if elem.alignment <= 4 {
                    alignment = elem.alignment;
                }
                offset = round_up(offset, alignment);
                if improper_straddle(placed.size, offset) {
                    alignment = VEC4_ALIGNMENT;
                    offset = round_up(offset, alignment);
                }
            } else {
                offset = round_up(offset, alignment);
            }
        } else {
            offset = round_up(offset, alignment);
        }

        if let Some(explicit) = field.offset {
            offset = explicit;
        }

        max_alignment = max_alignment.max(placed.alignment);
        offsets.push(offset);
        offset += placed.size;
    }

    if rule.pads_to_vec4() {
        max_alignment = round_up(max_alignment, VEC4_ALIGNMENT);
    }
    let size = if rule == LayoutRule::FxcCTBuffer { offset } else { round_up(offset, max_alignment) };

    StructPlacement {
        offsets,
        alignment: max_alignment,
        size,
    }
}

/// Look through arrays for a matrix element type.
pub fn innermost_matrix(ctx: &Context, ty: TypeId) -> Option<TypeId> {
    match ctx.ty(ty) {
        Type::Matrix { .. } => Some(ty),
        Type::Array { elem, .. } | Type::RuntimeArray { elem } => innermost_matrix(ctx, *elem),
        _ => None,
    }
}

/// Number of interface locations a stage variable of type `ty` consumes.
pub fn location_count(ctx: &Context, ty: TypeId) -> u32 {
    match ctx.ty(ty) {
        Type::Vector { elem, count } => match ctx.ty(*elem) {
            Type::Int { width: 64, .. } | Type::Float { width: 64 } if *count > 2 => 2,
            _ => 1,
        },
        Type::Matrix { column, columns } => columns * location_count(ctx, *column),
        Type::Array { elem, length } => length * location_count(ctx, *elem),
        Type::Struct(st) => st.fields.iter().map(|f| location_count(ctx, f.ty)).sum(),
        _ => 1,
    }
}
