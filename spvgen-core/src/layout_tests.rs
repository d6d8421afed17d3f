//! Tests for buffer layout rules

use crate::context::Context;
use crate::ir::{StructField, StructInterface, StructType, TypeId};
use crate::layout::{alignment_and_size, location_count, place_struct_fields, round_up, LayoutRule, Majorness};

fn block(fields: Vec<StructField>) -> StructType {
    StructType {
        name: "type.Test".to_string(),
        fields,
        interface: StructInterface::UniformBuffer,
    }
}

fn offsets(ctx: &Context, fields: Vec<(&str, TypeId)>, rule: LayoutRule) -> Vec<u32> {
    let fields = fields.into_iter().map(|(name, ty)| StructField::new(name, ty)).collect();
    let st = block(fields);
    place_struct_fields(ctx, &st, rule).offsets
}

#[test]
fn test_round_up() {
    assert_eq!(round_up(0, 16), 0);
    assert_eq!(round_up(1, 16), 16);
    assert_eq!(round_up(16, 16), 16);
    assert_eq!(round_up(7, 0), 7);
}

#[test]
fn test_std430_vectors() {
    let mut ctx = Context::new();
    let f = ctx.float_type();
    let v3 = ctx.float_vec(3);
    let placed = alignment_and_size(&ctx, v3, LayoutRule::Std430, None);
    assert_eq!((placed.alignment, placed.size), (16, 12));

    let offs = offsets(&ctx, vec![("a", v3), ("b", f)], LayoutRule::Std430);
    assert_eq!(offs, vec![0, 12]);
}

#[test]
fn test_std430_scalar_array_is_tight() {
    let mut ctx = Context::new();
    let f = ctx.float_type();
    let arr = ctx.array_type(f, 4);
    let placed = alignment_and_size(&ctx, arr, LayoutRule::Std430, None);
    assert_eq!((placed.alignment, placed.size, placed.stride), (4, 16, 4));
}

#[test]
fn test_relaxed_std140_array_elements_are_padded() {
    let mut ctx = Context::new();
    let f = ctx.float_type();
    let arr = ctx.array_type(f, 4);
    let placed = alignment_and_size(&ctx, arr, LayoutRule::RelaxedStd140, None);
    assert_eq!((placed.alignment, placed.size, placed.stride), (16, 64, 16));
}

#[test]
fn test_relaxed_vector_packs_after_scalar() {
    let mut ctx = Context::new();
    let f = ctx.float_type();
    let v3 = ctx.float_vec(3);
    let offs = offsets(&ctx, vec![("s", f), ("v", v3)], LayoutRule::RelaxedStd140);
    assert_eq!(offs, vec![0, 4]);
}

#[test]
fn test_relaxed_vector_does_not_straddle_a_register() {
    let mut ctx = Context::new();
    let f = ctx.float_type();
    let v2 = ctx.float_vec(2);
    let v3 = ctx.float_vec(3);
    // float at 0, float2 at 4..12, float3 would straddle at 12..24 -> 16.
    let offs = offsets(&ctx, vec![("s", f), ("a", v2), ("b", v3)], LayoutRule::RelaxedStd140);
    assert_eq!(offs, vec![0, 4, 16]);
}

#[test]
fn test_fxc_array_last_element_is_not_padded() {
    let mut ctx = Context::new();
    let f = ctx.float_type();
    let arr = ctx.array_type(f, 3);
    let placed = alignment_and_size(&ctx, arr, LayoutRule::FxcCTBuffer, None);
    assert_eq!((placed.stride, placed.size), (16, 36));

    let offs = offsets(&ctx, vec![("arr", arr), ("after", f)], LayoutRule::FxcCTBuffer);
    assert_eq!(offs, vec![0, 36]);
}

#[test]
fn test_fxc_struct_size_is_not_rounded() {
    let mut ctx = Context::new();
    let v3 = ctx.float_vec(3);
    let st = block(vec![StructField::new("v", v3)]);
    let placed = place_struct_fields(&ctx, &st, LayoutRule::FxcCTBuffer);
    assert_eq!(placed.size, 12);
    assert_eq!(placed.alignment, 16);

    let placed = place_struct_fields(&ctx, &st, LayoutRule::RelaxedStd140);
    assert_eq!(placed.size, 16);
}

#[test]
fn test_matrix_stride_follows_majorness() {
    let mut ctx = Context::new();
    let f = ctx.float_type();
    // float2x3: 2 rows, 3 columns.
    let m = ctx.mat_type(f, 2, 3);

    let col = alignment_and_size(&ctx, m, LayoutRule::Std430, None);
    assert_eq!((col.stride, col.size), (8, 24));

    let row = alignment_and_size(&ctx, m, LayoutRule::Std430, Some(Majorness::RowMajor));
    assert_eq!((row.stride, row.size), (16, 32));

    let padded = alignment_and_size(&ctx, m, LayoutRule::RelaxedStd140, None);
    assert_eq!((padded.stride, padded.size), (16, 48));
}

#[test]
fn test_explicit_offset_wins() {
    let mut ctx = Context::new();
    let f = ctx.float_type();
    let st = block(vec![StructField::new("a", f), StructField::new("b", f).with_offset(32)]);
    let placed = place_struct_fields(&ctx, &st, LayoutRule::FxcCTBuffer);
    assert_eq!(placed.offsets, vec![0, 32]);
    assert_eq!(placed.size, 36);
}

#[test]
fn test_nested_struct_alignment() {
    let mut ctx = Context::new();
    let f = ctx.float_type();
    let inner = ctx.struct_type("Inner", vec![StructField::new("x", f)], StructInterface::Internal);
    let offs = offsets(&ctx, vec![("a", f), ("inner", inner)], LayoutRule::RelaxedStd140);
    assert_eq!(offs, vec![0, 16]);

    let offs = offsets(&ctx, vec![("a", f), ("inner", inner)], LayoutRule::Std430);
    assert_eq!(offs, vec![0, 4]);
}

#[test]
fn test_bool_is_four_bytes() {
    let mut ctx = Context::new();
    let b = ctx.bool_type();
    let placed = alignment_and_size(&ctx, b, LayoutRule::Std430, None);
    assert_eq!((placed.alignment, placed.size), (4, 4));
}

#[test]
fn test_location_counts() {
    let mut ctx = Context::new();
    let f = ctx.float_type();
    let v4 = ctx.float_vec(4);
    let m = ctx.mat_type(f, 4, 3);
    let arr = ctx.array_type(v4, 5);
    let double = ctx.intern_type(crate::ir::Type::Float { width: 64 });
    let d3 = ctx.vec_type(double, 3);
    let st = ctx.struct_type(
        "S",
        vec![StructField::new("a", v4), StructField::new("b", m)],
        StructInterface::Internal,
    );

    assert_eq!(location_count(&ctx, f), 1);
    assert_eq!(location_count(&ctx, v4), 1);
    assert_eq!(location_count(&ctx, m), 3);
    assert_eq!(location_count(&ctx, arr), 5);
    assert_eq!(location_count(&ctx, d3), 2);
    assert_eq!(location_count(&ctx, st), 4);
}
