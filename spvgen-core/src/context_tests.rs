//! Tests for id allocation and interning in the compilation context

use rspirv::spirv;

use crate::context::{BufferAccess, Context};
use crate::ir::{Constant, ConstantValue, Decoration, SpirvType, StructInterface, Type};
use crate::{IdArena, IdSource, InternArena};

#[test]
fn test_id_source_counts_up() {
    let mut ids: IdSource<u32> = IdSource::starting_at(1);
    assert_eq!(ids.peek(), 1);
    assert_eq!(ids.next(), 1);
    assert_eq!(ids.next(), 2);
    assert_eq!(ids.peek(), 3);
}

#[test]
fn test_arenas_keep_insertion_order() {
    let mut arena: IdArena<u32, &str> = IdArena::new();
    let a = arena.alloc("a");
    let b = arena.alloc("b");
    assert_eq!(arena.get(a), Some(&"a"));
    let order: Vec<_> = arena.iter().map(|(id, item)| (*id, *item)).collect();
    assert_eq!(order, vec![(a, "a"), (b, "b")]);

    let mut interned: InternArena<u32, String> = InternArena::new();
    let x = interned.intern("x".to_string());
    assert_eq!(interned.intern("x".to_string()), x);
    assert_ne!(interned.intern("y".to_string()), x);
    assert_eq!(interned.len(), 2);
}

#[test]
fn test_result_ids_start_at_one() {
    let mut ctx = Context::new();
    assert_eq!(ctx.id_bound(), 1);
    assert_eq!(ctx.take_next_id(), 1);
    assert_eq!(ctx.take_next_id(), 2);
    assert_eq!(ctx.id_bound(), 3);
}

#[test]
fn test_types_are_interned_structurally() {
    let mut ctx = Context::new();
    let a = ctx.float_vec(4);
    let b = ctx.float_vec(4);
    assert_eq!(a, b);
    assert_ne!(ctx.float_vec(3), a);

    // A one-component vector is its scalar.
    assert_eq!(ctx.float_vec(1), ctx.float_type());
    assert!(matches!(ctx.ty(a), Type::Vector { count: 4, .. }));
}

#[test]
fn test_type_ids_ignore_decoration_order() {
    let mut ctx = Context::new();
    let block = ctx.register_decoration(Decoration::new(spirv::Decoration::Block, vec![]));
    let offset = ctx.register_decoration(Decoration::member(0, spirv::Decoration::Offset, vec![0]));
    let lowered = SpirvType::Struct {
        name: "S".to_string(),
        members: vec![7],
    };

    let (first, fresh) = ctx.get_or_create_type_id(lowered.clone(), &[block, offset]);
    assert!(fresh);
    let (second, fresh) = ctx.get_or_create_type_id(lowered.clone(), &[offset, block, block]);
    assert!(!fresh);
    assert_eq!(first, second);

    let (third, fresh) = ctx.get_or_create_type_id(lowered, &[block]);
    assert!(fresh);
    assert_ne!(third, first);
}

#[test]
fn test_decorations_are_interned() {
    let mut ctx = Context::new();
    let a = ctx.register_decoration(Decoration::location(3));
    let b = ctx.register_decoration(Decoration::location(3));
    assert_eq!(a, b);
    assert_eq!(ctx.decoration(a).params, vec![3]);
}

#[test]
fn test_constants_are_deduplicated() {
    let mut ctx = Context::new();
    let one = ctx.constant_u32(1);
    assert_eq!(ctx.constant_u32(1), one);
    assert_ne!(ctx.constant_i32(1), one);

    let half = ctx.constant_f32(0.5);
    let f = ctx.float_type();
    assert_eq!(
        ctx.constant(half),
        Some(&Constant {
            ty: f,
            value: ConstantValue::Float(0.5f32.to_bits() as u64),
        })
    );
    assert_eq!(ctx.constant(9999), None);
}

#[test]
fn test_constants_iterate_in_registration_order() {
    let mut ctx = Context::new();
    let t = ctx.constant_bool(true);
    let two = ctx.constant_u32(2);
    let uint = ctx.uint_type();
    let v2 = ctx.vec_type(uint, 2);
    let pair = ctx.constant_composite(v2, vec![two, two]);

    let ids: Vec<_> = ctx.constants().map(|(_, id)| id).collect();
    assert_eq!(ids, vec![t, two, pair]);
}

#[test]
fn test_negative_int_constant_bits() {
    let mut ctx = Context::new();
    let id = ctx.constant_i32(-1);
    assert_eq!(
        ctx.constant(id).map(|c| c.value.clone()),
        Some(ConstantValue::Int(0xFFFF_FFFF))
    );
}

#[test]
fn test_type_names() {
    let mut ctx = Context::new();
    let f = ctx.float_type();
    let m = ctx.mat_type(f, 3, 4);
    let v = ctx.float_vec(2);
    let arr = ctx.array_type(v, 8);
    let uint = ctx.uint_type();

    assert_eq!(ctx.type_name(m), "float3x4");
    assert_eq!(ctx.type_name(arr), "float2[8]");
    assert_eq!(ctx.type_name(uint), "uint");
}

#[test]
fn test_structured_buffer_types() {
    let mut ctx = Context::new();
    let f = ctx.float_type();
    let rw = ctx.structured_buffer_type(f, BufferAccess::ReadWrite);
    match ctx.ty(rw) {
        Type::Struct(st) => {
            assert_eq!(st.name, "type.RWStructuredBuffer.float");
            assert_eq!(st.fields.len(), 1);
            assert_eq!(
                st.interface,
                StructInterface::StorageBuffer {
                    read_only: false,
                    has_counter: true,
                }
            );
        }
        other => panic!("expected struct, got {:?}", other),
    }

    let ro = ctx.byte_address_buffer_type(false);
    assert_eq!(ctx.type_name(ro), "type.ByteAddressBuffer");
}
