//! Tests for declaration attributes and register parsing

use crate::decl::{Decl, RegisterAssignment, RegisterClass};
use crate::error::CompilerError;
use crate::options::{BindingShiftMap, EmitOptions, StageIoOrder, TargetEnv};

fn register(s: &str) -> RegisterAssignment {
    s.parse().expect("register should parse")
}

#[test]
fn test_parse_register_with_space() {
    let reg = register("t3, space1");
    assert_eq!(reg, RegisterAssignment::new(RegisterClass::T, 3, Some(1)));
    assert_eq!(reg.class(), Some(RegisterClass::T));
    assert!(!reg.is_space_only());
}

#[test]
fn test_parse_register_forms() {
    assert_eq!(register("b0"), RegisterAssignment::new(RegisterClass::B, 0, None));
    assert_eq!(register("U12"), RegisterAssignment::new(RegisterClass::U, 12, None));
    assert_eq!(register("s1,space4"), RegisterAssignment::new(RegisterClass::S, 1, Some(4)));
    assert_eq!(register("space2"), RegisterAssignment::space_only(2));
    assert!(register("space2").is_space_only());
}

#[test]
fn test_parse_register_errors() {
    for bad in ["x3", "t", "t3 space1", "t3, space", ""] {
        match bad.parse::<RegisterAssignment>() {
            Err(CompilerError::InvalidRegister(text)) => assert_eq!(text, bad),
            other => panic!("expected an invalid register error for '{}', got {:?}", bad, other),
        }
    }
}

#[test]
fn test_register_display_round_trips() {
    for text in ["t3, space1", "b0", "space2"] {
        assert_eq!(register(text).to_string(), text);
    }
}

#[test]
fn test_decl_from_json() {
    let decl: Decl = serde_json::from_str(
        r#"{
            "name": "albedo",
            "register": "t0, space1",
            "counter_binding": 4
        }"#,
    )
    .unwrap();
    assert_eq!(decl.name, "albedo");
    assert_eq!(decl.register, Some(RegisterAssignment::new(RegisterClass::T, 0, Some(1))));
    assert_eq!(decl.counter_binding, Some(4));
    assert!(decl.semantic.is_none());
    assert!(decl.fields.is_empty());
}

#[test]
fn test_bad_register_in_json_is_rejected() {
    let result: Result<Decl, _> = serde_json::from_str(r#"{ "name": "x", "register": "q9" }"#);
    assert!(result.is_err());
}

#[test]
fn test_options_from_json() {
    let options: EmitOptions = serde_json::from_str(
        r#"{
            "target_env": "vulkan1.1",
            "t_shift": { "all_sets": 100 },
            "stage_io_order": "alpha",
            "cbuffer_layout": "relaxed_std140"
        }"#,
    )
    .unwrap();
    assert_eq!(options.target_env, TargetEnv::Vulkan1_1);
    assert_eq!(options.t_shift, BindingShiftMap::for_all_sets(100));
    assert_eq!(options.stage_io_order, StageIoOrder::Alphabetical);
    assert_eq!(options.cbuffer_layout, crate::layout::LayoutRule::RelaxedStd140);
    assert_eq!(options.sbuffer_layout, crate::layout::LayoutRule::Std430);
}

#[test]
fn test_shift_lookup() {
    let mut shift = BindingShiftMap::for_set(2, 10);
    shift.all_sets = Some(5);
    assert_eq!(shift.shift_for_set(2), 10);
    assert_eq!(shift.shift_for_set(0), 5);
    assert_eq!(BindingShiftMap::default().shift_for_set(7), 0);
}

#[test]
fn test_target_versions() {
    assert_eq!(TargetEnv::Vulkan1_0.spirv_version(), (1, 0));
    assert_eq!(TargetEnv::Vulkan1_1.spirv_version(), (1, 3));
    assert_eq!(TargetEnv::Vulkan1_2.spirv_version(), (1, 5));
    assert!(!TargetEnv::Vulkan1_0.has_core_storage_buffer());
}
