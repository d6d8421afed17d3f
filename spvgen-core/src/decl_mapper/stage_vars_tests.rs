use rspirv::spirv::Capability;

use super::*;
use crate::decl::Interpolation;

struct Fixture {
    ctx: Context,
    module: Module,
}

impl Fixture {
    fn new() -> Self {
        Fixture {
            ctx: Context::new(),
            module: Module::new(),
        }
    }

    fn mapper(&mut self) -> DeclResultIdMapper<'_> {
        DeclResultIdMapper::new(&mut self.ctx, &mut self.module, EmitOptions::default(), ShaderModel::default())
    }
}

fn count_ops(block: &BasicBlock, pred: impl Fn(&Instruction) -> bool) -> usize {
    block.instructions.iter().filter(|inst| pred(inst)).count()
}

fn var_name(module: &Module, id: spirv::Word) -> Option<&str> {
    module.instructions.iter().find_map(|inst| match inst {
        Instruction::Name { target, name } if *target == id => Some(name.as_str()),
        _ => None,
    })
}

fn diagnostics(mapper: &DeclResultIdMapper<'_>) -> Vec<Diagnostic> {
    mapper.diagnostics().iter().cloned().collect()
}

// =============================================================================
// Tessellation factors
// =============================================================================

#[test]
fn test_tess_factor_size_must_match_domain() {
    let mut fx = Fixture::new();
    let mut mapper = fx.mapper().with_tess_domain(TessDomain::Tri);
    let float = mapper.context().float_type();
    let factors = mapper.context().array_type(float, 2);
    let decl = Decl::new("edges").with_semantic("SV_TessFactor");
    let mut block = BasicBlock::new(0);

    let result = mapper.create_stage_vars(&StageVarSite::new(SigPointKind::PCOut, &decl, factors), Some(50), &mut block);

    assert_eq!(result, Err(ErrorReported));
    assert_eq!(
        diagnostics(&mapper),
        vec![Diagnostic::TessFactorSize {
            decl: "edges".to_string(),
            semantic: "SV_TessFactor".to_string(),
            expected: 3,
            found: 2,
        }]
    );
    assert!(block.instructions.is_empty());
}

#[test]
fn test_isoline_tess_factor_writes_two_elements() {
    let mut fx = Fixture::new();
    let mut mapper = fx.mapper().with_tess_domain(TessDomain::Isoline);
    let float = mapper.context().float_type();
    let factors = mapper.context().array_type(float, 2);
    let wire = mapper.context().array_type(float, 4);
    let decl = Decl::new("edges").with_semantic("SV_TessFactor");
    let mut block = BasicBlock::new(0);

    let result = mapper.create_stage_vars(&StageVarSite::new(SigPointKind::PCOut, &decl, factors), Some(50), &mut block);

    assert_eq!(result, Ok(None));
    assert!(mapper.diagnostics().is_empty());
    assert_eq!(count_ops(&block, |i| matches!(i, Instruction::Store { .. })), 2);
    assert_eq!(count_ops(&block, |i| matches!(i, Instruction::AccessChain { .. })), 2);

    let var = &mapper.stage_vars()[0];
    assert_eq!(var.builtin, Some(BuiltIn::TessLevelOuter));
    assert_eq!(var.ty, wire);
    let id = var.id;
    assert!(
        mapper
            .module()
            .decorations_of(id)
            .any(|d| *d == Decoration::builtin(BuiltIn::TessLevelOuter))
    );
}

#[test]
fn test_inside_tess_factor_has_no_isoline_form() {
    let mut fx = Fixture::new();
    let mut mapper = fx.mapper().with_tess_domain(TessDomain::Isoline);
    let float = mapper.context().float_type();
    let decl = Decl::new("inside").with_semantic("SV_InsideTessFactor");
    let mut block = BasicBlock::new(0);

    let result = mapper.create_stage_vars(&StageVarSite::new(SigPointKind::PCOut, &decl, float), Some(50), &mut block);

    assert!(result.is_err());
    assert!(matches!(diagnostics(&mapper).as_slice(), [Diagnostic::Unsupported { .. }]));
}

#[test]
fn test_tri_inside_tess_factor_reads_scalar() {
    let mut fx = Fixture::new();
    let mut mapper = fx.mapper().with_tess_domain(TessDomain::Tri);
    let float = mapper.context().float_type();
    let decl = Decl::new("inside").with_semantic("SV_InsideTessFactor");
    let mut block = BasicBlock::new(0);

    let result = mapper.create_stage_vars(&StageVarSite::new(SigPointKind::DSIn, &decl, float), None, &mut block);

    let value = result.expect("inside factor").expect("input value");
    assert!(matches!(block.instructions.last(), Some(Instruction::Load { id, .. }) if *id == value));
    assert_eq!(count_ops(&block, |i| matches!(i, Instruction::Load { .. })), 1);
}

#[test]
fn test_domain_location_truncated_for_isolines() {
    let mut fx = Fixture::new();
    let mut mapper = fx.mapper().with_tess_domain(TessDomain::Isoline);
    let float2 = mapper.context().float_vec(2);
    let float3 = mapper.context().float_vec(3);
    let decl = Decl::new("uv").with_semantic("SV_DomainLocation");
    let mut block = BasicBlock::new(0);

    mapper
        .create_stage_vars(&StageVarSite::new(SigPointKind::DSIn, &decl, float2), None, &mut block)
        .expect("domain location");

    assert_eq!(mapper.stage_vars()[0].ty, float3);
    assert!(matches!(
        block.instructions.last(),
        Some(Instruction::VectorShuffle { components, .. }) if components == &vec![0, 1]
    ));
}

// =============================================================================
// Routing
// =============================================================================

#[test]
fn test_position_is_an_interface_variable_for_vertex_input() {
    let mut fx = Fixture::new();
    let mut mapper = fx.mapper();
    let float4 = mapper.context().float_vec(4);
    let decl = Decl::new("pos").with_semantic("SV_Position");
    let mut block = BasicBlock::new(0);

    mapper
        .create_stage_vars(&StageVarSite::new(SigPointKind::VSIn, &decl, float4), None, &mut block)
        .expect("vertex input");

    let var = mapper.stage_vars()[0].clone();
    assert_eq!(var.builtin, None);
    assert!(!var.per_vertex);
    assert_eq!(var_name(mapper.module(), var.id), Some("in.var.SV_Position"));
}

#[test]
fn test_position_is_frag_coord_for_pixel_input() {
    let mut fx = Fixture::new();
    let mut mapper = fx.mapper();
    let float4 = mapper.context().float_vec(4);
    let decl = Decl::new("pos").with_semantic("SV_Position");
    let mut block = BasicBlock::new(0);

    mapper
        .create_stage_vars(&StageVarSite::new(SigPointKind::PSIn, &decl, float4), None, &mut block)
        .expect("pixel input");

    assert_eq!(mapper.stage_vars()[0].builtin, Some(BuiltIn::FragCoord));
    assert_eq!(mapper.interface_ids(), &[mapper.stage_vars()[0].id]);
}

#[test]
fn test_vertex_position_goes_into_per_vertex_block() {
    let mut fx = Fixture::new();
    let mut mapper = fx.mapper();
    let float4 = mapper.context().float_vec(4);
    let decl = Decl::new("pos").with_semantic("SV_Position");
    let mut block = BasicBlock::new(0);

    let result = mapper.create_stage_vars(&StageVarSite::new(SigPointKind::VSOut, &decl, float4), Some(77), &mut block);

    assert_eq!(result, Ok(None));
    let var = mapper.stage_vars()[0].clone();
    assert!(var.per_vertex);
    assert_eq!(var_name(mapper.module(), var.id), Some("gl_PerVertexOut"));

    let block_ty = mapper.per_vertex_type(SigPointKind::VSOut).expect("sealed aggregate");
    match mapper.context().ty(block_ty) {
        Type::Struct(st) => {
            assert_eq!(st.interface, StructInterface::PerVertex);
            assert_eq!(st.fields.len(), 1);
            assert_eq!(st.fields[0].builtin, Some(BuiltIn::Position));
        }
        other => panic!("expected struct, got {:?}", other),
    }
    assert!(matches!(block.instructions.last(), Some(Instruction::Store { value: 77, .. })));
}

#[test]
fn test_clip_distances_share_one_array() {
    let mut fx = Fixture::new();
    let mut mapper = fx.mapper();
    let float = mapper.context().float_type();
    let float2 = mapper.context().float_vec(2);
    let clip0 = Decl::new("clip0").with_semantic("SV_ClipDistance0");
    let clip1 = Decl::new("clip1").with_semantic("SV_ClipDistance1");
    mapper.record_per_vertex_decl(SigPointKind::VSOut, &clip0, float2);
    mapper.record_per_vertex_decl(SigPointKind::VSOut, &clip1, float);

    let mut block = BasicBlock::new(0);
    mapper
        .create_stage_vars(&StageVarSite::new(SigPointKind::VSOut, &clip0, float2), Some(10), &mut block)
        .expect("clip0");
    mapper
        .create_stage_vars(&StageVarSite::new(SigPointKind::VSOut, &clip1, float), Some(11), &mut block)
        .expect("clip1");

    let block_ty = mapper.per_vertex_type(SigPointKind::VSOut).expect("sealed aggregate");
    let clip_array = mapper.context().array_type(float, 3);
    match mapper.context().ty(block_ty) {
        Type::Struct(st) => assert_eq!(st.fields[0].ty, clip_array),
        other => panic!("expected struct, got {:?}", other),
    }
    assert!(
        mapper
            .module()
            .instructions
            .contains(&Instruction::Capability(Capability::ClipDistance))
    );

    // clip1 lands after the two components of clip0.
    let slot2 = mapper.context().constant_u32(2);
    assert!(matches!(
        block.instructions.iter().rev().find(|i| matches!(i, Instruction::AccessChain { .. })),
        Some(Instruction::AccessChain { indices, .. }) if indices.last() == Some(&slot2)
    ));
    assert_eq!(count_ops(&block, |i| matches!(i, Instruction::Store { .. })), 3);
}

#[test]
fn test_unrecorded_member_after_sealing_is_rejected() {
    let mut fx = Fixture::new();
    let mut mapper = fx.mapper();
    let float = mapper.context().float_type();
    let float4 = mapper.context().float_vec(4);
    let pos = Decl::new("pos").with_semantic("SV_Position");
    let clip = Decl::new("clip").with_semantic("SV_ClipDistance");
    let mut block = BasicBlock::new(0);

    mapper
        .create_stage_vars(&StageVarSite::new(SigPointKind::VSOut, &pos, float4), Some(1), &mut block)
        .expect("position");
    let result = mapper.create_stage_vars(&StageVarSite::new(SigPointKind::VSOut, &clip, float), Some(2), &mut block);

    assert!(result.is_err());
    assert!(matches!(diagnostics(&mapper).as_slice(), [Diagnostic::Unsupported { .. }]));
}

#[test]
fn test_point_size_builtin_override() {
    let mut fx = Fixture::new();
    let mut mapper = fx.mapper();
    let float = mapper.context().float_type();
    let decl = Decl::new("size").with_builtin("PointSize");
    let mut block = BasicBlock::new(0);

    mapper
        .create_stage_vars(&StageVarSite::new(SigPointKind::VSOut, &decl, float), Some(3), &mut block)
        .expect("point size");

    let block_ty = mapper.per_vertex_type(SigPointKind::VSOut).expect("sealed aggregate");
    match mapper.context().ty(block_ty) {
        Type::Struct(st) => assert_eq!(st.fields[0].builtin, Some(BuiltIn::PointSize)),
        other => panic!("expected struct, got {:?}", other),
    }
}

#[test]
fn test_unknown_builtin_override() {
    let mut fx = Fixture::new();
    let mut mapper = fx.mapper();
    let float = mapper.context().float_type();
    let decl = Decl::new("x").with_builtin("NotABuiltIn");
    let mut block = BasicBlock::new(0);

    assert!(
        mapper
            .create_stage_vars(&StageVarSite::new(SigPointKind::VSOut, &decl, float), Some(3), &mut block)
            .is_err()
    );
    assert!(matches!(diagnostics(&mapper).as_slice(), [Diagnostic::Unsupported { .. }]));
}

#[test]
fn test_builtin_override_at_wrong_stage() {
    let mut fx = Fixture::new();
    let mut mapper = fx.mapper();
    let uint = mapper.context().uint_type();
    let decl = Decl::new("base").with_builtin("BaseVertex");
    let mut block = BasicBlock::new(0);

    assert!(
        mapper
            .create_stage_vars(&StageVarSite::new(SigPointKind::PSIn, &decl, uint), None, &mut block)
            .is_err()
    );
    assert_eq!(
        diagnostics(&mapper),
        vec![Diagnostic::InvalidBuiltIn {
            decl: "base".to_string(),
            builtin: "BaseVertex".to_string(),
            sig_point: "PSIn".to_string(),
        }]
    );
}

#[test]
fn test_invalid_semantic_for_stage() {
    let mut fx = Fixture::new();
    let mut mapper = fx.mapper();
    let float4 = mapper.context().float_vec(4);
    let decl = Decl::new("color").with_semantic("SV_Target");
    let mut block = BasicBlock::new(0);

    assert!(
        mapper
            .create_stage_vars(&StageVarSite::new(SigPointKind::VSIn, &decl, float4), None, &mut block)
            .is_err()
    );
    assert_eq!(
        diagnostics(&mapper),
        vec![Diagnostic::InvalidSemantic {
            decl: "color".to_string(),
            semantic: "SV_Target".to_string(),
            sig_point: "VSIn".to_string(),
        }]
    );
    assert!(mapper.stage_vars().is_empty());
}

#[test]
fn test_view_id_needs_shader_model_6_1() {
    let mut fx = Fixture::new();
    let uint = fx.ctx.uint_type();
    let decl = Decl::new("view").with_semantic("SV_ViewID");
    let mut block = BasicBlock::new(0);

    let mut old = fx.mapper();
    assert!(
        old.create_stage_vars(&StageVarSite::new(SigPointKind::VSIn, &decl, uint), None, &mut block)
            .is_err()
    );
    drop(old);

    let mut fx = Fixture::new();
    let uint = fx.ctx.uint_type();
    let mut mapper = DeclResultIdMapper::new(
        &mut fx.ctx,
        &mut fx.module,
        EmitOptions::default(),
        ShaderModel::new(6, 1),
    );
    mapper
        .create_stage_vars(&StageVarSite::new(SigPointKind::VSIn, &decl, uint), None, &mut block)
        .expect("view index");
    assert_eq!(mapper.stage_vars()[0].builtin, Some(BuiltIn::ViewIndex));
    assert!(
        mapper
            .module()
            .instructions
            .contains(&Instruction::Extension("SPV_KHR_multiview".to_string()))
    );
}

#[test]
fn test_duplicate_semantic_ignores_case() {
    let mut fx = Fixture::new();
    let mut mapper = fx.mapper();
    let float4 = mapper.context().float_vec(4);
    let a = Decl::new("a").with_semantic("TEXCOORD0");
    let b = Decl::new("b").with_semantic("texcoord0");
    let mut block = BasicBlock::new(0);

    mapper
        .create_stage_vars(&StageVarSite::new(SigPointKind::VSIn, &a, float4), None, &mut block)
        .expect("first");
    assert!(
        mapper
            .create_stage_vars(&StageVarSite::new(SigPointKind::VSIn, &b, float4), None, &mut block)
            .is_err()
    );
    assert_eq!(
        diagnostics(&mapper),
        vec![Diagnostic::DuplicateSemantic {
            decl: "b".to_string(),
            direction: Direction::Input,
            semantic: "texcoord0".to_string(),
        }]
    );
}

#[test]
fn test_missing_semantic() {
    let mut fx = Fixture::new();
    let mut mapper = fx.mapper();
    let float4 = mapper.context().float_vec(4);
    let decl = Decl::new("naked");
    let mut block = BasicBlock::new(0);

    assert!(
        mapper
            .create_stage_vars(&StageVarSite::new(SigPointKind::VSOut, &decl, float4), Some(5), &mut block)
            .is_err()
    );
    assert_eq!(
        diagnostics(&mapper),
        vec![Diagnostic::MissingSemantic {
            decl: "naked".to_string(),
            direction: Direction::Output,
        }]
    );
}

#[test]
fn test_bool_interface_variable_is_unsupported() {
    let mut fx = Fixture::new();
    let mut mapper = fx.mapper();
    let boolean = mapper.context().bool_type();
    let decl = Decl::new("flag").with_semantic("FLAG");
    let mut block = BasicBlock::new(0);

    assert!(
        mapper
            .create_stage_vars(&StageVarSite::new(SigPointKind::VSIn, &decl, boolean), None, &mut block)
            .is_err()
    );
    assert!(matches!(diagnostics(&mapper).as_slice(), [Diagnostic::Unsupported { .. }]));
}

// =============================================================================
// Structs and arrays
// =============================================================================

fn vertex_struct(ctx: &mut Context) -> TypeId {
    let float4 = ctx.float_vec(4);
    let float2 = ctx.float_vec(2);
    ctx.struct_type(
        "VSInput",
        vec![StructField::new("pos", float4), StructField::new("uv", float2)],
        StructInterface::Internal,
    )
}

fn vertex_struct_decl(name: &str) -> Decl {
    Decl::new(name).with_fields(vec![
        Decl::new("pos").with_semantic("POSITION"),
        Decl::new("uv").with_semantic("TEXCOORD0"),
    ])
}

#[test]
fn test_struct_input_is_split_per_field() {
    let mut fx = Fixture::new();
    let input = vertex_struct(&mut fx.ctx);
    let mut mapper = fx.mapper();
    let decl = vertex_struct_decl("input");
    let mut block = BasicBlock::new(0);

    let value = mapper
        .create_stage_vars(&StageVarSite::new(SigPointKind::VSIn, &decl, input), None, &mut block)
        .expect("struct input")
        .expect("input value");

    assert_eq!(mapper.stage_vars().len(), 2);
    assert_eq!(mapper.stage_vars()[0].decl_name, "pos");
    assert_eq!(mapper.stage_vars()[1].decl_name, "uv");
    assert!(matches!(
        block.instructions.last(),
        Some(Instruction::CompositeConstruct { id, ty, constituents }) if *id == value && ty.ty == input && constituents.len() == 2
    ));
}

#[test]
fn test_struct_output_is_extracted_per_field() {
    let mut fx = Fixture::new();
    let output = vertex_struct(&mut fx.ctx);
    let mut mapper = fx.mapper();
    let decl = vertex_struct_decl("output");
    let mut block = BasicBlock::new(0);

    let result = mapper.create_stage_vars(&StageVarSite::new(SigPointKind::VSOut, &decl, output), Some(42), &mut block);

    assert_eq!(result, Ok(None));
    assert_eq!(
        count_ops(&block, |i| matches!(i, Instruction::CompositeExtract { composite: 42, .. })),
        2
    );
    assert_eq!(count_ops(&block, |i| matches!(i, Instruction::Store { .. })), 2);
}

#[test]
fn test_struct_without_field_declarations() {
    let mut fx = Fixture::new();
    let input = vertex_struct(&mut fx.ctx);
    let mut mapper = fx.mapper();
    let decl = Decl::new("input");
    let mut block = BasicBlock::new(0);

    assert!(
        mapper
            .create_stage_vars(&StageVarSite::new(SigPointKind::VSIn, &decl, input), None, &mut block)
            .is_err()
    );
    assert!(matches!(diagnostics(&mapper).as_slice(), [Diagnostic::Unsupported { .. }]));
}

#[test]
fn test_arrayed_struct_input_rebuilds_each_vertex() {
    let mut fx = Fixture::new();
    let input = vertex_struct(&mut fx.ctx);
    let input_array = fx.ctx.array_type(input, 3);
    let mut mapper = fx.mapper();
    let decl = vertex_struct_decl("verts");
    let mut block = BasicBlock::new(0);

    let site = StageVarSite::new(SigPointKind::GSVIn, &decl, input).with_array_size(3);
    let value = mapper
        .create_stage_vars(&site, None, &mut block)
        .expect("arrayed input")
        .expect("input value");

    // One struct per vertex plus the array.
    assert_eq!(
        count_ops(&block, |i| matches!(i, Instruction::CompositeConstruct { .. })),
        4
    );
    assert!(matches!(
        block.instructions.last(),
        Some(Instruction::CompositeConstruct { id, ty, .. }) if *id == value && ty.ty == input_array
    ));
}

#[test]
fn test_hull_output_writes_current_control_point() {
    let mut fx = Fixture::new();
    let mut mapper = fx.mapper();
    let float4 = mapper.context().float_vec(4);
    let decl = Decl::new("cp").with_semantic("TEXCOORD0");
    let mut block = BasicBlock::new(0);

    let site = StageVarSite::new(SigPointKind::HSCPOut, &decl, float4)
        .with_array_size(4)
        .with_invocation_id(900);
    mapper
        .create_stage_vars(&site, Some(12), &mut block)
        .expect("control point output");

    let wire = mapper.context().array_type(float4, 4);
    let var = &mapper.stage_vars()[0];
    assert_eq!(var.location_count, 1);
    let var_id = var.id;
    assert!(mapper.module().instructions.iter().any(|inst| matches!(
        inst,
        Instruction::Variable { id, .. } if *id == var_id
    )));
    assert!(matches!(
        block.instructions.as_slice(),
        [
            Instruction::AccessChain { indices, base, .. },
            Instruction::Store { value: 12, .. },
        ] if indices == &vec![900] && *base == var_id
    ));
    let pointer = mapper.context().pointer_type(wire, StorageClass::Output);
    assert!(mapper.module().instructions.iter().any(|inst| matches!(
        inst,
        Instruction::Variable { id, ty, .. } if *id == var_id && ty.ty == pointer
    )));
}

#[test]
fn test_arrayed_position_input_loads_every_vertex() {
    let mut fx = Fixture::new();
    let mut mapper = fx.mapper();
    let float4 = mapper.context().float_vec(4);
    let decl = Decl::new("pos").with_semantic("SV_Position");
    let mut block = BasicBlock::new(0);

    let site = StageVarSite::new(SigPointKind::GSVIn, &decl, float4).with_array_size(3);
    mapper.create_stage_vars(&site, None, &mut block).expect("gs input");

    assert_eq!(count_ops(&block, |i| matches!(i, Instruction::Load { .. })), 3);
    let var = mapper.stage_vars()[0].clone();
    assert!(var.per_vertex);
    assert_eq!(var_name(mapper.module(), var.id), Some("gl_PerVertexIn"));
}

// =============================================================================
// Pixel inputs and outputs
// =============================================================================

#[test]
fn test_integer_pixel_input_is_flat() {
    let mut fx = Fixture::new();
    let mut mapper = fx.mapper();
    let int = mapper.context().int_type();
    let decl = Decl::new("id").with_semantic("MATERIAL");
    let mut block = BasicBlock::new(0);

    mapper
        .create_stage_vars(&StageVarSite::new(SigPointKind::PSIn, &decl, int), None, &mut block)
        .expect("pixel input");

    let id = mapper.stage_vars()[0].id;
    assert!(
        mapper
            .module()
            .decorations_of(id)
            .any(|d| d.kind == spirv::Decoration::Flat)
    );
}

#[test]
fn test_sample_interpolation_requires_capability() {
    let mut fx = Fixture::new();
    let mut mapper = fx.mapper();
    let float4 = mapper.context().float_vec(4);
    let decl = Decl::new("color").with_semantic("COLOR").with_interpolation(Interpolation {
        sample: true,
        noperspective: true,
        ..Interpolation::default()
    });
    let mut block = BasicBlock::new(0);

    mapper
        .create_stage_vars(&StageVarSite::new(SigPointKind::PSIn, &decl, float4), None, &mut block)
        .expect("pixel input");

    let id = mapper.stage_vars()[0].id;
    let kinds: Vec<_> = mapper.module().decorations_of(id).map(|d| d.kind).collect();
    assert!(kinds.contains(&spirv::Decoration::Sample));
    assert!(kinds.contains(&spirv::Decoration::NoPerspective));
    assert!(!kinds.contains(&spirv::Decoration::Flat));
    assert!(
        mapper
            .module()
            .instructions
            .contains(&Instruction::Capability(Capability::SampleRateShading))
    );
}

#[test]
fn test_depth_output_requests_execution_mode() {
    let mut fx = Fixture::new();
    let mut mapper = fx.mapper();
    let float = mapper.context().float_type();
    let decl = Decl::new("depth").with_semantic("SV_DepthGreaterEqual");
    let mut block = BasicBlock::new(0);

    mapper
        .create_stage_vars(&StageVarSite::new(SigPointKind::PSOut, &decl, float), Some(4), &mut block)
        .expect("depth output");

    assert_eq!(mapper.stage_vars()[0].builtin, Some(BuiltIn::FragDepth));
    assert_eq!(
        mapper.take_execution_modes(),
        vec![(ExecutionMode::DepthReplacing, vec![]), (ExecutionMode::DepthGreater, vec![])]
    );
    assert!(mapper.take_execution_modes().is_empty());
}

#[test]
fn test_less_equal_depth_also_replaces_depth() {
    let mut fx = Fixture::new();
    let mut mapper = fx.mapper();
    let float = mapper.context().float_type();
    let decl = Decl::new("depth").with_semantic("SV_DepthLessEqual");
    let mut block = BasicBlock::new(0);

    mapper
        .create_stage_vars(&StageVarSite::new(SigPointKind::PSOut, &decl, float), Some(4), &mut block)
        .expect("depth output");

    assert_eq!(
        mapper.take_execution_modes(),
        vec![(ExecutionMode::DepthReplacing, vec![]), (ExecutionMode::DepthLess, vec![])]
    );
}

#[test]
fn test_second_depth_output_is_rejected() {
    let mut fx = Fixture::new();
    let mut mapper = fx.mapper();
    let float = mapper.context().float_type();
    let depth = Decl::new("depth").with_semantic("SV_Depth");
    let depth_ge = Decl::new("depth_ge").with_semantic("SV_DepthGreaterEqual");
    let mut block = BasicBlock::new(0);

    mapper
        .create_stage_vars(&StageVarSite::new(SigPointKind::PSOut, &depth, float), Some(4), &mut block)
        .expect("depth output");
    assert!(
        mapper
            .create_stage_vars(&StageVarSite::new(SigPointKind::PSOut, &depth_ge, float), Some(4), &mut block)
            .is_err()
    );
}

#[test]
fn test_coverage_output_goes_through_sample_mask_array() {
    let mut fx = Fixture::new();
    let mut mapper = fx.mapper();
    let uint = mapper.context().uint_type();
    let mask_array = mapper.context().array_type(uint, 1);
    let decl = Decl::new("mask").with_semantic("SV_Coverage");
    let mut block = BasicBlock::new(0);

    mapper
        .create_stage_vars(&StageVarSite::new(SigPointKind::PSOut, &decl, uint), Some(8), &mut block)
        .expect("coverage output");

    assert_eq!(mapper.stage_vars()[0].ty, mask_array);
    assert!(matches!(block.instructions.last(), Some(Instruction::Store { value: 8, .. })));
}
