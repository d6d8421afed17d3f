//! Entry point wrapper and the end-to-end pipeline.
//!
//! The source entry function takes its parameters by pointer and returns its
//! result like any other function. [`compile`] generates a `void()` wrapper
//! that loads every stage input, calls the source function, and writes the
//! return value and `out` parameters to the stage outputs. The wrapper is
//! what the `OpEntryPoint` names.

use log::{debug, info, warn};
use rspirv::spirv::{self, AddressingModel, Capability, ExecutionMode, MemoryModel, StorageClass};
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::decl::Decl;
use crate::decl_mapper::{CTBufferKind, DeclResultIdMapper, StageVarSite};
use crate::emit::EmitVisitor;
use crate::error::{CompilerError, ErrorReported, Result};
use crate::interface::ShaderInterface;
use crate::ir::{BasicBlock, Function, FunctionParameter, Instruction, Module, Type, TypeId, TypeRef};
use crate::options::EmitOptions;
use crate::semantic::{Semantic, SemanticKind, ShaderModel, ShaderStage, SigPointKind, TessDomain};

// =============================================================================
// Program description
// =============================================================================

/// How an entry parameter crosses the stage boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    #[default]
    In,
    Out,
    /// Input patch or vertex array; the parameter type is an array over
    /// control points or vertices.
    PerVertexIn,
}

#[derive(Debug, Clone)]
pub struct EntryParam {
    pub decl: Decl,
    pub ty: TypeId,
    pub kind: ParamKind,
}

impl EntryParam {
    pub fn input(decl: Decl, ty: TypeId) -> Self {
        EntryParam {
            decl,
            ty,
            kind: ParamKind::In,
        }
    }

    pub fn output(decl: Decl, ty: TypeId) -> Self {
        EntryParam {
            decl,
            ty,
            kind: ParamKind::Out,
        }
    }

    pub fn per_vertex(decl: Decl, ty: TypeId) -> Self {
        EntryParam {
            decl,
            ty,
            kind: ParamKind::PerVertexIn,
        }
    }
}

/// An externally bound declaration.
#[derive(Debug, Clone)]
pub enum ResourceDecl {
    /// Texture, sampler, buffer, an array of those, or a plain global that
    /// ends up in `$Globals`.
    Extern { decl: Decl, ty: TypeId },
    /// `cbuffer`/`tbuffer` block with its member declarations.
    Buffer {
        decl: Decl,
        kind: CTBufferKind,
        members: Vec<(Decl, TypeId)>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryInput {
    Point,
    Line,
    Triangle,
    LineAdj,
    TriangleAdj,
}

impl GeometryInput {
    fn execution_mode(self) -> ExecutionMode {
        match self {
            GeometryInput::Point => ExecutionMode::InputPoints,
            GeometryInput::Line => ExecutionMode::InputLines,
            GeometryInput::Triangle => ExecutionMode::Triangles,
            GeometryInput::LineAdj => ExecutionMode::InputLinesAdjacency,
            GeometryInput::TriangleAdj => ExecutionMode::InputTrianglesAdjacency,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryOutput {
    PointStream,
    LineStream,
    TriangleStream,
}

impl GeometryOutput {
    fn execution_mode(self) -> ExecutionMode {
        match self {
            GeometryOutput::PointStream => ExecutionMode::OutputPoints,
            GeometryOutput::LineStream => ExecutionMode::OutputLineStrip,
            GeometryOutput::TriangleStream => ExecutionMode::OutputTriangleStrip,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeometryConfig {
    pub input: GeometryInput,
    pub output: GeometryOutput,
    pub max_vertex_count: u32,
}

/// Everything the backend needs to compile one entry point.
///
/// Types are handles into the [`Context`] passed to [`compile`].
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    pub stage: ShaderStage,
    pub model: ShaderModel,
    pub entry_name: String,
    pub params: Vec<EntryParam>,
    /// Return value declaration and type; `None` for `void`.
    pub ret: Option<(Decl, TypeId)>,
    pub resources: Vec<ResourceDecl>,
    pub options: EmitOptions,
    /// Tessellation domain of hull and domain shaders.
    pub domain: Option<TessDomain>,
    /// Control points written by a hull shader.
    pub output_control_points: Option<u32>,
    pub geometry: Option<GeometryConfig>,
    /// `numthreads` of a compute shader.
    pub local_size: [u32; 3],
    /// Lowered source entry function. A stand-in is generated when absent.
    pub source: Option<Function>,
}

impl ShaderProgram {
    pub fn new(stage: ShaderStage, entry_name: impl Into<String>) -> Self {
        ShaderProgram {
            stage,
            model: ShaderModel::default(),
            entry_name: entry_name.into(),
            params: Vec::new(),
            ret: None,
            resources: Vec::new(),
            options: EmitOptions::default(),
            domain: None,
            output_control_points: None,
            geometry: None,
            local_size: [1, 1, 1],
            source: None,
        }
    }
}

/// Result of a successful compilation.
#[derive(Debug, Clone)]
pub struct CompiledShader {
    pub words: Vec<u32>,
    pub interface: ShaderInterface,
}

// =============================================================================
// Pipeline
// =============================================================================

/// Compile one entry point to SPIR-V words.
///
/// All declaration problems are collected; if there were any, they are
/// returned together as [`CompilerError::Diagnostics`] and nothing is
/// emitted.
pub fn compile(ctx: &mut Context, program: &ShaderProgram) -> Result<CompiledShader> {
    check_signature(ctx, program)?;
    info!("compiling {} entry '{}'", program.stage, program.entry_name);
    if program.stage == ShaderStage::Hull {
        warn!(
            "hull entry '{}': patch constant outputs are not written, tessellation levels stay undefined",
            program.entry_name
        );
    }

    let mut module = Module::new();
    module.require_capability(Capability::Shader);
    if let Some(cap) = program.stage.capability() {
        module.require_capability(cap);
    }
    module.push(Instruction::MemoryModel {
        addressing: AddressingModel::Logical,
        memory: MemoryModel::GLSL450,
    });

    let source = match &program.source {
        Some(function) => function.clone(),
        None => placeholder_source_function(ctx, program),
    };

    let (wrapper, interface_ids, modes, interface, diagnostics) = {
        let mut mapper = DeclResultIdMapper::new(&mut *ctx, &mut module, program.options.clone(), program.model);
        if let Some(domain) = program.domain {
            mapper = mapper.with_tess_domain(domain);
        }

        for resource in &program.resources {
            match resource {
                ResourceDecl::Extern { decl, ty } => {
                    mapper.create_extern_var(decl, *ty);
                }
                ResourceDecl::Buffer { decl, kind, members } => {
                    mapper.create_ct_buffer(decl, *kind, members);
                }
            }
        }
        mapper.create_globals_cbuffer();

        let wrapper = build_wrapper(&mut mapper, program, &source);

        // Keep going after a failure so that one run reports every problem.
        let _ = mapper.finalize_stage_io_locations(true);
        let _ = mapper.finalize_stage_io_locations(false);
        let _ = mapper.decorate_resource_bindings();

        let modes = mapper.take_execution_modes();
        let interface_ids = mapper.interface_ids().to_vec();
        let interface = ShaderInterface::collect(&mut mapper, program);
        (wrapper, interface_ids, modes, interface, mapper.into_diagnostics())
    };

    if !diagnostics.is_empty() {
        debug!("{} diagnostic(s), nothing emitted", diagnostics.len());
        return Err(CompilerError::Diagnostics(diagnostics.into_vec()));
    }
    let wrapper = wrapper.unwrap_or_else(|_| panic!("BUG: wrapper failed without a diagnostic"));

    module.push(Instruction::EntryPoint {
        model: program.stage.execution_model(),
        function: wrapper.id,
        name: program.entry_name.clone(),
        interface: interface_ids,
    });
    for (mode, params) in stage_execution_modes(program).into_iter().chain(modes) {
        module.push(Instruction::ExecutionMode {
            function: wrapper.id,
            mode,
            params,
        });
    }
    module.add_function(wrapper);
    module.add_function(source);

    let version = program.options.target_env.spirv_version();
    let words = EmitVisitor::new(ctx, version).emit(&module);
    info!("emitted {} words", words.len());
    Ok(CompiledShader { words, interface })
}

fn check_signature(ctx: &Context, program: &ShaderProgram) -> Result<()> {
    let fail = |reason: &str| {
        Err(CompilerError::EntrySignature {
            entry: program.entry_name.clone(),
            reason: reason.to_string(),
        })
    };
    let stage = program.stage;
    let has_outputs = program.ret.is_some() || program.params.iter().any(|p| p.kind == ParamKind::Out);

    if has_outputs && stage.output_sig_point().is_none() {
        return fail("compute shaders have no stage outputs");
    }
    for param in &program.params {
        if param.kind != ParamKind::PerVertexIn {
            continue;
        }
        if !matches!(stage, ShaderStage::Hull | ShaderStage::Domain | ShaderStage::Geometry) {
            return fail("per-vertex parameters need a hull, domain or geometry shader");
        }
        if !matches!(ctx.ty(param.ty), Type::Array { .. }) {
            return fail("per-vertex parameters must be arrays");
        }
    }
    if matches!(stage, ShaderStage::Hull | ShaderStage::Domain) && program.domain.is_none() {
        return fail("tessellation stages need a domain");
    }
    if stage == ShaderStage::Hull && program.output_control_points.is_none() {
        return fail("hull shaders need an output control point count");
    }
    if stage == ShaderStage::Geometry && program.geometry.is_none() {
        return fail("geometry shaders need input and output primitive types");
    }
    Ok(())
}

/// Execution modes implied by the stage itself.
fn stage_execution_modes(program: &ShaderProgram) -> Vec<(ExecutionMode, Vec<u32>)> {
    match program.stage {
        ShaderStage::Pixel => vec![(ExecutionMode::OriginUpperLeft, vec![])],
        ShaderStage::Compute => vec![(ExecutionMode::LocalSize, program.local_size.to_vec())],
        ShaderStage::Hull => {
            let mut modes = Vec::new();
            if let Some(domain) = program.domain {
                modes.push((domain.execution_mode(), vec![]));
            }
            modes.push((ExecutionMode::SpacingEqual, vec![]));
            modes.push((ExecutionMode::VertexOrderCw, vec![]));
            if let Some(count) = program.output_control_points {
                modes.push((ExecutionMode::OutputVertices, vec![count]));
            }
            modes
        }
        ShaderStage::Domain => program
            .domain
            .map(|domain| vec![(domain.execution_mode(), vec![])])
            .unwrap_or_default(),
        ShaderStage::Geometry => match program.geometry {
            Some(geometry) => vec![
                (ExecutionMode::Invocations, vec![1]),
                (geometry.input.execution_mode(), vec![]),
                (geometry.output.execution_mode(), vec![]),
                (ExecutionMode::OutputVertices, vec![geometry.max_vertex_count]),
            ],
            None => Vec::new(),
        },
        ShaderStage::Vertex => Vec::new(),
    }
}

/// A source entry function that ignores its parameters and returns a null
/// value of its return type.
pub fn placeholder_source_function(ctx: &mut Context, program: &ShaderProgram) -> Function {
    let void = ctx.void_type();
    let ret = program.ret.as_ref().map(|(_, ty)| *ty).unwrap_or(void);
    let id = ctx.take_next_id();
    let mut function = Function::new(id, format!("src.{}", program.entry_name), ret.into());
    for param in &program.params {
        let ptr = ctx.pointer_type(param.ty, StorageClass::Function);
        function.parameters.push(FunctionParameter {
            id: ctx.take_next_id(),
            ty: ptr.into(),
        });
    }

    let mut block = BasicBlock::new(ctx.take_next_id());
    if ret == void {
        block.push(Instruction::Return);
    } else {
        let null = ctx.constant_null(ret);
        block.push(Instruction::ReturnValue(null));
    }
    function.blocks.push(block);
    function
}

// =============================================================================
// Wrapper
// =============================================================================

/// Signature point, element type and per-vertex array size of a parameter.
fn param_site(ctx: &Context, stage: ShaderStage, param: &EntryParam) -> (SigPointKind, TypeId, Option<u32>) {
    match param.kind {
        ParamKind::In => (stage.input_sig_point(false), param.ty, None),
        ParamKind::PerVertexIn => match ctx.ty(param.ty) {
            Type::Array { elem, length } => (stage.input_sig_point(true), *elem, Some(*length)),
            _ => unreachable!("BUG: per-vertex parameter without an array type"),
        },
        ParamKind::Out => {
            let sig_point = stage
                .output_sig_point()
                .unwrap_or_else(|| unreachable!("BUG: output parameter on a stage without outputs"));
            (sig_point, param.ty, None)
        }
    }
}

fn is_control_point_id(decl: &Decl) -> bool {
    decl.semantic
        .as_deref()
        .and_then(|s| s.parse::<Semantic>().ok())
        .is_some_and(|s| s.kind == SemanticKind::OutputControlPointID)
}

fn build_wrapper(
    mapper: &mut DeclResultIdMapper<'_>,
    program: &ShaderProgram,
    source: &Function,
) -> std::result::Result<Function, ErrorReported> {
    let stage = program.stage;
    let void = mapper.context().void_type();
    let wrapper_id = mapper.context().take_next_id();
    let mut wrapper = Function::new(wrapper_id, program.entry_name.as_str(), TypeRef::from(void));
    let label = mapper.context().take_next_id();
    let mut block = BasicBlock::new(label);
    let mut failed = false;

    let sites: Vec<(SigPointKind, TypeId, Option<u32>)> = program
        .params
        .iter()
        .map(|param| param_site(mapper.context(), stage, param))
        .collect();

    // The per-vertex aggregate must know all of its members before the first
    // one is accessed.
    for (param, &(sig_point, ty, _)) in program.params.iter().zip(&sites) {
        mapper.record_per_vertex_decl(sig_point, &param.decl, ty);
    }
    if let (Some((decl, ty)), Some(sig_point)) = (&program.ret, stage.output_sig_point()) {
        mapper.record_per_vertex_decl(sig_point, decl, *ty);
    }

    // Stage inputs.
    let mut inputs = vec![None; program.params.len()];
    let mut invocation_id = None;
    for (i, (param, &(sig_point, ty, array_size))) in program.params.iter().zip(&sites).enumerate() {
        if param.kind == ParamKind::Out {
            continue;
        }
        let mut site = StageVarSite::new(sig_point, &param.decl, ty);
        if let Some(count) = array_size {
            site = site.with_array_size(count);
        }
        match mapper.create_stage_vars(&site, None, &mut block) {
            Ok(Some(value)) => {
                if stage == ShaderStage::Hull && is_control_point_id(&param.decl) {
                    invocation_id = Some(value);
                }
                inputs[i] = Some(value);
            }
            _ => failed = true,
        }
    }

    if stage == ShaderStage::Hull && invocation_id.is_none() {
        let decl = Decl::new("gl_InvocationID").with_semantic("SV_OutputControlPointID");
        let uint = mapper.context().uint_type();
        let site = StageVarSite::new(SigPointKind::HSIn, &decl, uint);
        match mapper.create_stage_vars(&site, None, &mut block) {
            Ok(Some(value)) => invocation_id = Some(value),
            _ => failed = true,
        }
    }

    // Parameters are passed to the source function by pointer.
    let mut arguments = Vec::with_capacity(program.params.len());
    for (param, input) in program.params.iter().zip(&inputs) {
        let var = mapper.create_fn_var(&param.decl, param.ty, None, &mut block);
        if let Some(value) = input {
            block.push(Instruction::Store {
                pointer: var,
                value: *value,
            });
        }
        arguments.push(var);
    }

    let result = mapper.context().take_next_id();
    block.push(Instruction::FunctionCall {
        ty: source.return_type,
        id: result,
        function: source.id,
        arguments: arguments.clone(),
    });

    // Stage outputs.
    let mut outputs: Vec<(&Decl, TypeId, spirv::Word)> = Vec::new();
    if let Some((decl, ty)) = &program.ret {
        outputs.push((decl, *ty, result));
    }
    for (param, &var) in program.params.iter().zip(&arguments) {
        if param.kind != ParamKind::Out {
            continue;
        }
        let value = mapper.context().take_next_id();
        block.push(Instruction::Load {
            ty: param.ty.into(),
            id: value,
            pointer: var,
        });
        outputs.push((&param.decl, param.ty, value));
    }

    if let Some(sig_point) = stage.output_sig_point() {
        for (decl, ty, value) in outputs {
            let mut site = StageVarSite::new(sig_point, decl, ty);
            if sig_point.is_per_vertex_array() {
                let (Some(count), Some(invocation)) = (program.output_control_points, invocation_id) else {
                    failed = true;
                    continue;
                };
                site = site.with_array_size(count).with_invocation_id(invocation);
            }
            if mapper.create_stage_vars(&site, Some(value), &mut block).is_err() {
                failed = true;
            }
        }
    }

    block.push(Instruction::Return);
    wrapper.blocks.push(block);
    debug!("entry wrapper '{}' -> %{}", program.entry_name, wrapper_id);

    if failed { Err(ErrorReported) } else { Ok(wrapper) }
}
