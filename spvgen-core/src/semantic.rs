//! Shader stages, signature points and semantic classification.
//!
//! A semantic string such as `SV_Position` or `TEXCOORD3` is split into a
//! [`SemanticKind`] and an index. [`classify`] then decides, for one
//! [`SigPointKind`], how a declaration with that semantic is lowered: as a
//! member of the per-vertex aggregate, as a dedicated built-in variable, as an
//! ordinary location-assigned variable, or not at all.

use std::fmt;
use std::str::FromStr;

use nom::{
    IResult,
    bytes::complete::{take_while, take_while1},
    character::complete::{digit1, one_of},
    combinator::{all_consuming, map_res, recognize},
    sequence::{pair, tuple},
};
use rspirv::spirv::{BuiltIn, Capability, ExecutionMode, ExecutionModel, StorageClass};
use serde::{Deserialize, Serialize};

// =============================================================================
// Stages and shader models
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShaderStage {
    Vertex,
    Hull,
    Domain,
    Geometry,
    Pixel,
    Compute,
}

impl ShaderStage {
    pub fn execution_model(self) -> ExecutionModel {
        match self {
            ShaderStage::Vertex => ExecutionModel::Vertex,
            ShaderStage::Hull => ExecutionModel::TessellationControl,
            ShaderStage::Domain => ExecutionModel::TessellationEvaluation,
            ShaderStage::Geometry => ExecutionModel::Geometry,
            ShaderStage::Pixel => ExecutionModel::Fragment,
            ShaderStage::Compute => ExecutionModel::GLCompute,
        }
    }

    /// Capability the stage itself needs beyond `Shader`.
    pub fn capability(self) -> Option<Capability> {
        match self {
            ShaderStage::Hull | ShaderStage::Domain => Some(Capability::Tessellation),
            ShaderStage::Geometry => Some(Capability::Geometry),
            _ => None,
        }
    }

    /// Signature point of an entry parameter. `per_vertex` marks a patch or
    /// vertex-array parameter.
    pub fn input_sig_point(self, per_vertex: bool) -> SigPointKind {
        match (self, per_vertex) {
            (ShaderStage::Vertex, _) => SigPointKind::VSIn,
            (ShaderStage::Hull, true) => SigPointKind::HSCPIn,
            (ShaderStage::Hull, false) => SigPointKind::HSIn,
            (ShaderStage::Domain, true) => SigPointKind::DSCPIn,
            (ShaderStage::Domain, false) => SigPointKind::DSIn,
            (ShaderStage::Geometry, true) => SigPointKind::GSVIn,
            (ShaderStage::Geometry, false) => SigPointKind::GSIn,
            (ShaderStage::Pixel, _) => SigPointKind::PSIn,
            (ShaderStage::Compute, _) => SigPointKind::CSIn,
        }
    }

    /// Signature point of the entry return value and `out` parameters.
    pub fn output_sig_point(self) -> Option<SigPointKind> {
        match self {
            ShaderStage::Vertex => Some(SigPointKind::VSOut),
            ShaderStage::Hull => Some(SigPointKind::HSCPOut),
            ShaderStage::Domain => Some(SigPointKind::DSOut),
            ShaderStage::Geometry => Some(SigPointKind::GSOut),
            ShaderStage::Pixel => Some(SigPointKind::PSOut),
            ShaderStage::Compute => None,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Hull => "hull",
            ShaderStage::Domain => "domain",
            ShaderStage::Geometry => "geometry",
            ShaderStage::Pixel => "pixel",
            ShaderStage::Compute => "compute",
        };
        write!(f, "{}", name)
    }
}

/// Source shader model, e.g. `6.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShaderModel {
    pub major: u32,
    pub minor: u32,
}

impl ShaderModel {
    pub const fn new(major: u32, minor: u32) -> Self {
        ShaderModel { major, minor }
    }
}

impl Default for ShaderModel {
    fn default() -> Self {
        ShaderModel::new(6, 0)
    }
}

fn parse_u32(input: &str) -> IResult<&str, u32> {
    map_res(digit1, str::parse::<u32>)(input)
}

// `6.1` or `6_1`
fn shader_model(input: &str) -> IResult<&str, ShaderModel> {
    let (rest, (major, _, minor)) = tuple((parse_u32, one_of("._"), parse_u32))(input)?;
    Ok((rest, ShaderModel::new(major, minor)))
}

impl FromStr for ShaderModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        all_consuming(shader_model)(s.trim())
            .map(|(_, model)| model)
            .map_err(|_| format!("invalid shader model '{}' (expected e.g. '6.0')", s))
    }
}

impl TryFrom<String> for ShaderModel {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ShaderModel> for String {
    fn from(model: ShaderModel) -> Self {
        model.to_string()
    }
}

impl fmt::Display for ShaderModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Tessellation domain of a hull/domain shader pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TessDomain {
    Tri,
    Quad,
    Isoline,
}

impl TessDomain {
    pub fn execution_mode(self) -> ExecutionMode {
        match self {
            TessDomain::Tri => ExecutionMode::Triangles,
            TessDomain::Quad => ExecutionMode::Quads,
            TessDomain::Isoline => ExecutionMode::Isolines,
        }
    }

    /// Source array length expected for `SV_TessFactor`.
    pub fn outer_factor_count(self) -> u32 {
        match self {
            TessDomain::Tri => 3,
            TessDomain::Quad => 4,
            TessDomain::Isoline => 2,
        }
    }

    /// Source length expected for `SV_InsideTessFactor`; tri uses a scalar.
    pub fn inner_factor_count(self) -> Option<u32> {
        match self {
            TessDomain::Tri => Some(1),
            TessDomain::Quad => Some(2),
            TessDomain::Isoline => None,
        }
    }
}

// =============================================================================
// Signature points
// =============================================================================

/// Which side of which stage a stage variable lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SigPointKind {
    VSIn,
    VSOut,
    /// Hull shader scalar inputs (control point id, primitive id).
    HSIn,
    HSCPIn,
    HSCPOut,
    /// Patch constant function outputs.
    PCOut,
    /// Domain shader patch constant and domain location inputs.
    DSIn,
    DSCPIn,
    DSOut,
    GSVIn,
    /// Geometry shader scalar inputs (primitive id, instance id).
    GSIn,
    GSOut,
    PSIn,
    PSOut,
    CSIn,
}

impl SigPointKind {
    pub fn is_input(self) -> bool {
        matches!(
            self,
            SigPointKind::VSIn
                | SigPointKind::HSIn
                | SigPointKind::HSCPIn
                | SigPointKind::DSIn
                | SigPointKind::DSCPIn
                | SigPointKind::GSVIn
                | SigPointKind::GSIn
                | SigPointKind::PSIn
                | SigPointKind::CSIn
        )
    }

    pub fn storage_class(self) -> StorageClass {
        if self.is_input() { StorageClass::Input } else { StorageClass::Output }
    }

    /// Variables at this point are arrays over control points or vertices.
    pub fn is_per_vertex_array(self) -> bool {
        matches!(
            self,
            SigPointKind::HSCPIn | SigPointKind::HSCPOut | SigPointKind::DSCPIn | SigPointKind::GSVIn
        )
    }

    /// Variables at this point carry the `Patch` decoration.
    pub fn is_patch(self) -> bool {
        matches!(self, SigPointKind::PCOut | SigPointKind::DSIn)
    }

    pub fn stage(self) -> ShaderStage {
        match self {
            SigPointKind::VSIn | SigPointKind::VSOut => ShaderStage::Vertex,
            SigPointKind::HSIn | SigPointKind::HSCPIn | SigPointKind::HSCPOut | SigPointKind::PCOut => {
                ShaderStage::Hull
            }
            SigPointKind::DSIn | SigPointKind::DSCPIn | SigPointKind::DSOut => ShaderStage::Domain,
            SigPointKind::GSVIn | SigPointKind::GSIn | SigPointKind::GSOut => ShaderStage::Geometry,
            SigPointKind::PSIn | SigPointKind::PSOut => ShaderStage::Pixel,
            SigPointKind::CSIn => ShaderStage::Compute,
        }
    }
}

impl fmt::Display for SigPointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// =============================================================================
// Semantics
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticKind {
    Arbitrary,
    Position,
    ClipDistance,
    CullDistance,
    VertexID,
    InstanceID,
    PrimitiveID,
    IsFrontFace,
    SampleIndex,
    Coverage,
    InnerCoverage,
    Depth,
    DepthGreaterEqual,
    DepthLessEqual,
    StencilRef,
    Target,
    DispatchThreadID,
    GroupID,
    GroupThreadID,
    GroupIndex,
    TessFactor,
    InsideTessFactor,
    DomainLocation,
    OutputControlPointID,
    GSInstanceID,
    RenderTargetArrayIndex,
    ViewportArrayIndex,
    ViewID,
    Barycentrics,
}

impl SemanticKind {
    /// Kind of an `SV_` semantic base name, compared case-insensitively.
    fn from_system_name(name: &str) -> Option<SemanticKind> {
        const TABLE: &[(&str, SemanticKind)] = &[
            ("SV_POSITION", SemanticKind::Position),
            ("SV_CLIPDISTANCE", SemanticKind::ClipDistance),
            ("SV_CULLDISTANCE", SemanticKind::CullDistance),
            ("SV_VERTEXID", SemanticKind::VertexID),
            ("SV_INSTANCEID", SemanticKind::InstanceID),
            ("SV_PRIMITIVEID", SemanticKind::PrimitiveID),
            ("SV_ISFRONTFACE", SemanticKind::IsFrontFace),
            ("SV_SAMPLEINDEX", SemanticKind::SampleIndex),
            ("SV_COVERAGE", SemanticKind::Coverage),
            ("SV_INNERCOVERAGE", SemanticKind::InnerCoverage),
            ("SV_DEPTH", SemanticKind::Depth),
            ("SV_DEPTHGREATEREQUAL", SemanticKind::DepthGreaterEqual),
            ("SV_DEPTHLESSEQUAL", SemanticKind::DepthLessEqual),
            ("SV_STENCILREF", SemanticKind::StencilRef),
            ("SV_TARGET", SemanticKind::Target),
            ("SV_DISPATCHTHREADID", SemanticKind::DispatchThreadID),
            ("SV_GROUPID", SemanticKind::GroupID),
            ("SV_GROUPTHREADID", SemanticKind::GroupThreadID),
            ("SV_GROUPINDEX", SemanticKind::GroupIndex),
            ("SV_TESSFACTOR", SemanticKind::TessFactor),
            ("SV_INSIDETESSFACTOR", SemanticKind::InsideTessFactor),
            ("SV_DOMAINLOCATION", SemanticKind::DomainLocation),
            ("SV_OUTPUTCONTROLPOINTID", SemanticKind::OutputControlPointID),
            ("SV_GSINSTANCEID", SemanticKind::GSInstanceID),
            ("SV_RENDERTARGETARRAYINDEX", SemanticKind::RenderTargetArrayIndex),
            ("SV_VIEWPORTARRAYINDEX", SemanticKind::ViewportArrayIndex),
            ("SV_VIEWID", SemanticKind::ViewID),
            ("SV_BARYCENTRICS", SemanticKind::Barycentrics),
        ];
        let upper = name.to_ascii_uppercase();
        TABLE.iter().find(|(n, _)| *n == upper).map(|(_, kind)| *kind)
    }
}

/// A parsed semantic string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Semantic {
    /// The semantic as written, e.g. `TEXCOORD3`.
    pub text: String,
    /// Name without the trailing index, e.g. `TEXCOORD`.
    pub base: String,
    pub index: u32,
    pub kind: SemanticKind,
}

impl Semantic {
    pub fn is_system_value(&self) -> bool {
        self.base.len() >= 3 && self.base[..3].eq_ignore_ascii_case("SV_")
    }
}

fn semantic_identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

impl FromStr for Semantic {
    type Err = String;

    /// Parse a semantic. Unknown `SV_` names are rejected; every other name
    /// is an arbitrary user semantic.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (_, text) = all_consuming(semantic_identifier)(s.trim())
            .map_err(|_: nom::Err<nom::error::Error<&str>>| format!("malformed semantic '{}'", s))?;
        let base = text.trim_end_matches(|c: char| c.is_ascii_digit());
        let index = match &text[base.len()..] {
            "" => 0,
            digits => digits
                .parse::<u32>()
                .map_err(|_| format!("semantic index out of range in '{}'", s))?,
        };
        let kind = if base.len() >= 3 && base[..3].eq_ignore_ascii_case("SV_") {
            SemanticKind::from_system_name(base).ok_or_else(|| format!("unknown system value semantic '{}'", s))?
        } else {
            SemanticKind::Arbitrary
        };
        Ok(Semantic {
            text: text.to_string(),
            base: base.to_string(),
            index,
            kind,
        })
    }
}

// =============================================================================
// Classification
// =============================================================================

/// Members of the per-vertex aggregate, in member order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PerVertexMember {
    Position,
    PointSize,
    ClipDistance,
    CullDistance,
}

impl PerVertexMember {
    pub const ALL: [PerVertexMember; 4] = [
        PerVertexMember::Position,
        PerVertexMember::PointSize,
        PerVertexMember::ClipDistance,
        PerVertexMember::CullDistance,
    ];

    pub fn builtin(self) -> BuiltIn {
        match self {
            PerVertexMember::Position => BuiltIn::Position,
            PerVertexMember::PointSize => BuiltIn::PointSize,
            PerVertexMember::ClipDistance => BuiltIn::ClipDistance,
            PerVertexMember::CullDistance => BuiltIn::CullDistance,
        }
    }

    pub fn field_name(self) -> &'static str {
        match self {
            PerVertexMember::Position => "gl_Position",
            PerVertexMember::PointSize => "gl_PointSize",
            PerVertexMember::ClipDistance => "gl_ClipDistance",
            PerVertexMember::CullDistance => "gl_CullDistance",
        }
    }
}

/// How a stage variable is lowered at one signature point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageVarRoute {
    /// The semantic is not allowed here.
    Invalid,
    /// Member of the shared per-vertex aggregate.
    PerVertex(PerVertexMember),
    /// Dedicated variable decorated with a built-in.
    BuiltIn(BuiltIn),
    /// Ordinary variable with a location.
    Interface,
}

const SHADER_MODEL_6_1: ShaderModel = ShaderModel::new(6, 1);

/// Decide how a declaration with semantic `kind` is lowered at `sig_point`.
pub fn classify(kind: SemanticKind, sig_point: SigPointKind, model: ShaderModel) -> StageVarRoute {
    use SemanticKind as K;
    use SigPointKind as P;
    use StageVarRoute as R;

    let vertex_pipeline = matches!(
        sig_point,
        P::VSOut | P::HSCPIn | P::HSCPOut | P::DSCPIn | P::DSOut | P::GSVIn | P::GSOut
    );

    match kind {
        K::Arbitrary => match sig_point {
            P::CSIn => R::Invalid,
            _ => R::Interface,
        },
        K::Position => match sig_point {
            P::VSIn => R::Interface,
            P::PSIn => R::BuiltIn(BuiltIn::FragCoord),
            _ if vertex_pipeline => R::PerVertex(PerVertexMember::Position),
            _ => R::Invalid,
        },
        K::ClipDistance | K::CullDistance => {
            let member = if kind == K::ClipDistance {
                PerVertexMember::ClipDistance
            } else {
                PerVertexMember::CullDistance
            };
            match sig_point {
                P::PSIn => R::BuiltIn(member.builtin()),
                _ if vertex_pipeline => R::PerVertex(member),
                _ => R::Invalid,
            }
        }
        K::VertexID => match sig_point {
            P::VSIn => R::BuiltIn(BuiltIn::VertexIndex),
            _ => R::Invalid,
        },
        K::InstanceID => match sig_point {
            P::VSIn => R::BuiltIn(BuiltIn::InstanceIndex),
            P::PSIn => R::Interface,
            _ if vertex_pipeline => R::Interface,
            _ => R::Invalid,
        },
        K::PrimitiveID => match sig_point {
            P::HSIn | P::DSIn | P::GSIn | P::GSOut | P::PSIn => R::BuiltIn(BuiltIn::PrimitiveId),
            _ => R::Invalid,
        },
        K::IsFrontFace => match sig_point {
            P::PSIn => R::BuiltIn(BuiltIn::FrontFacing),
            _ => R::Invalid,
        },
        K::SampleIndex => match sig_point {
            P::PSIn => R::BuiltIn(BuiltIn::SampleId),
            _ => R::Invalid,
        },
        K::Coverage => match sig_point {
            P::PSIn | P::PSOut => R::BuiltIn(BuiltIn::SampleMask),
            _ => R::Invalid,
        },
        K::InnerCoverage => match sig_point {
            P::PSIn => R::BuiltIn(BuiltIn::FullyCoveredEXT),
            _ => R::Invalid,
        },
        K::Depth | K::DepthGreaterEqual | K::DepthLessEqual => match sig_point {
            P::PSOut => R::BuiltIn(BuiltIn::FragDepth),
            _ => R::Invalid,
        },
        K::StencilRef => match sig_point {
            P::PSOut => R::BuiltIn(BuiltIn::FragStencilRefEXT),
            _ => R::Invalid,
        },
        K::Target => match sig_point {
            P::PSOut => R::Interface,
            _ => R::Invalid,
        },
        K::DispatchThreadID => compute_only(sig_point, BuiltIn::GlobalInvocationId),
        K::GroupID => compute_only(sig_point, BuiltIn::WorkgroupId),
        K::GroupThreadID => compute_only(sig_point, BuiltIn::LocalInvocationId),
        K::GroupIndex => compute_only(sig_point, BuiltIn::LocalInvocationIndex),
        K::TessFactor => match sig_point {
            P::PCOut | P::DSIn => R::BuiltIn(BuiltIn::TessLevelOuter),
            _ => R::Invalid,
        },
        K::InsideTessFactor => match sig_point {
            P::PCOut | P::DSIn => R::BuiltIn(BuiltIn::TessLevelInner),
            _ => R::Invalid,
        },
        K::DomainLocation => match sig_point {
            P::DSIn => R::BuiltIn(BuiltIn::TessCoord),
            _ => R::Invalid,
        },
        K::OutputControlPointID => match sig_point {
            P::HSIn => R::BuiltIn(BuiltIn::InvocationId),
            _ => R::Invalid,
        },
        K::GSInstanceID => match sig_point {
            P::GSIn => R::BuiltIn(BuiltIn::InvocationId),
            _ => R::Invalid,
        },
        K::RenderTargetArrayIndex | K::ViewportArrayIndex => {
            let builtin = if kind == K::RenderTargetArrayIndex {
                BuiltIn::Layer
            } else {
                BuiltIn::ViewportIndex
            };
            match sig_point {
                P::VSOut | P::DSOut | P::GSOut | P::PSIn => R::BuiltIn(builtin),
                P::HSCPIn | P::HSCPOut | P::DSCPIn | P::GSVIn => R::Interface,
                _ => R::Invalid,
            }
        }
        K::ViewID => match sig_point {
            _ if model < SHADER_MODEL_6_1 => R::Invalid,
            P::VSIn | P::HSIn | P::DSIn | P::GSIn | P::PSIn => R::BuiltIn(BuiltIn::ViewIndex),
            _ => R::Invalid,
        },
        K::Barycentrics => match sig_point {
            _ if model < SHADER_MODEL_6_1 => R::Invalid,
            P::PSIn => R::BuiltIn(BuiltIn::BaryCoordNoPerspAMD),
            _ => R::Invalid,
        },
    }
}

fn compute_only(sig_point: SigPointKind, builtin: BuiltIn) -> StageVarRoute {
    if sig_point == SigPointKind::CSIn {
        StageVarRoute::BuiltIn(builtin)
    } else {
        StageVarRoute::Invalid
    }
}

/// Route for an explicit `vk::builtin("...")` override.
///
/// Returns `None` for a name that is not a supported built-in.
pub fn classify_vk_builtin(name: &str, sig_point: SigPointKind) -> Option<StageVarRoute> {
    use SigPointKind as P;

    let route = match name {
        "PointSize" => match sig_point {
            P::VSOut | P::HSCPIn | P::HSCPOut | P::DSCPIn | P::DSOut | P::GSVIn | P::GSOut => {
                StageVarRoute::PerVertex(PerVertexMember::PointSize)
            }
            _ => StageVarRoute::Invalid,
        },
        "HelperInvocation" => match sig_point {
            P::PSIn => StageVarRoute::BuiltIn(BuiltIn::HelperInvocation),
            _ => StageVarRoute::Invalid,
        },
        "BaseVertex" | "BaseInstance" | "DrawIndex" => match sig_point {
            P::VSIn => StageVarRoute::BuiltIn(match name {
                "BaseVertex" => BuiltIn::BaseVertex,
                "BaseInstance" => BuiltIn::BaseInstance,
                _ => BuiltIn::DrawIndex,
            }),
            _ => StageVarRoute::Invalid,
        },
        "DeviceIndex" => match sig_point {
            P::CSIn | P::VSIn | P::HSIn | P::DSIn | P::GSIn | P::PSIn => StageVarRoute::BuiltIn(BuiltIn::DeviceIndex),
            _ => StageVarRoute::Invalid,
        },
        _ => return None,
    };
    Some(route)
}

// =============================================================================
// Built-in requirements
// =============================================================================

/// Capabilities and extensions a built-in pulls into the module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuiltInRequirements {
    pub capabilities: Vec<Capability>,
    pub extensions: Vec<&'static str>,
}

pub fn builtin_requirements(builtin: BuiltIn, sig_point: SigPointKind) -> BuiltInRequirements {
    let mut req = BuiltInRequirements::default();
    match builtin {
        BuiltIn::ClipDistance => req.capabilities.push(Capability::ClipDistance),
        BuiltIn::CullDistance => req.capabilities.push(Capability::CullDistance),
        BuiltIn::SampleId => req.capabilities.push(Capability::SampleRateShading),
        BuiltIn::Layer | BuiltIn::ViewportIndex => match sig_point {
            SigPointKind::VSOut | SigPointKind::DSOut => {
                req.capabilities.push(Capability::ShaderViewportIndexLayerEXT);
                req.extensions.push("SPV_EXT_shader_viewport_index_layer");
            }
            SigPointKind::PSIn if builtin == BuiltIn::Layer => req.capabilities.push(Capability::Geometry),
            _ if builtin == BuiltIn::ViewportIndex => req.capabilities.push(Capability::MultiViewport),
            _ => {}
        },
        BuiltIn::FragStencilRefEXT => {
            req.capabilities.push(Capability::StencilExportEXT);
            req.extensions.push("SPV_EXT_shader_stencil_export");
        }
        BuiltIn::FullyCoveredEXT => {
            req.capabilities.push(Capability::FragmentFullyCoveredEXT);
            req.extensions.push("SPV_EXT_fragment_fully_covered");
        }
        BuiltIn::ViewIndex => {
            req.capabilities.push(Capability::MultiView);
            req.extensions.push("SPV_KHR_multiview");
        }
        BuiltIn::BaseVertex | BuiltIn::BaseInstance | BuiltIn::DrawIndex => {
            req.capabilities.push(Capability::DrawParameters);
            req.extensions.push("SPV_KHR_shader_draw_parameters");
        }
        BuiltIn::DeviceIndex => {
            req.capabilities.push(Capability::DeviceGroup);
            req.extensions.push("SPV_KHR_device_group");
        }
        BuiltIn::BaryCoordNoPerspAMD => req.extensions.push("SPV_AMD_shader_explicit_vertex_parameter"),
        _ => {}
    }
    req
}

/// Execution modes implied by writing a depth semantic. Every depth write
/// needs `DepthReplacing`; the conditional forms add their comparison.
pub fn depth_execution_modes(kind: SemanticKind) -> Vec<ExecutionMode> {
    match kind {
        SemanticKind::Depth => vec![ExecutionMode::DepthReplacing],
        SemanticKind::DepthGreaterEqual => vec![ExecutionMode::DepthReplacing, ExecutionMode::DepthGreater],
        SemanticKind::DepthLessEqual => vec![ExecutionMode::DepthReplacing, ExecutionMode::DepthLess],
        _ => Vec::new(),
    }
}
