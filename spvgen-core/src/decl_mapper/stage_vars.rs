//! Stage input and output variables.
//!
//! Every leaf declaration with a semantic becomes either a member of the
//! per-vertex aggregate, a built-in variable, or an ordinary interface
//! variable. Struct-typed declarations without a semantic are split per
//! field; the struct value is rebuilt from (or scattered into) the per-field
//! variables inside the wrapper function's block.

use log::debug;
use rspirv::spirv::{self, BuiltIn, Capability, StorageClass};

use super::{DeclResultIdMapper, StageVar};
use crate::context::Context;
use crate::decl::Decl;
use crate::error::{Diagnostic, Direction, ErrorReported};
use crate::ir::{BasicBlock, Decoration, Instruction, StructField, StructInterface, Type, TypeId, TypeRef};
use crate::layout;
use crate::semantic::{self, PerVertexMember, Semantic, SigPointKind, StageVarRoute};

/// Where a stage declaration sits and how its variables are named.
#[derive(Debug, Clone, Copy)]
pub struct StageVarSite<'d> {
    pub sig_point: SigPointKind,
    pub decl: &'d Decl,
    /// Source type of one element (one control point or vertex).
    pub ty: TypeId,
    /// Control point or vertex count at per-vertex array signature points.
    pub array_size: Option<u32>,
    pub name_prefix: &'d str,
    /// Control point written by the current hull shader invocation.
    pub invocation_id: Option<spirv::Word>,
}

impl<'d> StageVarSite<'d> {
    pub fn new(sig_point: SigPointKind, decl: &'d Decl, ty: TypeId) -> Self {
        StageVarSite {
            sig_point,
            decl,
            ty,
            array_size: None,
            name_prefix: if sig_point.is_input() { "in.var." } else { "out.var." },
            invocation_id: None,
        }
    }

    pub fn with_array_size(mut self, array_size: u32) -> Self {
        self.array_size = Some(array_size);
        self
    }

    pub fn with_invocation_id(mut self, invocation_id: spirv::Word) -> Self {
        self.invocation_id = Some(invocation_id);
        self
    }

    pub fn with_name_prefix(mut self, prefix: &'d str) -> Self {
        self.name_prefix = prefix;
        self
    }

    fn field(&self, decl: &'d Decl, ty: TypeId) -> Self {
        StageVarSite { decl, ty, ..*self }
    }

    fn direction(&self) -> Direction {
        Direction::from_is_input(self.sig_point.is_input())
    }
}

/// Members of the per-vertex aggregate at one signature point.
///
/// Members are collected while declarations are recorded; the aggregate is
/// sealed when its variable is created and cannot grow afterwards.
#[derive(Debug, Default)]
pub(super) struct PerVertexBlock {
    members: Vec<PerVertexMember>,
    /// (semantic index, component count), sorted by semantic index.
    clip: Vec<(u32, u32)>,
    cull: Vec<(u32, u32)>,
    var: Option<spirv::Word>,
    /// The aggregate struct type.
    struct_ty: Option<TypeId>,
}

impl PerVertexBlock {
    fn distances(&self, member: PerVertexMember) -> &[(u32, u32)] {
        match member {
            PerVertexMember::ClipDistance => &self.clip,
            PerVertexMember::CullDistance => &self.cull,
            _ => &[],
        }
    }

    /// Add a member. Returns `false` if the block is sealed and does not
    /// already contain it.
    fn record(&mut self, member: PerVertexMember, semantic_index: u32, count: u32) -> bool {
        let sealed = self.var.is_some();
        let known_member = self.members.contains(&member);
        let distances = match member {
            PerVertexMember::ClipDistance => Some(&mut self.clip),
            PerVertexMember::CullDistance => Some(&mut self.cull),
            _ => None,
        };
        if let Some(distances) = distances {
            if !distances.iter().any(|(index, _)| *index == semantic_index) {
                if sealed {
                    return false;
                }
                distances.push((semantic_index, count));
                distances.sort_unstable();
            }
        }
        if !known_member {
            if sealed {
                return false;
            }
            self.members.push(member);
            self.members.sort_unstable();
        }
        true
    }

    fn member_index(&self, member: PerVertexMember) -> u32 {
        self.members.iter().position(|m| *m == member).unwrap_or(0) as u32
    }

    /// Offset of one clip/cull declaration inside the combined array.
    fn distance_offset(&self, member: PerVertexMember, semantic_index: u32) -> u32 {
        self.distances(member)
            .iter()
            .take_while(|(index, _)| *index < semantic_index)
            .map(|(_, count)| count)
            .sum()
    }

    fn distance_len(&self, member: PerVertexMember) -> u32 {
        self.distances(member).iter().map(|(_, count)| count).sum()
    }
}

/// How a built-in's wire value relates to the source value.
enum WireShape {
    Whole,
    /// float3 on the wire, float2 in the source.
    Truncate2,
    /// The first `count` elements of an array on the wire, accessed one by
    /// one. A scalar source stands for a single element.
    Elements {
        count: u32,
        elem: TypeId,
        scalar_source: bool,
    },
}

impl<'a> DeclResultIdMapper<'a> {
    // =========================================================================
    // Per-vertex recording
    // =========================================================================

    /// Note the per-vertex members a declaration (or its fields) will use, so
    /// that the aggregate is complete before any member is accessed.
    pub fn record_per_vertex_decl(&mut self, sig_point: SigPointKind, decl: &Decl, ty: TypeId) {
        if decl.semantic.is_none() && decl.builtin.is_none() {
            if let Type::Struct(st) = self.ctx.ty(ty) {
                let field_types: Vec<TypeId> = st.fields.iter().map(|f| f.ty).collect();
                for (field_decl, field_ty) in decl.fields.iter().zip(field_types) {
                    self.record_per_vertex_decl(sig_point, field_decl, field_ty);
                }
            }
            return;
        }

        let route = match &decl.builtin {
            Some(name) => semantic::classify_vk_builtin(name, sig_point),
            None => decl
                .semantic
                .as_deref()
                .and_then(|s| s.parse::<Semantic>().ok())
                .map(|s| semantic::classify(s.kind, sig_point, self.model)),
        };
        if let Some(StageVarRoute::PerVertex(member)) = route {
            let index = semantic_index(decl);
            let count = component_count(self.ctx.ty(ty));
            self.per_vertex.entry(sig_point).or_default().record(member, index, count);
        }
    }

    // =========================================================================
    // Stage variable creation
    // =========================================================================

    /// Create the stage variables for one entry parameter, return value or
    /// struct field.
    ///
    /// For inputs `value` is `None` and the loaded source value is returned.
    /// For outputs `value` is the source value to write and `None` is
    /// returned. Loads and stores are appended to `block`.
    pub fn create_stage_vars(
        &mut self,
        site: &StageVarSite<'_>,
        value: Option<spirv::Word>,
        block: &mut BasicBlock,
    ) -> Result<Option<spirv::Word>, ErrorReported> {
        let decl = site.decl;
        if decl.semantic.is_none() && decl.builtin.is_none() {
            return self.create_struct_stage_vars(site, value, block);
        }

        let semantic = match decl.semantic.as_deref().map(str::parse::<Semantic>).transpose() {
            Ok(semantic) => semantic,
            Err(what) => {
                return Err(self.report(Diagnostic::Unsupported {
                    decl: decl.name.clone(),
                    what,
                }));
            }
        };

        let route = self.route_for(site, semantic.as_ref())?;
        if let Some(semantic) = &semantic {
            self.check_duplicate_semantic(site, semantic)?;
        }
        debug!("stage var '{}' at {} -> {:?}", decl.name, site.sig_point, route);

        match route {
            StageVarRoute::PerVertex(member) => self.access_per_vertex(site, member, value, block),
            StageVarRoute::BuiltIn(builtin) => self.create_builtin_var(site, semantic, builtin, value, block),
            StageVarRoute::Interface => match semantic {
                Some(semantic) => self.create_interface_var(site, semantic, value, block),
                None => Err(self.report(Diagnostic::MissingSemantic {
                    decl: decl.name.clone(),
                    direction: site.direction(),
                })),
            },
            StageVarRoute::Invalid => unreachable!("BUG: invalid route survived classification"),
        }
    }

    fn route_for(
        &mut self,
        site: &StageVarSite<'_>,
        semantic: Option<&Semantic>,
    ) -> Result<StageVarRoute, ErrorReported> {
        let decl = site.decl;
        if let Some(name) = &decl.builtin {
            return match semantic::classify_vk_builtin(name, site.sig_point) {
                None => Err(self.report(Diagnostic::Unsupported {
                    decl: decl.name.clone(),
                    what: format!("built-in '{}'", name),
                })),
                Some(StageVarRoute::Invalid) => Err(self.report(Diagnostic::InvalidBuiltIn {
                    decl: decl.name.clone(),
                    builtin: name.clone(),
                    sig_point: site.sig_point.to_string(),
                })),
                Some(route) => Ok(route),
            };
        }

        let Some(semantic) = semantic else {
            return Err(self.report(Diagnostic::MissingSemantic {
                decl: decl.name.clone(),
                direction: site.direction(),
            }));
        };
        match semantic::classify(semantic.kind, site.sig_point, self.model) {
            StageVarRoute::Invalid => Err(self.report(Diagnostic::InvalidSemantic {
                decl: decl.name.clone(),
                semantic: semantic.text.clone(),
                sig_point: site.sig_point.to_string(),
            })),
            route => Ok(route),
        }
    }

    fn check_duplicate_semantic(&mut self, site: &StageVarSite<'_>, semantic: &Semantic) -> Result<(), ErrorReported> {
        let key = (site.direction(), semantic.text.to_ascii_uppercase());
        if self.seen_semantics.insert(key) {
            return Ok(());
        }
        Err(self.report(Diagnostic::DuplicateSemantic {
            decl: site.decl.name.clone(),
            direction: site.direction(),
            semantic: semantic.text.clone(),
        }))
    }

    fn create_struct_stage_vars(
        &mut self,
        site: &StageVarSite<'_>,
        value: Option<spirv::Word>,
        block: &mut BasicBlock,
    ) -> Result<Option<spirv::Word>, ErrorReported> {
        let decl = site.decl;
        let fields: Vec<TypeId> = match self.ctx.ty(site.ty) {
            Type::Struct(st) if st.fields.len() == decl.fields.len() => st.fields.iter().map(|f| f.ty).collect(),
            Type::Struct(_) => {
                return Err(self.report(Diagnostic::Unsupported {
                    decl: decl.name.clone(),
                    what: "struct stage variable without one declaration per field".to_string(),
                }));
            }
            _ => {
                return Err(self.report(Diagnostic::MissingSemantic {
                    decl: decl.name.clone(),
                    direction: site.direction(),
                }));
            }
        };

        let mut failed = false;
        if site.sig_point.is_input() {
            let mut parts = Vec::with_capacity(fields.len());
            for (field_decl, &field_ty) in decl.fields.iter().zip(&fields) {
                match self.create_stage_vars(&site.field(field_decl, field_ty), None, block) {
                    Ok(Some(part)) => parts.push(part),
                    _ => failed = true,
                }
            }
            if failed {
                return Err(ErrorReported);
            }

            let value = match site.array_size {
                None => self.construct(block, site.ty, parts),
                Some(count) => {
                    // Each part is an array over vertices; rebuild one struct
                    // per vertex.
                    let mut elements = Vec::with_capacity(count as usize);
                    for vertex in 0..count {
                        let members = fields
                            .iter()
                            .zip(&parts)
                            .map(|(&field_ty, &part)| self.extract(block, field_ty, part, vec![vertex]))
                            .collect();
                        elements.push(self.construct(block, site.ty, members));
                    }
                    let array_ty = self.ctx.array_type(site.ty, count);
                    self.construct(block, array_ty, elements)
                }
            };
            Ok(Some(value))
        } else {
            let value = value.unwrap_or_else(|| panic!("BUG: output '{}' has no value to write", decl.name));
            for (index, (field_decl, &field_ty)) in decl.fields.iter().zip(&fields).enumerate() {
                let part = self.extract(block, field_ty, value, vec![index as u32]);
                if self
                    .create_stage_vars(&site.field(field_decl, field_ty), Some(part), block)
                    .is_err()
                {
                    failed = true;
                }
            }
            if failed { Err(ErrorReported) } else { Ok(None) }
        }
    }

    // =========================================================================
    // Ordinary interface variables
    // =========================================================================

    fn create_interface_var(
        &mut self,
        site: &StageVarSite<'_>,
        semantic: Semantic,
        value: Option<spirv::Word>,
        block: &mut BasicBlock,
    ) -> Result<Option<spirv::Word>, ErrorReported> {
        let decl = site.decl;
        if contains_bool(self.ctx.ty(site.ty), &*self.ctx) {
            return Err(self.report(Diagnostic::Unsupported {
                decl: decl.name.clone(),
                what: "bool stage variable".to_string(),
            }));
        }

        let storage = site.sig_point.storage_class();
        let wire = match site.array_size {
            Some(count) => self.ctx.array_type(site.ty, count),
            None => site.ty,
        };
        let name = format!("{}{}", site.name_prefix, semantic.text);
        let id = self.declare_variable(wire.into(), storage, &name);

        if site.sig_point.is_patch() {
            self.module.decorate(id, Decoration::new(spirv::Decoration::Patch, vec![]));
        }
        if site.sig_point == SigPointKind::PSIn {
            self.decorate_interpolation(site, id);
        }

        self.interface_ids.push(id);
        let location_count = layout::location_count(self.ctx, site.ty);
        self.stage_vars.push(StageVar {
            decl_name: decl.name.clone(),
            sig_point: site.sig_point,
            semantic: Some(semantic),
            ty: site.ty,
            id,
            builtin: None,
            per_vertex: false,
            storage,
            explicit_location: decl.location,
            index: decl.index,
            location_count,
            location: None,
        });

        Ok(self.transfer_whole(site, wire, id, value, block))
    }

    fn decorate_interpolation(&mut self, site: &StageVarSite<'_>, id: spirv::Word) {
        let interpolation = site.decl.interpolation;
        if interpolation.nointerpolation || is_integer(self.ctx.ty(site.ty), &*self.ctx) {
            self.module.decorate(id, Decoration::new(spirv::Decoration::Flat, vec![]));
        }
        if interpolation.noperspective {
            self.module
                .decorate(id, Decoration::new(spirv::Decoration::NoPerspective, vec![]));
        }
        if interpolation.centroid {
            self.module.decorate(id, Decoration::new(spirv::Decoration::Centroid, vec![]));
        }
        if interpolation.sample {
            self.module.decorate(id, Decoration::new(spirv::Decoration::Sample, vec![]));
            self.module.require_capability(Capability::SampleRateShading);
        }
    }

    /// Load the whole variable, or store the whole value (into the current
    /// control point for per-vertex array outputs).
    fn transfer_whole(
        &mut self,
        site: &StageVarSite<'_>,
        wire: TypeId,
        var: spirv::Word,
        value: Option<spirv::Word>,
        block: &mut BasicBlock,
    ) -> Option<spirv::Word> {
        let Some(value) = value else {
            return Some(self.load(block, wire, var));
        };
        match site.array_size {
            Some(_) => {
                let invocation = site
                    .invocation_id
                    .unwrap_or_else(|| panic!("BUG: per-vertex output '{}' without an invocation id", site.decl.name));
                let storage = site.sig_point.storage_class();
                let ptr = self.access_chain(block, site.ty, storage, var, vec![invocation]);
                self.store(block, ptr, value);
            }
            None => self.store(block, var, value),
        }
        None
    }

    // =========================================================================
    // Built-in variables
    // =========================================================================

    fn create_builtin_var(
        &mut self,
        site: &StageVarSite<'_>,
        semantic: Option<Semantic>,
        builtin: BuiltIn,
        value: Option<spirv::Word>,
        block: &mut BasicBlock,
    ) -> Result<Option<spirv::Word>, ErrorReported> {
        let decl = site.decl;
        if self
            .stage_vars
            .iter()
            .any(|var| var.sig_point == site.sig_point && var.builtin == Some(builtin))
        {
            return Err(self.report(Diagnostic::Unsupported {
                decl: decl.name.clone(),
                what: format!("second {:?} built-in at {}", builtin, site.sig_point),
            }));
        }

        let (wire, shape) = match builtin {
            BuiltIn::TessLevelOuter | BuiltIn::TessLevelInner => {
                let count = self.tess_factor_len(site, builtin)?;
                let float = self.ctx.float_type();
                let wire_len = if builtin == BuiltIn::TessLevelOuter { 4 } else { 2 };
                let scalar_source = matches!(self.ctx.ty(site.ty), Type::Float { .. });
                (
                    self.ctx.array_type(float, wire_len),
                    WireShape::Elements {
                        count: count.min(wire_len),
                        elem: float,
                        scalar_source,
                    },
                )
            }
            BuiltIn::TessCoord => match self.ctx.ty(site.ty) {
                Type::Vector { count: 2, .. } => (self.ctx.float_vec(3), WireShape::Truncate2),
                _ => (site.ty, WireShape::Whole),
            },
            BuiltIn::SampleMask => {
                let uint = self.ctx.uint_type();
                (
                    self.ctx.array_type(uint, 1),
                    WireShape::Elements {
                        count: 1,
                        elem: uint,
                        scalar_source: true,
                    },
                )
            }
            BuiltIn::ClipDistance | BuiltIn::CullDistance => {
                let count = component_count(self.ctx.ty(site.ty));
                let float = self.ctx.float_type();
                let scalar_source = matches!(self.ctx.ty(site.ty), Type::Float { .. });
                (
                    self.ctx.array_type(float, count),
                    WireShape::Elements {
                        count,
                        elem: float,
                        scalar_source,
                    },
                )
            }
            _ => (site.ty, WireShape::Whole),
        };

        let requirements = semantic::builtin_requirements(builtin, site.sig_point);
        for capability in requirements.capabilities {
            self.module.require_capability(capability);
        }
        for extension in requirements.extensions {
            self.module.require_extension(extension);
        }
        if let Some(sem) = &semantic {
            for mode in semantic::depth_execution_modes(sem.kind) {
                self.request_execution_mode(mode, vec![]);
            }
        }

        let storage = site.sig_point.storage_class();
        let id = self.declare_variable(wire.into(), storage, &format!("gl_{:?}", builtin));
        self.module.decorate(id, Decoration::builtin(builtin));
        self.interface_ids.push(id);
        self.stage_vars.push(StageVar {
            decl_name: decl.name.clone(),
            sig_point: site.sig_point,
            semantic,
            ty: wire,
            id,
            builtin: Some(builtin),
            per_vertex: false,
            storage,
            explicit_location: None,
            index: None,
            location_count: 0,
            location: None,
        });

        let value = match shape {
            WireShape::Whole => self.transfer_whole(&StageVarSite { array_size: None, ..*site }, wire, id, value, block),
            WireShape::Truncate2 => {
                // Input only.
                let full = self.load(block, wire, id);
                let shuffled = self.ctx.take_next_id();
                block.push(Instruction::VectorShuffle {
                    ty: site.ty.into(),
                    id: shuffled,
                    vector1: full,
                    vector2: full,
                    components: vec![0, 1],
                });
                Some(shuffled)
            }
            WireShape::Elements {
                count,
                elem,
                scalar_source,
            } => self.transfer_elements(site, id, count, elem, scalar_source, value, block),
        };
        Ok(value)
    }

    /// Move the first `count` elements between the source value and an array
    /// built-in, one access chain per element.
    #[allow(clippy::too_many_arguments)]
    fn transfer_elements(
        &mut self,
        site: &StageVarSite<'_>,
        var: spirv::Word,
        count: u32,
        elem: TypeId,
        scalar_source: bool,
        value: Option<spirv::Word>,
        block: &mut BasicBlock,
    ) -> Option<spirv::Word> {
        let storage = site.sig_point.storage_class();
        match value {
            None => {
                let mut elements = Vec::with_capacity(count as usize);
                for i in 0..count {
                    let index = self.ctx.constant_u32(i);
                    let ptr = self.access_chain(block, elem, storage, var, vec![index]);
                    elements.push(self.load(block, elem, ptr));
                }
                if scalar_source {
                    elements.first().copied()
                } else {
                    Some(self.construct(block, site.ty, elements))
                }
            }
            Some(value) => {
                for i in 0..count {
                    let part = if scalar_source { value } else { self.extract(block, elem, value, vec![i]) };
                    let index = self.ctx.constant_u32(i);
                    let ptr = self.access_chain(block, elem, storage, var, vec![index]);
                    self.store(block, ptr, part);
                }
                None
            }
        }
    }

    /// Source element count of a tess factor, checked against the domain.
    fn tess_factor_len(&mut self, site: &StageVarSite<'_>, builtin: BuiltIn) -> Result<u32, ErrorReported> {
        let decl = site.decl;
        let found = match self.ctx.ty(site.ty) {
            Type::Array { length, .. } => *length,
            Type::Float { .. } => 1,
            _ => {
                return Err(self.report(Diagnostic::Unsupported {
                    decl: decl.name.clone(),
                    what: "tessellation factor that is not a float or float array".to_string(),
                }));
            }
        };
        let outer = builtin == BuiltIn::TessLevelOuter;
        let semantic = if outer { "SV_TessFactor" } else { "SV_InsideTessFactor" };

        let Some(domain) = self.domain else {
            return Ok(found);
        };
        let expected = if outer { Some(domain.outer_factor_count()) } else { domain.inner_factor_count() };
        match expected {
            Some(expected) if expected == found => Ok(found),
            Some(expected) => Err(self.report(Diagnostic::TessFactorSize {
                decl: decl.name.clone(),
                semantic: semantic.to_string(),
                expected,
                found,
            })),
            None => Err(self.report(Diagnostic::Unsupported {
                decl: decl.name.clone(),
                what: format!("{} in an isoline domain", semantic),
            })),
        }
    }

    // =========================================================================
    // Per-vertex aggregate
    // =========================================================================

    fn access_per_vertex(
        &mut self,
        site: &StageVarSite<'_>,
        member: PerVertexMember,
        value: Option<spirv::Word>,
        block: &mut BasicBlock,
    ) -> Result<Option<spirv::Word>, ErrorReported> {
        let sig_point = site.sig_point;
        let semantic_index = semantic_index(site.decl);
        let count = component_count(self.ctx.ty(site.ty));
        if !self
            .per_vertex
            .entry(sig_point)
            .or_default()
            .record(member, semantic_index, count)
        {
            return Err(self.report(Diagnostic::Unsupported {
                decl: site.decl.name.clone(),
                what: "per-vertex member declared after the aggregate was created".to_string(),
            }));
        }

        let var = self.seal_per_vertex(site);
        let state = self.per_vertex.entry(sig_point).or_default();
        let member_index = state.member_index(member);
        let slots: Vec<u32> = match member {
            PerVertexMember::ClipDistance | PerVertexMember::CullDistance => {
                let offset = state.distance_offset(member, semantic_index);
                (offset..offset + count).collect()
            }
            _ => Vec::new(),
        };

        let storage = sig_point.storage_class();
        let float = self.ctx.float_type();
        let scalar_source = matches!(self.ctx.ty(site.ty), Type::Float { .. });
        let member_const = self.ctx.constant_u32(member_index);

        if sig_point.is_input() {
            let vertices: Vec<Option<u32>> = match site.array_size {
                Some(n) => (0..n).map(Some).collect(),
                None => vec![None],
            };
            let mut per_vertex_values = Vec::with_capacity(vertices.len());
            for vertex in vertices {
                let mut prefix: Vec<spirv::Word> = vertex.map(|v| self.ctx.constant_u32(v)).into_iter().collect();
                prefix.push(member_const);
                let loaded = if slots.is_empty() {
                    let ptr = self.access_chain(block, site.ty, storage, var, prefix);
                    self.load(block, site.ty, ptr)
                } else {
                    let mut parts = Vec::with_capacity(slots.len());
                    for &slot in &slots {
                        let mut indices = prefix.clone();
                        indices.push(self.ctx.constant_u32(slot));
                        let ptr = self.access_chain(block, float, storage, var, indices);
                        parts.push(self.load(block, float, ptr));
                    }
                    if scalar_source { parts[0] } else { self.construct(block, site.ty, parts) }
                };
                per_vertex_values.push(loaded);
            }
            let value = match site.array_size {
                Some(n) => {
                    let array_ty = self.ctx.array_type(site.ty, n);
                    self.construct(block, array_ty, per_vertex_values)
                }
                None => per_vertex_values[0],
            };
            Ok(Some(value))
        } else {
            let value = value.unwrap_or_else(|| panic!("BUG: output '{}' has no value to write", site.decl.name));
            let mut prefix = Vec::new();
            if site.array_size.is_some() {
                prefix.push(
                    site.invocation_id
                        .unwrap_or_else(|| panic!("BUG: per-vertex output '{}' without an invocation id", site.decl.name)),
                );
            }
            prefix.push(member_const);
            if slots.is_empty() {
                let ptr = self.access_chain(block, site.ty, storage, var, prefix);
                self.store(block, ptr, value);
            } else {
                for (component, &slot) in slots.iter().enumerate() {
                    let part = if scalar_source {
                        value
                    } else {
                        self.extract(block, float, value, vec![component as u32])
                    };
                    let mut indices = prefix.clone();
                    indices.push(self.ctx.constant_u32(slot));
                    let ptr = self.access_chain(block, float, storage, var, indices);
                    self.store(block, ptr, part);
                }
            }
            Ok(None)
        }
    }

    /// Create the aggregate variable for `site.sig_point` if it does not exist.
    fn seal_per_vertex(&mut self, site: &StageVarSite<'_>) -> spirv::Word {
        let sig_point = site.sig_point;
        let state = self.per_vertex.entry(sig_point).or_default();
        if let Some(var) = state.var {
            return var;
        }
        let members = state.members.clone();
        let clip_len = state.distance_len(PerVertexMember::ClipDistance);
        let cull_len = state.distance_len(PerVertexMember::CullDistance);

        let float = self.ctx.float_type();
        let float4 = self.ctx.float_vec(4);
        let mut fields = Vec::with_capacity(members.len());
        for &member in &members {
            let ty = match member {
                PerVertexMember::Position => float4,
                PerVertexMember::PointSize => float,
                PerVertexMember::ClipDistance => self.ctx.array_type(float, clip_len),
                PerVertexMember::CullDistance => self.ctx.array_type(float, cull_len),
            };
            fields.push(StructField::new(member.field_name(), ty).with_builtin(member.builtin()));
            match member {
                PerVertexMember::ClipDistance => self.module.require_capability(Capability::ClipDistance),
                PerVertexMember::CullDistance => self.module.require_capability(Capability::CullDistance),
                _ => {}
            }
        }
        let struct_ty = self.ctx.struct_type("type.gl_PerVertex", fields, StructInterface::PerVertex);
        let var_ty = match site.array_size {
            Some(n) => self.ctx.array_type(struct_ty, n),
            None => struct_ty,
        };

        let storage = sig_point.storage_class();
        let name = if sig_point.is_input() { "gl_PerVertexIn" } else { "gl_PerVertexOut" };
        let id = self.declare_variable(var_ty.into(), storage, name);
        self.interface_ids.push(id);
        self.stage_vars.push(StageVar {
            decl_name: name.to_string(),
            sig_point,
            semantic: None,
            ty: struct_ty,
            id,
            builtin: None,
            per_vertex: true,
            storage,
            explicit_location: None,
            index: None,
            location_count: 0,
            location: None,
        });
        debug!("per-vertex aggregate at {} -> %{} ({} members)", sig_point, id, members.len());

        let state = self.per_vertex.entry(sig_point).or_default();
        state.var = Some(id);
        state.struct_ty = Some(struct_ty);
        id
    }

    /// The per-vertex aggregate struct at `sig_point`, once sealed.
    pub fn per_vertex_type(&self, sig_point: SigPointKind) -> Option<TypeId> {
        self.per_vertex.get(&sig_point).and_then(|state| state.struct_ty)
    }

    // =========================================================================
    // Instruction helpers
    // =========================================================================

    fn load(&mut self, block: &mut BasicBlock, ty: TypeId, pointer: spirv::Word) -> spirv::Word {
        let id = self.ctx.take_next_id();
        block.push(Instruction::Load {
            ty: ty.into(),
            id,
            pointer,
        });
        id
    }

    fn store(&mut self, block: &mut BasicBlock, pointer: spirv::Word, value: spirv::Word) {
        block.push(Instruction::Store { pointer, value });
    }

    fn access_chain(
        &mut self,
        block: &mut BasicBlock,
        pointee: TypeId,
        storage: StorageClass,
        base: spirv::Word,
        indices: Vec<spirv::Word>,
    ) -> spirv::Word {
        let ptr = self.ctx.pointer_type(pointee, storage);
        let id = self.ctx.take_next_id();
        block.push(Instruction::AccessChain {
            ty: TypeRef::from(ptr),
            id,
            base,
            indices,
        });
        id
    }

    fn construct(&mut self, block: &mut BasicBlock, ty: TypeId, constituents: Vec<spirv::Word>) -> spirv::Word {
        let id = self.ctx.take_next_id();
        block.push(Instruction::CompositeConstruct {
            ty: ty.into(),
            id,
            constituents,
        });
        id
    }

    fn extract(&mut self, block: &mut BasicBlock, ty: TypeId, composite: spirv::Word, indices: Vec<u32>) -> spirv::Word {
        let id = self.ctx.take_next_id();
        block.push(Instruction::CompositeExtract {
            ty: ty.into(),
            id,
            composite,
            indices,
        });
        id
    }
}

fn semantic_index(decl: &Decl) -> u32 {
    decl.semantic
        .as_deref()
        .and_then(|s| s.parse::<Semantic>().ok())
        .map(|s| s.index)
        .unwrap_or(0)
}

/// Scalar components of a clip/cull distance or tess factor value.
fn component_count(ty: &Type) -> u32 {
    match ty {
        Type::Vector { count, .. } => *count,
        Type::Array { length, .. } => *length,
        _ => 1,
    }
}

fn is_integer(ty: &Type, ctx: &Context) -> bool {
    match ty {
        Type::Int { .. } => true,
        Type::Vector { elem, .. } | Type::Array { elem, .. } => is_integer(ctx.ty(*elem), ctx),
        Type::Matrix { column, .. } => is_integer(ctx.ty(*column), ctx),
        _ => false,
    }
}

fn contains_bool(ty: &Type, ctx: &Context) -> bool {
    match ty {
        Type::Bool => true,
        Type::Vector { elem, .. } | Type::Array { elem, .. } => contains_bool(ctx.ty(*elem), ctx),
        Type::Matrix { column, .. } => contains_bool(ctx.ty(*column), ctx),
        _ => false,
    }
}
