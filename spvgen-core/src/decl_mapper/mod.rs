//! Mapping of source declarations to SPIR-V variables.
//!
//! [`DeclResultIdMapper`] creates function-local, private, resource and stage
//! variables for declarations, remembers which result id backs each
//! declaration, and at the end of a compilation assigns interface locations
//! and descriptor bindings.

mod stage_vars;

#[cfg(test)]
mod stage_vars_tests;

use std::collections::{HashMap, HashSet};

use log::debug;
use rspirv::spirv::{self, BuiltIn, ExecutionMode, StorageClass};

use crate::binding::{BindingSet, LocationSet, ResourceCategory};
use crate::context::Context;
use crate::decl::{Decl, RegisterAssignment, RegisterClass, VkBinding};
use crate::error::{Diagnostic, Diagnostics, Direction, ErrorReported};
use crate::ir::{
    BasicBlock, Decoration, FunctionParameter, Instruction, Module, StructField, StructInterface, Type, TypeId,
    TypeRef,
};
use crate::layout::{LayoutRule, VEC4_ALIGNMENT};
use crate::options::{EmitOptions, StageIoOrder};
use crate::semantic::{Semantic, SemanticKind, ShaderModel, SigPointKind, TessDomain};

pub use stage_vars::StageVarSite;

use stage_vars::PerVertexBlock;

/// Where the value of a declaration lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeclSpirvInfo {
    pub id: spirv::Word,
    pub storage: StorageClass,
    pub rule: LayoutRule,
    /// Member index when the declaration aliases into an aggregate buffer.
    pub index: Option<u32>,
}

/// One stage input or output variable.
#[derive(Debug, Clone)]
pub struct StageVar {
    pub decl_name: String,
    pub sig_point: SigPointKind,
    pub semantic: Option<Semantic>,
    /// Type on the wire, without the per-vertex array.
    pub ty: TypeId,
    pub id: spirv::Word,
    pub builtin: Option<BuiltIn>,
    /// The shared per-vertex aggregate.
    pub per_vertex: bool,
    pub storage: StorageClass,
    pub explicit_location: Option<u32>,
    pub index: Option<u32>,
    pub location_count: u32,
    /// Filled in by [`DeclResultIdMapper::finalize_stage_io_locations`].
    pub location: Option<u32>,
}

impl StageVar {
    pub fn is_input(&self) -> bool {
        self.storage == StorageClass::Input
    }

    pub fn is_builtin(&self) -> bool {
        self.builtin.is_some() || self.per_vertex
    }

    fn is_render_target(&self) -> bool {
        self.sig_point == SigPointKind::PSOut
            && self.semantic.as_ref().is_some_and(|s| s.kind == SemanticKind::Target)
    }

    fn semantic_text(&self) -> &str {
        self.semantic.as_ref().map(|s| s.text.as_str()).unwrap_or("")
    }
}

/// One externally bound resource variable.
#[derive(Debug, Clone)]
pub struct ResourceVar {
    pub decl_name: String,
    pub id: spirv::Word,
    /// Variable type without the pointer, laid out under `rule`.
    pub ty: TypeId,
    pub rule: LayoutRule,
    pub category: ResourceCategory,
    pub binding: Option<VkBinding>,
    pub register: Option<RegisterAssignment>,
    pub counter_binding: Option<u32>,
    /// Hidden counter of the resource at this index.
    pub counter_of: Option<usize>,
    /// Element count of a resource array.
    pub array_size: Option<u32>,
    /// (set, binding) after [`DeclResultIdMapper::decorate_resource_bindings`].
    pub assigned: Option<(u32, u32)>,
}

impl ResourceVar {
    pub fn is_counter(&self) -> bool {
        self.counter_of.is_some()
    }
}

/// Buffer kind of a `cbuffer`/`tbuffer` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CTBufferKind {
    CBuffer,
    TBuffer,
}

pub struct DeclResultIdMapper<'a> {
    ctx: &'a mut Context,
    module: &'a mut Module,
    options: EmitOptions,
    model: ShaderModel,
    domain: Option<TessDomain>,
    diags: Diagnostics,
    stage_vars: Vec<StageVar>,
    resource_vars: Vec<ResourceVar>,
    decl_info: HashMap<String, DeclSpirvInfo>,
    per_vertex: HashMap<SigPointKind, PerVertexBlock>,
    seen_semantics: HashSet<(Direction, String)>,
    /// Non-resource globals collected into `$Globals`: (decl, type).
    globals: Vec<(Decl, TypeId)>,
    globals_id: Option<spirv::Word>,
    /// Variables referenced by the entry point.
    interface_ids: Vec<spirv::Word>,
    execution_modes: Vec<(ExecutionMode, Vec<u32>)>,
}

impl<'a> DeclResultIdMapper<'a> {
    pub fn new(ctx: &'a mut Context, module: &'a mut Module, options: EmitOptions, model: ShaderModel) -> Self {
        DeclResultIdMapper {
            ctx,
            module,
            options,
            model,
            domain: None,
            diags: Diagnostics::new(),
            stage_vars: Vec::new(),
            resource_vars: Vec::new(),
            decl_info: HashMap::new(),
            per_vertex: HashMap::new(),
            seen_semantics: HashSet::new(),
            globals: Vec::new(),
            globals_id: None,
            interface_ids: Vec::new(),
            execution_modes: Vec::new(),
        }
    }

    pub fn with_tess_domain(mut self, domain: TessDomain) -> Self {
        self.domain = Some(domain);
        self
    }

    pub fn context(&mut self) -> &mut Context {
        &mut *self.ctx
    }

    pub fn module(&mut self) -> &mut Module {
        &mut *self.module
    }

    pub fn stage_vars(&self) -> &[StageVar] {
        &self.stage_vars
    }

    pub fn resource_vars(&self) -> &[ResourceVar] {
        &self.resource_vars
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diags
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diags
    }

    pub fn decl_info(&self, name: &str) -> Option<&DeclSpirvInfo> {
        self.decl_info.get(name)
    }

    /// Variables the entry point must list in its interface.
    pub fn interface_ids(&self) -> &[spirv::Word] {
        &self.interface_ids
    }

    /// Execution modes requested by stage variables, without duplicates.
    pub fn take_execution_modes(&mut self) -> Vec<(ExecutionMode, Vec<u32>)> {
        std::mem::take(&mut self.execution_modes)
    }

    fn request_execution_mode(&mut self, mode: ExecutionMode, params: Vec<u32>) {
        if !self.execution_modes.iter().any(|(m, _)| *m == mode) {
            self.execution_modes.push((mode, params));
        }
    }

    fn report(&mut self, diagnostic: Diagnostic) -> ErrorReported {
        self.diags.report(diagnostic)
    }

    fn declare_variable(&mut self, ty: TypeRef, storage: StorageClass, name: &str) -> spirv::Word {
        let id = self.ctx.take_next_id();
        let ptr = self.ctx.pointer_type(ty.ty, storage);
        self.module.push(Instruction::Variable {
            ty: TypeRef::new(ptr, ty.rule),
            id,
            storage,
            initializer: None,
        });
        if !name.is_empty() {
            self.module.name(id, name);
        }
        id
    }

    // =========================================================================
    // Ordinary values
    // =========================================================================

    /// Parameter of a non-entry function, passed by pointer.
    pub fn create_fn_param(&mut self, decl: &Decl, ty: TypeId) -> FunctionParameter {
        let id = self.ctx.take_next_id();
        let ptr = self.ctx.pointer_type(ty, StorageClass::Function);
        self.module.name(id, decl.name.as_str());
        self.record_decl(decl, id, StorageClass::Function, LayoutRule::Void, None);
        FunctionParameter { id, ty: ptr.into() }
    }

    /// Function-local variable, declared at the top of `entry_block`.
    pub fn create_fn_var(
        &mut self,
        decl: &Decl,
        ty: TypeId,
        initializer: Option<spirv::Word>,
        entry_block: &mut BasicBlock,
    ) -> spirv::Word {
        let id = self.ctx.take_next_id();
        let ptr = self.ctx.pointer_type(ty, StorageClass::Function);
        let position = entry_block
            .instructions
            .iter()
            .take_while(|inst| matches!(inst, Instruction::Variable { .. }))
            .count();
        entry_block.instructions.insert(
            position,
            Instruction::Variable {
                ty: ptr.into(),
                id,
                storage: StorageClass::Function,
                initializer,
            },
        );
        self.module.name(id, decl.name.as_str());
        self.record_decl(decl, id, StorageClass::Function, LayoutRule::Void, None);
        id
    }

    /// Module-scope `static` variable.
    pub fn create_file_var(&mut self, decl: &Decl, ty: TypeId, initializer: Option<spirv::Word>) -> spirv::Word {
        let id = self.ctx.take_next_id();
        let ptr = self.ctx.pointer_type(ty, StorageClass::Private);
        self.module.push(Instruction::Variable {
            ty: ptr.into(),
            id,
            storage: StorageClass::Private,
            initializer,
        });
        self.module.name(id, decl.name.as_str());
        self.record_decl(decl, id, StorageClass::Private, LayoutRule::Void, None);
        id
    }

    fn record_decl(
        &mut self,
        decl: &Decl,
        id: spirv::Word,
        storage: StorageClass,
        rule: LayoutRule,
        index: Option<u32>,
    ) {
        self.decl_info.insert(
            decl.name.clone(),
            DeclSpirvInfo {
                id,
                storage,
                rule,
                index,
            },
        );
    }

    // =========================================================================
    // Resources
    // =========================================================================

    fn storage_buffer_class(&mut self) -> StorageClass {
        if !self.options.target_env.has_core_storage_buffer() {
            self.module.require_extension("SPV_KHR_storage_buffer_storage_class");
        }
        StorageClass::StorageBuffer
    }

    /// Externally visible declaration.
    ///
    /// Textures, samplers and buffers (and arrays of them) become resource
    /// variables; anything else becomes a member of the `$Globals` buffer and
    /// the id of that buffer is returned.
    pub fn create_extern_var(&mut self, decl: &Decl, ty: TypeId) -> spirv::Word {
        let (elem, array_size) = match self.ctx.ty(ty) {
            Type::Array { elem, length } => (*elem, Some(*length)),
            Type::RuntimeArray { elem } => (*elem, None),
            _ => (ty, None),
        };

        let resource = match self.ctx.ty(elem) {
            Type::Image(_) | Type::SampledImage { .. } => {
                Some((ResourceCategory::Image, StorageClass::UniformConstant, LayoutRule::Void, false))
            }
            Type::Sampler => Some((ResourceCategory::Sampler, StorageClass::UniformConstant, LayoutRule::Void, false)),
            Type::Struct(st) => match st.interface {
                StructInterface::StorageBuffer { has_counter, .. } => {
                    Some((ResourceCategory::Other, StorageClass::StorageBuffer, self.options.sbuffer_layout, has_counter))
                }
                StructInterface::UniformBuffer => {
                    Some((ResourceCategory::Other, StorageClass::Uniform, self.options.cbuffer_layout, false))
                }
                _ => None,
            },
            _ => None,
        };

        let Some((category, storage, rule, has_counter)) = resource else {
            return self.add_global(decl, ty);
        };
        let storage = if storage == StorageClass::StorageBuffer { self.storage_buffer_class() } else { storage };

        let id = self.declare_variable(TypeRef::new(ty, rule), storage, &decl.name);
        self.record_decl(decl, id, storage, rule, None);
        debug!("resource '{}' -> %{} ({:?}, {:?})", decl.name, id, category, storage);

        let owner = self.resource_vars.len();
        self.resource_vars.push(ResourceVar {
            decl_name: decl.name.clone(),
            id,
            ty,
            rule,
            category,
            binding: decl.binding,
            register: decl.register,
            counter_binding: None,
            counter_of: None,
            array_size,
            assigned: None,
        });

        if has_counter {
            self.create_counter_var(decl, owner);
        }
        id
    }

    /// Hidden `counter.var.<name>` buffer of an RW/append/consume buffer.
    fn create_counter_var(&mut self, decl: &Decl, owner: usize) {
        let int = self.ctx.int_type();
        let counter_ty = self.ctx.struct_type(
            "type.ACSBuffer.counter",
            vec![StructField::new("counter", int)],
            StructInterface::StorageBuffer {
                read_only: false,
                has_counter: false,
            },
        );
        let storage = self.storage_buffer_class();
        let rule = self.options.sbuffer_layout;
        let name = format!("counter.var.{}", decl.name);
        let id = self.declare_variable(TypeRef::new(counter_ty, rule), storage, &name);
        self.resource_vars.push(ResourceVar {
            decl_name: name,
            id,
            ty: counter_ty,
            rule,
            category: ResourceCategory::Other,
            binding: None,
            register: None,
            counter_binding: decl.counter_binding,
            counter_of: Some(owner),
            array_size: None,
            assigned: None,
        });
    }

    /// `cbuffer`/`tbuffer` block. Each member declaration aliases into the
    /// block through [`DeclSpirvInfo::index`].
    pub fn create_ct_buffer(&mut self, decl: &Decl, kind: CTBufferKind, members: &[(Decl, TypeId)]) -> spirv::Word {
        let (interface, storage, rule, prefix) = match kind {
            CTBufferKind::CBuffer => (
                StructInterface::UniformBuffer,
                StorageClass::Uniform,
                self.options.cbuffer_layout,
                "cbuffer",
            ),
            CTBufferKind::TBuffer => (
                StructInterface::StorageBuffer {
                    read_only: true,
                    has_counter: false,
                },
                self.storage_buffer_class(),
                self.options.sbuffer_layout,
                "tbuffer",
            ),
        };

        let fields = members.iter().map(|(member, ty)| buffer_field(member, *ty)).collect();
        let block_ty = self.ctx.struct_type(format!("type.{}.{}", prefix, decl.name), fields, interface);
        let id = self.declare_variable(TypeRef::new(block_ty, rule), storage, &decl.name);

        self.record_decl(decl, id, storage, rule, None);
        for (index, (member, _)) in members.iter().enumerate() {
            self.record_decl(member, id, storage, rule, Some(index as u32));
        }

        self.resource_vars.push(ResourceVar {
            decl_name: decl.name.clone(),
            id,
            ty: block_ty,
            rule,
            category: ResourceCategory::Other,
            binding: decl.binding,
            register: decl.register,
            counter_binding: None,
            counter_of: None,
            array_size: None,
            assigned: None,
        });
        id
    }

    fn add_global(&mut self, decl: &Decl, ty: TypeId) -> spirv::Word {
        let id = match self.globals_id {
            Some(id) => id,
            None => {
                let id = self.ctx.take_next_id();
                self.globals_id = Some(id);
                id
            }
        };
        let index = self.globals.len() as u32;
        self.globals.push((decl.clone(), ty));
        self.record_decl(decl, id, StorageClass::Uniform, self.options.cbuffer_layout, Some(index));
        id
    }

    /// Emit the `$Globals` buffer holding every non-resource extern
    /// declaration seen so far. Returns its id, or `None` if there were none.
    pub fn create_globals_cbuffer(&mut self) -> Option<spirv::Word> {
        let id = self.globals_id?;
        if self.resource_vars.iter().any(|var| var.id == id) {
            return Some(id);
        }

        let fields = self.globals.iter().map(|(decl, ty)| buffer_field(decl, *ty)).collect();
        let block_ty = self.ctx.struct_type("type.$Globals", fields, StructInterface::UniformBuffer);
        let rule = self.options.cbuffer_layout;
        let ptr = self.ctx.pointer_type(block_ty, StorageClass::Uniform);
        self.module.push(Instruction::Variable {
            ty: TypeRef::new(ptr, rule),
            id,
            storage: StorageClass::Uniform,
            initializer: None,
        });
        self.module.name(id, "$Globals");
        self.resource_vars.push(ResourceVar {
            decl_name: "$Globals".to_string(),
            id,
            ty: block_ty,
            rule,
            category: ResourceCategory::Other,
            binding: None,
            register: None,
            counter_binding: None,
            counter_of: None,
            array_size: None,
            assigned: None,
        });
        Some(id)
    }

    // =========================================================================
    // Binding assignment
    // =========================================================================

    fn binding_count(&self, var: &ResourceVar) -> u32 {
        match var.array_size {
            Some(n) if self.options.flatten_resource_arrays => n.max(1),
            _ => 1,
        }
    }

    /// Descriptor set a resource lands in, however its binding is chosen.
    fn resource_set(&self, var: &ResourceVar) -> u32 {
        if let Some(owner) = var.counter_of {
            return self.resource_set(&self.resource_vars[owner]);
        }
        if let Some(set) = var.binding.and_then(|b| b.set) {
            return set;
        }
        if var.binding.is_none() {
            if let Some(space) = var.register.and_then(|r| r.space) {
                return space;
            }
        }
        self.options.default_space()
    }

    /// Register number and per-class shift, for binding-relevant register
    /// classes.
    fn register_shift(&self, reg: &RegisterAssignment, set: u32) -> Option<(u32, u32)> {
        let (class, number) = reg.slot?;
        let shift = match class {
            RegisterClass::B => &self.options.b_shift,
            RegisterClass::T => &self.options.t_shift,
            RegisterClass::S => &self.options.s_shift,
            RegisterClass::U => &self.options.u_shift,
            RegisterClass::C => return None,
        };
        Some((number, shift.shift_for_set(set)))
    }

    /// Assign `DescriptorSet`/`Binding` to every resource variable.
    ///
    /// Explicit `vk::binding` (and explicit counter bindings) are claimed
    /// first, then legacy registers, then everything else takes the next free
    /// slot. A conflicting resource is reported and left undecorated; all
    /// remaining resources are still processed.
    pub fn decorate_resource_bindings(&mut self) -> Result<(), ErrorReported> {
        let mut bindings = BindingSet::new();
        let mut failed = false;
        let count = self.resource_vars.len();
        let mut decided: Vec<Option<(u32, u32)>> = vec![None; count];
        let mut handled = vec![false; count];

        // Explicit vk::binding and counter bindings.
        for i in 0..count {
            let var = &self.resource_vars[i];
            let set = self.resource_set(var);
            let explicit = if var.is_counter() {
                var.counter_binding
            } else {
                var.binding.map(|b| b.binding)
            };
            let Some(binding) = explicit else { continue };
            handled[i] = true;
            let (category, slots) = (var.category, self.binding_count(var));
            if self.claim(&mut bindings, i, set, binding, slots, category) {
                decided[i] = Some((set, binding));
            } else {
                failed = true;
            }
        }

        // Legacy register assignments.
        for i in 0..count {
            if handled[i] {
                continue;
            }
            let var = &self.resource_vars[i];
            let Some(reg) = var.register else { continue };
            let set = self.resource_set(var);
            let Some((number, shift)) = self.register_shift(&reg, set) else { continue };
            handled[i] = true;
            let Some(binding) = number.checked_add(shift) else {
                let decl = var.decl_name.clone();
                self.report(Diagnostic::BindingOutOfRange { decl, set, binding: number });
                failed = true;
                continue;
            };
            let (category, slots) = (var.category, self.binding_count(var));
            if self.claim(&mut bindings, i, set, binding, slots, category) {
                decided[i] = Some((set, binding));
            } else {
                failed = true;
            }
        }

        // Everything else, counters last so that they follow their owners.
        for pass_counters in [false, true] {
            for i in 0..count {
                let var = &self.resource_vars[i];
                if handled[i] || var.is_counter() != pass_counters {
                    continue;
                }
                let set = self.resource_set(var);
                match bindings.use_next_binding(set, self.binding_count(var), var.category) {
                    Some(binding) => decided[i] = Some((set, binding)),
                    None => {
                        let decl = var.decl_name.clone();
                        let binding = bindings.next_binding(set);
                        self.report(Diagnostic::BindingOutOfRange { decl, set, binding });
                        failed = true;
                    }
                }
            }
        }

        for (i, slot) in decided.into_iter().enumerate() {
            let Some((set, binding)) = slot else { continue };
            let id = self.resource_vars[i].id;
            self.module
                .decorate(id, Decoration::new(spirv::Decoration::DescriptorSet, vec![set]));
            self.module
                .decorate(id, Decoration::new(spirv::Decoration::Binding, vec![binding]));
            self.resource_vars[i].assigned = Some((set, binding));
            debug!("binding '{}' -> set {} binding {}", self.resource_vars[i].decl_name, set, binding);
        }

        if failed { Err(ErrorReported) } else { Ok(()) }
    }

    fn claim(
        &mut self,
        bindings: &mut BindingSet,
        var_index: usize,
        set: u32,
        binding: u32,
        slots: u32,
        category: ResourceCategory,
    ) -> bool {
        let Some(end) = binding.checked_add(slots) else {
            let decl = self.resource_vars[var_index].decl_name.clone();
            self.report(Diagnostic::BindingOutOfRange { decl, set, binding });
            return false;
        };
        let mut free = true;
        for b in binding..end {
            free &= bindings.use_binding(b, set, category);
        }
        if !free {
            let decl = self.resource_vars[var_index].decl_name.clone();
            self.report(Diagnostic::BindingConflict { decl, set, binding });
        }
        free
    }

    // =========================================================================
    // Location assignment
    // =========================================================================

    /// Assign `Location` decorations to the non-built-in stage variables of
    /// one direction.
    ///
    /// Either every variable carries an explicit location (each is checked
    /// for range and overlap), or none does and locations are handed out in
    /// declaration or alphabetical order. Render target outputs use their
    /// semantic index unless `render_target_locations` is off.
    pub fn finalize_stage_io_locations(&mut self, is_input: bool) -> Result<(), ErrorReported> {
        let direction = Direction::from_is_input(is_input);
        let vars: Vec<usize> = (0..self.stage_vars.len())
            .filter(|&i| {
                let var = &self.stage_vars[i];
                var.is_input() == is_input && !var.is_builtin()
            })
            .collect();
        if vars.is_empty() {
            return Ok(());
        }

        let mut locations = LocationSet::new();
        let mut failed = false;

        let render_targets = self.options.render_target_locations;
        let needs_auto =
            |var: &StageVar| var.explicit_location.is_none() && !(render_targets && var.is_render_target());
        let auto: Vec<usize> = vars.iter().copied().filter(|&i| needs_auto(&self.stage_vars[i])).collect();
        let explicit_count = vars
            .iter()
            .filter(|&&i| self.stage_vars[i].explicit_location.is_some())
            .count();

        if !auto.is_empty() && explicit_count > 0 {
            let first = vars
                .iter()
                .map(|&i| &self.stage_vars[i])
                .find(|var| var.explicit_location.is_some())
                .map(|var| var.decl_name.clone())
                .unwrap_or_default();
            self.report(Diagnostic::PartialExplicitLocation { decl: first, direction });
            return Err(ErrorReported);
        }

        // Explicit locations and render targets.
        for &i in &vars {
            if auto.contains(&i) {
                continue;
            }
            let var = &self.stage_vars[i];
            let location = match (var.explicit_location, var.semantic.as_ref()) {
                (Some(location), _) => location,
                (None, Some(semantic)) => semantic.index,
                (None, None) => continue,
            };
            let index = var.index.unwrap_or(0);
            let last = location.checked_add(var.location_count.max(1) - 1);
            let Some(last) = last.filter(|&last| LocationSet::is_valid(last)) else {
                let decl = var.decl_name.clone();
                self.report(Diagnostic::LocationOutOfRange {
                    decl,
                    direction,
                    location,
                });
                failed = true;
                continue;
            };
            if (location..=last).any(|l| locations.is_used(l, index)) {
                let decl = var.decl_name.clone();
                self.report(Diagnostic::LocationConflict {
                    decl,
                    direction,
                    location,
                });
                failed = true;
                continue;
            }
            for l in location..=last {
                locations.use_location(l, index);
            }
            self.assign_location(i, location);
        }

        // Automatic assignment.
        let mut auto = auto;
        if self.use_alphabetical_order(&auto) {
            auto.sort_by(|&a, &b| self.stage_vars[a].semantic_text().cmp(self.stage_vars[b].semantic_text()));
        }
        for i in auto {
            let location = locations.use_next_locs(self.stage_vars[i].location_count);
            let last = location.checked_add(self.stage_vars[i].location_count.max(1) - 1);
            if !last.is_some_and(LocationSet::is_valid) {
                let decl = self.stage_vars[i].decl_name.clone();
                self.report(Diagnostic::LocationOutOfRange {
                    decl,
                    direction,
                    location,
                });
                failed = true;
                continue;
            }
            self.assign_location(i, location);
        }

        if failed { Err(ErrorReported) } else { Ok(()) }
    }

    /// Hull shader outputs and domain shader inputs must agree between two
    /// separately compiled stages, so they are always sorted by semantic.
    fn use_alphabetical_order(&self, vars: &[usize]) -> bool {
        self.options.stage_io_order == StageIoOrder::Alphabetical
            || vars.iter().any(|&i| {
                matches!(
                    self.stage_vars[i].sig_point,
                    SigPointKind::HSCPOut | SigPointKind::PCOut | SigPointKind::DSIn | SigPointKind::DSCPIn
                )
            })
    }

    fn assign_location(&mut self, var_index: usize, location: u32) {
        let var = &mut self.stage_vars[var_index];
        var.location = Some(location);
        let (id, index) = (var.id, var.index);
        debug!("location '{}' -> {}", var.decl_name, location);
        self.module.decorate(id, Decoration::location(location));
        if let Some(index) = index {
            self.module
                .decorate(id, Decoration::new(spirv::Decoration::Index, vec![index]));
        }
    }
}

/// Field of a buffer block for a member declaration. A `c` register places
/// the member at that register's byte offset.
fn buffer_field(decl: &Decl, ty: TypeId) -> StructField {
    let field = StructField::new(decl.name.as_str(), ty);
    match decl.register.and_then(|r| r.slot) {
        Some((RegisterClass::C, n)) => field.with_offset(n * VEC4_ALIGNMENT),
        _ => field,
    }
}
