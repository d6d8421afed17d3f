//! Shader interface report for JSON output.
//!
//! Lists the entry point, the stage variables with their final locations and
//! the resources with their descriptor bindings and buffer layouts.

use serde::{Deserialize, Serialize};

use crate::binding::ResourceCategory;
use crate::decl_mapper::{DeclResultIdMapper, ResourceVar, StageVar};
use crate::entry::ShaderProgram;
use crate::ir::{StructInterface, Type};
use crate::layout::{self, LayoutRule};
use crate::semantic::ShaderStage;

/// Format version of the report.
pub const INTERFACE_VERSION: &str = "0.1.0";

/// Complete shader interface description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShaderInterface {
    /// Interface format version.
    pub version: String,
    pub entry_point: EntryPointInfo,
    pub inputs: Vec<StageVarInfo>,
    pub outputs: Vec<StageVarInfo>,
    pub resources: Vec<ResourceInfo>,
}

/// Information about the entry point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryPointInfo {
    pub name: String,
    pub stage: ShaderStage,
    /// SPIR-V execution model.
    pub execution_model: String,
    /// Workgroup size for compute shaders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workgroup_size: Option<[u32; 3]>,
}

/// One stage input or output variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageVarInfo {
    /// Declaration the variable was created for.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic: Option<String>,
    /// Built-in decoration, or `PerVertex` for the per-vertex aggregate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builtin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<u32>,
    /// Dual-source blend index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    pub location_count: u32,
}

/// Information about a resource binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceInfo {
    pub name: String,
    pub category: ResourceCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<u32>,
    /// Owner of a hidden counter buffer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter_for: Option<String>,
    /// Layout rule of buffer blocks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutRule>,
    /// Fields of buffer blocks.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<BufferFieldInfo>,
}

/// Information about a field within a buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferFieldInfo {
    pub name: String,
    pub type_name: String,
    /// Byte offset within the buffer.
    pub offset: u32,
}

impl ShaderInterface {
    /// Build the report from a mapper whose locations and bindings have been
    /// finalized.
    pub fn collect(mapper: &mut DeclResultIdMapper<'_>, program: &ShaderProgram) -> Self {
        let stage_vars = mapper.stage_vars().to_vec();
        let resource_vars = mapper.resource_vars().to_vec();
        let ctx: &crate::Context = mapper.context();

        let (inputs, outputs): (Vec<&StageVar>, Vec<&StageVar>) = stage_vars.iter().partition(|var| var.is_input());
        let stage_var_info = |var: &StageVar| StageVarInfo {
            name: var.decl_name.clone(),
            semantic: var.semantic.as_ref().map(|s| s.text.clone()),
            builtin: if var.per_vertex {
                Some("PerVertex".to_string())
            } else {
                var.builtin.map(|b| format!("{:?}", b))
            },
            location: var.location,
            index: var.index,
            location_count: var.location_count,
        };

        let resources = resource_vars
            .iter()
            .map(|var| {
                let counter_for = var.counter_of.map(|owner| resource_vars[owner].decl_name.clone());
                let (layout, fields) = match ctx.ty(var.ty) {
                    Type::Struct(st) if st.interface != StructInterface::Internal => {
                        let placement = layout::place_struct_fields(ctx, st, var.rule);
                        let fields = st
                            .fields
                            .iter()
                            .zip(&placement.offsets)
                            .map(|(field, &offset)| BufferFieldInfo {
                                name: field.name.clone(),
                                type_name: ctx.type_name(field.ty),
                                offset,
                            })
                            .collect();
                        (Some(var.rule), fields)
                    }
                    _ => (None, Vec::new()),
                };
                resource_info(var, counter_for, layout, fields)
            })
            .collect();

        ShaderInterface {
            version: INTERFACE_VERSION.to_string(),
            entry_point: EntryPointInfo {
                name: program.entry_name.clone(),
                stage: program.stage,
                execution_model: format!("{:?}", program.stage.execution_model()),
                workgroup_size: (program.stage == ShaderStage::Compute).then_some(program.local_size),
            },
            inputs: inputs.into_iter().map(stage_var_info).collect(),
            outputs: outputs.into_iter().map(stage_var_info).collect(),
            resources,
        }
    }

    /// Serialize the interface to a pretty-printed JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn resource_info(
    var: &ResourceVar,
    counter_for: Option<String>,
    layout: Option<LayoutRule>,
    fields: Vec<BufferFieldInfo>,
) -> ResourceInfo {
    ResourceInfo {
        name: var.decl_name.clone(),
        category: var.category,
        set: var.assigned.map(|(set, _)| set),
        binding: var.assigned.map(|(_, binding)| binding),
        counter_for,
        layout,
        fields,
    }
}
