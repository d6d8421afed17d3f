//! Backend configuration.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::layout::LayoutRule;

/// Target environment; decides the SPIR-V version in the module header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TargetEnv {
    #[default]
    #[serde(rename = "vulkan1.0")]
    Vulkan1_0,
    #[serde(rename = "vulkan1.1")]
    Vulkan1_1,
    #[serde(rename = "vulkan1.2")]
    Vulkan1_2,
}

impl TargetEnv {
    /// (major, minor) SPIR-V version.
    pub fn spirv_version(self) -> (u8, u8) {
        match self {
            TargetEnv::Vulkan1_0 => (1, 0),
            TargetEnv::Vulkan1_1 => (1, 3),
            TargetEnv::Vulkan1_2 => (1, 5),
        }
    }

    /// Whether the StorageBuffer storage class is core in this version.
    pub fn has_core_storage_buffer(self) -> bool {
        self != TargetEnv::Vulkan1_0
    }
}

/// Order in which stage variables without explicit locations are numbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StageIoOrder {
    #[default]
    #[serde(rename = "decl")]
    Declaration,
    #[serde(rename = "alpha")]
    Alphabetical,
}

impl FromStr for StageIoOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "decl" => Ok(StageIoOrder::Declaration),
            "alpha" => Ok(StageIoOrder::Alphabetical),
            other => Err(format!("unknown stage I/O order '{}' (expected 'decl' or 'alpha')", other)),
        }
    }
}

impl fmt::Display for StageIoOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageIoOrder::Declaration => write!(f, "decl"),
            StageIoOrder::Alphabetical => write!(f, "alpha"),
        }
    }
}

/// Numeric shift added to register numbers of one register class.
///
/// A shift can be given per descriptor set, or once for every set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingShiftMap {
    pub per_set: BTreeMap<u32, u32>,
    pub all_sets: Option<u32>,
}

impl BindingShiftMap {
    pub fn for_set(set: u32, shift: u32) -> Self {
        BindingShiftMap {
            per_set: BTreeMap::from([(set, shift)]),
            all_sets: None,
        }
    }

    pub fn for_all_sets(shift: u32) -> Self {
        BindingShiftMap {
            per_set: BTreeMap::new(),
            all_sets: Some(shift),
        }
    }

    pub fn shift_for_set(&self, set: u32) -> u32 {
        self.per_set.get(&set).copied().or(self.all_sets).unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitOptions {
    pub target_env: TargetEnv,
    /// Shift for `b` (constant buffer) registers.
    pub b_shift: BindingShiftMap,
    /// Shift for `t` (texture / read-only buffer) registers.
    pub t_shift: BindingShiftMap,
    /// Shift for `s` (sampler) registers.
    pub s_shift: BindingShiftMap,
    /// Shift for `u` (unordered access) registers.
    pub u_shift: BindingShiftMap,
    pub stage_io_order: StageIoOrder,
    /// Pixel shader render targets take their semantic index as location.
    pub render_target_locations: bool,
    /// Descriptor set used when a declaration names none.
    pub auto_binding_space: Option<u32>,
    /// Give every element of a resource array its own binding number.
    pub flatten_resource_arrays: bool,
    /// Layout rule for cbuffers and the `$Globals` buffer.
    pub cbuffer_layout: LayoutRule,
    /// Layout rule for tbuffers and structured buffers.
    pub sbuffer_layout: LayoutRule,
}

impl Default for EmitOptions {
    fn default() -> Self {
        EmitOptions {
            target_env: TargetEnv::default(),
            b_shift: BindingShiftMap::default(),
            t_shift: BindingShiftMap::default(),
            s_shift: BindingShiftMap::default(),
            u_shift: BindingShiftMap::default(),
            stage_io_order: StageIoOrder::default(),
            render_target_locations: true,
            auto_binding_space: None,
            flatten_resource_arrays: false,
            cbuffer_layout: LayoutRule::FxcCTBuffer,
            sbuffer_layout: LayoutRule::Std430,
        }
    }
}

impl EmitOptions {
    pub fn default_space(&self) -> u32 {
        self.auto_binding_space.unwrap_or(0)
    }
}
