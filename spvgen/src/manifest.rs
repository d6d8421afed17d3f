//! JSON shader manifests.
//!
//! A manifest describes one entry point the way a front end would hand it to
//! the backend: stage, entry parameters with their declarations and types,
//! return value, resources and options.
//!
//! ```json
//! {
//!   "stage": "pixel",
//!   "model": "6.0",
//!   "params": [{ "name": "uv", "semantic": "TEXCOORD0", "type": "float2" }],
//!   "ret": { "name": "color", "semantic": "SV_Target0", "type": "float4" },
//!   "resources": [
//!     { "name": "albedo", "type": "Texture2D", "register": "t0" },
//!     { "name": "Params", "buffer": "cbuffer", "members": [{ "name": "tint", "type": "float4" }] }
//!   ],
//!   "options": { "target_env": "vulkan1.1" }
//! }
//! ```

use serde::Deserialize;
use spvgen_core::decl::Decl;
use spvgen_core::decl_mapper::CTBufferKind;
use spvgen_core::semantic::{ShaderModel, ShaderStage, TessDomain};
use spvgen_core::{Context, EmitOptions, EntryParam, GeometryConfig, ParamKind, ResourceDecl, ShaderProgram};
use thiserror::Error;

use crate::type_parser::{resolve_type, TypeParseError};

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("'{name}': {source}")]
    Type {
        name: String,
        #[source]
        source: TypeParseError,
    },

    #[error("resource '{0}' needs either a type or a buffer kind")]
    MissingResourceType(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub stage: ShaderStage,
    #[serde(default)]
    pub model: ShaderModel,
    #[serde(default = "default_entry")]
    pub entry: String,
    #[serde(default)]
    pub params: Vec<ParamEntry>,
    #[serde(default)]
    pub ret: Option<TypedDecl>,
    #[serde(default)]
    pub resources: Vec<ResourceEntry>,
    #[serde(default)]
    pub options: EmitOptions,
    #[serde(default)]
    pub domain: Option<TessDomain>,
    #[serde(default)]
    pub output_control_points: Option<u32>,
    #[serde(default)]
    pub geometry: Option<GeometryConfig>,
    #[serde(default = "default_local_size")]
    pub local_size: [u32; 3],
}

fn default_entry() -> String {
    "main".to_string()
}

fn default_local_size() -> [u32; 3] {
    [1, 1, 1]
}

/// A declaration with a type string.
#[derive(Debug, Clone, Deserialize)]
pub struct TypedDecl {
    #[serde(flatten)]
    pub decl: Decl,
    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParamEntry {
    #[serde(flatten)]
    pub decl: Decl,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub kind: ParamKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BufferKind {
    CBuffer,
    TBuffer,
}

impl From<BufferKind> for CTBufferKind {
    fn from(kind: BufferKind) -> Self {
        match kind {
            BufferKind::CBuffer => CTBufferKind::CBuffer,
            BufferKind::TBuffer => CTBufferKind::TBuffer,
        }
    }
}

/// A resource, plain global, or `cbuffer`/`tbuffer` block.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceEntry {
    #[serde(flatten)]
    pub decl: Decl,
    #[serde(rename = "type", default)]
    pub ty: Option<String>,
    #[serde(default)]
    pub buffer: Option<BufferKind>,
    #[serde(default)]
    pub members: Vec<TypedDecl>,
}

impl Manifest {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Resolve every type string into `ctx` and build the program.
    pub fn into_program(self, ctx: &mut Context) -> Result<ShaderProgram, ManifestError> {
        let mut program = ShaderProgram::new(self.stage, self.entry);
        program.model = self.model;
        program.options = self.options;
        program.domain = self.domain;
        program.output_control_points = self.output_control_points;
        program.geometry = self.geometry;
        program.local_size = self.local_size;

        for param in self.params {
            let ty = resolve(ctx, &param.decl, &param.ty)?;
            program.params.push(EntryParam {
                decl: param.decl,
                ty,
                kind: param.kind,
            });
        }

        if let Some(ret) = self.ret {
            let ty = resolve(ctx, &ret.decl, &ret.ty)?;
            program.ret = Some((ret.decl, ty));
        }

        for resource in self.resources {
            let decl = match (resource.buffer, resource.ty) {
                (Some(kind), _) => {
                    let mut members = Vec::with_capacity(resource.members.len());
                    for member in resource.members {
                        let ty = resolve(ctx, &member.decl, &member.ty)?;
                        members.push((member.decl, ty));
                    }
                    ResourceDecl::Buffer {
                        decl: resource.decl,
                        kind: kind.into(),
                        members,
                    }
                }
                (None, Some(text)) => {
                    let ty = resolve(ctx, &resource.decl, &text)?;
                    ResourceDecl::Extern {
                        decl: resource.decl,
                        ty,
                    }
                }
                (None, None) => return Err(ManifestError::MissingResourceType(resource.decl.name)),
            };
            program.resources.push(decl);
        }

        Ok(program)
    }
}

fn resolve(ctx: &mut Context, decl: &Decl, text: &str) -> Result<spvgen_core::ir::TypeId, ManifestError> {
    resolve_type(ctx, text).map_err(|source| ManifestError::Type {
        name: decl.name.clone(),
        source,
    })
}
