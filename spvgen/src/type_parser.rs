//! Type strings used in shader manifests.
//!
//! Accepted forms:
//!
//! - numeric: `bool`, `int`, `uint`, `float`, vectors `float4`, matrices
//!   `float3x4` (rows x columns)
//! - arrays: `float[3]`, `float4[2][8]`
//! - inline structs: `struct VSOut { float4 pos; row_major float4x4 m; float w[2]; }`
//! - resources: `Texture2D`, `Texture2DArray`, `TextureCube`, `RWTexture2D<float4>`,
//!   `SamplerState`, `StructuredBuffer<T>` and its `RW`/`Append`/`Consume`
//!   variants, `ByteAddressBuffer`, `RWByteAddressBuffer`

use nom::{
    IResult,
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, digit1, multispace0, multispace1},
    combinator::{all_consuming, map, map_res, opt, recognize, verify},
    error::{Error as NomError, ErrorKind},
    multi::many0,
    sequence::{delimited, pair, preceded, terminated},
};
use rspirv::spirv::{Dim, ImageFormat};
use spvgen_core::Context;
use spvgen_core::context::BufferAccess;
use spvgen_core::ir::{StructField, StructInterface, TypeId};
use spvgen_core::layout::Majorness;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot parse type '{text}' near '{rest}'")]
pub struct TypeParseError {
    pub text: String,
    pub rest: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Bool,
    Int,
    Uint,
    Float,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldExpr {
    pub name: String,
    pub ty: TypeExpr,
    pub majorness: Option<Majorness>,
}

/// A parsed type, not yet interned.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Scalar(ScalarKind),
    Vector(ScalarKind, u32),
    /// Rows, columns.
    Matrix(ScalarKind, u32, u32),
    Array(Box<TypeExpr>, u32),
    Struct { name: String, fields: Vec<FieldExpr> },
    Texture { dim: Dim, arrayed: bool },
    StorageTexture { dim: Dim, format: ImageFormat },
    Sampler,
    StructuredBuffer(BufferAccess, Box<TypeExpr>),
    ByteAddressBuffer { writable: bool },
}

impl TypeExpr {
    /// Intern the type into `ctx`.
    pub fn resolve(&self, ctx: &mut Context) -> TypeId {
        match self {
            TypeExpr::Scalar(kind) => scalar_type(ctx, *kind),
            TypeExpr::Vector(kind, count) => {
                let elem = scalar_type(ctx, *kind);
                ctx.vec_type(elem, *count)
            }
            TypeExpr::Matrix(kind, rows, cols) => {
                let elem = scalar_type(ctx, *kind);
                ctx.mat_type(elem, *rows, *cols)
            }
            TypeExpr::Array(elem, length) => {
                let elem = elem.resolve(ctx);
                ctx.array_type(elem, *length)
            }
            TypeExpr::Struct { name, fields } => {
                let fields = fields
                    .iter()
                    .map(|field| {
                        let mut resolved = StructField::new(field.name.clone(), field.ty.resolve(ctx));
                        if let Some(majorness) = field.majorness {
                            resolved = resolved.with_majorness(majorness);
                        }
                        resolved
                    })
                    .collect();
                ctx.struct_type(name.clone(), fields, StructInterface::Internal)
            }
            TypeExpr::Texture { dim, arrayed } => ctx.texture_type(*dim, *arrayed),
            TypeExpr::StorageTexture { dim, format } => ctx.storage_image_type(*dim, *format),
            TypeExpr::Sampler => ctx.sampler_type(),
            TypeExpr::StructuredBuffer(access, elem) => {
                let elem = elem.resolve(ctx);
                ctx.structured_buffer_type(elem, *access)
            }
            TypeExpr::ByteAddressBuffer { writable } => ctx.byte_address_buffer_type(*writable),
        }
    }
}

fn scalar_type(ctx: &mut Context, kind: ScalarKind) -> TypeId {
    match kind {
        ScalarKind::Bool => ctx.bool_type(),
        ScalarKind::Int => ctx.int_type(),
        ScalarKind::Uint => ctx.uint_type(),
        ScalarKind::Float => ctx.float_type(),
    }
}

/// Parse a type string.
pub fn parse_type(text: &str) -> Result<TypeExpr, TypeParseError> {
    all_consuming(delimited(multispace0, type_expr, multispace0))(text)
        .map(|(_, ty)| ty)
        .map_err(|err| {
            let rest = match err {
                nom::Err::Error(e) | nom::Err::Failure(e) => e.input.to_string(),
                nom::Err::Incomplete(_) => String::new(),
            };
            TypeParseError {
                text: text.to_string(),
                rest,
            }
        })
}

/// Parse a type string and intern it.
pub fn resolve_type(ctx: &mut Context, text: &str) -> Result<TypeId, TypeParseError> {
    Ok(parse_type(text)?.resolve(ctx))
}

// =============================================================================
// Grammar
// =============================================================================

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(alt((alpha1, tag("_"))), many0(alt((alphanumeric1, tag("_"))))))(input)
}

fn number(input: &str) -> IResult<&str, u32> {
    map_res(digit1, str::parse::<u32>)(input)
}

fn scalar(input: &str) -> IResult<&str, ScalarKind> {
    alt((
        map(tag("float"), |_| ScalarKind::Float),
        map(tag("uint"), |_| ScalarKind::Uint),
        map(tag("int"), |_| ScalarKind::Int),
        map(tag("bool"), |_| ScalarKind::Bool),
    ))(input)
}

fn component_count(input: &str) -> IResult<&str, u32> {
    verify(number, |n| (1..=4).contains(n))(input)
}

// `float`, `float4`, `float3x4`
fn numeric(input: &str) -> IResult<&str, TypeExpr> {
    let (rest, (kind, dims)) = pair(scalar, opt(pair(component_count, opt(preceded(char('x'), component_count)))))(input)?;
    let ty = match dims {
        None => TypeExpr::Scalar(kind),
        Some((count, None)) => TypeExpr::Vector(kind, count),
        Some((rows, Some(cols))) if rows >= 2 && cols >= 2 => TypeExpr::Matrix(kind, rows, cols),
        Some(_) => return Err(nom::Err::Error(NomError::new(input, ErrorKind::Verify))),
    };
    // `floaty` is an identifier, not a float.
    if rest.starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_') {
        return Err(nom::Err::Error(NomError::new(input, ErrorKind::Verify)));
    }
    Ok((rest, ty))
}

fn template_arg(input: &str) -> IResult<&str, TypeExpr> {
    delimited(
        preceded(multispace0, char('<')),
        delimited(multispace0, type_expr, multispace0),
        char('>'),
    )(input)
}

fn storage_format(elem: Option<TypeExpr>) -> Option<ImageFormat> {
    match elem {
        None | Some(TypeExpr::Vector(ScalarKind::Float, 4)) => Some(ImageFormat::Rgba32f),
        Some(TypeExpr::Vector(ScalarKind::Float, 2)) => Some(ImageFormat::Rg32f),
        Some(TypeExpr::Scalar(ScalarKind::Float)) => Some(ImageFormat::R32f),
        Some(_) => None,
    }
}

fn resource(input: &str) -> IResult<&str, TypeExpr> {
    let (rest, word) = identifier(input)?;
    let fail = || nom::Err::Error(NomError::new(input, ErrorKind::Tag));

    let texture = |dim, arrayed| TypeExpr::Texture { dim, arrayed };
    match word {
        "SamplerState" | "SamplerComparisonState" => Ok((rest, TypeExpr::Sampler)),
        "Texture1D" => Ok((rest, texture(Dim::Dim1D, false))),
        "Texture1DArray" => Ok((rest, texture(Dim::Dim1D, true))),
        "Texture2D" => Ok((rest, texture(Dim::Dim2D, false))),
        "Texture2DArray" => Ok((rest, texture(Dim::Dim2D, true))),
        "Texture3D" => Ok((rest, texture(Dim::Dim3D, false))),
        "TextureCube" => Ok((rest, texture(Dim::DimCube, false))),
        "TextureCubeArray" => Ok((rest, texture(Dim::DimCube, true))),
        "RWTexture1D" | "RWTexture2D" | "RWTexture3D" => {
            let dim = match word {
                "RWTexture1D" => Dim::Dim1D,
                "RWTexture2D" => Dim::Dim2D,
                _ => Dim::Dim3D,
            };
            let (rest, elem) = opt(template_arg)(rest)?;
            let format = storage_format(elem).ok_or_else(fail)?;
            Ok((rest, TypeExpr::StorageTexture { dim, format }))
        }
        "StructuredBuffer" | "RWStructuredBuffer" | "AppendStructuredBuffer" | "ConsumeStructuredBuffer" => {
            let access = match word {
                "StructuredBuffer" => BufferAccess::ReadOnly,
                "RWStructuredBuffer" => BufferAccess::ReadWrite,
                "AppendStructuredBuffer" => BufferAccess::Append,
                _ => BufferAccess::Consume,
            };
            let (rest, elem) = template_arg(rest)?;
            Ok((rest, TypeExpr::StructuredBuffer(access, Box::new(elem))))
        }
        "ByteAddressBuffer" => Ok((rest, TypeExpr::ByteAddressBuffer { writable: false })),
        "RWByteAddressBuffer" => Ok((rest, TypeExpr::ByteAddressBuffer { writable: true })),
        _ => Err(fail()),
    }
}

fn majorness(input: &str) -> IResult<&str, Majorness> {
    terminated(
        alt((
            map(tag("row_major"), |_| Majorness::RowMajor),
            map(tag("column_major"), |_| Majorness::ColumnMajor),
        )),
        multispace1,
    )(input)
}

fn array_suffixes(input: &str) -> IResult<&str, Vec<u32>> {
    many0(delimited(
        pair(multispace0, char('[')),
        delimited(multispace0, verify(number, |n| *n > 0), multispace0),
        char(']'),
    ))(input)
}

// `row_major float4x4 m;` or `float w[2];`
fn field(input: &str) -> IResult<&str, FieldExpr> {
    let (rest, majorness) = opt(majorness)(input)?;
    let (rest, ty) = type_expr(rest)?;
    let (rest, name) = preceded(multispace1, identifier)(rest)?;
    let (rest, dims) = array_suffixes(rest)?;
    let (rest, _) = preceded(multispace0, char(';'))(rest)?;
    Ok((
        rest,
        FieldExpr {
            name: name.to_string(),
            ty: wrap_arrays(ty, &dims),
            majorness,
        },
    ))
}

fn struct_def(input: &str) -> IResult<&str, TypeExpr> {
    let (rest, _) = terminated(tag("struct"), multispace1)(input)?;
    let (rest, name) = identifier(rest)?;
    let (rest, fields) = delimited(
        preceded(multispace0, char('{')),
        many0(preceded(multispace0, field)),
        preceded(multispace0, char('}')),
    )(rest)?;
    Ok((
        rest,
        TypeExpr::Struct {
            name: name.to_string(),
            fields,
        },
    ))
}

/// `[3][2]` on `T` is three arrays of two `T`.
fn wrap_arrays(ty: TypeExpr, dims: &[u32]) -> TypeExpr {
    dims.iter().rev().fold(ty, |ty, &n| TypeExpr::Array(Box::new(ty), n))
}

fn type_expr(input: &str) -> IResult<&str, TypeExpr> {
    let (rest, base) = alt((struct_def, numeric, resource))(input)?;
    let (rest, dims) = array_suffixes(rest)?;
    Ok((rest, wrap_arrays(base, &dims)))
}
