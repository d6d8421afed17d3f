//! Declarations as handed over by the front end.
//!
//! A [`Decl`] carries every attribute that influences how it is mapped:
//! semantic, explicit location and dual-source index, `vk::binding`, legacy
//! `register(...)`, counter binding, built-in override and interpolation.
//! Struct-typed stage declarations carry one nested [`Decl`] per field.

use std::fmt;
use std::str::FromStr;

use nom::{
    IResult,
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::{char, digit1, one_of, space0},
    combinator::{all_consuming, map, map_res, opt},
    sequence::{preceded, tuple},
};
use serde::{Deserialize, Serialize};

use crate::error::CompilerError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Decl {
    pub name: String,
    pub semantic: Option<String>,
    /// `[[vk::location(N)]]`
    pub location: Option<u32>,
    /// `[[vk::index(N)]]` for dual-source blending.
    pub index: Option<u32>,
    /// `[[vk::binding(N, S)]]`
    pub binding: Option<VkBinding>,
    /// `register(t3, space1)`
    pub register: Option<RegisterAssignment>,
    /// `[[vk::counter_binding(N)]]`
    pub counter_binding: Option<u32>,
    /// `[[vk::builtin("...")]]`
    pub builtin: Option<String>,
    pub interpolation: Interpolation,
    /// Field declarations of a struct-typed stage declaration, in field order.
    pub fields: Vec<Decl>,
}

impl Decl {
    pub fn new(name: impl Into<String>) -> Self {
        Decl {
            name: name.into(),
            ..Decl::default()
        }
    }

    pub fn with_semantic(mut self, semantic: impl Into<String>) -> Self {
        self.semantic = Some(semantic.into());
        self
    }

    pub fn with_location(mut self, location: u32) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_index(mut self, index: u32) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_binding(mut self, binding: u32, set: Option<u32>) -> Self {
        self.binding = Some(VkBinding { binding, set });
        self
    }

    pub fn with_register(mut self, register: RegisterAssignment) -> Self {
        self.register = Some(register);
        self
    }

    pub fn with_counter_binding(mut self, binding: u32) -> Self {
        self.counter_binding = Some(binding);
        self
    }

    pub fn with_builtin(mut self, builtin: impl Into<String>) -> Self {
        self.builtin = Some(builtin.into());
        self
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub fn with_fields(mut self, fields: Vec<Decl>) -> Self {
        self.fields = fields;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VkBinding {
    pub binding: u32,
    pub set: Option<u32>,
}

/// Interpolation modifiers on a stage variable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Interpolation {
    pub nointerpolation: bool,
    pub noperspective: bool,
    pub centroid: bool,
    pub sample: bool,
}

// =============================================================================
// Legacy register assignments
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterClass {
    /// Constant buffers.
    B,
    /// Textures and read-only buffers.
    T,
    /// Samplers.
    S,
    /// Unordered access views.
    U,
    /// Constant packing offsets; never affects bindings.
    C,
}

impl RegisterClass {
    fn from_letter(c: char) -> RegisterClass {
        match c.to_ascii_lowercase() {
            'b' => RegisterClass::B,
            't' => RegisterClass::T,
            's' => RegisterClass::S,
            'u' => RegisterClass::U,
            _ => RegisterClass::C,
        }
    }

    fn letter(self) -> char {
        match self {
            RegisterClass::B => 'b',
            RegisterClass::T => 't',
            RegisterClass::S => 's',
            RegisterClass::U => 'u',
            RegisterClass::C => 'c',
        }
    }
}

/// A `register(...)` annotation.
///
/// `space2` alone only chooses the descriptor set; the binding number is then
/// assigned automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegisterAssignment {
    /// Register class and number, absent for a space-only assignment.
    pub slot: Option<(RegisterClass, u32)>,
    pub space: Option<u32>,
}

impl RegisterAssignment {
    pub fn new(class: RegisterClass, number: u32, space: Option<u32>) -> Self {
        RegisterAssignment {
            slot: Some((class, number)),
            space,
        }
    }

    pub fn space_only(space: u32) -> Self {
        RegisterAssignment {
            slot: None,
            space: Some(space),
        }
    }

    pub fn is_space_only(&self) -> bool {
        self.slot.is_none()
    }

    pub fn class(&self) -> Option<RegisterClass> {
        self.slot.map(|(class, _)| class)
    }
}

fn number(input: &str) -> IResult<&str, u32> {
    map_res(digit1, str::parse::<u32>)(input)
}

fn space(input: &str) -> IResult<&str, u32> {
    preceded(tag_no_case("space"), number)(input)
}

fn register_slot(input: &str) -> IResult<&str, (RegisterClass, u32)> {
    map(tuple((one_of("bBtTsSuUcC"), number)), |(letter, n)| {
        (RegisterClass::from_letter(letter), n)
    })(input)
}

fn register_assignment(input: &str) -> IResult<&str, RegisterAssignment> {
    alt((
        map(space, RegisterAssignment::space_only),
        map(
            tuple((
                register_slot,
                opt(preceded(tuple((space0, char(','), space0)), space)),
            )),
            |((class, n), space)| RegisterAssignment::new(class, n, space),
        ),
    ))(input)
}

impl FromStr for RegisterAssignment {
    type Err = CompilerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        all_consuming(register_assignment)(s.trim())
            .map(|(_, reg)| reg)
            .map_err(|_| CompilerError::InvalidRegister(s.to_string()))
    }
}

impl TryFrom<String> for RegisterAssignment {
    type Error = CompilerError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<RegisterAssignment> for String {
    fn from(reg: RegisterAssignment) -> Self {
        reg.to_string()
    }
}

impl fmt::Display for RegisterAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.slot, self.space) {
            (Some((class, n)), Some(space)) => write!(f, "{}{}, space{}", class.letter(), n, space),
            (Some((class, n)), None) => write!(f, "{}{}", class.letter(), n),
            (None, Some(space)) => write!(f, "space{}", space),
            (None, None) => Ok(()),
        }
    }
}
