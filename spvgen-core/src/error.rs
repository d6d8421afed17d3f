//! Error and diagnostic types.
//!
//! Problems with user declarations (bad semantics, clashing locations or
//! bindings) are collected as [`Diagnostic`]s so that one run reports all of
//! them. Components push into a shared [`Diagnostics`] sink and return
//! [`ErrorReported`] to their caller; [`CompilerError::Diagnostics`] carries
//! the complete list out of the pipeline.

use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CompilerError>;

/// Stage input or output side of an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    pub fn from_is_input(is_input: bool) -> Self {
        if is_input { Direction::Input } else { Direction::Output }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Input => write!(f, "input"),
            Direction::Output => write!(f, "output"),
        }
    }
}

/// Broad category of a [`Diagnostic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A semantic or built-in used where the interface point forbids it.
    InvalidForStage,
    /// Two declarations claim the same location or binding.
    Conflict,
    /// Some but not all declarations of a direction carry explicit locations.
    InconsistentExplicit,
    /// A semantic or type shape with no defined lowering.
    Unsupported,
}

/// A problem found in a user declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    #[error("semantic '{semantic}' on '{decl}' is invalid for {sig_point}")]
    InvalidSemantic {
        decl: String,
        semantic: String,
        sig_point: String,
    },

    #[error("built-in '{builtin}' on '{decl}' is invalid for {sig_point}")]
    InvalidBuiltIn {
        decl: String,
        builtin: String,
        sig_point: String,
    },

    #[error("stage {direction} location #{location} already assigned ('{decl}')")]
    LocationConflict {
        decl: String,
        direction: Direction,
        location: u32,
    },

    #[error("stage {direction} location #{location} too large ('{decl}')")]
    LocationOutOfRange {
        decl: String,
        direction: Direction,
        location: u32,
    },

    #[error("{direction} semantic '{semantic}' used more than once ('{decl}')")]
    DuplicateSemantic {
        decl: String,
        direction: Direction,
        semantic: String,
    },

    #[error("resource binding #{binding} in descriptor set #{set} already assigned ('{decl}')")]
    BindingConflict { decl: String, set: u32, binding: u32 },

    #[error("resource binding #{binding} in descriptor set #{set} overflows the binding numbers ('{decl}')")]
    BindingOutOfRange { decl: String, set: u32, binding: u32 },

    #[error(
        "partial explicit stage {direction} location assignment via vk::location(X) unsupported ('{decl}')"
    )]
    PartialExplicitLocation { decl: String, direction: Direction },

    #[error("semantic string missing for shader {direction} variable '{decl}'")]
    MissingSemantic { decl: String, direction: Direction },

    #[error("'{decl}': {semantic} requires {expected} element(s) for this domain, found {found}")]
    TessFactorSize {
        decl: String,
        semantic: String,
        expected: u32,
        found: u32,
    },

    #[error("unsupported {what} on '{decl}'")]
    Unsupported { decl: String, what: String },
}

impl Diagnostic {
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Diagnostic::InvalidSemantic { .. } | Diagnostic::InvalidBuiltIn { .. } => {
                DiagnosticKind::InvalidForStage
            }
            Diagnostic::LocationConflict { .. }
            | Diagnostic::LocationOutOfRange { .. }
            | Diagnostic::DuplicateSemantic { .. }
            | Diagnostic::BindingConflict { .. }
            | Diagnostic::BindingOutOfRange { .. } => DiagnosticKind::Conflict,
            Diagnostic::PartialExplicitLocation { .. } => DiagnosticKind::InconsistentExplicit,
            Diagnostic::MissingSemantic { .. }
            | Diagnostic::TessFactorSize { .. }
            | Diagnostic::Unsupported { .. } => DiagnosticKind::Unsupported,
        }
    }

    /// Name of the offending declaration.
    pub fn decl_name(&self) -> &str {
        match self {
            Diagnostic::InvalidSemantic { decl, .. }
            | Diagnostic::InvalidBuiltIn { decl, .. }
            | Diagnostic::LocationConflict { decl, .. }
            | Diagnostic::LocationOutOfRange { decl, .. }
            | Diagnostic::DuplicateSemantic { decl, .. }
            | Diagnostic::BindingConflict { decl, .. }
            | Diagnostic::BindingOutOfRange { decl, .. }
            | Diagnostic::PartialExplicitLocation { decl, .. }
            | Diagnostic::MissingSemantic { decl, .. }
            | Diagnostic::TessFactorSize { decl, .. }
            | Diagnostic::Unsupported { decl, .. } => decl,
        }
    }

    /// The offending number (location, binding or array length), if any.
    pub fn value(&self) -> Option<u32> {
        match self {
            Diagnostic::LocationConflict { location, .. }
            | Diagnostic::LocationOutOfRange { location, .. } => Some(*location),
            Diagnostic::BindingConflict { binding, .. } | Diagnostic::BindingOutOfRange { binding, .. } => {
                Some(*binding)
            }
            Diagnostic::TessFactorSize { found, .. } => Some(*found),
            _ => None,
        }
    }
}

/// Marker returned once a diagnostic has been recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorReported;

/// Accumulates diagnostics across all declarations of a compilation.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, diagnostic: Diagnostic) -> ErrorReported {
        log::debug!("diagnostic: {}", diagnostic);
        self.entries.push(diagnostic);
        ErrorReported
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

/// Errors surfaced by the public pipeline entry points.
#[derive(Debug, Error)]
pub enum CompilerError {
    #[error("compilation failed with {} diagnostic(s)", .0.len())]
    Diagnostics(Vec<Diagnostic>),

    #[error("invalid register specifier '{0}'")]
    InvalidRegister(String),

    #[error("entry function '{entry}': {reason}")]
    EntrySignature { entry: String, reason: String },
}
