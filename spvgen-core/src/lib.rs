//! SPIR-V backend for an HLSL-style shading language.
//!
//! The crate takes declarations that have already been resolved by a front
//! end and produces a SPIR-V module:
//!
//! - [`context::Context`] interns types, constants and decorations and hands
//!   out result ids.
//! - [`type_emitter::TypeEmitter`] lays out aggregate types under one of the
//!   [`layout::LayoutRule`]s and writes their definitions.
//! - [`decl_mapper::DeclResultIdMapper`] turns declarations into values, stage
//!   variables and resource variables, and assigns locations and bindings.
//! - [`emit::EmitVisitor`] serializes the in-memory [`ir::Module`] into words.
//!
//! [`entry::compile`] drives the whole pipeline for one entry point.

pub mod binding;
pub mod context;
pub mod decl;
pub mod decl_mapper;
pub mod emit;
pub mod entry;
pub mod error;
pub mod interface;
pub mod ir;
pub mod layout;
pub mod options;
pub mod semantic;
pub mod type_emitter;

#[cfg(test)]
mod binding_tests;
#[cfg(test)]
mod context_tests;
#[cfg(test)]
mod decl_tests;
#[cfg(test)]
mod emit_tests;
#[cfg(test)]
mod layout_tests;

use std::collections::HashMap;
use std::hash::Hash;
use std::marker::PhantomData;

use indexmap::IndexMap;

pub use context::Context;
pub use entry::{
    compile, CompiledShader, EntryParam, GeometryConfig, GeometryInput, GeometryOutput, ParamKind, ResourceDecl, ShaderProgram,
};
pub use interface::ShaderInterface;
pub use error::{CompilerError, Diagnostic, DiagnosticKind, Result};
pub use options::EmitOptions;

// =============================================================================
// Generic ID allocation
// =============================================================================

/// Generic counter for generating unique IDs.
///
/// The ID type must implement `From<u32>` to convert the raw counter value.
#[derive(Debug, Clone)]
pub struct IdSource<Id> {
    next_id: u32,
    _phantom: PhantomData<Id>,
}

impl<Id: From<u32>> IdSource<Id> {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Create a counter whose first ID is `first`.
    ///
    /// SPIR-V reserves result id 0, so result ids start at 1.
    pub fn starting_at(first: u32) -> Self {
        IdSource {
            next_id: first,
            _phantom: PhantomData,
        }
    }

    pub fn next(&mut self) -> Id {
        let id = Id::from(self.next_id);
        self.next_id += 1;
        id
    }

    /// The raw value the next call to [`IdSource::next`] will return.
    pub fn peek(&self) -> u32 {
        self.next_id
    }
}

impl<Id: From<u32>> Default for IdSource<Id> {
    fn default() -> Self {
        Self::new()
    }
}

/// Arena that allocates IDs and stores associated items.
///
/// Uses IndexMap for deterministic iteration order (insertion order).
#[derive(Debug, Clone)]
pub struct IdArena<Id, T> {
    source: IdSource<Id>,
    items: IndexMap<Id, T>,
}

impl<Id: From<u32> + Copy + Eq + Hash, T> IdArena<Id, T> {
    pub fn new() -> Self {
        IdArena {
            source: IdSource::new(),
            items: IndexMap::new(),
        }
    }

    /// Allocate a new ID and store the item.
    pub fn alloc(&mut self, item: T) -> Id {
        let id = self.source.next();
        self.items.insert(id, item);
        id
    }

    /// Get an item by ID.
    pub fn get(&self, id: Id) -> Option<&T> {
        self.items.get(&id)
    }

    /// Iterate over all (id, item) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&Id, &T)> {
        self.items.iter()
    }

    /// Number of items in the arena.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<Id: From<u32> + Copy + Eq + Hash, T> Default for IdArena<Id, T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Arena that hands out one ID per structurally distinct item.
///
/// Interning the same value twice returns the ID it received the first time.
#[derive(Debug, Clone)]
pub struct InternArena<Id, T> {
    arena: IdArena<Id, T>,
    lookup: HashMap<T, Id>,
}

impl<Id: From<u32> + Copy + Eq + Hash, T: Clone + Eq + Hash> InternArena<Id, T> {
    pub fn new() -> Self {
        InternArena {
            arena: IdArena::new(),
            lookup: HashMap::new(),
        }
    }

    pub fn intern(&mut self, item: T) -> Id {
        if let Some(&id) = self.lookup.get(&item) {
            return id;
        }
        let id = self.arena.alloc(item.clone());
        self.lookup.insert(item, id);
        id
    }

    pub fn get(&self, id: Id) -> Option<&T> {
        self.arena.get(id)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Id, &T)> {
        self.arena.iter()
    }
}

impl<Id: From<u32> + Copy + Eq + Hash, T: Clone + Eq + Hash> Default for InternArena<Id, T> {
    fn default() -> Self {
        Self::new()
    }
}
