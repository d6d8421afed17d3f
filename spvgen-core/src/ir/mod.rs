//! In-memory SPIR-V module.
//!
//! The declaration mapper and codegen fill a [`Module`] with [`Instruction`]s
//! whose result ids come from the [`Context`](crate::context::Context). Types
//! are referenced through [`TypeRef`] and only receive result ids when the
//! [`EmitVisitor`](crate::emit::EmitVisitor) serializes the module.

pub mod types;

use rspirv::spirv::{
    self, AddressingModel, Capability, ExecutionMode, ExecutionModel, FunctionControl, LoopControl,
    MemoryModel, Op, SelectionControl, SourceLanguage, StorageClass,
};

use crate::layout::LayoutRule;

pub use types::{
    Constant, ConstantValue, Decoration, DecorationId, ImageType, SpirvType, StructField, StructInterface,
    StructType, Type, TypeId,
};

/// A type together with the layout rule it is emitted under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub ty: TypeId,
    pub rule: LayoutRule,
}

impl TypeRef {
    pub fn new(ty: TypeId, rule: LayoutRule) -> Self {
        TypeRef { ty, rule }
    }
}

impl From<TypeId> for TypeRef {
    fn from(ty: TypeId) -> Self {
        TypeRef {
            ty,
            rule: LayoutRule::Void,
        }
    }
}

// =============================================================================
// Instructions
// =============================================================================

/// Every instruction kind the backend produces.
///
/// The [`EmitVisitor`](crate::emit::EmitVisitor) routes and encodes these in a
/// single exhaustive match, so adding a variant forces both decisions.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Capability(Capability),
    Extension(String),
    ExtInstImport {
        id: spirv::Word,
        name: String,
    },
    MemoryModel {
        addressing: AddressingModel,
        memory: MemoryModel,
    },
    EntryPoint {
        model: ExecutionModel,
        function: spirv::Word,
        name: String,
        interface: Vec<spirv::Word>,
    },
    ExecutionMode {
        function: spirv::Word,
        mode: ExecutionMode,
        params: Vec<u32>,
    },

    String {
        id: spirv::Word,
        text: String,
    },
    Source {
        language: SourceLanguage,
        version: u32,
        file: Option<spirv::Word>,
    },
    Name {
        target: spirv::Word,
        name: String,
    },
    MemberName {
        target: spirv::Word,
        member: u32,
        name: String,
    },

    /// `OpDecorate`, or `OpMemberDecorate` when the decoration names a member.
    Decorate {
        target: spirv::Word,
        decoration: Decoration,
    },

    /// Module-scope variables land with the types; `Function` storage
    /// variables stay in their block.
    Variable {
        ty: TypeRef,
        id: spirv::Word,
        storage: StorageClass,
        initializer: Option<spirv::Word>,
    },

    Load {
        ty: TypeRef,
        id: spirv::Word,
        pointer: spirv::Word,
    },
    Store {
        pointer: spirv::Word,
        value: spirv::Word,
    },
    AccessChain {
        ty: TypeRef,
        id: spirv::Word,
        base: spirv::Word,
        indices: Vec<spirv::Word>,
    },
    CompositeConstruct {
        ty: TypeRef,
        id: spirv::Word,
        constituents: Vec<spirv::Word>,
    },
    CompositeExtract {
        ty: TypeRef,
        id: spirv::Word,
        composite: spirv::Word,
        indices: Vec<u32>,
    },
    VectorShuffle {
        ty: TypeRef,
        id: spirv::Word,
        vector1: spirv::Word,
        vector2: spirv::Word,
        components: Vec<u32>,
    },
    FunctionCall {
        ty: TypeRef,
        id: spirv::Word,
        function: spirv::Word,
        arguments: Vec<spirv::Word>,
    },
    /// Two-operand arithmetic, logic and comparison opcodes.
    Binary {
        op: Op,
        ty: TypeRef,
        id: spirv::Word,
        lhs: spirv::Word,
        rhs: spirv::Word,
    },
    /// One-operand conversions and negations.
    Unary {
        op: Op,
        ty: TypeRef,
        id: spirv::Word,
        operand: spirv::Word,
    },
    Select {
        ty: TypeRef,
        id: spirv::Word,
        condition: spirv::Word,
        accept: spirv::Word,
        reject: spirv::Word,
    },

    SelectionMerge {
        merge: spirv::Word,
        control: SelectionControl,
    },
    LoopMerge {
        merge: spirv::Word,
        continue_target: spirv::Word,
        control: LoopControl,
    },
    Branch {
        target: spirv::Word,
    },
    BranchConditional {
        condition: spirv::Word,
        true_label: spirv::Word,
        false_label: spirv::Word,
    },
    Return,
    ReturnValue(spirv::Word),
    Kill,
    Unreachable,
}

impl Instruction {
    /// Position in the SPIR-V logical layout for preamble instructions.
    ///
    /// Everything outside the preamble shares one rank so that a stable sort
    /// keeps its relative order.
    pub fn layout_rank(&self) -> u8 {
        match self {
            Instruction::Capability(_) => 0,
            Instruction::Extension(_) => 1,
            Instruction::ExtInstImport { .. } => 2,
            Instruction::MemoryModel { .. } => 3,
            Instruction::EntryPoint { .. } => 4,
            Instruction::ExecutionMode { .. } => 5,
            _ => 6,
        }
    }

    /// The result id defined by this instruction, if any.
    pub fn result_id(&self) -> Option<spirv::Word> {
        match self {
            Instruction::ExtInstImport { id, .. }
            | Instruction::String { id, .. }
            | Instruction::Variable { id, .. }
            | Instruction::Load { id, .. }
            | Instruction::AccessChain { id, .. }
            | Instruction::CompositeConstruct { id, .. }
            | Instruction::CompositeExtract { id, .. }
            | Instruction::VectorShuffle { id, .. }
            | Instruction::FunctionCall { id, .. }
            | Instruction::Binary { id, .. }
            | Instruction::Unary { id, .. }
            | Instruction::Select { id, .. } => Some(*id),
            _ => None,
        }
    }

    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Instruction::Branch { .. }
                | Instruction::BranchConditional { .. }
                | Instruction::Return
                | Instruction::ReturnValue(_)
                | Instruction::Kill
                | Instruction::Unreachable
        )
    }
}

// =============================================================================
// Functions and blocks
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    pub label: spirv::Word,
    pub instructions: Vec<Instruction>,
}

impl BasicBlock {
    pub fn new(label: spirv::Word) -> Self {
        BasicBlock {
            label,
            instructions: Vec::new(),
        }
    }

    pub fn push(&mut self, inst: Instruction) {
        self.instructions.push(inst);
    }

    pub fn is_terminated(&self) -> bool {
        self.instructions.last().is_some_and(Instruction::is_terminator)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionParameter {
    pub id: spirv::Word,
    pub ty: TypeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub id: spirv::Word,
    pub name: String,
    pub return_type: TypeRef,
    pub control: FunctionControl,
    pub parameters: Vec<FunctionParameter>,
    pub blocks: Vec<BasicBlock>,
}

impl Function {
    pub fn new(id: spirv::Word, name: impl Into<String>, return_type: TypeRef) -> Self {
        Function {
            id,
            name: name.into(),
            return_type,
            control: FunctionControl::NONE,
            parameters: Vec::new(),
            blocks: Vec::new(),
        }
    }
}

// =============================================================================
// Module
// =============================================================================

/// The finished program, ready for serialization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Module {
    /// Module-scope instructions in the order they were produced.
    pub instructions: Vec<Instruction>,
    pub functions: Vec<Function>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, inst: Instruction) {
        self.instructions.push(inst);
    }

    /// Require a capability; repeated requests are ignored.
    pub fn require_capability(&mut self, cap: Capability) {
        let inst = Instruction::Capability(cap);
        if !self.instructions.contains(&inst) {
            self.instructions.push(inst);
        }
    }

    /// Require an extension; repeated requests are ignored.
    pub fn require_extension(&mut self, name: &str) {
        let present = self
            .instructions
            .iter()
            .any(|inst| matches!(inst, Instruction::Extension(ext) if ext == name));
        if !present {
            self.instructions.push(Instruction::Extension(name.to_string()));
        }
    }

    pub fn decorate(&mut self, target: spirv::Word, decoration: Decoration) {
        self.instructions.push(Instruction::Decorate { target, decoration });
    }

    pub fn name(&mut self, target: spirv::Word, name: impl Into<String>) {
        self.instructions.push(Instruction::Name {
            target,
            name: name.into(),
        });
    }

    pub fn add_function(&mut self, function: Function) {
        self.functions.push(function);
    }

    /// Decorations attached to `target`, in insertion order.
    pub fn decorations_of(&self, target: spirv::Word) -> impl Iterator<Item = &Decoration> {
        self.instructions.iter().filter_map(move |inst| match inst {
            Instruction::Decorate { target: t, decoration } if *t == target => Some(decoration),
            _ => None,
        })
    }
}
