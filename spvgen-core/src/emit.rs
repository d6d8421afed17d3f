//! Binary serialization of a [`Module`].
//!
//! Instructions are encoded into one of six ordered sections; the final
//! module is the header followed by the sections concatenated in order.
//! Types and constants are written on demand into their section the first
//! time an instruction refers to them.

use log::debug;
use rspirv::spirv::{self, Op, StorageClass};

use crate::context::Context;
use crate::ir::{Decoration, Function, Instruction, Module, TypeRef};
use crate::type_emitter::TypeEmitter;

pub const MAGIC_NUMBER: u32 = 0x0723_0203;

/// Generator word of the header. No registered generator id.
pub const GENERATOR_MAGIC: u32 = 0;

// =============================================================================
// Sections
// =============================================================================

/// Logical sections of a module, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// Capabilities, extensions, imports, memory model, entry points and
    /// execution modes.
    Preamble,
    DebugStrings,
    DebugNames,
    Annotations,
    TypesConstants,
    Functions,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::Preamble,
        Section::DebugStrings,
        Section::DebugNames,
        Section::Annotations,
        Section::TypesConstants,
        Section::Functions,
    ];

    fn index(self) -> usize {
        match self {
            Section::Preamble => 0,
            Section::DebugStrings => 1,
            Section::DebugNames => 2,
            Section::Annotations => 3,
            Section::TypesConstants => 4,
            Section::Functions => 5,
        }
    }
}

/// Word buffers, one per [`Section`].
#[derive(Debug, Default)]
pub struct Sections {
    buffers: [Vec<u32>; 6],
}

impl Sections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one encoded instruction to `section`.
    pub fn push(&mut self, section: Section, op: Op, operands: &[u32]) {
        let buffer = &mut self.buffers[section.index()];
        buffer.push(instruction_word(op, operands.len() as u32 + 1));
        buffer.extend_from_slice(operands);
    }

    pub fn push_name(&mut self, target: spirv::Word, name: &str) {
        let mut operands = vec![target];
        operands.extend(encode_string(name));
        self.push(Section::DebugNames, Op::Name, &operands);
    }

    pub fn push_member_name(&mut self, target: spirv::Word, member: u32, name: &str) {
        let mut operands = vec![target, member];
        operands.extend(encode_string(name));
        self.push(Section::DebugNames, Op::MemberName, &operands);
    }

    pub fn words(&self, section: Section) -> &[u32] {
        &self.buffers[section.index()]
    }

    /// Header followed by every section in order.
    pub fn assemble(self, header: [u32; 5]) -> Vec<u32> {
        let total = header.len() + self.buffers.iter().map(Vec::len).sum::<usize>();
        let mut words = Vec::with_capacity(total);
        words.extend_from_slice(&header);
        for buffer in self.buffers {
            words.extend(buffer);
        }
        words
    }
}

// =============================================================================
// Encoding helpers
// =============================================================================

/// First word of an instruction: word count in the high half, opcode in the
/// low half.
pub fn instruction_word(op: Op, word_count: u32) -> u32 {
    assert!(word_count <= 0xFFFF, "BUG: instruction {:?} has {} words", op, word_count);
    (word_count << 16) | op as u32
}

/// UTF-8 bytes, null terminated, zero padded to a whole word, packed
/// little-endian.
pub fn encode_string(s: &str) -> Vec<u32> {
    let bytes = s.as_bytes();
    let mut words = Vec::with_capacity(bytes.len() / 4 + 1);
    for chunk in bytes.chunks(4) {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        words.push(u32::from_le_bytes(word));
    }
    if bytes.len() % 4 == 0 {
        words.push(0);
    }
    words
}

/// Version word of the header for a (major, minor) pair.
pub fn version_word((major, minor): (u8, u8)) -> u32 {
    ((major as u32) << 16) | ((minor as u32) << 8)
}

/// `OpDecorate` / `OpMemberDecorate` into the annotations section.
pub fn write_decoration(out: &mut Sections, target: spirv::Word, decoration: &Decoration) {
    match decoration.member {
        Some(member) => {
            let mut operands = vec![target, member, decoration.kind as u32];
            operands.extend_from_slice(&decoration.params);
            out.push(Section::Annotations, Op::MemberDecorate, &operands);
        }
        None => {
            let mut operands = vec![target, decoration.kind as u32];
            operands.extend_from_slice(&decoration.params);
            out.push(Section::Annotations, Op::Decorate, &operands);
        }
    }
}

// =============================================================================
// Visitor
// =============================================================================

/// Serializes a finished [`Module`] to SPIR-V words.
pub struct EmitVisitor<'a> {
    ctx: &'a mut Context,
    types: TypeEmitter,
    sections: Sections,
    version: (u8, u8),
}

impl<'a> EmitVisitor<'a> {
    pub fn new(ctx: &'a mut Context, version: (u8, u8)) -> Self {
        EmitVisitor {
            ctx,
            types: TypeEmitter::new(),
            sections: Sections::new(),
            version,
        }
    }

    pub fn emit(mut self, module: &Module) -> Vec<u32> {
        let constants: Vec<spirv::Word> = self.ctx.constants().map(|(_, id)| id).collect();
        for id in constants {
            self.types.emit_constant(self.ctx, &mut self.sections, id);
        }

        let mut module_scope: Vec<&Instruction> = module.instructions.iter().collect();
        module_scope.sort_by_key(|inst| inst.layout_rank());
        for inst in module_scope {
            self.visit_instruction(inst);
        }

        for function in &module.functions {
            self.visit_function(function);
        }

        let header = [
            MAGIC_NUMBER,
            version_word(self.version),
            GENERATOR_MAGIC,
            self.ctx.id_bound(),
            0,
        ];
        debug!(
            "emitted module: version {}.{}, id bound {}",
            self.version.0, self.version.1, header[3]
        );
        self.sections.assemble(header)
    }

    fn type_id(&mut self, ty: TypeRef) -> spirv::Word {
        self.types.emit_type(self.ctx, &mut self.sections, ty.ty, ty.rule, None)
    }

    fn visit_function(&mut self, function: &Function) {
        let ret = self.type_id(function.return_type);
        let params: Vec<spirv::Word> = function.parameters.iter().map(|p| self.type_id(p.ty)).collect();
        let fn_type = self
            .types
            .emit_function_type(self.ctx, &mut self.sections, ret, params.clone());

        if !function.name.is_empty() {
            self.sections.push_name(function.id, &function.name);
        }
        self.sections.push(
            Section::Functions,
            Op::Function,
            &[ret, function.id, function.control.bits(), fn_type],
        );
        for (param, ty) in function.parameters.iter().zip(params) {
            self.sections.push(Section::Functions, Op::FunctionParameter, &[ty, param.id]);
        }
        for (index, block) in function.blocks.iter().enumerate() {
            self.sections.push(Section::Functions, Op::Label, &[block.label]);
            if index == 0 {
                // Function-storage variables must open the entry block.
                let (variables, rest): (Vec<&Instruction>, Vec<&Instruction>) = block
                    .instructions
                    .iter()
                    .partition(|inst| matches!(inst, Instruction::Variable { .. }));
                for inst in variables.into_iter().chain(rest) {
                    self.visit_instruction(inst);
                }
            } else {
                for inst in &block.instructions {
                    self.visit_instruction(inst);
                }
            }
        }
        self.sections.push(Section::Functions, Op::FunctionEnd, &[]);
    }

    fn visit_instruction(&mut self, inst: &Instruction) {
        use Section::*;

        match inst {
            Instruction::Capability(cap) => self.sections.push(Preamble, Op::Capability, &[*cap as u32]),
            Instruction::Extension(name) => self.sections.push(Preamble, Op::Extension, &encode_string(name)),
            Instruction::ExtInstImport { id, name } => {
                let mut operands = vec![*id];
                operands.extend(encode_string(name));
                self.sections.push(Preamble, Op::ExtInstImport, &operands);
            }
            Instruction::MemoryModel { addressing, memory } => {
                self.sections
                    .push(Preamble, Op::MemoryModel, &[*addressing as u32, *memory as u32])
            }
            Instruction::EntryPoint {
                model,
                function,
                name,
                interface,
            } => {
                let mut operands = vec![*model as u32, *function];
                operands.extend(encode_string(name));
                operands.extend_from_slice(interface);
                self.sections.push(Preamble, Op::EntryPoint, &operands);
            }
            Instruction::ExecutionMode { function, mode, params } => {
                let mut operands = vec![*function, *mode as u32];
                operands.extend_from_slice(params);
                self.sections.push(Preamble, Op::ExecutionMode, &operands);
            }

            Instruction::String { id, text } => {
                let mut operands = vec![*id];
                operands.extend(encode_string(text));
                self.sections.push(DebugStrings, Op::String, &operands);
            }
            Instruction::Source {
                language,
                version,
                file,
            } => {
                let mut operands = vec![*language as u32, *version];
                operands.extend(file.iter().copied());
                self.sections.push(DebugStrings, Op::Source, &operands);
            }
            Instruction::Name { target, name } => self.sections.push_name(*target, name),
            Instruction::MemberName { target, member, name } => {
                self.sections.push_member_name(*target, *member, name)
            }

            Instruction::Decorate { target, decoration } => {
                write_decoration(&mut self.sections, *target, decoration)
            }

            Instruction::Variable {
                ty,
                id,
                storage,
                initializer,
            } => {
                let ty = self.type_id(*ty);
                let section = if *storage == StorageClass::Function { Functions } else { TypesConstants };
                let mut operands = vec![ty, *id, *storage as u32];
                operands.extend(initializer.iter().copied());
                self.sections.push(section, Op::Variable, &operands);
            }

            Instruction::Load { ty, id, pointer } => {
                let ty = self.type_id(*ty);
                self.sections.push(Functions, Op::Load, &[ty, *id, *pointer]);
            }
            Instruction::Store { pointer, value } => self.sections.push(Functions, Op::Store, &[*pointer, *value]),
            Instruction::AccessChain { ty, id, base, indices } => {
                let ty = self.type_id(*ty);
                let mut operands = vec![ty, *id, *base];
                operands.extend_from_slice(indices);
                self.sections.push(Functions, Op::AccessChain, &operands);
            }
            Instruction::CompositeConstruct { ty, id, constituents } => {
                let ty = self.type_id(*ty);
                let mut operands = vec![ty, *id];
                operands.extend_from_slice(constituents);
                self.sections.push(Functions, Op::CompositeConstruct, &operands);
            }
            Instruction::CompositeExtract {
                ty,
                id,
                composite,
                indices,
            } => {
                let ty = self.type_id(*ty);
                let mut operands = vec![ty, *id, *composite];
                operands.extend_from_slice(indices);
                self.sections.push(Functions, Op::CompositeExtract, &operands);
            }
            Instruction::VectorShuffle {
                ty,
                id,
                vector1,
                vector2,
                components,
            } => {
                let ty = self.type_id(*ty);
                let mut operands = vec![ty, *id, *vector1, *vector2];
                operands.extend_from_slice(components);
                self.sections.push(Functions, Op::VectorShuffle, &operands);
            }
            Instruction::FunctionCall {
                ty,
                id,
                function,
                arguments,
            } => {
                let ty = self.type_id(*ty);
                let mut operands = vec![ty, *id, *function];
                operands.extend_from_slice(arguments);
                self.sections.push(Functions, Op::FunctionCall, &operands);
            }
            Instruction::Binary { op, ty, id, lhs, rhs } => {
                let ty = self.type_id(*ty);
                self.sections.push(Functions, *op, &[ty, *id, *lhs, *rhs]);
            }
            Instruction::Unary { op, ty, id, operand } => {
                let ty = self.type_id(*ty);
                self.sections.push(Functions, *op, &[ty, *id, *operand]);
            }
            Instruction::Select {
                ty,
                id,
                condition,
                accept,
                reject,
            } => {
                let ty = self.type_id(*ty);
                self.sections
                    .push(Functions, Op::Select, &[ty, *id, *condition, *accept, *reject]);
            }

            Instruction::SelectionMerge { merge, control } => {
                self.sections.push(Functions, Op::SelectionMerge, &[*merge, control.bits()])
            }
            Instruction::LoopMerge {
                merge,
                continue_target,
                control,
            } => self
                .sections
                .push(Functions, Op::LoopMerge, &[*merge, *continue_target, control.bits()]),
            Instruction::Branch { target } => self.sections.push(Functions, Op::Branch, &[*target]),
            Instruction::BranchConditional {
                condition,
                true_label,
                false_label,
            } => self.sections.push(
                Functions,
                Op::BranchConditional,
                &[*condition, *true_label, *false_label],
            ),
            Instruction::Return => self.sections.push(Functions, Op::Return, &[]),
            Instruction::ReturnValue(value) => self.sections.push(Functions, Op::ReturnValue, &[*value]),
            Instruction::Kill => self.sections.push(Functions, Op::Kill, &[]),
            Instruction::Unreachable => self.sections.push(Functions, Op::Unreachable, &[]),
        }
    }
}
