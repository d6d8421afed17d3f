//! Tests for binary emission

use rspirv::binary::Assemble;
use rspirv::dr;
use rspirv::spirv::{self, AddressingModel, Capability, ExecutionModel, MemoryModel, Op, StorageClass};

use crate::context::Context;
use crate::emit::{encode_string, instruction_word, version_word, EmitVisitor, Section, Sections, MAGIC_NUMBER};
use crate::ir::{BasicBlock, Decoration, Function, Instruction, Module, TypeRef};

/// A vertex module with one output variable and an empty entry function.
fn small_module(ctx: &mut Context) -> Module {
    let mut module = Module::new();
    let float4 = ctx.float_vec(4);
    let out_ptr = ctx.pointer_type(float4, StorageClass::Output);
    let void = ctx.void_type();

    let var = ctx.take_next_id();
    let main = ctx.take_next_id();
    let label = ctx.take_next_id();

    // Deliberately out of layout order.
    module.name(var, "out.var.COLOR");
    module.push(Instruction::MemoryModel {
        addressing: AddressingModel::Logical,
        memory: MemoryModel::GLSL450,
    });
    module.decorate(var, Decoration::location(0));
    module.push(Instruction::Variable {
        ty: out_ptr.into(),
        id: var,
        storage: StorageClass::Output,
        initializer: None,
    });
    module.push(Instruction::EntryPoint {
        model: ExecutionModel::Vertex,
        function: main,
        name: "main".to_string(),
        interface: vec![var],
    });
    module.require_capability(Capability::Shader);

    let zero = ctx.constant_f32(0.0);
    let splat = ctx.constant_composite(float4, vec![zero; 4]);
    let mut function = Function::new(main, "main", TypeRef::from(void));
    let mut block = BasicBlock::new(label);
    block.push(Instruction::Store {
        pointer: var,
        value: splat,
    });
    block.push(Instruction::Return);
    function.blocks.push(block);
    module.add_function(function);
    module
}

fn opcodes(instructions: &[dr::Instruction]) -> Vec<Op> {
    instructions.iter().map(|inst| inst.class.opcode).collect()
}

#[test]
fn test_instruction_word_packs_count_and_opcode() {
    assert_eq!(instruction_word(Op::Return, 1), 0x0001_00FD);
    assert_eq!(instruction_word(Op::TypeVoid, 2), (2 << 16) | 19);
}

#[test]
fn test_encode_string_pads_and_terminates() {
    assert_eq!(encode_string(""), vec![0]);
    assert_eq!(encode_string("abc"), vec![u32::from_le_bytes(*b"abc\0")]);
    assert_eq!(encode_string("main"), vec![u32::from_le_bytes(*b"main"), 0]);
    assert_eq!(encode_string("mains").len(), 2);
}

#[test]
fn test_version_word() {
    assert_eq!(version_word((1, 0)), 0x0001_0000);
    assert_eq!(version_word((1, 5)), 0x0001_0500);
}

#[test]
fn test_sections_assemble_in_order() {
    let mut sections = Sections::new();
    sections.push(Section::Functions, Op::Return, &[]);
    sections.push(Section::Preamble, Op::Capability, &[1]);
    sections.push_name(7, "x");
    assert_eq!(sections.words(Section::DebugNames).len(), 3);

    let words = sections.assemble([MAGIC_NUMBER, 0x0001_0000, 0, 8, 0]);
    assert_eq!(words[5], instruction_word(Op::Capability, 2));
    assert_eq!(words[7], instruction_word(Op::Name, 3));
    assert_eq!(*words.last().unwrap(), instruction_word(Op::Return, 1));
}

#[test]
fn test_header() {
    let mut ctx = Context::new();
    let module = small_module(&mut ctx);
    let words = EmitVisitor::new(&mut ctx, (1, 3)).emit(&module);

    assert_eq!(words[0], MAGIC_NUMBER);
    assert_eq!(words[1], 0x0001_0300);
    assert_eq!(words[2], 0);
    assert_eq!(words[3], ctx.id_bound());
    assert_eq!(words[4], 0);
}

#[test]
fn test_module_parses_with_sections_in_order() {
    let mut ctx = Context::new();
    let module = small_module(&mut ctx);
    let words = EmitVisitor::new(&mut ctx, (1, 0)).emit(&module);

    let parsed = dr::load_words(&words).expect("emitted module should parse");
    assert_eq!(opcodes(&parsed.capabilities), vec![Op::Capability]);
    assert!(parsed.memory_model.is_some());
    assert_eq!(parsed.entry_points.len(), 1);
    assert_eq!(opcodes(&parsed.debug_names), vec![Op::Name, Op::Name]);
    assert_eq!(opcodes(&parsed.annotations), vec![Op::Decorate]);
    assert_eq!(parsed.functions.len(), 1);

    // Constants come first, followed by the types needed by later
    // instructions, each defined before use.
    let globals = opcodes(&parsed.types_global_values);
    assert_eq!(
        globals,
        vec![
            Op::TypeFloat,
            Op::Constant,
            Op::TypeVector,
            Op::ConstantComposite,
            Op::TypePointer,
            Op::Variable,
            Op::TypeVoid,
            Op::TypeFunction,
        ]
    );
}

#[test]
fn test_reassembly_is_identical() {
    let mut ctx = Context::new();
    let module = small_module(&mut ctx);
    let words = EmitVisitor::new(&mut ctx, (1, 0)).emit(&module);

    let parsed = dr::load_words(&words).expect("emitted module should parse");
    assert_eq!(parsed.assemble(), words);
}

#[test]
fn test_ids_are_below_the_bound() {
    let mut ctx = Context::new();
    let module = small_module(&mut ctx);
    let words = EmitVisitor::new(&mut ctx, (1, 0)).emit(&module);
    let bound = words[3];

    let parsed = dr::load_words(&words).expect("emitted module should parse");
    let mut ids = Vec::new();
    for inst in parsed.all_inst_iter() {
        ids.extend(inst.result_id);
    }
    assert!(!ids.is_empty());
    assert!(ids.iter().all(|&id| id > 0 && id < bound));
}

#[test]
fn test_function_variables_open_the_entry_block() {
    let mut ctx = Context::new();
    let mut module = Module::new();
    module.require_capability(Capability::Shader);
    module.push(Instruction::MemoryModel {
        addressing: AddressingModel::Logical,
        memory: MemoryModel::GLSL450,
    });

    let void = ctx.void_type();
    let float = ctx.float_type();
    let ptr = ctx.pointer_type(float, StorageClass::Function);
    let one = ctx.constant_f32(1.0);
    let main = ctx.take_next_id();
    let label = ctx.take_next_id();
    let var = ctx.take_next_id();

    let mut function = Function::new(main, "main", TypeRef::from(void));
    let mut block = BasicBlock::new(label);
    block.push(Instruction::Variable {
        ty: ptr.into(),
        id: var,
        storage: StorageClass::Function,
        initializer: None,
    });
    block.push(Instruction::Store { pointer: var, value: one });
    let late = ctx.take_next_id();
    block.push(Instruction::Variable {
        ty: ptr.into(),
        id: late,
        storage: StorageClass::Function,
        initializer: Some(one),
    });
    block.push(Instruction::Return);
    function.blocks.push(block);
    module.add_function(function);

    let words = EmitVisitor::new(&mut ctx, (1, 0)).emit(&module);
    let parsed = dr::load_words(&words).expect("emitted module should parse");
    let body = &parsed.functions[0].blocks[0].instructions;
    assert_eq!(opcodes(body), vec![Op::Variable, Op::Variable, Op::Store, Op::Return]);
    assert_eq!(body[1].result_id, Some(late));
}

#[test]
fn test_decoration_operands() {
    let mut sections = Sections::new();
    crate::emit::write_decoration(&mut sections, 5, &Decoration::new(spirv::Decoration::Binding, vec![3]));
    crate::emit::write_decoration(
        &mut sections,
        6,
        &Decoration::member(1, spirv::Decoration::Offset, vec![16]),
    );
    let words = sections.words(Section::Annotations);
    assert_eq!(
        words,
        &[
            instruction_word(Op::Decorate, 4),
            5,
            spirv::Decoration::Binding as u32,
            3,
            instruction_word(Op::MemberDecorate, 5),
            6,
            1,
            spirv::Decoration::Offset as u32,
            16,
        ]
    );
}
