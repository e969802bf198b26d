//! Final rendering of the instruction IR into Intel-syntax assembly text.
//!
//! Every `Instr` variant has exactly one template here, so the generated
//! assembly is fully determined by the instruction sequence. Memory-to-
//! memory shapes bounce through the scratch register, since x86 has no
//! direct mem/mem forms.

use crate::ir::{Instr, OperandSize};
use std::fmt::Write;

fn mem(size: OperandSize, offset: u32) -> String {
  format!("{} PTR [ebp-{offset}]", size.keyword())
}

/// Render an instruction sequence as assembly source.
pub fn render(instrs: &[Instr]) -> String {
  let mut out = String::new();
  for instr in instrs {
    render_one(&mut out, instr);
  }
  out
}

fn render_one(out: &mut String, instr: &Instr) {
  // Writing to a String cannot fail.
  let _ = match instr {
    Instr::Preamble => write!(
      out,
      "\t.intel_syntax noprefix\n\t.global _main\n\n\t.text\n"
    ),
    Instr::Label(name) => write!(out, "{name}:\n"),
    Instr::FrameSetup => write!(out, "\tpush ebp\n\tmov ebp, esp\n"),
    Instr::FrameTeardown => write!(out, "\tmov esp, ebp\n\tpop ebp\n"),
    Instr::Ret => write!(out, "\tret\n"),
    Instr::Call(name) => write!(out, "\tcall {name}\n"),

    Instr::MoveRegConst { reg, value } => write!(out, "\tmov {}, {value}\n", reg.name()),
    Instr::MoveRegMem { reg, size, offset } => {
      write!(out, "\tmov {}, {}\n", reg.name(), mem(*size, *offset))
    }
    Instr::MoveRegMemZx { reg, size, offset } => {
      write!(out, "\tmovzx {}, {}\n", reg.name(), mem(*size, *offset))
    }
    Instr::MoveRegMemSx { reg, size, offset } => {
      write!(out, "\tmovsx {}, {}\n", reg.name(), mem(*size, *offset))
    }
    Instr::MoveRegReg { dst, src } => write!(out, "\tmov {}, {}\n", dst.name(), src.name()),
    Instr::MoveMemConst {
      size,
      offset,
      value,
    } => write!(out, "\tmov {}, {value}\n", mem(*size, *offset)),
    Instr::MoveMemReg { size, offset, reg } => {
      write!(out, "\tmov {}, {}\n", mem(*size, *offset), reg.name())
    }
    Instr::MoveMemMem {
      dst_size,
      dst_offset,
      src_size,
      src_offset,
    } => write!(
      out,
      "\tmov ebx, {}\n\tmov {}, ebx\n",
      mem(*src_size, *src_offset),
      mem(*dst_size, *dst_offset)
    ),

    Instr::CmpMemConst {
      size,
      offset,
      value,
    } => write!(out, "\tcmp {}, {value}\n", mem(*size, *offset)),
    Instr::CmpMemMem {
      lhs_size,
      lhs_offset,
      rhs_size,
      rhs_offset,
    } => write!(
      out,
      "\tmov ebx, {}\n\tcmp ebx, {}\n",
      mem(*lhs_size, *lhs_offset),
      mem(*rhs_size, *rhs_offset)
    ),
    Instr::CmpRegReg { lhs, rhs } => write!(out, "\tcmp {}, {}\n", lhs.name(), rhs.name()),

    Instr::Jump(label) => write!(out, "\tjmp {label}\n"),
    Instr::JumpEq(label) => write!(out, "\tje {label}\n"),
    Instr::JumpNeq(label) => write!(out, "\tjne {label}\n"),
    Instr::JumpLt(label) => write!(out, "\tjl {label}\n"),
    Instr::JumpLte(label) => write!(out, "\tjle {label}\n"),
    Instr::JumpGt(label) => write!(out, "\tjg {label}\n"),
    Instr::JumpGte(label) => write!(out, "\tjge {label}\n"),
  };
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ir::Reg;

  #[test]
  fn renders_the_preamble() {
    let asm = render(&[Instr::Preamble]);
    assert!(asm.contains(".intel_syntax noprefix"));
    assert!(asm.contains(".global _main"));
    assert!(asm.contains(".text"));
  }

  #[test]
  fn renders_frame_setup_and_teardown() {
    let asm = render(&[Instr::FrameSetup, Instr::FrameTeardown, Instr::Ret]);
    assert_eq!(
      asm,
      "\tpush ebp\n\tmov ebp, esp\n\tmov esp, ebp\n\tpop ebp\n\tret\n"
    );
  }

  #[test]
  fn labels_get_no_indentation() {
    let asm = render(&[Instr::Label("_main".into())]);
    assert_eq!(asm, "_main:\n");
  }

  #[test]
  fn sized_memory_operands_carry_ptr_keywords() {
    let asm = render(&[Instr::MoveMemConst {
      size: OperandSize::Byte,
      offset: 1,
      value: "7".into(),
    }]);
    assert_eq!(asm, "\tmov BYTE PTR [ebp-1], 7\n");
  }

  #[test]
  fn extending_loads_pick_the_right_mnemonic() {
    let zx = render(&[Instr::MoveRegMemZx {
      reg: Reg::Eax,
      size: OperandSize::Byte,
      offset: 1,
    }]);
    assert_eq!(zx, "\tmovzx eax, BYTE PTR [ebp-1]\n");

    let sx = render(&[Instr::MoveRegMemSx {
      reg: Reg::Eax,
      size: OperandSize::Word,
      offset: 2,
    }]);
    assert_eq!(sx, "\tmovsx eax, WORD PTR [ebp-2]\n");
  }

  #[test]
  fn memory_to_memory_moves_bounce_through_ebx() {
    let asm = render(&[Instr::MoveMemMem {
      dst_size: OperandSize::Dword,
      dst_offset: 4,
      src_size: OperandSize::Dword,
      src_offset: 8,
    }]);
    assert_eq!(
      asm,
      "\tmov ebx, DWORD PTR [ebp-8]\n\tmov DWORD PTR [ebp-4], ebx\n"
    );
  }

  #[test]
  fn memory_to_memory_compares_bounce_through_ebx() {
    let asm = render(&[Instr::CmpMemMem {
      lhs_size: OperandSize::Dword,
      lhs_offset: 4,
      rhs_size: OperandSize::Dword,
      rhs_offset: 8,
    }]);
    assert_eq!(
      asm,
      "\tmov ebx, DWORD PTR [ebp-4]\n\tcmp ebx, DWORD PTR [ebp-8]\n"
    );
  }

  #[test]
  fn each_jump_variant_has_its_mnemonic() {
    let cases: [(Instr, &str); 7] = [
      (Instr::Jump("L".into()), "jmp"),
      (Instr::JumpEq("L".into()), "je"),
      (Instr::JumpNeq("L".into()), "jne"),
      (Instr::JumpLt("L".into()), "jl"),
      (Instr::JumpLte("L".into()), "jle"),
      (Instr::JumpGt("L".into()), "jg"),
      (Instr::JumpGte("L".into()), "jge"),
    ];
    for (instr, mnemonic) in cases {
      assert_eq!(render(&[instr]), format!("\t{mnemonic} L\n"));
    }
  }
}
