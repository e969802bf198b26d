//! Architecture-neutral instruction IR emitted by the code generator.
//!
//! The set is closed: every variant has exactly one textual rendering in
//! `emit`, and the generator never produces anything outside it. Operands
//! are frame offsets (`[ebp - offset]`), literal texts, labels, or one of
//! the two register roles the backend relies on.

use crate::ty::Type;

/// Register roles. `Eax` holds return values, `Ebx` is the single scratch
/// register; `ebp` is managed by the frame setup/teardown instructions and
/// never appears as an operand here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg {
  Eax,
  Ebx,
}

impl Reg {
  pub fn name(self) -> &'static str {
    match self {
      Self::Eax => "eax",
      Self::Ebx => "ebx",
    }
  }
}

/// Memory operand width, rendered as the Intel-syntax `PTR` size keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandSize {
  Byte,
  Word,
  Dword,
  Qword,
}

impl OperandSize {
  /// The operand size used to address a value of type `ty`, `None` for
  /// zero-width types.
  pub fn for_type(ty: Type) -> Option<Self> {
    match ty.size() {
      1 => Some(Self::Byte),
      2 => Some(Self::Word),
      4 => Some(Self::Dword),
      8 => Some(Self::Qword),
      _ => None,
    }
  }

  pub fn keyword(self) -> &'static str {
    match self {
      Self::Byte => "BYTE",
      Self::Word => "WORD",
      Self::Dword => "DWORD",
      Self::Qword => "QWORD",
    }
  }
}

/// One abstract instruction. Frame offsets are positive distances below
/// the frame base, addressed as `[ebp - offset]`.
#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
  /// Architecture/syntax preamble and text-section marker.
  Preamble,
  Label(String),
  FrameSetup,
  FrameTeardown,
  Ret,
  Call(String),

  MoveRegConst {
    reg: Reg,
    value: String,
  },
  MoveRegMem {
    reg: Reg,
    size: OperandSize,
    offset: u32,
  },
  /// Zero-extending load, for narrow unsigned slots.
  MoveRegMemZx {
    reg: Reg,
    size: OperandSize,
    offset: u32,
  },
  /// Sign-extending load, for narrow signed slots.
  MoveRegMemSx {
    reg: Reg,
    size: OperandSize,
    offset: u32,
  },
  MoveRegReg {
    dst: Reg,
    src: Reg,
  },
  MoveMemConst {
    size: OperandSize,
    offset: u32,
    value: String,
  },
  MoveMemReg {
    size: OperandSize,
    offset: u32,
    reg: Reg,
  },
  /// Memory-to-memory copy, bounced through the scratch register.
  MoveMemMem {
    dst_size: OperandSize,
    dst_offset: u32,
    src_size: OperandSize,
    src_offset: u32,
  },

  CmpMemConst {
    size: OperandSize,
    offset: u32,
    value: String,
  },
  /// Memory-to-memory compare, left side bounced through the scratch
  /// register.
  CmpMemMem {
    lhs_size: OperandSize,
    lhs_offset: u32,
    rhs_size: OperandSize,
    rhs_offset: u32,
  },
  CmpRegReg {
    lhs: Reg,
    rhs: Reg,
  },

  Jump(String),
  JumpEq(String),
  JumpNeq(String),
  JumpLt(String),
  JumpLte(String),
  JumpGt(String),
  JumpGte(String),
}
