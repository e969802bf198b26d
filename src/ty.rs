//! The closed type enumeration of the language.
//!
//! Every expression node carries exactly one `Type` for its evaluated
//! result; statements with no value are `Void`. The promotion rule for
//! mixed-width arithmetic picks the operand type with the larger byte
//! width, staying unsigned only when both operands are unsigned.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
  Void,
  Bool,
  I8,
  I16,
  I32,
  I64,
  U8,
  U16,
  U32,
  U64,
}

impl Type {
  /// Resolve a type name as it appears in source, e.g. `i32` or `bool`.
  pub fn from_name(name: &str) -> Option<Self> {
    match name {
      "i8" => Some(Self::I8),
      "i16" => Some(Self::I16),
      "i32" => Some(Self::I32),
      "i64" => Some(Self::I64),
      "u8" => Some(Self::U8),
      "u16" => Some(Self::U16),
      "u32" => Some(Self::U32),
      "u64" => Some(Self::U64),
      "bool" => Some(Self::Bool),
      _ => None,
    }
  }

  /// Storage width in bytes.
  pub fn size(self) -> u32 {
    match self {
      Self::Void => 0,
      Self::Bool | Self::I8 | Self::U8 => 1,
      Self::I16 | Self::U16 => 2,
      Self::I32 | Self::U32 => 4,
      Self::I64 | Self::U64 => 8,
    }
  }

  pub fn is_unsigned(self) -> bool {
    matches!(self, Self::U8 | Self::U16 | Self::U32 | Self::U64)
  }

  pub fn is_signed(self) -> bool {
    matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64)
  }
}

/// Result type of a binary arithmetic operation over `lhs` and `rhs`.
///
/// The wider operand wins. The result is unsigned only when both operands
/// are unsigned; otherwise it is the signed type of the winning width.
pub fn promote(lhs: Type, rhs: Type) -> Type {
  let width = lhs.size().max(rhs.size());
  let unsigned = lhs.is_unsigned() && rhs.is_unsigned();
  match (width, unsigned) {
    (1, true) => Type::U8,
    (1, false) => Type::I8,
    (2, true) => Type::U16,
    (2, false) => Type::I16,
    (4, true) => Type::U32,
    (4, false) => Type::I32,
    (8, true) => Type::U64,
    (8, false) => Type::I64,
    _ => Type::Void,
  }
}
