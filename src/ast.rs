//! Typed abstract syntax tree produced by the parser.
//!
//! Every node owns its children exclusively; nothing is shared or cyclic,
//! and nodes are never mutated once parsing completes. Each expression
//! carries the `Type` of its evaluated result, resolved at construction
//! time.

use crate::ty::{self, Type};

/// Binary operators recognised by the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
  Add,
  Sub,
  Mul,
  Div,
  Mod,
  Pow,
  Eq,
  Neq,
  Lt,
  Lte,
  Gt,
  Gte,
  And,
  AndLazy,
  Or,
  OrLazy,
}

impl BinaryOp {
  pub fn is_comparison(self) -> bool {
    matches!(
      self,
      Self::Eq | Self::Neq | Self::Lt | Self::Lte | Self::Gt | Self::Gte
    )
  }

  pub fn is_logical(self) -> bool {
    matches!(self, Self::And | Self::AndLazy | Self::Or | Self::OrLazy)
  }
}

/// Expression tree. Statements with no value are `Void`-typed expressions;
/// blocks are expressions too, so a block can appear as the initializer of
/// a declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
  Block {
    children: Vec<Expr>,
    ty: Type,
  },
  Return {
    value: Box<Expr>,
  },
  VarDeclaration {
    name: String,
    ty: Type,
    value: Box<Expr>,
  },
  VarAssignment {
    name: String,
    ty: Type,
    value: Box<Expr>,
  },
  VarValue {
    name: String,
    ty: Type,
  },
  Constant {
    text: String,
    ty: Type,
  },
  Operation {
    op: BinaryOp,
    lhs: Box<Expr>,
    rhs: Box<Expr>,
    ty: Type,
  },
  If {
    condition: Box<Expr>,
    then_body: Box<Expr>,
    else_body: Option<Box<Expr>>,
    ty: Type,
  },
  Loop {
    condition: Box<Expr>,
    body: Box<Expr>,
  },
}

impl Expr {
  /// Build an operation node, resolving its result type: comparisons and
  /// logical operators yield `Bool`, arithmetic promotes the operand types.
  pub fn operation(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
    let ty = if op.is_comparison() || op.is_logical() {
      Type::Bool
    } else {
      ty::promote(lhs.ty(), rhs.ty())
    };
    Self::Operation {
      op,
      lhs: Box::new(lhs),
      rhs: Box::new(rhs),
      ty,
    }
  }

  /// The type of this expression's evaluated result.
  pub fn ty(&self) -> Type {
    match self {
      Self::Block { ty, .. }
      | Self::VarAssignment { ty, .. }
      | Self::VarValue { ty, .. }
      | Self::Constant { ty, .. }
      | Self::Operation { ty, .. }
      | Self::If { ty, .. } => *ty,
      Self::Return { .. } | Self::VarDeclaration { .. } | Self::Loop { .. } => Type::Void,
    }
  }
}

/// A function definition: a name and a body block.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
  pub name: String,
  pub body: Expr,
}

/// A compilation unit. The language currently supports exactly one
/// function, conventionally named `main`.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
  pub main: Function,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn constant(text: &str, ty: Type) -> Expr {
    Expr::Constant {
      text: text.into(),
      ty,
    }
  }

  #[test]
  fn comparison_operations_are_bool() {
    let op = Expr::operation(
      BinaryOp::Eq,
      constant("1", Type::I32),
      constant("2", Type::I32),
    );
    assert_eq!(op.ty(), Type::Bool);
  }

  #[test]
  fn arithmetic_operations_promote() {
    let op = Expr::operation(
      BinaryOp::Add,
      constant("1", Type::I8),
      constant("2", Type::U32),
    );
    assert_eq!(op.ty(), Type::I32);
  }

  #[test]
  fn statements_are_void() {
    let ret = Expr::Return {
      value: Box::new(constant("1", Type::I32)),
    };
    assert_eq!(ret.ty(), Type::Void);
  }
}
