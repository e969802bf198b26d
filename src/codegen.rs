//! Code generation: lower the typed AST into the instruction IR.
//!
//! The generator walks the tree with two threaded pieces of state: the
//! frame-offset cursor (how many bytes of the frame are in use) and the
//! "may this return exit the function" flag. Variables live on a scope
//! stack; lookups walk it innermost-first, so inner declarations shadow
//! outer ones and go out of scope when their block ends.
//!
//! Operand widths always come from the declared type in the variable
//! table, never from a condition node that the parser re-typed to the
//! expected type of its context.

use crate::ast::{BinaryOp, Expr, Function, Program};
use crate::error::{CompileError, CompileResult};
use crate::ir::{Instr, OperandSize, Reg};
use crate::ty::Type;

/// Lower a program into an instruction sequence.
pub fn generate(program: &Program) -> CompileResult<Vec<Instr>> {
  let mut generator = Generator::new();
  generator.instrs.push(Instr::Preamble);
  generator.gen_function(&program.main)?;
  Ok(generator.instrs)
}

/// A declared variable with its frame-relative storage slot.
struct Variable {
  name: String,
  offset: u32,
  ty: Type,
}

/// Per-invocation generation state. A fresh instance is built for every
/// `generate` call, so concurrent compilations never share state.
struct Generator {
  instrs: Vec<Instr>,
  scopes: Vec<Vec<Variable>>,
  frame_offset: u32,
  label_counter: u32,
}

impl Generator {
  fn new() -> Self {
    Self {
      instrs: Vec::new(),
      scopes: Vec::new(),
      frame_offset: 0,
      label_counter: 0,
    }
  }

  fn fresh_label_id(&mut self) -> u32 {
    let id = self.label_counter;
    self.label_counter += 1;
    id
  }

  /// Reserve a frame slot for a new variable. The first variable of a
  /// frame gets offset = its own width; offset 0 is never used.
  fn declare(&mut self, name: &str, ty: Type) -> CompileResult<u32> {
    self.frame_offset += ty.size();
    let offset = self.frame_offset;
    let scope = self
      .scopes
      .last_mut()
      .ok_or_else(|| CompileError::internal("variable declared outside any scope"))?;
    scope.push(Variable {
      name: name.to_string(),
      offset,
      ty,
    });
    Ok(offset)
  }

  /// Innermost-first lookup. An unresolved name here is a parser bug, not
  /// a user diagnostic.
  fn resolve(&self, name: &str) -> CompileResult<&Variable> {
    self
      .scopes
      .iter()
      .rev()
      .find_map(|scope| scope.iter().rev().find(|v| v.name == name))
      .ok_or_else(|| CompileError::internal(format!("unresolved variable \"{name}\"")))
  }

  fn operand_size(&self, ty: Type) -> CompileResult<OperandSize> {
    OperandSize::for_type(ty)
      .ok_or_else(|| CompileError::internal(format!("type {ty:?} has no storage width")))
  }

  fn gen_function(&mut self, function: &Function) -> CompileResult<()> {
    let Expr::Block { children, .. } = &function.body else {
      return Err(CompileError::internal("function body is not a block"));
    };

    // The entry point is emitted under the label the preamble exports.
    let label = if function.name == "main" {
      "_main".to_string()
    } else {
      function.name.clone()
    };
    self.instrs.push(Instr::Label(label));
    self.instrs.push(Instr::FrameSetup);

    // The body is walked directly, without a block end label: a return at
    // function level always exits the function.
    self.scopes.push(Vec::new());
    for child in children {
      self.gen_expression(child, true, None)?;
    }
    self.scopes.pop();

    if !matches!(children.last(), Some(Expr::Return { .. })) {
      self.instrs.push(Instr::FrameTeardown);
      self.instrs.push(Instr::Ret);
    }
    Ok(())
  }

  /// Lower one statement-position expression. `may_return` says whether a
  /// return here exits the enclosing function; `block_end` is the label a
  /// non-exiting return jumps to.
  fn gen_expression(
    &mut self,
    expr: &Expr,
    may_return: bool,
    block_end: Option<&str>,
  ) -> CompileResult<()> {
    match expr {
      Expr::Block { .. } => self.gen_block(expr, may_return),
      Expr::Return { value } => self.gen_return(value, may_return, block_end),
      Expr::VarDeclaration { name, ty, value } => self.gen_var_declaration(name, *ty, value),
      Expr::VarAssignment { name, value, .. } => self.gen_var_assignment(name, value),
      Expr::If {
        condition,
        then_body,
        else_body,
        ..
      } => self.gen_if(
        condition,
        then_body,
        else_body.as_deref(),
        may_return,
        block_end,
      ),
      Expr::Loop { condition, body } => self.gen_loop(condition, body, may_return, block_end),
      Expr::VarValue { .. } | Expr::Constant { .. } | Expr::Operation { .. } => Err(
        CompileError::internal(format!("no lowering for statement {expr:?}")),
      ),
    }
  }

  /// Lower a block. A block with its own declarations gets an isolated
  /// frame region: the offset cursor is snapshotted before its children
  /// and restored after, so the slots are reusable once the block exits.
  fn gen_block(&mut self, block: &Expr, parent_may_return: bool) -> CompileResult<()> {
    let Expr::Block { children, ty } = block else {
      return Err(CompileError::internal("expected a block node"));
    };

    let id = self.fresh_label_id();
    let end_label = format!("__block{id}_end");

    // A value-producing block cannot let an inner return bypass its role:
    // only void blocks propagate the function-exit permission.
    let may_return = parent_may_return && *ty == Type::Void;

    let needs_frame = children
      .iter()
      .any(|child| matches!(child, Expr::VarDeclaration { .. }));

    if needs_frame {
      let saved_offset = self.frame_offset;
      self.scopes.push(Vec::new());
      for child in children {
        self.gen_expression(child, may_return, Some(&end_label))?;
      }
      self.scopes.pop();
      self.frame_offset = saved_offset;
    } else {
      for child in children {
        self.gen_expression(child, may_return, Some(&end_label))?;
      }
    }

    self.instrs.push(Instr::Label(end_label));
    Ok(())
  }

  fn gen_return(
    &mut self,
    value: &Expr,
    may_return: bool,
    block_end: Option<&str>,
  ) -> CompileResult<()> {
    match value {
      Expr::Constant { text, .. } => {
        self.instrs.push(Instr::MoveRegConst {
          reg: Reg::Eax,
          value: text.clone(),
        });
      }
      Expr::VarValue { name, .. } => {
        let (offset, ty) = {
          let var = self.resolve(name)?;
          (var.offset, var.ty)
        };
        self.load_into_eax(offset, ty)?;
      }
      _ => {
        return Err(CompileError::internal(format!(
          "no lowering for return of {value:?}"
        )));
      }
    }

    if may_return {
      self.instrs.push(Instr::FrameTeardown);
      self.instrs.push(Instr::Ret);
    } else {
      let end_label = block_end
        .ok_or_else(|| CompileError::internal("non-exiting return without a block end label"))?;
      self.instrs.push(Instr::Jump(end_label.to_string()));
    }
    Ok(())
  }

  /// Load a variable slot into the return register: plain move at the
  /// natural 32-bit width, zero-extension for narrower unsigned slots,
  /// sign-extension for narrower signed slots.
  fn load_into_eax(&mut self, offset: u32, ty: Type) -> CompileResult<()> {
    let size = self.operand_size(ty)?;
    let instr = if ty.size() < 4 {
      if ty.is_signed() {
        Instr::MoveRegMemSx {
          reg: Reg::Eax,
          size,
          offset,
        }
      } else {
        Instr::MoveRegMemZx {
          reg: Reg::Eax,
          size,
          offset,
        }
      }
    } else {
      Instr::MoveRegMem {
        reg: Reg::Eax,
        size,
        offset,
      }
    };
    self.instrs.push(instr);
    Ok(())
  }

  fn gen_var_declaration(&mut self, name: &str, ty: Type, value: &Expr) -> CompileResult<()> {
    match value {
      Expr::Constant { text, .. } => {
        let offset = self.declare(name, ty)?;
        let size = self.operand_size(ty)?;
        self.instrs.push(Instr::MoveMemConst {
          size,
          offset,
          value: text.clone(),
        });
      }
      Expr::VarValue { name: src_name, .. } => {
        let (src_offset, src_ty) = {
          let src = self.resolve(src_name)?;
          (src.offset, src.ty)
        };
        let offset = self.declare(name, ty)?;
        self.instrs.push(Instr::MoveMemMem {
          dst_size: self.operand_size(ty)?,
          dst_offset: offset,
          src_size: self.operand_size(src_ty)?,
          src_offset,
        });
      }
      Expr::Block { .. } => {
        // The block leaves its value in the return register. It produces
        // a value, so it can never exit the enclosing function.
        self.gen_block(value, false)?;
        let offset = self.declare(name, ty)?;
        let size = self.operand_size(ty)?;
        self.instrs.push(Instr::MoveMemReg {
          size,
          offset,
          reg: Reg::Eax,
        });
      }
      _ => {
        return Err(CompileError::internal(format!(
          "no lowering for initializer {value:?}"
        )));
      }
    }
    Ok(())
  }

  fn gen_var_assignment(&mut self, name: &str, value: &Expr) -> CompileResult<()> {
    let (dst_offset, dst_ty) = {
      let dst = self.resolve(name)?;
      (dst.offset, dst.ty)
    };
    let dst_size = self.operand_size(dst_ty)?;

    match value {
      Expr::Constant { text, .. } => {
        self.instrs.push(Instr::MoveMemConst {
          size: dst_size,
          offset: dst_offset,
          value: text.clone(),
        });
      }
      Expr::VarValue { name: src_name, .. } => {
        let (src_offset, src_ty) = {
          let src = self.resolve(src_name)?;
          (src.offset, src.ty)
        };
        self.instrs.push(Instr::MoveMemMem {
          dst_size,
          dst_offset,
          src_size: self.operand_size(src_ty)?,
          src_offset,
        });
      }
      _ => {
        return Err(CompileError::internal(format!(
          "no lowering for assigned value {value:?}"
        )));
      }
    }
    Ok(())
  }

  fn gen_if(
    &mut self,
    condition: &Expr,
    then_body: &Expr,
    else_body: Option<&Expr>,
    may_return: bool,
    block_end: Option<&str>,
  ) -> CompileResult<()> {
    let id = self.fresh_label_id();
    let else_label = format!("__else{id}");
    let continue_label = format!("__continue{id}");
    // The conditional jump skips the then-branch.
    let skip_target = if else_body.is_some() {
      else_label.clone()
    } else {
      continue_label.clone()
    };

    self.gen_condition(condition, skip_target)?;

    self.gen_expression(then_body, may_return, block_end)?;
    if let Some(else_body) = else_body {
      self.instrs.push(Instr::Jump(continue_label.clone()));
      self.instrs.push(Instr::Label(else_label));
      self.gen_expression(else_body, may_return, block_end)?;
    }
    self.instrs.push(Instr::Label(continue_label));
    Ok(())
  }

  /// Emit the compare/jump pair for a condition: the emitted jump
  /// transfers to `skip_target` when the condition is false. `?` and `@`
  /// share this rule.
  fn gen_condition(&mut self, condition: &Expr, skip_target: String) -> CompileResult<()> {
    match condition {
      Expr::Operation { op, lhs, rhs, .. } => {
        self.gen_compare(lhs, rhs)?;
        // Jump polarity is the logical negation of the source operator.
        let jump = match op {
          BinaryOp::Eq => Instr::JumpNeq(skip_target),
          BinaryOp::Neq => Instr::JumpEq(skip_target),
          BinaryOp::Lt => Instr::JumpGte(skip_target),
          BinaryOp::Lte => Instr::JumpGt(skip_target),
          BinaryOp::Gt => Instr::JumpLte(skip_target),
          BinaryOp::Gte => Instr::JumpLt(skip_target),
          _ => {
            return Err(CompileError::internal(format!(
              "no lowering for condition operator {op:?}"
            )));
          }
        };
        self.instrs.push(jump);
      }
      Expr::VarValue { name, .. } => {
        // A bare variable is compared against zero; zero skips.
        let (offset, ty) = {
          let var = self.resolve(name)?;
          (var.offset, var.ty)
        };
        self.instrs.push(Instr::CmpMemConst {
          size: self.operand_size(ty)?,
          offset,
          value: "0".to_string(),
        });
        self.instrs.push(Instr::JumpEq(skip_target));
      }
      // Boolean literals fold: a false condition always skips, a true
      // one never does.
      Expr::Constant { text, .. } => {
        if text == "0" {
          self.instrs.push(Instr::Jump(skip_target));
        }
      }
      _ => {
        return Err(CompileError::internal(format!(
          "no lowering for condition {condition:?}"
        )));
      }
    }
    Ok(())
  }

  /// Lower a comparison's operands and emit the compare. Variable-first
  /// operand shapes compare straight against memory; anything else is
  /// evaluated into the scratch/return register pair.
  fn gen_compare(&mut self, lhs: &Expr, rhs: &Expr) -> CompileResult<()> {
    match (lhs, rhs) {
      (Expr::VarValue { name: l, .. }, Expr::VarValue { name: r, .. }) => {
        let (lhs_offset, lhs_ty) = {
          let var = self.resolve(l)?;
          (var.offset, var.ty)
        };
        let (rhs_offset, rhs_ty) = {
          let var = self.resolve(r)?;
          (var.offset, var.ty)
        };
        self.instrs.push(Instr::CmpMemMem {
          lhs_size: self.operand_size(lhs_ty)?,
          lhs_offset,
          rhs_size: self.operand_size(rhs_ty)?,
          rhs_offset,
        });
      }
      (Expr::VarValue { name, .. }, Expr::Constant { text, .. }) => {
        let (offset, ty) = {
          let var = self.resolve(name)?;
          (var.offset, var.ty)
        };
        self.instrs.push(Instr::CmpMemConst {
          size: self.operand_size(ty)?,
          offset,
          value: text.clone(),
        });
      }
      // A constant-first compare has no encodable constant/memory form,
      // so it goes through the register pair like any other shape.
      _ => {
        self.gen_value(lhs)?;
        self.instrs.push(Instr::MoveRegReg {
          dst: Reg::Ebx,
          src: Reg::Eax,
        });
        self.gen_value(rhs)?;
        self.instrs.push(Instr::CmpRegReg {
          lhs: Reg::Ebx,
          rhs: Reg::Eax,
        });
      }
    }
    Ok(())
  }

  /// Evaluate a general sub-expression into the return register.
  fn gen_value(&mut self, expr: &Expr) -> CompileResult<()> {
    match expr {
      // A block evaluated for its value can never exit the enclosing
      // function.
      Expr::Block { .. } => self.gen_block(expr, false),
      Expr::Constant { text, .. } => {
        self.instrs.push(Instr::MoveRegConst {
          reg: Reg::Eax,
          value: text.clone(),
        });
        Ok(())
      }
      Expr::VarValue { name, .. } => {
        let (offset, ty) = {
          let var = self.resolve(name)?;
          (var.offset, var.ty)
        };
        self.load_into_eax(offset, ty)
      }
      _ => Err(CompileError::internal(format!(
        "no lowering for value {expr:?}"
      ))),
    }
  }

  /// Pre-test loop; the condition is re-evaluated before every iteration.
  fn gen_loop(
    &mut self,
    condition: &Expr,
    body: &Expr,
    may_return: bool,
    block_end: Option<&str>,
  ) -> CompileResult<()> {
    let id = self.fresh_label_id();
    let begin_label = format!("__w_begin{id}");
    let continue_label = format!("__w_continue{id}");

    self.instrs.push(Instr::Label(begin_label.clone()));
    self.gen_condition(condition, continue_label.clone())?;

    self.gen_expression(body, may_return, block_end)?;
    self.instrs.push(Instr::Jump(begin_label));
    self.instrs.push(Instr::Label(continue_label));
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::parser::parse;
  use crate::tokenizer::tokenize;

  fn gen_source(source: &str) -> Vec<Instr> {
    let program = parse(tokenize(source).unwrap(), source).unwrap();
    generate(&program).unwrap()
  }

  fn gen_error(source: &str) -> CompileError {
    let program = parse(tokenize(source).unwrap(), source).unwrap();
    generate(&program).unwrap_err()
  }

  #[test]
  fn stores_and_returns_a_constant_unchanged() {
    let instrs = gen_source("main() -> i32 { x: i32 = 42 <- x }");
    assert!(instrs.contains(&Instr::MoveMemConst {
      size: OperandSize::Dword,
      offset: 4,
      value: "42".into(),
    }));
    assert!(instrs.contains(&Instr::MoveRegMem {
      reg: Reg::Eax,
      size: OperandSize::Dword,
      offset: 4,
    }));
    assert!(instrs.contains(&Instr::FrameTeardown));
    assert!(instrs.contains(&Instr::Ret));
  }

  #[test]
  fn narrow_returns_extend_by_signedness() {
    let unsigned = gen_source("main() -> u8 { x: u8 = 7 <- x }");
    assert!(unsigned.contains(&Instr::MoveRegMemZx {
      reg: Reg::Eax,
      size: OperandSize::Byte,
      offset: 1,
    }));

    let signed = gen_source("main() -> i16 { x: i16 = 7 <- x }");
    assert!(signed.contains(&Instr::MoveRegMemSx {
      reg: Reg::Eax,
      size: OperandSize::Word,
      offset: 2,
    }));
  }

  #[test]
  fn jump_polarity_negates_the_source_operator() {
    let cases: [(&str, fn(String) -> Instr); 6] = [
      ("==", Instr::JumpNeq),
      ("!=", Instr::JumpEq),
      ("<", Instr::JumpGte),
      ("<=", Instr::JumpGt),
      (">", Instr::JumpLte),
      (">=", Instr::JumpLt),
    ];
    for (op, jump) in cases {
      let source = format!("main() {{ x: i32 = 1 y: i32 = 2 ? (x {op} y) {{ }} : {{ }} }}");
      let instrs = gen_source(&source);
      let expected = jump("__else0".to_string());
      assert!(
        instrs.contains(&expected),
        "{op} did not emit {expected:?}"
      );
    }
  }

  #[test]
  fn variable_vs_constant_compares_memory_directly() {
    let instrs = gen_source("main() { x: i32 = 1 ? (x == 3) { } }");
    assert!(instrs.contains(&Instr::CmpMemConst {
      size: OperandSize::Dword,
      offset: 4,
      value: "3".into(),
    }));
    // No else: the skip jump targets the continue label.
    assert!(instrs.contains(&Instr::JumpNeq("__continue0".into())));
  }

  #[test]
  fn general_comparison_operands_go_through_registers() {
    let source = "main() { x: bool = true ? ({ -> bool { <- true } } == x) { } }";
    let instrs = gen_source(source);
    assert!(instrs.contains(&Instr::MoveRegReg {
      dst: Reg::Ebx,
      src: Reg::Eax,
    }));
    assert!(instrs.contains(&Instr::CmpRegReg {
      lhs: Reg::Ebx,
      rhs: Reg::Eax,
    }));
  }

  #[test]
  fn bare_variable_condition_compares_to_zero() {
    let instrs = gen_source("main() { x: i32 = 0 ? (x) { <- 1 } : { <- 0 } }");
    assert!(instrs.contains(&Instr::CmpMemConst {
      size: OperandSize::Dword,
      offset: 4,
      value: "0".into(),
    }));
    assert!(instrs.contains(&Instr::JumpEq("__else0".into())));
  }

  #[test]
  fn block_with_declarations_restores_the_frame_cursor() {
    let instrs = gen_source("main() { { x: i32 = 1 } y: i32 = 2 }");
    // Both declarations land in the same reusable slot.
    let stores: Vec<_> = instrs
      .iter()
      .filter_map(|i| match i {
        Instr::MoveMemConst { offset, .. } => Some(*offset),
        _ => None,
      })
      .collect();
    assert_eq!(stores, vec![4, 4]);
  }

  #[test]
  fn block_without_declarations_leaves_the_cursor_alone() {
    let instrs = gen_source("main() { { } x: i32 = 1 }");
    assert!(instrs.contains(&Instr::MoveMemConst {
      size: OperandSize::Dword,
      offset: 4,
      value: "1".into(),
    }));
  }

  #[test]
  fn return_in_then_branch_of_void_body_exits_the_function() {
    let instrs = gen_source("main() { x: i32 = 1 y: i32 = 2 ? (x == y) { <- x } : { <- y } }");
    // Both branch returns tear down the frame; no return jumps to a block
    // end label.
    let teardowns = instrs
      .iter()
      .filter(|i| matches!(i, Instr::FrameTeardown))
      .count();
    assert!(teardowns >= 2);
    assert!(!instrs.iter().any(|i| matches!(
      i,
      Instr::Jump(label) if label.starts_with("__block")
    )));
  }

  #[test]
  fn return_in_value_block_stays_inside_the_function() {
    let instrs = gen_source("main() { x: i32 = { -> i32 { <- 1 } } <- x }");
    // The inner return jumps to its block end label instead of exiting.
    assert!(instrs.contains(&Instr::Jump("__block1_end".into())));
    assert!(instrs.contains(&Instr::MoveMemReg {
      size: OperandSize::Dword,
      offset: 4,
      reg: Reg::Eax,
    }));
    // Exactly one frame teardown: the function's own return of x.
    let teardowns = instrs
      .iter()
      .filter(|i| matches!(i, Instr::FrameTeardown))
      .count();
    assert_eq!(teardowns, 1);
  }

  #[test]
  fn loop_lowers_to_pretest_with_backward_jump() {
    let instrs = gen_source("main() { x: bool = true @ (x) { x = false } }");
    let begin = instrs
      .iter()
      .position(|i| matches!(i, Instr::Label(l) if l == "__w_begin0"))
      .unwrap();
    let exit = instrs
      .iter()
      .position(|i| matches!(i, Instr::JumpEq(l) if l == "__w_continue0"))
      .unwrap();
    let back = instrs
      .iter()
      .position(|i| matches!(i, Instr::Jump(l) if l == "__w_begin0"))
      .unwrap();
    let cont = instrs
      .iter()
      .position(|i| matches!(i, Instr::Label(l) if l == "__w_continue0"))
      .unwrap();
    assert!(begin < exit && exit < back && back < cont);
  }

  #[test]
  fn assignment_copies_between_slots() {
    let instrs = gen_source("main() { x: i32 = 1 y: i32 = 2 x = y }");
    assert!(instrs.contains(&Instr::MoveMemMem {
      dst_size: OperandSize::Dword,
      dst_offset: 4,
      src_size: OperandSize::Dword,
      src_offset: 8,
    }));
  }

  #[test]
  fn unresolved_variables_abort_loudly() {
    // Hand-built tree bypassing the parser's scope checks.
    let program = Program {
      main: Function {
        name: "main".into(),
        body: Expr::Block {
          children: vec![Expr::Return {
            value: Box::new(Expr::VarValue {
              name: "ghost".into(),
              ty: Type::I32,
            }),
          }],
          ty: Type::Void,
        },
      },
    };
    let err = generate(&program).unwrap_err();
    assert!(err.to_string().contains("unresolved variable \"ghost\""));
  }

  #[test]
  fn boolean_literal_conditions_fold() {
    // A true literal emits neither a compare nor a jump.
    let instrs = gen_source("main() { ? (true) { } }");
    assert!(!instrs.iter().any(|i| matches!(
      i,
      Instr::CmpMemConst { .. }
        | Instr::CmpMemMem { .. }
        | Instr::CmpRegReg { .. }
        | Instr::JumpEq(_)
    )));

    // A false literal always skips the then-branch.
    let instrs = gen_source("main() { ? (false) { } : { } }");
    assert!(instrs.contains(&Instr::Jump("__else0".into())));
  }

  #[test]
  fn comparison_loop_conditions_lower_like_branch_conditions() {
    let instrs = gen_source("main() { x: i32 = 1 @ (x == x) { } }");
    assert!(instrs.contains(&Instr::CmpMemMem {
      lhs_size: OperandSize::Dword,
      lhs_offset: 4,
      rhs_size: OperandSize::Dword,
      rhs_offset: 4,
    }));
    assert!(instrs.contains(&Instr::JumpNeq("__w_continue0".into())));
    assert!(instrs.contains(&Instr::Jump("__w_begin0".into())));
  }

  #[test]
  fn constant_first_comparisons_go_through_registers() {
    let instrs = gen_source("main() { x: i32 = 1 ? (3 == x) { } }");
    assert!(instrs.contains(&Instr::MoveRegConst {
      reg: Reg::Eax,
      value: "3".into(),
    }));
    assert!(instrs.contains(&Instr::MoveRegReg {
      dst: Reg::Ebx,
      src: Reg::Eax,
    }));
    assert!(instrs.contains(&Instr::CmpRegReg {
      lhs: Reg::Ebx,
      rhs: Reg::Eax,
    }));
  }

  #[test]
  fn value_block_operands_never_exit_the_function() {
    let instrs = gen_source("main() { x: bool = true ? ({ -> bool { <- true } } == x) { } }");
    // The operand block's return jumps to its end label; the only frame
    // teardown is the function's own.
    assert!(instrs.iter().any(|i| matches!(
      i,
      Instr::Jump(label) if label.starts_with("__block")
    )));
    let teardowns = instrs
      .iter()
      .filter(|i| matches!(i, Instr::FrameTeardown))
      .count();
    assert_eq!(teardowns, 1);
  }

  #[test]
  fn logical_condition_operators_abort_loudly() {
    let err = gen_error("main() { x: bool = true y: bool = true ? (x && y) { } }");
    assert!(err.to_string().contains("no lowering for condition operator"));
  }

  #[test]
  fn operation_returns_abort_loudly() {
    let err = gen_error("main() { x: i32 = 1 <- x + x }");
    assert!(err.to_string().contains("no lowering for return"));
  }

  #[test]
  fn arithmetic_statements_abort_loudly() {
    let err = gen_error("main() { x: i32 = 1 x + x }");
    assert!(err.to_string().contains("no lowering for statement"));
  }
}
