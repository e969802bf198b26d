//! A small ahead-of-time compiler for a typed expression language,
//! targeting 32-bit x86 assembly in Intel syntax.
//!
//! The pipeline is a straight line: comment stripping and tokenization,
//! a backtracking recursive-descent parse into a typed AST, lowering into
//! a closed instruction IR with frame-slot allocation, a peephole pass
//! over the IR, and finally textual rendering. Each stage either produces
//! its output or a `CompileError`; nothing panics on bad input.

pub mod ast;
pub mod codegen;
pub mod emit;
pub mod error;
pub mod ir;
pub mod parser;
pub mod peephole;
pub mod tokenizer;
pub mod ty;

pub use error::{CompileError, CompileResult};

/// Compile a source string to assembly text.
pub fn compile(source: &str) -> CompileResult<String> {
  let stripped = tokenizer::strip_comments(source);
  let tokens = tokenizer::tokenize(&stripped)?;
  let program = parser::parse(tokens, &stripped)?;
  let mut instrs = codegen::generate(&program)?;
  peephole::optimize(&mut instrs);
  Ok(emit::render(&instrs))
}
