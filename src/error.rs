//! Shared error utilities used across the compilation pipeline.
//!
//! Diagnostics are kept lightweight on purpose – fatal errors carry a byte
//! offset into the source and are rendered with the offending line and a
//! caret pointing at the column.

use snafu::Snafu;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Snafu)]
pub enum CompileError {
  #[snafu(display("line {line}: {message}\n{src_line}\n{marker}"))]
  WithLocation {
    line: usize,
    message: String,
    src_line: String,
    marker: String,
  },

  /// A bug in an earlier stage surfaced later in the pipeline. Not a
  /// user-facing diagnostic; it still aborts compilation with full context.
  #[snafu(display("internal error: {message}"))]
  Internal { message: String },
}

impl CompileError {
  /// Construct an error anchored at a specific byte offset in the source.
  pub fn at(source: &str, loc: usize, message: impl Into<String>) -> Self {
    let safe_loc = loc.min(source.len());
    let line = line_of(source, safe_loc);
    let line_start = source[..safe_loc]
      .rfind('\n')
      .map(|i| i + 1)
      .unwrap_or(0);
    let src_line: String = source[line_start..]
      .chars()
      .take_while(|&c| c != '\n')
      .collect();
    let column = source[line_start..safe_loc].chars().count();
    let marker = format!("{}^", " ".repeat(column));
    Self::WithLocation {
      line,
      message: message.into(),
      src_line,
      marker,
    }
  }

  pub fn internal(message: impl Into<String>) -> Self {
    Self::Internal {
      message: message.into(),
    }
  }
}

/// 1-based line number of the byte at `loc`.
pub fn line_of(source: &str, loc: usize) -> usize {
  let safe_loc = loc.min(source.len());
  source[..safe_loc].bytes().filter(|&b| b == b'\n').count() + 1
}
