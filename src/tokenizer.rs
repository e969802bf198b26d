//! Lexical analysis: turns the raw input string into a vector of tokens.
//!
//! The tokenizer is intentionally tiny – it knows nothing about semantics
//! beyond recognising symbols, literals and identifiers. Multi-character
//! symbols are matched before single-character ones to avoid ambiguity.
//! Every token records the byte offset it starts at, for error
//! line-mapping later in the pipeline.

use crate::error::{CompileError, CompileResult};

/// Kinds of tokens recognised by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
  Identifier,
  Constant,
  ParOpen,
  ParClose,
  BraceOpen,
  BraceClose,
  Return,     // <-
  ReturnType, // ->
  Colon,
  Equals,
  EqEq,
  NotEq,
  Lt,
  Le,
  Gt,
  Ge,
  Question,
  At,
  Plus,
  Minus,
  Star,
  Slash,
  Percent,
  Caret,
  Amp,
  AmpAmp,
  Pipe,
  PipePipe,
}

/// Thin wrapper for lexical information needed by later stages.
#[derive(Debug, Clone)]
pub struct Token {
  pub kind: TokenKind,
  pub text: String,
  pub loc: usize,
}

impl Token {
  /// Convenience constructor to keep the `tokenize` loop readable.
  pub fn new(kind: TokenKind, loc: usize, text: impl Into<String>) -> Self {
    Self {
      kind,
      text: text.into(),
      loc,
    }
  }

  /// Human-friendly description used in diagnostics.
  pub fn describe(&self) -> &str {
    match self.kind {
      TokenKind::Identifier | TokenKind::Constant => &self.text,
      TokenKind::ParOpen => "(",
      TokenKind::ParClose => ")",
      TokenKind::BraceOpen => "{",
      TokenKind::BraceClose => "}",
      TokenKind::Return => "<-",
      TokenKind::ReturnType => "->",
      TokenKind::Colon => ":",
      TokenKind::Equals => "=",
      TokenKind::EqEq => "==",
      TokenKind::NotEq => "!=",
      TokenKind::Lt => "<",
      TokenKind::Le => "<=",
      TokenKind::Gt => ">",
      TokenKind::Ge => ">=",
      TokenKind::Question => "?",
      TokenKind::At => "@",
      TokenKind::Plus => "+",
      TokenKind::Minus => "-",
      TokenKind::Star => "*",
      TokenKind::Slash => "/",
      TokenKind::Percent => "%",
      TokenKind::Caret => "^",
      TokenKind::Amp => "&",
      TokenKind::AmpAmp => "&&",
      TokenKind::Pipe => "|",
      TokenKind::PipePipe => "||",
    }
  }
}

/// Remove `//` comments, preserving line structure so byte offsets keep
/// mapping to the right line.
pub fn strip_comments(source: &str) -> String {
  let mut result = String::with_capacity(source.len());
  for line in source.split_inclusive('\n') {
    match line.find("//") {
      Some(pos) => {
        result.push_str(&line[..pos]);
        if line.ends_with('\n') {
          result.push('\n');
        }
      }
      None => result.push_str(line),
    }
  }
  result
}

/// Lex the input into a flat vector of tokens.
pub fn tokenize(input: &str) -> CompileResult<Vec<Token>> {
  let mut tokens = Vec::new();
  let bytes = input.as_bytes();
  let mut i = 0;

  while i < bytes.len() {
    let c = bytes[i];
    if c.is_ascii_whitespace() {
      i += 1;
      continue;
    }

    if c.is_ascii_alphabetic() {
      let start = i;
      i += 1;
      while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
        i += 1;
      }
      let word = &input[start..i];
      // Boolean literals lex as the constants 1 and 0.
      let token = match word {
        "true" => Token::new(TokenKind::Constant, start, "1"),
        "false" => Token::new(TokenKind::Constant, start, "0"),
        _ => Token::new(TokenKind::Identifier, start, word),
      };
      tokens.push(token);
      continue;
    }

    if c.is_ascii_digit() {
      let start = i;
      i += 1;
      while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
      }
      tokens.push(Token::new(TokenKind::Constant, start, &input[start..i]));
      continue;
    }

    let two = [
      ("<-", TokenKind::Return),
      ("->", TokenKind::ReturnType),
      ("==", TokenKind::EqEq),
      ("!=", TokenKind::NotEq),
      ("<=", TokenKind::Le),
      (">=", TokenKind::Ge),
      ("&&", TokenKind::AmpAmp),
      ("||", TokenKind::PipePipe),
    ];
    if let Some((text, kind)) = two.into_iter().find(|(op, _)| input[i..].starts_with(op)) {
      tokens.push(Token::new(kind, i, ""));
      i += text.len();
      continue;
    }

    let kind = match c {
      b'(' => Some(TokenKind::ParOpen),
      b')' => Some(TokenKind::ParClose),
      b'{' => Some(TokenKind::BraceOpen),
      b'}' => Some(TokenKind::BraceClose),
      b':' => Some(TokenKind::Colon),
      b'=' => Some(TokenKind::Equals),
      b'<' => Some(TokenKind::Lt),
      b'>' => Some(TokenKind::Gt),
      b'?' => Some(TokenKind::Question),
      b'@' => Some(TokenKind::At),
      b'+' => Some(TokenKind::Plus),
      b'-' => Some(TokenKind::Minus),
      b'*' => Some(TokenKind::Star),
      b'/' => Some(TokenKind::Slash),
      b'%' => Some(TokenKind::Percent),
      b'^' => Some(TokenKind::Caret),
      b'&' => Some(TokenKind::Amp),
      b'|' => Some(TokenKind::Pipe),
      _ => None,
    };
    match kind {
      Some(kind) => {
        tokens.push(Token::new(kind, i, ""));
        i += 1;
      }
      None => {
        let invalid_char = input[i..].chars().next().unwrap_or('\0');
        return Err(CompileError::at(
          input,
          i,
          format!("unexpected character: '{invalid_char}'"),
        ));
      }
    }
  }

  Ok(tokens)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn kinds(input: &str) -> Vec<TokenKind> {
    tokenize(input)
      .unwrap()
      .into_iter()
      .map(|t| t.kind)
      .collect()
  }

  #[test]
  fn lexes_a_declaration() {
    assert_eq!(
      kinds("x: i32 = 5"),
      vec![
        TokenKind::Identifier,
        TokenKind::Colon,
        TokenKind::Identifier,
        TokenKind::Equals,
        TokenKind::Constant,
      ]
    );
  }

  #[test]
  fn arrows_win_over_single_chars() {
    assert_eq!(kinds("<- -> < -"), vec![
      TokenKind::Return,
      TokenKind::ReturnType,
      TokenKind::Lt,
      TokenKind::Minus,
    ]);
  }

  #[test]
  fn boolean_literals_become_constants() {
    let tokens = tokenize("true false trueish").unwrap();
    assert_eq!(tokens[0].kind, TokenKind::Constant);
    assert_eq!(tokens[0].text, "1");
    assert_eq!(tokens[1].kind, TokenKind::Constant);
    assert_eq!(tokens[1].text, "0");
    assert_eq!(tokens[2].kind, TokenKind::Identifier);
    assert_eq!(tokens[2].text, "trueish");
  }

  #[test]
  fn records_byte_offsets() {
    let tokens = tokenize("ab  ==\ncd").unwrap();
    assert_eq!(tokens[0].loc, 0);
    assert_eq!(tokens[1].loc, 4);
    assert_eq!(tokens[2].loc, 7);
  }

  #[test]
  fn rejects_unknown_characters() {
    let err = tokenize("x # y").unwrap_err();
    assert!(err.to_string().contains("unexpected character: '#'"));
  }

  #[test]
  fn strips_line_comments() {
    let source = "a // comment\nb\n";
    assert_eq!(strip_comments(source), "a \nb\n");
  }
}
