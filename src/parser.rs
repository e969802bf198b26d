//! Recursive-descent parser producing one typed `Program` per token stream.
//!
//! The grammar is recognised by ordered-choice backtracking: every
//! alternative is attempted against a saved cursor and the cursor is
//! rewound when it reports no-match. A close-brace that no alternative
//! claims is the control signal that the current block is fully parsed –
//! any other unclaimed token is a fatal error.
//!
//! Types are resolved during parsing: constants adopt the expected type of
//! their context, variable references are typed by scope lookup, and
//! operations resolve through the promotion rule. A type mismatch is a
//! plain parse failure, driving backtracking like any other no-match.

use crate::ast::{BinaryOp, Expr, Function, Program};
use crate::error::{CompileError, CompileResult};
use crate::tokenizer::{Token, TokenKind};
use crate::ty::Type;

/// Outcome of one grammar alternative: `Ok(None)` is no-match (the caller
/// rewinds the cursor and tries the next alternative), `Err` is fatal and
/// unwinds the whole parse.
type Attempt<T> = CompileResult<Option<T>>;

/// Parse a token stream into a program.
pub fn parse(tokens: Vec<Token>, source: &str) -> CompileResult<Program> {
  let mut parser = Parser::new(tokens, source);
  let main = parser.parse_function()?;

  if let Some(token) = parser.peek() {
    let got = token.describe().to_string();
    return Err(CompileError::at(
      source,
      token.loc,
      format!("unexpected token \"{got}\" after function body"),
    ));
  }

  Ok(Program { main })
}

/// Cursor over the token vector plus the scope-aware name→type table the
/// type resolver needs. One instance lives per `parse` call; nothing is
/// shared across compilations.
struct Parser<'a> {
  tokens: Vec<Token>,
  source: &'a str,
  pos: usize,
  scopes: Vec<Vec<(String, Type)>>,
}

impl<'a> Parser<'a> {
  fn new(tokens: Vec<Token>, source: &'a str) -> Self {
    Self {
      tokens,
      source,
      pos: 0,
      scopes: Vec::new(),
    }
  }

  fn peek(&self) -> Option<&Token> {
    self.tokens.get(self.pos)
  }

  /// Consume the current token if it has the given kind.
  fn eat(&mut self, kind: TokenKind) -> bool {
    if let Some(token) = self.peek()
      && token.kind == kind
    {
      self.pos += 1;
      return true;
    }
    false
  }

  /// Consume the current token if it is an identifier, returning its text.
  fn eat_identifier(&mut self) -> Option<String> {
    if let Some(token) = self.peek()
      && token.kind == TokenKind::Identifier
    {
      let name = token.text.clone();
      self.pos += 1;
      return Some(name);
    }
    None
  }

  /// Fatal error describing the token at the cursor.
  fn unexpected(&self) -> CompileError {
    match self.peek() {
      Some(token) => {
        let got = token.describe().to_string();
        CompileError::at(
          self.source,
          token.loc,
          format!("unexpected token \"{got}\""),
        )
      }
      None => CompileError::at(self.source, self.source.len(), "unexpected end of input"),
    }
  }

  fn declare(&mut self, name: &str, ty: Type) {
    if let Some(scope) = self.scopes.last_mut() {
      scope.push((name.to_string(), ty));
    }
  }

  /// Resolve a name against the scope stack, innermost scope first. Within
  /// a scope the latest declaration wins, so re-declarations shadow.
  fn lookup(&self, name: &str) -> Option<Type> {
    self.scopes.iter().rev().find_map(|scope| {
      scope
        .iter()
        .rev()
        .find(|(n, _)| n == name)
        .map(|(_, ty)| *ty)
    })
  }

  /// `identifier ( )` followed by an optionally annotated code block.
  fn parse_function(&mut self) -> CompileResult<Function> {
    let Some(name) = self.eat_identifier() else {
      return Err(self.unexpected());
    };
    if !self.eat(TokenKind::ParOpen) || !self.eat(TokenKind::ParClose) {
      return Err(self.unexpected());
    }

    let ret_ty = if self.eat(TokenKind::ReturnType) {
      let Some(type_name) = self.eat_identifier() else {
        return Err(self.unexpected());
      };
      match Type::from_name(&type_name) {
        Some(ty) => ty,
        None => return Err(self.unexpected()),
      }
    } else {
      Type::Void
    };

    match self.parse_code_block(ret_ty)? {
      Some(body) => Ok(Function { name, body }),
      None => Err(self.unexpected()),
    }
  }

  /// Parses exactly one expression. `Ok(None)` signals that the enclosing
  /// block's close brace was consumed instead.
  fn parse_expression(&mut self, expected: Type) -> CompileResult<Option<Expr>> {
    let start = self.pos;

    // Ordered choice: each alternative either matches, or the cursor is
    // rewound and the next one is tried.
    let mut expr = self.parse_return(expected)?;
    if expr.is_none() {
      self.pos = start;
      expr = self.parse_code_block(expected)?;
    }
    if expr.is_none() {
      self.pos = start;
      expr = self.parse_if(expected)?;
    }
    if expr.is_none() {
      self.pos = start;
      expr = self.parse_loop()?;
    }
    if expr.is_none() {
      self.pos = start;
      expr = self.parse_variable_declaration()?;
    }
    if expr.is_none() {
      self.pos = start;
      expr = self.parse_variable_assignment()?;
    }
    if expr.is_none() {
      self.pos = start;
      expr = self.parse_variable_value()?;
    }
    if expr.is_none() {
      self.pos = start;
      expr = self.parse_constant(expected)?;
    }

    let Some(expr) = expr else {
      self.pos = start;
      if self.eat(TokenKind::BraceClose) {
        // Not an error: the current code block is fully parsed.
        return Ok(None);
      }
      return Err(self.unexpected());
    };

    // Greedily bind a trailing binary operator. The right-hand side is a
    // full expression, so chained operators bind to the right.
    if let Some(op) = self.parse_operation() {
      let rhs = match self.parse_expression(expected)? {
        Some(rhs) => rhs,
        None => return Err(self.unexpected()),
      };
      return Ok(Some(Expr::operation(op, expr, rhs)));
    }

    Ok(Some(expr))
  }

  /// Consume the token at the cursor as a binary operator, if it is one.
  fn parse_operation(&mut self) -> Option<BinaryOp> {
    let op = match self.peek()?.kind {
      TokenKind::Plus => BinaryOp::Add,
      TokenKind::Minus => BinaryOp::Sub,
      TokenKind::Star => BinaryOp::Mul,
      TokenKind::Slash => BinaryOp::Div,
      TokenKind::Percent => BinaryOp::Mod,
      TokenKind::Caret => BinaryOp::Pow,
      TokenKind::EqEq => BinaryOp::Eq,
      TokenKind::NotEq => BinaryOp::Neq,
      TokenKind::Lt => BinaryOp::Lt,
      TokenKind::Le => BinaryOp::Lte,
      TokenKind::Gt => BinaryOp::Gt,
      TokenKind::Ge => BinaryOp::Gte,
      TokenKind::Amp => BinaryOp::And,
      TokenKind::AmpAmp => BinaryOp::AndLazy,
      TokenKind::Pipe => BinaryOp::Or,
      TokenKind::PipePipe => BinaryOp::OrLazy,
      _ => return None,
    };
    self.pos += 1;
    Some(op)
  }

  /// `<- expression`. Inside a typed block the value must match the
  /// expected type; a void expected type leaves the value unconstrained,
  /// so early exits work in functions without a return annotation.
  fn parse_return(&mut self, expected: Type) -> Attempt<Expr> {
    if !self.eat(TokenKind::Return) {
      return Ok(None);
    }
    let value = match self.parse_expression(expected)? {
      Some(value) => value,
      None => return Err(self.unexpected()),
    };
    if expected != Type::Void && value.ty() != expected {
      return Ok(None);
    }
    Ok(Some(Expr::Return {
      value: Box::new(value),
    }))
  }

  /// `[-> type] { expression* }`. An annotation, when present, must match
  /// the expected type.
  fn parse_code_block(&mut self, expected: Type) -> Attempt<Expr> {
    if self.eat(TokenKind::ReturnType) {
      let Some(type_name) = self.eat_identifier() else {
        return Ok(None);
      };
      if Type::from_name(&type_name) != Some(expected) {
        return Ok(None);
      }
    }
    if !self.eat(TokenKind::BraceOpen) {
      return Ok(None);
    }

    self.scopes.push(Vec::new());
    let mut children = Vec::new();
    while let Some(child) = self.parse_expression(expected)? {
      children.push(child);
    }
    self.scopes.pop();

    Ok(Some(Expr::Block {
      children,
      ty: expected,
    }))
  }

  /// `? ( condition ) then-expression [: else-expression]`.
  fn parse_if(&mut self, expected: Type) -> Attempt<Expr> {
    if !self.eat(TokenKind::Question) {
      return Ok(None);
    }
    if !self.eat(TokenKind::ParOpen) {
      return Ok(None);
    }
    let cond_loc = self.peek().map(|t| t.loc).unwrap_or(self.source.len());
    let condition = match self.parse_expression(Type::Bool)? {
      Some(condition) => condition,
      None => return Err(self.unexpected()),
    };
    // A bare variable is allowed as a condition: the generator compares it
    // against zero. Anything else must be boolean-typed.
    if condition.ty() != Type::Bool && !matches!(condition, Expr::VarValue { .. }) {
      return Err(CompileError::at(
        self.source,
        cond_loc,
        "condition must be boolean or a bare variable",
      ));
    }
    if !self.eat(TokenKind::ParClose) {
      return Ok(None);
    }

    let then_body = match self.parse_expression(expected)? {
      Some(then_body) => then_body,
      None => return Err(self.unexpected()),
    };

    let else_body = if self.eat(TokenKind::Colon) {
      match self.parse_expression(expected)? {
        Some(else_body) => Some(Box::new(else_body)),
        None => return Err(self.unexpected()),
      }
    } else {
      None
    };

    Ok(Some(Expr::If {
      condition: Box::new(condition),
      then_body: Box::new(then_body),
      else_body,
      ty: expected,
    }))
  }

  /// `@ ( condition ) body`: a pre-test loop, always void.
  fn parse_loop(&mut self) -> Attempt<Expr> {
    if !self.eat(TokenKind::At) {
      return Ok(None);
    }
    if !self.eat(TokenKind::ParOpen) {
      return Ok(None);
    }
    let cond_loc = self.peek().map(|t| t.loc).unwrap_or(self.source.len());
    let condition = match self.parse_expression(Type::Bool)? {
      Some(condition) => condition,
      None => return Err(self.unexpected()),
    };
    if condition.ty() != Type::Bool && !matches!(condition, Expr::VarValue { .. }) {
      return Err(CompileError::at(
        self.source,
        cond_loc,
        "condition must be boolean or a bare variable",
      ));
    }
    if !self.eat(TokenKind::ParClose) {
      return Ok(None);
    }

    let body = match self.parse_expression(Type::Void)? {
      Some(body) => body,
      None => return Err(self.unexpected()),
    };

    Ok(Some(Expr::Loop {
      condition: Box::new(condition),
      body: Box::new(body),
    }))
  }

  /// `identifier : type-identifier = expression`. The declared type must
  /// be a recognised type name and must equal the initializer's type.
  fn parse_variable_declaration(&mut self) -> Attempt<Expr> {
    let Some(name) = self.eat_identifier() else {
      return Ok(None);
    };
    if !self.eat(TokenKind::Colon) {
      return Ok(None);
    }
    let Some(type_name) = self.eat_identifier() else {
      return Ok(None);
    };
    let Some(ty) = Type::from_name(&type_name) else {
      return Ok(None);
    };
    if !self.eat(TokenKind::Equals) {
      return Ok(None);
    }

    let value = match self.parse_expression(ty)? {
      Some(value) => value,
      None => return Err(self.unexpected()),
    };
    if value.ty() != ty {
      return Ok(None);
    }

    self.declare(&name, ty);
    Ok(Some(Expr::VarDeclaration {
      name,
      ty,
      value: Box::new(value),
    }))
  }

  /// `identifier = expression`, for an already declared variable. The
  /// value is parsed at the variable's declared type.
  fn parse_variable_assignment(&mut self) -> Attempt<Expr> {
    let Some(name) = self.eat_identifier() else {
      return Ok(None);
    };
    if !self.eat(TokenKind::Equals) {
      return Ok(None);
    }
    let Some(ty) = self.lookup(&name) else {
      return Ok(None);
    };

    let value = match self.parse_expression(ty)? {
      Some(value) => value,
      None => return Err(self.unexpected()),
    };
    if value.ty() != ty {
      return Ok(None);
    }

    Ok(Some(Expr::VarAssignment {
      name,
      ty,
      value: Box::new(value),
    }))
  }

  /// A reference to a previously declared name, typed by lookup. Unknown
  /// names do not match, so forward references fail to parse.
  fn parse_variable_value(&mut self) -> Attempt<Expr> {
    let Some(name) = self.eat_identifier() else {
      return Ok(None);
    };
    let Some(ty) = self.lookup(&name) else {
      return Ok(None);
    };
    Ok(Some(Expr::VarValue { name, ty }))
  }

  /// A literal, adopting the expected type of its context.
  fn parse_constant(&mut self, expected: Type) -> Attempt<Expr> {
    if let Some(token) = self.peek()
      && token.kind == TokenKind::Constant
    {
      let text = token.text.clone();
      self.pos += 1;
      return Ok(Some(Expr::Constant { text, ty: expected }));
    }
    Ok(None)
  }
}
