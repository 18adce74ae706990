//! Recursive-descent parser producing a small expression/statement AST.
//!
//! Precedence, loosest first: `or`, `and`, `not`, comparisons (chainable,
//! including `in` / `not in`), `+ -`, `* / // %`, unary `- +`, `**`
//! (right-associative, binds tighter than unary minus on its left), postfix
//! calls / methods / indexing / slicing.

use super::error::{ScriptError, ScriptResult};
use super::lexer::{Lexer, Token};
use super::value::Value;

/// Deepest expression nesting accepted before giving up. Operators chained
/// left to right (`a + b + c`, `x.f().g()`) nest too and count against it.
pub const MAX_DEPTH: usize = 64;

/// Largest `{x:.Nf}` precision an f-string may ask for.
pub const MAX_PRECISION: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
  Add,
  Sub,
  Mul,
  Div,
  FloorDiv,
  Mod,
  Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
  Eq,
  NotEq,
  Lt,
  Le,
  Gt,
  Ge,
  In,
  NotIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
  Neg,
  Pos,
  Not,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FPart {
  Text(String),
  /// `{expr}` or `{expr:.Nf}`.
  Expr { expr: Expr, precision: Option<usize> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
  Literal(Value),
  FString(Vec<FPart>),
  Name(String),
  List(Vec<Expr>),
  Unary(UnaryOp, Box<Expr>),
  Binary(Box<Expr>, BinOp, Box<Expr>),
  /// `a < b <= c` keeps every operand so each is evaluated once.
  Compare(Box<Expr>, Vec<(CmpOp, Expr)>),
  And(Box<Expr>, Box<Expr>),
  Or(Box<Expr>, Box<Expr>),
  Call { name: String, args: Vec<Expr> },
  Method { receiver: Box<Expr>, name: String, args: Vec<Expr> },
  Index { target: Box<Expr>, index: Box<Expr> },
  Slice {
    target: Box<Expr>,
    start: Option<Box<Expr>>,
    stop: Option<Box<Expr>>,
    step: Option<Box<Expr>>,
  },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
  /// `name = value`, or `name op= value` when `op` is set.
  Assign { name: String, op: Option<BinOp>, value: Expr },
  Expr(Expr),
}

/// Parse one source line as a statement. Blank and comment-only lines yield `None`.
pub fn parse_statement(line: &str) -> ScriptResult<Option<Stmt>> {
  let mut p = Parser::new(line)?;
  if p.at(&Token::Eof) {
    return Ok(None);
  }
  let stmt = match (p.tokens.first(), p.tokens.get(1)) {
    (Some(Token::Ident(name)), Some(op)) if assign_op(op).is_some() => {
      let name = name.clone();
      let op = assign_op(op).flatten();
      p.pos = 2;
      let value = p.expression()?;
      Stmt::Assign { name, op, value }
    }
    _ => Stmt::Expr(p.expression()?),
  };
  p.expect_end()?;
  Ok(Some(stmt))
}

/// Parse a complete standalone expression.
pub fn parse_expression(src: &str) -> ScriptResult<Expr> {
  let mut p = Parser::new(src)?;
  let expr = p.expression()?;
  p.expect_end()?;
  Ok(expr)
}

/// Parse a comma-separated argument list (the inside of a call's parentheses).
pub fn parse_arguments(src: &str) -> ScriptResult<Vec<Expr>> {
  let mut p = Parser::new(src)?;
  let args = p.comma_list(&Token::Eof)?;
  p.expect_end()?;
  Ok(args)
}

/// `Some(None)` for plain `=`, `Some(Some(op))` for augmented assignment.
fn assign_op(tok: &Token) -> Option<Option<BinOp>> {
  match tok {
    Token::Assign => Some(None),
    Token::PlusAssign => Some(Some(BinOp::Add)),
    Token::MinusAssign => Some(Some(BinOp::Sub)),
    Token::StarAssign => Some(Some(BinOp::Mul)),
    Token::SlashAssign => Some(Some(BinOp::Div)),
    _ => None,
  }
}

struct Parser {
  tokens: Vec<Token>,
  pos: usize,
  depth: usize,
}

impl Parser {
  fn new(src: &str) -> ScriptResult<Self> {
    Ok(Self { tokens: Lexer::new(src).tokenize()?, pos: 0, depth: 0 })
  }

  fn peek(&self) -> &Token {
    self.tokens.get(self.pos).unwrap_or(&Token::Eof)
  }

  fn peek_at(&self, offset: usize) -> &Token {
    self.tokens.get(self.pos + offset).unwrap_or(&Token::Eof)
  }

  fn at(&self, tok: &Token) -> bool {
    self.peek() == tok
  }

  fn advance(&mut self) -> Token {
    let tok = self.peek().clone();
    if self.pos < self.tokens.len() {
      self.pos += 1;
    }
    tok
  }

  fn eat(&mut self, tok: &Token) -> bool {
    if self.at(tok) {
      self.pos += 1;
      true
    } else {
      false
    }
  }

  fn expect(&mut self, tok: &Token) -> ScriptResult<()> {
    if self.eat(tok) {
      Ok(())
    } else {
      Err(ScriptError::Syntax(format!("expected {:?}, found {:?}", tok, self.peek())))
    }
  }

  fn expect_end(&self) -> ScriptResult<()> {
    if self.at(&Token::Eof) {
      Ok(())
    } else {
      Err(ScriptError::Syntax(format!("unexpected {:?}", self.peek())))
    }
  }

  fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> ScriptResult<T>) -> ScriptResult<T> {
    self.depth += 1;
    if self.depth > MAX_DEPTH {
      return Err(ScriptError::Syntax("expression nested too deeply".into()));
    }
    let out = f(self);
    self.depth -= 1;
    out
  }

  /// Adds one link to a left-associative chain. The caller gives the links
  /// back with `unlink` once the chain ends.
  fn link(&mut self, links: &mut usize) -> ScriptResult<()> {
    *links += 1;
    self.depth += 1;
    if self.depth > MAX_DEPTH {
      return Err(ScriptError::Syntax("expression chained too long".into()));
    }
    Ok(())
  }

  fn unlink<T>(&mut self, links: usize, out: T) -> ScriptResult<T> {
    self.depth -= links;
    Ok(out)
  }

  fn expression(&mut self) -> ScriptResult<Expr> {
    self.nested(Self::or_expr)
  }

  fn or_expr(&mut self) -> ScriptResult<Expr> {
    let mut links = 0;
    let mut lhs = self.and_expr()?;
    while self.eat(&Token::Or) {
      self.link(&mut links)?;
      let rhs = self.and_expr()?;
      lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
    }
    self.unlink(links, lhs)
  }

  fn and_expr(&mut self) -> ScriptResult<Expr> {
    let mut links = 0;
    let mut lhs = self.not_expr()?;
    while self.eat(&Token::And) {
      self.link(&mut links)?;
      let rhs = self.not_expr()?;
      lhs = Expr::And(Box::new(lhs), Box::new(rhs));
    }
    self.unlink(links, lhs)
  }

  fn not_expr(&mut self) -> ScriptResult<Expr> {
    if self.eat(&Token::Not) {
      let inner = self.nested(Self::not_expr)?;
      return Ok(Expr::Unary(UnaryOp::Not, Box::new(inner)));
    }
    self.comparison()
  }

  fn comparison(&mut self) -> ScriptResult<Expr> {
    let first = self.additive()?;
    let mut rest = Vec::new();
    loop {
      let op = match self.peek() {
        Token::EqEq => CmpOp::Eq,
        Token::NotEq => CmpOp::NotEq,
        Token::Lt => CmpOp::Lt,
        Token::Le => CmpOp::Le,
        Token::Gt => CmpOp::Gt,
        Token::Ge => CmpOp::Ge,
        Token::In => CmpOp::In,
        Token::Not if self.peek_at(1) == &Token::In => {
          self.pos += 1;
          CmpOp::NotIn
        }
        _ => break,
      };
      self.pos += 1;
      rest.push((op, self.additive()?));
    }
    if rest.is_empty() {
      Ok(first)
    } else {
      Ok(Expr::Compare(Box::new(first), rest))
    }
  }

  fn additive(&mut self) -> ScriptResult<Expr> {
    let mut links = 0;
    let mut lhs = self.term()?;
    loop {
      let op = match self.peek() {
        Token::Plus => BinOp::Add,
        Token::Minus => BinOp::Sub,
        _ => return self.unlink(links, lhs),
      };
      self.pos += 1;
      self.link(&mut links)?;
      let rhs = self.term()?;
      lhs = Expr::Binary(Box::new(lhs), op, Box::new(rhs));
    }
  }

  fn term(&mut self) -> ScriptResult<Expr> {
    let mut links = 0;
    let mut lhs = self.unary()?;
    loop {
      let op = match self.peek() {
        Token::Star => BinOp::Mul,
        Token::Slash => BinOp::Div,
        Token::SlashSlash => BinOp::FloorDiv,
        Token::Percent => BinOp::Mod,
        _ => return self.unlink(links, lhs),
      };
      self.pos += 1;
      self.link(&mut links)?;
      let rhs = self.unary()?;
      lhs = Expr::Binary(Box::new(lhs), op, Box::new(rhs));
    }
  }

  fn unary(&mut self) -> ScriptResult<Expr> {
    let op = match self.peek() {
      Token::Minus => UnaryOp::Neg,
      Token::Plus => UnaryOp::Pos,
      _ => return self.power(),
    };
    self.pos += 1;
    let operand = self.nested(Self::unary)?;
    Ok(Expr::Unary(op, Box::new(operand)))
  }

  fn power(&mut self) -> ScriptResult<Expr> {
    let base = self.postfix()?;
    if self.eat(&Token::StarStar) {
      let exponent = self.nested(Self::unary)?;
      return Ok(Expr::Binary(Box::new(base), BinOp::Pow, Box::new(exponent)));
    }
    Ok(base)
  }

  fn postfix(&mut self) -> ScriptResult<Expr> {
    let mut links = 0;
    let mut expr = self.primary()?;
    loop {
      if matches!(self.peek(), Token::LParen | Token::Dot | Token::LBracket) {
        self.link(&mut links)?;
      }
      match self.peek() {
        Token::LParen => {
          let Expr::Name(name) = expr else {
            return Err(ScriptError::Syntax("only named functions can be called".into()));
          };
          self.pos += 1;
          let args = self.comma_list(&Token::RParen)?;
          self.expect(&Token::RParen)?;
          expr = Expr::Call { name, args };
        }
        Token::Dot => {
          self.pos += 1;
          let Token::Ident(name) = self.advance() else {
            return Err(ScriptError::Syntax("expected method name after '.'".into()));
          };
          self.expect(&Token::LParen)?;
          let args = self.comma_list(&Token::RParen)?;
          self.expect(&Token::RParen)?;
          expr = Expr::Method { receiver: Box::new(expr), name, args };
        }
        Token::LBracket => {
          self.pos += 1;
          expr = self.subscript(expr)?;
        }
        _ => return self.unlink(links, expr),
      }
    }
  }

  /// Parses what follows `[`: an index or an `a:b:c` slice.
  fn subscript(&mut self, target: Expr) -> ScriptResult<Expr> {
    let start = if self.at(&Token::Colon) { None } else { Some(Box::new(self.expression()?)) };
    if !self.eat(&Token::Colon) {
      self.expect(&Token::RBracket)?;
      let index = start.ok_or_else(|| ScriptError::Syntax("empty index".into()))?;
      return Ok(Expr::Index { target: Box::new(target), index });
    }
    let stop = self.slice_bound()?;
    let step = if self.eat(&Token::Colon) { self.slice_bound()? } else { None };
    self.expect(&Token::RBracket)?;
    Ok(Expr::Slice { target: Box::new(target), start, stop, step })
  }

  fn slice_bound(&mut self) -> ScriptResult<Option<Box<Expr>>> {
    if self.at(&Token::Colon) || self.at(&Token::RBracket) {
      Ok(None)
    } else {
      Ok(Some(Box::new(self.expression()?)))
    }
  }

  /// Comma-separated expressions up to (not including) `close`. Trailing comma allowed.
  fn comma_list(&mut self, close: &Token) -> ScriptResult<Vec<Expr>> {
    let mut items = Vec::new();
    while !self.at(close) {
      items.push(self.expression()?);
      if !self.eat(&Token::Comma) {
        break;
      }
    }
    Ok(items)
  }

  fn primary(&mut self) -> ScriptResult<Expr> {
    match self.advance() {
      Token::Int(i) => Ok(Expr::Literal(Value::Int(i))),
      Token::Float(f) => Ok(Expr::Literal(Value::Float(f))),
      Token::Str(s) => {
        // adjacent literals concatenate: "a" "b"
        let mut s = s;
        while let Token::Str(next) = self.peek().clone() {
          self.pos += 1;
          s.push_str(&next);
        }
        Ok(Expr::Literal(Value::Str(s)))
      }
      Token::FStr(raw) => Ok(Expr::FString(parse_fstring(&raw)?)),
      Token::True => Ok(Expr::Literal(Value::Bool(true))),
      Token::False => Ok(Expr::Literal(Value::Bool(false))),
      Token::None => Ok(Expr::Literal(Value::None)),
      Token::Ident(name) => Ok(Expr::Name(name)),
      Token::LParen => {
        let inner = self.expression()?;
        self.expect(&Token::RParen)?;
        Ok(inner)
      }
      Token::LBracket => {
        let items = self.nested(|p| p.comma_list(&Token::RBracket))?;
        self.expect(&Token::RBracket)?;
        Ok(Expr::List(items))
      }
      other => Err(ScriptError::Syntax(format!("unexpected {other:?}"))),
    }
  }
}

/// Split an f-string body into literal text and `{expr[:.Nf]}` placeholders.
fn parse_fstring(raw: &str) -> ScriptResult<Vec<FPart>> {
  let chars: Vec<char> = raw.chars().collect();
  let mut parts = Vec::new();
  let mut text = String::new();
  let mut i = 0;
  while i < chars.len() {
    match (chars[i], chars.get(i + 1)) {
      ('{', Some('{')) | ('}', Some('}')) => {
        text.push(chars[i]);
        i += 2;
      }
      ('{', _) => {
        let close = find_placeholder_end(&chars, i + 1)
          .ok_or_else(|| ScriptError::Syntax("f-string: expecting '}'".into()))?;
        let inner: String = chars[i + 1..close].iter().collect();
        if !text.is_empty() {
          parts.push(FPart::Text(std::mem::take(&mut text)));
        }
        parts.push(parse_placeholder(&inner)?);
        i = close + 1;
      }
      ('}', _) => return Err(ScriptError::Syntax("f-string: single '}' is not allowed".into())),
      (c, _) => {
        text.push(c);
        i += 1;
      }
    }
  }
  if !text.is_empty() {
    parts.push(FPart::Text(text));
  }
  Ok(parts)
}

fn find_placeholder_end(chars: &[char], from: usize) -> Option<usize> {
  let mut depth = 0usize;
  let mut quote: Option<char> = None;
  for (i, &c) in chars.iter().enumerate().skip(from) {
    match (quote, c) {
      (Some(q), c) if c == q => quote = None,
      (Some(_), _) => {}
      (None, '\'' | '"') => quote = Some(c),
      (None, '[' | '(' | '{') => depth += 1,
      (None, ']' | ')') => depth = depth.saturating_sub(1),
      (None, '}') if depth == 0 => return Some(i),
      (None, '}') => depth -= 1,
      _ => {}
    }
  }
  None
}

fn parse_placeholder(inner: &str) -> ScriptResult<FPart> {
  let (expr_src, spec) = split_format_spec(inner);
  let precision = match spec {
    None => None,
    Some(spec) => {
      let digits = spec
        .strip_prefix('.')
        .and_then(|s| s.strip_suffix('f'))
        .ok_or_else(|| ScriptError::Syntax(format!("unsupported format spec '{spec}'")))?;
      let n = digits
        .parse::<usize>()
        .ok()
        .filter(|n| *n <= MAX_PRECISION)
        .ok_or_else(|| ScriptError::Syntax(format!("unsupported format spec '{spec}'")))?;
      Some(n)
    }
  };
  Ok(FPart::Expr { expr: parse_expression(expr_src)?, precision })
}

/// Finds a `:` outside brackets and quotes (slices keep theirs).
fn split_format_spec(inner: &str) -> (&str, Option<&str>) {
  let mut depth = 0usize;
  let mut quote: Option<char> = None;
  for (i, c) in inner.char_indices() {
    match (quote, c) {
      (Some(q), c) if c == q => quote = None,
      (Some(_), _) => {}
      (None, '\'' | '"') => quote = Some(c),
      (None, '[' | '(') => depth += 1,
      (None, ']' | ')') => depth = depth.saturating_sub(1),
      (None, ':') if depth == 0 => return (&inner[..i], Some(&inner[i + 1..])),
      _ => {}
    }
  }
  (inner, None)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn power_binds_tighter_than_unary_minus() {
    let expr = parse_expression("-2 ** 2").expect("expr");
    let Expr::Unary(UnaryOp::Neg, inner) = expr else { panic!("expected negation") };
    assert!(matches!(*inner, Expr::Binary(_, BinOp::Pow, _)));
  }

  #[test]
  fn augmented_assignment_is_recognized() {
    let stmt = parse_statement("score += 10").expect("parse").expect("stmt");
    assert!(matches!(stmt, Stmt::Assign { op: Some(BinOp::Add), .. }));
  }

  #[test]
  fn comment_only_line_is_empty() {
    assert_eq!(parse_statement("   # nothing here").expect("parse"), None);
  }

  #[test]
  fn slices_and_methods_chain() {
    let expr = parse_expression("name.upper()[::-1]").expect("expr");
    assert!(matches!(expr, Expr::Slice { start: None, stop: None, step: Some(_), .. }));
  }

  #[test]
  fn fstring_placeholders_and_precision() {
    let expr = parse_expression("f\"{name} has {avg:.2f} {{pts}}\"").expect("expr");
    let Expr::FString(parts) = expr else { panic!("expected f-string") };
    assert_eq!(parts.len(), 4);
    assert!(matches!(parts[2], FPart::Expr { precision: Some(2), .. }));
    assert_eq!(parts[3], FPart::Text(" {pts}".into()));
  }

  #[test]
  fn deep_nesting_is_rejected() {
    let src = format!("{}1{}", "(".repeat(200), ")".repeat(200));
    assert!(matches!(parse_expression(&src), Err(ScriptError::Syntax(_))));
  }

  #[test]
  fn long_operator_chains_are_rejected() {
    let sum = format!("1{}", "+1".repeat(30_000));
    assert!(matches!(parse_expression(&sum), Err(ScriptError::Syntax(_))));
    let product = format!("2{}", "*2".repeat(500));
    assert!(matches!(parse_expression(&product), Err(ScriptError::Syntax(_))));
    let ors = format!("x{}", " or x".repeat(500));
    assert!(matches!(parse_expression(&ors), Err(ScriptError::Syntax(_))));
    let calls = format!("s{}", ".upper()".repeat(500));
    assert!(matches!(parse_expression(&calls), Err(ScriptError::Syntax(_))));
  }

  #[test]
  fn short_chains_still_parse() {
    let src = format!("1{}", " + 1".repeat(20));
    assert!(parse_expression(&src).is_ok());
    // links are released once a chain ends, so siblings do not add up
    let src = (0..20).map(|_| "(1 + 2 + 3)").collect::<Vec<_>>().join(" * ");
    assert!(parse_expression(&src).is_ok());
  }

  #[test]
  fn fstring_precision_is_capped() {
    assert!(parse_expression("f'{x:.100f}'").is_ok());
    assert!(matches!(parse_expression("f'{x:.101f}'"), Err(ScriptError::Syntax(_))));
    assert!(matches!(parse_expression("f'{1:.70000f}'"), Err(ScriptError::Syntax(_))));
  }

  #[test]
  fn keyword_arguments_are_a_syntax_error() {
    assert!(parse_arguments("'a', sep='-'").is_err());
  }
}
