//! Tokenizer for single-line script statements.
//!
//! Works on one logical line at a time: the driver feeds statements line by
//! line, so newlines never appear inside the token stream. `#` starts a comment
//! that runs to the end of the input.

use super::error::{ScriptError, ScriptResult};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
  Int(i64),
  Float(f64),
  Str(String),
  /// Raw body of an f-string; placeholders are parsed later.
  FStr(String),
  Ident(String),
  True,
  False,
  None,
  And,
  Or,
  Not,
  In,

  Plus,
  Minus,
  Star,
  StarStar,
  Slash,
  SlashSlash,
  Percent,

  EqEq,
  NotEq,
  Lt,
  Le,
  Gt,
  Ge,

  Assign,
  PlusAssign,
  MinusAssign,
  StarAssign,
  SlashAssign,

  LParen,
  RParen,
  LBracket,
  RBracket,
  Comma,
  Colon,
  Dot,
  Eof,
}

pub struct Lexer {
  chars: Vec<char>,
  pos: usize,
}

impl Lexer {
  pub fn new(source: &str) -> Self {
    Self { chars: source.chars().collect(), pos: 0 }
  }

  /// Tokenize the whole input. The stream always ends with [`Token::Eof`].
  pub fn tokenize(mut self) -> ScriptResult<Vec<Token>> {
    let mut tokens = Vec::new();
    loop {
      let tok = self.next_token()?;
      let done = tok == Token::Eof;
      tokens.push(tok);
      if done {
        return Ok(tokens);
      }
    }
  }

  fn peek(&self) -> Option<char> {
    self.chars.get(self.pos).copied()
  }

  fn peek_at(&self, offset: usize) -> Option<char> {
    self.chars.get(self.pos + offset).copied()
  }

  fn bump(&mut self) -> Option<char> {
    let ch = self.peek()?;
    self.pos += 1;
    Some(ch)
  }

  /// Consume `next` if it is the upcoming char.
  fn eat(&mut self, next: char) -> bool {
    if self.peek() == Some(next) {
      self.pos += 1;
      true
    } else {
      false
    }
  }

  fn next_token(&mut self) -> ScriptResult<Token> {
    while matches!(self.peek(), Some(c) if c.is_whitespace()) {
      self.pos += 1;
    }
    let Some(ch) = self.bump() else {
      return Ok(Token::Eof);
    };

    let tok = match ch {
      '#' => {
        self.pos = self.chars.len();
        Token::Eof
      }
      '"' | '\'' => Token::Str(self.scan_string(ch)?),
      'f' | 'F' if matches!(self.peek(), Some('"' | '\'')) => {
        let quote = self.bump().unwrap_or('"');
        Token::FStr(self.scan_string(quote)?)
      }
      c if c.is_ascii_digit() => self.scan_number(c)?,
      c if c.is_alphabetic() || c == '_' => self.scan_word(c),

      '+' => if self.eat('=') { Token::PlusAssign } else { Token::Plus },
      '-' => if self.eat('=') { Token::MinusAssign } else { Token::Minus },
      '*' => {
        if self.eat('*') {
          Token::StarStar
        } else if self.eat('=') {
          Token::StarAssign
        } else {
          Token::Star
        }
      }
      '/' => {
        if self.eat('/') {
          Token::SlashSlash
        } else if self.eat('=') {
          Token::SlashAssign
        } else {
          Token::Slash
        }
      }
      '%' => Token::Percent,
      '=' => if self.eat('=') { Token::EqEq } else { Token::Assign },
      '!' => {
        if !self.eat('=') {
          return Err(ScriptError::Syntax("unexpected character '!'".into()));
        }
        Token::NotEq
      }
      '<' => if self.eat('=') { Token::Le } else { Token::Lt },
      '>' => if self.eat('=') { Token::Ge } else { Token::Gt },
      '(' => Token::LParen,
      ')' => Token::RParen,
      '[' => Token::LBracket,
      ']' => Token::RBracket,
      ',' => Token::Comma,
      ':' => Token::Colon,
      '.' => Token::Dot,
      other => return Err(ScriptError::Syntax(format!("unexpected character '{other}'"))),
    };
    Ok(tok)
  }

  fn scan_string(&mut self, quote: char) -> ScriptResult<String> {
    let mut out = String::new();
    loop {
      match self.bump() {
        None => return Err(ScriptError::Syntax("unterminated string literal".into())),
        Some(c) if c == quote => return Ok(out),
        Some('\\') => match self.bump() {
          Some('n') => out.push('\n'),
          Some('t') => out.push('\t'),
          Some('\\') => out.push('\\'),
          Some('\'') => out.push('\''),
          Some('"') => out.push('"'),
          Some(other) => {
            out.push('\\');
            out.push(other);
          }
          None => return Err(ScriptError::Syntax("unterminated string literal".into())),
        },
        Some(c) => out.push(c),
      }
    }
  }

  fn scan_number(&mut self, first: char) -> ScriptResult<Token> {
    let mut text = String::from(first);
    let mut is_float = false;
    while let Some(c) = self.peek() {
      if c.is_ascii_digit() {
        text.push(c);
      } else if c == '_' {
        // digit separator: 1_000
      } else if c == '.' && !is_float && matches!(self.peek_at(1), Some(d) if d.is_ascii_digit()) {
        is_float = true;
        text.push(c);
      } else {
        break;
      }
      self.pos += 1;
    }
    if is_float {
      text
        .parse::<f64>()
        .map(Token::Float)
        .map_err(|e| ScriptError::Syntax(format!("bad float literal '{text}': {e}")))
    } else {
      text.parse::<i64>().map(Token::Int).map_err(|_| ScriptError::Overflow)
    }
  }

  fn scan_word(&mut self, first: char) -> Token {
    let mut word = String::from(first);
    while let Some(c) = self.peek() {
      if c.is_alphanumeric() || c == '_' {
        word.push(c);
        self.pos += 1;
      } else {
        break;
      }
    }
    match word.as_str() {
      "True" => Token::True,
      "False" => Token::False,
      "None" => Token::None,
      "and" => Token::And,
      "or" => Token::Or,
      "not" => Token::Not,
      "in" => Token::In,
      _ => Token::Ident(word),
    }
  }
}
