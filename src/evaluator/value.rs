//! Runtime values and their Python-style display.

use std::cmp::Ordering;
use std::fmt;

use super::error::{ScriptError, ScriptResult};

/// Longest string or list a snippet may build. Lists are measured by
/// [`Value::weight`], so nested items count too.
pub const MAX_SEQUENCE_LEN: usize = 100_000;

/// Deepest list nesting a snippet may build.
pub const MAX_NESTING: usize = 32;

/// Combined weight of every variable in one submission's scope.
pub const MAX_SCOPE_WEIGHT: usize = 10 * MAX_SEQUENCE_LEN;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  None,
  Bool(bool),
  Int(i64),
  Float(f64),
  Str(String),
  List(Vec<Value>),
}

impl Value {
  pub fn type_name(&self) -> &'static str {
    match self {
      Value::None => "NoneType",
      Value::Bool(_) => "bool",
      Value::Int(_) => "int",
      Value::Float(_) => "float",
      Value::Str(_) => "str",
      Value::List(_) => "list",
    }
  }

  pub fn truthy(&self) -> bool {
    match self {
      Value::None => false,
      Value::Bool(b) => *b,
      Value::Int(i) => *i != 0,
      Value::Float(f) => *f != 0.0,
      Value::Str(s) => !s.is_empty(),
      Value::List(items) => !items.is_empty(),
    }
  }

  /// Numeric view used by mixed int/float arithmetic. Booleans count as ints.
  pub fn as_f64(&self) -> Option<f64> {
    match self {
      Value::Int(i) => Some(*i as f64),
      Value::Float(f) => Some(*f),
      Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
      _ => None,
    }
  }

  pub fn as_i64(&self) -> Option<i64> {
    match self {
      Value::Int(i) => Some(*i),
      Value::Bool(b) => Some(*b as i64),
      _ => None,
    }
  }

  /// Storage held by a value, in elements: one per scalar, one per string
  /// char, and every item of nested lists. Empty strings and lists count one.
  pub fn weight(&self) -> usize {
    match self {
      Value::Str(s) => s.chars().count().max(1),
      Value::List(items) => items_weight(items).max(1),
      _ => 1,
    }
  }

  fn nesting(&self) -> usize {
    match self {
      Value::List(items) => 1 + items.iter().map(Value::nesting).max().unwrap_or(0),
      _ => 0,
    }
  }

  /// `repr()` form: strings quoted, everything else as `str()`.
  pub fn repr(&self) -> String {
    match self {
      Value::Str(s) => {
        if s.contains('\'') && !s.contains('"') {
          format!("\"{s}\"")
        } else {
          format!("'{}'", s.replace('\'', "\\'"))
        }
      }
      other => other.to_string(),
    }
  }

  pub fn compare(&self, other: &Value) -> ScriptResult<Ordering> {
    match (self, other) {
      (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
      (Value::List(a), Value::List(b)) => {
        for (x, y) in a.iter().zip(b.iter()) {
          let ord = x.compare(y)?;
          if ord != Ordering::Equal {
            return Ok(ord);
          }
        }
        Ok(a.len().cmp(&b.len()))
      }
      _ => match (self.as_f64(), other.as_f64()) {
        (Some(a), Some(b)) => a
          .partial_cmp(&b)
          .ok_or_else(|| ScriptError::Value("cannot order NaN".into())),
        _ => Err(ScriptError::Type(format!(
          "'<' not supported between '{}' and '{}'",
          self.type_name(),
          other.type_name()
        ))),
      },
    }
  }

  /// Python `==`: numbers compare across int/float, other types never equal.
  pub fn loose_eq(&self, other: &Value) -> bool {
    match (self, other) {
      (Value::Str(a), Value::Str(b)) => a == b,
      (Value::None, Value::None) => true,
      (Value::List(a), Value::List(b)) => {
        a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.loose_eq(y))
      }
      _ => match (self.as_f64(), other.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
      },
    }
  }
}

/// Format a float the way Python's `str()` does for the common cases.
pub fn format_float(f: f64) -> String {
  if f.is_nan() {
    "nan".into()
  } else if f.is_infinite() {
    if f > 0.0 { "inf".into() } else { "-inf".into() }
  } else if f.fract() == 0.0 && f.abs() < 1e16 {
    format!("{f:.1}")
  } else {
    format!("{f}")
  }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Value::None => write!(f, "None"),
      Value::Bool(true) => write!(f, "True"),
      Value::Bool(false) => write!(f, "False"),
      Value::Int(i) => write!(f, "{i}"),
      Value::Float(x) => write!(f, "{}", format_float(*x)),
      Value::Str(s) => write!(f, "{s}"),
      Value::List(items) => {
        let inner: Vec<String> = items.iter().map(Value::repr).collect();
        write!(f, "[{}]", inner.join(", "))
      }
    }
  }
}

pub fn check_len(len: usize) -> ScriptResult<()> {
  if len > MAX_SEQUENCE_LEN {
    Err(ScriptError::LimitExceeded(format!("sequence longer than {MAX_SEQUENCE_LEN}")))
  } else {
    Ok(())
  }
}

pub fn items_weight(items: &[Value]) -> usize {
  items.iter().map(Value::weight).fold(0, usize::saturating_add)
}

/// Checks the contents of a list about to exist: total weight and nesting.
pub fn check_items(items: &[Value]) -> ScriptResult<()> {
  check_len(items_weight(items))?;
  if items.iter().map(Value::nesting).max().unwrap_or(0) >= MAX_NESTING {
    return Err(ScriptError::LimitExceeded(format!("lists nested deeper than {MAX_NESTING}")));
  }
  Ok(())
}
