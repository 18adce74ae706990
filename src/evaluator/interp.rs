//! Tree-walking evaluator over a single flat name scope.

use std::cmp::Ordering;
use std::collections::HashMap;

use super::error::{ScriptError, ScriptResult};
use super::parser::{BinOp, CmpOp, Expr, FPart, Stmt, UnaryOp};
use super::value::{check_items, check_len, items_weight, Value, MAX_SCOPE_WEIGHT};

/// Flat `name -> value` scope shared by every statement of one submission.
#[derive(Debug, Default, Clone)]
pub struct Scope {
  vars: HashMap<String, Value>,
  /// Sum of `Value::weight` over `vars`.
  weight: usize,
}

impl Scope {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, name: &str) -> Option<&Value> {
    self.vars.get(name)
  }

  pub fn set(&mut self, name: &str, value: Value) -> ScriptResult<()> {
    let released = self.vars.get(name).map_or(0, Value::weight);
    self.reweigh(released, value.weight())?;
    self.vars.insert(name.to_string(), value);
    Ok(())
  }

  fn reweigh(&mut self, released: usize, added: usize) -> ScriptResult<()> {
    let total = self.weight.saturating_sub(released).saturating_add(added);
    if total > MAX_SCOPE_WEIGHT {
      return Err(ScriptError::LimitExceeded(format!("variables hold more than {MAX_SCOPE_WEIGHT} items")));
    }
    self.weight = total;
    Ok(())
  }

  pub fn exec(&mut self, stmt: &Stmt) -> ScriptResult<()> {
    match stmt {
      Stmt::Assign { name, op: None, value } => {
        let v = self.eval(value)?;
        self.set(name, v)?;
      }
      Stmt::Assign { name, op: Some(op), value } => {
        let current = self
          .get(name)
          .cloned()
          .ok_or_else(|| ScriptError::UndefinedName(name.clone()))?;
        let rhs = self.eval(value)?;
        let v = binary(*op, &current, &rhs)?;
        self.set(name, v)?;
      }
      Stmt::Expr(expr) => {
        self.eval(expr)?;
      }
    }
    Ok(())
  }

  pub fn eval(&mut self, expr: &Expr) -> ScriptResult<Value> {
    match expr {
      Expr::Literal(v) => Ok(v.clone()),
      Expr::Name(name) => self
        .get(name)
        .cloned()
        .ok_or_else(|| ScriptError::UndefinedName(name.clone())),
      Expr::FString(parts) => self.eval_fstring(parts),
      Expr::List(items) => {
        let values = items.iter().map(|e| self.eval(e)).collect::<ScriptResult<Vec<_>>>()?;
        check_items(&values)?;
        Ok(Value::List(values))
      }
      Expr::Unary(op, operand) => {
        let v = self.eval(operand)?;
        unary(*op, v)
      }
      Expr::Binary(lhs, op, rhs) => {
        let l = self.eval(lhs)?;
        let r = self.eval(rhs)?;
        binary(*op, &l, &r)
      }
      Expr::Compare(first, rest) => {
        let mut lhs = self.eval(first)?;
        for (op, rhs_expr) in rest {
          let rhs = self.eval(rhs_expr)?;
          if !compare(*op, &lhs, &rhs)? {
            return Ok(Value::Bool(false));
          }
          lhs = rhs;
        }
        Ok(Value::Bool(true))
      }
      Expr::And(lhs, rhs) => {
        let l = self.eval(lhs)?;
        if l.truthy() { self.eval(rhs) } else { Ok(l) }
      }
      Expr::Or(lhs, rhs) => {
        let l = self.eval(lhs)?;
        if l.truthy() { Ok(l) } else { self.eval(rhs) }
      }
      Expr::Call { name, args } => {
        let values = self.eval_args(args)?;
        call_builtin(name, values)
      }
      Expr::Method { receiver, name, args } => {
        if let Expr::Name(var) = &**receiver {
          if matches!(name.as_str(), "append" | "extend" | "pop") {
            let values = self.eval_args(args)?;
            return self.mutate_list(var, name, values);
          }
        }
        let target = self.eval(receiver)?;
        let values = self.eval_args(args)?;
        call_method(target, name, values)
      }
      Expr::Index { target, index } => {
        let t = self.eval(target)?;
        let i = self.eval(index)?;
        index_value(&t, &i)
      }
      Expr::Slice { target, start, stop, step } => {
        let t = self.eval(target)?;
        let start = self.eval_bound(start.as_deref())?;
        let stop = self.eval_bound(stop.as_deref())?;
        let step = self.eval_bound(step.as_deref())?;
        slice_value(&t, start, stop, step)
      }
    }
  }

  fn eval_args(&mut self, args: &[Expr]) -> ScriptResult<Vec<Value>> {
    args.iter().map(|a| self.eval(a)).collect()
  }

  fn eval_bound(&mut self, bound: Option<&Expr>) -> ScriptResult<Option<i64>> {
    match bound {
      None => Ok(None),
      Some(expr) => match self.eval(expr)? {
        Value::None => Ok(None),
        v => v
          .as_i64()
          .map(Some)
          .ok_or_else(|| ScriptError::Type("slice indices must be integers".into())),
      },
    }
  }

  fn eval_fstring(&mut self, parts: &[FPart]) -> ScriptResult<Value> {
    let mut out = String::new();
    for part in parts {
      match part {
        FPart::Text(t) => out.push_str(t),
        FPart::Expr { expr, precision } => {
          let v = self.eval(expr)?;
          match precision {
            None => out.push_str(&v.to_string()),
            Some(p) => {
              let f = v
                .as_f64()
                .ok_or_else(|| ScriptError::Type(format!("cannot format {} as float", v.type_name())))?;
              out.push_str(&format!("{f:.p$}", p = *p));
            }
          }
        }
      }
      check_len(out.chars().count())?;
    }
    Ok(Value::Str(out))
  }

  fn mutate_list(&mut self, var: &str, method: &str, args: Vec<Value>) -> ScriptResult<Value> {
    let items = match self.vars.get_mut(var) {
      Some(Value::List(items)) => items,
      Some(other) => {
        return Err(ScriptError::Type(format!("'{}' has no method '{method}'", other.type_name())));
      }
      None => return Err(ScriptError::UndefinedName(var.to_string())),
    };
    let before = items_weight(items).max(1);
    let out = match (method, args.as_slice()) {
      ("append", [item]) => {
        items.push(item.clone());
        check_items(items)?;
        Value::None
      }
      ("extend", [Value::List(more)]) => {
        items.extend(more.iter().cloned());
        check_items(items)?;
        Value::None
      }
      ("pop", []) => items.pop().ok_or(ScriptError::IndexOutOfRange)?,
      ("pop", [idx]) => {
        let i = normalize_index(idx, items.len())?;
        items.remove(i)
      }
      _ => return Err(ScriptError::Type(format!("bad arguments for list.{method}()"))),
    };
    let after = items_weight(items).max(1);
    self.reweigh(before, after)?;
    Ok(out)
  }
}

fn unary(op: UnaryOp, v: Value) -> ScriptResult<Value> {
  match (op, v) {
    (UnaryOp::Not, v) => Ok(Value::Bool(!v.truthy())),
    (UnaryOp::Neg, Value::Int(i)) => i.checked_neg().map(Value::Int).ok_or(ScriptError::Overflow),
    (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
    (UnaryOp::Neg, Value::Bool(b)) => Ok(Value::Int(-(b as i64))),
    (UnaryOp::Pos, v @ (Value::Int(_) | Value::Float(_))) => Ok(v),
    (UnaryOp::Pos, Value::Bool(b)) => Ok(Value::Int(b as i64)),
    (_, v) => Err(ScriptError::Type(format!("bad operand type for unary op: '{}'", v.type_name()))),
  }
}

pub fn binary(op: BinOp, l: &Value, r: &Value) -> ScriptResult<Value> {
  match (op, l, r) {
    (BinOp::Add, Value::Str(a), Value::Str(b)) => {
      check_len(a.chars().count() + b.chars().count())?;
      Ok(Value::Str(format!("{a}{b}")))
    }
    (BinOp::Add, Value::List(a), Value::List(b)) => {
      check_len(items_weight(a).saturating_add(items_weight(b)))?;
      Ok(Value::List(a.iter().chain(b.iter()).cloned().collect()))
    }
    (BinOp::Mul, Value::Str(s), n) | (BinOp::Mul, n, Value::Str(s)) if n.as_i64().is_some() => {
      let times = repeat_count(n, s.chars().count())?;
      Ok(Value::Str(s.repeat(times)))
    }
    (BinOp::Mul, Value::List(items), n) | (BinOp::Mul, n, Value::List(items)) if n.as_i64().is_some() => {
      let times = repeat_count(n, items_weight(items))?;
      Ok(Value::List((0..times).flat_map(|_| items.iter().cloned()).collect()))
    }
    _ => match (l.as_i64(), r.as_i64()) {
      (Some(a), Some(b)) => int_arith(op, a, b),
      _ => match (l.as_f64(), r.as_f64()) {
        (Some(a), Some(b)) => float_arith(op, a, b),
        _ => Err(ScriptError::Type(format!(
          "unsupported operand type(s) for {}: '{}' and '{}'",
          op_symbol(op),
          l.type_name(),
          r.type_name()
        ))),
      },
    },
  }
}

/// Repetitions for `seq * n`. An empty sequence repeats to an empty one for any `n`.
fn repeat_count(n: &Value, unit_weight: usize) -> ScriptResult<usize> {
  let times = n.as_i64().unwrap_or(0).max(0);
  if unit_weight == 0 || times == 0 {
    return Ok(0);
  }
  let times = usize::try_from(times).unwrap_or(usize::MAX);
  check_len(unit_weight.saturating_mul(times))?;
  Ok(times)
}

fn int_arith(op: BinOp, a: i64, b: i64) -> ScriptResult<Value> {
  let v = match op {
    BinOp::Add => a.checked_add(b),
    BinOp::Sub => a.checked_sub(b),
    BinOp::Mul => a.checked_mul(b),
    BinOp::Div => {
      if b == 0 {
        return Err(ScriptError::ZeroDivision);
      }
      return Ok(Value::Float(a as f64 / b as f64));
    }
    BinOp::FloorDiv | BinOp::Mod if b == 0 => return Err(ScriptError::ZeroDivision),
    BinOp::FloorDiv => a.checked_div(b).map(|q| if a % b != 0 && ((a < 0) != (b < 0)) { q - 1 } else { q }),
    BinOp::Mod => a.checked_rem(b).map(|r| if r != 0 && ((r < 0) != (b < 0)) { r + b } else { r }),
    BinOp::Pow => {
      if b < 0 {
        return Ok(Value::Float((a as f64).powf(b as f64)));
      }
      u32::try_from(b).ok().and_then(|e| a.checked_pow(e))
    }
  };
  v.map(Value::Int).ok_or(ScriptError::Overflow)
}

fn float_arith(op: BinOp, a: f64, b: f64) -> ScriptResult<Value> {
  let v = match op {
    BinOp::Add => a + b,
    BinOp::Sub => a - b,
    BinOp::Mul => a * b,
    BinOp::Div | BinOp::FloorDiv | BinOp::Mod if b == 0.0 => return Err(ScriptError::ZeroDivision),
    BinOp::Div => a / b,
    BinOp::FloorDiv => (a / b).floor(),
    BinOp::Mod => a - b * (a / b).floor(),
    BinOp::Pow => a.powf(b),
  };
  Ok(Value::Float(v))
}

fn op_symbol(op: BinOp) -> &'static str {
  match op {
    BinOp::Add => "+",
    BinOp::Sub => "-",
    BinOp::Mul => "*",
    BinOp::Div => "/",
    BinOp::FloorDiv => "//",
    BinOp::Mod => "%",
    BinOp::Pow => "**",
  }
}

fn compare(op: CmpOp, l: &Value, r: &Value) -> ScriptResult<bool> {
  Ok(match op {
    CmpOp::Eq => l.loose_eq(r),
    CmpOp::NotEq => !l.loose_eq(r),
    CmpOp::Lt => l.compare(r)? == Ordering::Less,
    CmpOp::Le => l.compare(r)? != Ordering::Greater,
    CmpOp::Gt => l.compare(r)? == Ordering::Greater,
    CmpOp::Ge => l.compare(r)? != Ordering::Less,
    CmpOp::In => contains(r, l)?,
    CmpOp::NotIn => !contains(r, l)?,
  })
}

fn contains(container: &Value, item: &Value) -> ScriptResult<bool> {
  match (container, item) {
    (Value::Str(s), Value::Str(sub)) => Ok(s.contains(sub.as_str())),
    (Value::List(items), item) => Ok(items.iter().any(|x| x.loose_eq(item))),
    _ => Err(ScriptError::Type(format!("argument of type '{}' is not iterable", container.type_name()))),
  }
}

fn normalize_index(idx: &Value, len: usize) -> ScriptResult<usize> {
  let i = idx
    .as_i64()
    .ok_or_else(|| ScriptError::Type("indices must be integers".into()))?;
  let resolved = if i < 0 { i + len as i64 } else { i };
  if resolved < 0 || resolved >= len as i64 {
    return Err(ScriptError::IndexOutOfRange);
  }
  Ok(resolved as usize)
}

fn index_value(target: &Value, idx: &Value) -> ScriptResult<Value> {
  match target {
    Value::Str(s) => {
      let chars: Vec<char> = s.chars().collect();
      let i = normalize_index(idx, chars.len())?;
      Ok(Value::Str(chars[i].to_string()))
    }
    Value::List(items) => {
      let i = normalize_index(idx, items.len())?;
      Ok(items[i].clone())
    }
    other => Err(ScriptError::Type(format!("'{}' object is not subscriptable", other.type_name()))),
  }
}

/// Python slice semantics: clamps bounds, supports negative steps.
fn slice_indices(len: usize, start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> ScriptResult<Vec<usize>> {
  let step = step.unwrap_or(1);
  if step == 0 {
    return Err(ScriptError::Value("slice step cannot be zero".into()));
  }
  let len = len as i64;
  let resolve = |v: i64, lo: i64, hi: i64| {
    let v = if v < 0 { v + len } else { v };
    v.clamp(lo, hi)
  };
  let mut out = Vec::new();
  if step > 0 {
    let mut i = start.map_or(0, |s| resolve(s, 0, len));
    let end = stop.map_or(len, |s| resolve(s, 0, len));
    while i < end {
      out.push(i as usize);
      match i.checked_add(step) {
        Some(next) => i = next,
        None => break,
      }
    }
  } else {
    let mut i = start.map_or(len - 1, |s| resolve(s, -1, len - 1));
    let end = stop.map_or(-1, |s| resolve(s, -1, len - 1));
    while i > end {
      out.push(i as usize);
      match i.checked_add(step) {
        Some(next) => i = next,
        None => break,
      }
    }
  }
  Ok(out)
}

fn slice_value(target: &Value, start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> ScriptResult<Value> {
  match target {
    Value::Str(s) => {
      let chars: Vec<char> = s.chars().collect();
      let picked = slice_indices(chars.len(), start, stop, step)?;
      Ok(Value::Str(picked.into_iter().map(|i| chars[i]).collect()))
    }
    Value::List(items) => {
      let picked = slice_indices(items.len(), start, stop, step)?;
      Ok(Value::List(picked.into_iter().map(|i| items[i].clone()).collect()))
    }
    other => Err(ScriptError::Type(format!("'{}' object is not subscriptable", other.type_name()))),
  }
}

fn arity(name: &str, args: &[Value], allowed: std::ops::RangeInclusive<usize>) -> ScriptResult<()> {
  if allowed.contains(&args.len()) {
    Ok(())
  } else {
    Err(ScriptError::Type(format!("{name}() got {} arguments", args.len())))
  }
}

fn call_builtin(name: &str, mut args: Vec<Value>) -> ScriptResult<Value> {
  match name {
    "len" => {
      arity(name, &args, 1..=1)?;
      let n = match &args[0] {
        Value::Str(s) => s.chars().count(),
        Value::List(items) => items.len(),
        other => return Err(ScriptError::Type(format!("object of type '{}' has no len()", other.type_name()))),
      };
      Ok(Value::Int(n as i64))
    }
    "str" => {
      arity(name, &args, 0..=1)?;
      let out = args.pop().map(|v| v.to_string()).unwrap_or_default();
      check_len(out.chars().count())?;
      Ok(Value::Str(out))
    }
    "int" => {
      arity(name, &args, 1..=1)?;
      match &args[0] {
        Value::Int(i) => Ok(Value::Int(*i)),
        Value::Bool(b) => Ok(Value::Int(*b as i64)),
        Value::Float(f) if f.is_finite() => Ok(Value::Int(f.trunc() as i64)),
        Value::Str(s) => s
          .trim()
          .parse::<i64>()
          .map(Value::Int)
          .map_err(|_| ScriptError::Value(format!("invalid literal for int(): '{s}'"))),
        other => Err(ScriptError::Type(format!("int() argument cannot be '{}'", other.type_name()))),
      }
    }
    "float" => {
      arity(name, &args, 1..=1)?;
      match &args[0] {
        Value::Str(s) => s
          .trim()
          .parse::<f64>()
          .map(Value::Float)
          .map_err(|_| ScriptError::Value(format!("could not convert string to float: '{s}'"))),
        other => other
          .as_f64()
          .map(Value::Float)
          .ok_or_else(|| ScriptError::Type(format!("float() argument cannot be '{}'", other.type_name()))),
      }
    }
    "bool" => {
      arity(name, &args, 1..=1)?;
      Ok(Value::Bool(args[0].truthy()))
    }
    "abs" => {
      arity(name, &args, 1..=1)?;
      match &args[0] {
        Value::Int(i) => i.checked_abs().map(Value::Int).ok_or(ScriptError::Overflow),
        Value::Float(f) => Ok(Value::Float(f.abs())),
        other => Err(ScriptError::Type(format!("bad operand type for abs(): '{}'", other.type_name()))),
      }
    }
    "max" | "min" => {
      let items = match args.as_slice() {
        [Value::List(items)] => items.clone(),
        [] => return Err(ScriptError::Type(format!("{name} expected at least 1 argument"))),
        _ => args,
      };
      let want = if name == "max" { Ordering::Greater } else { Ordering::Less };
      let mut iter = items.into_iter();
      let mut best = iter
        .next()
        .ok_or_else(|| ScriptError::Value(format!("{name}() arg is an empty sequence")))?;
      for item in iter {
        if item.compare(&best)? == want {
          best = item;
        }
      }
      Ok(best)
    }
    "sum" => {
      arity(name, &args, 1..=1)?;
      let Value::List(items) = &args[0] else {
        return Err(ScriptError::Type("sum() expects a list".into()));
      };
      items
        .iter()
        .try_fold(Value::Int(0), |acc, item| binary(BinOp::Add, &acc, item))
    }
    "round" => {
      arity(name, &args, 1..=2)?;
      let x = args[0]
        .as_f64()
        .ok_or_else(|| ScriptError::Type(format!("type {} doesn't define round()", args[0].type_name())))?;
      match args.get(1) {
        None => Ok(Value::Int(x.round_ties_even() as i64)),
        Some(d) => {
          let digits = d
            .as_i64()
            .ok_or_else(|| ScriptError::Type("round() digits must be an integer".into()))?;
          let factor = 10f64.powi(digits.clamp(-308, 308) as i32);
          Ok(Value::Float((x * factor).round_ties_even() / factor))
        }
      }
    }
    "sorted" => {
      arity(name, &args, 1..=1)?;
      let mut items = match args.pop() {
        Some(Value::List(items)) => items,
        Some(Value::Str(s)) => s.chars().map(|c| Value::Str(c.to_string())).collect(),
        _ => return Err(ScriptError::Type("sorted() expects a list".into())),
      };
      let mut failure = None;
      items.sort_by(|a, b| {
        a.compare(b).unwrap_or_else(|e| {
          failure.get_or_insert(e);
          Ordering::Equal
        })
      });
      match failure {
        Some(e) => Err(e),
        None => Ok(Value::List(items)),
      }
    }
    "range" => {
      arity(name, &args, 1..=3)?;
      let ints = args
        .iter()
        .map(|a| a.as_i64().ok_or_else(|| ScriptError::Type("range() expects integers".into())))
        .collect::<ScriptResult<Vec<i64>>>()?;
      let (start, stop, step) = match ints.as_slice() {
        [stop] => (0, *stop, 1),
        [start, stop] => (*start, *stop, 1),
        [start, stop, step] => (*start, *stop, *step),
        _ => return Err(ScriptError::Type("range() expects 1 to 3 arguments".into())),
      };
      if step == 0 {
        return Err(ScriptError::Value("range() arg 3 must not be zero".into()));
      }
      let span = if step > 0 { stop.saturating_sub(start) } else { start.saturating_sub(stop) };
      let count = if span <= 0 { 0 } else { (span.unsigned_abs() - 1) / step.unsigned_abs() + 1 };
      check_len(usize::try_from(count).unwrap_or(usize::MAX))?;
      let values = (0..count as i64).map(|k| Value::Int(start + k * step)).collect();
      Ok(Value::List(values))
    }
    other => Err(ScriptError::UnknownFunction(other.to_string())),
  }
}

fn call_method(target: Value, name: &str, args: Vec<Value>) -> ScriptResult<Value> {
  let Value::Str(s) = target else {
    return Err(ScriptError::Type(format!("'{}' object has no method '{name}'", target.type_name())));
  };
  let str_arg = |i: usize| match args.get(i) {
    Some(Value::Str(a)) => Ok(a.as_str()),
    _ => Err(ScriptError::Type(format!("str.{name}() expects string arguments"))),
  };
  match name {
    "upper" => Ok(Value::Str(s.to_uppercase())),
    "lower" => Ok(Value::Str(s.to_lowercase())),
    "strip" => Ok(Value::Str(s.trim().to_string())),
    "capitalize" => {
      let mut chars = s.chars();
      let out = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
        None => String::new(),
      };
      Ok(Value::Str(out))
    }
    "title" => {
      let mut out = String::with_capacity(s.len());
      let mut prev_alpha = false;
      for c in s.chars() {
        if prev_alpha {
          out.extend(c.to_lowercase());
        } else {
          out.extend(c.to_uppercase());
        }
        prev_alpha = c.is_alphabetic();
      }
      Ok(Value::Str(out))
    }
    "replace" => {
      let (from, to) = (str_arg(0)?, str_arg(1)?);
      // an empty pattern matches between every pair of chars
      let hits = s.matches(from).count();
      let kept = s.chars().count().saturating_sub(hits.saturating_mul(from.chars().count()));
      check_len(kept.saturating_add(hits.saturating_mul(to.chars().count())))?;
      Ok(Value::Str(s.replace(from, to)))
    }
    "split" => {
      let parts: Vec<Value> = if args.is_empty() {
        s.split_whitespace().map(|p| Value::Str(p.to_string())).collect()
      } else {
        let sep = str_arg(0)?;
        if sep.is_empty() {
          return Err(ScriptError::Value("empty separator".into()));
        }
        s.split(sep).map(|p| Value::Str(p.to_string())).collect()
      };
      Ok(Value::List(parts))
    }
    "join" => match args.first() {
      Some(Value::List(items)) => {
        let pieces = items
          .iter()
          .map(|v| match v {
            Value::Str(p) => Ok(p.as_str()),
            other => Err(ScriptError::Type(format!("join() expected str, found {}", other.type_name()))),
          })
          .collect::<ScriptResult<Vec<&str>>>()?;
        let seps = s.chars().count().saturating_mul(pieces.len().saturating_sub(1));
        let total = pieces.iter().map(|p| p.chars().count()).fold(seps, usize::saturating_add);
        check_len(total)?;
        Ok(Value::Str(pieces.join(s.as_str())))
      }
      _ => Err(ScriptError::Type("join() expects a list".into())),
    },
    "count" => Ok(Value::Int(s.matches(str_arg(0)?).count() as i64)),
    "startswith" => Ok(Value::Bool(s.starts_with(str_arg(0)?))),
    "endswith" => Ok(Value::Bool(s.ends_with(str_arg(0)?))),
    "find" => {
      let needle = str_arg(0)?;
      let pos = s.find(needle).map(|byte| s[..byte].chars().count() as i64).unwrap_or(-1);
      Ok(Value::Int(pos))
    }
    other => Err(ScriptError::Type(format!("'str' object has no method '{other}'"))),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::evaluator::parser::{parse_expression, parse_statement};

  fn run(scope: &mut Scope, line: &str) {
    let stmt = parse_statement(line).expect("parse").expect("stmt");
    scope.exec(&stmt).expect("exec");
  }

  fn eval(scope: &mut Scope, src: &str) -> ScriptResult<Value> {
    scope.eval(&parse_expression(src)?)
  }

  #[test]
  fn assignments_share_one_scope() {
    let mut scope = Scope::new();
    run(&mut scope, "x = 4");
    run(&mut scope, "x *= 3");
    run(&mut scope, "label = 'x=' + str(x)");
    assert_eq!(eval(&mut scope, "label").expect("value"), Value::Str("x=12".into()));
  }

  #[test]
  fn python_division_rules() {
    let mut scope = Scope::new();
    assert_eq!(eval(&mut scope, "7 / 2").expect("div"), Value::Float(3.5));
    assert_eq!(eval(&mut scope, "-7 // 2").expect("floordiv"), Value::Int(-4));
    assert_eq!(eval(&mut scope, "-7 % 3").expect("mod"), Value::Int(2));
    assert_eq!(eval(&mut scope, "2 ** 10").expect("pow"), Value::Int(1024));
    assert_eq!(eval(&mut scope, "1 / 0"), Err(ScriptError::ZeroDivision));
  }

  #[test]
  fn string_and_int_do_not_mix() {
    let mut scope = Scope::new();
    assert!(matches!(eval(&mut scope, "'a' + 1"), Err(ScriptError::Type(_))));
  }

  #[test]
  fn list_mutation_through_methods() {
    let mut scope = Scope::new();
    run(&mut scope, "fruits = ['apple']");
    run(&mut scope, "fruits.append('kiwi')");
    run(&mut scope, "fruits.extend(['fig', 'pear'])");
    run(&mut scope, "fruits.pop()");
    assert_eq!(eval(&mut scope, "len(fruits)").expect("len"), Value::Int(3));
    assert_eq!(eval(&mut scope, "fruits[-1]").expect("last"), Value::Str("fig".into()));
  }

  #[test]
  fn slices_follow_python() {
    let mut scope = Scope::new();
    assert_eq!(eval(&mut scope, "'python'[::-1]").expect("rev"), Value::Str("nohtyp".into()));
    assert_eq!(eval(&mut scope, "'python'[1:4]").expect("mid"), Value::Str("yth".into()));
    assert_eq!(eval(&mut scope, "[1, 2, 3, 4][-2:]").expect("tail").to_string(), "[3, 4]");
  }

  #[test]
  fn builtins_cover_beginner_needs() {
    let mut scope = Scope::new();
    assert_eq!(eval(&mut scope, "sum(range(1, 11))").expect("sum"), Value::Int(55));
    assert_eq!(eval(&mut scope, "max([3, 9, 2])").expect("max"), Value::Int(9));
    assert_eq!(eval(&mut scope, "min(4, 1.5)").expect("min"), Value::Float(1.5));
    assert_eq!(eval(&mut scope, "round(2.5)").expect("round"), Value::Int(2));
    assert_eq!(eval(&mut scope, "sorted([3, 1, 2])").expect("sorted").to_string(), "[1, 2, 3]");
    assert_eq!(eval(&mut scope, "'-'.join(['a', 'b'])").expect("join"), Value::Str("a-b".into()));
    assert_eq!(eval(&mut scope, "'hello world'.title()").expect("title"), Value::Str("Hello World".into()));
  }

  #[test]
  fn comparisons_chain_and_short_circuit() {
    let mut scope = Scope::new();
    assert_eq!(eval(&mut scope, "1 < 2 <= 2").expect("chain"), Value::Bool(true));
    assert_eq!(eval(&mut scope, "'py' in 'python' and not 3 in [1, 2]").expect("in"), Value::Bool(true));
    // rhs never evaluated, so the undefined name is harmless
    assert_eq!(eval(&mut scope, "True or missing").expect("or"), Value::Bool(true));
  }

  #[test]
  fn runaway_growth_hits_the_limit() {
    let mut scope = Scope::new();
    let err = eval(&mut scope, "'ab' * 1000000").unwrap_err();
    assert!(err.is_fatal());
    assert!(eval(&mut scope, "range(10 ** 9)").unwrap_err().is_fatal());
  }

  #[test]
  fn integer_overflow_is_reported() {
    let mut scope = Scope::new();
    assert_eq!(eval(&mut scope, "2 ** 100"), Err(ScriptError::Overflow));
  }

  #[test]
  fn floor_division_of_the_smallest_int_overflows() {
    let mut scope = Scope::new();
    let min = "(-9223372036854775807 - 1)";
    assert_eq!(eval(&mut scope, &format!("{min} // -1")), Err(ScriptError::Overflow));
    assert_eq!(eval(&mut scope, &format!("{min} % -1")), Err(ScriptError::Overflow));
    assert_eq!(eval(&mut scope, &format!("abs({min})")), Err(ScriptError::Overflow));
    assert_eq!(eval(&mut scope, &format!("-{min}")), Err(ScriptError::Overflow));
  }

  #[test]
  fn extreme_slice_steps_and_bounds() {
    let mut scope = Scope::new();
    let max = i64::MAX;
    assert_eq!(eval(&mut scope, &format!("'abc'[1::{max}]")).expect("step"), Value::Str("b".into()));
    assert_eq!(eval(&mut scope, &format!("'abc'[::-{max}]")).expect("neg step"), Value::Str("c".into()));
    assert_eq!(
      eval(&mut scope, &format!("[1, 2, 3][-{max}:{max}:{max}]")).expect("list").to_string(),
      "[1]"
    );
    assert_eq!(eval(&mut scope, &format!("'abc'[{max}:]")).expect("past end"), Value::Str("".into()));
    assert_eq!(eval(&mut scope, &format!("'abc'[-{max}]")), Err(ScriptError::IndexOutOfRange));
  }

  #[test]
  fn empty_sequences_repeat_to_empty_for_any_count() {
    let mut scope = Scope::new();
    assert_eq!(eval(&mut scope, "len([] * 10 ** 18)").expect("list"), Value::Int(0));
    assert_eq!(eval(&mut scope, "'' * 10 ** 18").expect("str"), Value::Str("".into()));
    assert_eq!(eval(&mut scope, "10 ** 18 * []").expect("rhs"), Value::List(vec![]));
    assert_eq!(eval(&mut scope, "['a'] * -5").expect("negative"), Value::List(vec![]));
    // a list of empty lists still has weight
    assert!(eval(&mut scope, "[[]] * 10 ** 18").unwrap_err().is_fatal());
  }

  #[test]
  fn nested_list_growth_counts_every_item() {
    let mut scope = Scope::new();
    run(&mut scope, "x = [0] * 1000");
    assert!(eval(&mut scope, "[x] * 1000").unwrap_err().is_fatal());
    assert!(eval(&mut scope, "[x] * 50 + [x] * 60").unwrap_err().is_fatal());
    assert_eq!(eval(&mut scope, "len([x] * 10)").expect("small"), Value::Int(10));
    assert!(eval(&mut scope, "[['ab' * 1000] * 100] * 10").unwrap_err().is_fatal());
  }

  #[test]
  fn str_of_a_large_list_is_limited() {
    let mut scope = Scope::new();
    run(&mut scope, "y = [0] * 60000");
    assert!(eval(&mut scope, "str(y)").unwrap_err().is_fatal());
    assert!(eval(&mut scope, "'-'.join(['ab'] * 40000)").unwrap_err().is_fatal());
    assert!(eval(&mut scope, "('x' * 1000).replace('', 'yyyy' * 100)").unwrap_err().is_fatal());
    assert_eq!(eval(&mut scope, "'ab'.replace('', '-')").expect("small"), Value::Str("-a-b-".into()));
  }

  #[test]
  fn wrapping_a_list_in_itself_stops_at_the_nesting_limit() {
    let mut scope = Scope::new();
    run(&mut scope, "x = [1]");
    let mut outcome = Ok(());
    for _ in 0..64 {
      let stmt = parse_statement("x = [x]").expect("parse").expect("stmt");
      outcome = scope.exec(&stmt);
      if outcome.is_err() {
        break;
      }
    }
    assert!(outcome.unwrap_err().is_fatal());
  }

  #[test]
  fn many_large_variables_exhaust_the_scope_budget() {
    let mut scope = Scope::new();
    let mut outcome = Ok(());
    for i in 0..20 {
      let stmt = parse_statement(&format!("v{i} = 'x' * 100000")).expect("parse").expect("stmt");
      outcome = scope.exec(&stmt);
      if outcome.is_err() {
        break;
      }
    }
    assert!(outcome.unwrap_err().is_fatal());
    // reassigning releases the old value's share
    let mut scope = Scope::new();
    for _ in 0..20 {
      run(&mut scope, "v = 'x' * 100000");
    }
  }
}
