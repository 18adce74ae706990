//! Heuristic runner for script submissions.
//!
//! Observable behavior is the ordered list of `print(...)` outputs:
//!   1. lines starting with `print` are set aside;
//!   2. the remaining lines run one by one in a shared scope, errors ignored;
//!   3. every `print(` call in the original text is evaluated against that scope;
//!   4. with no prints at all, the last non-comment line is evaluated as an expression.

use tracing::{debug, instrument};

use super::error::{ScriptError, ScriptResult};
use super::interp::Scope;
use super::parser::{parse_arguments, parse_expression, parse_statement};
use super::value::check_len;

/// Largest submission accepted, in bytes.
pub const MAX_SOURCE_LEN: usize = 64 * 1024;

const PRINT_TOKEN: &str = "print";

/// Run a submission and return its textual output.
///
/// Only fatal errors (resource limits) surface as `Err`; everything else is
/// recovered into fallback output.
#[instrument(level = "debug", skip(code), fields(code_len = code.len()))]
pub fn run_script(code: &str) -> ScriptResult<String> {
  if code.len() > MAX_SOURCE_LEN {
    return Err(ScriptError::SourceTooLarge(code.len()));
  }

  let mut scope = Scope::new();
  for line in code.lines().filter(|l| !is_print_line(l)) {
    match parse_statement(line.trim()).and_then(|stmt| match stmt {
      Some(stmt) => scope.exec(&stmt),
      None => Ok(()),
    }) {
      Ok(()) => {}
      Err(e) if e.is_fatal() => return Err(e),
      Err(e) => debug!(target: "challenge", error = %e, "skipping statement"),
    }
  }

  let calls = find_print_calls(code);
  if !calls.is_empty() {
    let mut lines = Vec::with_capacity(calls.len());
    let mut total = 0usize;
    for raw in calls {
      let line = render_print(&mut scope, raw)?;
      total = total.saturating_add(line.chars().count() + 1);
      check_len(total)?;
      lines.push(line);
    }
    return Ok(lines.join("\n"));
  }

  let last = code
    .lines()
    .map(str::trim)
    .filter(|l| !l.is_empty() && !l.starts_with('#'))
    .last();
  match last.map(|l| parse_expression(l).and_then(|e| scope.eval(&e))) {
    Some(Ok(v)) => {
      let out = v.to_string();
      check_len(out.chars().count())?;
      Ok(out)
    }
    Some(Err(e)) if e.is_fatal() => Err(e),
    _ => Ok(String::new()),
  }
}

fn is_print_line(line: &str) -> bool {
  line
    .trim_start()
    .strip_prefix(PRINT_TOKEN)
    .is_some_and(|rest| rest.trim_start().starts_with('('))
}

/// Evaluate one print argument list; multiple arguments are space-joined.
fn render_print(scope: &mut Scope, raw: &str) -> ScriptResult<String> {
  let evaluated = parse_arguments(raw).and_then(|args| {
    args
      .iter()
      .map(|a| scope.eval(a).map(|v| v.to_string()))
      .collect::<ScriptResult<Vec<String>>>()
  });
  match evaluated {
    Ok(parts) => {
      let line = parts.join(" ");
      check_len(line.chars().count())?;
      Ok(line)
    }
    Err(e) if e.is_fatal() => Err(e),
    Err(e) => {
      debug!(target: "challenge", error = %e, "print argument did not evaluate");
      Ok(literal_fallback(raw.trim()))
    }
  }
}

fn literal_fallback(arg: &str) -> String {
  let quoted = arg.len() >= 2
    && ((arg.starts_with('"') && arg.ends_with('"')) || (arg.starts_with('\'') && arg.ends_with('\'')));
  if quoted {
    arg[1..arg.len() - 1].to_string()
  } else {
    format!("Evaluation error: {arg}")
  }
}

/// Locate every `print(` call left to right and return the raw argument text up
/// to the matching `)`. Parentheses inside string literals are ignored; a call
/// that never closes (or whose string literal runs past the line) is dropped.
pub fn find_print_calls(code: &str) -> Vec<&str> {
  let bytes = code.as_bytes();
  let mut calls = Vec::new();
  let mut search_from = 0;
  while let Some(found) = code[search_from..].find(PRINT_TOKEN) {
    let start = search_from + found;
    search_from = start + PRINT_TOKEN.len();

    let preceded_by_ident = start > 0 && is_ident_byte(bytes[start - 1]);
    let mut open = search_from;
    while open < bytes.len() && (bytes[open] == b' ' || bytes[open] == b'\t') {
      open += 1;
    }
    if preceded_by_ident || bytes.get(open) != Some(&b'(') {
      continue;
    }
    if let Some(close) = matching_paren(bytes, open) {
      calls.push(&code[open + 1..close]);
      search_from = close + 1;
    }
  }
  calls
}

fn is_ident_byte(b: u8) -> bool {
  b.is_ascii_alphanumeric() || b == b'_'
}

fn matching_paren(bytes: &[u8], open: usize) -> Option<usize> {
  let mut depth = 0usize;
  let mut quote: Option<u8> = None;
  let mut i = open;
  while i < bytes.len() {
    let b = bytes[i];
    match quote {
      Some(q) => {
        if b == b'\\' {
          i += 1;
        } else if b == q {
          quote = None;
        } else if b == b'\n' {
          return None;
        }
      }
      None => match b {
        b'\'' | b'"' => quote = Some(b),
        b'(' => depth += 1,
        b')' => {
          depth -= 1;
          if depth == 0 {
            return Some(i);
          }
        }
        _ => {}
      },
    }
    i += 1;
  }
  None
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn prints_see_variables_defined_later_in_the_text() {
    let code = "name = 'Ada'\nprint('Hi ' + name)\nage = 36\nprint(age + 1)";
    assert_eq!(run_script(code).expect("run"), "Hi Ada\n37");
  }

  #[test]
  fn multiple_print_arguments_are_space_joined() {
    assert_eq!(run_script("x = 2\nprint('x is', x)").expect("run"), "x is 2");
  }

  #[test]
  fn bad_statements_are_skipped() {
    let code = "for i in range(3):\n    total = 1\nprint(total)";
    assert_eq!(run_script(code).expect("run"), "1");
  }

  #[test]
  fn unevaluable_argument_yields_placeholder() {
    assert_eq!(run_script("print('a' 'b' + )").expect("run"), "Evaluation error: 'a' 'b' +");
    assert_eq!(run_script("print(missing)").expect("run"), "Evaluation error: missing");
  }

  #[test]
  fn quote_delimited_failure_strips_quotes() {
    assert_eq!(run_script("print(\"say \"hi\"\")").expect("run"), "say \"hi\"");
  }

  #[test]
  fn parentheses_inside_strings_do_not_end_the_call() {
    assert_eq!(find_print_calls("print('(:')\nprint(len('ab'))"), vec!["'(:'", "len('ab')"]);
  }

  #[test]
  fn identifiers_ending_in_print_are_not_calls() {
    assert!(find_print_calls("reprint(1)\nfingerprint = 2").is_empty());
  }

  #[test]
  fn last_expression_is_the_result_without_prints() {
    let code = "a = 6\nb = 7\n# answer\na * b\n";
    assert_eq!(run_script(code).expect("run"), "42");
  }

  #[test]
  fn last_line_that_is_not_an_expression_yields_empty_output() {
    assert_eq!(run_script("a = 6").expect("run"), "");
  }

  #[test]
  fn long_addition_chain_is_recovered_not_a_crash() {
    let code = format!("print(1{})", "+1".repeat(30_000));
    let out = run_script(&code).expect("run");
    assert!(out.starts_with("Evaluation error: 1+1+1"));

    let code = format!("total = 1{}\nprint(total)", " + 1".repeat(5_000));
    assert_eq!(run_script(&code).expect("run"), "Evaluation error: total");
  }

  #[test]
  fn extreme_slice_step_prints_one_char() {
    assert_eq!(run_script("print('abc'[1::9223372036854775807])").expect("run"), "b");
  }

  #[test]
  fn oversized_fstring_precision_falls_back() {
    assert_eq!(run_script("print(f'{1:.70000f}')").expect("run"), "Evaluation error: f'{1:.70000f}'");
    assert_eq!(run_script("print(f'{2:.3f}')").expect("run"), "2.000");
  }

  #[test]
  fn repeating_empty_sequences_returns_at_once() {
    assert_eq!(run_script("print(len([] * 10 ** 18))").expect("run"), "0");
    assert_eq!(run_script("s = '' * 10 ** 18\nprint(len(s))").expect("run"), "0");
  }

  #[test]
  fn nested_growth_and_rendering_are_bounded() {
    let code = "x = [0] * 1000\ny = [x] * 1000\nprint(len(str(y)))";
    assert!(matches!(run_script(code), Err(ScriptError::LimitExceeded(_))));

    assert!(matches!(run_script("print([0] * 60000)"), Err(ScriptError::LimitExceeded(_))));

    let many = "s = 'x' * 60000\n".to_string() + &"print(s)\n".repeat(3);
    assert!(matches!(run_script(&many), Err(ScriptError::LimitExceeded(_))));
  }

  #[test]
  fn smallest_int_floor_division_is_not_a_crash() {
    let code = "m = -9223372036854775807 - 1\nprint(m // -1)";
    assert_eq!(run_script(code).expect("run"), "Evaluation error: m // -1");
  }

  #[test]
  fn limits_are_fatal() {
    assert!(run_script("s = 'x' * 10000000").is_err());
    let huge = "1".repeat(MAX_SOURCE_LEN + 1);
    assert!(matches!(run_script(&huge), Err(ScriptError::SourceTooLarge(_))));
  }
}
