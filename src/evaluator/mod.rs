//! Submission evaluator: decides pass/fail and produces the output shown to the user.
//!
//! - Markup/style challenges compare normalized text (containment, not equality).
//! - Script challenges run through a restricted micro-interpreter
//!   (tokenizer + recursive descent + tree walker over a flat scope); no code is
//!   ever executed natively.
//!
//! Evaluation never fails from the caller's point of view: problems become an
//! output string and `passed = false`.

mod error;
mod interp;
mod lexer;
mod parser;
mod script;
mod value;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::domain::Category;
use script::run_script;

/// Result of judging one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evaluation {
  /// Raw markup (for preview) or the script's textual output.
  pub output: String,
  pub passed: bool,
}

#[instrument(level = "info", skip(submitted, reference), fields(submitted_len = submitted.len()))]
pub fn evaluate(category: Category, submitted: &str, reference: &str) -> Evaluation {
  let evaluation = match category {
    Category::MarkupStyle => Evaluation {
      output: submitted.to_string(),
      passed: normalize_markup(submitted).contains(&normalize_markup(reference)),
    },
    Category::ScriptLanguage => match run_script(submitted) {
      Ok(output) => {
        let passed = normalize_output(&output) == normalize_output(reference);
        Evaluation { output, passed }
      }
      Err(e) => Evaluation { output: format!("Error: {e}"), passed: false },
    },
  };
  debug!(target: "challenge", passed = evaluation.passed, output_len = evaluation.output.len(), "Submission evaluated");
  evaluation
}

/// Strip all whitespace, then every `alt=""`.
pub fn normalize_markup(s: &str) -> String {
  let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
  compact.replace("alt=\"\"", "")
}

/// Strip all whitespace and quote characters.
pub fn normalize_output(s: &str) -> String {
  s.chars().filter(|c| !c.is_whitespace() && *c != '"' && *c != '\'').collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn print_hello_passes() {
    let ev = evaluate(Category::ScriptLanguage, "print(\"hello\")", "hello");
    assert_eq!(ev, Evaluation { output: "hello".into(), passed: true });
  }

  #[test]
  fn empty_alt_attribute_is_ignored() {
    let ev = evaluate(Category::MarkupStyle, "<img alt=\"\">", "<img>");
    assert!(ev.passed);
    assert_eq!(ev.output, "<img alt=\"\">");
  }

  #[test]
  fn markup_passes_when_wrapped_in_extra_elements() {
    let submitted = "<main>\n  <h1>Hello</h1>\n</main>";
    assert!(evaluate(Category::MarkupStyle, submitted, "<h1>Hello</h1>").passed);
    assert!(!evaluate(Category::MarkupStyle, submitted, "<h2>Hello</h2>").passed);
  }

  #[test]
  fn script_comparison_ignores_whitespace_and_quotes() {
    let ev = evaluate(Category::ScriptLanguage, "print(['a', 'b'])", "[a,b]");
    assert_eq!(ev.output, "['a', 'b']");
    assert!(ev.passed);
  }

  #[test]
  fn wrong_output_fails() {
    let ev = evaluate(Category::ScriptLanguage, "print(1 + 1)", "3");
    assert_eq!(ev.output, "2");
    assert!(!ev.passed);
  }

  #[test]
  fn fatal_errors_become_error_output() {
    let ev = evaluate(Category::ScriptLanguage, "print('x' * 10 ** 8)", "x");
    assert!(ev.output.starts_with("Error: "));
    assert!(!ev.passed);
  }
}
