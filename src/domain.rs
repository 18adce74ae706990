//! Domain models: challenge categories/levels, challenges, badges and their triggers,
//! and the per-user progress record.

use serde::{Deserialize, Serialize};

/// Which evaluator judges a challenge.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
  /// Python-like snippets run through the script micro-interpreter.
  ScriptLanguage,
  /// HTML/CSS snippets compared as normalized text.
  MarkupStyle,
}

impl Category {
  pub const ALL: [Category; 2] = [Category::ScriptLanguage, Category::MarkupStyle];

  pub fn label(self) -> &'static str {
    match self {
      Category::ScriptLanguage => "Python",
      Category::MarkupStyle => "HTML/CSS",
    }
  }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Level {
  Beginner,
  Intermediate,
  Expert,
}

impl Level {
  pub const ALL: [Level; 3] = [Level::Beginner, Level::Intermediate, Level::Expert];
}

/// Immutable catalog entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Challenge {
  pub id: String,
  pub title: String,
  pub description: String,
  pub category: Category,
  pub level: Level,
  /// Code pre-filled in the editor.
  pub initial_code: String,
  /// Expected output (script) or expected markup fragment.
  pub solution: String,
  pub points: u32,
}

/// Condition under which a badge becomes earned. Adding a badge never requires
/// touching the engine, only a new catalog row.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BadgeTrigger {
  PointThreshold { points: u32 },
  CompletionCount { count: usize },
  CategoryLevelComplete { category: Category, level: Level },
  FullCompletion,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Badge {
  pub id: String,
  pub title: String,
  pub description: String,
  pub trigger: BadgeTrigger,
}

/// Mutable per-user state. Field names follow the stored JSON shape.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
  /// Challenge ids in order of first completion, no duplicates.
  #[serde(default)] pub completed_challenges: Vec<String>,
  #[serde(default)] pub points: u32,
  /// Earned badge ids in order of award, no duplicates.
  #[serde(default)] pub badges: Vec<String>,
}

impl Progress {
  pub fn has_completed(&self, challenge_id: &str) -> bool {
    self.completed_challenges.iter().any(|id| id == challenge_id)
  }

  pub fn has_badge(&self, badge_id: &str) -> bool {
    self.badges.iter().any(|id| id == badge_id)
  }
}

/// Persisted user record.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
  pub id: String,
  pub username: String,
  #[serde(default)]
  pub progress: Progress,
}

/// Identity handed over by the (mock) sign-in provider.
#[derive(Clone, Debug, Deserialize)]
pub struct Profile {
  pub id: String,
  pub username: String,
}
