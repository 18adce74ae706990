//! Progress update orchestration and the read-only summaries derived from it.

use serde::Serialize;
use tracing::info;

use crate::badges::check_new_badges;
use crate::catalog::Catalog;
use crate::domain::{Category, Challenge, Level, Progress};

/// Outcome of recording a passed challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Award {
  /// The challenge was already completed; nothing changed.
  AlreadyCompleted,
  Awarded { points: u32, new_badges: Vec<String> },
}

impl Award {
  pub fn points(&self) -> u32 {
    match self {
      Award::AlreadyCompleted => 0,
      Award::Awarded { points, .. } => *points,
    }
  }

  pub fn new_badges(&self) -> &[String] {
    match self {
      Award::AlreadyCompleted => &[],
      Award::Awarded { new_badges, .. } => new_badges,
    }
  }
}

/// Record a passed challenge: first completion adds its points, then the badge
/// engine runs on the updated progress. Repeat completions are a no-op.
pub fn award(progress: &mut Progress, catalog: &Catalog, challenge: &Challenge) -> Award {
  if progress.has_completed(&challenge.id) {
    return Award::AlreadyCompleted;
  }
  progress.completed_challenges.push(challenge.id.clone());
  progress.points = progress.points.saturating_add(challenge.points);

  let new_badges = check_new_badges(progress, catalog);
  progress.badges.extend(new_badges.iter().cloned());
  info!(target: "challenge", id = %challenge.id, points = challenge.points, total = progress.points, new_badges = ?new_badges, "Challenge completed");
  Award::Awarded { points: challenge.points, new_badges }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LevelSummary {
  pub level: Level,
  pub completed: usize,
  pub total: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
  pub category: Category,
  pub label: &'static str,
  pub completed: usize,
  pub total: usize,
  pub levels: Vec<LevelSummary>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
  pub points: u32,
  pub completed: usize,
  pub total_challenges: usize,
  pub badges_earned: usize,
  pub total_badges: usize,
  pub categories: Vec<CategorySummary>,
}

/// Dashboard numbers. Completed ids no longer present in the catalog are not counted.
pub fn summarize(progress: &Progress, catalog: &Catalog) -> Summary {
  let count = |category: Category, level: Level| {
    catalog.filter(category, level).fold((0, 0), |(done, total), c| {
      (done + usize::from(progress.has_completed(&c.id)), total + 1)
    })
  };

  let categories: Vec<CategorySummary> = Category::ALL
    .into_iter()
    .map(|category| {
      let levels: Vec<LevelSummary> = Level::ALL
        .into_iter()
        .map(|level| {
          let (completed, total) = count(category, level);
          LevelSummary { level, completed, total }
        })
        .collect();
      CategorySummary {
        category,
        label: category.label(),
        completed: levels.iter().map(|l| l.completed).sum(),
        total: levels.iter().map(|l| l.total).sum(),
        levels,
      }
    })
    .collect();

  Summary {
    points: progress.points,
    completed: categories.iter().map(|c| c.completed).sum(),
    total_challenges: catalog.challenges().len(),
    badges_earned: progress.badges.len(),
    total_badges: catalog.badges().len(),
    categories,
  }
}
