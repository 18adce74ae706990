//! Process-wide, read-only catalog of challenges and badges.

use std::collections::HashSet;

use tracing::{error, info, instrument, warn};

use crate::config::CatalogConfig;
use crate::domain::{Badge, Category, Challenge, Level};
use crate::evaluator::evaluate;
use crate::seeds::{seed_badges, seed_challenges};

#[derive(Debug, Clone)]
pub struct Catalog {
  challenges: Vec<Challenge>,
  badges: Vec<Badge>,
}

impl Catalog {
  /// Build a catalog as given. Duplicate ids keep their first occurrence.
  pub fn new(challenges: Vec<Challenge>, badges: Vec<Badge>) -> Self {
    let mut seen = HashSet::new();
    let challenges = challenges.into_iter().filter(|c| seen.insert(c.id.clone())).collect();
    let mut seen = HashSet::new();
    let badges = badges.into_iter().filter(|b| seen.insert(b.id.clone())).collect();
    Self { challenges, badges }
  }

  /// Configured entries first, then built-in seeds; seeds never overwrite an id
  /// already present. Invalid configured challenges are skipped.
  #[instrument(level = "info", skip_all)]
  pub fn from_config(cfg: Option<&CatalogConfig>) -> Self {
    let mut challenges = Vec::new();
    let mut badges = Vec::new();

    if let Some(cfg) = cfg {
      for c in &cfg.challenges {
        if c.id.trim().is_empty() || c.points == 0 {
          error!(target: "challenge", id = %c.id, points = c.points, "Skipping bank item: empty id or zero points.");
          continue;
        }
        challenges.push(c.clone());
      }
      badges.extend(cfg.badges.iter().filter(|b| !b.id.trim().is_empty()).cloned());
    }
    challenges.extend(seed_challenges());
    badges.extend(seed_badges());

    let catalog = Self::new(challenges, badges);
    for category in Category::ALL {
      for level in Level::ALL {
        let n = catalog.filter(category, level).count();
        info!(target: "challenge", category = category.label(), ?level, count = n, "Startup challenge inventory");
      }
    }
    catalog.self_check();
    catalog
  }

  /// Every reference solution must pass when submitted as-is.
  fn self_check(&self) {
    for c in &self.challenges {
      if !evaluate(c.category, &c.solution, &c.solution).passed {
        warn!(target: "challenge", id = %c.id, "Reference solution does not pass its own check");
      }
    }
  }

  pub fn challenges(&self) -> &[Challenge] {
    &self.challenges
  }

  pub fn badges(&self) -> &[Badge] {
    &self.badges
  }

  pub fn challenge(&self, id: &str) -> Option<&Challenge> {
    self.challenges.iter().find(|c| c.id == id)
  }

  pub fn badge(&self, id: &str) -> Option<&Badge> {
    self.badges.iter().find(|b| b.id == id)
  }

  /// Challenges of one (category, level) pair, in catalog order.
  pub fn filter(&self, category: Category, level: Level) -> impl Iterator<Item = &Challenge> + '_ {
    self
      .challenges
      .iter()
      .filter(move |c| c.category == category && c.level == level)
  }
}

impl Default for Catalog {
  fn default() -> Self {
    Self::new(seed_challenges(), seed_badges())
  }
}
