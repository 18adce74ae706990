//! Badge rule engine.
//!
//! Pure function of (progress, catalog): which badges are earned now but not yet
//! recorded. Results follow catalog badge order.

use tracing::debug;

use crate::catalog::Catalog;
use crate::domain::{BadgeTrigger, Progress};

/// Is `trigger` satisfied by `progress` against the given catalog?
pub fn is_satisfied(trigger: &BadgeTrigger, progress: &Progress, catalog: &Catalog) -> bool {
  match trigger {
    BadgeTrigger::PointThreshold { points } => progress.points >= *points,
    BadgeTrigger::CompletionCount { count } => progress.completed_challenges.len() >= *count,
    BadgeTrigger::CategoryLevelComplete { category, level } => {
      let mut subset = catalog.filter(*category, *level).peekable();
      // An empty subset never triggers.
      subset.peek().is_some() && subset.all(|c| progress.has_completed(&c.id))
    }
    // Counts only: completed ids are not matched against the catalog.
    BadgeTrigger::FullCompletion => progress.completed_challenges.len() == catalog.challenges().len(),
  }
}

/// Badge ids newly earned by `progress`, excluding the ones it already holds.
pub fn check_new_badges(progress: &Progress, catalog: &Catalog) -> Vec<String> {
  let new: Vec<String> = catalog
    .badges()
    .iter()
    .filter(|b| !progress.has_badge(&b.id))
    .filter(|b| is_satisfied(&b.trigger, progress, catalog))
    .map(|b| b.id.clone())
    .collect();
  if !new.is_empty() {
    debug!(target: "challenge", badges = ?new, "Badge conditions met");
  }
  new
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{Badge, Category, Level};
  use crate::seeds::seed_challenges;

  fn progress(completed: &[&str], points: u32, badges: &[&str]) -> Progress {
    Progress {
      completed_challenges: completed.iter().map(|s| s.to_string()).collect(),
      points,
      badges: badges.iter().map(|s| s.to_string()).collect(),
    }
  }

  #[test]
  fn first_beginner_completion_earns_points_and_first_steps() {
    let catalog = Catalog::default();
    let p = progress(&["py-hello"], 100, &[]);
    assert_eq!(check_new_badges(&p, &catalog), vec!["points-100", "complete-1"]);
  }

  #[test]
  fn held_badges_are_not_reported_again() {
    let catalog = Catalog::default();
    let p = progress(&["py-hello"], 100, &["points-100", "complete-1"]);
    assert!(check_new_badges(&p, &catalog).is_empty());
  }

  #[test]
  fn category_level_badge_needs_the_whole_subset() {
    let catalog = Catalog::default();
    let two = progress(&["py-hello", "py-variables"], 200, &[]);
    assert!(!check_new_badges(&two, &catalog).contains(&"python-beginner".to_string()));
    let three = progress(&["py-hello", "py-variables", "py-arithmetic"], 300, &[]);
    assert!(check_new_badges(&three, &catalog).contains(&"python-beginner".to_string()));
  }

  #[test]
  fn empty_subset_never_triggers() {
    let only_script: Vec<_> = seed_challenges()
      .into_iter()
      .filter(|c| c.category == Category::ScriptLanguage)
      .collect();
    let catalog = Catalog::new(
      only_script,
      vec![Badge {
        id: "markup-beginner".into(),
        title: "Markup".into(),
        description: "Unreachable here.".into(),
        trigger: BadgeTrigger::CategoryLevelComplete { category: Category::MarkupStyle, level: Level::Beginner },
      }],
    );
    assert!(check_new_badges(&Progress::default(), &catalog).is_empty());
  }

  #[test]
  fn full_completion_compares_counts() {
    let catalog = Catalog::default();
    let ids: Vec<&str> = catalog.challenges().iter().map(|c| c.id.as_str()).collect();
    let all_but_one = &ids[..ids.len() - 1];

    let short = progress(all_but_one, 0, &[]);
    assert!(!is_satisfied(&BadgeTrigger::FullCompletion, &short, &catalog));

    // a retired id still counts toward the total
    let mut with_retired = all_but_one.to_vec();
    with_retired.push("retired-challenge");
    let p = progress(&with_retired, 0, &[]);
    assert!(is_satisfied(&BadgeTrigger::FullCompletion, &p, &catalog));
    assert!(check_new_badges(&p, &catalog).contains(&"master-coder".to_string()));
  }

  #[test]
  fn earned_set_only_grows_as_progress_grows() {
    let catalog = Catalog::default();
    let mut p = Progress::default();
    let mut earned: Vec<String> = Vec::new();
    for c in catalog.challenges() {
      p.completed_challenges.push(c.id.clone());
      p.points += c.points;
      let now: Vec<String> = catalog
        .badges()
        .iter()
        .filter(|b| is_satisfied(&b.trigger, &p, &catalog))
        .map(|b| b.id.clone())
        .collect();
      assert!(earned.iter().all(|id| now.contains(id)), "lost a badge after {}", c.id);
      earned = now;
    }
    assert_eq!(earned.len(), catalog.badges().len());
  }

  #[test]
  fn master_coder_is_reported_exactly_once() {
    let catalog = Catalog::default();
    let mut p = Progress::default();
    let mut reports = 0;
    for c in catalog.challenges() {
      p.completed_challenges.push(c.id.clone());
      p.points += c.points;
      let new = check_new_badges(&p, &catalog);
      reports += new.iter().filter(|id| *id == "master-coder").count();
      p.badges.extend(new);
    }
    assert_eq!(reports, 1);
    assert_eq!(p.badges.last().map(String::as_str), Some("master-coder"));
  }
}
