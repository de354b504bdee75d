//! Keeping per-project and cross-project task lists in step.

use std::collections::HashMap;
use std::rc::Rc;
use tracing::debug;

use super::types::Task;
use crate::cache::DataCache;
use crate::keys::{CacheKey, ALL_PROJECTS};

/// Store a project's task list and fold the changes into the cross-project
/// list, if one is cached.
///
/// Only tasks already present in the cross-project list are replaced; the
/// cross-project list is never created here.
pub fn store_project_tasks(cache: &DataCache, project_id: &str, tasks: Vec<Task>) {
  let all_key = CacheKey::all_tasks().to_string();

  if project_id == ALL_PROJECTS {
    cache.set(all_key, tasks);
    return;
  }

  let all = match cache.get_as::<Vec<Task>>(&all_key) {
    Ok(all) => all,
    Err(e) => {
      debug!(error = %e, "cross-project task list has an unexpected type");
      None
    }
  };

  let merged = all.map(|all| merge_into(&all, &tasks));
  cache.set(CacheKey::tasks(project_id), tasks);

  if let Some(merged) = merged {
    debug!(project = project_id, tasks = merged.len(), "updating cross-project task list");
    cache.set(all_key, merged);
  }
}

/// Replace entries of `all` that have a newer version in `updated`.
fn merge_into(all: &Rc<Vec<Task>>, updated: &[Task]) -> Vec<Task> {
  let by_id: HashMap<&str, &Task> = updated.iter().map(|t| (t.id.as_str(), t)).collect();
  all
    .iter()
    .map(|task| {
      by_id
        .get(task.id.as_str())
        .map(|&newer| newer.clone())
        .unwrap_or_else(|| task.clone())
    })
    .collect()
}
