//! Sections and task hierarchy.
//!
//! A section is an ordinary task whose title carries the folder prefix. Tasks
//! and subsections point at their section through `parent_task_id`.

use std::collections::{HashMap, HashSet};

use super::types::Task;

/// Title prefix marking a task as a section.
pub const SECTION_PREFIX: &str = "📁 ";

pub fn is_section(task: &Task) -> bool {
  task.title.starts_with(SECTION_PREFIX)
}

/// Title without the section prefix.
pub fn section_display_name(task: &Task) -> &str {
  task
    .title
    .strip_prefix(SECTION_PREFIX)
    .unwrap_or(&task.title)
}

pub fn sections(tasks: &[Task]) -> Vec<&Task> {
  tasks.iter().filter(|t| is_section(t)).collect()
}

pub fn regular_tasks(tasks: &[Task]) -> Vec<&Task> {
  tasks.iter().filter(|t| !is_section(t)).collect()
}

/// Regular tasks filed directly under `section_id`.
pub fn tasks_in_section<'a>(tasks: &'a [Task], section_id: &str) -> Vec<&'a Task> {
  tasks
    .iter()
    .filter(|t| !is_section(t) && t.parent_task_id.as_deref() == Some(section_id))
    .collect()
}

pub fn top_level_sections(tasks: &[Task]) -> Vec<&Task> {
  tasks
    .iter()
    .filter(|t| is_section(t) && t.parent_task_id.is_none())
    .collect()
}

pub fn subsections<'a>(tasks: &'a [Task], parent_section_id: &str) -> Vec<&'a Task> {
  tasks
    .iter()
    .filter(|t| is_section(t) && t.parent_task_id.as_deref() == Some(parent_section_id))
    .collect()
}

/// Regular tasks not filed under anything.
pub fn orphaned_tasks(tasks: &[Task]) -> Vec<&Task> {
  tasks
    .iter()
    .filter(|t| !is_section(t) && t.parent_task_id.is_none())
    .collect()
}

/// A task with its children, for tree views.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskNode<'a> {
  pub task: &'a Task,
  pub children: Vec<TaskNode<'a>>,
}

/// Arrange tasks into a forest by `parent_task_id`.
///
/// Siblings are ordered by `position` (unpositioned last), then title. A task
/// whose parent is not in `tasks`, or that sits on a parent cycle, becomes a
/// root so nothing is dropped.
pub fn build_tree(tasks: &[Task]) -> Vec<TaskNode<'_>> {
  let ids: HashSet<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
  let mut children: HashMap<&str, Vec<&Task>> = HashMap::new();
  let mut roots: Vec<&Task> = Vec::new();

  for task in tasks {
    match task.parent_task_id.as_deref() {
      Some(parent) if parent != task.id && ids.contains(parent) => {
        children.entry(parent).or_default().push(task);
      }
      _ => roots.push(task),
    }
  }

  let mut placed: HashSet<&str> = HashSet::new();
  let mut forest = attach(roots, &children, &mut placed);

  // Anything unplaced is only reachable through a parent cycle
  let leftovers: Vec<&Task> = tasks
    .iter()
    .filter(|t| !placed.contains(t.id.as_str()))
    .collect();
  if !leftovers.is_empty() {
    let mut cycle_roots = Vec::new();
    for task in leftovers {
      if placed.contains(task.id.as_str()) {
        continue;
      }
      cycle_roots.extend(attach(vec![task], &children, &mut placed));
    }
    forest.extend(cycle_roots);
    sort_nodes(&mut forest);
  }

  forest
}

fn attach<'a>(
  mut level: Vec<&'a Task>,
  children: &HashMap<&str, Vec<&'a Task>>,
  placed: &mut HashSet<&'a str>,
) -> Vec<TaskNode<'a>> {
  level.retain(|t| !placed.contains(t.id.as_str()));
  for task in &level {
    placed.insert(task.id.as_str());
  }

  let mut nodes: Vec<TaskNode<'a>> = level
    .into_iter()
    .map(|task| {
      let kids = children.get(task.id.as_str()).cloned().unwrap_or_default();
      TaskNode {
        task,
        children: attach(kids, children, placed),
      }
    })
    .collect();
  sort_nodes(&mut nodes);
  nodes
}

fn sort_nodes(nodes: &mut [TaskNode<'_>]) {
  nodes.sort_by(|a, b| {
    let pa = a.task.position.unwrap_or(i64::MAX);
    let pb = b.task.position.unwrap_or(i64::MAX);
    pa.cmp(&pb).then_with(|| a.task.title.cmp(&b.task.title))
  });
}

/// Depth-first display order: `(depth, task)`.
pub fn flatten<'a>(forest: &[TaskNode<'a>]) -> Vec<(usize, &'a Task)> {
  fn walk<'a>(nodes: &[TaskNode<'a>], depth: usize, out: &mut Vec<(usize, &'a Task)>) {
    for node in nodes {
      out.push((depth, node.task));
      walk(&node.children, depth + 1, out);
    }
  }

  let mut out = Vec::new();
  walk(forest, 0, &mut out);
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tasks::types::{TaskPriority, TaskStatus};

  fn task(id: &str, title: &str, parent: Option<&str>, position: Option<i64>) -> Task {
    Task {
      id: id.to_string(),
      title: title.to_string(),
      description: None,
      status: TaskStatus::Todo,
      priority: TaskPriority::Medium,
      project_id: Some("p1".to_string()),
      parent_task_id: parent.map(String::from),
      position,
      due_date: None,
      start_date: None,
      progress: None,
      created_at: None,
      updated_at: None,
    }
  }

  fn sample() -> Vec<Task> {
    vec![
      task("s1", "📁 Backend", None, Some(1)),
      task("s2", "📁 API", Some("s1"), Some(1)),
      task("t1", "Write schema", Some("s1"), Some(2)),
      task("t2", "Add endpoints", Some("s2"), None),
      task("t3", "Loose end", None, Some(0)),
    ]
  }

  fn ids(tasks: &[&Task]) -> Vec<String> {
    tasks.iter().map(|t| t.id.clone()).collect()
  }

  #[test]
  fn test_is_section_and_display_name() {
    let tasks = sample();
    assert!(is_section(&tasks[0]));
    assert!(!is_section(&tasks[2]));
    assert_eq!(section_display_name(&tasks[0]), "Backend");
    assert_eq!(section_display_name(&tasks[2]), "Write schema");
  }

  #[test]
  fn test_filters() {
    let tasks = sample();
    assert_eq!(ids(&sections(&tasks)), vec!["s1", "s2"]);
    assert_eq!(ids(&regular_tasks(&tasks)), vec!["t1", "t2", "t3"]);
    assert_eq!(ids(&tasks_in_section(&tasks, "s1")), vec!["t1"]);
    assert_eq!(ids(&top_level_sections(&tasks)), vec!["s1"]);
    assert_eq!(ids(&subsections(&tasks, "s1")), vec!["s2"]);
    assert_eq!(ids(&orphaned_tasks(&tasks)), vec!["t3"]);
  }

  #[test]
  fn test_build_tree_orders_by_position() {
    let tasks = sample();
    let tree = build_tree(&tasks);
    let order: Vec<(usize, String)> = flatten(&tree)
      .into_iter()
      .map(|(depth, t)| (depth, t.id.clone()))
      .collect();

    assert_eq!(
      order,
      vec![
        (0, "t3".to_string()),
        (0, "s1".to_string()),
        (1, "s2".to_string()),
        (2, "t2".to_string()),
        (1, "t1".to_string()),
      ]
    );
  }

  #[test]
  fn test_missing_parent_becomes_root() {
    let tasks = vec![task("t1", "Child", Some("gone"), None)];
    let tree = build_tree(&tasks);
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].task.id, "t1");
  }

  #[test]
  fn test_parent_cycle_keeps_every_task() {
    let tasks = vec![
      task("a", "A", Some("b"), None),
      task("b", "B", Some("a"), None),
    ];
    let tree = build_tree(&tasks);
    assert_eq!(flatten(&tree).len(), 2);
  }
}
