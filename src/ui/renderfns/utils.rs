use ratatui::prelude::Color;

use crate::cache::CachedQuery;
use crate::tasks::{TaskPriority, TaskStatus};

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Block title for a cached list: item count and where the data came from,
/// plus the last fetch error if there is one
pub fn query_title<T: Clone + Send + 'static>(
  label: &str,
  query: &CachedQuery<T>,
  count: usize,
) -> String {
  if query.is_loading() {
    return format!(" {} (loading...) ", label);
  }
  match (query.result(), query.error()) {
    (Some(result), Some(e)) => format!(
      " {} ({}, {}: {}) ",
      label,
      count,
      result.source.label(),
      truncate(e, 40)
    ),
    (Some(result), None) => format!(" {} ({}, {}) ", label, count, result.source.label()),
    (None, Some(e)) => format!(" {} (error: {}) ", label, truncate(e, 60)),
    (None, None) => format!(" {} ", label),
  }
}

/// Display color for a task status
pub fn status_color(status: TaskStatus) -> Color {
  match status {
    TaskStatus::Done => Color::Green,
    TaskStatus::InProgress | TaskStatus::Review => Color::Yellow,
    TaskStatus::Blocked => Color::Red,
    TaskStatus::Todo => Color::White,
  }
}

/// Display color for a task priority
pub fn priority_color(priority: TaskPriority) -> Color {
  match priority {
    TaskPriority::Critical => Color::Red,
    TaskPriority::High => Color::LightRed,
    TaskPriority::Medium => Color::Yellow,
    TaskPriority::Low => Color::Green,
  }
}
