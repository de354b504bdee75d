use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use std::rc::Rc;
use tracing::info;

use crate::cache::{CachedQuery, DataCache};
use crate::client::SnapshotClient;
use crate::keys::{CacheKey, ALL_PROJECTS};
use crate::tasks::{
  build_tree, flatten, is_section, section_display_name, store_project_tasks, Project, Task,
  TaskStatus,
};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{priority_color, query_title, status_color, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};

/// Which task list a [`TaskTreeView`] shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskScope {
  All,
  Project { id: String, name: String },
}

impl TaskScope {
  fn project_id(&self) -> &str {
    match self {
      TaskScope::All => ALL_PROJECTS,
      TaskScope::Project { id, .. } => id.as_str(),
    }
  }

  fn label(&self) -> &str {
    match self {
      TaskScope::All => "All tasks",
      TaskScope::Project { name, .. } => name.as_str(),
    }
  }
}

/// The status after `status` in the display cycle
pub fn next_status(status: TaskStatus) -> TaskStatus {
  let idx = TaskStatus::ALL
    .iter()
    .position(|&s| s == status)
    .unwrap_or(0);
  TaskStatus::ALL[(idx + 1) % TaskStatus::ALL.len()]
}

/// Copy of `tasks` with the status of `task_id` advanced.
///
/// Returns `None` when the task is missing or is a section.
fn with_next_status(tasks: &[Task], task_id: &str) -> Option<Vec<Task>> {
  let target = tasks.iter().find(|t| t.id == task_id)?;
  if is_section(target) {
    return None;
  }

  Some(
    tasks
      .iter()
      .map(|t| {
        let mut t = t.clone();
        if t.id == task_id {
          t.status = next_status(t.status);
        }
        t
      })
      .collect(),
  )
}

/// Hierarchical task list for a project, or for every project
pub struct TaskTreeView {
  cache: Rc<DataCache>,
  scope: TaskScope,
  query: CachedQuery<Vec<Task>>,
  list_state: ListState,
}

impl TaskTreeView {
  pub fn new(cache: Rc<DataCache>, client: SnapshotClient, scope: TaskScope) -> Self {
    let key = CacheKey::tasks(scope.project_id());
    let project = match &scope {
      TaskScope::All => None,
      TaskScope::Project { id, .. } => Some(id.clone()),
    };

    let mut query = CachedQuery::new(Rc::clone(&cache), key, move || {
      let client = client.clone();
      let project = project.clone();
      async move {
        client
          .tasks(project.as_deref())
          .await
          .map_err(|e| e.to_string())
      }
    });
    query.load();

    let mut view = Self {
      cache,
      scope,
      query,
      list_state: ListState::default(),
    };
    view.sync_project_name();
    view
  }

  /// Take the project's display name from the cached project list, which
  /// may arrive after the view was opened by id.
  fn sync_project_name(&mut self) {
    let TaskScope::Project { id, name } = &mut self.scope else {
      return;
    };
    let Ok(Some(projects)) = self
      .cache
      .get_as::<Vec<Project>>(&CacheKey::Projects.to_string())
    else {
      return;
    };
    if let Some(project) = projects.iter().find(|p| p.id == *id) {
      if *name != project.name {
        *name = project.name.clone();
      }
    }
  }

  fn tasks(&self) -> &[Task] {
    self.query.data().map(|v| v.as_slice()).unwrap_or(&[])
  }

  fn rows(&self) -> Vec<(usize, &Task)> {
    flatten(&build_tree(self.tasks()))
  }

  fn title(&self) -> String {
    let count = self.tasks().iter().filter(|t| !is_section(t)).count();
    query_title(self.scope.label(), &self.query, count)
  }

  fn cycle_selected_status(&mut self) {
    let Some(task_id) = self
      .list_state
      .selected()
      .and_then(|idx| self.rows().get(idx).map(|(_, t)| t.id.clone()))
    else {
      return;
    };

    if let Some(updated) = with_next_status(self.tasks(), &task_id) {
      info!(task = %task_id, project = self.scope.project_id(), "changed task status");
      store_project_tasks(&self.cache, self.scope.project_id(), updated);
      self.query.poll();
    }
  }

  fn row_line(depth: usize, task: &Task) -> Line<'static> {
    let indent = "  ".repeat(depth);

    if is_section(task) {
      return Line::from(vec![
        Span::raw(indent),
        Span::styled(
          format!("📁 {}", section_display_name(task)),
          Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
        ),
      ]);
    }

    let mut spans = vec![
      Span::raw(indent),
      Span::styled(
        format!("{:<12}", task.status.label()),
        Style::default().fg(status_color(task.status)),
      ),
      Span::raw(" "),
      Span::styled(
        format!("{:<8}", task.priority.label()),
        Style::default().fg(priority_color(task.priority)),
      ),
      Span::raw(" "),
      Span::raw(truncate(&task.title, 60)),
    ];

    if let Some(progress) = task.progress {
      spans.push(Span::styled(
        format!(" {:.0}%", progress),
        Style::default().fg(Color::DarkGray),
      ));
    }
    if let Some(due) = task.due_date.as_deref() {
      spans.push(Span::styled(
        format!(" due {}", due),
        Style::default().fg(Color::DarkGray),
      ));
    }

    Line::from(spans)
  }
}

impl View for TaskTreeView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.list_state.select_next();
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.list_state.select_previous();
      }
      KeyCode::Char('s') => self.cycle_selected_status(),
      KeyCode::Char('r') => self.refresh(),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let title = self.title();
    let items: Vec<ListItem> = self
      .rows()
      .into_iter()
      .map(|(depth, task)| ListItem::new(Self::row_line(depth, task)))
      .collect();
    ensure_valid_selection(&mut self.list_state, items.len());

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if items.is_empty() && !self.query.is_loading() {
      let content = if self.query.error().is_some() {
        "Failed to load tasks. Press 'r' to retry."
      } else {
        "No tasks found."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }

  fn breadcrumb_label(&self) -> String {
    self.scope.label().to_string()
  }

  fn project(&self) -> Option<&str> {
    match &self.scope {
      TaskScope::All => None,
      TaskScope::Project { name, .. } => Some(name.as_str()),
    }
  }

  fn tick(&mut self) {
    self.query.poll();
    self.sync_project_name();
  }

  fn refresh(&mut self) {
    self.query.refresh();
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("s", "status").with_priority(20),
      ShortcutInfo::new("r", "refresh").with_priority(30),
      ShortcutInfo::new("q", "back").with_priority(40),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn task(id: &str, title: &str, project: &str, status: &str) -> Task {
    serde_json::from_value(serde_json::json!({
      "id": id,
      "title": title,
      "project_id": project,
      "status": status,
    }))
    .unwrap()
  }

  fn press(view: &mut TaskTreeView, code: KeyCode) {
    view.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
  }

  #[test]
  fn test_next_status_wraps() {
    assert_eq!(next_status(TaskStatus::Todo), TaskStatus::InProgress);
    assert_eq!(next_status(TaskStatus::Done), TaskStatus::Blocked);
    assert_eq!(next_status(TaskStatus::Blocked), TaskStatus::Todo);
  }

  #[test]
  fn test_sections_keep_their_status() {
    let tasks = vec![task("s1", "📁 Backend", "p1", "todo")];
    assert!(with_next_status(&tasks, "s1").is_none());
    assert!(with_next_status(&tasks, "missing").is_none());
  }

  #[tokio::test]
  async fn test_status_change_reaches_all_tasks_list() {
    let cache = Rc::new(DataCache::new());
    cache.set(
      CacheKey::all_tasks(),
      vec![
        task("t1", "Schema", "p1", "todo"),
        task("t9", "Landing", "p2", "done"),
      ],
    );
    cache.set(CacheKey::tasks("p1"), vec![task("t1", "Schema", "p1", "todo")]);

    let client = SnapshotClient::new("/nonexistent/workspace.json");
    let mut view = TaskTreeView::new(
      Rc::clone(&cache),
      client,
      TaskScope::Project {
        id: "p1".to_string(),
        name: "Website".to_string(),
      },
    );
    assert!(!view.query.is_loading());

    view.list_state.select(Some(0));
    press(&mut view, KeyCode::Char('s'));

    assert_eq!(view.tasks()[0].status, TaskStatus::InProgress);
    let all = cache.get_as::<Vec<Task>>("tasks:data:all").unwrap().unwrap();
    assert_eq!(all[0].status, TaskStatus::InProgress);
    assert_eq!(all[1].status, TaskStatus::Done);
  }

  #[tokio::test]
  async fn test_other_views_see_the_change() {
    let cache = Rc::new(DataCache::new());
    cache.set(CacheKey::tasks("p1"), vec![task("t1", "Schema", "p1", "todo")]);
    let client = SnapshotClient::new("/nonexistent/workspace.json");
    let scope = TaskScope::Project {
      id: "p1".to_string(),
      name: "Website".to_string(),
    };

    let mut first = TaskTreeView::new(Rc::clone(&cache), client.clone(), scope.clone());
    let mut second = TaskTreeView::new(Rc::clone(&cache), client, scope);

    first.list_state.select(Some(0));
    press(&mut first, KeyCode::Char('s'));
    second.tick();

    assert_eq!(second.tasks()[0].status, TaskStatus::InProgress);
  }

  #[tokio::test]
  async fn test_project_name_resolved_from_cache() {
    let cache = Rc::new(DataCache::new());
    cache.set(CacheKey::tasks("p1"), Vec::<Task>::new());
    let mut view = TaskTreeView::new(
      Rc::clone(&cache),
      SnapshotClient::new("/nonexistent/workspace.json"),
      TaskScope::Project {
        id: "p1".to_string(),
        name: "p1".to_string(),
      },
    );
    assert_eq!(view.breadcrumb_label(), "p1");

    let projects: Vec<Project> = serde_json::from_value(serde_json::json!([
      {"id": "p1", "name": "Website", "organization_id": "org-1"},
    ]))
    .unwrap();
    cache.set(CacheKey::Projects, projects);
    view.tick();

    assert_eq!(view.breadcrumb_label(), "Website");
    assert_eq!(view.project(), Some("Website"));
  }

  #[tokio::test]
  async fn test_title_shows_fetch_error() {
    let cache = Rc::new(DataCache::new());
    let mut view = TaskTreeView::new(
      Rc::clone(&cache),
      SnapshotClient::new("/nonexistent/workspace.json"),
      TaskScope::All,
    );
    for _ in 0..200 {
      tokio::time::sleep(std::time::Duration::from_millis(5)).await;
      view.tick();
      if !view.query.is_loading() {
        break;
      }
    }

    assert!(view.query.data().is_none());
    assert!(view.title().contains("error: Failed to read snapshot"));
  }
}
