use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use std::collections::HashMap;
use std::rc::Rc;

use crate::cache::{CachedQuery, DataCache};
use crate::client::SnapshotClient;
use crate::keys::CacheKey;
use crate::tasks::{is_section, Project, Task, TaskStatus};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{query_title, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::{TaskScope, TaskTreeView};

/// Done/total counts of regular tasks per project
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
  pub done: usize,
  pub total: usize,
}

pub fn progress_by_project(tasks: &[Task]) -> HashMap<&str, Progress> {
  let mut counts: HashMap<&str, Progress> = HashMap::new();
  for task in tasks.iter().filter(|t| !is_section(t)) {
    if let Some(project_id) = task.project_id.as_deref() {
      let entry = counts.entry(project_id).or_default();
      entry.total += 1;
      if task.status == TaskStatus::Done {
        entry.done += 1;
      }
    }
  }
  counts
}

/// Root view listing the workspace's projects
pub struct ProjectListView {
  cache: Rc<DataCache>,
  client: SnapshotClient,
  projects: CachedQuery<Vec<Project>>,
  all_tasks: CachedQuery<Vec<Task>>,
  list_state: ListState,
}

impl ProjectListView {
  pub fn new(cache: Rc<DataCache>, client: SnapshotClient) -> Self {
    let projects_client = client.clone();
    let mut projects = CachedQuery::new(Rc::clone(&cache), CacheKey::Projects, move || {
      let client = projects_client.clone();
      async move { client.projects().await.map_err(|e| e.to_string()) }
    });

    let tasks_client = client.clone();
    let mut all_tasks = CachedQuery::new(Rc::clone(&cache), CacheKey::all_tasks(), move || {
      let client = tasks_client.clone();
      async move { client.tasks(None).await.map_err(|e| e.to_string()) }
    });

    projects.load();
    all_tasks.load();

    Self {
      cache,
      client,
      projects,
      all_tasks,
      list_state: ListState::default(),
    }
  }

  fn projects(&self) -> &[Project] {
    self.projects.data().map(|v| v.as_slice()).unwrap_or(&[])
  }

  fn title(&self) -> String {
    query_title("Projects", &self.projects, self.projects().len())
  }

  /// Put the cursor on the project opened last, once the list has it
  fn restore_selection(&mut self) {
    if self.list_state.selected().is_some() {
      return;
    }
    let Ok(Some(selected)) = self
      .cache
      .get_as::<String>(&CacheKey::SelectedProject.to_string())
    else {
      return;
    };
    if let Some(idx) = self.projects().iter().position(|p| p.id == *selected) {
      self.list_state.select(Some(idx));
    }
  }

  fn open_selected(&self) -> ViewAction {
    let Some(project) = self
      .list_state
      .selected()
      .and_then(|idx| self.projects().get(idx))
    else {
      return ViewAction::None;
    };

    self.cache.set(CacheKey::SelectedProject, project.id.clone());
    ViewAction::Push(Box::new(TaskTreeView::new(
      Rc::clone(&self.cache),
      self.client.clone(),
      TaskScope::Project {
        id: project.id.clone(),
        name: project.name.clone(),
      },
    )))
  }
}

impl View for ProjectListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.list_state.select_next();
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.list_state.select_previous();
      }
      KeyCode::Char('r') => self.refresh(),
      KeyCode::Char('a') => {
        return ViewAction::Push(Box::new(TaskTreeView::new(
          Rc::clone(&self.cache),
          self.client.clone(),
          TaskScope::All,
        )));
      }
      KeyCode::Enter => return self.open_selected(),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.projects().len();
    self.restore_selection();
    ensure_valid_selection(&mut self.list_state, len);

    let block = Block::default()
      .title(self.title())
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if len == 0 && !self.projects.is_loading() {
      let content = if self.projects.error().is_some() {
        "Failed to load projects. Press 'r' to retry."
      } else {
        "No projects found."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let progress = self
      .all_tasks
      .data()
      .map(|tasks| progress_by_project(tasks))
      .unwrap_or_default();

    let items: Vec<ListItem> = self
      .projects()
      .iter()
      .map(|project| {
        let counts = progress.get(project.id.as_str()).copied().unwrap_or_default();
        let line = Line::from(vec![
          Span::styled(
            format!("{:<30}", truncate(&project.name, 30)),
            Style::default().fg(Color::Cyan),
          ),
          Span::raw(" "),
          Span::styled(
            format!("{:>3}/{:<3}", counts.done, counts.total),
            Style::default().fg(Color::Green),
          ),
          Span::raw(" "),
          Span::styled(
            truncate(project.description.as_deref().unwrap_or(""), 60),
            Style::default().fg(Color::DarkGray),
          ),
        ]);
        ListItem::new(line)
      })
      .collect();

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
    "Projects".to_string()
  }

  fn tick(&mut self) {
    self.projects.poll();
    self.all_tasks.poll();
    self.restore_selection();
  }

  fn refresh(&mut self) {
    self.projects.refresh();
    self.all_tasks.refresh();
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("enter", "tasks").with_priority(20),
      ShortcutInfo::new("a", "all tasks").with_priority(25),
      ShortcutInfo::new("r", "refresh").with_priority(30),
      ShortcutInfo::new("q", "quit").with_priority(40),
    ]
  }
}
