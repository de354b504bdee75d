use crate::cache::DataCache;
use crate::client::SnapshotClient;
use crate::commands::{self, Command};
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::keys::CacheKey;
use crate::ui;
use crate::ui::view::{View, ViewAction};
use crate::ui::views::{ProjectListView, TaskScope, TaskTreeView, TeamView};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::{stdout, Stdout};
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, info};

/// Input mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
  Normal,
  Command,
}

/// Main application state
pub struct App {
  /// Navigation stack - root is always at index 0
  view_stack: Vec<Box<dyn View>>,

  /// Current input mode
  mode: Mode,

  /// Command input buffer (after pressing :)
  command_input: String,

  /// Selected autocomplete suggestion index
  selected_suggestion: usize,

  /// Message shown in the footer until the next command
  status: Option<String>,

  /// Header title
  title: String,

  config: Config,

  /// Shared by every view for the whole session
  cache: Rc<DataCache>,

  client: SnapshotClient,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  /// Build the app and start loading the initial views. Must run inside a tokio runtime.
  pub fn new(config: Config) -> Result<Self> {
    let client = SnapshotClient::new(config.snapshot_path()?);
    let cache = Rc::new(DataCache::new().with_default_max_age(config.cache.default_max_age()));

    info!(
      snapshot = %client.path().display(),
      max_age_ms = config.cache.default_max_age_ms,
      "starting taskdeck"
    );

    let title = config.title.clone().unwrap_or_else(|| {
      client
        .path()
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "workspace".to_string())
    });

    let mut app = Self {
      view_stack: Vec::new(),
      mode: Mode::Normal,
      command_input: String::new(),
      selected_suggestion: 0,
      status: None,
      title,
      config,
      cache,
      client,
      should_quit: false,
    };
    app.open_project_list();
    app.open_default_project();

    Ok(app)
  }

  pub async fn run(&mut self) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let result = self.event_loop(&mut terminal).await;
    restore_terminal()?;
    result
  }

  async fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    let mut events = EventHandler::new(Duration::from_millis(250));

    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(event) => self.handle_event(event),
        None => break,
      }
    }

    Ok(())
  }

  /// Replace the stack with the project list
  fn open_project_list(&mut self) {
    self.view_stack.clear();
    self.view_stack.push(Box::new(ProjectListView::new(
      Rc::clone(&self.cache),
      self.client.clone(),
    )));
  }

  /// Open the configured default project on top of the stack. Its name is
  /// filled in once the project list is cached.
  fn open_default_project(&mut self) {
    let Some(project_id) = self.config.default_project.clone() else {
      return;
    };
    self.cache.set(CacheKey::SelectedProject, project_id.clone());
    self.view_stack.push(Box::new(TaskTreeView::new(
      Rc::clone(&self.cache),
      self.client.clone(),
      TaskScope::Project {
        name: project_id.clone(),
        id: project_id,
      },
    )));
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => {
        for view in &mut self.view_stack {
          view.tick();
        }
      }
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    match self.mode {
      Mode::Normal => self.handle_normal_mode_key(key),
      Mode::Command => self.handle_command_mode_key(key),
    }
  }

  fn handle_normal_mode_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char(':') {
      self.mode = Mode::Command;
      self.command_input.clear();
      self.selected_suggestion = 0;
      return;
    }

    let action = match self.view_stack.last_mut() {
      Some(view) => view.handle_key(key),
      None => ViewAction::Pop,
    };
    self.apply(action);
  }

  fn apply(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => {
        debug!(view = %view.breadcrumb_label(), "opening view");
        self.view_stack.push(view);
      }
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.should_quit = true;
        }
      }
    }
  }

  fn handle_command_mode_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.mode = Mode::Normal;
        self.command_input.clear();
        self.selected_suggestion = 0;
      }
      KeyCode::Enter => {
        self.execute_command();
        self.mode = Mode::Normal;
        self.selected_suggestion = 0;
      }
      KeyCode::Tab | KeyCode::Down => {
        let suggestions = commands::get_suggestions(&self.command_input);
        if !suggestions.is_empty() {
          self.selected_suggestion = (self.selected_suggestion + 1) % suggestions.len();
        }
      }
      KeyCode::BackTab | KeyCode::Up => {
        let suggestions = commands::get_suggestions(&self.command_input);
        if !suggestions.is_empty() {
          self.selected_suggestion = if self.selected_suggestion == 0 {
            suggestions.len() - 1
          } else {
            self.selected_suggestion - 1
          };
        }
      }
      KeyCode::Backspace => {
        self.command_input.pop();
        self.selected_suggestion = 0;
      }
      KeyCode::Char(c) => {
        self.command_input.push(c);
        self.selected_suggestion = 0;
      }
      _ => {}
    }
  }

  fn execute_command(&mut self) {
    let input = std::mem::take(&mut self.command_input);
    let Some(cmd) = commands::resolve(&input, self.selected_suggestion) else {
      self.status = Some(format!("Unknown command: {}", input.trim()));
      return;
    };

    debug!(command = cmd, "executing command");
    self.status = None;

    match cmd {
      "projects" => self.open_project_list(),
      "tasks" => {
        self.view_stack.clear();
        self.view_stack.push(Box::new(TaskTreeView::new(
          Rc::clone(&self.cache),
          self.client.clone(),
          TaskScope::All,
        )));
      }
      "team" => {
        self.view_stack.clear();
        self.view_stack.push(Box::new(TeamView::new(
          Rc::clone(&self.cache),
          self.client.clone(),
        )));
      }
      "refresh" => {
        let dropped = self.cache.len();
        self.cache.invalidate_all();
        info!(entries = dropped, "cache cleared");
        for view in &mut self.view_stack {
          view.refresh();
        }
        self.status = Some(format!("Cleared {} cached entries", dropped));
      }
      "quit" => self.should_quit = true,
      _ => {}
    }
  }

  // Accessors for UI rendering
  pub fn current_view_mut(&mut self) -> Option<&mut Box<dyn View>> {
    self.view_stack.last_mut()
  }

  pub fn mode(&self) -> &Mode {
    &self.mode
  }

  pub fn command_input(&self) -> &str {
    &self.command_input
  }

  pub fn status(&self) -> Option<&str> {
    self.status.as_deref()
  }

  pub fn title(&self) -> &str {
    &self.title
  }

  pub fn view_breadcrumb(&self) -> Vec<String> {
    self
      .view_stack
      .iter()
      .map(|v| v.breadcrumb_label())
      .collect()
  }

  pub fn autocomplete_suggestions(&self) -> Vec<&'static Command> {
    commands::get_suggestions(&self.command_input)
  }

  pub fn selected_suggestion(&self) -> usize {
    self.selected_suggestion
  }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
  enable_raw_mode()?;
  stdout().execute(EnterAlternateScreen)?;
  Ok(Terminal::new(CrosstermBackend::new(stdout()))?)
}

fn restore_terminal() -> Result<()> {
  disable_raw_mode()?;
  stdout().execute(LeaveAlternateScreen)?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;
  use tempfile::NamedTempFile;

  const SNAPSHOT: &str = r#"{
    "projects": [{"id": "p1", "name": "Website", "organization_id": "org-1"}],
    "tasks": [{"id": "t1", "title": "Landing page", "project_id": "p1"}]
  }"#;

  fn app_with(default_project: Option<&str>) -> (NamedTempFile, App) {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(SNAPSHOT.as_bytes()).unwrap();
    let config = Config {
      snapshot: Some(file.path().to_path_buf()),
      default_project: default_project.map(str::to_string),
      ..Config::default()
    };
    let app = App::new(config).unwrap();
    (file, app)
  }

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn run_command(app: &mut App, input: &str) {
    app.handle_key(key(KeyCode::Char(':')));
    for c in input.chars() {
      app.handle_key(key(KeyCode::Char(c)));
    }
    app.handle_key(key(KeyCode::Enter));
  }

  #[tokio::test]
  async fn test_default_project_opens_its_tasks() {
    let (_file, app) = app_with(Some("p1"));
    assert_eq!(app.view_breadcrumb(), vec!["Projects", "p1"]);
    let selected = app
      .cache
      .get_as::<String>("tasks:selectedProjectId")
      .unwrap()
      .unwrap();
    assert_eq!(*selected, "p1");
  }

  #[tokio::test]
  async fn test_projects_command_shows_only_the_list() {
    let (_file, mut app) = app_with(Some("p1"));
    run_command(&mut app, "projects");
    assert_eq!(app.view_breadcrumb(), vec!["Projects"]);
  }

  #[tokio::test]
  async fn test_back_from_root_quits() {
    let (_file, mut app) = app_with(Some("p1"));
    app.handle_key(key(KeyCode::Char('q')));
    assert!(!app.should_quit);
    app.handle_key(key(KeyCode::Char('q')));
    assert!(app.should_quit);
  }

  #[tokio::test]
  async fn test_tasks_command_replaces_stack() {
    let (_file, mut app) = app_with(None);
    run_command(&mut app, "tasks");
    assert_eq!(app.view_breadcrumb(), vec!["All tasks"]);
    assert_eq!(*app.mode(), Mode::Normal);
  }

  #[tokio::test]
  async fn test_team_command_replaces_stack() {
    let (_file, mut app) = app_with(Some("p1"));
    run_command(&mut app, "orgs");
    assert_eq!(app.view_breadcrumb(), vec!["Team"]);
  }

  #[tokio::test]
  async fn test_refresh_command_clears_cache() {
    let (_file, mut app) = app_with(None);
    app.cache.set(CacheKey::Profile, "someone".to_string());
    run_command(&mut app, "refresh");
    assert!(app.cache.get("team:profile").is_none());
    assert!(app.status().unwrap().starts_with("Cleared"));
  }

  #[tokio::test]
  async fn test_unknown_command_sets_status() {
    let (_file, mut app) = app_with(None);
    run_command(&mut app, "zzz");
    assert_eq!(app.status(), Some("Unknown command: zzz"));
    assert!(!app.should_quit);
  }
}
