use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState};
use std::rc::Rc;
use tracing::debug;

use crate::cache::{CachedQuery, DataCache};
use crate::client::SnapshotClient;
use crate::keys::CacheKey;
use crate::tasks::{Invitation, Organization, Profile, TeamMember};
use crate::ui::renderfns::{query_title, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};

/// Organizations on the left; members and pending invitations of the
/// highlighted one on the right
pub struct TeamView {
  cache: Rc<DataCache>,
  client: SnapshotClient,
  profile: CachedQuery<Option<Profile>>,
  organizations: CachedQuery<Vec<Organization>>,
  members: Option<CachedQuery<Vec<TeamMember>>>,
  invitations: Option<CachedQuery<Vec<Invitation>>>,
  selected_org: Option<String>,
  list_state: ListState,
}

impl TeamView {
  pub fn new(cache: Rc<DataCache>, client: SnapshotClient) -> Self {
    let profile_client = client.clone();
    let mut profile = CachedQuery::new(Rc::clone(&cache), CacheKey::Profile, move || {
      let client = profile_client.clone();
      async move { client.profile().await.map_err(|e| e.to_string()) }
    });

    let orgs_client = client.clone();
    let mut organizations = CachedQuery::new(Rc::clone(&cache), CacheKey::Organizations, move || {
      let client = orgs_client.clone();
      async move { client.organizations().await.map_err(|e| e.to_string()) }
    });

    profile.load();
    organizations.load();

    let mut view = Self {
      cache,
      client,
      profile,
      organizations,
      members: None,
      invitations: None,
      selected_org: None,
      list_state: ListState::default(),
    };
    view.sync_selection();
    view
  }

  fn organizations(&self) -> &[Organization] {
    self
      .organizations
      .data()
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  fn members(&self) -> &[TeamMember] {
    self
      .members
      .as_ref()
      .and_then(|q| q.data())
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  fn invitations(&self) -> &[Invitation] {
    self
      .invitations
      .as_ref()
      .and_then(|q| q.data())
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Organization picked last, in this view or any other
  fn saved_org(&self) -> Option<Rc<String>> {
    self
      .cache
      .get_as::<String>(&CacheKey::SelectedOrganization.to_string())
      .ok()
      .flatten()
  }

  /// Keep the highlighted row and the loaded member lists in step.
  ///
  /// Without a highlighted row, the saved organization is restored, falling
  /// back to the first one.
  fn sync_selection(&mut self) {
    let orgs = self.organizations();
    if orgs.is_empty() {
      return;
    }

    let idx = match self.list_state.selected() {
      Some(idx) => idx.min(orgs.len() - 1),
      None => self
        .saved_org()
        .and_then(|id| orgs.iter().position(|o| o.id == *id))
        .unwrap_or(0),
    };
    let org_id = orgs[idx].id.clone();

    self.list_state.select(Some(idx));
    if self.selected_org.as_deref() != Some(org_id.as_str()) {
      self.open_org(org_id);
    }
  }

  fn open_org(&mut self, org_id: String) {
    debug!(organization = %org_id, "loading team");
    self.cache.set(CacheKey::SelectedOrganization, org_id.clone());

    let members_client = self.client.clone();
    let members_org = org_id.clone();
    let mut members = CachedQuery::new(
      Rc::clone(&self.cache),
      CacheKey::members(&org_id),
      move || {
        let client = members_client.clone();
        let org = members_org.clone();
        async move { client.members(&org).await.map_err(|e| e.to_string()) }
      },
    );

    let invitations_client = self.client.clone();
    let invitations_org = org_id.clone();
    let mut invitations = CachedQuery::new(
      Rc::clone(&self.cache),
      CacheKey::invitations(&org_id),
      move || {
        let client = invitations_client.clone();
        let org = invitations_org.clone();
        async move { client.invitations(&org).await.map_err(|e| e.to_string()) }
      },
    );

    members.load();
    invitations.load();
    self.members = Some(members);
    self.invitations = Some(invitations);
    self.selected_org = Some(org_id);
  }

  fn render_organizations(&mut self, frame: &mut Frame, area: Rect) {
    let title = query_title("Organizations", &self.organizations, self.organizations().len());
    let signed_in = match self.profile.data() {
      Some(Some(profile)) => format!(" {} ", truncate(profile.display_name(), 30)),
      _ => String::new(),
    };

    let items: Vec<ListItem> = self
      .organizations()
      .iter()
      .map(|org| ListItem::new(truncate(&org.name, 40)))
      .collect();

    let list = List::new(items)
      .block(
        Block::default()
          .title(title)
          .title_bottom(Line::from(signed_in).right_aligned())
          .borders(Borders::ALL)
          .border_style(Style::default().fg(Color::Blue)),
      )
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }

  fn render_members(&self, frame: &mut Frame, area: Rect) {
    let title = match &self.members {
      Some(query) => query_title("Members", query, self.members().len()),
      None => " Members ".to_string(),
    };

    let items: Vec<ListItem> = self
      .members()
      .iter()
      .map(|member| {
        let name = member
          .full_name
          .as_deref()
          .or(member.email.as_deref())
          .unwrap_or(&member.user_id);
        ListItem::new(Line::from(vec![
          Span::styled(
            format!("{:<8}", member.role.label()),
            Style::default().fg(Color::Yellow),
          ),
          Span::raw(" "),
          Span::raw(truncate(name, 40)),
        ]))
      })
      .collect();

    let list = List::new(items).block(
      Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue)),
    );
    frame.render_widget(list, area);
  }

  fn render_invitations(&self, frame: &mut Frame, area: Rect) {
    let title = match &self.invitations {
      Some(query) => query_title("Invitations", query, self.invitations().len()),
      None => " Invitations ".to_string(),
    };

    let items: Vec<ListItem> = self
      .invitations()
      .iter()
      .map(|invitation| {
        ListItem::new(Line::from(vec![
          Span::styled(
            format!("{:<8}", invitation.role.label()),
            Style::default().fg(Color::Yellow),
          ),
          Span::raw(" "),
          Span::raw(truncate(&invitation.email, 40)),
          Span::styled(
            format!(" {}", invitation.status.as_deref().unwrap_or("pending")),
            Style::default().fg(Color::DarkGray),
          ),
        ]))
      })
      .collect();

    let list = List::new(items).block(
      Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue)),
    );
    frame.render_widget(list, area);
  }
}

impl View for TeamView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.list_state.select_next();
        self.sync_selection();
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.list_state.select_previous();
        self.sync_selection();
      }
      KeyCode::Char('r') => self.refresh(),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let columns = Layout::default()
      .direction(Direction::Horizontal)
      .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
      .split(area);
    let rows = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
      .split(columns[1]);

    self.render_organizations(frame, columns[0]);
    self.render_members(frame, rows[0]);
    self.render_invitations(frame, rows[1]);
  }

  fn breadcrumb_label(&self) -> String {
    "Team".to_string()
  }

  fn tick(&mut self) {
    self.profile.poll();
    self.organizations.poll();
    self.sync_selection();
    if let Some(members) = self.members.as_mut() {
      members.poll();
    }
    if let Some(invitations) = self.invitations.as_mut() {
      invitations.poll();
    }
  }

  fn refresh(&mut self) {
    self.profile.refresh();
    self.organizations.refresh();
    if let Some(members) = self.members.as_mut() {
      members.refresh();
    }
    if let Some(invitations) = self.invitations.as_mut() {
      invitations.refresh();
    }
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("j/k", "organization").with_priority(20),
      ShortcutInfo::new("r", "refresh").with_priority(30),
      ShortcutInfo::new("q", "back").with_priority(40),
    ]
  }
}
