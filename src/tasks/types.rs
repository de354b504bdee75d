use serde::{Deserialize, Deserializer, Serialize};

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Default + Deserialize<'de>,
{
  Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
  pub id: String,
  pub name: String,
  pub organization_id: String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub color: Option<String>,
  #[serde(default)]
  pub status: Option<String>,
  #[serde(default)]
  pub start_date: Option<String>,
  #[serde(default)]
  pub end_date: Option<String>,
  #[serde(default)]
  pub created_at: Option<String>,
  #[serde(default)]
  pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
  #[default]
  Todo,
  InProgress,
  Review,
  Done,
  Blocked,
}

impl TaskStatus {
  pub const ALL: [TaskStatus; 5] = [
    TaskStatus::Todo,
    TaskStatus::InProgress,
    TaskStatus::Review,
    TaskStatus::Done,
    TaskStatus::Blocked,
  ];

  pub fn label(self) -> &'static str {
    match self {
      TaskStatus::Todo => "To Do",
      TaskStatus::InProgress => "In Progress",
      TaskStatus::Review => "Review",
      TaskStatus::Done => "Done",
      TaskStatus::Blocked => "Blocked",
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
  Low,
  #[default]
  Medium,
  High,
  Critical,
}

impl TaskPriority {
  pub fn label(self) -> &'static str {
    match self {
      TaskPriority::Low => "Low",
      TaskPriority::Medium => "Medium",
      TaskPriority::High => "High",
      TaskPriority::Critical => "Critical",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
  pub id: String,
  pub title: String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub status: TaskStatus,
  #[serde(default, deserialize_with = "null_as_default")]
  pub priority: TaskPriority,
  #[serde(default)]
  pub project_id: Option<String>,
  #[serde(default)]
  pub parent_task_id: Option<String>,
  #[serde(default)]
  pub position: Option<i64>,
  #[serde(default)]
  pub due_date: Option<String>,
  #[serde(default)]
  pub start_date: Option<String>,
  /// Percent complete, 0-100
  #[serde(default)]
  pub progress: Option<f64>,
  #[serde(default)]
  pub created_at: Option<String>,
  #[serde(default)]
  pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
  Owner,
  Admin,
  #[default]
  Member,
  Viewer,
}

impl MemberRole {
  pub fn label(self) -> &'static str {
    match self {
      MemberRole::Owner => "Owner",
      MemberRole::Admin => "Admin",
      MemberRole::Member => "Member",
      MemberRole::Viewer => "Viewer",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
  pub user_id: String,
  pub organization_id: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub role: MemberRole,
  #[serde(default)]
  pub full_name: Option<String>,
  #[serde(default)]
  pub email: Option<String>,
}

/// The user the export was taken for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  pub id: String,
  pub email: String,
  #[serde(default)]
  pub full_name: Option<String>,
}

impl Profile {
  pub fn display_name(&self) -> &str {
    self.full_name.as_deref().unwrap_or(&self.email)
  }
}

/// A pending invitation to join an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
  pub id: String,
  pub organization_id: String,
  pub email: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub role: MemberRole,
  #[serde(default)]
  pub status: Option<String>,
  #[serde(default)]
  pub created_at: Option<String>,
}

/// Everything the client reads from a workspace export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
  #[serde(default)]
  pub organizations: Vec<Organization>,
  #[serde(default)]
  pub projects: Vec<Project>,
  #[serde(default)]
  pub tasks: Vec<Task>,
  #[serde(default)]
  pub members: Vec<TeamMember>,
  #[serde(default)]
  pub invitations: Vec<Invitation>,
  #[serde(default)]
  pub profile: Option<Profile>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_task_defaults_for_null_and_missing_fields() {
    let task: Task = serde_json::from_str(
      r#"{"id": "t1", "title": "Write docs", "status": null, "project_id": "p1"}"#,
    )
    .unwrap();

    assert_eq!(task.status, TaskStatus::Todo);
    assert_eq!(task.priority, TaskPriority::Medium);
    assert_eq!(task.project_id.as_deref(), Some("p1"));
    assert!(task.parent_task_id.is_none());
  }

  #[test]
  fn test_status_wire_names() {
    let status: TaskStatus = serde_json::from_str("\"in_progress\"").unwrap();
    assert_eq!(status, TaskStatus::InProgress);
    assert_eq!(status.label(), "In Progress");
    assert_eq!(
      serde_json::to_string(&TaskPriority::Critical).unwrap(),
      "\"critical\""
    );
  }

  #[test]
  fn test_invitation_and_profile() {
    let invitation: Invitation = serde_json::from_str(
      r#"{"id": "i1", "organization_id": "org-1", "email": "new@acme.test", "role": null}"#,
    )
    .unwrap();
    assert_eq!(invitation.role, MemberRole::Member);
    assert_eq!(invitation.role.label(), "Member");

    let profile: Profile =
      serde_json::from_str(r#"{"id": "u1", "email": "ada@acme.test"}"#).unwrap();
    assert_eq!(profile.display_name(), "ada@acme.test");
  }

  #[test]
  fn test_empty_snapshot() {
    let snapshot: Snapshot = serde_json::from_str("{}").unwrap();
    assert_eq!(snapshot, Snapshot::default());
  }
}
