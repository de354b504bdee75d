//! Cache keys shared between views.
//!
//! The cache itself treats keys as opaque strings; these builders keep every
//! view agreeing on the same spelling so one view's write reaches the others.

use std::fmt;

/// Project id used for the cross-project task list.
pub const ALL_PROJECTS: &str = "all";

/// Logical resources cached by the client.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CacheKey {
  /// Projects visible in the task views
  Projects,
  /// Tasks of one project, or of every project (`ALL_PROJECTS`)
  Tasks { project_id: String },
  /// Project picked in the task views
  SelectedProject,
  /// Signed-in user's profile
  Profile,
  /// Organizations listed on the team page
  Organizations,
  /// Members of an organization
  Members { organization_id: String },
  /// Pending invitations of an organization
  Invitations { organization_id: String },
  /// Organization picked anywhere in the app
  SelectedOrganization,
}

impl CacheKey {
  pub fn tasks(project_id: impl Into<String>) -> Self {
    Self::Tasks {
      project_id: project_id.into(),
    }
  }

  pub fn all_tasks() -> Self {
    Self::tasks(ALL_PROJECTS)
  }

  pub fn members(organization_id: impl Into<String>) -> Self {
    Self::Members {
      organization_id: organization_id.into(),
    }
  }

  pub fn invitations(organization_id: impl Into<String>) -> Self {
    Self::Invitations {
      organization_id: organization_id.into(),
    }
  }
}

impl fmt::Display for CacheKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Projects => f.write_str("tasks:projects"),
      Self::Tasks { project_id } => write!(f, "tasks:data:{}", project_id),
      Self::SelectedProject => f.write_str("tasks:selectedProjectId"),
      Self::Profile => f.write_str("team:profile"),
      Self::Organizations => f.write_str("team:organizations"),
      Self::Members { organization_id } => write!(f, "team:members:{}", organization_id),
      Self::Invitations { organization_id } => write!(f, "team:invitations:{}", organization_id),
      Self::SelectedOrganization => f.write_str("global:selectedOrganizationId"),
    }
  }
}

impl From<CacheKey> for String {
  fn from(key: CacheKey) -> Self {
    key.to_string()
  }
}

impl From<&CacheKey> for String {
  fn from(key: &CacheKey) -> Self {
    key.to_string()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_task_view_keys() {
    assert_eq!(CacheKey::Projects.to_string(), "tasks:projects");
    assert_eq!(CacheKey::tasks("p-42").to_string(), "tasks:data:p-42");
    assert_eq!(CacheKey::all_tasks().to_string(), "tasks:data:all");
    assert_eq!(
      CacheKey::SelectedProject.to_string(),
      "tasks:selectedProjectId"
    );
  }

  #[test]
  fn test_team_keys() {
    assert_eq!(CacheKey::Profile.to_string(), "team:profile");
    assert_eq!(CacheKey::Organizations.to_string(), "team:organizations");
    assert_eq!(CacheKey::members("org-1").to_string(), "team:members:org-1");
    assert_eq!(
      CacheKey::invitations("org-1").to_string(),
      "team:invitations:org-1"
    );
    assert_eq!(
      CacheKey::SelectedOrganization.to_string(),
      "global:selectedOrganizationId"
    );
  }

  #[test]
  fn test_distinct_resources_do_not_collide() {
    assert_ne!(
      CacheKey::tasks("org-1").to_string(),
      CacheKey::members("org-1").to_string()
    );
    assert_ne!(
      CacheKey::tasks("a").to_string(),
      CacheKey::tasks("b").to_string()
    );
  }
}
