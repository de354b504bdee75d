//! Read-only access to a workspace export.

use color_eyre::{eyre::eyre, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::tasks::{Invitation, Organization, Profile, Project, Snapshot, Task, TeamMember};

/// Client over a JSON workspace snapshot.
///
/// Every call re-reads the file so a refresh picks up a newer export.
#[derive(Debug, Clone)]
pub struct SnapshotClient {
  path: Arc<PathBuf>,
}

impl SnapshotClient {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self {
      path: Arc::new(path.into()),
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  async fn load(&self) -> Result<Snapshot> {
    let contents = tokio::fs::read_to_string(self.path.as_path())
      .await
      .map_err(|e| eyre!("Failed to read snapshot {}: {}", self.path.display(), e))?;

    let snapshot: Snapshot = serde_json::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse snapshot {}: {}", self.path.display(), e))?;

    debug!(
      path = %self.path.display(),
      projects = snapshot.projects.len(),
      tasks = snapshot.tasks.len(),
      "snapshot loaded"
    );
    Ok(snapshot)
  }

  /// The user the export belongs to, if it records one.
  pub async fn profile(&self) -> Result<Option<Profile>> {
    Ok(self.load().await?.profile)
  }

  pub async fn organizations(&self) -> Result<Vec<Organization>> {
    Ok(self.load().await?.organizations)
  }

  /// All projects, ordered by name.
  pub async fn projects(&self) -> Result<Vec<Project>> {
    let mut projects = self.load().await?.projects;
    projects.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    Ok(projects)
  }

  /// Tasks of one project, or of every project when `project_id` is `None`.
  pub async fn tasks(&self, project_id: Option<&str>) -> Result<Vec<Task>> {
    let tasks = self.load().await?.tasks;
    Ok(match project_id {
      Some(id) => tasks
        .into_iter()
        .filter(|t| t.project_id.as_deref() == Some(id))
        .collect(),
      None => tasks,
    })
  }

  pub async fn members(&self, organization_id: &str) -> Result<Vec<TeamMember>> {
    Ok(
      self
        .load()
        .await?
        .members
        .into_iter()
        .filter(|m| m.organization_id == organization_id)
        .collect(),
    )
  }

  pub async fn invitations(&self, organization_id: &str) -> Result<Vec<Invitation>> {
    Ok(
      self
        .load()
        .await?
        .invitations
        .into_iter()
        .filter(|i| i.organization_id == organization_id)
        .collect(),
    )
  }
}
