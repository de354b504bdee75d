//! Workspace data: organizations, projects, tasks and team members.

pub mod sections;
pub mod sync;
pub mod types;

pub use sections::{build_tree, flatten, is_section, section_display_name, TaskNode};
pub use sync::store_project_tasks;
pub use types::{
  Invitation, MemberRole, Organization, Profile, Project, Snapshot, Task, TaskPriority,
  TaskStatus, TeamMember,
};
