mod project_list;
mod task_tree;
mod team;

pub use project_list::ProjectListView;
pub use task_tree::{TaskScope, TaskTreeView};
pub use team::TeamView;
