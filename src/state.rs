use std::sync::{Arc, Mutex};

use crate::models::{Board, Id, Project, Task};

/// Shared in-memory mirror of the project → board → column → task tree,
/// plus the selected-task alias used by the task editor.
#[derive(Clone, Default)]
pub struct BoardState {
    inner: Arc<Mutex<BoardData>>,
}

impl BoardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn projects(&self) -> Option<Vec<Project>> {
        let guard = self.inner.lock().expect("state poisoned");
        guard.projects.clone()
    }

    pub fn has_projects(&self) -> bool {
        let guard = self.inner.lock().expect("state poisoned");
        guard.projects.is_some()
    }

    pub fn is_loading(&self) -> bool {
        let guard = self.inner.lock().expect("state poisoned");
        guard.loading
    }

    pub fn error(&self) -> Option<String> {
        let guard = self.inner.lock().expect("state poisoned");
        guard.error.clone()
    }

    /// Claims the population slot and returns the generation the result
    /// must be committed against. `None` when data is already present or
    /// another population is in flight.
    pub fn begin_loading(&self) -> Option<u64> {
        let mut guard = self.inner.lock().expect("state poisoned");
        if guard.projects.is_some() || guard.loading {
            return None;
        }
        guard.loading = true;
        guard.error = None;
        Some(guard.generation)
    }

    /// Commits a population result. Results from before the last `clear`
    /// are dropped and `false` is returned.
    pub fn finish_loading(&self, generation: u64, result: Result<Vec<Project>, String>) -> bool {
        let mut guard = self.inner.lock().expect("state poisoned");
        if guard.generation != generation {
            return false;
        }
        guard.loading = false;
        match result {
            Ok(projects) => guard.projects = Some(projects),
            Err(message) => guard.error = Some(message),
        }
        true
    }

    /// Drops the tree and the derived current project/board, and orphans
    /// any population still in flight. The selected task alias belongs to
    /// the editor and is left alone.
    pub fn clear(&self) {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.generation += 1;
        guard.loading = false;
        guard.projects = None;
        guard.current_project = None;
        guard.current_board = None;
        guard.error = None;
    }

    /// Resolves route ids against the live tree. Absent or unmatched ids
    /// resolve to `None`; the board is looked up inside the resolved project.
    pub fn derive_current_selection(
        &self,
        project_id: Option<Id>,
        board_id: Option<Id>,
    ) -> (Option<Id>, Option<Id>) {
        let mut guard = self.inner.lock().expect("state poisoned");
        let project = match (project_id, guard.projects.as_deref()) {
            (Some(id), Some(projects)) => projects.iter().find(|p| p.id == id),
            _ => None,
        };
        let board = match (board_id, project) {
            (Some(id), Some(project)) => project.boards.iter().find(|b| b.id == id),
            _ => None,
        };
        let resolved = (project.map(|p| p.id), board.map(|b| b.id));
        guard.current_project = resolved.0;
        guard.current_board = resolved.1;
        resolved
    }

    pub fn current_project(&self) -> Option<Project> {
        let guard = self.inner.lock().expect("state poisoned");
        let id = guard.current_project?;
        guard
            .projects
            .as_ref()?
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    pub fn current_board(&self) -> Option<Board> {
        let guard = self.inner.lock().expect("state poisoned");
        let project_id = guard.current_project?;
        let board_id = guard.current_board?;
        guard
            .projects
            .as_ref()?
            .iter()
            .find(|p| p.id == project_id)?
            .boards
            .iter()
            .find(|b| b.id == board_id)
            .cloned()
    }

    pub fn selected_task(&self) -> Option<Task> {
        let guard = self.inner.lock().expect("state poisoned");
        guard.selected_task.clone()
    }

    pub fn set_selected_task(&self, task: Option<Task>) {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.selected_task = task;
    }

    pub fn editor_open(&self) -> bool {
        let guard = self.inner.lock().expect("state poisoned");
        guard.editor_open
    }

    pub fn set_editor_open(&self, open: bool) {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.editor_open = open;
    }

    /// Replaces the selected alias when its id matches, then patches the
    /// first task in the tree with the same id. Returns whether the tree
    /// contained the task.
    pub fn apply_task(&self, fresh: &Task) -> bool {
        let mut guard = self.inner.lock().expect("state poisoned");
        if guard.selected_task.as_ref().map(|t| t.id) == Some(fresh.id) {
            guard.selected_task = Some(fresh.clone());
        }
        match guard.projects.as_mut() {
            Some(projects) => patch_task(projects, fresh),
            None => false,
        }
    }
}

#[derive(Debug, Default)]
struct BoardData {
    projects: Option<Vec<Project>>,
    current_project: Option<Id>,
    current_board: Option<Id>,
    selected_task: Option<Task>,
    editor_open: bool,
    loading: bool,
    generation: u64,
    error: Option<String>,
}

/// Finds the first task with `fresh.id` and copies `fresh` onto it in place.
/// Nothing else in the tree is touched.
pub fn patch_task(projects: &mut [Project], fresh: &Task) -> bool {
    for project in projects.iter_mut() {
        for board in project.boards.iter_mut() {
            for column in board.columns.iter_mut() {
                if let Some(task) = column.tasks.iter_mut().find(|t| t.id == fresh.id) {
                    task.assign_from(fresh);
                    return true;
                }
            }
        }
    }
    false
}
