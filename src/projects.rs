use std::sync::{Arc, Mutex};

use crate::api::{ApiClient, ApiError};
use crate::events::{CacheEvent, CacheListener};
use crate::models::{Board, Id, Project};
use crate::state::BoardState;

/// Identifiers taken from the current route (`/projects/{id}/boards/{board_id}`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteParams {
    pub project_id: Option<Id>,
    pub board_id: Option<Id>,
}

/// Keeps the project tree in sync with the server.
pub struct ProjectStore {
    api: Arc<ApiClient>,
    state: BoardState,
    route: Mutex<RouteParams>,
    listeners: Mutex<Vec<CacheListener>>,
}

impl ProjectStore {
    pub fn new(api: Arc<ApiClient>, state: BoardState) -> Self {
        Self {
            api,
            state,
            route: Mutex::new(RouteParams::default()),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    pub fn subscribe(&self, listener: CacheListener) {
        self.listeners
            .lock()
            .expect("listeners poisoned")
            .push(listener);
    }

    fn emit(&self, event: CacheEvent) {
        let listeners = self.listeners.lock().expect("listeners poisoned").clone();
        for listener in listeners {
            listener(&event);
        }
    }

    pub fn projects(&self) -> Option<Vec<Project>> {
        self.state.projects()
    }

    pub fn current_project(&self) -> Option<Project> {
        self.state.current_project()
    }

    pub fn current_board(&self) -> Option<Board> {
        self.state.current_board()
    }

    /// Loads the full tree once. While a load is in flight, or once data
    /// is present, further calls return immediately without a request.
    pub async fn populate(&self) {
        let Some(generation) = self.state.begin_loading() else {
            log::debug!("project population skipped: in flight or already loaded");
            return;
        };

        match self.api.list_projects().await {
            Ok(projects) => {
                let count = projects.len();
                if !self.state.finish_loading(generation, Ok(projects)) {
                    log::debug!("discarding project list from a cleared session");
                    return;
                }
                log::info!("project cache populated projects={count}");
                self.rederive();
                self.emit(CacheEvent::Populated { projects: count });
            }
            Err(err) => {
                if !self.state.finish_loading(generation, Err(err.to_string())) {
                    log::debug!("discarding project load failure from a cleared session: {err}");
                    return;
                }
                log::error!("failed to load projects: {err}");
                self.emit(CacheEvent::PopulateFailed(err.to_string()));
            }
        }
    }

    pub fn clear(&self) {
        self.state.clear();
        log::debug!("project cache cleared");
        self.emit(CacheEvent::Cleared);
    }

    pub fn derive_current_selection(
        &self,
        project_id: Option<Id>,
        board_id: Option<Id>,
    ) -> (Option<Id>, Option<Id>) {
        let (project, board) = self.state.derive_current_selection(project_id, board_id);
        self.emit(CacheEvent::SelectionChanged { project, board });
        (project, board)
    }

    fn rederive(&self) {
        let route = *self.route.lock().expect("route poisoned");
        self.derive_current_selection(route.project_id, route.board_id);
    }

    /// Records the new route, loads the tree if it is still empty, then
    /// re-resolves the current project and board.
    pub async fn set_route(&self, route: RouteParams) {
        *self.route.lock().expect("route poisoned") = route;
        if !self.state.has_projects() {
            self.populate().await;
        }
        self.rederive();
    }

    /// Fetches one task and merges it into the selected alias and the tree.
    /// `Ok(false)` means the task was not found in the tree, which is not
    /// treated as an error.
    pub async fn refresh_one(&self, task_id: Id) -> Result<bool, ApiError> {
        let fresh = match self.api.get_task(task_id).await? {
            Some(task) => task,
            None => {
                log::warn!("task refresh returned no data task_id={task_id}");
                return Ok(false);
            }
        };

        let matched = self.state.apply_task(&fresh);
        if matched {
            self.emit(CacheEvent::TaskPatched(fresh.id));
        } else {
            log::debug!("refreshed task not present in cache task_id={task_id}");
        }
        Ok(matched)
    }
}
