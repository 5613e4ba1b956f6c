use std::sync::Arc;

use crate::api::{ApiClient, Transport};
use crate::breadcrumbs::{Breadcrumbs, Crumb};
use crate::config::ClientConfig;
use crate::credentials::CredentialStore;
use crate::events::UiCtx;
use crate::projects::{ProjectStore, RouteParams};
use crate::session::SessionStore;
use crate::state::BoardState;
use crate::timer::{Clock, TaskTimer};

/// Everything one signed-in application instance needs, wired together.
/// Dropping the context stops the timer tick.
pub struct AppContext {
    pub config: ClientConfig,
    pub api: Arc<ApiClient>,
    pub board: BoardState,
    pub projects: Arc<ProjectStore>,
    pub session: Arc<SessionStore>,
    pub timer: TaskTimer,
    pub breadcrumbs: Breadcrumbs,
}

impl AppContext {
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialStore>,
        ui: Arc<dyn UiCtx>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let api = Arc::new(ApiClient::new(&config, transport, credentials, ui));
        let board = BoardState::new();
        let projects = Arc::new(ProjectStore::new(api.clone(), board.clone()));
        let session = Arc::new(SessionStore::new(api.clone(), board.clone()));
        session.add_listener(projects.clone());
        let timer = TaskTimer::new(projects.clone(), clock, config.tick_interval());
        let breadcrumbs = Breadcrumbs::new(api.clone());

        Self {
            config,
            api,
            board,
            projects,
            session,
            timer,
            breadcrumbs,
        }
    }

    /// Applies a route change: current project/board and the breadcrumb trail.
    pub async fn navigate(&self, route: RouteParams) -> Vec<Crumb> {
        self.projects.set_route(route).await;
        self.breadcrumbs.update(route).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Method;
    use crate::credentials::MemoryCredentialStore;
    use crate::testing::{projects_json, task, test_config, FakeTransport, ManualClock, TestCtx};
    use serde_json::json;

    fn context(token: Option<&str>) -> (AppContext, Arc<FakeTransport>) {
        let transport = Arc::new(FakeTransport::new());
        let ctx = AppContext::new(
            test_config(),
            transport.clone(),
            Arc::new(MemoryCredentialStore::new(token)),
            Arc::new(TestCtx::new()),
            Arc::new(ManualClock::new()),
        );
        (ctx, transport)
    }

    #[tokio::test]
    async fn sign_in_populates_and_navigation_resolves() {
        let (app, transport) = context(Some("tok"));
        transport.respond(Method::Get, "/auth/me", 200, json!({ "id": 100 }));
        transport.respond(Method::Get, "/project/", 200, projects_json());
        transport.respond(Method::Get, "/project/1", 200, json!({ "name": "Alpha" }));
        transport.respond(Method::Get, "/boards/10", 200, json!({ "name": "Main" }));

        app.session.fetch_user().await.unwrap();
        assert_eq!(app.projects.projects().map(|p| p.len()), Some(2));

        let crumbs = app
            .navigate(RouteParams {
                project_id: Some(1),
                board_id: Some(10),
            })
            .await;
        assert_eq!(crumbs.len(), 4);
        assert_eq!(app.projects.current_board().map(|b| b.name), Some("Main".to_string()));
        assert_eq!(app.session.current_project_role(), Some(1));
        assert_eq!(transport.count(Method::Get, "/project/"), 1);
    }

    #[tokio::test]
    async fn timer_stop_patches_the_shared_tree() {
        let (app, transport) = context(Some("tok"));
        transport.respond(Method::Get, "/auth/me", 200, json!({ "id": 100 }));
        transport.respond(Method::Get, "/project/", 200, projects_json());
        transport.respond(
            Method::Post,
            "/task/4/track-time/",
            200,
            json!({ "status": "timer_stopped", "total_time": "02:00:00" }),
        );
        transport.respond(
            Method::Get,
            "/task/4/",
            200,
            json!({ "id": 4, "title": "four", "time": "02:00:00" }),
        );

        app.session.fetch_user().await.unwrap();
        app.timer.select_task(task(4, "four", None));
        let state = app.timer.toggle().await;
        assert_eq!(state.total, 7200);

        let tree = app.board.projects().unwrap();
        assert_eq!(tree[0].boards[1].columns[0].tasks[0].time.as_deref(), Some("02:00:00"));
    }
}
