use std::sync::{Arc, Mutex};

use crate::api::ApiClient;
use crate::projects::RouteParams;

const HOME_TITLE: &str = "Home";
const PROJECTS_TITLE: &str = "Projects";
const PROJECT_FALLBACK: &str = "Project";
const BOARD_FALLBACK: &str = "Board";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crumb {
    pub title: String,
    pub href: Option<String>,
}

impl Crumb {
    fn new(title: &str, href: Option<String>) -> Self {
        Self {
            title: title.to_string(),
            href,
        }
    }
}

/// Navigation trail for a route. Project and board names come from the
/// server; when a lookup fails the generic label is used instead.
pub async fn build(api: &ApiClient, route: RouteParams) -> Vec<Crumb> {
    let mut crumbs = vec![
        Crumb::new(HOME_TITLE, Some("/".to_string())),
        Crumb::new(PROJECTS_TITLE, Some("/projects".to_string())),
    ];

    if let Some(project_id) = route.project_id {
        let name = match api.get_project(project_id).await {
            Ok(named) => named.and_then(|n| n.name),
            Err(err) => {
                log::warn!("breadcrumb lookup failed project_id={project_id}: {err}");
                None
            }
        };
        crumbs.push(Crumb::new(
            name.as_deref().unwrap_or(PROJECT_FALLBACK),
            Some(format!("/projects/{project_id}/boards")),
        ));
    }

    if let Some(board_id) = route.board_id {
        let name = match api.get_board(board_id).await {
            Ok(named) => named.and_then(|n| n.name),
            Err(err) => {
                log::warn!("breadcrumb lookup failed board_id={board_id}: {err}");
                None
            }
        };
        crumbs.push(Crumb::new(name.as_deref().unwrap_or(BOARD_FALLBACK), None));
    }

    crumbs
}

/// Last computed trail, rebuilt whenever the route changes.
pub struct Breadcrumbs {
    api: Arc<ApiClient>,
    crumbs: Mutex<Vec<Crumb>>,
}

impl Breadcrumbs {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            crumbs: Mutex::new(Vec::new()),
        }
    }

    pub async fn update(&self, route: RouteParams) -> Vec<Crumb> {
        let crumbs = build(&self.api, route).await;
        *self.crumbs.lock().expect("breadcrumbs poisoned") = crumbs.clone();
        crumbs
    }

    pub fn current(&self) -> Vec<Crumb> {
        self.crumbs.lock().expect("breadcrumbs poisoned").clone()
    }
}
