//! Test doubles shared by the module tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{json, Value};
use tokio::sync::Notify;

use crate::api::{ApiClient, ApiError, HttpRequest, HttpResponse, Method, Transport};
use crate::config::ClientConfig;
use crate::credentials::MemoryCredentialStore;
use crate::events::{Notice, UiCtx};
use crate::models::{Project, Task};
use crate::timer::Clock;

pub const TEST_BASE_URL: &str = "http://test.local/api/v1/";

pub fn test_config() -> ClientConfig {
    ClientConfig {
        base_url: TEST_BASE_URL.to_string(),
        ..ClientConfig::default()
    }
}

type Scripted = Result<HttpResponse, String>;

#[derive(Default)]
struct Route {
    queue: VecDeque<Scripted>,
    served_last: bool,
}

/// Scripted transport. Responses queue per (method, path); the last one
/// left in a queue keeps being served until a new one is scripted.
/// Unscripted routes answer 404.
#[derive(Default)]
pub struct FakeTransport {
    routes: Mutex<HashMap<(Method, String), Route>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, method: Method, path: &str, status: u16, body: Value) {
        self.respond_raw(method, path, status, &body.to_string());
    }

    pub fn respond_raw(&self, method: Method, path: &str, status: u16, body: &str) {
        self.push(
            method,
            path,
            Ok(HttpResponse {
                status,
                body: body.to_string(),
            }),
        );
    }

    pub fn fail(&self, method: Method, path: &str, message: &str) {
        self.push(method, path, Err(message.to_string()));
    }

    /// Requests to `path` wait until the returned handle is notified.
    pub fn hold(&self, path: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(path.to_string(), notify.clone());
        notify
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        let url = format!("{TEST_BASE_URL}{}", path.trim_start_matches('/'));
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.url == url)
            .count()
    }

    fn push(&self, method: Method, path: &str, response: Scripted) {
        let mut routes = self.routes.lock().unwrap();
        let route = routes.entry((method, normalize(path))).or_default();
        if route.served_last {
            route.queue.clear();
            route.served_last = false;
        }
        route.queue.push_back(response);
    }

    fn next(&self, method: Method, path: &str) -> Scripted {
        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(&(method, path.to_string())) {
            Some(route) if route.queue.len() > 1 => route.queue.pop_front().unwrap(),
            Some(route) if route.queue.len() == 1 => {
                route.served_last = true;
                route.queue[0].clone()
            }
            _ => Ok(HttpResponse {
                status: 404,
                body: json!({ "detail": "not found" }).to_string(),
            }),
        }
    }
}

fn normalize(path: &str) -> String {
    format!("/{}", path.trim_start_matches('/'))
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let path = normalize(
            request
                .url
                .strip_prefix(TEST_BASE_URL)
                .unwrap_or(request.url.as_str()),
        );
        let method = request.method;
        self.requests.lock().unwrap().push(request);

        let gate = self.gates.lock().unwrap().get(&path).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        self.next(method, &path).map_err(ApiError::Transport)
    }
}

#[derive(Default)]
pub struct TestCtx {
    navigations: Mutex<Vec<String>>,
    notices: Mutex<Vec<Notice>>,
}

impl TestCtx {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }
}

impl UiCtx for TestCtx {
    fn navigate_to(&self, route: &str) {
        self.navigations.lock().unwrap().push(route.to_string());
    }

    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()),
        }
    }

    pub fn advance(&self, seconds: i64) {
        let mut now = self.now.lock().unwrap();
        *now += Duration::seconds(seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

pub struct Harness {
    pub api: Arc<ApiClient>,
    pub transport: Arc<FakeTransport>,
    pub ctx: Arc<TestCtx>,
    pub credentials: Arc<MemoryCredentialStore>,
}

pub fn harness(token: Option<&str>) -> Harness {
    let transport = Arc::new(FakeTransport::new());
    let ctx = Arc::new(TestCtx::new());
    let credentials = Arc::new(MemoryCredentialStore::new(token));
    let api = Arc::new(ApiClient::new(
        &test_config(),
        transport.clone(),
        credentials.clone(),
        ctx.clone(),
    ));
    Harness {
        api,
        transport,
        ctx,
        credentials,
    }
}

pub fn task_json(id: i64, title: &str, time: Option<&str>) -> Value {
    json!({ "id": id, "title": title, "due_date": null, "time": time })
}

pub fn task(id: i64, title: &str, time: Option<&str>) -> Task {
    serde_json::from_value(task_json(id, title, time)).unwrap()
}

/// Two projects; project 1 has boards 10 and 11, project 2 has board 20.
/// Task ids are unique across the tree.
pub fn projects_json() -> Value {
    json!([
        {
            "id": 1,
            "name": "Alpha",
            "members": [
                { "user": { "id": 100, "username": "ann" }, "role": { "id": 1, "name": "owner" } },
                { "user": { "id": 101, "username": "bob" }, "role": 2 }
            ],
            "boards": [
                {
                    "id": 10,
                    "name": "Main",
                    "columns": [
                        { "id": 1000, "name": "Todo", "tasks": [
                            task_json(1, "one", Some("00:00:10")),
                            task_json(2, "two", None)
                        ] },
                        { "id": 1001, "name": "Done", "tasks": [
                            task_json(3, "three", Some("01:02:03"))
                        ] }
                    ]
                },
                {
                    "id": 11,
                    "name": "Side",
                    "columns": [
                        { "id": 1100, "tasks": [ task_json(4, "four", None) ] }
                    ]
                }
            ]
        },
        {
            "id": 2,
            "name": "Beta",
            "members": [
                { "user": { "id": 101, "username": "bob" }, "role": 3 }
            ],
            "boards": [
                {
                    "id": 20,
                    "name": "Ops",
                    "columns": [
                        { "id": 2000, "tasks": [ task_json(5, "five", None) ] }
                    ]
                }
            ]
        }
    ])
}

pub fn projects() -> Vec<Project> {
    serde_json::from_value(projects_json()).unwrap()
}
