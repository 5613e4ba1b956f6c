use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::credentials::CredentialStore;
use crate::events::UiCtx;
use crate::models::{Id, LoginRequest, LoginResponse, Named, Project, Task, TrackTimeResponse, User};

pub const HEADER_ACCEPT: &str = "Accept";
pub const HEADER_AUTHORIZATION: &str = "Authorization";
pub const ACCEPT_JSON: &str = "application/json";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("{0} returned no data")]
    EmptyResult(String),
    #[error("http {status}: {body}")]
    Status { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Moves one request over the wire. No retries, no implicit timeout.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Fetch wrapper bound to the API base URL. Adds `Accept` and bearer
/// headers, and sends the shell to the login route on a 401 without
/// touching the stored credential.
pub struct ApiClient {
    base_url: String,
    login_route: String,
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialStore>,
    ui: Arc<dyn UiCtx>,
}

impl ApiClient {
    pub fn new(
        config: &ClientConfig,
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialStore>,
        ui: Arc<dyn UiCtx>,
    ) -> Self {
        Self {
            base_url: config.base_url.clone(),
            login_route: config.login_route.clone(),
            transport,
            credentials,
            ui,
        }
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    pub fn ui(&self) -> &Arc<dyn UiCtx> {
        &self.ui
    }

    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Sends one request and returns the decoded body, or `None` when the
    /// server answered with an empty or `null` body.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Option<Value>, ApiError> {
        let mut headers = vec![(HEADER_ACCEPT.to_string(), ACCEPT_JSON.to_string())];
        if let Some(token) = self.credentials.token() {
            headers.push((HEADER_AUTHORIZATION.to_string(), format!("Bearer {token}")));
        }
        let request = HttpRequest {
            method,
            url: self.url(path),
            headers,
            body,
        };

        log::debug!("api request method={method:?} path={path}");
        let response = self.transport.send(request).await?;

        if response.status == 401 {
            log::error!("unauthorized response path={path}");
            self.ui.navigate_to(&self.login_route);
            return Err(ApiError::Unauthorized);
        }
        if !(200..300).contains(&response.status) {
            return Err(ApiError::Status {
                status: response.status,
                body: response.body,
            });
        }

        let text = response.body.trim();
        if text.is_empty() {
            return Ok(None);
        }
        match serde_json::from_str::<Value>(text)? {
            Value::Null => Ok(None),
            value => Ok(Some(value)),
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ApiError> {
        self.decode(self.request(Method::Get, path, None).await?)
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<Value>,
    ) -> Result<Option<T>, ApiError> {
        self.decode(self.request(Method::Post, path, body).await?)
    }

    fn decode<T: DeserializeOwned>(&self, value: Option<Value>) -> Result<Option<T>, ApiError> {
        match value {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        Ok(self.get("/project/").await?.unwrap_or_default())
    }

    pub async fn get_project(&self, id: Id) -> Result<Option<Named>, ApiError> {
        self.get(&format!("/project/{id}")).await
    }

    pub async fn get_board(&self, id: Id) -> Result<Option<Named>, ApiError> {
        self.get(&format!("/boards/{id}")).await
    }

    pub async fn me(&self) -> Result<Option<User>, ApiError> {
        self.get("/auth/me").await
    }

    pub async fn friends(&self) -> Result<Option<Vec<User>>, ApiError> {
        self.get("/auth/friends/").await
    }

    pub async fn get_task(&self, id: Id) -> Result<Option<Task>, ApiError> {
        self.get(&format!("/task/{id}/")).await
    }

    pub async fn toggle_timer(&self, task_id: Id) -> Result<TrackTimeResponse, ApiError> {
        let path = format!("/task/{task_id}/track-time/");
        let response = self.post(&path, None).await?;
        response.ok_or(ApiError::EmptyResult(path))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = serde_json::to_value(LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        })?;
        self.post("/auth/login/", Some(body))
            .await?
            .ok_or_else(|| ApiError::EmptyResult("/auth/login/".to_string()))
    }
}

#[cfg(feature = "app")]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

#[cfg(feature = "app")]
impl ReqwestTransport {
    pub fn new(timeout: Option<std::time::Duration>) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| ApiError::Transport(format!("failed to build http client: {err}")))?;
        Ok(Self { client })
    }
}

#[cfg(feature = "app")]
#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let resp = builder
            .send()
            .await
            .map_err(|err| ApiError::Transport(format!("request to {} failed: {err}", request.url)))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|err| ApiError::Transport(format!("failed to read response: {err}")))?;
        Ok(HttpResponse { status, body })
    }
}
