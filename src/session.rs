use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::api::{ApiClient, ApiError};
use crate::credentials::CredentialError;
use crate::models::{Id, RoleRef, User};
use crate::projects::ProjectStore;
use crate::state::BoardState;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("credential store: {0}")]
    Credential(#[from] CredentialError),
}

/// Notified, in registration order, after the signed-in identity changes.
#[async_trait]
pub trait SessionListener: Send + Sync {
    async fn identity_changed(&self, previous: Option<&User>, current: Option<&User>);
}

#[async_trait]
impl SessionListener for ProjectStore {
    async fn identity_changed(&self, _previous: Option<&User>, current: Option<&User>) {
        self.clear();
        if current.is_some() {
            self.populate().await;
        }
    }
}

/// The signed-in user, their friends, and the role they hold in the
/// current project.
pub struct SessionStore {
    api: Arc<ApiClient>,
    board: BoardState,
    identity: Mutex<Option<User>>,
    friends: Mutex<Option<Vec<User>>>,
    listeners: Mutex<Vec<Arc<dyn SessionListener>>>,
}

impl SessionStore {
    pub fn new(api: Arc<ApiClient>, board: BoardState) -> Self {
        Self {
            api,
            board,
            identity: Mutex::new(None),
            friends: Mutex::new(None),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn add_listener(&self, listener: Arc<dyn SessionListener>) {
        self.listeners
            .lock()
            .expect("listeners poisoned")
            .push(listener);
    }

    pub fn is_authenticated(&self) -> bool {
        self.api.credentials().token().is_some()
    }

    pub fn identity(&self) -> Option<User> {
        self.identity.lock().expect("session poisoned").clone()
    }

    pub fn friends(&self) -> Vec<User> {
        self.friends
            .lock()
            .expect("session poisoned")
            .clone()
            .unwrap_or_default()
    }

    /// Replaces the identity and notifies listeners when the signed-in user
    /// actually changed. An identity is only accepted while a credential
    /// is stored.
    pub async fn set_identity(&self, next: Option<User>) {
        if next.is_some() && !self.is_authenticated() {
            log::warn!("ignoring identity without a stored credential");
            return;
        }

        let previous = {
            let mut identity = self.identity.lock().expect("session poisoned");
            let same_user = identity.as_ref().map(|u| u.id) == next.as_ref().map(|u| u.id);
            let previous = std::mem::replace(&mut *identity, next.clone());
            if same_user {
                return;
            }
            previous
        };

        *self.friends.lock().expect("session poisoned") = None;
        log::info!(
            "session identity changed from={:?} to={:?}",
            previous.as_ref().map(|u| u.id),
            next.as_ref().map(|u| u.id)
        );

        let listeners = self.listeners.lock().expect("listeners poisoned").clone();
        for listener in listeners {
            listener
                .identity_changed(previous.as_ref(), next.as_ref())
                .await;
        }
    }

    /// Loads `/auth/me` once per session. Without a credential, or with an
    /// identity already present, nothing is requested.
    pub async fn fetch_user(&self) -> Result<(), ApiError> {
        if !self.is_authenticated() || self.identity().is_some() {
            return Ok(());
        }
        match self.api.me().await {
            Ok(Some(user)) => {
                self.set_identity(Some(user)).await;
                Ok(())
            }
            Ok(None) => {
                log::error!("failed to load user: user not found");
                Err(ApiError::EmptyResult("/auth/me".to_string()))
            }
            Err(err) => {
                log::error!("failed to load user: {err}");
                Err(err)
            }
        }
    }

    /// Loads the friends list at most once per signed-in identity.
    pub async fn fetch_friends(&self) -> Result<Vec<User>, ApiError> {
        if self.identity().is_none() {
            return Ok(Vec::new());
        }
        if let Some(friends) = self.friends.lock().expect("session poisoned").clone() {
            return Ok(friends);
        }
        match self.api.friends().await {
            Ok(Some(friends)) => {
                *self.friends.lock().expect("session poisoned") = Some(friends.clone());
                Ok(friends)
            }
            Ok(None) => Ok(Vec::new()),
            Err(err) => {
                log::error!("failed to load friends: {err}");
                Err(err)
            }
        }
    }

    /// Exchanges email/password for an access token, stores it, and signs
    /// the returned user in.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, SessionError> {
        let response = self.api.login(email, password).await?;
        self.api.credentials().set_token(&response.access)?;

        let user = match response.data {
            Some(user) => user,
            None => self
                .api
                .me()
                .await?
                .ok_or_else(|| ApiError::EmptyResult("/auth/me".to_string()))?,
        };
        self.set_identity(Some(user.clone())).await;
        Ok(user)
    }

    /// Drops the stored credential and the identity; listeners clear the
    /// cache.
    pub async fn logout(&self) -> Result<(), SessionError> {
        let cleared = self.api.credentials().clear();
        self.set_identity(None).await;
        cleared?;
        Ok(())
    }

    /// Role id the signed-in user holds in the current project, recomputed
    /// on every call.
    pub fn current_project_role(&self) -> Option<Id> {
        let user_id = self.identity()?.id;
        let project = self.board.current_project()?;
        project
            .members
            .iter()
            .find(|member| member.user.id == user_id)?
            .role
            .as_ref()
            .map(RoleRef::id)
    }
}
