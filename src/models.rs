use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type Id = i64;

/// Server fields the client does not interpret are kept verbatim.
pub type ExtraFields = Map<String, Value>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct User {
    pub id: Id,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct Role {
    pub id: Id,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Membership roles arrive either as a bare id or as a nested role object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RoleRef {
    Id(Id),
    Full(Role),
}

impl RoleRef {
    pub fn id(&self) -> Id {
        match self {
            RoleRef::Id(id) => *id,
            RoleRef::Full(role) => role.id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct Member {
    pub user: User,
    #[serde(default)]
    pub role: Option<RoleRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct Project {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub boards: Vec<Board>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct Board {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct Column {
    pub id: Id,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct Task {
    pub id: Id,
    #[serde(default, alias = "name")]
    pub title: String,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    /// Accumulated tracked time as reported by the server (`H:M:S`).
    #[serde(default)]
    pub time: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Task {
    /// Copies every field of `fresh` onto `self`, keeping extra keys that
    /// `fresh` does not mention.
    pub fn assign_from(&mut self, fresh: &Task) {
        self.id = fresh.id;
        self.title = fresh.title.clone();
        self.due_date = fresh.due_date;
        self.time = fresh.time.clone();
        for (key, value) in &fresh.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimerStatus {
    TimerStarted,
    TimerStopped,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TrackTimeResponse {
    pub status: TimerStatus,
    #[serde(default)]
    pub total_time: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoginResponse {
    pub access: String,
    #[serde(default)]
    pub data: Option<User>,
}

/// The slice of a project or board that navigation labels need.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Named {
    #[serde(default)]
    pub name: Option<String>,
}
