use std::sync::Arc;

use crate::models::Id;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A user-facing, non-fatal notification (toast).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: Option<String>,
}

impl Notice {
    pub fn warning(title: &str, description: &str) -> Self {
        Self {
            level: NoticeLevel::Warning,
            title: title.to_string(),
            description: Some(description.to_string()),
        }
    }

    pub fn error(title: &str) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.to_string(),
            description: None,
        }
    }
}

/// Hooks into the surrounding shell: navigation and notifications.
pub trait UiCtx: Send + Sync {
    fn navigate_to(&self, route: &str);
    fn notify(&self, notice: Notice);
}

/// Shell used by the binary: everything goes to the log.
#[derive(Debug, Default)]
pub struct LogUiCtx;

impl UiCtx for LogUiCtx {
    fn navigate_to(&self, route: &str) {
        log::warn!("navigation requested route={route}");
    }

    fn notify(&self, notice: Notice) {
        let description = notice.description.as_deref().unwrap_or("");
        match notice.level {
            NoticeLevel::Info => log::info!("{} {description}", notice.title),
            NoticeLevel::Warning => log::warn!("{} {description}", notice.title),
            NoticeLevel::Error => log::error!("{} {description}", notice.title),
        }
    }
}

/// Changes to the project cache, delivered synchronously to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    Cleared,
    Populated { projects: usize },
    PopulateFailed(String),
    TaskPatched(Id),
    SelectionChanged {
        project: Option<Id>,
        board: Option<Id>,
    },
}

pub type CacheListener = Arc<dyn Fn(&CacheEvent) + Send + Sync>;
