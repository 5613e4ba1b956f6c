pub mod api;
pub mod breadcrumbs;
pub mod config;
pub mod context;
pub mod credentials;
pub mod events;
pub mod hms;
pub mod logging;
pub mod models;
pub mod projects;
pub mod session;
pub mod state;
pub mod ticker;
pub mod timer;

#[cfg(test)]
pub(crate) mod testing;

pub use context::AppContext;

#[cfg(all(feature = "app", not(test)))]
use std::sync::Arc;

#[cfg(all(feature = "app", not(test)))]
use crate::api::ReqwestTransport;
#[cfg(all(feature = "app", not(test)))]
use crate::config::{data_directory, ClientConfig};
#[cfg(all(feature = "app", not(test)))]
use crate::credentials::FileCredentialStore;
#[cfg(all(feature = "app", not(test)))]
use crate::events::LogUiCtx;
#[cfg(all(feature = "app", not(test)))]
use crate::logging::init_logging;
#[cfg(all(feature = "app", not(test)))]
use crate::timer::SystemClock;

/// Signs in (stored token, or `KANBAN_EMAIL`/`KANBAN_PASSWORD`), loads the
/// project tree and prints it.
#[cfg(all(feature = "app", not(test)))]
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = data_directory();
    init_logging(&data_dir)?;
    let config = ClientConfig::load(&data_dir)?.with_env_overrides();
    log::info!("starting base_url={}", config.base_url);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_client(config, data_dir))
}

#[cfg(all(feature = "app", not(test)))]
async fn run_client(
    config: ClientConfig,
    data_dir: std::path::PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let transport = Arc::new(ReqwestTransport::new(config.request_timeout())?);
    let credentials = Arc::new(FileCredentialStore::new(data_dir));
    let app = AppContext::new(
        config,
        transport,
        credentials,
        Arc::new(LogUiCtx),
        Arc::new(SystemClock),
    );

    if !app.session.is_authenticated() {
        let email = std::env::var("KANBAN_EMAIL").ok();
        let password = std::env::var("KANBAN_PASSWORD").ok();
        match (email, password) {
            (Some(email), Some(password)) => {
                app.session.login(&email, &password).await?;
            }
            _ => {
                log::warn!("no stored credential; set KANBAN_EMAIL and KANBAN_PASSWORD");
                return Ok(());
            }
        }
    }

    app.session.fetch_user().await?;
    if let Some(error) = app.board.error() {
        return Err(error.into());
    }

    for project in app.projects.projects().unwrap_or_default() {
        println!("{} [{}]", project.name, project.id);
        for board in &project.boards {
            let tasks: usize = board.columns.iter().map(|c| c.tasks.len()).sum();
            println!("  {} [{}] tasks={tasks}", board.name, board.id);
        }
    }
    Ok(())
}
