use std::any::Any;

pub const LOG_FILE_BASENAME: &str = "kanban-client";
pub const LOG_FILE_SUFFIX: &str = "log";
pub const LOG_ROTATE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
pub const LOG_ROTATE_KEEP_FILES: usize = 10;

#[cfg_attr(any(not(feature = "app"), test), allow(dead_code))]
const ENV_KANBAN_LOG: &str = "KANBAN_LOG";
#[cfg_attr(any(not(feature = "app"), test), allow(dead_code))]
const ENV_RUST_LOG: &str = "RUST_LOG";

/// Picks the logger spec: `KANBAN_LOG`, then `RUST_LOG`, then the build default.
pub fn log_spec(kanban_log: Option<String>, rust_log: Option<String>) -> String {
    let default_spec = if cfg!(debug_assertions) {
        "warn,kanban_client_lib=debug"
    } else {
        "warn,kanban_client_lib=info"
    };
    kanban_log
        .filter(|value| !value.trim().is_empty())
        .or_else(|| rust_log.filter(|value| !value.trim().is_empty()))
        .unwrap_or_else(|| default_spec.to_string())
}

#[cfg_attr(not(feature = "app"), allow(dead_code))]
fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>")
}

/// Rotating file logger in the data directory, next to `config.json` and
/// `credentials.json`. Warnings and errors also reach stdout, where the
/// binary prints its output.
#[cfg(all(feature = "app", not(test)))]
pub fn init_logging(data_dir: &std::path::Path) -> Result<(), flexi_logger::FlexiLoggerError> {
    use flexi_logger::{
        detailed_format, Cleanup, Criterion, Duplicate, FileSpec, Logger, Naming, WriteMode,
    };

    std::fs::create_dir_all(data_dir)?;
    let spec = log_spec(
        std::env::var(ENV_KANBAN_LOG).ok(),
        std::env::var(ENV_RUST_LOG).ok(),
    );
    let files = FileSpec::default()
        .directory(data_dir)
        .basename(LOG_FILE_BASENAME)
        .suffix(LOG_FILE_SUFFIX);
    let echo = if cfg!(debug_assertions) {
        Duplicate::Info
    } else {
        Duplicate::Warn
    };

    Logger::try_with_str(&spec)?
        .log_to_file(files)
        .write_mode(WriteMode::BufferAndFlush)
        .format_for_files(detailed_format)
        .rotate(
            Criterion::Size(LOG_ROTATE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(LOG_ROTATE_KEEP_FILES),
        )
        .duplicate_to_stdout(echo)
        .start()?;

    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let thread = std::thread::current();
        log::error!(
            "panic thread={} at={} message={}",
            thread.name().unwrap_or("<unnamed>"),
            info.location()
                .map(|loc| loc.to_string())
                .unwrap_or_else(|| "<unknown>".to_string()),
            panic_message(info.payload())
        );
        previous(info);
    }));

    log::info!("logging to {} spec={spec}", data_dir.display());
    Ok(())
}
