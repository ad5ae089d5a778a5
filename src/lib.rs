pub mod commands;
pub mod error;
pub mod filters;
pub mod models;

use commands::shell::AppShell;
use std::path::PathBuf;

const HOME_ENV: &str = "FEEDBACK_BOARD_HOME";

/// Workspace from the first argument, then `FEEDBACK_BOARD_HOME`, then the
/// current directory.
fn workspace_path() -> String {
    std::env::args()
        .nth(1)
        .or_else(|| std::env::var(HOME_ENV).ok())
        .unwrap_or_else(|| ".".to_string())
}

pub fn run() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let workspace = workspace_path();
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("Failed to start async runtime: {e}");
            std::process::exit(1);
        }
    };

    // Notification tasks spawn onto this runtime.
    let _guard = runtime.enter();
    let shell = match AppShell::open(&workspace) {
        Ok(shell) => shell,
        Err(e) => {
            log::error!(
                "Cannot open feedback board at {}: {e}",
                PathBuf::from(&workspace).display()
            );
            std::process::exit(1);
        }
    };

    log::info!(
        "Feedback: {} items | Changelog: {} published",
        shell.feedback_view().len(),
        shell.changelog_view().len()
    );
    for (title, items) in shell.roadmap_view().columns() {
        log::info!("Roadmap {title}: {} items", items.len());
    }
    if shell.session().is_admin {
        log::info!("Admin session restored");
    }
}
