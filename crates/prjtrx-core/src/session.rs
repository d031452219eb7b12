use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use thiserror::Error;

use crate::catalog::{build_catalog, default_selection, CatalogError};
use crate::changelog::ChangeLogger;
use crate::config::{ConfigData, DEFAULT_LOGFILE, DEFAULT_TOOLTIP};
use crate::icon::{IconArtifact, IconResolver};
use crate::menu::{build_menu, Menu, MenuAction};
use crate::selection::{SelectionError, SelectionKey, SelectionStateMachine};
use crate::surface::{MenuHandler, StatusSurface, SurfaceError};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error("Failed to start event loop thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("Event loop thread panicked")]
    EventLoopPanicked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitReason {
    MenuExit,
    Sigterm,
    Sigint,
}

impl QuitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuitReason::MenuExit => "Menu Exit",
            QuitReason::Sigterm => "SIGTERM",
            QuitReason::Sigint => "SIGINT",
        }
    }

    /// Change-log info for the shutdown record, e.g. `QUIT (SIGTERM)`.
    pub fn log_info(&self) -> String {
        format!("QUIT ({})", self.as_str())
    }
}

impl fmt::Display for QuitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub logfile: PathBuf,
    pub icon_dir: PathBuf,
    pub tooltip: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            logfile: PathBuf::from(DEFAULT_LOGFILE),
            icon_dir: PathBuf::from("."),
            tooltip: DEFAULT_TOOLTIP.to_string(),
        }
    }
}

/// Initial state handed to the host when its surface is created.
pub struct SurfaceSeed<'a> {
    pub icon: &'a IconArtifact,
    pub menu: &'a Menu,
    pub tooltip: &'a str,
}

/// Wires catalog, selection, menu and change log to one host surface.
pub struct SessionController<S> {
    selection: SelectionStateMachine,
    logger: Arc<ChangeLogger>,
    menu: Menu,
    surface: S,
}

impl<S> SessionController<S>
where
    S: StatusSurface + 'static,
{
    /// Builds every component, creates the surface and logs the startup
    /// re-selection of the default context.
    pub fn start<F>(
        config: &ConfigData,
        options: &SessionOptions,
        make_surface: F,
    ) -> Result<Arc<Self>, SessionError>
    where
        F: FnOnce(SurfaceSeed<'_>) -> S,
    {
        let catalog = Arc::new(build_catalog(config, &options.icon_dir)?);
        let projects = catalog.len();
        let initial = default_selection(&catalog);
        let icons = IconResolver::for_selection(&catalog, &initial);
        let menu = build_menu(&catalog, &options.icon_dir);
        let surface = make_surface(SurfaceSeed {
            icon: icons.fallback(),
            menu: &menu,
            tooltip: &options.tooltip,
        });
        let logger = Arc::new(ChangeLogger::new(&options.logfile));
        let selection =
            SelectionStateMachine::new(catalog, initial, icons, Arc::clone(&logger))?;

        let controller = Arc::new(Self {
            selection,
            logger,
            menu,
            surface,
        });
        let label = controller.selection.announce_current(&controller.surface);
        tracing::info!(
            projects,
            selection = %label,
            logfile = %controller.logger.path().display(),
            "session started"
        );
        Ok(controller)
    }

    /// Runs the host event loop on a background thread and blocks until it
    /// returns.
    pub fn run(self: &Arc<Self>) -> Result<(), SessionError> {
        let controller = Arc::clone(self);
        let handle = thread::Builder::new()
            .name("prjtrx-event-loop".to_string())
            .spawn(move || {
                let handler: &dyn MenuHandler = &*controller;
                controller.surface.run(&controller.menu, handler)
            })
            .map_err(SessionError::Spawn)?;
        match handle.join() {
            Ok(result) => Ok(result?),
            Err(_) => Err(SessionError::EventLoopPanicked),
        }
    }

    /// Logs the quit reason and stops the event loop.
    ///
    /// Only the first call has an effect; returns whether this call did. The
    /// quit record is written under the selection lock, so no selection is
    /// logged after it.
    pub fn quit(&self, reason: QuitReason) -> bool {
        let first = self.selection.close(|| {
            tracing::info!(%reason, "quitting");
            if let Err(err) = self.logger.log_change(&reason.log_info()) {
                tracing::warn!(error = %err, "change log append failed");
            }
        });
        if !first {
            tracing::debug!(%reason, "already quitting");
            return false;
        }
        self.surface.stop();
        true
    }

    pub fn is_stopping(&self) -> bool {
        self.selection.is_closed()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn current(&self) -> SelectionKey {
        self.selection.current()
    }
}

impl<S> MenuHandler for SessionController<S>
where
    S: StatusSurface + 'static,
{
    fn dispatch(&self, action: &MenuAction) {
        match action {
            MenuAction::Select(key) => {
                if let Err(err) = self.selection.transition(key.clone(), &self.surface) {
                    tracing::warn!(error = %err, "rejected selection");
                }
            }
            MenuAction::Quit => {
                self.quit(QuitReason::MenuExit);
            }
        }
    }

    fn is_selected(&self, key: &SelectionKey) -> bool {
        self.selection.is_selected(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quit_reasons_render_log_info() {
        assert_eq!(QuitReason::MenuExit.log_info(), "QUIT (Menu Exit)");
        assert_eq!(QuitReason::Sigterm.log_info(), "QUIT (SIGTERM)");
        assert_eq!(QuitReason::Sigint.to_string(), "SIGINT");
    }

    #[test]
    fn default_options_match_documented_defaults() {
        let options = SessionOptions::default();
        assert_eq!(options.logfile, PathBuf::from("prjtrx_events.log"));
        assert_eq!(options.icon_dir, PathBuf::from("."));
        assert_eq!(options.tooltip, "No Project selected!");
    }
}
