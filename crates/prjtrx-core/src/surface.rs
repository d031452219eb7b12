//! Seam between the core and the host that draws the status icon and menu.

use thiserror::Error;

use crate::icon::IconArtifact;
use crate::menu::{Menu, MenuAction};
use crate::selection::SelectionKey;

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("Host event loop failed: {0}")]
    EventLoop(String),
    #[error("Host IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Receives menu clicks from the host event loop.
pub trait MenuHandler: Send + Sync {
    fn dispatch(&self, action: &MenuAction);

    /// Live radio state for a selection leaf.
    fn is_selected(&self, key: &SelectionKey) -> bool;
}

/// Persistent status icon with an attached menu.
///
/// `run` blocks until `stop` is called, possibly from another thread and
/// possibly before `run` started.
pub trait StatusSurface: Send + Sync {
    fn set_icon(&self, icon: &IconArtifact);
    fn set_tooltip(&self, text: &str);
    fn run(&self, menu: &Menu, handler: &dyn MenuHandler) -> Result<(), SurfaceError>;
    fn stop(&self);
}
