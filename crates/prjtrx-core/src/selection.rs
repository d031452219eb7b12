use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use crate::catalog::Catalog;
use crate::changelog::ChangeLogger;
use crate::icon::IconResolver;
use crate::surface::StatusSurface;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Unknown project '{0}'")]
    UnknownProject(String),
    #[error("Unknown work-package '{workpackage}' in project '{project}'")]
    UnknownWorkPackage { project: String, workpackage: String },
}

/// The active context: a project, optionally narrowed to a work-package.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SelectionKey {
    ProjectOnly(String),
    ProjectWorkPackage(String, String),
}

impl SelectionKey {
    pub fn project_id(&self) -> &str {
        match self {
            SelectionKey::ProjectOnly(pid) | SelectionKey::ProjectWorkPackage(pid, _) => pid,
        }
    }

    pub fn workpackage_id(&self) -> Option<&str> {
        match self {
            SelectionKey::ProjectOnly(_) => None,
            SelectionKey::ProjectWorkPackage(_, wid) => Some(wid),
        }
    }
}

impl fmt::Display for SelectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionKey::ProjectOnly(pid) => f.write_str(pid),
            SelectionKey::ProjectWorkPackage(pid, wid) => write!(f, "{pid}/{wid}"),
        }
    }
}

#[derive(Debug)]
struct SelectionState {
    key: SelectionKey,
    closed: bool,
}

/// Owner of the single current selection.
///
/// The state lock is held across the icon update and the log append, so
/// concurrent transitions never interleave their side effects. Once closed,
/// transitions are ignored.
#[derive(Debug)]
pub struct SelectionStateMachine {
    catalog: Arc<Catalog>,
    icons: IconResolver,
    logger: Arc<ChangeLogger>,
    state: Mutex<SelectionState>,
}

impl SelectionStateMachine {
    pub fn new(
        catalog: Arc<Catalog>,
        initial: SelectionKey,
        icons: IconResolver,
        logger: Arc<ChangeLogger>,
    ) -> Result<Self, SelectionError> {
        catalog.validate(&initial)?;
        Ok(Self {
            catalog,
            icons,
            logger,
            state: Mutex::new(SelectionState {
                key: initial,
                closed: false,
            }),
        })
    }

    fn lock_state(&self) -> MutexGuard<'_, SelectionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn current(&self) -> SelectionKey {
        self.lock_state().key.clone()
    }

    pub fn is_selected(&self, key: &SelectionKey) -> bool {
        self.lock_state().key == *key
    }

    pub fn is_closed(&self) -> bool {
        self.lock_state().closed
    }

    /// Stops accepting transitions and runs `on_close` under the state lock,
    /// so nothing is logged after it. Returns `false` if already closed.
    pub fn close<F>(&self, on_close: F) -> bool
    where
        F: FnOnce(),
    {
        let mut state = self.lock_state();
        if state.closed {
            return false;
        }
        state.closed = true;
        on_close();
        true
    }

    /// Makes `key` current. Returns `Ok(false)` when it already is, or when
    /// the machine has been closed.
    pub fn transition(
        &self,
        key: SelectionKey,
        surface: &dyn StatusSurface,
    ) -> Result<bool, SelectionError> {
        let label = self.catalog.label(&key)?;
        let mut state = self.lock_state();
        if state.closed {
            tracing::debug!(key = %key, "ignoring selection after close");
            return Ok(false);
        }
        if state.key == key {
            tracing::debug!(key = %key, "no change");
            return Ok(false);
        }
        state.key = key;
        self.apply(&state.key, &label, surface);
        Ok(true)
    }

    /// Re-applies the side effects of the current selection without the
    /// equality check. Returns the logged label.
    pub fn announce_current(&self, surface: &dyn StatusSurface) -> String {
        let state = self.lock_state();
        // the key passed validation when it was stored
        let label = self
            .catalog
            .label(&state.key)
            .unwrap_or_else(|_| state.key.project_id().to_string());
        self.apply(&state.key, &label, surface);
        label
    }

    fn apply(&self, key: &SelectionKey, label: &str, surface: &dyn StatusSurface) {
        let icon = self.icons.resolve(&self.catalog, key);
        surface.set_icon(&icon);
        surface.set_tooltip(label);
        if let Err(err) = self.logger.log_change(label) {
            tracing::warn!(error = %err, "change log append failed");
        }
    }
}
