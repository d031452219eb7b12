use std::fmt;
use std::path::{Path, PathBuf};

use crate::catalog::Catalog;
use crate::selection::SelectionKey;

/// Icon handed to the host surface. Decoding is the host's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconArtifact {
    File(PathBuf),
    /// The host's stock application icon.
    Builtin,
}

impl IconArtifact {
    pub fn path(&self) -> Option<&Path> {
        match self {
            IconArtifact::File(path) => Some(path),
            IconArtifact::Builtin => None,
        }
    }
}

impl fmt::Display for IconArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IconArtifact::File(path) => write!(f, "{}", path.display()),
            IconArtifact::Builtin => f.write_str("<builtin>"),
        }
    }
}

/// Work-package icon, then project icon. `None` when neither file exists.
fn explicit_icon<'a>(catalog: &'a Catalog, key: &SelectionKey) -> Option<&'a PathBuf> {
    let project = catalog.project(key.project_id())?;
    let wp_icon = key
        .workpackage_id()
        .and_then(|wp_id| project.workpackage(wp_id))
        .and_then(|wp| wp.icon.as_ref());
    wp_icon.or(project.icon.as_ref())
}

pub fn resolve_icon(catalog: &Catalog, key: &SelectionKey, fallback: &IconArtifact) -> IconArtifact {
    match explicit_icon(catalog, key) {
        Some(path) => IconArtifact::File(path.clone()),
        None => {
            tracing::debug!(key = %key, "icon fallback");
            fallback.clone()
        }
    }
}

/// Resolves icons against a fallback fixed once at startup.
#[derive(Debug, Clone)]
pub struct IconResolver {
    fallback: IconArtifact,
}

impl IconResolver {
    /// Caches the icon of the process-start selection as the fallback.
    pub fn for_selection(catalog: &Catalog, initial: &SelectionKey) -> Self {
        let fallback = explicit_icon(catalog, initial)
            .map(|path| IconArtifact::File(path.clone()))
            .unwrap_or(IconArtifact::Builtin);
        Self { fallback }
    }

    pub fn fallback(&self) -> &IconArtifact {
        &self.fallback
    }

    pub fn resolve(&self, catalog: &Catalog, key: &SelectionKey) -> IconArtifact {
        resolve_icon(catalog, key, &self.fallback)
    }
}
