use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::ConfigData;
use crate::selection::{SelectionError, SelectionKey};

pub const ICON_PREFIX: &str = "myIcon_";
pub const ICON_EXTENSION: &str = "ico";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Project config contains no projects")]
    Empty,
    #[error("Duplicate project id '{id}' (from '{identifier}')")]
    DuplicateProject { id: String, identifier: String },
    #[error("Duplicate work-package id '{workpackage}' in project '{project}'")]
    DuplicateWorkPackage { project: String, workpackage: String },
}

/// An id and display name decoded from a raw `<id>-...-<name>` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub id: String,
    pub name: String,
}

/// Splits on `-`: first segment is the id, last segment the name.
///
/// A string without a separator is both id and name.
pub fn parse_identifier(raw: &str) -> Identifier {
    let mut parts = raw.split('-');
    let id = parts.next().unwrap_or(raw);
    let name = parts.next_back().unwrap_or(id);
    Identifier {
        id: id.to_string(),
        name: name.to_string(),
    }
}

pub fn icon_path(icon_dir: &Path, name: &str) -> PathBuf {
    icon_dir.join(format!("{ICON_PREFIX}{name}.{ICON_EXTENSION}"))
}

pub fn probe_icon(icon_dir: &Path, name: &str) -> Option<PathBuf> {
    let path = icon_path(icon_dir, name);
    if path.is_file() {
        Some(path)
    } else {
        tracing::debug!(path = %path.display(), "no icon file");
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkPackage {
    pub id: String,
    pub name: String,
    pub icon: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub icon: Option<PathBuf>,
    workpackages: Vec<WorkPackage>,
    index: HashMap<String, usize>,
}

impl Project {
    /// Work-packages in config order.
    pub fn workpackages(&self) -> &[WorkPackage] {
        &self.workpackages
    }

    pub fn workpackage(&self, id: &str) -> Option<&WorkPackage> {
        self.index.get(id).map(|&idx| &self.workpackages[idx])
    }

    pub fn first_workpackage(&self) -> Option<&WorkPackage> {
        self.workpackages.first()
    }

    /// Projects with more than one work-package get a submenu and a
    /// work-package level default.
    pub fn has_submenu(&self) -> bool {
        self.workpackages.len() > 1
    }
}

/// Immutable project catalog: an ordered sequence plus an id index.
#[derive(Debug, Clone)]
pub struct Catalog {
    projects: Vec<Project>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.index.get(id).map(|&idx| &self.projects[idx])
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Checks that `key` names an existing project (and work-package).
    pub fn validate(&self, key: &SelectionKey) -> Result<&Project, SelectionError> {
        let project = self
            .project(key.project_id())
            .ok_or_else(|| SelectionError::UnknownProject(key.project_id().to_string()))?;
        if let Some(wp_id) = key.workpackage_id() {
            if project.workpackage(wp_id).is_none() {
                return Err(SelectionError::UnknownWorkPackage {
                    project: project.id.clone(),
                    workpackage: wp_id.to_string(),
                });
            }
        }
        Ok(project)
    }

    /// Log label for a selection: `<project>` or `<project>:<workpackage>`.
    ///
    /// A project-only key on a project with work-packages names the first
    /// work-package as the implied default.
    pub fn label(&self, key: &SelectionKey) -> Result<String, SelectionError> {
        let project = self.validate(key)?;
        let label = match key {
            SelectionKey::ProjectWorkPackage(pid, wid) => format!("{pid}:{wid}"),
            SelectionKey::ProjectOnly(pid) => match project.first_workpackage() {
                Some(wp) => format!("{pid}:{}", wp.id),
                None => pid.clone(),
            },
        };
        Ok(label)
    }
}

pub fn build_catalog(config: &ConfigData, icon_dir: &Path) -> Result<Catalog, CatalogError> {
    if config.entries.is_empty() {
        return Err(CatalogError::Empty);
    }

    let mut projects = Vec::with_capacity(config.entries.len());
    let mut index = HashMap::with_capacity(config.entries.len());
    for entry in &config.entries {
        let ident = parse_identifier(&entry.project);
        if index.contains_key(&ident.id) {
            return Err(CatalogError::DuplicateProject {
                id: ident.id,
                identifier: entry.project.clone(),
            });
        }

        let mut workpackages = Vec::with_capacity(entry.workpackages.len());
        let mut wp_index = HashMap::with_capacity(entry.workpackages.len());
        for raw in &entry.workpackages {
            let wp = parse_identifier(raw);
            if wp_index.contains_key(&wp.id) {
                return Err(CatalogError::DuplicateWorkPackage {
                    project: ident.id,
                    workpackage: wp.id,
                });
            }
            wp_index.insert(wp.id.clone(), workpackages.len());
            workpackages.push(WorkPackage {
                icon: probe_icon(icon_dir, &wp.name),
                id: wp.id,
                name: wp.name,
            });
        }

        index.insert(ident.id.clone(), projects.len());
        projects.push(Project {
            icon: probe_icon(icon_dir, &ident.name),
            id: ident.id,
            name: ident.name,
            workpackages,
            index: wp_index,
        });
    }

    Ok(Catalog { projects, index })
}

/// Process-start selection: the first project, narrowed to its first
/// work-package when it has more than one.
pub fn default_selection(catalog: &Catalog) -> SelectionKey {
    // build_catalog rejects empty configs
    let project = &catalog.projects[0];
    match project.first_workpackage() {
        Some(wp) if project.has_submenu() => {
            SelectionKey::ProjectWorkPackage(project.id.clone(), wp.id.clone())
        }
        _ => SelectionKey::ProjectOnly(project.id.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config_data;
    use tempfile::TempDir;

    fn catalog_from(json: &str, icon_dir: &Path) -> Result<Catalog, CatalogError> {
        let data = parse_config_data(json).expect("config");
        build_catalog(&data, icon_dir)
    }

    #[test]
    fn parse_identifier_takes_first_and_last_segments() {
        assert_eq!(
            parse_identifier("A-B-C"),
            Identifier {
                id: "A".to_string(),
                name: "C".to_string()
            }
        );
        assert_eq!(
            parse_identifier("A-B"),
            Identifier {
                id: "A".to_string(),
                name: "B".to_string()
            }
        );
        assert_eq!(
            parse_identifier("X"),
            Identifier {
                id: "X".to_string(),
                name: "X".to_string()
            }
        );
    }

    #[test]
    fn build_catalog_preserves_config_order() {
        let temp = TempDir::new().expect("tempdir");
        let catalog = catalog_from(
            r#"{"300-Zeta": ["7-Docs"], "100-Alpha": ["2-Build", "1-Setup"]}"#,
            temp.path(),
        )
        .expect("catalog");

        let ids: Vec<&str> = catalog.projects().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["300", "100"]);
        let alpha = catalog.project("100").expect("alpha");
        let wps: Vec<&str> = alpha.workpackages().iter().map(|w| w.id.as_str()).collect();
        assert_eq!(wps, vec!["2", "1"]);
        assert_eq!(alpha.workpackage("1").map(|w| w.name.as_str()), Some("Setup"));
    }

    #[test]
    fn build_catalog_probes_icons_by_display_name() {
        let temp = TempDir::new().expect("tempdir");
        std::fs::write(temp.path().join("myIcon_Alpha.ico"), b"ico").expect("icon");
        std::fs::write(temp.path().join("myIcon_Build.ico"), b"ico").expect("icon");
        let catalog =
            catalog_from(r#"{"100-Alpha": ["1-Setup", "2-Build"]}"#, temp.path()).expect("catalog");

        let alpha = catalog.project("100").expect("alpha");
        assert_eq!(alpha.icon, Some(temp.path().join("myIcon_Alpha.ico")));
        assert_eq!(alpha.workpackage("1").and_then(|w| w.icon.clone()), None);
        assert_eq!(
            alpha.workpackage("2").and_then(|w| w.icon.clone()),
            Some(temp.path().join("myIcon_Build.ico"))
        );
    }

    #[test]
    fn build_catalog_rejects_duplicate_project_ids() {
        let temp = TempDir::new().expect("tempdir");
        let err = catalog_from(r#"{"100-Alpha": [], "100-Gamma": []}"#, temp.path())
            .expect_err("duplicate");
        assert_eq!(
            err,
            CatalogError::DuplicateProject {
                id: "100".to_string(),
                identifier: "100-Gamma".to_string()
            }
        );

        let err = catalog_from(r#"{"100-Alpha": [], "100-Alpha": ["1-Setup"]}"#, temp.path())
            .expect_err("repeated key");
        assert!(matches!(err, CatalogError::DuplicateProject { .. }));
    }

    #[test]
    fn build_catalog_rejects_duplicate_workpackages_and_empty_config() {
        let temp = TempDir::new().expect("tempdir");
        let err = catalog_from(r#"{"100-Alpha": ["1-Setup", "1-Again"]}"#, temp.path())
            .expect_err("duplicate wp");
        assert!(matches!(err, CatalogError::DuplicateWorkPackage { .. }));

        let err = catalog_from("{}", temp.path()).expect_err("empty");
        assert_eq!(err, CatalogError::Empty);
    }

    #[test]
    fn default_selection_depends_on_workpackage_count() {
        let temp = TempDir::new().expect("tempdir");
        let catalog = catalog_from(
            r#"{"100-Alpha": ["1-Setup", "2-Build", "3-Ship"], "200-Beta": []}"#,
            temp.path(),
        )
        .expect("catalog");
        assert_eq!(
            default_selection(&catalog),
            SelectionKey::ProjectWorkPackage("100".to_string(), "1".to_string())
        );

        let catalog = catalog_from(r#"{"100-Alpha": ["1-Setup"]}"#, temp.path()).expect("catalog");
        assert_eq!(
            default_selection(&catalog),
            SelectionKey::ProjectOnly("100".to_string())
        );

        let catalog = catalog_from(r#"{"Meta": []}"#, temp.path()).expect("catalog");
        assert_eq!(
            default_selection(&catalog),
            SelectionKey::ProjectOnly("Meta".to_string())
        );
    }

    #[test]
    fn label_includes_implied_first_workpackage() {
        let temp = TempDir::new().expect("tempdir");
        let catalog = catalog_from(
            r#"{"100-Alpha": ["1-Setup", "2-Build"], "200-Beta": [], "300-Gamma": ["5-Only"]}"#,
            temp.path(),
        )
        .expect("catalog");

        let label = |key: SelectionKey| catalog.label(&key).expect("label");
        assert_eq!(label(SelectionKey::ProjectOnly("200".to_string())), "200");
        assert_eq!(label(SelectionKey::ProjectOnly("300".to_string())), "300:5");
        assert_eq!(label(SelectionKey::ProjectOnly("100".to_string())), "100:1");
        assert_eq!(
            label(SelectionKey::ProjectWorkPackage("100".to_string(), "2".to_string())),
            "100:2"
        );
    }

    #[test]
    fn validate_rejects_unknown_ids() {
        let temp = TempDir::new().expect("tempdir");
        let catalog = catalog_from(r#"{"100-Alpha": ["1-Setup"]}"#, temp.path()).expect("catalog");

        let err = catalog
            .validate(&SelectionKey::ProjectOnly("999".to_string()))
            .expect_err("unknown project");
        assert_eq!(err, SelectionError::UnknownProject("999".to_string()));

        let err = catalog
            .validate(&SelectionKey::ProjectWorkPackage(
                "100".to_string(),
                "9".to_string(),
            ))
            .expect_err("unknown wp");
        assert!(matches!(err, SelectionError::UnknownWorkPackage { .. }));
    }
}
