use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_LOGFILE: &str = "prjtrx_events.log";
pub const DEFAULT_TOOLTIP: &str = "No Project selected!";
pub const SETTINGS_FILENAME: &str = "prjtrx.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unable to load {}", .0.display())]
    Missing(PathBuf),
    #[error("Config IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse project config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One project key of the config input with its work-package identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    pub project: String,
    pub workpackages: Vec<String>,
}

/// Project config in document order.
///
/// Repeated keys are kept as separate entries so the catalog builder can
/// reject them instead of silently keeping the last one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigData {
    pub entries: Vec<ConfigEntry>,
}

impl<'de> Deserialize<'de> for ConfigData {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = ConfigData;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping project identifiers to lists of work-package identifiers")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((project, workpackages)) =
                    map.next_entry::<String, Vec<String>>()?
                {
                    entries.push(ConfigEntry {
                        project,
                        workpackages,
                    });
                }
                Ok(ConfigData { entries })
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

pub fn parse_config_data(text: &str) -> Result<ConfigData, ConfigError> {
    Ok(serde_json::from_str(text)?)
}

pub fn load_config_data(path: &Path) -> Result<ConfigData, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::Missing(path.to_path_buf()));
    }
    let raw = fs::read_to_string(path)?;
    parse_config_data(&raw)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TraySettings {
    /// Path of the change log sink.
    pub logfile: Option<String>,
    /// Directory probed for `myIcon_<name>.ico` files.
    pub icon_dir: Option<String>,
    /// Hover text shown before the first selection is logged.
    pub tooltip: Option<String>,
}

/// Directories searched for `prjtrx.toml`, nearest first.
pub fn settings_search_dirs(config_file: &Path, cwd: &Path) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(parent) = config_file
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
    {
        dirs.push(parent.to_path_buf());
    }
    if !dirs.iter().any(|dir| dir == cwd) {
        dirs.push(cwd.to_path_buf());
    }
    dirs
}

pub fn load_settings(dirs: &[PathBuf]) -> Option<(TraySettings, PathBuf)> {
    for dir in dirs {
        let path = dir.join(SETTINGS_FILENAME);
        if !path.is_file() {
            continue;
        }
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "unreadable settings file");
                continue;
            }
        };
        match toml::from_str::<TraySettings>(&text) {
            Ok(settings) => return Some((settings, path)),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "ignoring invalid settings file");
            }
        }
    }
    None
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

pub fn resolve_logfile_with_source(
    flag: Option<&Path>,
    settings: Option<&TraySettings>,
) -> (PathBuf, &'static str) {
    if let Some(path) = flag {
        return (path.to_path_buf(), "flag");
    }
    if let Some(value) = settings.and_then(|s| non_blank(s.logfile.as_ref())) {
        return (PathBuf::from(value), "settings");
    }
    (PathBuf::from(DEFAULT_LOGFILE), "default")
}

pub fn resolve_icon_dir_with_source(
    flag: Option<&Path>,
    settings: Option<&TraySettings>,
) -> (PathBuf, &'static str) {
    if let Some(path) = flag {
        return (path.to_path_buf(), "flag");
    }
    if let Some(value) = settings.and_then(|s| non_blank(s.icon_dir.as_ref())) {
        return (PathBuf::from(value), "settings");
    }
    (PathBuf::from("."), "default")
}

pub fn resolve_tooltip(settings: Option<&TraySettings>) -> String {
    settings
        .and_then(|s| non_blank(s.tooltip.as_ref()))
        .unwrap_or(DEFAULT_TOOLTIP)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parse_config_keeps_document_order_and_repeated_keys() {
        let data = parse_config_data(
            r#"{"300-Zeta": [], "100-Alpha": ["1-Setup", "2-Build"], "300-Zeta": ["9-Late"]}"#,
        )
        .expect("parse");
        let projects: Vec<&str> = data.entries.iter().map(|e| e.project.as_str()).collect();
        assert_eq!(projects, vec!["300-Zeta", "100-Alpha", "300-Zeta"]);
        assert_eq!(
            data.entries[1].workpackages,
            vec!["1-Setup".to_string(), "2-Build".to_string()]
        );
    }

    #[test]
    fn parse_config_rejects_non_list_values() {
        let err = parse_config_data(r#"{"100-Alpha": "Setup"}"#).expect_err("should fail");
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_config_reports_missing_path() {
        let temp = TempDir::new().expect("tempdir");
        let missing = temp.path().join("nope.json");
        let err = load_config_data(&missing).expect_err("missing");
        assert!(matches!(err, ConfigError::Missing(_)));
        assert_eq!(err.to_string(), format!("Unable to load {}", missing.display()));
    }

    #[test]
    fn resolve_logfile_prefers_flag_then_settings_then_default() {
        let settings = TraySettings {
            logfile: Some("from-settings.log".to_string()),
            icon_dir: None,
            tooltip: None,
        };

        let (path, source) =
            resolve_logfile_with_source(Some(Path::new("flag.log")), Some(&settings));
        assert_eq!(path, PathBuf::from("flag.log"));
        assert_eq!(source, "flag");

        let (path, source) = resolve_logfile_with_source(None, Some(&settings));
        assert_eq!(path, PathBuf::from("from-settings.log"));
        assert_eq!(source, "settings");

        let (path, source) = resolve_logfile_with_source(None, None);
        assert_eq!(path, PathBuf::from(DEFAULT_LOGFILE));
        assert_eq!(source, "default");
    }

    #[test]
    fn blank_settings_values_fall_through_to_defaults() {
        let settings = TraySettings {
            logfile: Some("  ".to_string()),
            icon_dir: Some(String::new()),
            tooltip: Some(" ".to_string()),
        };
        assert_eq!(resolve_logfile_with_source(None, Some(&settings)).1, "default");
        assert_eq!(resolve_icon_dir_with_source(None, Some(&settings)).1, "default");
        assert_eq!(resolve_tooltip(Some(&settings)), DEFAULT_TOOLTIP);
    }

    #[test]
    fn load_settings_prefers_config_dir_and_skips_invalid_files() {
        let config_dir = TempDir::new().expect("config dir");
        let cwd = TempDir::new().expect("cwd");
        std::fs::write(config_dir.path().join(SETTINGS_FILENAME), "logfile = [").expect("write");
        std::fs::write(
            cwd.path().join(SETTINGS_FILENAME),
            "logfile = \"events.log\"\ntooltip = \"Pick one\"\n",
        )
        .expect("write");

        let dirs = settings_search_dirs(&config_dir.path().join("projects.json"), cwd.path());
        assert_eq!(dirs.len(), 2);

        let (settings, path) = load_settings(&dirs).expect("settings");
        assert_eq!(path, cwd.path().join(SETTINGS_FILENAME));
        assert_eq!(settings.logfile.as_deref(), Some("events.log"));
        assert_eq!(resolve_tooltip(Some(&settings)), "Pick one");
    }

    #[test]
    fn settings_search_dirs_dedups_cwd() {
        let cwd = PathBuf::from("/work");
        let dirs = settings_search_dirs(Path::new("/work/projects.json"), &cwd);
        assert_eq!(dirs, vec![cwd.clone()]);
        let dirs = settings_search_dirs(Path::new("projects.json"), &cwd);
        assert_eq!(dirs, vec![cwd]);
    }
}
