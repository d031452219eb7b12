use std::path::{Path, PathBuf};

use crate::catalog::{probe_icon, Catalog};
use crate::selection::SelectionKey;

pub const QUIT_LABEL: &str = "Quit";
pub const QUIT_ICON_NAME: &str = "QUIT";

/// Command value carried by a clickable entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    Select(SelectionKey),
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuLeaf {
    /// Stable click id, unique across the whole menu.
    pub id: u32,
    pub label: String,
    pub icon: Option<PathBuf>,
    pub action: MenuAction,
    /// Member of an exclusive-choice group (its own menu level).
    pub radio: bool,
}

impl MenuLeaf {
    pub fn is_checked(&self, is_selected: &dyn Fn(&SelectionKey) -> bool) -> bool {
        match &self.action {
            MenuAction::Select(key) => self.radio && is_selected(key),
            MenuAction::Quit => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuEntry {
    Leaf(MenuLeaf),
    Submenu {
        label: String,
        icon: Option<PathBuf>,
        leaves: Vec<MenuLeaf>,
    },
    Separator,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    entries: Vec<MenuEntry>,
}

impl Menu {
    pub fn entries(&self) -> &[MenuEntry] {
        &self.entries
    }

    /// Every clickable leaf in display order, submenus flattened.
    pub fn leaves(&self) -> impl Iterator<Item = &MenuLeaf> {
        self.entries.iter().flat_map(|entry| {
            let leaves: &[MenuLeaf] = match entry {
                MenuEntry::Leaf(leaf) => std::slice::from_ref(leaf),
                MenuEntry::Submenu { leaves, .. } => leaves,
                MenuEntry::Separator => &[],
            };
            leaves
        })
    }

    pub fn action_for(&self, id: u32) -> Option<&MenuAction> {
        self.leaves()
            .find(|leaf| leaf.id == id)
            .map(|leaf| &leaf.action)
    }
}

struct IdAllocator(u32);

impl IdAllocator {
    fn next(&mut self) -> u32 {
        self.0 += 1;
        self.0
    }
}

/// Builds the tray menu in catalog order, ending with a separator and Quit.
///
/// Projects with more than one work-package become submenus whose leaves
/// form their own exclusive group; every other project is a single
/// top-level leaf selecting the project alone.
pub fn build_menu(catalog: &Catalog, icon_dir: &Path) -> Menu {
    let mut ids = IdAllocator(0);
    let mut entries = Vec::with_capacity(catalog.len() + 2);

    for project in catalog.projects() {
        if project.has_submenu() {
            let leaves = project
                .workpackages()
                .iter()
                .map(|wp| MenuLeaf {
                    id: ids.next(),
                    label: wp.name.clone(),
                    icon: wp.icon.clone().or_else(|| project.icon.clone()),
                    action: MenuAction::Select(SelectionKey::ProjectWorkPackage(
                        project.id.clone(),
                        wp.id.clone(),
                    )),
                    radio: true,
                })
                .collect();
            entries.push(MenuEntry::Submenu {
                label: project.name.clone(),
                icon: project.icon.clone(),
                leaves,
            });
        } else {
            entries.push(MenuEntry::Leaf(MenuLeaf {
                id: ids.next(),
                label: project.name.clone(),
                icon: project.icon.clone(),
                action: MenuAction::Select(SelectionKey::ProjectOnly(project.id.clone())),
                radio: true,
            }));
        }
    }

    entries.push(MenuEntry::Separator);
    entries.push(MenuEntry::Leaf(MenuLeaf {
        id: ids.next(),
        label: QUIT_LABEL.to_string(),
        icon: probe_icon(icon_dir, QUIT_ICON_NAME),
        action: MenuAction::Quit,
        radio: false,
    }));

    Menu { entries }
}
