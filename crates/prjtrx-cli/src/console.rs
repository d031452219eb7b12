//! Terminal host for the status surface: the menu is printed to stdout and
//! clicks arrive as menu ids typed on stdin.

use std::fmt::Write as _;
use std::io::{BufRead, Write as _};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;

use prjtrx_core::icon::IconArtifact;
use prjtrx_core::menu::{Menu, MenuAction, MenuEntry, MenuLeaf};
use prjtrx_core::selection::SelectionKey;
use prjtrx_core::session::SurfaceSeed;
use prjtrx_core::surface::{MenuHandler, StatusSurface, SurfaceError};

enum HostEvent {
    Click(u32),
    Stop,
}

pub struct ConsoleSurface {
    events_tx: Mutex<Sender<HostEvent>>,
    events_rx: Mutex<Option<Receiver<HostEvent>>>,
    icon: Mutex<IconArtifact>,
    tooltip: Mutex<String>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Writes to stdout; a closed stdout is not fatal for the host.
fn show(text: &str) {
    let mut out = std::io::stdout().lock();
    if let Err(err) = out.write_all(text.as_bytes()).and_then(|()| out.flush()) {
        tracing::debug!(error = %err, "console output failed");
    }
}

impl ConsoleSurface {
    pub fn new(seed: SurfaceSeed<'_>) -> Self {
        let (events_tx, events_rx) = channel();
        Self {
            events_tx: Mutex::new(events_tx),
            events_rx: Mutex::new(Some(events_rx)),
            icon: Mutex::new(seed.icon.clone()),
            tooltip: Mutex::new(seed.tooltip.to_string()),
        }
    }

    fn send(&self, event: HostEvent) {
        // The receiver only goes away once the loop has ended.
        let _ = lock(&self.events_tx).send(event);
    }

    fn spawn_stdin_reader(&self) -> std::io::Result<()> {
        let events = lock(&self.events_tx).clone();
        thread::Builder::new()
            .name("prjtrx-stdin".to_string())
            .spawn(move || {
                let stdin = std::io::stdin();
                for line in stdin.lock().lines() {
                    let Ok(line) = line else {
                        break;
                    };
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    match trimmed.parse::<u32>() {
                        Ok(id) => {
                            if events.send(HostEvent::Click(id)).is_err() {
                                break;
                            }
                        }
                        Err(_) => eprintln!("Enter a menu number, got '{trimmed}'"),
                    }
                }
                tracing::debug!("stdin closed");
            })?;
        Ok(())
    }

    fn header(&self) -> String {
        format!("[prjtrx] {} | icon: {}", lock(&self.tooltip), lock(&self.icon))
    }
}

impl StatusSurface for ConsoleSurface {
    fn set_icon(&self, icon: &IconArtifact) {
        *lock(&self.icon) = icon.clone();
    }

    fn set_tooltip(&self, text: &str) {
        *lock(&self.tooltip) = text.to_string();
    }

    fn run(&self, menu: &Menu, handler: &dyn MenuHandler) -> Result<(), SurfaceError> {
        let events = lock(&self.events_rx)
            .take()
            .ok_or_else(|| SurfaceError::EventLoop("event loop already ran".to_string()))?;
        self.spawn_stdin_reader()?;

        let is_selected = |key: &SelectionKey| handler.is_selected(key);
        show(&format!("{}\n{}", self.header(), render_menu(menu, &is_selected)));
        while let Ok(event) = events.recv() {
            match event {
                HostEvent::Click(id) => match menu.action_for(id) {
                    Some(action) => {
                        handler.dispatch(action);
                        if *action != MenuAction::Quit {
                            show(&format!(
                                "{}\n{}",
                                self.header(),
                                render_menu(menu, &is_selected)
                            ));
                        }
                    }
                    None => eprintln!("No menu entry {id}"),
                },
                HostEvent::Stop => break,
            }
        }
        Ok(())
    }

    fn stop(&self) {
        self.send(HostEvent::Stop);
    }
}

fn push_leaf(
    out: &mut String,
    indent: &str,
    leaf: &MenuLeaf,
    is_selected: &dyn Fn(&SelectionKey) -> bool,
) {
    let marker = if !leaf.radio {
        "   "
    } else if leaf.is_checked(is_selected) {
        "(*)"
    } else {
        "( )"
    };
    let _ = writeln!(out, "{indent}{marker} {:>2}  {}", leaf.id, leaf.label);
}

pub fn render_menu(menu: &Menu, is_selected: &dyn Fn(&SelectionKey) -> bool) -> String {
    let mut out = String::new();
    for entry in menu.entries() {
        match entry {
            MenuEntry::Leaf(leaf) => push_leaf(&mut out, "", leaf, is_selected),
            MenuEntry::Submenu { label, leaves, .. } => {
                let _ = writeln!(out, "{label}");
                for leaf in leaves {
                    push_leaf(&mut out, "  ", leaf, is_selected);
                }
            }
            MenuEntry::Separator => out.push_str("----\n"),
        }
    }
    out
}
