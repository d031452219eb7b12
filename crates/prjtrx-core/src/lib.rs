//! Core domain types for the prjtrx status-indicator agent.

pub mod catalog;
pub mod changelog;
pub mod config;
pub mod icon;
pub mod menu;
pub mod selection;
pub mod session;
pub mod surface;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::version;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
