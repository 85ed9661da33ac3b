//! Persistence gateway consumed by the tab and history models.

use crate::types::errors::PersistenceError;
use crate::types::history::Link;
use crate::types::tab::Tab;

/// Store of tab and browsing history records.
///
/// The models treat writes as fire-and-forget: an `Err` is logged by the
/// caller and otherwise ignored.
pub trait PersistenceGateway {
    fn create_tab(&self, tab: &Tab) -> Result<(), PersistenceError>;
    /// Records a navigation of `tab_id` to `url` in tab and browsing history.
    fn navigate_to(&self, tab_id: i32, url: &str, title: &str, favicon: &str) -> Result<(), PersistenceError>;
    fn remove_tab(&self, tab_id: i32) -> Result<(), PersistenceError>;
    fn remove_all_tabs(&self) -> Result<(), PersistenceError>;
    fn clear_tab_history(&self, tab_id: i32) -> Result<(), PersistenceError>;
    fn clear_history(&self) -> Result<(), PersistenceError>;
    fn update_thumb_path(&self, tab_id: i32, path: &str) -> Result<(), PersistenceError>;
    fn update_title(&self, tab_id: i32, url: &str, title: &str) -> Result<(), PersistenceError>;

    /// Links visited in `tab_id`, most recent first.
    fn tab_history(&self, tab_id: i32) -> Result<Vec<Link>, PersistenceError>;
    /// Browsing history across all tabs, most recent first, one row per url.
    fn history(&self) -> Result<Vec<Link>, PersistenceError>;
    fn all_tabs(&self) -> Result<Vec<Tab>, PersistenceError>;
    /// Largest persisted tab id, 0 when there are none.
    fn max_tab_id(&self) -> Result<i32, PersistenceError>;
}

/// Notifications raised by the gateway after a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbEvent {
    TabChanged(i32),
    ThumbPathChanged { url: String, path: String },
    TitleChanged { url: String, title: String },
}
