use serde::{Deserialize, Serialize};

/// State of a live rendered page, handed to the tab model's page-event
/// handlers by the page-lifecycle layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebPage {
    pub tab_id: i32,
    /// Window id of the page that opened this one; 0 when opened directly.
    pub parent_id: i32,
    pub url: String,
    pub title: String,
    pub desktop_mode: bool,
    #[serde(skip)]
    initial_load_has_happened: bool,
}

impl WebPage {
    pub fn new(tab_id: i32, parent_id: i32, url: &str) -> Self {
        Self {
            tab_id,
            parent_id,
            url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn initial_load_has_happened(&self) -> bool {
        self.initial_load_has_happened
    }

    pub fn set_initial_load_has_happened(&mut self) {
        self.initial_load_has_happened = true;
    }
}

/// The collaborator that owns the currently rendered page and knows the
/// parent/child relationships between tabs.
pub trait PageHost {
    /// Parent id of the page currently on screen, if any page is shown.
    fn current_page_parent_id(&self) -> Option<i32>;
    fn current_page_tab_id(&self) -> i32;
    /// Maps a tab to the tab that opened it; 0 when unknown.
    fn resolve_parent_tab_id(&self, tab_id: i32) -> i32;
}
