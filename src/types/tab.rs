use std::fmt;

use serde::{Deserialize, Serialize};

use super::history::Link;

/// A single browsing context: identity plus the page it currently shows.
///
/// A tab with `tab_id <= 0` has not been assigned an identity yet.
/// Equality compares the id and the current link; desktop mode is a
/// presentation flag and does not take part in it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tab {
    pub tab_id: i32,
    pub current_link: Link,
    #[serde(default)]
    pub desktop_mode: bool,
}

impl Tab {
    pub fn new(tab_id: i32, url: &str, title: &str, thumbnail_path: &str) -> Self {
        Self {
            tab_id,
            current_link: Link {
                link_id: 0,
                url: url.to_string(),
                title: title.to_string(),
                thumb_path: thumbnail_path.to_string(),
            },
            desktop_mode: false,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.tab_id > 0
    }

    pub fn url(&self) -> &str {
        &self.current_link.url
    }

    pub fn set_url(&mut self, url: &str) {
        self.current_link.url = url.to_string();
    }

    pub fn title(&self) -> &str {
        &self.current_link.title
    }

    pub fn set_title(&mut self, title: &str) {
        self.current_link.title = title.to_string();
    }

    pub fn thumbnail_path(&self) -> &str {
        &self.current_link.thumb_path
    }

    pub fn set_thumbnail_path(&mut self, path: &str) {
        self.current_link.thumb_path = path.to_string();
    }
}

impl PartialEq for Tab {
    fn eq(&self, other: &Self) -> bool {
        self.tab_id == other.tab_id && self.current_link == other.current_link
    }
}

impl Eq for Tab {}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tab(tabId = {}, isValid = {}, linkId = {}, url = {}, title = {}, thumbnailPath = {})",
            self.tab_id,
            self.is_valid(),
            self.current_link.link_id,
            self.url(),
            self.title(),
            self.thumbnail_path()
        )
    }
}

/// Row fields of the tab list exposed to the UI binding layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TabRole {
    ThumbnailPath,
    Title,
    Url,
    IsActive,
    TabId,
    DesktopMode,
}

impl TabRole {
    pub const ALL: [TabRole; 6] = [
        TabRole::ThumbnailPath,
        TabRole::Title,
        TabRole::Url,
        TabRole::IsActive,
        TabRole::TabId,
        TabRole::DesktopMode,
    ];

    /// Name the UI layer binds the role to.
    pub fn name(self) -> &'static str {
        match self {
            TabRole::ThumbnailPath => "thumbnailPath",
            TabRole::Title => "title",
            TabRole::Url => "url",
            TabRole::IsActive => "activeTab",
            TabRole::TabId => "tabId",
            TabRole::DesktopMode => "desktopMode",
        }
    }
}

/// A request for a tab that has been accepted but not inserted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTab {
    pub tab: Tab,
    pub parent_id: i32,
}
