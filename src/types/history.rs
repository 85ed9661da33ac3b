use serde::{Deserialize, Serialize};

/// A visited page as stored in tab and browsing history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub link_id: i32,
    pub url: String,
    pub title: String,
    pub thumb_path: String,
}

impl Link {
    pub fn new(link_id: i32, url: &str, title: &str, thumb_path: &str) -> Self {
        Self {
            link_id,
            url: url.to_string(),
            title: title.to_string(),
            thumb_path: thumb_path.to_string(),
        }
    }
}

/// Row fields of the history list exposed to the UI binding layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryRole {
    ThumbnailPath,
    Url,
    Title,
}

impl HistoryRole {
    pub const ALL: [HistoryRole; 3] = [HistoryRole::ThumbnailPath, HistoryRole::Url, HistoryRole::Title];

    pub fn name(self) -> &'static str {
        match self {
            HistoryRole::ThumbnailPath => "thumbnailPath",
            HistoryRole::Url => "url",
            HistoryRole::Title => "title",
        }
    }
}
