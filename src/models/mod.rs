// UI-facing list models
// Models own their rows, apply changes from the page and persistence layers, and notify observers synchronously.

pub mod history_model;
pub mod notifier;
pub mod tab_model;
pub mod url_match;
