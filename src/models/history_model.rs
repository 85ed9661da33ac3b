//! History list model.
//!
//! Shows the browsing history of one tab (`tab_id > 0`) or, by default, the
//! global browsing history. Contents arrive from the persistence gateway and
//! are kept in sync through [`HistoryModel::handle_db_event`].

use std::rc::Rc;

use crate::database::gateway::{DbEvent, PersistenceGateway};
use crate::models::notifier::{ListChange, ListModel, Notifier, RoleValue, SubscriptionId};
use crate::types::history::{HistoryRole, Link};

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryModelEvent {
    List(ListChange<HistoryRole>),
    TabIdChanged,
}

pub struct HistoryModel {
    tab_id: i32,
    links: Vec<Link>,
    gateway: Rc<dyn PersistenceGateway>,
    notifier: Notifier<HistoryModelEvent>,
}

impl HistoryModel {
    pub fn new(gateway: Rc<dyn PersistenceGateway>) -> Self {
        Self {
            tab_id: -1,
            links: Vec::new(),
            gateway,
            notifier: Notifier::new(),
        }
    }

    pub fn subscribe<F>(&mut self, observer: F) -> SubscriptionId
    where
        F: FnMut(&HistoryModelEvent) + 'static,
    {
        self.notifier.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    fn emit(&mut self, event: HistoryModelEvent) {
        self.notifier.emit(&event);
    }

    pub fn tab_id(&self) -> i32 {
        self.tab_id
    }

    pub fn set_tab_id(&mut self, tab_id: i32) {
        if self.tab_id != tab_id {
            self.tab_id = tab_id;
            self.emit(HistoryModelEvent::TabIdChanged);
            self.load();
        }
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn count(&self) -> usize {
        self.links.len()
    }

    /// Fetches the history this model shows.
    pub fn load(&mut self) {
        if self.tab_id > 0 {
            match self.gateway.tab_history(self.tab_id) {
                Ok(links) => self.tab_history_available(self.tab_id, links),
                Err(e) => log::warn!("failed to load history of tab {}: {}", self.tab_id, e),
            }
        } else {
            match self.gateway.history() {
                Ok(links) => self.history_available(links),
                Err(e) => log::warn!("failed to load browsing history: {}", e),
            }
        }
    }

    /// Removes every row and the history behind them.
    pub fn clear(&mut self) {
        if self.links.is_empty() {
            return;
        }

        let last = self.links.len() - 1;
        self.links.clear();
        self.emit(HistoryModelEvent::List(ListChange::RowsRemoved { first: 0, last }));

        let result = if self.tab_id <= 0 {
            self.gateway.clear_history()
        } else {
            self.gateway.clear_tab_history(self.tab_id)
        };
        if let Err(e) = result {
            log::warn!("failed to clear history: {}", e);
        }
        self.emit(HistoryModelEvent::List(ListChange::CountChanged));
    }

    pub fn tab_history_available(&mut self, tab_id: i32, links: Vec<Link>) {
        if tab_id == self.tab_id {
            self.reset(links);
        }
    }

    pub fn history_available(&mut self, links: Vec<Link>) {
        if self.tab_id <= 0 {
            self.reset(links);
        }
    }

    fn reset(&mut self, links: Vec<Link>) {
        self.links = links;
        self.emit(HistoryModelEvent::List(ListChange::Reset));
        self.emit(HistoryModelEvent::List(ListChange::CountChanged));
    }

    pub fn tab_changed(&mut self, tab_id: i32) {
        if self.tab_id == tab_id {
            self.load();
        }
    }

    pub fn update_thumb_path(&mut self, url: &str, path: &str) {
        for i in 0..self.links.len() {
            if self.links[i].url == url && self.links[i].thumb_path != path {
                self.links[i].thumb_path = path.to_string();
                self.emit_field_changed(i, HistoryRole::ThumbnailPath);
            }
        }
    }

    pub fn update_title(&mut self, url: &str, title: &str) {
        for i in 0..self.links.len() {
            if self.links[i].url == url && self.links[i].title != title {
                self.links[i].title = title.to_string();
                self.emit_field_changed(i, HistoryRole::Title);
            }
        }
    }

    fn emit_field_changed(&mut self, row: usize, role: HistoryRole) {
        self.emit(HistoryModelEvent::List(ListChange::DataChanged {
            first: row,
            last: row,
            roles: vec![role],
        }));
    }

    pub fn handle_db_event(&mut self, event: &DbEvent) {
        match event {
            DbEvent::TabChanged(tab_id) => self.tab_changed(*tab_id),
            DbEvent::ThumbPathChanged { url, path } => self.update_thumb_path(url, path),
            DbEvent::TitleChanged { url, title } => self.update_title(url, title),
        }
    }
}

impl ListModel for HistoryModel {
    type Role = HistoryRole;

    fn row_count(&self) -> usize {
        self.links.len()
    }

    fn role_names(&self) -> Vec<(HistoryRole, &'static str)> {
        HistoryRole::ALL.iter().map(|role| (*role, role.name())).collect()
    }

    fn data(&self, row: usize, role: HistoryRole) -> Option<RoleValue> {
        let link = self.links.get(row)?;
        let value = match role {
            HistoryRole::ThumbnailPath => &link.thumb_path,
            HistoryRole::Url => &link.url,
            HistoryRole::Title => &link.title,
        };
        Some(RoleValue::Text(value.clone()))
    }
}
