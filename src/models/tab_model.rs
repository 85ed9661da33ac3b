//! Tab list model.
//!
//! Owns the ordered tabs shown in the tab switcher, tracks the active tab,
//! and reports every change through [`TabModelEvent`]s scoped to the rows
//! and fields that actually changed. Persistence and thumbnail deletion are
//! best effort side effects; the model never fails a mutation because of them.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use std::rc::Rc;

use crate::database::gateway::PersistenceGateway;
use crate::models::notifier::{ListChange, ListModel, Notifier, RoleValue, SubscriptionId};
use crate::models::url_match::NormalizedUrl;
use crate::types::errors::PersistenceError;
use crate::types::page::{PageHost, WebPage};
use crate::types::tab::{PendingTab, Tab, TabRole};

/// Url a fresh browser session starts with.
pub const BLANK_URL: &str = "about:blank";

/// Notifications emitted by [`TabModel`].
#[derive(Debug, Clone, PartialEq)]
pub enum TabModelEvent {
    List(ListChange<TabRole>),
    TabAdded(i32),
    TabClosed(i32),
    ActiveTabChanged(i32),
    ActiveTabIndexChanged,
    LoadedChanged,
    WaitingForNewTabChanged,
    /// The UI layer should construct a page for `tab`; the tab is inserted
    /// once that page reports its first url.
    NewTabRequested { tab: Tab, parent_id: i32 },
}

pub struct TabModel {
    tabs: Vec<Tab>,
    active_tab_id: i32,
    loaded: bool,
    waiting_for_new_tab: bool,
    next_tab_id: i32,
    pending: BTreeMap<i32, PendingTab>,
    gateway: Rc<dyn PersistenceGateway>,
    page_host: Option<Rc<dyn PageHost>>,
    notifier: Notifier<TabModelEvent>,
}

impl TabModel {
    /// `next_tab_id` is usually the largest persisted tab id plus one.
    pub fn new(next_tab_id: i32, gateway: Rc<dyn PersistenceGateway>) -> Self {
        Self {
            tabs: Vec::new(),
            active_tab_id: 0,
            loaded: false,
            waiting_for_new_tab: false,
            next_tab_id: next_tab_id.max(1),
            pending: BTreeMap::new(),
            gateway,
            page_host: None,
            notifier: Notifier::new(),
        }
    }

    pub fn set_page_host(&mut self, page_host: Option<Rc<dyn PageHost>>) {
        self.page_host = page_host;
    }

    pub fn subscribe<F>(&mut self, observer: F) -> SubscriptionId
    where
        F: FnMut(&TabModelEvent) + 'static,
    {
        self.notifier.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    fn emit(&mut self, event: TabModelEvent) {
        self.notifier.emit(&event);
    }

    fn emit_field_changed(&mut self, row: usize, role: TabRole) {
        self.emit(TabModelEvent::List(ListChange::DataChanged {
            first: row,
            last: row,
            roles: vec![role],
        }));
    }

    fn persist(what: &str, result: Result<(), PersistenceError>) {
        if let Err(e) = result {
            log::warn!("failed to {}: {}", what, e);
        }
    }

    // ─── Creation ───

    /// Inserts a tab with the next free id at `index` (clamped to the end)
    /// and makes it the active tab.
    pub fn add_tab(&mut self, url: &str, title: &str, index: usize) {
        let index = index.min(self.tabs.len());
        let tab = Tab::new(self.next_tab_id, url, title, "");
        Self::persist("store new tab", self.gateway.create_tab(&tab));
        log::debug!("new tab data: {}", tab);

        let tab_id = tab.tab_id;
        self.next_tab_id = tab_id + 1;
        self.tabs.insert(index, tab);
        self.emit(TabModelEvent::List(ListChange::RowsInserted {
            first: index,
            last: index,
        }));
        self.update_active_tab(tab_id);

        self.emit(TabModelEvent::List(ListChange::CountChanged));
        self.emit(TabModelEvent::TabAdded(tab_id));

        self.pending.remove(&tab_id);
        if self.pending.is_empty() {
            self.set_waiting_for_new_tab(false);
        }
    }

    /// Requests a new tab for `url`. Returns the provisional tab id, or 0
    /// when a blank first tab was requested for an empty model.
    ///
    /// The provisional id is `next_tab_id()`, which only advances in
    /// `add_tab`. Requests made before the first one is confirmed therefore
    /// get the same id, and the latest request replaces the pending record.
    pub fn new_tab(&mut self, url: &str, parent_id: i32) -> i32 {
        // A fresh browser session already shows a blank page.
        if (url.is_empty() || url == BLANK_URL) && self.tabs.is_empty() {
            return 0;
        }

        self.set_waiting_for_new_tab(true);

        let mut tab = Tab::default();
        tab.tab_id = self.next_tab_id;
        tab.set_url(url);
        self.pending.insert(
            tab.tab_id,
            PendingTab {
                tab: tab.clone(),
                parent_id,
            },
        );

        let tab_id = tab.tab_id;
        self.emit(TabModelEvent::NewTabRequested { tab, parent_id });
        tab_id
    }

    pub fn pending_tab(&self, tab_id: i32) -> Option<&PendingTab> {
        self.pending.get(&tab_id)
    }

    /// Drops a tab request whose page never materialised, including any
    /// record stored for it. Returns whether such a request existed.
    pub fn discard_pending_tab(&mut self, tab_id: i32) -> bool {
        match self.pending.remove(&tab_id) {
            Some(pending) => {
                self.remove_tab(tab_id, pending.tab.thumbnail_path(), None);
                if self.pending.is_empty() {
                    self.set_waiting_for_new_tab(false);
                }
                true
            }
            None => false,
        }
    }

    /// Replaces the contents with tabs restored from storage.
    pub fn tabs_available(&mut self, tabs: Vec<Tab>, active_tab_id: i32) {
        let mut seen = HashSet::new();
        let tabs: Vec<Tab> = tabs
            .into_iter()
            .filter(|t| t.is_valid() && seen.insert(t.tab_id))
            .collect();

        if let Some(max_id) = tabs.iter().map(|t| t.tab_id).max() {
            self.next_tab_id = self.next_tab_id.max(max_id + 1);
        }

        self.tabs = tabs;
        self.active_tab_id = 0;
        self.emit(TabModelEvent::List(ListChange::Reset));
        self.emit(TabModelEvent::List(ListChange::CountChanged));

        if !self.activate_tab_by_id(active_tab_id) {
            self.activate_tab(0);
        }
        self.set_loaded();
    }

    // ─── Removal ───

    pub fn remove(&mut self, index: usize) {
        if index >= self.tabs.len() {
            return;
        }

        let removing_active = self.active_tab_index() == Some(index);
        let next_active = if removing_active {
            self.next_active_tab_id(index)
        } else {
            None
        };

        let tab_id = self.tabs[index].tab_id;
        let thumbnail = self.tabs[index].thumbnail_path().to_string();
        self.remove_tab(tab_id, &thumbnail, Some(index));

        if removing_active {
            self.activate_replacement(next_active);
        }
    }

    pub fn remove_tab_by_id(&mut self, tab_id: i32, active_tab: bool) {
        if active_tab {
            self.close_active_tab();
        } else if let Some(index) = self.find_tab_index(tab_id) {
            self.remove(index);
        }
    }

    /// Closes the active tab and activates its parent tab if the current
    /// page was opened from one, else the tab before it.
    pub fn close_active_tab(&mut self) {
        let index = match self.active_tab_index() {
            Some(index) => index,
            None => return,
        };

        let next_active = self.next_active_tab_id(index);
        let thumbnail = self.tabs[index].thumbnail_path().to_string();
        self.remove_tab(self.active_tab_id, &thumbnail, Some(index));
        self.activate_replacement(next_active);
    }

    /// Removes every tab, last row first, and flags that a fresh tab is expected.
    pub fn clear(&mut self) {
        if self.tabs.is_empty() {
            return;
        }

        for index in (0..self.tabs.len()).rev() {
            let tab_id = self.tabs[index].tab_id;
            let thumbnail = self.tabs[index].thumbnail_path().to_string();
            self.remove_tab(tab_id, &thumbnail, Some(index));
        }

        self.set_waiting_for_new_tab(true);
    }

    /// Deletes the tab's record and thumbnail. With an `index` the row is
    /// also removed from the list.
    fn remove_tab(&mut self, tab_id: i32, thumbnail: &str, index: Option<usize>) {
        log::debug!("removing tab {} at {:?}", tab_id, index);
        Self::persist("remove tab", self.gateway.remove_tab(tab_id));
        delete_thumbnail(thumbnail);

        if let Some(index) = index {
            if self.active_tab_index() == Some(index) {
                self.active_tab_id = 0;
            }
            self.tabs.remove(index);
            self.emit(TabModelEvent::List(ListChange::RowsRemoved {
                first: index,
                last: index,
            }));
            self.emit(TabModelEvent::List(ListChange::CountChanged));
            self.emit(TabModelEvent::TabClosed(tab_id));
        }
    }

    /// Id of the tab to activate once the tab at `index` is gone.
    fn next_active_tab_id(&self, index: usize) -> Option<i32> {
        if let Some(host) = &self.page_host {
            if host.current_page_parent_id().map_or(false, |parent| parent > 0) {
                return Some(host.resolve_parent_tab_id(host.current_page_tab_id()));
            }
        }
        index.checked_sub(1).map(|prev| self.tabs[prev].tab_id)
    }

    fn activate_replacement(&mut self, tab_id: Option<i32>) {
        match tab_id.and_then(|id| self.find_tab_index(id)) {
            Some(index) => self.activate_tab(index),
            None => self.activate_tab(0),
        }
    }

    // ─── Activation ───

    /// Activates the first tab showing `url`, ignoring a cosmetic trailing
    /// slash and percent-encoding differences.
    pub fn activate_tab_by_url(&mut self, url: &str) -> bool {
        if url.is_empty() {
            return false;
        }

        let wanted = NormalizedUrl::parse(url);
        match self
            .tabs
            .iter()
            .position(|tab| NormalizedUrl::parse(tab.url()).matches(&wanted))
        {
            Some(index) => {
                self.activate_tab(index);
                true
            }
            None => false,
        }
    }

    /// Activates the tab at `index`, clamped to the last row.
    pub fn activate_tab(&mut self, index: usize) {
        if self.tabs.is_empty() {
            return;
        }

        let index = index.min(self.tabs.len() - 1);
        log::debug!("activate tab: {} {}", index, self.tabs[index]);
        let tab_id = self.tabs[index].tab_id;
        self.update_active_tab(tab_id);
    }

    pub fn activate_tab_by_id(&mut self, tab_id: i32) -> bool {
        match self.find_tab_index(tab_id) {
            Some(index) => {
                self.activate_tab(index);
                true
            }
            None => false,
        }
    }

    fn update_active_tab(&mut self, tab_id: i32) {
        log::debug!(
            "new active tab: {} old active tab: {} count: {}",
            tab_id,
            self.active_tab_id,
            self.tabs.len()
        );
        if self.tabs.is_empty() || self.active_tab_id == tab_id {
            return;
        }

        let new_index = match self.find_tab_index(tab_id) {
            Some(index) => index,
            None => return,
        };
        let old_tab_id = self.active_tab_id;
        self.active_tab_id = tab_id;

        // Only the active flag changes; a full row refresh would make the
        // switcher redraw thumbnails.
        if let Some(old_index) = self.find_tab_index(old_tab_id) {
            self.emit_field_changed(old_index, TabRole::IsActive);
        }
        self.emit_field_changed(new_index, TabRole::IsActive);
        self.emit(TabModelEvent::ActiveTabIndexChanged);
        self.emit(TabModelEvent::ActiveTabChanged(tab_id));
    }

    // ─── Field updates ───

    /// Stores a url change of `tab_id`. Anything but the tab's first load is
    /// recorded as a navigation.
    pub fn update_url(&mut self, tab_id: i32, url: &str, initial_load: bool) {
        let index = match self.find_tab_index(tab_id) {
            Some(index) => index,
            None => return,
        };

        let is_active_tab = self.active_tab_id == tab_id;
        if self.tabs[index].url() != url || is_active_tab {
            self.tabs[index].set_url(url);
            self.emit_field_changed(index, TabRole::Url);

            if !initial_load {
                Self::persist("record navigation", self.gateway.navigate_to(tab_id, url, "", ""));
            }
        }
    }

    pub fn update_thumbnail_path(&mut self, tab_id: i32, path: &str) {
        if tab_id <= 0 {
            return;
        }

        if let Some(index) = self.find_tab_index(tab_id) {
            log::debug!("model tab thumbnail updated: {} {} {}", path, index, tab_id);
            // Blank first so the image element reloads a rewritten file at the same path.
            self.tabs[index].set_thumbnail_path("");
            self.emit_field_changed(index, TabRole::ThumbnailPath);
            self.tabs[index].set_thumbnail_path(path);
            self.emit_field_changed(index, TabRole::ThumbnailPath);
            Self::persist("store thumbnail path", self.gateway.update_thumb_path(tab_id, path));
        }
    }

    // ─── Page events ───

    /// Handles a url change reported by `page`. The first load of a page
    /// that has no tab yet inserts one after its parent tab, or at the end.
    pub fn on_url_changed(&mut self, page: &mut WebPage) {
        let url = page.url.clone();
        let tab_id = page.tab_id;

        // The initial url is not a navigation and must not grow history.
        let initial_load = !page.initial_load_has_happened();
        if !initial_load || self.contains(tab_id) {
            self.update_url(tab_id, &url, initial_load);
        } else {
            let index = if page.parent_id > 0 {
                let parent_tab_id = self
                    .page_host
                    .as_ref()
                    .map_or(0, |host| host.resolve_parent_tab_id(tab_id));
                self.find_tab_index(parent_tab_id)
                    .map_or(self.tabs.len(), |parent_index| parent_index + 1)
            } else {
                self.tabs.len()
            };
            self.add_tab(&url, "", index);
        }
        page.set_initial_load_has_happened();
    }

    pub fn on_title_changed(&mut self, page: &WebPage) {
        if let Some(index) = self.find_tab_index(page.tab_id) {
            if self.tabs[index].title() != page.title {
                self.tabs[index].set_title(&page.title);
                self.emit_field_changed(index, TabRole::Title);
                Self::persist(
                    "store title",
                    self.gateway.update_title(page.tab_id, &page.url, &page.title),
                );
            }
        }
    }

    pub fn on_desktop_mode_changed(&mut self, page: &WebPage) {
        if let Some(index) = self.find_tab_index(page.tab_id) {
            if self.tabs[index].desktop_mode != page.desktop_mode {
                self.tabs[index].desktop_mode = page.desktop_mode;
                self.emit_field_changed(index, TabRole::DesktopMode);
            }
        }
    }

    // ─── Queries ───

    pub fn find_tab_index(&self, tab_id: i32) -> Option<usize> {
        self.tabs.iter().position(|t| t.tab_id == tab_id)
    }

    pub fn contains(&self, tab_id: i32) -> bool {
        self.find_tab_index(tab_id).is_some()
    }

    /// The active tab.
    ///
    /// # Panics
    /// Panics if no tab is active; callers must check `active_tab_index()` first.
    pub fn active_tab(&self) -> &Tab {
        match self.active_tab_index() {
            Some(index) => &self.tabs[index],
            None => panic!("no active tab (active id {})", self.active_tab_id),
        }
    }

    /// Url of `tab_id`, empty when there is no such tab.
    pub fn url(&self, tab_id: i32) -> &str {
        self.find_tab_index(tab_id)
            .map_or("", |index| self.tabs[index].url())
    }

    pub fn active_tab_index(&self) -> Option<usize> {
        self.find_tab_index(self.active_tab_id)
    }

    pub fn active_tab_id(&self) -> i32 {
        self.active_tab_id
    }

    pub fn count(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn next_tab_id(&self) -> i32 {
        self.next_tab_id
    }

    pub fn loaded(&self) -> bool {
        self.loaded
    }

    pub fn set_loaded(&mut self) {
        if !self.loaded {
            self.loaded = true;
            self.emit(TabModelEvent::LoadedChanged);
        }
    }

    pub fn set_unloaded(&mut self) {
        if self.loaded {
            self.loaded = false;
            self.emit(TabModelEvent::LoadedChanged);
        }
    }

    pub fn waiting_for_new_tab(&self) -> bool {
        self.waiting_for_new_tab
    }

    pub fn set_waiting_for_new_tab(&mut self, waiting: bool) {
        if self.waiting_for_new_tab != waiting {
            self.waiting_for_new_tab = waiting;
            self.emit(TabModelEvent::WaitingForNewTabChanged);
        }
    }

    pub fn dump_tabs(&self) {
        for (i, tab) in self.tabs.iter().enumerate() {
            log::debug!("tab[{}]: {}", i, tab);
        }
    }
}

impl ListModel for TabModel {
    type Role = TabRole;

    fn row_count(&self) -> usize {
        self.tabs.len()
    }

    fn role_names(&self) -> Vec<(TabRole, &'static str)> {
        TabRole::ALL.iter().map(|role| (*role, role.name())).collect()
    }

    fn data(&self, row: usize, role: TabRole) -> Option<RoleValue> {
        let tab = self.tabs.get(row)?;
        Some(match role {
            TabRole::ThumbnailPath => RoleValue::Text(tab.thumbnail_path().to_string()),
            TabRole::Title => RoleValue::Text(tab.title().to_string()),
            TabRole::Url => RoleValue::Text(tab.url().to_string()),
            TabRole::IsActive => RoleValue::Bool(tab.tab_id == self.active_tab_id),
            TabRole::TabId => RoleValue::Int(tab.tab_id),
            TabRole::DesktopMode => RoleValue::Bool(tab.desktop_mode),
        })
    }
}

/// Removes a thumbnail file; a missing file is not an error.
fn delete_thumbnail(path: &str) {
    if path.is_empty() {
        return;
    }
    let path = Path::new(path);
    if path.exists() {
        if let Err(e) = fs::remove_file(path) {
            log::warn!("failed to delete thumbnail {}: {}", path.display(), e);
        }
    }
}
