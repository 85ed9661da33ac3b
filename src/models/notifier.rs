//! Observable list-model contract shared by the tab and history models.
//!
//! Models own a [`Notifier`] and push [`ListChange`]s (plus their own
//! model-specific events) through it. Delivery is synchronous: every
//! observer has run by the time `emit` returns.

use serde::Serialize;

/// Structural change of an ordered list model. Row ranges are inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListChange<R> {
    RowsInserted { first: usize, last: usize },
    RowsRemoved { first: usize, last: usize },
    /// Only `roles` changed on rows `first..=last`.
    DataChanged { first: usize, last: usize, roles: Vec<R> },
    Reset,
    CountChanged,
}

/// Value of a single row field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RoleValue {
    Text(String),
    Bool(bool),
    Int(i32),
}

/// Read side of a list model as seen by a UI binding layer.
pub trait ListModel {
    type Role: Copy;

    fn row_count(&self) -> usize;
    fn role_names(&self) -> Vec<(Self::Role, &'static str)>;
    /// `None` for rows out of range.
    fn data(&self, row: usize, role: Self::Role) -> Option<RoleValue>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Synchronous observer list.
pub struct Notifier<E> {
    observers: Vec<(SubscriptionId, Box<dyn FnMut(&E)>)>,
    next_id: u64,
}

impl<E> Notifier<E> {
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
            next_id: 1,
        }
    }

    pub fn subscribe<F>(&mut self, observer: F) -> SubscriptionId
    where
        F: FnMut(&E) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Returns whether the subscription existed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sid, _)| *sid != id);
        self.observers.len() != before
    }

    /// Delivers `event` to every observer in subscription order.
    pub fn emit(&mut self, event: &E) {
        for (_, observer) in self.observers.iter_mut() {
            observer(event);
        }
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }
}

impl<E> Default for Notifier<E> {
    fn default() -> Self {
        Self::new()
    }
}
