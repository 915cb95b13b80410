//! Host list widget interface
//!
//! The outline owns the chapter records; the host list keeps the persisted
//! payload array. Every structural edit on the outline is forwarded here so
//! both stay in lockstep, index for index.

use serde_json::Value;

/// Persistence of the chapter payload array
pub trait ChapterList {
    /// Stored payloads in list order
    fn values(&self) -> Vec<Value>;

    /// Append an item; `false` when the host refuses to create one
    fn add_item(&mut self, initial: Option<&Value>) -> bool;

    /// Remove the item at `index`
    fn remove_item(&mut self, index: usize);

    /// Move the item at `from` so that it ends up at `to`
    fn move_item(&mut self, from: usize, to: usize);

    /// Replace the payload stored at `index`
    fn update_item(&mut self, index: usize, value: &Value);
}

/// List kept in memory, for hosts that persist elsewhere
#[derive(Debug, Clone, Default)]
pub struct MemoryList {
    items: Vec<Value>,
}

impl MemoryList {
    /// Create a list holding `items`
    pub fn new(items: Vec<Value>) -> Self {
        Self { items }
    }

    /// Stored items
    pub fn items(&self) -> &[Value] {
        &self.items
    }
}

impl ChapterList for MemoryList {
    fn values(&self) -> Vec<Value> {
        self.items.clone()
    }

    fn add_item(&mut self, initial: Option<&Value>) -> bool {
        self.items
            .push(initial.cloned().unwrap_or_else(|| Value::Object(Default::default())));
        true
    }

    fn remove_item(&mut self, index: usize) {
        if index < self.items.len() {
            self.items.remove(index);
        }
    }

    fn move_item(&mut self, from: usize, to: usize) {
        move_within(&mut self.items, from, to);
    }

    fn update_item(&mut self, index: usize, value: &Value) {
        if let Some(item) = self.items.get_mut(index) {
            *item = value.clone();
        }
    }
}

/// Remove the element at `from` and reinsert it at `to`
pub(crate) fn move_within<T>(items: &mut Vec<T>, from: usize, to: usize) {
    if from >= items.len() || to >= items.len() || from == to {
        return;
    }
    let item = items.remove(from);
    items.insert(to, item);
}
