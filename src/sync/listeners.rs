//! Change-notification fan-out.
//!
//! Listeners take no arguments: they are told *that* the document changed
//! and read whatever they need back through the engine's accessors.

#[cfg(test)]
#[path = "listeners_test.rs"]
mod listeners_test;

pub type ListenerId = u64;

type Listener = Box<dyn Fn() + Send + Sync>;

#[derive(Default)]
pub struct Listeners {
    next_id: ListenerId,
    entries: Vec<(ListenerId, Listener)>,
}

impl Listeners {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl Fn() + Send + Sync + 'static) -> ListenerId {
        self.next_id += 1;
        self.entries.push((self.next_id, Box::new(listener)));
        self.next_id
    }

    /// Returns false when `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    /// Run every listener in subscription order.
    pub fn notify(&self) {
        for (_, listener) in &self.entries {
            listener();
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
