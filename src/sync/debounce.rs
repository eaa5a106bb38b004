//! Keyed debouncer for field-group writes.
//!
//! DESIGN
//! ======
//! Each key holds at most one pending write plus the timer that will fire
//! it. Scheduling again for the same key aborts the timer and replaces the
//! write, so only the latest value is ever sent. When the quiet window
//! elapses the timer takes the write out of the table under the lock,
//! releases it, then runs the write. A write that has already been taken
//! is in flight and is never cancelled by a later schedule.
//!
//! `flush_all` drains the whole table and runs every write immediately.
//! `cancel` withdraws a single key, for writes whose target is going away.

#[cfg(test)]
#[path = "debounce_test.rs"]
mod debounce_test;

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, join_all};
use tokio::task::JoinHandle;

use crate::model::{ElementId, ModelId};

/// Deferred remote write. Errors are handled inside the future.
pub type WriteJob = BoxFuture<'static, ()>;

/// The three independently debounced write groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldGroup {
    /// Position, rotation, size, z and border of an element.
    ElementTransform,
    /// Variant-specific fields: shape path/color, text content/style,
    /// spatial camera/background.
    ObjectFields,
    /// Position, rotation, scale and shader of a 3D model.
    ModelTransform,
}

/// Debounce key: one pending write per group and target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WriteKey {
    pub group: FieldGroup,
    pub target: i64,
}

impl WriteKey {
    #[must_use]
    pub fn element_transform(id: ElementId) -> Self {
        Self { group: FieldGroup::ElementTransform, target: id }
    }

    #[must_use]
    pub fn object_fields(id: ElementId) -> Self {
        Self { group: FieldGroup::ObjectFields, target: id }
    }

    #[must_use]
    pub fn model_transform(id: ModelId) -> Self {
        Self { group: FieldGroup::ModelTransform, target: id }
    }
}

struct Pending {
    generation: u64,
    job: WriteJob,
    timer: JoinHandle<()>,
}

type PendingTable<K> = Arc<Mutex<HashMap<K, Pending>>>;

pub struct Debouncer<K> {
    delay: Duration,
    pending: PendingTable<K>,
    next_generation: u64,
}

impl<K> Debouncer<K>
where
    K: Eq + Hash + Clone + Send + 'static,
{
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: Arc::new(Mutex::new(HashMap::new())), next_generation: 0 }
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace any pending write for `key` with `job` and restart the quiet
    /// window. Must be called from within a tokio runtime.
    pub fn schedule(&mut self, key: K, job: WriteJob) {
        self.next_generation += 1;
        let generation = self.next_generation;

        // Held until the entry is in place so a zero-delay timer cannot
        // look it up first.
        let mut pending = self.lock();
        let table = Arc::clone(&self.pending);
        let timer_key = key.clone();
        let delay = self.delay;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let job = {
                let mut pending = table.lock().unwrap_or_else(PoisonError::into_inner);
                match pending.get(&timer_key) {
                    Some(entry) if entry.generation == generation => pending.remove(&timer_key).map(|p| p.job),
                    _ => None,
                }
            };
            if let Some(job) = job {
                job.await;
            }
        });

        if let Some(old) = pending.insert(key, Pending { generation, job, timer }) {
            old.timer.abort();
        }
    }

    /// Fire every pending write now and wait for all of them to finish.
    /// Returns the number of writes fired.
    pub async fn flush_all(&mut self) -> usize {
        let jobs: Vec<WriteJob> = {
            let mut pending = self.lock();
            pending
                .drain()
                .map(|(_, p)| {
                    p.timer.abort();
                    p.job
                })
                .collect()
        };
        let fired = jobs.len();
        join_all(jobs).await;
        fired
    }

    /// Withdraw the pending write for `key` without running it. The caller
    /// decides whether to run or drop the returned job.
    pub fn cancel(&mut self, key: &K) -> Option<WriteJob> {
        let pending = self.lock().remove(key)?;
        pending.timer.abort();
        Some(pending.job)
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_pending(&self, key: &K) -> bool {
        self.lock().contains_key(key)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<K, Pending>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
