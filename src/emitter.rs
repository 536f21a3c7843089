use std::sync::{Arc, Mutex};

use event_emitter_rs::EventEmitter;

/// Emitted before a save/insert/update writes, with the document id.
pub const BEFORE_SAVE: &str = "before_save";
/// Emitted after a save/insert/update has written, with the document id.
pub const AFTER_SAVE: &str = "after_save";
/// Emitted before a removal, with the document id.
pub const BEFORE_REMOVE: &str = "before_remove";
/// Emitted after a removal, with the document id.
pub const AFTER_REMOVE: &str = "after_remove";

/// Lifecycle events fired around template mutations.
///
/// Listeners receive the id of the document being written or removed.
/// Cheap to clone; clones share listeners.
///
/// # Example
///
/// ```ignore
/// use bucketmap::{emitter, BucketTemplate};
///
/// let template = BucketTemplate::in_memory();
/// template.events().on(emitter::AFTER_SAVE, |id| {
///     println!("saved {}", id);
/// });
/// ```
#[derive(Clone)]
pub struct MutationEvents {
    emitter: Arc<Mutex<EventEmitter>>,
}

impl Default for MutationEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl MutationEvents {
    pub fn new() -> Self {
        MutationEvents {
            emitter: Arc::new(Mutex::new(EventEmitter::new())),
        }
    }

    /// Register a listener for a mutation event.
    pub fn on<F>(&self, event: &str, listener: F)
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        if let Ok(mut emitter) = self.emitter.lock() {
            emitter.on(event, listener);
        }
    }

    pub(crate) fn emit(&self, event: &str, id: &str) {
        if let Ok(mut emitter) = self.emitter.lock() {
            emitter.emit(event, id.to_string());
        }
    }
}
