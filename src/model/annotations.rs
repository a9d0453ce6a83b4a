//! String key/value annotations with change reporting.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::error::ModelResult;
use crate::events::{EventSink, Operation, Payload, ResourceType};
use crate::identity::ResourceId;

use super::{Model, ModelCore};

/// A string map whose changes are reported to an owner sink.
///
/// Every effective change emits one event with resource type `Annotations`
/// and the nil id: `Create` for a new key, `Update` for a changed value,
/// `Delete` for a removed key. Setting a key to the value it already holds
/// is not a change.
///
/// Annotations owned by an entity report to that entity, which turns the
/// change into an `Update` of itself.
pub struct Annotations {
    model: Weak<ModelCore>,
    sink: Weak<dyn EventSink>,
    records: RwLock<HashMap<String, String>>,
}

impl Annotations {
    /// Creates free-standing annotations reporting to `sink`, serialized
    /// with the other mutations of `model`.
    #[must_use]
    pub fn new(model: &Model, sink: &Arc<dyn EventSink>) -> Self {
        Self::owned_by(model.downgrade(), Arc::downgrade(sink))
    }

    pub(crate) fn owned_by(model: Weak<ModelCore>, sink: Weak<dyn EventSink>) -> Self {
        Self {
            model,
            sink,
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Sets `key` to `value`.
    ///
    /// # Errors
    ///
    /// The owner sink's error. The entry is kept either way.
    pub fn add(&self, key: impl Into<String>, value: impl Into<String>) -> ModelResult<()> {
        let (key, value) = (key.into(), value.into());
        let model = self.model.upgrade();
        let _gate = model.as_ref().map(|core| core.gate.lock());

        let operation = {
            let mut records = self.records.write();
            let operation = match records.get(&key) {
                Some(current) if *current == value => return Ok(()),
                Some(_) => Operation::Update,
                None => Operation::Create,
            };
            records.insert(key.clone(), value.clone());
            operation
        };
        self.emit(operation, Payload::Annotation { key, value })
    }

    /// Removes `key`. Removing a key that is not present does nothing.
    ///
    /// # Errors
    ///
    /// The owner sink's error. The entry is removed either way.
    pub fn delete(&self, key: &str) -> ModelResult<()> {
        let model = self.model.upgrade();
        let _gate = model.as_ref().map(|core| core.gate.lock());

        if self.records.write().remove(key).is_none() {
            return Ok(());
        }
        self.emit(Operation::Delete, Payload::AnnotationKey(key.to_string()))
    }

    /// Value stored under `key`, or the empty string.
    #[must_use]
    pub fn value(&self, key: &str) -> String {
        self.records.read().get(key).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.records.read().contains_key(key)
    }

    /// Snapshot of the current keys, in no particular order. Call again to
    /// iterate afresh.
    pub fn keys(&self) -> impl Iterator<Item = String> {
        let keys: Vec<String> = self.records.read().keys().cloned().collect();
        keys.into_iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    pub(crate) fn sorted_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .records
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        pairs.sort();
        pairs
    }

    fn emit(&self, operation: Operation, payload: Payload) -> ModelResult<()> {
        let Some(sink) = self.sink.upgrade() else {
            return Ok(());
        };
        sink.receive(ResourceType::Annotations, operation, ResourceId::nil(), &[payload])?;
        Ok(())
    }
}

impl fmt::Debug for Annotations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.records.try_read() {
            Some(records) => f.debug_map().entries(records.iter()).finish(),
            None => f.write_str("Annotations(<locked>)"),
        }
    }
}
