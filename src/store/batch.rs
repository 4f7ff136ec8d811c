//! Per-line write batching.

use serde_json::Value;
use uuid::Uuid;

/// An object queued for batched creation.
#[derive(Debug, Clone)]
pub struct QueuedObject {
    pub class: String,
    pub id: Uuid,
    pub properties: Value,
}

/// A reference queued for batched creation.
#[derive(Debug, Clone)]
pub struct QueuedReference {
    pub from_class: String,
    pub from_id: Uuid,
    pub relation: String,
    pub to_id: Uuid,
}

/// Writes accumulated for one input line.
///
/// Backends flush all objects before any reference, so a queued reference
/// may point at an object queued in the same batch.
#[derive(Debug, Default)]
pub struct WriteBatch {
    pub objects: Vec<QueuedObject>,
    pub references: Vec<QueuedReference>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_object(&mut self, class: &str, id: Uuid, properties: Value) {
        self.objects.push(QueuedObject {
            class: class.to_string(),
            id,
            properties,
        });
    }

    pub fn add_reference(&mut self, from_class: &str, from_id: Uuid, relation: &str, to_id: Uuid) {
        self.references.push(QueuedReference {
            from_class: from_class.to_string(),
            from_id,
            relation: relation.to_string(),
            to_id,
        });
    }

    pub fn len(&self) -> usize {
        self.objects.len() + self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.references.is_empty()
    }
}

/// Outcome of one batched item.
#[derive(Debug, Clone)]
pub struct BatchItemOutcome {
    /// Written object id, or the source id for a reference.
    pub id: Option<Uuid>,
    /// Error messages the store reported for this item.
    pub errors: Vec<String>,
}

impl BatchItemOutcome {
    pub fn ok(id: Uuid) -> Self {
        Self {
            id: Some(id),
            errors: Vec::new(),
        }
    }

    pub fn failed(id: Option<Uuid>, message: impl Into<String>) -> Self {
        Self {
            id,
            errors: vec![message.into()],
        }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Per-item outcomes of a flushed batch, in submission order.
#[derive(Debug, Clone, Default)]
pub struct BatchResults {
    pub objects: Vec<BatchItemOutcome>,
    pub references: Vec<BatchItemOutcome>,
}

impl BatchResults {
    /// Count of items that reported at least one error.
    pub fn error_count(&self) -> usize {
        self.objects
            .iter()
            .chain(self.references.iter())
            .filter(|item| !item.is_ok())
            .count()
    }
}
