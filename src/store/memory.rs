//! In-memory backend for dry runs and tests.
//!
//! Mirrors the remote store's observable behavior: duplicate ids conflict,
//! batched item failures are reported per item, and references require
//! both endpoints to exist. Every accepted write is recorded in an
//! operation log so callers can assert ordering.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::schema::{ClassSpec, PropertySpec};

use super::{BatchItemOutcome, BatchResults, GraphObject, GraphStore, WriteBatch};

/// A store operation, in acceptance order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    SchemaReset,
    ClassDefined(String),
    PropertyAdded {
        class: String,
        property: String,
    },
    ObjectCreated {
        class: String,
        id: Uuid,
    },
    ReferenceAdded {
        from_class: String,
        from_id: Uuid,
        relation: String,
        to_id: Uuid,
    },
    BatchFlushed {
        objects: usize,
        references: usize,
    },
}

/// A recorded cross-reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredReference {
    pub from_class: String,
    pub from_id: Uuid,
    pub relation: String,
    pub to_id: Uuid,
}

#[derive(Default)]
struct MemoryState {
    classes: HashMap<String, ClassSpec>,
    objects: HashMap<Uuid, GraphObject>,
    references: Vec<StoredReference>,
    ops: Vec<StoreOp>,
}

/// In-process graph store.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects of a class.
    pub fn count(&self, class: &str) -> usize {
        self.state
            .read()
            .objects
            .values()
            .filter(|o| o.class == class)
            .count()
    }

    /// Total number of stored objects.
    pub fn object_count(&self) -> usize {
        self.state.read().objects.len()
    }

    /// Stored object by id.
    pub fn object(&self, id: Uuid) -> Option<GraphObject> {
        self.state.read().objects.get(&id).cloned()
    }

    /// All recorded references.
    pub fn references(&self) -> Vec<StoredReference> {
        self.state.read().references.clone()
    }

    /// Whether a specific reference was recorded.
    pub fn has_reference(&self, from_id: Uuid, relation: &str, to_id: Uuid) -> bool {
        self.state
            .read()
            .references
            .iter()
            .any(|r| r.from_id == from_id && r.relation == relation && r.to_id == to_id)
    }

    /// Defined class names, sorted.
    pub fn classes(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.read().classes.keys().cloned().collect();
        names.sort();
        names
    }

    /// Defined class by name, including properties added after creation.
    pub fn class(&self, name: &str) -> Option<ClassSpec> {
        self.state.read().classes.get(name).cloned()
    }

    /// Accepted operations, in order.
    pub fn ops(&self) -> Vec<StoreOp> {
        self.state.read().ops.clone()
    }
}

#[async_trait]
impl GraphStore for MemoryStore {
    async fn reset_schema(&self) -> Result<()> {
        let mut state = self.state.write();
        state.classes.clear();
        state.objects.clear();
        state.references.clear();
        state.ops.push(StoreOp::SchemaReset);
        Ok(())
    }

    async fn define_class(&self, spec: &ClassSpec) -> Result<()> {
        let mut state = self.state.write();
        if state.classes.contains_key(&spec.class) {
            return Err(
                StoreError::Schema(format!("class {} already exists", spec.class)).into(),
            );
        }
        state.classes.insert(spec.class.clone(), spec.clone());
        state.ops.push(StoreOp::ClassDefined(spec.class.clone()));
        Ok(())
    }

    async fn add_property(&self, class: &str, property: &PropertySpec) -> Result<()> {
        let mut state = self.state.write();
        match state.classes.get_mut(class) {
            Some(spec) => spec.properties.push(property.clone()),
            None => {
                return Err(StoreError::Schema(format!("class {} does not exist", class)).into())
            }
        }
        state.ops.push(StoreOp::PropertyAdded {
            class: class.to_string(),
            property: property.name.clone(),
        });
        Ok(())
    }

    async fn create_object(&self, class: &str, id: Uuid, properties: Value) -> Result<()> {
        let mut state = self.state.write();
        if state.objects.contains_key(&id) {
            return Err(StoreError::Conflict(id).into());
        }
        state.objects.insert(
            id,
            GraphObject {
                id,
                class: class.to_string(),
                properties,
            },
        );
        state.ops.push(StoreOp::ObjectCreated {
            class: class.to_string(),
            id,
        });
        Ok(())
    }

    async fn get_object(&self, id: Uuid) -> Result<Option<GraphObject>> {
        Ok(self.state.read().objects.get(&id).cloned())
    }

    async fn add_reference(
        &self,
        from_class: &str,
        from_id: Uuid,
        relation: &str,
        to_id: Uuid,
    ) -> Result<()> {
        let mut state = self.state.write();
        if !state.objects.contains_key(&from_id) {
            return Err(StoreError::NotFound(from_id).into());
        }
        if !state.objects.contains_key(&to_id) {
            return Err(StoreError::NotFound(to_id).into());
        }
        state.references.push(StoredReference {
            from_class: from_class.to_string(),
            from_id,
            relation: relation.to_string(),
            to_id,
        });
        state.ops.push(StoreOp::ReferenceAdded {
            from_class: from_class.to_string(),
            from_id,
            relation: relation.to_string(),
            to_id,
        });
        Ok(())
    }

    async fn flush_batch(&self, batch: WriteBatch) -> Result<BatchResults> {
        let mut state = self.state.write();
        let mut results = BatchResults::default();

        let object_count = batch.objects.len();
        let reference_count = batch.references.len();

        for object in batch.objects {
            if state.objects.contains_key(&object.id) {
                results.objects.push(BatchItemOutcome::failed(
                    Some(object.id),
                    format!("object {} already exists", object.id),
                ));
                continue;
            }
            state.objects.insert(
                object.id,
                GraphObject {
                    id: object.id,
                    class: object.class.clone(),
                    properties: object.properties,
                },
            );
            state.ops.push(StoreOp::ObjectCreated {
                class: object.class,
                id: object.id,
            });
            results.objects.push(BatchItemOutcome::ok(object.id));
        }

        for reference in batch.references {
            if !state.objects.contains_key(&reference.from_id) {
                results.references.push(BatchItemOutcome::failed(
                    Some(reference.from_id),
                    format!("source object {} does not exist", reference.from_id),
                ));
                continue;
            }
            if !state.objects.contains_key(&reference.to_id) {
                results.references.push(BatchItemOutcome::failed(
                    Some(reference.from_id),
                    format!("target object {} does not exist", reference.to_id),
                ));
                continue;
            }
            state.references.push(StoredReference {
                from_class: reference.from_class.clone(),
                from_id: reference.from_id,
                relation: reference.relation.clone(),
                to_id: reference.to_id,
            });
            state.ops.push(StoreOp::ReferenceAdded {
                from_class: reference.from_class,
                from_id: reference.from_id,
                relation: reference.relation,
                to_id: reference.to_id,
            });
            results.references.push(BatchItemOutcome::ok(reference.from_id));
        }

        if object_count > 0 || reference_count > 0 {
            state.ops.push(StoreOp::BatchFlushed {
                objects: object_count,
                references: reference_count,
            });
        }

        Ok(results)
    }
}
