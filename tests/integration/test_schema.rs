//! Schema definition lifecycle against the in-memory store.

use serde_json::json;
use uuid::Uuid;

use trellis::store::StoreOp;
use trellis::{schema, GraphStore, MemoryStore};

#[tokio::test]
async fn test_define_creates_all_classes() {
    let store = MemoryStore::new();
    schema::define(&store).await.unwrap();

    assert_eq!(
        store.classes(),
        vec!["Nugget", "Pal", "Study", "Transcript"]
    );
    assert_eq!(store.class("Study").unwrap().properties.len(), 7);
    assert_eq!(store.class("Pal").unwrap().properties.len(), 10);
    assert_eq!(store.class("Transcript").unwrap().properties.len(), 5);
    assert_eq!(store.class("Nugget").unwrap().properties.len(), 6);
}

#[tokio::test]
async fn test_classes_are_created_before_reference_properties() {
    let store = MemoryStore::new();
    schema::define(&store).await.unwrap();

    let ops = store.ops();
    assert_eq!(ops.first(), Some(&StoreOp::SchemaReset));

    // Every class exists before the first cross-class property is added,
    // so mutually referencing classes can be defined at all.
    let last_class = ops
        .iter()
        .rposition(|op| matches!(op, StoreOp::ClassDefined(_)))
        .unwrap();
    let first_property = ops
        .iter()
        .position(|op| matches!(op, StoreOp::PropertyAdded { .. }))
        .unwrap();
    assert!(last_class < first_property);

    let added = ops
        .iter()
        .filter(|op| matches!(op, StoreOp::PropertyAdded { .. }))
        .count();
    assert_eq!(added, 8);
}

#[tokio::test]
async fn test_reference_properties_follow_scalars() {
    let store = MemoryStore::new();
    schema::define(&store).await.unwrap();

    let study = store.class("Study").unwrap();
    assert!(study.properties[..5].iter().all(|p| !p.is_reference()));
    assert!(study.properties[5..].iter().all(|p| p.is_reference()));

    let names: Vec<&str> = study.properties[5..]
        .iter()
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(names, vec!["hasTranscripts", "hasPals"]);
}

#[tokio::test]
async fn test_redefine_drops_existing_data() {
    let store = MemoryStore::new();
    schema::define(&store).await.unwrap();

    let id = Uuid::new_v4();
    store
        .create_object(schema::STUDY_CLASS, id, json!({"studyName": "Old"}))
        .await
        .unwrap();

    schema::define(&store).await.unwrap();
    assert!(store.object(id).is_none());
    assert_eq!(store.classes().len(), 4);
}

#[tokio::test]
async fn test_vectorization_targets_nugget_answers_only() {
    let store = MemoryStore::new();
    schema::define(&store).await.unwrap();

    for name in ["Study", "Pal", "Transcript"] {
        let class = store.class(name).unwrap();
        assert_eq!(class.vectorizer, "none");
        assert!(class.vector_index_config.as_ref().unwrap().skip);
    }

    let nugget = store.class("Nugget").unwrap();
    assert_eq!(nugget.vectorizer, "text2vec-contextionary");
    assert!(
        nugget
            .module_config
            .as_ref()
            .unwrap()
            .contextionary
            .vectorize_class_name
    );

    let skip_of = |name: &str| {
        nugget
            .properties
            .iter()
            .find(|p| p.name == name)
            .unwrap()
            .module_config
            .as_ref()
            .unwrap()
            .contextionary
            .skip
    };
    assert!(!skip_of("answer"));
    assert!(skip_of("question"));
    assert!(skip_of("codes"));
}
