//! End-to-end import scenarios against the in-memory store.

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use trellis::store::StoreOp;
use trellis::{identity, schema};
use trellis::{BeaconBase, GraphStore, Importer, LineStatus, MemoryStore, WriteMode};

async fn setup(mode: WriteMode) -> (Arc<MemoryStore>, Importer) {
    let store = Arc::new(MemoryStore::new());
    schema::define(store.as_ref()).await.unwrap();
    let importer = Importer::new(store.clone(), mode, BeaconBase::default());
    (store, importer)
}

/// One study with one pal and one transcript of two nuggets, where the
/// pal also appears in the transcript.
fn pilot_line() -> String {
    json!([{
        "studyId": "S-100",
        "studyName": "Pilot A",
        "studyDescription": "Onboarding usability pilot",
        "tags": ["usability"],
        "interestAreas": ["onboarding"],
        "studyPals": [{
            "palId": "P1",
            "palName": "Dana Voss",
            "palEmail": "dana@example.com",
            "palNumber": "555-0100",
            "palAge": "34",
            "palGender": "female",
            "palDOB": "1991-04-02",
            "hourlyPricing": "40"
        }],
        "studyTranscripts": [{
            "transcriptId": "T1",
            "transcriptDate": "2023-06-01",
            "nuggets": [
                {
                    "question": "How did setup feel?",
                    "answer": "Straightforward once the email arrived.",
                    "codes": ["setup"],
                    "order": 2
                },
                {
                    "question": "What was confusing?",
                    "answer": "The sync step between devices.",
                    "codes": ["sync", "friction"],
                    "order": 1
                }
            ],
            "pals": [{"palId": "P1"}]
        }]
    }])
    .to_string()
}

/// A minimal study with one empty transcript.
fn study_value(name: &str, transcript: &str) -> serde_json::Value {
    json!({
        "studyId": format!("S-{}", name),
        "studyName": name,
        "studyDescription": "Follow-up round",
        "studyTranscripts": [{
            "transcriptId": transcript,
            "transcriptDate": "2023-07-15"
        }]
    })
}

fn study_line(name: &str, transcript: &str) -> String {
    json!([study_value(name, transcript)]).to_string()
}

#[tokio::test]
async fn test_pilot_study_builds_full_graph() {
    let (store, importer) = setup(WriteMode::Batched).await;
    let summary = importer
        .import_lines(pilot_line().as_bytes())
        .await
        .unwrap();

    assert_eq!(summary.succeeded(), 1);
    let stats = &summary.lines[0].stats;
    assert_eq!(stats.studies, 1);
    assert_eq!(stats.pals, 1);
    assert_eq!(stats.transcripts, 1);
    assert_eq!(stats.nuggets, 2);
    assert_eq!(stats.references, 6);
    assert_eq!(stats.missing_pals, 0);

    let study = identity::study_id("Pilot A");
    let pal = identity::pal_id("Pilot A", "P1");
    let transcript = identity::transcript_id("Pilot A", "T1");
    let first = identity::nugget_id("Pilot A", "T1", "T1_1");
    let second = identity::nugget_id("Pilot A", "T1", "T1_2");

    assert_eq!(store.count(schema::STUDY_CLASS), 1);
    assert_eq!(store.count(schema::PAL_CLASS), 1);
    assert_eq!(store.count(schema::TRANSCRIPT_CLASS), 1);
    assert_eq!(store.count(schema::NUGGET_CLASS), 2);

    let stored = store.object(study).unwrap();
    assert_eq!(stored.properties["studyName"], "Pilot A");
    let stored = store.object(first).unwrap();
    assert_eq!(stored.properties["nuggetId"], "T1_1");
    assert_eq!(stored.properties["order"], 2);

    assert!(store.has_reference(study, schema::HAS_PALS, pal));
    assert!(store.has_reference(study, schema::HAS_TRANSCRIPTS, transcript));
    assert!(store.has_reference(transcript, schema::HAS_NUGGETS, first));
    assert!(store.has_reference(transcript, schema::HAS_NUGGETS, second));
    assert!(store.has_reference(pal, schema::IN_TRANSCRIPT, transcript));
    assert!(store.has_reference(transcript, schema::HAS_PALS, pal));
    assert_eq!(store.references().len(), 6);
}

#[tokio::test]
async fn test_malformed_line_does_not_stop_the_run() {
    let (store, importer) = setup(WriteMode::Batched).await;
    let input = format!("{}\n{{oops\n{}\n", pilot_line(), study_line("Beta", "T9"));

    let summary = importer.import_lines(input.as_bytes()).await.unwrap();

    assert_eq!(summary.lines.len(), 3);
    assert!(matches!(summary.lines[0].status, LineStatus::Success));
    assert!(matches!(summary.lines[1].status, LineStatus::Failed { .. }));
    assert!(matches!(summary.lines[2].status, LineStatus::Success));

    // Both valid studies landed despite the bad middle line.
    assert_eq!(store.count(schema::STUDY_CLASS), 2);
    assert!(store.object(identity::study_id("Beta")).is_some());
}

#[tokio::test]
async fn test_unknown_transcript_pal_is_skipped() {
    let (store, importer) = setup(WriteMode::Batched).await;
    let line = json!([{
        "studyId": "S-200",
        "studyName": "Beta",
        "studyDescription": "Second round",
        "studyPals": [{
            "palId": "P1",
            "palName": "Dana Voss",
            "palEmail": "dana@example.com",
            "palNumber": "555-0100",
            "palAge": "34",
            "palGender": "female",
            "palDOB": "1991-04-02",
            "hourlyPricing": "40"
        }],
        "studyTranscripts": [{
            "transcriptId": "T1",
            "transcriptDate": "2023-06-01",
            "pals": [{"palId": "P1"}, {"palId": "P9"}]
        }]
    }])
    .to_string();

    let summary = importer.import_lines(line.as_bytes()).await.unwrap();

    // The line still succeeds; the dangling pal is only counted.
    assert_eq!(summary.succeeded(), 1);
    assert_eq!(summary.lines[0].stats.missing_pals, 1);

    let known = identity::pal_id("Beta", "P1");
    let unknown = identity::pal_id("Beta", "P9");
    let transcript = identity::transcript_id("Beta", "T1");
    assert!(store.has_reference(known, schema::IN_TRANSCRIPT, transcript));
    assert!(store.has_reference(transcript, schema::HAS_PALS, known));
    assert!(!store.has_reference(unknown, schema::IN_TRANSCRIPT, transcript));
    assert!(!store.has_reference(transcript, schema::HAS_PALS, unknown));
}

#[tokio::test]
async fn test_reimport_reports_failed_lines() {
    let (store, importer) = setup(WriteMode::Batched).await;

    let first = importer
        .import_lines(pilot_line().as_bytes())
        .await
        .unwrap();
    assert_eq!(first.succeeded(), 1);
    let objects_after_first = store.object_count();

    let second = importer
        .import_lines(pilot_line().as_bytes())
        .await
        .unwrap();
    assert_eq!(second.failed(), 1);
    match &second.lines[0].status {
        LineStatus::Failed { error } => assert!(error.contains("already exists")),
        other => panic!("expected failed line, got {:?}", other),
    }

    // Nothing was duplicated or overwritten.
    assert_eq!(store.object_count(), objects_after_first);
}

#[tokio::test]
async fn test_parents_are_written_before_references() {
    let (store, importer) = setup(WriteMode::Batched).await;
    importer
        .import_lines(pilot_line().as_bytes())
        .await
        .unwrap();

    let ops = store.ops();
    let created_at = |id: Uuid| {
        ops.iter()
            .position(|op| matches!(op, StoreOp::ObjectCreated { id: created, .. } if *created == id))
            .unwrap()
    };

    for (index, op) in ops.iter().enumerate() {
        if let StoreOp::ReferenceAdded { from_id, to_id, .. } = op {
            assert!(created_at(*from_id) < index);
            assert!(created_at(*to_id) < index);
        }
    }

    // Immediate creates run in hierarchy order; queued writes land last.
    let study = created_at(identity::study_id("Pilot A"));
    let pal = created_at(identity::pal_id("Pilot A", "P1"));
    let transcript = created_at(identity::transcript_id("Pilot A", "T1"));
    let nugget = created_at(identity::nugget_id("Pilot A", "T1", "T1_1"));
    assert!(study < pal && pal < transcript && transcript < nugget);
    assert_eq!(
        ops.last(),
        Some(&StoreOp::BatchFlushed {
            objects: 2,
            references: 4
        })
    );
}

#[tokio::test]
async fn test_immediate_mode_builds_the_same_graph() {
    let (store, importer) = setup(WriteMode::Immediate).await;
    let summary = importer
        .import_lines(pilot_line().as_bytes())
        .await
        .unwrap();

    assert_eq!(summary.succeeded(), 1);
    assert!(!store
        .ops()
        .iter()
        .any(|op| matches!(op, StoreOp::BatchFlushed { .. })));

    assert_eq!(store.count(schema::STUDY_CLASS), 1);
    assert_eq!(store.count(schema::PAL_CLASS), 1);
    assert_eq!(store.count(schema::TRANSCRIPT_CLASS), 1);
    assert_eq!(store.count(schema::NUGGET_CLASS), 2);
    assert_eq!(store.references().len(), 6);
}

#[tokio::test]
async fn test_batch_item_failure_marks_line_partial() {
    let (store, importer) = setup(WriteMode::Batched).await;

    // Occupy the first nugget's id so the batched create is rejected.
    let first = identity::nugget_id("Pilot A", "T1", "T1_1");
    store
        .create_object(schema::NUGGET_CLASS, first, json!({}))
        .await
        .unwrap();

    let summary = importer
        .import_lines(pilot_line().as_bytes())
        .await
        .unwrap();

    assert_eq!(summary.partial(), 1);
    match &summary.lines[0].status {
        LineStatus::Partial { error } => assert!(error.contains("1 batch items failed")),
        other => panic!("expected partial line, got {:?}", other),
    }

    // The occupied id kept its original properties; the sibling landed.
    assert_eq!(store.object(first).unwrap().properties, json!({}));
    let second = identity::nugget_id("Pilot A", "T1", "T1_2");
    assert_eq!(store.object(second).unwrap().properties["nuggetId"], "T1_2");
}

#[tokio::test]
async fn test_conflicting_study_marks_line_partial() {
    let (store, importer) = setup(WriteMode::Batched).await;
    importer
        .import_lines(study_line("Beta", "T9").as_bytes())
        .await
        .unwrap();

    // Gamma is written before Beta's conflict aborts the line.
    let line = json!([study_value("Gamma", "T2"), study_value("Beta", "T9")]).to_string();
    let summary = importer.import_lines(line.as_bytes()).await.unwrap();

    assert_eq!(summary.partial(), 1);
    assert!(store.object(identity::study_id("Gamma")).is_some());
    assert_eq!(store.count(schema::STUDY_CLASS), 2);
}

#[tokio::test]
async fn test_import_from_file() {
    let (store, importer) = setup(WriteMode::Batched).await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("transcripts-meta.json");
    std::fs::write(
        &path,
        format!("{}\n{}\n", pilot_line(), study_line("Beta", "T9")),
    )
    .unwrap();

    let summary = importer.import_file(&path).await.unwrap();

    assert_eq!(summary.lines.len(), 2);
    assert_eq!(summary.succeeded(), 2);
    assert_eq!(summary.totals.studies, 2);
    assert_eq!(store.count(schema::STUDY_CLASS), 2);
}
