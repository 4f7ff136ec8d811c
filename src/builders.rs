//! Builders that turn parsed records into graph objects.
//!
//! Each builder is a pure function: it derives the entity id from the
//! record plus its parent identity and returns the property map ready for
//! the store, with any embedded parent pointers already in place.

use serde_json::{json, Value};
use uuid::Uuid;

use crate::identity;
use crate::model::{PalRecord, StudyRecord, TranscriptRecord};
use crate::schema;
use crate::store::BeaconBase;

/// Build a study object.
pub fn study(record: &StudyRecord) -> (Value, Uuid) {
    let id = identity::study_id(&record.study_name);
    let properties = json!({
        "studyId": record.study_id,
        "studyName": record.study_name,
        "studyDescription": record.study_description,
        "tags": record.tags,
        "interestAreas": record.interest_areas,
    });
    (properties, id)
}

/// Build a participant object pointing back at its study.
pub fn pal(
    record: &PalRecord,
    study_name: &str,
    study: Uuid,
    beacons: &BeaconBase,
) -> (Value, Uuid) {
    let id = identity::pal_id(study_name, &record.pal_id);
    let properties = json!({
        "palId": record.pal_id,
        "palName": record.pal_name,
        "palEmail": record.pal_email,
        "palNumber": record.pal_number,
        "palAge": record.pal_age,
        "palGender": record.pal_gender,
        "palDOB": record.pal_dob,
        "hourlyPricing": record.hourly_pricing,
        (schema::IN_STUDY): [{ "beacon": beacons.object(study) }],
    });
    (properties, id)
}

/// Build a transcript object pointing back at its study.
pub fn transcript(
    record: &TranscriptRecord,
    study_name: &str,
    study: Uuid,
    beacons: &BeaconBase,
) -> (Value, Uuid) {
    let id = identity::transcript_id(study_name, &record.transcript_id);
    let properties = json!({
        "transcriptId": record.transcript_id,
        "transcriptDate": record.transcript_date,
        (schema::IN_STUDY): [{ "beacon": beacons.object(study) }],
    });
    (properties, id)
}

/// Build one object per nugget of a transcript.
///
/// Nugget ids are `<transcriptId>_<n>` with `n` counting from 1 in input
/// order. The input `order` field is stored as data and plays no part in
/// id assignment.
pub fn nuggets(
    record: &TranscriptRecord,
    study_name: &str,
    transcript: Uuid,
    beacons: &BeaconBase,
) -> Vec<(Value, Uuid)> {
    record
        .nuggets
        .iter()
        .enumerate()
        .map(|(index, nugget)| {
            let nugget_id = format!("{}_{}", record.transcript_id, index + 1);
            let id = identity::nugget_id(study_name, &record.transcript_id, &nugget_id);
            let properties = json!({
                "nuggetId": nugget_id,
                "question": nugget.question,
                "answer": nugget.answer,
                "order": nugget.order,
                "codes": nugget.codes,
                (schema::IN_TRANSCRIPT): [{ "beacon": beacons.object(transcript) }],
            });
            (properties, id)
        })
        .collect()
}
