//! Input records for the import pipeline.
//!
//! One input line is a JSON array of studies in the camelCase wire format.
//! Unknown fields are ignored; absent lists deserialize as empty.

use serde::Deserialize;

/// One study with its participants and transcripts.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyRecord {
    pub study_id: String,
    pub study_name: String,
    pub study_description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub interest_areas: Vec<String>,
    #[serde(default)]
    pub study_pals: Vec<PalRecord>,
    #[serde(default)]
    pub study_transcripts: Vec<TranscriptRecord>,
}

/// A study participant.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PalRecord {
    pub pal_id: String,
    pub pal_name: String,
    pub pal_email: String,
    pub pal_number: String,
    pub pal_age: String,
    pub pal_gender: String,
    #[serde(rename = "palDOB")]
    pub pal_dob: String,
    pub hourly_pricing: String,
}

/// An interview transcript.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptRecord {
    pub transcript_id: String,
    pub transcript_date: String,
    #[serde(default)]
    pub nuggets: Vec<NuggetRecord>,
    #[serde(default)]
    pub pals: Vec<PalStub>,
}

/// A question/answer fragment within a transcript.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NuggetRecord {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub codes: Vec<String>,
    pub order: i64,
}

/// Participant mention inside a transcript. Only the id is consumed; the
/// full record lives in the study's participant list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PalStub {
    pub pal_id: String,
}
