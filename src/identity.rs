//! Deterministic identifier derivation.
//!
//! Every entity id is a name-based (v3) UUID over the DNS namespace, so the
//! same input maps to the same id on every run and a repeated import hits
//! the existing objects instead of growing a parallel graph.

use uuid::Uuid;

/// Normalize a study name into a key segment.
///
/// Spaces are replaced with underscores; study names are the only key part
/// that can contain them.
pub fn normalize(name: &str) -> String {
    name.replace(' ', "_")
}

/// Derive a name-based UUID from a composite key.
pub fn derive_id(key: &str) -> Uuid {
    Uuid::new_v3(&Uuid::NAMESPACE_DNS, key.as_bytes())
}

/// Id for a study, keyed by its normalized name.
pub fn study_id(study_name: &str) -> Uuid {
    derive_id(&normalize(study_name))
}

/// Id for a participant within a study.
pub fn pal_id(study_name: &str, pal: &str) -> Uuid {
    derive_id(&format!("{}{}", normalize(study_name), pal))
}

/// Id for a transcript within a study.
pub fn transcript_id(study_name: &str, transcript: &str) -> Uuid {
    derive_id(&format!("{}{}", normalize(study_name), transcript))
}

/// Id for an answer fragment within a transcript.
pub fn nugget_id(study_name: &str, transcript: &str, nugget: &str) -> Uuid {
    derive_id(&format!("{}{}{}", normalize(study_name), transcript, nugget))
}
