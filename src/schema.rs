//! Graph schema definition.
//!
//! Four entity classes: studies, participants, transcripts, and nuggets
//! (question/answer fragments). Only `Nugget.answer` is embedded for
//! semantic search; everything else is structured data with an inverted
//! index.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;
use crate::store::GraphStore;

/// Class names in the store schema.
pub const STUDY_CLASS: &str = "Study";
pub const PAL_CLASS: &str = "Pal";
pub const TRANSCRIPT_CLASS: &str = "Transcript";
pub const NUGGET_CLASS: &str = "Nugget";

/// Reference property names.
pub const HAS_PALS: &str = "hasPals";
pub const HAS_TRANSCRIPTS: &str = "hasTranscripts";
pub const HAS_NUGGETS: &str = "hasNuggets";
pub const IN_STUDY: &str = "inStudy";
pub const IN_TRANSCRIPT: &str = "inTranscript";

const VECTORIZER_NONE: &str = "none";
const VECTORIZER_CONTEXTIONARY: &str = "text2vec-contextionary";

/// A class definition in the store's schema format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSpec {
    pub class: String,
    pub description: String,
    pub vectorizer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector_index_config: Option<VectorIndexConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_config: Option<ClassModuleConfig>,
    pub properties: Vec<PropertySpec>,
}

/// A property definition in the store's schema format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySpec {
    pub name: String,
    pub data_type: Vec<String>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_inverted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_config: Option<PropertyModuleConfig>,
}

/// Vector index settings for a class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndexConfig {
    pub skip: bool,
}

/// Vectorizer module settings for a class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassModuleConfig {
    #[serde(rename = "text2vec-contextionary")]
    pub contextionary: ContextionaryClassConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextionaryClassConfig {
    pub vectorize_class_name: bool,
}

/// Vectorizer module settings for a property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyModuleConfig {
    #[serde(rename = "text2vec-contextionary")]
    pub contextionary: ContextionaryPropertyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextionaryPropertyConfig {
    pub skip: bool,
    pub vectorize_property_name: bool,
}

impl PropertyModuleConfig {
    /// Property text flows into the class vector.
    fn embedded() -> Self {
        Self {
            contextionary: ContextionaryPropertyConfig {
                skip: false,
                vectorize_property_name: false,
            },
        }
    }

    /// Property is excluded from embedding.
    fn skipped() -> Self {
        Self {
            contextionary: ContextionaryPropertyConfig {
                skip: true,
                vectorize_property_name: false,
            },
        }
    }
}

impl PropertySpec {
    /// A scalar property with an inverted index.
    fn scalar(name: &str, data_type: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            data_type: vec![data_type.to_string()],
            description: description.to_string(),
            index_inverted: Some(true),
            module_config: None,
        }
    }

    /// A cross-reference property targeting another class.
    fn reference(name: &str, target: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            data_type: vec![target.to_string()],
            description: description.to_string(),
            index_inverted: Some(true),
            module_config: None,
        }
    }

    /// Whether this property targets another class.
    ///
    /// Store convention: primitive data types are lowercase, class targets
    /// are capitalized.
    pub fn is_reference(&self) -> bool {
        self.data_type
            .first()
            .map(|t| t.starts_with(char::is_uppercase))
            .unwrap_or(false)
    }
}

impl ClassSpec {
    /// Copy of this class holding only its scalar properties.
    pub fn scalar_only(&self) -> ClassSpec {
        let mut spec = self.clone();
        spec.properties.retain(|p| !p.is_reference());
        spec
    }
}

/// The four entity classes.
pub fn classes() -> Vec<ClassSpec> {
    vec![study(), pal(), transcript(), nugget()]
}

/// Reset the store and define the entity classes.
///
/// Classes are created with their scalar properties first; reference
/// properties are added afterwards. Study and Pal reference each other, so
/// no creation order could satisfy a single-phase definition.
pub async fn define(store: &dyn GraphStore) -> Result<()> {
    store.reset_schema().await?;
    info!("Schema reset");

    let specs = classes();
    for spec in &specs {
        store.define_class(&spec.scalar_only()).await?;
        debug!(class = %spec.class, "Class created");
    }

    for spec in &specs {
        for property in spec.properties.iter().filter(|p| p.is_reference()) {
            store.add_property(&spec.class, property).await?;
        }
    }

    info!(classes = specs.len(), "Schema defined");
    Ok(())
}

fn study() -> ClassSpec {
    ClassSpec {
        class: STUDY_CLASS.to_string(),
        description: "A research study".to_string(),
        vectorizer: VECTORIZER_NONE.to_string(),
        vector_index_config: Some(VectorIndexConfig { skip: true }),
        module_config: None,
        properties: vec![
            PropertySpec::scalar("studyId", "string", "Id of the study"),
            PropertySpec::scalar("studyName", "string", "Name of the study"),
            PropertySpec::scalar("studyDescription", "string", "Description of the study"),
            PropertySpec::scalar("tags", "string[]", "Tags of the study"),
            PropertySpec::scalar("interestAreas", "string[]", "Interest areas of the study"),
            PropertySpec::reference(HAS_TRANSCRIPTS, TRANSCRIPT_CLASS, "Transcripts of the study"),
            PropertySpec::reference(HAS_PALS, PAL_CLASS, "Participants of the study"),
        ],
    }
}

fn pal() -> ClassSpec {
    ClassSpec {
        class: PAL_CLASS.to_string(),
        description: "A study participant".to_string(),
        vectorizer: VECTORIZER_NONE.to_string(),
        vector_index_config: Some(VectorIndexConfig { skip: true }),
        module_config: None,
        properties: vec![
            PropertySpec::scalar("palId", "string", "Id of the pal"),
            PropertySpec::scalar("palName", "string", "Name of the pal"),
            PropertySpec::scalar("palEmail", "string", "Email of the pal"),
            PropertySpec::scalar("palNumber", "string", "Phone number of the pal"),
            PropertySpec::scalar("palAge", "string", "Age of the pal"),
            PropertySpec::scalar("palGender", "string", "Gender of the pal"),
            PropertySpec::scalar("palDOB", "string", "Date of birth of the pal"),
            PropertySpec::scalar("hourlyPricing", "string", "Hourly pricing of the pal"),
            PropertySpec::reference(IN_STUDY, STUDY_CLASS, "Study the pal belongs to"),
            PropertySpec::reference(IN_TRANSCRIPT, TRANSCRIPT_CLASS, "Transcripts the pal appears in"),
        ],
    }
}

fn transcript() -> ClassSpec {
    ClassSpec {
        class: TRANSCRIPT_CLASS.to_string(),
        description: "An interview transcript".to_string(),
        vectorizer: VECTORIZER_NONE.to_string(),
        vector_index_config: Some(VectorIndexConfig { skip: true }),
        module_config: None,
        properties: vec![
            PropertySpec::scalar("transcriptId", "string", "Id of the transcript"),
            PropertySpec::scalar("transcriptDate", "string", "Date of the transcript"),
            PropertySpec::reference(IN_STUDY, STUDY_CLASS, "Study the transcript belongs to"),
            PropertySpec::reference(HAS_NUGGETS, NUGGET_CLASS, "Nuggets of the transcript"),
            PropertySpec::reference(HAS_PALS, PAL_CLASS, "Participants in the transcript"),
        ],
    }
}

fn nugget() -> ClassSpec {
    ClassSpec {
        class: NUGGET_CLASS.to_string(),
        description: "A question/answer fragment from a transcript".to_string(),
        vectorizer: VECTORIZER_CONTEXTIONARY.to_string(),
        vector_index_config: None,
        module_config: Some(ClassModuleConfig {
            contextionary: ContextionaryClassConfig {
                vectorize_class_name: true,
            },
        }),
        properties: vec![
            PropertySpec {
                name: "nuggetId".to_string(),
                data_type: vec!["string".to_string()],
                description: "Id of the nugget within its transcript".to_string(),
                index_inverted: Some(false),
                module_config: Some(PropertyModuleConfig::skipped()),
            },
            PropertySpec {
                name: "question".to_string(),
                data_type: vec!["string".to_string()],
                description: "Question that was asked".to_string(),
                index_inverted: Some(false),
                module_config: Some(PropertyModuleConfig::skipped()),
            },
            PropertySpec {
                name: "answer".to_string(),
                data_type: vec!["text".to_string()],
                description: "Answer that was given".to_string(),
                index_inverted: Some(false),
                module_config: Some(PropertyModuleConfig::embedded()),
            },
            PropertySpec {
                name: "codes".to_string(),
                data_type: vec!["string[]".to_string()],
                description: "Codes assigned to the nugget".to_string(),
                index_inverted: Some(false),
                module_config: Some(PropertyModuleConfig::skipped()),
            },
            PropertySpec {
                name: "order".to_string(),
                data_type: vec!["int".to_string()],
                description: "Position of the nugget in the source export".to_string(),
                index_inverted: Some(true),
                module_config: Some(PropertyModuleConfig::skipped()),
            },
            PropertySpec {
                name: IN_TRANSCRIPT.to_string(),
                data_type: vec![TRANSCRIPT_CLASS.to_string()],
                description: "Transcript the nugget is from".to_string(),
                index_inverted: None,
                module_config: Some(PropertyModuleConfig::skipped()),
            },
        ],
    }
}
