//! Line-by-line import pipeline.
//!
//! Each input line holds one JSON array of study records. Lines are
//! independent failure domains: a malformed or partially written line is
//! reported and the importer moves on. Within a line, parents are written
//! before anything that references them, and the line's queued writes are
//! flushed objects first, references second.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::builders;
use crate::config::WriteMode;
use crate::error::Result;
use crate::identity;
use crate::model::{StudyRecord, TranscriptRecord};
use crate::report;
use crate::schema;
use crate::store::{BeaconBase, GraphStore, WriteBatch};

/// Imports study records into the graph store.
pub struct Importer {
    store: Arc<dyn GraphStore>,
    write_mode: WriteMode,
    beacons: BeaconBase,
}

/// Outcome of a whole import run.
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub lines: Vec<LineReport>,
    pub totals: LineStats,
}

impl ImportSummary {
    pub fn succeeded(&self) -> usize {
        self.count(|s| matches!(s, LineStatus::Success))
    }

    pub fn partial(&self) -> usize {
        self.count(|s| matches!(s, LineStatus::Partial { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, LineStatus::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&LineStatus) -> bool) -> usize {
        self.lines.iter().filter(|l| pred(&l.status)).count()
    }
}

/// Outcome of one input line.
#[derive(Debug, Clone, Serialize)]
pub struct LineReport {
    pub line: usize,
    #[serde(flatten)]
    pub status: LineStatus,
    pub stats: LineStats,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LineStatus {
    /// Every write for the line was accepted.
    Success,
    /// Some writes were accepted before the line failed.
    Partial { error: String },
    /// Nothing from the line was written.
    Failed { error: String },
}

/// Writes submitted while processing one line.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct LineStats {
    pub studies: usize,
    pub pals: usize,
    pub transcripts: usize,
    pub nuggets: usize,
    pub references: usize,
    pub missing_pals: usize,
}

impl LineStats {
    pub fn add(&mut self, other: &LineStats) {
        self.studies += other.studies;
        self.pals += other.pals;
        self.transcripts += other.transcripts;
        self.nuggets += other.nuggets;
        self.references += other.references;
        self.missing_pals += other.missing_pals;
    }

    /// Objects submitted, across all classes.
    pub fn objects(&self) -> usize {
        self.studies + self.pals + self.transcripts + self.nuggets
    }
}

impl Importer {
    pub fn new(store: Arc<dyn GraphStore>, write_mode: WriteMode, beacons: BeaconBase) -> Self {
        Self {
            store,
            write_mode,
            beacons,
        }
    }

    /// Import a newline-delimited file of study record arrays.
    pub async fn import_file<P: AsRef<Path>>(&self, path: P) -> Result<ImportSummary> {
        let file = tokio::fs::File::open(path.as_ref()).await?;
        info!("Importing from {}", path.as_ref().display());
        self.import_lines(BufReader::new(file)).await
    }

    /// Import from any buffered line source.
    pub async fn import_lines<R>(&self, reader: R) -> Result<ImportSummary>
    where
        R: AsyncBufRead + Unpin,
    {
        let started_at = Utc::now();
        let clock = Instant::now();
        let mut reports = Vec::new();
        let mut totals = LineStats::default();

        let mut lines = reader.lines();
        let mut line_no = 0usize;
        while let Some(line) = lines.next_line().await? {
            line_no += 1;
            if line.trim().is_empty() {
                continue;
            }

            let report = self.import_line(line_no, &line).await;
            match &report.status {
                LineStatus::Success => {
                    debug!(line = line_no, objects = report.stats.objects(), "Line imported")
                }
                LineStatus::Partial { error } => {
                    warn!(line = line_no, error = %error, "Line partially imported")
                }
                LineStatus::Failed { error } => {
                    warn!(line = line_no, error = %error, "Line failed")
                }
            }
            totals.add(&report.stats);
            reports.push(report);
        }

        let summary = ImportSummary {
            started_at,
            duration_ms: clock.elapsed().as_millis() as u64,
            lines: reports,
            totals,
        };
        info!(
            lines = summary.lines.len(),
            succeeded = summary.succeeded(),
            partial = summary.partial(),
            failed = summary.failed(),
            objects = summary.totals.objects(),
            references = summary.totals.references,
            "Import complete"
        );
        Ok(summary)
    }

    async fn import_line(&self, line_no: usize, line: &str) -> LineReport {
        let mut stats = LineStats::default();
        let status = match self.process_line(line, &mut stats).await {
            Ok(0) => LineStatus::Success,
            Ok(failed_items) => LineStatus::Partial {
                error: format!("{} batch items failed", failed_items),
            },
            Err(e) if stats.objects() > 0 || stats.references > 0 => LineStatus::Partial {
                error: e.to_string(),
            },
            Err(e) => LineStatus::Failed {
                error: e.to_string(),
            },
        };
        LineReport {
            line: line_no,
            status,
            stats,
        }
    }

    /// Process one line, returning the number of failed batch items.
    async fn process_line(&self, line: &str, stats: &mut LineStats) -> Result<usize> {
        let records: Vec<StudyRecord> = serde_json::from_str(line)?;

        let mut batch = WriteBatch::new();
        for record in &records {
            self.import_study(record, &mut batch, stats).await?;
        }

        if batch.is_empty() {
            return Ok(0);
        }
        let results = self.store.flush_batch(batch).await?;
        Ok(report::log_batch_errors(&results))
    }

    /// Write one study and everything hanging off it.
    async fn import_study(
        &self,
        record: &StudyRecord,
        batch: &mut WriteBatch,
        stats: &mut LineStats,
    ) -> Result<()> {
        let (properties, study) = builders::study(record);
        self.store
            .create_object(schema::STUDY_CLASS, study, properties)
            .await?;
        stats.studies += 1;
        debug!(study = %record.study_name, id = %study, "Study created");

        for pal_record in &record.study_pals {
            let (properties, pal) =
                builders::pal(pal_record, &record.study_name, study, &self.beacons);
            self.store
                .create_object(schema::PAL_CLASS, pal, properties)
                .await?;
            stats.pals += 1;
            self.write_reference(batch, schema::STUDY_CLASS, study, schema::HAS_PALS, pal)
                .await?;
            stats.references += 1;
        }

        for transcript_record in &record.study_transcripts {
            let (properties, transcript) =
                builders::transcript(transcript_record, &record.study_name, study, &self.beacons);
            self.store
                .create_object(schema::TRANSCRIPT_CLASS, transcript, properties)
                .await?;
            stats.transcripts += 1;
            self.write_reference(
                batch,
                schema::STUDY_CLASS,
                study,
                schema::HAS_TRANSCRIPTS,
                transcript,
            )
            .await?;
            stats.references += 1;

            for (properties, nugget) in
                builders::nuggets(transcript_record, &record.study_name, transcript, &self.beacons)
            {
                self.write_object(batch, schema::NUGGET_CLASS, nugget, properties)
                    .await?;
                stats.nuggets += 1;
                self.write_reference(
                    batch,
                    schema::TRANSCRIPT_CLASS,
                    transcript,
                    schema::HAS_NUGGETS,
                    nugget,
                )
                .await?;
                stats.references += 1;
            }

            self.link_pals(transcript_record, &record.study_name, transcript, stats)
                .await?;
        }

        Ok(())
    }

    /// Link a transcript to the pals that appear in it. A pal id that does
    /// not resolve to a stored object is counted and skipped.
    async fn link_pals(
        &self,
        record: &TranscriptRecord,
        study_name: &str,
        transcript: Uuid,
        stats: &mut LineStats,
    ) -> Result<()> {
        for stub in &record.pals {
            let pal = identity::pal_id(study_name, &stub.pal_id);
            match self.store.get_object(pal).await? {
                Some(_) => {
                    self.store
                        .add_reference(schema::PAL_CLASS, pal, schema::IN_TRANSCRIPT, transcript)
                        .await?;
                    self.store
                        .add_reference(
                            schema::TRANSCRIPT_CLASS,
                            transcript,
                            schema::HAS_PALS,
                            pal,
                        )
                        .await?;
                    stats.references += 2;
                }
                None => {
                    debug!(
                        pal = %stub.pal_id,
                        transcript = %record.transcript_id,
                        "Pal not found, skipping transcript link"
                    );
                    stats.missing_pals += 1;
                }
            }
        }
        Ok(())
    }

    async fn write_object(
        &self,
        batch: &mut WriteBatch,
        class: &str,
        id: Uuid,
        properties: Value,
    ) -> Result<()> {
        match self.write_mode {
            WriteMode::Batched => batch.add_object(class, id, properties),
            WriteMode::Immediate => self.store.create_object(class, id, properties).await?,
        }
        Ok(())
    }

    async fn write_reference(
        &self,
        batch: &mut WriteBatch,
        from_class: &str,
        from_id: Uuid,
        relation: &str,
        to_id: Uuid,
    ) -> Result<()> {
        match self.write_mode {
            WriteMode::Batched => batch.add_reference(from_class, from_id, relation, to_id),
            WriteMode::Immediate => {
                self.store
                    .add_reference(from_class, from_id, relation, to_id)
                    .await?
            }
        }
        Ok(())
    }
}
