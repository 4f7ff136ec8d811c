//! Trellis: Research Interview Graph Importer
//!
//! Reads newline-delimited study records and writes them into a
//! schema-typed graph store with deterministic ids and typed
//! cross-references between studies, pals, transcripts and nuggets.

pub mod builders;
pub mod config;
pub mod error;
pub mod identity;
pub mod ingest;
pub mod model;
pub mod report;
pub mod schema;
pub mod store;

pub use config::{Config, StoreBackendType, WriteMode};
pub use error::{ConfigError, Result, StoreError, TrellisError};
pub use ingest::{ImportSummary, Importer, LineReport, LineStats, LineStatus};
pub use store::{create_store, BeaconBase, GraphStore, HttpStore, MemoryStore};
