//! Reporting of per-item batch outcomes.

use tracing::warn;

use crate::store::BatchResults;

/// Log every failed batch item and return how many failed.
pub fn log_batch_errors(results: &BatchResults) -> usize {
    let mut failed = 0;
    for item in results.objects.iter().chain(results.references.iter()) {
        if item.is_ok() {
            continue;
        }
        failed += 1;
        for message in &item.errors {
            match item.id {
                Some(id) => warn!(id = %id, "Batch item failed: {}", message),
                None => warn!("Batch item failed: {}", message),
            }
        }
    }
    failed
}
