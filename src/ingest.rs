//! Menu ingestion: row validation and per-row persistence.
//!
//! The batch is never atomic. Each row is validated and inserted
//! independently; a failing row records one error and the fold moves on.
//! Partial success is the expected outcome and is reported precisely via
//! `insertedCount` and `errors`.

use tracing::{info, warn};

use crate::dates::{infer_dates, DateContext};
use crate::schema::{ExtractedRow, IngestionResult};
use crate::store::{MenuStore, NewMenuItem};

pub struct MenuIngestor<'a> {
    store: &'a dyn MenuStore,
}

enum RowOutcome {
    Inserted,
    /// Date inference already recorded this row's error; don't count it twice.
    SkippedUndated,
    Failed(String),
}

impl<'a> MenuIngestor<'a> {
    pub fn new(store: &'a dyn MenuStore) -> Self {
        Self { store }
    }

    /// Run date inference, then fold the rows into `(inserted, errors)`.
    ///
    /// `success` is true whenever the fold ran to completion, even with zero
    /// inserts; upstream failures (missing key, extraction, malformed service
    /// response) never reach this point. Every row that is not inserted
    /// contributes exactly one entry to `errors`.
    pub fn ingest(&self, rows: Vec<ExtractedRow>, ctx: Option<&DateContext>) -> IngestionResult {
        let total = rows.len();
        let (rows, mut errors) = infer_dates(rows, ctx);

        let inserted_count = rows.into_iter().fold(0u32, |inserted, row| {
            match self.process_row(row) {
                RowOutcome::Inserted => inserted + 1,
                RowOutcome::SkippedUndated => inserted,
                RowOutcome::Failed(msg) => {
                    warn!("{}", msg);
                    errors.push(msg);
                    inserted
                }
            }
        });

        info!(
            "Ingestion complete: {}/{} rows inserted, {} errors",
            inserted_count,
            total,
            errors.len()
        );

        IngestionResult {
            success: true,
            inserted_count,
            errors,
        }
    }

    fn process_row(&self, row: ExtractedRow) -> RowOutcome {
        let Some(available_date) = row.date else {
            return RowOutcome::SkippedUndated;
        };

        let name = match row.name {
            Some(n) if !n.trim().is_empty() => n,
            _ => return RowOutcome::Failed("Skipping item with missing name".to_string()),
        };

        let price = match row.price {
            Some(p) if p.is_finite() && p >= 0.0 && p.fract() == 0.0 => p as i64,
            Some(p) => {
                return RowOutcome::Failed(format!(
                    "Skipping item '{name}': price {p} is not a non-negative whole amount"
                ))
            }
            None => return RowOutcome::Failed(format!("Skipping item '{name}' with missing price")),
        };

        let item = NewMenuItem {
            name,
            price,
            available_date,
            tag: row.tag,
        };

        match self.store.insert_item(&item) {
            Ok(_) => RowOutcome::Inserted,
            Err(e) => RowOutcome::Failed(format!("Insert failed for item '{}': {e}", item.name)),
        }
    }
}
