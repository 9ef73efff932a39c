//! Date context parsing and per-row date inference.
//!
//! An upload filename of form `YYYY.MM.pdf` carries the year-month the menu
//! belongs to. Rows coming back from the generative service often lack an
//! explicit date; [`infer_dates`] fills those in sequentially within that
//! month.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::schema::ExtractedRow;

static FILENAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}\.(0[1-9]|1[0-2])\.pdf$").unwrap());

static ISO_DATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

/// Year-month derived from an upload filename. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateContext {
    pub year: i32,
    /// 1-12, guaranteed by the filename pattern.
    pub month: u32,
}

impl DateContext {
    /// Parse `YYYY.MM.pdf` into a context. A non-matching filename yields
    /// `None`, not an error: downstream falls back to leaving dates null.
    pub fn from_filename(filename: &str) -> Option<Self> {
        if !FILENAME_RE.is_match(filename) {
            return None;
        }
        let year = filename[0..4].parse().ok()?;
        let month = filename[5..7].parse().ok()?;
        Some(Self { year, month })
    }
}

/// Whether a filename matches the required `YYYY.MM.pdf` upload pattern.
pub fn filename_matches(filename: &str) -> bool {
    FILENAME_RE.is_match(filename)
}

/// Fill in missing per-row dates from the filename's year-month.
///
/// A day counter starts at 1 and is threaded through the fold in input order:
///
/// - an explicit `date` matching `YYYY-MM-DD` is kept verbatim, without
///   cross-validation against the context (an out-of-month explicit date is
///   accepted as given);
/// - otherwise, with a context, the counter's day is assigned after a real
///   calendar check (`2025-02-30` is never produced); the counter only
///   advances on a successful assignment, keeping inferred dates
///   monotonically non-decreasing and gap-tolerant on failure;
/// - otherwise the date stays unset and a row-level error is recorded.
///
/// Pure function of `(rows, ctx)`: re-running it on the same input yields
/// identical assignments.
pub fn infer_dates(
    rows: Vec<ExtractedRow>,
    ctx: Option<&DateContext>,
) -> (Vec<ExtractedRow>, Vec<String>) {
    let mut out = Vec::with_capacity(rows.len());
    let mut errors = Vec::new();
    let mut day: u32 = 1;

    for mut row in rows {
        let explicit = row
            .date
            .as_deref()
            .map(|d| ISO_DATE_RE.is_match(d))
            .unwrap_or(false);

        if !explicit {
            match ctx {
                Some(ctx) if NaiveDate::from_ymd_opt(ctx.year, ctx.month, day).is_some() => {
                    row.date = Some(format!("{:04}-{:02}-{:02}", ctx.year, ctx.month, day));
                    day += 1;
                }
                Some(ctx) => {
                    row.date = None;
                    errors.push(format!(
                        "No valid date for item '{}': day {} does not exist in {:04}-{:02}",
                        describe(&row),
                        day,
                        ctx.year,
                        ctx.month
                    ));
                }
                None => {
                    row.date = None;
                    errors.push(format!(
                        "No date for item '{}' and no year-month context from the filename",
                        describe(&row)
                    ));
                }
            }
        }

        out.push(row);
    }

    (out, errors)
}

fn describe(row: &ExtractedRow) -> &str {
    row.name.as_deref().unwrap_or("<unnamed>")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, date: Option<&str>) -> ExtractedRow {
        ExtractedRow {
            name: Some(name.to_string()),
            price: Some(650.0),
            date: date.map(str::to_string),
            tag: None,
        }
    }

    #[test]
    fn test_filename_pattern() {
        assert!(filename_matches("2025.06.pdf"));
        assert!(filename_matches("1999.12.pdf"));
        assert!(!filename_matches("2025-06.pdf"));
        assert!(!filename_matches("25.6.pdf"));
        assert!(!filename_matches("2025.13.pdf"));
        assert!(!filename_matches("2025.00.pdf"));
        assert!(!filename_matches("2025.06.pdf.exe"));
    }

    #[test]
    fn test_context_from_filename() {
        let ctx = DateContext::from_filename("2025.06.pdf").unwrap();
        assert_eq!(ctx.year, 2025);
        assert_eq!(ctx.month, 6);
        assert_eq!(DateContext::from_filename("menu.pdf"), None);
    }

    #[test]
    fn test_sequential_assignment_keeps_explicit_dates() {
        let ctx = DateContext {
            year: 2025,
            month: 6,
        };
        let rows = vec![row("Curry", None), row("Set A", Some("2025-06-15"))];
        let (rows, errors) = infer_dates(rows, Some(&ctx));

        assert_eq!(rows[0].date.as_deref(), Some("2025-06-01"));
        assert_eq!(rows[1].date.as_deref(), Some("2025-06-15"));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_explicit_date_outside_month_kept_verbatim() {
        let ctx = DateContext {
            year: 2025,
            month: 6,
        };
        let rows = vec![row("Set B", Some("2025-07-02"))];
        let (rows, errors) = infer_dates(rows, Some(&ctx));
        assert_eq!(rows[0].date.as_deref(), Some("2025-07-02"));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_non_iso_explicit_date_falls_back_to_inference() {
        let ctx = DateContext {
            year: 2025,
            month: 6,
        };
        let rows = vec![row("Curry", Some("June 5th"))];
        let (rows, errors) = infer_dates(rows, Some(&ctx));
        assert_eq!(rows[0].date.as_deref(), Some("2025-06-01"));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_counter_past_month_end_records_error() {
        let ctx = DateContext {
            year: 2025,
            month: 6,
        };
        let rows: Vec<_> = (0..31).map(|i| row(&format!("item{i}"), None)).collect();
        let (rows, errors) = infer_dates(rows, Some(&ctx));

        assert_eq!(rows[29].date.as_deref(), Some("2025-06-30"));
        assert_eq!(rows[30].date, None);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("day 31"));
    }

    #[test]
    fn test_never_produces_invalid_february_dates() {
        let ctx = DateContext {
            year: 2025,
            month: 2,
        };
        let rows: Vec<_> = (0..30).map(|i| row(&format!("item{i}"), None)).collect();
        let (rows, errors) = infer_dates(rows, Some(&ctx));

        assert_eq!(rows[27].date.as_deref(), Some("2025-02-28"));
        assert_eq!(rows[28].date, None);
        assert_eq!(rows[29].date, None);
        assert_eq!(errors.len(), 2);
        assert!(rows.iter().all(|r| r.date.as_deref() != Some("2025-02-29")
            && r.date.as_deref() != Some("2025-02-30")));
    }

    #[test]
    fn test_no_context_records_error_per_dateless_row() {
        let rows = vec![row("Curry", None), row("Set A", Some("2025-06-15"))];
        let (rows, errors) = infer_dates(rows, None);
        assert_eq!(rows[0].date, None);
        assert_eq!(rows[1].date.as_deref(), Some("2025-06-15"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_inference_is_idempotent() {
        let ctx = DateContext {
            year: 2025,
            month: 6,
        };
        let rows: Vec<_> = (0..5).map(|i| row(&format!("item{i}"), None)).collect();
        let (first, _) = infer_dates(rows.clone(), Some(&ctx));
        let (second, _) = infer_dates(rows, Some(&ctx));
        assert_eq!(first, second);
    }
}
