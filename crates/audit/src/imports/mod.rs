//! One orchestrator per portal import type. All of them share the same
//! contract: frozen-period gate, normalize, chunk, validate (fail fast,
//! zero side effects), resolve himoku where needed, checksum total, then
//! either a confirmation preview or a natural-key registration whose
//! per-row failures never abort sibling rows.

pub mod balance_sheet;
pub mod billing;
pub mod claims;
pub mod monthly_report;
pub mod passbook;
pub mod payments;

use chrono::NaiveDate;
use kumiai_core::YearMonth;
use kumiai_import::ImportError;
use kumiai_storage::DbPool;
use serde_json::{json, Map, Value};

use crate::AuditError;

/// Exactly two modes; exhaustive matching everywhere so a new variant can
/// never silently fall through to registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    Confirm,
    Register,
}

/// What the presentation layer gets back. `context` always carries
/// `year` and `month`; on success it adds the preview/registration data.
#[derive(Debug)]
pub struct ImportOutcome {
    pub success: bool,
    pub context: Value,
    pub errors: Vec<String>,
}

impl ImportOutcome {
    pub(crate) fn rejected(ym: YearMonth, message: String) -> Self {
        ImportOutcome {
            success: false,
            context: Value::Object(base_context(ym)),
            errors: vec![message],
        }
    }
}

pub(crate) fn base_context(ym: YearMonth) -> Map<String, Value> {
    let mut context = Map::new();
    context.insert("year".to_string(), json!(ym.year));
    context.insert("month".to_string(), json!(ym.month));
    context
}

/// Imports against a closed fiscal period are rejected before anything
/// is parsed or written.
pub(crate) async fn frozen_gate(
    pool: &DbPool,
    ym: YearMonth,
) -> Result<Option<ImportOutcome>, AuditError> {
    if kumiai_storage::is_frozen(pool, ym).await? {
        tracing::warn!("import rejected: fiscal period {ym} is frozen");
        Ok(Some(ImportOutcome::rejected(
            ym,
            format!("{}年{}月は会計締め済みです (the books for {ym} are frozen)", ym.year, ym.month),
        )))
    } else {
        Ok(None)
    }
}

/// Combines the target period with a pasted MM/DD fragment. The portal
/// prints December movements on the January page without a year, so a
/// 12/xx fragment in a January import belongs to the prior year.
pub(crate) fn resolve_date(ym: YearMonth, fragment: &str) -> Result<NaiveDate, ImportError> {
    let invalid = || ImportError::InvalidDate(fragment.to_string());
    let (m, d) = fragment.split_once('/').ok_or_else(invalid)?;
    let month: u32 = m.trim().parse().map_err(|_| invalid())?;
    let day: u32 = d.trim().parse().map_err(|_| invalid())?;
    let year = if month == 12 && ym.month == 1 { ym.year - 1 } else { ym.year };
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

/// Validation gates: convert an `ImportError` into a rejection outcome,
/// returning early with no side effects.
macro_rules! try_validate {
    ($expr:expr, $ym:expr) => {
        match $expr {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("import rejected: {e}");
                return Ok($crate::imports::ImportOutcome::rejected($ym, e.to_string()));
            }
        }
    };
}
pub(crate) use try_validate;
