use kumiai_core::{PassbookRow, YearMonth};
use kumiai_import::{
    chunk_by_sentinel, clean_lines, parse_yen, validate_no_total_row, ImportError,
};
use kumiai_storage::{upsert_passbook_rows, DbPool};
use serde_json::{json, Value};

use super::{base_context, frozen_gate, resolve_date, try_validate, ImportMode, ImportOutcome};
use crate::AuditError;

/// Passbook direction sentinels as the bank's web export prints them.
pub const DEPOSIT_MARKER: &str = "お預入れ";
pub const WITHDRAWAL_MARKER: &str = "お引出し";

/// Counterparts carrying this fragment are fees deducted at source and
/// are flagged as netting rows.
const NETTING_FRAGMENT: &str = "手数料";

/// A record needs at least: sentinel, MM/DD, amount, counterpart.
const MIN_FIELDS: usize = 4;

/// Imports a pasted passbook range. Records are bounded by the
/// deposit/withdrawal sentinels rather than a fixed width, because the
/// bank export pads some rows with a running balance and some not.
pub async fn import_passbook(
    pool: &DbPool,
    raw: &str,
    ym: YearMonth,
    mode: ImportMode,
) -> Result<ImportOutcome, AuditError> {
    if let Some(outcome) = frozen_gate(pool, ym).await? {
        return Ok(outcome);
    }

    let lines = clean_lines(raw);
    try_validate!(validate_no_total_row(&lines), ym);
    let records = try_validate!(
        chunk_by_sentinel(&lines, &[DEPOSIT_MARKER, WITHDRAWAL_MARKER]),
        ym
    );

    let mut rows = Vec::with_capacity(records.len());
    for record in &records {
        if record.len() < MIN_FIELDS {
            let err = ImportError::ShortRecord { expected: MIN_FIELDS, actual: record.len() };
            return Ok(ImportOutcome::rejected(ym, err.to_string()));
        }
        let is_income = record[0] == DEPOSIT_MARKER;
        let date = try_validate!(resolve_date(ym, &record[1]), ym);
        let amount = try_validate!(parse_yen(&record[2]), ym);
        let counterpart = record[3].clone();
        let memo = (record.len() > MIN_FIELDS).then(|| record[MIN_FIELDS..].join(" "));
        rows.push(PassbookRow {
            date,
            amount,
            is_netting: is_income && counterpart.contains(NETTING_FRAGMENT),
            // Withdrawals require board approval until the exemption
            // scan clears them.
            needs_approval: !is_income,
            is_manualinput: false,
            is_income,
            counterpart,
            memo,
        });
    }

    let deposit_total: i64 = rows.iter().filter(|r| r.is_income).map(|r| r.amount).sum();
    let withdrawal_total: i64 = rows.iter().filter(|r| !r.is_income).map(|r| r.amount).sum();
    let mut context = base_context(ym);
    context.insert("total".to_string(), json!(deposit_total + withdrawal_total));
    context.insert("deposit_total".to_string(), json!(deposit_total));
    context.insert("withdrawal_total".to_string(), json!(withdrawal_total));
    context.insert(
        "rows".to_string(),
        json!(rows
            .iter()
            .map(|r| json!({
                "date": r.date.to_string(),
                "amount": r.amount,
                "counterpart": r.counterpart,
                "is_income": r.is_income,
            }))
            .collect::<Vec<Value>>()),
    );

    match mode {
        ImportMode::Confirm => Ok(ImportOutcome {
            success: true,
            context: Value::Object(context),
            errors: Vec::new(),
        }),
        ImportMode::Register => {
            let batch = upsert_passbook_rows(pool, rows).await;
            tracing::info!(
                "passbook {ym}: {} rows registered, {} failed",
                batch.succeeded.len(),
                batch.failed.len()
            );
            context.insert("registered".to_string(), json!(batch.succeeded.len()));
            Ok(ImportOutcome {
                success: batch.is_ok(),
                context: Value::Object(context),
                errors: batch.error_messages(),
            })
        }
    }
}
