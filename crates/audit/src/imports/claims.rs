use kumiai_core::{ClaimRow, ClaimType, YearMonth};
use kumiai_import::{
    chunk_fixed, clean_lines, parse_yen, validate_no_total_row, validate_numeric_column,
};
use kumiai_storage::{upsert_claim_rows, DbPool};
use serde_json::{json, Value};

use super::{base_context, frozen_gate, try_validate, ImportMode, ImportOutcome};
use crate::AuditError;

/// Claim rows paste as three lines: payer (unit), detail, amount.
const RECORD_WIDTH: usize = 3;
const AMOUNT_COLUMN: usize = 2;

/// Imports the month's receivables or prepayments claims, per
/// `claim_type`.
pub async fn import_claims(
    pool: &DbPool,
    raw: &str,
    ym: YearMonth,
    claim_type: ClaimType,
    mode: ImportMode,
) -> Result<ImportOutcome, AuditError> {
    if let Some(outcome) = frozen_gate(pool, ym).await? {
        return Ok(outcome);
    }

    let lines = clean_lines(raw);
    try_validate!(validate_no_total_row(&lines), ym);
    let records = chunk_fixed(&lines, RECORD_WIDTH);
    try_validate!(validate_numeric_column(&records, AMOUNT_COLUMN), ym);

    let mut rows = Vec::with_capacity(records.len());
    for record in &records {
        let amount = try_validate!(parse_yen(&record[AMOUNT_COLUMN]), ym);
        rows.push(ClaimRow {
            year: ym.year,
            month: ym.month,
            claim_type,
            payer: record[0].clone(),
            detail: Some(record[1].clone()).filter(|s| !s.is_empty()),
            amount,
        });
    }

    let total: i64 = rows.iter().map(|r| r.amount).sum();
    let mut context = base_context(ym);
    context.insert("claim_type".to_string(), json!(claim_type.as_str()));
    context.insert("total".to_string(), json!(total));
    context.insert(
        "rows".to_string(),
        json!(rows
            .iter()
            .map(|r| json!({ "payer": r.payer, "amount": r.amount }))
            .collect::<Vec<Value>>()),
    );

    match mode {
        ImportMode::Confirm => Ok(ImportOutcome {
            success: true,
            context: Value::Object(context),
            errors: Vec::new(),
        }),
        ImportMode::Register => {
            let batch = upsert_claim_rows(pool, rows).await;
            tracing::info!(
                "claims {ym} ({}): {} rows registered, {} failed",
                claim_type,
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
