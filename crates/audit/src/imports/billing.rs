use kumiai_core::{BillingRow, YearMonth};
use kumiai_import::{
    chunk_fixed, clean_lines, parse_yen, validate_no_total_row, validate_numeric_column,
};
use kumiai_storage::{upsert_billing_rows, DbPool};
use serde_json::{json, Value};

use super::{base_context, frozen_gate, try_validate, ImportMode, ImportOutcome};
use crate::AuditError;

/// Billing-summary rows paste as two lines: item name, amount.
const RECORD_WIDTH: usize = 2;

/// Imports the month's billing summary (what owners were invoiced),
/// later reconciled against the report's income side.
pub async fn import_billing(
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
    let records = chunk_fixed(&lines, RECORD_WIDTH);
    try_validate!(validate_numeric_column(&records, 1), ym);

    let mut rows = Vec::with_capacity(records.len());
    for record in &records {
        let amount = try_validate!(parse_yen(&record[1]), ym);
        rows.push(BillingRow {
            year: ym.year,
            month: ym.month,
            name: record[0].clone(),
            amount,
        });
    }

    let total: i64 = rows.iter().map(|r| r.amount).sum();
    let mut context = base_context(ym);
    context.insert("total".to_string(), json!(total));
    context.insert(
        "rows".to_string(),
        json!(rows
            .iter()
            .map(|r| json!({ "name": r.name, "amount": r.amount }))
            .collect::<Vec<Value>>()),
    );

    match mode {
        ImportMode::Confirm => Ok(ImportOutcome {
            success: true,
            context: Value::Object(context),
            errors: Vec::new(),
        }),
        ImportMode::Register => {
            let batch = upsert_billing_rows(pool, rows).await;
            tracing::info!(
                "billing summary {ym}: {} rows registered, {} failed",
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
