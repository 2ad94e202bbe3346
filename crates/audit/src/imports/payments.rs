use kumiai_core::{PaymentRow, YearMonth};
use kumiai_import::{
    chunk_fixed, clean_lines, parse_yen, validate_no_total_row, validate_numeric_column,
};
use kumiai_storage::{upsert_payment_rows, DbPool};
use serde_json::{json, Value};

use super::{base_context, frozen_gate, resolve_date, try_validate, ImportMode, ImportOutcome};
use crate::AuditError;

/// Payment-approval rows paste as four lines: MM/DD, payee, subject, amount.
const RECORD_WIDTH: usize = 4;
const AMOUNT_COLUMN: usize = 3;

/// Imports the month's payment-approval list, the set of outgoings the
/// board resolved on. The approval check compares its total against the
/// passbook withdrawals still flagged for approval.
pub async fn import_payments(
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
    try_validate!(validate_numeric_column(&records, AMOUNT_COLUMN), ym);

    let mut rows = Vec::with_capacity(records.len());
    for record in &records {
        let date = try_validate!(resolve_date(ym, &record[0]), ym);
        let amount = try_validate!(parse_yen(&record[AMOUNT_COLUMN]), ym);
        rows.push(PaymentRow {
            date,
            payee: record[1].clone(),
            subject: record[2].clone(),
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
            .map(|r| json!({
                "date": r.date.to_string(),
                "payee": r.payee,
                "subject": r.subject,
                "amount": r.amount,
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
            let batch = upsert_payment_rows(pool, rows).await;
            tracing::info!(
                "payments {ym}: {} rows registered, {} failed",
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

#[cfg(test)]
mod tests {
    use super::*;
    use kumiai_core::Period;
    use kumiai_storage::{create_db, payment_row_count, sum_payments};

    async fn pool() -> (tempfile::TempDir, DbPool) {
        let dir = tempfile::tempdir().unwrap();
        let pool = create_db(&dir.path().join("audit.db")).await.unwrap();
        (dir, pool)
    }

    fn april() -> YearMonth {
        YearMonth::new(2025, 4).unwrap()
    }

    const APRIL_PAYMENTS: &str = "04/10\n設備点検\n消防点検費\n¥33,000\n\
                                  04/25\n清掃会社\n定期清掃費\n¥18,000\n";

    #[tokio::test]
    async fn registered_rows_feed_the_period_total() {
        let (_dir, pool) = pool().await;
        let outcome = import_payments(&pool, APRIL_PAYMENTS, april(), ImportMode::Register)
            .await
            .unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.context["total"], json!(51_000));

        let range = Period::Month(april()).bounds();
        assert_eq!(sum_payments(&pool, range).await.unwrap(), 51_000);
        assert_eq!(payment_row_count(&pool).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn confirm_writes_nothing() {
        let (_dir, pool) = pool().await;
        let outcome = import_payments(&pool, APRIL_PAYMENTS, april(), ImportMode::Confirm)
            .await
            .unwrap();
        assert!(outcome.success);
        assert_eq!(payment_row_count(&pool).await.unwrap(), 0);
    }
}
