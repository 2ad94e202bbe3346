use kumiai_core::{AccountingClass, ReportRow, YearMonth};
use kumiai_import::{
    chunk_fixed, clean_lines, parse_yen, resolve_category, skip_header_block,
    validate_no_total_row, validate_numeric_column, validate_section_header, ImportError,
};
use kumiai_storage::{categories_for_class, default_category, upsert_report_rows, DbPool};
use serde_json::{json, Value};

use super::{base_context, frozen_gate, resolve_date, try_validate, ImportMode, ImportOutcome};
use crate::AuditError;

/// Section markers on the portal's monthly-report page.
pub const INCOME_MARKER: &str = "収入の部";
pub const EXPENSE_MARKER: &str = "支出の部";

/// Report rows paste as five lines: himoku, MM/DD, amount, detail, memo.
const RECORD_WIDTH: usize = 5;
const AMOUNT_COLUMN: usize = 2;

/// Imports one month of the management company's income or expense
/// report. The pasted range starts at the section marker and must stop
/// above the 合計 footer; the portal's column-header block between the
/// marker and the first record is skipped.
pub async fn import_monthly_report(
    pool: &DbPool,
    raw: &str,
    ym: YearMonth,
    class: AccountingClass,
    mode: ImportMode,
) -> Result<ImportOutcome, AuditError> {
    if let Some(outcome) = frozen_gate(pool, ym).await? {
        return Ok(outcome);
    }

    let lines = clean_lines(raw);
    let marker = try_validate!(
        validate_section_header(&lines, &[INCOME_MARKER, EXPENSE_MARKER]),
        ym
    );
    let is_income = marker == INCOME_MARKER;
    let marker = marker.to_string();

    let body = &lines[1..];
    try_validate!(validate_no_total_row(body), ym);

    let vocabulary = categories_for_class(pool, class, Some(is_income)).await?;
    let names: Vec<String> = vocabulary.iter().map(|c| c.name.clone()).collect();
    let body = try_validate!(skip_header_block(body, &names, class.name()), ym);
    let records = chunk_fixed(body, RECORD_WIDTH);
    try_validate!(validate_numeric_column(&records, AMOUNT_COLUMN), ym);

    let fallback = default_category(pool).await?;
    let mut rows = Vec::with_capacity(records.len());
    for record in &records {
        let himoku = match resolve_category(&record[0], &vocabulary, fallback.as_ref()) {
            Ok(category) => category,
            Err(ImportError::NoDefaultCategory) => {
                tracing::error!("no default himoku configured; cannot classify '{}'", record[0]);
                return Err(AuditError::NoDefaultCategory);
            }
            Err(e) => return Ok(ImportOutcome::rejected(ym, e.to_string())),
        };
        let himoku_id = himoku.id.ok_or_else(|| {
            kumiai_storage::StorageError::Corrupt(format!("himoku '{}' has no id", himoku.name))
        })?;
        let date = try_validate!(resolve_date(ym, &record[1]), ym);
        let amount = try_validate!(parse_yen(&record[AMOUNT_COLUMN]), ym);
        rows.push(ReportRow {
            date,
            himoku: himoku_id,
            himoku_name: himoku.name.clone(),
            amount,
            is_income,
            calc_flg: true,
            detail: Some(record[3].clone()).filter(|s| !s.is_empty()),
            memo: Some(record[4].clone()).filter(|s| !s.is_empty()),
        });
    }

    let total: i64 = rows.iter().map(|r| r.amount).sum();
    let mut context = base_context(ym);
    context.insert("class".to_string(), json!(class.name()));
    context.insert("section".to_string(), json!(marker));
    context.insert("total".to_string(), json!(total));
    context.insert(
        "rows".to_string(),
        json!(rows
            .iter()
            .map(|r| json!({
                "himoku": r.himoku_name,
                "date": r.date.to_string(),
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
            let batch = upsert_report_rows(pool, rows).await;
            tracing::info!(
                "monthly report {ym} {}: {} rows registered, {} failed",
                class.name(),
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
    use kumiai_core::{Category, Period};
    use kumiai_storage::{
        create_db, freeze_period, insert_category, report_income_by_himoku, report_row_count,
    };

    async fn pool() -> (tempfile::TempDir, DbPool) {
        let dir = tempfile::tempdir().unwrap();
        let pool = create_db(&dir.path().join("audit.db")).await.unwrap();
        (dir, pool)
    }

    fn april() -> YearMonth {
        YearMonth::new(2025, 4).unwrap()
    }

    async fn seed_management_fee(pool: &DbPool) {
        let category = Category::new("管理費", 10, AccountingClass::Management, true);
        insert_category(pool, &category).await.unwrap();
    }

    const APRIL_INCOME: &str = "収入の部\n管理費\n04/15\n¥5,000\n4月分\n口座振替\n";

    #[tokio::test]
    async fn confirm_previews_without_writing() {
        let (_dir, pool) = pool().await;
        seed_management_fee(&pool).await;
        let outcome = import_monthly_report(
            &pool,
            APRIL_INCOME,
            april(),
            AccountingClass::Management,
            ImportMode::Confirm,
        )
        .await
        .unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.context["total"], json!(5_000));
        assert_eq!(outcome.context["section"], json!(INCOME_MARKER));
        assert_eq!(report_row_count(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn portal_header_block_is_skipped() {
        let (_dir, pool) = pool().await;
        seed_management_fee(&pool).await;
        // The portal prints six header lines between the section marker
        // and the first record.
        let raw = "収入の部\n収支報告書\n2025年4月度\n項目\n日付\n金額\n摘要\n\
                   管理費\n04/15\n¥5,000\n4月分\n口座振替\n";
        let outcome = import_monthly_report(
            &pool,
            raw,
            april(),
            AccountingClass::Management,
            ImportMode::Confirm,
        )
        .await
        .unwrap();
        assert!(outcome.success, "{:?}", outcome.errors);
        assert_eq!(outcome.context["total"], json!(5_000));
        assert_eq!(report_row_count(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn register_twice_is_idempotent() {
        let (_dir, pool) = pool().await;
        seed_management_fee(&pool).await;
        for _ in 0..2 {
            let outcome = import_monthly_report(
                &pool,
                APRIL_INCOME,
                april(),
                AccountingClass::Management,
                ImportMode::Register,
            )
            .await
            .unwrap();
            assert!(outcome.success);
            assert_eq!(outcome.context["registered"], json!(1));
        }
        assert_eq!(report_row_count(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn frozen_period_rejects_before_parsing() {
        let (_dir, pool) = pool().await;
        seed_management_fee(&pool).await;
        freeze_period(&pool, april()).await.unwrap();
        let outcome = import_monthly_report(
            &pool,
            APRIL_INCOME,
            april(),
            AccountingClass::Management,
            ImportMode::Register,
        )
        .await
        .unwrap();
        assert!(!outcome.success);
        assert!(outcome.errors[0].contains("2025年4月"));
        assert_eq!(report_row_count(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn total_row_in_range_rejects_whole_batch() {
        let (_dir, pool) = pool().await;
        seed_management_fee(&pool).await;
        let raw = format!("{APRIL_INCOME}合計\n5,000\n");
        let outcome = import_monthly_report(
            &pool,
            &raw,
            april(),
            AccountingClass::Management,
            ImportMode::Register,
        )
        .await
        .unwrap();
        assert!(!outcome.success);
        assert_eq!(report_row_count(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn wrong_class_paste_is_rejected() {
        let (_dir, pool) = pool().await;
        seed_management_fee(&pool).await;
        let raw = "収入の部\n修繕積立金\n04/15\n¥5,000\n4月分\nメモ\n";
        let outcome = import_monthly_report(
            &pool,
            raw,
            april(),
            AccountingClass::Management,
            ImportMode::Register,
        )
        .await
        .unwrap();
        assert!(!outcome.success);
        assert!(outcome.errors[0].contains("管理費会計"));
    }

    #[tokio::test]
    async fn unrecognized_name_lands_on_default_himoku() {
        let (_dir, pool) = pool().await;
        seed_management_fee(&pool).await;
        let mut fallback = Category::new("雑収入", 999, AccountingClass::Management, true);
        fallback.is_default = true;
        insert_category(&pool, &fallback).await.unwrap();

        let raw = format!("{APRIL_INCOME}不明な入金\n04/20\n3,000\n詳細\nメモ\n");
        let outcome = import_monthly_report(
            &pool,
            &raw,
            april(),
            AccountingClass::Management,
            ImportMode::Register,
        )
        .await
        .unwrap();
        assert!(outcome.success);

        let range = Period::Month(april()).bounds();
        let by_himoku = report_income_by_himoku(&pool, range, AccountingClass::Management)
            .await
            .unwrap();
        assert!(by_himoku.contains(&("管理費".to_string(), 5_000)));
        assert!(by_himoku.contains(&("雑収入".to_string(), 3_000)));
    }

    #[tokio::test]
    async fn missing_default_himoku_is_fatal() {
        let (_dir, pool) = pool().await;
        seed_management_fee(&pool).await;
        let raw = format!("{APRIL_INCOME}不明な入金\n04/20\n3,000\n詳細\nメモ\n");
        let err = import_monthly_report(
            &pool,
            &raw,
            april(),
            AccountingClass::Management,
            ImportMode::Register,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AuditError::NoDefaultCategory));
    }
}
