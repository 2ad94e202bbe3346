use std::collections::HashMap;

use kumiai_core::{AccountingClass, BalanceSheetRow, YearMonth};
use kumiai_import::{chunk_fixed, clean_lines, parse_yen, validate_no_total_row};
use kumiai_storage::{upsert_balance_sheet, DbPool};
use serde_json::{json, Value};

use super::{base_context, frozen_gate, try_validate, ImportMode, ImportOutcome};
use crate::AuditError;

/// The five balance-sheet lines the cash check consumes, as labeled on
/// the portal.
const BANK_LABEL: &str = "銀行残高";
const RECEIVABLES_LABEL: &str = "未収金";
const PREPAID_LABEL: &str = "前払金";
const PAYABLES_LABEL: &str = "未払金";
const UNEARNED_LABEL: &str = "前受金";

const EXPECTED_LABELS: [&str; 5] = [
    BANK_LABEL,
    RECEIVABLES_LABEL,
    PREPAID_LABEL,
    PAYABLES_LABEL,
    UNEARNED_LABEL,
];

/// Rows paste as label/amount pairs.
const RECORD_WIDTH: usize = 2;

/// Imports one class's month-end balance-sheet snapshot.
pub async fn import_balance_sheet(
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
    try_validate!(validate_no_total_row(&lines), ym);
    let records = chunk_fixed(&lines, RECORD_WIDTH);

    let mut amounts: HashMap<&str, i64> = HashMap::new();
    for record in &records {
        let Some(label) = EXPECTED_LABELS.iter().find(|l| record[0] == **l) else {
            return Ok(ImportOutcome::rejected(
                ym,
                format!("unexpected balance-sheet label '{}'", record[0]),
            ));
        };
        let amount = try_validate!(parse_yen(&record[1]), ym);
        amounts.insert(label, amount);
    }
    for label in EXPECTED_LABELS {
        if !amounts.contains_key(label) {
            return Ok(ImportOutcome::rejected(
                ym,
                format!("balance-sheet label missing from paste: {label}"),
            ));
        }
    }

    let row = BalanceSheetRow {
        year: ym.year,
        month: ym.month,
        class,
        bank_balance: amounts[BANK_LABEL],
        receivables: amounts[RECEIVABLES_LABEL],
        prepaid: amounts[PREPAID_LABEL],
        payables: amounts[PAYABLES_LABEL],
        unearned_revenue: amounts[UNEARNED_LABEL],
    };

    // Same checksum key every import type carries, so callers can show
    // one figure to eyeball against the portal.
    let total = row.bank_balance + row.receivables + row.prepaid + row.payables
        + row.unearned_revenue;
    let mut context = base_context(ym);
    context.insert("class".to_string(), json!(class.name()));
    context.insert("total".to_string(), json!(total));
    context.insert("bank_balance".to_string(), json!(row.bank_balance));
    context.insert("receivables".to_string(), json!(row.receivables));
    context.insert("prepaid".to_string(), json!(row.prepaid));
    context.insert("payables".to_string(), json!(row.payables));
    context.insert("unearned_revenue".to_string(), json!(row.unearned_revenue));

    match mode {
        ImportMode::Confirm => Ok(ImportOutcome {
            success: true,
            context: Value::Object(context),
            errors: Vec::new(),
        }),
        ImportMode::Register => match upsert_balance_sheet(pool, &row).await {
            Ok(()) => {
                tracing::info!("balance sheet {ym} {} registered", class.name());
                Ok(ImportOutcome {
                    success: true,
                    context: Value::Object(context),
                    errors: Vec::new(),
                })
            }
            Err(e) => Ok(ImportOutcome {
                success: false,
                context: Value::Object(context),
                errors: vec![e.to_string()],
            }),
        },
    }
}
