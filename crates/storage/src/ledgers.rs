use chrono::NaiveDate;
use kumiai_core::{
    AccountingClass, BalanceSheetRow, BillingRow, ClaimRow, DateRange, PassbookRow, PaymentRow,
    ReportRow, YearMonth,
};

use crate::db::DbPool;
use crate::{normalize_key, BatchResult, StorageError};

// ── upserts ──────────────────────────────────────────────────────────────
//
// Every ledger writes through a natural-key upsert so that re-pasting an
// overlapping range never duplicates rows. Free-text key components go
// through normalize_key first, uniformly across import types.

pub async fn upsert_report_rows(pool: &DbPool, rows: Vec<ReportRow>) -> BatchResult<ReportRow> {
    let mut batch = BatchResult::new();
    for row in rows {
        let outcome = sqlx::query(
            "INSERT INTO report_rows (date, himoku_id, amount, is_income, calc_flg, detail, memo)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(date, himoku_id, is_income)
             DO UPDATE SET amount = excluded.amount, calc_flg = excluded.calc_flg,
                           detail = excluded.detail, memo = excluded.memo",
        )
        .bind(row.date)
        .bind(row.himoku.0)
        .bind(row.amount)
        .bind(row.is_income)
        .bind(row.calc_flg)
        .bind(&row.detail)
        .bind(&row.memo)
        .execute(pool)
        .await;
        match outcome {
            Ok(_) => batch.succeeded.push(row),
            Err(e) => {
                let message = format!("{} {}: {e}", row.date, row.himoku_name);
                batch.failed.push((row, message));
            }
        }
    }
    batch
}

pub async fn upsert_passbook_rows(
    pool: &DbPool,
    rows: Vec<PassbookRow>,
) -> BatchResult<PassbookRow> {
    let mut batch = BatchResult::new();
    for row in rows {
        let counterpart = normalize_key(&row.counterpart);
        // The conflict branch updates memo only: a needs_approval flag
        // already cleared by the exemption scan must stay cleared when
        // the same range is pasted again.
        let outcome = sqlx::query(
            "INSERT INTO passbook_rows
                 (date, amount, counterpart, is_income, is_netting, needs_approval,
                  is_manualinput, memo)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(date, amount, counterpart)
             DO UPDATE SET memo = excluded.memo",
        )
        .bind(row.date)
        .bind(row.amount)
        .bind(&counterpart)
        .bind(row.is_income)
        .bind(row.is_netting)
        .bind(row.needs_approval)
        .bind(row.is_manualinput)
        .bind(&row.memo)
        .execute(pool)
        .await;
        match outcome {
            Ok(_) => batch.succeeded.push(row),
            Err(e) => {
                let message = format!("{} {}: {e}", row.date, row.counterpart);
                batch.failed.push((row, message));
            }
        }
    }
    batch
}

pub async fn upsert_billing_rows(pool: &DbPool, rows: Vec<BillingRow>) -> BatchResult<BillingRow> {
    let mut batch = BatchResult::new();
    for row in rows {
        let name = normalize_key(&row.name);
        let outcome = sqlx::query(
            "INSERT INTO billing_rows (year, month, name, amount) VALUES (?, ?, ?, ?)
             ON CONFLICT(year, month, name) DO UPDATE SET amount = excluded.amount",
        )
        .bind(row.year)
        .bind(row.month)
        .bind(&name)
        .bind(row.amount)
        .execute(pool)
        .await;
        match outcome {
            Ok(_) => batch.succeeded.push(row),
            Err(e) => {
                let message = format!("{}-{:02} {}: {e}", row.year, row.month, row.name);
                batch.failed.push((row, message));
            }
        }
    }
    batch
}

pub async fn upsert_payment_rows(pool: &DbPool, rows: Vec<PaymentRow>) -> BatchResult<PaymentRow> {
    let mut batch = BatchResult::new();
    for row in rows {
        let payee = normalize_key(&row.payee);
        let outcome = sqlx::query(
            "INSERT INTO payments (date, payee, subject, amount)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(date, amount, payee) DO UPDATE SET subject = excluded.subject",
        )
        .bind(row.date)
        .bind(&payee)
        .bind(&row.subject)
        .bind(row.amount)
        .execute(pool)
        .await;
        match outcome {
            Ok(_) => batch.succeeded.push(row),
            Err(e) => {
                let message = format!("{} {}: {e}", row.date, row.payee);
                batch.failed.push((row, message));
            }
        }
    }
    batch
}

pub async fn upsert_claim_rows(pool: &DbPool, rows: Vec<ClaimRow>) -> BatchResult<ClaimRow> {
    let mut batch = BatchResult::new();
    for row in rows {
        let payer = normalize_key(&row.payer);
        let outcome = sqlx::query(
            "INSERT INTO claims (year, month, claim_type, payer, detail, amount)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(year, month, claim_type, payer)
             DO UPDATE SET detail = excluded.detail, amount = excluded.amount",
        )
        .bind(row.year)
        .bind(row.month)
        .bind(row.claim_type.as_str())
        .bind(&payer)
        .bind(&row.detail)
        .bind(row.amount)
        .execute(pool)
        .await;
        match outcome {
            Ok(_) => batch.succeeded.push(row),
            Err(e) => {
                let message = format!("{}-{:02} {}: {e}", row.year, row.month, row.payer);
                batch.failed.push((row, message));
            }
        }
    }
    batch
}

pub async fn upsert_balance_sheet(
    pool: &DbPool,
    row: &BalanceSheetRow,
) -> Result<(), StorageError> {
    sqlx::query(
        "INSERT INTO balance_sheets
             (year, month, class_code, bank_balance, receivables, prepaid, payables,
              unearned_revenue)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(year, month, class_code)
         DO UPDATE SET bank_balance = excluded.bank_balance,
                       receivables = excluded.receivables,
                       prepaid = excluded.prepaid,
                       payables = excluded.payables,
                       unearned_revenue = excluded.unearned_revenue",
    )
    .bind(row.year)
    .bind(row.month)
    .bind(row.class.code())
    .bind(row.bank_balance)
    .bind(row.receivables)
    .bind(row.prepaid)
    .bind(row.payables)
    .bind(row.unearned_revenue)
    .execute(pool)
    .await?;
    Ok(())
}

// ── period-filtered aggregates ───────────────────────────────────────────

/// Management-report total for one class and kind over a period.
/// Correction rows (calc_flg = 0) and non-aggregating himoku
/// (inter-account transfers) are excluded in SQL.
pub async fn sum_report(
    pool: &DbPool,
    range: DateRange,
    class: AccountingClass,
    is_income: bool,
) -> Result<i64, StorageError> {
    let (total,): (i64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(r.amount), 0)
         FROM report_rows r JOIN himoku h ON h.id = r.himoku_id
         WHERE r.date >= ? AND r.date <= ? AND h.class_code = ?
           AND r.is_income = ? AND r.calc_flg = 1 AND h.aggregate_flag = 1",
    )
    .bind(range.start)
    .bind(range.end)
    .bind(class.code())
    .bind(is_income)
    .fetch_one(pool)
    .await?;
    Ok(total)
}

/// Passbook total for a period and direction. Income comparisons pass
/// `exclude_netting` so fees deducted at source are not double-counted.
pub async fn sum_passbook(
    pool: &DbPool,
    range: DateRange,
    is_income: bool,
    exclude_netting: bool,
) -> Result<i64, StorageError> {
    let query = if exclude_netting {
        "SELECT COALESCE(SUM(amount), 0) FROM passbook_rows
         WHERE date >= ? AND date <= ? AND is_income = ? AND is_netting = 0"
    } else {
        "SELECT COALESCE(SUM(amount), 0) FROM passbook_rows
         WHERE date >= ? AND date <= ? AND is_income = ?"
    };
    let (total,): (i64,) = sqlx::query_as(query)
        .bind(range.start)
        .bind(range.end)
        .bind(is_income)
        .fetch_one(pool)
        .await?;
    Ok(total)
}

/// Income side of the management report grouped by himoku name, in
/// vocabulary order; the billing-vs-report check feeds this to the
/// fuzzy matcher.
pub async fn report_income_by_himoku(
    pool: &DbPool,
    range: DateRange,
    class: AccountingClass,
) -> Result<Vec<(String, i64)>, StorageError> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT h.name, COALESCE(SUM(r.amount), 0)
         FROM report_rows r JOIN himoku h ON h.id = r.himoku_id
         WHERE r.date >= ? AND r.date <= ? AND h.class_code = ?
           AND r.is_income = 1 AND r.calc_flg = 1 AND h.aggregate_flag = 1
         GROUP BY h.id ORDER BY h.code",
    )
    .bind(range.start)
    .bind(range.end)
    .bind(class.code())
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn billing_rows_for(
    pool: &DbPool,
    ym: YearMonth,
) -> Result<Vec<(String, i64)>, StorageError> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT name, amount FROM billing_rows WHERE year = ? AND month = ? ORDER BY id",
    )
    .bind(ym.year)
    .bind(ym.month)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn passbook_rows_for(
    pool: &DbPool,
    range: DateRange,
) -> Result<Vec<PassbookRow>, StorageError> {
    let rows: Vec<(NaiveDate, i64, String, bool, bool, bool, bool, Option<String>)> =
        sqlx::query_as(
            "SELECT date, amount, counterpart, is_income, is_netting, needs_approval,
                    is_manualinput, memo
             FROM passbook_rows WHERE date >= ? AND date <= ? ORDER BY date, id",
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(pool)
        .await?;
    Ok(rows
        .into_iter()
        .map(|r| PassbookRow {
            date: r.0,
            amount: r.1,
            counterpart: r.2,
            is_income: r.3,
            is_netting: r.4,
            needs_approval: r.5,
            is_manualinput: r.6,
            memo: r.7,
        })
        .collect())
}

/// Payment-approval list total for a period.
pub async fn sum_payments(pool: &DbPool, range: DateRange) -> Result<i64, StorageError> {
    let (total,): (i64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(amount), 0) FROM payments WHERE date >= ? AND date <= ?",
    )
    .bind(range.start)
    .bind(range.end)
    .fetch_one(pool)
    .await?;
    Ok(total)
}

/// A passbook withdrawal whose needs_approval flag is still set.
#[derive(Debug, Clone)]
pub struct ApprovalRow {
    pub id: i64,
    pub date: NaiveDate,
    pub counterpart: String,
    pub amount: i64,
}

pub async fn passbook_needing_approval(
    pool: &DbPool,
    range: DateRange,
) -> Result<Vec<ApprovalRow>, StorageError> {
    let rows: Vec<(i64, NaiveDate, String, i64)> = sqlx::query_as(
        "SELECT id, date, counterpart, amount FROM passbook_rows
         WHERE date >= ? AND date <= ? AND is_income = 0 AND needs_approval = 1
         ORDER BY date, id",
    )
    .bind(range.start)
    .bind(range.end)
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(|r| ApprovalRow { id: r.0, date: r.1, counterpart: r.2, amount: r.3 })
        .collect())
}

pub async fn clear_approval_flags(pool: &DbPool, ids: &[i64]) -> Result<(), StorageError> {
    for id in ids {
        sqlx::query("UPDATE passbook_rows SET needs_approval = 0 WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
    }
    Ok(())
}

pub async fn balance_sheet_for(
    pool: &DbPool,
    ym: YearMonth,
    class: AccountingClass,
) -> Result<Option<BalanceSheetRow>, StorageError> {
    let row: Option<(i64, i64, i64, i64, i64)> = sqlx::query_as(
        "SELECT bank_balance, receivables, prepaid, payables, unearned_revenue
         FROM balance_sheets WHERE year = ? AND month = ? AND class_code = ?",
    )
    .bind(ym.year)
    .bind(ym.month)
    .bind(class.code())
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|r| BalanceSheetRow {
        year: ym.year,
        month: ym.month,
        class,
        bank_balance: r.0,
        receivables: r.1,
        prepaid: r.2,
        payables: r.3,
        unearned_revenue: r.4,
    }))
}

// ── fiscal lock ──────────────────────────────────────────────────────────

pub async fn is_frozen(pool: &DbPool, ym: YearMonth) -> Result<bool, StorageError> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM frozen_periods WHERE year = ? AND month = ?")
            .bind(ym.year)
            .bind(ym.month)
            .fetch_one(pool)
            .await?;
    Ok(count > 0)
}

pub async fn freeze_period(pool: &DbPool, ym: YearMonth) -> Result<(), StorageError> {
    sqlx::query("INSERT OR IGNORE INTO frozen_periods (year, month) VALUES (?, ?)")
        .bind(ym.year)
        .bind(ym.month)
        .execute(pool)
        .await?;
    Ok(())
}

// ── row counts (idempotence checks) ──────────────────────────────────────

macro_rules! count_fn {
    ($name:ident, $table:literal) => {
        pub async fn $name(pool: &DbPool) -> Result<i64, StorageError> {
            let (count,): (i64,) =
                sqlx::query_as(concat!("SELECT COUNT(*) FROM ", $table))
                    .fetch_one(pool)
                    .await?;
            Ok(count)
        }
    };
}

count_fn!(report_row_count, "report_rows");
count_fn!(passbook_row_count, "passbook_rows");
count_fn!(billing_row_count, "billing_rows");
count_fn!(payment_row_count, "payments");
count_fn!(claim_row_count, "claims");
