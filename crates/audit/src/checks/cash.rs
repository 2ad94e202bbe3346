use kumiai_core::{AccountingClass, AuditConfig, Period, YearMonth};
use kumiai_storage::{balance_sheet_for, sum_report, DbPool};

use crate::AuditError;

/// Implied vs. recorded month-end bank balance, derived from two
/// balance-sheet snapshots and the month's report totals.
#[derive(Debug, Clone, Copy)]
pub struct CashCheck {
    pub implied_bank_balance: i64,
    pub recorded_bank_balance: i64,
}

impl CashCheck {
    pub fn difference(self) -> i64 {
        self.implied_bank_balance - self.recorded_bank_balance
    }
}

/// Returns `Ok(None)` when either snapshot is missing: the check is not
/// yet possible for this period, which is a precondition, not an error.
pub async fn compute(
    pool: &DbPool,
    config: &AuditConfig,
    ym: YearMonth,
    class: AccountingClass,
) -> Result<Option<CashCheck>, AuditError> {
    let ym = config.epoch().clamp(ym);
    let Some(previous) = balance_sheet_for(pool, ym.previous(), class).await? else {
        return Ok(None);
    };
    let Some(current) = balance_sheet_for(pool, ym, class).await? else {
        return Ok(None);
    };

    let range = Period::Month(ym).bounds();
    let income = sum_report(pool, range, class, true).await?;
    let expense = sum_report(pool, range, class, false).await?;

    // Accrual adjustments: money recognized but not yet moved (and vice
    // versa) must not count against the bank balance.
    let implied = previous.bank_balance + income - expense
        - (current.receivables - previous.receivables)
        + (current.payables - previous.payables)
        + (current.unearned_revenue - previous.unearned_revenue)
        - (current.prepaid - previous.prepaid);

    Ok(Some(CashCheck {
        implied_bank_balance: implied,
        recorded_bank_balance: current.bank_balance,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use kumiai_core::{BalanceSheetRow, Category, ReportRow};
    use kumiai_storage::{create_db, insert_category, upsert_balance_sheet, upsert_report_rows};

    async fn pool() -> (tempfile::TempDir, DbPool) {
        let dir = tempfile::tempdir().unwrap();
        let pool = create_db(&dir.path().join("audit.db")).await.unwrap();
        (dir, pool)
    }

    fn config() -> AuditConfig {
        AuditConfig::from_toml("epoch_year = 2023\nepoch_month = 4\n").unwrap()
    }

    fn snapshot(ym: YearMonth, bank_balance: i64) -> BalanceSheetRow {
        BalanceSheetRow {
            year: ym.year,
            month: ym.month,
            class: AccountingClass::Management,
            bank_balance,
            receivables: 0,
            prepaid: 0,
            payables: 0,
            unearned_revenue: 0,
        }
    }

    async fn seed_april_income(pool: &DbPool, amount: i64) {
        let id = insert_category(
            pool,
            &Category::new("管理費", 10, AccountingClass::Management, true),
        )
        .await
        .unwrap();
        let batch = upsert_report_rows(
            pool,
            vec![ReportRow {
                date: NaiveDate::from_ymd_opt(2025, 4, 30).unwrap(),
                himoku: id,
                himoku_name: "管理費".to_string(),
                amount,
                is_income: true,
                calc_flg: true,
                detail: None,
                memo: None,
            }],
        )
        .await;
        assert!(batch.is_ok());
    }

    #[tokio::test]
    async fn missing_snapshot_yields_none() {
        let (_dir, pool) = pool().await;
        let april = YearMonth::new(2025, 4).unwrap();
        // No snapshots at all.
        assert!(compute(&pool, &config(), april, AccountingClass::Management)
            .await
            .unwrap()
            .is_none());
        // Current month only; still no prior snapshot to start from.
        upsert_balance_sheet(&pool, &snapshot(april, 120_000)).await.unwrap();
        assert!(compute(&pool, &config(), april, AccountingClass::Management)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn income_carries_the_balance_forward() {
        let (_dir, pool) = pool().await;
        let april = YearMonth::new(2025, 4).unwrap();
        upsert_balance_sheet(&pool, &snapshot(april.previous(), 100_000)).await.unwrap();
        upsert_balance_sheet(&pool, &snapshot(april, 120_000)).await.unwrap();
        seed_april_income(&pool, 20_000).await;

        let check = compute(&pool, &config(), april, AccountingClass::Management)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(check.implied_bank_balance, 120_000);
        assert_eq!(check.difference(), 0);
    }

    #[tokio::test]
    async fn receivable_growth_reduces_the_implied_balance() {
        let (_dir, pool) = pool().await;
        let april = YearMonth::new(2025, 4).unwrap();
        upsert_balance_sheet(&pool, &snapshot(april.previous(), 100_000)).await.unwrap();
        let mut current = snapshot(april, 120_000);
        // 5,000 of the recognized income is still unpaid.
        current.receivables = 5_000;
        upsert_balance_sheet(&pool, &current).await.unwrap();
        seed_april_income(&pool, 20_000).await;

        let check = compute(&pool, &config(), april, AccountingClass::Management)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(check.implied_bank_balance, 115_000);
        assert_eq!(check.difference(), -5_000);
    }
}
