use kumiai_core::{AccountingClass, AuditConfig, Period, YearMonth};
use kumiai_storage::{billing_rows_for, report_income_by_himoku, DbPool};

use crate::matcher::{match_labeled_amounts, LabeledAmount, MismatchRow};
use crate::AuditError;

/// The billing summary calls parking income 駐車場使用料 while the
/// management report books it as 駐車場料金. One fixed alias, not a
/// general mapping.
const BILLING_NAME_ALIAS: (&str, &str) = ("駐車場使用料", "駐車場料金");

/// Billed amounts vs. what the management report recognized as income.
#[derive(Debug, Clone)]
pub struct BillingReportCheck {
    pub period: YearMonth,
    pub billing_total: i64,
    pub report_total: i64,
    /// Full pairing; filter by [`MismatchRow::is_discrepancy`] to display.
    pub rows: Vec<MismatchRow>,
}

impl BillingReportCheck {
    pub fn difference(&self) -> i64 {
        self.billing_total - self.report_total
    }
}

pub async fn compute(
    pool: &DbPool,
    config: &AuditConfig,
    ym: YearMonth,
    class: AccountingClass,
) -> Result<BillingReportCheck, AuditError> {
    let ym = config.epoch().clamp(ym);
    let range = Period::Month(ym).bounds();

    let billing: Vec<LabeledAmount> = billing_rows_for(pool, ym)
        .await?
        .into_iter()
        .map(|(name, amount)| {
            let label = if name == BILLING_NAME_ALIAS.0 {
                BILLING_NAME_ALIAS.1.to_string()
            } else {
                name
            };
            LabeledAmount { label, amount }
        })
        .collect();
    let report: Vec<LabeledAmount> = report_income_by_himoku(pool, range, class)
        .await?
        .into_iter()
        .map(|(label, amount)| LabeledAmount { label, amount })
        .collect();

    let billing_total = billing.iter().map(|l| l.amount).sum();
    let report_total = report.iter().map(|l| l.amount).sum();
    let rows = match_labeled_amounts(&billing, &report, config.fuzzy_cutoff);

    Ok(BillingReportCheck { period: ym, billing_total, report_total, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use kumiai_core::{BillingRow, Category, ReportRow};
    use kumiai_storage::{create_db, insert_category, upsert_billing_rows, upsert_report_rows};

    async fn pool() -> (tempfile::TempDir, DbPool) {
        let dir = tempfile::tempdir().unwrap();
        let pool = create_db(&dir.path().join("audit.db")).await.unwrap();
        (dir, pool)
    }

    fn config() -> AuditConfig {
        AuditConfig::from_toml("epoch_year = 2023\nepoch_month = 4\n").unwrap()
    }

    fn april() -> YearMonth {
        YearMonth::new(2025, 4).unwrap()
    }

    fn billing(name: &str, amount: i64) -> BillingRow {
        BillingRow { year: 2025, month: 4, name: name.to_string(), amount }
    }

    async fn seed_report_income(pool: &DbPool, name: &str, code: i64, amount: i64) {
        let id = insert_category(
            pool,
            &Category::new(name, code, AccountingClass::Management, true),
        )
        .await
        .unwrap();
        let batch = upsert_report_rows(
            pool,
            vec![ReportRow {
                date: NaiveDate::from_ymd_opt(2025, 4, 30).unwrap(),
                himoku: id,
                himoku_name: name.to_string(),
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
    async fn parking_alias_pairs_across_vocabularies() {
        let (_dir, pool) = pool().await;
        seed_report_income(&pool, "駐車場料金", 30, 12_000).await;
        let batch = upsert_billing_rows(&pool, vec![billing("駐車場使用料", 12_000)]).await;
        assert!(batch.is_ok());

        let check = compute(&pool, &config(), april(), AccountingClass::Management)
            .await
            .unwrap();
        assert_eq!(check.rows.len(), 1);
        assert!(!check.rows[0].is_discrepancy());
        assert_eq!(check.difference(), 0);
    }

    #[tokio::test]
    async fn amount_gap_is_flagged() {
        let (_dir, pool) = pool().await;
        seed_report_income(&pool, "管理費", 10, 48_000).await;
        upsert_billing_rows(&pool, vec![billing("管理費", 50_000)]).await;

        let check = compute(&pool, &config(), april(), AccountingClass::Management)
            .await
            .unwrap();
        assert_eq!(check.difference(), 2_000);
        let flagged: Vec<_> = check.rows.iter().filter(|r| r.is_discrepancy()).collect();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].amount_a, 50_000);
        assert_eq!(flagged[0].amount_b, 48_000);
    }

    #[tokio::test]
    async fn unbilled_income_shows_up_as_a_leftover() {
        let (_dir, pool) = pool().await;
        seed_report_income(&pool, "テナント賃料", 40, 80_000).await;

        let check = compute(&pool, &config(), april(), AccountingClass::Management)
            .await
            .unwrap();
        assert_eq!(check.rows.len(), 1);
        assert_eq!(check.rows[0].label_a, crate::matcher::NO_COUNTERPART);
        assert_eq!(check.rows[0].amount_b, 80_000);
    }
}
