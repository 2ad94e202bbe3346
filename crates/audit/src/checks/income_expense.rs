use kumiai_core::{AccountingClass, AuditConfig, DateRange, Period, YearMonth};
use kumiai_storage::{sum_passbook, sum_report, DbPool};

use crate::AuditError;

/// Management-report total vs. passbook total for one class and one
/// direction, plus the opening balance the period started from.
#[derive(Debug, Clone)]
pub struct IncomeExpenseCheck {
    /// The period actually checked (requests before the epoch clamp to it).
    pub period: YearMonth,
    pub report_total: i64,
    pub passbook_total: i64,
    pub opening_balance: i64,
}

impl IncomeExpenseCheck {
    pub fn difference(&self) -> i64 {
        self.report_total - self.passbook_total
    }
}

pub async fn compute(
    pool: &DbPool,
    config: &AuditConfig,
    ym: YearMonth,
    class: AccountingClass,
    is_income: bool,
) -> Result<IncomeExpenseCheck, AuditError> {
    let epoch = config.epoch();
    let ym = epoch.clamp(ym);
    let range = Period::Month(ym).bounds();

    let report_total = sum_report(pool, range, class, is_income).await?;
    // Netting rows (fees deducted at source) only distort the income
    // comparison; withdrawals include them on both sides.
    let passbook_total = sum_passbook(pool, range, is_income, is_income).await?;

    let carryover = config.carryover_for(class).ok_or_else(|| {
        tracing::error!("no epoch carry-over configured for {class}; operator action required");
        AuditError::MissingCarryover(class)
    })?;
    let opening_balance = if epoch.is_start(ym) {
        // No prior-period ledger exists before the cut-over; the old
        // regime's closing balance is a configured constant.
        carryover
    } else {
        let prior = DateRange::new(epoch.0.first_day(), ym.previous().last_day());
        carryover + sum_passbook(pool, prior, true, false).await?
            - sum_passbook(pool, prior, false, false).await?
    };

    Ok(IncomeExpenseCheck { period: ym, report_total, passbook_total, opening_balance })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use kumiai_core::{Category, PassbookRow, ReportRow};
    use kumiai_storage::{create_db, insert_category, upsert_passbook_rows, upsert_report_rows};

    async fn pool() -> (tempfile::TempDir, DbPool) {
        let dir = tempfile::tempdir().unwrap();
        let pool = create_db(&dir.path().join("audit.db")).await.unwrap();
        (dir, pool)
    }

    fn config() -> AuditConfig {
        AuditConfig::from_toml(
            "epoch_year = 2023\nepoch_month = 4\n\n[epoch_carryover]\nmanagement = 1_200_000\n",
        )
        .unwrap()
    }

    fn ym(year: i32, month: u32) -> YearMonth {
        YearMonth::new(year, month).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn passbook(d: NaiveDate, amount: i64, counterpart: &str, is_income: bool) -> PassbookRow {
        PassbookRow {
            date: d,
            amount,
            counterpart: counterpart.to_string(),
            is_income,
            is_netting: false,
            needs_approval: !is_income,
            is_manualinput: false,
            memo: None,
        }
    }

    async fn seed_report_income(pool: &DbPool, d: NaiveDate, amount: i64) {
        let id = insert_category(
            pool,
            &Category::new("管理費", 10, AccountingClass::Management, true),
        )
        .await
        .unwrap();
        let batch = upsert_report_rows(
            pool,
            vec![ReportRow {
                date: d,
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
    async fn epoch_start_opens_on_the_carryover() {
        let (_dir, pool) = pool().await;
        seed_report_income(&pool, date(2023, 4, 30), 20_000).await;
        upsert_passbook_rows(&pool, vec![passbook(date(2023, 4, 5), 20_000, "管理組合", true)])
            .await;

        let check = compute(&pool, &config(), ym(2023, 4), AccountingClass::Management, true)
            .await
            .unwrap();
        assert_eq!(check.opening_balance, 1_200_000);
        assert_eq!(check.report_total, 20_000);
        assert_eq!(check.passbook_total, 20_000);
        assert_eq!(check.difference(), 0);
    }

    #[tokio::test]
    async fn opening_balance_rolls_forward_from_the_epoch() {
        let (_dir, pool) = pool().await;
        upsert_passbook_rows(
            &pool,
            vec![
                passbook(date(2023, 4, 5), 20_000, "管理組合", true),
                passbook(date(2023, 4, 20), 5_000, "電力会社", false),
            ],
        )
        .await;

        let check = compute(&pool, &config(), ym(2023, 5), AccountingClass::Management, true)
            .await
            .unwrap();
        assert_eq!(check.opening_balance, 1_215_000);
    }

    #[tokio::test]
    async fn netting_rows_are_left_out_of_the_income_side() {
        let (_dir, pool) = pool().await;
        let mut fee = passbook(date(2023, 4, 2), 440, "振込手数料", true);
        fee.is_netting = true;
        upsert_passbook_rows(
            &pool,
            vec![passbook(date(2023, 4, 5), 20_000, "管理組合", true), fee],
        )
        .await;

        let check = compute(&pool, &config(), ym(2023, 4), AccountingClass::Management, true)
            .await
            .unwrap();
        assert_eq!(check.passbook_total, 20_000);
    }

    #[tokio::test]
    async fn missing_carryover_is_an_error() {
        let (_dir, pool) = pool().await;
        let err = compute(&pool, &config(), ym(2023, 4), AccountingClass::Parking, true)
            .await
            .unwrap_err();
        assert!(matches!(err, AuditError::MissingCarryover(AccountingClass::Parking)));
    }

    #[tokio::test]
    async fn pre_epoch_request_clamps_to_the_epoch() {
        let (_dir, pool) = pool().await;
        let check = compute(&pool, &config(), ym(2022, 1), AccountingClass::Management, true)
            .await
            .unwrap();
        assert_eq!(check.period, ym(2023, 4));
        assert_eq!(check.opening_balance, 1_200_000);
    }
}
