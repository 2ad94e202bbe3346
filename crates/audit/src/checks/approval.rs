use chrono::NaiveDate;
use kumiai_core::{AuditConfig, Period, YearMonth};
use kumiai_storage::{clear_approval_flags, passbook_needing_approval, sum_payments, DbPool};

use crate::AuditError;

/// A passbook withdrawal still awaiting board approval.
#[derive(Debug, Clone)]
pub struct PendingWithdrawal {
    pub date: NaiveDate,
    pub counterpart: String,
    pub amount: i64,
}

/// Withdrawals still flagged for board approval vs. the total of the
/// payment-approval list the board actually saw.
#[derive(Debug, Clone)]
pub struct ApprovalCheck {
    pub period: YearMonth,
    /// Total of the imported payment-approval list for the period.
    pub approval_total: i64,
    /// Total of passbook withdrawals still flagged after the scan.
    pub withdrawal_total: i64,
    pub pending: Vec<PendingWithdrawal>,
    /// Withdrawals whose counterpart matched an exemption pattern this
    /// run; their flags are cleared in storage as part of the check.
    pub exempted: usize,
}

impl ApprovalCheck {
    pub fn difference(&self) -> i64 {
        self.approval_total - self.withdrawal_total
    }
}

/// Scans flagged passbook withdrawals against the exemption patterns
/// (direct debits, bank fees and the like need no board resolution),
/// clears the flag on matches, and compares what remains with the
/// payment-approval list.
pub async fn compute(
    pool: &DbPool,
    config: &AuditConfig,
    ym: YearMonth,
) -> Result<ApprovalCheck, AuditError> {
    let patterns = config.exempt_patterns().map_err(|e| {
        tracing::error!("approval-exemption patterns are invalid: {e}");
        AuditError::Config(e)
    })?;

    let ym = config.epoch().clamp(ym);
    let range = Period::Month(ym).bounds();
    let candidates = passbook_needing_approval(pool, range).await?;

    let (exempt, pending): (Vec<_>, Vec<_>) = candidates
        .into_iter()
        .partition(|row| patterns.iter().any(|re| re.is_match(&row.counterpart)));

    let exempt_ids: Vec<i64> = exempt.iter().map(|row| row.id).collect();
    clear_approval_flags(pool, &exempt_ids).await?;
    if !exempt_ids.is_empty() {
        tracing::info!("{} withdrawals exempted from approval for {ym}", exempt_ids.len());
    }

    let withdrawal_total = pending.iter().map(|row| row.amount).sum();
    let approval_total = sum_payments(pool, range).await?;

    Ok(ApprovalCheck {
        period: ym,
        approval_total,
        withdrawal_total,
        pending: pending
            .into_iter()
            .map(|row| PendingWithdrawal {
                date: row.date,
                counterpart: row.counterpart,
                amount: row.amount,
            })
            .collect(),
        exempted: exempt.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kumiai_core::{PassbookRow, PaymentRow};
    use kumiai_storage::{create_db, upsert_passbook_rows, upsert_payment_rows};

    async fn pool() -> (tempfile::TempDir, DbPool) {
        let dir = tempfile::tempdir().unwrap();
        let pool = create_db(&dir.path().join("audit.db")).await.unwrap();
        (dir, pool)
    }

    fn config(patterns: &str) -> AuditConfig {
        AuditConfig::from_toml(&format!(
            "epoch_year = 2023\nepoch_month = 4\napproval_exempt_patterns = [{patterns}]\n"
        ))
        .unwrap()
    }

    fn april() -> YearMonth {
        YearMonth::new(2025, 4).unwrap()
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, d).unwrap()
    }

    fn withdrawal(d: u32, counterpart: &str, amount: i64) -> PassbookRow {
        PassbookRow {
            date: date(d),
            amount,
            counterpart: counterpart.to_string(),
            is_income: false,
            is_netting: false,
            needs_approval: true,
            is_manualinput: false,
            memo: None,
        }
    }

    #[tokio::test]
    async fn exemption_clears_flags_durably() {
        let (_dir, pool) = pool().await;
        let rows = vec![withdrawal(10, "口座振替手数料", 440), withdrawal(15, "設備点検", 33_000)];
        let batch = upsert_passbook_rows(&pool, rows.clone()).await;
        assert!(batch.is_ok());

        let config = config("\"^口座振替\"");
        let check = compute(&pool, &config, april()).await.unwrap();
        assert_eq!(check.exempted, 1);
        assert_eq!(check.pending.len(), 1);
        assert_eq!(check.pending[0].counterpart, "設備点検");
        assert_eq!(check.withdrawal_total, 33_000);

        // The cleared flag survives both a second scan and a re-import
        // of the same passbook range.
        upsert_passbook_rows(&pool, rows).await;
        let again = compute(&pool, &config, april()).await.unwrap();
        assert_eq!(again.exempted, 0);
        assert_eq!(again.pending.len(), 1);
    }

    #[tokio::test]
    async fn approval_list_total_comes_from_payments() {
        let (_dir, pool) = pool().await;
        upsert_payment_rows(
            &pool,
            vec![PaymentRow {
                date: date(15),
                payee: "設備点検".to_string(),
                subject: "消防点検費".to_string(),
                amount: 33_000,
            }],
        )
        .await;
        upsert_passbook_rows(&pool, vec![withdrawal(16, "設備点検", 33_000)]).await;

        let check = compute(&pool, &config(""), april()).await.unwrap();
        assert_eq!(check.approval_total, 33_000);
        assert_eq!(check.withdrawal_total, 33_000);
        assert_eq!(check.difference(), 0);
    }

    #[tokio::test]
    async fn income_rows_are_never_scanned() {
        let (_dir, pool) = pool().await;
        let mut deposit = withdrawal(1, "管理組合", 10_000);
        deposit.is_income = true;
        deposit.needs_approval = false;
        upsert_passbook_rows(&pool, vec![deposit, withdrawal(5, "電力会社", 3_000)]).await;

        let check = compute(&pool, &config(""), april()).await.unwrap();
        assert_eq!(check.pending.len(), 1);
        assert_eq!(check.withdrawal_total, 3_000);
    }

    #[tokio::test]
    async fn broken_pattern_is_a_config_error() {
        let (_dir, pool) = pool().await;
        let err = compute(&pool, &config("\"(\""), april()).await.unwrap_err();
        assert!(matches!(err, AuditError::Config(_)));
    }
}
