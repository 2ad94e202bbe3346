use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::category::CategoryId;
use crate::class::AccountingClass;

/// One passbook line: what the bank says happened. All amounts are
/// positive yen; direction lives in `is_income`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassbookRow {
    pub date: NaiveDate,
    pub amount: i64,
    pub counterpart: String,
    pub is_income: bool,
    /// Fee deducted at source (e.g. transfer charge); excluded from
    /// straightforward income totals to avoid double-counting.
    pub is_netting: bool,
    pub needs_approval: bool,
    pub is_manualinput: bool,
    pub memo: Option<String>,
}

/// One line of the management company's monthly report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRow {
    pub date: NaiveDate,
    pub himoku: CategoryId,
    pub himoku_name: String,
    pub amount: i64,
    pub is_income: bool,
    /// Include in totals; correction rows that must not re-count are
    /// stored with this cleared.
    pub calc_flg: bool,
    pub detail: Option<String>,
    pub memo: Option<String>,
}

/// One line of the billing summary (what owners were invoiced).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingRow {
    pub year: i32,
    pub month: u32,
    pub name: String,
    pub amount: i64,
}

/// Month-end balance-sheet snapshot for one accounting class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceSheetRow {
    pub year: i32,
    pub month: u32,
    pub class: AccountingClass,
    pub bank_balance: i64,
    pub receivables: i64,
    pub prepaid: i64,
    pub payables: i64,
    pub unearned_revenue: i64,
}

/// One row of the payment-approval list submitted to the board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRow {
    pub date: NaiveDate,
    pub payee: String,
    pub subject: String,
    pub amount: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimType {
    /// 未収金: billed but not yet received.
    Receivable,
    /// 前受金: received ahead of the billed period.
    Prepayment,
}

impl ClaimType {
    pub fn as_str(self) -> &'static str {
        match self {
            ClaimType::Receivable => "receivable",
            ClaimType::Prepayment => "prepayment",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "receivable" => Some(ClaimType::Receivable),
            "prepayment" => Some(ClaimType::Prepayment),
            _ => None,
        }
    }
}

impl fmt::Display for ClaimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One receivables/prepayments claim against a unit owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimRow {
    pub year: i32,
    pub month: u32,
    pub claim_type: ClaimType,
    pub payer: String,
    pub detail: Option<String>,
    pub amount: i64,
}
