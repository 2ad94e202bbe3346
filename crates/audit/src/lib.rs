pub mod checks;
pub mod imports;
pub mod matcher;

use thiserror::Error;

pub use checks::{
    approval::{ApprovalCheck, PendingWithdrawal},
    billing_report::BillingReportCheck,
    cash::CashCheck,
    income_expense::IncomeExpenseCheck,
};
pub use imports::{ImportMode, ImportOutcome};
pub use matcher::{match_labeled_amounts, LabeledAmount, MismatchRow, NO_COUNTERPART};

/// Failures that escape the library boundary as `Err`. User-correctable
/// problems (bad paste, frozen period, per-row write failures) never do;
/// they come back inside an `ImportOutcome`. What remains here is
/// operator-actionable: broken configuration or a failing database.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("configuration error: {0}")]
    Config(#[from] kumiai_core::ConfigError),
    #[error("no default himoku is configured; register a fallback before importing")]
    NoDefaultCategory,
    #[error("no epoch carry-over balance configured for {0}")]
    MissingCarryover(kumiai_core::AccountingClass),
    #[error(transparent)]
    Storage(#[from] kumiai_storage::StorageError),
}
