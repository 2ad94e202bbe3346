//! Cross-ledger reconciliation. Each check pulls period-filtered
//! aggregates from storage, applies the business exclusions (netting
//! rows, non-aggregating himoku, approval exemptions), and returns two
//! totals plus the outliers. Results are transient: nothing here is
//! persisted except the approval-flag clearing, which is itself part of
//! the check's contract.

pub mod approval;
pub mod billing_report;
pub mod cash;
pub mod income_expense;
