use thiserror::Error;

/// Failures detected while turning pasted portal text into ledger rows.
/// Every message tells the user what to re-paste; none of these reach
/// persistence.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("先頭行が区分ラベルではありません: '{0}' (paste must start at a deposit/withdrawal marker)")]
    MalformedInput(String),
    #[error("section header mismatch: expected one of {expected:?}, got '{actual}'")]
    HeaderMismatch {
        expected: Vec<String>,
        actual: String,
    },
    #[error("pasted range includes the total row '{0}'; exclude footer summary rows")]
    UnexpectedTotalRow(String),
    #[error("no himoku in the pasted batch belongs to {class_name}; wrong account's report?")]
    AccountingClassMismatch { class_name: String },
    #[error("non-numeric amount '{0}'; a column-header row may have been included")]
    NonNumericAmount(String),
    #[error("invalid amount token '{0}'")]
    InvalidAmount(String),
    #[error("invalid date fragment '{0}', expected MM/DD")]
    InvalidDate(String),
    #[error("record too short: expected at least {expected} fields, got {actual}")]
    ShortRecord { expected: usize, actual: usize },
    #[error("no default himoku is configured")]
    NoDefaultCategory,
}
