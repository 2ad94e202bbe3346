pub mod category;
pub mod class;
pub mod config;
pub mod ledger;
pub mod period;

pub use category::{Category, CategoryId};
pub use class::AccountingClass;
pub use config::{AuditConfig, ConfigError};
pub use ledger::{
    BalanceSheetRow, BillingRow, ClaimRow, ClaimType, PassbookRow, PaymentRow, ReportRow,
};
pub use period::{DateRange, Epoch, Period, YearMonth};
