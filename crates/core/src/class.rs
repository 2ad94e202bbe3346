use serde::{Deserialize, Serialize};
use std::fmt;

/// The four accounts an association keeps separate books for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountingClass {
    /// 管理費会計: day-to-day management fees.
    Management,
    /// 修繕積立金会計: long-term repair reserve fund.
    Reserve,
    /// 駐車場会計: parking-lot operations.
    Parking,
    /// 町内会会計: neighborhood-association dues held in trust.
    Neighborhood,
}

impl AccountingClass {
    pub const ALL: [AccountingClass; 4] = [
        AccountingClass::Management,
        AccountingClass::Reserve,
        AccountingClass::Parking,
        AccountingClass::Neighborhood,
    ];

    pub fn code(self) -> i64 {
        match self {
            AccountingClass::Management => 1,
            AccountingClass::Reserve => 2,
            AccountingClass::Parking => 3,
            AccountingClass::Neighborhood => 4,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(AccountingClass::Management),
            2 => Some(AccountingClass::Reserve),
            3 => Some(AccountingClass::Parking),
            4 => Some(AccountingClass::Neighborhood),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AccountingClass::Management => "管理費会計",
            AccountingClass::Reserve => "修繕積立金会計",
            AccountingClass::Parking => "駐車場会計",
            AccountingClass::Neighborhood => "町内会会計",
        }
    }
}

impl fmt::Display for AccountingClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
