//! Fiscal month periods.

use serde::{Deserialize, Serialize};

use chrono::NaiveDate;

/// A fiscal month, as exposed by the ERP's accounting-period dimension.
///
/// The core only ever operates on monthly periods: `is_year` and
/// `is_quarter` must both be false for any period the coordinator touches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    /// Canonical `Mon YYYY` name, e.g. `Jan 2025`.
    pub name: String,
    pub id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub fiscal_year: i32,
    pub is_year: bool,
    pub is_quarter: bool,
}

impl Period {
    /// A period is usable by the core's monthly pivots only when it is
    /// neither a year bucket nor a quarter bucket.
    pub fn is_monthly(&self) -> bool {
        !self.is_year && !self.is_quarter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monthly_period_passes_is_monthly() {
        let p = Period {
            name: "Jan 2025".to_string(),
            id: 1,
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
            fiscal_year: 2025,
            is_year: false,
            is_quarter: false,
        };
        assert!(p.is_monthly());
    }

    #[test]
    fn year_or_quarter_bucket_is_not_monthly() {
        let mut p = Period {
            name: "FY2025".to_string(),
            id: 99,
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
            fiscal_year: 2025,
            is_year: true,
            is_quarter: false,
        };
        assert!(!p.is_monthly());
        p.is_year = false;
        p.is_quarter = true;
        assert!(!p.is_monthly());
    }
}
