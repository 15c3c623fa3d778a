// src/sales/period.rs

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime};

use crate::shared::error::SaleError;

/// Calendar window a profit query aggregates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfitPeriod {
    Daily,
    Monthly,
    Annual,
}

impl ProfitPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfitPeriod::Daily => "daily",
            ProfitPeriod::Monthly => "monthly",
            ProfitPeriod::Annual => "annual",
        }
    }

    /// Half-open `[start, end)` window containing `now`, aligned to midnight.
    ///
    /// `None` only when the window falls outside chrono's representable range.
    pub fn window(&self, now: NaiveDateTime) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let today = now.date();
        let (first, next) = match self {
            ProfitPeriod::Daily => (today, today.succ_opt()?),
            ProfitPeriod::Monthly => {
                let first = today.with_day(1)?;
                (first, first.checked_add_months(Months::new(1))?)
            }
            ProfitPeriod::Annual => {
                let first = NaiveDate::from_ymd_opt(today.year(), 1, 1)?;
                (first, NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)?)
            }
        };

        Some((first.and_hms_opt(0, 0, 0)?, next.and_hms_opt(0, 0, 0)?))
    }
}

impl fmt::Display for ProfitPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfitPeriod {
    type Err = SaleError;

    /// Case-insensitive. The Spanish keywords used by earlier clients are accepted too.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "diaria" => Ok(ProfitPeriod::Daily),
            "monthly" | "mensual" => Ok(ProfitPeriod::Monthly),
            "annual" | "anual" | "yearly" => Ok(ProfitPeriod::Annual),
            _ => Err(SaleError::invalid(format!(
                "unknown profit period: '{}' (expected daily, monthly or annual)",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn parses_keywords_case_insensitively() {
        assert_eq!("DAILY".parse::<ProfitPeriod>().unwrap(), ProfitPeriod::Daily);
        assert_eq!("Mensual".parse::<ProfitPeriod>().unwrap(), ProfitPeriod::Monthly);
        assert_eq!(" annual ".parse::<ProfitPeriod>().unwrap(), ProfitPeriod::Annual);
        assert_eq!("anual".parse::<ProfitPeriod>().unwrap(), ProfitPeriod::Annual);
    }

    #[test]
    fn unknown_keyword_names_the_value() {
        let err = "unknown".parse::<ProfitPeriod>().unwrap_err();
        assert!(matches!(err, SaleError::InvalidArgument(_)));
        assert!(err.to_string().contains("'unknown'"));
    }

    #[test]
    fn daily_window_covers_the_current_day() {
        let (start, end) = ProfitPeriod::Daily.window(at(2025, 9, 25, 15, 0)).unwrap();
        assert_eq!(start, at(2025, 9, 25, 0, 0));
        assert_eq!(end, at(2025, 9, 26, 0, 0));
    }

    #[test]
    fn monthly_window_rolls_into_next_year_in_december() {
        let (start, end) = ProfitPeriod::Monthly.window(at(2025, 12, 31, 23, 59)).unwrap();
        assert_eq!(start, at(2025, 12, 1, 0, 0));
        assert_eq!(end, at(2026, 1, 1, 0, 0));
    }

    #[test]
    fn monthly_window_handles_leap_february() {
        let (start, end) = ProfitPeriod::Monthly.window(at(2024, 2, 29, 8, 0)).unwrap();
        assert_eq!(start, at(2024, 2, 1, 0, 0));
        assert_eq!(end, at(2024, 3, 1, 0, 0));
    }

    #[test]
    fn annual_window_covers_the_calendar_year() {
        let (start, end) = ProfitPeriod::Annual.window(at(2025, 9, 25, 15, 0)).unwrap();
        assert_eq!(start, at(2025, 1, 1, 0, 0));
        assert_eq!(end, at(2026, 1, 1, 0, 0));
    }

    #[test]
    fn window_at_midnight_starts_at_now() {
        let now = at(2025, 9, 1, 0, 0);
        let (start, _) = ProfitPeriod::Monthly.window(now).unwrap();
        assert_eq!(start, now);
    }
}
