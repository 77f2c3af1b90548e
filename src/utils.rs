use crate::error::{FinancialReportError, Result};
use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};

pub fn last_day_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next| next.pred_opt())
        .ok_or_else(|| {
            FinancialReportError::DateError(format!("Invalid month {}-{:02}", year, month))
        })
}

pub fn is_month_end(date: NaiveDate) -> bool {
    date.succ_opt().map_or(true, |next| next.month() != date.month())
}

/// Moves `date` back by `months`. Month ends stay month ends, so
/// 2024-03-31 minus one month is 2024-02-29 and 2024-02-29 minus one
/// month is 2024-01-31.
pub fn shift_months_back(date: NaiveDate, months: u32) -> Result<NaiveDate> {
    let shifted = date
        .checked_sub_months(Months::new(months))
        .ok_or_else(|| {
            FinancialReportError::DateError(format!(
                "Cannot move {} back by {} months",
                date, months
            ))
        })?;

    if is_month_end(date) {
        last_day_of_month(shifted.year(), shifted.month())
    } else {
        Ok(shifted)
    }
}

/// Column label for the inclusive span `from..=to`.
///
/// - A whole calendar year: `"2024"`
/// - A whole single month: `"Jan 2024"`
/// - Whole months otherwise: `"Jan 2024 - Mar 2024"`
/// - Anything else falls back to ISO dates.
pub fn period_label(from: NaiveDate, to: NaiveDate) -> String {
    let whole_months = from.day() == 1 && is_month_end(to);

    if !whole_months {
        return format!("{} - {}", from.format("%Y-%m-%d"), to.format("%Y-%m-%d"));
    }

    if from.year() == to.year() && from.month() == 1 && to.month() == 12 {
        return from.year().to_string();
    }

    if from.year() == to.year() && from.month() == to.month() {
        return from.format("%b %Y").to_string();
    }

    format!("{} - {}", from.format("%b %Y"), to.format("%b %Y"))
}

/// Parses a period string in the format "YYYY-MM" or "YYYY-MM:YYYY-MM"
/// Returns (start_date, inclusive end_date)
pub fn parse_period_string(period: &str) -> Result<(NaiveDate, NaiveDate)> {
    let parts: Vec<&str> = period.split(':').collect();

    let parse_month = |part: &str| {
        let start_str = format!("{}-01", part.trim());
        NaiveDate::parse_from_str(&start_str, "%Y-%m-%d").map_err(|_| {
            FinancialReportError::DateError(format!(
                "Invalid date format in period: {}. Expected YYYY-MM",
                part
            ))
        })
    };

    match parts.as_slice() {
        [single] => {
            let start_date = parse_month(single)?;
            let end_date = last_day_of_month(start_date.year(), start_date.month())?;
            Ok((start_date, end_date))
        }
        [start, end] => {
            let start_date = parse_month(start)?;
            let end_ref = parse_month(end)?;
            let end_date = last_day_of_month(end_ref.year(), end_ref.month())?;
            Ok((start_date, end_date))
        }
        _ => Err(FinancialReportError::DateError(format!(
            "Invalid period format: {}. Expected 'YYYY-MM' or 'YYYY-MM:YYYY-MM'",
            period
        ))),
    }
}

/// Renders an amount with `precision` decimals and comma thousands
/// separators, e.g. `-1,234.50`.
pub fn format_amount(value: Decimal, precision: u32) -> String {
    let rounded = value.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero);
    let digits = format!("{:.*}", precision as usize, rounded.abs());

    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let mut output = String::new();
    if rounded.is_sign_negative() && !rounded.is_zero() {
        output.push('-');
    }
    output.push_str(&grouped);
    if let Some(frac) = frac_part {
        output.push('.');
        output.push_str(frac);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_last_day_of_month() {
        assert_eq!(last_day_of_month(2023, 2).unwrap(), date(2023, 2, 28));
        assert_eq!(last_day_of_month(2024, 2).unwrap(), date(2024, 2, 29));
        assert_eq!(last_day_of_month(2023, 12).unwrap(), date(2023, 12, 31));
        assert!(last_day_of_month(2023, 13).is_err());
    }

    #[test]
    fn test_shift_months_back_keeps_month_ends() {
        assert_eq!(shift_months_back(date(2024, 3, 31), 1).unwrap(), date(2024, 2, 29));
        assert_eq!(shift_months_back(date(2024, 2, 29), 1).unwrap(), date(2024, 1, 31));
        assert_eq!(shift_months_back(date(2024, 6, 30), 3).unwrap(), date(2024, 3, 31));
        assert_eq!(shift_months_back(date(2024, 5, 15), 2).unwrap(), date(2024, 3, 15));
    }

    #[test]
    fn test_period_label() {
        assert_eq!(period_label(date(2024, 1, 1), date(2024, 12, 31)), "2024");
        assert_eq!(period_label(date(2024, 2, 1), date(2024, 2, 29)), "Feb 2024");
        assert_eq!(
            period_label(date(2023, 7, 1), date(2024, 6, 30)),
            "Jul 2023 - Jun 2024"
        );
        assert_eq!(
            period_label(date(2024, 1, 15), date(2024, 2, 14)),
            "2024-01-15 - 2024-02-14"
        );
    }

    #[test]
    fn test_parse_period_string_month_and_range() {
        let (start, end) = parse_period_string("2023-02").unwrap();
        assert_eq!(start, date(2023, 2, 1));
        assert_eq!(end, date(2023, 2, 28));

        let (start, end) = parse_period_string("2023-01:2023-03").unwrap();
        assert_eq!(start, date(2023, 1, 1));
        assert_eq!(end, date(2023, 3, 31));

        assert!(parse_period_string("2023-01:2023-02:2023-03").is_err());
        assert!(parse_period_string("January").is_err());
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec!(0), 2), "0.00");
        assert_eq!(format_amount(dec!(60), 2), "60.00");
        assert_eq!(format_amount(dec!(1234567.891), 2), "1,234,567.89");
        assert_eq!(format_amount(dec!(-1234.5), 2), "-1,234.50");
        assert_eq!(format_amount(dec!(-0.001), 2), "0.00");
        assert_eq!(format_amount(dec!(999.995), 2), "1,000.00");
        assert_eq!(format_amount(dec!(100), 0), "100");
    }
}
