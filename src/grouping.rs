use crate::error::{FinancialReportError, IntegrityError, Result};
use crate::schema::{AccountMeta, AccountRootType, Posting};
use crate::utils::{parse_period_string, period_label};
use crate::value_map::ValueMap;
use chrono::{Days, NaiveDate};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One report column. Covers `[from_date, to_date)`; a `from_date` of `None`
/// is open towards the past, which gives cumulative (balance-style) columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub label: String,
    pub from_date: Option<NaiveDate>,
    pub to_date: NaiveDate,
}

impl DateRange {
    pub fn new(label: impl Into<String>, from_date: Option<NaiveDate>, to_date: NaiveDate) -> Self {
        Self {
            label: label.into(),
            from_date,
            to_date,
        }
    }

    /// A single `"Total"` column.
    pub fn total(from_date: NaiveDate, to_date: NaiveDate) -> Self {
        Self::new("Total", Some(from_date), to_date)
    }

    /// Builds a column from `"YYYY-MM"` or `"YYYY-MM:YYYY-MM"`.
    pub fn from_period(period: &str) -> Result<Self> {
        let (start, end) = parse_period_string(period)?;
        let to_date = end.checked_add_days(Days::new(1)).ok_or_else(|| {
            FinancialReportError::DateError(format!("Date overflow after {}", end))
        })?;
        Ok(Self::new(period_label(start, end), Some(start), to_date))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from_date.map_or(true, |from| date >= from) && date < self.to_date
    }

    /// Same column, open towards the past.
    pub fn cumulative(&self) -> Self {
        Self {
            from_date: None,
            ..self.clone()
        }
    }
}

/// Checks that labels are unique and no range ends before it starts.
pub fn validate_ranges(ranges: &[DateRange]) -> Result<()> {
    let mut seen = HashSet::new();
    for range in ranges {
        if !seen.insert(range.label.as_str()) {
            return Err(FinancialReportError::DuplicatePeriodKey(range.label.clone()));
        }
        if let Some(from) = range.from_date {
            if range.to_date < from {
                return Err(FinancialReportError::InvalidDateRange {
                    label: range.label.clone(),
                    details: format!("ends on {} before it starts on {}", range.to_date, from),
                });
            }
        }
    }
    Ok(())
}

/// Period balances of one posted account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeafBalance {
    pub value_map: ValueMap,
    /// Postings that landed in at least one column.
    pub posting_count: usize,
}

/// Output of the grouper: the active period keys in column order and the
/// per-account balances keyed by account id.
#[derive(Debug, Clone, Default)]
pub struct PeriodBalances {
    pub keys: Vec<String>,
    pub leaves: HashMap<String, LeafBalance>,
}

impl PeriodBalances {
    pub fn get(&self, account_id: &str) -> Option<&LeafBalance> {
        self.leaves.get(account_id)
    }
}

/// Buckets postings into the requested columns.
///
/// Each posting is signed by its account's root type and added to every
/// range that contains its date, so overlapping ranges are computed
/// independently. A posting outside all ranges contributes to none.
pub fn group_by_date_ranges(
    postings: &[Posting],
    accounts: &[AccountMeta],
    ranges: &[DateRange],
) -> Result<PeriodBalances> {
    validate_ranges(ranges)?;

    let root_types: HashMap<&str, AccountRootType> = accounts
        .iter()
        .map(|a| (a.id.as_str(), a.root_type))
        .collect();

    let keys: Vec<String> = ranges.iter().map(|r| r.label.clone()).collect();
    let mut leaves: HashMap<String, LeafBalance> = HashMap::new();
    let mut skipped = 0usize;

    for posting in postings {
        let root_type = *root_types.get(posting.account_id.as_str()).ok_or_else(|| {
            IntegrityError::UnknownAccount {
                account: posting.account_id.clone(),
            }
        })?;

        let amount = root_type.normal_balance(posting.debit, posting.credit);
        let mut landed = false;

        for range in ranges.iter().filter(|r| r.contains(posting.date)) {
            let leaf = leaves
                .entry(posting.account_id.clone())
                .or_insert_with(|| LeafBalance {
                    value_map: ValueMap::with_keys(keys.iter().cloned()),
                    posting_count: 0,
                });
            leaf.value_map.add(range.label.as_str(), amount);
            landed = true;
        }

        if landed {
            if let Some(leaf) = leaves.get_mut(&posting.account_id) {
                leaf.posting_count += 1;
            }
        } else {
            skipped += 1;
        }
    }

    debug!(
        "Grouped {} postings into {} columns for {} accounts ({} outside every range)",
        postings.len(),
        keys.len(),
        leaves.len(),
        skipped
    );

    Ok(PeriodBalances { keys, leaves })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn accounts() -> Vec<AccountMeta> {
        vec![
            AccountMeta::group("income", AccountRootType::Income),
            AccountMeta::leaf("sales", AccountRootType::Income).with_parent("income"),
            AccountMeta::group("expense", AccountRootType::Expense),
            AccountMeta::leaf("rent", AccountRootType::Expense).with_parent("expense"),
        ]
    }

    fn quarters() -> Vec<DateRange> {
        vec![
            DateRange::from_period("2024-01:2024-03").unwrap(),
            DateRange::from_period("2024-04:2024-06").unwrap(),
        ]
    }

    #[test]
    fn test_postings_land_in_their_period() {
        let postings = vec![
            Posting::credit("sales", date(2024, 1, 15), dec!(100)),
            Posting::credit("sales", date(2024, 3, 31), dec!(20)),
            Posting::credit("sales", date(2024, 4, 1), dec!(50)),
            Posting::debit("sales", date(2024, 5, 2), dec!(5)),
            Posting::debit("rent", date(2024, 6, 30), dec!(40)),
        ];

        let grouped = group_by_date_ranges(&postings, &accounts(), &quarters()).unwrap();
        assert_eq!(grouped.keys, vec!["Jan 2024 - Mar 2024", "Apr 2024 - Jun 2024"]);

        let sales = grouped.get("sales").unwrap();
        assert_eq!(sales.value_map.balance("Jan 2024 - Mar 2024"), dec!(120));
        assert_eq!(sales.value_map.balance("Apr 2024 - Jun 2024"), dec!(45));
        assert_eq!(sales.posting_count, 4);

        let rent = grouped.get("rent").unwrap();
        assert_eq!(rent.value_map.balance("Jan 2024 - Mar 2024"), dec!(0));
        assert_eq!(rent.value_map.balance("Apr 2024 - Jun 2024"), dec!(40));

        let keys: Vec<&str> = rent.value_map.keys().collect();
        assert_eq!(keys, vec!["Jan 2024 - Mar 2024", "Apr 2024 - Jun 2024"]);
    }

    #[test]
    fn test_posting_outside_every_range_is_ignored() {
        let postings = vec![Posting::credit("sales", date(2023, 12, 31), dec!(100))];
        let grouped = group_by_date_ranges(&postings, &accounts(), &quarters()).unwrap();
        assert!(grouped.get("sales").is_none());
    }

    #[test]
    fn test_empty_range_list_is_not_an_error() {
        let postings = vec![Posting::credit("sales", date(2024, 1, 1), dec!(100))];
        let grouped = group_by_date_ranges(&postings, &accounts(), &[]).unwrap();
        assert!(grouped.keys.is_empty());
        assert!(grouped.leaves.is_empty());
    }

    #[test]
    fn test_cumulative_range_includes_history() {
        let postings = vec![
            Posting::credit("sales", date(2020, 1, 1), dec!(10)),
            Posting::credit("sales", date(2024, 1, 1), dec!(5)),
        ];
        let range = DateRange::from_period("2024-01").unwrap().cumulative();
        let grouped = group_by_date_ranges(&postings, &accounts(), &[range]).unwrap();
        assert_eq!(grouped.get("sales").unwrap().value_map.balance("Jan 2024"), dec!(15));
    }

    #[test]
    fn test_unknown_account_is_an_integrity_error() {
        let postings = vec![Posting::debit("ghost", date(2024, 1, 1), dec!(1))];
        let err = group_by_date_ranges(&postings, &accounts(), &quarters()).unwrap_err();
        assert!(matches!(
            err,
            FinancialReportError::Integrity(IntegrityError::UnknownAccount { .. })
        ));
    }

    #[test]
    fn test_duplicate_labels_are_rejected() {
        let ranges = vec![
            DateRange::total(date(2024, 1, 1), date(2024, 7, 1)),
            DateRange::total(date(2023, 1, 1), date(2023, 7, 1)),
        ];
        assert!(matches!(
            validate_ranges(&ranges),
            Err(FinancialReportError::DuplicatePeriodKey(_))
        ));

        let backwards = vec![DateRange::new("oops", Some(date(2024, 2, 1)), date(2024, 1, 1))];
        assert!(matches!(
            validate_ranges(&backwards),
            Err(FinancialReportError::InvalidDateRange { .. })
        ));
    }
}
