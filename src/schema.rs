use crate::error::{FinancialReportError, Result};
use crate::grouping::DateRange;
use crate::utils::{is_month_end, last_day_of_month, period_label, shift_months_back};
use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, JsonSchema,
)]
#[serde(rename_all = "PascalCase")]
pub enum AccountRootType {
    #[schemars(description = "Resources owned: cash, receivables, inventory (debit balance)")]
    Asset,

    #[schemars(description = "Obligations owed to creditors (credit balance)")]
    Liability,

    #[schemars(description = "Owner's residual interest (credit balance)")]
    Equity,

    #[schemars(description = "Revenue and other income (credit balance)")]
    Income,

    #[schemars(description = "Costs and operating expenses (debit balance)")]
    Expense,
}

impl AccountRootType {
    /// Income, Equity and Liability accounts grow with credits.
    pub fn is_credit(self) -> bool {
        matches!(
            self,
            AccountRootType::Income | AccountRootType::Equity | AccountRootType::Liability
        )
    }

    /// Signed amount of a single posting, positive for normal activity on
    /// accounts of this root type.
    pub fn normal_balance(self, debit: Decimal, credit: Decimal) -> Decimal {
        if self.is_credit() {
            credit - debit
        } else {
            debit - credit
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AccountRootType::Asset => "Asset",
            AccountRootType::Liability => "Liability",
            AccountRootType::Equity => "Equity",
            AccountRootType::Income => "Income",
            AccountRootType::Expense => "Expense",
        }
    }
}

impl std::fmt::Display for AccountRootType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the chart of accounts as handed over by the account store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMeta {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub root_type: AccountRootType,
    #[serde(default)]
    pub is_group: bool,
}

impl AccountMeta {
    pub fn group(id: impl Into<String>, root_type: AccountRootType) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            parent_id: None,
            root_type,
            is_group: true,
        }
    }

    pub fn leaf(id: impl Into<String>, root_type: AccountRootType) -> Self {
        Self {
            is_group: false,
            ..Self::group(id, root_type)
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// A single ledger line. Postings are read-only input to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub account_id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub debit: Decimal,
    #[serde(default)]
    pub credit: Decimal,
}

impl Posting {
    pub fn debit(account_id: impl Into<String>, date: NaiveDate, amount: Decimal) -> Self {
        Self {
            account_id: account_id.into(),
            date,
            debit: amount,
            credit: Decimal::ZERO,
        }
    }

    pub fn credit(account_id: impl Into<String>, date: NaiveDate, amount: Decimal) -> Self {
        Self {
            account_id: account_id.into(),
            date,
            debit: Decimal::ZERO,
            credit: amount,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum Periodicity {
    #[schemars(description = "One column per calendar month")]
    Monthly,

    #[schemars(description = "One column per three months")]
    Quarterly,

    #[schemars(description = "One column per six months")]
    HalfYearly,

    #[schemars(description = "One column per twelve months")]
    Yearly,
}

impl Periodicity {
    pub fn months(self) -> u32 {
        match self {
            Periodicity::Monthly => 1,
            Periodicity::Quarterly => 3,
            Periodicity::HalfYearly => 6,
            Periodicity::Yearly => 12,
        }
    }
}

/// Upper bound on `ReportFilters::count`, one hundred years of monthly columns.
pub const MAX_PERIOD_COUNT: u32 = 1200;

/// User-facing filters of an account report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReportFilters {
    #[schemars(description = "Length of each report column")]
    pub periodicity: Periodicity,

    #[schemars(description = "Inclusive last day of the newest column, YYYY-MM-DD")]
    pub to_date: NaiveDate,

    #[schemars(
        description = "Number of columns ending at to_date. Must be between 1 and 1200."
    )]
    pub count: u32,

    #[serde(default)]
    #[schemars(
        description = "Blank the amounts of group accounts. Changing only this filter redraws the report without fetching postings again."
    )]
    pub hide_group_amounts: bool,
}

impl ReportFilters {
    pub fn new(periodicity: Periodicity, to_date: NaiveDate, count: u32) -> Self {
        Self {
            periodicity,
            to_date,
            count,
            hide_group_amounts: false,
        }
    }

    /// A single column covering the calendar year `year`.
    pub fn calendar_year(year: i32) -> Result<Self> {
        Ok(Self::new(Periodicity::Yearly, last_day_of_month(year, 12)?, 1))
    }

    pub fn validate(&self) -> Result<()> {
        if self.count == 0 {
            return Err(FinancialReportError::InvalidFilter(
                "count must be at least 1".to_string(),
            ));
        }
        if self.count > MAX_PERIOD_COUNT {
            return Err(FinancialReportError::InvalidFilter(format!(
                "count {} exceeds the maximum of {}",
                self.count, MAX_PERIOD_COUNT
            )));
        }
        Ok(())
    }

    /// Consecutive periods ending at `to_date`, oldest first.
    pub fn date_ranges(&self) -> Result<Vec<DateRange>> {
        self.validate()?;

        let step = self.periodicity.months();
        let mut ranges = Vec::new();
        let mut end = self.to_date;

        for _ in 0..self.count {
            let prev_end = shift_months_back(end, step)?;
            let from = next_day(prev_end)?;
            let to = next_day(end)?;
            ranges.push(DateRange::new(period_label(from, end), Some(from), to));
            end = prev_end;
        }

        ranges.reverse();
        Ok(ranges)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let filters: Self = serde_json::from_str(json)?;
        filters.validate()?;
        Ok(filters)
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ReportFilters)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }

    /// True when `to_date` closes a calendar month, which keeps every
    /// generated column aligned to whole months.
    pub fn is_month_aligned(&self) -> bool {
        is_month_end(self.to_date)
    }
}

fn next_day(date: NaiveDate) -> Result<NaiveDate> {
    date.checked_add_days(Days::new(1))
        .ok_or_else(|| FinancialReportError::DateError(format!("Date overflow after {}", date)))
}
