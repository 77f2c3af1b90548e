//! # Financial Report Builder
//!
//! A library for turning flat ledger postings into hierarchical,
//! period-bucketed financial statements with totals.
//!
//! ## Core Concepts
//!
//! - **Account Tree**: The chart of accounts rebuilt from flat parent references
//! - **Date Ranges**: Report columns; every posting lands in each range that contains it
//! - **Aggregation**: Group accounts hold the sum of their children for every column
//! - **Flattening**: The tree is walked back into indented rows in pre-order
//! - **Totals and Derived Rows**: Synthetic rows such as "Total Profit" = income - expense
//! - **Reports**: Profit & Loss and Balance Sheet assemble those rows in statement order
//!
//! ## Example
//!
//! ```rust,ignore
//! use financial_report_builder::*;
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//!
//! let accounts = vec![
//!     AccountMeta::group("income", AccountRootType::Income).with_name("Income"),
//!     AccountMeta::leaf("sales", AccountRootType::Income)
//!         .with_parent("income")
//!         .with_name("Sales"),
//! ];
//! let postings = vec![Posting::credit(
//!     "sales",
//!     NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
//!     dec!(100),
//! )];
//!
//! let ledger = InMemoryLedger::new(accounts, postings);
//! let mut runner = ReportRunner::new(
//!     ProfitAndLoss,
//!     ledger,
//!     ReportFilters::calendar_year(2024).unwrap(),
//! );
//! runner.set_report_data(None, true).await?;
//!
//! println!("{}", runner.report_data().to_markdown(&runner.columns()));
//! ```

pub mod aggregator;
pub mod balance_sheet;
pub mod error;
pub mod flatten;
pub mod grouping;
pub mod hierarchy;
pub mod ledger;
pub mod profit_and_loss;
pub mod report;
pub mod rows;
pub mod schema;
pub mod totals;
pub mod utils;
pub mod value_map;

pub use aggregator::{aggregate, verify_totals};
pub use balance_sheet::BalanceSheet;
pub use error::{FinancialReportError, IntegrityError, Result};
pub use flatten::{
    convert_root_to_account_list, flatten, get_report_rows_from_account_list,
    get_row_from_account_list_node, AccountListNode,
};
pub use grouping::{group_by_date_ranges, validate_ranges, DateRange, LeafBalance, PeriodBalances};
pub use hierarchy::{AccountTree, AccountTreeNode, NodeId};
pub use ledger::{InMemoryLedger, LedgerQuery, LedgerQueryAdapter};
pub use profit_and_loss::ProfitAndLoss;
pub use report::{
    AccountReport, FilterUpdate, LoadingHandle, RawLedgerData, ReportRunner, RowContext,
    HIDE_GROUP_AMOUNTS,
};
pub use rows::{
    columns_for_periods, Cell, CellAlign, CellColor, CellValue, ColumnType, ReportColumn,
    ReportData, ReportRow,
};
pub use schema::*;
pub use totals::{
    apply_sign_colors, get_derived_node, get_empty_row, get_total_node, get_total_row, total_row,
    DerivedOp,
};
pub use utils::*;
pub use value_map::{PeriodValue, ValueMap};

use log::{debug, info};

pub struct FinancialReportProcessor;

impl FinancialReportProcessor {
    /// Groups postings into `ranges`, builds the account tree and rolls
    /// balances up to every group.
    pub fn process(
        postings: &[Posting],
        accounts: &[AccountMeta],
        ranges: &[DateRange],
    ) -> Result<AccountTree> {
        info!(
            "Building account tree from {} accounts and {} postings",
            accounts.len(),
            postings.len()
        );

        let balances = group_by_date_ranges(postings, accounts, ranges)?;
        let mut tree = AccountTree::build(accounts, &balances)?;
        aggregate(&mut tree);

        debug!(
            "Account tree has {} nodes under {} roots across {} periods",
            tree.len(),
            tree.roots().len(),
            tree.period_keys().len()
        );

        Ok(tree)
    }

    pub fn process_with_verification(
        postings: &[Posting],
        accounts: &[AccountMeta],
        ranges: &[DateRange],
    ) -> Result<AccountTree> {
        let tree = Self::process(postings, accounts, ranges)?;

        verify_totals(&tree)?;

        Ok(tree)
    }
}

pub fn build_account_tree(
    postings: &[Posting],
    accounts: &[AccountMeta],
    ranges: &[DateRange],
) -> Result<AccountTree> {
    FinancialReportProcessor::process(postings, accounts, ranges)
}

pub fn build_account_tree_with_verification(
    postings: &[Posting],
    accounts: &[AccountMeta],
    ranges: &[DateRange],
) -> Result<AccountTree> {
    FinancialReportProcessor::process_with_verification(postings, accounts, ranges)
}
