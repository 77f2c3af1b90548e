use crate::flatten::flatten;
use crate::hierarchy::AccountTree;
use crate::report::{AccountReport, RowContext};
use crate::rows::ReportData;
use crate::schema::AccountRootType;
use crate::totals::{
    get_derived_node, get_empty_row, get_total_node, get_total_row, total_row, DerivedOp,
};

pub const TOTAL_ASSET_LABEL: &str = "Total Asset (Debit)";
pub const TOTAL_LIABILITY_LABEL: &str = "Total Liability (Credit)";
pub const TOTAL_EQUITY_LABEL: &str = "Total Equity (Credit)";
pub const TOTAL_LIABILITY_AND_EQUITY_LABEL: &str = "Total Liability and Equity";

const ROOT_TYPES: [AccountRootType; 3] = [
    AccountRootType::Asset,
    AccountRootType::Liability,
    AccountRootType::Equity,
];

/// Closing balances of asset, liability and equity accounts at the end of
/// each period.
#[derive(Debug, Clone, Copy, Default)]
pub struct BalanceSheet;

impl BalanceSheet {
    pub fn new() -> Self {
        Self
    }
}

impl AccountReport for BalanceSheet {
    fn title(&self) -> &'static str {
        "Balance Sheet"
    }

    fn report_name(&self) -> &'static str {
        "balance-sheet"
    }

    fn root_types(&self) -> &'static [AccountRootType] {
        &ROOT_TYPES
    }

    fn cumulative(&self) -> bool {
        true
    }

    fn assemble_rows(&self, tree: &AccountTree, ctx: &RowContext<'_>) -> ReportData {
        let keys = ctx.period_keys;
        let mut data = ReportData::default();

        let sections = [
            (AccountRootType::Asset, TOTAL_ASSET_LABEL),
            (AccountRootType::Liability, TOTAL_LIABILITY_LABEL),
            (AccountRootType::Equity, TOTAL_EQUITY_LABEL),
        ];

        let mut liability_total = None;
        let mut equity_total = None;

        for (root_type, label) in sections {
            let Some(root) = self.get_root_node(tree, root_type) else {
                continue;
            };

            data.extend(flatten(tree, root, ctx.hide_group_amounts));
            data.push(total_row(tree, root, label));
            data.push(get_empty_row(keys));

            match root_type {
                AccountRootType::Liability => {
                    liability_total = Some(get_total_node(tree, root, label));
                }
                AccountRootType::Equity => equity_total = Some(get_total_node(tree, root, label)),
                _ => {}
            }
        }

        match (liability_total, equity_total) {
            (Some(liability), Some(equity)) => {
                let combined = get_derived_node(
                    TOTAL_LIABILITY_AND_EQUITY_LABEL,
                    &liability,
                    &equity,
                    DerivedOp::Add,
                );
                data.push(get_total_row(&combined, keys));
            }
            _ => {
                // Trailing separator only sits between sections.
                if data.rows().last().is_some_and(|r| r.is_empty) {
                    data.pop();
                }
            }
        }

        data
    }
}
