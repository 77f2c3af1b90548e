use crate::flatten::flatten;
use crate::hierarchy::AccountTree;
use crate::report::{AccountReport, RowContext};
use crate::rows::ReportData;
use crate::schema::AccountRootType;
use crate::totals::{
    apply_sign_colors, get_derived_node, get_empty_row, get_total_node, get_total_row, total_row,
    DerivedOp,
};
use log::debug;

pub const TOTAL_INCOME_LABEL: &str = "Total Income (Credit)";
pub const TOTAL_EXPENSE_LABEL: &str = "Total Expense (Debit)";
pub const TOTAL_PROFIT_LABEL: &str = "Total Profit";

const ROOT_TYPES: [AccountRootType; 2] = [AccountRootType::Income, AccountRootType::Expense];

/// Income and expense for each period, with profit as their difference.
///
/// Both sides are positive for normal activity, so the profit row is
/// `income - expense` key by key.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfitAndLoss;

impl ProfitAndLoss {
    pub fn new() -> Self {
        Self
    }
}

impl AccountReport for ProfitAndLoss {
    fn title(&self) -> &'static str {
        "Profit And Loss"
    }

    fn report_name(&self) -> &'static str {
        "profit-and-loss"
    }

    fn root_types(&self) -> &'static [AccountRootType] {
        &ROOT_TYPES
    }

    fn assemble_rows(&self, tree: &AccountTree, ctx: &RowContext<'_>) -> ReportData {
        let keys = ctx.period_keys;
        let income = self.get_root_node(tree, AccountRootType::Income);
        let expense = self.get_root_node(tree, AccountRootType::Expense);

        let mut data = ReportData::default();
        match (income, expense) {
            (Some(income), Some(expense)) => {
                let income_total = get_total_node(tree, income, TOTAL_INCOME_LABEL);
                let expense_total = get_total_node(tree, expense, TOTAL_EXPENSE_LABEL);

                data.extend(flatten(tree, income, ctx.hide_group_amounts));
                data.push(total_row(tree, income, TOTAL_INCOME_LABEL));
                data.push(get_empty_row(keys));

                data.extend(flatten(tree, expense, ctx.hide_group_amounts));
                data.push(total_row(tree, expense, TOTAL_EXPENSE_LABEL));
                data.push(get_empty_row(keys));

                let profit = get_derived_node(
                    TOTAL_PROFIT_LABEL,
                    &income_total,
                    &expense_total,
                    DerivedOp::Subtract,
                );
                let mut profit_row = get_total_row(&profit, keys);
                apply_sign_colors(&mut profit_row);
                data.push(profit_row);
            }
            (Some(root), None) | (None, Some(root)) => {
                let label = if income.is_some() {
                    TOTAL_INCOME_LABEL
                } else {
                    TOTAL_EXPENSE_LABEL
                };
                data.extend(flatten(tree, root, ctx.hide_group_amounts));
                data.push(total_row(tree, root, label));
            }
            (None, None) => {
                debug!("No income or expense postings, profit and loss is empty");
            }
        }

        data
    }
}
