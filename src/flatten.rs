use crate::hierarchy::{AccountTree, NodeId};
use crate::rows::{Cell, CellAlign, ReportData, ReportRow};
use crate::value_map::ValueMap;
use serde::{Deserialize, Serialize};

/// Linearized view of one tree node. Only the order in which these come out
/// of [`convert_root_to_account_list`] carries the tree shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountListNode {
    pub name: String,
    pub level: usize,
    pub value_map: ValueMap,
    pub is_group: bool,
}

/// Pre-order walk of the subtree under `root`, one entry per node.
pub fn convert_root_to_account_list(tree: &AccountTree, root: NodeId) -> Vec<AccountListNode> {
    tree.pre_order(root)
        .into_iter()
        .map(|id| {
            let node = tree.node(id);
            AccountListNode {
                name: node.name.clone(),
                level: node.level,
                value_map: node.value_map.clone(),
                is_group: !node.is_leaf(),
            }
        })
        .collect()
}

/// One row with the indented name followed by a cell per period key.
/// With `hide_group_amounts` the amounts of group nodes are left blank.
pub fn get_row_from_account_list_node(
    node: &AccountListNode,
    period_keys: &[String],
    hide_group_amounts: bool,
) -> ReportRow {
    let blank = hide_group_amounts && node.is_group;

    let mut cells = Vec::with_capacity(period_keys.len() + 1);
    let mut name = Cell::text(node.name.clone(), node.level);
    name.bold = node.is_group;
    cells.push(name);

    for key in period_keys {
        if blank {
            cells.push(Cell::empty(CellAlign::Right));
        } else {
            cells.push(Cell::amount(node.value_map.balance(key)));
        }
    }

    ReportRow {
        cells,
        level: node.level,
        is_group: node.is_group,
        is_empty: false,
    }
}

pub fn get_report_rows_from_account_list(
    list: &[AccountListNode],
    period_keys: &[String],
    hide_group_amounts: bool,
) -> ReportData {
    list.iter()
        .map(|node| get_row_from_account_list_node(node, period_keys, hide_group_amounts))
        .collect()
}

/// Rows for the subtree under `root` in pre-order.
pub fn flatten(tree: &AccountTree, root: NodeId, hide_group_amounts: bool) -> ReportData {
    let list = convert_root_to_account_list(tree, root);
    get_report_rows_from_account_list(&list, tree.period_keys(), hide_group_amounts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::aggregate;
    use crate::grouping::{group_by_date_ranges, DateRange};
    use crate::rows::CellValue;
    use crate::schema::{AccountMeta, AccountRootType, Posting};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn tree() -> AccountTree {
        let accounts = vec![
            AccountMeta::group("income", AccountRootType::Income).with_name("Income"),
            AccountMeta::group("direct", AccountRootType::Income)
                .with_parent("income")
                .with_name("Direct Income"),
            AccountMeta::leaf("sales", AccountRootType::Income)
                .with_parent("direct")
                .with_name("Sales"),
            AccountMeta::group("indirect", AccountRootType::Income)
                .with_parent("income")
                .with_name("Indirect Income"),
        ];
        let postings = vec![Posting::credit(
            "sales",
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            dec!(100),
        )];
        let ranges = vec![DateRange::from_period("2024-01:2024-12").unwrap()];
        let grouped = group_by_date_ranges(&postings, &accounts, &ranges).unwrap();
        let mut tree = AccountTree::build(&accounts, &grouped).unwrap();
        aggregate(&mut tree);
        tree
    }

    #[test]
    fn test_flatten_emits_every_node_in_pre_order() {
        let tree = tree();
        let root = tree.root_node(AccountRootType::Income).unwrap();
        let rows = flatten(&tree, root, false);

        let names: Vec<&str> = rows.iter().filter_map(|r| r.label()).collect();
        assert_eq!(
            names,
            vec!["Income", "Direct Income", "Sales", "Indirect Income"]
        );

        let levels: Vec<usize> = rows.iter().map(|r| r.level).collect();
        assert_eq!(levels, vec![0, 1, 2, 1]);
        assert_eq!(rows.rows()[2].cells[0].indent, 2);

        let income = rows.find_row("Income").unwrap();
        assert_eq!(income.cells.len(), 2);
        assert_eq!(income.cells[1].raw_value, CellValue::Amount(dec!(100)));
        assert!(income.cells[0].bold);
    }

    #[test]
    fn test_childless_group_is_kept() {
        let tree = tree();
        let root = tree.root_node(AccountRootType::Income).unwrap();
        let rows = flatten(&tree, root, false);

        let indirect = rows.find_row("Indirect Income").unwrap();
        assert!(!indirect.is_group);
        assert_eq!(indirect.cells[1].display_value, "0.00");
    }

    #[test]
    fn test_hide_group_amounts_blanks_only_groups() {
        let tree = tree();
        let root = tree.root_node(AccountRootType::Income).unwrap();
        let shown = flatten(&tree, root, false);
        let hidden = flatten(&tree, root, true);

        assert_eq!(shown.len(), hidden.len());
        for (a, b) in shown.iter().zip(hidden.iter()) {
            assert_eq!(a.label(), b.label());
            assert_eq!(a.level, b.level);
        }

        let income = hidden.find_row("Income").unwrap();
        assert_eq!(income.cells[1].raw_value, CellValue::Empty);
        assert_eq!(income.cells[1].display_value, "");

        let sales = hidden.find_row("Sales").unwrap();
        assert_eq!(sales.cells[1].raw_value, CellValue::Amount(dec!(100)));
    }
}
