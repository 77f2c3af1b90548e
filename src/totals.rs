use crate::flatten::{get_row_from_account_list_node, AccountListNode};
use crate::hierarchy::{AccountTree, NodeId};
use crate::rows::{Cell, CellAlign, CellColor, ReportRow};
use crate::value_map::ValueMap;
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedOp {
    Add,
    Subtract,
}

impl DerivedOp {
    pub fn apply(self, a: Decimal, b: Decimal) -> Decimal {
        match self {
            DerivedOp::Add => a + b,
            DerivedOp::Subtract => a - b,
        }
    }
}

/// Copy of `root`'s balances under `label`, at level 0.
pub fn get_total_node(tree: &AccountTree, root: NodeId, label: &str) -> AccountListNode {
    AccountListNode {
        name: label.to_string(),
        level: 0,
        value_map: tree.node(root).value_map.clone(),
        is_group: false,
    }
}

/// `a op b` for every key present in either map; missing keys read as zero.
pub fn derive_value_map(a: &ValueMap, b: &ValueMap, op: DerivedOp) -> ValueMap {
    ValueMap::combine(a, b, |x, y| op.apply(x, y))
}

pub fn get_derived_node(
    label: &str,
    a: &AccountListNode,
    b: &AccountListNode,
    op: DerivedOp,
) -> AccountListNode {
    AccountListNode {
        name: label.to_string(),
        level: 0,
        value_map: derive_value_map(&a.value_map, &b.value_map, op),
        is_group: false,
    }
}

/// Row for a synthetic node with every cell bold.
pub fn get_total_row(node: &AccountListNode, period_keys: &[String]) -> ReportRow {
    let mut row = get_row_from_account_list_node(node, period_keys, false);
    for cell in &mut row.cells {
        cell.bold = true;
    }
    row
}

/// Single bold total row for the subtree under `root`.
pub fn total_row(tree: &AccountTree, root: NodeId, label: &str) -> ReportRow {
    let node = get_total_node(tree, root, label);
    get_total_row(&node, tree.period_keys())
}

/// Marks positive amounts green and negative amounts red. Zero and
/// non-numeric cells get no color.
pub fn apply_sign_colors(row: &mut ReportRow) {
    for cell in &mut row.cells {
        let Some(value) = cell.raw_value.as_amount() else {
            continue;
        };

        if value.is_sign_positive() && !value.is_zero() {
            cell.color = Some(CellColor::Green);
        } else if value.is_sign_negative() && !value.is_zero() {
            cell.color = Some(CellColor::Red);
        }
    }
}

/// Blank separator row with one empty cell per column.
pub fn get_empty_row(period_keys: &[String]) -> ReportRow {
    let mut cells = vec![Cell::empty(CellAlign::Left)];
    cells.extend(period_keys.iter().map(|_| Cell::empty(CellAlign::Right)));
    ReportRow {
        cells,
        level: 0,
        is_group: false,
        is_empty: true,
    }
}
