use crate::error::{IntegrityError, Result};
use crate::hierarchy::AccountTree;
use crate::value_map::ValueMap;
use log::debug;

/// Rolls leaf balances up the tree so every group holds the sum of its
/// children, key by key. Children are always summed before their parent.
pub fn aggregate(tree: &mut AccountTree) {
    let keys: Vec<String> = tree.period_keys().to_vec();
    let mut groups = 0usize;

    for id in tree.post_order() {
        let children = tree.node(id).children.clone();
        if children.is_empty() {
            continue;
        }

        let mut total = ValueMap::with_keys(keys.iter().cloned());
        let mut posting_count = 0;
        for child in &children {
            let child = tree.node(*child);
            total.accumulate(&child.value_map);
            posting_count += child.posting_count;
        }

        let node = tree.node_mut(id);
        node.value_map = total;
        node.posting_count = posting_count;
        groups += 1;
    }

    debug!("Aggregated {} group accounts", groups);
}

/// Checks that every group equals the sum of its children for every key
/// present on the group or any child.
pub fn verify_totals(tree: &AccountTree) -> Result<()> {
    for (_, node) in tree.nodes() {
        if node.is_leaf() {
            continue;
        }

        let mut expected = ValueMap::new();
        for child in &node.children {
            expected.accumulate(&tree.node(*child).value_map);
        }

        for key in node.value_map.keys().chain(expected.keys()) {
            let actual = node.value_map.balance(key);
            let sum = expected.balance(key);
            if actual != sum {
                return Err(IntegrityError::TotalMismatch {
                    account: node.account_id.clone(),
                    key: key.to_string(),
                    actual: actual.to_string(),
                    expected: sum.to_string(),
                }
                .into());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FinancialReportError;
    use crate::grouping::{group_by_date_ranges, DateRange};
    use crate::schema::{AccountMeta, AccountRootType, Posting};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn build(postings: &[Posting], ranges: &[DateRange]) -> AccountTree {
        let accounts = vec![
            AccountMeta::group("expense", AccountRootType::Expense),
            AccountMeta::group("office", AccountRootType::Expense).with_parent("expense"),
            AccountMeta::leaf("rent", AccountRootType::Expense).with_parent("office"),
            AccountMeta::leaf("power", AccountRootType::Expense).with_parent("office"),
            AccountMeta::leaf("travel", AccountRootType::Expense).with_parent("expense"),
            AccountMeta::group("empty", AccountRootType::Expense).with_parent("expense"),
        ];
        let grouped = group_by_date_ranges(postings, &accounts, ranges).unwrap();
        AccountTree::build(&accounts, &grouped).unwrap()
    }

    #[test]
    fn test_groups_sum_their_children() {
        let ranges = vec![
            DateRange::from_period("2024-01").unwrap(),
            DateRange::from_period("2024-02").unwrap(),
        ];
        let postings = vec![
            Posting::debit("rent", date(2024, 1, 1), dec!(1000)),
            Posting::debit("rent", date(2024, 2, 1), dec!(1000)),
            Posting::debit("power", date(2024, 1, 20), dec!(120.55)),
            Posting::debit("travel", date(2024, 2, 14), dec!(300)),
            Posting::credit("travel", date(2024, 2, 15), dec!(25)),
        ];
        let mut tree = build(&postings, &ranges);
        aggregate(&mut tree);

        let office = tree.node(tree.find("office").unwrap());
        assert_eq!(office.value_map.balance("Jan 2024"), dec!(1120.55));
        assert_eq!(office.value_map.balance("Feb 2024"), dec!(1000));
        assert_eq!(office.posting_count, 3);

        let expense = tree.node(tree.find("expense").unwrap());
        assert_eq!(expense.value_map.balance("Jan 2024"), dec!(1120.55));
        assert_eq!(expense.value_map.balance("Feb 2024"), dec!(1275));
        assert_eq!(expense.posting_count, 5);

        let empty = tree.node(tree.find("empty").unwrap());
        assert!(empty.value_map.is_zero());

        verify_totals(&tree).unwrap();
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let ranges = vec![DateRange::from_period("2024-01").unwrap()];
        let postings = vec![Posting::debit("rent", date(2024, 1, 1), dec!(10))];
        let mut tree = build(&postings, &ranges);
        aggregate(&mut tree);
        let first = tree.node(tree.find("expense").unwrap()).clone();
        aggregate(&mut tree);
        assert_eq!(tree.node(tree.find("expense").unwrap()), &first);
    }

    #[test]
    fn test_verify_detects_unaggregated_tree() {
        let ranges = vec![DateRange::from_period("2024-01").unwrap()];
        let postings = vec![Posting::debit("rent", date(2024, 1, 1), dec!(10))];
        let tree = build(&postings, &ranges);

        let err = verify_totals(&tree).unwrap_err();
        assert!(matches!(
            err,
            FinancialReportError::Integrity(IntegrityError::TotalMismatch { .. })
        ));
    }
}
