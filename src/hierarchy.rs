use crate::error::{IntegrityError, Result};
use crate::grouping::PeriodBalances;
use crate::schema::{AccountMeta, AccountRootType};
use crate::value_map::ValueMap;
use log::{debug, warn};
use std::collections::{BTreeMap, HashMap};

/// Index of a node inside its [`AccountTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountTreeNode {
    pub account_id: String,
    pub name: String,
    pub root_type: AccountRootType,
    /// Depth below the top-level account, which sits at 0.
    pub level: usize,
    /// Group flag as declared by the account store.
    pub is_group: bool,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub value_map: ValueMap,
    /// Postings that reached this node, directly or through descendants.
    pub posting_count: usize,
}

impl AccountTreeNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn has_postings(&self) -> bool {
        self.posting_count > 0
    }
}

/// The chart of accounts for one report run, stored as a flat arena.
///
/// Nodes appear in account metadata order and every node is owned by the
/// arena; parent/child edges are plain indices, so there is no shared
/// mutable state between nodes.
#[derive(Debug, Clone, Default)]
pub struct AccountTree {
    nodes: Vec<AccountTreeNode>,
    roots: Vec<NodeId>,
    period_keys: Vec<String>,
}

impl AccountTree {
    /// Builds the tree from account metadata and grouped leaf balances.
    ///
    /// Group balances are left at zero; run [`crate::aggregator::aggregate`]
    /// to fill them in.
    pub fn build(accounts: &[AccountMeta], balances: &PeriodBalances) -> Result<Self> {
        let mut index: HashMap<&str, usize> = HashMap::with_capacity(accounts.len());
        for (i, account) in accounts.iter().enumerate() {
            if index.insert(account.id.as_str(), i).is_some() {
                return Err(IntegrityError::DuplicateAccount {
                    account: account.id.clone(),
                }
                .into());
            }
        }

        let parents = resolve_parents(accounts, &index)?;
        let levels = compute_levels(accounts, &parents)?;

        let mut nodes: Vec<AccountTreeNode> = accounts
            .iter()
            .zip(levels)
            .map(|(account, level)| AccountTreeNode {
                account_id: account.id.clone(),
                name: account.name.clone(),
                root_type: account.root_type,
                level,
                is_group: account.is_group,
                parent: None,
                children: Vec::new(),
                value_map: ValueMap::with_keys(balances.keys.iter().cloned()),
                posting_count: 0,
            })
            .collect();

        let mut roots = Vec::new();
        for (i, parent) in parents.iter().enumerate() {
            match parent {
                Some(p) => {
                    nodes[i].parent = Some(NodeId(*p));
                    nodes[*p].children.push(NodeId(i));
                }
                None => roots.push(NodeId(i)),
            }
        }

        for (account_id, leaf) in &balances.leaves {
            let idx = *index.get(account_id.as_str()).ok_or_else(|| {
                IntegrityError::UnknownAccount {
                    account: account_id.clone(),
                }
            })?;

            let node = &mut nodes[idx];
            if leaf.posting_count > 0 && (node.is_group || !node.children.is_empty()) {
                return Err(IntegrityError::PostingToGroup {
                    account: account_id.clone(),
                }
                .into());
            }

            node.value_map.accumulate(&leaf.value_map);
            node.posting_count = leaf.posting_count;
        }

        let mut seen_root_types = Vec::new();
        for root in &roots {
            let node = &nodes[root.0];
            if seen_root_types.contains(&node.root_type) {
                warn!(
                    "Top-level account '{}' shares root type {} with an earlier top-level account; only the first is used as the report root",
                    node.account_id, node.root_type
                );
            } else {
                seen_root_types.push(node.root_type);
            }
        }

        debug!(
            "Built account tree with {} nodes, {} top-level accounts and {} period keys",
            nodes.len(),
            roots.len(),
            balances.keys.len()
        );

        Ok(Self {
            nodes,
            roots,
            period_keys: balances.keys.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &AccountTreeNode {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut AccountTreeNode {
        &mut self.nodes[id.0]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &AccountTreeNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Top-level accounts in metadata order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Column keys shared by every node's value map.
    pub fn period_keys(&self) -> &[String] {
        &self.period_keys
    }

    pub fn find(&self, account_id: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.account_id == account_id)
            .map(NodeId)
    }

    /// The first top-level account of `root_type`.
    pub fn root_node(&self, root_type: AccountRootType) -> Option<NodeId> {
        self.roots
            .iter()
            .copied()
            .find(|id| self.nodes[id.0].root_type == root_type)
    }

    /// Report root for each root type present at the top level.
    pub fn root_map(&self) -> BTreeMap<AccountRootType, NodeId> {
        let mut map = BTreeMap::new();
        for id in &self.roots {
            map.entry(self.nodes[id.0].root_type).or_insert(*id);
        }
        map
    }

    /// Node ids of the subtree under `root` in pre-order, siblings in
    /// metadata order.
    pub fn pre_order(&self, root: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        order
    }

    /// Node ids of the whole forest with every child before its parent.
    pub fn post_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(NodeId, bool)> =
            self.roots.iter().rev().map(|id| (*id, false)).collect();
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                order.push(id);
                continue;
            }
            stack.push((id, true));
            stack.extend(self.nodes[id.0].children.iter().rev().map(|c| (*c, false)));
        }
        order
    }
}

fn resolve_parents(
    accounts: &[AccountMeta],
    index: &HashMap<&str, usize>,
) -> Result<Vec<Option<usize>>> {
    let mut parents = Vec::with_capacity(accounts.len());
    for account in accounts {
        let parent = match account.parent_id.as_deref() {
            None => None,
            Some(parent) if parent == account.id => {
                return Err(IntegrityError::Cycle {
                    account: account.id.clone(),
                }
                .into());
            }
            Some(parent) => match index.get(parent) {
                Some(idx) => Some(*idx),
                None => {
                    return Err(IntegrityError::DanglingParent {
                        account: account.id.clone(),
                        parent: parent.to_string(),
                    }
                    .into());
                }
            },
        };
        parents.push(parent);
    }
    Ok(parents)
}

/// Depth of every account, walking each parent chain at most once.
fn compute_levels(accounts: &[AccountMeta], parents: &[Option<usize>]) -> Result<Vec<usize>> {
    let mut levels: Vec<Option<usize>> = vec![None; accounts.len()];
    let mut on_path = vec![false; accounts.len()];

    for start in 0..accounts.len() {
        let mut path = Vec::new();
        let mut current = start;

        let base = loop {
            if let Some(level) = levels[current] {
                break Some(level);
            }
            if on_path[current] {
                return Err(IntegrityError::Cycle {
                    account: accounts[current].id.clone(),
                }
                .into());
            }
            on_path[current] = true;
            path.push(current);
            match parents[current] {
                Some(parent) => current = parent,
                None => break None,
            }
        };

        // The last node on the path is either a top-level account or the
        // child of an already resolved node.
        let mut level = base.map_or(0, |l| l + 1);
        for &node in path.iter().rev() {
            levels[node] = Some(level);
            on_path[node] = false;
            level += 1;
        }
    }

    Ok(levels.into_iter().map(|l| l.unwrap_or_default()).collect())
}
