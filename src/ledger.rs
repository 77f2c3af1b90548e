use crate::error::Result;
use crate::schema::{AccountMeta, AccountRootType, Posting};
use chrono::NaiveDate;
use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Postings wanted for one report run. Dates are half-open,
/// `[from_date, to_date)`; no `from_date` means from the beginning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerQuery {
    pub root_types: Vec<AccountRootType>,
    pub from_date: Option<NaiveDate>,
    pub to_date: NaiveDate,
}

/// Source of postings and account metadata.
///
/// Fetching is the only step of a report run that may suspend. Failures
/// are reported as [`crate::FinancialReportError::DataFetch`] and reach the
/// caller unchanged; retries are up to the implementation.
pub trait LedgerQueryAdapter: Send + Sync {
    fn fetch_postings<'a>(&'a self, query: &'a LedgerQuery) -> BoxFuture<'a, Result<Vec<Posting>>>;

    /// Must include every ancestor of every posted account.
    fn fetch_account_metas(&self) -> BoxFuture<'_, Result<Vec<AccountMeta>>>;
}

/// Adapter over postings and accounts held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    accounts: Vec<AccountMeta>,
    postings: Vec<Posting>,
}

impl InMemoryLedger {
    pub fn new(accounts: Vec<AccountMeta>, postings: Vec<Posting>) -> Self {
        Self { accounts, postings }
    }

    pub fn accounts(&self) -> &[AccountMeta] {
        &self.accounts
    }

    pub fn postings(&self) -> &[Posting] {
        &self.postings
    }

    /// Postings inside the query's date span whose account has one of the
    /// requested root types. Postings on unknown accounts are passed
    /// through so the tree builder can report them.
    pub fn query(&self, query: &LedgerQuery) -> Vec<Posting> {
        let root_types: HashMap<&str, AccountRootType> = self
            .accounts
            .iter()
            .map(|a| (a.id.as_str(), a.root_type))
            .collect();

        self.postings
            .iter()
            .filter(|p| query.from_date.map_or(true, |from| p.date >= from))
            .filter(|p| p.date < query.to_date)
            .filter(|p| match root_types.get(p.account_id.as_str()) {
                Some(root_type) => query.root_types.contains(root_type),
                None => true,
            })
            .cloned()
            .collect()
    }
}

impl LedgerQueryAdapter for InMemoryLedger {
    fn fetch_postings<'a>(&'a self, query: &'a LedgerQuery) -> BoxFuture<'a, Result<Vec<Posting>>> {
        async move { Ok(self.query(query)) }.boxed()
    }

    fn fetch_account_metas(&self) -> BoxFuture<'_, Result<Vec<AccountMeta>>> {
        async move { Ok(self.accounts.clone()) }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ledger() -> InMemoryLedger {
        InMemoryLedger::new(
            vec![
                AccountMeta::leaf("sales", AccountRootType::Income),
                AccountMeta::leaf("cash", AccountRootType::Asset),
            ],
            vec![
                Posting::credit("sales", date(2024, 1, 1), dec!(100)),
                Posting::debit("cash", date(2024, 1, 1), dec!(100)),
                Posting::credit("sales", date(2024, 2, 1), dec!(50)),
                Posting::credit("ghost", date(2024, 1, 5), dec!(1)),
            ],
        )
    }

    #[tokio::test]
    async fn test_fetch_filters_by_root_type_and_span() {
        let ledger = ledger();
        let query = LedgerQuery {
            root_types: vec![AccountRootType::Income],
            from_date: Some(date(2024, 1, 1)),
            to_date: date(2024, 2, 1),
        };

        let postings = ledger.fetch_postings(&query).await.unwrap();
        let accounts: Vec<&str> = postings.iter().map(|p| p.account_id.as_str()).collect();
        assert_eq!(accounts, vec!["sales", "ghost"]);
    }

    #[tokio::test]
    async fn test_open_start_query() {
        let ledger = ledger();
        let query = LedgerQuery {
            root_types: vec![AccountRootType::Asset],
            from_date: None,
            to_date: date(2030, 1, 1),
        };
        assert_eq!(ledger.fetch_postings(&query).await.unwrap().len(), 2);
        assert_eq!(ledger.fetch_account_metas().await.unwrap().len(), 2);
    }
}
