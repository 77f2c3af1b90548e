use crate::error::{FinancialReportError, Result};
use crate::grouping::DateRange;
use crate::hierarchy::{AccountTree, NodeId};
use crate::ledger::{LedgerQuery, LedgerQueryAdapter};
use crate::rows::{columns_for_periods, ReportColumn, ReportData};
use crate::schema::{AccountMeta, AccountRootType, Periodicity, Posting, ReportFilters};
use chrono::NaiveDate;
use log::{debug, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Filter name that only changes how rows are drawn.
pub const HIDE_GROUP_AMOUNTS: &str = "hideGroupAmounts";

/// Per-run inputs handed to a report when it lays out its rows.
#[derive(Debug, Clone, Copy)]
pub struct RowContext<'a> {
    pub period_keys: &'a [String],
    pub hide_group_amounts: bool,
}

/// A concrete statement built on the shared account tree.
///
/// Implementations only choose which root types take part and how their
/// rows, totals and derived rows are ordered.
pub trait AccountReport: Send + Sync {
    fn title(&self) -> &'static str;

    fn report_name(&self) -> &'static str;

    fn root_types(&self) -> &'static [AccountRootType];

    /// Balance-style reports take every column from the beginning of time.
    fn cumulative(&self) -> bool {
        false
    }

    fn assemble_rows(&self, tree: &AccountTree, ctx: &RowContext<'_>) -> ReportData;

    /// Report root of `root_type`, or `None` when nothing was posted under it.
    fn get_root_node(&self, tree: &AccountTree, root_type: AccountRootType) -> Option<NodeId> {
        tree.root_node(root_type)
            .filter(|id| tree.node(*id).has_postings())
    }
}

/// Postings and accounts fetched for the current filters.
#[derive(Debug, Clone, Default)]
pub struct RawLedgerData {
    pub accounts: Vec<AccountMeta>,
    pub postings: Vec<Posting>,
}

/// Read-only view of a runner's loading flag that can be moved to other
/// tasks.
#[derive(Debug, Clone)]
pub struct LoadingHandle(Arc<AtomicBool>);

impl LoadingHandle {
    pub fn is_loading(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Holds the flag up for the lifetime of a run, including early returns and
/// a dropped future.
struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn start(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterUpdate {
    Periodicity(Periodicity),
    ToDate(NaiveDate),
    Count(u32),
    HideGroupAmounts(bool),
}

impl FilterUpdate {
    /// Parses a filter change from its name and a string value, e.g.
    /// `("toDate", "2024-12-31")` or `("periodicity", "Quarterly")`.
    pub fn parse(name: &str, value: &str) -> Result<Self> {
        let invalid = |details: String| {
            FinancialReportError::InvalidFilter(format!("{} = '{}': {}", name, value, details))
        };

        match name {
            "periodicity" => serde_json::from_value(serde_json::Value::String(value.to_string()))
                .map(FilterUpdate::Periodicity)
                .map_err(|e| invalid(e.to_string())),
            "toDate" => NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map(FilterUpdate::ToDate)
                .map_err(|e| invalid(e.to_string())),
            "count" => value
                .parse::<u32>()
                .map(FilterUpdate::Count)
                .map_err(|e| invalid(e.to_string())),
            HIDE_GROUP_AMOUNTS => value
                .parse::<bool>()
                .map(FilterUpdate::HideGroupAmounts)
                .map_err(|e| invalid(e.to_string())),
            _ => Err(FinancialReportError::InvalidFilter(format!(
                "Unknown filter '{}'",
                name
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FilterUpdate::Periodicity(_) => "periodicity",
            FilterUpdate::ToDate(_) => "toDate",
            FilterUpdate::Count(_) => "count",
            FilterUpdate::HideGroupAmounts(_) => HIDE_GROUP_AMOUNTS,
        }
    }
}

/// Drives one report: `Idle -> Loading -> Ready`.
///
/// The runner owns its cache and its last result, so two runners never
/// share aggregation state. Runs take `&mut self` and are therefore
/// serialized per runner.
pub struct ReportRunner<R, L> {
    report: R,
    ledger: L,
    filters: ReportFilters,
    raw: Option<RawLedgerData>,
    report_data: ReportData,
    period_keys: Vec<String>,
    loading: Arc<AtomicBool>,
}

impl<R: AccountReport, L: LedgerQueryAdapter> ReportRunner<R, L> {
    pub fn new(report: R, ledger: L, filters: ReportFilters) -> Self {
        Self {
            report,
            ledger,
            filters,
            raw: None,
            report_data: ReportData::default(),
            period_keys: Vec::new(),
            loading: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn report(&self) -> &R {
        &self.report
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn filters(&self) -> &ReportFilters {
        &self.filters
    }

    pub fn report_data(&self) -> &ReportData {
        &self.report_data
    }

    pub fn loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    pub fn loading_handle(&self) -> LoadingHandle {
        LoadingHandle(Arc::clone(&self.loading))
    }

    pub fn has_cached_data(&self) -> bool {
        self.raw.is_some()
    }

    /// Drops fetched postings so the next run queries the ledger again.
    pub fn invalidate_cache(&mut self) {
        self.raw = None;
    }

    /// Columns of the last completed run.
    pub fn columns(&self) -> Vec<ReportColumn> {
        columns_for_periods(&self.period_keys)
    }

    /// Report columns for the current filters, open towards the past for
    /// cumulative reports.
    pub fn date_ranges(&self) -> Result<Vec<DateRange>> {
        let ranges = self.filters.date_ranges()?;
        if self.report.cumulative() {
            Ok(ranges.iter().map(DateRange::cumulative).collect())
        } else {
            Ok(ranges)
        }
    }

    /// Recomputes `report_data`.
    ///
    /// The ledger is queried again when `force` is set, when `filter` is
    /// anything other than `"hideGroupAmounts"`, or when nothing is cached.
    /// On error the previous `report_data` is kept.
    pub async fn set_report_data(&mut self, filter: Option<&str>, force: bool) -> Result<()> {
        let loading = Arc::clone(&self.loading);
        let _guard = LoadingGuard::start(&loading);

        info!(
            "Building {} report (filter: {:?}, force: {})",
            self.report.title(),
            filter,
            force
        );

        let ranges = self.date_ranges()?;

        let display_only = !force && filter == Some(HIDE_GROUP_AMOUNTS);
        let raw = match self.raw.take() {
            Some(raw) if display_only => {
                debug!("Reusing cached ledger data for display-only filter");
                raw
            }
            _ => self.fetch_raw_data(&ranges).await?,
        };

        let tree = crate::build_account_tree(&raw.postings, &raw.accounts, &ranges);
        self.raw = Some(raw);
        let tree = tree?;

        let ctx = RowContext {
            period_keys: tree.period_keys(),
            hide_group_amounts: self.filters.hide_group_amounts,
        };
        let data = self.report.assemble_rows(&tree, &ctx);

        info!(
            "Built {} report with {} rows across {} columns",
            self.report.report_name(),
            data.len(),
            ranges.len()
        );

        self.period_keys = tree.period_keys().to_vec();
        self.report_data = data;
        Ok(())
    }

    /// Applies one filter change and redraws the report.
    pub async fn set_filter(&mut self, update: FilterUpdate) -> Result<()> {
        let name = update.name();
        let mut filters = self.filters.clone();
        match update {
            FilterUpdate::Periodicity(p) => filters.periodicity = p,
            FilterUpdate::ToDate(d) => filters.to_date = d,
            FilterUpdate::Count(c) => filters.count = c,
            FilterUpdate::HideGroupAmounts(h) => filters.hide_group_amounts = h,
        }
        filters.validate()?;

        let previous = std::mem::replace(&mut self.filters, filters);
        let result = self.set_report_data(Some(name), false).await;
        if result.is_err() {
            self.filters = previous;
        }
        result
    }

    /// [`Self::set_filter`] for a filter given by name and string value.
    pub async fn set_filter_by_name(&mut self, name: &str, value: &str) -> Result<()> {
        let update = FilterUpdate::parse(name, value)?;
        self.set_filter(update).await
    }

    async fn fetch_raw_data(&self, ranges: &[DateRange]) -> Result<RawLedgerData> {
        let query = LedgerQuery {
            root_types: self.report.root_types().to_vec(),
            from_date: if self.report.cumulative() {
                None
            } else {
                ranges.iter().filter_map(|r| r.from_date).min()
            },
            to_date: ranges
                .iter()
                .map(|r| r.to_date)
                .max()
                .unwrap_or(self.filters.to_date),
        };

        let accounts = self.ledger.fetch_account_metas().await?;
        let postings = self.ledger.fetch_postings(&query).await?;

        debug!(
            "Fetched {} accounts and {} postings for {:?}",
            accounts.len(),
            postings.len(),
            query.root_types
        );

        Ok(RawLedgerData { accounts, postings })
    }
}
