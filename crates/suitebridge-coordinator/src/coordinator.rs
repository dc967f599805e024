//! Batch coordinator (`spec.md` §4.3): classifies a normalized request,
//! fans it out to the minimum number of ERP queries the classification
//! allows, and zero-fills the result so its domain is exactly
//! `accounts × periods`.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use tokio::sync::Semaphore;
use tracing::{info, instrument};

use serde::{Deserialize, Serialize};
use suitebridge_cache::{cache_key, Cache, InflightMap, Operation};
use suitebridge_client::{to_number, ErpClient};
use suitebridge_config::Config;
use suitebridge_core::normalize::canonical_period_year_month;
use suitebridge_core::{
    Account, AccountClass, BalanceResult, FilterBundle, GatewayError, GatewayResult, QueryClassification, QueryRequest,
};
use suitebridge_sql::{
    balance_sheet_multi_period_query, budget_query, full_year_pl_query, targeted_pl_pivot_query, TargetPeriod,
};

use crate::accounts::AccountCache;
use crate::lookups::Lookups;
use crate::periods::PeriodCache;

/// `spec.md` §4.3's prefetch widening: a targeted month range pulls in the
/// adjacent month on either side, and a P&L range covering more than this
/// fraction of the fiscal year is widened to the full year instead.
const PREFETCH_FULL_YEAR_THRESHOLD: f64 = 0.75;

pub struct Coordinator {
    client: ErpClient,
    lookups: Lookups,
    account_cache: AccountCache,
    period_cache: PeriodCache,
    balance_cache: Cache,
    inflight: InflightMap,
    fan_out_limit: Arc<Semaphore>,
    sub_query_timeout: Duration,
}

impl Coordinator {
    /// Construct the client and run the startup lookup bootstrap.
    pub async fn bootstrap(config: &Config) -> Self {
        let client = ErpClient::new(config);
        let lookups = Lookups::bootstrap(&client).await;
        info!(
            subsidiaries = lookups.subsidiaries.len(),
            departments = lookups.departments.len(),
            locations = lookups.locations.len(),
            classes = lookups.classes.len(),
            "lookup bootstrap complete"
        );

        Self {
            client,
            lookups,
            account_cache: AccountCache::new(),
            period_cache: PeriodCache::new(),
            balance_cache: Cache::new(Duration::from_secs(config.operational.cache_ttl_secs)),
            inflight: InflightMap::new(),
            fan_out_limit: Arc::new(Semaphore::new(config.operational.max_concurrent_erp_queries)),
            sub_query_timeout: Duration::from_secs(config.timeouts.sub_query_secs),
        }
    }

    /// Build a coordinator from an already-bootstrapped client/lookups
    /// pair, skipping the startup round trips. A test seam for exercising
    /// the fan-out/cache logic against a stub ERP without scripting the
    /// full lookup bootstrap.
    pub fn with_client_and_lookups(client: ErpClient, lookups: Lookups, config: &Config) -> Self {
        Self {
            client,
            lookups,
            account_cache: AccountCache::new(),
            period_cache: PeriodCache::new(),
            balance_cache: Cache::new(Duration::from_secs(config.operational.cache_ttl_secs)),
            inflight: InflightMap::new(),
            fan_out_limit: Arc::new(Semaphore::new(config.operational.max_concurrent_erp_queries)),
            sub_query_timeout: Duration::from_secs(config.timeouts.sub_query_secs),
        }
    }

    pub fn lookups(&self) -> &Lookups {
        &self.lookups
    }

    pub fn client(&self) -> &ErpClient {
        &self.client
    }

    pub fn account_cache(&self) -> &AccountCache {
        &self.account_cache
    }

    pub fn period_cache(&self) -> &PeriodCache {
        &self.period_cache
    }

    /// Resolve the account-type tag for whichever account numbers the ERP
    /// actually knows about, in one round trip (`spec.md` §6
    /// `GET /accounts/types`). Unknown numbers are simply absent from the
    /// result; callers that need a hard existence check must look.
    pub async fn account_types(&self, numbers: &[String]) -> GatewayResult<Vec<Account>> {
        self.account_cache.resolve(&self.client, numbers).await
    }

    /// Classify a raw request's accounts/periods into the fan-out shape
    /// the batch endpoint uses (`spec.md` §4.3).
    pub async fn classify(&self, accounts: &BTreeSet<String>, periods: &BTreeSet<String>) -> GatewayResult<QueryClassification> {
        let account_list: Vec<String> = accounts.iter().cloned().collect();
        let resolved = self.account_cache.resolve(&self.client, &account_list).await?;

        let mut any_pl = false;
        let mut any_bs = false;
        for account in &resolved {
            match account.account_type.class() {
                AccountClass::BalanceSheetAsset | AccountClass::BalanceSheetLiability | AccountClass::BalanceSheetEquity => {
                    any_bs = true;
                }
                AccountClass::ProfitAndLossIncome | AccountClass::ProfitAndLossExpense => any_pl = true,
                AccountClass::Excluded => {}
            }
        }

        if any_pl && any_bs {
            return Ok(QueryClassification::Mixed);
        }
        if any_bs {
            return Ok(QueryClassification::BalanceSheetOnly);
        }

        // P&L-only: decide whether the requested spread of months is wide
        // enough relative to its fiscal year(s) to prefer the full-year
        // pivot over a targeted one.
        if is_near_full_year(periods)? {
            return Ok(QueryClassification::FullYearProfitAndLoss);
        }
        Ok(QueryClassification::ProfitAndLossOnly)
    }

    /// Fetch balances for an explicit account×period×filter request,
    /// reading through the balance cache and coalescing concurrent
    /// identical requests (`spec.md` §4.3, §4.5).
    ///
    /// Takes `self` behind an `Arc` because the in-flight coalescer needs
    /// a `'static` future to hand to every concurrent caller for the same
    /// key; a borrowed `&self` cannot outlive this call.
    #[instrument(skip(self, request), fields(accounts = request.accounts.len(), periods = request.periods.len()))]
    pub async fn balance_for_accounts(self: &Arc<Self>, request: &QueryRequest) -> GatewayResult<BalanceResult> {
        if request.accounts.is_empty() || request.periods.is_empty() {
            return Ok(BalanceResult::new());
        }

        let account_list: Vec<String> = request.accounts.iter().cloned().collect();
        let period_list: Vec<String> = request.periods.iter().cloned().collect();
        let key = cache_key(Operation::Balance, &account_list, &period_list, &request.filters);

        if let Some(cached) = self.balance_cache.get(&key).await {
            if let Ok(result) = serde_json::from_value::<BalanceResult>(cached) {
                return Ok(result);
            }
        }

        let result = self
            .inflight
            .get_or_compute(key.clone(), {
                let coordinator = Arc::clone(self);
                let request = request.clone();
                async move {
                    let balance = coordinator.compute_balance(&request).await.map_err(|e| e.to_string())?;
                    serde_json::to_value(&balance).map_err(|e| e.to_string())
                }
            })
            .await
            .map_err(GatewayError::backend)?;

        let result: BalanceResult =
            serde_json::from_value(result).map_err(|e| GatewayError::backend(format!("corrupt cached balance result: {e}")))?;

        self.balance_cache
            .set(key, serde_json::to_value(&result).expect("BalanceResult always serializes"))
            .await;

        Ok(result)
    }

    async fn compute_balance(&self, request: &QueryRequest) -> GatewayResult<BalanceResult> {
        let target_subsidiary = request.filters.subsidiary.unwrap_or(self.lookups.default_consolidation_root);
        let active_subsidiaries = self.lookups.active_subsidiary_count();

        let mut result = match request.classification {
            QueryClassification::BalanceSheetOnly | QueryClassification::Mixed => {
                self.fetch_balance_sheet(request, active_subsidiaries, target_subsidiary).await?
            }
            QueryClassification::ProfitAndLossOnly | QueryClassification::FullYearProfitAndLoss => BalanceResult::new(),
        };

        if matches!(
            request.classification,
            QueryClassification::ProfitAndLossOnly | QueryClassification::FullYearProfitAndLoss | QueryClassification::Mixed
        ) {
            let pl_result = self.fetch_pl(request, active_subsidiaries, target_subsidiary).await?;
            result.merge(pl_result);
        }

        result.zero_fill(&request.accounts, &request.periods);
        Ok(result)
    }

    async fn fetch_balance_sheet(
        &self,
        request: &QueryRequest,
        active_subsidiaries: usize,
        target_subsidiary: i64,
    ) -> GatewayResult<BalanceResult> {
        let period_list: Vec<String> = request.periods.iter().cloned().collect();
        let resolved_periods = self.period_cache.resolve(&self.client, &period_list).await?;
        let target_periods = resolved_periods
            .iter()
            .map(|p| {
                let (year, month) = canonical_period_year_month(&p.name)?;
                Ok(TargetPeriod {
                    name: p.name.clone(),
                    year,
                    month,
                    period_id: p.id,
                })
            })
            .collect::<GatewayResult<Vec<_>>>()?;

        let pivot =
            balance_sheet_multi_period_query(&target_periods, &request.filters, active_subsidiaries, target_subsidiary)?;

        let permit = self.fan_out_limit.acquire().await.expect("semaphore never closed");
        let rows = self.client.execute_query(&pivot.sql, self.sub_query_timeout).await?;
        drop(permit);

        let mut result = BalanceResult::new();
        for row in &rows {
            let Some(number) = row.get("acctnumber").and_then(|v| v.as_str()) else {
                continue;
            };
            for (column_alias, period_name) in &pivot.period_columns {
                if let Ok(amount) = to_number(row, column_alias) {
                    result.set(number, period_name, amount);
                }
            }
        }
        Ok(result)
    }

    async fn fetch_pl(
        &self,
        request: &QueryRequest,
        active_subsidiaries: usize,
        target_subsidiary: i64,
    ) -> GatewayResult<BalanceResult> {
        let periods_by_year = group_periods_by_year(&request.periods)?;
        let mut result = BalanceResult::new();

        let fetches = periods_by_year.into_iter().map(|(year, periods)| {
            let filters = request.filters.clone();
            let use_full_year =
                matches!(request.classification, QueryClassification::FullYearProfitAndLoss) || is_full_year_set(&periods);
            async move {
                let permit = self.fan_out_limit.acquire().await.expect("semaphore never closed");
                let pivot = if use_full_year {
                    full_year_pl_query(year, &filters, active_subsidiaries, target_subsidiary)
                } else {
                    targeted_pl_pivot_query(&periods, &filters, active_subsidiaries, target_subsidiary)
                };
                let rows = self.client.execute_query(&pivot.sql, self.sub_query_timeout).await?;
                drop(permit);
                Ok::<_, GatewayError>((pivot, rows))
            }
        });

        for (pivot, rows) in try_join_all(fetches).await? {
            for row in &rows {
                let Some(number) = row.get("acctnumber").and_then(|v| v.as_str()) else {
                    continue;
                };
                for (column_alias, period_name) in &pivot.period_columns {
                    if request.periods.contains(period_name) {
                        if let Ok(amount) = to_number(row, column_alias) {
                            result.set(number, period_name, amount);
                        }
                    }
                }
            }
        }
        Ok(result)
    }

    /// Single-account budget lookup (`spec.md` §6 `GET /budget`), cached
    /// and coalesced the same way as [`Self::balance_for_accounts`] but
    /// against the budget table rather than posted transactions.
    #[instrument(skip(self, filters))]
    pub async fn budget_for_account(
        self: &Arc<Self>,
        account: &str,
        from_period: &str,
        to_period: &str,
        filters: &FilterBundle,
    ) -> GatewayResult<f64> {
        let key = cache_key(
            Operation::Budget,
            std::slice::from_ref(&account.to_string()),
            &[from_period.to_string(), to_period.to_string()],
            filters,
        );

        if let Some(cached) = self.balance_cache.get(&key).await {
            if let Some(amount) = cached.as_f64() {
                return Ok(amount);
            }
        }

        let result = self
            .inflight
            .get_or_compute(key.clone(), {
                let coordinator = Arc::clone(self);
                let account = account.to_string();
                let from_period = from_period.to_string();
                let to_period = to_period.to_string();
                let filters = filters.clone();
                async move {
                    let sql = budget_query(&account, &from_period, &to_period, &filters).map_err(|e| e.to_string())?;
                    let rows = coordinator
                        .client
                        .execute_query(&sql, coordinator.sub_query_timeout)
                        .await
                        .map_err(|e| e.to_string())?;
                    let amount = match rows.first() {
                        Some(row) => to_number(row, "amount").map_err(|e| e.to_string())?,
                        None => 0.0,
                    };
                    Ok(serde_json::json!(amount))
                }
            })
            .await
            .map_err(GatewayError::backend)?;

        let amount = result
            .as_f64()
            .ok_or_else(|| GatewayError::backend("corrupt cached budget result"))?;
        self.balance_cache.set(key, serde_json::json!(amount)).await;
        Ok(amount)
    }

    /// Every posted period for `periods`, regardless of which accounts
    /// happen to have activity (`spec.md` §6 `/batch/bs_periods`). Reuses
    /// [`Self::fetch_balance_sheet`], which already returns whatever
    /// accounts the pivot yields rather than filtering to a pre-known set.
    #[instrument(skip(self, filters))]
    pub async fn bs_periods(self: &Arc<Self>, periods: &BTreeSet<String>, filters: &FilterBundle) -> GatewayResult<BalanceResult> {
        let period_list: Vec<String> = periods.iter().cloned().collect();
        let key = cache_key(Operation::BsPeriods, &[], &period_list, filters);

        if let Some(cached) = self.balance_cache.get(&key).await {
            if let Ok(result) = serde_json::from_value::<BalanceResult>(cached) {
                return Ok(result);
            }
        }

        let result = self
            .inflight
            .get_or_compute(key.clone(), {
                let coordinator = Arc::clone(self);
                let periods = periods.clone();
                let filters = filters.clone();
                async move {
                    let active_subsidiaries = coordinator.lookups.active_subsidiary_count();
                    let target_subsidiary = filters.subsidiary.unwrap_or(coordinator.lookups.default_consolidation_root);
                    let request = QueryRequest {
                        accounts: BTreeSet::new(),
                        periods,
                        filters,
                        classification: QueryClassification::BalanceSheetOnly,
                    };
                    let balances = coordinator
                        .fetch_balance_sheet(&request, active_subsidiaries, target_subsidiary)
                        .await
                        .map_err(|e| e.to_string())?;
                    serde_json::to_value(&balances).map_err(|e| e.to_string())
                }
            })
            .await
            .map_err(GatewayError::backend)?;

        let balances: BalanceResult =
            serde_json::from_value(result).map_err(|e| GatewayError::backend(format!("corrupt cached bs_periods result: {e}")))?;
        self.balance_cache
            .set(key, serde_json::to_value(&balances).expect("BalanceResult always serializes"))
            .await;
        Ok(balances)
    }

    /// Whole-chart P&L snapshot for a fiscal year, plus a year-end
    /// balance-sheet snapshot unless `skip_bs` (`spec.md` §6
    /// `/batch/full_year_refresh`). Unlike [`Self::balance_for_accounts`],
    /// the account set is whatever the pivot returns; the caller never
    /// pre-enumerates it.
    #[instrument(skip(self, filters))]
    pub async fn full_year_refresh(
        self: &Arc<Self>,
        year: i32,
        skip_bs: bool,
        filters: &FilterBundle,
    ) -> GatewayResult<(BalanceResult, Vec<Account>)> {
        let key = cache_key(
            Operation::FullYearRefresh,
            &[],
            &[year.to_string(), skip_bs.to_string()],
            filters,
        );

        if let Some(cached) = self.balance_cache.get(&key).await {
            if let Ok(payload) = serde_json::from_value::<FullYearRefreshPayload>(cached) {
                return Ok((payload.balances, payload.account_types));
            }
        }

        let result = self
            .inflight
            .get_or_compute(key.clone(), {
                let coordinator = Arc::clone(self);
                let filters = filters.clone();
                async move {
                    let payload = coordinator
                        .compute_full_year_refresh(year, skip_bs, &filters)
                        .await
                        .map_err(|e| e.to_string())?;
                    serde_json::to_value(&payload).map_err(|e| e.to_string())
                }
            })
            .await
            .map_err(GatewayError::backend)?;

        let payload: FullYearRefreshPayload =
            serde_json::from_value(result).map_err(|e| GatewayError::backend(format!("corrupt cached full-year refresh: {e}")))?;
        self.balance_cache
            .set(key, serde_json::to_value(&payload).expect("FullYearRefreshPayload always serializes"))
            .await;
        Ok((payload.balances, payload.account_types))
    }

    async fn compute_full_year_refresh(&self, year: i32, skip_bs: bool, filters: &FilterBundle) -> GatewayResult<FullYearRefreshPayload> {
        let target_subsidiary = filters.subsidiary.unwrap_or(self.lookups.default_consolidation_root);
        let active_subsidiaries = self.lookups.active_subsidiary_count();

        let pivot = full_year_pl_query(year, filters, active_subsidiaries, target_subsidiary);
        let permit = self.fan_out_limit.acquire().await.expect("semaphore never closed");
        let rows = self.client.execute_query(&pivot.sql, self.sub_query_timeout).await?;
        drop(permit);

        let mut balances = BalanceResult::new();
        let mut numbers: BTreeSet<String> = BTreeSet::new();
        for row in &rows {
            let Some(number) = row.get("acctnumber").and_then(|v| v.as_str()) else {
                continue;
            };
            numbers.insert(number.to_string());
            for (column_alias, period_name) in &pivot.period_columns {
                if let Ok(amount) = to_number(row, column_alias) {
                    balances.set(number, period_name, amount);
                }
            }
        }

        if !skip_bs {
            let year_end = format!("Dec {year}");
            if let Some(period) = self
                .period_cache
                .resolve(&self.client, std::slice::from_ref(&year_end))
                .await
                .ok()
                .and_then(|mut periods| periods.pop())
            {
                let (py, pm) = canonical_period_year_month(&period.name)?;
                let target = TargetPeriod {
                    name: period.name.clone(),
                    year: py,
                    month: pm,
                    period_id: period.id,
                };
                let bs_pivot = balance_sheet_multi_period_query(&[target], filters, active_subsidiaries, target_subsidiary)?;
                let permit = self.fan_out_limit.acquire().await.expect("semaphore never closed");
                let bs_rows = self.client.execute_query(&bs_pivot.sql, self.sub_query_timeout).await?;
                drop(permit);
                for row in &bs_rows {
                    let Some(number) = row.get("acctnumber").and_then(|v| v.as_str()) else {
                        continue;
                    };
                    numbers.insert(number.to_string());
                    for (column_alias, period_name) in &bs_pivot.period_columns {
                        if let Ok(amount) = to_number(row, column_alias) {
                            balances.set(number, period_name, amount);
                        }
                    }
                }
            }
        }

        let account_list: Vec<String> = numbers.into_iter().collect();
        let account_types = self.account_cache.resolve(&self.client, &account_list).await.unwrap_or_default();

        Ok(FullYearRefreshPayload { balances, account_types })
    }
}

/// Cache payload for [`Coordinator::full_year_refresh`] — both halves of
/// the response round-trip through the TTL cache together.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FullYearRefreshPayload {
    balances: BalanceResult,
    account_types: Vec<Account>,
}

fn group_periods_by_year(periods: &BTreeSet<String>) -> GatewayResult<BTreeMap<i32, Vec<(i32, u32, String)>>> {
    let mut by_year: BTreeMap<i32, Vec<(i32, u32, String)>> = BTreeMap::new();
    for name in periods {
        let (year, month) = canonical_period_year_month(name)?;
        by_year.entry(year).or_default().push((year, month, name.clone()));
    }
    Ok(by_year)
}

fn is_full_year_set(periods: &[(i32, u32, String)]) -> bool {
    let months: BTreeSet<u32> = periods.iter().map(|(_, m, _)| *m).collect();
    months.len() as f64 >= 12.0 * PREFETCH_FULL_YEAR_THRESHOLD
}

fn is_near_full_year(periods: &BTreeSet<String>) -> GatewayResult<bool> {
    let mut months_by_year: BTreeMap<i32, BTreeSet<u32>> = BTreeMap::new();
    for name in periods {
        let (year, month) = canonical_period_year_month(name)?;
        months_by_year.entry(year).or_default().insert(month);
    }
    Ok(months_by_year
        .values()
        .any(|months| months.len() as f64 >= 12.0 * PREFETCH_FULL_YEAR_THRESHOLD))
}

/// Widen an explicit target-month set by one month on either side, per
/// `spec.md` §4.3's prefetch rule, clamped to calendar bounds.
pub fn widen_with_prefetch(periods: &BTreeSet<String>) -> GatewayResult<BTreeSet<String>> {
    let mut widened = periods.clone();
    for name in periods {
        let (year, month) = canonical_period_year_month(name)?;
        let prev = if month == 1 { (year - 1, 12) } else { (year, month - 1) };
        let next = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
        widened.insert(month_name(prev.1, prev.0));
        widened.insert(month_name(next.1, next.0));
    }
    Ok(widened)
}

fn month_name(month: u32, year: i32) -> String {
    const NAMES: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    format!("{} {year}", NAMES[(month - 1) as usize])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn widen_with_prefetch_adds_adjacent_months() {
        let widened = widen_with_prefetch(&set(&["Jun 2025"])).unwrap();
        assert!(widened.contains("May 2025"));
        assert!(widened.contains("Jun 2025"));
        assert!(widened.contains("Jul 2025"));
    }

    #[test]
    fn widen_with_prefetch_rolls_over_year_boundary() {
        let widened = widen_with_prefetch(&set(&["Jan 2025"])).unwrap();
        assert!(widened.contains("Dec 2024"));
        assert!(widened.contains("Feb 2025"));
    }

    #[test]
    fn is_near_full_year_true_for_ten_of_twelve_months() {
        let months = set(&[
            "Jan 2025", "Feb 2025", "Mar 2025", "Apr 2025", "May 2025", "Jun 2025", "Jul 2025", "Aug 2025",
            "Sep 2025", "Oct 2025",
        ]);
        assert!(is_near_full_year(&months).unwrap());
    }

    #[test]
    fn is_near_full_year_false_for_a_single_month() {
        assert!(!is_near_full_year(&set(&["Jan 2025"])).unwrap());
    }

    #[test]
    fn group_periods_by_year_splits_a_december_january_span() {
        let grouped = group_periods_by_year(&set(&["Dec 2024", "Jan 2025"])).unwrap();
        assert_eq!(grouped.len(), 2);
        assert!(grouped.contains_key(&2024));
        assert!(grouped.contains_key(&2025));
    }
}
