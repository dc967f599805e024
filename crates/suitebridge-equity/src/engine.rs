//! Derived-equity engine (`spec.md` §4.4): retained earnings, net income,
//! and the CTA balance-sheet plug, each composed from the coordinator's
//! cumulative/targeted scalar sub-queries.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use futures::try_join;
use tracing::instrument;

use suitebridge_cache::{cache_key, Cache, InflightMap, Operation};
use suitebridge_client::{to_number, ErpClient};
use suitebridge_config::{Config, EquityConfig};
use suitebridge_coordinator::Coordinator;
use suitebridge_core::{AccountType, FilterBundle, GatewayError, GatewayResult};
use suitebridge_sql::{cumulative_balance_component_query, pl_activity_range_query, retained_earnings_manual_entries_query};

const ASSET_TYPES: [AccountType; 7] = [
    AccountType::Bank,
    AccountType::AcctRec,
    AccountType::OthCurrAsset,
    AccountType::FixedAsset,
    AccountType::OthAsset,
    AccountType::DeferExpense,
    AccountType::UnbilledRec,
];

const LIABILITY_TYPES: [AccountType; 5] = [
    AccountType::AcctPay,
    AccountType::CredCard,
    AccountType::OthCurrLiab,
    AccountType::LongTermLiab,
    AccountType::DeferRevenue,
];

/// `spec.md` §4.4's outer timeout. Each sub-query individually is bounded
/// by [`SUB_QUERY_TIMEOUT`]; this wraps the whole composition.
const OUTER_TIMEOUT: Duration = Duration::from_secs(300);
const SUB_QUERY_TIMEOUT: Duration = Duration::from_secs(120);

pub struct EquityEngine {
    coordinator: Arc<Coordinator>,
    config: EquityConfig,
    re_cache: Cache,
    ni_cache: Cache,
    cta_cache: Cache,
    inflight: InflightMap,
}

/// The `(month, fiscal-year start, rate period id)` triple every sub-query
/// in a single RE/NI/CTA composition shares, resolved once up front.
struct PeriodContext {
    month_end: NaiveDate,
    rate_period_id: i64,
    prior_year_end: NaiveDate,
    prior_year_rate_period_id: i64,
    fiscal_year_start: NaiveDate,
}

impl EquityEngine {
    pub fn new(coordinator: Arc<Coordinator>, config: &Config) -> Self {
        let ttl = Duration::from_secs(config.operational.cache_ttl_secs);
        Self {
            coordinator,
            config: config.equity.clone(),
            re_cache: Cache::new(ttl),
            ni_cache: Cache::new(ttl),
            cta_cache: Cache::new(ttl),
            inflight: InflightMap::new(),
        }
    }

    async fn period_context(&self, period_name: &str) -> GatewayResult<PeriodContext> {
        let client = self.coordinator.client();
        let period = self.coordinator.period_cache().resolve_one(client, period_name).await?;
        let prior_year_december = format!("Dec {}", period.fiscal_year - 1);
        let prior = self.coordinator.period_cache().resolve_one(client, &prior_year_december).await?;

        Ok(PeriodContext {
            month_end: period.end_date,
            rate_period_id: period.id,
            prior_year_end: prior.end_date,
            prior_year_rate_period_id: prior.id,
            fiscal_year_start: NaiveDate::from_ymd_opt(period.fiscal_year, 1, 1).expect("valid fiscal year"),
        })
    }

    fn target_subsidiary(&self, filters: &FilterBundle) -> i64 {
        filters.subsidiary.unwrap_or(self.coordinator.lookups().default_consolidation_root)
    }

    /// `RE = RE_roll + RE_manual` for the fiscal year containing
    /// `period_name`, cumulative through the end of the prior year.
    #[instrument(skip(self))]
    pub async fn retained_earnings(self: &Arc<Self>, period_name: &str, filters: &FilterBundle) -> GatewayResult<f64> {
        let key = cache_key(Operation::RetainedEarnings, &[], &[period_name.to_string()], filters);
        if let Some(cached) = self.re_cache.get(&key).await {
            if let Some(value) = cached.as_f64() {
                return Ok(value);
            }
        }

        let value = {
            let engine = Arc::clone(self);
            let period_name = period_name.to_string();
            let filters = filters.clone();
            let computed = self
                .inflight
                .get_or_compute(key.clone(), async move {
                    tokio::time::timeout(OUTER_TIMEOUT, async {
                        let ctx = engine.period_context(&period_name).await?;
                        engine.compute_retained_earnings(&ctx, &filters).await
                    })
                    .await
                    .map_err(|_| "retained-earnings computation timed out".to_string())?
                    .map(|v| serde_json::json!(v))
                    .map_err(|e| e.to_string())
                })
                .await
                .map_err(GatewayError::backend)?;
            computed.as_f64().ok_or_else(|| GatewayError::backend("retained-earnings result is not numeric"))?
        };

        self.re_cache.set(key, serde_json::json!(value)).await;
        Ok(value)
    }

    /// `NI = Σ P&L activity from the start of the fiscal year through
    /// `period_name``, consolidated at `period_name`'s own rate.
    #[instrument(skip(self))]
    pub async fn net_income(self: &Arc<Self>, period_name: &str, filters: &FilterBundle) -> GatewayResult<f64> {
        let key = cache_key(Operation::NetIncome, &[], &[period_name.to_string()], filters);
        if let Some(cached) = self.ni_cache.get(&key).await {
            if let Some(value) = cached.as_f64() {
                return Ok(value);
            }
        }

        let value = {
            let engine = Arc::clone(self);
            let period_name = period_name.to_string();
            let filters = filters.clone();
            let computed = self
                .inflight
                .get_or_compute(key.clone(), async move {
                    tokio::time::timeout(OUTER_TIMEOUT, async {
                        let ctx = engine.period_context(&period_name).await?;
                        engine.compute_net_income(&ctx, &filters).await
                    })
                    .await
                    .map_err(|_| "net-income computation timed out".to_string())?
                    .map(|v| serde_json::json!(v))
                    .map_err(|e| e.to_string())
                })
                .await
                .map_err(GatewayError::backend)?;
            computed.as_f64().ok_or_else(|| GatewayError::backend("net-income result is not numeric"))?
        };

        self.ni_cache.set(key, serde_json::json!(value)).await;
        Ok(value)
    }

    /// `CTA = (A - L) - E_posted - RE - NI`, issuing every sub-query
    /// concurrently (`spec.md` §4.4 "up to five ERP queries").
    #[instrument(skip(self))]
    pub async fn cta(self: &Arc<Self>, period_name: &str, filters: &FilterBundle) -> GatewayResult<f64> {
        let key = cache_key(Operation::Cta, &[], &[period_name.to_string()], filters);
        if let Some(cached) = self.cta_cache.get(&key).await {
            if let Some(value) = cached.as_f64() {
                return Ok(value);
            }
        }

        let value = {
            let engine = Arc::clone(self);
            let period_name = period_name.to_string();
            let filters = filters.clone();
            let computed = self
                .inflight
                .get_or_compute(key.clone(), async move {
                    tokio::time::timeout(OUTER_TIMEOUT, engine.compute_cta(&period_name, &filters))
                        .await
                        .map_err(|_| "CTA computation timed out".to_string())?
                        .map(|v| serde_json::json!(v))
                        .map_err(|e| e.to_string())
                })
                .await
                .map_err(GatewayError::backend)?;
            computed.as_f64().ok_or_else(|| GatewayError::backend("CTA result is not numeric"))?
        };

        self.cta_cache.set(key, serde_json::json!(value)).await;
        Ok(value)
    }

    async fn compute_cta(&self, period_name: &str, filters: &FilterBundle) -> GatewayResult<f64> {
        let ctx = self.period_context(period_name).await?;
        let target_subsidiary = self.target_subsidiary(filters);
        let active_subsidiaries = self.coordinator.lookups().active_subsidiary_count();
        let client = self.coordinator.client();

        let assets_query = cumulative_balance_component_query(
            &ASSET_TYPES,
            ctx.month_end,
            ctx.rate_period_id,
            filters,
            active_subsidiaries,
            target_subsidiary,
            &[],
        );
        let liabilities_query = cumulative_balance_component_query(
            &LIABILITY_TYPES,
            ctx.month_end,
            ctx.rate_period_id,
            filters,
            active_subsidiaries,
            target_subsidiary,
            &[],
        );
        let posted_equity_query = cumulative_balance_component_query(
            &[AccountType::Equity],
            ctx.month_end,
            ctx.rate_period_id,
            filters,
            active_subsidiaries,
            target_subsidiary,
            &self.config.cta_exclude_name_substrings,
        );

        let (assets, liabilities, posted_equity, retained_earnings, net_income) = try_join!(
            self.run_scalar(client, &assets_query.sql),
            self.run_scalar(client, &liabilities_query.sql),
            self.run_scalar(client, &posted_equity_query.sql),
            self.compute_retained_earnings(&ctx, filters),
            self.compute_net_income(&ctx, filters),
        )?;

        Ok((assets - liabilities) - posted_equity - retained_earnings - net_income)
    }

    async fn compute_retained_earnings(&self, ctx: &PeriodContext, filters: &FilterBundle) -> GatewayResult<f64> {
        let target_subsidiary = self.target_subsidiary(filters);
        let active_subsidiaries = self.coordinator.lookups().active_subsidiary_count();
        let client = self.coordinator.client();

        let roll_query = pl_activity_range_query(
            None,
            ctx.prior_year_end,
            ctx.prior_year_rate_period_id,
            filters,
            active_subsidiaries,
            target_subsidiary,
        );
        let roll = self.run_scalar(client, &roll_query.sql).await?;

        let mut manual = 0.0;
        for substring in &self.config.retained_earnings_name_substrings {
            let manual_query = retained_earnings_manual_entries_query(
                ctx.prior_year_end,
                ctx.prior_year_rate_period_id,
                filters,
                active_subsidiaries,
                target_subsidiary,
                substring,
            );
            manual += self.run_scalar(client, &manual_query.sql).await?;
        }

        Ok(roll + manual)
    }

    async fn compute_net_income(&self, ctx: &PeriodContext, filters: &FilterBundle) -> GatewayResult<f64> {
        let target_subsidiary = self.target_subsidiary(filters);
        let active_subsidiaries = self.coordinator.lookups().active_subsidiary_count();

        let query = pl_activity_range_query(
            Some(ctx.fiscal_year_start),
            ctx.month_end,
            ctx.rate_period_id,
            filters,
            active_subsidiaries,
            target_subsidiary,
        );
        self.run_scalar(self.coordinator.client(), &query.sql).await
    }

    /// A `SUM(...)` over no matching lines comes back as one row with
    /// `amount` SQL `NULL`, which `to_number` treats as a missing column.
    /// That's a legitimate zero here (most often `RE_manual`, which is
    /// empty on most ledgers), not a backend error, so a missing/null
    /// amount falls through to `0.0` the same way the pivot paths do via
    /// `if let Ok(amount) = to_number(...)`.
    async fn run_scalar(&self, client: &ErpClient, sql: &str) -> GatewayResult<f64> {
        let rows = client.execute_query(sql, SUB_QUERY_TIMEOUT).await?;
        match rows.first() {
            Some(row) => Ok(to_number(row, "amount").unwrap_or(0.0)),
            None => Ok(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_and_liability_type_sets_are_disjoint() {
        for asset in ASSET_TYPES {
            assert!(!LIABILITY_TYPES.contains(&asset));
        }
    }

    #[test]
    fn neither_set_includes_equity_or_retained_earnings() {
        assert!(!ASSET_TYPES.contains(&AccountType::Equity));
        assert!(!LIABILITY_TYPES.contains(&AccountType::RetainedEarnings));
    }
}
