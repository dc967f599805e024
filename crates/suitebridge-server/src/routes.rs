//! Router assembly: one route per `spec.md` §6 operation, behind a
//! permissive CORS layer (`spec.md` §4.7) and a request-tracing layer.

use std::time::Duration;

use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{accounts, balance, batch, equity, lookups, status, transactions};
use crate::state::AppState;

pub fn build(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    let default_timeout = Duration::from_secs(state.config.timeouts.default_secs);

    Router::new()
        .route("/", get(status::banner))
        .route("/health", get(status::health))
        .route("/test", get(status::ping))
        .route("/lookups/all", get(lookups::all))
        .route("/lookups/accountingbooks", get(lookups::accounting_books))
        .route("/account/:num/name", get(accounts::name_path))
        .route("/account/name", post(accounts::name_body))
        .route("/account/:num/type", get(accounts::type_path))
        .route("/account/type", post(accounts::type_body))
        .route("/account/:num/parent", get(accounts::parent_path))
        .route("/account/parent", post(accounts::parent_body))
        .route("/accounts/search", get(accounts::search))
        .route("/balance", get(balance::balance))
        .route("/budget", get(balance::budget))
        .route("/batch/balance", post(batch::balance))
        .route("/batch/account_types", post(batch::account_types))
        .route("/batch/full_year_refresh", post(batch::full_year_refresh))
        .route("/batch/bs_periods", post(batch::bs_periods))
        .route("/retained-earnings", post(equity::retained_earnings))
        .route("/net-income", post(equity::net_income))
        .route("/cta", post(equity::cta))
        .route("/transactions", get(transactions::transactions))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(default_timeout))
        .layer(cors)
        .with_state(state)
}
