//! `GET /lookups/all` and `GET /lookups/accountingbooks` (`spec.md` §6).

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct DimensionItem {
    id: i64,
    name: String,
}

#[derive(Debug, Serialize)]
pub struct AllLookupsResponse {
    subsidiaries: Vec<DimensionItem>,
    departments: Vec<DimensionItem>,
    classes: Vec<DimensionItem>,
    locations: Vec<DimensionItem>,
    #[serde(rename = "accountingBooks")]
    accounting_books: Vec<DimensionItem>,
}

/// Parent subsidiaries are duplicated with the `(Consolidated)` display
/// suffix, per [`suitebridge_coordinator::Lookups::subsidiary_display_list`].
pub async fn all(State(state): State<AppState>) -> Json<AllLookupsResponse> {
    let lookups = state.coordinator.lookups();

    let subsidiaries = lookups
        .subsidiary_display_list()
        .into_iter()
        .map(|(id, name)| DimensionItem { id, name })
        .collect();
    let departments = lookups
        .departments
        .iter()
        .map(|(id, d)| DimensionItem { id: *id, name: d.name.clone() })
        .collect();
    let classes = lookups
        .classes
        .iter()
        .map(|(id, d)| DimensionItem { id: *id, name: d.name.clone() })
        .collect();
    let locations = lookups
        .locations
        .iter()
        .map(|(id, d)| DimensionItem { id: *id, name: d.name.clone() })
        .collect();
    let accounting_books = lookups
        .accounting_books
        .iter()
        .map(|(id, d)| DimensionItem { id: *id, name: d.name.clone() })
        .collect();

    Json(AllLookupsResponse {
        subsidiaries,
        departments,
        classes,
        locations,
        accounting_books,
    })
}

pub async fn accounting_books(State(state): State<AppState>) -> Json<Vec<DimensionItem>> {
    let lookups = state.coordinator.lookups();
    Json(
        lookups
            .accounting_books
            .iter()
            .map(|(id, d)| DimensionItem { id: *id, name: d.name.clone() })
            .collect(),
    )
}
