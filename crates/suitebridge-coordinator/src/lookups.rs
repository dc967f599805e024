//! Startup lookup bootstrap (`spec.md` §4.6): name→id dictionaries for the
//! filter dimensions and the default consolidation root, loaded once
//! before the HTTP listener binds. A single lookup's failure is logged and
//! degrades to an empty map; it never aborts startup.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use suitebridge_core::{Dimension, GatewayResult, Subsidiary, CONSOLIDATED_SUFFIX};
use suitebridge_sql::lookups::{
    account_titles_query, accounting_books_query, classes_query, consolidation_root_query, departments_query,
    locations_query, subsidiaries_query,
};
use tracing::warn;

use suitebridge_client::ErpClient;

const BOOTSTRAP_TIMEOUT: Duration = Duration::from_secs(60);

/// Which dimension a caller-supplied name/id string resolves against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionKind {
    Subsidiary,
    Department,
    Location,
    Class,
    AccountingBook,
}

/// The name→id dictionaries and default consolidation root populated by
/// [`Lookups::bootstrap`]. Immutable for the process's lifetime once
/// built — the ERP's dimension tables do not change during a run.
#[derive(Debug, Default)]
pub struct Lookups {
    pub subsidiaries: HashMap<i64, Subsidiary>,
    pub parent_subsidiary_ids: HashSet<i64>,
    pub departments: HashMap<i64, Dimension>,
    pub locations: HashMap<i64, Dimension>,
    pub classes: HashMap<i64, Dimension>,
    pub accounting_books: HashMap<i64, Dimension>,
    pub default_consolidation_root: i64,
    pub account_titles: HashMap<String, String>,
}

impl Lookups {
    /// Run every bootstrap query, tolerating individual failures.
    pub async fn bootstrap(client: &ErpClient) -> Self {
        let (subsidiaries, parent_subsidiary_ids) = load_subsidiaries(client).await;
        let departments = load_dimension(client, departments_query(), "departments").await;
        let locations = load_dimension(client, locations_query(), "locations").await;
        let classes = load_dimension(client, classes_query(), "classes").await;
        let accounting_books = load_accounting_books(client).await;
        let default_consolidation_root = load_consolidation_root(client).await;
        let account_titles = load_account_titles(client).await;

        Self {
            subsidiaries,
            parent_subsidiary_ids,
            departments,
            locations,
            classes,
            accounting_books,
            default_consolidation_root,
            account_titles,
        }
    }

    pub fn active_subsidiary_count(&self) -> usize {
        self.subsidiaries.values().filter(|s| !s.is_inactive).count()
    }

    /// `{id, name}` pairs for `/lookups/all`, with every subsidiary that is
    /// someone's parent additionally offered under its `" (Consolidated)"`
    /// display name (`spec.md` §3).
    pub fn subsidiary_display_list(&self) -> Vec<(i64, String)> {
        let mut list = Vec::new();
        for subsidiary in self.subsidiaries.values() {
            list.push((subsidiary.id, subsidiary.name.clone()));
            if self.parent_subsidiary_ids.contains(&subsidiary.id) {
                list.push((subsidiary.id, format!("{}{CONSOLIDATED_SUFFIX}", subsidiary.name)));
            }
        }
        list.sort_by(|a, b| a.1.cmp(&b.1));
        list
    }

    /// Resolve a caller-supplied dimension value to an id: exact match,
    /// then case-insensitive, then strip `" (Consolidated)"` and retry,
    /// then parse as a bare integer id. Returns an error only when none of
    /// those apply (`spec.md` §4.3, §4.6).
    pub fn resolve_dimension(&self, kind: DimensionKind, input: &str) -> GatewayResult<i64> {
        let names: Vec<(i64, &str)> = match kind {
            DimensionKind::Subsidiary => self.subsidiaries.iter().map(|(id, s)| (*id, s.name.as_str())).collect(),
            DimensionKind::Department => self.departments.iter().map(|(id, d)| (*id, d.name.as_str())).collect(),
            DimensionKind::Location => self.locations.iter().map(|(id, d)| (*id, d.name.as_str())).collect(),
            DimensionKind::Class => self.classes.iter().map(|(id, d)| (*id, d.name.as_str())).collect(),
            DimensionKind::AccountingBook => {
                self.accounting_books.iter().map(|(id, d)| (*id, d.name.as_str())).collect()
            }
        };

        if let Some((id, _)) = names.iter().find(|(_, name)| *name == input) {
            return Ok(*id);
        }
        let lower = input.to_lowercase();
        if let Some((id, _)) = names.iter().find(|(_, name)| name.to_lowercase() == lower) {
            return Ok(*id);
        }
        if let Some(stripped) = input.strip_suffix(CONSOLIDATED_SUFFIX) {
            let stripped_lower = stripped.to_lowercase();
            if let Some((id, _)) = names.iter().find(|(_, name)| name.to_lowercase() == stripped_lower) {
                return Ok(*id);
            }
        }
        if let Ok(id) = input.parse::<i64>() {
            return Ok(id);
        }

        Err(suitebridge_core::GatewayError::not_found(format!(
            "could not resolve {kind:?} '{input}'"
        )))
    }
}

async fn load_subsidiaries(client: &ErpClient) -> (HashMap<i64, Subsidiary>, HashSet<i64>) {
    match client.execute_query(subsidiaries_query(), BOOTSTRAP_TIMEOUT).await {
        Ok(rows) => {
            let mut subsidiaries = HashMap::new();
            let mut parent_ids = HashSet::new();
            for row in &rows {
                let Some(id) = row.get("id").and_then(|v| v.as_i64()) else { continue };
                let name = row.get("name").and_then(|v| v.as_str()).unwrap_or_default().to_string();
                let parent_id = row.get("parent").and_then(|v| v.as_i64());
                let is_inactive = row.get("isinactive").and_then(|v| v.as_str()) == Some("T");
                let is_elimination = row.get("iselimination").and_then(|v| v.as_str()) == Some("T");
                if let Some(parent) = parent_id {
                    parent_ids.insert(parent);
                }
                subsidiaries.insert(
                    id,
                    Subsidiary {
                        id,
                        name,
                        parent_id,
                        is_inactive,
                        is_elimination,
                    },
                );
            }
            (subsidiaries, parent_ids)
        }
        Err(e) => {
            warn!(error = %e, "failed to load subsidiaries at startup, continuing with empty map");
            (HashMap::new(), HashSet::new())
        }
    }
}

async fn load_dimension(client: &ErpClient, sql: &'static str, label: &str) -> HashMap<i64, Dimension> {
    match client.execute_query(sql, BOOTSTRAP_TIMEOUT).await {
        Ok(rows) => rows
            .iter()
            .filter_map(|row| {
                let id = row.get("id").and_then(|v| v.as_i64())?;
                let name = row.get("name").and_then(|v| v.as_str())?.to_string();
                Some((id, Dimension { id, name }))
            })
            .collect(),
        Err(e) => {
            warn!(error = %e, dimension = label, "failed to load dimension at startup, continuing with empty map");
            HashMap::new()
        }
    }
}

async fn load_accounting_books(client: &ErpClient) -> HashMap<i64, Dimension> {
    load_dimension(client, accounting_books_query(), "accountingbooks").await
}

async fn load_consolidation_root(client: &ErpClient) -> i64 {
    match client.execute_query(consolidation_root_query(), BOOTSTRAP_TIMEOUT).await {
        Ok(rows) => rows
            .first()
            .and_then(|row| row.get("id").and_then(|v| v.as_i64()))
            .unwrap_or_else(|| {
                warn!("consolidation root query returned no rows, falling back to id 1");
                1
            }),
        Err(e) => {
            warn!(error = %e, "failed to load consolidation root, falling back to id 1");
            1
        }
    }
}

async fn load_account_titles(client: &ErpClient) -> HashMap<String, String> {
    match client.execute_query(account_titles_query(), BOOTSTRAP_TIMEOUT).await {
        Ok(rows) => rows
            .iter()
            .filter_map(|row| {
                let number = row.get("acctnumber").and_then(|v| v.as_str())?.to_string();
                let title = row.get("fullname").and_then(|v| v.as_str())?.to_string();
                Some((number, title))
            })
            .collect(),
        Err(e) => {
            warn!(error = %e, "failed to load account titles at startup, continuing with empty map");
            HashMap::new()
        }
    }
}
