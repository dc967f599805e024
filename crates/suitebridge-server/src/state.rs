//! Shared process state handed to every handler.

use std::sync::Arc;

use suitebridge_config::Config;
use suitebridge_coordinator::Coordinator;
use suitebridge_equity::EquityEngine;

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<Coordinator>,
    pub equity: Arc<EquityEngine>,
    pub config: Arc<Config>,
}
