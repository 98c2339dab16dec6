//! HTTP gateway for the activity bot
//!
//! Platform adapters post chat messages here and relay the replies.

mod handlers;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::db::Database;
use crate::name_generator::NameGenerator;
use crate::runtime::RuntimeManager;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<RuntimeManager>,
}

impl AppState {
    pub fn new(db: Database, names: Arc<dyn NameGenerator>) -> Self {
        Self {
            runtime: Arc::new(RuntimeManager::new(db, names)),
        }
    }
}
