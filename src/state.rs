//! Shared application state
//! 
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use std::sync::Arc;

use crate::config::environment::EnvironmentConfig;
use crate::repositories::EntityStore;
use crate::services::CoreContext;

#[derive(Clone)]
pub struct AppState {
    pub core: CoreContext,
    pub config: EnvironmentConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn EntityStore>, config: EnvironmentConfig) -> Self {
        Self {
            core: CoreContext::new(store),
            config,
        }
    }
}
