//! Business logic services

pub mod dispatch;
pub mod orders;
pub mod session;
pub mod sessions;

use std::sync::Arc;

use crate::{
    clients::{ApiClients, DispatchApi, OrdersApi},
    config::AppConfig,
    error::AppResult,
};

use session::SessionDeps;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub sessions: sessions::SessionRegistry,
    pub orders: orders::OrdersService,
    pub dispatch: dispatch::DispatchService,
}

impl Services {
    /// Create all services against the configured remote API
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let clients = ApiClients::new(&config.api, config.stocktake)?;
        let stocktake = Arc::new(clients.stocktake);

        let deps = SessionDeps {
            stock: Arc::new(clients.stock),
            submitter: stocktake.clone(),
            references: stocktake,
        };

        Ok(Self::with_deps(
            deps,
            Arc::new(clients.orders),
            Arc::new(clients.dispatch),
            config,
        ))
    }

    pub fn with_deps(
        deps: SessionDeps,
        orders: Arc<dyn OrdersApi>,
        dispatch: Arc<dyn DispatchApi>,
        config: &AppConfig,
    ) -> Self {
        Self {
            sessions: sessions::SessionRegistry::new(deps, config.scanner.clone(), config.station),
            orders: orders::OrdersService::new(orders),
            dispatch: dispatch::DispatchService::new(dispatch),
        }
    }
}
