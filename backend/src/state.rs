use crate::db::Database;
use crate::delivery::DeliveryClient;
use crate::tokens::TokenService;
use std::sync::Arc;

/// Shared application state injected into every handler as `web::Data`.
///
/// Holds handles only; all mutable state lives in the database.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub tokens: TokenService,
    pub delivery: Arc<dyn DeliveryClient>,
    pub dispatch: DispatchSettings,
}

#[derive(Debug, Clone)]
pub struct DispatchSettings {
    /// Public URL response links are built from.
    pub public_base_url: String,
    /// Upper bound on in-flight deliveries per campaign execution.
    pub concurrency: usize,
}

impl AppState {
    pub fn new(
        db: Database,
        delivery: Arc<dyn DeliveryClient>,
        token_ttl: Option<chrono::Duration>,
        dispatch: DispatchSettings,
    ) -> Self {
        Self {
            tokens: TokenService::new(db.clone(), token_ttl),
            db,
            delivery,
            dispatch,
        }
    }
}
