// src/state.rs
use sqlx::PgPool;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    // Mutating-request counter consulted by the watcher middleware. The
    // summary engine itself never triggers recomputation.
    pub write_counter: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(db_pool: PgPool) -> Self {
        Self {
            db_pool,
            write_counter: Arc::new(AtomicU64::new(0)),
        }
    }
}
