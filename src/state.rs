use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::Mutex;

use crate::store::Stores;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub stores: Stores,
    /// Held for the whole of a generation run; one run at a time.
    pub run_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            stores: Stores::sqlite(db.clone()),
            db,
            run_lock: Arc::new(Mutex::new(())),
        }
    }
}
