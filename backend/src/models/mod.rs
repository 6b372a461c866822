use sqlx::SqlitePool;

use crate::config::Config;

pub mod history;
pub mod member;
pub mod payment;
pub mod writeoff;

pub use history::*;
pub use member::*;
pub use payment::*;
pub use writeoff::*;

/// Application state shared across all handlers
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
}
