pub mod config;
pub mod error;
pub mod proxy;
pub mod routes;
pub mod store;

pub use config::Config;
pub use error::{AppError, StoreError, TransportError, ValidationError};
pub use proxy::{ProxyRequest, ProxyResponse, ProxyService, ProxyServiceExt};
pub use routes::{app, AppState};
pub use store::{Database, HistoryEntry, HistoryStore, SavedRequest, SavedRequestStore};
