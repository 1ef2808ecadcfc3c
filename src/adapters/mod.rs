// Adapters layer: concrete implementations for external systems (model APIs, storage).

pub mod http;
pub mod sqlite;

pub use http::registry::{build_model, build_panel};
pub use sqlite::SqliteStore;
