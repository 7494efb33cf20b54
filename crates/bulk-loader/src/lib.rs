//! keyloader-bulk - concurrent bulk loading of vault secrets and keys
//!
//! Lists items from a vault collaborator page by page, keeps the ones whose
//! tags match a [`TagFilter`], then fetches and maps each selected item on a
//! bounded set of tokio tasks. Per-item failures are isolated and counted;
//! the caller always receives one [`MappedResults`].

pub mod config;
pub mod filter;
pub mod loader;
pub mod mapper;
pub mod results;
pub mod unit;

pub use config::LoaderConfig;
pub use filter::TagFilter;
pub use loader::BulkLoader;
pub use mapper::{ItemMapper, LineMapper, lines};
pub use results::MappedResults;
pub use unit::Outcome;
