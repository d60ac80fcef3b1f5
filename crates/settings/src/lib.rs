pub mod error;
pub mod provider;
pub mod store;

pub use error::StoreError;
pub use provider::SettingsProvider;
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
