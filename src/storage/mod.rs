pub mod document;
pub mod json_file;
pub mod memory;
pub mod persister;
pub mod trait_def;

pub use document::PersistedDocument;
pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use persister::Persister;
pub use trait_def::{load_or_empty, Store, StoreError, StoreResult};
