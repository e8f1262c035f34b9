//! Infrastructure layer: storage and network implementations of the core's
//! trait seams.

pub mod config_service;
pub mod json_file_store;
pub mod memory_store;
pub mod nominatim;
pub mod paths;
pub mod rest_client;

pub use json_file_store::JsonFileStore;
pub use memory_store::MemoryStore;
pub use nominatim::NominatimClient;
pub use rest_client::RestSubmissionClient;
