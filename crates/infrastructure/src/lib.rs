//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod graph_directory_client;
mod in_memory_directory;

pub use graph_directory_client::{DEFAULT_GRAPH_BASE_URL, GraphClientConfig, GraphDirectoryClient};
pub use in_memory_directory::InMemoryDirectory;
